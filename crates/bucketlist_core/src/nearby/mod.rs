//! Nearby-page lookup state machine.
//!
//! # Responsibility
//! - Run one page lookup per edit session on a background task.
//! - Publish `Loading -> Loaded | Failed` exactly once.
//!
//! # Invariants
//! - `Loaded` and `Failed` are terminal; there is no retry.
//! - Pages are empty unless the state is `Loaded`.
//! - Dropping a `NearbyLookup` aborts its task.

pub mod geosearch;

use crate::model::page::NearbyPage;
use crate::model::place::Coordinate;
use geosearch::PageSource;
use log::warn;
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;

/// Display state of a nearby lookup.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum LoadingState {
    #[default]
    Loading,
    Loaded(Vec<NearbyPage>),
    Failed,
}

impl LoadingState {
    pub fn is_settled(&self) -> bool {
        !matches!(self, Self::Loading)
    }

    pub fn pages(&self) -> &[NearbyPage] {
        match self {
            Self::Loaded(pages) => pages,
            Self::Loading | Self::Failed => &[],
        }
    }
}

/// Runs one lookup to completion and returns its terminal state.
pub async fn run_lookup(source: &dyn PageSource, coordinate: Coordinate) -> LoadingState {
    match source.nearby_pages(coordinate).await {
        Ok(pages) => LoadingState::Loaded(pages),
        Err(err) => {
            warn!(
                "event=nearby_lookup module=nearby status=error error={}",
                err
            );
            LoadingState::Failed
        }
    }
}

/// Handle to a lookup running on the current Tokio runtime.
#[derive(Debug)]
pub struct NearbyLookup {
    state: watch::Receiver<LoadingState>,
    task: Option<JoinHandle<()>>,
}

impl NearbyLookup {
    /// Starts the lookup in the background.
    ///
    /// Without a Tokio runtime the lookup settles immediately as `Failed`.
    pub fn spawn(source: Arc<dyn PageSource>, coordinate: Coordinate) -> Self {
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            warn!("event=nearby_lookup module=nearby status=error reason=no_runtime");
            let (_tx, state) = watch::channel(LoadingState::Failed);
            return Self { state, task: None };
        };

        let (tx, state) = watch::channel(LoadingState::Loading);
        let task = runtime.spawn(async move {
            let settled = run_lookup(source.as_ref(), coordinate).await;
            // A closed channel means the session is gone; nothing to report to.
            let _ = tx.send(settled);
        });
        Self {
            state,
            task: Some(task),
        }
    }

    /// Current state snapshot.
    pub fn state(&self) -> LoadingState {
        self.state.borrow().clone()
    }

    /// Waits until the lookup leaves `Loading`.
    ///
    /// A task that ends without publishing (panic, abort) settles as `Failed`.
    pub async fn settled(&mut self) -> LoadingState {
        match self.state.wait_for(LoadingState::is_settled).await {
            Ok(state) => state.clone(),
            Err(_) => {
                warn!("event=nearby_lookup module=nearby status=error reason=task_ended");
                LoadingState::Failed
            }
        }
    }
}

impl Drop for NearbyLookup {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}
