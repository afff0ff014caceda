//! Access gate in front of the place list.
//!
//! # Responsibility
//! - Ask a platform probe (biometrics, device owner check) whether the user
//!   may see the places this session.
//! - Hold the resulting lock state.
//!
//! # Invariants
//! - The gate starts `Locked`.
//! - `Unsupported` never changes the state and never reports an error.
//! - A denial is visible (`Failed`) and can be retried.

use async_trait::async_trait;
use log::{info, warn};

/// Prompt shown by platform probes that display one.
pub const UNLOCK_REASON: &str = "Please authenticate yourself to unlock your places.";

/// Result of one probe evaluation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccessOutcome {
    /// The device has no usable authentication capability.
    Unsupported,
    Granted,
    Denied { reason: String },
}

/// Platform authentication capability.
#[async_trait]
pub trait AccessProbe: Send + Sync {
    /// Evaluates the owner check once. `reason` is the user-facing prompt.
    async fn evaluate(&self, reason: &str) -> AccessOutcome;
}

/// Lock state visible to the presentation layer.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum GateState {
    #[default]
    Locked,
    Unlocked,
    /// The last attempt was denied; still locked.
    Failed { reason: String },
}

/// Session-scoped access gate.
#[derive(Debug, Default)]
pub struct AccessGate {
    state: GateState,
}

impl AccessGate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &GateState {
        &self.state
    }

    pub fn is_unlocked(&self) -> bool {
        self.state == GateState::Unlocked
    }

    /// Runs `probe` once and applies its outcome.
    pub async fn authenticate(&mut self, probe: &dyn AccessProbe) -> AccessOutcome {
        if self.is_unlocked() {
            return AccessOutcome::Granted;
        }
        let outcome = probe.evaluate(UNLOCK_REASON).await;
        self.apply(&outcome);
        outcome
    }

    /// Applies an outcome produced elsewhere (e.g. by a UI-side prompt).
    pub fn apply(&mut self, outcome: &AccessOutcome) -> &GateState {
        match outcome {
            AccessOutcome::Granted => {
                info!("event=gate_auth module=gate status=ok");
                self.state = GateState::Unlocked;
            }
            AccessOutcome::Denied { reason } => {
                warn!("event=gate_auth module=gate status=error reason=denied");
                if !self.is_unlocked() {
                    self.state = GateState::Failed {
                        reason: reason.clone(),
                    };
                }
            }
            AccessOutcome::Unsupported => {
                info!("event=gate_auth module=gate status=skip reason=unsupported");
            }
        }
        &self.state
    }

    /// Relocks, e.g. when the app moves to the background.
    pub fn lock(&mut self) {
        self.state = GateState::Locked;
    }
}
