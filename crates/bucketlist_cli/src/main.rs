//! BucketList command-line tool.
//!
//! # Responsibility
//! - Inspect and edit the local place list without the mobile UI.
//! - Probe the nearby lookup against the live geosearch endpoint.
//!
//! The CLI runs as the device owner, so its access probe always grants.

use async_trait::async_trait;
use bucketlist_core::{
    default_log_level, init_logging, run_lookup, AccessOutcome, AccessProbe, Coordinate,
    EditIdentity, GeosearchConfig, LoadingState, MapSession, Place, StorageConfig,
    UpdateOutcome, WikipediaGeosearch,
};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process;
use uuid::Uuid;

/// BucketList local data tools.
#[derive(Parser)]
#[command(name = "bucketlist", about = "BucketList local data tools")]
struct Cli {
    /// Data directory (default: $BUCKETLIST_DATA_DIR, then the temp dir).
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Absolute directory for rolling log files.
    #[arg(long, global = true)]
    log_dir: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print core linkage and version.
    Ping,
    /// List stored places in display order.
    List,
    /// Add a new place at a coordinate.
    Add {
        #[arg(long, allow_hyphen_values = true)]
        lat: f64,
        #[arg(long, allow_hyphen_values = true)]
        lon: f64,
    },
    /// Rename a place, optionally replacing its description.
    Rename {
        #[arg(long)]
        id: Uuid,
        #[arg(long)]
        name: String,
        #[arg(long)]
        description: Option<String>,
        /// Give the edited place a fresh id.
        #[arg(long)]
        rotate_id: bool,
    },
    /// Fetch encyclopedia pages near a coordinate.
    Nearby {
        #[arg(long, allow_hyphen_values = true)]
        lat: f64,
        #[arg(long, allow_hyphen_values = true)]
        lon: f64,
    },
    /// Show or set hybrid map mode.
    Hybrid {
        #[arg(value_parser = ["on", "off"])]
        mode: Option<String>,
    },
}

struct OwnerProbe;

#[async_trait]
impl AccessProbe for OwnerProbe {
    async fn evaluate(&self, _reason: &str) -> AccessOutcome {
        AccessOutcome::Granted
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if let Some(log_dir) = cli.log_dir.as_deref() {
        if let Err(err) = init_logging(default_log_level(), log_dir) {
            eprintln!("warning: logging disabled: {err}");
        }
    }

    if let Err(err) = run(cli).await {
        eprintln!("error: {err}");
        process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), String> {
    if let Commands::Ping = cli.command {
        println!("bucketlist_core ping={}", bucketlist_core::ping());
        println!("bucketlist_core version={}", bucketlist_core::core_version());
        return Ok(());
    }
    if let Commands::Nearby { lat, lon } = cli.command {
        return nearby(Coordinate::new(lat, lon)).await;
    }

    let config = StorageConfig::resolve(cli.data_dir.as_deref()).map_err(|err| err.to_string())?;
    let mut session = MapSession::open(&config).map_err(|err| err.to_string())?;
    session.authenticate(&OwnerProbe).await;

    match cli.command {
        Commands::List => {
            let places = session.places().map_err(|err| err.to_string())?;
            if places.is_empty() {
                println!("No places in {}.", config.places_path().display());
            }
            for place in places {
                print_place(place);
            }
        }
        Commands::Add { lat, lon } => {
            let place = session
                .add_place(Coordinate::new(lat, lon))
                .map_err(|err| err.to_string())?;
            print_place(&place);
        }
        Commands::Rename {
            id,
            name,
            description,
            rotate_id,
        } => {
            session.select_place(id).map_err(|err| err.to_string())?;
            let mut edit = session.begin_edit().map_err(|err| err.to_string())?;
            edit.set_name(name);
            if let Some(description) = description {
                edit.set_description(description);
            }
            let identity = if rotate_id {
                EditIdentity::Rotate
            } else {
                EditIdentity::Preserve
            };
            let replacement = edit.finish(identity);
            match session
                .update_selected(replacement.clone())
                .map_err(|err| err.to_string())?
            {
                UpdateOutcome::Replaced { .. } => print_place(&replacement),
                other => return Err(format!("rename skipped: {other:?}")),
            }
        }
        Commands::Hybrid { mode } => {
            if let Some(mode) = mode {
                session.set_hybrid_mode(mode == "on");
            }
            println!(
                "hybrid_mode={}",
                if session.is_hybrid_mode() { "on" } else { "off" }
            );
        }
        Commands::Ping | Commands::Nearby { .. } => {}
    }

    if let Some(err) = session.last_persist_error() {
        return Err(format!("changes kept in memory only: {err}"));
    }
    Ok(())
}

async fn nearby(coordinate: Coordinate) -> Result<(), String> {
    let source =
        WikipediaGeosearch::new(GeosearchConfig::from_env()).map_err(|err| err.to_string())?;
    match run_lookup(&source, coordinate).await {
        LoadingState::Loaded(pages) => {
            for page in &pages {
                println!("{:>10}  {}: {}", page.page_id, page.title, page.description());
            }
            Ok(())
        }
        LoadingState::Failed | LoadingState::Loading => {
            Err("nearby lookup failed; please try again later".to_string())
        }
    }
}

fn print_place(place: &Place) {
    println!(
        "{}  {:>9.4} {:>10.4}  {}{}",
        place.id,
        place.latitude,
        place.longitude,
        place.name,
        if place.description.is_empty() {
            String::new()
        } else {
            format!(" ({})", place.description)
        }
    );
}
