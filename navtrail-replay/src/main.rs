use std::{path::PathBuf, time::Duration};

use clap::Parser;
use log::{error, info};
use navtrail_replay::{ReplayOptions, prelude::*, read_track, replay};
use tokio_util::sync::CancellationToken;

#[derive(Parser)]
/// Replay a recorded location track through the location listener and report what the view
/// model saw
struct Cli {
    /// Path to a JSON file containing an array of location fixes
    track: PathBuf,

    /// Milliseconds between replayed fixes
    #[arg(long, default_value_t = 1000, value_parser = clap::value_parser!(u64).range(1..))]
    interval_ms: u64,

    /// Report the first fix as the engine's last known location instead of replaying it
    #[arg(long)]
    seed_last_known: bool,

    /// Print the summary as JSON
    #[arg(long)]
    json: bool,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result {
    colog::init();

    let cli = Cli::parse();

    let track = read_track(&cli.track)?;
    info!("Loaded {} fixes from {}", track.len(), cli.track.display());

    let options = ReplayOptions {
        interval: Duration::from_millis(cli.interval_ms),
        seed_last_known: cli.seed_last_known,
    };

    let cancel = CancellationToken::new();
    tokio::spawn({
        let cancel = cancel.clone();
        async move {
            match tokio::signal::ctrl_c().await {
                Ok(()) => cancel.cancel(),
                Err(why) => error!("Failed to listen for Ctrl-C: {why:?}"),
            }
        }
    });

    let summary = replay(track, &options, &cancel).await?;

    if cli.json {
        let out = serde_json::to_string_pretty(&summary).context("Failed to serialize summary")?;
        println!("{out}");
    } else {
        println!("{summary}");
    }

    Ok(())
}
