use std::{
    fmt,
    path::Path,
    sync::atomic::{AtomicUsize, Ordering},
    time::Duration,
};

use log::{debug, info};
use navtrail_logic::{
    EngineListener, Location, LocationViewModel, ReplayEngine, StateUpdateSender,
};
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;

pub mod prelude {
    pub use anyhow::{Context, anyhow, bail};
    pub type Result<T = (), E = anyhow::Error> = std::result::Result<T, E>;
}

pub use prelude::*;

/// Parse a track, a JSON array of [Location]s
pub fn parse_track(raw: &str) -> Result<Vec<Location>> {
    let track = serde_json::from_str::<Vec<Location>>(raw).context("Failed to parse track")?;
    if track.is_empty() {
        bail!("Track contains no fixes");
    }
    Ok(track)
}

pub fn read_track(path: &Path) -> Result<Vec<Location>> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read track file {}", path.display()))?;
    parse_track(&raw).with_context(|| format!("Invalid track file {}", path.display()))
}

#[derive(Debug, Clone)]
pub struct ReplayOptions {
    /// Time between delivered fixes
    pub interval: Duration,
    /// Hand the first fix to the engine as its last known location instead of replaying it
    pub seed_last_known: bool,
}

impl Default for ReplayOptions {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(1),
            seed_last_known: false,
        }
    }
}

/// Logs every UI update and keeps count of them
#[derive(Default)]
pub struct LogUpdateSender(AtomicUsize);

impl LogUpdateSender {
    pub fn count(&self) -> usize {
        self.0.load(Ordering::SeqCst)
    }
}

impl StateUpdateSender for LogUpdateSender {
    fn send_update(&self) {
        let n = self.0.fetch_add(1, Ordering::SeqCst) + 1;
        debug!("Location state update #{n}");
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ReplaySummary {
    pub fixes_in_track: usize,
    /// Fixes the engine delivered as live updates
    pub fixes_delivered: usize,
    /// Fixes the view model ended up with, including a forwarded last known fix
    pub fixes_received: usize,
    pub ui_updates: usize,
    pub distance_meters: f64,
    pub last_location: Option<Location>,
    pub cancelled: bool,
}

impl fmt::Display for ReplaySummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Received {} of {} fixes ({} live), {:.1} m travelled",
            self.fixes_received, self.fixes_in_track, self.fixes_delivered, self.distance_meters
        )?;
        if let Some(loc) = &self.last_location {
            write!(
                f,
                "\nLast position: {:.6}, {:.6} at {}",
                loc.lat, loc.long, loc.timestamp
            )?;
        }
        if self.cancelled {
            write!(f, "\n(cancelled)")?;
        }
        Ok(())
    }
}

/// Wire a [ReplayEngine] to a [LocationViewModel] through an [EngineListener] and replay `track`
pub async fn replay(
    track: Vec<Location>,
    options: &ReplayOptions,
    cancel: &CancellationToken,
) -> Result<ReplaySummary> {
    let fixes_in_track = track.len();

    let mut fixes = track;
    let seed = (options.seed_last_known && !fixes.is_empty()).then(|| fixes.remove(0));

    let mut engine = ReplayEngine::new(fixes, options.interval);
    if let Some(first) = seed {
        engine = engine.with_last_location(first);
    }

    let view_model = LocationViewModel::new(LogUpdateSender::default());
    let listener = EngineListener::new(&engine, &view_model);

    info!("Starting replay of {fixes_in_track} fixes");

    let fixes_delivered = engine
        .run(&listener, cancel)
        .await
        .context("Replay failed")?;

    let ui = view_model.as_ui_state();

    Ok(ReplaySummary {
        fixes_in_track,
        fixes_delivered,
        fixes_received: ui.fixes_received,
        ui_updates: view_model.state_update_sender().count(),
        distance_meters: ui.distance_meters,
        last_location: ui.location,
        cancelled: cancel.is_cancelled(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::test;

    const TRACK: &str = r#"[
        {"lat": 43.0840, "long": -77.6760, "heading": 90.0, "accuracy": 4.0, "timestamp": "2024-05-01T12:00:00Z"},
        {"lat": 43.0840, "long": -77.6750, "timestamp": "2024-05-01T12:00:01Z"},
        {"lat": 43.0845, "long": -77.6750, "heading": null, "accuracy": 6.5, "timestamp": "2024-05-01T12:00:02Z"}
    ]"#;

    fn options(seed_last_known: bool) -> ReplayOptions {
        ReplayOptions {
            interval: Duration::from_millis(250),
            seed_last_known,
        }
    }

    #[test]
    async fn test_parse_track() {
        let track = parse_track(TRACK).expect("Failed to parse");

        assert_eq!(track.len(), 3);
        assert_eq!(track[0].heading, Some(90.0));
        assert_eq!(track[1].heading, None);
        assert_eq!(track[1].accuracy, None);
        assert_eq!(track[2].accuracy, Some(6.5));
        assert!(track[0].timestamp < track[1].timestamp);
    }

    #[test]
    async fn test_parse_rejects_empty_track() {
        let err = parse_track("[]").expect_err("Empty track accepted");
        assert!(err.to_string().contains("no fixes"), "Got {err}");
    }

    #[test]
    async fn test_parse_rejects_malformed_track() {
        assert!(parse_track(r#"[{"lat": 1.0}]"#).is_err());
        assert!(parse_track("not json").is_err());
        assert!(parse_track(r#"{"lat": 1.0, "long": 2.0}"#).is_err());
    }

    #[test]
    async fn test_read_missing_file() {
        let err = read_track(Path::new("/definitely/not/a/track.json"))
            .expect_err("Missing file accepted");
        assert!(
            format!("{err:#}").contains("Failed to read track file"),
            "Got {err:#}"
        );
    }

    #[test]
    async fn test_replay_full_track() {
        tokio::time::pause();
        let track = parse_track(TRACK).unwrap();
        let expected_distance = track[0].distance_to(&track[1]) + track[1].distance_to(&track[2]);

        let summary = replay(track.clone(), &options(false), &CancellationToken::new())
            .await
            .expect("Replay failed");

        assert_eq!(summary.fixes_in_track, 3);
        assert_eq!(summary.fixes_delivered, 3);
        assert_eq!(summary.fixes_received, 3);
        assert_eq!(summary.ui_updates, 3);
        assert_eq!(summary.last_location, Some(track[2]));
        assert!((summary.distance_meters - expected_distance).abs() < 1e-6);
        assert!(!summary.cancelled);
    }

    #[test]
    async fn test_replay_seeded_last_known() {
        tokio::time::pause();
        let track = parse_track(TRACK).unwrap();

        let summary = replay(track.clone(), &options(true), &CancellationToken::new())
            .await
            .expect("Replay failed");

        // First fix arrives through the last known location, the rest are live
        assert_eq!(summary.fixes_delivered, 2);
        assert_eq!(summary.fixes_received, 3);
        assert_eq!(summary.last_location, Some(track[2]));
    }

    #[test]
    async fn test_replay_cancelled() {
        tokio::time::pause();
        let track = parse_track(TRACK).unwrap();
        let cancel = CancellationToken::new();
        cancel.cancel();

        let summary = replay(track, &options(true), &cancel)
            .await
            .expect("Replay failed");

        assert!(summary.cancelled);
        assert_eq!(summary.fixes_delivered, 0);
        // Last known fix is still forwarded on connect
        assert_eq!(summary.fixes_received, 1);
        assert!(summary.to_string().contains("(cancelled)"));
    }

    #[test]
    async fn test_replay_cancelled_mid_track() {
        tokio::time::pause();
        let track = parse_track(TRACK).unwrap();
        let cancel = CancellationToken::new();
        let opts = options(false);

        let (summary, _) = tokio::join!(replay(track.clone(), &opts, &cancel), async {
            tokio::time::sleep(opts.interval * 3 / 2).await;
            cancel.cancel();
        });
        let summary = summary.expect("Replay failed");

        assert!(summary.cancelled);
        assert_eq!(summary.fixes_delivered, 2);
        assert_eq!(summary.fixes_received, 2);
        assert_eq!(summary.last_location, Some(track[1]));
    }

    #[test]
    async fn test_replay_zero_interval() {
        let track = parse_track(TRACK).unwrap();
        let opts = ReplayOptions {
            interval: Duration::ZERO,
            seed_last_known: false,
        };

        assert!(replay(track, &opts, &CancellationToken::new()).await.is_err());
    }
}
