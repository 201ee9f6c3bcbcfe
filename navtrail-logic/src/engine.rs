use std::{
    sync::{
        Mutex, PoisonError,
        atomic::{AtomicBool, AtomicUsize, Ordering},
    },
    time::Duration,
};

use anyhow::bail;
use log::{debug, info, trace, warn};
use tokio_util::sync::CancellationToken;

use crate::{listener::LocationEngineListener, location::Location, prelude::*};

/// A source of location fixes. Implementors decide when to call back into a
/// [LocationEngineListener], the listener only ever reacts.
pub trait LocationEngine {
    /// Begin delivering continuous location updates. Fire-and-forget, any
    /// permission the platform needs must already be granted.
    fn request_location_updates(&self);
    /// Stop delivering continuous location updates
    fn remove_location_updates(&self) {}
    /// The most recent fix this engine knows about, if any
    fn last_location(&self) -> Option<Location>;
}

/// Simulated [LocationEngine] that replays a recorded track on a fixed tick.
pub struct ReplayEngine {
    fixes: Vec<Location>,
    interval: Duration,
    cursor: AtomicUsize,
    connected: AtomicBool,
    updates_requested: AtomicBool,
    last: Mutex<Option<Location>>,
}

impl ReplayEngine {
    pub fn new(fixes: Vec<Location>, interval: Duration) -> Self {
        Self {
            fixes,
            interval,
            cursor: AtomicUsize::new(0),
            connected: AtomicBool::new(false),
            updates_requested: AtomicBool::new(false),
            last: Mutex::new(None),
        }
    }

    /// Report `location` from [LocationEngine::last_location] until the first fix is delivered
    pub fn with_last_location(self, location: Location) -> Self {
        Self {
            last: Mutex::new(Some(location)),
            ..self
        }
    }

    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    pub fn updates_requested(&self) -> bool {
        self.updates_requested.load(Ordering::SeqCst)
    }

    /// Number of fixes in the track that haven't been delivered yet
    pub fn remaining(&self) -> usize {
        self.fixes
            .len()
            .saturating_sub(self.cursor.load(Ordering::SeqCst))
    }

    fn next_fix(&self) -> Option<Location> {
        let idx = self.cursor.fetch_add(1, Ordering::SeqCst);
        let fix = self.fixes.get(idx).copied();
        if fix.is_none() {
            // Don't let the cursor run away past the end
            self.cursor.store(self.fixes.len(), Ordering::SeqCst);
        }
        fix
    }

    fn set_last(&self, location: Location) {
        let mut last = self.last.lock().unwrap_or_else(PoisonError::into_inner);
        *last = Some(location);
    }

    /// Connect `listener` and replay the track to it.
    ///
    /// The listener is told about the connection once, the first time this is called. Fixes are
    /// only delivered if the listener requested updates, and delivery stops when the track runs
    /// out, updates are removed, or `cancel` fires. Calling this again resumes where the last
    /// run left off. Returns the number of fixes delivered during this call.
    pub async fn run<L: LocationEngineListener + ?Sized>(
        &self,
        listener: &L,
        cancel: &CancellationToken,
    ) -> Result<usize> {
        if self.interval.is_zero() {
            bail!("Replay interval must be greater than zero");
        }

        if !self.connected.swap(true, Ordering::SeqCst) {
            debug!("Replay engine connected");
            listener.on_connected();
        }

        if !self.updates_requested() {
            warn!("Listener never requested location updates, nothing to replay");
            return Ok(0);
        }

        info!(
            "Replaying {} fixes every {:?}",
            self.remaining(),
            self.interval
        );

        let mut interval = tokio::time::interval(self.interval);
        let mut delivered = 0;

        loop {
            tokio::select! {
                biased;

                _ = cancel.cancelled() => {
                    warn!("Replay cancelled after {delivered} fixes");
                    break;
                }

                _ = interval.tick() => {
                    if !self.updates_requested() {
                        debug!("Location updates removed, stopping replay");
                        break;
                    }

                    let Some(fix) = self.next_fix() else {
                        info!("Track exhausted after {delivered} fixes");
                        break;
                    };

                    trace!("Delivering fix {fix:?}");
                    self.set_last(fix);
                    listener.on_location_changed(&fix);
                    delivered += 1;

                    if self.remaining() == 0 {
                        info!("Track exhausted after {delivered} fixes");
                        break;
                    }
                }
            }
        }

        Ok(delivered)
    }
}

impl LocationEngine for ReplayEngine {
    fn request_location_updates(&self) {
        debug!("Location updates requested");
        self.updates_requested.store(true, Ordering::SeqCst);
    }

    fn remove_location_updates(&self) {
        debug!("Location updates removed");
        self.updates_requested.store(false, Ordering::SeqCst);
    }

    fn last_location(&self) -> Option<Location> {
        *self.last.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
