use log::{debug, trace};

use crate::{engine::LocationEngine, location::Location};

/// Callbacks a [LocationEngine] invokes as its lifecycle progresses
pub trait LocationEngineListener {
    /// A new fix is available
    fn on_location_changed(&self, location: &Location);
    /// The engine is ready to deliver fixes
    fn on_connected(&self);
}

/// Something that holds the latest location for presentation
pub trait LocationSink {
    fn update_location(&self, location: &Location);
}

/// Relays fixes from a [LocationEngine] into a [LocationSink].
///
/// Borrows both collaborators, whoever wires this up owns them and they must outlive the
/// listener. Location permission is *not* checked here, the owner is expected to have it before
/// letting the engine connect.
pub struct EngineListener<'a, E: LocationEngine + ?Sized, S: LocationSink + ?Sized> {
    engine: &'a E,
    sink: &'a S,
}

impl<'a, E: LocationEngine + ?Sized, S: LocationSink + ?Sized> EngineListener<'a, E, S> {
    pub fn new(engine: &'a E, sink: &'a S) -> Self {
        Self { engine, sink }
    }
}

impl<E: LocationEngine + ?Sized, S: LocationSink + ?Sized> LocationEngineListener
    for EngineListener<'_, E, S>
{
    fn on_location_changed(&self, location: &Location) {
        trace!("Forwarding fix at ({}, {})", location.lat, location.long);
        self.sink.update_location(location);
    }

    fn on_connected(&self) {
        self.engine.request_location_updates();

        // Give the sink something to show before the first live update arrives
        if let Some(last) = self.engine.last_location() {
            debug!("Forwarding last known fix");
            self.on_location_changed(&last);
        } else {
            debug!("No last known fix, waiting for updates");
        }
    }
}
