use std::sync::{Mutex, MutexGuard, PoisonError};

use serde::{Deserialize, Serialize};

use crate::{listener::LocationSink, location::Location};

/// Notifies the presentation layer that state changed and should be re-read
pub trait StateUpdateSender {
    fn send_update(&self);
}

/// Snapshot of a [LocationViewModel] to hand to a UI
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct LocationUiState {
    /// Most recent fix, `None` until one arrives
    pub location: Option<Location>,
    pub fixes_received: usize,
    /// Distance covered between consecutive fixes, in meters
    pub distance_meters: f64,
}

#[derive(Default)]
struct ViewModelState {
    history: Vec<Location>,
    distance_meters: f64,
}

/// Holds the current location and where we've been, tells the UI when either changes.
pub struct LocationViewModel<S: StateUpdateSender> {
    state: Mutex<ViewModelState>,
    state_update_sender: S,
}

impl<S: StateUpdateSender> LocationViewModel<S> {
    pub fn new(state_update_sender: S) -> Self {
        Self {
            state: Mutex::new(ViewModelState::default()),
            state_update_sender,
        }
    }

    fn lock_state(&self) -> MutexGuard<'_, ViewModelState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn state_update_sender(&self) -> &S {
        &self.state_update_sender
    }

    pub fn current_location(&self) -> Option<Location> {
        self.lock_state().history.last().copied()
    }

    pub fn history(&self) -> Vec<Location> {
        self.lock_state().history.clone()
    }

    pub fn distance_meters(&self) -> f64 {
        self.lock_state().distance_meters
    }

    pub fn as_ui_state(&self) -> LocationUiState {
        let state = self.lock_state();
        LocationUiState {
            location: state.history.last().copied(),
            fixes_received: state.history.len(),
            distance_meters: state.distance_meters,
        }
    }
}

impl<S: StateUpdateSender> LocationSink for LocationViewModel<S> {
    fn update_location(&self, location: &Location) {
        let mut state = self.lock_state();
        if let Some(prev) = state.history.last() {
            state.distance_meters += prev.distance_to(location);
        }
        state.history.push(*location);
        drop(state);

        self.state_update_sender.send_update();
    }
}
