mod engine;
mod listener;
mod location;
mod view_model;

use chrono::{DateTime, Utc};

pub use engine::{LocationEngine, ReplayEngine};
pub use listener::{EngineListener, LocationEngineListener, LocationSink};
pub use location::{Location, LocationComponent};
pub use view_model::{LocationUiState, LocationViewModel, StateUpdateSender};

/// Convenience alias for UTC DT
pub type UtcDT = DateTime<Utc>;

pub mod prelude {
    use anyhow::Error as AnyhowError;
    use std::result::Result as StdResult;
    pub type Result<T = (), E = AnyhowError> = StdResult<T, E>;
    pub use anyhow::Context;
}
