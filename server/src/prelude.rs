pub use fleetbase_core::app::App;
pub use fleetbase_core::extract::OptionalRequestId;
pub use fleetbase_types::error::{Error, FbResult};
pub use fleetbase_types::types::{Patch, Timestamp, TnId};

pub use tracing::{debug, error, info, warn};

// vim: ts=4
