pub use crate::error::{Error, FbResult};
pub use crate::types::{Patch, Timestamp, TnId};

pub use tracing::{debug, error, info, warn};

// vim: ts=4
