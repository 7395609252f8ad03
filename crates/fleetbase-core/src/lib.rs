//! Fleetbase engine: tenant configuration and type composition.
//!
//! The engine owns the rules; storage and deployable-set lookups come in
//! through the adapter traits of `fleetbase-types`, and the REST binding sits
//! in the `fleetbase` crate.

#![deny(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![forbid(unsafe_code)]

pub mod app;
pub mod catalog;
pub mod composition;
pub mod core_settings;
pub mod extract;
pub mod middleware;
pub mod prelude;
pub mod query;
pub mod settings;

// Re-export commonly used types
pub use app::{App, AppBuilderOpts, AppState};
pub use extract::{OptionalRequestId, RequestId};

pub fn register_settings(
	registry: &mut settings::ConfigKeyRegistry,
) -> fleetbase_types::error::FbResult<()> {
	core_settings::register_settings(registry)
}

// vim: ts=4
