//! Tenant configuration subsystem
//!
//! - **Types** (`types.rs`): typed values, key definitions and the key registry
//! - **Service** (`service.rs`): per-tenant value store with default fallback
//! - **Duration** (`duration.rs`): text format of duration-typed keys
//!
//! Keys are registered once at startup, then the registry is frozen. A tenant
//! either has an override for a key or sees the key's default; overrides are
//! type checked and validated on every write.

pub mod duration;
pub mod service;
pub mod types;

pub use service::SettingsService;
pub use types::{
	ConfigEntry, ConfigKeyDefinition, ConfigKeyDefinitionBuilder, ConfigKeyRegistry, ConfigValue,
	FrozenConfigKeyRegistry, ValueType,
};

// vim: ts=4
