//! Fleetbase is the tenant configuration and type-composition engine of a
//! device fleet backend.
//!
//! # Features
//!
//! - Multi-tenant (tenant named by the `X-Tenant` header)
//! - Typed configuration keys with per-tenant overrides
//!     - boolean, integer, string, duration and enumerated values
//!     - validators evaluated before anything is stored
//! - Type catalog
//!     - software module types
//!     - distribution set types with mandatory and optional members
//! - Paged, sorted and filtered listings

#![deny(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![forbid(unsafe_code)]

// Re-export shared types and adapter traits from fleetbase-types
pub use fleetbase_types::deployment_adapter;
pub use fleetbase_types::error;
pub use fleetbase_types::meta_adapter;
pub use fleetbase_types::types;

// Engine re-exports
pub use fleetbase_core::query;

pub mod app;
pub mod catalog;
pub mod composition;
pub mod prelude;
pub mod response;
pub mod routes;
pub mod settings;

pub use crate::app::{App, AppBuilder};

// vim: ts=4
