//! Shared types, storage contract traits, and error types for Fleetbase.
//!
//! This crate holds what the engine, the storage adapters and the REST
//! binding all need to agree on, so adapter crates compile independently of
//! the engine.

pub mod deployment_adapter;
pub mod error;
pub mod extract;
pub mod meta_adapter;
pub mod prelude;
pub mod types;

// vim: ts=4
