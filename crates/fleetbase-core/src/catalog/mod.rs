//! Type catalog: software module types and distribution set types
//!
//! Base records only. Membership of distribution set types is changed through
//! [`crate::composition`]; the catalog just accepts an initial membership on
//! create.

pub mod service;

pub use service::{CatalogService, MAX_DESCRIPTION_LEN, MAX_KEY_LEN, MAX_NAME_LEN};

// vim: ts=4
