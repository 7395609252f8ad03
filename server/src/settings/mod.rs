//! Tenant configuration endpoints

pub mod handler;

// vim: ts=4
