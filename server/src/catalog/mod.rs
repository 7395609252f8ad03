//! Software module type and distribution set type endpoints

pub mod handler;

// vim: ts=4
