//! Mandatory and optional module type endpoints of distribution set types

pub mod handler;

// vim: ts=4
