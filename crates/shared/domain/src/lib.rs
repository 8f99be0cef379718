//! # Domain Types
//!
//! Configuration and shared constants for the beacon workspace.
//! Depends on `serde` only: no I/O, no runtime.

pub mod config;
pub mod constants;
