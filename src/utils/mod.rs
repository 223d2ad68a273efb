//! Utility functions and helpers for the offline gateway.
//!
//! # Submodules
//!
//! - `logging`: Tracing and logging initialization.
//!
//! Author: kelexine (<https://github.com/kelexine>)

pub mod logging;
