//! Utility functions and types.
//!
//! This module provides small utilities used throughout the runtime,
//! currently log level handling.

pub mod logging;

pub use logging::LogLevel;
