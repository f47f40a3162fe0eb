//! Shared utilities for Sabun binaries.

pub mod logger;
pub mod time;
