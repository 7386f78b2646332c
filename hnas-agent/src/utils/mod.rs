//! Utility modules for the HNAS hooks.

pub mod errors;
pub mod logger;

pub use errors::{HookError, Result};
