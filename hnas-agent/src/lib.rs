//! HNAS Agent Library
//!
//! Snapshot and SMB share lifecycle for Hitachi HNAS filesystems, driven by
//! backup job pre/post hooks.

pub mod config;
pub mod executor;
pub mod hnas;
pub mod manifest;
pub mod naming;
pub mod resolve;
pub mod retention;
pub mod utils;

// Re-export commonly used types
pub use config::{Config, PostConfig, PreConfig};
pub use hnas::HnasClient;
pub use manifest::Manifest;
pub use utils::errors::HookError;
pub type Result<T> = std::result::Result<T, HookError>;
