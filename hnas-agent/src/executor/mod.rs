//! Hook executors - the pre-backup and post-backup phases.
//!
//! Both run strictly sequentially against one [`HnasClient`](crate::hnas::HnasClient)
//! and communicate only through the manifest file.

pub mod post;
pub mod pre;

pub use post::{run_post_backup, should_cleanup, JobResult, PostBackupReport};
pub use pre::{run_pre_backup, PreBackupReport};
