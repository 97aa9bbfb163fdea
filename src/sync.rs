//! The repository synchronization workflow.
//!
//! - [`branches`]: list the branches a remote advertises (read only)
//! - [`provision`]: turn a directory into a working copy checked out on a branch
//! - [`identity`]: apply commit author settings to a working copy
//! - [`publish`]: stage a file selection, commit, push and verify
//!
//! Each step reports through a [`Report`](crate::report::Report) sink and
//! returns a [`SyncResult`](crate::error::SyncResult); none of them panics
//! or lets a git failure escape unreported.

pub mod branches;
pub mod identity;
pub mod provision;
pub mod publish;

pub use branches::list_branches;
pub use identity::Identity;
pub use identity::configure_identity;
pub use provision::provision;
pub use publish::publish;
