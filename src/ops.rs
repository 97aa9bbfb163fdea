//! Integration with the system `git` binary.
//!
//! - [`git`]: the [`GitOps`](git::GitOps) trait, one method per git invocation
//!   the workflow needs, and [`RealGit`](git::RealGit), which runs them in a
//!   single directory
//!
//! The trait is mocked in unit tests so the workflow's fallback paths can be
//! exercised without a remote.

pub mod git;
