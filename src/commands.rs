//! One module per CLI command, each an `impl App` block.
//!
//! Commands write their data (branch names, entries, commit ids) to the
//! given `stdout` and status through the app's reporter, and return whether
//! the operation succeeded.

pub mod branches;
pub mod files;
pub mod identity;
pub mod publish;
pub mod setup;
pub mod sync;
