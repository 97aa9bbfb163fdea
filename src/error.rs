//! Failure kinds returned at component boundaries.
//!
//! ```text
//!   SyncError
//!     Precondition    bad input, nothing attempted
//!     NothingToCommit staging produced no change
//!     Git             a git step failed (clone/fetch/checkout/config/stage)
//!     Commit          commit refused
//!     Push            normal and (if allowed) force push both failed
//!     Unverified      push returned success but the remote ref is absent
//! ```

use serde::Serialize;
use thiserror::Error;

use crate::ops::git::CommitId;

/// Result type using [`SyncError`].
pub type SyncResult<T> = std::result::Result<T, SyncError>;

#[derive(Debug, Error)]
pub enum SyncError {
    #[error("{0}")]
    Precondition(String),

    #[error("No changes to commit. Please make changes to files first.")]
    NothingToCommit,

    #[error("Error {step}: {source:#}")]
    Git {
        step: &'static str,
        #[source]
        source: anyhow::Error,
    },

    #[error("Error committing changes: {0:#}")]
    Commit(#[source] anyhow::Error),

    #[error("Error pushing changes: {0:#}")]
    Push(#[source] anyhow::Error),

    #[error("Push might have failed - branch {branch} not found on remote")]
    Unverified { branch: String },
}

/// Coarse classification used by callers to decide how to present a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// Rejected before any git command ran, or nothing to do.
    Precondition,
    /// A git or network step failed.
    Operation,
    /// The push looked successful but the remote does not show the branch.
    Verification,
}

impl SyncError {
    pub fn precondition(message: impl Into<String>) -> Self {
        Self::Precondition(message.into())
    }

    pub fn kind(&self) -> FailureKind {
        match self {
            Self::Precondition(_) | Self::NothingToCommit => FailureKind::Precondition,
            Self::Git { .. } | Self::Commit(_) | Self::Push(_) => FailureKind::Operation,
            Self::Unverified { .. } => FailureKind::Verification,
        }
    }
}

/// Attach the step that was running to a plumbing error.
pub trait Step<T> {
    fn during(self, step: &'static str) -> SyncResult<T>;
}

impl<T> Step<T> for anyhow::Result<T> {
    fn during(self, step: &'static str) -> SyncResult<T> {
        self.map_err(|source| SyncError::Git { step, source })
    }
}

/// Outcome of a publish cycle as seen from the remote.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum PushResult {
    VerifiedSuccess,
    UnverifiedFailure,
    HardFailure,
}

impl PushResult {
    pub fn of(result: &SyncResult<CommitId>) -> Self {
        match result {
            Ok(_) => Self::VerifiedSuccess,
            Err(SyncError::Unverified { .. }) => Self::UnverifiedFailure,
            Err(_) => Self::HardFailure,
        }
    }
}

#[cfg(test)]
mod tests {
    use anyhow::anyhow;

    use super::*;

    #[test]
    fn test_kind() {
        assert_eq!(
            SyncError::precondition("empty").kind(),
            FailureKind::Precondition
        );
        assert_eq!(SyncError::NothingToCommit.kind(), FailureKind::Precondition);
        assert_eq!(
            SyncError::Push(anyhow!("rejected")).kind(),
            FailureKind::Operation
        );
        assert_eq!(
            SyncError::Unverified {
                branch: "dev".to_string()
            }
            .kind(),
            FailureKind::Verification
        );
    }

    #[test]
    fn test_during() {
        let result: anyhow::Result<()> = Err(anyhow!("connection refused"));
        let err = result.during("fetching from origin").unwrap_err();
        assert_eq!(
            err.to_string(),
            "Error fetching from origin: connection refused"
        );
    }

    #[test]
    fn test_push_result_of() {
        let ok: SyncResult<CommitId> = Ok(CommitId("abc".to_string()));
        assert_eq!(PushResult::of(&ok), PushResult::VerifiedSuccess);

        let unverified: SyncResult<CommitId> = Err(SyncError::Unverified {
            branch: "dev".to_string(),
        });
        assert_eq!(PushResult::of(&unverified), PushResult::UnverifiedFailure);

        let failed: SyncResult<CommitId> = Err(SyncError::Commit(anyhow!("no identity")));
        assert_eq!(PushResult::of(&failed), PushResult::HardFailure);
    }
}
