use tracing::debug;
use tracing::info;
use tracing::instrument;
use tracing::warn;

use crate::config::Config;
use crate::error::Step as _;
use crate::error::SyncError;
use crate::error::SyncResult;
use crate::files::FileSelection;
use crate::ops::git::CommitId;
use crate::ops::git::GitOps;
use crate::report::Report;
use crate::sync::identity::Identity;
use crate::sync::identity::apply_commit_policy;

/// Stage `selection` plus any untracked deletions, commit, push and verify.
///
/// `branch` is assumed to be the branch currently checked out in the working
/// copy; this is not re-checked. Every failure is reported before it is
/// returned.
#[instrument(skip(git, selection, message, identity, config, reporter))]
pub async fn publish(
    git: &impl GitOps,
    selection: &FileSelection,
    message: &str,
    branch: &str,
    identity: &Identity,
    config: &Config,
    reporter: &impl Report,
) -> SyncResult<CommitId> {
    let result = publish_inner(git, selection, message, branch, identity, config, reporter).await;
    match &result {
        Ok(commit) => {
            info!(%commit, branch, "published");
            reporter.success("Changes pushed successfully and verified!");
        }
        Err(SyncError::NothingToCommit) => reporter.warning(&SyncError::NothingToCommit.to_string()),
        Err(err) => reporter.error(&err.to_string()),
    }
    result
}

async fn publish_inner(
    git: &impl GitOps,
    selection: &FileSelection,
    message: &str,
    branch: &str,
    identity: &Identity,
    config: &Config,
    reporter: &impl Report,
) -> SyncResult<CommitId> {
    if message.trim().is_empty() {
        return Err(SyncError::precondition("Commit message must not be empty"));
    }

    apply_commit_policy(git, identity)
        .await
        .during("updating Git configuration")?;

    let deleted = git
        .deleted_unstaged()
        .await
        .during("listing deleted files")?;

    stage(git, selection, &deleted, reporter).await;

    if git.is_clean().await.during("checking for changes")? {
        return Err(SyncError::NothingToCommit);
    }

    let commit = git.commit(message).await.map_err(SyncError::Commit)?;
    debug!(%commit, "committed");

    push_branch(git, branch, config, reporter).await?;
    verify_push(git, branch).await?;

    Ok(commit)
}

/// Stage every selected path, then every deletion the selection missed.
///
/// A path that fails to stage is reported and skipped; the commit guard
/// afterwards decides whether anything is left to commit.
async fn stage(
    git: &impl GitOps,
    selection: &FileSelection,
    deleted: &[String],
    reporter: &impl Report,
) {
    for path in selection.iter() {
        if git.worktree_contains(path) {
            if let Err(err) = git.add_force(path).await {
                reporter.error(&format!("Error adding file {path}: {err:#}"));
            }
        } else {
            debug!(path, "selected path missing on disk, staging removal");
            if let Err(err) = git.remove_cached(path).await {
                reporter.error(&format!("Error removing file {path}: {err:#}"));
            }
        }
    }

    for path in deleted.iter().filter(|path| !selection.covers(path)) {
        debug!(path, "staging removal of unselected deleted file");
        if let Err(err) = git.remove_cached(path).await {
            reporter.error(&format!("Error removing file {path}: {err:#}"));
        }
    }
}

/// Push with upstream tracking, retrying once as a force push when allowed.
pub(crate) async fn push_branch(
    git: &impl GitOps,
    branch: &str,
    config: &Config,
    reporter: &impl Report,
) -> SyncResult<()> {
    let Err(err) = git.push(branch, false).await else {
        return Ok(());
    };

    if !config.allow_force_push {
        return Err(SyncError::Push(err));
    }

    warn!(%err, branch, "normal push rejected, force pushing");
    reporter.warning("Normal push failed, attempting force push...");
    git.push(branch, true).await.map_err(SyncError::Push)
}

/// Fetch again and require the remote-tracking ref for `branch` to exist.
async fn verify_push(git: &impl GitOps, branch: &str) -> SyncResult<()> {
    git.fetch_origin().await.during("verifying push")?;

    if git.has_remote_ref(branch).await.during("verifying push")? {
        Ok(())
    } else {
        Err(SyncError::Unverified {
            branch: branch.to_string(),
        })
    }
}
