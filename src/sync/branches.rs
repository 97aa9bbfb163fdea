use anyhow::Context;
use anyhow::Result;
use tracing::debug;
use tracing::instrument;
use tracing::warn;

use crate::ops::git::GitOps;
use crate::ops::git::RealGit;
use crate::report::Report;

/// List the branches a remote advertises.
///
/// Never fails: on any error the problem is reported and `[fallback]` is
/// returned. The scratch bare clone lives in a temp dir removed on return.
#[instrument(skip(reporter))]
pub async fn list_branches(url: &str, fallback: &str, reporter: &impl Report) -> Vec<String> {
    let scratch = match tempfile::Builder::new()
        .prefix("stagepush-branches-")
        .tempdir()
        .context("Failed to create scratch directory")
    {
        Ok(scratch) => scratch,
        Err(err) => {
            reporter.error(&format!("Error fetching branches: {err:#}"));
            return vec![fallback.to_string()];
        }
    };

    let git = RealGit::new(scratch.path().join("remote.git"));
    let branches = list_branches_with(&git, url, fallback, reporter).await;
    debug!(path = %scratch.path().display(), "discarding scratch clone");
    branches
}

/// Same as [`list_branches`], against a caller-supplied scratch repository.
pub async fn list_branches_with(
    git: &impl GitOps,
    url: &str,
    fallback: &str,
    reporter: &impl Report,
) -> Vec<String> {
    match fetch_branches(git, url, fallback, reporter).await {
        Ok(branches) => branches,
        Err(err) => {
            reporter.error(&format!("Error fetching branches: {err:#}"));
            vec![fallback.to_string()]
        }
    }
}

async fn fetch_branches(
    git: &impl GitOps,
    url: &str,
    fallback: &str,
    reporter: &impl Report,
) -> Result<Vec<String>> {
    git.clone_bare(url).await?;
    // The bare clone already holds every head; an empty remote has no HEAD to fetch
    if let Err(err) = git.fetch_all().await {
        warn!(%err, "fetch after clone failed");
    }

    let branches = git.ls_remote_heads().await?;
    if !branches.is_empty() {
        debug!(count = branches.len(), "remote branches found");
        return Ok(branches);
    }

    // Empty remote: use whatever default it declares, else the fallback
    let default = match git.remote_head_branch().await {
        Ok(Some(branch)) => branch,
        Ok(None) => fallback.to_string(),
        Err(err) => {
            warn!(%err, "could not read remote default branch");
            fallback.to_string()
        }
    };
    reporter.info(&format!(
        "No branches found. Using default branch '{default}'"
    ));

    Ok(vec![default])
}
