use tracing::debug;
use tracing::info;
use tracing::instrument;

use crate::config::Config;
use crate::error::Step as _;
use crate::error::SyncResult;
use crate::ops::git::GitOps;
use crate::report::Report;
use crate::sync::identity::Identity;
use crate::sync::identity::apply_commit_policy;
use crate::sync::publish::push_branch;

/// Candidates for the commit a new branch starts from, before one is synthesized.
const BASE_BRANCHES: [&str; 2] = ["main", "master"];

/// Make the working copy behind `git` a checkout of `branch` from `url`.
///
/// The directory may be missing, empty, unrelated, or an existing working
/// copy of this or another remote. A branch the remote lacks is created from
/// a base branch, seeded with an empty commit and pushed.
#[instrument(skip(git, identity, config, reporter))]
pub async fn provision(
    git: &impl GitOps,
    url: &str,
    branch: &str,
    identity: &Identity,
    config: &Config,
    reporter: &impl Report,
) -> SyncResult<()> {
    let result = provision_inner(git, url, branch, identity, config, reporter).await;
    if let Err(err) = &result {
        reporter.error(&err.to_string());
    }
    result
}

async fn provision_inner(
    git: &impl GitOps,
    url: &str,
    branch: &str,
    identity: &Identity,
    config: &Config,
    reporter: &impl Report,
) -> SyncResult<()> {
    attach_origin(git, url).await?;
    git.fetch_all().await.during("fetching from origin")?;
    apply_commit_policy(git, identity)
        .await
        .during("configuring repository")?;

    let remote_branches = git
        .remote_branches()
        .await
        .during("listing remote branches")?;

    if remote_branches.iter().any(|b| b == branch) {
        checkout_existing(git, branch).await
    } else {
        create_and_push(git, branch, &remote_branches, config, reporter).await
    }
}

/// Reuse or initialize the repository and point `origin` at `url`.
async fn attach_origin(git: &impl GitOps, url: &str) -> SyncResult<()> {
    if git.is_repo_root().await {
        debug!("reusing existing repository");
        if let Err(err) = git.add_remote(url).await {
            // Most likely the remote already exists
            debug!(%err, "remote add failed, repointing origin");
            git.set_remote_url(url).await.during("setting origin URL")?;
        }
    } else {
        info!("initializing repository");
        git.init().await.during("initializing repository")?;
        git.add_remote(url).await.during("adding origin")?;
    }
    Ok(())
}

/// Check out a branch the remote already has, tracking it.
async fn checkout_existing(git: &impl GitOps, branch: &str) -> SyncResult<()> {
    if git
        .local_branch_exists(branch)
        .await
        .during("during branch checkout")?
    {
        git.checkout(branch).await.during("during branch checkout")?;
    } else {
        git.checkout_tracking(branch)
            .await
            .during("during branch checkout")?;
    }
    info!(branch, "checked out remote branch");
    Ok(())
}

/// Create a branch the remote does not have yet and publish it.
async fn create_and_push(
    git: &impl GitOps,
    branch: &str,
    remote_branches: &[String],
    config: &Config,
    reporter: &impl Report,
) -> SyncResult<()> {
    let base = checkout_base(git, remote_branches, &config.default_branch).await?;

    if base != branch {
        if git
            .local_branch_exists(branch)
            .await
            .during("creating branch")?
        {
            git.checkout(branch).await.during("creating branch")?;
        } else {
            git.create_branch(branch).await.during("creating branch")?;
            git.commit_empty(&format!("Initial commit for branch {branch}"))
                .await
                .during("creating branch")?;
        }
    }

    push_branch(git, branch, config, reporter).await?;
    reporter.info(&format!("Created and pushed new branch '{branch}'"));
    Ok(())
}

/// Check out the first base branch that exists, or synthesize one.
///
/// A freshly created remote has no commits to branch from, so the fallback
/// is a local `default_branch` holding a single empty commit.
async fn checkout_base(
    git: &impl GitOps,
    remote_branches: &[String],
    default_branch: &str,
) -> SyncResult<String> {
    for candidate in BASE_BRANCHES {
        let exists = remote_branches.iter().any(|b| b == candidate)
            || git
                .local_branch_exists(candidate)
                .await
                .during("resolving base branch")?;
        if !exists {
            continue;
        }
        match git.checkout(candidate).await {
            Ok(()) => {
                debug!(base = candidate, "using existing base branch");
                return Ok(candidate.to_string());
            }
            Err(err) => debug!(%err, base = candidate, "base branch checkout failed"),
        }
    }

    info!(base = default_branch, "no base branch, creating one");
    git.create_branch(default_branch)
        .await
        .during("creating base branch")?;
    git.commit_empty("Initial commit")
        .await
        .during("creating base branch")?;
    Ok(default_branch.to_string())
}
