use std::path::Path;
use std::path::PathBuf;

use tracing::instrument;

use crate::config::Config;
use crate::error::SyncError;
use crate::error::SyncResult;
use crate::files::Entry;
use crate::files::FileSource;
use crate::files::list_entries;
use crate::ops::git::CommitId;
use crate::ops::git::GitOps;
use crate::ops::git::RealGit;
use crate::report::Report;
use crate::sync;
use crate::sync::Identity;

/// Everything one user works with across the steps of a sync: which remote,
/// which branch, which directory, and who commits.
///
/// The session holds inputs only; the working copy on disk is the sole
/// durable state.
pub struct Session<G = RealGit> {
    git: G,
    repo_url: String,
    branch: String,
    local_dir: PathBuf,
    identity: Identity,
    provisioned: bool,
}

impl Session<RealGit> {
    pub fn new(repo_url: String, branch: String, local_dir: PathBuf) -> Self {
        Self::with_git(RealGit::new(&local_dir), repo_url, branch, local_dir)
    }

    /// Resume work in a directory that is already a working copy.
    pub async fn attach(local_dir: PathBuf, branch: String) -> SyncResult<Self> {
        let mut session = Self::new(String::new(), branch, local_dir);
        if !session.git.is_repo_root().await {
            return Err(SyncError::precondition(format!(
                "{} is not a git working copy. Set up the repository first.",
                session.local_dir.display()
            )));
        }
        session.provisioned = true;
        Ok(session)
    }
}

impl<G: GitOps> Session<G> {
    pub fn with_git(git: G, repo_url: String, branch: String, local_dir: PathBuf) -> Self {
        Self {
            git,
            repo_url,
            branch,
            local_dir,
            identity: Identity::default(),
            provisioned: false,
        }
    }

    /// Record an identity without applying it; setup and every commit apply it.
    pub fn with_identity(mut self, identity: Identity) -> Self {
        self.identity = identity;
        self
    }

    pub fn branch(&self) -> &str {
        &self.branch
    }

    pub fn local_dir(&self) -> &Path {
        &self.local_dir
    }

    pub fn identity(&self) -> &Identity {
        &self.identity
    }

    pub fn is_provisioned(&self) -> bool {
        self.provisioned
    }

    /// Provision the working copy for the session's remote and branch.
    #[instrument(skip_all, fields(url = %self.repo_url, branch = %self.branch))]
    pub async fn setup(&mut self, config: &Config, reporter: &impl Report) -> SyncResult<()> {
        let checks = [
            (self.repo_url.trim().is_empty(), "Please enter a repository URL"),
            (self.branch.trim().is_empty(), "Please select or enter a branch"),
            (
                self.local_dir.as_os_str().is_empty(),
                "Please enter a local folder path",
            ),
        ];
        if let Some((_, message)) = checks.iter().find(|(failed, _)| *failed) {
            reporter.error(message);
            return Err(SyncError::precondition(*message));
        }

        self.provisioned = false;
        sync::provision(
            &self.git,
            &self.repo_url,
            &self.branch,
            &self.identity,
            config,
            reporter,
        )
        .await?;
        self.provisioned = true;
        Ok(())
    }

    /// Record a new identity, re-applying it to a provisioned working copy
    /// when it differs from the current one. Returns whether it changed.
    pub async fn set_identity(
        &mut self,
        identity: Identity,
        reporter: &impl Report,
    ) -> SyncResult<bool> {
        if identity == self.identity {
            return Ok(false);
        }
        self.identity = identity;

        if self.provisioned {
            sync::configure_identity(&self.git, &self.identity, reporter).await?;
            reporter.success("Git user configuration updated!");
        }
        Ok(true)
    }

    /// Top-level entries of the working copy.
    pub async fn entries(&self) -> anyhow::Result<Vec<Entry>> {
        list_entries(&self.local_dir).await
    }

    /// Bring in files from `source`, then commit and push them.
    #[instrument(skip_all, fields(branch = %self.branch))]
    pub async fn commit_and_push(
        &self,
        source: &impl FileSource,
        message: &str,
        config: &Config,
        reporter: &impl Report,
    ) -> SyncResult<CommitId> {
        if !self.provisioned {
            let err = SyncError::precondition("Set up the repository first");
            reporter.error(&err.to_string());
            return Err(err);
        }

        let selection = match source.collect(&self.local_dir).await {
            Ok(selection) => selection,
            Err(err) => {
                reporter.error(&err.to_string());
                return Err(err);
            }
        };

        if selection.is_empty() || message.trim().is_empty() {
            let err = SyncError::precondition("Please select files and enter a commit message");
            reporter.error(&err.to_string());
            return Err(err);
        }

        sync::publish(
            &self.git,
            &selection,
            message,
            &self.branch,
            &self.identity,
            config,
            reporter,
        )
        .await
    }
}
