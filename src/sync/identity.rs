use anyhow::Result;
use tracing::debug;
use tracing::instrument;

use crate::error::Step as _;
use crate::error::SyncResult;
use crate::ops::git::GitOps;
use crate::report::Report;

/// Commit author settings. A missing field is left untouched, never cleared.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Identity {
    pub name: Option<String>,
    pub email: Option<String>,
}

impl Identity {
    pub fn new(name: Option<String>, email: Option<String>) -> Self {
        Self { name, email }
    }

    /// Fields that are present and non-blank, paired with their config key.
    fn entries(&self) -> impl Iterator<Item = (&'static str, &str)> {
        [("user.name", &self.name), ("user.email", &self.email)]
            .into_iter()
            .filter_map(|(key, value)| {
                value
                    .as_deref()
                    .map(str::trim)
                    .filter(|value| !value.is_empty())
                    .map(|value| (key, value))
            })
    }

    pub fn is_empty(&self) -> bool {
        self.entries().next().is_none()
    }
}

/// Write the identity into the working copy's local config.
pub(crate) async fn apply_identity(git: &impl GitOps, identity: &Identity) -> Result<()> {
    for (key, value) in identity.entries() {
        debug!(key, value, "setting identity");
        git.set_config(key, value).await?;
    }
    Ok(())
}

/// Disable commit signing and apply the identity.
///
/// Run at provisioning time and again before every commit, since the local
/// config may have been changed in between.
pub(crate) async fn apply_commit_policy(git: &impl GitOps, identity: &Identity) -> Result<()> {
    git.set_config("commit.gpgsign", "false").await?;
    apply_identity(git, identity).await
}

/// Apply a commit identity to a working copy. Idempotent, no network.
#[instrument(skip_all)]
pub async fn configure_identity(
    git: &impl GitOps,
    identity: &Identity,
    reporter: &impl Report,
) -> SyncResult<()> {
    match apply_identity(git, identity)
        .await
        .during("updating Git configuration")
    {
        Ok(()) => Ok(()),
        Err(err) => {
            reporter.error(&err.to_string());
            Err(err)
        }
    }
}
