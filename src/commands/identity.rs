use std::path::PathBuf;

use anyhow::Result;

use crate::App;
use crate::report::Report;
use crate::session::Session;
use crate::sync::Identity;

impl<R: Report> App<R> {
    /// Apply a commit identity to an existing working copy.
    pub async fn cmd_identity(&self, dir: PathBuf, identity: Identity) -> Result<bool> {
        if identity.is_empty() {
            self.reporter
                .error("Please enter a Git username or email");
            return Ok(false);
        }

        // The branch is irrelevant for configuration
        let mut session = match Session::attach(dir, String::new()).await {
            Ok(session) => session,
            Err(err) => {
                self.reporter.error(&err.to_string());
                return Ok(false);
            }
        };

        Ok(session.set_identity(identity, &self.reporter).await.is_ok())
    }
}
