use std::path::PathBuf;

use anyhow::Result;

use crate::App;
use crate::commands::publish::commit_from;
use crate::commands::publish::write_outcome;
use crate::report::Report;
use crate::session::Session;
use crate::sync::Identity;
use crate::sync::list_branches;

impl<R: Report> App<R> {
    /// Run a whole cycle: look up branches, set up the working copy, bring in
    /// the files, then commit and push.
    #[allow(clippy::too_many_arguments)]
    pub async fn cmd_sync(
        &self,
        url: String,
        branch: String,
        dir: PathBuf,
        message: &str,
        paths: Vec<String>,
        intake: Option<PathBuf>,
        identity: Identity,
        json: bool,
        stdout: &mut impl std::io::Write,
    ) -> Result<bool> {
        if !self.require(&[
            (url.as_str(), "Please enter a repository URL"),
            (branch.as_str(), "Please select or enter a branch"),
            (message, "Please select files and enter a commit message"),
        ]) {
            return Ok(false);
        }

        let branches = list_branches(&url, &self.config.default_branch, &self.reporter).await;
        if !branches.contains(&branch) {
            self.reporter.info(&format!(
                "Branch '{branch}' not found on remote, it will be created"
            ));
        }

        let mut session = Session::new(url, branch, dir).with_identity(identity);
        if session.setup(&self.config, &self.reporter).await.is_err() {
            return Ok(false);
        }

        let result = commit_from(&session, paths, intake, message, &self.config, &self.reporter).await;
        write_outcome(stdout, session.branch(), &result, json)?;
        Ok(result.is_ok())
    }
}
