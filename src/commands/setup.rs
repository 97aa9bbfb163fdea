use std::path::PathBuf;

use anyhow::Result;

use crate::App;
use crate::report::Report;
use crate::session::Session;
use crate::sync::Identity;

impl<R: Report> App<R> {
    /// Provision `dir` as a working copy of `url` checked out on `branch`.
    pub async fn cmd_setup(
        &self,
        url: String,
        branch: String,
        dir: PathBuf,
        identity: Identity,
        stdout: &mut impl std::io::Write,
    ) -> Result<bool> {
        let mut session = Session::new(url, branch, dir).with_identity(identity);

        if session.setup(&self.config, &self.reporter).await.is_err() {
            return Ok(false);
        }

        self.reporter.success(&format!(
            "Repository ready at {} on branch '{}'",
            session.local_dir().display(),
            session.branch()
        ));
        for entry in session.entries().await? {
            writeln!(stdout, "{}", entry)?;
        }
        Ok(true)
    }
}
