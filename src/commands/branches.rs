use anyhow::Result;

use crate::App;
use crate::app::write_json;
use crate::report::Report;
use crate::sync::list_branches;

impl<R: Report> App<R> {
    /// List the branches of a remote, one per line (or as a JSON array).
    pub async fn cmd_branches(
        &self,
        url: &str,
        json: bool,
        stdout: &mut impl std::io::Write,
    ) -> Result<bool> {
        if !self.require(&[(url, "Please enter a repository URL")]) {
            return Ok(false);
        }

        let branches = list_branches(url, &self.config.default_branch, &self.reporter).await;

        if json {
            write_json(stdout, &branches)?;
        } else {
            for branch in &branches {
                writeln!(stdout, "{}", branch)?;
            }
        }
        Ok(true)
    }
}
