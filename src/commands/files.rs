use std::path::Path;

use anyhow::Result;

use crate::App;
use crate::app::write_json;
use crate::files::list_entries;
use crate::report::Report;

impl<R: Report> App<R> {
    /// Show the top-level files and directories of a working copy.
    pub async fn cmd_files(
        &self,
        dir: &Path,
        json: bool,
        stdout: &mut impl std::io::Write,
    ) -> Result<bool> {
        let entries = match list_entries(dir).await {
            Ok(entries) => entries,
            Err(err) => {
                self.reporter.error(&format!("Error listing files: {err:#}"));
                return Ok(false);
            }
        };

        if json {
            write_json(stdout, &entries)?;
        } else {
            for entry in &entries {
                writeln!(stdout, "{}", entry)?;
            }
        }
        Ok(true)
    }
}
