use std::path::PathBuf;

use anyhow::Result;
use serde::Serialize;

use crate::App;
use crate::app::write_json;
use crate::config::Config;
use crate::error::PushResult;
use crate::error::SyncResult;
use crate::files::LocalFiles;
use crate::files::UploadDir;
use crate::ops::git::CommitId;
use crate::ops::git::GitOps;
use crate::report::Report;
use crate::session::Session;
use crate::sync::Identity;

#[derive(Serialize)]
struct Published<'a> {
    result: PushResult,
    branch: &'a str,
    commit: Option<&'a CommitId>,
}

impl<R: Report> App<R> {
    /// Commit and push files from an existing working copy.
    #[allow(clippy::too_many_arguments)]
    pub async fn cmd_publish(
        &self,
        dir: PathBuf,
        branch: String,
        message: &str,
        paths: Vec<String>,
        intake: Option<PathBuf>,
        identity: Identity,
        json: bool,
        stdout: &mut impl std::io::Write,
    ) -> Result<bool> {
        if !self.require(&[
            (branch.as_str(), "Please select or enter a branch"),
            (message, "Please select files and enter a commit message"),
        ]) {
            return Ok(false);
        }

        let session = match Session::attach(dir, branch).await {
            Ok(session) => session.with_identity(identity),
            Err(err) => {
                self.reporter.error(&err.to_string());
                return Ok(false);
            }
        };

        let result = commit_from(&session, paths, intake, message, &self.config, &self.reporter).await;
        write_outcome(stdout, session.branch(), &result, json)?;
        Ok(result.is_ok())
    }
}

/// Commit either uploaded files or paths already in the working copy.
pub(crate) async fn commit_from<G: GitOps>(
    session: &Session<G>,
    paths: Vec<String>,
    intake: Option<PathBuf>,
    message: &str,
    config: &Config,
    reporter: &impl Report,
) -> SyncResult<CommitId> {
    match intake {
        Some(dir) => {
            session
                .commit_and_push(&UploadDir::new(dir), message, config, reporter)
                .await
        }
        None => {
            session
                .commit_and_push(&LocalFiles::new(paths), message, config, reporter)
                .await
        }
    }
}

pub(crate) fn write_outcome(
    stdout: &mut impl std::io::Write,
    branch: &str,
    result: &SyncResult<CommitId>,
    json: bool,
) -> Result<()> {
    if json {
        write_json(
            stdout,
            &Published {
                result: PushResult::of(result),
                branch,
                commit: result.as_ref().ok(),
            },
        )?;
    } else if let Ok(commit) = result {
        writeln!(stdout, "{}", commit)?;
    }
    Ok(())
}
