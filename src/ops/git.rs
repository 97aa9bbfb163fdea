#![allow(async_fn_in_trait)]

use std::fmt::Display;
use std::path::PathBuf;
use std::process::Output;
use std::process::Stdio;
use std::sync::LazyLock;

use anyhow::Context;
use anyhow::Result;
use anyhow::bail;
#[cfg(test)]
use mockall::automock;
use regex::Regex;
use serde::Serialize;
use tokio::process::Command;
use tracing::debug;

/// The single remote every working copy is bound to.
pub const ORIGIN: &str = "origin";

// -----------------------------------------------------------------------------
// GitOps trait

/// Operations for interacting with a single Git repository directory
#[cfg_attr(test, automock)]
pub trait GitOps {
    /// Whether the directory is itself the root of a git working tree.
    async fn is_repo_root(&self) -> bool;

    /// Create the directory if needed and run `git init` in it.
    async fn init(&self) -> Result<()>;

    /// Bare-clone `url` into the directory.
    async fn clone_bare(&self, url: &str) -> Result<()>;

    async fn add_remote(&self, url: &str) -> Result<()>;
    async fn set_remote_url(&self, url: &str) -> Result<()>;
    async fn fetch_all(&self) -> Result<()>;
    async fn fetch_origin(&self) -> Result<()>;

    /// Branch names advertised by the remote, in advertised order.
    async fn ls_remote_heads(&self) -> Result<Vec<String>>;

    /// The default branch the remote declares, if it declares one.
    async fn remote_head_branch(&self) -> Result<Option<String>>;

    async fn set_config(&self, key: &str, value: &str) -> Result<()>;

    /// Remote-tracking branches under `refs/remotes/origin/`, with the prefix stripped.
    async fn remote_branches(&self) -> Result<Vec<String>>;

    async fn local_branch_exists(&self, branch: &str) -> Result<bool>;
    async fn has_remote_ref(&self, branch: &str) -> Result<bool>;

    async fn checkout(&self, branch: &str) -> Result<()>;

    /// `checkout -b <branch> --track origin/<branch>`
    async fn checkout_tracking(&self, branch: &str) -> Result<()>;

    /// `checkout -b <branch>` from the current HEAD.
    async fn create_branch(&self, branch: &str) -> Result<()>;

    async fn commit_empty(&self, message: &str) -> Result<CommitId>;
    async fn commit(&self, message: &str) -> Result<CommitId>;

    /// Push `branch` to origin with upstream tracking, optionally forced.
    async fn push(&self, branch: &str, force: bool) -> Result<()>;

    /// Paths removed from the working tree whose removal is not yet staged.
    async fn deleted_unstaged(&self) -> Result<Vec<String>>;

    /// `add -f`, bypassing ignore rules.
    async fn add_force(&self, path: &str) -> Result<()>;

    /// Stage the removal of `path` while leaving the working tree alone.
    async fn remove_cached(&self, path: &str) -> Result<()>;

    /// True when there is nothing modified, staged or untracked.
    async fn is_clean(&self) -> Result<bool>;

    fn worktree_contains(&self, path: &str) -> bool;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommitId(pub String);

impl Display for CommitId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

// -----------------------------------------------------------------------------
// RealGit

/// Real implementation that calls the git CLI inside one directory
pub struct RealGit {
    path: PathBuf,
}

impl RealGit {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn command(&self) -> Command {
        let mut cmd = Command::new("git");
        cmd.current_dir(&self.path)
            .env("GIT_TERMINAL_PROMPT", "0")
            .stdin(Stdio::null());
        cmd
    }

    async fn output(&self, args: &[&str]) -> Result<Output> {
        debug!(path = %self.path.display(), ?args, "running git");
        self.command()
            .args(args)
            .output()
            .await
            .context("Failed to execute git command")
    }

    /// Run git and return its trimmed stdout, failing on a non-zero exit.
    async fn run(&self, args: &[&str]) -> Result<String> {
        let output = self.output(args).await?;

        if !output.status.success() {
            bail!(
                "git {} failed: {}",
                args.first().copied().unwrap_or_default(),
                String::from_utf8_lossy(&output.stderr).trim()
            );
        }

        Ok(String::from_utf8(output.stdout)?.trim().to_string())
    }

    /// Run git purely for its exit status.
    async fn succeeds(&self, args: &[&str]) -> Result<bool> {
        Ok(self.output(args).await?.status.success())
    }

    async fn head(&self) -> Result<CommitId> {
        Ok(CommitId(self.run(&["rev-parse", "HEAD"]).await?))
    }
}

impl GitOps for RealGit {
    async fn is_repo_root(&self) -> bool {
        let Ok(toplevel) = self.run(&["rev-parse", "--show-toplevel"]).await else {
            return false;
        };
        match (
            tokio::fs::canonicalize(&toplevel).await,
            tokio::fs::canonicalize(&self.path).await,
        ) {
            (Ok(toplevel), Ok(path)) => toplevel == path,
            _ => false,
        }
    }

    async fn init(&self) -> Result<()> {
        tokio::fs::create_dir_all(&self.path)
            .await
            .with_context(|| format!("Failed to create {}", self.path.display()))?;
        self.run(&["init"]).await?;
        Ok(())
    }

    async fn clone_bare(&self, url: &str) -> Result<()> {
        let dest = self.path.to_string_lossy();
        let output = Command::new("git")
            .env("GIT_TERMINAL_PROMPT", "0")
            .stdin(Stdio::null())
            .args(["clone", "--bare", "--", url, &dest])
            .output()
            .await
            .context("Failed to execute git command")?;

        if !output.status.success() {
            bail!(
                "git clone failed: {}",
                String::from_utf8_lossy(&output.stderr).trim()
            );
        }

        Ok(())
    }

    async fn add_remote(&self, url: &str) -> Result<()> {
        self.run(&["remote", "add", ORIGIN, url]).await?;
        Ok(())
    }

    async fn set_remote_url(&self, url: &str) -> Result<()> {
        self.run(&["remote", "set-url", ORIGIN, url]).await?;
        Ok(())
    }

    async fn fetch_all(&self) -> Result<()> {
        // Drop tracking refs the remote no longer has, e.g. after origin was repointed
        self.run(&["fetch", "--all", "--prune"]).await?;
        Ok(())
    }

    async fn fetch_origin(&self) -> Result<()> {
        self.run(&["fetch", "--prune", ORIGIN]).await?;
        Ok(())
    }

    async fn ls_remote_heads(&self) -> Result<Vec<String>> {
        let output = self.run(&["ls-remote", "--heads", ORIGIN]).await?;
        Ok(parse_ls_remote_heads(&output))
    }

    async fn remote_head_branch(&self) -> Result<Option<String>> {
        let output = self.run(&["remote", "show", ORIGIN]).await?;
        Ok(parse_head_branch(&output))
    }

    async fn set_config(&self, key: &str, value: &str) -> Result<()> {
        self.run(&["config", "--local", key, value]).await?;
        Ok(())
    }

    async fn remote_branches(&self) -> Result<Vec<String>> {
        let pattern = format!("refs/remotes/{ORIGIN}/");
        let output = self
            .run(&["for-each-ref", "--format=%(refname:lstrip=3)", &pattern])
            .await?;

        Ok(output
            .lines()
            .filter(|branch| !branch.is_empty() && *branch != "HEAD")
            .map(str::to_string)
            .collect())
    }

    async fn local_branch_exists(&self, branch: &str) -> Result<bool> {
        let refname = format!("refs/heads/{branch}");
        self.succeeds(&["rev-parse", "--verify", "--quiet", &refname])
            .await
    }

    async fn has_remote_ref(&self, branch: &str) -> Result<bool> {
        let refname = format!("refs/remotes/{ORIGIN}/{branch}");
        self.succeeds(&["rev-parse", "--verify", "--quiet", &refname])
            .await
    }

    async fn checkout(&self, branch: &str) -> Result<()> {
        self.run(&["checkout", branch, "--"]).await?;
        Ok(())
    }

    async fn checkout_tracking(&self, branch: &str) -> Result<()> {
        let upstream = format!("{ORIGIN}/{branch}");
        self.run(&["checkout", "-b", branch, "--track", &upstream, "--"])
            .await?;
        Ok(())
    }

    async fn create_branch(&self, branch: &str) -> Result<()> {
        self.run(&["checkout", "-b", branch, "--"]).await?;
        Ok(())
    }

    async fn commit_empty(&self, message: &str) -> Result<CommitId> {
        self.run(&["commit", "--allow-empty", "--no-gpg-sign", "-m", message])
            .await?;
        self.head().await
    }

    async fn commit(&self, message: &str) -> Result<CommitId> {
        self.run(&["commit", "--no-gpg-sign", "-m", message]).await?;
        self.head().await
    }

    async fn push(&self, branch: &str, force: bool) -> Result<()> {
        let mut args = vec!["push"];
        if force {
            args.push("-f");
        }
        args.extend(["-u", ORIGIN, branch]);
        self.run(&args).await?;
        Ok(())
    }

    async fn deleted_unstaged(&self) -> Result<Vec<String>> {
        let output = self.output(&["diff", "--name-only", "-z", "--diff-filter=D"]).await?;

        if !output.status.success() {
            bail!(
                "git diff failed: {}",
                String::from_utf8_lossy(&output.stderr).trim()
            );
        }

        Ok(String::from_utf8(output.stdout)?
            .split('\0')
            .filter(|path| !path.is_empty())
            .map(str::to_string)
            .collect())
    }

    async fn add_force(&self, path: &str) -> Result<()> {
        self.run(&["add", "-f", "--", path]).await?;
        Ok(())
    }

    async fn remove_cached(&self, path: &str) -> Result<()> {
        self.run(&["rm", "-r", "--cached", "--ignore-unmatch", "--quiet", "--", path])
            .await?;
        Ok(())
    }

    async fn is_clean(&self) -> Result<bool> {
        Ok(self.run(&["status", "--porcelain"]).await?.is_empty())
    }

    fn worktree_contains(&self, path: &str) -> bool {
        // symlink_metadata so that a dangling symlink still counts as present
        self.path.join(path).symlink_metadata().is_ok()
    }
}

// -----------------------------------------------------------------------------
// Output parsing

/// Extract branch names from `git ls-remote --heads` output.
///
/// Each line has the form `<object id>\trefs/heads/<branch>`.
pub fn parse_ls_remote_heads(output: &str) -> Vec<String> {
    output
        .lines()
        .filter_map(|line| line.split_whitespace().nth(1))
        .filter_map(|refname| refname.strip_prefix("refs/heads/"))
        .map(str::to_string)
        .collect()
}

static HEAD_BRANCH_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^\s*HEAD branch:\s*(\S+)\s*$").unwrap());

/// Extract the declared default branch from `git remote show` output.
///
/// An empty remote reports `(unknown)`, which is treated as no declaration.
pub fn parse_head_branch(output: &str) -> Option<String> {
    HEAD_BRANCH_RE
        .captures(output)
        .map(|caps| caps[1].to_string())
        .filter(|branch| branch != "(unknown)")
}
