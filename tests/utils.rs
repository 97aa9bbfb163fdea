#![allow(dead_code)]

use std::path::Path;
use std::process::Stdio;

use tokio::process::Command;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::Layer as _;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::layer::SubscriberExt as _;
use tracing_subscriber::util::SubscriberInitExt as _;

/// Runs git in `dir` with a fixed test identity and signing disabled.
pub async fn git(dir: &Path, args: &[&str]) -> anyhow::Result<String> {
    let output = Command::new("git")
        .args([
            "-c",
            "user.name=Test User",
            "-c",
            "user.email=test@example.com",
            "-c",
            "commit.gpgsign=false",
        ])
        .args(args)
        .current_dir(dir)
        .stdin(Stdio::null())
        .output()
        .await?;
    anyhow::ensure!(
        output.status.success(),
        "git {:?} failed: {}",
        args,
        String::from_utf8_lossy(&output.stderr)
    );

    Ok(String::from_utf8(output.stdout)?.trim().to_string())
}

/// Creates an empty bare repository to act as the remote.
pub async fn create_bare_remote(dir: &Path) -> anyhow::Result<()> {
    tokio::fs::create_dir_all(dir).await?;
    git(dir, &["init", "--bare"]).await?;
    Ok(())
}

/// Pushes one seed commit (containing README.md) to each of `branches`.
pub async fn seed_remote(scratch: &Path, remote: &Path, branches: &[&str]) -> anyhow::Result<()> {
    tokio::fs::create_dir_all(scratch).await?;
    git(scratch, &["init"]).await?;
    tokio::fs::write(scratch.join("README.md"), "seed\n").await?;
    git(scratch, &["add", "README.md"]).await?;
    git(scratch, &["commit", "-m", "Seed"]).await?;

    let remote = remote.to_string_lossy();
    for branch in branches {
        let refspec = format!("HEAD:refs/heads/{}", branch);
        git(scratch, &["push", &remote, &refspec]).await?;
    }
    Ok(())
}

/// Clones the remote into `dir`, commits a file on `branch` and pushes it.
pub async fn push_from_elsewhere(
    dir: &Path,
    remote: &Path,
    branch: &str,
    filename: &str,
    contents: &str,
) -> anyhow::Result<()> {
    let parent = dir.parent().unwrap_or(dir);
    git(
        parent,
        &[
            "clone",
            "--branch",
            branch,
            &remote.to_string_lossy(),
            &dir.to_string_lossy(),
        ],
    )
    .await?;
    tokio::fs::write(dir.join(filename), contents).await?;
    git(dir, &["add", filename]).await?;
    git(dir, &["commit", "-m", "Elsewhere"]).await?;
    git(dir, &["push", "origin", branch]).await?;
    Ok(())
}

/// Branch names present in a bare remote, sorted.
pub async fn remote_branches(remote: &Path) -> anyhow::Result<Vec<String>> {
    let output = git(
        remote,
        &["for-each-ref", "--format=%(refname:short)", "refs/heads/"],
    )
    .await?;
    let mut branches: Vec<String> = output.lines().map(str::to_string).collect();
    branches.sort();
    Ok(branches)
}

/// Tip commit of `branch` in the remote.
pub async fn remote_tip(remote: &Path, branch: &str) -> anyhow::Result<String> {
    git(remote, &["rev-parse", &format!("refs/heads/{}", branch)]).await
}

/// Number of commits reachable from `branch` in the remote.
pub async fn commit_count(remote: &Path, branch: &str) -> anyhow::Result<usize> {
    Ok(git(remote, &["rev-list", "--count", &format!("refs/heads/{}", branch)])
        .await?
        .parse()?)
}

/// Subject lines reachable from `branch` in the remote, newest first.
pub async fn subjects(remote: &Path, branch: &str) -> anyhow::Result<String> {
    git(
        remote,
        &["log", "--format=%s", &format!("refs/heads/{}", branch)],
    )
    .await
}

/// Contents of `path` at the tip of `branch`, or None if absent.
pub async fn file_at(remote: &Path, branch: &str, path: &str) -> anyhow::Result<Option<String>> {
    let object = format!("refs/heads/{}:{}", branch, path);
    match git(remote, &["show", &object]).await {
        Ok(contents) => Ok(Some(contents)),
        Err(_) => Ok(None),
    }
}

/// Current branch of a working copy.
pub async fn current_branch(dir: &Path) -> anyhow::Result<String> {
    git(dir, &["rev-parse", "--abbrev-ref", "HEAD"]).await
}

pub fn setup_logging() -> anyhow::Result<()> {
    let timer = tracing_subscriber::fmt::time::ChronoLocal::new("%H:%M:%S%.3f".into());
    let format = tracing_subscriber::fmt::format().with_timer(timer);
    let filter = tracing_subscriber::EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env()?;
    let subscriber = tracing_subscriber::fmt::layer()
        .event_format(format)
        .with_span_events(FmtSpan::NEW | FmtSpan::CLOSE)
        .with_test_writer()
        .with_filter(filter);
    tracing_subscriber::registry().with(subscriber).init();
    Ok(())
}

pub enum TestDir {
    Temp(tempfile::TempDir),
    Kept(std::path::PathBuf),
}

impl TestDir {
    pub fn new() -> std::io::Result<Self> {
        let temp_dir = tempfile::tempdir()?;

        if std::env::var("DEBUG_TESTS").is_ok() {
            let path = temp_dir.keep();
            eprintln!("Test directory kept at: {}", path.display());
            Ok(TestDir::Kept(path))
        } else {
            Ok(TestDir::Temp(temp_dir))
        }
    }

    pub fn path(&self) -> &std::path::Path {
        match self {
            TestDir::Temp(t) => t.path(),
            TestDir::Kept(p) => p.as_path(),
        }
    }
}
