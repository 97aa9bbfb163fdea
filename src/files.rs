#![allow(async_fn_in_trait)]

//! Files as the caller sees them: working copy listings, selections of
//! relative paths, and the sources those selections come from.

use std::fmt::Display;
use std::path::Component;
use std::path::Path;
use std::path::PathBuf;

use anyhow::Context;
use serde::Serialize;
use tracing::debug;

use crate::error::Step as _;
use crate::error::SyncError;
use crate::error::SyncResult;

// -----------------------------------------------------------------------------
// Entry

/// A top-level entry of a working copy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "path", rename_all = "lowercase")]
pub enum Entry {
    File(PathBuf),
    Directory(PathBuf),
}

impl Entry {
    pub fn path(&self) -> &Path {
        match self {
            Self::File(path) | Self::Directory(path) => path,
        }
    }
}

impl Display for Entry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::File(path) => write!(f, "📄 {}", path.display()),
            Self::Directory(path) => write!(f, "📁 {}/", path.display()),
        }
    }
}

/// List the entries directly under `root`, skipping `.git`.
///
/// Directories come first, then files, each sorted by name.
pub async fn list_entries(root: &Path) -> anyhow::Result<Vec<Entry>> {
    let mut dir = tokio::fs::read_dir(root)
        .await
        .with_context(|| format!("Failed to list {}", root.display()))?;

    let mut entries = Vec::new();
    while let Some(item) = dir.next_entry().await? {
        let name = PathBuf::from(item.file_name());
        if name == Path::new(".git") {
            continue;
        }
        if item.file_type().await?.is_dir() {
            entries.push(Entry::Directory(name));
        } else {
            entries.push(Entry::File(name));
        }
    }

    entries.sort_by(|a, b| {
        let rank = |entry: &Entry| matches!(entry, Entry::File(_));
        rank(a).cmp(&rank(b)).then_with(|| a.path().cmp(b.path()))
    });
    Ok(entries)
}

// -----------------------------------------------------------------------------
// FileSelection

/// Relative paths chosen for the next commit, in the order given.
///
/// Whether a path is added or removed is decided when the commit is staged,
/// by whether it exists on disk at that moment.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileSelection {
    paths: Vec<String>,
}

impl FileSelection {
    /// Validate and collect paths. Duplicates are dropped; absolute paths and
    /// paths leaving the working copy are rejected.
    pub fn new(paths: impl IntoIterator<Item = String>) -> SyncResult<Self> {
        let mut selection = Self::default();
        for path in paths {
            let normalized = normalize(&path)?;
            if !selection.paths.contains(&normalized) {
                selection.paths.push(normalized);
            }
        }
        Ok(selection)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.paths.iter().map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    /// Whether `path` is selected itself or lies inside a selected directory.
    pub fn covers(&self, path: &str) -> bool {
        self.paths
            .iter()
            .any(|selected| Path::new(path).starts_with(selected))
    }
}

fn normalize(path: &str) -> SyncResult<String> {
    let mut parts = Vec::new();
    for component in Path::new(path).components() {
        match component {
            Component::Normal(part) => parts.push(part.to_string_lossy().into_owned()),
            Component::CurDir => {}
            Component::ParentDir | Component::RootDir | Component::Prefix(_) => {
                return Err(SyncError::precondition(format!(
                    "Path {path} is outside the working copy"
                )));
            }
        }
    }
    if parts.is_empty() {
        return Err(SyncError::precondition(format!("Invalid path '{path}'")));
    }
    Ok(parts.join("/"))
}

// -----------------------------------------------------------------------------
// FileSource

/// Where the files of a commit come from.
pub trait FileSource {
    /// Make the files available under `root` and return what to stage.
    async fn collect(&self, root: &Path) -> SyncResult<FileSelection>;
}

/// Paths that are already inside the working copy.
pub struct LocalFiles {
    paths: Vec<String>,
}

impl LocalFiles {
    pub fn new(paths: Vec<String>) -> Self {
        Self { paths }
    }
}

impl FileSource for LocalFiles {
    async fn collect(&self, _root: &Path) -> SyncResult<FileSelection> {
        FileSelection::new(self.paths.iter().cloned())
    }
}

/// An intake directory whose contents are copied verbatim into the working
/// copy root. Hidden files are included and ignore rules are not applied;
/// nested `.git` directories are skipped.
pub struct UploadDir {
    dir: PathBuf,
}

impl UploadDir {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn walk(&self) -> anyhow::Result<Vec<PathBuf>> {
        let walker = ignore::WalkBuilder::new(&self.dir)
            .standard_filters(false)
            .filter_entry(|entry| entry.file_name() != ".git")
            .build();

        let mut files = Vec::new();
        for entry in walker {
            let entry = entry?;
            if entry.file_type().is_some_and(|ft| !ft.is_dir()) {
                files.push(entry.path().strip_prefix(&self.dir)?.to_path_buf());
            }
        }
        files.sort();
        Ok(files)
    }
}

impl FileSource for UploadDir {
    async fn collect(&self, root: &Path) -> SyncResult<FileSelection> {
        let files = self.walk().during("reading intake directory")?;

        let mut paths = Vec::with_capacity(files.len());
        for relative in files {
            let dest = root.join(&relative);
            if let Some(parent) = dest.parent() {
                tokio::fs::create_dir_all(parent)
                    .await
                    .with_context(|| format!("Failed to create {}", parent.display()))
                    .during("copying uploaded files")?;
            }
            tokio::fs::copy(self.dir.join(&relative), &dest)
                .await
                .with_context(|| format!("Failed to copy {}", relative.display()))
                .during("copying uploaded files")?;
            debug!(path = %relative.display(), "copied upload");
            paths.push(relative.to_string_lossy().into_owned());
        }

        FileSelection::new(paths)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_selection_normalizes_and_dedups() {
        let selection = FileSelection::new(
            ["./a.txt", "a.txt", "docs/", "docs/guide.md"]
                .into_iter()
                .map(String::from),
        )
        .unwrap();
        assert_eq!(
            selection.iter().collect::<Vec<_>>(),
            vec!["a.txt", "docs", "docs/guide.md"]
        );
    }

    #[test]
    fn test_selection_rejects_escaping_paths() {
        for path in ["../secret", "/etc/passwd", "a/../../b", "."] {
            let err = FileSelection::new([path.to_string()]).unwrap_err();
            assert_eq!(err.kind(), crate::error::FailureKind::Precondition, "{path}");
        }
    }

    #[test]
    fn test_covers() {
        let selection = FileSelection::new(["docs".to_string(), "a.txt".to_string()]).unwrap();
        assert!(selection.covers("docs/old.md"));
        assert!(selection.covers("a.txt"));
        assert!(!selection.covers("docs2/x"));
        assert!(!selection.covers("b.txt"));
    }

    #[test]
    fn test_entry_display() {
        assert_eq!(Entry::File("a.txt".into()).to_string(), "📄 a.txt");
        assert_eq!(Entry::Directory("src".into()).to_string(), "📁 src/");
    }

    #[test]
    fn test_entry_serializes_tagged() {
        let json = serde_json::to_string(&Entry::Directory("src".into())).unwrap();
        assert_eq!(json, r#"{"kind":"directory","path":"src"}"#);
    }

    #[tokio::test]
    async fn test_list_entries() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join(".git")).unwrap();
        std::fs::create_dir(dir.path().join("src")).unwrap();
        std::fs::write(dir.path().join("b.txt"), "b").unwrap();
        std::fs::write(dir.path().join("a.txt"), "a").unwrap();

        let entries = list_entries(dir.path()).await.unwrap();
        assert_eq!(
            entries,
            vec![
                Entry::Directory("src".into()),
                Entry::File("a.txt".into()),
                Entry::File("b.txt".into()),
            ]
        );
    }

    #[tokio::test]
    async fn test_upload_dir_copies_into_root() {
        let intake = tempfile::tempdir().unwrap();
        let root = tempfile::tempdir().unwrap();
        std::fs::create_dir(intake.path().join("nested")).unwrap();
        std::fs::write(intake.path().join("report.csv"), "1,2\n").unwrap();
        std::fs::write(intake.path().join(".env"), "KEY=1\n").unwrap();
        std::fs::write(intake.path().join("nested/notes.md"), "# notes\n").unwrap();

        let selection = UploadDir::new(intake.path())
            .collect(root.path())
            .await
            .unwrap();

        assert_eq!(
            selection.iter().collect::<Vec<_>>(),
            vec![".env", "nested/notes.md", "report.csv"]
        );
        assert_eq!(
            std::fs::read_to_string(root.path().join("nested/notes.md")).unwrap(),
            "# notes\n"
        );
    }

    #[tokio::test]
    async fn test_local_files_validate() {
        let root = tempfile::tempdir().unwrap();
        let source = LocalFiles::new(vec!["../outside".to_string()]);
        assert!(source.collect(root.path()).await.is_err());
    }
}
