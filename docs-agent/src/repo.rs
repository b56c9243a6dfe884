//! Repository access
//!
//! The core only needs `list` and `read`. Which directories are worth
//! descending into is decided by a predicate supplied by the caller (see
//! [`DocsConfig::should_descend`](crate::DocsConfig::should_descend)).

use crate::error::ReadError;
use std::fs;
use std::path::{Path, PathBuf};

/// One directory entry, relative to the repository root
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoEntry {
    /// Relative path with `/` separators (no leading `./`)
    pub path: String,
    pub is_dir: bool,
    pub size: u64,
}

impl RepoEntry {
    pub fn name(&self) -> &str {
        self.path.rsplit('/').next().unwrap_or(&self.path)
    }
}

pub trait RepositoryReader: Send + Sync {
    fn root(&self) -> &Path;

    /// Entries directly under `dir` (`""` is the root), sorted by name
    fn list(&self, dir: &str) -> Result<Vec<RepoEntry>, ReadError>;

    /// Full text of a file; invalid UTF-8 is replaced, not rejected
    fn read(&self, path: &str) -> Result<String, ReadError>;
}

/// Reads straight from the local filesystem
#[derive(Debug, Clone)]
pub struct FsRepository {
    root: PathBuf,
    max_file_bytes: u64,
}

impl FsRepository {
    pub fn new(root: impl Into<PathBuf>, max_file_bytes: u64) -> Self {
        Self {
            root: root.into(),
            max_file_bytes,
        }
    }

    fn absolute(&self, relative: &str) -> PathBuf {
        if relative.is_empty() || relative == "." {
            self.root.clone()
        } else {
            self.root.join(relative)
        }
    }
}

impl RepositoryReader for FsRepository {
    fn root(&self) -> &Path {
        &self.root
    }

    fn list(&self, dir: &str) -> Result<Vec<RepoEntry>, ReadError> {
        let abs = self.absolute(dir);
        let read_dir = fs::read_dir(&abs).map_err(|e| ReadError::io(&abs, e))?;

        let mut entries = Vec::new();
        for entry in read_dir {
            let entry = entry.map_err(|e| ReadError::io(&abs, e))?;
            let metadata = entry.metadata().map_err(|e| ReadError::io(entry.path(), e))?;
            let name = entry.file_name().to_string_lossy().into_owned();
            let path = if dir.is_empty() || dir == "." {
                name
            } else {
                format!("{}/{}", dir.trim_end_matches('/'), name)
            };
            entries.push(RepoEntry {
                path,
                is_dir: metadata.is_dir(),
                size: if metadata.is_dir() { 0 } else { metadata.len() },
            });
        }

        entries.sort_by(|a, b| a.path.cmp(&b.path));
        Ok(entries)
    }

    fn read(&self, path: &str) -> Result<String, ReadError> {
        let abs = self.absolute(path);
        let metadata = fs::metadata(&abs).map_err(|e| ReadError::io(&abs, e))?;
        if metadata.len() > self.max_file_bytes {
            return Err(ReadError::TooLarge {
                path: abs,
                size: metadata.len(),
                limit: self.max_file_bytes,
            });
        }

        let bytes = fs::read(&abs).map_err(|e| ReadError::io(&abs, e))?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }
}

/// Every file under the root, depth-first in sorted order
///
/// Hidden files are skipped; directories are entered only when
/// `should_descend(name)` agrees.
pub fn walk_files(
    reader: &dyn RepositoryReader,
    should_descend: &dyn Fn(&str) -> bool,
) -> Result<Vec<RepoEntry>, ReadError> {
    let mut files = Vec::new();
    walk_into(reader, "", should_descend, &mut files)?;
    Ok(files)
}

fn walk_into(
    reader: &dyn RepositoryReader,
    dir: &str,
    should_descend: &dyn Fn(&str) -> bool,
    files: &mut Vec<RepoEntry>,
) -> Result<(), ReadError> {
    for entry in reader.list(dir)? {
        if entry.is_dir {
            if should_descend(entry.name()) {
                walk_into(reader, &entry.path, should_descend, files)?;
            }
        } else if !entry.name().starts_with('.') {
            files.push(entry);
        }
    }
    Ok(())
}

/// Top-level directories worth exploring, in sorted order
pub fn top_level_dirs(
    reader: &dyn RepositoryReader,
    should_descend: &dyn Fn(&str) -> bool,
) -> Result<Vec<String>, ReadError> {
    Ok(reader
        .list("")?
        .into_iter()
        .filter(|entry| entry.is_dir && should_descend(entry.name()))
        .map(|entry| entry.path)
        .collect())
}
