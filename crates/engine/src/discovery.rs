use std::fs;
use std::path::{Path, PathBuf};
use walkdir::{DirEntry, WalkDir};

use crate::error::{EngineError, Result};
use crate::verdict::FileInput;

const GIT_DIR: &str = ".git";

/// Files that describe the repository itself and are never audited.
const SKIPPED_FILE_NAMES: &[&str] = &[".gitattributes", ".gitignore", ".gitkeep"];

/// One repository root and its files in scan order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepositoryScan {
    pub root: PathBuf,
    pub files: Vec<FileInput>,
}

/// Find every repository at or below `base` and list its files.
///
/// A directory is a repository when it holds a `.git` entry. Nested
/// repositories are reported separately, after their parent, and their files
/// are excluded from the parent's listing.
pub fn discover_repositories(base: impl AsRef<Path>) -> Result<Vec<RepositoryScan>> {
    let base = base.as_ref();
    if !base.exists() {
        return Err(EngineError::RootNotFound(base.to_path_buf()));
    }
    if !base.is_dir() {
        return Err(EngineError::NotADirectory(base.to_path_buf()));
    }
    let base = base.canonicalize()?;

    let roots = find_repository_roots(&base);
    log::debug!("Found {} repositories below {}", roots.len(), base.display());

    Ok(roots
        .into_iter()
        .map(|root| {
            let files = scan_repository(&root);
            log::info!("Scanned {}: {} files", root.display(), files.len());
            RepositoryScan { root, files }
        })
        .collect())
}

fn find_repository_roots(base: &Path) -> Vec<PathBuf> {
    WalkDir::new(base)
        .follow_links(false)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| entry.file_name() != GIT_DIR)
        .filter_map(|result| match result {
            Ok(entry) => Some(entry),
            Err(err) => {
                log::warn!("Failed to read entry: {err}");
                None
            }
        })
        .filter(|entry| entry.file_type().is_dir() && is_repository(entry.path()))
        .map(DirEntry::into_path)
        .collect()
}

/// Regular files of the repository at `root`, excluding nested repositories.
pub fn scan_repository(root: &Path) -> Vec<FileInput> {
    let walker = WalkDir::new(root)
        .follow_links(false)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| {
            if entry.file_name() == GIT_DIR {
                return false;
            }
            !(entry.depth() > 0 && entry.file_type().is_dir() && is_repository(entry.path()))
        });

    let mut files = Vec::new();
    for result in walker {
        let entry = match result {
            Ok(entry) => entry,
            Err(err) => {
                log::warn!("Failed to read entry: {err}");
                continue;
            }
        };
        if !entry.file_type().is_file() || is_skipped(&entry) {
            continue;
        }

        let Ok(relative) = entry.path().strip_prefix(root) else {
            continue;
        };
        let relative_path = relative
            .components()
            .map(|component| component.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/");
        let size_bytes = match entry.metadata() {
            Ok(meta) => meta.len(),
            Err(err) => {
                log::debug!("No metadata for {}: {err}", entry.path().display());
                0
            }
        };
        files.push(FileInput {
            absolute_path: entry.into_path(),
            relative_path,
            size_bytes,
        });
    }
    files
}

fn is_repository(dir: &Path) -> bool {
    fs::symlink_metadata(dir.join(GIT_DIR)).is_ok()
}

fn is_skipped(entry: &DirEntry) -> bool {
    let name = entry.file_name().to_string_lossy();
    SKIPPED_FILE_NAMES
        .iter()
        .any(|skipped| name.eq_ignore_ascii_case(skipped))
}
