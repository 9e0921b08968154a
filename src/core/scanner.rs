use rayon::prelude::*;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::errors::Result;
use crate::extractors::ExtractorRegistry;

/// Directory names never descended into.
const EXCLUDED_DIRS: &[&str] = &[
    "__pycache__",
    ".git",
    ".hg",
    ".svn",
    ".venv",
    "venv",
    "node_modules",
    ".pytest_cache",
    ".mypy_cache",
    "dist",
    "build",
    "target",
];

#[derive(Debug, Clone)]
pub struct SourceFile {
    pub abs_path: PathBuf,
    /// Project-relative path with forward slashes; doubles as the file
    /// node id and the fingerprint key.
    pub rel_path: String,
    pub extension: String,
}

pub struct FileScanner;

impl FileScanner {
    pub fn new() -> Self {
        Self
    }

    /// Enumerate project files whose extension has a registered extractor.
    /// Results are sorted by relative path so runs are deterministic.
    pub fn scan(&self, root: &Path, registry: &ExtractorRegistry) -> Result<Vec<SourceFile>> {
        let entries: Vec<_> = WalkDir::new(root)
            .follow_links(false)
            .into_iter()
            .filter_entry(|entry| {
                if entry.depth() == 0 || !entry.file_type().is_dir() {
                    return true;
                }
                let name = entry.file_name().to_string_lossy();
                !EXCLUDED_DIRS.contains(&name.as_ref()) && !name.starts_with('.')
            })
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.file_type().is_file())
            .collect();

        let mut files: Vec<SourceFile> = entries
            .par_iter()
            .filter_map(|entry| {
                let path = entry.path();
                let extension = path.extension()?.to_str()?;
                registry.for_extension(extension)?;
                let rel_path = relative_slash_path(path, root)?;
                Some(SourceFile {
                    abs_path: path.to_path_buf(),
                    rel_path,
                    extension: extension.to_string(),
                })
            })
            .collect();

        files.sort_by(|a, b| a.rel_path.cmp(&b.rel_path));
        Ok(files)
    }
}

impl Default for FileScanner {
    fn default() -> Self {
        Self::new()
    }
}

/// Relative path rendered with forward slashes on every platform, so node
/// ids and fingerprints are portable.
pub fn relative_slash_path(path: &Path, root: &Path) -> Option<String> {
    let rel = path.strip_prefix(root).ok()?;
    let parts: Vec<String> = rel
        .components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect();
    if parts.is_empty() {
        None
    } else {
        Some(parts.join("/"))
    }
}
