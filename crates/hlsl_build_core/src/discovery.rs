//! Shader Source Discovery
//!
//! Finds every `<root>/**/<shader_dir>/*.<extension>` file, skipping
//! hidden files and directories. Results are collected fresh on each call
//! and sorted so logs are stable across platforms.

use std::path::{Path, PathBuf};

use walkdir::{DirEntry, WalkDir};

use crate::config::BuildConfig;
use crate::errors::Result;

/// Recursively enumerates shader sources under `config.root`.
///
/// A root that does not exist yields an empty list. Any other traversal
/// error aborts discovery.
pub fn discover(config: &BuildConfig) -> Result<Vec<PathBuf>> {
    let root = config.root.as_path();
    if !root.exists() {
        log::warn!("Shader root {} does not exist", root.display());
        return Ok(Vec::new());
    }

    let mut sources = Vec::new();
    let walker = WalkDir::new(root)
        .follow_links(true)
        .into_iter()
        .filter_entry(|entry| entry.depth() == 0 || !is_hidden(entry));
    for entry in walker {
        let entry = entry?;
        if entry.file_type().is_file() && is_shader_source(entry.path(), config) {
            sources.push(entry.into_path());
        }
    }

    sources.sort();
    log::debug!("Discovered {} shader source(s) under {}", sources.len(), root.display());
    Ok(sources)
}

/// Dot-files and dot-directories are not searched.
fn is_hidden(entry: &DirEntry) -> bool {
    entry.file_name().as_encoded_bytes().starts_with(b".")
}

/// Whether `path` has the source extension and sits directly in a
/// directory named `config.shader_dir`.
#[must_use]
pub fn is_shader_source(path: &Path, config: &BuildConfig) -> bool {
    let has_extension = path
        .extension()
        .is_some_and(|ext| ext == config.extension.as_str());
    let in_shader_dir = path
        .parent()
        .and_then(Path::file_name)
        .is_some_and(|dir| dir == config.shader_dir.as_str());
    has_extension && in_shader_dir
}
