//! Source file resolution
//!
//! Maps a module identifier to the file that defines it, relative to the
//! source root. The tree is scanned once and indexed by file stem.

use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};

use glob::Pattern;

use crate::error::{ReportError, Result};

/// Anything that can turn a module name into a report filename.
///
/// An empty string means the module has no source file under the root.
pub trait SourceLookup {
    fn resolve(&self, module: &str) -> Result<String>;
}

/// Source tree index for one root and one file extension
#[derive(Debug)]
pub struct SourceResolver {
    root: PathBuf,
    extension: String,
    by_stem: BTreeMap<String, Vec<String>>,
}

impl SourceResolver {
    /// Scan `root` recursively for `*.<extension>` files.
    ///
    /// Fails when the root does not exist, is not a directory or cannot be
    /// walked.
    pub fn new(root: &Path, extension: &str) -> Result<Self> {
        let root = fs::canonicalize(root).map_err(|source| ReportError::FileSystem {
            path: root.to_path_buf(),
            source,
        })?;
        if !root.is_dir() {
            return Err(ReportError::FileSystem {
                path: root,
                source: io::Error::new(io::ErrorKind::Other, "not a directory"),
            });
        }

        let extension = extension.trim_start_matches('.').to_string();
        let pattern = format!(
            "{}/**/*.{}",
            Pattern::escape(&root.to_string_lossy()),
            Pattern::escape(&extension)
        );

        let mut by_stem: BTreeMap<String, Vec<String>> = BTreeMap::new();

        let entries = glob::glob(&pattern).map_err(|e| ReportError::FileSystem {
            path: root.clone(),
            source: io::Error::new(io::ErrorKind::InvalidInput, e.msg),
        })?;

        for entry in entries {
            let path = match entry {
                Ok(path) => path,
                Err(e) => {
                    let path = e.path().to_path_buf();
                    return Err(ReportError::FileSystem {
                        path,
                        source: e.into_error(),
                    });
                }
            };

            if !path.is_file() {
                continue;
            }
            let Some(stem) = path.file_stem().map(|s| s.to_string_lossy().to_string()) else {
                continue;
            };
            let Some(relative) = relative_path(&root, &path) else {
                continue;
            };
            by_stem.entry(stem).or_default().push(relative);
        }

        for candidates in by_stem.values_mut() {
            candidates.sort_by(|a, b| depth(a).cmp(&depth(b)).then_with(|| a.cmp(b)));
        }

        tracing::debug!(
            "Indexed {} source stem(s) under {}",
            by_stem.len(),
            root.display()
        );

        Ok(Self {
            root,
            extension,
            by_stem,
        })
    }

    /// Absolute, canonical source root
    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn extension(&self) -> &str {
        &self.extension
    }
}

impl SourceLookup for SourceResolver {
    /// Shallowest match wins; ties are broken by path order.
    fn resolve(&self, module: &str) -> Result<String> {
        let Some(candidates) = self.by_stem.get(module) else {
            tracing::debug!("No {}.{} under {}", module, self.extension, self.root.display());
            return Ok(String::new());
        };

        if candidates.len() > 1 {
            tracing::warn!(
                "Module {} matches {} files ({}), using {}",
                module,
                candidates.len(),
                candidates.join(", "),
                candidates[0]
            );
        }

        Ok(candidates[0].clone())
    }
}

/// `/`-separated path of `path` below `root`, without a leading separator
fn relative_path(root: &Path, path: &Path) -> Option<String> {
    let relative = path.strip_prefix(root).ok()?;
    let parts: Vec<String> = relative
        .components()
        .filter_map(|c| match c {
            Component::Normal(part) => Some(part.to_string_lossy().to_string()),
            _ => None,
        })
        .collect();

    if parts.is_empty() {
        None
    } else {
        Some(parts.join("/"))
    }
}

fn depth(relative: &str) -> usize {
    relative.split('/').count()
}
