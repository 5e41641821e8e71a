//! Coverage module
//!
//! Provides:
//! - LCOV import
//! - Cobertura XML import
//! - Threshold validation
//!
//! Importers emit flat [`CoverageFact`]s into a [`FactSet`], which merges
//! duplicates and hands out modules sorted by name with lines sorted by
//! number.

mod cobertura;
mod lcov;
mod threshold;

pub use cobertura::*;
pub use lcov::*;
pub use threshold::*;

use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::path::Path;

use serde::Deserialize;

use crate::error::{ReportError, Result};

/// One (module, line) -> hits observation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoverageFact {
    pub module: String,
    pub line: u32,
    pub hits: u64,
}

/// A report-ready line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineEntry {
    pub number: u32,
    pub hits: u64,
}

impl LineEntry {
    pub fn new(number: u32, hits: u64) -> Self {
        Self { number, hits }
    }

    pub fn is_covered(&self) -> bool {
        self.hits != 0
    }
}

/// All lines recorded for one module
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleCoverage {
    pub name: String,
    pub lines: Vec<LineEntry>,
}

/// Collects facts from an importer.
///
/// Repeated facts for the same module and line are summed, so a module
/// never reports the same line number twice.
#[derive(Debug, Default)]
pub struct FactSet {
    modules: BTreeMap<String, BTreeMap<u32, u64>>,
}

impl FactSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, fact: CoverageFact) {
        let hits = self
            .modules
            .entry(fact.module)
            .or_default()
            .entry(fact.line)
            .or_insert(0);
        *hits = hits.saturating_add(fact.hits);
    }

    /// Register a module even if it ends up with no lines
    pub fn touch(&mut self, module: &str) {
        self.modules.entry(module.to_string()).or_default();
    }

    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }

    pub fn into_modules(self) -> Vec<ModuleCoverage> {
        self.modules
            .into_iter()
            .map(|(name, lines)| ModuleCoverage {
                name,
                lines: lines
                    .into_iter()
                    .map(|(number, hits)| LineEntry::new(number, hits))
                    .collect(),
            })
            .collect()
    }
}

/// Supported coverage data formats
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ImportFormat {
    #[default]
    Lcov,
    Cobertura,
}

impl fmt::Display for ImportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ImportFormat::Lcov => write!(f, "lcov"),
            ImportFormat::Cobertura => write!(f, "cobertura"),
        }
    }
}

/// Import coverage data from a file in the given format
pub fn import_coverage(path: &Path, format: ImportFormat) -> Result<Vec<ModuleCoverage>> {
    let content = fs::read_to_string(path).map_err(|e| ReportError::import(path, e.to_string()))?;

    let facts = match format {
        ImportFormat::Lcov => parse_lcov_string(&content),
        ImportFormat::Cobertura => parse_cobertura_string(&content),
    }
    .map_err(|reason| ReportError::import(path, reason))?;

    let modules = facts.into_modules();
    tracing::info!(
        "Imported {} module(s) from {} ({})",
        modules.len(),
        path.display(),
        format
    );
    Ok(modules)
}

/// Module identifier derived from a source path: its file stem
pub(crate) fn module_name_from_path(path: &str) -> Option<String> {
    Path::new(path)
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .filter(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn fact(module: &str, line: u32, hits: u64) -> CoverageFact {
        CoverageFact {
            module: module.to_string(),
            line,
            hits,
        }
    }

    #[test]
    fn test_fact_set_sorts_modules_and_lines() {
        let mut facts = FactSet::new();
        facts.record(fact("zeta", 3, 1));
        facts.record(fact("alpha", 9, 0));
        facts.record(fact("zeta", 1, 4));

        let modules = facts.into_modules();
        assert_eq!(modules.len(), 2);
        assert_eq!(modules[0].name, "alpha");
        assert_eq!(modules[1].name, "zeta");
        assert_eq!(
            modules[1].lines,
            vec![LineEntry::new(1, 4), LineEntry::new(3, 1)]
        );
    }

    #[test]
    fn test_fact_set_merges_duplicate_lines() {
        let mut facts = FactSet::new();
        facts.record(fact("m", 7, 2));
        facts.record(fact("m", 7, 3));

        let modules = facts.into_modules();
        assert_eq!(modules[0].lines, vec![LineEntry::new(7, 5)]);
    }

    #[test]
    fn test_touched_module_has_no_lines() {
        let mut facts = FactSet::new();
        facts.touch("empty");
        let modules = facts.into_modules();
        assert_eq!(modules.len(), 1);
        assert!(modules[0].lines.is_empty());
    }

    #[test]
    fn test_import_missing_file_is_import_error() {
        let dir = tempdir().unwrap();
        let err = import_coverage(&dir.path().join("all.coverdata"), ImportFormat::Lcov).unwrap_err();
        assert!(matches!(err, ReportError::Import { .. }));
    }

    #[test]
    fn test_import_malformed_file_is_import_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("broken.info");
        fs::write(&path, "SF:src/a.erl\nDA:one,two\nend_of_record\n").unwrap();

        let err = import_coverage(&path, ImportFormat::Lcov).unwrap_err();
        match err {
            ReportError::Import { path: p, .. } => assert_eq!(p, path),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_module_name_from_path() {
        assert_eq!(module_name_from_path("src/foo/bar.erl").as_deref(), Some("bar"));
        assert_eq!(module_name_from_path("baz").as_deref(), Some("baz"));
        assert_eq!(module_name_from_path(""), None);
    }
}
