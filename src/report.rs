//! Report tree
//!
//! `CoverageReport` -> `PackageReport` -> `ClassReport` -> `LineEntry`,
//! built once per run from imported modules and never mutated afterwards.

use chrono::Utc;

use crate::aggregate::{fold_classes, fold_package, rate, Summary};
use crate::coverage::{LineEntry, ModuleCoverage};
use crate::error::Result;
use crate::resolve::SourceLookup;

/// Cobertura release whose output this report emulates
pub const TOOL_VERSION: &str = "1.9.4.1";

/// Coverage of one module
#[derive(Debug, Clone, PartialEq)]
pub struct ClassReport {
    pub name: String,
    /// Relative to the source root; empty when the module was not found
    pub filename: String,
    pub line_rate: String,
    pub branch_rate: String,
    pub complexity: u32,
    pub lines: Vec<LineEntry>,
    pub lines_summary: Summary,
    pub branches_summary: Summary,
}

impl ClassReport {
    pub fn new(name: String, filename: String, lines: Vec<LineEntry>, summary: Summary) -> Self {
        let branches = Summary::ZERO;
        Self {
            name,
            filename,
            line_rate: summary.rate(),
            branch_rate: branches.rate(),
            complexity: 0,
            lines,
            lines_summary: summary,
            branches_summary: branches,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PackageReport {
    pub name: String,
    pub line_rate: String,
    pub branch_rate: String,
    pub complexity: u32,
    pub classes: Vec<ClassReport>,
    pub lines_summary: Summary,
    pub branches_summary: Summary,
}

impl PackageReport {
    pub fn new(name: String, classes: Vec<ClassReport>, lines: Summary) -> Self {
        let branches: Summary = classes.iter().map(|c| c.branches_summary).sum();
        Self {
            name,
            line_rate: lines.rate(),
            branch_rate: branches.rate(),
            complexity: 0,
            classes,
            lines_summary: lines,
            branches_summary: branches,
        }
    }
}

/// Document root
#[derive(Debug, Clone, PartialEq)]
pub struct CoverageReport {
    /// Milliseconds since the Unix epoch
    pub timestamp: i64,
    pub version: String,
    pub line_rate: String,
    pub branch_rate: String,
    pub complexity: u32,
    pub lines_summary: Summary,
    pub branches_summary: Summary,
    /// Absolute source root
    pub source: String,
    pub packages: Vec<PackageReport>,
}

impl CoverageReport {
    /// Number of classes across all packages
    pub fn class_count(&self) -> usize {
        self.packages.iter().map(|p| p.classes.len()).sum()
    }
}

/// Inputs of a report that do not come from the coverage data
#[derive(Debug, Clone, Copy)]
pub struct ReportContext<'a> {
    pub package_name: &'a str,
    pub source_root: &'a str,
}

/// Build the report tree for the imported modules
pub fn build_report(
    modules: &[ModuleCoverage],
    context: ReportContext<'_>,
    resolver: &dyn SourceLookup,
) -> Result<CoverageReport> {
    let timestamp = Utc::now().timestamp_millis();

    let (classes, lines) = fold_classes(modules, resolver)?;
    let package = fold_package(context.package_name, classes, lines);

    // One package: the report totals are the package totals
    let lines_summary = package.lines_summary;
    let branches_summary = package.branches_summary;

    Ok(CoverageReport {
        timestamp,
        version: TOOL_VERSION.to_string(),
        line_rate: rate(lines_summary.covered, lines_summary.valid),
        branch_rate: rate(branches_summary.covered, branches_summary.valid),
        complexity: 0,
        lines_summary,
        branches_summary,
        source: context.source_root.to_string(),
        packages: vec![package],
    })
}
