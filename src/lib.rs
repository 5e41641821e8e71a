//! Coberturize - Cobertura reports from line coverage data
//!
//! Turns per-module line hit counts into a Cobertura 1.04 XML report:
//! - Import of LCOV tracefiles or existing Cobertura reports
//! - Aggregation into class and package summaries with formatted rates
//! - Source file resolution below a source root
//! - XML serialization with the Cobertura prolog and doctype

pub mod aggregate;
pub mod config;
pub mod coverage;
pub mod error;
pub mod report;
pub mod resolve;
pub mod xml;

pub use aggregate::{fold_classes, fold_lines, fold_package, rate, Summary};
pub use config::{ConfigLayer, ReportConfig};
pub use coverage::{import_coverage, CoverageFact, ImportFormat, LineEntry, ModuleCoverage};
pub use error::{ReportError, Result};
pub use report::{build_report, ClassReport, CoverageReport, PackageReport, ReportContext};
pub use resolve::{SourceLookup, SourceResolver};
pub use xml::{serialize, write_report};

/// Run the whole pipeline: import, aggregate, serialize, write.
///
/// Nothing is written unless every earlier step succeeded.
pub fn generate(config: &ReportConfig) -> Result<CoverageReport> {
    let modules = import_coverage(&config.cover_data, config.format)?;
    let resolver = SourceResolver::new(&config.source_dir, &config.extension)?;

    let source_root = resolver.root().to_string_lossy().to_string();
    let context = ReportContext {
        package_name: &config.app_name,
        source_root: &source_root,
    };
    let report = build_report(&modules, context, &resolver)?;

    let bytes = serialize(&report)?;
    write_report(&bytes, &config.output)?;

    tracing::info!(
        "Wrote {} class(es) to {}",
        report.class_count(),
        config.output.display()
    );

    Ok(report)
}
