//! Coverage threshold validation

use colored::Colorize;

use crate::aggregate::Summary;

/// Result of threshold validation
#[derive(Debug, Clone, PartialEq)]
pub struct ThresholdResult {
    pub passed: bool,
    pub line_coverage: f64,
    pub line_threshold: Option<f64>,
    pub line_delta: Option<f64>,
}

impl ThresholdResult {
    pub fn print_summary(&self) {
        let Some(threshold) = self.line_threshold else {
            return;
        };

        let delta = self.line_coverage - threshold;
        let status = if delta >= 0.0 { "✓".green() } else { "✗".red() };
        let delta_str = if delta >= 0.0 {
            format!("+{:.1}%", delta).green()
        } else {
            format!("{:.1}%", delta).red()
        };

        println!(
            "  {} Line coverage: {:.1}% (threshold: {:.1}%, {})",
            status, self.line_coverage, threshold, delta_str
        );
    }
}

/// Validate overall line coverage against an optional minimum percentage
pub fn validate_threshold(lines: Summary, line_threshold: Option<f64>) -> ThresholdResult {
    let line_coverage = lines.percentage();

    let passed = match line_threshold {
        Some(thresh) => line_coverage >= thresh,
        None => true,
    };

    ThresholdResult {
        passed,
        line_coverage,
        line_threshold,
        line_delta: line_threshold.map(|thresh| line_coverage - thresh),
    }
}
