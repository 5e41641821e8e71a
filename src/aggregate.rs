//! Line coverage aggregation
//!
//! Folds per-line hits into class summaries and class summaries into the
//! single package of a report.

use std::iter::Sum;

use crate::coverage::{LineEntry, ModuleCoverage};
use crate::error::Result;
use crate::report::{ClassReport, PackageReport};
use crate::resolve::SourceLookup;

/// Format a coverage ratio the way Cobertura consumers expect it.
///
/// Six fractional digits, except for an empty denominator which is the
/// literal `0.0`.
pub fn rate(covered: u64, valid: u64) -> String {
    if valid == 0 {
        return "0.0".to_string();
    }
    format!("{:.6}", covered as f64 / valid as f64)
}

/// A (covered, valid) counter pair
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Summary {
    pub covered: u64,
    pub valid: u64,
}

impl Summary {
    pub const ZERO: Summary = Summary { covered: 0, valid: 0 };

    pub fn new(covered: u64, valid: u64) -> Self {
        Self { covered, valid }
    }

    /// Contribution of a single line
    pub fn of_line(line: &LineEntry) -> Self {
        Self::new(u64::from(line.is_covered()), 1)
    }

    pub fn merge(self, other: Summary) -> Summary {
        Summary {
            covered: self.covered + other.covered,
            valid: self.valid + other.valid,
        }
    }

    pub fn rate(&self) -> String {
        rate(self.covered, self.valid)
    }

    pub fn percentage(&self) -> f64 {
        if self.valid == 0 {
            return 0.0;
        }
        (self.covered as f64 / self.valid as f64) * 100.0
    }
}

impl Sum for Summary {
    fn sum<I: Iterator<Item = Summary>>(iter: I) -> Self {
        iter.fold(Summary::ZERO, Summary::merge)
    }
}

/// Fold lines into report entries and their line summary.
///
/// Input order is kept as is.
pub fn fold_lines(lines: &[LineEntry]) -> (Vec<LineEntry>, Summary) {
    lines
        .iter()
        .fold((Vec::with_capacity(lines.len()), Summary::ZERO), |(mut entries, summary), line| {
            entries.push(*line);
            (entries, summary.merge(Summary::of_line(line)))
        })
}

/// Build one class per module and the merged line summary of all of them.
///
/// Classes come out in module order.
pub fn fold_classes(
    modules: &[ModuleCoverage],
    resolver: &dyn SourceLookup,
) -> Result<(Vec<ClassReport>, Summary)> {
    let mut classes = Vec::with_capacity(modules.len());
    let mut total = Summary::ZERO;

    for module in modules {
        let filename = resolver.resolve(&module.name)?;
        let (lines, summary) = fold_lines(&module.lines);

        tracing::debug!(
            "Class {} ({}): {}/{} lines covered",
            module.name,
            if filename.is_empty() { "<unresolved>" } else { filename.as_str() },
            summary.covered,
            summary.valid
        );

        total = total.merge(summary);
        classes.push(ClassReport::new(module.name.clone(), filename, lines, summary));
    }

    Ok((classes, total))
}

/// Wrap every class into the single synthetic package
pub fn fold_package(name: &str, classes: Vec<ClassReport>, lines: Summary) -> PackageReport {
    PackageReport::new(name.to_string(), classes, lines)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    struct FixedLookup(HashMap<String, String>);

    impl SourceLookup for FixedLookup {
        fn resolve(&self, module: &str) -> Result<String> {
            Ok(self.0.get(module).cloned().unwrap_or_default())
        }
    }

    fn module(name: &str, lines: &[(u32, u64)]) -> ModuleCoverage {
        ModuleCoverage {
            name: name.to_string(),
            lines: lines.iter().map(|&(n, h)| LineEntry::new(n, h)).collect(),
        }
    }

    #[test]
    fn test_rate_formatting() {
        assert_eq!(rate(0, 0), "0.0");
        assert_eq!(rate(5, 0), "0.0");
        assert_eq!(rate(3, 4), "0.750000");
        assert_eq!(rate(2, 3), "0.666667");
        assert_eq!(rate(0, 1), "0.000000");
        assert_eq!(rate(7, 7), "1.000000");
        assert_eq!(rate(1, 3_000_000), "0.000000");
    }

    #[test]
    fn test_merge_laws() {
        let a = Summary::new(1, 4);
        let b = Summary::new(2, 2);
        let c = Summary::new(0, 9);

        assert_eq!(a.merge(b).merge(c), a.merge(b.merge(c)));
        assert_eq!(a.merge(b), b.merge(a));
        assert_eq!(a.merge(Summary::ZERO), a);
        assert_eq!(vec![a, b, c].into_iter().sum::<Summary>(), Summary::new(3, 15));
    }

    #[test]
    fn test_fold_lines_keeps_order_and_counts_hits() {
        let lines = vec![LineEntry::new(3, 2), LineEntry::new(1, 0), LineEntry::new(2, 5)];
        let (entries, summary) = fold_lines(&lines);

        assert_eq!(entries, lines);
        assert_eq!(summary, Summary::new(2, 3));
    }

    #[test]
    fn test_fold_classes_two_modules() {
        let modules = vec![
            module("m1", &[(1, 5), (2, 0), (3, 2)]),
            module("m2", &[(1, 0)]),
        ];
        let lookup = FixedLookup(HashMap::from([("m1".to_string(), "lib/m1.erl".to_string())]));

        let (classes, total) = fold_classes(&modules, &lookup).unwrap();

        assert_eq!(classes.len(), 2);
        assert_eq!(classes[0].filename, "lib/m1.erl");
        assert_eq!(classes[0].line_rate, "0.666667");
        assert_eq!(classes[1].filename, "");
        assert_eq!(classes[1].line_rate, "0.000000");
        assert_eq!(total, Summary::new(2, 4));

        let class_sum: Summary = classes.iter().map(|c| c.lines_summary).sum();
        assert_eq!(class_sum, total);

        let package = fold_package("Application", classes, total);
        assert_eq!(package.line_rate, "0.500000");
        assert_eq!(package.branch_rate, "0.0");
        assert_eq!(package.complexity, 0);
    }

    #[test]
    fn test_fold_classes_empty() {
        let lookup = FixedLookup(HashMap::new());
        let (classes, total) = fold_classes(&[], &lookup).unwrap();

        assert!(classes.is_empty());
        assert_eq!(total, Summary::ZERO);
        assert_eq!(fold_package("App", classes, total).line_rate, "0.0");
    }

    #[test]
    fn test_fold_classes_propagates_lookup_errors() {
        struct Broken;
        impl SourceLookup for Broken {
            fn resolve(&self, _module: &str) -> Result<String> {
                Err(crate::error::ReportError::Config("boom".to_string()))
            }
        }

        let modules = vec![module("m", &[(1, 1)])];
        assert!(fold_classes(&modules, &Broken).is_err());
    }
}
