//! LCOV tracefile importer
//!
//! Only the records that carry line hits matter here: `SF:` opens a
//! module, `DA:<line>,<hits>[,<checksum>]` adds a line and
//! `end_of_record` closes it. Summary records (`LF`, `LH`, `BRF`, ...) are
//! recomputed from the lines and ignored.

use super::{module_name_from_path, CoverageFact, FactSet};

/// Parse LCOV content into coverage facts
pub fn parse_lcov_string(content: &str) -> Result<FactSet, String> {
    let mut facts = FactSet::new();
    let mut current_module: Option<String> = None;

    for (index, line) in content.lines().enumerate() {
        let line_no = index + 1;
        let line = line.trim();

        if let Some(path) = line.strip_prefix("SF:") {
            if current_module.is_some() {
                return Err(format!("line {}: SF record before end_of_record", line_no));
            }
            let module = module_name_from_path(path.trim())
                .ok_or_else(|| format!("line {}: SF record without a file name", line_no))?;
            facts.touch(&module);
            current_module = Some(module);
        } else if let Some(data) = line.strip_prefix("DA:") {
            let module = current_module
                .as_ref()
                .ok_or_else(|| format!("line {}: DA record outside of a source file", line_no))?;
            let (number, hits) = parse_da(data)
                .ok_or_else(|| format!("line {}: malformed DA record '{}'", line_no, line))?;
            facts.record(CoverageFact {
                module: module.clone(),
                line: number,
                hits,
            });
        } else if line == "end_of_record" {
            if current_module.take().is_none() {
                return Err(format!("line {}: end_of_record without SF record", line_no));
            }
        }
    }

    if current_module.is_some() {
        return Err("unterminated record: missing end_of_record".to_string());
    }

    Ok(facts)
}

/// `<line>,<hits>[,<checksum>]`
fn parse_da(data: &str) -> Option<(u32, u64)> {
    let mut parts = data.split(',');
    let number = parts.next()?.trim().parse::<u32>().ok()?;
    let hits = parts.next()?.trim();

    // Some producers emit negative counts for overflowed counters
    let hits = match hits.parse::<u64>() {
        Ok(hits) => hits,
        Err(_) => hits.parse::<i64>().ok().map(|h| h.unsigned_abs())?,
    };

    Some((number, hits))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coverage::LineEntry;

    #[test]
    fn test_parse_lcov() {
        let lcov = r#"
TN:
SF:src/main.erl
FN:1,main
FNDA:1,main
FNF:1
FNH:1
DA:1,1
DA:2,1
DA:3,0
LF:3
LH:2
BRF:2
BRH:1
end_of_record
SF:src/lib/helper.erl
DA:1,1
DA:2,7,abcdef
LF:2
LH:2
end_of_record
"#;

        let modules = parse_lcov_string(lcov).unwrap().into_modules();

        assert_eq!(modules.len(), 2);
        assert_eq!(modules[0].name, "helper");
        assert_eq!(
            modules[0].lines,
            vec![LineEntry::new(1, 1), LineEntry::new(2, 7)]
        );
        assert_eq!(modules[1].name, "main");
        assert_eq!(modules[1].lines.len(), 3);
        assert!(!modules[1].lines[2].is_covered());
    }

    #[test]
    fn test_empty_lcov() {
        let facts = parse_lcov_string("").unwrap();
        assert!(facts.is_empty());
    }

    #[test]
    fn test_da_outside_record_is_rejected() {
        let err = parse_lcov_string("DA:1,1\n").unwrap_err();
        assert!(err.contains("outside of a source file"));
    }

    #[test]
    fn test_unterminated_record_is_rejected() {
        let err = parse_lcov_string("SF:a.erl\nDA:1,1\n").unwrap_err();
        assert!(err.contains("end_of_record"));
    }

    #[test]
    fn test_negative_hit_count_is_taken_as_magnitude() {
        assert_eq!(parse_da("4,-3"), Some((4, 3)));
        assert_eq!(parse_da("4"), None);
        assert_eq!(parse_da("x,1"), None);
    }
}
