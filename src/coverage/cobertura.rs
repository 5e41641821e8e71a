//! Cobertura XML importer

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use super::{module_name_from_path, CoverageFact, FactSet};

/// Parse Cobertura XML content into coverage facts
///
/// Each `class` element becomes a module named after its `name` attribute
/// (or the stem of `filename` when the name is empty). Lines listed under
/// `methods` repeat the class-level lines and are skipped.
pub fn parse_cobertura_string(content: &str) -> Result<FactSet, String> {
    let mut reader = Reader::from_str(content);
    reader.trim_text(true);

    let mut facts = FactSet::new();
    let mut current_class: Option<String> = None;
    let mut method_depth = 0usize;
    let mut saw_root = false;

    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) => match e.name().as_ref() {
                b"coverage" => saw_root = true,
                b"class" => {
                    let module = class_module_name(e)?;
                    facts.touch(&module);
                    current_class = Some(module);
                }
                b"methods" => method_depth += 1,
                b"line" => record_line(e, current_class.as_deref(), method_depth, &mut facts)?,
                _ => {}
            },
            Ok(Event::Empty(ref e)) => match e.name().as_ref() {
                b"coverage" => saw_root = true,
                b"class" => facts.touch(&class_module_name(e)?),
                b"line" => record_line(e, current_class.as_deref(), method_depth, &mut facts)?,
                _ => {}
            },
            Ok(Event::End(ref e)) => match e.name().as_ref() {
                b"class" => current_class = None,
                b"methods" => method_depth = method_depth.saturating_sub(1),
                _ => {}
            },
            Ok(Event::Eof) => break,
            Err(e) => return Err(format!("Error parsing Cobertura XML: {}", e)),
            _ => {}
        }
        buf.clear();
    }

    if !saw_root {
        return Err("missing <coverage> root element".to_string());
    }

    Ok(facts)
}

fn class_module_name(e: &BytesStart) -> Result<String, String> {
    let mut name = String::new();
    let mut filename = String::new();

    for attr in e.attributes().filter_map(|a| a.ok()) {
        let value = attr
            .unescape_value()
            .map_err(|err| format!("invalid class attribute: {}", err))?;
        match attr.key.as_ref() {
            b"name" => name = value.to_string(),
            b"filename" => filename = value.to_string(),
            _ => {}
        }
    }

    if !name.is_empty() {
        return Ok(name);
    }
    module_name_from_path(&filename).ok_or_else(|| "class without name or filename".to_string())
}

fn record_line(
    e: &BytesStart,
    class: Option<&str>,
    method_depth: usize,
    facts: &mut FactSet,
) -> Result<(), String> {
    let Some(module) = class else {
        return Ok(());
    };
    if method_depth > 0 {
        return Ok(());
    }

    let mut number: Option<u32> = None;
    let mut hits: Option<u64> = None;

    for attr in e.attributes().filter_map(|a| a.ok()) {
        let value = String::from_utf8_lossy(&attr.value);
        match attr.key.as_ref() {
            b"number" => number = value.parse().ok(),
            b"hits" => hits = value.parse().ok(),
            _ => {}
        }
    }

    match (number, hits) {
        (Some(line), Some(hits)) => {
            facts.record(CoverageFact {
                module: module.to_string(),
                line,
                hits,
            });
            Ok(())
        }
        _ => Err(format!("malformed <line> in class '{}'", module)),
    }
}
