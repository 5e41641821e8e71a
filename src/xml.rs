//! Cobertura XML serialization

use std::fs::File;
use std::io::{Cursor, Write};
use std::path::Path;

use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;

use crate::error::{ReportError, Result};
use crate::report::{ClassReport, CoverageReport, PackageReport};

/// Cobertura 1.04 document type
pub const DOCTYPE: &str =
    r#"coverage SYSTEM "http://cobertura.sourceforge.net/xml/coverage-04.dtd""#;

type XmlWriter = Writer<Cursor<Vec<u8>>>;

/// Render a report as an indented UTF-8 XML document
pub fn serialize(report: &CoverageReport) -> Result<Vec<u8>> {
    let mut writer = Writer::new_with_indent(Cursor::new(Vec::new()), b' ', 2);

    writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;
    writer.write_event(Event::DocType(BytesText::from_escaped(DOCTYPE)))?;

    let mut root = BytesStart::new("coverage");
    root.push_attribute(("timestamp", report.timestamp.to_string().as_str()));
    root.push_attribute(("line-rate", report.line_rate.as_str()));
    root.push_attribute(("lines-covered", report.lines_summary.covered.to_string().as_str()));
    root.push_attribute(("lines-valid", report.lines_summary.valid.to_string().as_str()));
    root.push_attribute(("branch-rate", report.branch_rate.as_str()));
    root.push_attribute((
        "branches-covered",
        report.branches_summary.covered.to_string().as_str(),
    ));
    root.push_attribute((
        "branches-valid",
        report.branches_summary.valid.to_string().as_str(),
    ));
    root.push_attribute(("complexity", report.complexity.to_string().as_str()));
    root.push_attribute(("version", report.version.as_str()));
    writer.write_event(Event::Start(root))?;

    writer.write_event(Event::Start(BytesStart::new("sources")))?;
    writer.write_event(Event::Start(BytesStart::new("source")))?;
    writer.write_event(Event::Text(BytesText::new(&report.source)))?;
    writer.write_event(Event::End(BytesEnd::new("source")))?;
    writer.write_event(Event::End(BytesEnd::new("sources")))?;

    writer.write_event(Event::Start(BytesStart::new("packages")))?;
    for package in &report.packages {
        write_package(&mut writer, package)?;
    }
    writer.write_event(Event::End(BytesEnd::new("packages")))?;

    writer.write_event(Event::End(BytesEnd::new("coverage")))?;

    Ok(writer.into_inner().into_inner())
}

fn write_package(writer: &mut XmlWriter, package: &PackageReport) -> Result<()> {
    let mut start = BytesStart::new("package");
    start.push_attribute(("name", package.name.as_str()));
    start.push_attribute(("line-rate", package.line_rate.as_str()));
    start.push_attribute(("branch-rate", package.branch_rate.as_str()));
    start.push_attribute(("complexity", package.complexity.to_string().as_str()));
    writer.write_event(Event::Start(start))?;

    writer.write_event(Event::Start(BytesStart::new("classes")))?;
    for class in &package.classes {
        write_class(writer, class)?;
    }
    writer.write_event(Event::End(BytesEnd::new("classes")))?;

    writer.write_event(Event::End(BytesEnd::new("package")))?;
    Ok(())
}

fn write_class(writer: &mut XmlWriter, class: &ClassReport) -> Result<()> {
    let mut start = BytesStart::new("class");
    start.push_attribute(("name", class.name.as_str()));
    start.push_attribute(("filename", class.filename.as_str()));
    start.push_attribute(("line-rate", class.line_rate.as_str()));
    start.push_attribute(("branch-rate", class.branch_rate.as_str()));
    start.push_attribute(("complexity", class.complexity.to_string().as_str()));
    writer.write_event(Event::Start(start))?;

    // No method-level data; the element is required by the DTD
    writer.write_event(Event::Empty(BytesStart::new("methods")))?;

    writer.write_event(Event::Start(BytesStart::new("lines")))?;
    for line in &class.lines {
        let mut elem = BytesStart::new("line");
        elem.push_attribute(("number", line.number.to_string().as_str()));
        elem.push_attribute(("hits", line.hits.to_string().as_str()));
        writer.write_event(Event::Empty(elem))?;
    }
    writer.write_event(Event::End(BytesEnd::new("lines")))?;

    writer.write_event(Event::End(BytesEnd::new("class")))?;
    Ok(())
}

/// Write serialized XML to `path` followed by a newline
pub fn write_report(bytes: &[u8], path: &Path) -> Result<()> {
    let io_error = |source| ReportError::Io {
        path: path.to_path_buf(),
        source,
    };

    let mut file = File::create(path).map_err(io_error)?;
    file.write_all(bytes).map_err(io_error)?;
    file.write_all(b"\n").map_err(io_error)?;
    file.flush().map_err(io_error)?;
    Ok(())
}
