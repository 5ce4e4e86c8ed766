//! Layout markup reader.
//!
//! Feeds an XML layout document to a [`ReportBuilder`] as open/close
//! events. Text, comments and processing instructions carry no layout and
//! are ignored. A document that is not well-formed fails the whole build.

use std::borrow::Cow;
use std::path::Path;

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use crate::builder::{Attributes, ReportBuilder};
use crate::data::RowSource;
use crate::error::{Diagnostic, ReportError};
use crate::model::Report;

/// Stream the elements of `xml` into `builder`.
pub fn parse_str(xml: &str, builder: &mut ReportBuilder) -> Result<(), ReportError> {
    let mut reader = Reader::from_str(xml);

    loop {
        match reader.read_event()? {
            Event::Start(e) => {
                let (name, attributes) = element(&e, builder)?;
                builder.open(&name, &attributes);
            }
            Event::Empty(e) => {
                let (name, attributes) = element(&e, builder)?;
                builder.open(&name, &attributes);
                builder.close(&name);
            }
            Event::End(e) => {
                let name = String::from_utf8_lossy(e.name().as_ref()).into_owned();
                builder.close(&name);
            }
            Event::Eof => break,
            _ => {}
        }
    }
    Ok(())
}

fn element(
    e: &BytesStart<'_>,
    builder: &mut ReportBuilder,
) -> Result<(String, Attributes), ReportError> {
    let name = String::from_utf8_lossy(e.name().as_ref()).into_owned();
    let mut attributes = Attributes::new();
    for attr in e.attributes() {
        let attr = attr.map_err(quick_xml::Error::from)?;
        let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
        match attr.unescape_value() {
            Ok(value) => attributes.push(key, Cow::into_owned(value)),
            Err(_) => builder.diagnose(Diagnostic::AttributeParse {
                element: name.clone(),
                attribute: key,
                value: String::from_utf8_lossy(&attr.value).into_owned(),
                expected: "a value with valid XML escapes",
            }),
        }
    }
    Ok((name, attributes))
}

/// Read a layout document from disk into `builder`.
pub fn parse_file(path: impl AsRef<Path>, builder: &mut ReportBuilder) -> Result<(), ReportError> {
    let path = path.as_ref();
    let xml = std::fs::read_to_string(path).map_err(|e| ReportError::io(path, e))?;
    parse_str(&xml, builder)
}

/// Parse a layout document and bind it against `rows`. Nothing is returned
/// unless the whole document is well-formed.
pub fn build_from_str(
    xml: &str,
    rows: &dyn RowSource,
) -> Result<(Report, Vec<Diagnostic>), ReportError> {
    let mut builder = ReportBuilder::new();
    parse_str(xml, &mut builder)?;
    let (mut report, mut diagnostics) = builder.finish();
    diagnostics.extend(report.bind(rows));
    Ok((report, diagnostics))
}

pub fn build_from_file(
    path: impl AsRef<Path>,
    rows: &dyn RowSource,
) -> Result<(Report, Vec<Diagnostic>), ReportError> {
    let path = path.as_ref();
    let xml = std::fs::read_to_string(path).map_err(|e| ReportError::io(path, e))?;
    build_from_str(&xml, rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::RowSet;
    use crate::model::{Content, TextSource};

    fn rows() -> RowSet {
        RowSet::new(vec!["region".to_string()])
    }

    #[test]
    fn empty_elements_open_and_close() {
        let xml = r#"<?xml version="1.0"?>
            <report>
              <!-- a comment -->
              <group groupsource="region">
                <body>
                  <cell textsource="data" celltext="region" percent="50"/>
                  <cell celltext="Fish &amp; chips" percent="50"/>
                </body>
              </group>
            </report>"#;
        let (report, diagnostics) = build_from_str(xml, &rows()).unwrap();
        assert!(diagnostics.is_empty(), "{:?}", diagnostics);
        let body = report.root.as_ref().and_then(Content::body).unwrap();
        assert_eq!(body.cells.len(), 2);
        assert_eq!(
            body.cells[1].source,
            TextSource::StaticText("Fish & chips".to_string())
        );
        assert!(matches!(report.root, Some(Content::Group(_))));
    }

    #[test]
    fn mismatched_tags_are_fatal() {
        let result = build_from_str("<group><body></group>", &rows());
        assert!(matches!(result, Err(ReportError::Markup(_))));
    }

    #[test]
    fn bad_escape_is_a_diagnostic() {
        let xml = r#"<body><cell celltext="a &bogus; b"/></body>"#;
        let (report, diagnostics) = build_from_str(xml, &rows()).unwrap();
        assert_eq!(diagnostics.len(), 1);
        let body = report.root.as_ref().and_then(Content::body).unwrap();
        assert_eq!(body.cells[0].source, TextSource::StaticText(String::new()));
    }

    #[test]
    fn missing_file_is_io_error() {
        let result = build_from_file("/nonexistent/layout.xml", &rows());
        assert!(matches!(result, Err(ReportError::Io { .. })));
    }
}
