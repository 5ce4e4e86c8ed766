//! Structured error types for tableprint.
//!
//! Two tiers. [`ReportError`] is fatal to a single call: the layout document
//! could not be read, is not well-formed, or a data file is unusable. Nothing
//! partial is returned. [`Diagnostic`] is recoverable: the offending element,
//! attribute or column is skipped and the report still renders.

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

/// Errors that abort one build or render call.
#[derive(Debug, Error)]
pub enum ReportError {
    /// A layout document or data file could not be read.
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The layout document is not well-formed markup.
    #[error("malformed layout markup: {0}")]
    Markup(#[from] quick_xml::Error),

    /// A JSON row set or configuration file failed to parse.
    #[error("failed to parse JSON: {0}")]
    Data(#[from] serde_json::Error),

    /// JSON parsed, but does not have the shape of a row set.
    #[error("invalid row data: {0}")]
    InvalidData(String),
}

impl ReportError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        ReportError::Io {
            path: path.into(),
            source,
        }
    }
}

/// A recoverable problem found while building or binding a report.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Diagnostic {
    /// An element appeared where it cannot be attached. It was skipped,
    /// together with everything nested inside it.
    #[error("<{element}> skipped: {reason}")]
    MarkupStructure { element: String, reason: String },

    /// A data cell or a group refers to a column the row source lacks.
    /// Cells render blank; groups treat their whole range as one run.
    #[error("'{column}' is not a valid column ({context})")]
    UnknownColumn { column: String, context: String },

    /// An attribute value did not parse. The field keeps its inherited value.
    #[error("<{element} {attribute}=\"{value}\">: expected {expected}")]
    AttributeParse {
        element: String,
        attribute: String,
        value: String,
        expected: &'static str,
    },
}

impl Diagnostic {
    /// Short machine-friendly name of the diagnostic kind.
    pub fn kind(&self) -> DiagnosticKind {
        match self {
            Diagnostic::MarkupStructure { .. } => DiagnosticKind::MarkupStructure,
            Diagnostic::UnknownColumn { .. } => DiagnosticKind::UnknownColumn,
            Diagnostic::AttributeParse { .. } => DiagnosticKind::AttributeParse,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiagnosticKind {
    MarkupStructure,
    UnknownColumn,
    AttributeParse,
}

impl fmt::Display for DiagnosticKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DiagnosticKind::MarkupStructure => "markup-structure",
            DiagnosticKind::UnknownColumn => "unknown-column",
            DiagnosticKind::AttributeParse => "attribute-parse",
        };
        f.write_str(name)
    }
}

/// Collects diagnostics and logs each one as it arrives.
#[derive(Debug, Default)]
pub(crate) struct Diagnostics {
    items: Vec<Diagnostic>,
}

impl Diagnostics {
    pub(crate) fn push(&mut self, diagnostic: Diagnostic) {
        log::warn!("{}", diagnostic);
        self.items.push(diagnostic);
    }

    pub(crate) fn into_vec(self) -> Vec<Diagnostic> {
        self.items
    }
}
