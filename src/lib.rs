//! # tableprint
//!
//! A grouped, paginated table report engine.
//!
//! A report layout is declared in markup: nested groups that partition the
//! rows by a column's value, a header per group, and a body band that prints
//! one line per row. Rows flow *into* pages: every break is decided while
//! rendering, with the page boundary as a hard constraint, and runs that
//! straddle a page continue on the next one without repeating their header.
//!
//! ## Architecture
//!
//! ```text
//! Layout XML
//!       ↓
//!   [markup]   : quick-xml events
//!       ↓
//!   [builder]  : Report tree, attribute parsing, diagnostics
//!       ↓
//!   [layout]   : measure pass, then paint pass, over a Surface
//!       ↓
//!   [surface]  : PageRecorder: standard font metrics, draw commands
//!       ↓
//!   [pdf]      : Serialize to PDF bytes
//! ```

pub mod builder;
pub mod data;
pub mod error;
pub mod font;
pub mod layout;
pub mod markup;
pub mod model;
pub mod pdf;
pub mod style;
pub mod surface;
pub mod text;

pub use data::{RowSet, RowSource};
pub use error::{Diagnostic, ReportError};
pub use model::{Report, ReportConfig};

use layout::Paginator;
use pdf::PdfWriter;
use surface::{PageRecorder, RecordedPage};

/// Result of rendering one report.
#[derive(Debug, Clone)]
pub struct RenderOutput {
    pub pdf: Vec<u8>,
    pub page_count: usize,
    /// Recoverable problems found while building the report.
    pub diagnostics: Vec<Diagnostic>,
}

/// Lay out an already built report over `rows` and return the recorded
/// pages.
pub fn render_pages(report: &Report, rows: &dyn RowSource, config: &ReportConfig) -> Vec<RecordedPage> {
    let mut recorder = PageRecorder::new(config.page.clone());
    let pages = Paginator::new(report, rows, &config.render).run(&mut recorder);
    log::info!("rendered {} rows onto {} pages", rows.row_count(), pages);
    recorder.into_pages()
}

/// Render a layout document over `rows` to PDF bytes.
///
/// This is the primary entry point. Fails only when the layout is not
/// well-formed; every other problem is reported in
/// [`RenderOutput::diagnostics`] and rendering carries on.
pub fn render_pdf(
    layout_xml: &str,
    rows: &dyn RowSource,
    config: &ReportConfig,
) -> Result<RenderOutput, ReportError> {
    let (report, diagnostics) = markup::build_from_str(layout_xml, rows)?;
    let pages = render_pages(&report, rows, config);
    let pdf = PdfWriter::new().write(&pages, &config.page, &config.metadata);
    Ok(RenderOutput {
        pdf,
        page_count: pages.len().max(1),
        diagnostics,
    })
}
