//! # Grouping & Pagination Engine
//!
//! Rows are walked in order. Each group partitions its row range into runs
//! of equal grouping values and, per run, renders its header and then its
//! child: another group, or the body that prints one line per row. The walk
//! stops when the page fills and reports the first row of the next page.
//!
//! How many rows fit on a page depends on measured text heights, so every
//! render takes two passes over the same traversal:
//!
//! 1. **Measure.** Render pages from row 0 with drawing switched off and
//!    record the row each page ends at.
//! 2. **Paint.** For every recorded page, restart at its first row and run
//!    the identical traversal with drawing switched on.
//!
//! The passes differ only in whether draw calls are issued. Anything that
//! moves the cursor or decides a break behaves the same in both, so the
//! paint pass lands on exactly the boundaries the measure pass found.
//!
//! When a page resumes in the middle of a group run, the run is continued:
//! its header, spacing and bars are not repeated. A run's first row is kept
//! together with the headers above it.

pub mod columns;
pub mod page_break;
mod rows;

use std::fmt::Write as _;
use std::ops::Range;

use crate::data::RowSource;
use crate::model::{Content, Edges, GroupNode, NodeStyle, RenderOptions, Report, DEFAULT_TIMESTAMP_FORMAT};
use crate::style::FontDescription;
use crate::surface::{Pass, Surface};

use page_break::{decide_break, page_limit, PageBreaks};

/// Measured in the base font to get the line height for the page's safety
/// margin.
const LINE_PROBE: &str = "Ty";

/// Mutable traversal state of one pass.
#[derive(Debug, Clone)]
pub struct PaginationState {
    pub pass: Pass,
    /// Next data row to render.
    pub row: usize,
    /// Zero-based page index.
    pub page: usize,
    /// Vertical cursor from the top of the usable area.
    pub y: f64,
    /// Pages counted so far (measure) or the final count (paint).
    pub total_pages: usize,
    /// Exclusive end row of every page measured so far.
    pub page_ends: Vec<usize>,
    pub(crate) rows_on_page: usize,
    pub(crate) line_height: f64,
    pub(crate) page_width: f64,
    pub(crate) page_height: f64,
    pub(crate) limit: f64,
}

/// Font and padding resolved down to some node.
#[derive(Debug, Clone)]
pub(crate) struct Scope {
    pub font: FontDescription,
    pub padding: Edges,
}

impl Scope {
    pub fn child(&self, style: &NodeStyle) -> Scope {
        Scope {
            font: style.font.resolve(&self.font),
            padding: style.padding.resolve(&self.padding),
        }
    }
}

/// Read-only inputs shared by both passes.
pub(crate) struct RenderEnv<'a> {
    pub report: &'a Report,
    pub rows: &'a dyn RowSource,
    pub options: &'a RenderOptions,
    /// Text of `now` cells, fixed for the whole render.
    pub timestamp: String,
}

impl RenderEnv<'_> {
    fn base_scope(&self) -> Scope {
        Scope {
            font: self.report.base_font(),
            padding: self.report.base_padding(),
        }
    }
}

/// Runs the measure and paint passes of one report over one row source.
pub struct Paginator<'a> {
    env: RenderEnv<'a>,
}

impl<'a> Paginator<'a> {
    pub fn new(report: &'a Report, rows: &'a dyn RowSource, options: &'a RenderOptions) -> Self {
        let timestamp = format_timestamp(&chrono::Local::now(), &options.timestamp_format);
        Self {
            env: RenderEnv {
                report,
                rows,
                options,
                timestamp,
            },
        }
    }

    /// Replace the captured render time shown by `now` cells.
    pub fn with_timestamp(mut self, timestamp: impl Into<String>) -> Self {
        self.env.timestamp = timestamp.into();
        self
    }

    /// Measure pass: find the end row of every page without drawing.
    pub fn measure(&self, surface: &mut dyn Surface) -> PageBreaks {
        let mut state = self.new_state(Pass::Measure, surface);
        let row_count = self.env.rows.row_count();
        log::debug!("measure pass over {} rows", row_count);

        loop {
            let start = state.row;
            let end = self.render_page(&mut state, surface);
            state.page_ends.push(end);
            state.page += 1;
            state.total_pages = state.page;
            log::debug!("page {} holds rows {}..{}", state.page, start, end);
            if end >= row_count {
                break;
            }
            if end <= start {
                log::warn!("no row fits at row {}; pagination stopped", start);
                break;
            }
        }

        PageBreaks {
            page_ends: state.page_ends,
        }
    }

    /// Paint pass: replay each measured page with drawing switched on.
    pub fn paint(&self, breaks: &PageBreaks, surface: &mut dyn Surface) {
        let mut state = self.new_state(Pass::Paint, surface);
        state.total_pages = breaks.total_pages();
        state.page_ends = breaks.page_ends.clone();
        log::debug!("paint pass over {} pages", state.total_pages);

        for page in 0..state.total_pages {
            let rows = breaks.rows_of(page);
            state.page = page;
            state.row = rows.start;
            surface.begin_page(page);
            let end = self.render_page(&mut state, surface);
            surface.end_page(page);
            if end != rows.end {
                log::warn!(
                    "page {}: paint pass ended at row {}, measure pass at {}",
                    page + 1,
                    end,
                    rows.end
                );
            }
        }
    }

    /// Both passes. Returns the page count.
    pub fn run(&self, surface: &mut dyn Surface) -> usize {
        let breaks = self.measure(surface);
        self.paint(&breaks, surface);
        breaks.total_pages()
    }

    fn new_state(&self, pass: Pass, surface: &dyn Surface) -> PaginationState {
        let page_width = surface.page_width();
        let page_height = surface.page_height();
        let line_height = surface.measure(LINE_PROBE, &self.env.report.base_font(), page_width);
        PaginationState {
            pass,
            row: 0,
            page: 0,
            y: 0.0,
            total_pages: 0,
            page_ends: Vec::new(),
            rows_on_page: 0,
            line_height,
            page_width,
            page_height,
            limit: page_limit(page_height, line_height, self.env.options.safety_lines),
        }
    }

    /// Render one page from `state.row`. Returns the first row of the next
    /// page.
    fn render_page(&self, state: &mut PaginationState, surface: &mut dyn Surface) -> usize {
        let report = self.env.report;
        let row_count = self.env.rows.row_count();
        let start = state.row;
        let context_row = (start < row_count).then_some(start);
        let base = self.env.base_scope();

        state.y = 0.0;
        state.rows_on_page = 0;

        if state.page == 0 {
            if let Some(header) = &report.document_header {
                rows::render_band(&self.env, state, header, context_row, &base, surface);
            }
        }
        if let Some(header) = &report.page_header {
            rows::render_band(&self.env, state, header, context_row, &base, surface);
        }

        match &report.root {
            Some(Content::Group(group)) => {
                self.traverse_group(group, row_count, start > 0, &base, state, surface)
            }
            Some(Content::Body(body)) => {
                rows::render_row_group(&self.env, state, body, row_count, start > 0, &base, surface)
            }
            None => state.row = row_count,
        }
        state.row
    }

    /// Render runs of `group` within `[state.row, max_row)` until the rows
    /// are exhausted or the page fills. `resume` is set when this call starts
    /// a page and every enclosing run continues from the previous one.
    fn traverse_group(
        &self,
        group: &GroupNode,
        max_row: usize,
        resume: bool,
        parent: &Scope,
        state: &mut PaginationState,
        surface: &mut dyn Surface,
    ) {
        let rows = self.env.rows;
        let column = group.group_by.as_ref().and_then(|c| c.index);
        let scope = parent.child(&group.style);
        let border = group.style.border;
        let mut first = true;

        while state.row < max_row {
            let start = state.row;
            let end = run_end(rows, column, start, max_row);
            let continues = first && resume && start > 0 && same_group(rows, column, start - 1, start);
            first = false;

            if !continues {
                let lead = self.group_lead(group, start, parent, state, &*surface);
                if !decide_break(state.y, lead, state.limit, state.rows_on_page).places() {
                    log::trace!("page {}: run at row {} moves to the next page", state.page + 1, start);
                    break;
                }
                state.y += group.style.points_above;
            }

            let top = state.y;
            if !continues {
                rows::draw_bars(state, border, surface);
                if let Some(header) = &group.header {
                    rows::render_band(&self.env, state, header, Some(start), &scope, surface);
                }
            }

            match &group.child {
                Some(Content::Group(child)) => {
                    self.traverse_group(child, end, continues, &scope, state, surface)
                }
                Some(Content::Body(body)) => {
                    rows::render_row_group(&self.env, state, body, end, continues, &scope, surface)
                }
                None => state.row = end,
            }

            let finished = state.row >= end;
            if finished {
                rows::draw_bars(state, border, surface);
            }
            rows::draw_box(state, border, top, surface);
            if !finished {
                break;
            }
            state.y += group.style.points_below;
            if state.y >= state.page_height {
                break;
            }
        }
    }

    /// Height from the cursor to the bottom of the first body row of a run
    /// of `group` starting at `row`, headers of nested groups included.
    fn group_lead(
        &self,
        group: &GroupNode,
        row: usize,
        parent: &Scope,
        state: &PaginationState,
        surface: &dyn Surface,
    ) -> f64 {
        let scope = parent.child(&group.style);
        let mut height = group.style.points_above + rows::bar_advance(group.style.border);
        if let Some(header) = &group.header {
            height += rows::band_height(&self.env, state, header, Some(row), &scope, surface);
        }
        height += match &group.child {
            Some(Content::Group(child)) => self.group_lead(child, row, &scope, state, surface),
            Some(Content::Body(body)) => {
                rows::body_lead(&self.env, state, body, row, &scope, surface)
            }
            None => 0.0,
        };
        height
    }
}

/// Measure and paint `report` over `rows` with default options. Returns the
/// page count, which is at least 1.
pub fn paginate_and_render(report: &Report, rows: &dyn RowSource, surface: &mut dyn Surface) -> usize {
    let options = RenderOptions::default();
    Paginator::new(report, rows, &options).run(surface)
}

/// Whether rows `a` and `b` share a grouping value. Without a bound column
/// every row is in the same group.
pub fn same_group(rows: &dyn RowSource, column: Option<usize>, a: usize, b: usize) -> bool {
    match column {
        Some(column) => rows.value(a, column) == rows.value(b, column),
        None => true,
    }
}

/// Exclusive end of the run that starts at `start`.
pub fn run_end(rows: &dyn RowSource, column: Option<usize>, start: usize, max_row: usize) -> usize {
    let mut end = start;
    while end < max_row && same_group(rows, column, start, end) {
        end += 1;
    }
    end
}

/// Every run of equal grouping values within `range`, in order.
pub fn group_runs(rows: &dyn RowSource, column: Option<usize>, range: Range<usize>) -> Vec<Range<usize>> {
    let mut runs = Vec::new();
    let mut start = range.start;
    while start < range.end {
        let end = run_end(rows, column, start, range.end);
        runs.push(start..end);
        start = end;
    }
    runs
}

fn format_timestamp<Tz>(now: &chrono::DateTime<Tz>, format: &str) -> String
where
    Tz: chrono::TimeZone,
    Tz::Offset: std::fmt::Display,
{
    let mut text = String::new();
    if write!(text, "{}", now.format(format)).is_err() {
        log::warn!("invalid timestamp format '{}'", format);
        text.clear();
        let _ = write!(text, "{}", now.format(DEFAULT_TIMESTAMP_FORMAT));
    }
    text
}
