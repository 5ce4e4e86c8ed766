//! Cell, row and row-group rendering.
//!
//! Every function here runs identically in both passes. Only the draw calls
//! are gated on [`Pass::Paint`]; cursor movement and measurement never are,
//! which is what keeps the two passes in step.

use crate::model::{expand_template, BorderStyle, CellDef, RowBand, TextSource};
use crate::style::{FontDescription, TextAlign};
use crate::surface::{CellEvent, Pass, Surface};

use super::page_break::{decide_break, BreakDecision};
use super::{PaginationState, RenderEnv, Scope};

/// Vertical space taken by one horizontal rule.
pub const RULE_ADVANCE: f64 = 2.0;
pub const RULE_WIDTH: f64 = 0.5;
pub const HEAVY_RULE_WIDTH: f64 = 1.0;
pub const BOX_WIDTH: f64 = 1.0;
/// Inset of the inner rectangle of a `doublebox`.
pub const INNER_BOX_INSET: f64 = 3.0;

#[derive(Debug, Clone)]
pub(crate) struct ResolvedCell {
    pub index: usize,
    pub text: String,
    pub font: FontDescription,
    /// Left edge of the text box, padding applied.
    pub x: f64,
    pub width: f64,
    pub align: TextAlign,
    pub height: f64,
}

/// A row measured but not yet placed.
#[derive(Debug, Clone)]
pub(crate) struct ResolvedRow {
    pub cells: Vec<ResolvedCell>,
    /// Left edge of every cell slot, blank cells included.
    pub edges: Vec<f64>,
    pub pad_top: f64,
    pub pad_bottom: f64,
    pub content_height: f64,
}

impl ResolvedRow {
    pub fn height(&self) -> f64 {
        self.pad_top + self.content_height + self.pad_bottom
    }
}

/// Text for a cell: what is shown, and what its height is measured with.
fn cell_text(
    env: &RenderEnv<'_>,
    state: &PaginationState,
    cell: &CellDef,
    row: Option<usize>,
) -> (String, Option<String>) {
    let rows = env.rows;
    match &cell.source {
        TextSource::StaticText(text) => (text.clone(), None),
        TextSource::DataColumn(column) => {
            let value = column
                .index
                .zip(row)
                .and_then(|(index, row)| rows.value(row, index))
                .unwrap_or_default();
            (value.to_string(), None)
        }
        TextSource::CurrentPageNumber => (format!("Page {}", state.page + 1), None),
        TextSource::PageOfTotalPages => {
            let page = state.page + 1;
            let digits = env
                .options
                .page_of_placeholder_digits
                .max(page.to_string().len());
            let provisional = format!("Page {} of {}", page, "9".repeat(digits));
            match state.pass {
                Pass::Paint => (
                    format!("Page {} of {}", page, state.total_pages),
                    Some(provisional),
                ),
                Pass::Measure => (provisional, None),
            }
        }
        TextSource::CurrentTime => (env.timestamp.clone(), None),
        TextSource::FormattedValue(template) => {
            let text = expand_template(template, |name| {
                row.and_then(|row| rows.value_by_name(row, name))
            });
            (text, None)
        }
    }
}

/// Resolve and measure every cell of `band` against `row`. `scope` is the
/// band's own resolved scope.
pub(crate) fn resolve_row(
    env: &RenderEnv<'_>,
    state: &PaginationState,
    band: &RowBand,
    row: Option<usize>,
    scope: &Scope,
    surface: &dyn Surface,
) -> ResolvedRow {
    let columns = band.columns(state.page_width);
    let defaults = &env.report.default_cell;
    let mut cells = Vec::with_capacity(band.cells.len());
    let mut edges = Vec::with_capacity(band.cells.len());
    let mut content_height: f64 = 0.0;

    for (index, (cell, slot)) in band.cells.iter().zip(&columns.slots).enumerate() {
        edges.push(slot.x);
        let (text, sizing) = cell_text(env, state, cell, row);
        if text.is_empty() {
            if let TextSource::DataColumn(column) = &cell.source {
                log::debug!("row {:?}: no value for column '{}'", row, column.name);
            }
            continue;
        }

        let font = cell.font.resolve(&scope.font);
        let pad_left = cell
            .pad_left
            .or(defaults.pad_left)
            .unwrap_or(scope.padding.left);
        let pad_right = cell
            .pad_right
            .or(defaults.pad_right)
            .unwrap_or(scope.padding.right);
        let width = (slot.width - pad_left - pad_right).max(0.0);
        let height = surface.measure(sizing.as_deref().unwrap_or(&text), &font, width);
        content_height = content_height.max(height);

        cells.push(ResolvedCell {
            index,
            text,
            font,
            x: slot.x + pad_left,
            width,
            align: cell.align.or(defaults.align).unwrap_or_default(),
            height,
        });
    }

    ResolvedRow {
        cells,
        edges,
        pad_top: scope.padding.top,
        pad_bottom: scope.padding.bottom,
        content_height,
    }
}

/// Place a resolved row at the cursor and advance past it.
pub(crate) fn emit_row(
    state: &mut PaginationState,
    resolved: &ResolvedRow,
    border: BorderStyle,
    row: Option<usize>,
    surface: &mut dyn Surface,
) {
    let top = state.y + resolved.pad_top;
    let painting = state.pass == Pass::Paint;
    for cell in &resolved.cells {
        surface.on_cell(&CellEvent {
            pass: state.pass,
            page: state.page,
            row,
            cell: cell.index,
            text: &cell.text,
            font: &cell.font,
            x: cell.x,
            y: top,
            width: cell.width,
            height: cell.height,
        });
        if painting {
            surface.draw_text(&cell.text, &cell.font, cell.x, top, cell.width, cell.align);
        }
    }
    if painting && border.contains(BorderStyle::VBAR) && resolved.content_height > 0.0 {
        let bottom = top + resolved.content_height;
        for &x in resolved.edges.iter().skip(1) {
            surface.draw_line(x, top, x, bottom, RULE_WIDTH);
        }
    }
    state.y += resolved.height();
}

/// Space the bars of `border` take above (or below) a run.
pub(crate) fn bar_advance(border: BorderStyle) -> f64 {
    if border.contains(BorderStyle::DOUBLE_BAR) {
        2.0 * RULE_ADVANCE
    } else if border.intersects(BorderStyle::SINGLE_BAR | BorderStyle::SINGLE_BAR_HEAVY) {
        RULE_ADVANCE
    } else {
        0.0
    }
}

fn hline_advance(border: BorderStyle) -> f64 {
    if border.contains(BorderStyle::HLINE) {
        RULE_ADVANCE
    } else {
        0.0
    }
}

fn rule(state: &mut PaginationState, width: f64, surface: &mut dyn Surface) {
    if state.pass == Pass::Paint {
        let y = state.y + RULE_ADVANCE / 2.0;
        surface.draw_line(0.0, y, state.page_width, y, width);
    }
    state.y += RULE_ADVANCE;
}

pub(crate) fn draw_bars(state: &mut PaginationState, border: BorderStyle, surface: &mut dyn Surface) {
    if border.contains(BorderStyle::DOUBLE_BAR) {
        rule(state, RULE_WIDTH, surface);
        rule(state, RULE_WIDTH, surface);
    } else if border.contains(BorderStyle::SINGLE_BAR_HEAVY) {
        rule(state, HEAVY_RULE_WIDTH, surface);
    } else if border.contains(BorderStyle::SINGLE_BAR) {
        rule(state, RULE_WIDTH, surface);
    }
}

fn draw_hline(state: &mut PaginationState, border: BorderStyle, surface: &mut dyn Surface) {
    if border.contains(BorderStyle::HLINE) {
        rule(state, RULE_WIDTH, surface);
    }
}

/// Box the span from `top` to the cursor.
pub(crate) fn draw_box(
    state: &PaginationState,
    border: BorderStyle,
    top: f64,
    surface: &mut dyn Surface,
) {
    let height = state.y - top;
    if state.pass != Pass::Paint || !border.has_box() || height <= 0.0 {
        return;
    }
    surface.draw_rect(0.0, top, state.page_width, height, BOX_WIDTH);
    if border.contains(BorderStyle::DOUBLE_BOX) {
        let inset = INNER_BOX_INSET;
        surface.draw_rect(
            inset,
            top + inset,
            (state.page_width - 2.0 * inset).max(0.0),
            (height - 2.0 * inset).max(0.0),
            RULE_WIDTH,
        );
    }
}

/// Height `render_band` would advance the cursor by.
pub(crate) fn band_height(
    env: &RenderEnv<'_>,
    state: &PaginationState,
    band: &RowBand,
    row: Option<usize>,
    parent: &Scope,
    surface: &dyn Surface,
) -> f64 {
    let scope = parent.child(&band.style);
    let border = band.style.border;
    let resolved = resolve_row(env, state, band, row, &scope, surface);
    band.style.points_above
        + 2.0 * bar_advance(border)
        + 2.0 * hline_advance(border)
        + resolved.height()
        + band.style.points_below
}

/// Render a single-row band: a group header, the page header or the
/// document header.
pub(crate) fn render_band(
    env: &RenderEnv<'_>,
    state: &mut PaginationState,
    band: &RowBand,
    row: Option<usize>,
    parent: &Scope,
    surface: &mut dyn Surface,
) {
    let scope = parent.child(&band.style);
    let border = band.style.border;

    state.y += band.style.points_above;
    let top = state.y;
    draw_bars(state, border, surface);
    draw_hline(state, border, surface);
    let resolved = resolve_row(env, state, band, row, &scope, &*surface);
    emit_row(state, &resolved, border, row, surface);
    draw_hline(state, border, surface);
    draw_bars(state, border, surface);
    draw_box(state, border, top, surface);
    state.y += band.style.points_below;
}

/// Height the body needs before its first row at `row` is complete.
pub(crate) fn body_lead(
    env: &RenderEnv<'_>,
    state: &PaginationState,
    body: &RowBand,
    row: usize,
    parent: &Scope,
    surface: &dyn Surface,
) -> f64 {
    let scope = parent.child(&body.style);
    let border = body.style.border;
    let resolved = resolve_row(env, state, body, Some(row), &scope, surface);
    bar_advance(border) + hline_advance(border) + resolved.height()
}

/// Render body rows `[state.row, max_row)` until the page fills. On return
/// `state.row` is the first row not rendered. `resume` is set when the range
/// continues from the previous page.
pub(crate) fn render_row_group(
    env: &RenderEnv<'_>,
    state: &mut PaginationState,
    body: &RowBand,
    max_row: usize,
    resume: bool,
    parent: &Scope,
    surface: &mut dyn Surface,
) {
    let scope = parent.child(&body.style);
    let border = body.style.border;
    let top = state.y;

    if !resume {
        draw_bars(state, border, surface);
    }
    draw_hline(state, border, surface);

    while state.row < max_row {
        let row = state.row;
        let resolved = resolve_row(env, state, body, Some(row), &scope, &*surface);
        match decide_break(state.y, resolved.height(), state.limit, state.rows_on_page) {
            BreakDecision::MoveToNextPage => {
                log::trace!("page {}: row {} moves to the next page", state.page + 1, row);
                break;
            }
            BreakDecision::Overflow => {
                log::debug!("row {} is taller than the page and overflows it", row);
            }
            BreakDecision::Place => {}
        }
        log::trace!("page {}: row {} at y={:.2}", state.page + 1, row, state.y);
        emit_row(state, &resolved, border, Some(row), surface);
        state.rows_on_page += 1;
        state.row += 1;
        draw_hline(state, border, surface);
    }

    if state.row >= max_row {
        draw_bars(state, border, surface);
    }
    draw_box(state, border, top, surface);
}
