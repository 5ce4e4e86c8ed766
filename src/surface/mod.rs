//! # Drawing Surface
//!
//! The engine's only view of the output medium. A surface reports the usable
//! page size, measures text, and (in the paint pass) receives draw calls.
//! All lengths are points; `y` grows downward from the top of the usable
//! area.

pub mod recorder;

pub use recorder::{DrawCommand, PageRecorder, PositionedLine, RecordedPage};

use crate::style::{FontDescription, TextAlign};

/// Which traversal is running.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Pass {
    /// Sizes rows and finds page boundaries. Nothing is drawn.
    Measure,
    /// Replays the traversal and issues draw calls.
    Paint,
}

/// One resolved cell, reported to [`Surface::on_cell`] in both passes.
#[derive(Debug, Clone, PartialEq)]
pub struct CellEvent<'a> {
    pub pass: Pass,
    pub page: usize,
    /// Data row the cell was resolved against. `None` for page and document
    /// headers on an empty data set.
    pub row: Option<usize>,
    /// Index of the cell within its band.
    pub cell: usize,
    pub text: &'a str,
    pub font: &'a FontDescription,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

/// Text measurement, page geometry and drawing.
pub trait Surface {
    /// Usable width of a page.
    fn page_width(&self) -> f64;

    /// Usable height of a page.
    fn page_height(&self) -> f64;

    /// Height of `text` wrapped to `max_width`.
    fn measure(&self, text: &str, font: &FontDescription, max_width: f64) -> f64;

    fn draw_text(
        &mut self,
        text: &str,
        font: &FontDescription,
        x: f64,
        y: f64,
        max_width: f64,
        align: TextAlign,
    );

    fn draw_line(&mut self, x1: f64, y1: f64, x2: f64, y2: f64, width: f64);

    fn draw_rect(&mut self, x: f64, y: f64, width: f64, height: f64, line_width: f64);

    /// Called before the first draw call of each painted page.
    fn begin_page(&mut self, _page: usize) {}

    /// Called after the last draw call of each painted page.
    fn end_page(&mut self, _page: usize) {}

    /// Observes every non-empty cell, in both passes.
    fn on_cell(&mut self, _event: &CellEvent<'_>) {}
}
