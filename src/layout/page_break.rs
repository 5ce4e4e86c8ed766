//! # Page Break Decisions
//!
//! A page is full once the next piece of content would reach into the
//! safety margin at its bottom. Every page must place at least one body row,
//! so a row that can never fit is placed anyway and allowed to overflow.

/// Slack for float noise when comparing a cursor with the page limit.
pub const FIT_EPSILON: f64 = 1e-6;

/// What to do with the next piece of content.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BreakDecision {
    /// It fits on the current page.
    Place,
    /// It does not fit, but the page has no body row yet. Place it anyway.
    Overflow,
    /// Start a new page first.
    MoveToNextPage,
}

impl BreakDecision {
    pub fn places(self) -> bool {
        !matches!(self, BreakDecision::MoveToNextPage)
    }
}

/// Decide whether content `height` tall, starting at cursor `y`, goes on the
/// current page. `limit` is the lowest point content may reach.
pub fn decide_break(y: f64, height: f64, limit: f64, rows_on_page: usize) -> BreakDecision {
    if y + height <= limit + FIT_EPSILON {
        BreakDecision::Place
    } else if rows_on_page == 0 {
        BreakDecision::Overflow
    } else {
        BreakDecision::MoveToNextPage
    }
}

/// The lowest point a row may reach: the page height less the safety margin.
pub fn page_limit(page_height: f64, line_height: f64, safety_lines: f64) -> f64 {
    page_height - line_height * safety_lines.max(0.0)
}

/// Row boundaries found by the measure pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageBreaks {
    /// Exclusive end row of each page, in page order.
    pub page_ends: Vec<usize>,
}

impl PageBreaks {
    /// Number of pages. An empty report still has one.
    pub fn total_pages(&self) -> usize {
        self.page_ends.len().max(1)
    }

    /// First row of `page`.
    pub fn start_of(&self, page: usize) -> usize {
        match page {
            0 => 0,
            _ => self.page_ends.get(page - 1).copied().unwrap_or(0),
        }
    }

    /// Rows `[start, end)` printed on `page`.
    pub fn rows_of(&self, page: usize) -> std::ops::Range<usize> {
        let start = self.start_of(page);
        let end = self.page_ends.get(page).copied().unwrap_or(start);
        start..end
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fits_within_limit() {
        assert_eq!(decide_break(10.0, 20.0, 30.0, 3), BreakDecision::Place);
    }

    #[test]
    fn too_tall_moves_when_page_has_rows() {
        assert_eq!(
            decide_break(10.0, 20.5, 30.0, 3),
            BreakDecision::MoveToNextPage
        );
    }

    #[test]
    fn first_row_always_placed() {
        let decision = decide_break(0.0, 500.0, 30.0, 0);
        assert_eq!(decision, BreakDecision::Overflow);
        assert!(decision.places());
    }

    #[test]
    fn limit_subtracts_safety_lines() {
        assert_eq!(page_limit(100.0, 12.0, 1.0), 88.0);
        assert_eq!(page_limit(100.0, 12.0, 0.0), 100.0);
        assert_eq!(page_limit(100.0, 12.0, -3.0), 100.0);
    }

    #[test]
    fn page_ranges() {
        let breaks = PageBreaks {
            page_ends: vec![4, 9, 10],
        };
        assert_eq!(breaks.total_pages(), 3);
        assert_eq!(breaks.rows_of(0), 0..4);
        assert_eq!(breaks.rows_of(1), 4..9);
        assert_eq!(breaks.rows_of(2), 9..10);
        assert_eq!(PageBreaks::default().total_pages(), 1);
    }
}
