//! Column layout: percent-of-width cells to absolute offsets and widths.

use std::cell::Ref;

use crate::model::{CellDef, RowBand};

/// Horizontal extent of one cell.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColumnSlot {
    pub x: f64,
    pub width: f64,
}

impl ColumnSlot {
    pub fn right(&self) -> f64 {
        self.x + self.width
    }
}

/// Slots for one band's cells at a given page width.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ColumnLayout {
    /// Width the slots were computed for; `None` until first use.
    pub page_width: Option<f64>,
    pub slots: Vec<ColumnSlot>,
}

/// Lay cells out left to right from offset 0. Each cell is `percent` of
/// `page_width` wide, unless it has an absolute width.
pub fn compute_columns(cells: &[CellDef], page_width: f64) -> ColumnLayout {
    let mut x = 0.0;
    let slots = cells
        .iter()
        .map(|cell| {
            let width = cell
                .fixed_width
                .unwrap_or(cell.percent * page_width / 100.0);
            let slot = ColumnSlot { x, width };
            x += width;
            slot
        })
        .collect();
    ColumnLayout {
        page_width: Some(page_width),
        slots,
    }
}

impl RowBand {
    /// The band's column layout, computed once per page width.
    pub fn columns(&self, page_width: f64) -> Ref<'_, ColumnLayout> {
        let stale = self.columns.borrow().page_width != Some(page_width);
        if stale {
            log::trace!(
                "laying out {} cells for width {:.2}",
                self.cells.len(),
                page_width
            );
            *self.columns.borrow_mut() = compute_columns(&self.cells, page_width);
        }
        self.columns.borrow()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::TextSource;

    fn cell(percent: f64) -> CellDef {
        CellDef::new(TextSource::StaticText(String::new())).with_percent(percent)
    }

    #[test]
    fn percentages_summing_to_100_fill_the_width() {
        let cells = [cell(12.5), cell(33.3), cell(20.0), cell(34.2)];
        let layout = compute_columns(&cells, 540.0);
        assert_eq!(layout.slots[0].x, 0.0);
        for pair in layout.slots.windows(2) {
            assert!((pair[0].right() - pair[1].x).abs() < 1e-9);
        }
        let last = layout.slots[3];
        assert!((last.right() - 540.0).abs() < 1e-9);
    }

    #[test]
    fn fixed_width_overrides_percent() {
        let mut fixed = cell(50.0);
        fixed.fixed_width = Some(72.0);
        let layout = compute_columns(&[fixed, cell(10.0)], 600.0);
        assert_eq!(layout.slots[0].width, 72.0);
        assert_eq!(layout.slots[1].x, 72.0);
        assert_eq!(layout.slots[1].width, 60.0);
    }

    #[test]
    fn cached_until_width_changes() {
        let band = RowBand::new(vec![cell(50.0), cell(50.0)]);
        assert_eq!(band.columns(200.0).slots[1].x, 100.0);
        assert_eq!(band.columns.borrow().page_width, Some(200.0));
        assert_eq!(band.columns(400.0).slots[1].x, 200.0);
    }
}
