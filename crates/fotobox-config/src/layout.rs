//! Grid geometry for the montage and printout.
//!
//! Margins and padding are border lengths in pixels. Cells are laid out
//! row-major: slot `i` sits in column `i % columns`, row `i / columns`.

use anyhow::{Result, bail};
use serde::{Deserialize, Serialize};

/// Border lengths around and between grid cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Margin {
    pub left: u32,
    pub right: u32,
    pub top: u32,
    pub bottom: u32,
    /// Gap between neighbouring cells.
    pub padding: u32,
}

impl Margin {
    pub const fn uniform(margin: u32, padding: u32) -> Self {
        Self {
            left: margin,
            right: margin,
            top: margin,
            bottom: margin,
            padding,
        }
    }
}

/// Slot rectangle in pixels, `right`/`bottom` exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SlotBox {
    pub left: u32,
    pub top: u32,
    pub right: u32,
    pub bottom: u32,
}

impl SlotBox {
    pub fn width(&self) -> u32 {
        self.right - self.left
    }

    pub fn height(&self) -> u32 {
        self.bottom - self.top
    }

    pub fn size(&self) -> (u32, u32) {
        (self.width(), self.height())
    }

    /// `(left, top, right, bottom)`.
    pub fn as_tuple(&self) -> (u32, u32, u32, u32) {
        (self.left, self.top, self.right, self.bottom)
    }
}

/// A `columns × rows` grid with margins.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Grid {
    pub columns: u32,
    pub rows: u32,
    pub margin: Margin,
}

impl Grid {
    pub fn new(columns: u32, rows: u32, margin: Margin) -> Self {
        Self {
            columns,
            rows,
            margin,
        }
    }

    pub fn cells(&self) -> usize {
        (self.columns * self.rows) as usize
    }

    /// Side lengths of one cell when the grid fills `screen`.
    ///
    /// Each axis reserves its leading margin and the padding between cells;
    /// the remainder is split evenly and the trailing margin absorbs rounding.
    pub fn cell_size(&self, screen: (u32, u32)) -> Result<(u32, u32)> {
        if self.columns == 0 || self.rows == 0 {
            bail!("grid needs at least one column and one row");
        }
        let width = side_length(screen.0, self.columns, self.margin.left, self.margin.padding);
        let height = side_length(screen.1, self.rows, self.margin.top, self.margin.padding);
        match (width, height) {
            (Some(w), Some(h)) if w > 0 && h > 0 => Ok((w, h)),
            _ => bail!(
                "{}x{} grid with margin {:?} does not fit on {}x{}",
                self.columns,
                self.rows,
                self.margin,
                screen.0,
                screen.1
            ),
        }
    }

    /// Slot rectangles covering `screen`, computed once at startup.
    pub fn slot_boxes(&self, screen: (u32, u32)) -> Result<Vec<SlotBox>> {
        let (width, height) = self.cell_size(screen)?;
        Ok((0..self.cells() as u32)
            .map(|i| {
                let (col, row) = (i % self.columns, i / self.columns);
                let left = self.margin.left + (width + self.margin.padding) * col;
                let top = self.margin.top + (height + self.margin.padding) * row;
                SlotBox {
                    left,
                    top,
                    right: left + width,
                    bottom: top + height,
                }
            })
            .collect())
    }
}

fn side_length(total: u32, cells: u32, leading: u32, padding: u32) -> Option<u32> {
    let reserved = leading.checked_add(padding.checked_mul(cells - 1)?)?;
    total.checked_sub(reserved).map(|free| free / cells)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn two_by_two_on_800x600() {
        let grid = Grid::new(2, 2, Margin::uniform(10, 10));
        let boxes: Vec<_> = grid
            .slot_boxes((800, 600))
            .unwrap()
            .iter()
            .map(SlotBox::as_tuple)
            .collect();
        assert_eq!(
            boxes,
            vec![
                (10, 10, 400, 300),
                (410, 10, 800, 300),
                (10, 310, 400, 600),
                (410, 310, 800, 600),
            ]
        );
    }

    #[test]
    fn cell_size_formula() {
        let grid = Grid::new(3, 1, Margin::uniform(20, 5));
        // (1000 - 20 - 2*5) / 3 = 323, (300 - 20) / 1 = 280
        assert_eq!(grid.cell_size((1000, 300)).unwrap(), (323, 280));
    }

    #[test]
    fn single_cell_fills_screen_after_margin() {
        let grid = Grid::new(1, 1, Margin::uniform(0, 50));
        let boxes = grid.slot_boxes((640, 480)).unwrap();
        assert_eq!(boxes, vec![SlotBox { left: 0, top: 0, right: 640, bottom: 480 }]);
    }

    #[test]
    fn row_major_order() {
        let grid = Grid::new(3, 2, Margin::default());
        let boxes = grid.slot_boxes((300, 200)).unwrap();
        assert_eq!(boxes.len(), 6);
        assert_eq!(boxes[2].left, 200);
        assert_eq!(boxes[2].top, 0);
        assert_eq!(boxes[3].left, 0);
        assert_eq!(boxes[3].top, 100);
    }

    #[test]
    fn oversized_margin_is_rejected() {
        let grid = Grid::new(2, 2, Margin::uniform(700, 10));
        assert!(grid.slot_boxes((800, 600)).is_err());
    }

    #[test]
    fn empty_grid_is_rejected() {
        let grid = Grid::new(0, 2, Margin::default());
        assert!(grid.cell_size((800, 600)).is_err());
    }
}
