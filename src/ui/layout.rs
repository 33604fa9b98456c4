//! Grid layout for subject cards
//!
//! Provides:
//! - fixed-column grid (2 columns by default)
//! - row-major ordering, so subjects read left to right
//! - card placement inside a panel, dropping cards that do not fit

use ratatui::layout::Rect;

/// Gap between columns
const COLUMN_GAP: u16 = 1;

/// Grid layout configuration
#[derive(Debug, Clone, Copy)]
pub struct SubjectGrid {
    /// Number of columns (default: 2)
    pub columns: u16,
    /// Card height in lines (default: 4)
    pub card_height: u16,
}

impl Default for SubjectGrid {
    fn default() -> Self {
        Self {
            columns: 2,
            card_height: 4,
        }
    }
}

impl SubjectGrid {
    pub fn new(columns: u16, card_height: u16) -> Self {
        Self {
            columns: columns.clamp(1, 4),
            card_height: card_height.max(1),
        }
    }

    /// Convert flat index to (row, col), row-major:
    /// ```text
    /// Index:  0 1
    ///         2 3
    /// ```
    pub fn index_to_position(&self, index: usize) -> (u16, u16) {
        let cols = self.columns as usize;
        ((index / cols) as u16, (index % cols) as u16)
    }

    /// Width of one column inside `inner_width`
    pub fn column_width(&self, inner_width: u16) -> u16 {
        let gaps = COLUMN_GAP * (self.columns - 1);
        inner_width.saturating_sub(gaps) / self.columns
    }

    /// Area of card `index` inside `inner`, or None if it does not fit
    pub fn card_area(&self, inner: Rect, index: usize) -> Option<Rect> {
        let (row, col) = self.index_to_position(index);
        let width = self.column_width(inner.width);
        if width == 0 {
            return None;
        }

        let x = inner.x + col * (width + COLUMN_GAP);
        let y = inner.y + row * self.card_height;
        if y + self.card_height > inner.y + inner.height {
            return None;
        }

        Some(Rect {
            x,
            y,
            width,
            height: self.card_height,
        })
    }
}
