use std::collections::HashMap;

use crate::grid::{Cell, PixelColor};

// ============================================================================
// PIXEL STORE — sparse copy-on-write color assignment over the grid
// ============================================================================

/// The current sparse color assignment over the board.
///
/// A cell present in the map always holds a valid color; absence means
/// unpainted. Mutation is copy-on-write: `with_painted` / `with_erased`
/// return a *new* store and leave `self` untouched, so snapshots held by the
/// history timeline can never be corrupted by later strokes.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PixelStore {
    cells: HashMap<Cell, PixelColor>,
}

impl PixelStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, cell: Cell) -> Option<&PixelColor> {
        self.cells.get(&cell)
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Cell, &PixelColor)> {
        self.cells.iter().map(|(c, col)| (*c, col))
    }

    /// Paint `cell` with `color`. Returns the updated store, or `None` when
    /// the cell already holds exactly that color (idempotent no-op — the
    /// caller must not emit an event or re-render).
    pub fn with_painted(&self, cell: Cell, color: PixelColor) -> Option<Self> {
        if self.cells.get(&cell) == Some(&color) {
            return None;
        }
        let mut next = self.cells.clone();
        next.insert(cell, color);
        Some(Self { cells: next })
    }

    /// Erase `cell`. Returns the updated store, or `None` when the cell is
    /// already absent.
    pub fn with_erased(&self, cell: Cell) -> Option<Self> {
        if !self.cells.contains_key(&cell) {
            return None;
        }
        let mut next = self.cells.clone();
        next.remove(&cell);
        Some(Self { cells: next })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cell(x: u32, y: u32) -> Cell {
        Cell::new(x, y).unwrap()
    }

    fn red() -> PixelColor {
        PixelColor::parse("#e74c3c").unwrap()
    }

    fn blue() -> PixelColor {
        PixelColor::parse("#3498db").unwrap()
    }

    #[test]
    fn paint_then_read_returns_the_color() {
        let store = PixelStore::new().with_painted(cell(3, 7), red()).unwrap();
        assert_eq!(store.get(cell(3, 7)), Some(&red()));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn erase_then_read_returns_absent() {
        let store = PixelStore::new().with_painted(cell(3, 7), red()).unwrap();
        let store = store.with_erased(cell(3, 7)).unwrap();
        assert_eq!(store.get(cell(3, 7)), None);
        assert!(store.is_empty());
    }

    #[test]
    fn repainting_the_same_color_is_a_no_op() {
        let store = PixelStore::new().with_painted(cell(0, 0), red()).unwrap();
        assert!(store.with_painted(cell(0, 0), red()).is_none());
        // A different color still goes through.
        assert!(store.with_painted(cell(0, 0), blue()).is_some());
    }

    #[test]
    fn erasing_an_empty_cell_is_a_no_op() {
        assert!(PixelStore::new().with_erased(cell(5, 5)).is_none());
    }

    #[test]
    fn mutation_never_touches_the_source_store() {
        let before = PixelStore::new().with_painted(cell(1, 1), red()).unwrap();
        let snapshot = before.clone();

        let after = before.with_painted(cell(2, 2), blue()).unwrap();
        assert_eq!(before, snapshot);
        assert_ne!(after, before);

        let erased = after.with_erased(cell(1, 1)).unwrap();
        assert_eq!(after.get(cell(1, 1)), Some(&red()));
        assert_eq!(erased.get(cell(1, 1)), None);
    }

    #[test]
    fn equality_is_content_based_and_order_independent() {
        let a = PixelStore::new()
            .with_painted(cell(0, 0), red())
            .unwrap()
            .with_painted(cell(1, 1), blue())
            .unwrap();
        let b = PixelStore::new()
            .with_painted(cell(1, 1), blue())
            .unwrap()
            .with_painted(cell(0, 0), red())
            .unwrap();
        assert_eq!(a, b);

        let c = b.with_painted(cell(0, 0), blue()).unwrap();
        assert_ne!(a, c);
    }
}
