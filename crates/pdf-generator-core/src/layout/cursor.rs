use serde::Serialize;
use std::num::NonZeroUsize;

/// A (row, column) slot in the preview grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct GridPosition {
    pub row: usize,
    pub column: usize,
}

impl GridPosition {
    pub const fn new(row: usize, column: usize) -> Self {
        Self { row, column }
    }

    /// Position of the `index`-th placement (0-based) in a grid of the given width.
    pub const fn from_index(index: usize, columns: NonZeroUsize) -> Self {
        Self {
            row: index / columns.get(),
            column: index % columns.get(),
        }
    }

    /// Row-major linear index in a grid of the given width.
    pub const fn linear_index(&self, columns: NonZeroUsize) -> usize {
        self.row * columns.get() + self.column
    }
}

impl std::fmt::Display for GridPosition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.row, self.column)
    }
}

/// Row-major position generator.
///
/// Every call to [`next_position`](Self::next_position) hands out the next
/// free slot and advances; the column wraps to 0 and the row increments
/// once `max_columns` is reached. The sequence is infinite and only
/// restarts with a new cursor.
#[derive(Debug, Clone)]
pub struct LayoutCursor {
    max_columns: NonZeroUsize,
    row: usize,
    column: usize,
    placed: usize,
}

impl LayoutCursor {
    pub const fn new(max_columns: NonZeroUsize) -> Self {
        Self {
            max_columns,
            row: 0,
            column: 0,
            placed: 0,
        }
    }

    pub fn next_position(&mut self) -> GridPosition {
        let position = GridPosition::new(self.row, self.column);

        self.column += 1;
        if self.column == self.max_columns.get() {
            self.column = 0;
            self.row += 1;
        }
        self.placed += 1;

        position
    }

    /// The slot the next call will return, without advancing.
    pub const fn peek(&self) -> GridPosition {
        GridPosition::new(self.row, self.column)
    }

    /// Number of positions handed out so far.
    pub const fn placed(&self) -> usize {
        self.placed
    }

    pub const fn max_columns(&self) -> NonZeroUsize {
        self.max_columns
    }
}

impl Iterator for LayoutCursor {
    type Item = GridPosition;

    fn next(&mut self) -> Option<GridPosition> {
        Some(self.next_position())
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (usize::MAX, None)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn four() -> NonZeroUsize {
        NonZeroUsize::new(4).unwrap()
    }

    #[test]
    fn test_first_positions_wrap_after_four() {
        let positions: Vec<_> = LayoutCursor::new(four()).take(6).collect();
        assert_eq!(
            positions,
            vec![
                GridPosition::new(0, 0),
                GridPosition::new(0, 1),
                GridPosition::new(0, 2),
                GridPosition::new(0, 3),
                GridPosition::new(1, 0),
                GridPosition::new(1, 1),
            ]
        );
    }

    #[test]
    fn test_matches_div_mod_formula() {
        let mut cursor = LayoutCursor::new(four());
        for i in 0..103 {
            let position = cursor.next_position();
            assert_eq!(position, GridPosition::new(i / 4, i % 4));
            assert_eq!(position, GridPosition::from_index(i, four()));
            assert_eq!(position.linear_index(four()), i);
        }
        assert_eq!(cursor.placed(), 103);
    }

    #[test]
    fn test_single_column() {
        let mut cursor = LayoutCursor::new(NonZeroUsize::MIN);
        assert_eq!(cursor.next_position(), GridPosition::new(0, 0));
        assert_eq!(cursor.next_position(), GridPosition::new(1, 0));
        assert_eq!(cursor.next_position(), GridPosition::new(2, 0));
    }

    #[test]
    fn test_peek_does_not_advance() {
        let mut cursor = LayoutCursor::new(four());
        cursor.next_position();
        assert_eq!(cursor.peek(), GridPosition::new(0, 1));
        assert_eq!(cursor.peek(), GridPosition::new(0, 1));
        assert_eq!(cursor.next_position(), GridPosition::new(0, 1));
    }

    #[test]
    fn test_independent_cursors() {
        let mut a = LayoutCursor::new(four());
        let mut b = LayoutCursor::new(four());
        a.next_position();
        a.next_position();
        assert_eq!(b.next_position(), GridPosition::new(0, 0));
        assert_eq!(a.next_position(), GridPosition::new(0, 2));
    }
}
