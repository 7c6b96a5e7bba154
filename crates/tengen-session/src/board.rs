//! The board: a fixed-size grid of optional stones.

use tengen_protocol::Color;

/// Errors a move can fail with at the board level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum MoveError {
    /// The coordinates fall outside the grid.
    #[error("({x}, {y}) is outside the board")]
    OutOfBounds { x: i32, y: i32 },

    /// The cell already holds a stone.
    #[error("({x}, {y}) is already occupied")]
    CellOccupied { x: i32, y: i32 },
}

/// A square grid of cells, each empty or holding one stone.
///
/// Once placed, a stone never leaves the board — this engine enforces
/// "one stone per empty cell, alternating turns" and nothing more, so
/// there is no capture or removal path.
///
/// Coordinates are `i32` because they arrive straight from the wire;
/// negative values must surface as [`MoveError::OutOfBounds`] rather
/// than dying in deserialization.
#[derive(Debug, Clone)]
pub struct Board {
    size: usize,
    cells: Vec<Option<Color>>,
}

impl Board {
    /// Creates an empty `size` × `size` board.
    pub fn new(size: usize) -> Self {
        Self {
            size,
            cells: vec![None; size * size],
        }
    }

    /// The board's edge length.
    pub fn size(&self) -> usize {
        self.size
    }

    /// Places a stone. On failure the board is untouched.
    pub fn place_stone(&mut self, x: i32, y: i32, color: Color) -> Result<(), MoveError> {
        let (col, row) = match (usize::try_from(x), usize::try_from(y)) {
            (Ok(col), Ok(row)) if col < self.size && row < self.size => (col, row),
            _ => return Err(MoveError::OutOfBounds { x, y }),
        };
        let cell = &mut self.cells[row * self.size + col];
        if cell.is_some() {
            return Err(MoveError::CellOccupied { x, y });
        }
        *cell = Some(color);
        Ok(())
    }

    /// The stone at the given coordinates, if any. `None` for empty
    /// cells and for coordinates off the board.
    pub fn stone_at(&self, x: i32, y: i32) -> Option<Color> {
        let (col, row) = (usize::try_from(x).ok()?, usize::try_from(y).ok()?);
        if col < self.size && row < self.size {
            self.cells[row * self.size + col]
        } else {
            None
        }
    }
}

// =========================================================================
// Tests
// =========================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn board() -> Board {
        Board::new(19)
    }

    #[test]
    fn test_place_stone_on_empty_cell_succeeds() {
        let mut b = board();
        b.place_stone(3, 3, Color::Black).unwrap();
        assert_eq!(b.stone_at(3, 3), Some(Color::Black));
    }

    #[test]
    fn test_place_stone_occupied_cell_fails() {
        let mut b = board();
        b.place_stone(0, 0, Color::Black).unwrap();

        let result = b.place_stone(0, 0, Color::White);

        assert_eq!(result, Err(MoveError::CellOccupied { x: 0, y: 0 }));
        // The original stone survives.
        assert_eq!(b.stone_at(0, 0), Some(Color::Black));
    }

    #[test]
    fn test_place_stone_out_of_bounds_fails_without_mutation() {
        let mut b = board();
        for (x, y) in [(19, 0), (0, 19), (-1, 0), (0, -1), (100, 100)] {
            let result = b.place_stone(x, y, Color::Black);
            assert_eq!(result, Err(MoveError::OutOfBounds { x, y }), "({x}, {y})");
        }
        // Nothing was written anywhere.
        for y in 0..19 {
            for x in 0..19 {
                assert_eq!(b.stone_at(x, y), None);
            }
        }
    }

    #[test]
    fn test_edge_cells_are_in_bounds() {
        let mut b = board();
        b.place_stone(0, 0, Color::Black).unwrap();
        b.place_stone(18, 18, Color::White).unwrap();
        b.place_stone(18, 0, Color::Black).unwrap();
        b.place_stone(0, 18, Color::White).unwrap();
    }

    #[test]
    fn test_stone_at_off_board_is_none() {
        let b = board();
        assert_eq!(b.stone_at(-1, 4), None);
        assert_eq!(b.stone_at(19, 19), None);
    }

    #[test]
    fn test_custom_board_size() {
        let mut b = Board::new(9);
        assert_eq!(b.size(), 9);
        b.place_stone(8, 8, Color::Black).unwrap();
        assert_eq!(
            b.place_stone(9, 0, Color::White),
            Err(MoveError::OutOfBounds { x: 9, y: 0 })
        );
    }
}
