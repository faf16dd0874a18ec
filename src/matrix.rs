//! 8x8 LED patterns and the rotation applied for modules mounted turned.

/// Orientation of the 8x8 cell of every module relative to the logical column order.
///
/// Most 4-in-1 assemblies have their cells turned by 90°.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Orientation {
    #[default]
    None,
    Clockwise,
    CounterClockwise,
    Rotate180,
}

/// An 8x8 LED pattern, indexed as `[column][row]`.
///
/// Column `x` is sent to digit register `x`, row `y` is bit `y` of that column.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Matrix8x8 {
    cells: [[bool; 8]; 8],
}

impl Matrix8x8 {
    /// All LEDs off.
    pub const fn empty() -> Self {
        Self {
            cells: [[false; 8]; 8],
        }
    }

    /// All LEDs on.
    pub const fn full() -> Self {
        Self {
            cells: [[true; 8]; 8],
        }
    }

    pub const fn from_cells(cells: [[bool; 8]; 8]) -> Self {
        Self { cells }
    }

    /// Decodes column bytes, `matrix[col][row] = (columns[col] >> row) & 1`.
    pub fn from_columns(columns: &[u8; 8]) -> Self {
        let mut matrix = Self::empty();
        for (cells, column) in matrix.cells.iter_mut().zip(columns) {
            for (row, cell) in cells.iter_mut().enumerate() {
                *cell = column & (1 << row) != 0;
            }
        }
        matrix
    }

    /// Packs every column into a byte, bit `row` set for every lit row.
    pub fn to_columns(&self) -> [u8; 8] {
        let mut columns = [0; 8];
        for (column, cells) in columns.iter_mut().zip(&self.cells) {
            *column = cells
                .iter()
                .enumerate()
                .filter(|(_, on)| **on)
                .fold(0, |acc, (row, _)| acc | 1 << row);
        }
        columns
    }

    pub fn cells(&self) -> &[[bool; 8]; 8] {
        &self.cells
    }

    /// State of the LED in column `x`, row `y`. Out of range coordinates read as off.
    pub fn get(&self, x: usize, y: usize) -> bool {
        self.cells
            .get(x)
            .and_then(|column| column.get(y))
            .copied()
            .unwrap_or(false)
    }

    /// Out of range coordinates are ignored.
    pub fn set(&mut self, x: usize, y: usize, on: bool) {
        if let Some(cell) = self.cells.get_mut(x).and_then(|column| column.get_mut(y)) {
            *cell = on;
        }
    }

    /// Out of range coordinates are ignored.
    pub fn toggle(&mut self, x: usize, y: usize) {
        if let Some(cell) = self.cells.get_mut(x).and_then(|column| column.get_mut(y)) {
            *cell = !*cell;
        }
    }

    /// Returns this pattern rotated for modules mounted in `orientation`.
    pub fn rotated(mut self, orientation: Orientation) -> Self {
        rotate(&mut self.cells, orientation);
        self
    }
}

/// Rotates `m` in place, one concentric ring at a time, swapping four cells per step.
pub(crate) fn rotate(m: &mut [[bool; 8]; 8], orientation: Orientation) {
    if orientation == Orientation::None {
        return;
    }

    for i in 0..4 {
        for j in i..7 - i {
            let tmp = m[i][j];
            match orientation {
                Orientation::Clockwise => {
                    m[i][j] = m[j][7 - i];
                    m[j][7 - i] = m[7 - i][7 - j];
                    m[7 - i][7 - j] = m[7 - j][i];
                    m[7 - j][i] = tmp;
                }
                Orientation::CounterClockwise => {
                    m[i][j] = m[7 - j][i];
                    m[7 - j][i] = m[7 - i][7 - j];
                    m[7 - i][7 - j] = m[j][7 - i];
                    m[j][7 - i] = tmp;
                }
                Orientation::Rotate180 => {
                    m[i][j] = m[7 - i][7 - j];
                    m[7 - i][7 - j] = tmp;
                    let tmp = m[7 - j][i];
                    m[7 - j][i] = m[j][7 - i];
                    m[j][7 - i] = tmp;
                }
                Orientation::None => {}
            }
        }
    }
}

/// Applies `orientation` to a band of column bytes.
pub(crate) fn transform_columns(columns: &[u8; 8], orientation: Orientation) -> [u8; 8] {
    match orientation {
        Orientation::None => *columns,
        _ => Matrix8x8::from_columns(columns)
            .rotated(orientation)
            .to_columns(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn asymmetric() -> Matrix8x8 {
        // an "L" in the first column and bottom row, plus one stray dot
        let mut matrix = Matrix8x8::empty();
        for y in 0..8 {
            matrix.set(0, y, true);
        }
        for x in 0..8 {
            matrix.set(x, 7, true);
        }
        matrix.set(5, 2, true);
        matrix
    }

    #[test]
    fn test_quarter_turns_round_trip() {
        let original = asymmetric();

        for orientation in [Orientation::Clockwise, Orientation::CounterClockwise] {
            let once = original.rotated(orientation);
            assert_ne!(once, original);

            let four = once.rotated(orientation).rotated(orientation).rotated(orientation);
            assert_eq!(four, original, "{orientation:?}");
        }
    }

    #[test]
    fn test_half_turn_round_trip() {
        let original = asymmetric();
        let once = original.rotated(Orientation::Rotate180);

        assert_ne!(once, original);
        assert_eq!(once.rotated(Orientation::Rotate180), original);
    }

    #[test]
    fn test_none_is_identity() {
        assert_eq!(asymmetric().rotated(Orientation::None), asymmetric());
    }

    #[test]
    fn test_clockwise_and_counter_clockwise_cancel() {
        let original = asymmetric();
        assert_eq!(
            original
                .rotated(Orientation::Clockwise)
                .rotated(Orientation::CounterClockwise),
            original
        );
        assert_eq!(
            original
                .rotated(Orientation::Clockwise)
                .rotated(Orientation::Clockwise),
            original.rotated(Orientation::Rotate180)
        );
    }

    #[test]
    fn test_single_cell_moves() {
        let mut matrix = Matrix8x8::empty();
        matrix.set(0, 0, true);

        // m[i][j] = m[j][7 - i]: the cell at [0][0] comes from [0][7] and goes to [7][0]
        assert!(matrix.rotated(Orientation::Clockwise).get(7, 0));
        assert!(matrix.rotated(Orientation::CounterClockwise).get(0, 7));
        assert!(matrix.rotated(Orientation::Rotate180).get(7, 7));
    }

    #[test]
    fn test_columns_conversion() {
        let columns = [0x00, 0x01, 0x80, 0xff, 0x55, 0xaa, 0x3c, 0x7e];
        let matrix = Matrix8x8::from_columns(&columns);

        assert!(matrix.get(1, 0));
        assert!(!matrix.get(1, 1));
        assert!(matrix.get(2, 7));
        assert!(matrix.get(4, 6));
        assert!(!matrix.get(4, 7));
        assert_eq!(matrix.to_columns(), columns);
    }

    #[test]
    fn test_full_and_empty() {
        assert_eq!(Matrix8x8::full().to_columns(), [0xff; 8]);
        assert_eq!(Matrix8x8::empty().to_columns(), [0x00; 8]);
    }

    #[test]
    fn test_set_get_toggle() {
        let mut matrix = Matrix8x8::empty();
        matrix.toggle(3, 4);
        assert!(matrix.get(3, 4));
        matrix.toggle(3, 4);
        assert!(!matrix.get(3, 4));

        matrix.set(8, 0, true);
        matrix.toggle(0, 9);
        assert!(!matrix.get(8, 0));
        assert_eq!(matrix, Matrix8x8::empty());
    }

    #[test]
    fn test_transform_columns() {
        let columns = [0x01, 0, 0, 0, 0, 0, 0, 0];

        assert_eq!(transform_columns(&columns, Orientation::None), columns);
        assert_eq!(
            transform_columns(&columns, Orientation::Rotate180),
            [0, 0, 0, 0, 0, 0, 0, 0x80]
        );
    }
}
