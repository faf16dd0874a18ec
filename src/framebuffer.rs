//! Column buffer the text compositor draws into.
//!
//! The buffer holds one column byte per LED column of the chain plus an
//! off-screen band of eight columns at each end:
//!
//! ```text
//! | left staging | module band 0 | ... | module band n-1 | right staging |
//! 0              8                                       len-8           len
//! ```
//!
//! Text is scrolled in by printing into the right staging band and shifting
//! everything left one column per step.

use crate::configuration::MAX_CHAIN_LENGTH;

/// Columns per module, and width of each staging band.
pub const BAND_WIDTH: usize = 8;

/// Capacity of the buffer for the longest supported chain.
pub const MAX_BUFFER_COLUMNS: usize = (MAX_CHAIN_LENGTH + 2) * BAND_WIDTH;

#[derive(Debug, Clone)]
pub struct FrameBuffer {
    columns: heapless::Vec<u8, MAX_BUFFER_COLUMNS>,
}

impl FrameBuffer {
    /// An all-off buffer for `module_count` modules, `None` if the chain is too long.
    pub(crate) fn new(module_count: usize) -> Option<Self> {
        let mut columns = heapless::Vec::new();
        columns
            .resize((module_count + 2) * BAND_WIDTH, 0)
            .ok()?;

        Some(Self { columns })
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// All columns including both staging bands.
    pub fn columns(&self) -> &[u8] {
        &self.columns
    }

    /// Columns currently mapped to the modules.
    pub fn visible(&self) -> &[u8] {
        &self.columns[BAND_WIDTH..self.len() - BAND_WIDTH]
    }

    /// Number of module bands in the visible window.
    pub fn band_count(&self) -> usize {
        self.len() / BAND_WIDTH - 2
    }

    /// Columns of visible band `band`, band 0 being the leftmost.
    ///
    /// `None` if `band` is not below [`Self::band_count`].
    pub fn band(&self, band: usize) -> Option<[u8; 8]> {
        if band >= self.band_count() {
            return None;
        }

        let mut columns = [0; 8];
        let start = BAND_WIDTH * (band + 1);
        columns.copy_from_slice(&self.columns[start..start + BAND_WIDTH]);
        Some(columns)
    }

    pub fn clear(&mut self) {
        self.columns.iter_mut().for_each(|column| *column = 0);
    }

    /// Buffer index for a print `offset` relative to the first visible column.
    ///
    /// Offsets are clamped to `-8..=len-9`, so printing can start anywhere in the
    /// left staging band but never past the last column.
    pub fn print_position(&self, offset: i32) -> usize {
        let last = self.len() as i32 - 9;
        (offset.clamp(-(BAND_WIDTH as i32), last) + BAND_WIDTH as i32) as usize
    }

    /// Writes `columns` starting at `position`, dropping anything past the end of the buffer.
    fn write_at(&mut self, position: usize, columns: &[u8]) -> usize {
        self.columns
            .iter_mut()
            .skip(position)
            .zip(columns)
            .for_each(|(dest, src)| *dest = *src);

        position + columns.len()
    }

    /// Prints glyphs side by side starting at `offset`.
    ///
    /// Once a glyph would start beyond the visible window the rest of the text is
    /// dropped. A glyph starting inside the window is written completely, its tail
    /// may end up in the right staging band.
    pub fn print_glyphs<'a>(&mut self, glyphs: impl IntoIterator<Item = &'a [u8]>, offset: i32) {
        let end = self.len() - BAND_WIDTH;
        let mut position = self.print_position(offset);

        for glyph in glyphs {
            if position >= end {
                break;
            }
            position = self.write_at(position, glyph);
        }
    }

    /// Prints raw column bytes starting at `offset`.
    pub fn print_columns(&mut self, columns: &[u8], offset: i32) {
        let position = self.print_position(offset);
        self.write_at(position, columns);
    }

    /// Prints `glyph` at the start of the right staging band, just outside the visible window.
    ///
    /// Only the first [`BAND_WIDTH`] columns fit, wider glyphs have to be fed
    /// in with [`Self::shift_in`].
    pub fn stage(&mut self, glyph: &[u8]) {
        let position = self.len() - BAND_WIDTH;
        self.write_at(position, glyph);
    }

    /// Moves every column one to the left, the first column is dropped and
    /// `column` becomes the last one.
    pub fn shift_in(&mut self, column: u8) {
        self.columns.rotate_left(1);
        if let Some(last) = self.columns.last_mut() {
            *last = column;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_is_blank() {
        for module_count in 1..=MAX_CHAIN_LENGTH {
            let buffer = FrameBuffer::new(module_count).unwrap();

            assert_eq!(buffer.len(), (module_count + 2) * 8);
            assert_eq!(buffer.band_count(), module_count);
            assert!(buffer.columns().iter().all(|column| *column == 0));
        }
    }

    #[test]
    fn test_chain_too_long() {
        assert!(FrameBuffer::new(MAX_CHAIN_LENGTH + 1).is_none());
    }

    #[test]
    fn test_print_position_clamps() {
        let buffer = FrameBuffer::new(2).unwrap();

        assert_eq!(buffer.print_position(0), 8);
        assert_eq!(buffer.print_position(-8), 0);
        assert_eq!(buffer.print_position(-100), 0);
        assert_eq!(buffer.print_position(23), 31);
        assert_eq!(buffer.print_position(1000), 31);
    }

    #[test]
    fn test_print_glyphs_stops_past_visible_window() {
        let mut buffer = FrameBuffer::new(1).unwrap();
        let glyphs: [&[u8]; 3] = [&[1, 2, 3, 4, 5], &[6, 7, 8, 9, 10], &[11, 12]];

        buffer.print_glyphs(glyphs, 0);

        // the second glyph starts inside the window and spills into staging,
        // the third would start in staging and is dropped
        assert_eq!(buffer.visible(), &[1, 2, 3, 4, 5, 6, 7, 8]);
        assert_eq!(&buffer.columns()[16..], &[9, 10, 0, 0, 0, 0, 0, 0]);
    }

    #[test]
    fn test_print_glyphs_clips_at_buffer_end() {
        let mut buffer = FrameBuffer::new(1).unwrap();
        let glyphs: [&[u8]; 1] = [&[0xff; 12]];

        buffer.print_glyphs(glyphs, 7);

        assert_eq!(buffer.len(), 24);
        assert_eq!(buffer.columns()[15..], [0xff; 9]);
        assert_eq!(buffer.columns()[..15], [0; 15]);
    }

    #[test]
    fn test_print_columns_negative_offset() {
        let mut buffer = FrameBuffer::new(1).unwrap();

        buffer.print_columns(&[1, 2, 3, 4, 5, 6, 7, 8, 9, 10], -4);

        assert_eq!(buffer.band(0), Some([5, 6, 7, 8, 9, 10, 0, 0]));
        assert_eq!(&buffer.columns()[..8], &[0, 0, 0, 0, 1, 2, 3, 4]);
    }

    #[test]
    fn test_stage_and_shift() {
        let mut buffer = FrameBuffer::new(1).unwrap();

        buffer.stage(&[0xaa, 0x55]);
        assert_eq!(buffer.visible(), &[0; 8]);

        buffer.shift_in(0);
        assert_eq!(buffer.band(0), Some([0, 0, 0, 0, 0, 0, 0, 0xaa]));
        assert_eq!(buffer.columns()[23], 0);

        for _ in 0..8 {
            buffer.shift_in(0);
        }
        assert_eq!(buffer.visible(), &[0x55, 0, 0, 0, 0, 0, 0, 0]);
        assert_eq!(buffer.columns()[7], 0xaa);
    }

    #[test]
    fn test_shift_in() {
        let mut buffer = FrameBuffer::new(1).unwrap();

        buffer.stage(&[1, 2, 3, 4, 5, 6, 7, 8, 9, 10]);
        assert_eq!(&buffer.columns()[16..], &[1, 2, 3, 4, 5, 6, 7, 8]);

        buffer.shift_in(9);
        buffer.shift_in(10);
        assert_eq!(&buffer.columns()[14..], &[1, 2, 3, 4, 5, 6, 7, 8, 9, 10]);
    }

    #[test]
    fn test_band_out_of_range() {
        let buffer = FrameBuffer::new(2).unwrap();

        assert_eq!(buffer.band(1), Some([0; 8]));
        assert_eq!(buffer.band(2), None);
        assert_eq!(buffer.band(usize::MAX - 1), None);
    }

    #[test]
    fn test_clear() {
        let mut buffer = FrameBuffer::new(2).unwrap();
        buffer.print_columns(&[0xff; 20], -8);
        buffer.clear();

        assert!(buffer.columns().iter().all(|column| *column == 0));
    }
}
