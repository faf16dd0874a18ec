//! Glyph font used for text rendering.
//!
//! A glyph is a run of column bytes, bit `n` lighting row `n`. Most glyphs end
//! with an empty column which acts as the gap to the following character.

/// Maximum number of glyphs that can be added at runtime.
pub const MAX_CUSTOM_GLYPHS: usize = 32;

/// Maximum number of columns of a glyph added at runtime.
pub const MAX_GLYPH_COLUMNS: usize = 16;

/// Column bytes of a custom glyph.
pub type Glyph = heapless::Vec<u8, MAX_GLYPH_COLUMNS>;

#[rustfmt::skip]
static BUILTIN: [(char, &[u8]); 95] = [
    (' ', &[0b00000000, 0b00000000, 0b00000000, 0b00000000]),
    ('!', &[0b01011111, 0b00000000]),
    ('"', &[0b00000011, 0b00000000, 0b00000011, 0b00000000]),
    ('#', &[0b00010100, 0b00111110, 0b00010100, 0b00111110, 0b00010100, 0b00000000]),
    ('$', &[0b00100100, 0b01101010, 0b00101011, 0b00010010, 0b00000000]),
    ('%', &[0b01100011, 0b00010011, 0b00001000, 0b01100100, 0b01100011, 0b00000000]),
    ('&', &[0b00110110, 0b01001001, 0b01010110, 0b00100000, 0b01010000, 0b00000000]),
    ('\'', &[0b00000011, 0b00000000]),
    ('(', &[0b00011100, 0b00100010, 0b01000001, 0b00000000]),
    (')', &[0b01000001, 0b00100010, 0b00011100, 0b00000000]),
    ('*', &[0b00101000, 0b00011000, 0b00001110, 0b00011000, 0b00101000, 0b00000000]),
    ('+', &[0b00001000, 0b00001000, 0b00111110, 0b00001000, 0b00001000, 0b00000000]),
    (',', &[0b10110000, 0b01110000, 0b00000000]),
    ('-', &[0b00001000, 0b00001000, 0b00001000]),
    ('.', &[0b01100000, 0b01100000, 0b00000000]),
    ('/', &[0b01100000, 0b00011000, 0b00000110, 0b00000001, 0b00000000]),
    ('0', &[0b00111110, 0b01000001, 0b01000001, 0b00111110, 0b00000000]),
    ('1', &[0b01000010, 0b01111111, 0b01000000, 0b00000000]),
    ('2', &[0b01100010, 0b01010001, 0b01001001, 0b01000110, 0b00000000]),
    ('3', &[0b00100010, 0b01000001, 0b01001001, 0b00110110, 0b00000000]),
    ('4', &[0b00011000, 0b00010100, 0b00010010, 0b01111111, 0b00000000]),
    ('5', &[0b00100111, 0b01000101, 0b01000101, 0b00111001, 0b00000000]),
    ('6', &[0b00111110, 0b01001001, 0b01001001, 0b00110000, 0b00000000]),
    ('7', &[0b01100001, 0b00010001, 0b00001001, 0b00000111, 0b00000000]),
    ('8', &[0b00110110, 0b01001001, 0b01001001, 0b00110110, 0b00000000]),
    ('9', &[0b00000110, 0b01001001, 0b01001001, 0b00111110, 0b00000000]),
    (':', &[0b00010100, 0b00000000]),
    (';', &[0b00100000, 0b00010100, 0b00000000]),
    ('<', &[0b00001000, 0b00010100, 0b00100010, 0b00000000]),
    ('=', &[0b00010100, 0b00010100, 0b00010100, 0b00000000]),
    ('>', &[0b00100010, 0b00010100, 0b00001000, 0b00000000]),
    ('?', &[0b00000010, 0b01011001, 0b00001001, 0b00000110, 0b00000000]),
    ('@', &[0b00111110, 0b01001001, 0b01010101, 0b01011101, 0b00001110, 0b00000000]),
    ('A', &[0b01111110, 0b00010001, 0b00010001, 0b01111110, 0b00000000]),
    ('B', &[0b01111111, 0b01001001, 0b01001001, 0b00110110, 0b00000000]),
    ('C', &[0b00111110, 0b01000001, 0b01000001, 0b00100010, 0b00000000]),
    ('D', &[0b01111111, 0b01000001, 0b01000001, 0b00111110, 0b00000000]),
    ('E', &[0b01111111, 0b01001001, 0b01001001, 0b01000001, 0b00000000]),
    ('F', &[0b01111111, 0b00001001, 0b00001001, 0b00000001, 0b00000000]),
    ('G', &[0b00111110, 0b01000001, 0b01001001, 0b01111010, 0b00000000]),
    ('H', &[0b01111111, 0b00001000, 0b00001000, 0b01111111, 0b00000000]),
    ('I', &[0b01000001, 0b01111111, 0b01000001, 0b00000000]),
    ('J', &[0b00110000, 0b01000000, 0b01000001, 0b00111111, 0b00000000]),
    ('K', &[0b01111111, 0b00001000, 0b00010100, 0b01100011, 0b00000000]),
    ('L', &[0b01111111, 0b01000000, 0b01000000, 0b01000000, 0b00000000]),
    ('M', &[0b01111111, 0b00000010, 0b00001100, 0b00000010, 0b01111111, 0b00000000]),
    ('N', &[0b01111111, 0b00000100, 0b00001000, 0b00010000, 0b01111111, 0b00000000]),
    ('O', &[0b00111110, 0b01000001, 0b01000001, 0b00111110, 0b00000000]),
    ('P', &[0b01111111, 0b00001001, 0b00001001, 0b00000110, 0b00000000]),
    ('Q', &[0b00111110, 0b01000001, 0b01000001, 0b10111110, 0b00000000]),
    ('R', &[0b01111111, 0b00001001, 0b00001001, 0b01110110, 0b00000000]),
    ('S', &[0b01000110, 0b01001001, 0b01001001, 0b00110010, 0b00000000]),
    ('T', &[0b00000001, 0b00000001, 0b01111111, 0b00000001, 0b00000001, 0b00000000]),
    ('U', &[0b00111111, 0b01000000, 0b01000000, 0b00111111, 0b00000000]),
    ('V', &[0b00001111, 0b00110000, 0b01000000, 0b00110000, 0b00001111, 0b00000000]),
    ('W', &[0b00111111, 0b01000000, 0b00111000, 0b01000000, 0b00111111, 0b00000000]),
    ('X', &[0b01100011, 0b00010100, 0b00001000, 0b00010100, 0b01100011, 0b00000000]),
    ('Y', &[0b00000111, 0b00001000, 0b01110000, 0b00001000, 0b00000111, 0b00000000]),
    ('Z', &[0b01100001, 0b01010001, 0b01001001, 0b01000111, 0b00000000]),
    ('[', &[0b01111111, 0b01000001, 0b00000000]),
    ('\\', &[0b00000001, 0b00000110, 0b00011000, 0b01100000, 0b00000000]),
    (']', &[0b01000001, 0b01111111, 0b00000000]),
    ('_', &[0b01000000, 0b01000000, 0b01000000, 0b01000000, 0b00000000]),
    ('`', &[0b00000001, 0b00000010, 0b00000000]),
    ('a', &[0b00100000, 0b01010100, 0b01010100, 0b01111000, 0b00000000]),
    ('b', &[0b01111111, 0b01000100, 0b01000100, 0b00111000, 0b00000000]),
    ('c', &[0b00111000, 0b01000100, 0b01000100, 0b00101000, 0b00000000]),
    ('d', &[0b00111000, 0b01000100, 0b01000100, 0b01111111, 0b00000000]),
    ('e', &[0b00111000, 0b01010100, 0b01010100, 0b00011000, 0b00000000]),
    ('f', &[0b00000100, 0b01111110, 0b00000101, 0b00000000]),
    ('g', &[0b10011000, 0b10100100, 0b10100100, 0b01111000, 0b00000000]),
    ('h', &[0b01111111, 0b00000100, 0b00000100, 0b01111000, 0b00000000]),
    ('i', &[0b01000100, 0b01111101, 0b01000000, 0b00000000]),
    ('j', &[0b01000000, 0b10000000, 0b10000100, 0b01111101, 0b00000000]),
    ('k', &[0b01111111, 0b00010000, 0b00101000, 0b01000100, 0b00000000]),
    ('l', &[0b01000001, 0b01111111, 0b01000000, 0b00000000]),
    ('m', &[0b01111100, 0b00000100, 0b01111100, 0b00000100, 0b01111000, 0b00000000]),
    ('n', &[0b01111100, 0b00000100, 0b00000100, 0b01111000, 0b00000000]),
    ('o', &[0b00111000, 0b01000100, 0b01000100, 0b00111000, 0b00000000]),
    ('p', &[0b11111100, 0b00100100, 0b00100100, 0b00011000, 0b00000000]),
    ('q', &[0b00011000, 0b00100100, 0b00100100, 0b11111100, 0b00000000]),
    ('r', &[0b01111100, 0b00001000, 0b00000100, 0b00000100, 0b00000000]),
    ('s', &[0b01001000, 0b01010100, 0b01010100, 0b00100100, 0b00000000]),
    ('t', &[0b00000100, 0b00111111, 0b01000100, 0b00000000]),
    ('u', &[0b00111100, 0b01000000, 0b01000000, 0b01111100, 0b00000000]),
    ('v', &[0b00011100, 0b00100000, 0b01000000, 0b00100000, 0b00011100, 0b00000000]),
    ('w', &[0b00111100, 0b01000000, 0b00111100, 0b01000000, 0b00111100, 0b00000000]),
    ('x', &[0b01000100, 0b00101000, 0b00010000, 0b00101000, 0b01000100, 0b00000000]),
    ('y', &[0b10011100, 0b10100000, 0b10100000, 0b01111100, 0b00000000]),
    ('z', &[0b01100100, 0b01010100, 0b01001100, 0b00000000]),
    ('{', &[0b00001000, 0b00110110, 0b01000001, 0b00000000]),
    ('|', &[0b01111111, 0b00000000]),
    ('}', &[0b01000001, 0b00110110, 0b00001000, 0b00000000]),
    ('~', &[0b00001000, 0b00000100, 0b00001000, 0b00000100, 0b00000000]),
    ('^', &[0b00000010, 0b00000001, 0b00000010, 0b00000000]),
];

/// Font table, built-in glyphs followed by glyphs added with [`Font::add_custom_glyph`].
///
/// Lookups scan the table in order and the first matching character wins, so a
/// custom glyph can not shadow a built-in one.
#[derive(Debug, Clone, Default)]
pub struct Font {
    custom: heapless::Vec<(char, Glyph), MAX_CUSTOM_GLYPHS>,
}

impl Font {
    pub const fn new() -> Self {
        Self {
            custom: heapless::Vec::new(),
        }
    }

    /// Total number of glyphs, built-in and custom.
    pub fn len(&self) -> usize {
        BUILTIN.len() + self.custom.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Glyph at table position `index`.
    pub fn glyph(&self, index: usize) -> Option<&[u8]> {
        match BUILTIN.get(index) {
            Some((_, columns)) => Some(*columns),
            None => self
                .custom
                .get(index - BUILTIN.len())
                .map(|(_, columns)| columns.as_slice()),
        }
    }

    /// Table position of the first glyph for `chr`.
    pub fn position(&self, chr: char) -> Option<usize> {
        BUILTIN
            .iter()
            .map(|(c, _)| *c)
            .chain(self.custom.iter().map(|(c, _)| *c))
            .position(|c| c == chr)
    }

    /// First glyph for `chr`, if the font has one.
    pub fn lookup(&self, chr: char) -> Option<&[u8]> {
        self.position(chr).and_then(|index| self.glyph(index))
    }

    /// Glyphs of every character of `text` the font can render, unknown characters are skipped.
    pub fn glyphs<'a>(&'a self, text: &'a str) -> impl Iterator<Item = &'a [u8]> + 'a {
        text.chars().filter_map(move |chr| self.lookup(chr))
    }

    /// Appends a glyph for `chr`, which has to be exactly one character.
    ///
    /// Returns `false` and leaves the table untouched if `chr` is not a single
    /// character, `columns` is longer than [`MAX_GLYPH_COLUMNS`] or the table is full.
    pub fn add_custom_glyph(&mut self, chr: &str, columns: &[u8]) -> bool {
        let mut chars = chr.chars();
        let (Some(chr), None) = (chars.next(), chars.next()) else {
            return false;
        };

        let Ok(glyph) = Glyph::from_slice(columns) else {
            return false;
        };

        self.custom.push((chr, glyph)).is_ok()
    }
}

/// Decodes a byte-array literal like `B00100000,B01000000,...` into column bytes.
///
/// Every token is ten characters: a marker, eight binary digits (most significant
/// first) and a separator. Anything other than `1` in a digit position counts as
/// `0`. A token cut short by the end of the text is read from the digits it has.
pub fn parse_byte_array_literal(text: &str) -> impl Iterator<Item = u8> + '_ {
    let mut chars = text.chars();

    core::iter::from_fn(move || {
        // marker, usually 'B'
        chars.next()?;

        let mut column = 0u8;
        for _ in 0..8 {
            match chars.next() {
                Some(digit) => column = column << 1 | u8::from(digit == '1'),
                None => return Some(column),
            }
        }

        // separator
        chars.next();

        Some(column)
    })
}
