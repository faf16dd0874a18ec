use core::str::Chars;

use crate::{
    font::Font,
    framebuffer::{FrameBuffer, BAND_WIDTH},
};

/// Progress of a text scrolling across the chain.
///
/// Obtained from [`crate::Max7219Chain::begin_scroll`] and driven one column at
/// a time with [`crate::Max7219Chain::advance_scroll`].
#[derive(Debug, Clone)]
pub struct ScrollState<'a> {
    chars: Chars<'a>,
    // steps until the next glyph is staged, decremented before it is checked
    countdown: isize,
    // font position and next column of a glyph wider than the staging band
    tail: Option<(usize, usize)>,
    remaining_steps: usize,
}

impl<'a> ScrollState<'a> {
    /// The scroll lasts one step per glyph column plus one per visible column,
    /// so the last glyph has left the window when it finishes.
    pub(crate) fn new(text: &'a str, font: &Font, module_count: usize) -> Self {
        let glyph_columns: usize = font.glyphs(text).map(<[u8]>::len).sum();

        Self {
            chars: text.chars(),
            countdown: 1,
            tail: None,
            remaining_steps: glyph_columns + module_count * BAND_WIDTH,
        }
    }

    pub fn remaining_steps(&self) -> usize {
        self.remaining_steps
    }

    pub fn is_finished(&self) -> bool {
        self.remaining_steps == 0
    }

    /// Stages the next glyph when its turn has come and shifts the buffer by one column.
    ///
    /// Returns `false` without touching the buffer once the scroll is finished.
    pub(crate) fn step(&mut self, font: &Font, buffer: &mut FrameBuffer) -> bool {
        if self.remaining_steps == 0 {
            return false;
        }
        self.remaining_steps -= 1;

        self.countdown -= 1;
        if self.countdown == 0 {
            let next = self.chars.by_ref().find_map(|chr| {
                let index = font.position(chr)?;
                Some((index, font.glyph(index)?))
            });
            if let Some((index, glyph)) = next {
                buffer.stage(glyph);
                self.countdown = glyph.len() as isize;
                self.tail = (glyph.len() > BAND_WIDTH).then_some((index, BAND_WIDTH));
            }
        }

        let column = self.next_tail_column(font);
        buffer.shift_in(column);

        true
    }

    /// Next column of the glyph still entering the staging band, `0` if there is none.
    fn next_tail_column(&mut self, font: &Font) -> u8 {
        let Some((index, next)) = self.tail else {
            return 0;
        };

        match font.glyph(index).and_then(|glyph| glyph.get(next)) {
            Some(column) => {
                self.tail = Some((index, next + 1));
                *column
            }
            None => {
                self.tail = None;
                0
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_step_count() {
        let font = Font::new();

        // 'A' is 5 columns, 'B' 5 columns, the unknown character is skipped
        let state = ScrollState::new("A\u{e9}B", &font, 2);
        assert_eq!(state.remaining_steps(), 5 + 5 + 16);

        let state = ScrollState::new("", &font, 3);
        assert_eq!(state.remaining_steps(), 24);
    }

    #[test]
    fn test_glyphs_enter_back_to_back() {
        let mut font = Font::new();
        assert!(font.add_custom_glyph("\u{2665}", &[0x81, 0x42]));

        let mut buffer = FrameBuffer::new(1).unwrap();
        let mut state = ScrollState::new("\u{2665}\u{2665}", &font, 1);

        // first glyph staged on step 0, second on step 2, directly behind it
        for _ in 0..4 {
            assert!(state.step(&font, &mut buffer));
        }
        assert_eq!(&buffer.columns()[12..], &[0x81, 0x42, 0x81, 0x42, 0, 0, 0, 0, 0, 0, 0, 0]);
    }

    #[test]
    fn test_scroll_leaves_visible_window_blank() {
        let font = Font::new();
        let mut buffer = FrameBuffer::new(1).unwrap();
        let mut state = ScrollState::new("A", &font, 1);

        let mut steps = 0;
        while state.step(&font, &mut buffer) {
            steps += 1;
            if steps == 8 {
                // the glyph has moved fully into the window
                assert_eq!(
                    &buffer.visible()[..5],
                    font.lookup('A').unwrap()
                );
            }
        }

        assert_eq!(steps, 5 + 8);
        assert!(state.is_finished());
        assert_eq!(buffer.visible(), &[0; 8]);
    }

    #[test]
    fn test_wide_glyph_scrolls_through_completely() {
        let mut font = Font::new();
        let wide: Vec<u8> = (1..=12).collect();
        assert!(font.add_custom_glyph("\u{2665}", &wide));

        let mut buffer = FrameBuffer::new(2).unwrap();
        let mut state = ScrollState::new("\u{2665}", &font, 2);
        assert_eq!(state.remaining_steps(), 12 + 16);

        let mut seen = Vec::new();
        let mut steps = 0;
        while state.step(&font, &mut buffer) {
            steps += 1;
            if steps == 16 {
                assert_eq!(&buffer.visible()[..12], &wide[..]);
            }
            seen.extend(buffer.visible().iter().copied().filter(|column| *column != 0));
        }

        seen.sort_unstable();
        seen.dedup();
        assert_eq!(seen, wide);
        assert_eq!(buffer.visible(), &[0; 16]);
    }

    #[test]
    fn test_glyph_after_wide_glyph_follows_directly() {
        let mut font = Font::new();
        let wide: Vec<u8> = (1..=10).collect();
        assert!(font.add_custom_glyph("\u{2665}", &wide));

        let mut buffer = FrameBuffer::new(2).unwrap();
        let mut state = ScrollState::new("\u{2665}!", &font, 2);

        for _ in 0..12 {
            assert!(state.step(&font, &mut buffer));
        }
        // '!' is 0x5f followed by a blank column
        let mut expected = wide.clone();
        expected.extend([0x5f, 0]);
        expected.extend([0; 8]);
        assert_eq!(&buffer.columns()[12..], &expected[..]);
    }

    #[test]
    fn test_empty_glyph_stalls_following_glyphs() {
        let mut font = Font::new();
        assert!(font.add_custom_glyph("\u{2205}", &[]));

        let mut buffer = FrameBuffer::new(1).unwrap();
        let mut state = ScrollState::new("\u{2205}A", &font, 1);
        assert_eq!(state.remaining_steps(), 5 + 8);

        // the countdown passes zero after the empty glyph, 'A' is never staged
        let mut steps = 0;
        while state.step(&font, &mut buffer) {
            steps += 1;
            assert!(buffer.columns().iter().all(|column| *column == 0));
        }
        assert_eq!(steps, 5 + 8);
    }
}
