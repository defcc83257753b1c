//! Page-loaded tracking for lazy glyph materialization.
//!
//! Each bit covers one 256-codepoint page. Bits are set monotonically
//! within one font configuration epoch and only reset wholesale when the
//! font is rebuilt.

#[cfg(test)]
mod tests;

use crate::font::GLYPHS_PER_PAGE;

const BITS_PER_WORD: u32 = u32::BITS;

/// Growable bit-vector indexed by page number.
#[derive(Debug, Clone, Default)]
pub struct PageBits {
    words: Vec<u32>,
}

impl PageBits {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resize to cover every page up to `max_codepoint`, clearing all bits.
    ///
    /// Sizing rounds up to whole words: `ceil(pages / 32)` words for
    /// `(max_codepoint + 256) / 256` pages.
    pub fn resize_for(&mut self, max_codepoint: u32) {
        let pages = (max_codepoint + GLYPHS_PER_PAGE) / GLYPHS_PER_PAGE;
        let words = pages.div_ceil(BITS_PER_WORD);
        self.words.clear();
        self.words.resize(words as usize, 0);
    }

    /// Whether the tracker covers any pages at all. An unsized tracker
    /// disables page materialization entirely.
    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    pub fn contains(&self, page: u32) -> bool {
        let mask = 1 << (page & (BITS_PER_WORD - 1));
        self.words
            .get((page / BITS_PER_WORD) as usize)
            .is_some_and(|word| word & mask != 0)
    }

    pub fn insert(&mut self, page: u32) {
        let mask = 1 << (page & (BITS_PER_WORD - 1));
        if let Some(word) = self.words.get_mut((page / BITS_PER_WORD) as usize) {
            *word |= mask;
        }
    }

    /// Drop all coverage; the tracker is unsized until the next
    /// `resize_for`.
    pub fn clear(&mut self) {
        self.words.clear();
    }

    /// Number of backing words, exposed for sizing checks.
    pub fn word_count(&self) -> usize {
        self.words.len()
    }
}
