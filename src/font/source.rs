//! Glyph rasterization sources.
//!
//! [`GlyphSource`] is the seam between the font machinery and the actual
//! rasterizer; [`SwashSource`] is the production implementation over a
//! font file loaded into memory.

use std::fs;
use std::path::Path;

use swash::scale::{Render, ScaleContext, Source};
use swash::zeno::Format;
use swash::{CacheKey, FontRef};

use crate::error::FontError;

/// Metrics a source reports after reconfiguration, in device pixels.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SourceMetrics {
    /// Baseline to cell top.
    pub ascent: f32,
    /// Baseline to cell bottom, as a positive magnitude.
    pub descent: f32,
    /// Natural line height.
    pub height: f32,
    /// Width of the fixed cell every glyph renders into.
    pub cell_width: u32,
    /// Height of the fixed cell every glyph renders into.
    pub cell_height: u32,
}

/// A rasterizer for one font face.
///
/// Sources render into fixed-size cells sized by [`Self::metrics`]; the
/// cell dimensions only change across [`Self::reconfigure`] calls.
pub trait GlyphSource {
    /// Prepare the source for a pixel size and anti-aliasing mode.
    /// Invalidates all previously reported metrics.
    fn reconfigure(&mut self, px_size: f32, anti_aliased: bool) -> Result<(), FontError>;

    /// Metrics for the current configuration.
    fn metrics(&self) -> SourceMetrics;

    /// Horizontal advance for a codepoint, or `None` when the face has
    /// no glyph for it.
    fn advance(&self, codepoint: u32) -> Option<f32>;

    /// Render a codepoint into `cell`, an RGBA buffer of exactly
    /// `cell_width * cell_height` pixels. The cell is cleared first.
    /// Returns false when the face has no glyph for the codepoint.
    fn render(&mut self, codepoint: u32, cell: &mut [u32]) -> bool;

    /// Every codepoint the face maps to a glyph.
    fn codepoints(&self) -> Vec<u32>;
}

/// Production glyph source backed by swash.
pub struct SwashSource {
    data: Vec<u8>,
    offset: u32,
    key: CacheKey,
    context: ScaleContext,
    px_size: f32,
    anti_aliased: bool,
    metrics: SourceMetrics,
}

impl SwashSource {
    /// Load the first face of a font file.
    pub fn from_file(path: &Path) -> Result<Self, FontError> {
        let data = fs::read(path).map_err(|source| FontError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_bytes(data)
    }

    /// Take ownership of raw font data and parse its first face.
    pub fn from_bytes(data: Vec<u8>) -> Result<Self, FontError> {
        let font = FontRef::from_index(&data, 0).ok_or(FontError::InvalidFontData)?;
        let (offset, key) = (font.offset, font.key);
        Ok(Self {
            data,
            offset,
            key,
            context: ScaleContext::new(),
            px_size: 0.0,
            anti_aliased: true,
            metrics: SourceMetrics::default(),
        })
    }

    /// Family name of a font file, for catalog indexing.
    pub fn family_name(path: &Path) -> Result<Option<String>, FontError> {
        let data = fs::read(path).map_err(|source| FontError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let font = FontRef::from_index(&data, 0).ok_or(FontError::InvalidFontData)?;
        let strings = font.localized_strings();
        let name = strings
            .find_by_id(swash::StringId::Family, Some("en"))
            .or_else(|| strings.find_by_id(swash::StringId::Family, None));
        Ok(name.map(|name| name.chars().collect()))
    }

    fn font_ref(&self) -> FontRef<'_> {
        // Reconstructed from parts so the struct stays self-referential
        // free; the key ties scaler caches to this face.
        FontRef {
            data: &self.data,
            offset: self.offset,
            key: self.key,
        }
    }
}

impl GlyphSource for SwashSource {
    fn reconfigure(&mut self, px_size: f32, anti_aliased: bool) -> Result<(), FontError> {
        self.px_size = px_size;
        self.anti_aliased = anti_aliased;

        let metrics = self.font_ref().metrics(&[]).scale(px_size);
        let ascent = metrics.ascent;
        let descent = metrics.descent.abs();
        let cell_width = metrics.max_width.ceil() as u32;
        let cell_height = (ascent + descent).ceil() as u32;
        if cell_width == 0 || cell_height == 0 {
            return Err(FontError::InvalidFontData);
        }

        self.metrics = SourceMetrics {
            ascent,
            descent,
            height: ascent + descent + metrics.leading,
            cell_width,
            cell_height,
        };
        Ok(())
    }

    fn metrics(&self) -> SourceMetrics {
        self.metrics
    }

    fn advance(&self, codepoint: u32) -> Option<f32> {
        let font = self.font_ref();
        let glyph_id = font.charmap().map(codepoint);
        if glyph_id == 0 {
            return None;
        }
        Some(
            font.glyph_metrics(&[])
                .scale(self.px_size)
                .advance_width(glyph_id),
        )
    }

    fn render(&mut self, codepoint: u32, cell: &mut [u32]) -> bool {
        cell.fill(0);

        // Built from parts instead of `font_ref` so the borrow of `data`
        // stays disjoint from the mutable borrow of `context`.
        let font = FontRef {
            data: &self.data,
            offset: self.offset,
            key: self.key,
        };
        let glyph_id = font.charmap().map(codepoint);
        if glyph_id == 0 {
            return false;
        }

        let mut scaler = self
            .context
            .builder(font)
            .size(self.px_size)
            .hint(true)
            .build();
        let Some(image) = Render::new(&[Source::Outline])
            .format(Format::Alpha)
            .render(&mut scaler, glyph_id)
        else {
            return false;
        };

        // Whitespace and marks may have an advance but an empty bitmap.
        if image.placement.width == 0 || image.placement.height == 0 {
            return true;
        }

        let cell_width = self.metrics.cell_width as i32;
        let cell_height = self.metrics.cell_height as i32;
        let baseline = self.metrics.ascent.round() as i32;

        for row in 0..image.placement.height as i32 {
            let y = baseline - image.placement.top + row;
            if !(0..cell_height).contains(&y) {
                continue;
            }
            for col in 0..image.placement.width as i32 {
                let x = image.placement.left + col;
                if !(0..cell_width).contains(&x) {
                    continue;
                }

                let coverage =
                    image.data[(row * image.placement.width as i32 + col) as usize] as u32;
                let alpha = if self.anti_aliased {
                    coverage
                } else if coverage >= 128 {
                    0xFF
                } else {
                    0
                };
                if alpha > 0 {
                    // White text; the draw tint supplies the color.
                    cell[(y * cell_width + x) as usize] = 0x00FF_FFFF | (alpha << 24);
                }
            }
        }

        true
    }

    fn codepoints(&self) -> Vec<u32> {
        let mut codepoints = Vec::new();
        self.font_ref().charmap().enumerate(|codepoint, _| {
            codepoints.push(codepoint);
        });
        codepoints
    }
}
