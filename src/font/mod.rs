//! The font abstraction: glyph map, page-granular lazy materialization,
//! layout queries, and baseline-aligned text drawing.
//!
//! A [`Font`] owns all shared state ([`FontState`]) and delegates the
//! backend-specific work to a [`FontBackend`] chosen at construction:
//! glyph lookup, page rasterization into atlas textures, and full
//! reconfiguration. [`raster::RasterBackend`] is the production backend.

pub mod pages;
pub mod raster;
pub mod source;

#[cfg(test)]
pub(crate) mod testutil;


use std::collections::BTreeMap;
use std::rc::Rc;

use crate::effect::Effect;
use crate::error::FontError;
use crate::geometry::{Color, PointF, RectF, SizeF};
use crate::render::{DrawSurface, Image};
pub use pages::PageBits;

/// Codepoints per lazily rasterized page.
pub const GLYPHS_PER_PAGE: u32 = 256;

/// Reference resolution for display auto-scaling. Scaling factors are the
/// ratio of the reported display size to this.
pub const NATIVE_RESOLUTION: SizeF = SizeF::new(640.0, 480.0);

/// One codepoint's layout metrics plus its rendered image reference.
///
/// Created empty when the glyph map is seeded, upgraded once metrics and
/// the packed image are known, and only ever discarded as part of a full
/// font reconfiguration.
#[derive(Clone, Default)]
pub struct FontGlyph {
    advance: f32,
    valid: bool,
    image: Option<Rc<Image>>,
}

impl FontGlyph {
    /// Horizontal pen advance at the given scale.
    pub fn advance(&self, scale_x: f32) -> f32 {
        self.advance * scale_x
    }

    /// Whether metrics have been resolved yet.
    pub fn is_valid(&self) -> bool {
        self.valid
    }

    pub fn image(&self) -> Option<&Rc<Image>> {
        self.image.as_ref()
    }

    /// Scaled size of the rendered cell; zero until an image is assigned.
    pub fn size(&self, scale_x: f32, scale_y: f32) -> SizeF {
        self.image.as_ref().map_or_else(SizeF::default, |image| {
            let region = image.region();
            SizeF::new(region.width * scale_x, region.height * scale_y)
        })
    }

    pub(crate) fn set_metrics(&mut self, advance: f32) {
        self.advance = advance;
        self.valid = true;
    }

    pub(crate) fn set_image(&mut self, image: Rc<Image>) {
        self.image = Some(image);
    }
}

/// State shared between the font and its backend.
pub struct FontState {
    /// Distance from baseline to the top of the cell, device units.
    pub ascender: f32,
    /// Distance from baseline to the bottom of the cell; negative.
    pub descender: f32,
    /// Line height in device units.
    pub height: f32,
    pub scaling_horizontal: f32,
    pub scaling_vertical: f32,
    /// Highest codepoint the font maps; lookups above it are misses.
    pub max_codepoint: u32,
    pub loaded_pages: PageBits,
    /// Ordered so rasterization can sweep bidirectionally from any page.
    pub glyph_map: BTreeMap<u32, FontGlyph>,
    pub effect: Effect,
    pub point_size: f32,
    pub anti_aliased: bool,
    /// Overrides the font's natural line height when positive.
    pub line_spacing: f32,
}

impl FontState {
    fn new(point_size: f32, anti_aliased: bool, effect: Effect, line_spacing: f32) -> Self {
        Self {
            ascender: 0.0,
            descender: 0.0,
            height: 0.0,
            scaling_horizontal: 1.0,
            scaling_vertical: 1.0,
            max_codepoint: 0,
            loaded_pages: PageBits::new(),
            glyph_map: BTreeMap::new(),
            effect,
            point_size,
            anti_aliased,
            line_spacing,
        }
    }

    /// Set the highest mapped codepoint: clears the glyph map and resizes
    /// the page tracker to cover every page up to it.
    pub fn set_max_codepoint(&mut self, codepoint: u32) {
        self.glyph_map.clear();
        self.max_codepoint = codepoint;
        self.loaded_pages.resize_for(codepoint);
    }

    /// Correction factor for horizontal metrics. The backend rasterizes
    /// at the vertically scaled size, so advances already carry the
    /// vertical factor; anisotropic display scaling adjusts them by the
    /// ratio of the two factors.
    pub fn horizontal_correction(&self) -> f32 {
        if self.scaling_vertical == 0.0 {
            1.0
        } else {
            self.scaling_horizontal / self.scaling_vertical
        }
    }
}

/// Backend-specific extension points of a font.
pub trait FontBackend {
    /// Look up the glyph entry for a codepoint, resolving its metrics on
    /// first touch. Never materializes pages or builds images.
    fn find_glyph<'a>(
        &mut self,
        state: &'a mut FontState,
        codepoint: u32,
    ) -> Option<&'a FontGlyph>;

    /// Produce images for every unresolved glyph in the inclusive
    /// codepoint range, opportunistically sweeping neighbors that fit.
    fn rasterise(&mut self, state: &mut FontState, start: u32, end: u32);

    /// (Re)acquire rasterizer resources and rebuild the glyph map.
    /// Failure is fatal: no partially usable font remains.
    fn update_font(&mut self, state: &mut FontState) -> Result<(), FontError>;
}

/// A configured font: layout metrics, cached glyph images, and drawing.
pub struct Font {
    state: FontState,
    backend: Box<dyn FontBackend>,
}

impl Font {
    /// Configure a font over the given backend. The backend performs its
    /// initial resource acquisition here; errors abort construction.
    pub fn new(
        backend: Box<dyn FontBackend>,
        point_size: f32,
        anti_aliased: bool,
        effect: Effect,
        line_spacing: f32,
    ) -> Result<Self, FontError> {
        let mut font = Self {
            state: FontState::new(point_size, anti_aliased, effect, line_spacing),
            backend,
        };
        font.update()?;
        Ok(font)
    }

    pub fn state(&self) -> &FontState {
        &self.state
    }

    pub fn point_size(&self) -> f32 {
        self.state.point_size
    }

    pub fn is_anti_aliased(&self) -> bool {
        self.state.anti_aliased
    }

    pub fn effect(&self) -> Effect {
        self.state.effect
    }

    pub fn ascender(&self) -> f32 {
        self.state.ascender
    }

    pub fn descender(&self) -> f32 {
        self.state.descender
    }

    pub fn height(&self) -> f32 {
        self.state.height
    }

    pub fn max_codepoint(&self) -> u32 {
        self.state.max_codepoint
    }

    /// Baseline offset from the top of a line at the given scale.
    pub fn baseline(&self, scale_y: f32) -> f32 {
        self.state.ascender * scale_y
    }

    /// Whether the page containing `codepoint` has been materialized.
    pub fn is_page_loaded(&self, codepoint: u32) -> bool {
        self.state.loaded_pages.contains(codepoint / GLYPHS_PER_PAGE)
    }

    /// Change the point size; a different value triggers a full rebuild.
    pub fn set_point_size(&mut self, point_size: f32) -> Result<(), FontError> {
        if self.state.point_size == point_size {
            return Ok(());
        }
        self.state.point_size = point_size;
        self.update()
    }

    /// Toggle anti-aliasing; a different value triggers a full rebuild.
    pub fn set_anti_aliased(&mut self, anti_aliased: bool) -> Result<(), FontError> {
        if self.state.anti_aliased == anti_aliased {
            return Ok(());
        }
        self.state.anti_aliased = anti_aliased;
        self.update()
    }

    /// Change the post-effect; a different value triggers a full rebuild
    /// since the effect changes the padding every packed cell reserves.
    pub fn set_effect(&mut self, effect: Effect) -> Result<(), FontError> {
        if self.state.effect == effect {
            return Ok(());
        }
        self.state.effect = effect;
        self.update()
    }

    /// Recompute device scaling for a new display size and rebuild every
    /// atlas texture.
    pub fn display_size_changed(&mut self, size: SizeF) -> Result<(), FontError> {
        self.state.scaling_horizontal = size.width / NATIVE_RESOLUTION.width;
        self.state.scaling_vertical = size.height / NATIVE_RESOLUTION.height;
        self.update()
    }

    /// Look up a codepoint's glyph, materializing its 256-codepoint page
    /// on first access.
    ///
    /// This is a mutating read: the first lookup in an unloaded page
    /// rasterizes the whole aligned block (and opportunistically some
    /// neighbors) before returning, which can be expensive. Subsequent
    /// lookups in the same page are cheap map hits. Returns `None` for
    /// codepoints above [`Self::max_codepoint`] or without a glyph.
    pub fn glyph_data(&mut self, codepoint: u32) -> Option<&FontGlyph> {
        if codepoint > self.state.max_codepoint {
            return None;
        }

        if !self.state.loaded_pages.is_empty() {
            let page = codepoint / GLYPHS_PER_PAGE;
            if !self.state.loaded_pages.contains(page) {
                self.state.loaded_pages.insert(page);
                self.backend.rasterise(
                    &mut self.state,
                    codepoint & !(GLYPHS_PER_PAGE - 1),
                    codepoint | (GLYPHS_PER_PAGE - 1),
                );
            }
        }

        self.backend.find_glyph(&mut self.state, codepoint)
    }

    /// Total pen advance for `text`. Characters without a glyph
    /// contribute nothing.
    pub fn text_advance(&mut self, text: &str, scale_x: f32) -> f32 {
        text.chars()
            .map(|c| {
                self.glyph_data(c as u32)
                    .map_or(0.0, |glyph| glyph.advance(scale_x))
            })
            .sum()
    }

    /// Horizontal extent of `text`; identical to [`Self::text_advance`].
    pub fn text_extent(&mut self, text: &str, scale_x: f32) -> f32 {
        self.text_advance(text, scale_x)
    }

    /// Index of the character under a pixel offset into `text`, counting
    /// from the character index `start`.
    ///
    /// Returns the first character whose running advance strictly exceeds
    /// `pixel`: a pixel landing exactly on a glyph boundary belongs to
    /// the next character. Returns the character count when the text is
    /// narrower than `pixel`, and `start` when `pixel` is not positive or
    /// `start` is out of range.
    pub fn char_at_pixel(&mut self, text: &str, start: usize, pixel: f32, scale_x: f32) -> usize {
        let length = text.chars().count();
        if pixel <= 0.0 || start >= length {
            return start;
        }

        let mut current = 0.0;
        for (index, c) in text.chars().enumerate().skip(start) {
            if let Some(glyph) = self.glyph_data(c as u32) {
                current += glyph.advance(scale_x);
                if pixel < current {
                    return index;
                }
            }
        }

        length
    }

    /// Draw `text` onto `surface` with its top-left at `position`.
    ///
    /// Glyphs of differing height sit on one baseline at
    /// `position.y + ascender * scale_y`. A literal space additionally
    /// advances the pen by `space_extra` (justification hook). Returns
    /// the final pen x, the caret position after the string.
    pub fn draw_text(
        &mut self,
        surface: &mut dyn DrawSurface,
        text: &str,
        position: PointF,
        clip: Option<RectF>,
        tint: Color,
        space_extra: f32,
        scale_x: f32,
        scale_y: f32,
    ) -> f32 {
        let base = position.y + self.baseline(scale_y);
        let mut pen_x = position.x;

        for c in text.chars() {
            let Some(glyph) = self.glyph_data(c as u32) else {
                continue;
            };
            let advance = glyph.advance(scale_x);
            let size = glyph.size(scale_x, scale_y);
            let image = glyph.image().cloned();

            if let Some(image) = image {
                let top = base + image.offset().y * scale_y;
                image.render(
                    surface,
                    RectF::new(pen_x, top, size.width, size.height),
                    clip,
                    tint,
                );
            }

            pen_x += advance;
            if c == ' ' {
                pen_x += space_extra;
            }
        }

        pen_x
    }

    fn update(&mut self) -> Result<(), FontError> {
        self.backend.update_font(&mut self.state)
    }
}
