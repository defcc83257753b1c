//! The production [`FontBackend`]: shelf-packs rasterized glyph cells
//! into square atlas textures.
//!
//! Glyphs render into fixed-size cells, so packing degenerates to
//! left-to-right shelves with a shared row bottom. Each call to
//! [`FontBackend::rasterise`] sizes a texture for the requested range,
//! fills it, and keeps filling with neighboring glyphs while space
//! remains; glyphs that do not fit roll over into further textures.


use std::rc::Rc;

use crate::error::FontError;
use crate::font::{FontBackend, FontGlyph, FontState};
use crate::geometry::{PointF, RectF};
use crate::render::{Image, PixelFormat, Renderer, Texture};
use crate::{effect, font::source::GlyphSource};

/// Blank pixels between packed cells and around the texture border.
pub const GLYPH_PADDING: u32 = 2;

/// Starting edge for the texture size search; doubled until the range
/// fits or the renderer limit is exceeded.
const INITIAL_TEXTURE_SIZE: u32 = 32;

/// Points per inch, for point size to pixel size conversion.
const POINTS_PER_INCH: f32 = 72.0;

/// Shelf-packing atlas backend over a [`GlyphSource`].
pub struct RasterBackend {
    renderer: Rc<dyn Renderer>,
    source: Box<dyn GlyphSource>,
    textures: Vec<Rc<dyn Texture>>,
    cell: Vec<u32>,
}

impl RasterBackend {
    pub fn new(renderer: Rc<dyn Renderer>, source: Box<dyn GlyphSource>) -> Self {
        Self {
            renderer,
            source,
            textures: Vec::new(),
            cell: Vec::new(),
        }
    }

    /// Atlas textures built so far, oldest first.
    pub fn textures(&self) -> &[Rc<dyn Texture>] {
        &self.textures
    }

    /// Cell footprint in the atlas: the source cell plus inter-cell
    /// padding plus the room the post-effect needs on trailing edges.
    fn padded_cell(&self, state: &FontState) -> (u32, u32) {
        let metrics = self.source.metrics();
        let extra = GLYPH_PADDING + state.effect.margin();
        (metrics.cell_width + extra, metrics.cell_height + extra)
    }

    /// Smallest power-of-two edge that holds every unrendered glyph in
    /// `from..=to`, starting from [`INITIAL_TEXTURE_SIZE`]. Returns 0
    /// when nothing needs space or the renderer limit is exceeded.
    ///
    /// The fit simulation only rejects on row-bottom overflow; a cell
    /// poking past the right edge wraps to the next shelf instead, like
    /// the placement loop does.
    fn texture_size_for(&self, state: &FontState, from: u32, to: u32) -> u32 {
        let (cell_width, cell_height) = self.padded_cell(state);
        let limit = self.renderer.max_texture_size();
        let mut size = INITIAL_TEXTURE_SIZE;

        loop {
            if size > limit {
                log::warn!(
                    "glyph atlas for codepoints {from:#x}..={to:#x} exceeds the \
                     renderer texture limit of {limit}; dropping the range"
                );
                return 0;
            }

            let mut x = GLYPH_PADDING;
            let mut y = GLYPH_PADDING;
            let mut row_bottom = GLYPH_PADDING;
            let mut fits = true;
            let mut count = 0u32;

            for glyph in state.glyph_map.range(from..=to).map(|(_, glyph)| glyph) {
                if glyph.image().is_some() {
                    continue;
                }

                x += cell_width;
                if x > size {
                    x = GLYPH_PADDING;
                    y = row_bottom;
                }
                let bottom = y + cell_height;
                if bottom > size {
                    fits = false;
                    break;
                }
                row_bottom = row_bottom.max(bottom);
                count += 1;
            }

            if fits {
                return if count > 0 { size } else { 0 };
            }
            size *= 2;
        }
    }
}

impl FontBackend for RasterBackend {
    fn find_glyph<'a>(
        &mut self,
        state: &'a mut FontState,
        codepoint: u32,
    ) -> Option<&'a FontGlyph> {
        let correction = state.horizontal_correction();
        let glyph = state.glyph_map.get_mut(&codepoint)?;
        if !glyph.is_valid() {
            if let Some(advance) = self.source.advance(codepoint) {
                glyph.set_metrics(advance * correction);
            }
        }
        Some(glyph)
    }

    fn rasterise(&mut self, state: &mut FontState, start: u32, end: u32) {
        if state.glyph_map.range(start..).next().is_none() {
            return;
        }

        // Forward from the range start to the end of the map, then
        // backward from just before the start; leftover texture space is
        // filled from this order after the requested range is done.
        let order: Vec<u32> = state
            .glyph_map
            .range(start..)
            .map(|(&codepoint, _)| codepoint)
            .chain(
                state
                    .glyph_map
                    .range(..start)
                    .rev()
                    .map(|(&codepoint, _)| codepoint),
            )
            .collect();
        let requested = state.glyph_map.range(start..=end).count();

        let metrics = self.source.metrics();
        let (cell_width, cell_height) = self.padded_cell(state);
        self.cell
            .resize((metrics.cell_width * metrics.cell_height) as usize, 0);

        let mut index = 0usize;
        while let Some(&cursor) = order.get(index) {
            let edge = self.texture_size_for(state, cursor, end);
            if edge == 0 {
                break;
            }

            let texture = self.renderer.create_texture(edge);
            self.textures.push(Rc::clone(&texture));
            let mut buffer = vec![0u32; (edge * edge) as usize];

            let mut x = GLYPH_PADDING;
            let mut y = GLYPH_PADDING;
            let mut row_bottom = GLYPH_PADDING;

            while let Some(&codepoint) = order.get(index) {
                let Some(glyph) = state.glyph_map.get_mut(&codepoint) else {
                    index += 1;
                    continue;
                };

                if glyph.image().is_none() {
                    if self.source.render(codepoint, &mut self.cell) {
                        let mut next = x + cell_width;
                        if next > edge {
                            x = GLYPH_PADDING;
                            next = x + cell_width;
                            y = row_bottom;
                        }
                        let bottom = y + cell_height;
                        if bottom > edge {
                            // Texture full; this glyph reopens the outer
                            // loop with a fresh texture.
                            break;
                        }

                        blit(
                            &self.cell,
                            metrics.cell_width,
                            metrics.cell_height,
                            &mut buffer,
                            edge,
                            x,
                            y,
                        );
                        let region = RectF::new(
                            x as f32,
                            y as f32,
                            (cell_width - GLYPH_PADDING) as f32,
                            (cell_height - GLYPH_PADDING) as f32,
                        );
                        let offset = PointF::new(0.0, -state.ascender);
                        glyph.set_image(Rc::new(Image::new(Rc::clone(&texture), region, offset)));

                        x = next;
                        row_bottom = row_bottom.max(bottom);
                    } else {
                        // No glyph for this codepoint; mark it with an
                        // empty image so it is never rendered again.
                        glyph.set_image(Rc::new(Image::empty(Rc::clone(&texture))));
                    }
                }

                index += 1;
            }

            effect::apply(state.effect, &mut buffer, edge as usize, edge as usize);
            texture.load_from_memory(&buffer, (edge, edge), PixelFormat::Rgba);

            if index >= requested {
                break;
            }
        }
    }

    fn update_font(&mut self, state: &mut FontState) -> Result<(), FontError> {
        self.textures.clear();
        state.glyph_map.clear();
        state.loaded_pages.clear();

        let dpi = self.renderer.display_dpi();
        let px_size = state.point_size * dpi.y / POINTS_PER_INCH * state.scaling_vertical;
        self.source.reconfigure(px_size, state.anti_aliased)?;

        let metrics = self.source.metrics();
        state.ascender = metrics.ascent;
        state.descender = -metrics.descent;
        state.height = if state.line_spacing > 0.0 {
            state.line_spacing
        } else {
            metrics.height
        };
        self.cell = vec![0; (metrics.cell_width * metrics.cell_height) as usize];

        let codepoints = self.source.codepoints();
        let max_codepoint = codepoints
            .iter()
            .copied()
            .max()
            .ok_or(FontError::EmptyCharmap)?;
        state.set_max_codepoint(max_codepoint);
        for codepoint in codepoints {
            state.glyph_map.insert(codepoint, FontGlyph::default());
        }

        log::debug!(
            "font configured: {px_size:.1}px, {} codepoints, max {max_codepoint:#x}",
            state.glyph_map.len()
        );
        Ok(())
    }
}

/// Copy a rendered cell into the atlas buffer at `(x, y)`. Rows or
/// columns falling outside the buffer are dropped.
fn blit(
    cell: &[u32],
    cell_width: u32,
    cell_height: u32,
    buffer: &mut [u32],
    edge: u32,
    x: u32,
    y: u32,
) {
    if x >= edge {
        return;
    }
    let copy_width = cell_width.min(edge - x) as usize;

    for row in 0..cell_height {
        if y + row >= edge {
            break;
        }
        let src = (row * cell_width) as usize;
        let dst = ((y + row) * edge + x) as usize;
        buffer[dst..dst + copy_width].copy_from_slice(&cell[src..src + copy_width]);
    }
}
