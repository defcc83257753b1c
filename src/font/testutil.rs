//! Test doubles for the renderer and glyph source seams.

use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;
use std::rc::Rc;

use crate::effect::Effect;
use crate::error::FontError;
use crate::font::raster::RasterBackend;
use crate::font::source::{GlyphSource, SourceMetrics};
use crate::font::Font;
use crate::geometry::{Color, PointF, RectF};
use crate::render::{DrawSurface, PixelFormat, Renderer, Texture};

pub(crate) struct FakeTexture {
    pub(crate) edge: u32,
    pub(crate) uploads: RefCell<Vec<Vec<u32>>>,
}

impl Texture for FakeTexture {
    fn load_from_memory(&self, pixels: &[u32], size: (u32, u32), _format: PixelFormat) {
        assert_eq!(size, (self.edge, self.edge));
        assert_eq!(pixels.len(), (size.0 * size.1) as usize);
        self.uploads.borrow_mut().push(pixels.to_vec());
    }
}

pub(crate) struct FakeRenderer {
    pub(crate) max_texture_size: u32,
    pub(crate) dpi: Cell<PointF>,
    pub(crate) created: RefCell<Vec<Rc<FakeTexture>>>,
}

impl FakeRenderer {
    pub(crate) fn new(max_texture_size: u32) -> Rc<Self> {
        Rc::new(Self {
            max_texture_size,
            dpi: Cell::new(PointF::new(72.0, 72.0)),
            created: RefCell::new(Vec::new()),
        })
    }

    /// Edge lengths of every texture created, in creation order.
    pub(crate) fn created_edges(&self) -> Vec<u32> {
        self.created.borrow().iter().map(|t| t.edge).collect()
    }

    /// Number of uploads across all created textures.
    pub(crate) fn upload_count(&self) -> usize {
        self.created
            .borrow()
            .iter()
            .map(|t| t.uploads.borrow().len())
            .sum()
    }
}

impl Renderer for FakeRenderer {
    fn create_texture(&self, edge: u32) -> Rc<dyn Texture> {
        let texture = Rc::new(FakeTexture {
            edge,
            uploads: RefCell::new(Vec::new()),
        });
        self.created.borrow_mut().push(Rc::clone(&texture));
        texture
    }

    fn max_texture_size(&self) -> u32 {
        self.max_texture_size
    }

    fn display_dpi(&self) -> PointF {
        self.dpi.get()
    }
}

#[derive(Clone, Copy)]
struct FakeGlyph {
    advance: Option<f32>,
    renderable: bool,
}

/// Scriptable glyph source with an 8x10 cell and 16px reference size.
///
/// Advances scale linearly with the configured pixel size so display
/// rescaling is observable: at the default 16pt/72dpi they come out
/// exactly as given.
pub(crate) struct FakeSource {
    glyphs: BTreeMap<u32, FakeGlyph>,
    metrics: SourceMetrics,
    px_size: f32,
    render_calls: Rc<Cell<usize>>,
    fail_reconfigure: bool,
}

impl FakeSource {
    pub(crate) fn new() -> Self {
        Self {
            glyphs: BTreeMap::new(),
            metrics: SourceMetrics {
                ascent: 8.0,
                descent: 2.0,
                height: 10.0,
                cell_width: 8,
                cell_height: 10,
            },
            px_size: 16.0,
            render_calls: Rc::new(Cell::new(0)),
            fail_reconfigure: false,
        }
    }

    pub(crate) fn failing() -> Self {
        Self {
            fail_reconfigure: true,
            ..Self::new()
        }
    }

    pub(crate) fn with_glyph(mut self, codepoint: u32, advance: f32) -> Self {
        self.glyphs.insert(
            codepoint,
            FakeGlyph {
                advance: Some(advance),
                renderable: true,
            },
        );
        self
    }

    /// A codepoint the charmap knows but the rasterizer cannot draw.
    pub(crate) fn with_unrenderable(mut self, codepoint: u32) -> Self {
        self.glyphs.insert(
            codepoint,
            FakeGlyph {
                advance: None,
                renderable: false,
            },
        );
        self
    }

    pub(crate) fn with_glyph_run(mut self, start: u32, count: u32, advance: f32) -> Self {
        for codepoint in start..start + count {
            self = self.with_glyph(codepoint, advance);
        }
        self
    }

    /// Handle that survives moving the source into a backend.
    pub(crate) fn render_counter(&self) -> Rc<Cell<usize>> {
        Rc::clone(&self.render_calls)
    }
}

impl GlyphSource for FakeSource {
    fn reconfigure(&mut self, px_size: f32, _anti_aliased: bool) -> Result<(), FontError> {
        if self.fail_reconfigure {
            return Err(FontError::InvalidFontData);
        }
        self.px_size = px_size;
        Ok(())
    }

    fn metrics(&self) -> SourceMetrics {
        self.metrics
    }

    fn advance(&self, codepoint: u32) -> Option<f32> {
        self.glyphs
            .get(&codepoint)
            .and_then(|glyph| glyph.advance)
            .map(|advance| advance * self.px_size / 16.0)
    }

    fn render(&mut self, codepoint: u32, cell: &mut [u32]) -> bool {
        self.render_calls.set(self.render_calls.get() + 1);
        cell.fill(0);
        if self.glyphs.get(&codepoint).is_some_and(|g| g.renderable) {
            cell[0] = 0xFFFF_FFFF;
            true
        } else {
            false
        }
    }

    fn codepoints(&self) -> Vec<u32> {
        self.glyphs.keys().copied().collect()
    }
}

#[derive(Debug, Clone, Copy)]
pub(crate) struct DrawCall {
    pub(crate) source: RectF,
    pub(crate) dest: RectF,
    pub(crate) clip: Option<RectF>,
    pub(crate) tint: Color,
}

#[derive(Default)]
pub(crate) struct FakeSurface {
    pub(crate) calls: Vec<DrawCall>,
}

impl DrawSurface for FakeSurface {
    fn draw_image(
        &mut self,
        _texture: &Rc<dyn Texture>,
        source: RectF,
        dest: RectF,
        clip: Option<RectF>,
        tint: Color,
    ) {
        self.calls.push(DrawCall {
            source,
            dest,
            clip,
            tint,
        });
    }
}

/// 16pt font over fakes with no effect and natural line spacing.
pub(crate) fn test_font(renderer: Rc<FakeRenderer>, source: FakeSource) -> Font {
    let backend = RasterBackend::new(renderer, Box::new(source));
    Font::new(Box::new(backend), 16.0, true, Effect::None, 0.0)
        .expect("test font construction")
}
