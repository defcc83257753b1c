//! Capabilities consumed from the host renderer.
//!
//! The crate never talks to a GPU or window system directly. The host
//! supplies a [`Renderer`] that allocates textures and reports display
//! properties, textures that accept one-shot pixel uploads, and a
//! [`DrawSurface`] that batches textured quads. All three are chosen at
//! construction; nothing here inspects concrete types at runtime.

use std::rc::Rc;

use crate::geometry::{Color, PointF, RectF};

/// Layout of pixel data passed to [`Texture::load_from_memory`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum PixelFormat {
    /// 32-bit pixels, alpha in the top byte (`0xAABBGGRR` memory order is
    /// up to the host; the crate only reads and writes the alpha byte).
    Rgba,
}

/// A texture handle owned by the host renderer.
///
/// Atlas textures are populated incrementally in a CPU-side buffer and
/// uploaded exactly once per assembled atlas, so the upload takes `&self`
/// and implementors keep whatever interior mutability they need.
pub trait Texture {
    fn load_from_memory(&self, pixels: &[u32], size: (u32, u32), format: PixelFormat);
}

/// The host renderer: texture factory plus display properties.
pub trait Renderer {
    /// Allocate a square texture with the given edge length in pixels.
    fn create_texture(&self, edge: u32) -> Rc<dyn Texture>;

    /// The largest supported texture edge length.
    fn max_texture_size(&self) -> u32;

    /// Horizontal/vertical display DPI.
    fn display_dpi(&self) -> PointF;
}

/// A sink for textured quads with optional clipping and a color tint.
pub trait DrawSurface {
    fn draw_image(
        &mut self,
        texture: &Rc<dyn Texture>,
        source: RectF,
        dest: RectF,
        clip: Option<RectF>,
        tint: Color,
    );
}

/// A rectangular cell of an atlas texture plus its baseline offset.
///
/// Every glyph that maps to the same packed cell shares one `Image` via
/// `Rc`; an image never spans more than one atlas texture.
pub struct Image {
    texture: Rc<dyn Texture>,
    region: RectF,
    offset: PointF,
}

impl Image {
    pub fn new(texture: Rc<dyn Texture>, region: RectF, offset: PointF) -> Self {
        Self {
            texture,
            region,
            offset,
        }
    }

    /// An image with no pixels, used to permanently mark codepoints the
    /// rasterizer reported no glyph for.
    pub fn empty(texture: Rc<dyn Texture>) -> Self {
        Self::new(texture, RectF::default(), PointF::default())
    }

    pub fn texture(&self) -> &Rc<dyn Texture> {
        &self.texture
    }

    pub fn region(&self) -> RectF {
        self.region
    }

    /// Offset from the pen position to the cell origin; `y` is the negated
    /// ascender so cells sit on a common baseline.
    pub fn offset(&self) -> PointF {
        self.offset
    }

    /// Draw the cell onto `surface`, stretched to `dest`. Empty images
    /// draw nothing.
    pub fn render(
        &self,
        surface: &mut dyn DrawSurface,
        dest: RectF,
        clip: Option<RectF>,
        tint: Color,
    ) {
        if self.region.is_empty() {
            return;
        }
        surface.draw_image(&self.texture, self.region, dest, clip, tint);
    }
}
