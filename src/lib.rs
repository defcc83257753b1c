//! Text rendering primitives for GUI toolkits: fonts, glyph caching, and
//! atlas packing.
//!
//! The crate turns codepoints into positioned, tinted glyph images on a
//! drawing surface. Glyphs are materialized lazily in 256-codepoint pages,
//! shelf-packed into square power-of-two atlas textures, and optionally
//! post-processed with a drop-shadow or outline effect. [`FontManager`]
//! memoizes live font instances by configuration descriptor using weak
//! references.
//!
//! The renderer, textures, and drawing surface are consumed capabilities
//! (see [`render`]); the system rasterizer is abstracted behind
//! [`font::source::GlyphSource`], with a production implementation backed
//! by `swash`.

#![deny(unsafe_code)]

pub mod effect;
pub mod error;
pub mod font;
pub mod geometry;
pub mod manager;
pub mod render;

pub use effect::Effect;
pub use error::FontError;
pub use font::raster::RasterBackend;
pub use font::source::{GlyphSource, SourceMetrics, SwashSource};
pub use font::{Font, FontBackend, FontGlyph, FontState};
pub use geometry::{Color, PointF, RectF, SizeF};
pub use manager::{FontCatalog, FontDescriptor, FontHandle, FontManager, FontSpec};
pub use render::{DrawSurface, Image, PixelFormat, Renderer, Texture};
