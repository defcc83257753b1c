//! Font instance caching and family name resolution.
//!
//! The manager hands out shared [`FontHandle`]s keyed by a full
//! [`FontDescriptor`]. It holds the cache entries weakly: a font lives
//! exactly as long as someone outside the manager keeps its handle, and
//! a later request for the same configuration revives the entry instead
//! of loading the file again.


use std::cell::RefCell;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::rc::{Rc, Weak};

use serde::{Deserialize, Serialize};

use crate::effect::Effect;
use crate::error::FontError;
use crate::font::raster::RasterBackend;
use crate::font::source::{GlyphSource, SwashSource};
use crate::font::Font;
use crate::geometry::SizeF;
use crate::render::Renderer;

/// Shared, mutably borrowable font instance.
pub type FontHandle = Rc<RefCell<Font>>;

/// Produces a glyph source for a font file; swappable for tests.
pub type SourceFactory = Box<dyn Fn(&Path) -> Result<Box<dyn GlyphSource>, FontError>>;

/// Quantize a point size to 26.6 fixed point for hashing. Sizes closer
/// than 1/64pt share a cache entry.
pub fn size_key(point_size: f32) -> u32 {
    (point_size * 64.0).round() as u32
}

/// Everything that distinguishes one cached font instance from another.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FontDescriptor {
    pub path: PathBuf,
    /// Point size in 26.6 fixed point, see [`size_key`].
    pub size_q6: u32,
    pub anti_aliased: bool,
    pub effect: Effect,
}

impl FontDescriptor {
    pub fn new(path: PathBuf, point_size: f32, anti_aliased: bool, effect: Effect) -> Self {
        Self {
            path,
            size_q6: size_key(point_size),
            anti_aliased,
            effect,
        }
    }

    pub fn point_size(&self) -> f32 {
        self.size_q6 as f32 / 64.0
    }
}

/// A font request by family name, as it appears in configuration files.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct FontSpec {
    pub name: String,
    pub size: f32,
    #[serde(default = "default_anti_aliased")]
    pub anti_aliased: bool,
    #[serde(default)]
    pub effect: Effect,
}

fn default_anti_aliased() -> bool {
    true
}

struct CatalogEntry {
    normalized: String,
    path: PathBuf,
}

/// Maps family names to font files.
#[derive(Default)]
pub struct FontCatalog {
    entries: Vec<CatalogEntry>,
}

impl FontCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, name: &str, path: PathBuf) {
        self.entries.push(CatalogEntry {
            normalized: name.to_lowercase(),
            path,
        });
    }

    /// Index every font file directly inside `dir` by its family name.
    /// Files that fail to parse are skipped with a warning. Returns the
    /// number of fonts registered.
    pub fn scan_directory(&mut self, dir: &Path) -> Result<usize, FontError> {
        let entries = fs::read_dir(dir).map_err(|source| FontError::Io {
            path: dir.to_path_buf(),
            source,
        })?;

        let mut registered = 0;
        for entry in entries {
            let entry = entry.map_err(|source| FontError::Io {
                path: dir.to_path_buf(),
                source,
            })?;
            let path = entry.path();
            let is_font = path
                .extension()
                .and_then(|ext| ext.to_str())
                .is_some_and(|ext| {
                    matches!(ext.to_lowercase().as_str(), "ttf" | "otf" | "ttc")
                });
            if !is_font {
                continue;
            }

            match SwashSource::family_name(&path) {
                Ok(Some(name)) => {
                    self.register(&name, path);
                    registered += 1;
                }
                Ok(None) => {
                    log::warn!("font file {} has no family name", path.display());
                }
                Err(err) => {
                    log::warn!("skipping font file {}: {err}", path.display());
                }
            }
        }
        Ok(registered)
    }

    /// Find the file for a family name. Matching is case-insensitive and
    /// token-based: every whitespace-separated token of the request must
    /// occur in the registered name. The first registered match wins.
    pub fn resolve(&self, name: &str) -> Option<&Path> {
        let request = name.to_lowercase();

        self.entries
            .iter()
            .find(|entry| {
                request
                    .split_whitespace()
                    .all(|token| entry.normalized.contains(token))
            })
            .map(|entry| entry.path.as_path())
    }
}

/// Loads fonts and caches live instances by descriptor.
pub struct FontManager {
    renderer: Rc<dyn Renderer>,
    factory: SourceFactory,
    catalog: FontCatalog,
    loaded: HashMap<FontDescriptor, Weak<RefCell<Font>>>,
}

impl FontManager {
    pub fn new(renderer: Rc<dyn Renderer>) -> Self {
        Self::with_source_factory(
            renderer,
            Box::new(|path| {
                SwashSource::from_file(path).map(|source| Box::new(source) as Box<dyn GlyphSource>)
            }),
        )
    }

    pub fn with_source_factory(renderer: Rc<dyn Renderer>, factory: SourceFactory) -> Self {
        Self {
            renderer,
            factory,
            catalog: FontCatalog::new(),
            loaded: HashMap::new(),
        }
    }

    pub fn catalog(&self) -> &FontCatalog {
        &self.catalog
    }

    pub fn catalog_mut(&mut self) -> &mut FontCatalog {
        &mut self.catalog
    }

    /// Load a font by family name through the catalog.
    pub fn load(
        &mut self,
        name: &str,
        point_size: f32,
        anti_aliased: bool,
        effect: Effect,
    ) -> Result<FontHandle, FontError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(FontError::EmptyFontName);
        }
        let path = self
            .catalog
            .resolve(name)
            .ok_or_else(|| FontError::NoMatchingFont(name.to_owned()))?
            .to_path_buf();
        self.load_from_file(path, point_size, anti_aliased, effect)
    }

    pub fn load_spec(&mut self, spec: &FontSpec) -> Result<FontHandle, FontError> {
        self.load(&spec.name, spec.size, spec.anti_aliased, spec.effect)
    }

    /// Load a font file, reusing a live instance with the same
    /// configuration when one exists.
    pub fn load_from_file(
        &mut self,
        path: PathBuf,
        point_size: f32,
        anti_aliased: bool,
        effect: Effect,
    ) -> Result<FontHandle, FontError> {
        let descriptor = FontDescriptor::new(path, point_size, anti_aliased, effect);

        if let Some(handle) = self.loaded.get(&descriptor).and_then(Weak::upgrade) {
            log::debug!(
                "font cache hit: {} at {}pt",
                descriptor.path.display(),
                descriptor.point_size()
            );
            return Ok(handle);
        }

        let source = (self.factory)(&descriptor.path)?;
        let handle = self.construct(source, point_size, anti_aliased, effect)?;
        // Overwrites a stale entry whose last handle was dropped.
        self.loaded.insert(descriptor, Rc::downgrade(&handle));
        Ok(handle)
    }

    /// Build a font over a caller-supplied source, bypassing the cache.
    pub fn load_from_source(
        &self,
        source: Box<dyn GlyphSource>,
        point_size: f32,
        anti_aliased: bool,
        effect: Effect,
    ) -> Result<FontHandle, FontError> {
        self.construct(source, point_size, anti_aliased, effect)
    }

    /// Propagate a display size change to every live font.
    pub fn display_size_changed(&mut self, size: SizeF) -> Result<(), FontError> {
        self.loaded.retain(|_, weak| weak.strong_count() > 0);
        for weak in self.loaded.values() {
            if let Some(font) = weak.upgrade() {
                font.borrow_mut().display_size_changed(size)?;
            }
        }
        Ok(())
    }

    fn construct(
        &self,
        source: Box<dyn GlyphSource>,
        point_size: f32,
        anti_aliased: bool,
        effect: Effect,
    ) -> Result<FontHandle, FontError> {
        let backend = RasterBackend::new(Rc::clone(&self.renderer), source);
        let font = Font::new(Box::new(backend), point_size, anti_aliased, effect, 0.0)?;
        Ok(Rc::new(RefCell::new(font)))
    }
}
