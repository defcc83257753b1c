//! Error type for font construction and reconfiguration.
//!
//! Only resource acquisition is fallible. Lookup misses (codepoints the
//! font cannot render) and atlas overflow are silent degradation, not
//! errors: layout and drawing simply skip the affected glyphs.

use std::path::PathBuf;

use thiserror::Error;

/// Fatal font configuration failures.
///
/// Any of these aborts font construction or reconfiguration; no partially
/// usable font instance is left behind and nothing is retried.
#[derive(Debug, Error)]
pub enum FontError {
    /// The font file could not be read.
    #[error("failed to read font file {}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The font data could not be parsed or produced unusable metrics.
    #[error("font data is invalid or unsupported")]
    InvalidFontData,

    /// The font maps no codepoint to a glyph.
    #[error("font reports no renderable codepoints")]
    EmptyCharmap,

    /// No installed font matched the requested name.
    #[error("no installed font matches {0:?}")]
    NoMatchingFont(String),

    /// A font was requested by name with an empty name.
    #[error("font name must not be empty")]
    EmptyFontName,
}
