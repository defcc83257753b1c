//! Buffer-level post-effects applied once per assembled atlas texture.
//!
//! Both effects shift by (+1, +1), so a cell only needs extra padding on
//! its trailing edges; [`Effect::margin`] reports how much. The effect
//! runs over the whole atlas buffer after packing, so a cell can bleed
//! into an adjacent cell's margin.


use serde::{Deserialize, Serialize};

/// Post-processing applied to rasterized glyph buffers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Effect {
    #[default]
    None,
    /// Half-alpha copy of every opaque pixel at (+1, +1), beneath the glyph.
    DropShadow,
    /// 1px solid black outline beneath the unmodified glyph.
    Outline,
}

impl Effect {
    /// Extra pixels every packed cell must reserve for the effect.
    pub const fn margin(self) -> u32 {
        match self {
            Self::None => 0,
            Self::DropShadow => 1,
            Self::Outline => 2,
        }
    }
}

/// Apply `effect` to an RGBA buffer in place.
///
/// `Effect::None` leaves the buffer untouched byte for byte. The other
/// effects compose into a zeroed scratch buffer and copy it back whole,
/// so pixels with zero alpha lose any stray color data they carried.
pub fn apply(effect: Effect, buffer: &mut [u32], width: usize, height: usize) {
    debug_assert_eq!(buffer.len(), width * height);

    if effect == Effect::None {
        return;
    }

    let mut scratch = vec![0u32; width * height];
    match effect {
        Effect::None => {}
        Effect::DropShadow => drop_shadow(buffer, &mut scratch, width, height),
        Effect::Outline => outline(buffer, &mut scratch, width, height),
    }
    buffer.copy_from_slice(&scratch);
}

fn alpha(pixel: u32) -> u32 {
    (pixel >> 24) & 0xFF
}

/// Shadow first, original second, in one scan: a later original always
/// overwrites an earlier shadow, so the glyph wins on overlap.
fn drop_shadow(buffer: &[u32], scratch: &mut [u32], width: usize, height: usize) {
    for y in 0..height {
        for x in 0..width {
            let pixel = buffer[y * width + x];
            let a = alpha(pixel);
            if a == 0 {
                continue;
            }

            if y + 1 < height && x + 1 < width {
                scratch[(y + 1) * width + x + 1] = (a / 2) << 24;
            }
            scratch[y * width + x] = pixel;
        }
    }
}

/// Pass 1 stamps opaque black over the 3x3 neighborhood (shifted +1, +1)
/// of every opaque pixel; pass 2 re-stamps the originals on top.
fn outline(buffer: &[u32], scratch: &mut [u32], width: usize, height: usize) {
    for y in 0..height {
        for x in 0..width {
            if alpha(buffer[y * width + x]) == 0 {
                continue;
            }

            for dy in 0..3 {
                for dx in 0..3 {
                    let ty = y + dy;
                    let tx = x + dx;
                    if ty < height && tx < width {
                        scratch[ty * width + tx] = 0xFF00_0000;
                    }
                }
            }
        }
    }

    for y in 0..height {
        for x in 0..width {
            let pixel = buffer[y * width + x];
            if alpha(pixel) == 0 {
                continue;
            }

            if y + 1 < height && x + 1 < width {
                scratch[(y + 1) * width + x + 1] = pixel;
            }
        }
    }
}
