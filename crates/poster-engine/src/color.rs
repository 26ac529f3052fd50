//! Color name resolution.
//!
//! Anything `csscolorparser` understands is accepted: the CSS named colors
//! (case-insensitive), `#rgb` / `#rrggbb` hex and the functional notations.
//! The alpha channel is dropped; posters are opaque.

use image::{Rgb, Rgba};

use crate::error::{EngineError, Result};

/// Resolve a color name or hex code to an RGB triple.
pub fn resolve_color(name: &str) -> Result<Rgb<u8>> {
    let color = csscolorparser::parse(name.trim())
        .map_err(|_| EngineError::UnknownColorName(name.to_string()))?;
    let [r, g, b, _] = color.to_rgba8();
    Ok(Rgb([r, g, b]))
}

/// Opaque RGBA version of an RGB color.
pub fn opaque(color: Rgb<u8>) -> Rgba<u8> {
    Rgba([color[0], color[1], color[2], 255])
}
