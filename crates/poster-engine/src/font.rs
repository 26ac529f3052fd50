//! Title font loading and text measurement.
//!
//! Font bytes are read once per run by [`FontLoader`]; every size request
//! produces a cheap [`TitleFont`] handle. When no font file is usable the
//! loader degrades to the DejaVu Sans face compiled into the crate instead
//! of failing.

use std::fmt;
use std::path::{Path, PathBuf};

use ab_glyph::{Font, FontArc, PxScale, ScaleFont, point};
use image::{Rgba, RgbaImage};
use imageproc::drawing::draw_text_mut;
use tracing::{debug, info, warn};

use crate::error::{EngineError, Result};

static BUNDLED_FONT: &[u8] = include_bytes!("../assets/fonts/DejaVuSans.ttf");

/// Inked bounding box of a line, relative to the line origin.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InkBox {
    pub left: i32,
    pub top: i32,
    pub width: u32,
    pub height: u32,
}

/// A font at a fixed pixel size.
#[derive(Clone)]
pub struct TitleFont {
    face: FontArc,
    size: u32,
}

impl fmt::Debug for TitleFont {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TitleFont").field("size", &self.size).finish()
    }
}

impl TitleFont {
    /// Pixel size this font was loaded at.
    pub fn size(&self) -> u32 {
        self.size
    }

    fn scale(&self) -> PxScale {
        PxScale::from(self.size as f32)
    }

    /// Measure the inked area of `text`. Whitespace-only text measures as empty.
    pub fn ink_box(&self, text: &str) -> InkBox {
        let scale = self.scale();
        let scaled = self.face.as_scaled(scale);

        // Same caret walk as `draw_text_mut`, so measured and drawn ink agree.
        let mut caret = 0.0f32;
        let mut prev = None;
        let mut bounds: Option<(f32, f32, f32, f32)> = None;

        for ch in text.chars() {
            let id = scaled.glyph_id(ch);
            let glyph = id.with_scale_and_position(scale, point(caret, scaled.ascent()));
            caret += scaled.h_advance(id);

            if let Some(outlined) = scaled.outline_glyph(glyph) {
                if let Some(prev) = prev {
                    caret += scaled.kern(id, prev);
                }
                prev = Some(id);
                let b = outlined.px_bounds();
                bounds = Some(match bounds {
                    None => (b.min.x, b.min.y, b.max.x, b.max.y),
                    Some((x0, y0, x1, y1)) => {
                        (x0.min(b.min.x), y0.min(b.min.y), x1.max(b.max.x), y1.max(b.max.y))
                    }
                });
            }
        }

        match bounds {
            Some((x0, y0, x1, y1)) => InkBox {
                left: x0.floor() as i32,
                top: y0.floor() as i32,
                width: (x1 - x0).ceil().max(0.0) as u32,
                height: (y1 - y0).ceil().max(0.0) as u32,
            },
            None => InkBox::default(),
        }
    }

    /// Rendered height of a single line.
    pub fn line_height(&self, text: &str) -> u32 {
        self.ink_box(text).height
    }

    /// Draw `text` so that its inked area starts at `(x, y)`.
    pub fn draw(&self, img: &mut RgbaImage, x: i32, y: i32, text: &str, color: Rgba<u8>) {
        let ink = self.ink_box(text);
        if ink.width == 0 || ink.height == 0 {
            return;
        }
        draw_text_mut(
            img,
            color,
            x - ink.left,
            y - ink.top,
            self.scale(),
            &self.face,
            text,
        );
    }
}

/// Loads the title font face once and hands out sized fonts.
#[derive(Clone)]
pub struct FontLoader {
    face: FontArc,
    source: Option<PathBuf>,
}

impl fmt::Debug for FontLoader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FontLoader")
            .field("source", &self.source)
            .finish()
    }
}

impl FontLoader {
    /// Try `preferred` first, then the platform's usual sans-serif fonts.
    ///
    /// Never fails: when nothing loads, the bundled face is used and a
    /// warning is logged.
    pub fn new(preferred: Option<&Path>) -> Self {
        let candidates = preferred
            .map(Path::to_path_buf)
            .into_iter()
            .chain(system_font_candidates().iter().map(PathBuf::from));

        for path in candidates {
            match read_face(&path) {
                Ok(face) => {
                    info!(path = %path.display(), "Using title font");
                    return Self {
                        face,
                        source: Some(path),
                    };
                }
                Err(e) => debug!("Skipping font candidate: {e}"),
            }
        }

        warn!("No usable title font found, falling back to the bundled DejaVu Sans");
        Self::bundled()
    }

    /// Loader over the DejaVu Sans face compiled into the crate.
    pub fn bundled() -> Self {
        let face = FontArc::try_from_slice(BUNDLED_FONT).expect("bundled DejaVuSans.ttf parses");
        Self { face, source: None }
    }

    /// Font at `round(size * scale_factor)` pixels (at least 1).
    pub fn load(&self, size: f32, scale_factor: f32) -> TitleFont {
        let px = (size * scale_factor).round().max(1.0) as u32;
        self.at_px(px)
    }

    /// Font at exactly `px` pixels (at least 1).
    pub fn at_px(&self, px: u32) -> TitleFont {
        TitleFont {
            face: self.face.clone(),
            size: px.max(1),
        }
    }

    /// Path of the loaded font file; `None` for the bundled face.
    pub fn source(&self) -> Option<&Path> {
        self.source.as_deref()
    }
}

fn read_face(path: &Path) -> Result<FontArc> {
    let data = std::fs::read(path).map_err(|e| EngineError::asset(path, e))?;
    FontArc::try_from_vec(data)
        .map_err(|_| EngineError::asset(path, "invalid font data (TTF/OTF expected)"))
}

fn system_font_candidates() -> &'static [&'static str] {
    #[cfg(target_os = "macos")]
    {
        &[
            "/Library/Fonts/DejaVuSans.ttf",
            "/System/Library/Fonts/Supplemental/Arial.ttf",
            "/System/Library/Fonts/Supplemental/Verdana.ttf",
            "/Library/Fonts/Arial.ttf",
        ]
    }
    #[cfg(target_os = "windows")]
    {
        &[
            "C:\\Windows\\Fonts\\DejaVuSans.ttf",
            "C:\\Windows\\Fonts\\arial.ttf",
            "C:\\Windows\\Fonts\\segoeui.ttf",
        ]
    }
    #[cfg(not(any(target_os = "macos", target_os = "windows")))]
    {
        &[
            "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
            "/usr/share/fonts/TTF/DejaVuSans.ttf",
            "/usr/share/fonts/dejavu/DejaVuSans.ttf",
            "/usr/share/fonts/dejavu-sans-fonts/DejaVuSans.ttf",
            "/usr/share/fonts/truetype/liberation/LiberationSans-Regular.ttf",
            "/usr/share/fonts/noto/NotoSans-Regular.ttf",
        ]
    }
}
