//! QR symbol encoding and rasterization.
//!
//! Encoding is hidden behind [`SymbolEncoder`] so the pipeline can be driven
//! by any module-grid source. [`render_symbol`] turns a grid into pixels at
//! [`BOX_SIZE`] pixels per module with a [`QUIET_ZONE`] border.

use image::{Rgb, RgbaImage};
use qrcode::types::QrError;
use qrcode::{Color, EcLevel, QrCode, Version};
use serde::{Deserialize, Serialize};

use crate::color::opaque;
use crate::error::{EngineError, Result};

/// Pixels per module before resizing.
pub const BOX_SIZE: u32 = 10;

/// Light modules around the symbol on every side.
pub const QUIET_ZONE: u32 = 4;

/// Highest QR version.
pub const MAX_VERSION: u8 = 40;

/// Square grid of modules, row-major, `true` = dark.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleGrid {
    width: usize,
    modules: Vec<bool>,
}

impl ModuleGrid {
    /// Build a grid; `modules.len()` must be `width * width`.
    pub fn new(width: usize, modules: Vec<bool>) -> Result<Self> {
        if width == 0 || modules.len() != width * width {
            return Err(EngineError::invalid(format!(
                "module grid of width {width} needs {} modules, got {}",
                width * width,
                modules.len()
            )));
        }
        Ok(Self { width, modules })
    }

    /// Modules per side.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Whether the module at `(x, y)` is dark. Out-of-range coordinates are light.
    pub fn is_dark(&self, x: i64, y: i64) -> bool {
        let w = self.width as i64;
        if x < 0 || y < 0 || x >= w || y >= w {
            return false;
        }
        self.modules[(y * w + x) as usize]
    }
}

/// Produces the module grid for a payload at an exact QR version.
pub trait SymbolEncoder {
    /// Fails with [`EngineError::EncodingCapacityExceeded`] when the payload
    /// does not fit `version`.
    fn encode(&self, data: &[u8], version: u8) -> Result<ModuleGrid>;
}

/// Error-correction level.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorCorrection {
    L,
    #[default]
    M,
    Q,
    H,
}

impl From<ErrorCorrection> for EcLevel {
    fn from(ec: ErrorCorrection) -> Self {
        match ec {
            ErrorCorrection::L => EcLevel::L,
            ErrorCorrection::M => EcLevel::M,
            ErrorCorrection::Q => EcLevel::Q,
            ErrorCorrection::H => EcLevel::H,
        }
    }
}

/// [`SymbolEncoder`] backed by the `qrcode` crate.
#[derive(Debug, Clone, Copy, Default)]
pub struct QrcodeEncoder {
    pub ec_level: ErrorCorrection,
}

impl QrcodeEncoder {
    pub fn new(ec_level: ErrorCorrection) -> Self {
        Self { ec_level }
    }
}

impl SymbolEncoder for QrcodeEncoder {
    fn encode(&self, data: &[u8], version: u8) -> Result<ModuleGrid> {
        if version == 0 || version > MAX_VERSION {
            return Err(EngineError::Encoding {
                version,
                reason: format!("version must be between 1 and {MAX_VERSION}"),
            });
        }

        let code = QrCode::with_version(data, Version::Normal(i16::from(version)), self.ec_level.into())
            .map_err(|e| match e {
                QrError::DataTooLong => EngineError::EncodingCapacityExceeded { version },
                other => EngineError::Encoding {
                    version,
                    reason: other.to_string(),
                },
            })?;

        let modules = code.to_colors().into_iter().map(|c| c == Color::Dark).collect();
        ModuleGrid::new(code.width(), modules)
    }
}

/// Shape of dark modules.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModuleStyle {
    #[default]
    Square,
    /// Corners with no dark neighbor on either adjacent side are rounded off.
    Rounded,
}

/// Colors and shape used to rasterize a symbol.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SymbolStyle {
    pub module_style: ModuleStyle,
    pub foreground: Rgb<u8>,
    pub background: Rgb<u8>,
}

/// Rasterize `grid` at [`BOX_SIZE`] pixels per module, quiet zone included.
pub fn render_symbol(grid: &ModuleGrid, style: &SymbolStyle) -> RgbaImage {
    let modules = grid.width() as u32 + 2 * QUIET_ZONE;
    let side = modules * BOX_SIZE;
    let fg = opaque(style.foreground);
    let mut img = RgbaImage::from_pixel(side, side, opaque(style.background));

    let half = BOX_SIZE as f32 / 2.0;
    for my in 0..grid.width() as i64 {
        for mx in 0..grid.width() as i64 {
            if !grid.is_dark(mx, my) {
                continue;
            }

            // Per quadrant: round when both adjacent orthogonal neighbors are light.
            let up = grid.is_dark(mx, my - 1);
            let down = grid.is_dark(mx, my + 1);
            let left = grid.is_dark(mx - 1, my);
            let right = grid.is_dark(mx + 1, my);
            let rounded = style.module_style == ModuleStyle::Rounded;
            let round_tl = rounded && !up && !left;
            let round_tr = rounded && !up && !right;
            let round_bl = rounded && !down && !left;
            let round_br = rounded && !down && !right;

            let x0 = (mx as u32 + QUIET_ZONE) * BOX_SIZE;
            let y0 = (my as u32 + QUIET_ZONE) * BOX_SIZE;
            for dy in 0..BOX_SIZE {
                for dx in 0..BOX_SIZE {
                    let px = dx as f32 + 0.5 - half;
                    let py = dy as f32 + 0.5 - half;
                    let carve = match (px < 0.0, py < 0.0) {
                        (true, true) => round_tl,
                        (false, true) => round_tr,
                        (true, false) => round_bl,
                        (false, false) => round_br,
                    };
                    if carve && px * px + py * py > half * half {
                        continue;
                    }
                    img.put_pixel(x0 + dx, y0 + dy, fg);
                }
            }
        }
    }
    img
}
