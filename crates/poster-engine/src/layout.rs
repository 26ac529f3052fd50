//! Canvas layout: constants, band sizes, logo strip and title placement.
//!
//! Bands from the top of the canvas: logo strip, spacing, title, QR.

use image::{Rgb, RgbaImage};
use serde::Serialize;
use tracing::debug;

use crate::assets::Logo;
use crate::color::opaque;
use crate::compose::{center_offset, overlay};
use crate::font::FontLoader;
use crate::text::{FitBox, TextLayout, TitleFit, wrap_text};

/// Unscaled layout measurements, in pixels at scale 1.0.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LayoutConstants {
    /// Horizontal margin on each side of the title box.
    pub margin: u32,
    pub max_title_height: u32,
    /// Gap between the logo strip and the title.
    pub spacing: u32,
    pub logo_strip_height: u32,
    /// Horizontal gap between strip logos.
    pub logo_gap: u32,
    pub base_font_size: u32,
    pub min_font_size: u32,
}

impl Default for LayoutConstants {
    fn default() -> Self {
        Self {
            margin: 50,
            max_title_height: 120,
            spacing: 5,
            logo_strip_height: 50,
            logo_gap: 10,
            base_font_size: 36,
            min_font_size: 8,
        }
    }
}

impl LayoutConstants {
    /// Largest side of a strip logo at `logo_scale`.
    pub fn logo_max_size(&self, logo_scale: f32) -> u32 {
        scale_px(self.logo_strip_height, logo_scale)
    }

    pub fn logo_gap(&self, logo_scale: f32) -> u32 {
        scale_px(self.logo_gap, logo_scale)
    }
}

/// Layout measurements after applying the text scale factor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Dimensions {
    pub margin: u32,
    pub max_title_height: u32,
    pub spacing: u32,
    pub logo_strip_height: u32,
}

impl Dimensions {
    pub fn scaled(constants: &LayoutConstants, scale: f32) -> Self {
        Self {
            margin: scale_px(constants.margin, scale),
            max_title_height: scale_px(constants.max_title_height, scale),
            spacing: scale_px(constants.spacing, scale),
            logo_strip_height: scale_px(constants.logo_strip_height, scale),
        }
    }
}

/// Default-constant dimensions at `scale_factor`.
pub fn compute_dimensions(scale_factor: f32) -> Dimensions {
    Dimensions::scaled(&LayoutConstants::default(), scale_factor)
}

fn scale_px(value: u32, scale: f32) -> u32 {
    (value as f32 * scale).floor().max(0.0) as u32
}

/// An allocated canvas and the band heights it was sized with.
#[derive(Debug)]
pub struct CanvasPlan {
    pub canvas: RgbaImage,
    pub title: TitleFit,
    pub title_height: u32,
    pub logo_strip_height: u32,
    pub spacing: u32,
}

impl CanvasPlan {
    pub fn title_top(&self) -> u32 {
        self.logo_strip_height + self.spacing
    }

    pub fn qr_top(&self) -> u32 {
        self.title_top() + self.title_height
    }
}

/// The title could not be fitted above the minimum font size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TitleUnfittable {
    pub last_size: u32,
}

/// Sizes canvases for one run.
#[derive(Debug, Clone)]
pub struct LayoutEngine<'a> {
    constants: LayoutConstants,
    dims: Dimensions,
    text_scale: f32,
    fonts: &'a FontLoader,
}

impl<'a> LayoutEngine<'a> {
    pub fn new(constants: LayoutConstants, text_scale: f32, fonts: &'a FontLoader) -> Self {
        Self {
            dims: Dimensions::scaled(&constants, text_scale),
            constants,
            text_scale,
            fonts,
        }
    }

    /// Band sizes at this engine's text scale.
    pub fn dimensions(&self) -> &Dimensions {
        &self.dims
    }

    pub fn constants(&self) -> &LayoutConstants {
        &self.constants
    }

    /// Fit `title` into the caption box for a QR image of width `qr_width`.
    pub fn fit_title(&self, title: &str, qr_width: u32) -> TitleFit {
        let bounds = FitBox {
            max_width: qr_width.saturating_sub(2 * self.dims.margin),
            max_height: self.dims.max_title_height,
            min_font_size: scale_px(self.constants.min_font_size, self.text_scale),
        };
        let start = self
            .fonts
            .load(self.constants.base_font_size as f32, self.text_scale);
        wrap_text(title, start, self.fonts, bounds)
    }

    /// Fit the title and allocate a background-filled canvas around `qr`.
    ///
    /// `strip_height` is the logo band height actually used.
    pub fn build_canvas(
        &self,
        qr: &RgbaImage,
        title: &str,
        strip_height: u32,
        background: Rgb<u8>,
    ) -> Result<CanvasPlan, TitleUnfittable> {
        let fit = self.fit_title(title, qr.width());
        if let TitleFit::GaveUp { last_size } = fit {
            return Err(TitleUnfittable { last_size });
        }

        let title_height = fit.height();
        let height = qr.height() + title_height + self.dims.spacing + strip_height;
        debug!(
            width = qr.width(),
            height,
            title_height,
            strip_height,
            spacing = self.dims.spacing,
            "Allocating canvas"
        );

        Ok(CanvasPlan {
            canvas: RgbaImage::from_pixel(qr.width(), height, opaque(background)),
            title: fit,
            title_height,
            logo_strip_height: strip_height,
            spacing: self.dims.spacing,
        })
    }
}

/// Height of the logo band: the scaled constant, grown to fit the tallest logo.
pub fn strip_band_height(dims: &Dimensions, logos: &[Logo]) -> u32 {
    logos
        .iter()
        .map(Logo::height)
        .fold(dims.logo_strip_height, u32::max)
}

/// Paste `logos` left to right, centered as a group, each centered vertically in the band.
pub fn arrange_logo_strip(canvas: &mut RgbaImage, logos: &[Logo], strip_height: u32, gap: u32) {
    if logos.is_empty() {
        return;
    }

    let total: u64 = logos.iter().map(|l| u64::from(l.width())).sum::<u64>()
        + u64::from(gap) * (logos.len() as u64 - 1);
    let mut x = (i64::from(canvas.width()) - total as i64) / 2;

    for logo in logos {
        let y = center_offset(strip_height, logo.height());
        overlay(canvas, &logo.image, x, y);
        x += i64::from(logo.width()) + i64::from(gap);
    }
}

/// Draw each line horizontally centered, starting at `top`.
pub fn draw_title(canvas: &mut RgbaImage, layout: &TextLayout, top: u32, color: Rgb<u8>) {
    let color = opaque(color);
    let mut y = i64::from(top);
    for line in &layout.lines {
        let ink = layout.font.ink_box(line);
        let x = center_offset(canvas.width(), ink.width);
        layout.font.draw(canvas, x as i32, y as i32, line, color);
        y += i64::from(ink.height);
    }
}
