//! Center logo compositing: trim, square, resize, border, mask, paste.

use image::imageops::{self, FilterType};
use image::{Rgb, Rgba, RgbaImage};
use tracing::debug;

use crate::assets::Logo;
use crate::color::opaque;
use crate::compose::{overlay, overlay_centered};

/// How the center logo is embedded.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CenterLogoOptions {
    /// Logo side as a fraction of the QR's shorter side.
    pub size_ratio: f32,
    pub circular: bool,
    /// Border width as a fraction of the resized logo side.
    pub border_ratio: f32,
    pub border_color: Rgb<u8>,
}

impl Default for CenterLogoOptions {
    fn default() -> Self {
        Self {
            size_ratio: 0.2,
            circular: false,
            border_ratio: 0.0,
            border_color: Rgb([255, 255, 255]),
        }
    }
}

/// Inclusive-exclusive pixel rectangle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Bounds {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

/// Embed `logo` in the middle of `qr` and return the result.
pub fn add_center_logo(qr: &RgbaImage, logo: &Logo, opts: &CenterLogoOptions) -> RgbaImage {
    let squared = trim(logo);

    let qr_side = qr.width().min(qr.height());
    let target = (qr_side as f32 * opts.size_ratio).floor() as u32;
    let side = target.max(1);
    let resized = imageops::resize(&squared, side, side, FilterType::Lanczos3);

    let border = border_width(side, opts.border_ratio, qr_side);
    let mut badge = add_border(&resized, border, opts.border_color);
    if opts.circular {
        apply_circular_mask(&mut badge);
    }

    debug!(
        side,
        border,
        badge = badge.width(),
        circular = opts.circular,
        "Embedding center logo"
    );

    let mut out = qr.clone();
    overlay_centered(&mut out, &badge);
    out
}

/// Border width `floor(side × ratio)`, capped at `max`.
fn border_width(side: u32, ratio: f32, max: u32) -> u32 {
    let border = (f64::from(side) * f64::from(ratio)).floor().max(0.0);
    border.min(f64::from(max)) as u32
}

/// Bounding box of the logo's visible content.
///
/// Alpha logos use non-transparent pixels; opaque logos use pixels that
/// differ from the top-left corner. No content means the full image.
pub fn content_bounds(logo: &Logo) -> Bounds {
    let img = &logo.image;
    let full = Bounds {
        x: 0,
        y: 0,
        width: img.width(),
        height: img.height(),
    };
    if img.width() == 0 || img.height() == 0 {
        return full;
    }

    let corner = *img.get_pixel(0, 0);
    let is_content = |p: &Rgba<u8>| {
        if logo.has_alpha {
            p[3] > 0
        } else {
            p[0] != corner[0] || p[1] != corner[1] || p[2] != corner[2]
        }
    };

    let mut extent: Option<(u32, u32, u32, u32)> = None;
    for (x, y, p) in img.enumerate_pixels() {
        if !is_content(p) {
            continue;
        }
        extent = Some(match extent {
            None => (x, y, x, y),
            Some((x0, y0, x1, y1)) => (x0.min(x), y0.min(y), x1.max(x), y1.max(y)),
        });
    }

    match extent {
        Some((x0, y0, x1, y1)) => Bounds {
            x: x0,
            y: y0,
            width: x1 - x0 + 1,
            height: y1 - y0 + 1,
        },
        None => full,
    }
}

/// Crop to content and pad to a centered square.
///
/// Padding is transparent for alpha logos and the corner color otherwise.
pub fn trim(logo: &Logo) -> RgbaImage {
    let b = content_bounds(logo);
    let cropped = imageops::crop_imm(&logo.image, b.x, b.y, b.width, b.height).to_image();

    let side = b.width.max(b.height).max(1);
    let fill = if logo.has_alpha {
        Rgba([0, 0, 0, 0])
    } else {
        logo.image
            .get_pixel_checked(0, 0)
            .copied()
            .unwrap_or(Rgba([255, 255, 255, 255]))
    };

    let mut square = RgbaImage::from_pixel(side, side, fill);
    let x = i64::from((side - b.width) / 2);
    let y = i64::from((side - b.height) / 2);
    imageops::replace(&mut square, &cropped, x, y);
    square
}

/// Surround `img` with `border` pixels of `color`, pasting it with alpha.
pub fn add_border(img: &RgbaImage, border: u32, color: Rgb<u8>) -> RgbaImage {
    let pad = border.saturating_mul(2);
    let mut out = RgbaImage::from_pixel(
        img.width().saturating_add(pad),
        img.height().saturating_add(pad),
        opaque(color),
    );
    overlay(&mut out, img, i64::from(border), i64::from(border));
    out
}

/// Clear every pixel whose center lies outside the inscribed circle.
pub fn apply_circular_mask(img: &mut RgbaImage) {
    let (w, h) = (img.width() as f32, img.height() as f32);
    let (cx, cy) = (w / 2.0, h / 2.0);
    let radius = w.min(h) / 2.0;

    for (x, y, p) in img.enumerate_pixels_mut() {
        let dx = x as f32 + 0.5 - cx;
        let dy = y as f32 + 0.5 - cy;
        if dx * dx + dy * dy > radius * radius {
            p[3] = 0;
        }
    }
}
