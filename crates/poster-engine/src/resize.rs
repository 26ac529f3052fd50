//! Lanczos3 rescaling for QR symbols and logos.

use image::RgbaImage;
use image::imageops::{self, FilterType};
use tracing::debug;

/// Scale a rendered QR symbol so its width is exactly `resolution`.
pub fn scale_to_resolution(qr: &RgbaImage, resolution: u32) -> RgbaImage {
    let (width, height) = proportional(qr.dimensions(), Side::Width, resolution);
    rescale(qr, width, height)
}

/// Scale a logo so its larger side equals `max_side`.
pub fn fit_within(img: &RgbaImage, max_side: u32) -> RgbaImage {
    let side = if img.width() >= img.height() {
        Side::Width
    } else {
        Side::Height
    };
    let (width, height) = proportional(img.dimensions(), side, max_side);
    rescale(img, width, height)
}

#[derive(Clone, Copy)]
enum Side {
    Width,
    Height,
}

/// Target size with `side` set to `target` and the other side following
/// the aspect ratio. Neither side drops below one pixel.
fn proportional((w, h): (u32, u32), side: Side, target: u32) -> (u32, u32) {
    let target = target.max(1);
    let follow = |along: u32, across: u32| {
        let ratio = f64::from(target) / f64::from(along.max(1));
        ((f64::from(across) * ratio).round() as u32).max(1)
    };
    match side {
        Side::Width => (target, follow(w, h)),
        Side::Height => (follow(h, w), target),
    }
}

fn rescale(img: &RgbaImage, width: u32, height: u32) -> RgbaImage {
    let (from_w, from_h) = img.dimensions();
    if (from_w, from_h) == (width, height) {
        return img.clone();
    }
    debug!(from_w, from_h, width, height, "Rescaling");
    imageops::resize(img, width, height, FilterType::Lanczos3)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::qr::{BOX_SIZE, QUIET_ZONE};
    use image::Rgba;

    fn gray(width: u32, height: u32) -> RgbaImage {
        RgbaImage::from_pixel(width, height, Rgba([128, 128, 128, 255]))
    }

    #[test]
    fn symbols_land_on_the_exact_resolution() {
        // Version 1: 21 modules plus the quiet zone on both sides.
        let side = (21 + 2 * QUIET_ZONE) * BOX_SIZE;
        for resolution in [300, 1080, 77, 1] {
            let scaled = scale_to_resolution(&gray(side, side), resolution);
            assert_eq!(scaled.dimensions(), (resolution, resolution));
        }
    }

    #[test]
    fn matching_resolution_is_a_copy() {
        let img = gray(290, 290);
        assert_eq!(scale_to_resolution(&img, 290), img);
    }

    #[test]
    fn logos_fit_by_their_larger_side() {
        assert_eq!(fit_within(&gray(200, 100), 50).dimensions(), (50, 25));
        assert_eq!(fit_within(&gray(100, 200), 50).dimensions(), (25, 50));
        assert_eq!(fit_within(&gray(10, 10), 50).dimensions(), (50, 50));
    }

    #[test]
    fn thin_logos_keep_at_least_one_pixel() {
        assert_eq!(fit_within(&gray(1000, 1), 10).dimensions(), (10, 1));
        assert_eq!(fit_within(&gray(1, 1000), 10).dimensions(), (1, 10));
    }

    #[test]
    fn zero_target_is_treated_as_one_pixel() {
        assert_eq!(fit_within(&gray(40, 20), 0).dimensions(), (1, 1));
    }
}
