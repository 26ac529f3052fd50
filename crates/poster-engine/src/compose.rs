//! Image composition: alpha overlay and centering.

use image::{Rgba, RgbaImage};

/// Overlay `top` onto `base` with its top-left corner at `(x, y)`.
///
/// Uses source-over alpha compositing; parts of `top` falling outside
/// `base` are clipped.
pub fn overlay(base: &mut RgbaImage, top: &RgbaImage, x: i64, y: i64) {
    let (base_w, base_h) = (i64::from(base.width()), i64::from(base.height()));

    for (dx, dy, pixel) in top.enumerate_pixels() {
        let target_x = x + i64::from(dx);
        let target_y = y + i64::from(dy);
        if target_x < 0 || target_y < 0 || target_x >= base_w || target_y >= base_h {
            continue;
        }

        let alpha = pixel[3];
        if alpha == 0 {
            continue;
        }
        let (tx, ty) = (target_x as u32, target_y as u32);
        if alpha == 255 {
            base.put_pixel(tx, ty, *pixel);
        } else {
            let bg = *base.get_pixel(tx, ty);
            base.put_pixel(tx, ty, blend_pixel(&bg, pixel));
        }
    }
}

/// Offset that centers a span of `inner` inside a span of `outer`.
pub fn center_offset(outer: u32, inner: u32) -> i64 {
    (i64::from(outer) - i64::from(inner)) / 2
}

/// Overlay `top` centered on `base`.
pub fn overlay_centered(base: &mut RgbaImage, top: &RgbaImage) {
    let x = center_offset(base.width(), top.width());
    let y = center_offset(base.height(), top.height());
    overlay(base, top, x, y);
}

fn blend_pixel(bg: &Rgba<u8>, fg: &Rgba<u8>) -> Rgba<u8> {
    let fa = f32::from(fg[3]) / 255.0;
    let ba = f32::from(bg[3]) / 255.0;
    let out_a = fa + ba * (1.0 - fa);
    if out_a <= f32::EPSILON {
        return Rgba([0, 0, 0, 0]);
    }

    let channel = |i: usize| {
        let c = (f32::from(fg[i]) * fa + f32::from(bg[i]) * ba * (1.0 - fa)) / out_a;
        c.round().clamp(0.0, 255.0) as u8
    };
    Rgba([
        channel(0),
        channel(1),
        channel(2),
        (out_a * 255.0).round() as u8,
    ])
}
