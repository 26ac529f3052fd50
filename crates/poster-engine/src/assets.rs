//! Logo decoding.
//!
//! Raster formats go through `image`; `.svg` files are parsed with `usvg`
//! and rasterized with `resvg` before anything else touches them.

use std::path::Path;

use image::{DynamicImage, RgbaImage};
use tracing::debug;

use crate::error::{EngineError, Result};
use crate::resize::fit_within;

/// SVGs smaller than this are rasterized at a larger scale so later
/// downscaling has enough detail.
const SVG_MIN_RASTER_SIDE: f32 = 512.0;

/// A decoded logo.
#[derive(Debug, Clone)]
pub struct Logo {
    pub image: RgbaImage,
    /// Whether the source carried an alpha channel.
    pub has_alpha: bool,
}

impl Logo {
    pub fn from_dynamic(img: DynamicImage) -> Self {
        let has_alpha = img.color().has_alpha();
        Self {
            image: img.into_rgba8(),
            has_alpha,
        }
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    /// Copy resized so the larger side equals `max_size`.
    pub fn fitted(&self, max_size: u32) -> Self {
        Self {
            image: fit_within(&self.image, max_size),
            has_alpha: self.has_alpha,
        }
    }
}

/// Decode one logo at its natural size.
pub fn load_logo(path: &Path) -> Result<Logo> {
    let is_svg = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("svg"));

    let logo = if is_svg {
        let data = std::fs::read(path).map_err(|e| EngineError::asset(path, e))?;
        rasterize_svg(&data, path.parent()).map_err(|reason| EngineError::asset(path, reason))?
    } else {
        let img = image::open(path).map_err(|e| EngineError::asset(path, e))?;
        Logo::from_dynamic(img)
    };

    debug!(
        path = %path.display(),
        width = logo.width(),
        height = logo.height(),
        has_alpha = logo.has_alpha,
        "Loaded logo"
    );
    Ok(logo)
}

/// Decode every path and fit each so its larger side equals `max_size`.
///
/// Stops at the first failure.
pub fn load_logos<P: AsRef<Path>>(paths: &[P], max_size: u32) -> Result<Vec<Logo>> {
    paths
        .iter()
        .map(|p| load_logo(p.as_ref()).map(|logo| logo.fitted(max_size)))
        .collect()
}

/// Like [`load_logos`], but keeps going past failures and returns them alongside.
pub fn load_logos_lossy<P: AsRef<Path>>(
    paths: &[P],
    max_size: u32,
) -> (Vec<Logo>, Vec<EngineError>) {
    let mut logos = Vec::with_capacity(paths.len());
    let mut errors = Vec::new();
    for path in paths {
        match load_logo(path.as_ref()) {
            Ok(logo) => logos.push(logo.fitted(max_size)),
            Err(e) => errors.push(e),
        }
    }
    (logos, errors)
}

/// Rasterize SVG bytes into a logo. Relative references resolve against `resources_dir`.
pub fn rasterize_svg(
    data: &[u8],
    resources_dir: Option<&Path>,
) -> std::result::Result<Logo, String> {
    let mut opts = usvg::Options {
        resources_dir: resources_dir.map(Path::to_path_buf),
        ..Default::default()
    };
    opts.fontdb_mut().load_system_fonts();

    let tree = usvg::Tree::from_data(data, &opts).map_err(|e| format!("parse svg: {e}"))?;

    let size = tree.size();
    let (w, h) = (size.width(), size.height());
    if !w.is_finite() || !h.is_finite() || w <= 0.0 || h <= 0.0 {
        return Err("svg has invalid width/height".to_string());
    }
    let scale = (SVG_MIN_RASTER_SIDE / w.max(h)).max(1.0);
    let width = (w * scale).ceil().max(1.0) as u32;
    let height = (h * scale).ceil().max(1.0) as u32;

    let mut pixmap = resvg::tiny_skia::Pixmap::new(width, height)
        .ok_or_else(|| "failed to allocate svg pixmap".to_string())?;
    let xform = resvg::tiny_skia::Transform::from_scale(
        width as f32 / w,
        height as f32 / h,
    );
    resvg::render(&tree, xform, &mut pixmap.as_mut());

    let mut rgba = pixmap.take();
    demultiply_rgba8_in_place(&mut rgba);
    let image = RgbaImage::from_raw(width, height, rgba)
        .ok_or_else(|| "svg pixmap size mismatch".to_string())?;

    Ok(Logo {
        image,
        has_alpha: true,
    })
}

fn demultiply_rgba8_in_place(rgba: &mut [u8]) {
    for px in rgba.chunks_exact_mut(4) {
        let a = u16::from(px[3]);
        if a == 0 || a == 255 {
            continue;
        }
        for c in &mut px[..3] {
            *c = ((u16::from(*c) * 255 + a / 2) / a).min(255) as u8;
        }
    }
}
