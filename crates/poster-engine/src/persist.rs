//! Artifact naming and persistence.

use std::path::{Path, PathBuf};

use image::{DynamicImage, ImageError, ImageFormat, RgbaImage};
use tracing::{debug, info};

use crate::error::{EngineError, Result};

/// Receives finished canvases.
pub trait ArtifactSink {
    /// Store the canvas for `version` and return where it went.
    ///
    /// Must report [`EngineError::UnsupportedOutputFormat`] separately from
    /// I/O failures.
    fn persist(&mut self, canvas: &RgbaImage, version: u8) -> Result<PathBuf>;
}

/// Output directory and file naming derived from the requested output path.
///
/// `out/poster.png` with format `jpg` writes `out/poster/poster_v3.jpg` for version 3.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputLayout {
    pub dir: PathBuf,
    pub stem: String,
    pub format: String,
}

impl OutputLayout {
    pub fn from_output_path(output: &Path, format: &str) -> Self {
        let stem = output
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| "qrcode".to_string());
        Self {
            dir: output.with_extension(""),
            stem,
            format: format.to_string(),
        }
    }

    pub fn versioned_file_name(&self, version: u8) -> String {
        format!("{}_v{}.{}", self.stem, version, self.format)
    }

    pub fn path_for(&self, version: u8) -> PathBuf {
        self.dir.join(self.versioned_file_name(version))
    }
}

/// Writes canvases as image files under an [`OutputLayout`].
#[derive(Debug, Clone)]
pub struct FileSink {
    layout: OutputLayout,
}

impl FileSink {
    pub fn new(layout: OutputLayout) -> Self {
        Self { layout }
    }

    pub fn layout(&self) -> &OutputLayout {
        &self.layout
    }

    fn image_format(&self) -> Result<ImageFormat> {
        ImageFormat::from_extension(&self.layout.format)
            .filter(ImageFormat::writing_enabled)
            .ok_or_else(|| EngineError::UnsupportedOutputFormat(self.layout.format.clone()))
    }
}

impl ArtifactSink for FileSink {
    fn persist(&mut self, canvas: &RgbaImage, version: u8) -> Result<PathBuf> {
        let format = self.image_format()?;

        std::fs::create_dir_all(&self.layout.dir)?;
        let path = self.layout.path_for(version);

        // Canvases are opaque; RGB output keeps formats without alpha happy.
        let rgb = DynamicImage::ImageRgba8(canvas.clone()).into_rgb8();
        debug!(path = %path.display(), ?format, "Writing artifact");

        if let Err(e) = rgb.save_with_format(&path, format) {
            std::fs::remove_file(&path).ok();
            return Err(match e {
                ImageError::Unsupported(_) => {
                    EngineError::UnsupportedOutputFormat(self.layout.format.clone())
                }
                ImageError::IoError(io) => EngineError::Io(io),
                other => EngineError::Image(other),
            });
        }

        info!(version, path = %path.display(), "Saved QR poster");
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::temp_dir;
    use image::Rgba;

    #[test]
    fn layout_splits_output_path() {
        let layout = OutputLayout::from_output_path(Path::new("out/poster.png"), "jpg");
        assert_eq!(layout.dir, PathBuf::from("out/poster"));
        assert_eq!(layout.versioned_file_name(3), "poster_v3.jpg");
        assert_eq!(layout.path_for(12), PathBuf::from("out/poster/poster_v12.jpg"));
    }

    #[test]
    fn layout_without_extension_uses_same_dir_name() {
        let layout = OutputLayout::from_output_path(Path::new("poster"), "png");
        assert_eq!(layout.dir, PathBuf::from("poster"));
        assert_eq!(layout.path_for(1), PathBuf::from("poster/poster_v1.png"));
    }

    #[test]
    fn file_sink_writes_decodable_images() {
        let root = temp_dir("persist_png");
        let layout = OutputLayout::from_output_path(&root.join("qrcode.png"), "png");
        let mut sink = FileSink::new(layout);

        let canvas = RgbaImage::from_pixel(30, 40, Rgba([10, 20, 30, 255]));
        let path = sink.persist(&canvas, 2).unwrap();
        assert_eq!(path, root.join("qrcode").join("qrcode_v2.png"));

        let decoded = image::open(&path).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (30, 40));
        assert_eq!(decoded.to_rgb8().get_pixel(0, 0).0, [10, 20, 30]);
        std::fs::remove_dir_all(root).ok();
    }

    #[test]
    fn jpeg_output_is_supported() {
        let root = temp_dir("persist_jpg");
        let mut sink = FileSink::new(OutputLayout::from_output_path(&root.join("a.png"), "jpg"));
        let path = sink
            .persist(&RgbaImage::from_pixel(8, 8, Rgba([0, 0, 0, 255])), 1)
            .unwrap();
        assert!(path.exists());
        std::fs::remove_dir_all(root).ok();
    }

    #[test]
    fn unknown_format_is_distinguished() {
        let root = temp_dir("persist_unknown");
        let mut sink = FileSink::new(OutputLayout::from_output_path(&root.join("a.png"), "xyz"));
        let err = sink
            .persist(&RgbaImage::new(4, 4), 1)
            .unwrap_err();
        assert!(matches!(err, EngineError::UnsupportedOutputFormat(ref f) if f == "xyz"));
        assert!(!root.join("a").join("a_v1.xyz").exists());
        std::fs::remove_dir_all(root).ok();
    }
}
