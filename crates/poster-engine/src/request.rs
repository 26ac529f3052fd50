//! Render request and its validation.
//!
//! [`RenderRequest`] is the raw input bundle. [`RenderRequest::validate`]
//! checks every range, resolves every color name and produces the
//! [`ValidatedRequest`] the pipeline accepts. Errors here are fatal: no
//! version is rendered.

use std::ops::RangeInclusive;
use std::path::PathBuf;

use image::Rgb;
use serde::{Deserialize, Serialize};

use crate::color::resolve_color;
use crate::error::{EngineError, Result};
use crate::layout::{LayoutConstants, compute_dimensions};
use crate::logo::CenterLogoOptions;
use crate::qr::{ErrorCorrection, MAX_VERSION, ModuleStyle};

/// Where and how to embed the center logo.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CenterLogoSpec {
    pub path: PathBuf,
    /// Fraction of the QR's shorter side, in `[0, 1]`.
    pub size_ratio: f32,
    pub circular: bool,
    /// Border width as a fraction of the logo side.
    pub border_ratio: f32,
    pub border_color: String,
}

impl Default for CenterLogoSpec {
    fn default() -> Self {
        Self {
            path: PathBuf::new(),
            size_ratio: 0.2,
            circular: false,
            border_ratio: 0.0,
            border_color: "white".to_string(),
        }
    }
}

impl CenterLogoSpec {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            ..Default::default()
        }
    }
}

/// Everything needed to render one run of versions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderRequest {
    /// QR payload.
    pub data: String,
    pub title: String,
    pub title_color: String,
    pub foreground_color: String,
    pub background_color: String,
    /// Base output path; its extension is dropped to form the output directory.
    pub output: PathBuf,
    /// Target pixel width of the QR image and the canvas.
    pub resolution: u32,
    /// Output file extension, e.g. `png` or `jpg`.
    pub format: String,
    pub text_scale_factor: f32,
    pub logo_scale_factor: f32,
    pub min_version: u8,
    pub max_version: u8,
    pub center_logo: Option<CenterLogoSpec>,
    /// Logos drawn in the strip above the title.
    pub images: Vec<PathBuf>,
    pub module_style: ModuleStyle,
    pub ec_level: ErrorCorrection,
}

impl Default for RenderRequest {
    fn default() -> Self {
        Self {
            data: String::new(),
            title: String::new(),
            title_color: "black".to_string(),
            foreground_color: "black".to_string(),
            background_color: "white".to_string(),
            output: PathBuf::from("qrcode.png"),
            resolution: 1080,
            format: "png".to_string(),
            text_scale_factor: 1.0,
            logo_scale_factor: 1.0,
            min_version: 1,
            max_version: 20,
            center_logo: None,
            images: Vec::new(),
            module_style: ModuleStyle::Rounded,
            ec_level: ErrorCorrection::M,
        }
    }
}

impl RenderRequest {
    pub fn new(data: impl Into<String>) -> Self {
        Self {
            data: data.into(),
            ..Default::default()
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn with_output(mut self, output: impl Into<PathBuf>) -> Self {
        self.output = output.into();
        self
    }

    pub fn with_resolution(mut self, resolution: u32) -> Self {
        self.resolution = resolution;
        self
    }

    pub fn with_versions(mut self, min: u8, max: u8) -> Self {
        self.min_version = min;
        self.max_version = max;
        self
    }

    pub fn with_format(mut self, format: impl Into<String>) -> Self {
        self.format = format.into();
        self
    }

    pub fn with_center_logo(mut self, spec: CenterLogoSpec) -> Self {
        self.center_logo = Some(spec);
        self
    }

    pub fn with_images(mut self, images: Vec<PathBuf>) -> Self {
        self.images = images;
        self
    }

    /// Check ranges and resolve colors against the default layout constants.
    pub fn validate(self) -> Result<ValidatedRequest> {
        let constants = LayoutConstants::default();
        validate_versions(self.min_version, self.max_version)?;

        if self.resolution == 0 {
            return Err(EngineError::invalid("resolution must be at least 1 pixel"));
        }
        validate_scale(
            "text_scale_factor",
            self.text_scale_factor,
            constants.min_font_size,
        )?;
        validate_scale(
            "logo_scale_factor",
            self.logo_scale_factor,
            constants.logo_strip_height,
        )?;

        let dims = compute_dimensions(self.text_scale_factor);
        if u64::from(self.resolution) <= 2 * u64::from(dims.margin) {
            return Err(EngineError::invalid(format!(
                "resolution {} leaves no room for the title between {} px margins; \
                 lower text_scale_factor or raise resolution",
                self.resolution, dims.margin
            )));
        }

        let format = self.format.trim().trim_start_matches('.').to_string();
        if format.is_empty() {
            return Err(EngineError::invalid("output format must not be empty"));
        }

        let center_logo = self
            .center_logo
            .as_ref()
            .map(validate_center_logo)
            .transpose()?;

        let colors = ResolvedColors {
            title: resolve_color(&self.title_color)?,
            foreground: resolve_color(&self.foreground_color)?,
            background: resolve_color(&self.background_color)?,
        };

        Ok(ValidatedRequest {
            request: RenderRequest { format, ..self },
            colors,
            center_logo,
        })
    }
}

fn validate_versions(min: u8, max: u8) -> Result<()> {
    if !(1..=MAX_VERSION).contains(&min) || !(1..=MAX_VERSION).contains(&max) {
        return Err(EngineError::invalid(format!(
            "QR versions must be between 1 and {MAX_VERSION} (got {min}..={max})"
        )));
    }
    if min > max {
        return Err(EngineError::invalid(format!(
            "min_version ({min}) must not exceed max_version ({max})"
        )));
    }
    Ok(())
}

/// A scale factor must be positive and keep `base × scale` at one pixel or more.
fn validate_scale(name: &str, value: f32, base: u32) -> Result<()> {
    if !value.is_finite() || value <= 0.0 {
        return Err(EngineError::invalid(format!(
            "{name} must be a positive number (got {value})"
        )));
    }
    if (base as f32 * value).floor() < 1.0 {
        return Err(EngineError::invalid(format!(
            "{name} {value} scales {base} px down to zero pixels"
        )));
    }
    Ok(())
}

fn validate_center_logo(spec: &CenterLogoSpec) -> Result<CenterLogoPlan> {
    if !spec.size_ratio.is_finite() || !(0.0..=1.0).contains(&spec.size_ratio) {
        return Err(EngineError::invalid(format!(
            "center logo size must be between 0.0 and 1.0 (got {})",
            spec.size_ratio
        )));
    }
    if !spec.border_ratio.is_finite() || spec.border_ratio < 0.0 {
        return Err(EngineError::invalid(format!(
            "center logo border size must be 0.0 or greater (got {})",
            spec.border_ratio
        )));
    }
    if spec.path.as_os_str().is_empty() {
        return Err(EngineError::invalid("center logo path must not be empty"));
    }

    Ok(CenterLogoPlan {
        path: spec.path.clone(),
        options: CenterLogoOptions {
            size_ratio: spec.size_ratio,
            circular: spec.circular,
            border_ratio: spec.border_ratio,
            border_color: resolve_color(&spec.border_color)?,
        },
    })
}

/// Colors resolved during validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedColors {
    pub title: Rgb<u8>,
    pub foreground: Rgb<u8>,
    pub background: Rgb<u8>,
}

/// Center logo path plus ready-to-use compositing options.
#[derive(Debug, Clone, PartialEq)]
pub struct CenterLogoPlan {
    pub path: PathBuf,
    pub options: CenterLogoOptions,
}

/// A request that passed validation.
#[derive(Debug, Clone)]
pub struct ValidatedRequest {
    request: RenderRequest,
    colors: ResolvedColors,
    center_logo: Option<CenterLogoPlan>,
}

impl ValidatedRequest {
    pub fn request(&self) -> &RenderRequest {
        &self.request
    }

    pub fn colors(&self) -> &ResolvedColors {
        &self.colors
    }

    pub fn center_logo(&self) -> Option<&CenterLogoPlan> {
        self.center_logo.as_ref()
    }

    /// Versions to render, ascending.
    pub fn versions(&self) -> RangeInclusive<u8> {
        self.request.min_version..=self.request.max_version
    }
}
