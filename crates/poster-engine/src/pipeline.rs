//! Per-version rendering pipeline and run report.
//!
//! A run renders every version in the request's range in ascending order.
//! Each version moves through [`Stage`]s; a failure is recorded against the
//! stage it happened in and, under [`FailurePolicy::Continue`], the next
//! version is still attempted.

use std::path::PathBuf;

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::assets::{Logo, load_logo, load_logos_lossy};
use crate::compose::overlay;
use crate::error::EngineError;
use crate::font::FontLoader;
use crate::layout::{
    LayoutConstants, LayoutEngine, arrange_logo_strip, draw_title, strip_band_height,
};
use crate::logo::add_center_logo;
use crate::persist::ArtifactSink;
use crate::qr::{QrcodeEncoder, SymbolEncoder, SymbolStyle, render_symbol};
use crate::request::ValidatedRequest;
use crate::resize::scale_to_resolution;

/// Where a version is in the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Pending,
    Encoding,
    LogoEmbed,
    Layout,
    Compose,
    Persist,
    Done,
}

/// What to do after a version fails.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailurePolicy {
    /// Record the failure and render the remaining versions.
    #[default]
    Continue,
    /// Stop the run at the first failed version.
    AbortOnFirst,
}

/// A version written by the sink.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RenderedArtifact {
    pub version: u8,
    pub path: PathBuf,
    pub width: u32,
    pub height: u32,
}

/// A version that could not be produced.
#[derive(Debug)]
pub struct VersionFailure {
    pub version: u8,
    pub stage: Stage,
    pub error: EngineError,
}

#[derive(Debug)]
pub enum VersionOutcome {
    Rendered(RenderedArtifact),
    Failed(VersionFailure),
}

impl VersionOutcome {
    pub fn version(&self) -> u8 {
        match self {
            Self::Rendered(a) => a.version,
            Self::Failed(f) => f.version,
        }
    }
}

/// Outcome of a whole run, ordered by version.
#[derive(Debug, Default)]
pub struct RunReport {
    pub outcomes: Vec<VersionOutcome>,
    /// Logo files that could not be loaded; their layers were skipped.
    pub asset_errors: Vec<EngineError>,
    /// Set when [`FailurePolicy::AbortOnFirst`] cut the run short.
    pub aborted: bool,
}

impl RunReport {
    pub fn rendered(&self) -> impl Iterator<Item = &RenderedArtifact> {
        self.outcomes.iter().filter_map(|o| match o {
            VersionOutcome::Rendered(a) => Some(a),
            VersionOutcome::Failed(_) => None,
        })
    }

    pub fn failed(&self) -> impl Iterator<Item = &VersionFailure> {
        self.outcomes.iter().filter_map(|o| match o {
            VersionOutcome::Failed(f) => Some(f),
            VersionOutcome::Rendered(_) => None,
        })
    }

    /// No version failed. Asset errors alone do not count as failure.
    pub fn is_success(&self) -> bool {
        self.failed().next().is_none()
    }

    /// Serializable digest of the report.
    pub fn summary(&self) -> RunSummary {
        RunSummary {
            rendered: self.rendered().cloned().collect(),
            failed: self
                .failed()
                .map(|f| FailureSummary {
                    version: f.version,
                    stage: f.stage,
                    kind: f.error.kind(),
                    message: f.error.to_string(),
                })
                .collect(),
            asset_errors: self.asset_errors.iter().map(ToString::to_string).collect(),
            aborted: self.aborted,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub rendered: Vec<RenderedArtifact>,
    pub failed: Vec<FailureSummary>,
    pub asset_errors: Vec<String>,
    pub aborted: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct FailureSummary {
    pub version: u8,
    pub stage: Stage,
    pub kind: &'static str,
    pub message: String,
}

/// Logos shared read-only by every version of a run.
#[derive(Debug, Default)]
struct RunAssets {
    center: Option<Logo>,
    strip: Vec<Logo>,
}

/// Renders the versions of a validated request.
pub struct Renderer {
    encoder: Box<dyn SymbolEncoder>,
    fonts: FontLoader,
    policy: FailurePolicy,
}

impl Renderer {
    pub fn new(encoder: Box<dyn SymbolEncoder>, fonts: FontLoader) -> Self {
        Self {
            encoder,
            fonts,
            policy: FailurePolicy::default(),
        }
    }

    /// Renderer using the `qrcode` encoder at the request's error-correction level.
    pub fn for_request(request: &ValidatedRequest, fonts: FontLoader) -> Self {
        Self::new(
            Box::new(QrcodeEncoder::new(request.request().ec_level)),
            fonts,
        )
    }

    pub fn with_policy(mut self, policy: FailurePolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Render every version and hand each canvas to `sink`.
    pub fn run(&self, request: &ValidatedRequest, sink: &mut dyn ArtifactSink) -> RunReport {
        let mut report = RunReport::default();
        let layout = LayoutEngine::new(
            LayoutConstants::default(),
            request.request().text_scale_factor,
            &self.fonts,
        );
        let assets = self.load_assets(request, &layout, &mut report.asset_errors);

        for version in request.versions() {
            debug!(version, stage = ?Stage::Pending, "Queued version");
            match self.render_version(request, &assets, &layout, sink, version) {
                Ok(artifact) => {
                    info!(
                        version,
                        width = artifact.width,
                        height = artifact.height,
                        "Rendered version"
                    );
                    report.outcomes.push(VersionOutcome::Rendered(artifact));
                }
                Err((stage, error)) => {
                    warn!(version, ?stage, "Version failed: {error}");
                    report.outcomes.push(VersionOutcome::Failed(VersionFailure {
                        version,
                        stage,
                        error,
                    }));
                    if self.policy == FailurePolicy::AbortOnFirst {
                        report.aborted = true;
                        break;
                    }
                }
            }
        }

        report
    }

    fn load_assets(
        &self,
        request: &ValidatedRequest,
        layout: &LayoutEngine<'_>,
        errors: &mut Vec<EngineError>,
    ) -> RunAssets {
        let center = request.center_logo().and_then(|plan| {
            load_logo(&plan.path)
                .map_err(|e| {
                    warn!("Skipping center logo: {e}");
                    errors.push(e);
                })
                .ok()
        });

        let max_size = layout
            .constants()
            .logo_max_size(request.request().logo_scale_factor);
        let (strip, strip_errors) = load_logos_lossy(&request.request().images, max_size);
        for e in &strip_errors {
            warn!("Skipping strip logo: {e}");
        }
        errors.extend(strip_errors);

        debug!(
            center = center.is_some(),
            strip = strip.len(),
            "Loaded run assets"
        );
        RunAssets { center, strip }
    }

    fn render_version(
        &self,
        request: &ValidatedRequest,
        assets: &RunAssets,
        layout: &LayoutEngine<'_>,
        sink: &mut dyn ArtifactSink,
        version: u8,
    ) -> std::result::Result<RenderedArtifact, (Stage, EngineError)> {
        let req = request.request();
        let colors = request.colors();
        let at = |stage: Stage| move |e: EngineError| (stage, e);
        let enter = |stage: Stage| debug!(version, ?stage, "Entering stage");

        enter(Stage::Encoding);
        let grid = self
            .encoder
            .encode(req.data.as_bytes(), version)
            .map_err(at(Stage::Encoding))?;
        let style = SymbolStyle {
            module_style: req.module_style,
            foreground: colors.foreground,
            background: colors.background,
        };
        let mut qr = render_symbol(&grid, &style);

        if let (Some(logo), Some(plan)) = (&assets.center, request.center_logo()) {
            enter(Stage::LogoEmbed);
            qr = add_center_logo(&qr, logo, &plan.options);
        }

        let qr = scale_to_resolution(&qr, req.resolution);

        enter(Stage::Layout);
        let strip_height = strip_band_height(layout.dimensions(), &assets.strip);
        let mut plan = layout
            .build_canvas(&qr, &req.title, strip_height, colors.background)
            .map_err(|e| {
                debug!(version, last_size = e.last_size, "Title gave up");
                (Stage::Layout, EngineError::TitleTooSmall { version })
            })?;

        enter(Stage::Compose);
        let gap = layout.constants().logo_gap(req.logo_scale_factor);
        let (title_top, qr_top) = (plan.title_top(), plan.qr_top());
        arrange_logo_strip(&mut plan.canvas, &assets.strip, strip_height, gap);
        overlay(&mut plan.canvas, &qr, 0, i64::from(qr_top));
        if let Some(text) = plan.title.layout() {
            draw_title(&mut plan.canvas, text, title_top, colors.title);
        }

        enter(Stage::Persist);
        let (width, height) = plan.canvas.dimensions();
        let path = sink
            .persist(&plan.canvas, version)
            .map_err(at(Stage::Persist))?;
        enter(Stage::Done);

        Ok(RenderedArtifact {
            version,
            path,
            width,
            height,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Result;
    use crate::persist::{FileSink, OutputLayout};
    use crate::qr::ModuleGrid;
    use crate::request::{CenterLogoSpec, RenderRequest};
    use crate::test_support::temp_dir;
    use image::{Rgb, RgbImage, Rgba, RgbaImage};

    #[derive(Default)]
    struct MemorySink {
        canvases: Vec<(u8, RgbaImage)>,
    }

    impl ArtifactSink for MemorySink {
        fn persist(&mut self, canvas: &RgbaImage, version: u8) -> Result<PathBuf> {
            self.canvases.push((version, canvas.clone()));
            Ok(PathBuf::from(format!("memory_v{version}")))
        }
    }

    /// Fixed-size grids; versions above `max_version` overflow.
    struct FakeEncoder {
        max_version: u8,
    }

    impl SymbolEncoder for FakeEncoder {
        fn encode(&self, _data: &[u8], version: u8) -> Result<ModuleGrid> {
            if version > self.max_version {
                return Err(EngineError::EncodingCapacityExceeded { version });
            }
            let width = 17 + 4 * version as usize;
            let modules = (0..width * width).map(|i| i % 3 == 0).collect();
            ModuleGrid::new(width, modules)
        }
    }

    /// Accepts everything except the listed versions.
    struct FlakySink {
        inner: MemorySink,
        reject: Vec<u8>,
    }

    impl ArtifactSink for FlakySink {
        fn persist(&mut self, canvas: &RgbaImage, version: u8) -> Result<PathBuf> {
            if self.reject.contains(&version) {
                return Err(EngineError::UnsupportedOutputFormat("bmpx".into()));
            }
            self.inner.persist(canvas, version)
        }
    }

    fn renderer(max_version: u8) -> Renderer {
        Renderer::new(Box::new(FakeEncoder { max_version }), FontLoader::bundled())
    }

    fn request(min: u8, max: u8) -> ValidatedRequest {
        RenderRequest::new("hello")
            .with_title("Test")
            .with_resolution(300)
            .with_versions(min, max)
            .validate()
            .unwrap()
    }

    #[test]
    fn every_version_gets_exactly_one_outcome() {
        let mut sink = MemorySink::default();
        let report = renderer(40).run(&request(3, 7), &mut sink);

        let versions: Vec<u8> = report.outcomes.iter().map(VersionOutcome::version).collect();
        assert_eq!(versions, vec![3, 4, 5, 6, 7]);
        assert!(report.is_success());
        assert_eq!(sink.canvases.len(), 5);
    }

    #[test]
    fn canvases_are_resolution_wide_and_taller_than_the_qr() {
        let mut sink = MemorySink::default();
        let report = renderer(40).run(&request(1, 3), &mut sink);
        assert!(report.is_success());
        let title_height = FontLoader::bundled().at_px(36).line_height("Test");
        assert!(title_height > 0);
        for (_, canvas) in &sink.canvases {
            assert_eq!(canvas.width(), 300);
            assert_eq!(canvas.height(), 300 + title_height + 5 + 50);
        }
    }

    #[test]
    fn capacity_failure_isolated_to_its_version() {
        let mut sink = MemorySink::default();
        let report = renderer(2).run(&request(1, 4), &mut sink);

        assert_eq!(report.rendered().count(), 2);
        let failed: Vec<_> = report.failed().collect();
        assert_eq!(failed.len(), 2);
        assert_eq!(failed[0].version, 3);
        assert_eq!(failed[0].stage, Stage::Encoding);
        assert!(matches!(
            failed[0].error,
            EngineError::EncodingCapacityExceeded { version: 3 }
        ));
        assert!(!report.is_success());
        assert!(!report.aborted);
    }

    #[test]
    fn abort_on_first_stops_the_loop() {
        let mut sink = FlakySink {
            inner: MemorySink::default(),
            reject: vec![2],
        };
        let report = renderer(40)
            .with_policy(FailurePolicy::AbortOnFirst)
            .run(&request(1, 4), &mut sink);

        assert!(report.aborted);
        assert_eq!(report.outcomes.len(), 2);
        assert_eq!(report.rendered().count(), 1);
        let failure = report.failed().next().unwrap();
        assert_eq!(failure.stage, Stage::Persist);
        assert!(matches!(failure.error, EngineError::UnsupportedOutputFormat(_)));
    }

    #[test]
    fn unfittable_title_fails_with_title_too_small() {
        let req = RenderRequest::new("hello")
            .with_title("unfittable ".repeat(300))
            .with_resolution(300)
            .with_versions(1, 2)
            .validate()
            .unwrap();
        let mut sink = MemorySink::default();
        let report = renderer(40).run(&req, &mut sink);

        assert_eq!(report.rendered().count(), 0);
        assert_eq!(report.failed().count(), 2);
        for failure in report.failed() {
            assert_eq!(failure.stage, Stage::Layout);
            assert!(matches!(failure.error, EngineError::TitleTooSmall { .. }));
        }
        assert!(sink.canvases.is_empty());
    }

    #[test]
    fn persist_failure_is_isolated() {
        let mut sink = FlakySink {
            inner: MemorySink::default(),
            reject: vec![2],
        };
        let report = renderer(40).run(&request(1, 3), &mut sink);
        let rendered: Vec<u8> = report.rendered().map(|a| a.version).collect();
        assert_eq!(rendered, vec![1, 3]);
        assert_eq!(report.failed().next().map(|f| f.stage), Some(Stage::Persist));
    }

    #[test]
    fn missing_logos_become_asset_errors() {
        let req = RenderRequest::new("hello")
            .with_resolution(300)
            .with_versions(1, 1)
            .with_images(vec![PathBuf::from("/nonexistent/strip.png")])
            .with_center_logo(CenterLogoSpec::new("/nonexistent/center.png"))
            .validate()
            .unwrap();
        let mut sink = MemorySink::default();
        let report = renderer(40).run(&req, &mut sink);

        assert!(report.is_success());
        assert_eq!(report.asset_errors.len(), 2);
        assert_eq!(sink.canvases.len(), 1);
    }

    #[test]
    fn strip_and_center_logos_are_composed() {
        let dir = temp_dir("pipeline_logos");
        let strip = dir.join("strip.png");
        RgbImage::from_pixel(100, 50, Rgb([255, 0, 0])).save(&strip).unwrap();
        let center = dir.join("center.png");
        RgbImage::from_pixel(20, 20, Rgb([0, 0, 255])).save(&center).unwrap();

        let req = RenderRequest::new("hello")
            .with_resolution(300)
            .with_versions(1, 1)
            .with_images(vec![strip])
            .with_center_logo(CenterLogoSpec::new(center))
            .validate()
            .unwrap();
        let mut sink = MemorySink::default();
        let report = renderer(40).run(&req, &mut sink);
        assert!(report.is_success(), "{:?}", report.summary());
        assert!(report.asset_errors.is_empty());

        let (_, canvas) = &sink.canvases[0];
        // Strip logo fitted to 50x25, centered in the 50 px band.
        assert_eq!(canvas.get_pixel(150, 25), &Rgba([255, 0, 0, 255]));
        assert_eq!(canvas.get_pixel(150, 5), &Rgba([255, 255, 255, 255]));
        // Center logo sits in the middle of the QR area below the strip.
        let qr_top = 50 + 5;
        let mid = qr_top + 150;
        assert_eq!(canvas.get_pixel(150, mid), &Rgba([0, 0, 255, 255]));
        std::fs::remove_dir_all(dir).ok();
    }

    #[test]
    fn strip_band_follows_layout_and_tallest_logo() {
        let mut sink = MemorySink::default();
        let untitled = RenderRequest::new("hello")
            .with_resolution(300)
            .with_versions(1, 1)
            .validate()
            .unwrap();
        assert!(renderer(40).run(&untitled, &mut sink).is_success());
        assert_eq!(sink.canvases[0].1.height(), 300 + 5 + 50);

        let dir = temp_dir("pipeline_tall_logo");
        let tall = dir.join("tall.png");
        RgbImage::from_pixel(50, 100, Rgb([0, 128, 0])).save(&tall).unwrap();
        let req = RenderRequest {
            logo_scale_factor: 2.0,
            ..RenderRequest::new("hello")
                .with_resolution(300)
                .with_versions(1, 1)
                .with_images(vec![tall])
        }
        .validate()
        .unwrap();
        let mut sink = MemorySink::default();
        assert!(renderer(40).run(&req, &mut sink).is_success());
        assert_eq!(sink.canvases[0].1.height(), 300 + 5 + 100);
        std::fs::remove_dir_all(dir).ok();
    }

    #[test]
    fn summary_serializes_outcomes() {
        let mut sink = MemorySink::default();
        let report = renderer(1).run(&request(1, 2), &mut sink);
        let json = serde_json::to_value(report.summary()).unwrap();

        assert_eq!(json["rendered"][0]["version"], 1);
        assert_eq!(json["failed"][0]["version"], 2);
        assert_eq!(json["failed"][0]["stage"], "encoding");
        assert_eq!(json["failed"][0]["kind"], "encoding_capacity_exceeded");
        assert_eq!(json["aborted"], false);
    }

    #[test]
    fn file_sink_scenario_writes_three_versions() {
        let root = temp_dir("pipeline_files");
        let req = RenderRequest::new("hello")
            .with_title("Test")
            .with_resolution(300)
            .with_versions(1, 3)
            .with_output(root.join("qrcode.png"))
            .validate()
            .unwrap();
        let layout = OutputLayout::from_output_path(&req.request().output, &req.request().format);
        let mut sink = FileSink::new(layout);

        let report = Renderer::for_request(&req, FontLoader::bundled()).run(&req, &mut sink);
        assert!(report.is_success(), "{:?}", report.summary());

        for version in 1..=3u8 {
            let path = root.join("qrcode").join(format!("qrcode_v{version}.png"));
            let img = image::open(&path).unwrap();
            assert_eq!(img.width(), 300);
            assert!(img.height() > 300);
        }
        std::fs::remove_dir_all(root).ok();
    }
}
