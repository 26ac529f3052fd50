//! Command-line arguments.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use poster_engine::{CenterLogoSpec, ErrorCorrection, FailurePolicy, ModuleStyle, RenderRequest};

#[derive(Parser, Debug)]
#[command(
    name = "qr-poster",
    version,
    about = "Render a QR code as a titled poster at a range of QR versions"
)]
pub struct Cli {
    /// Data to encode in the QR code.
    pub data: String,

    /// Output path; images are written to a directory named after it.
    #[arg(long, short, default_value = "qrcode.png")]
    pub output: PathBuf,

    /// Title drawn above the QR code.
    #[arg(long, short, default_value = "")]
    pub title: String,

    #[arg(long, default_value = "black")]
    pub title_color: String,

    /// Color of dark modules.
    #[arg(long, default_value = "black")]
    pub foreground_color: String,

    /// Canvas and light module color.
    #[arg(long, default_value = "white")]
    pub background_color: String,

    /// Logos shown in a row above the title.
    #[arg(long, num_args = 1..)]
    pub images: Vec<PathBuf>,

    /// Output width in pixels.
    #[arg(long, default_value_t = 1080)]
    pub resolution: u32,

    /// Output image format (file extension).
    #[arg(long, default_value = "png")]
    pub format: String,

    #[arg(long, default_value_t = 1.0)]
    pub text_scale_factor: f32,

    #[arg(long, default_value_t = 1.0)]
    pub logo_scale_factor: f32,

    #[arg(long, default_value_t = 1)]
    pub min_version: u8,

    #[arg(long, default_value_t = 20)]
    pub max_version: u8,

    /// Logo embedded in the middle of the QR code.
    #[arg(long)]
    pub center_logo: Option<PathBuf>,

    /// Center logo size relative to the QR code (0.0 to 1.0).
    #[arg(long, default_value_t = 0.2)]
    pub center_logo_size: f32,

    /// Crop the center logo to a circle.
    #[arg(long)]
    pub logo_circle: bool,

    /// Center logo border width relative to the logo size.
    #[arg(long, default_value_t = 0.0, allow_negative_numbers = true)]
    pub border_size: f32,

    #[arg(long, default_value = "white")]
    pub border_color: String,

    /// Shape of dark modules.
    #[arg(long, value_enum, default_value_t = ModuleStyleArg::Rounded)]
    pub module_style: ModuleStyleArg,

    /// Error correction level.
    #[arg(long, value_enum, ignore_case = true, default_value_t = EcLevelArg::M)]
    pub ec_level: EcLevelArg,

    /// TTF/OTF font for the title (overrides QR_POSTER_FONT).
    #[arg(long)]
    pub font: Option<PathBuf>,

    /// Stop at the first version that fails.
    #[arg(long)]
    pub fail_fast: bool,

    /// Print the run summary as JSON.
    #[arg(long)]
    pub summary_json: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum ModuleStyleArg {
    Square,
    Rounded,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum EcLevelArg {
    L,
    M,
    Q,
    H,
}

impl Cli {
    pub fn failure_policy(&self) -> FailurePolicy {
        if self.fail_fast {
            FailurePolicy::AbortOnFirst
        } else {
            FailurePolicy::Continue
        }
    }

    /// Build the engine request. Validation happens later in the engine.
    pub fn to_request(&self) -> RenderRequest {
        let center_logo = self.center_logo.as_ref().map(|path| CenterLogoSpec {
            path: path.clone(),
            size_ratio: self.center_logo_size,
            circular: self.logo_circle,
            border_ratio: self.border_size,
            border_color: self.border_color.clone(),
        });

        RenderRequest {
            data: self.data.clone(),
            title: self.title.clone(),
            title_color: self.title_color.clone(),
            foreground_color: self.foreground_color.clone(),
            background_color: self.background_color.clone(),
            output: self.output.clone(),
            resolution: self.resolution,
            format: self.format.clone(),
            text_scale_factor: self.text_scale_factor,
            logo_scale_factor: self.logo_scale_factor,
            min_version: self.min_version,
            max_version: self.max_version,
            center_logo,
            images: self.images.clone(),
            module_style: match self.module_style {
                ModuleStyleArg::Square => ModuleStyle::Square,
                ModuleStyleArg::Rounded => ModuleStyle::Rounded,
            },
            ec_level: match self.ec_level {
                EcLevelArg::L => ErrorCorrection::L,
                EcLevelArg::M => ErrorCorrection::M,
                EcLevelArg::Q => ErrorCorrection::Q,
                EcLevelArg::H => ErrorCorrection::H,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("qr-poster").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn defaults_match_engine_defaults() {
        let cli = parse(&["hello"]);
        let req = cli.to_request();
        let defaults = RenderRequest::new("hello");
        assert_eq!(req, defaults);
        assert_eq!(req.module_style, ModuleStyle::Rounded);
        assert_eq!(cli.failure_policy(), FailurePolicy::Continue);
        assert!(!cli.summary_json);
    }

    #[test]
    fn center_logo_options_are_grouped() {
        let cli = parse(&[
            "hello",
            "--center-logo",
            "logo.svg",
            "--center-logo-size",
            "0.3",
            "--logo-circle",
            "--border-size",
            "0.05",
            "--border-color",
            "red",
        ]);
        let spec = cli.to_request().center_logo.unwrap();
        assert_eq!(spec.path, PathBuf::from("logo.svg"));
        assert_eq!(spec.size_ratio, 0.3);
        assert!(spec.circular);
        assert_eq!(spec.border_ratio, 0.05);
        assert_eq!(spec.border_color, "red");
    }

    #[test]
    fn negative_border_parses_and_is_rejected_by_validation() {
        let cli = parse(&["hello", "--center-logo", "l.png", "--border-size", "-0.1"]);
        assert!(cli.to_request().validate().is_err());
    }

    #[test]
    fn images_and_enums_parse() {
        let cli = parse(&[
            "hello",
            "--images",
            "a.png",
            "b.svg",
            "--module-style",
            "square",
            "--ec-level",
            "h",
            "--fail-fast",
        ]);
        let req = cli.to_request();
        assert_eq!(req.images, vec![PathBuf::from("a.png"), PathBuf::from("b.svg")]);
        assert_eq!(req.module_style, ModuleStyle::Square);
        assert_eq!(req.ec_level, ErrorCorrection::H);
        assert_eq!(cli.failure_policy(), FailurePolicy::AbortOnFirst);
    }

    #[test]
    fn missing_data_is_a_usage_error() {
        assert!(Cli::try_parse_from(["qr-poster"]).is_err());
        assert!(Cli::try_parse_from(["qr-poster", "x", "--module-style", "hex"]).is_err());
    }
}
