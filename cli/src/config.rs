//! Runtime configuration from `.env` and environment variables.

use std::path::PathBuf;

/// Environment variable naming a title font file.
pub const FONT_ENV: &str = "QR_POSTER_FONT";

/// Default tracing filter when `RUST_LOG` is unset.
pub const DEFAULT_LOG_FILTER: &str = "info";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AppConfig {
    /// Title font from the environment; the `--font` flag takes precedence.
    pub font: Option<PathBuf>,
    /// Which `.env` file was loaded, if any.
    pub dotenv: Option<&'static str>,
}

impl AppConfig {
    /// Load `.env` (first candidate found) and read overrides from the process environment.
    pub fn load() -> Self {
        let dotenv = load_dotenv();
        Self {
            dotenv,
            ..Self::from_lookup(|key| std::env::var(key).ok())
        }
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let font = lookup(FONT_ENV)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .map(PathBuf::from);
        Self { font, dotenv: None }
    }

    /// `--font` wins over the environment.
    pub fn font_path(&self, cli_font: Option<PathBuf>) -> Option<PathBuf> {
        cli_font.or_else(|| self.font.clone())
    }
}

fn load_dotenv() -> Option<&'static str> {
    let candidates = [".env", "../.env", "../../.env"];
    candidates
        .into_iter()
        .find(|path| dotenvy::from_filename(path).is_ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn font_from_environment() {
        let cfg = AppConfig::from_lookup(|k| (k == FONT_ENV).then(|| "/fonts/a.ttf".to_string()));
        assert_eq!(cfg.font, Some(PathBuf::from("/fonts/a.ttf")));
    }

    #[test]
    fn blank_font_is_ignored() {
        let cfg = AppConfig::from_lookup(|_| Some("  ".to_string()));
        assert_eq!(cfg.font, None);
    }

    #[test]
    fn cli_font_overrides_environment() {
        let cfg = AppConfig::from_lookup(|_| Some("/env.ttf".to_string()));
        assert_eq!(
            cfg.font_path(Some(PathBuf::from("/cli.ttf"))),
            Some(PathBuf::from("/cli.ttf"))
        );
        assert_eq!(cfg.font_path(None), Some(PathBuf::from("/env.ttf")));
        assert_eq!(AppConfig::default().font_path(None), None);
    }
}
