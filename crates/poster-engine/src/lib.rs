//! Decorated QR poster composition.
//!
//! Renders a payload as a QR symbol at every version in a range and
//! composes each one with a strip of logos, a wrapped title and an
//! optional center logo.
//!
//! ```no_run
//! use poster_engine::{FileSink, FontLoader, OutputLayout, RenderRequest, Renderer};
//!
//! let request = RenderRequest::new("https://example.com")
//!     .with_title("Scan me")
//!     .with_output("posters/scan.png")
//!     .with_resolution(720)
//!     .with_versions(2, 4)
//!     .validate()?;
//! let fonts = FontLoader::new(None);
//! let mut sink = FileSink::new(OutputLayout::from_output_path(
//!     &request.request().output,
//!     &request.request().format,
//! ));
//! let report = Renderer::for_request(&request, fonts).run(&request, &mut sink);
//! assert!(report.is_success());
//! # Ok::<(), poster_engine::EngineError>(())
//! ```

pub mod assets;
pub mod color;
pub mod compose;
pub mod error;
pub mod font;
pub mod layout;
pub mod logo;
pub mod persist;
pub mod pipeline;
pub mod qr;
pub mod request;
pub mod resize;
pub mod text;

pub use error::{EngineError, Result};
pub use font::{FontLoader, TitleFont};
pub use persist::{ArtifactSink, FileSink, OutputLayout};
pub use pipeline::{FailurePolicy, RenderedArtifact, Renderer, RunReport, RunSummary, Stage};
pub use qr::{ErrorCorrection, ModuleStyle, QrcodeEncoder, SymbolEncoder};
pub use request::{CenterLogoSpec, RenderRequest, ValidatedRequest};
