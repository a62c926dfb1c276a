//! # docpress
//!
//! Two small PDF producers behind one library:
//!
//! * **Image → PDF** — place a raster image on a single page, scaled
//!   uniformly to fit inside the padded page and centred.
//! * **Markdown → PDF** — render a Markdown document with pandoc using a
//!   fixed page margin.
//!
//! ## Pipelines
//!
//! ```text
//! image     ─▶ input (decode) ─▶ layout::fit_image ─▶ render (printpdf) ─▶ atomic write
//! markdown  ─▶ input (check)  ─▶ pandoc (child process)                ─▶ atomic persist
//! ```
//!
//! The only real arithmetic is [`layout::fit_image`]; it is pure and has no
//! I/O, so it can be used on its own:
//!
//! ```rust
//! use docpress::{fit_image, PageGeometry};
//!
//! let placement = fit_image(&PageGeometry::default(), 1000.0, 500.0).unwrap();
//! assert!((placement.placed_width - 190.0).abs() < 1e-9);
//! assert!((placement.offset_y - 101.0).abs() < 1e-9);
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use docpress::{image_to_pdf, markdown_to_pdf, ImageToPdfConfig, MarkdownToPdfConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     image_to_pdf("diagram.png", "diagram.pdf", &ImageToPdfConfig::default()).await?;
//!
//!     // pandoc must already be installed; see `setup_pandoc`.
//!     markdown_to_pdf("README.md", "README.pdf", &MarkdownToPdfConfig::default()).await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `img2pdf` and `md2pdf` binaries (clap + anyhow + tracing-subscriber + indicatif) |
//!
//! Disable `cli` when using only the library:
//! ```toml
//! docpress = { version = "0.1", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod convert;
pub mod error;
pub mod layout;
pub mod output;
pub mod pipeline;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{
    ImageToPdfConfig, ImageToPdfConfigBuilder, Length, LengthUnit, MarkdownToPdfConfig,
    MarkdownToPdfConfigBuilder, Orientation, PaperSize,
};
pub use convert::{
    image_to_pdf, image_to_pdf_bytes, image_to_pdf_sync, inspect_image, markdown_to_pdf,
    markdown_to_pdf_sync, setup_pandoc,
};
pub use error::DocPressError;
pub use layout::{fit_image, PageGeometry, Placement};
pub use output::{ImageInfo, ImagePdfOutput, MarkdownPdfOutput};
pub use pipeline::input::{default_output_path, DecodedImage};
pub use pipeline::pandoc::{ConversionRequest, DocumentConverter, PandocConverter};
pub use pipeline::render::{ImageRenderer, PrintPdfRenderer};
