//! Error types for the docpress library.
//!
//! Every failure is fatal: both pipelines are single-shot, so an error
//! aborts the run and is returned as `Err(DocPressError)` from the top-level
//! `image_to_pdf*` / `markdown_to_pdf*` functions. Nothing is retried.
//!
//! | Failure | Variant |
//! |---------|---------|
//! | bad page / padding / image dimensions | [`DocPressError::InvalidGeometry`] |
//! | source file missing or unreadable | [`DocPressError::FileNotFound`], [`DocPressError::PermissionDenied`] |
//! | converter binary missing | [`DocPressError::ConversionToolUnavailable`] |
//! | converter ran and failed | [`DocPressError::ConversionFailed`] |
//! | destination not writable | [`DocPressError::OutputWriteFailed`] |

use std::path::PathBuf;
use thiserror::Error;

/// All errors returned by the docpress library.
#[derive(Debug, Error)]
pub enum DocPressError {
    // ── Layout errors ─────────────────────────────────────────────────────
    /// Page, padding or source dimensions leave no room to place an image.
    #[error("Invalid geometry: {0}")]
    InvalidGeometry(String),

    // ── Input errors ──────────────────────────────────────────────────────
    /// Input file was not found at the given path.
    #[error("File not found: '{path}'\nCheck the path exists and is readable.")]
    FileNotFound { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("Permission denied reading '{path}'\nTry: chmod +r {path:?}")]
    PermissionDenied { path: PathBuf },

    /// The file was read but could not be decoded as an image.
    #[error("Could not decode image '{path}': {detail}")]
    ImageDecode { path: PathBuf, detail: String },

    // ── Conversion errors ─────────────────────────────────────────────────
    /// The external conversion tool could not be located.
    #[error("Conversion tool '{tool}' is not available.\n{hint}")]
    ConversionToolUnavailable { tool: String, hint: String },

    /// The external conversion tool ran but reported failure.
    #[error("{tool} failed ({status}):\n{stderr}")]
    ConversionFailed {
        tool: String,
        status: String,
        stderr: String,
    },

    /// Installing the conversion tool failed.
    #[error("Failed to install conversion tool: {0}")]
    Setup(#[from] pandoc_auto::PandocAutoError),

    // ── I/O errors ────────────────────────────────────────────────────────
    /// Could not create or write the output PDF file.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl DocPressError {
    /// `true` for errors caused by the source file rather than the tooling.
    pub fn is_input_error(&self) -> bool {
        matches!(
            self,
            DocPressError::FileNotFound { .. }
                | DocPressError::PermissionDenied { .. }
                | DocPressError::ImageDecode { .. }
        )
    }
}
