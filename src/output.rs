//! Result types returned by the conversion entry points.

use crate::layout::{PageGeometry, Placement};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Header-level facts about a source image.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageInfo {
    pub path: PathBuf,
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// Detected container format (e.g. "Png"), if known.
    pub format: Option<String>,
}

/// Outcome of an image → PDF conversion.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImagePdfOutput {
    pub source: ImageInfo,
    pub geometry: PageGeometry,
    pub placement: Placement,
    /// None when the PDF was returned in memory.
    pub output_path: Option<PathBuf>,
    pub bytes_written: u64,
    pub duration_ms: u64,
}

/// Outcome of a Markdown → PDF conversion.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarkdownPdfOutput {
    pub source: PathBuf,
    pub output_path: PathBuf,
    /// Name of the converter that produced the file.
    pub converter: String,
    pub bytes_written: u64,
    pub duration_ms: u64,
}
