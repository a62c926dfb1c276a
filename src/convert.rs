//! Conversion entry points for both pipelines.
//!
//! Every function here runs its blocking work (image decoding, PDF
//! serialisation, the pandoc child process) inside `spawn_blocking`, and
//! writes its destination atomically: output goes to a hidden temp file in
//! the destination directory and is renamed into place only once complete.
//! A failed run therefore never leaves a truncated PDF behind.

use crate::config::{ImageToPdfConfig, MarkdownToPdfConfig};
use crate::error::DocPressError;
use crate::layout::{fit_image, Placement};
use crate::output::{ImageInfo, ImagePdfOutput, MarkdownPdfOutput};
use crate::pipeline::input;
use crate::pipeline::pandoc::{ConversionRequest, DocumentConverter, PandocConverter};
use crate::pipeline::render::{ImageRenderer, PrintPdfRenderer};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tempfile::NamedTempFile;
use tracing::{debug, info};

// ── Image → PDF ──────────────────────────────────────────────────────────

/// Place an image on a single PDF page and write it to `output_path`.
///
/// The image is scaled uniformly to fit the padded page and centred; see
/// [`crate::layout::fit_image`].
///
/// # Errors
/// - [`DocPressError::FileNotFound`] / [`DocPressError::PermissionDenied`] for the source
/// - [`DocPressError::ImageDecode`] if the file is not a supported image
/// - [`DocPressError::InvalidGeometry`] for unusable page/padding settings
/// - [`DocPressError::InvalidConfig`] if `output_path` resolves to the source
/// - [`DocPressError::OutputWriteFailed`] if the destination cannot be written
pub async fn image_to_pdf(
    input_path: impl AsRef<Path>,
    output_path: impl AsRef<Path>,
    config: &ImageToPdfConfig,
) -> Result<ImagePdfOutput, DocPressError> {
    let start = Instant::now();
    let input_path = input_path.as_ref().to_path_buf();
    let output_path = output_path.as_ref().to_path_buf();
    info!("Starting image conversion: {}", input_path.display());

    input::check_readable(&input_path)?;
    input::ensure_distinct(&input_path, &output_path)?;
    let (bytes, source, placement) = render_image(&input_path, config).await?;

    let dest = output_path.clone();
    let bytes_written = tokio::task::spawn_blocking(move || write_atomically(&dest, &bytes))
        .await
        .map_err(|e| DocPressError::Internal(format!("Write task panicked: {e}")))??;

    info!(
        "Wrote {} ({} bytes) in {}ms",
        output_path.display(),
        bytes_written,
        start.elapsed().as_millis()
    );

    Ok(ImagePdfOutput {
        source,
        geometry: config.geometry,
        placement,
        output_path: Some(output_path),
        bytes_written,
        duration_ms: start.elapsed().as_millis() as u64,
    })
}

/// Like [`image_to_pdf`] but returns the PDF bytes instead of writing a file.
pub async fn image_to_pdf_bytes(
    input_path: impl AsRef<Path>,
    config: &ImageToPdfConfig,
) -> Result<(Vec<u8>, ImagePdfOutput), DocPressError> {
    let start = Instant::now();
    let (bytes, source, placement) = render_image(input_path.as_ref(), config).await?;

    let output = ImagePdfOutput {
        source,
        geometry: config.geometry,
        placement,
        output_path: None,
        bytes_written: bytes.len() as u64,
        duration_ms: start.elapsed().as_millis() as u64,
    };
    Ok((bytes, output))
}

/// Synchronous wrapper around [`image_to_pdf`].
///
/// Creates a temporary tokio runtime internally.
pub fn image_to_pdf_sync(
    input_path: impl AsRef<Path>,
    output_path: impl AsRef<Path>,
    config: &ImageToPdfConfig,
) -> Result<ImagePdfOutput, DocPressError> {
    runtime()?.block_on(image_to_pdf(input_path, output_path, config))
}

/// Read an image's dimensions and format without decoding its pixels.
pub async fn inspect_image(input_path: impl AsRef<Path>) -> Result<ImageInfo, DocPressError> {
    let path = input_path.as_ref().to_path_buf();
    tokio::task::spawn_blocking(move || input::read_image_info(&path))
        .await
        .map_err(|e| DocPressError::Internal(format!("Inspect task panicked: {e}")))?
}

// ── Markdown → PDF ───────────────────────────────────────────────────────

/// Render a Markdown file to PDF with pandoc.
///
/// Never installs pandoc: run [`setup_pandoc`] (or `md2pdf --install-pandoc`)
/// first if it may be missing.
///
/// # Errors
/// - [`DocPressError::FileNotFound`] / [`DocPressError::PermissionDenied`] for the source;
///   the converter is not started and no destination file is created
/// - [`DocPressError::InvalidConfig`] if `output_path` resolves to the source
/// - [`DocPressError::ConversionToolUnavailable`] if pandoc cannot be found
/// - [`DocPressError::ConversionFailed`] if pandoc exits non-zero
/// - [`DocPressError::OutputWriteFailed`] if the destination cannot be written
pub async fn markdown_to_pdf(
    input_path: impl AsRef<Path>,
    output_path: impl AsRef<Path>,
    config: &MarkdownToPdfConfig,
) -> Result<MarkdownPdfOutput, DocPressError> {
    let start = Instant::now();
    let input_path = input_path.as_ref().to_path_buf();
    let output_path = output_path.as_ref().to_path_buf();
    info!("Starting Markdown conversion: {}", input_path.display());

    input::check_readable(&input_path)?;
    input::ensure_distinct(&input_path, &output_path)?;

    let converter: Arc<dyn DocumentConverter> = match config.converter {
        Some(ref c) => Arc::clone(c),
        None => Arc::new(PandocConverter::from_config(config)?),
    };
    let converter_name = converter.name().to_string();

    let staging = staging_file(&output_path, ".pdf")?;
    let request = ConversionRequest::new(&input_path, staging.path(), config);
    debug!("Staging output at {}", staging.path().display());

    let staging = tokio::task::spawn_blocking(move || {
        converter.convert(&request)?;
        Ok::<_, DocPressError>(staging)
    })
    .await
    .map_err(|e| DocPressError::Internal(format!("Conversion task panicked: {e}")))??;

    let bytes_written = std::fs::metadata(staging.path())
        .map_err(|source| DocPressError::OutputWriteFailed {
            path: output_path.clone(),
            source,
        })?
        .len();
    if bytes_written == 0 {
        return Err(DocPressError::ConversionFailed {
            tool: converter_name,
            status: "exit status: 0".to_string(),
            stderr: "converter reported success but produced no output".to_string(),
        });
    }

    staging
        .persist(&output_path)
        .map_err(|e| DocPressError::OutputWriteFailed {
            path: output_path.clone(),
            source: e.error,
        })?;

    info!(
        "Wrote {} ({} bytes) in {}ms",
        output_path.display(),
        bytes_written,
        start.elapsed().as_millis()
    );

    Ok(MarkdownPdfOutput {
        source: input_path,
        output_path,
        converter: converter_name,
        bytes_written,
        duration_ms: start.elapsed().as_millis() as u64,
    })
}

/// Synchronous wrapper around [`markdown_to_pdf`].
///
/// Creates a temporary tokio runtime internally.
pub fn markdown_to_pdf_sync(
    input_path: impl AsRef<Path>,
    output_path: impl AsRef<Path>,
    config: &MarkdownToPdfConfig,
) -> Result<MarkdownPdfOutput, DocPressError> {
    runtime()?.block_on(markdown_to_pdf(input_path, output_path, config))
}

/// Make sure pandoc is installed, downloading it if necessary.
///
/// Idempotent: returns immediately when pandoc is already available.
/// Blocking; call it from a sync context or inside `block_in_place`.
pub fn setup_pandoc(
    on_progress: Option<&dyn Fn(u64, Option<u64>)>,
) -> Result<PathBuf, DocPressError> {
    let path = pandoc_auto::ensure_pandoc(on_progress)?;
    info!("pandoc available at {}", path.display());
    Ok(path)
}

// ── Internal helpers ─────────────────────────────────────────────────────

/// Decode, fit and render on the blocking pool.
async fn render_image(
    input_path: &Path,
    config: &ImageToPdfConfig,
) -> Result<(Vec<u8>, ImageInfo, Placement), DocPressError> {
    let geometry = config.geometry;
    geometry.validate()?;

    let path = input_path.to_path_buf();
    let title = config.title.clone();
    let renderer: Arc<dyn ImageRenderer> = match config.renderer {
        Some(ref r) => Arc::clone(r),
        None => Arc::new(PrintPdfRenderer),
    };

    tokio::task::spawn_blocking(move || {
        let decoded = input::load_image(&path)?;
        let placement = fit_image(
            &geometry,
            decoded.info.width as f64,
            decoded.info.height as f64,
        )?;
        debug!(
            scale = placement.scale,
            x = placement.offset_x,
            y = placement.offset_y,
            w = placement.placed_width,
            h = placement.placed_height,
            "Fitted image"
        );

        let title = title.unwrap_or_else(|| {
            path.file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_else(|| "Image".to_string())
        });
        let bytes = renderer.render(&decoded, &geometry, &placement, &title)?;
        Ok::<_, DocPressError>((bytes, decoded.info, placement))
    })
    .await
    .map_err(|e| DocPressError::Internal(format!("Render task panicked: {e}")))?
}

/// Hidden temp file next to `dest`, so the final rename stays on one filesystem.
fn staging_file(dest: &Path, suffix: &str) -> Result<NamedTempFile, DocPressError> {
    let write_err = |source| DocPressError::OutputWriteFailed {
        path: dest.to_path_buf(),
        source,
    };

    let parent = match dest.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => PathBuf::from("."),
    };
    std::fs::create_dir_all(&parent).map_err(write_err)?;

    tempfile::Builder::new()
        .prefix(".docpress-")
        .suffix(suffix)
        .tempfile_in(&parent)
        .map_err(write_err)
}

/// Write `bytes` to `dest` via a staging file; returns the byte count.
fn write_atomically(dest: &Path, bytes: &[u8]) -> Result<u64, DocPressError> {
    let write_err = |source| DocPressError::OutputWriteFailed {
        path: dest.to_path_buf(),
        source,
    };

    let mut staging = staging_file(dest, ".tmp")?;
    staging.write_all(bytes).map_err(write_err)?;
    staging.as_file().sync_all().map_err(write_err)?;
    staging
        .persist(dest)
        .map_err(|e| DocPressError::OutputWriteFailed {
            path: dest.to_path_buf(),
            source: e.error,
        })?;

    Ok(bytes.len() as u64)
}

fn runtime() -> Result<tokio::runtime::Runtime, DocPressError> {
    tokio::runtime::Runtime::new()
        .map_err(|e| DocPressError::Internal(format!("Failed to create tokio runtime: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn atomic_write_leaves_only_destination() {
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("nested").join("out.pdf");

        let n = write_atomically(&dest, b"%PDF-1.7 test").unwrap();

        assert_eq!(n, 13);
        assert_eq!(std::fs::read(&dest).unwrap(), b"%PDF-1.7 test");
        let entries: Vec<_> = std::fs::read_dir(dest.parent().unwrap())
            .unwrap()
            .map(|e| e.unwrap().file_name())
            .collect();
        assert_eq!(entries, vec![std::ffi::OsString::from("out.pdf")]);
    }

    #[test]
    fn atomic_write_replaces_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("out.pdf");
        std::fs::write(&dest, b"old").unwrap();

        write_atomically(&dest, b"new contents").unwrap();

        assert_eq!(std::fs::read(&dest).unwrap(), b"new contents");
    }

    #[test]
    fn staging_file_uses_requested_suffix() {
        let dir = tempfile::tempdir().unwrap();
        let staging = staging_file(&dir.path().join("x.pdf"), ".pdf").unwrap();
        let name = staging.path().file_name().unwrap().to_string_lossy().into_owned();
        assert!(name.starts_with(".docpress-"), "{name}");
        assert!(name.ends_with(".pdf"), "{name}");
    }

    #[test]
    #[cfg(target_os = "linux")]
    fn write_under_proc_fails_cleanly() {
        let err = write_atomically(Path::new("/proc/docpress/out.pdf"), b"x").unwrap_err();
        assert!(matches!(err, DocPressError::OutputWriteFailed { .. }), "{err:?}");
    }
}
