//! Input resolution: validate source files and decode images.
//!
//! Both pipelines read exactly one local file. Checking existence and read
//! permission up front turns the common mistakes (typo in the path, file
//! owned by another user) into precise errors before a converter or PDF
//! writer is involved, and guarantees no destination file is created for a
//! source that was never readable.

use crate::error::DocPressError;
use crate::output::ImageInfo;
use image::{DynamicImage, ImageReader};
use std::path::{Path, PathBuf};
use tracing::debug;

/// A decoded source image together with its metadata.
#[derive(Debug)]
pub struct DecodedImage {
    pub info: ImageInfo,
    pub image: DynamicImage,
}

/// Validate that `path` names an existing, readable file.
pub fn check_readable(path: &Path) -> Result<(), DocPressError> {
    if !path.exists() {
        return Err(DocPressError::FileNotFound {
            path: path.to_path_buf(),
        });
    }

    match std::fs::File::open(path) {
        Ok(_) => {}
        Err(e) if e.kind() == std::io::ErrorKind::PermissionDenied => {
            return Err(DocPressError::PermissionDenied {
                path: path.to_path_buf(),
            });
        }
        Err(_) => {
            return Err(DocPressError::FileNotFound {
                path: path.to_path_buf(),
            });
        }
    }

    if path.is_dir() {
        return Err(DocPressError::FileNotFound {
            path: path.to_path_buf(),
        });
    }

    debug!("Resolved local input: {}", path.display());
    Ok(())
}

/// Read only the header of an image: dimensions and format, no pixel decode.
pub fn read_image_info(path: &Path) -> Result<ImageInfo, DocPressError> {
    check_readable(path)?;

    let reader = open_reader(path)?;
    let format = reader.format().map(|f| format!("{f:?}"));
    let (width, height) = reader
        .into_dimensions()
        .map_err(|e| decode_error(path, e))?;

    Ok(ImageInfo {
        path: path.to_path_buf(),
        width,
        height,
        format,
    })
}

/// Fully decode an image file.
pub fn load_image(path: &Path) -> Result<DecodedImage, DocPressError> {
    check_readable(path)?;

    let reader = open_reader(path)?;
    let format = reader.format().map(|f| format!("{f:?}"));
    let image = reader.decode().map_err(|e| decode_error(path, e))?;

    debug!(
        "Decoded {} → {}x{} px",
        path.display(),
        image.width(),
        image.height()
    );

    Ok(DecodedImage {
        info: ImageInfo {
            path: path.to_path_buf(),
            width: image.width(),
            height: image.height(),
            format,
        },
        image,
    })
}

/// The conventional output path for `input`: same location, `.pdf` extension.
pub fn default_output_path(input: &Path) -> PathBuf {
    input.with_extension("pdf")
}

/// Refuse an `output` that resolves to the same file as `input`.
///
/// Both paths are resolved through the filesystem, so `docs/../a.png` and
/// symlinks are caught. An output whose directory does not exist yet cannot
/// be the source.
pub fn ensure_distinct(input: &Path, output: &Path) -> Result<(), DocPressError> {
    let Ok(source) = std::fs::canonicalize(input) else {
        return Ok(());
    };

    let parent = match output.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    let (Ok(dir), Some(name)) = (std::fs::canonicalize(parent), output.file_name()) else {
        return Ok(());
    };

    let dest = dir.join(name);
    let same = dest == source
        || std::fs::canonicalize(&dest).is_ok_and(|resolved| resolved == source);
    if same {
        return Err(DocPressError::InvalidConfig(format!(
            "output '{}' would overwrite the source",
            output.display()
        )));
    }
    Ok(())
}

fn open_reader(path: &Path) -> Result<ImageReader<std::io::BufReader<std::fs::File>>, DocPressError> {
    ImageReader::open(path)
        .map_err(|_| DocPressError::FileNotFound {
            path: path.to_path_buf(),
        })?
        .with_guessed_format()
        .map_err(|e| DocPressError::ImageDecode {
            path: path.to_path_buf(),
            detail: e.to_string(),
        })
}

fn decode_error(path: &Path, e: image::ImageError) -> DocPressError {
    DocPressError::ImageDecode {
        path: path.to_path_buf(),
        detail: e.to_string(),
    }
}
