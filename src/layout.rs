//! Image fitting: scale an image uniformly and centre it inside a padded page.
//!
//! Everything here is pure arithmetic. The renderer receives a finished
//! [`Placement`] and never re-derives sizes, so this module can be tested
//! without touching the filesystem or any PDF backend.
//!
//! ```text
//!  ┌──────────────── page_width ────────────────┐
//!  │ padding                                    │
//!  │   ┌──────── available_width ─────────┐     │
//!  │   │        offset_y                  │     │
//!  │   │   ┌──────────────────────────┐   │     │
//!  │   │   │  placed_width × height   │   │     │
//!  │   │   └──────────────────────────┘   │     │
//!  │   └──────────────────────────────────┘     │
//!  └────────────────────────────────────────────┘
//! ```
//!
//! Offsets use a top-left origin with y growing downwards, in the same unit
//! as the page dimensions (millimetres throughout this crate).

use crate::error::DocPressError;
use serde::{Deserialize, Serialize};

/// Page size and uniform padding, in millimetres.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PageGeometry {
    pub page_width: f64,
    pub page_height: f64,
    /// Margin reserved on all four sides.
    pub padding: f64,
}

impl Default for PageGeometry {
    /// A4 portrait with 10 mm padding.
    fn default() -> Self {
        Self {
            page_width: 210.0,
            page_height: 297.0,
            padding: 10.0,
        }
    }
}

impl PageGeometry {
    pub fn new(page_width: f64, page_height: f64, padding: f64) -> Self {
        Self {
            page_width,
            page_height,
            padding,
        }
    }

    /// Check the page itself and return `(available_width, available_height)`.
    pub fn validate(&self) -> Result<(f64, f64), DocPressError> {
        let Self {
            page_width,
            page_height,
            padding,
        } = *self;

        if !(page_width.is_finite() && page_height.is_finite() && padding.is_finite()) {
            return Err(DocPressError::InvalidGeometry(format!(
                "page {page_width} x {page_height} with padding {padding} is not finite"
            )));
        }
        if page_width <= 0.0 || page_height <= 0.0 {
            return Err(DocPressError::InvalidGeometry(format!(
                "page dimensions must be positive, got {page_width} x {page_height}"
            )));
        }
        if padding < 0.0 {
            return Err(DocPressError::InvalidGeometry(format!(
                "padding must not be negative, got {padding}"
            )));
        }

        let available_width = page_width - 2.0 * padding;
        let available_height = page_height - 2.0 * padding;
        if available_width <= 0.0 || available_height <= 0.0 {
            return Err(DocPressError::InvalidGeometry(format!(
                "padding {padding} leaves no room on a {page_width} x {page_height} page"
            )));
        }

        Ok((available_width, available_height))
    }
}

/// Where and how large to draw the image on the page.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Placement {
    /// Uniform factor applied to both source dimensions.
    pub scale: f64,
    pub placed_width: f64,
    pub placed_height: f64,
    /// Left edge of the placed image.
    pub offset_x: f64,
    /// Top edge of the placed image.
    pub offset_y: f64,
    pub available_width: f64,
    pub available_height: f64,
}

impl Placement {
    /// Bottom edge measured from the bottom of the page (PDF user space).
    pub fn bottom_left_y(&self, page_height: f64) -> f64 {
        page_height - self.offset_y - self.placed_height
    }
}

/// Scale a `source_width × source_height` image to fit `geometry` and centre it.
///
/// The scale is the smaller of the two axis ratios, so the image fits on both
/// axes and keeps its aspect ratio. Leftover space is split evenly on each
/// side of the available region.
///
/// # Errors
/// [`DocPressError::InvalidGeometry`] when the source size is not positive
/// or the page/padding combination leaves no available region.
pub fn fit_image(
    geometry: &PageGeometry,
    source_width: f64,
    source_height: f64,
) -> Result<Placement, DocPressError> {
    let (available_width, available_height) = geometry.validate()?;

    if !(source_width.is_finite() && source_height.is_finite())
        || source_width <= 0.0
        || source_height <= 0.0
    {
        return Err(DocPressError::InvalidGeometry(format!(
            "source image must have positive dimensions, got {source_width} x {source_height}"
        )));
    }

    let scale_w = available_width / source_width;
    let scale_h = available_height / source_height;
    let scale = scale_w.min(scale_h);

    let placed_width = source_width * scale;
    let placed_height = source_height * scale;

    Ok(Placement {
        scale,
        placed_width,
        placed_height,
        offset_x: geometry.padding + (available_width - placed_width) / 2.0,
        offset_y: geometry.padding + (available_height - placed_height) / 2.0,
        available_width,
        available_height,
    })
}
