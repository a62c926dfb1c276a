//! PDF rendering: draw a decoded image onto a single page at a [`Placement`].
//!
//! The renderer is a trait so the layout arithmetic and the file handling in
//! [`crate::convert`] can be exercised without a real PDF backend. The
//! default backend is `printpdf`, which builds the page as a list of
//! operations and serialises the whole document in one call.
//!
//! ## Coordinate systems
//!
//! [`Placement`] uses a top-left origin in millimetres. PDF user space has
//! its origin at the bottom-left and measures in points, so the y offset is
//! flipped via [`Placement::bottom_left_y`] and both axes converted with
//! `Mm::into_pt`.

use crate::error::DocPressError;
use crate::layout::{PageGeometry, Placement};
use crate::pipeline::input::DecodedImage;
use printpdf::{
    Mm, Op, PdfDocument, PdfPage, PdfSaveOptions, PdfWarnMsg, RawImage, RawImageData,
    RawImageFormat, XObjectTransform,
};
use tracing::debug;

/// Image DPI handed to printpdf: at 72 dpi one pixel is one point, so the
/// XObject scale factor is simply `placed_pt / source_px`.
const PIXEL_DPI: f32 = 72.0;

/// Draws one image onto one page and returns the serialised PDF.
pub trait ImageRenderer: Send + Sync {
    fn render(
        &self,
        image: &DecodedImage,
        geometry: &PageGeometry,
        placement: &Placement,
        title: &str,
    ) -> Result<Vec<u8>, DocPressError>;
}

/// [`ImageRenderer`] backed by `printpdf`.
#[derive(Debug, Default, Clone, Copy)]
pub struct PrintPdfRenderer;

impl ImageRenderer for PrintPdfRenderer {
    fn render(
        &self,
        image: &DecodedImage,
        geometry: &PageGeometry,
        placement: &Placement,
        title: &str,
    ) -> Result<Vec<u8>, DocPressError> {
        let width_px = image.image.width() as usize;
        let height_px = image.image.height() as usize;

        // Alpha is kept so printpdf can emit it as a soft mask.
        let (pixels, data_format) = if image.image.color().has_alpha() {
            (image.image.to_rgba8().into_raw(), RawImageFormat::RGBA8)
        } else {
            (image.image.to_rgb8().into_raw(), RawImageFormat::RGB8)
        };
        let raw = RawImage {
            pixels: RawImageData::U8(pixels),
            width: width_px,
            height: height_px,
            data_format,
            tag: Vec::new(),
        };

        let mut doc = PdfDocument::new(title);
        let xobject_id = doc.add_image(&raw);

        let placed_w_pt = Mm(placement.placed_width as f32).into_pt().0;
        let placed_h_pt = Mm(placement.placed_height as f32).into_pt().0;
        let x_pt = Mm(placement.offset_x as f32).into_pt();
        let y_pt = Mm(placement.bottom_left_y(geometry.page_height) as f32).into_pt();

        let ops = vec![Op::UseXobject {
            id: xobject_id,
            transform: XObjectTransform {
                translate_x: Some(x_pt),
                translate_y: Some(y_pt),
                scale_x: Some(placed_w_pt / width_px as f32),
                scale_y: Some(placed_h_pt / height_px as f32),
                dpi: Some(PIXEL_DPI),
                rotate: None,
            },
        }];

        let page = PdfPage::new(
            Mm(geometry.page_width as f32),
            Mm(geometry.page_height as f32),
            ops,
        );
        doc.with_pages(vec![page]);

        let mut warnings: Vec<PdfWarnMsg> = Vec::new();
        let bytes = doc.save(&PdfSaveOptions::default(), &mut warnings);

        debug!(
            placed_w_pt,
            placed_h_pt,
            warnings = warnings.len(),
            "Image placed on page"
        );

        if bytes.is_empty() {
            return Err(DocPressError::Internal(
                "PDF serialisation produced no bytes".into(),
            ));
        }
        Ok(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::fit_image;
    use crate::output::ImageInfo;
    use image::{DynamicImage, Rgb, RgbImage, Rgba, RgbaImage};
    use std::path::PathBuf;

    fn decoded(w: u32, h: u32) -> DecodedImage {
        with_pixels(DynamicImage::ImageRgba8(RgbaImage::from_pixel(
            w,
            h,
            Rgba([0, 0, 255, 128]),
        )))
    }

    fn with_pixels(image: DynamicImage) -> DecodedImage {
        DecodedImage {
            info: ImageInfo {
                path: PathBuf::from("mem.png"),
                width: image.width(),
                height: image.height(),
                format: Some("Png".into()),
            },
            image,
        }
    }

    fn contains(haystack: &[u8], needle: &[u8]) -> bool {
        haystack.windows(needle.len()).any(|w| w == needle)
    }

    fn render_default(image: &DecodedImage) -> Vec<u8> {
        let geometry = PageGeometry::default();
        let placement = fit_image(
            &geometry,
            image.info.width as f64,
            image.info.height as f64,
        )
        .unwrap();
        PrintPdfRenderer
            .render(image, &geometry, &placement, "alpha")
            .unwrap()
    }

    #[test]
    fn renders_a_pdf_document() {
        let geometry = PageGeometry::default();
        let image = decoded(20, 10);
        let placement = fit_image(&geometry, 20.0, 10.0).unwrap();

        let bytes = PrintPdfRenderer
            .render(&image, &geometry, &placement, "test")
            .unwrap();

        assert!(bytes.starts_with(b"%PDF"), "missing PDF header");
    }

    #[test]
    fn renders_custom_page_size() {
        let geometry = PageGeometry::new(100.0, 50.0, 0.0);
        let image = decoded(1, 1);
        let placement = fit_image(&geometry, 1.0, 1.0).unwrap();

        let bytes = PrintPdfRenderer
            .render(&image, &geometry, &placement, "square")
            .unwrap();

        assert!(bytes.starts_with(b"%PDF"));
    }

    #[test]
    fn transparent_pixels_become_a_soft_mask() {
        let image = with_pixels(DynamicImage::ImageRgba8(RgbaImage::from_pixel(
            100,
            50,
            Rgba([0, 0, 0, 0]),
        )));

        let bytes = render_default(&image);

        assert!(contains(&bytes, b"/SMask"), "RGBA source lost its alpha channel");
    }

    #[test]
    fn opaque_images_carry_no_mask() {
        let image = with_pixels(DynamicImage::ImageRgb8(RgbImage::from_pixel(
            100,
            50,
            Rgb([255, 255, 255]),
        )));

        let bytes = render_default(&image);

        assert!(bytes.starts_with(b"%PDF"));
        assert!(!contains(&bytes, b"/SMask"));
    }
}
