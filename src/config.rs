//! Configuration types for both pipelines.
//!
//! [`ImageToPdfConfig`] controls page size and padding for the image pipeline;
//! [`MarkdownToPdfConfig`] controls the pandoc invocation for the Markdown
//! pipeline. Both are built through builders whose `build()` validates the
//! values, so a bad configuration fails before any file is opened.

use crate::error::DocPressError;
use crate::layout::PageGeometry;
use crate::pipeline::pandoc::DocumentConverter;
use crate::pipeline::render::ImageRenderer;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;

// ── Image → PDF ──────────────────────────────────────────────────────────

/// Configuration for placing an image on a single PDF page.
///
/// # Example
/// ```rust
/// use docpress::{ImageToPdfConfig, Orientation, PaperSize};
///
/// let config = ImageToPdfConfig::builder()
///     .paper(PaperSize::Letter, Orientation::Landscape)
///     .padding(12.7)
///     .title("Class diagram")
///     .build()
///     .unwrap();
/// assert_eq!(config.geometry.page_width, 279.4);
/// ```
#[derive(Clone, Default)]
pub struct ImageToPdfConfig {
    /// Page size and padding in millimetres. Default: A4 portrait, 10 mm padding.
    pub geometry: PageGeometry,

    /// PDF document title. If None, uses the source file stem.
    pub title: Option<String>,

    /// Pre-constructed renderer. If None, uses [`crate::pipeline::render::PrintPdfRenderer`].
    pub renderer: Option<Arc<dyn ImageRenderer>>,
}

impl fmt::Debug for ImageToPdfConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ImageToPdfConfig")
            .field("geometry", &self.geometry)
            .field("title", &self.title)
            .field("renderer", &self.renderer.as_ref().map(|_| "<dyn ImageRenderer>"))
            .finish()
    }
}

impl ImageToPdfConfig {
    /// Create a new builder for `ImageToPdfConfig`.
    pub fn builder() -> ImageToPdfConfigBuilder {
        ImageToPdfConfigBuilder {
            config: Self::default(),
        }
    }
}

/// Builder for [`ImageToPdfConfig`].
#[derive(Debug)]
pub struct ImageToPdfConfigBuilder {
    config: ImageToPdfConfig,
}

impl ImageToPdfConfigBuilder {
    pub fn geometry(mut self, geometry: PageGeometry) -> Self {
        self.config.geometry = geometry;
        self
    }

    /// Use a named paper size, keeping the current padding.
    pub fn paper(mut self, paper: PaperSize, orientation: Orientation) -> Self {
        let (w, h) = paper.oriented(orientation);
        self.config.geometry.page_width = w;
        self.config.geometry.page_height = h;
        self
    }

    /// Explicit page size in millimetres.
    pub fn page_size(mut self, width_mm: f64, height_mm: f64) -> Self {
        self.config.geometry.page_width = width_mm;
        self.config.geometry.page_height = height_mm;
        self
    }

    pub fn padding(mut self, padding_mm: f64) -> Self {
        self.config.geometry.padding = padding_mm;
        self
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.config.title = Some(title.into());
        self
    }

    pub fn renderer(mut self, renderer: Arc<dyn ImageRenderer>) -> Self {
        self.config.renderer = Some(renderer);
        self
    }

    /// Build the configuration, validating the page geometry.
    pub fn build(self) -> Result<ImageToPdfConfig, DocPressError> {
        self.config.geometry.validate()?;
        Ok(self.config)
    }
}

// ── Markdown → PDF ───────────────────────────────────────────────────────

/// Configuration for rendering a Markdown document with pandoc.
///
/// # Example
/// ```rust
/// use docpress::{Length, MarkdownToPdfConfig};
///
/// let config = MarkdownToPdfConfig::builder()
///     .margin("2.5cm".parse::<Length>().unwrap())
///     .pdf_engine("xelatex")
///     .variable("fontsize", "11pt")
///     .build()
///     .unwrap();
/// assert_eq!(config.margin.to_string(), "2.5cm");
/// ```
#[derive(Clone)]
pub struct MarkdownToPdfConfig {
    /// Page margin applied on all four sides. Default: 1in.
    pub margin: Length,

    /// pandoc reader name passed to `--from`. Default: "markdown".
    pub input_format: String,

    /// pandoc `--pdf-engine`. If None, pandoc picks its default (pdflatex).
    pub pdf_engine: Option<String>,

    /// Extra template variables, each passed as `-V key=value`.
    pub variables: Vec<(String, String)>,

    /// Explicit pandoc binary. If None, uses [`pandoc_auto::find_pandoc`].
    pub pandoc_path: Option<PathBuf>,

    /// Pre-constructed converter. Takes precedence over `pandoc_path`.
    pub converter: Option<Arc<dyn DocumentConverter>>,
}

impl Default for MarkdownToPdfConfig {
    fn default() -> Self {
        Self {
            margin: Length::new(1.0, LengthUnit::In),
            input_format: "markdown".to_string(),
            pdf_engine: None,
            variables: Vec::new(),
            pandoc_path: None,
            converter: None,
        }
    }
}

impl fmt::Debug for MarkdownToPdfConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MarkdownToPdfConfig")
            .field("margin", &self.margin)
            .field("input_format", &self.input_format)
            .field("pdf_engine", &self.pdf_engine)
            .field("variables", &self.variables)
            .field("pandoc_path", &self.pandoc_path)
            .field(
                "converter",
                &self.converter.as_ref().map(|_| "<dyn DocumentConverter>"),
            )
            .finish()
    }
}

impl MarkdownToPdfConfig {
    /// Create a new builder for `MarkdownToPdfConfig`.
    pub fn builder() -> MarkdownToPdfConfigBuilder {
        MarkdownToPdfConfigBuilder {
            config: Self::default(),
        }
    }
}

/// Builder for [`MarkdownToPdfConfig`].
#[derive(Debug)]
pub struct MarkdownToPdfConfigBuilder {
    config: MarkdownToPdfConfig,
}

impl MarkdownToPdfConfigBuilder {
    pub fn margin(mut self, margin: Length) -> Self {
        self.config.margin = margin;
        self
    }

    pub fn input_format(mut self, format: impl Into<String>) -> Self {
        self.config.input_format = format.into();
        self
    }

    pub fn pdf_engine(mut self, engine: impl Into<String>) -> Self {
        self.config.pdf_engine = Some(engine.into());
        self
    }

    pub fn variable(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.config.variables.push((key.into(), value.into()));
        self
    }

    pub fn pandoc_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.pandoc_path = Some(path.into());
        self
    }

    pub fn converter(mut self, converter: Arc<dyn DocumentConverter>) -> Self {
        self.config.converter = Some(converter);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<MarkdownToPdfConfig, DocPressError> {
        let c = &self.config;
        if !c.margin.value.is_finite() || c.margin.value < 0.0 {
            return Err(DocPressError::InvalidConfig(format!(
                "margin must be a finite, non-negative length, got {}",
                c.margin
            )));
        }
        if c.input_format.trim().is_empty() {
            return Err(DocPressError::InvalidConfig(
                "input format must not be empty".into(),
            ));
        }
        if matches!(c.pdf_engine.as_deref(), Some(e) if e.trim().is_empty()) {
            return Err(DocPressError::InvalidConfig(
                "pdf engine must not be empty".into(),
            ));
        }
        for (key, _) in &c.variables {
            if key.trim().is_empty() {
                return Err(DocPressError::InvalidConfig(
                    "variable names must not be empty".into(),
                ));
            }
            if key == "geometry" {
                return Err(DocPressError::InvalidConfig(
                    "set the page margin with `margin`, not a `geometry` variable".into(),
                ));
            }
        }
        Ok(self.config)
    }
}

// ── Enums ────────────────────────────────────────────────────────────────

/// Named paper sizes.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub enum PaperSize {
    A3,
    /// 210 × 297 mm (default)
    #[default]
    A4,
    A5,
    Letter,
    Legal,
    Tabloid,
    /// Used exactly as given in portrait; landscape puts the longer side
    /// horizontally.
    Custom { width_mm: f64, height_mm: f64 },
}

impl PaperSize {
    /// Portrait dimensions in millimetres (width, height).
    pub fn dimensions_mm(&self) -> (f64, f64) {
        match self {
            Self::A3 => (297.0, 420.0),
            Self::A4 => (210.0, 297.0),
            Self::A5 => (148.0, 210.0),
            Self::Letter => (215.9, 279.4),
            Self::Legal => (215.9, 355.6),
            Self::Tabloid => (279.4, 431.8),
            Self::Custom {
                width_mm,
                height_mm,
            } => (*width_mm, *height_mm),
        }
    }

    /// Page `(width, height)` in millimetres for `orientation`.
    pub fn oriented(&self, orientation: Orientation) -> (f64, f64) {
        match (self, orientation) {
            (Self::Custom { .. }, Orientation::Portrait) => self.dimensions_mm(),
            _ => orientation.apply(self.dimensions_mm()),
        }
    }
}

impl FromStr for PaperSize {
    type Err = DocPressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "a3" => Ok(Self::A3),
            "a4" => Ok(Self::A4),
            "a5" => Ok(Self::A5),
            "letter" => Ok(Self::Letter),
            "legal" => Ok(Self::Legal),
            "tabloid" | "ledger" => Ok(Self::Tabloid),
            other => Err(DocPressError::InvalidConfig(format!(
                "unknown paper size '{other}' (expected a3, a4, a5, letter, legal or tabloid)"
            ))),
        }
    }
}

/// Page orientation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Orientation {
    #[default]
    Portrait,
    /// Width and height swapped.
    Landscape,
}

impl Orientation {
    /// Orient portrait `(width, height)` dimensions.
    pub fn apply(self, (w, h): (f64, f64)) -> (f64, f64) {
        match self {
            Orientation::Portrait => (w.min(h), w.max(h)),
            Orientation::Landscape => (w.max(h), w.min(h)),
        }
    }
}

/// Unit of a [`Length`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LengthUnit {
    In,
    Cm,
    Mm,
    Pt,
}

impl LengthUnit {
    fn suffix(self) -> &'static str {
        match self {
            LengthUnit::In => "in",
            LengthUnit::Cm => "cm",
            LengthUnit::Mm => "mm",
            LengthUnit::Pt => "pt",
        }
    }

    fn mm_per_unit(self) -> f64 {
        match self {
            LengthUnit::In => 25.4,
            LengthUnit::Cm => 10.0,
            LengthUnit::Mm => 1.0,
            LengthUnit::Pt => 25.4 / 72.0,
        }
    }
}

/// A physical length such as `1in` or `2.5cm`.
///
/// Parses the forms LaTeX's `geometry` package and people both write
/// (`1in`, `1 inch`, `25 mm`, `72pt`); displays the compact LaTeX form.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Length {
    pub value: f64,
    pub unit: LengthUnit,
}

static LENGTH_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*(\d+(?:\.\d*)?|\.\d+)\s*([A-Za-z]+)\s*$").expect("valid regex"));

impl Length {
    pub fn new(value: f64, unit: LengthUnit) -> Self {
        Self { value, unit }
    }

    pub fn to_mm(&self) -> f64 {
        self.value * self.unit.mm_per_unit()
    }
}

impl FromStr for Length {
    type Err = DocPressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || {
            DocPressError::InvalidConfig(format!(
                "invalid length '{s}' (expected a number with a unit, e.g. 1in, 2.5cm, 20mm, 72pt)"
            ))
        };

        let caps = LENGTH_RE.captures(s).ok_or_else(invalid)?;
        let value: f64 = caps[1].parse().map_err(|_| invalid())?;
        let unit = match caps[2].to_lowercase().as_str() {
            "in" | "inch" | "inches" => LengthUnit::In,
            "cm" | "centimetre" | "centimetres" | "centimeter" | "centimeters" => LengthUnit::Cm,
            "mm" | "millimetre" | "millimetres" | "millimeter" | "millimeters" => LengthUnit::Mm,
            "pt" | "point" | "points" => LengthUnit::Pt,
            _ => return Err(invalid()),
        };

        if !value.is_finite() {
            return Err(invalid());
        }
        Ok(Self { value, unit })
    }
}

impl fmt::Display for Length {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.value, self.unit.suffix())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn length_parses_common_forms() {
        let l: Length = "1in".parse().unwrap();
        assert_eq!(l, Length::new(1.0, LengthUnit::In));
        let l: Length = "1 inch".parse().unwrap();
        assert_eq!(l.unit, LengthUnit::In);
        let l: Length = " 2.5cm ".parse().unwrap();
        assert_eq!(l, Length::new(2.5, LengthUnit::Cm));
        let l: Length = "72 PT".parse().unwrap();
        assert_eq!(l.unit, LengthUnit::Pt);
        let l: Length = ".5in".parse().unwrap();
        assert_eq!(l.value, 0.5);
    }

    #[test]
    fn length_rejects_garbage() {
        for s in ["", "abc", "5", "-1in", "1 furlong", "1in2", "in"] {
            assert!(s.parse::<Length>().is_err(), "{s:?} should not parse");
        }
    }

    #[test]
    fn length_display_is_latex_form() {
        assert_eq!(Length::new(1.0, LengthUnit::In).to_string(), "1in");
        assert_eq!(Length::new(2.5, LengthUnit::Cm).to_string(), "2.5cm");
        assert_eq!("1 inch".parse::<Length>().unwrap().to_string(), "1in");
    }

    #[test]
    fn length_converts_to_mm() {
        assert!((Length::new(1.0, LengthUnit::In).to_mm() - 25.4).abs() < 1e-12);
        assert!((Length::new(72.0, LengthUnit::Pt).to_mm() - 25.4).abs() < 1e-9);
    }

    #[test]
    fn landscape_swaps_dimensions() {
        assert_eq!(
            Orientation::Landscape.apply(PaperSize::A4.dimensions_mm()),
            (297.0, 210.0)
        );
        assert_eq!(
            Orientation::Portrait.apply(PaperSize::A4.dimensions_mm()),
            (210.0, 297.0)
        );
    }

    #[test]
    fn custom_paper_is_literal_in_portrait() {
        let banner = PaperSize::Custom {
            width_mm: 300.0,
            height_mm: 100.0,
        };
        assert_eq!(banner.oriented(Orientation::Portrait), (300.0, 100.0));
        assert_eq!(banner.oriented(Orientation::Landscape), (300.0, 100.0));

        let card = PaperSize::Custom {
            width_mm: 55.0,
            height_mm: 85.0,
        };
        assert_eq!(card.oriented(Orientation::Landscape), (85.0, 55.0));

        let c = ImageToPdfConfig::builder()
            .paper(banner, Orientation::Portrait)
            .padding(5.0)
            .build()
            .unwrap();
        assert_eq!(c.geometry, PageGeometry::new(300.0, 100.0, 5.0));
    }

    #[test]
    fn paper_size_parses_names() {
        assert_eq!("A4".parse::<PaperSize>().unwrap(), PaperSize::A4);
        assert_eq!("letter".parse::<PaperSize>().unwrap(), PaperSize::Letter);
        assert!("b5".parse::<PaperSize>().is_err());
    }

    #[test]
    fn image_config_defaults_to_a4() {
        let c = ImageToPdfConfig::default();
        assert_eq!(c.geometry, PageGeometry::new(210.0, 297.0, 10.0));
    }

    #[test]
    fn image_config_rejects_oversized_padding() {
        let err = ImageToPdfConfig::builder().padding(150.0).build().unwrap_err();
        assert!(matches!(err, DocPressError::InvalidGeometry(_)));
    }

    #[test]
    fn markdown_config_defaults() {
        let c = MarkdownToPdfConfig::builder().build().unwrap();
        assert_eq!(c.margin.to_string(), "1in");
        assert_eq!(c.input_format, "markdown");
        assert!(c.pdf_engine.is_none());
    }

    #[test]
    fn markdown_config_rejects_unusable_margins() {
        for value in [-1.0, f64::NAN, f64::INFINITY] {
            let err = MarkdownToPdfConfig::builder()
                .margin(Length::new(value, LengthUnit::In))
                .build()
                .unwrap_err();
            assert!(matches!(err, DocPressError::InvalidConfig(_)), "{value}");
        }

        let c = MarkdownToPdfConfig::builder()
            .margin(Length::new(0.0, LengthUnit::Mm))
            .build()
            .unwrap();
        assert_eq!(c.margin.to_string(), "0mm");
    }

    #[test]
    fn markdown_config_rejects_geometry_variable() {
        let err = MarkdownToPdfConfig::builder()
            .variable("geometry", "margin=2in")
            .build()
            .unwrap_err();
        assert!(matches!(err, DocPressError::InvalidConfig(_)));
    }
}
