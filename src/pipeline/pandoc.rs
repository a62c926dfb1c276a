//! Document conversion through an external tool (pandoc).
//!
//! The [`DocumentConverter`] trait is the only seam between the Markdown
//! pipeline and the outside world: it receives a fully resolved
//! [`ConversionRequest`] and must leave a PDF at `request.output`.
//! [`PandocConverter`] runs the `pandoc` binary as a child process; tests
//! swap in fakes.
//!
//! Locating pandoc never downloads it. A missing binary surfaces as
//! [`DocPressError::ConversionToolUnavailable`] with a hint pointing at the
//! explicit setup step.

use crate::config::{Length, MarkdownToPdfConfig};
use crate::error::DocPressError;
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::{debug, info};

/// Everything a converter needs for one run.
#[derive(Debug, Clone)]
pub struct ConversionRequest {
    pub input: PathBuf,
    /// Where the converter must write the PDF. Ends in `.pdf`.
    pub output: PathBuf,
    pub input_format: String,
    pub margin: Length,
    pub pdf_engine: Option<String>,
    pub variables: Vec<(String, String)>,
}

impl ConversionRequest {
    pub fn new(input: &Path, output: &Path, config: &MarkdownToPdfConfig) -> Self {
        Self {
            input: input.to_path_buf(),
            output: output.to_path_buf(),
            input_format: config.input_format.clone(),
            margin: config.margin,
            pdf_engine: config.pdf_engine.clone(),
            variables: config.variables.clone(),
        }
    }

    /// Command-line arguments for pandoc, excluding the program name.
    pub fn pandoc_args(&self) -> Vec<String> {
        let mut args = vec![
            "--from".to_string(),
            self.input_format.clone(),
            "-V".to_string(),
            format!("geometry:margin={}", self.margin),
        ];
        if let Some(ref engine) = self.pdf_engine {
            args.push("--pdf-engine".to_string());
            args.push(engine.clone());
        }
        for (key, value) in &self.variables {
            args.push("-V".to_string());
            args.push(format!("{key}={value}"));
        }
        args.push(self.input.to_string_lossy().into_owned());
        args.push("-o".to_string());
        args.push(self.output.to_string_lossy().into_owned());
        args
    }
}

/// Converts a source document into a PDF at `request.output`.
///
/// Implementations are blocking; callers run them off the async executor.
pub trait DocumentConverter: Send + Sync {
    /// Short tool name used in errors and logs.
    fn name(&self) -> &str;

    fn convert(&self, request: &ConversionRequest) -> Result<(), DocPressError>;
}

/// [`DocumentConverter`] that shells out to pandoc.
#[derive(Debug, Clone)]
pub struct PandocConverter {
    binary: PathBuf,
}

impl PandocConverter {
    /// Use the pandoc binary at `binary`.
    pub fn new(binary: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
        }
    }

    /// Locate an installed pandoc (see [`pandoc_auto::find_pandoc`]).
    pub fn locate() -> Result<Self, DocPressError> {
        pandoc_auto::find_pandoc()
            .map(Self::new)
            .ok_or_else(|| unavailable("pandoc was not found in PANDOC_PATH, the download cache, or PATH"))
    }

    /// Build from config: explicit path if set, else [`PandocConverter::locate`].
    pub fn from_config(config: &MarkdownToPdfConfig) -> Result<Self, DocPressError> {
        match config.pandoc_path {
            Some(ref path) if path.is_file() => Ok(Self::new(path)),
            Some(ref path) => Err(unavailable(&format!(
                "configured pandoc '{}' does not exist",
                path.display()
            ))),
            None => Self::locate(),
        }
    }

    pub fn binary(&self) -> &Path {
        &self.binary
    }

    /// First line of `pandoc --version`, e.g. `pandoc 3.6.4`.
    pub fn version(&self) -> Result<String, DocPressError> {
        let output = Command::new(&self.binary)
            .arg("--version")
            .output()
            .map_err(|e| spawn_error(&self.binary, e))?;
        let stdout = String::from_utf8_lossy(&output.stdout);
        Ok(stdout.lines().next().unwrap_or_default().trim().to_string())
    }
}

impl DocumentConverter for PandocConverter {
    fn name(&self) -> &str {
        "pandoc"
    }

    fn convert(&self, request: &ConversionRequest) -> Result<(), DocPressError> {
        let args = request.pandoc_args();
        debug!("Running {} {}", self.binary.display(), args.join(" "));

        let output = Command::new(&self.binary)
            .args(&args)
            .output()
            .map_err(|e| spawn_error(&self.binary, e))?;

        if !output.status.success() {
            return Err(DocPressError::ConversionFailed {
                tool: self.name().to_string(),
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        info!("pandoc wrote {}", request.output.display());
        Ok(())
    }
}

fn unavailable(reason: &str) -> DocPressError {
    DocPressError::ConversionToolUnavailable {
        tool: "pandoc".to_string(),
        hint: format!(
            "{reason}.\n\
             Install it with `md2pdf --install-pandoc`, from https://pandoc.org/installing.html,\n\
             or point PANDOC_PATH at an existing binary."
        ),
    }
}

fn spawn_error(binary: &Path, e: std::io::Error) -> DocPressError {
    if e.kind() == std::io::ErrorKind::NotFound {
        unavailable(&format!("'{}' could not be executed", binary.display()))
    } else {
        DocPressError::ConversionFailed {
            tool: "pandoc".to_string(),
            status: "not started".to_string(),
            stderr: e.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LengthUnit;

    fn request(config: &MarkdownToPdfConfig) -> ConversionRequest {
        ConversionRequest::new(Path::new("README.md"), Path::new("/tmp/out.pdf"), config)
    }

    #[test]
    fn default_args_carry_one_inch_margin() {
        let args = request(&MarkdownToPdfConfig::default()).pandoc_args();
        assert_eq!(
            args,
            vec![
                "--from",
                "markdown",
                "-V",
                "geometry:margin=1in",
                "README.md",
                "-o",
                "/tmp/out.pdf"
            ]
        );
    }

    #[test]
    fn engine_and_variables_are_forwarded() {
        let config = MarkdownToPdfConfig::builder()
            .margin(Length::new(2.5, LengthUnit::Cm))
            .pdf_engine("xelatex")
            .variable("mainfont", "DejaVu Serif")
            .build()
            .unwrap();
        let args = request(&config).pandoc_args();

        assert!(args.contains(&"geometry:margin=2.5cm".to_string()));
        let engine = args.iter().position(|a| a == "--pdf-engine").unwrap();
        assert_eq!(args[engine + 1], "xelatex");
        assert!(args.contains(&"mainfont=DejaVu Serif".to_string()));
        assert_eq!(args[args.len() - 2], "-o");
    }

    #[test]
    fn missing_configured_binary_is_unavailable() {
        let config = MarkdownToPdfConfig::builder()
            .pandoc_path("/no/such/pandoc")
            .build()
            .unwrap();
        let err = PandocConverter::from_config(&config).unwrap_err();
        assert!(matches!(err, DocPressError::ConversionToolUnavailable { .. }));
    }

    #[test]
    fn unexecutable_binary_is_unavailable() {
        let converter = PandocConverter::new("/no/such/pandoc");
        let err = converter
            .convert(&request(&MarkdownToPdfConfig::default()))
            .unwrap_err();
        assert!(matches!(err, DocPressError::ConversionToolUnavailable { .. }), "{err:?}");
    }
}
