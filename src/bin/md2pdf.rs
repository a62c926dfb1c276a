//! CLI binary for the Markdown → PDF pipeline.
//!
//! A thin shim over the library crate that maps CLI flags to
//! `MarkdownToPdfConfig`, runs the optional pandoc setup step, and prints
//! results.

use anyhow::{bail, Context, Result};
use clap::Parser;
use docpress::{
    default_output_path, markdown_to_pdf, setup_pandoc, Length, MarkdownToPdfConfig,
    PandocConverter,
};
use indicatif::{ProgressBar, ProgressStyle};
use std::io;
use std::path::PathBuf;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # README.md → README.pdf with 1in margins
  md2pdf README.md

  # Install pandoc first if it is missing, then convert
  md2pdf --install-pandoc README.md

  # Only install pandoc (safe to repeat)
  md2pdf --install-only

  # Wider margins, XeLaTeX, custom font
  md2pdf notes.md -o notes.pdf --margin 2.5cm --pdf-engine xelatex -V mainfont="DejaVu Serif"

REQUIREMENTS:
  pandoc, plus a PDF engine pandoc can drive (pdflatex by default; see
  --pdf-engine). md2pdf never downloads anything unless --install-pandoc
  or --install-only is given.

ENVIRONMENT VARIABLES:
  PANDOC_PATH             Path to an existing pandoc binary
  PANDOC_AUTO_CACHE_DIR   Override the pandoc download cache directory
  MD2PDF_MARGIN, MD2PDF_PDF_ENGINE, MD2PDF_OUTPUT, ...
  RUST_LOG                Override log filtering (e.g. RUST_LOG=docpress=debug)
"#;

/// Render Markdown to PDF with pandoc.
#[derive(Parser, Debug)]
#[command(
    name = "md2pdf",
    version,
    about = "Render Markdown to PDF with pandoc",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Markdown source file.
    input: Option<PathBuf>,

    /// Write the PDF here instead of next to the input.
    #[arg(short, long, env = "MD2PDF_OUTPUT")]
    output: Option<PathBuf>,

    /// Page margin on all sides, e.g. 1in, 2.5cm, 20mm, 72pt.
    #[arg(long, env = "MD2PDF_MARGIN", default_value = "1in")]
    margin: String,

    /// pandoc --pdf-engine (pdflatex, xelatex, lualatex, wkhtmltopdf, typst, ...).
    #[arg(long, env = "MD2PDF_PDF_ENGINE")]
    pdf_engine: Option<String>,

    /// pandoc input format.
    #[arg(long, env = "MD2PDF_FROM", default_value = "markdown")]
    from: String,

    /// Extra template variable KEY=VALUE (repeatable).
    #[arg(short = 'V', long = "variable", value_name = "KEY=VALUE")]
    variables: Vec<String>,

    /// Use this pandoc binary instead of searching for one.
    #[arg(long, env = "MD2PDF_PANDOC")]
    pandoc: Option<PathBuf>,

    /// Download pandoc first if it is not installed.
    #[arg(long, env = "MD2PDF_INSTALL_PANDOC")]
    install_pandoc: bool,

    /// Make sure pandoc is installed, then exit.
    #[arg(long, conflicts_with = "install_pandoc")]
    install_only: bool,

    /// Print the result as JSON.
    #[arg(long, env = "MD2PDF_JSON")]
    json: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "MD2PDF_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "MD2PDF_QUIET")]
    quiet: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    // ── Optional pandoc setup ────────────────────────────────────────────
    // Only runs when asked: conversions themselves never download.
    if cli.install_pandoc || cli.install_only {
        let path = install_pandoc(cli.quiet)?;
        if cli.install_only {
            let version = PandocConverter::new(&path).version().unwrap_or_default();
            if !cli.quiet {
                eprintln!("{}  {}  {}", green("✔"), bold(&path.display().to_string()), dim(&version));
            }
            return Ok(());
        }
    }

    let Some(ref input) = cli.input else {
        bail!("No input file given (pass a Markdown file, or --install-only)");
    };

    let config = build_config(&cli)?;

    // ── Run conversion ───────────────────────────────────────────────────
    let output_path = cli
        .output
        .clone()
        .unwrap_or_else(|| default_output_path(input));

    let result = markdown_to_pdf(input, &output_path, &config)
        .await
        .context("Conversion failed")?;

    if cli.json {
        println!(
            "{}",
            serde_json::to_string_pretty(&result).context("Failed to serialise output")?
        );
    } else if !cli.quiet {
        eprintln!(
            "{}  {}  {}ms  →  {}",
            green("✔"),
            input.display(),
            result.duration_ms,
            bold(&output_path.display().to_string()),
        );
        eprintln!("   {}", dim(&format!("{} bytes", result.bytes_written)));
    }

    Ok(())
}

/// Run the idempotent pandoc setup step, with a download bar unless quiet.
fn install_pandoc(quiet: bool) -> Result<PathBuf> {
    if quiet || pandoc_auto::is_pandoc_available() {
        return tokio::task::block_in_place(|| setup_pandoc(None))
            .context("Failed to install pandoc");
    }

    let dl_bar = ProgressBar::new(0);
    dl_bar.set_style(
        ProgressStyle::with_template(
            "{spinner:.cyan} {prefix:.bold}  \
             [{bar:42.green/238}] {bytes}/{total_bytes}  ETA {eta_precise}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏  ")
        .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]),
    );
    dl_bar.set_prefix("pandoc");
    dl_bar.set_message("Connecting…");
    dl_bar.enable_steady_tick(Duration::from_millis(80));

    let bar = dl_bar.clone();
    let path = tokio::task::block_in_place(|| {
        setup_pandoc(Some(&|downloaded, total| {
            if let Some(t) = total {
                if bar.length().unwrap_or(0) != t {
                    bar.set_length(t);
                }
            }
            bar.set_position(downloaded);
        }))
    })
    .context("Failed to install pandoc")?;

    dl_bar.finish_with_message("ready ✓");
    Ok(path)
}

/// Map CLI args to `MarkdownToPdfConfig`.
fn build_config(cli: &Cli) -> Result<MarkdownToPdfConfig> {
    let margin: Length = cli.margin.parse().context("Invalid --margin")?;

    let mut builder = MarkdownToPdfConfig::builder()
        .margin(margin)
        .input_format(cli.from.clone());

    if let Some(ref engine) = cli.pdf_engine {
        builder = builder.pdf_engine(engine.clone());
    }
    if let Some(ref pandoc) = cli.pandoc {
        builder = builder.pandoc_path(pandoc.clone());
    }
    for var in &cli.variables {
        let (key, value) = parse_variable(var)?;
        builder = builder.variable(key, value);
    }

    builder.build().context("Invalid configuration")
}

/// Parse `KEY=VALUE` (or a bare `KEY`, which pandoc treats as `true`).
fn parse_variable(s: &str) -> Result<(String, String)> {
    let (key, value) = match s.split_once('=') {
        Some((k, v)) => (k.trim(), v),
        None => (s.trim(), "true"),
    };
    if key.is_empty() {
        bail!("Invalid variable '{s}': expected KEY=VALUE");
    }
    Ok((key.to_string(), value.to_string()))
}
