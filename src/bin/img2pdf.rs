//! CLI binary for the image → PDF pipeline.
//!
//! A thin shim over the library crate that maps CLI flags
//! to `ImageToPdfConfig` and prints results.

use anyhow::{Context, Result};
use clap::Parser;
use docpress::{
    default_output_path, fit_image, image_to_pdf, inspect_image, ImageToPdfConfig, Orientation,
    PaperSize,
};
use std::io;
use std::path::PathBuf;
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
  # A4 page, 10 mm padding, writes diagram.pdf next to the image
  img2pdf diagram.png

  # Explicit output, US Letter landscape, half-inch padding
  img2pdf photo.jpg -o photo-print.pdf --paper letter --landscape --padding 12.7

  # Custom page size in millimetres
  img2pdf badge.png --page-width 85 --page-height 55 --padding 3

  # Show the computed placement without writing anything
  img2pdf --inspect-only diagram.png

LAYOUT:
  The image is scaled by min(available_width / image_width,
  available_height / image_height), where available = page - 2 * padding,
  and centred inside the padded region. Aspect ratio is always preserved;
  small images are scaled up to fill the available width or height.

ENVIRONMENT VARIABLES:
  IMG2PDF_OUTPUT, IMG2PDF_PAPER, IMG2PDF_PADDING, IMG2PDF_TITLE, ...
  RUST_LOG       Override log filtering (e.g. RUST_LOG=docpress=debug)
"#;

/// Place an image on a single PDF page, scaled to fit and centred.
#[derive(Parser, Debug)]
#[command(
    name = "img2pdf",
    version,
    about = "Place an image on a single PDF page, scaled to fit and centred",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Source image (PNG, JPEG, GIF, BMP, WebP).
    input: PathBuf,

    /// Write the PDF here instead of next to the input.
    #[arg(short, long, env = "IMG2PDF_OUTPUT")]
    output: Option<PathBuf>,

    /// Paper size: a3, a4, a5, letter, legal, tabloid.
    #[arg(long, env = "IMG2PDF_PAPER", default_value = "a4",
          conflicts_with_all = ["page_width", "page_height"])]
    paper: String,

    /// Rotate the paper to landscape.
    #[arg(long, env = "IMG2PDF_LANDSCAPE")]
    landscape: bool,

    /// Custom page width in millimetres (requires --page-height).
    #[arg(long, env = "IMG2PDF_PAGE_WIDTH", requires = "page_height")]
    page_width: Option<f64>,

    /// Custom page height in millimetres (requires --page-width).
    #[arg(long, env = "IMG2PDF_PAGE_HEIGHT", requires = "page_width")]
    page_height: Option<f64>,

    /// Padding on every side, in millimetres.
    #[arg(long, env = "IMG2PDF_PADDING", default_value_t = 10.0)]
    padding: f64,

    /// PDF title metadata. Defaults to the image file name.
    #[arg(long, env = "IMG2PDF_TITLE")]
    title: Option<String>,

    /// Print the result as JSON.
    #[arg(long, env = "IMG2PDF_JSON")]
    json: bool,

    /// Print image metadata and the computed placement only; write nothing.
    #[arg(long)]
    inspect_only: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "IMG2PDF_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "IMG2PDF_QUIET")]
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

    let config = build_config(&cli)?;

    // ── Inspect-only mode ────────────────────────────────────────────────
    if cli.inspect_only {
        let info = inspect_image(&cli.input)
            .await
            .context("Failed to inspect image")?;
        let placement = fit_image(&config.geometry, info.width as f64, info.height as f64)
            .context("Image cannot be placed on this page")?;

        if cli.json {
            let json = serde_json::json!({ "source": info, "geometry": config.geometry, "placement": placement });
            println!(
                "{}",
                serde_json::to_string_pretty(&json).context("Failed to serialise metadata")?
            );
        } else {
            let g = &config.geometry;
            println!("File:         {}", cli.input.display());
            println!("Pixels:       {} x {}", info.width, info.height);
            if let Some(ref f) = info.format {
                println!("Format:       {}", f);
            }
            println!("Page:         {} x {} mm, padding {} mm", g.page_width, g.page_height, g.padding);
            println!("Scale:        {:.6} mm/px", placement.scale);
            println!(
                "Placed:       {:.2} x {:.2} mm at ({:.2}, {:.2})",
                placement.placed_width, placement.placed_height, placement.offset_x, placement.offset_y
            );
        }
        return Ok(());
    }

    // ── Run conversion ───────────────────────────────────────────────────
    let output_path = cli
        .output
        .clone()
        .unwrap_or_else(|| default_output_path(&cli.input));

    let result = image_to_pdf(&cli.input, &output_path, &config)
        .await
        .context("Conversion failed")?;

    if cli.json {
        println!(
            "{}",
            serde_json::to_string_pretty(&result).context("Failed to serialise output")?
        );
    } else if !cli.quiet {
        let p = &result.placement;
        eprintln!(
            "{}  {}x{} px  →  {:.1}x{:.1} mm at ({:.1}, {:.1})  {}ms  →  {}",
            green("✔"),
            result.source.width,
            result.source.height,
            p.placed_width,
            p.placed_height,
            p.offset_x,
            p.offset_y,
            result.duration_ms,
            bold(&output_path.display().to_string()),
        );
        eprintln!("   {}", dim(&format!("{} bytes", result.bytes_written)));
    }

    Ok(())
}

/// Map CLI args to `ImageToPdfConfig`.
fn build_config(cli: &Cli) -> Result<ImageToPdfConfig> {
    let orientation = if cli.landscape {
        Orientation::Landscape
    } else {
        Orientation::Portrait
    };

    let paper = match (cli.page_width, cli.page_height) {
        (Some(width_mm), Some(height_mm)) => PaperSize::Custom {
            width_mm,
            height_mm,
        },
        _ => cli.paper.parse::<PaperSize>()?,
    };

    let mut builder = ImageToPdfConfig::builder()
        .paper(paper, orientation)
        .padding(cli.padding);

    if let Some(ref title) = cli.title {
        builder = builder.title(title.clone());
    }

    builder.build().context("Invalid page geometry")
}
