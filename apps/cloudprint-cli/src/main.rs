//! CloudPrint command line
//!
//! Prepares PDFs for a print shop: adaptive colour inversion, page tools and
//! price quotes.

mod config;

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use cloudprint_core::{
    calculate_pdf_price, calculate_sheets, compress_document, format_price, get_page_count,
    merge_documents, parse_range_pairs, parse_ranges, split_document, split_ranges, InvertMode,
    InvertOptions, PrintJob, PrintType,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;

#[derive(Parser, Debug)]
#[command(name = "cloudprint")]
#[command(version, about = "Prepare PDFs for printing")]
struct Args {
    /// TOML file with [invert], [render] and [pricing] tables
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log at debug level (ignored when RUST_LOG is set)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Invert dark pages and dark regions so the document prints on white
    Invert {
        input: PathBuf,
        #[arg(short, long)]
        output: PathBuf,
        /// smart (classify each page) or full (negate everything)
        #[arg(long)]
        mode: Option<InvertMode>,
        /// Render scale in pixels per point
        #[arg(long)]
        scale: Option<f32>,
        /// Directory containing the libpdfium shared library
        #[arg(long)]
        pdfium_dir: Option<PathBuf>,
    },
    /// Concatenate PDFs in the order given
    Merge {
        #[arg(required = true, num_args = 1..)]
        inputs: Vec<PathBuf>,
        #[arg(short, long)]
        output: PathBuf,
    },
    /// Extract pages, e.g. --ranges "1-3, 5"
    Split {
        input: PathBuf,
        #[arg(long)]
        ranges: String,
        #[arg(short, long)]
        output: PathBuf,
        /// Write one file per range (<output>-1.pdf, <output>-2.pdf, ...)
        #[arg(long)]
        separate: bool,
    },
    /// Strip metadata and compress streams
    Compress {
        input: PathBuf,
        #[arg(short, long)]
        output: PathBuf,
    },
    /// Page count and sheet estimate
    Info { input: PathBuf },
    /// Price a print job
    Quote {
        #[arg(long)]
        pages: u32,
        #[arg(long)]
        color: bool,
        #[arg(long, default_value_t = 1, value_parser = parse_slides_per_page)]
        slides_per_page: u32,
        #[arg(long, default_value_t = 1)]
        copies: u32,
    },
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Logs go to stderr so stdout stays clean for command output
    let rust_log = std::env::var("RUST_LOG").ok();
    tracing_subscriber::registry()
        .with(log_filter(rust_log.as_deref(), args.verbose))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config = Config::load(args.config.as_deref())?;

    match args.command {
        Command::Invert {
            input,
            output,
            mode,
            scale,
            pdfium_dir,
        } => {
            let mut options = InvertOptions {
                mode: mode.unwrap_or(config.invert.mode),
                config: config.invert.tuning.clone(),
                cancel: None,
            };
            if let Some(scale) = scale {
                options.config.render_scale = scale;
            }
            let library_dir = pdfium_dir.or_else(|| config.render.library_dir.clone());
            invert(&input, &output, &options, library_dir.as_deref())?;
        }
        Command::Merge { inputs, output } => {
            let documents = inputs
                .iter()
                .map(|path| read_pdf(path))
                .collect::<anyhow::Result<Vec<_>>>()?;
            let merged = merge_documents(documents)?;
            write_pdf(&output, &merged)?;
            println!(
                "Merged {} files into {} ({} pages)",
                inputs.len(),
                output.display(),
                get_page_count(&merged)?
            );
        }
        Command::Split {
            input,
            ranges,
            output,
            separate,
        } => {
            let bytes = read_pdf(&input)?;
            if separate {
                let pairs = parse_range_pairs(&ranges)?;
                for (i, part) in split_ranges(&bytes, &pairs)?.iter().enumerate() {
                    let path = numbered_path(&output, i + 1);
                    write_pdf(&path, part)?;
                    println!("{}", path.display());
                }
            } else {
                let pages = parse_ranges(&ranges)?;
                let count = pages.len();
                write_pdf(&output, &split_document(&bytes, pages)?)?;
                println!("Wrote {} pages to {}", count, output.display());
            }
        }
        Command::Compress { input, output } => {
            let outcome = compress_document(&read_pdf(&input)?)?;
            write_pdf(&output, &outcome.bytes)?;
            println!(
                "{} -> {} bytes ({:.1}% saved)",
                outcome.original_size,
                outcome.compressed_size,
                outcome.savings_percent()
            );
        }
        Command::Info { input } => {
            let bytes = read_pdf(&input)?;
            let pages = get_page_count(&bytes)?;
            println!("File:   {}", input.display());
            println!("Size:   {} bytes", bytes.len());
            println!("Pages:  {}", pages);
            println!(
                "Sheets: {} (double-sided, 1 slide per page)",
                calculate_sheets(pages, 1)
            );
        }
        Command::Quote {
            pages,
            color,
            slides_per_page,
            copies,
        } => {
            let job = PrintJob {
                print_type: if color {
                    PrintType::Color
                } else {
                    PrintType::BlackWhite
                },
                slides_per_page,
                copies,
                ..PrintJob::new(pages)
            };
            let quote = calculate_pdf_price(&job, &config.pricing);
            println!("Sheets:    {}", quote.sheets);
            println!("Per sheet: {}", format_price(quote.price_per_sheet));
            println!("Per copy:  {}", format_price(quote.price_per_copy));
            println!("Total:     {}", format_price(quote.total_price));
        }
    }

    Ok(())
}

#[cfg(feature = "pdfium")]
fn invert(
    input: &Path,
    output: &Path,
    options: &InvertOptions,
    library_dir: Option<&Path>,
) -> anyhow::Result<()> {
    use cloudprint_core::{invert_document, PageClassification, PdfiumRasterizer};

    let bytes = read_pdf(input)?;
    let rasterizer = PdfiumRasterizer::bind(library_dir)?;

    let outcome = invert_document(&rasterizer, &bytes, options, |page, total| {
        tracing::info!("page {}/{}", page, total);
    })
    .with_context(|| format!("Failed to invert {}", input.display()))?;

    write_pdf(output, &outcome.bytes)?;

    let dark = outcome
        .pages
        .iter()
        .filter(|report| report.classification == Some(PageClassification::Dark))
        .count();
    println!(
        "Inverted {} pages ({} dark, {} light) into {}",
        outcome.pages.len(),
        dark,
        outcome.pages.len() - dark,
        output.display()
    );
    Ok(())
}

#[cfg(not(feature = "pdfium"))]
fn invert(
    _input: &Path,
    _output: &Path,
    _options: &InvertOptions,
    _library_dir: Option<&Path>,
) -> anyhow::Result<()> {
    bail!("Page rendering not enabled. Rebuild with --features pdfium")
}

/// RUST_LOG when it is set and parses, otherwise info (debug with `--verbose`)
fn log_filter(rust_log: Option<&str>, verbose: bool) -> EnvFilter {
    rust_log
        .filter(|directives| !directives.trim().is_empty())
        .and_then(|directives| EnvFilter::try_new(directives).ok())
        .unwrap_or_else(|| EnvFilter::new(if verbose { "debug" } else { "info" }))
}

fn read_pdf(path: &Path) -> anyhow::Result<Vec<u8>> {
    let bytes = fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;
    if !bytes.starts_with(b"%PDF-") {
        bail!("{} is not a PDF file", path.display());
    }
    Ok(bytes)
}

fn write_pdf(path: &Path, bytes: &[u8]) -> anyhow::Result<()> {
    fs::write(path, bytes).with_context(|| format!("Failed to write {}", path.display()))
}

/// `out.pdf` -> `out-2.pdf`
fn numbered_path(base: &Path, n: usize) -> PathBuf {
    let stem = base
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "split".to_string());
    base.with_file_name(format!("{}-{}.pdf", stem, n))
}

fn parse_slides_per_page(value: &str) -> Result<u32, String> {
    let slides: u32 = value
        .parse()
        .map_err(|_| format!("'{}' is not a number", value))?;
    if cloudprint_core::pricing::SLIDES_PER_PAGE_OPTIONS.contains(&slides) {
        Ok(slides)
    } else {
        Err(format!(
            "slides per page must be one of {:?}",
            cloudprint_core::pricing::SLIDES_PER_PAGE_OPTIONS
        ))
    }
}
