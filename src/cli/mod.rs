//! Command-line interface for grovegrid.

use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use log::{error, info, warn};
use std::path::{Path, PathBuf};
use std::time::Instant;

use crate::pipeline::{self, BuildRequest};
use crate::PipelineConfig;

#[derive(Parser)]
#[command(name = "grovegrid")]
#[command(about = "Merge time-sliced grid CSV files into a heatmap dataset", version)]
pub struct Cli {
    /// Path to YAML config file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Increase verbosity
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the page (and optional JSON dump) from a directory of slices
    Build {
        /// Input directory with one CSV file per slice (e.g. 2025-01.csv)
        #[arg(default_value = "./data")]
        input_dir: PathBuf,
        /// Output directory for index.html
        #[arg(short, long, default_value = "./out")]
        output_dir: PathBuf,
        /// Page title
        #[arg(long)]
        title: Option<String>,
        /// Also write the raw JSON document to this path
        #[arg(long)]
        json_out: Option<PathBuf>,
        /// HTML template containing {{TITLE}} and {{INLINE_JSON}}
        #[arg(long)]
        template: Option<PathBuf>,
        /// Reject unreadable numeric fields instead of defaulting them
        #[arg(long)]
        strict: bool,
    },

    /// Ingest slices and print extents and ranges without writing anything
    Inspect {
        /// Input directory with one CSV file per slice
        #[arg(default_value = "./data")]
        input_dir: PathBuf,
        /// Reject unreadable numeric fields instead of defaulting them
        #[arg(long)]
        strict: bool,
    },
}

/// Create a spinner for indeterminate operations
fn create_spinner(message: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    pb.set_message(message.to_string());
    pb.enable_steady_tick(std::time::Duration::from_millis(100));
    pb
}

/// Lines of a summary box, all the same width
fn summary_lines(title: &str, items: &[(&str, String)]) -> Vec<String> {
    let mut lines = vec![
        "╔══════════════════════════════════════════════════════════════╗".to_string(),
        format!("║ {:<60} ║", title),
        "╠══════════════════════════════════════════════════════════════╣".to_string(),
    ];
    for (key, value) in items {
        let display_value = if value.chars().count() > 38 {
            format!("{}...", value.chars().take(35).collect::<String>())
        } else {
            value.clone()
        };
        lines.push(format!("║ {:<20}: {:<38} ║", key, display_value));
    }
    lines.push("╚══════════════════════════════════════════════════════════════╝".to_string());
    lines
}

/// Print a summary box
fn print_summary(title: &str, items: &[(&str, String)]) {
    println!();
    for line in summary_lines(title, items) {
        println!("{}", line);
    }
    println!();
}

pub fn run() {
    let cli = Cli::parse();

    // Initialize logging based on verbosity (must come first)
    env_logger::Builder::new()
        .filter_level(match cli.verbose {
            0 => log::LevelFilter::Warn,
            1 => log::LevelFilter::Info,
            _ => log::LevelFilter::Debug,
        })
        .format_timestamp_secs()
        .init();

    // Load config
    let config = match &cli.config {
        Some(path) => match PipelineConfig::from_yaml(path) {
            Ok(cfg) => {
                info!("Loaded config from: {}", path.display());
                cfg
            }
            Err(e) => {
                warn!(
                    "Failed to load config from {}: {}, using defaults",
                    path.display(),
                    e
                );
                PipelineConfig::default()
            }
        },
        None => PipelineConfig::default(),
    };

    match cli.command {
        Commands::Build {
            input_dir,
            output_dir,
            title,
            json_out,
            template,
            strict,
        } => {
            let mut config = config;
            if let Some(title) = title {
                config.render.title = title;
            }
            config.ingest.strict |= strict;

            let request = BuildRequest {
                input_dir,
                out_dir: output_dir,
                json_out,
                template,
            };
            cmd_build(&request, &config);
        }
        Commands::Inspect { input_dir, strict } => {
            let mut config = config;
            config.ingest.strict |= strict;
            cmd_inspect(&input_dir, &config);
        }
    }
}

fn cmd_build(request: &BuildRequest, config: &PipelineConfig) {
    let start = Instant::now();

    println!("Building grid page...");
    println!("Input directory: {}", request.input_dir.display());
    println!("Output directory: {}", request.out_dir.display());
    println!("Strict parsing: {}", config.ingest.strict);

    let spinner = create_spinner("Ingesting slices...");

    match pipeline::run_build(request, config) {
        Ok(report) => {
            spinner.finish_and_clear();

            let Some(page) = report.page else {
                println!("No CSV files found in {}", request.input_dir.display());
                return;
            };

            let json = report
                .json
                .map(|p| p.display().to_string())
                .unwrap_or_else(|| "-".to_string());

            print_summary(
                "Build Complete",
                &[
                    ("Slices", report.slices.to_string()),
                    ("Observations", report.observations.to_string()),
                    ("Grid", format!("{} x {}", report.x_max, report.y_max)),
                    ("Page", page.display().to_string()),
                    ("JSON dump", json),
                    ("Duration", format!("{:.2?}", start.elapsed())),
                ],
            );
        }
        Err(e) => {
            spinner.finish_and_clear();
            error!("Build failed: {:#}", e);
            std::process::exit(1);
        }
    }
}

fn cmd_inspect(input_dir: &Path, config: &PipelineConfig) {
    let start = Instant::now();

    let spinner = create_spinner("Ingesting slices...");

    let corpus = match pipeline::ingest(input_dir, config) {
        Ok(corpus) => corpus,
        Err(e) => {
            spinner.finish_and_clear();
            error!("Inspect failed: {:#}", e);
            std::process::exit(1);
        }
    };

    spinner.finish_and_clear();

    if corpus.is_empty() {
        println!("No CSV files found in {}", input_dir.display());
        return;
    }

    let (value_min, value_max) = corpus.extents.value_range();
    let (size_min, size_max) = corpus.extents.size_range();
    let labels = &corpus.labels;

    let mut items = vec![
        ("Directory", input_dir.display().to_string()),
        ("Slices", corpus.slices.len().to_string()),
        ("Observations", corpus.observation_count().to_string()),
        ("Grid", format!("{} x {}", corpus.x_max(), corpus.y_max())),
        ("Value range (>0)", format!("{} .. {}", value_min, value_max)),
        ("Size range (>0)", format!("{} .. {}", size_min, size_max)),
        (
            "Labels",
            format!("{} / {} / {} / {}", labels.x, labels.y, labels.value, labels.size),
        ),
        ("Extras", labels.extras.join(", ")),
    ];
    for slice in &corpus.slices {
        items.push(("Slice", format!("{} ({} rows)", slice.name, slice.len())));
    }
    items.push(("Duration", format!("{:.2?}", start.elapsed())));

    print_summary("Inspect Complete", &items);
}
