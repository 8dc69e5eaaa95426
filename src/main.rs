//! # News Report CLI (`nr`)
//!
//! Builds the article corpus, creates reader profiles, generates
//! personalized reports, and serves the HTTP API.
//!
//! ## Usage
//!
//! ```bash
//! nr --config ./config/nr.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `nr build` | Build the corpus and refresh the cache |
//! | `nr categories` | List categories with article counts |
//! | `nr profile` | Print the profile for a set of interests (JSON) |
//! | `nr recommend` | Generate a report for a set of interests |
//! | `nr serve` | Start the HTTP server |
//!
//! ## Examples
//!
//! ```bash
//! # Rebuild ignoring the cache
//! nr build --force
//!
//! # Text report for two categories plus free-text interests
//! nr recommend --category tecnología --category economía \
//!     --interests "startups e inteligencia artificial" --recipient Ana
//!
//! # JSON report written to a file
//! nr recommend --category deportes --format json --output report.json
//! ```

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use std::sync::Arc;

use news_report::config;
use news_report::logging;
use news_report::server;
use news_report::service::{ReloadOutcome, ReportRequest, ReportService};
use news_report_core::render_text;

/// News Report CLI: personalized news reports from a local article corpus.
///
/// All commands accept a `--config` flag pointing to a TOML configuration
/// file. See `config/nr.example.toml` for a full example.
#[derive(Parser)]
#[command(
    name = "nr",
    about = "News Report: personalized news reports from a local article corpus",
    version
)]
struct Cli {
    /// Path to configuration file (TOML).
    #[arg(long, global = true, default_value = "./config/nr.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

/// Top-level CLI commands.
#[derive(Subcommand)]
enum Commands {
    /// Build the corpus index and write the cache.
    ///
    /// Reuses the cache when the source files and vectorizer settings are
    /// unchanged, unless `--force` is given.
    Build {
        /// Ignore the cache and rebuild from the source files.
        #[arg(long)]
        force: bool,
    },

    /// List known categories with their article counts.
    Categories,

    /// Vectorize interests into a profile and print it as JSON.
    Profile {
        #[command(flatten)]
        interests: InterestArgs,
    },

    /// Rank the corpus for a set of interests and print a report.
    Recommend {
        #[command(flatten)]
        interests: InterestArgs,

        /// Maximum number of articles in the report (defaults to `[report].max_articles`).
        #[arg(long)]
        limit: Option<usize>,

        /// Output format.
        #[arg(long, value_enum, default_value = "text")]
        format: OutputFormat,

        /// Write the report to this file instead of stdout.
        #[arg(long)]
        output: Option<PathBuf>,

        /// Name shown as the report recipient.
        #[arg(long)]
        recipient: Option<String>,
    },

    /// Start the HTTP server on `[server].bind`.
    Serve,
}

/// Profile inputs shared by `profile` and `recommend`.
#[derive(clap::Args)]
struct InterestArgs {
    /// Selected category (repeatable).
    #[arg(long = "category")]
    categories: Vec<String>,

    /// Free-text description of the reader's interests.
    #[arg(long, default_value = "")]
    interests: String,
}

#[derive(Clone, Copy, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let cfg = config::load_config(&cli.config)?;
    logging::configure_logging(&cfg.logging.filter);

    match cli.command {
        Commands::Build { force } => {
            let (_, outcome) = ReportService::open(cfg, force)?;
            print_outcome(&outcome);
        }
        Commands::Categories => {
            let (service, _) = ReportService::open(cfg, false)?;
            let counts = service.categories();
            if counts.is_empty() {
                println!("No categories (corpus is empty).");
            }
            for (name, count) in counts {
                println!("{:<24} {}", name, count);
            }
        }
        Commands::Profile { interests } => {
            let (service, _) = ReportService::open(cfg, false)?;
            let profile = service.create_profile(&interests.categories, &interests.interests)?;
            println!("{}", serde_json::to_string_pretty(&profile)?);
        }
        Commands::Recommend {
            interests,
            limit,
            format,
            output,
            recipient,
        } => {
            if limit == Some(0) {
                anyhow::bail!("--limit must be >= 1");
            }
            let (service, _) = ReportService::open(cfg, false)?;
            let profile = service.create_profile(&interests.categories, &interests.interests)?;
            let report = service.generate_report(
                &profile,
                ReportRequest {
                    recipient,
                    limit,
                    ..Default::default()
                },
            )?;

            let rendered = match format {
                OutputFormat::Text => render_text(&report),
                OutputFormat::Json => serde_json::to_string_pretty(&report)?,
            };
            match output {
                Some(path) => {
                    std::fs::write(&path, rendered)
                        .with_context(|| format!("Failed to write report: {}", path.display()))?;
                    println!("Report written to {}", path.display());
                }
                None => println!("{}", rendered),
            }
        }
        Commands::Serve => {
            let (service, outcome) = ReportService::open(cfg, false)?;
            print_outcome(&outcome);
            server::run_server(Arc::new(service)).await?;
        }
    }

    Ok(())
}

fn print_outcome(outcome: &ReloadOutcome) {
    let summary = &outcome.summary;
    println!(
        "Corpus ready ({}): {} articles, {} skipped",
        outcome.origin,
        summary.loaded,
        summary.skipped.len()
    );
    println!(
        "  dims: {} ({} categories, {} terms)",
        summary.dims, summary.categories, summary.terms
    );
    for skipped in &summary.skipped {
        println!("  skipped {}: {}", skipped.origin, skipped.reason);
    }
}
