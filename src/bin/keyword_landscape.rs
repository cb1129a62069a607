//! Keyword Landscape CLI - select top keywords per URL and export a workbook
//!
//! Reads a keyword-ranking CSV (URL, Keyword, Blended Rank, Search Volume,
//! CPC), keeps the best keywords for every URL and writes them, together with
//! each URL's site-section levels, to `keyword_landscape.xlsx`.

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use keyword_landscape::export;
use keyword_landscape::hierarchy::{extract_hierarchy, Hierarchy, HierarchyOutcome};
use keyword_landscape::pipeline::{
    build_landscape, load_landscape, LandscapeConfig, DEFAULT_OUTPUT_NAME,
};
use keyword_landscape::{HeaderPolicy, KeywordLimit, SelectionConfig};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "keyword-landscape")]
#[command(about = "Select top keywords per URL and map them onto site sections")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct SelectionArgs {
    /// Input CSV file
    #[arg(short, long)]
    input: PathBuf,

    /// Number of top keywords to keep per URL
    #[arg(
        short = 'k',
        long,
        default_value = "5",
        env = "KEYWORD_LIMIT",
        value_parser = clap::value_parser!(u8).range(1..=25)
    )]
    keyword_limit: u8,

    /// Also include the top keywords by search volume across all URLs
    #[arg(long)]
    include_top_search_volume: bool,

    /// Take the first five columns in order (URL, Keyword, Blended Rank,
    /// Search Volume, CPC) without checking header names
    #[arg(long)]
    positional_headers: bool,
}

impl SelectionArgs {
    fn config(&self, output: PathBuf, summary_sheet: bool) -> Result<LandscapeConfig> {
        let limit = KeywordLimit::new(self.keyword_limit as usize)?;
        Ok(LandscapeConfig {
            input: self.input.clone(),
            output,
            selection: SelectionConfig::default()
                .with_limit(limit)
                .with_top_volume(self.include_top_search_volume),
            header_policy: if self.positional_headers {
                HeaderPolicy::Positional
            } else {
                HeaderPolicy::Validated
            },
            summary_sheet,
        })
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Export the keyword landscape as an Excel workbook
    Export {
        #[command(flatten)]
        selection: SelectionArgs,

        /// Output xlsx file
        #[arg(short, long, default_value = DEFAULT_OUTPUT_NAME)]
        output: PathBuf,

        /// Add a Summary sheet with run parameters and row counts
        #[arg(long)]
        summary: bool,
    },

    /// Print the keyword landscape as CSV to stdout
    Preview {
        #[command(flatten)]
        selection: SelectionArgs,

        /// Print dropped rows to stderr
        #[arg(long)]
        show_dropped: bool,
    },

    /// Show the site-section levels for one or more URLs
    Hierarchy {
        /// URLs to decompose
        #[arg(required = true)]
        urls: Vec<String>,
    },
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Export {
            selection,
            output,
            summary,
        } => {
            let config = selection.config(output, summary)?;
            let message = build_landscape(&config)
                .with_context(|| format!("Failed to build landscape from {}", config.input.display()))?;
            println!("{}", message);
        }
        Commands::Preview {
            selection,
            show_dropped,
        } => {
            let config = selection.config(PathBuf::from(DEFAULT_OUTPUT_NAME), false)?;
            let landscape = load_landscape(&config)
                .with_context(|| format!("Failed to read {}", config.input.display()))?;
            if show_dropped {
                for dropped in &landscape.dropped {
                    eprintln!("Line {}: {}", dropped.line, dropped.issue);
                }
            }
            export::write_csv(std::io::stdout().lock(), &landscape.rows)
                .context("Failed to write CSV to stdout")?;
        }
        Commands::Hierarchy { urls } => {
            for url in &urls {
                print_hierarchy(url);
            }
        }
    }

    Ok(())
}

fn print_hierarchy(url: &str) {
    println!("{}", url);
    match extract_hierarchy(url) {
        HierarchyOutcome::Breakdown(hierarchy) => {
            for (level, label) in hierarchy.levels().iter().enumerate() {
                println!("  {}: {}", Hierarchy::column_name(level), label);
            }
        }
        HierarchyOutcome::Empty(issue) => println!("  (no levels: {})", issue),
    }
}
