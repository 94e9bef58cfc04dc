mod category;
mod config;
mod dashboard;
mod dataset;
mod error;
mod fetcher;
mod normalize;
mod parser;
mod pipeline;

use std::path::PathBuf;
use std::time::Instant;

use clap::{Parser, Subcommand};
use rayon::prelude::*;
use tracing::{info, warn};

use crate::category::Category;
use crate::config::Settings;
use crate::dataset::{Dataset, Table};
use crate::error::PipelineError;

#[derive(Parser)]
#[command(name = "coinafrique_scraper", about = "CoinAfrique real-estate scraper and dashboard")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Scrape listing pages, normalize them and save the dataset
    Scrape {
        /// Category to scrape (default: all three)
        #[arg(short, long, value_enum)]
        category: Option<Category>,
        /// Number of listing pages to walk
        #[arg(short = 'n', long, default_value = "10")]
        pages: u32,
        /// Write here instead of the category's dataset file
        #[arg(short, long, requires = "category")]
        out: Option<PathBuf>,
        /// Also keep the unnormalized listings in this file
        #[arg(long, requires = "category")]
        raw: Option<PathBuf>,
    },
    /// Show a saved dataset file as-is
    Load {
        #[arg(short, long, value_enum)]
        category: Option<Category>,
        /// Max rows to display
        #[arg(short = 'n', long, default_value = "20")]
        limit: usize,
    },
    /// Re-derive typed columns from saved datasets and print statistics
    Dashboard {
        #[arg(short, long, value_enum)]
        category: Option<Category>,
        /// Print the summary as JSON
        #[arg(long)]
        json: bool,
    },
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let t0 = Instant::now();
    let cli = Cli::parse();
    let settings = Settings::load()?;
    info!(data_dir = %settings.data_dir.display(), base_url = %settings.base_url, "Settings loaded");

    let result = match cli.command {
        Commands::Scrape {
            category,
            pages,
            out,
            raw,
        } => run_scrape(&settings, category, pages, out, raw),
        Commands::Load { category, limit } => {
            for cat in selected(category) {
                show_raw(&settings, cat, limit);
            }
            Ok(())
        }
        Commands::Dashboard { category, json } => run_dashboard(&settings, category, json),
    };

    let elapsed = t0.elapsed();
    if elapsed.as_secs() >= 1 {
        println!("\nDone in {}", format_duration(elapsed));
    }

    result
}

fn selected(category: Option<Category>) -> Vec<Category> {
    match category {
        Some(c) => vec![c],
        None => Category::ALL.to_vec(),
    }
}

fn run_scrape(
    settings: &Settings,
    category: Option<Category>,
    pages: u32,
    out: Option<PathBuf>,
    raw: Option<PathBuf>,
) -> anyhow::Result<()> {
    let fetcher = fetcher::Fetcher::from_settings(settings)?;

    for cat in selected(category) {
        let path = out
            .clone()
            .unwrap_or_else(|| Dataset::path_in(&settings.data_dir, cat));
        println!("Scraping {} ({} pages)...", cat, pages);

        let stats = pipeline::scrape_to_file(&fetcher, cat, pages, &path, raw.as_deref())?;
        println!(
            "{}: {} listings on {} pages ({} failed, {} empty), {} kept, {} dropped (price: {}, address: {})",
            stats.category,
            stats.scraped,
            stats.pages,
            stats.failed_pages,
            stats.empty_pages,
            stats.dataset.records.len(),
            stats.dropped.total(),
            stats.dropped.missing_price,
            stats.dropped.missing_address,
        );
        for page in &stats.failures {
            if let fetcher::PageStatus::Failed(reason) = &page.status {
                println!("  page {} skipped ({}): {}", page.page, page.url, reason);
            }
        }
        println!("Saved to {}", path.display());
    }
    Ok(())
}

fn show_raw(settings: &Settings, category: Category, limit: usize) {
    let path = Dataset::path_in(&settings.data_dir, category);
    println!("\n=== {} ({}) ===", category, path.display());

    let table = match Table::load(&path) {
        Ok(t) => t,
        Err(e @ PipelineError::DatasetUnavailable { .. }) => {
            warn!(%category, error = %e, "Dataset unavailable");
            println!("Fichier {} introuvable ou corrompu.", category);
            return;
        }
        Err(e) => {
            println!("Erreur lors du chargement : {}", e);
            return;
        }
    };

    const WIDTH: usize = 28;
    let header: Vec<String> = table
        .headers
        .iter()
        .map(|h| format!("{:<width$}", truncate(h, WIDTH), width = WIDTH))
        .collect();
    println!("{}", header.join(" | "));
    println!("{}", "-".repeat((WIDTH + 3) * table.headers.len()));
    for row in table.rows.iter().take(limit) {
        let cells: Vec<String> = row
            .iter()
            .map(|c| format!("{:<width$}", truncate(c, WIDTH), width = WIDTH))
            .collect();
        println!("{}", cells.join(" | "));
    }
    println!("\n{} rows", table.rows.len());
}

fn run_dashboard(settings: &Settings, category: Option<Category>, json: bool) -> anyhow::Result<()> {
    // Categories share nothing, so they load and aggregate independently.
    let results: Vec<_> = selected(category)
        .into_par_iter()
        .map(|cat| (cat, dashboard::load_summary(&settings.data_dir, cat)))
        .collect();

    let mut summaries = Vec::new();
    for (cat, res) in results {
        match res {
            Ok(summary) => summaries.push(summary),
            Err(e) => {
                warn!(category = %cat, error = %e, "Skipping category");
                eprintln!("Erreur lors du chargement ({}) : {}", cat, e);
            }
        }
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&summaries)?);
    } else {
        for summary in &summaries {
            println!("{}", dashboard::render_text(summary));
        }
    }
    Ok(())
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let truncated: String = s.chars().take(max.saturating_sub(3)).collect();
        format!("{}...", truncated)
    }
}

fn format_duration(d: std::time::Duration) -> String {
    let secs = d.as_secs();
    if secs < 60 {
        format!("{:.1}s", d.as_secs_f64())
    } else if secs < 3600 {
        format!("{}m {}s", secs / 60, secs % 60)
    } else {
        format!("{}h {}m {}s", secs / 3600, (secs % 3600) / 60, secs % 60)
    }
}
