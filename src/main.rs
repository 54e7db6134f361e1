//! `geoscout` — search for named places in an area from the command line.

use anyhow::{Context, Result};
use clap::Parser;
use geoscout::output;
use geoscout::pipeline::{Scout, SearchOptions};
use std::path::PathBuf;
use std::time::Duration;

/// Find named places in a geographic area and optionally enrich them from
/// their websites.
#[derive(Parser, Debug)]
#[command(name = "geoscout", version, about)]
struct Cli {
    /// Search terms, e.g. cafe restaurant bakery.
    #[arg(long, num_args = 1.., required = true)]
    terms: Vec<String>,

    /// Free-text location, e.g. "Springfield, Illinois".
    #[arg(long)]
    location: String,

    /// Crawl each found place's website for contact metadata.
    #[arg(long)]
    enrich: bool,

    /// Directory for results.json and results.csv.
    #[arg(long, default_value = "output")]
    output: PathBuf,

    /// Stop the run after this many seconds, keeping partial results.
    #[arg(long)]
    time_budget: Option<u64>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("geoscout=info".parse().expect("valid directive")),
        )
        .init();

    let cli = Cli::parse();

    let scout = Scout::new()?;
    let options = SearchOptions {
        enrich: cli.enrich,
        time_budget: cli.time_budget.map(Duration::from_secs),
        ..SearchOptions::default()
    };

    let outcome = scout.search(&cli.terms, &cli.location, &options).await;
    if outcome.places.is_empty() {
        eprintln!("No results found.");
        return Ok(());
    }

    std::fs::create_dir_all(&cli.output)
        .with_context(|| format!("creating {}", cli.output.display()))?;

    let json_path = cli.output.join("results.json");
    output::write_json(&outcome.places, &json_path)?;
    let csv_path = cli.output.join("results.csv");
    output::write_csv(&outcome.places, &csv_path)?;

    eprintln!(
        "Saved {} places to {} and {}",
        outcome.places.len(),
        json_path.display(),
        csv_path.display()
    );
    Ok(())
}
