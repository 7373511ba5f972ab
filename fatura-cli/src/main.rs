use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};

use fatura_classify::{BatchConfig, GroqClassifier, Pipeline, Source};
use fatura_core::Transaction;

mod output;

#[derive(Parser, Debug)]
#[command(name = "fatura", version, about = "Classify personal card/bank statements")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Classify a credit-card CSV export
    Card {
        /// Path to the card CSV
        #[arg(long)]
        csv: PathBuf,

        #[command(flatten)]
        common: CommonArgs,
    },

    /// Classify a directory of bank OFX statements
    Bank {
        /// Directory containing .ofx/.qfx files (default: ./extratos)
        #[arg(long, default_value = "extratos")]
        dir: PathBuf,

        #[command(flatten)]
        common: CommonArgs,
    },
}

#[derive(clap::Args, Debug)]
struct CommonArgs {
    /// Output CSV path
    #[arg(long, default_value = "finances.csv")]
    out: PathBuf,

    /// Keep only records on or after this date (YYYY-MM-DD)
    #[arg(long)]
    since: Option<NaiveDate>,

    /// Distinct descriptions per classification batch
    #[arg(long, default_value_t = 20)]
    batch_size: usize,

    /// Seconds to wait between batches (requests-per-minute ceiling)
    #[arg(long, default_value_t = 3.0)]
    sleep_seconds: f64,

    /// Groq model to classify with
    #[arg(long, default_value = fatura_classify::client::DEFAULT_MODEL)]
    model: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    match cli.command {
        Command::Card { csv, common } => {
            let source = Source::CardCsvPath(csv);
            classify_and_write(source, common).await?;
        }
        Command::Bank { dir, common } => {
            let source = Source::OfxDir(dir);
            classify_and_write(source, common).await?;
        }
    }
    Ok(())
}

async fn classify_and_write(source: Source, args: CommonArgs) -> Result<()> {
    let api_key = std::env::var("GROQ_API_KEY")
        .context("GROQ_API_KEY is not set; export it before running")?;

    let config = BatchConfig {
        batch_size: args.batch_size,
        sleep_seconds: args.sleep_seconds,
        ..BatchConfig::default()
    };
    let classifier = Arc::new(GroqClassifier::with_model(api_key, &args.model));
    let mut pipeline = Pipeline::new(classifier, config);

    let progress = |done: usize, total: usize| {
        eprintln!("classified {done}/{total} descriptions");
    };

    let mut records = pipeline
        .run(&source, Some(&progress))
        .await
        .context("classification run failed")?;

    if let Some(since) = args.since {
        records.retain(|r| r.date >= since);
    }

    output::write_csv(&args.out, &records)
        .with_context(|| format!("writing {}", args.out.display()))?;
    println!("OK: wrote {} records to {}", records.len(), args.out.display());

    print_summary(&records);
    Ok(())
}

/// Quick per-category totals, most expensive first.
fn print_summary(records: &[Transaction]) {
    use std::collections::HashMap;

    let mut totals: HashMap<&str, f64> = HashMap::new();
    for rec in records {
        if let Some(cat) = rec.category.as_deref() {
            *totals.entry(cat).or_insert(0.0) += rec.amount;
        }
    }

    let mut rows: Vec<_> = totals.into_iter().collect();
    rows.sort_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal));
    for (cat, total) in rows {
        println!("{total:>12.2}  {cat}");
    }
}
