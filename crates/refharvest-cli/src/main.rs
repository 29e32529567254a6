use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use chrono::Utc;
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use refharvest_core::output::{write_snapshot, write_summary};
use refharvest_core::{HarvestConfig, Snapshot};
use refharvest_sources::RetryPolicy;
use refharvest_sources::arxiv::{ArxivClient, RecentRequest};
use refharvest_sources::zotero::{ZoteroClient, api_key_from};

const LOG_ENV: &str = "REFHARVEST_LOG";

// ─── CLI Definition ─────────────────────────────────────────────────────────

#[derive(Parser)]
#[command(
    name = "refharvest",
    about = "Harvest arXiv submissions and Zotero libraries into JSON snapshots",
    version,
    long_about = None
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch recent submissions in the configured arXiv categories.
    Arxiv {
        /// Snapshot JSON path.
        #[arg(long)]
        output: PathBuf,
        /// Markdown report path.
        #[arg(long)]
        summary: PathBuf,
        /// Lookback window in days.
        #[arg(long, default_value = "2")]
        days: u32,
        #[arg(long, default_value = "200", value_parser = clap::value_parser!(u32).range(1..))]
        batch_size: u32,
        /// Upper bound on entries requested from upstream.
        #[arg(long, default_value = "2000", value_parser = clap::value_parser!(u32).range(1..))]
        max_scan: u32,
    },

    /// Fetch every readable item of a Zotero user library.
    Zotero {
        #[arg(long)]
        output: PathBuf,
        #[arg(long)]
        summary: PathBuf,
        /// Explicit user id; resolved from the API key when omitted.
        #[arg(long)]
        user_id: Option<u64>,
        #[arg(long, default_value = "100", value_parser = clap::value_parser!(u32).range(1..))]
        page_size: u32,
    },

    /// Config management.
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Print the effective configuration as TOML.
    Show,
    /// Print the config file location.
    Path,
}

// ─── Main ────────────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("Error: {err:#}");
            ExitCode::FAILURE
        }
    }
}

/// Logs go to stderr; stdout carries only command results.
fn init_tracing() {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

async fn run(cli: Cli) -> Result<()> {
    let config = HarvestConfig::load()
        .with_context(|| format!("loading {}", HarvestConfig::config_path().display()))?;
    let policy = RetryPolicy::from(&config.retry);

    match cli.command {
        Commands::Arxiv {
            output,
            summary,
            days,
            batch_size,
            max_scan,
        } => {
            let client = ArxivClient::new(&config.arxiv, policy)?;
            let request = RecentRequest {
                lookback_days: days,
                batch_size: batch_size as usize,
                max_scan: max_scan as usize,
            };
            let snapshot = client.harvest_recent(&request, Utc::now()).await?;
            persist(&snapshot, &output, &summary)?;
            let retained = snapshot.stats.total_retained;
            println!("Wrote {retained} entries to {}", output.display());
            println!("Wrote summary to {}", summary.display());
        }

        Commands::Zotero {
            output,
            summary,
            user_id,
            page_size,
        } => {
            let var = &config.zotero.api_key_env;
            let api_key = api_key_from(std::env::var(var).ok(), var)?;
            let client = ZoteroClient::new(&config.zotero, api_key, policy)?;
            let snapshot = client.harvest_library(user_id, page_size as usize).await?;
            persist(&snapshot, &output, &summary)?;
            let retained = snapshot.stats.total_retained;
            println!("Wrote {retained} items to {}", output.display());
            println!("Wrote summary to {}", summary.display());
        }

        Commands::Config { action } => match action {
            ConfigAction::Show => print!("{}", config.to_toml()?),
            ConfigAction::Path => println!("{}", HarvestConfig::config_path().display()),
        },
    }

    Ok(())
}

fn persist(snapshot: &Snapshot, output: &Path, summary: &Path) -> Result<()> {
    write_snapshot(output, snapshot)
        .with_context(|| format!("writing snapshot to {}", output.display()))?;
    write_summary(summary, snapshot)
        .with_context(|| format!("writing summary to {}", summary.display()))?;
    info!(
        items = snapshot.stats.total_retained,
        output = %output.display(),
        summary = %summary.display(),
        "snapshot persisted"
    );
    Ok(())
}
