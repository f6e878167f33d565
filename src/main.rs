use clap::Parser;
use tracing::{error, info};

use agenda_sync::config::Config;
use agenda_sync::logging;
use agenda_sync::orchestrator::{Orchestrator, RunReport};
use agenda_sync::sources::build_sources;
use agenda_sync::store::JsonFileStore;
use chrono::{Local, Utc};
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "agenda-sync")]
#[command(about = "Cultural agenda scraper and reconciler")]
#[command(version = "0.1.0")]
struct Cli {
    /// Path to the TOML configuration file
    #[arg(long, default_value = "config.toml")]
    config: PathBuf,

    /// Override the store file path from the config
    #[arg(long)]
    store: Option<PathBuf>,

    /// Fetch and reconcile but skip the store write
    #[arg(long)]
    dry_run: bool,
}

fn print_summary(report: &RunReport) {
    println!("\n📊 Sync results:");
    for source in &report.sources {
        match &source.error {
            Some(e) => println!("   ⚠️  {}: failed ({})", source.source, e),
            None => {
                let rejected: usize = source.rejected.values().sum();
                println!(
                    "   {}: {} fetched, {} normalized, {} rejected",
                    source.source, source.fetched, source.normalized, rejected
                );
                for (reason, count) in &source.rejected {
                    println!("      - {}: {}", reason, count);
                }
            }
        }
    }
    println!(
        "   Reconciled: {} inserted, {} refreshed, {} kept (manual), {} kept (automated), {} expired",
        report.counts.inserted,
        report.counts.refreshed,
        report.counts.kept_manual,
        report.counts.kept_automated,
        report.counts.expired
    );
    if report.dry_run {
        println!("   🔍 Dry run: store not written ({} records would be saved)", report.store_total);
    } else {
        println!("   ✅ Store now holds {} records", report.store_total);
    }
}

#[tokio::main]
async fn main() {
    dotenv::dotenv().ok();
    logging::init_logging();

    let cli = Cli::parse();

    let config = match Config::load(&cli.config) {
        Ok(config) => config,
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            eprintln!("❌ Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    let store_path = cli.store.unwrap_or_else(|| config.store_path.clone());
    info!("Using store file {}", store_path.display());
    let store = Arc::new(JsonFileStore::new(store_path));

    let sources = build_sources(&config);
    if sources.is_empty() {
        eprintln!("❌ No usable sources configured - nothing to do");
        std::process::exit(1);
    }

    let orchestrator = Orchestrator::new(sources, store, config);
    let today = Local::now().date_naive();

    match orchestrator.run(today, Utc::now(), cli.dry_run).await {
        Ok(report) => print_summary(&report),
        Err(e) => {
            error!("Sync run failed: {}", e);
            eprintln!("❌ Sync run failed: {}", e);
            std::process::exit(1);
        }
    }
}
