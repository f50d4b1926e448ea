use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use clap::Parser;
use sqlx::postgres::PgPoolOptions;
use tracing::{info, warn};

use ticket_size_service::db::{EtlStore, PgEtlStore};
use ticket_size_service::etl::SheetLayout;
use ticket_size_service::services::{EtlService, EtlSettings};

#[derive(Parser)]
#[command(name = "etl-import")]
#[command(about = "Load a TRX/NPP workbook into the ticket size database", long_about = None)]
struct Cli {
    /// Database connection string
    #[arg(long, env)]
    database_url: String,

    /// Path to the workbook (.xlsx)
    #[arg(long)]
    file: PathBuf,

    /// Name of the sheet holding locations and TRX values
    #[arg(long, env = "TRX_SHEET_NAME", default_value = "16")]
    trx_sheet: String,

    /// Name of the sheet holding NPP values
    #[arg(long, env = "NPP_SHEET_NAME", default_value = "18")]
    npp_sheet: String,

    /// Read and validate only; nothing is written
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    info!("Connecting to database...");
    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&cli.database_url)
        .await?;
    sqlx::migrate!("./migrations").run(&pool).await?;

    let store: Arc<dyn EtlStore> = Arc::new(PgEtlStore::new(pool));
    let settings = EtlSettings {
        trx_sheet: cli.trx_sheet.clone(),
        npp_sheet: cli.npp_sheet.clone(),
        layout: SheetLayout::default(),
    };
    let service = EtlService::new(store, settings);
    let start_time = Instant::now();

    if cli.dry_run {
        if !cli.file.exists() {
            return Err(format!("File not found: {}", cli.file.display()).into());
        }

        let staged = service.stage(&cli.file).await?;
        for warning in &staged.warnings {
            println!("warning: {warning}");
        }
        println!(
            "Dry run: {} new locations, {} TRX rows, {} NPP rows would be written ({} warnings)",
            staged.batch.new_locations.len(),
            staged.batch.trx.len(),
            staged.batch.npp.len(),
            staged.warnings.len()
        );
        return Ok(());
    }

    let result = service.run(&cli.file).await?;

    for warning in &result.warnings {
        println!("warning: {warning}");
    }
    for error in &result.errors {
        println!("error: {error}");
    }

    if !result.success {
        warn!("Import did not complete");
        return Err(format!("Import of {} failed", cli.file.display()).into());
    }

    if let Some(summary) = result.summary {
        println!(
            "Imported {} new locations, {} TRX rows, {} NPP rows in {:.1}s ({} warnings)",
            summary.locations_inserted,
            summary.trx_inserted,
            summary.npp_inserted,
            start_time.elapsed().as_secs_f64(),
            result.warnings.len()
        );
    }
    Ok(())
}
