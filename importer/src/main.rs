//! Sell-out importer
//!
//! One-off loader for retailer POS exports. Reads a CSV file, maps the
//! retailer's store and product codes to ids, merges duplicate rows and
//! upserts the result into `fact_sales` or `inventory_snapshots`.
//!
//! Logs go to stderr; the JSON report is the only thing written to stdout.

mod dedup;
mod error;
mod fact;
mod job;
mod mapping;
mod parse;
mod postgres;
mod sink;

#[cfg(test)]
mod test_utils;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use sea_orm::Database;
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

use dedup::DuplicatePolicy;
use fact::ImportKind;
use job::ImportOptions;
use mapping::{IdMapper, MappingFile};
use postgres::PostgresFactSink;

#[derive(Parser)]
#[command(name = "sellout-importer")]
#[command(about = "Import retailer sell-out and inventory exports")]
struct Cli {
    /// Required unless --dry-run is given with a complete --mapping file
    #[arg(long, env = "DATABASE_URL", global = true, hide_env_values = true)]
    database_url: Option<String>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Daily units and revenue per store and product
    Sales(ImportArgs),
    /// Stock on hand per store and product
    Inventory(ImportArgs),
}

#[derive(Args)]
struct ImportArgs {
    #[arg(long)]
    tenant: Uuid,
    #[arg(long)]
    retailer: Uuid,
    /// CSV export to load
    #[arg(long)]
    file: PathBuf,
    /// TOML file with [stores] and [products] code-to-id tables
    #[arg(long)]
    mapping: Option<PathBuf>,
    /// Rows per INSERT statement
    #[arg(long, default_value_t = 500, value_parser = clap::value_parser!(u32).range(1..=5000))]
    batch_size: u32,
    /// Defaults to `sum` for sales and `last` for inventory
    #[arg(long, value_enum)]
    duplicates: Option<DuplicatePolicy>,
    /// Parse, map and deduplicate without writing
    #[arg(long, default_value_t = false)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    // stdout carries the report
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,sellout_importer=debug".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let _ = dotenvy::dotenv();
    let cli = Cli::parse();

    let (kind, args) = match cli.command {
        Command::Sales(args) => (ImportKind::Sales, args),
        Command::Inventory(args) => (ImportKind::Inventory, args),
    };

    let options = ImportOptions {
        kind,
        tenant_id: args.tenant,
        retailer_id: args.retailer,
        duplicates: args
            .duplicates
            .unwrap_or_else(|| DuplicatePolicy::default_for(kind)),
        batch_size: args.batch_size as usize,
        dry_run: args.dry_run,
    };

    tracing::info!(
        %kind,
        tenant_id = %options.tenant_id,
        retailer_id = %options.retailer_id,
        file = %args.file.display(),
        dry_run = options.dry_run,
        "Starting import"
    );

    let input = std::fs::read(&args.file)
        .with_context(|| format!("Failed to read {}", args.file.display()))?;

    let overrides = match &args.mapping {
        Some(path) => MappingFile::load(path)
            .with_context(|| format!("Failed to load mapping {}", path.display()))?,
        None => MappingFile::default(),
    };

    let db = match &cli.database_url {
        Some(url) => Some(
            Database::connect(url)
                .await
                .context("Failed to connect to database")?,
        ),
        None if options.dry_run => {
            tracing::warn!("DATABASE_URL not set, mapping from --mapping only");
            None
        }
        None => anyhow::bail!("DATABASE_URL is required unless --dry-run is set"),
    };

    let mapper = match &db {
        Some(db) => {
            postgres::verify_retailer(db, options.tenant_id, options.retailer_id).await?;
            postgres::load_mapper(db, options.tenant_id, options.retailer_id).await?
        }
        None => IdMapper::default(),
    }
    .with_overrides(overrides);

    tracing::debug!(
        stores = mapper.store_count(),
        products = mapper.product_count(),
        "Code mapping ready"
    );

    let sink = db.map(|db| PostgresFactSink::new(db, kind, options.tenant_id, options.retailer_id));
    let report = job::run(&input, &options, &mapper, sink.as_ref()).await?;

    println!(
        "{}",
        serde_json::to_string_pretty(&report).context("Failed to serialize report")?
    );

    if report.write.rows_failed > 0 {
        anyhow::bail!("{} rows could not be written", report.write.rows_failed);
    }

    Ok(())
}
