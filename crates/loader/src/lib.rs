//! # cpi-loader
//!
//! Loads a CPI CSV export into the database the server reads. Running it
//! twice over the same file inserts nothing the second time.

use anyhow::{Context, Result};
use clap::Parser;
use cpiquery::{
    constants::DEFAULT_DB_FILE,
    ingest::{ingest_cpi_csv_file, IngestionSummary},
    providers::db::sqlite::SqliteProvider,
};
use std::{
    fs,
    path::{Path, PathBuf},
};
use tracing::info;

#[derive(Parser, Debug)]
#[command(author, version, about = "Load CPI CSV data into the cpiquery database.", long_about = None)]
pub struct Cli {
    /// The CPI CSV file to load.
    #[arg(long)]
    pub csv: PathBuf,

    /// Path of the SQLite database file. Created if missing.
    #[arg(long, env = "DB_URL", default_value = DEFAULT_DB_FILE)]
    pub db: String,
}

/// Opens (or creates) the database and loads the CSV into it.
pub async fn run(cli: Cli) -> Result<IngestionSummary> {
    if let Some(dir) = Path::new(&cli.db)
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
    {
        fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create database directory '{}'", dir.display()))?;
    }

    let provider = SqliteProvider::new(&cli.db).await?;
    info!(db_path = %cli.db, "Opened database.");

    let summary = ingest_cpi_csv_file(&provider.db, &cli.csv)
        .await
        .with_context(|| format!("Failed to load '{}'", cli.csv.display()))?;
    info!(
        read = summary.read,
        inserted = summary.inserted,
        "Finished loading CPI data."
    );
    Ok(summary)
}

/// The line printed after a successful load.
pub fn report(summary: &IngestionSummary) -> String {
    format!(
        "Inserted {} new rows ({} read).",
        summary.inserted, summary.read
    )
}
