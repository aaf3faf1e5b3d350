//! # CPI CSV Ingestion
//!
//! Reads the published CPI CSV export and loads it into `cpi_data`. Loading
//! is idempotent: rows already present are skipped by the table's uniqueness
//! constraint, so re-running over the same file inserts nothing.

use crate::{
    constants::{month_name, month_number},
    providers::db::sqlite::sql,
    types::{CpiRecord, Sector},
};
use serde::Deserialize;
use std::{fs::File, io::Read, path::Path};
use thiserror::Error;
use tracing::{debug, info, warn};
use turso::{Database, Value as TursoValue};

/// Custom error types for the CSV ingestion process.
#[derive(Error, Debug)]
pub enum IngestError {
    #[error("Database error: {0}")]
    Database(#[from] turso::Error),
    #[error("Failed to parse CSV: {0}")]
    Csv(#[from] csv::Error),
    #[error("Failed to read input: {0}")]
    Io(#[from] std::io::Error),
    #[error("Line {line}: unknown month '{month}'")]
    InvalidMonth { line: u64, month: String },
    #[error("Line {line}: '{value}' is not a valid {field}")]
    InvalidNumber {
        line: u64,
        field: &'static str,
        value: String,
    },
    #[error("Line {line}: {reason}")]
    InvalidSector { line: u64, reason: String },
    #[error("Failed to get database connection: {0}")]
    Connection(String),
}

/// Counts reported after loading a file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IngestionSummary {
    pub read: usize,
    pub inserted: usize,
}

/// One CSV row as published, before validation.
#[derive(Debug, Deserialize)]
struct CsvRow {
    #[serde(rename = "BaseYear")]
    base_year: String,
    #[serde(rename = "Year")]
    year: String,
    #[serde(rename = "Month")]
    month: String,
    #[serde(rename = "State")]
    state: String,
    #[serde(rename = "Sector")]
    sector: String,
    #[serde(rename = "Group")]
    group: String,
    #[serde(rename = "SubGroup")]
    sub_group: String,
    #[serde(rename = "Index")]
    index: String,
    #[serde(rename = "Inflation (%)")]
    inflation: String,
}

impl CsvRow {
    fn into_record(self, line: u64) -> Result<CpiRecord, IngestError> {
        let month_numeric =
            month_number(&self.month).ok_or_else(|| IngestError::InvalidMonth {
                line,
                month: self.month.clone(),
            })?;
        let sector = self
            .sector
            .parse::<Sector>()
            .map_err(|reason| IngestError::InvalidSector { line, reason })?;

        Ok(CpiRecord {
            base_year: parse_int(&self.base_year, "BaseYear", line)?,
            year: parse_int(&self.year, "Year", line)?,
            // Short month names are stored in their canonical long form.
            month: month_name(month_numeric)
                .unwrap_or(self.month.as_str())
                .to_string(),
            month_numeric,
            state: self.state,
            sector,
            group_name: self.group,
            sub_group_name: self.sub_group,
            index_value: parse_measure(&self.index, "Index", line)?,
            inflation_percentage: parse_measure(&self.inflation, "Inflation (%)", line)?,
        })
    }
}

fn parse_int(value: &str, field: &'static str, line: u64) -> Result<i64, IngestError> {
    value.parse().map_err(|_| IngestError::InvalidNumber {
        line,
        field,
        value: value.to_string(),
    })
}

/// `*` and blank cells mean "not published" and are stored as 0.
fn parse_measure(value: &str, field: &'static str, line: u64) -> Result<f64, IngestError> {
    if value.is_empty() || value == "*" {
        return Ok(0.0);
    }
    value.parse().map_err(|_| IngestError::InvalidNumber {
        line,
        field,
        value: value.to_string(),
    })
}

/// Parses CPI records from CSV. Headers and fields are trimmed.
pub fn parse_cpi_csv<R: Read>(reader: R) -> Result<Vec<CpiRecord>, IngestError> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);
    let headers = reader.headers()?.clone();
    debug!(headers = ?headers, "Parsing CPI CSV.");

    let mut records = Vec::new();
    for result in reader.records() {
        let record = result?;
        let line = record.position().map(|p| p.line()).unwrap_or_default();
        let row: CsvRow = record.deserialize(Some(&headers))?;
        records.push(row.into_record(line)?);
    }
    Ok(records)
}

/// Inserts records in a single transaction and returns how many were new.
pub async fn ingest_cpi_records(
    db: &Database,
    records: &[CpiRecord],
) -> Result<usize, IngestError> {
    let conn = db
        .connect()
        .map_err(|e| IngestError::Connection(e.to_string()))?;

    for statement in sql::ALL_TABLE_CREATION_SQL {
        conn.execute(statement, ()).await?;
    }

    conn.execute("BEGIN TRANSACTION", ()).await?;
    let mut stmt = conn.prepare(sql::INSERT_CPI_RECORD_SQL).await?;
    let mut inserted = 0;

    for record in records {
        let params = vec![
            TursoValue::Integer(record.base_year),
            TursoValue::Integer(record.year),
            TursoValue::Text(record.month.clone()),
            TursoValue::Integer(i64::from(record.month_numeric)),
            TursoValue::Text(record.state.clone()),
            TursoValue::Text(record.sector.to_string()),
            TursoValue::Text(record.group_name.clone()),
            TursoValue::Text(record.sub_group_name.clone()),
            TursoValue::Real(record.index_value),
            TursoValue::Real(record.inflation_percentage),
        ];

        match stmt.execute(params).await {
            Ok(changes) => {
                if changes > 0 {
                    inserted += 1;
                }
            }
            Err(e) => {
                warn!("Failed to insert CPI row: {e:?}. Rolling back transaction.");
                conn.execute("ROLLBACK", ()).await?;
                return Err(IngestError::Database(e));
            }
        }
    }

    conn.execute("COMMIT", ()).await?;
    info!(
        "Transaction committed. Inserted {inserted} new rows of {}.",
        records.len()
    );
    Ok(inserted)
}

/// Parses a CSV file and loads it into the database.
pub async fn ingest_cpi_csv_file(
    db: &Database,
    path: impl AsRef<Path>,
) -> Result<IngestionSummary, IngestError> {
    let path = path.as_ref();
    info!("Reading CPI data from {}", path.display());
    let records = parse_cpi_csv(File::open(path)?)?;
    let inserted = ingest_cpi_records(db, &records).await?;
    Ok(IngestionSummary {
        read: records.len(),
        inserted,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEADER: &str = "BaseYear,Year,Month,State,Sector,Group,SubGroup,Index,Inflation (%)\n";

    #[test]
    fn parses_rows_and_coerces_placeholders() {
        let csv = format!(
            "{HEADER}2012,2025,Feb,All India,Combined,General,*,195.2,3.61\n2012, 2025 ,March, Bihar ,rural,Food and Beverages,Egg,*,*\n"
        );
        let records = parse_cpi_csv(csv.as_bytes()).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].month, "February");
        assert_eq!(records[0].month_numeric, 2);
        assert_eq!(records[0].index_value, 195.2);
        assert_eq!(records[1].state, "Bihar");
        assert_eq!(records[1].sector, Sector::Rural);
        assert_eq!(records[1].index_value, 0.0);
        assert_eq!(records[1].inflation_percentage, 0.0);
    }

    #[test]
    fn unknown_month_names_the_line() {
        let csv = format!("{HEADER}2012,2025,Smarch,All India,Combined,General,*,195.2,3.61\n");
        let err = parse_cpi_csv(csv.as_bytes()).unwrap_err();
        match err {
            IngestError::InvalidMonth { line, month } => {
                assert_eq!(line, 2);
                assert_eq!(month, "Smarch");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn bad_numbers_and_sectors_are_rejected() {
        let csv = format!("{HEADER}2012,20x5,May,All India,Combined,General,*,1,1\n");
        assert!(matches!(
            parse_cpi_csv(csv.as_bytes()),
            Err(IngestError::InvalidNumber { field: "Year", .. })
        ));
        let csv = format!("{HEADER}2012,2025,May,All India,Suburban,General,*,1,1\n");
        assert!(matches!(
            parse_cpi_csv(csv.as_bytes()),
            Err(IngestError::InvalidSector { .. })
        ));
    }
}
