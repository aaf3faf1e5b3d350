//! # CPI Ingestion Tests
//!
//! Loads CSV files into a temporary database and checks that loading is
//! idempotent and that month names and placeholder cells are normalized.

mod common;

use crate::common::setup_tracing;
use cpiquery::{
    ingest::{ingest_cpi_csv_file, IngestError, IngestionSummary},
    providers::db::{
        sqlite::{sql, SqliteProvider},
        storage::Storage,
    },
};
use serde_json::json;
use std::io::Write;
use tempfile::{tempdir, NamedTempFile};

const CPI_CSV: &str = "\
BaseYear , Year , Month , State , Sector , Group , SubGroup , Index , Inflation (%)
2012,2025,January,All India,Combined,General,*,193.4,4.26
2012,2025,Feb,All India,Combined,General,*,193.1,3.61
2012,2025,FEBRUARY,Bihar,Rural,Food and Beverages,Egg,*,*
";

fn csv_file(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().expect("Failed to create temp file");
    file.write_all(contents.as_bytes())
        .expect("Failed to write CSV");
    file
}

#[tokio::test]
async fn test_reingesting_same_file_inserts_nothing() {
    setup_tracing();
    let dir = tempdir().unwrap();
    let db_path = dir.path().join("cpi.db");
    let provider = SqliteProvider::new(db_path.to_str().unwrap()).await.unwrap();
    let file = csv_file(CPI_CSV);

    let first = ingest_cpi_csv_file(&provider.db, file.path()).await.unwrap();
    let second = ingest_cpi_csv_file(&provider.db, file.path()).await.unwrap();

    assert_eq!(first, IngestionSummary { read: 3, inserted: 3 });
    assert_eq!(second, IngestionSummary { read: 3, inserted: 0 });
    let count = provider.execute_query(sql::COUNT_CPI_ROWS_SQL).await.unwrap();
    assert_eq!(count, vec![json!({"count": 3})]);
}

#[tokio::test]
async fn test_months_and_placeholders_are_normalized() {
    setup_tracing();
    let provider = SqliteProvider::new(":memory:").await.unwrap();
    let file = csv_file(CPI_CSV);

    ingest_cpi_csv_file(&provider.db, file.path()).await.unwrap();

    let rows = provider
        .execute_query(
            "SELECT month, month_numeric, sector, index_value, inflation_percentage FROM cpi_data WHERE state = 'Bihar'",
        )
        .await
        .unwrap();
    assert_eq!(
        rows,
        vec![json!({
            "month": "February",
            "month_numeric": 2,
            "sector": "Rural",
            "index_value": 0.0,
            "inflation_percentage": 0.0
        })]
    );
}

#[tokio::test]
async fn test_invalid_month_aborts_before_writing() {
    setup_tracing();
    let provider = SqliteProvider::new(":memory:").await.unwrap();
    let file = csv_file(
        "BaseYear,Year,Month,State,Sector,Group,SubGroup,Index,Inflation (%)\n\
         2012,2025,January,All India,Combined,General,*,193.4,4.26\n\
         2012,2025,Foo,All India,Combined,General,*,193.1,3.61\n",
    );

    let err = ingest_cpi_csv_file(&provider.db, file.path())
        .await
        .unwrap_err();

    assert!(
        matches!(err, IngestError::InvalidMonth { line: 3, .. }),
        "got {err:?}"
    );
    // The file is parsed in full before the transaction starts.
    assert!(provider.execute_query(sql::COUNT_CPI_ROWS_SQL).await.is_err());
}
