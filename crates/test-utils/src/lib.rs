use anyhow::Result;
use async_trait::async_trait;
use cpiquery::{
    errors::QueryError,
    ingest::ingest_cpi_records,
    providers::{
        ai::AiProvider,
        db::{sqlite::SqliteProvider, storage::Storage},
    },
    types::{CpiRecord, FieldType, Sector, TableField, TableSchema},
};
use serde_json::Value;
use std::sync::{Arc, Mutex};
use std::time::Duration;

// --- Test Setup ---

/// A fresh in-memory database seeded with [`cpi_fixture_records`].
pub async fn seeded_provider() -> Result<SqliteProvider> {
    let provider = SqliteProvider::new(":memory:").await?;
    ingest_cpi_records(&provider.db, &cpi_fixture_records()).await?;
    Ok(provider)
}

/// A small CPI dataset spanning two years, both sectors and a few categories.
///
/// The latest period is February 2025; the latest month of 2024 is December.
pub fn cpi_fixture_records() -> Vec<CpiRecord> {
    let rows: [(i64, &str, u32, &str, Sector, &str, &str, f64, f64); 9] = [
        (2024, "March", 3, "All India", Sector::Combined, "General", "*", 185.8, 4.85),
        (2024, "December", 12, "All India", Sector::Combined, "General", "*", 192.9, 5.22),
        (2025, "January", 1, "All India", Sector::Combined, "General", "*", 193.4, 4.26),
        (2025, "February", 2, "All India", Sector::Combined, "General", "*", 193.1, 3.61),
        (2025, "February", 2, "All India", Sector::Rural, "General", "*", 194.0, 3.79),
        (2025, "February", 2, "All India", Sector::Combined, "Food and Beverages", "*", 197.5, 3.84),
        (2025, "February", 2, "All India", Sector::Combined, "Food and Beverages", "Egg", 188.2, -1.13),
        (2025, "February", 2, "Bihar", Sector::Rural, "Food and Beverages", "Egg", 190.7, -0.52),
        (2025, "February", 2, "Bihar", Sector::Combined, "General", "*", 191.3, 3.12),
    ];

    rows.iter()
        .map(
            |&(year, month, month_numeric, state, sector, group, sub_group, index, inflation)| {
                CpiRecord {
                    base_year: 2012,
                    year,
                    month: month.to_string(),
                    month_numeric,
                    state: state.to_string(),
                    sector,
                    group_name: group.to_string(),
                    sub_group_name: sub_group.to_string(),
                    index_value: index,
                    inflation_percentage: inflation,
                }
            },
        )
        .collect()
}

// --- Mock AI Provider ---

/// Replays queued responses in order, then repeats the last one.
#[derive(Clone, Debug)]
pub struct MockAiProvider {
    responses: Arc<Mutex<Vec<String>>>,
    calls: Arc<Mutex<Vec<(String, String)>>>,
    delay: Option<Duration>,
}

impl MockAiProvider {
    pub fn new(responses: Vec<&str>) -> Self {
        Self {
            responses: Arc::new(Mutex::new(
                responses.into_iter().rev().map(String::from).collect(),
            )),
            calls: Arc::new(Mutex::new(Vec::new())),
            delay: None,
        }
    }

    /// Sleeps before answering, to exercise the generation timeout.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Retrieves the recorded `(system_prompt, user_prompt)` calls for assertion.
    pub fn get_calls(&self) -> Vec<(String, String)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl AiProvider for MockAiProvider {
    async fn generate(&self, system_prompt: &str, user_prompt: &str) -> Result<String, QueryError> {
        self.calls
            .lock()
            .unwrap()
            .push((system_prompt.to_string(), user_prompt.to_string()));

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        let mut responses = self.responses.lock().unwrap();
        match responses.len() {
            0 => Err(QueryError::AiApi(
                "MockAiProvider: no response programmed".to_string(),
            )),
            1 => Ok(responses[0].clone()),
            _ => Ok(responses.pop().unwrap_or_default()),
        }
    }
}

// --- Recording Storage ---

/// Returns canned rows for every query and records what it was asked to run.
#[derive(Clone, Debug, Default)]
pub struct RecordingStorage {
    rows: Vec<Value>,
    error: Option<String>,
    queries: Arc<Mutex<Vec<String>>>,
}

impl RecordingStorage {
    pub fn with_rows(rows: Vec<Value>) -> Self {
        Self {
            rows,
            ..Default::default()
        }
    }

    /// Every query fails with `QueryError::Execution(message)`.
    pub fn failing(message: &str) -> Self {
        Self {
            error: Some(message.to_string()),
            ..Default::default()
        }
    }

    pub fn queries(&self) -> Vec<String> {
        self.queries.lock().unwrap().clone()
    }
}

#[async_trait]
impl Storage for RecordingStorage {
    fn name(&self) -> &str {
        "RecordingStorage"
    }

    fn language(&self) -> &str {
        "SQL"
    }

    async fn execute_query(&self, query: &str) -> Result<Vec<Value>, QueryError> {
        self.queries.lock().unwrap().push(query.to_string());
        match &self.error {
            Some(message) => Err(QueryError::Execution(message.clone())),
            None => Ok(self.rows.clone()),
        }
    }

    async fn get_table_schema(&self, _table_name: &str) -> Result<Arc<TableSchema>, QueryError> {
        Ok(Arc::new(TableSchema {
            fields: vec![TableField {
                name: "inflation_percentage".to_string(),
                r#type: FieldType::Float,
                description: None,
            }],
        }))
    }
}
