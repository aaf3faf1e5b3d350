use crate::{
    errors::QueryError,
    providers::db::storage::Storage,
    types::{FieldType, TableField, TableSchema},
};
use async_trait::async_trait;
use serde_json::Value;
use std::{
    collections::HashMap,
    fmt::{self, Debug},
    sync::Arc,
};
use tokio::sync::RwLock;
use tracing::{debug, info};
use turso::{Database, Value as TursoValue};

pub mod sql;

/// A provider for interacting with a local SQLite database using Turso.
///
/// This provider holds a `Database` instance, which manages a connection pool.
/// When cloned, it shares the same underlying database, so an in-memory
/// database seeded through one clone is visible through every other clone.
#[derive(Clone)]
pub struct SqliteProvider {
    /// The Turso database instance. It's cloneable and thread-safe.
    pub db: Database,
    schema_cache: Arc<RwLock<HashMap<String, Arc<TableSchema>>>>,
}

impl SqliteProvider {
    /// Opens a database file, or a fresh isolated database for `":memory:"`.
    pub async fn new(db_path: &str) -> Result<Self, QueryError> {
        let db = turso::Builder::new_local(db_path)
            .build()
            .await
            .map_err(|e| QueryError::StorageConnection(e.to_string()))?;

        let conn = db
            .connect()
            .map_err(|e| QueryError::StorageConnection(e.to_string()))?;
        // PRAGMA returns a row, so it must go through `query`.
        conn.query("PRAGMA journal_mode=WAL;", ())
            .await
            .map_err(|e| QueryError::StorageConnection(e.to_string()))?;

        Ok(Self {
            db,
            schema_cache: Arc::new(RwLock::new(HashMap::new())),
        })
    }

    /// A helper for tests to pre-populate data by executing multiple SQL statements.
    pub async fn initialize_with_data(&self, init_sql: &str) -> Result<(), QueryError> {
        let conn = self
            .db
            .connect()
            .map_err(|e| QueryError::StorageConnection(e.to_string()))?;

        for statement in init_sql.split(';').filter(|s| !s.trim().is_empty()) {
            conn.execute(statement, ())
                .await
                .map_err(|e| QueryError::Execution(e.to_string()))?;
        }
        Ok(())
    }

    /// Ensures the `cpi_data` table and its indexes exist. Idempotent.
    pub async fn initialize_schema(&self) -> Result<(), QueryError> {
        let conn = self
            .db
            .connect()
            .map_err(|e| QueryError::StorageConnection(e.to_string()))?;

        for statement in sql::ALL_TABLE_CREATION_SQL {
            conn.execute(statement, ())
                .await
                .map_err(|e| QueryError::Execution(e.to_string()))?;
        }
        self.schema_cache.write().await.clear();
        Ok(())
    }
}

impl Debug for SqliteProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SqliteProvider").finish_non_exhaustive()
    }
}

/// Converts a Turso value to a serde_json::Value.
fn turso_value_to_json(v: TursoValue) -> Value {
    match v {
        TursoValue::Null => Value::Null,
        TursoValue::Integer(i) => Value::Number(i.into()),
        TursoValue::Real(f) => serde_json::Number::from_f64(f)
            .map(Value::Number)
            .unwrap_or(Value::Null),
        TursoValue::Text(s) => Value::String(s),
        TursoValue::Blob(_) => Value::String("<blob>".to_string()),
    }
}

#[async_trait]
impl Storage for SqliteProvider {
    fn name(&self) -> &str {
        "SQLite"
    }

    fn language(&self) -> &str {
        "SQL"
    }

    async fn execute_query(&self, query: &str) -> Result<Vec<Value>, QueryError> {
        debug!(query = %query, "--> Executing SQLite query");

        let conn = self
            .db
            .connect()
            .map_err(|e| QueryError::StorageConnection(e.to_string()))?;

        let mut stmt = conn
            .prepare(query)
            .await
            .map_err(|e| QueryError::Execution(e.to_string()))?;

        let column_names: Vec<String> = stmt
            .columns()
            .iter()
            .map(|c| c.name().to_string())
            .collect();

        let mut rows = stmt
            .query(())
            .await
            .map_err(|e| QueryError::Execution(e.to_string()))?;

        let mut json_rows = Vec::new();
        while let Some(row) = rows
            .next()
            .await
            .map_err(|e| QueryError::Execution(e.to_string()))?
        {
            let mut row_map = serde_json::Map::new();
            for (i, name) in column_names.iter().enumerate() {
                let value = row
                    .get_value(i)
                    .map_err(|e| QueryError::Execution(e.to_string()))?;
                row_map.insert(name.clone(), turso_value_to_json(value));
            }
            json_rows.push(Value::Object(row_map));
        }

        debug!("<-- SQLite returned {} rows", json_rows.len());
        Ok(json_rows)
    }

    async fn get_table_schema(&self, table_name: &str) -> Result<Arc<TableSchema>, QueryError> {
        if let Some(schema) = self.schema_cache.read().await.get(table_name) {
            debug!(table_name = %table_name, "Returning cached schema.");
            return Ok(schema.clone());
        }

        let conn = self
            .db
            .connect()
            .map_err(|e| QueryError::StorageConnection(e.to_string()))?;

        let query = format!("PRAGMA table_info({table_name});");
        let mut rows = conn
            .query(&query, ())
            .await
            .map_err(|e| QueryError::Execution(e.to_string()))?;

        let mut fields = Vec::new();
        while let Some(row) = rows
            .next()
            .await
            .map_err(|e| QueryError::Execution(e.to_string()))?
        {
            // PRAGMA table_info columns: cid, name, type, notnull, dflt_value, pk
            if let (Ok(TursoValue::Text(name)), Ok(TursoValue::Text(type_str))) =
                (row.get_value(1), row.get_value(2))
            {
                let field_type = match type_str.to_uppercase().as_str() {
                    "INTEGER" | "INT" => FieldType::Integer,
                    "REAL" | "FLOAT" | "DOUBLE" => FieldType::Float,
                    "BLOB" => FieldType::Bytes,
                    _ => FieldType::String,
                };
                fields.push(TableField {
                    name,
                    r#type: field_type,
                    description: None,
                });
            }
        }

        if fields.is_empty() {
            return Err(QueryError::Execution(format!(
                "Table '{table_name}' not found or has no columns."
            )));
        }

        info!(table_name = %table_name, "Fetched schema with {} columns.", fields.len());
        let schema = Arc::new(TableSchema { fields });
        self.schema_cache
            .write()
            .await
            .insert(table_name.to_string(), schema.clone());

        Ok(schema)
    }
}
