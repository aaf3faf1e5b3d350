use crate::{errors::QueryError, types::TableSchema};
use async_trait::async_trait;
use dyn_clone::DynClone;
use serde_json::Value;
use std::fmt::Debug;
use std::sync::Arc;

/// A trait for interacting with a storage backend.
///
/// The query pipeline only ever reads through this trait; writes happen in
/// the batch loader against the concrete provider.
#[async_trait]
pub trait Storage: Send + Sync + DynClone + Debug {
    /// Returns the name of the storage provider (e.g., "SQLite").
    fn name(&self) -> &str;

    /// Returns the query language of the provider (e.g., "SQL").
    fn language(&self) -> &str;

    /// Executes a query and returns one JSON object per row, keyed by column name.
    async fn execute_query(&self, query: &str) -> Result<Vec<Value>, QueryError>;

    /// Retrieves the schema for a given table.
    async fn get_table_schema(&self, table_name: &str) -> Result<Arc<TableSchema>, QueryError>;
}

dyn_clone::clone_trait_object!(Storage);
