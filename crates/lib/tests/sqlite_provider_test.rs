//! # SQLite Provider Tests
//!
//! Verifies the `SqliteProvider` as the store behind the query pipeline:
//! executing queries into JSON rows, reporting the `cpi_data` schema, and
//! feeding the catalog and schema context.
//!
//! Each test uses an in-memory database, so they are isolated from one another.

mod common;

use crate::common::setup_tracing;
use cpiquery::{
    catalog::{Catalog, CategoryMatch},
    context::SchemaContext,
    prompts::tasks::QUERY_GENERATION_SYSTEM_PROMPT,
    providers::db::{
        sqlite::{sql, SqliteProvider},
        storage::Storage,
    },
    types::FieldType,
    QueryError,
};
use cpiquery_test_utils::seeded_provider;
use serde_json::json;

#[tokio::test]
async fn test_sqlite_provider_basic_query() {
    setup_tracing();
    let provider = SqliteProvider::new(":memory:")
        .await
        .expect("Failed to create SqliteProvider");
    provider
        .initialize_with_data(
            "CREATE TABLE users (id INTEGER PRIMARY KEY, name TEXT NOT NULL);
             INSERT INTO users (id, name) VALUES (1, 'Alice');
             INSERT INTO users (id, name) VALUES (2, 'Bob');",
        )
        .await
        .expect("Failed to initialize database with test data");

    let rows = provider
        .execute_query("SELECT id, name FROM users ORDER BY id ASC")
        .await
        .expect("Failed to execute query");

    assert_eq!(
        rows,
        vec![json!({"id": 1, "name": "Alice"}), json!({"id": 2, "name": "Bob"})]
    );
}

#[tokio::test]
async fn test_sqlite_in_memory_is_isolated() {
    setup_tracing();
    let provider1 = SqliteProvider::new(":memory:").await.unwrap();
    provider1
        .initialize_with_data("CREATE TABLE t1 (id INTEGER); INSERT INTO t1 (id) VALUES (1);")
        .await
        .unwrap();
    let provider2 = SqliteProvider::new(":memory:").await.unwrap();

    let result = provider2.execute_query("SELECT * FROM t1").await;

    assert!(matches!(result, Err(QueryError::Execution(_))));
}

#[tokio::test]
async fn test_cpi_schema_is_reported_with_types() {
    setup_tracing();
    let provider = SqliteProvider::new(":memory:").await.unwrap();
    provider.initialize_schema().await.unwrap();
    // Creating the schema twice is harmless.
    provider.initialize_schema().await.unwrap();

    let schema = provider.get_table_schema("cpi_data").await.unwrap();
    let field = |name: &str| {
        schema
            .fields
            .iter()
            .find(|f| f.name == name)
            .map(|f| f.r#type)
    };

    assert_eq!(schema.fields.len(), 11);
    assert_eq!(field("month_numeric"), Some(FieldType::Integer));
    assert_eq!(field("sub_group_name"), Some(FieldType::String));
    assert_eq!(field("inflation_percentage"), Some(FieldType::Float));

    let missing = provider.get_table_schema("no_such_table").await;
    assert!(matches!(missing, Err(QueryError::Execution(_))));
}

#[tokio::test]
async fn test_catalog_and_latest_period_from_fixtures() {
    setup_tracing();
    let provider = seeded_provider().await.unwrap();

    let catalog = Catalog::load(&provider).await.unwrap();
    assert_eq!(catalog.states, vec!["All India", "Bihar"]);
    assert_eq!(catalog.groups(), vec!["Food and Beverages", "General"]);
    assert_eq!(
        catalog.match_categories("egg prices in Bihar"),
        vec![CategoryMatch::SubGroup {
            group: "Food and Beverages".to_string(),
            sub_group: "Egg".to_string(),
        }]
    );

    let latest = provider
        .execute_query(&sql::latest_period(None, None))
        .await
        .unwrap();
    assert_eq!(
        latest,
        vec![json!({"year": 2025, "month_numeric": 2, "month": "February"})]
    );

    let count = provider.execute_query(sql::COUNT_CPI_ROWS_SQL).await.unwrap();
    assert_eq!(count, vec![json!({"count": 9})]);
}

#[tokio::test]
async fn test_schema_context_tolerates_empty_database() {
    setup_tracing();
    let provider = SqliteProvider::new(":memory:").await.unwrap();

    let context = SchemaContext::build(QUERY_GENERATION_SYSTEM_PROMPT, &provider)
        .await
        .expect("An empty database should still yield a context");

    assert!(context.catalog().is_empty());
    assert!(context.text().contains("(no records have been loaded yet)"));
}
