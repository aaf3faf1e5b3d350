//! # Schema Context
//!
//! The fixed system prompt given to the generation capability: the
//! `cpi_data` schema, the default-inference policy and the output rules,
//! with the live column list and category catalog filled in at startup.

use crate::{
    catalog::Catalog,
    constants::CPI_TABLE,
    errors::QueryError,
    prompts::tasks::QUERY_GENERATION_SYSTEM_PROMPT,
    providers::db::storage::Storage,
    types::{FieldType, TableSchema},
};
use tracing::{info, warn};

#[derive(Debug, Clone, PartialEq)]
pub struct SchemaContext {
    text: String,
    catalog: Catalog,
}

impl Default for SchemaContext {
    fn default() -> Self {
        Self::render(QUERY_GENERATION_SYSTEM_PROMPT, "SQLite", "SQL", None, Catalog::default())
    }
}

impl SchemaContext {
    /// Fills the `{language}`, `{db_name}`, `{columns}` and `{catalog}` placeholders.
    pub fn render(
        template: &str,
        db_name: &str,
        language: &str,
        schema: Option<&TableSchema>,
        catalog: Catalog,
    ) -> Self {
        let columns = match schema {
            Some(schema) => schema
                .fields
                .iter()
                .map(|f| format!("{} {}", f.name, type_label(f.r#type)))
                .collect::<Vec<_>>()
                .join(", "),
            None => "(see the table description above)".to_string(),
        };

        let text = template
            .replace("{language}", language)
            .replace("{db_name}", db_name)
            .replace("{columns}", &columns)
            .replace("{catalog}", &catalog.render());

        Self { text, catalog }
    }

    /// Reads the live schema and catalog from the store and renders `template`.
    ///
    /// A store without the `cpi_data` table still yields a usable context so the
    /// server can start before any data has been loaded.
    pub async fn build(template: &str, storage: &dyn Storage) -> Result<Self, QueryError> {
        let schema = match storage.get_table_schema(CPI_TABLE).await {
            Ok(schema) => Some(schema),
            Err(QueryError::Execution(msg)) => {
                warn!("Schema for '{CPI_TABLE}' unavailable: {msg}");
                None
            }
            Err(e) => return Err(e),
        };

        let catalog = if schema.is_some() {
            Catalog::load(storage).await?
        } else {
            Catalog::default()
        };

        info!(
            states = catalog.states.len(),
            categories = catalog.categories.len(),
            "Rendered schema context."
        );
        Ok(Self::render(
            template,
            storage.name(),
            storage.language(),
            schema.as_deref(),
            catalog,
        ))
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }
}

fn type_label(field_type: FieldType) -> &'static str {
    match field_type {
        FieldType::Integer => "INTEGER",
        FieldType::Float => "REAL",
        FieldType::String => "TEXT",
        FieldType::Bytes => "BLOB",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{catalog::Category, types::TableField};

    #[test]
    fn render_fills_every_placeholder() {
        let schema = TableSchema {
            fields: vec![
                TableField {
                    name: "year".into(),
                    r#type: FieldType::Integer,
                    description: None,
                },
                TableField {
                    name: "inflation_percentage".into(),
                    r#type: FieldType::Float,
                    description: None,
                },
            ],
        };
        let catalog = Catalog {
            states: vec!["All India".into()],
            categories: vec![Category {
                group_name: "General".into(),
                sub_group_name: "*".into(),
            }],
        };

        let ctx = SchemaContext::render(
            QUERY_GENERATION_SYSTEM_PROMPT,
            "SQLite",
            "SQL",
            Some(&schema),
            catalog.clone(),
        );

        assert!(ctx.text().contains("Live columns: year INTEGER, inflation_percentage REAL"));
        assert!(ctx.text().contains("States: All India"));
        assert!(ctx.text().contains("expert SQL analyst for a SQLite database"));
        assert!(!ctx.text().contains("{catalog}"));
        assert_eq!(ctx.catalog(), &catalog);
    }

    #[test]
    fn default_context_has_no_loaded_values() {
        let ctx = SchemaContext::default();
        assert!(ctx.text().contains("(no records have been loaded yet)"));
        assert!(ctx.catalog().is_empty());
    }
}
