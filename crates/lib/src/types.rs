use crate::{
    constants::{DEFAULT_EXECUTION_TIMEOUT_SECS, DEFAULT_GENERATION_TIMEOUT_SECS},
    context::SchemaContext,
    errors::QueryError,
    normalize::NormalizedResult,
    prompts::tasks::QUERY_GENERATION_USER_PROMPT,
    providers::{ai::AiProvider, db::storage::Storage},
};
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr, time::Duration};

// --- Table schema ---

/// Column types reported by a storage provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FieldType {
    Integer,
    Float,
    String,
    Bytes,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableField {
    pub name: String,
    pub r#type: FieldType,
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableSchema {
    pub fields: Vec<TableField>,
}

// --- CPI domain ---

/// Population segment an index is computed for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Sector {
    Combined,
    Rural,
    Urban,
}

impl Sector {
    pub fn as_str(&self) -> &'static str {
        match self {
            Sector::Combined => "Combined",
            Sector::Rural => "Rural",
            Sector::Urban => "Urban",
        }
    }
}

impl fmt::Display for Sector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Sector {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "combined" => Ok(Sector::Combined),
            "rural" => Ok(Sector::Rural),
            "urban" => Ok(Sector::Urban),
            other => Err(format!("unknown sector '{other}'")),
        }
    }
}

/// One row of the `cpi_data` table, minus the surrogate key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CpiRecord {
    pub base_year: i64,
    pub year: i64,
    pub month: String,
    pub month_numeric: u32,
    pub state: String,
    pub sector: Sector,
    pub group_name: String,
    pub sub_group_name: String,
    pub index_value: f64,
    pub inflation_percentage: f64,
}

/// A reporting period present in the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Period {
    pub year: i64,
    pub month_numeric: u32,
    pub month: String,
}

// --- Provider configuration ---

/// A reusable configuration for a specific AI provider instance.
#[derive(Debug, Deserialize, Clone)]
pub struct ProviderConfig {
    /// The type of provider (e.g., "gemini", "local").
    pub provider: String,
    /// The API URL. Optional for Gemini, where it is derived from the model name.
    pub api_url: Option<String>,
    /// The API key, which can be null for local providers.
    pub api_key: Option<String>,
    pub model_name: String,
}

// --- Query client ---

/// The outcome of one natural-language question.
#[derive(Debug, Clone, Serialize)]
pub struct QueryOutcome {
    pub question: String,
    pub generated_sql: String,
    pub row_count: usize,
    pub defaults: Vec<String>,
    pub result: NormalizedResult,
}

/// Turns questions into validated SQL, runs it, and normalizes the answer.
///
/// Holds only immutable, shareable dependencies; one instance serves every request.
pub struct QueryClient {
    pub(crate) ai_provider: Box<dyn AiProvider>,
    pub(crate) storage_provider: Box<dyn Storage>,
    pub(crate) context: SchemaContext,
    pub(crate) user_prompt_template: String,
    pub(crate) generation_timeout: Duration,
    pub(crate) execution_timeout: Duration,
}

impl fmt::Debug for QueryClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QueryClient")
            .field("ai_provider", &self.ai_provider)
            .field("storage_provider", &self.storage_provider.name())
            .field("generation_timeout", &self.generation_timeout)
            .field("execution_timeout", &self.execution_timeout)
            .finish_non_exhaustive()
    }
}

/// A builder for creating `QueryClient` instances.
#[derive(Default)]
pub struct QueryClientBuilder {
    ai_provider: Option<Box<dyn AiProvider>>,
    storage_provider: Option<Box<dyn Storage>>,
    context: Option<SchemaContext>,
    user_prompt_template: Option<String>,
    generation_timeout: Option<Duration>,
    execution_timeout: Option<Duration>,
}

impl QueryClientBuilder {
    /// Creates a new `QueryClientBuilder`.
    ///
    /// # Examples
    ///
    /// ```
    /// use cpiquery::QueryClientBuilder;
    ///
    /// let builder = QueryClientBuilder::new();
    /// ```
    pub fn new() -> Self {
        Self::default()
    }

    pub fn ai_provider(mut self, ai_provider: Box<dyn AiProvider>) -> Self {
        self.ai_provider = Some(ai_provider);
        self
    }

    pub fn storage_provider(mut self, storage_provider: Box<dyn Storage>) -> Self {
        self.storage_provider = Some(storage_provider);
        self
    }

    /// Sets the rendered schema context sent as the system prompt.
    pub fn schema_context(mut self, context: SchemaContext) -> Self {
        self.context = Some(context);
        self
    }

    /// Overrides the user prompt template (`{prompt}` and `{defaults}` placeholders).
    pub fn user_prompt_template(mut self, template: impl Into<String>) -> Self {
        self.user_prompt_template = Some(template.into());
        self
    }

    pub fn generation_timeout(mut self, timeout: Duration) -> Self {
        self.generation_timeout = Some(timeout);
        self
    }

    pub fn execution_timeout(mut self, timeout: Duration) -> Self {
        self.execution_timeout = Some(timeout);
        self
    }

    /// Builds the `QueryClient`.
    ///
    /// Fails if either the AI provider or the storage provider is missing.
    pub fn build(self) -> Result<QueryClient, QueryError> {
        let ai_provider = self.ai_provider.ok_or_else(|| {
            QueryError::MissingAiProvider("no AI provider was given to the builder".to_string())
        })?;
        let storage_provider = self
            .storage_provider
            .ok_or(QueryError::MissingStorageProvider)?;

        Ok(QueryClient {
            ai_provider,
            storage_provider,
            context: self.context.unwrap_or_default(),
            user_prompt_template: self
                .user_prompt_template
                .unwrap_or_else(|| QUERY_GENERATION_USER_PROMPT.to_string()),
            generation_timeout: self
                .generation_timeout
                .unwrap_or(Duration::from_secs(DEFAULT_GENERATION_TIMEOUT_SECS)),
            execution_timeout: self
                .execution_timeout
                .unwrap_or(Duration::from_secs(DEFAULT_EXECUTION_TIMEOUT_SECS)),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sector_parses_case_insensitively() {
        assert_eq!("rural".parse::<Sector>(), Ok(Sector::Rural));
        assert_eq!(" Combined ".parse::<Sector>(), Ok(Sector::Combined));
        assert_eq!(Sector::Urban.to_string(), "Urban");
        assert!("suburban".parse::<Sector>().is_err());
    }

    #[test]
    fn builder_requires_both_providers() {
        let err = QueryClientBuilder::new().build().unwrap_err();
        assert!(matches!(err, QueryError::MissingAiProvider(_)));
    }
}
