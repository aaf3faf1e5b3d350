//! # Application State
//!
//! This module defines the shared application state (`AppState`) and the logic
//! for building it at startup. Every dependency of the query endpoint is
//! constructed here once and injected into the handlers; nothing is global.

use crate::config::{AppConfig, QUERY_GENERATION_TASK};
use anyhow::anyhow;
use cpiquery::{
    context::SchemaContext,
    providers::{db::sqlite::SqliteProvider, factory::create_provider},
    QueryClient, QueryClientBuilder,
};
use std::{fs, path::Path, sync::Arc, time::Duration};
use tracing::{info, warn};

/// A fully resolved task configuration with non-optional fields.
#[derive(Clone, Debug)]
pub struct ResolvedTask {
    pub provider: String,
    pub system_prompt: String,
    pub user_prompt: String,
}

/// The shared application state, accessible from all request handlers.
#[derive(Clone)]
pub struct AppState {
    /// The application's configuration, loaded from `config.yml`.
    pub config: Arc<AppConfig>,
    /// The database the query client reads from.
    pub sqlite_provider: Arc<SqliteProvider>,
    /// Generation, guard, execution and normalization for `/query`.
    pub query_client: Arc<QueryClient>,
}

impl AppState {
    /// The access token `/query` requires, if any.
    pub fn access_token(&self) -> Option<&str> {
        self.config.access_token.as_deref()
    }
}

/// Resolves the query-generation task, failing on any missing field.
fn resolve_query_task(config: &AppConfig) -> anyhow::Result<ResolvedTask> {
    let task = config
        .tasks
        .get(QUERY_GENERATION_TASK)
        .ok_or_else(|| anyhow!("Task '{QUERY_GENERATION_TASK}' is not configured"))?;
    let provider = task.provider.clone().ok_or_else(|| {
        anyhow!("Resolved task '{QUERY_GENERATION_TASK}' is missing required 'provider' field")
    })?;
    let system_prompt = task.system_prompt.clone().ok_or_else(|| {
        anyhow!("Resolved task '{QUERY_GENERATION_TASK}' is missing required 'system_prompt' field")
    })?;
    let user_prompt = task.user_prompt.clone().ok_or_else(|| {
        anyhow!("Resolved task '{QUERY_GENERATION_TASK}' is missing required 'user_prompt' field")
    })?;
    Ok(ResolvedTask {
        provider,
        system_prompt,
        user_prompt,
    })
}

/// Builds the shared application state from the configuration.
///
/// Opens the database named by `db_url` and ensures the `cpi_data` schema exists.
pub async fn build_app_state(config: AppConfig) -> anyhow::Result<AppState> {
    if let Some(dir) = Path::new(&config.db_url)
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
    {
        fs::create_dir_all(dir)?;
    }
    let sqlite_provider = SqliteProvider::new(&config.db_url).await?;
    info!(db_path = %config.db_url, "Initialized storage provider (SQLite).");
    build_app_state_with_provider(config, sqlite_provider).await
}

/// Builds the shared application state around an already opened database.
pub async fn build_app_state_with_provider(
    config: AppConfig,
    sqlite_provider: SqliteProvider,
) -> anyhow::Result<AppState> {
    // Ensure the database schema is up-to-date on startup.
    sqlite_provider.initialize_schema().await?;

    let task = resolve_query_task(&config)?;
    let provider_config = config.providers.get(&task.provider).ok_or_else(|| {
        anyhow!(
            "Provider '{}' for task '{QUERY_GENERATION_TASK}' not found in providers",
            task.provider
        )
    })?;
    let ai_provider = create_provider(&task.provider, provider_config)?;

    let context = SchemaContext::build(&task.system_prompt, &sqlite_provider).await?;
    if context.catalog().is_empty() {
        warn!("'cpi_data' is empty. Load data with `cpi-loader` before querying.");
    }

    let query_client = QueryClientBuilder::new()
        .ai_provider(ai_provider)
        .storage_provider(Box::new(sqlite_provider.clone()))
        .schema_context(context)
        .user_prompt_template(task.user_prompt)
        .generation_timeout(Duration::from_secs(config.generation_timeout_secs))
        .execution_timeout(Duration::from_secs(config.execution_timeout_secs))
        .build()?;

    if config.access_token.is_some() {
        info!("Access-token gate enabled for /query.");
    } else {
        warn!("No access_token configured; /query is open.");
    }

    Ok(AppState {
        config: Arc::new(config),
        sqlite_provider: Arc::new(sqlite_provider),
        query_client: Arc::new(query_client),
    })
}
