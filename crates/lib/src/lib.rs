//! # Natural Language CPI Queries
//!
//! This crate turns natural-language questions about Consumer Price Index
//! data into SQL using a configurable AI provider, rejects anything that is
//! not a read-only query, executes the rest against a storage provider and
//! normalizes the answer into structured inflation figures.

pub mod catalog;
pub mod constants;
pub mod context;
pub mod defaults;
pub mod errors;
pub mod guard;
pub mod ingest;
pub mod normalize;
pub mod prompts;
pub mod providers;
pub mod types;

pub use errors::QueryError;
pub use normalize::NormalizedResult;
pub use types::{QueryClient, QueryClientBuilder, QueryOutcome};

use crate::{
    constants::month_name,
    context::SchemaContext,
    defaults::{render_hints, resolve_defaults, PeriodRequest, QuestionIntent},
    providers::db::sqlite::sql,
    types::Period,
};
use serde_json::Value;
use tokio::time::timeout;
use tracing::{debug, error, info, warn};

impl QueryClient {
    /// Answers one question: resolve defaults, generate, guard, execute, normalize.
    pub async fn run(&self, question: &str) -> Result<QueryOutcome, QueryError> {
        let question = question.trim();
        if question.is_empty() {
            return Err(QueryError::EmptyQuestion);
        }
        info!("[run] received question: {question:?}");

        let intent = QuestionIntent::analyze(question);
        let period = self.resolve_period(intent.period_request()).await;
        let defaults = resolve_defaults(question, &intent, self.context.catalog(), period.as_ref());

        let user_prompt = self
            .user_prompt_template
            .replace("{prompt}", question)
            .replace("{defaults}", &render_hints(&defaults));

        debug!(user_prompt = %user_prompt, "--> Sending prompts to AI Provider");
        let raw = timeout(
            self.generation_timeout,
            self.ai_provider.generate(self.context.text(), &user_prompt),
        )
        .await
        .map_err(|_| QueryError::GenerationTimeout(self.generation_timeout.as_secs()))??;
        debug!("<-- Query from AI: {raw}");

        let sql = guard::sanitize(&raw).inspect_err(|e| {
            error!("[run] Rejected generated statement: {e}");
        })?;

        let rows = self.execute_with_timeout(&sql).await.inspect_err(|e| {
            error!("[run] Query execution error: {e:?}");
        })?;

        let text = normalize::summarize_rows(&rows);
        let result = normalize::normalize(&text);
        info!(rows = rows.len(), "[run] answered question.");

        Ok(QueryOutcome {
            question: question.to_string(),
            generated_sql: sql,
            row_count: rows.len(),
            defaults,
            result,
        })
    }

    /// The rendered schema context used as the system prompt.
    pub fn schema_context(&self) -> &SchemaContext {
        &self.context
    }

    async fn execute_with_timeout(&self, sql: &str) -> Result<Vec<Value>, QueryError> {
        timeout(self.execution_timeout, self.storage_provider.execute_query(sql))
            .await
            .map_err(|_| {
                QueryError::Execution(format!(
                    "query execution timed out after {}s",
                    self.execution_timeout.as_secs()
                ))
            })?
    }

    /// Looks up the latest period matching what the question left open.
    ///
    /// A failed lookup leaves the period to the schema context's own rules.
    async fn resolve_period(&self, request: PeriodRequest) -> Option<Period> {
        let lookup = match request {
            PeriodRequest::Latest => sql::latest_period(None, None),
            PeriodRequest::LatestMonthOf(year) => sql::latest_period(Some(year), None),
            PeriodRequest::LatestYearWith(month) => sql::latest_period(None, Some(month)),
            PeriodRequest::Explicit => return None,
        };

        let rows = match self.execute_with_timeout(&lookup).await {
            Ok(rows) => rows,
            Err(e) => {
                warn!("[run] Could not resolve the latest period: {e}");
                return None;
            }
        };
        let period = rows.first().and_then(|row| {
            let year = row.get("year").and_then(Value::as_i64)?;
            let month_numeric = row.get("month_numeric").and_then(Value::as_u64)? as u32;
            let month = row
                .get("month")
                .and_then(Value::as_str)
                .or_else(|| month_name(month_numeric))?
                .to_string();
            Some(Period {
                year,
                month_numeric,
                month,
            })
        });
        debug!(?request, ?period, "Resolved period.");
        period
    }
}
