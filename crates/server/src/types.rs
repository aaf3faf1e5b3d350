use cpiquery::{NormalizedResult, QueryOutcome};
use serde::{Deserialize, Serialize};

/// Query-string parameters of `GET /query`.
#[derive(Deserialize, Debug, Default)]
pub struct QueryParams {
    #[serde(default)]
    pub user_query: Option<String>,
    /// Adds the generated SQL and resolved defaults to the response.
    #[serde(default)]
    pub debug: Option<bool>,
}

#[derive(Serialize, Debug)]
pub struct QueryResponse {
    pub query: String,
    pub result: NormalizedResult,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub debug: Option<DebugInfo>,
}

#[derive(Serialize, Debug)]
pub struct DebugInfo {
    pub generated_sql: String,
    pub row_count: usize,
    pub defaults: Vec<String>,
}

impl QueryResponse {
    pub fn from_outcome(outcome: QueryOutcome, with_debug: bool) -> Self {
        let debug = with_debug.then(|| DebugInfo {
            generated_sql: outcome.generated_sql,
            row_count: outcome.row_count,
            defaults: outcome.defaults,
        });
        Self {
            query: outcome.question,
            result: outcome.result,
            debug,
        }
    }
}
