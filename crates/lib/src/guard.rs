//! # SQL Guard
//!
//! Pulls the statement out of raw model output and refuses anything that is
//! not a read-only query. Nothing reaches the store without passing
//! [`validate_select`].

use crate::errors::QueryError;
use regex::Regex;
use std::sync::LazyLock;

/// Statements containing any of these keywords are rejected outright.
static FORBIDDEN_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(UPDATE|DELETE|INSERT|DROP|TRUNCATE)\b")
        .expect("forbidden pattern is valid")
});
static READ_ONLY_START_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)^\s*(SELECT|WITH)\b").expect("start pattern is valid"));
static CODE_FENCE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)```(?:sql|query)?\n?([\s\S]*?)```").expect("fence pattern is valid")
});

/// Strips markdown fences, surrounding whitespace and one trailing semicolon.
pub fn extract_sql(raw: &str) -> Result<String, QueryError> {
    let statement = CODE_FENCE_RE
        .captures(raw)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
        .unwrap_or(raw)
        .trim();
    let statement = statement.strip_suffix(';').unwrap_or(statement).trim_end();
    Ok(statement.to_string())
}

/// Accepts a read-only statement only.
pub fn validate_select(statement: &str) -> Result<(), QueryError> {
    if statement.trim().is_empty() {
        return Err(QueryError::Generation(
            "the model returned no statement".to_string(),
        ));
    }

    if let Some(keyword) = FORBIDDEN_RE
        .captures(statement)
        .and_then(|caps| caps.get(1))
    {
        return Err(QueryError::UnsafeQuery(format!(
            "statement contains forbidden keyword {}",
            keyword.as_str().to_uppercase()
        )));
    }

    if !READ_ONLY_START_RE.is_match(statement) {
        return Err(QueryError::UnsafeQuery(
            "only SELECT statements are allowed".to_string(),
        ));
    }

    Ok(())
}

/// [`extract_sql`] followed by [`validate_select`].
pub fn sanitize(raw: &str) -> Result<String, QueryError> {
    let statement = extract_sql(raw)?;
    validate_select(&statement)?;
    Ok(statement)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_fences_and_trailing_semicolon() {
        let raw = "Here you go:\n```sql\nSELECT year FROM cpi_data;\n```";
        assert_eq!(sanitize(raw).unwrap(), "SELECT year FROM cpi_data");
        assert_eq!(sanitize("  select 1 ;  ").unwrap(), "select 1");
    }

    #[test]
    fn accepts_common_table_expressions() {
        let sql = "WITH latest AS (SELECT MAX(year) AS y FROM cpi_data) SELECT * FROM cpi_data, latest WHERE year = latest.y";
        assert!(validate_select(sql).is_ok());
    }

    #[test]
    fn rejects_mutating_keywords_anywhere() {
        for sql in [
            "DELETE FROM cpi_data",
            "drop table cpi_data",
            "SELECT * FROM cpi_data WHERE 1 = 1 UNION SELECT 1; TRUNCATE cpi_data",
            "WITH x AS (DELETE FROM cpi_data RETURNING *) SELECT * FROM x",
        ] {
            assert!(
                matches!(validate_select(sql), Err(QueryError::UnsafeQuery(_))),
                "{sql} should be rejected"
            );
        }
    }

    #[test]
    fn keywords_inside_identifiers_are_not_forbidden() {
        assert!(validate_select("SELECT updated_at, dropped FROM cpi_data").is_ok());
    }

    #[test]
    fn rejects_statements_that_are_not_queries() {
        assert!(matches!(
            validate_select("PRAGMA table_info(cpi_data)"),
            Err(QueryError::UnsafeQuery(_))
        ));
        assert!(matches!(
            validate_select("The inflation rate was 1.2%"),
            Err(QueryError::UnsafeQuery(_))
        ));
    }

    #[test]
    fn empty_output_is_a_generation_failure() {
        assert!(matches!(sanitize("```sql\n```"), Err(QueryError::Generation(_))));
        assert!(matches!(validate_select("   "), Err(QueryError::Generation(_))));
    }
}
