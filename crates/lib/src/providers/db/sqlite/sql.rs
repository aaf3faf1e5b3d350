//! # SQLite Specific SQL Queries
//!
//! This module centralizes the SQL used against the `cpi_data` table by the
//! loader, the catalog and the default resolver.

pub const CREATE_CPI_TABLE_SQL: &str = "
    CREATE TABLE IF NOT EXISTS cpi_data (
        id INTEGER PRIMARY KEY,
        base_year INTEGER,
        year INTEGER,
        month TEXT,
        month_numeric INTEGER,
        state TEXT,
        sector TEXT,
        group_name TEXT,
        sub_group_name TEXT,
        index_value REAL,
        inflation_percentage REAL,
        UNIQUE (year, month, state, sector, group_name, sub_group_name, index_value, inflation_percentage)
    );";

pub const CREATE_CPI_PERIOD_INDEX_SQL: &str =
    "CREATE INDEX IF NOT EXISTS idx_cpi_data_period ON cpi_data (year, month_numeric);";

/// Every statement needed to bring an empty database up to the current schema.
pub const ALL_TABLE_CREATION_SQL: &[&str] = &[CREATE_CPI_TABLE_SQL, CREATE_CPI_PERIOD_INDEX_SQL];

/// Inserts one record; a duplicate of the unique tuple is silently skipped.
pub const INSERT_CPI_RECORD_SQL: &str = "
    INSERT INTO cpi_data (base_year, year, month, month_numeric, state, sector, group_name, sub_group_name, index_value, inflation_percentage)
    VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
    ON CONFLICT (year, month, state, sector, group_name, sub_group_name, index_value, inflation_percentage) DO NOTHING";

pub const DISTINCT_STATES_SQL: &str =
    "SELECT DISTINCT state FROM cpi_data WHERE state IS NOT NULL ORDER BY state";

pub const DISTINCT_CATEGORIES_SQL: &str = "SELECT DISTINCT group_name, sub_group_name FROM cpi_data WHERE group_name IS NOT NULL ORDER BY group_name, sub_group_name";

pub const COUNT_CPI_ROWS_SQL: &str = "SELECT COUNT(*) AS count FROM cpi_data";

/// The latest period, optionally restricted to a year or to a calendar month.
pub fn latest_period(year: Option<i64>, month_numeric: Option<u32>) -> String {
    let mut conditions = Vec::new();
    if let Some(year) = year {
        conditions.push(format!("year = {year}"));
    }
    if let Some(month) = month_numeric {
        conditions.push(format!("month_numeric = {month}"));
    }
    let where_clause = if conditions.is_empty() {
        String::new()
    } else {
        format!("WHERE {} ", conditions.join(" AND "))
    };
    format!(
        "SELECT year, month_numeric, month FROM cpi_data {where_clause}ORDER BY year DESC, month_numeric DESC LIMIT 1"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn latest_period_builds_optional_filters() {
        assert_eq!(
            latest_period(None, None),
            "SELECT year, month_numeric, month FROM cpi_data ORDER BY year DESC, month_numeric DESC LIMIT 1"
        );
        assert!(latest_period(Some(2024), None).contains("WHERE year = 2024 ORDER BY"));
        assert!(latest_period(None, Some(3)).contains("WHERE month_numeric = 3 ORDER BY"));
    }
}
