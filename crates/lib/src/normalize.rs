//! # Result Normalizer
//!
//! Turns executor rows into the endpoint's answer shape. Rows are first
//! summarized as text, then every `"<year> <month>: <rate>%"` occurrence is
//! lifted into a structured record. The extraction is a best-effort pattern
//! match: whenever it finds nothing usable the text is returned verbatim.

use crate::constants::{month_name, NO_RESULT_MESSAGE};
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::sync::LazyLock;
use tracing::debug;

static INFLATION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(\d{4}) (\w+): (-?[\d.]+)%").expect("inflation pattern is valid")
});

/// Columns that tell otherwise identical figures apart.
const DIMENSION_COLUMNS: [&str; 4] = ["state", "sector", "group_name", "sub_group_name"];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InflationRate {
    pub year: i32,
    pub month: String,
    pub inflation_rate: f64,
}

/// Either a list of structured rates or the raw text under `result`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum NormalizedResult {
    Rates(Vec<InflationRate>),
    Raw { result: String },
}

impl NormalizedResult {
    pub fn raw(text: impl Into<String>) -> Self {
        NormalizedResult::Raw {
            result: text.into(),
        }
    }
}

/// Extracts every inflation figure from `text`, in order of appearance.
pub fn normalize(text: &str) -> NormalizedResult {
    let mut rates = Vec::new();
    for caps in INFLATION_RE.captures_iter(text) {
        let parsed = (caps[1].parse::<i32>(), caps[3].parse::<f64>());
        match parsed {
            (Ok(year), Ok(inflation_rate)) => rates.push(InflationRate {
                year,
                month: caps[2].to_string(),
                inflation_rate,
            }),
            _ => {
                debug!(matched = &caps[0], "Unparseable inflation figure, keeping raw text.");
                return NormalizedResult::raw(text);
            }
        }
    }

    if rates.is_empty() {
        NormalizedResult::raw(text)
    } else {
        NormalizedResult::Rates(rates)
    }
}

/// Renders executor rows as text, one line per row.
///
/// Rows only collapse to `"<year> <month>: <rate>%"` figures when they agree
/// on state, sector, group and sub-group. Otherwise every column is kept.
pub fn summarize_rows(rows: &[Value]) -> String {
    if rows.is_empty() {
        return NO_RESULT_MESSAGE.to_string();
    }
    let as_figures = dimensions_agree(rows);
    rows.iter()
        .map(|row| summarize_row(row, as_figures))
        .collect::<Vec<_>>()
        .join("\n")
}

fn dimensions_agree(rows: &[Value]) -> bool {
    DIMENSION_COLUMNS.iter().all(|column| {
        let first = rows[0].get(column);
        rows.iter().all(|row| row.get(column) == first)
    })
}

fn summarize_row(row: &Value, as_figure: bool) -> String {
    let Some(map) = row.as_object() else {
        return row.to_string();
    };

    if as_figure {
        if let Some(line) = inflation_line(map) {
            return line;
        }
    }

    map.iter()
        .map(|(k, v)| format!("{k}: {}", display_value(v)))
        .collect::<Vec<_>>()
        .join(", ")
}

fn inflation_line(map: &Map<String, Value>) -> Option<String> {
    let year = map.get("year").and_then(Value::as_i64)?;
    let month = match map.get("month").and_then(Value::as_str) {
        Some(month) => month.to_string(),
        None => map
            .get("month_numeric")
            .and_then(Value::as_u64)
            .and_then(|n| month_name(n as u32))?
            .to_string(),
    };
    let rate = map
        .get("inflation_percentage")
        .and_then(Value::as_f64)
        .or_else(|| {
            map.iter()
                .filter(|(k, _)| k.to_lowercase().contains("inflation"))
                .find_map(|(_, v)| v.as_f64())
        })?;
    Some(format!("{year} {month}: {}%", round2(rate)))
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

fn display_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => "null".to_string(),
        other => other.to_string(),
    }
}
