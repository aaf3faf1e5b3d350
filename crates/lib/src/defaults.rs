//! # Default Inference
//!
//! Works out which of year, month, sector, state and category a question
//! leaves unspecified, and turns the default-inference policy into explicit
//! filter hints for the generation capability. The latest period is resolved
//! against the store, so the model never has to guess it.

use crate::{
    catalog::{contains_phrase, Catalog, CategoryMatch},
    constants::{month_number, ALL_INDIA, DEFAULT_SECTOR, GENERAL_GROUP, NO_SUB_GROUP},
    types::{Period, Sector},
};
use regex::Regex;
use std::sync::LazyLock;

static YEAR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b((?:19|20)\d{2})\b").expect("year pattern is valid"));
const LATEST_WORDS: [&str; 5] = ["latest", "recent", "current", "newest", "last"];

/// What a question says about the reporting period and sector.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QuestionIntent {
    pub years: Vec<i64>,
    pub months: Vec<u32>,
    pub sectors: Vec<Sector>,
    pub asks_latest: bool,
}

/// The period lookup a question needs before generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PeriodRequest {
    /// Neither year nor month named: latest year, then latest month in it.
    Latest,
    /// A single year without a month: latest month within that year.
    LatestMonthOf(i64),
    /// A single month without a year: latest year having that month.
    LatestYearWith(u32),
    /// The question pins the period itself.
    Explicit,
}

impl QuestionIntent {
    pub fn analyze(question: &str) -> Self {
        let mut years = Vec::new();
        for caps in YEAR_RE.captures_iter(question) {
            if let Some(year) = caps.get(1).and_then(|m| m.as_str().parse::<i64>().ok()) {
                if !years.contains(&year) {
                    years.push(year);
                }
            }
        }

        let lowered = question.to_lowercase();
        let words: Vec<&str> = lowered
            .split(|c: char| !c.is_alphanumeric())
            .filter(|w| !w.is_empty())
            .collect();

        let mut months = Vec::new();
        let mut sectors = Vec::new();
        for word in &words {
            if let Some(month) = month_number(word) {
                if !months.contains(&month) {
                    months.push(month);
                }
            }
            if let Ok(sector) = word.parse::<Sector>() {
                if !sectors.contains(&sector) {
                    sectors.push(sector);
                }
            }
        }

        let asks_latest = words.iter().any(|w| LATEST_WORDS.contains(w));

        Self {
            years,
            months,
            sectors,
            asks_latest,
        }
    }

    pub fn period_request(&self) -> PeriodRequest {
        match (self.years.as_slice(), self.months.as_slice()) {
            ([], []) => PeriodRequest::Latest,
            ([year], []) => PeriodRequest::LatestMonthOf(*year),
            ([], [month]) => PeriodRequest::LatestYearWith(*month),
            _ if self.asks_latest && self.years.is_empty() => PeriodRequest::Latest,
            _ => PeriodRequest::Explicit,
        }
    }
}

/// Renders the filter hints for everything the question leaves open.
///
/// `period` is the store's answer to [`QuestionIntent::period_request`]; it is
/// `None` when the request is explicit or the store holds no matching period.
pub fn resolve_defaults(
    question: &str,
    intent: &QuestionIntent,
    catalog: &Catalog,
    period: Option<&Period>,
) -> Vec<String> {
    let mut hints = Vec::new();

    if let Some(period) = period {
        let reason = match intent.period_request() {
            PeriodRequest::Latest => "The question names no year or month".to_string(),
            PeriodRequest::LatestMonthOf(year) => {
                format!("The question names year {year} but no month")
            }
            PeriodRequest::LatestYearWith(_) => "The question names a month but no year".to_string(),
            PeriodRequest::Explicit => "The question asks for the latest data".to_string(),
        };
        hints.push(format!(
            "Period: {reason}. Use year = {} AND month_numeric = {} ({}), the latest matching period in cpi_data.",
            period.year, period.month_numeric, period.month
        ));
    }

    if intent.sectors.is_empty() {
        hints.push(format!(
            "Sector: none named. Use sector = '{DEFAULT_SECTOR}'."
        ));
    }

    let national = contains_phrase(&question.to_lowercase(), &ALL_INDIA.to_lowercase());
    if national || catalog.match_states(question).is_empty() {
        hints.push(format!("State: none named. Use state = '{ALL_INDIA}'."));
    }

    let categories = catalog.match_categories(question);
    if categories.is_empty() {
        hints.push(format!(
            "Category: no group or sub-group named. Use group_name = '{GENERAL_GROUP}' AND sub_group_name = '{NO_SUB_GROUP}'."
        ));
    }
    for category in categories {
        match category {
            CategoryMatch::Group(group) => hints.push(format!(
                "Category: group '{group}' named without a sub-group. Use group_name = '{group}' AND sub_group_name = '{NO_SUB_GROUP}'."
            )),
            CategoryMatch::SubGroup { group, sub_group } => hints.push(format!(
                "Category: sub-group '{sub_group}' named. Use group_name = '{group}' AND sub_group_name = '{sub_group}'."
            )),
        }
    }

    hints
}

/// Formats hints as a bullet list for the `{defaults}` placeholder.
pub fn render_hints(hints: &[String]) -> String {
    if hints.is_empty() {
        return "None. The question specifies every filter.".to_string();
    }
    hints
        .iter()
        .map(|h| format!("- {h}"))
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Category;

    fn catalog() -> Catalog {
        Catalog {
            states: vec!["All India".into(), "Bihar".into(), "Gujarat".into()],
            categories: vec![
                Category {
                    group_name: "Food and Beverages".into(),
                    sub_group_name: "*".into(),
                },
                Category {
                    group_name: "Food and Beverages".into(),
                    sub_group_name: "Egg".into(),
                },
                Category {
                    group_name: "General".into(),
                    sub_group_name: "*".into(),
                },
            ],
        }
    }

    fn feb_2025() -> Period {
        Period {
            year: 2025,
            month_numeric: 2,
            month: "February".into(),
        }
    }

    #[test]
    fn intent_extracts_years_months_and_sectors() {
        let intent =
            QuestionIntent::analyze("Egg inflation for Bihar, rural, for Feb 2025 vs January 2024");
        assert_eq!(intent.years, vec![2025, 2024]);
        assert_eq!(intent.months, vec![2, 1]);
        assert_eq!(intent.sectors, vec![Sector::Rural]);
        assert_eq!(intent.period_request(), PeriodRequest::Explicit);
    }

    #[test]
    fn period_request_follows_what_is_missing() {
        let req = |q: &str| QuestionIntent::analyze(q).period_request();
        assert_eq!(req("What is the inflation rate?"), PeriodRequest::Latest);
        assert_eq!(req("Inflation in 2024"), PeriodRequest::LatestMonthOf(2024));
        assert_eq!(req("Inflation in March"), PeriodRequest::LatestYearWith(3));
        assert_eq!(req("Inflation in March 2024"), PeriodRequest::Explicit);
        assert_eq!(
            req("Latest inflation for March and April"),
            PeriodRequest::Latest
        );
        assert_eq!(
            req("Inflation for the last March and April"),
            PeriodRequest::Latest
        );
        assert!(QuestionIntent::analyze("What was the last reading?").asks_latest);
    }

    #[test]
    fn unspecified_question_gets_every_default() {
        let q = "What is the inflation rate?";
        let intent = QuestionIntent::analyze(q);
        let hints = resolve_defaults(q, &intent, &catalog(), Some(&feb_2025()));
        let joined = hints.join("\n");
        assert!(joined.contains("year = 2025 AND month_numeric = 2 (February)"));
        assert!(joined.contains("sector = 'Combined'"));
        assert!(joined.contains("state = 'All India'"));
        assert!(joined.contains("group_name = 'General' AND sub_group_name = '*'"));
    }

    #[test]
    fn named_group_keeps_headline_sub_group() {
        let q = "What is the inflation rate for Food and Beverages in India in 2025?";
        let intent = QuestionIntent::analyze(q);
        let hints = resolve_defaults(q, &intent, &catalog(), None).join("\n");
        assert!(hints.contains("group_name = 'Food and Beverages' AND sub_group_name = '*'"));
        assert!(hints.contains("state = 'All India'"));
        assert!(!hints.contains("'General'"));
    }

    #[test]
    fn named_state_sector_and_sub_group_suppress_defaults() {
        let q = "Tell me the Egg inflation rate for Bihar for rural for Feb 2025";
        let intent = QuestionIntent::analyze(q);
        let hints = resolve_defaults(q, &intent, &catalog(), None);
        assert_eq!(
            hints,
            vec!["Category: sub-group 'Egg' named. Use group_name = 'Food and Beverages' AND sub_group_name = 'Egg'.".to_string()]
        );
        assert_eq!(render_hints(&[]), "None. The question specifies every filter.");
    }
}
