//! # Category Catalog
//!
//! The distinct states and `(group_name, sub_group_name)` pairs present in
//! `cpi_data`, read once at startup. The catalog is rendered into the schema
//! context and used to tell which categories and states a question names.

use crate::{
    constants::{ALL_INDIA, NO_SUB_GROUP},
    errors::QueryError,
    providers::db::{sqlite::sql, storage::Storage},
};
use serde::Serialize;
use serde_json::Value;
use tracing::info;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Category {
    pub group_name: String,
    pub sub_group_name: String,
}

/// A category the question refers to by name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CategoryMatch {
    /// A top-level group, e.g. "Food and Beverages".
    Group(String),
    /// A sub-group together with the group it belongs to.
    SubGroup { group: String, sub_group: String },
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Catalog {
    pub states: Vec<String>,
    pub categories: Vec<Category>,
}

impl Catalog {
    /// Reads distinct states and categories from the store.
    pub async fn load(storage: &dyn Storage) -> Result<Self, QueryError> {
        let states = storage
            .execute_query(sql::DISTINCT_STATES_SQL)
            .await?
            .iter()
            .filter_map(|row| text_field(row, "state"))
            .collect::<Vec<_>>();

        let categories = storage
            .execute_query(sql::DISTINCT_CATEGORIES_SQL)
            .await?
            .iter()
            .filter_map(|row| {
                Some(Category {
                    group_name: text_field(row, "group_name")?,
                    sub_group_name: text_field(row, "sub_group_name")
                        .unwrap_or_else(|| NO_SUB_GROUP.to_string()),
                })
            })
            .collect::<Vec<_>>();

        info!(
            states = states.len(),
            categories = categories.len(),
            "Loaded CPI catalog."
        );
        Ok(Self { states, categories })
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty() && self.categories.is_empty()
    }

    /// Distinct group names in catalog order.
    pub fn groups(&self) -> Vec<&str> {
        let mut groups: Vec<&str> = Vec::new();
        for category in &self.categories {
            if !groups.contains(&category.group_name.as_str()) {
                groups.push(&category.group_name);
            }
        }
        groups
    }

    /// Renders the catalog for the `{catalog}` placeholder of the schema context.
    pub fn render(&self) -> String {
        if self.is_empty() {
            return "(no records have been loaded yet)".to_string();
        }

        let mut out = format!("States: {}\n", self.states.join(", "));
        out.push_str("Groups and their sub-groups:\n");
        for group in self.groups() {
            let subs: Vec<&str> = self
                .categories
                .iter()
                .filter(|c| c.group_name == group && c.sub_group_name != NO_SUB_GROUP)
                .map(|c| c.sub_group_name.as_str())
                .collect();
            if subs.is_empty() {
                out.push_str(&format!("- {group}\n"));
            } else {
                out.push_str(&format!("- {group}: {}\n", subs.join(", ")));
            }
        }
        out.trim_end().to_string()
    }

    /// States named in the question, excluding the national aggregate.
    pub fn match_states(&self, question: &str) -> Vec<String> {
        let candidates = self
            .states
            .iter()
            .filter(|s| !s.eq_ignore_ascii_case(ALL_INDIA))
            .map(String::as_str);
        find_names(question, candidates)
            .into_iter()
            .map(String::from)
            .collect()
    }

    /// Categories named in the question.
    ///
    /// A sub-group wins over its own parent group, and a name contained in a
    /// longer matched name is ignored.
    pub fn match_categories(&self, question: &str) -> Vec<CategoryMatch> {
        let sub_groups = self
            .categories
            .iter()
            .filter(|c| c.sub_group_name != NO_SUB_GROUP)
            .map(|c| c.sub_group_name.as_str());
        let groups = self.groups();
        let names = find_names(question, sub_groups.chain(groups.iter().copied()));

        let mut matches: Vec<CategoryMatch> = Vec::new();
        for name in &names {
            let sub_group_parent = self
                .categories
                .iter()
                .find(|c| c.sub_group_name == *name)
                .map(|c| c.group_name.clone());
            let candidate = match sub_group_parent {
                Some(group) => CategoryMatch::SubGroup {
                    group,
                    sub_group: name.to_string(),
                },
                None => CategoryMatch::Group(name.to_string()),
            };
            if !matches.contains(&candidate) {
                matches.push(candidate);
            }
        }

        let parents_of_sub_groups: Vec<String> = matches
            .iter()
            .filter_map(|m| match m {
                CategoryMatch::SubGroup { group, .. } => Some(group.clone()),
                CategoryMatch::Group(_) => None,
            })
            .collect();
        matches.retain(|m| match m {
            CategoryMatch::Group(g) => !parents_of_sub_groups.contains(g),
            CategoryMatch::SubGroup { .. } => true,
        });
        matches
    }
}

fn text_field(row: &Value, key: &str) -> Option<String> {
    row.get(key)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
}

/// Names that occur in the question as whole words, case-insensitively.
/// A match that is part of a longer match is dropped.
fn find_names<'a>(question: &str, names: impl Iterator<Item = &'a str>) -> Vec<&'a str> {
    let haystack = question.to_lowercase();
    let mut found: Vec<&'a str> = Vec::new();
    for name in names {
        if !found.contains(&name) && contains_phrase(&haystack, &name.to_lowercase()) {
            found.push(name);
        }
    }

    let lowered: Vec<String> = found.iter().map(|n| n.to_lowercase()).collect();
    found
        .iter()
        .enumerate()
        .filter(|(i, _)| {
            !lowered
                .iter()
                .enumerate()
                .any(|(j, other)| {
                    j != *i && other.len() > lowered[*i].len() && other.contains(&lowered[*i])
                })
        })
        .map(|(_, name)| *name)
        .collect()
}

/// Substring search that only accepts matches bounded by non-alphanumeric characters.
pub(crate) fn contains_phrase(haystack: &str, needle: &str) -> bool {
    if needle.trim().is_empty() {
        return false;
    }
    haystack.match_indices(needle).any(|(start, matched)| {
        let end = start + matched.len();
        let before_ok = haystack[..start]
            .chars()
            .next_back()
            .map_or(true, |c| !c.is_alphanumeric());
        let after_ok = haystack[end..]
            .chars()
            .next()
            .map_or(true, |c| !c.is_alphanumeric());
        before_ok && after_ok
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog() -> Catalog {
        let pairs = [
            ("Food and Beverages", "*"),
            ("Food and Beverages", "Meat and Fish"),
            ("Food and Beverages", "Vegetables"),
            ("General", "*"),
            ("Housing", "*"),
        ];
        Catalog {
            states: vec!["All India".into(), "Bihar".into(), "Tamil Nadu".into()],
            categories: pairs
                .iter()
                .map(|(g, s)| Category {
                    group_name: g.to_string(),
                    sub_group_name: s.to_string(),
                })
                .collect(),
        }
    }

    #[test]
    fn phrase_matching_respects_word_boundaries() {
        assert!(contains_phrase("inflation in bihar?", "bihar"));
        assert!(!contains_phrase("inflation in biharsharif", "bihar"));
        assert!(!contains_phrase("anything", ""));
    }

    #[test]
    fn matches_group_sub_group_and_nothing() {
        let catalog = catalog();
        assert_eq!(
            catalog.match_categories("What is the inflation rate for Food and Beverages in 2025?"),
            vec![CategoryMatch::Group("Food and Beverages".into())]
        );
        assert_eq!(
            catalog.match_categories("vegetables inflation in food and beverages"),
            vec![CategoryMatch::SubGroup {
                group: "Food and Beverages".into(),
                sub_group: "Vegetables".into()
            }]
        );
        assert!(catalog.match_categories("What is the inflation rate?").is_empty());
    }

    #[test]
    fn states_exclude_national_aggregate() {
        let catalog = catalog();
        assert_eq!(catalog.match_states("inflation in Tamil Nadu"), vec!["Tamil Nadu"]);
        assert!(catalog.match_states("inflation in All India").is_empty());
    }

    #[test]
    fn render_lists_groups_with_sub_groups() {
        let rendered = catalog().render();
        assert!(rendered.contains("States: All India, Bihar, Tamil Nadu"));
        assert!(rendered.contains("- Food and Beverages: Meat and Fish, Vegetables"));
        assert!(rendered.contains("- General"));
        assert_eq!(
            Catalog::default().render(),
            "(no records have been loaded yet)"
        );
    }
}
