//! # Shared Constants
//!
//! Table names, sentinel values and defaults shared by the server, the loader
//! and the core pipeline.

/// The default path for the application SQLite database.
pub const DEFAULT_DB_FILE: &str = "db/cpi.db";

/// The only table the query pipeline reads.
pub const CPI_TABLE: &str = "cpi_data";

/// State sentinel for the national aggregate.
pub const ALL_INDIA: &str = "All India";

/// Group sentinel for the headline index.
pub const GENERAL_GROUP: &str = "General";

/// Sub-group sentinel meaning "no further breakdown".
pub const NO_SUB_GROUP: &str = "*";

/// Sector used when the question names none.
pub const DEFAULT_SECTOR: &str = "Combined";

/// Text returned in place of an empty result set.
pub const NO_RESULT_MESSAGE: &str = "No result found";

pub const DEFAULT_GENERATION_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_EXECUTION_TIMEOUT_SECS: u64 = 10;

/// Month names in calendar order; index + 1 is `month_numeric`.
pub const MONTH_NAMES: [&str; 12] = [
    "January",
    "February",
    "March",
    "April",
    "May",
    "June",
    "July",
    "August",
    "September",
    "October",
    "November",
    "December",
];

/// Maps a month name (full or three-letter, any case) to 1-12.
pub fn month_number(name: &str) -> Option<u32> {
    let needle = name.trim().to_lowercase();
    if needle.len() < 3 {
        return None;
    }
    MONTH_NAMES
        .iter()
        .position(|m| {
            let m = m.to_lowercase();
            m == needle || (needle.len() == 3 && m.starts_with(&needle))
        })
        .map(|i| i as u32 + 1)
}

/// Maps 1-12 back to the canonical month name.
pub fn month_name(number: u32) -> Option<&'static str> {
    MONTH_NAMES.get((number as usize).checked_sub(1)?).copied()
}
