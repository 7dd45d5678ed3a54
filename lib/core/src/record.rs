//! Typed raw records, one struct per source table.
//!
//! Every field is optional: the ingestion side maps the source's null marker
//! and unparsable values to `None` and leaves the decision of what to keep to
//! the normalizer.

use serde::{Deserialize, Serialize};

/// Null marker used by the IMDb dumps.
pub const NULL_MARKER: &str = "\\N";

/// A row of the primary metadata table (`title.basics`).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BasicsRecord {
    pub id: Option<String>,
    pub title_type: Option<String>,
    pub primary_title: Option<String>,
    pub original_title: Option<String>,
    pub is_adult: Option<bool>,
    pub start_year: Option<String>,
    pub genres: Option<String>,
}

/// A row of the ratings table (`title.ratings`).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RatingRecord {
    pub id: Option<String>,
    pub average_rating: Option<f64>,
    pub num_votes: Option<u64>,
}

/// A row of the alternate titles table (`title.akas`).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AkaRecord {
    pub title_id: Option<String>,
    pub title: Option<String>,
}

/// The three raw tables of one load cycle.
#[derive(Debug, Clone, Default)]
pub struct RawTables {
    pub basics: Vec<BasicsRecord>,
    pub ratings: Vec<RatingRecord>,
    pub akas: Vec<AkaRecord>,
}

/// Returns the id if it is usable as a stable entity key.
///
/// Absent, empty, null-marker and whitespace-containing ids are rejected.
pub fn usable_id(id: Option<&str>) -> Option<&str> {
    let id = id?.trim();
    if id.is_empty() || id == NULL_MARKER || id.chars().any(char::is_whitespace) {
        return None;
    }
    Some(id)
}

/// Parse the source's 0/1 adult flag.
pub fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim() {
        "0" => Some(false),
        "1" => Some(true),
        _ => None,
    }
}
