use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Lifecycle value of records that are visible to search surfaces.
pub const READY_STATUS: &str = "ready";

/// A single catalog image record
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Asset {
    pub id: Uuid,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub image_path: Option<String>,
    #[serde(default)]
    pub source_url: Option<String>,
    #[serde(default)]
    pub source_site: Option<String>,
    /// Delimited market tags, e.g. "menswear;womenswear"
    #[serde(default)]
    pub domain: Option<String>,
    #[serde(default)]
    pub direction: Option<String>,
    #[serde(default)]
    pub color_notes: Option<String>,
    #[serde(default)]
    pub print_pattern_notes: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

/// A curated multi-image collection
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Board {
    pub id: Uuid,
    #[serde(default)]
    pub title: Option<String>,
    pub slug: String,
    #[serde(default)]
    pub cover_image_path: Option<String>,
    #[serde(default)]
    pub board_image_path_1: Option<String>,
    #[serde(default)]
    pub board_image_path_2: Option<String>,
    #[serde(default)]
    pub source_site: Option<String>,
    #[serde(default)]
    pub domain: Option<String>,
    #[serde(default)]
    pub direction: Option<String>,
    #[serde(default)]
    pub color_notes: Option<String>,
    #[serde(default)]
    pub print_pattern_notes: Option<String>,
    #[serde(default)]
    pub report_type: Option<String>,
    #[serde(default)]
    pub season: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

/// Market segment inferred from a free-text query
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Domain {
    Menswear,
    Womenswear,
}

impl Domain {
    pub fn as_str(self) -> &'static str {
        match self {
            Domain::Menswear => "menswear",
            Domain::Womenswear => "womenswear",
        }
    }
}

impl std::fmt::Display for Domain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Explicit filter values from the trend surface
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct Filters {
    pub season: Option<String>,
    /// Market / domain filter. Accepted as either `domain` or `market`.
    #[serde(alias = "market")]
    pub domain: Option<String>,
    pub color: Option<String>,
    pub print_pattern: Option<String>,
    /// Report type classification
    #[serde(rename = "type")]
    pub report_type: Option<String>,
}

impl Filters {
    /// Drop blank values so they never turn into match-everything predicates.
    pub fn normalized(self) -> Self {
        fn clean(v: Option<String>) -> Option<String> {
            v.map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
        }
        Self {
            season: clean(self.season),
            domain: clean(self.domain),
            color: clean(self.color),
            print_pattern: clean(self.print_pattern),
            report_type: clean(self.report_type),
        }
    }
}

/// Request-scoped search state. Never persisted.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchContext {
    pub raw_query: String,
    pub tokens: Vec<String>,
    pub domain: Option<Domain>,
    pub filters: Filters,
}

impl SearchContext {
    pub fn new(raw_query: &str, filters: Filters) -> Self {
        let raw_query = raw_query.trim().to_string();
        let normalized = crate::search::tokenizer::normalize(&raw_query);
        Self {
            raw_query,
            tokens: normalized.tokens,
            domain: normalized.domain,
            filters: filters.normalized(),
        }
    }
}

/// Reduced asset projection sent to the language model
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct AssetSummary {
    pub title: Option<String>,
    pub domain: Option<String>,
    pub direction: Option<String>,
    pub color_notes: Option<String>,
    pub print_pattern_notes: Option<String>,
}

impl From<&Asset> for AssetSummary {
    fn from(a: &Asset) -> Self {
        Self {
            title: a.title.clone(),
            domain: a.domain.clone(),
            direction: a.direction.clone(),
            color_notes: a.color_notes.clone(),
            print_pattern_notes: a.print_pattern_notes.clone(),
        }
    }
}

impl From<&Board> for AssetSummary {
    fn from(b: &Board) -> Self {
        Self {
            title: Some(b.title.clone().unwrap_or_else(|| "Untitled".to_string())),
            domain: b.domain.clone(),
            direction: b.direction.clone(),
            color_notes: b.color_notes.clone(),
            print_pattern_notes: b.print_pattern_notes.clone(),
        }
    }
}

/// Output of the interpretation service
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct InterpretationResult {
    /// Present for board mode only; always first in the envelope
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub board_title: Option<String>,
    pub curatorial_summary: String,
    pub why_it_matters: Vec<String>,
    pub context_pulse: Vec<String>,
}

/// Asset as returned by search and detail surfaces
#[derive(Debug, Clone, Serialize)]
pub struct AssetCard {
    #[serde(flatten)]
    pub asset: Asset,
    pub short_title: String,
    pub image_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub relevance: Option<u32>,
}

/// Board as returned by the trend surface
#[derive(Debug, Clone, Serialize)]
pub struct BoardCard {
    #[serde(flatten)]
    pub board: Board,
    pub short_title: String,
    pub report_label: String,
    pub cover_url: Option<String>,
}

/// First two whitespace-separated words of a title, or "Untitled".
pub fn short_title(title: Option<&str>) -> String {
    let words: Vec<&str> = title.unwrap_or_default().split_whitespace().take(2).collect();
    if words.is_empty() {
        "Untitled".to_string()
    } else {
        words.join(" ")
    }
}

/// Display label for a report type: upper-cased, first `+` spaced out.
pub fn report_label(report_type: Option<&str>) -> String {
    match report_type {
        Some(t) if !t.is_empty() => t.to_uppercase().replacen('+', " + ", 1),
        _ => String::new(),
    }
}
