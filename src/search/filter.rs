use serde_json::Value;

use crate::models::{SearchContext, READY_STATUS};

/// Read-only collections in the record store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Collection {
    Assets,
    Boards,
}

impl Collection {
    pub fn table(self) -> &'static str {
        match self {
            Collection::Assets => "assets",
            Collection::Boards => "boards",
        }
    }
}

/// A single filter predicate over a record.
#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    /// Exact equality
    Eq { field: String, value: String },
    /// Case-insensitive substring containment
    Contains { field: String, needle: String },
    /// Disjunction
    Any(Vec<Predicate>),
}

impl Predicate {
    pub fn eq(field: &str, value: &str) -> Self {
        Predicate::Eq {
            field: field.to_string(),
            value: value.to_string(),
        }
    }

    pub fn contains(field: &str, needle: &str) -> Self {
        Predicate::Contains {
            field: field.to_string(),
            needle: needle.to_string(),
        }
    }

    /// Evaluate against a JSON record. Missing or null fields never match.
    pub fn matches(&self, record: &Value) -> bool {
        match self {
            Predicate::Eq { field, value } => field_text(record, field)
                .map(|v| v == *value)
                .unwrap_or(false),
            Predicate::Contains { field, needle } => field_text(record, field)
                .map(|v| v.to_lowercase().contains(&needle.to_lowercase()))
                .unwrap_or(false),
            Predicate::Any(preds) => preds.iter().any(|p| p.matches(record)),
        }
    }

    /// Render in PostgREST operator syntax, e.g. `title.ilike.*floral*`.
    fn render_inner(&self) -> String {
        match self {
            Predicate::Eq { field, value } => format!("{field}.eq.{}", quote_value(value)),
            Predicate::Contains { field, needle } => {
                format!("{field}.ilike.{}", quote_value(&format!("*{needle}*")))
            }
            Predicate::Any(preds) => {
                let inner: Vec<String> = preds.iter().map(|p| p.render_inner()).collect();
                format!("or({})", inner.join(","))
            }
        }
    }

    /// Render as a top-level `(key, value)` query parameter.
    pub fn to_param(&self) -> (String, String) {
        match self {
            Predicate::Eq { field, value } => (field.clone(), format!("eq.{value}")),
            Predicate::Contains { field, needle } => (field.clone(), format!("ilike.*{needle}*")),
            Predicate::Any(preds) => {
                let inner: Vec<String> = preds.iter().map(|p| p.render_inner()).collect();
                ("or".to_string(), format!("({})", inner.join(",")))
            }
        }
    }
}

/// PostgREST reserves `,().:` inside logic trees; quote values containing them.
fn quote_value(v: &str) -> String {
    if v.contains([',', '(', ')', ':', '"']) {
        format!("\"{}\"", v.replace('\\', "\\\\").replace('"', "\\\""))
    } else {
        v.to_string()
    }
}

fn field_text(record: &Value, field: &str) -> Option<String> {
    match record.get(field)? {
        Value::String(s) => Some(s.clone()),
        Value::Null => None,
        other => Some(other.to_string()),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    /// Newest first by `created_at`
    CreatedDesc,
}

/// A conjunctive filter over one collection with ordering and limit.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordQuery {
    pub collection: Collection,
    pub filters: Vec<Predicate>,
    pub order: Option<SortOrder>,
    pub limit: Option<usize>,
}

impl RecordQuery {
    pub fn new(collection: Collection) -> Self {
        Self {
            collection,
            filters: Vec::new(),
            order: None,
            limit: None,
        }
    }

    pub fn filter(mut self, predicate: Predicate) -> Self {
        self.filters.push(predicate);
        self
    }

    pub fn order(mut self, order: SortOrder) -> Self {
        self.order = Some(order);
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn matches(&self, record: &Value) -> bool {
        self.filters.iter().all(|p| p.matches(record))
    }

    /// Query-string parameters for a PostgREST `GET /{table}` request.
    pub fn to_params(&self) -> Vec<(String, String)> {
        let mut params = vec![("select".to_string(), "*".to_string())];
        params.extend(self.filters.iter().map(Predicate::to_param));
        if let Some(SortOrder::CreatedDesc) = self.order {
            params.push(("order".to_string(), "created_at.desc".to_string()));
        }
        if let Some(limit) = self.limit {
            params.push(("limit".to_string(), limit.to_string()));
        }
        params
    }
}

/// How a search surface turns a `SearchContext` into filters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldPlan {
    pub collection: Collection,
    /// Fields every query token is matched against
    pub text_fields: &'static [&'static str],
    /// Restrict to records tagged with the inferred domain
    pub restrict_domain: bool,
    /// Apply explicit season/market/color/print/type filters
    pub explicit_filters: bool,
}

pub const LIBRARY_FIELDS: &[&str] = &["title", "direction", "color_notes", "print_pattern_notes"];
pub const CURATE_FIELDS: &[&str] = &["domain", "direction", "color_notes", "print_pattern_notes"];
pub const TREND_FIELDS: &[&str] = &[
    "domain",
    "season",
    "direction",
    "color_notes",
    "print_pattern_notes",
];

/// Build the store filter for a context: ready status, optional domain and
/// explicit filters, then one OR-group across every (token, field) pair.
pub fn build_filters(plan: &FieldPlan, ctx: &SearchContext) -> Vec<Predicate> {
    let mut filters = vec![Predicate::eq("status", READY_STATUS)];
    let f = &ctx.filters;

    if plan.restrict_domain && f.domain.is_none() {
        if let Some(domain) = ctx.domain {
            filters.push(Predicate::contains("domain", domain.as_str()));
        }
    }

    if plan.explicit_filters {
        let explicit = [
            ("season", &f.season),
            ("domain", &f.domain),
            ("color_notes", &f.color),
            ("print_pattern_notes", &f.print_pattern),
            ("report_type", &f.report_type),
        ];
        for (field, value) in explicit {
            if let Some(v) = value {
                filters.push(Predicate::contains(field, v));
            }
        }
    }

    if !ctx.tokens.is_empty() {
        let any: Vec<Predicate> = ctx
            .tokens
            .iter()
            .flat_map(|t| plan.text_fields.iter().map(move |f| Predicate::contains(f, t)))
            .collect();
        filters.push(Predicate::Any(any));
    }

    filters
}
