use axum::extract::{Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::models::{AssetCard, Domain, Filters, SearchContext};
use crate::search::fetcher::SearchPlan;
use crate::state::AppState;

pub const PAGE_SIZE: usize = 9;
pub const PAGE_STEP: usize = 9;
pub const MAX_PAGE_SIZE: usize = 96;

#[derive(Debug, Default, Deserialize)]
pub struct LibraryParams {
    #[serde(default)]
    pub q: Option<String>,
    /// Requested item count. Kept as text so junk falls back to the default.
    #[serde(default)]
    pub n: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct LibraryResponse {
    pub q: String,
    pub domain: Option<Domain>,
    pub assets: Vec<AssetCard>,
    pub has_more: bool,
    /// Count to request for "show more", present only when more rows exist
    pub next_n: Option<usize>,
}

/// Requested count, clamped to `1..=MAX_PAGE_SIZE`.
pub fn requested_count(n: Option<&str>) -> usize {
    match n.and_then(|v| v.trim().parse::<usize>().ok()) {
        Some(0) | None => PAGE_SIZE,
        Some(v) => v.min(MAX_PAGE_SIZE),
    }
}

/// GET /api/library - Asset browse by recency, restricted to the domain the
/// query implies.
pub async fn library(
    State(state): State<AppState>,
    Query(params): Query<LibraryParams>,
) -> Json<LibraryResponse> {
    let n = requested_count(params.n.as_deref());
    let ctx = SearchContext::new(params.q.as_deref().unwrap_or_default(), Filters::default());

    let page = state.fetcher.fetch(&SearchPlan::LIBRARY, &ctx, n).await;
    let assets = super::asset_cards(&state, &page).await;

    let next_n = (page.has_more && n < MAX_PAGE_SIZE).then(|| (n + PAGE_STEP).min(MAX_PAGE_SIZE));

    Json(LibraryResponse {
        q: ctx.raw_query,
        domain: ctx.domain,
        assets,
        has_more: page.has_more,
        next_n,
    })
}
