use axum::extract::{Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::models::{BoardCard, Filters, SearchContext};
use crate::search::fetcher::SearchPlan;
use crate::state::AppState;

pub const TREND_LIMIT: usize = 24;

#[derive(Debug, Default, Deserialize)]
pub struct TrendParams {
    #[serde(default)]
    pub q: Option<String>,
    #[serde(flatten)]
    pub filters: Filters,
}

#[derive(Debug, Serialize)]
pub struct TrendResponse {
    pub boards: Vec<BoardCard>,
    pub has_more: bool,
}

/// GET /api/trend - Boards by recency with optional season, market, color,
/// print and report-type filters.
pub async fn trend(
    State(state): State<AppState>,
    Query(params): Query<TrendParams>,
) -> Json<TrendResponse> {
    let ctx = SearchContext::new(params.q.as_deref().unwrap_or_default(), params.filters);
    let page = state.fetcher.fetch(&SearchPlan::TREND, &ctx, TREND_LIMIT).await;

    Json(TrendResponse {
        boards: super::board_cards(&state, &page).await,
        has_more: page.has_more,
    })
}
