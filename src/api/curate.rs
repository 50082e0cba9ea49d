use axum::extract::{Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::models::{AssetCard, Filters, SearchContext};
use crate::search::fetcher::SearchPlan;
use crate::state::AppState;

pub const CURATE_LIMIT: usize = 9;

#[derive(Debug, Default, Deserialize)]
pub struct CurateParams {
    #[serde(default)]
    pub q: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct CurateResponse {
    pub q: String,
    pub assets: Vec<AssetCard>,
}

/// GET /api/curate - Best-matching assets for a query, scored by which
/// field matched.
pub async fn curate(
    State(state): State<AppState>,
    Query(params): Query<CurateParams>,
) -> Json<CurateResponse> {
    let ctx = SearchContext::new(params.q.as_deref().unwrap_or_default(), Filters::default());
    let page = state.fetcher.fetch(&SearchPlan::CURATE, &ctx, CURATE_LIMIT).await;
    tracing::debug!("Curate '{}' -> {} assets", ctx.raw_query, page.items.len());

    Json(CurateResponse {
        assets: super::asset_cards(&state, &page).await,
        q: ctx.raw_query,
    })
}
