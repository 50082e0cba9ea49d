//! Axum handlers. Search surfaces never fail on store errors; they answer
//! with an empty page instead.

pub mod curate;
pub mod detail;
pub mod interpret;
pub mod library;
pub mod trend;

use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{json, Value};
use tower_http::trace::TraceLayer;

use crate::models::{report_label, short_title, AssetCard, BoardCard};
use crate::search::fetcher::ResultPage;
use crate::state::AppState;
use crate::storage::{ASSETS_BUCKET, BOARD_COVERS_BUCKET};

/// Full route table.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/health", get(health))
        .route("/api/interpret", post(interpret::interpret))
        .route("/api/library", get(library::library))
        .route("/api/curate", get(curate::curate))
        .route("/api/trend", get(trend::trend))
        .route("/api/assets/{id}", get(detail::asset_detail))
        .route("/api/boards/{slug}", get(detail::board_detail))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// GET /api/health
pub async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

/// Turn the asset hits of a page into cards, resolving image URLs
/// concurrently.
pub(crate) async fn asset_cards(state: &AppState, page: &ResultPage) -> Vec<AssetCard> {
    let assets: Vec<_> = page.assets().collect();
    let paths: Vec<Option<String>> = assets.iter().map(|(a, _)| a.image_path.clone()).collect();
    let urls = state.storage.resolve_all(ASSETS_BUCKET, &paths).await;

    assets
        .into_iter()
        .zip(urls)
        .map(|((asset, relevance), image_url)| AssetCard {
            short_title: short_title(asset.title.as_deref()),
            asset: asset.clone(),
            image_url,
            relevance,
        })
        .collect()
}

pub(crate) async fn board_cards(state: &AppState, page: &ResultPage) -> Vec<BoardCard> {
    let boards: Vec<_> = page.boards().collect();
    let paths: Vec<Option<String>> = boards.iter().map(|b| b.cover_image_path.clone()).collect();
    let urls = state.storage.resolve_all(BOARD_COVERS_BUCKET, &paths).await;

    boards
        .into_iter()
        .zip(urls)
        .map(|(board, cover_url)| BoardCard {
            short_title: short_title(board.title.as_deref()),
            report_label: report_label(board.report_type.as_deref()),
            board: board.clone(),
            cover_url,
        })
        .collect()
}
