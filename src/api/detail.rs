use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use serde_json::json;
use uuid::Uuid;

use crate::models::{report_label, short_title, AssetCard, AssetSummary, Board};
use crate::state::AppState;
use crate::storage::{ASSETS_BUCKET, BOARDS_BUCKET, BOARD_COVERS_BUCKET};

fn not_found() -> Response {
    (StatusCode::NOT_FOUND, Json(json!({ "error": "Not found" }))).into_response()
}

#[derive(Debug, Serialize)]
pub struct BoardDetail {
    #[serde(flatten)]
    pub board: Board,
    pub short_title: String,
    pub report_label: String,
    pub cover_url: Option<String>,
    /// The two board images, in order
    pub image_urls: Vec<Option<String>>,
    /// Interpretation-ready projection for `POST /api/interpret`
    pub summary: AssetSummary,
}

/// GET /api/assets/{id}
pub async fn asset_detail(State(state): State<AppState>, Path(id): Path<String>) -> Response {
    let Ok(id) = Uuid::parse_str(id.trim()) else {
        return not_found();
    };
    let Some(asset) = state.fetcher.asset_by_id(id).await else {
        return not_found();
    };

    let image_url = state
        .storage
        .resolve(ASSETS_BUCKET, asset.image_path.as_deref())
        .await;
    Json(AssetCard {
        short_title: short_title(asset.title.as_deref()),
        asset,
        image_url,
        relevance: None,
    })
    .into_response()
}

/// GET /api/boards/{slug}
pub async fn board_detail(State(state): State<AppState>, Path(slug): Path<String>) -> Response {
    let Some(board) = state.fetcher.board_by_slug(slug.trim()).await else {
        return not_found();
    };

    let paths = [
        board.board_image_path_1.clone(),
        board.board_image_path_2.clone(),
    ];
    let (image_urls, cover_url) = tokio::join!(
        state.storage.resolve_all(BOARDS_BUCKET, &paths),
        state
            .storage
            .resolve(BOARD_COVERS_BUCKET, board.cover_image_path.as_deref()),
    );

    Json(BoardDetail {
        short_title: short_title(board.title.as_deref()),
        report_label: report_label(board.report_type.as_deref()),
        summary: AssetSummary::from(&board),
        cover_url,
        image_urls,
        board,
    })
    .into_response()
}
