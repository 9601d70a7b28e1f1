//! CSV import and export

use axum::{
    extract::State,
    http::{header, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Extension, Json, Router,
};
use capo_common::csv::{export_songs, parse_songs, EXPORT_FILE_NAME};
use capo_common::db::songs;
use capo_common::identity::Identity;
use serde::Serialize;
use tracing::info;

use crate::error::ApiResult;
use crate::AppState;

#[derive(Debug, Serialize)]
pub struct ImportResponse {
    pub imported: usize,
}

/// POST /api/import
///
/// Body is the CSV text. Any invalid row rejects the whole file.
pub async fn import_songs(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    body: String,
) -> ApiResult<(StatusCode, Json<ImportResponse>)> {
    let drafts = parse_songs(&body)?;
    let stored = songs::insert_many(&state.db, identity.user_id, &drafts).await?;

    info!(owner_id = %identity.user_id, count = stored.len(), "Imported songs from CSV");
    Ok((
        StatusCode::CREATED,
        Json(ImportResponse {
            imported: stored.len(),
        }),
    ))
}

/// GET /api/export
pub async fn export_csv(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
) -> ApiResult<impl IntoResponse> {
    let all = songs::list_by_owner(&state.db, identity.user_id).await?;
    let csv = export_songs(&all);

    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", EXPORT_FILE_NAME),
            ),
        ],
        csv,
    ))
}

pub fn transfer_routes() -> Router<AppState> {
    Router::new()
        .route("/api/import", post(import_songs))
        .route("/api/export", get(export_csv))
}
