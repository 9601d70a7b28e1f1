//! Song library endpoints
//!
//! Listing, viewing and bulk deletion work for any caller on their own
//! songs. Creating, editing and deleting a single song require the admin
//! role.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Extension, Json, Router,
};
use capo_common::db::songs;
use capo_common::identity::Identity;
use capo_common::settings::READING_FONT_SIZE;
use capo_common::song::{format_lyrics, group_by_category, CategorySection, LyricLine};
use capo_common::{Song, SongCategory, SongDraft};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

use crate::error::ApiResult;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    #[serde(default)]
    pub q: String,
    pub category: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SongListResponse {
    pub sections: Vec<CategorySection>,
    /// All of the caller's songs, regardless of filter
    pub total: usize,
}

/// GET /api/songs?q=&category=
///
/// One section per home-screen category, or only the requested category.
pub async fn list_songs(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Query(query): Query<ListQuery>,
) -> ApiResult<Json<SongListResponse>> {
    let categories: Vec<SongCategory> = match query.category.as_deref() {
        Some(name) if !name.is_empty() => vec![name.parse()?],
        _ => SongCategory::PRACTICE.to_vec(),
    };

    let all = songs::list_by_owner(&state.db, identity.user_id).await?;
    let vivid = state
        .settings
        .get(&state.db, identity.user_id)
        .await?
        .app
        .use_vivid_colors;

    Ok(Json(SongListResponse {
        sections: group_by_category(&all, &categories, &query.q, vivid),
        total: all.len(),
    }))
}

/// Full-screen reading view of one song
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SongView {
    pub song: Song,
    pub category_label: &'static str,
    pub color: &'static str,
    pub default_tempo: u32,
    pub font_size: &'static str,
    pub lines: Vec<LyricLine>,
}

/// GET /api/songs/:id
pub async fn get_song(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<SongView>> {
    let song = songs::get(&state.db, identity.user_id, id).await?;
    let settings = state.settings.get(&state.db, identity.user_id).await?;

    let lines = song
        .lyrics
        .as_deref()
        .map(|lyrics| format_lyrics(lyrics, settings.prompter.upper_case))
        .unwrap_or_default();

    Ok(Json(SongView {
        category_label: song.category.label(),
        color: song.category.color(settings.app.use_vivid_colors),
        default_tempo: song.category.default_tempo(),
        font_size: READING_FONT_SIZE,
        lines,
        song,
    }))
}

/// POST /api/songs (admin)
pub async fn create_song(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Json(draft): Json<SongDraft>,
) -> ApiResult<(StatusCode, Json<Song>)> {
    identity.require_admin("Creating a song")?;
    let draft = draft.validate()?;

    let song = songs::insert(&state.db, identity.user_id, &draft).await?;
    info!(song_id = %song.id, "Song created");
    Ok((StatusCode::CREATED, Json(song)))
}

/// PUT /api/songs/:id (admin)
pub async fn update_song(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(id): Path<Uuid>,
    Json(draft): Json<SongDraft>,
) -> ApiResult<Json<Song>> {
    identity.require_admin("Editing a song")?;
    let draft = draft.validate()?;

    let song = songs::update(&state.db, identity.user_id, id, &draft).await?;
    info!(song_id = %song.id, "Song updated");
    Ok(Json(song))
}

/// DELETE /api/songs/:id (admin)
pub async fn delete_song(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    identity.require_admin("Deleting a song")?;
    songs::delete(&state.db, identity.user_id, id).await?;
    info!(song_id = %id, "Song deleted");
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Debug, Serialize)]
pub struct DeletedResponse {
    pub deleted: u64,
}

/// DELETE /api/songs
pub async fn delete_all_songs(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
) -> ApiResult<Json<DeletedResponse>> {
    let deleted = songs::delete_all(&state.db, identity.user_id).await?;
    Ok(Json(DeletedResponse { deleted }))
}

#[derive(Debug, Deserialize)]
pub struct DeleteSelectedRequest {
    pub ids: Vec<Uuid>,
}

/// POST /api/songs/delete
pub async fn delete_selected_songs(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Json(request): Json<DeleteSelectedRequest>,
) -> ApiResult<Json<DeletedResponse>> {
    let deleted = songs::delete_ids(&state.db, identity.user_id, &request.ids).await?;
    Ok(Json(DeletedResponse { deleted }))
}

#[derive(Debug, Deserialize)]
pub struct MigrateRequest {
    pub songs: Vec<SongDraft>,
}

#[derive(Debug, Serialize)]
pub struct MigrateResponse {
    pub migrated: usize,
    pub skipped: usize,
}

/// POST /api/songs/migrate
///
/// Songs from an older local store. Entries without title and mnemonic are
/// skipped; nothing is inserted if the caller already owns songs.
pub async fn migrate_songs(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Json(request): Json<MigrateRequest>,
) -> ApiResult<Json<MigrateResponse>> {
    let total = request.songs.len();
    let drafts: Vec<SongDraft> = request
        .songs
        .into_iter()
        .filter_map(|draft| match draft.validate() {
            Ok(draft) => Some(draft),
            Err(e) => {
                warn!("Skipping legacy song: {}", e);
                None
            }
        })
        .collect();

    let migrated = songs::migrate_legacy(&state.db, identity.user_id, &drafts).await?;
    Ok(Json(MigrateResponse {
        migrated,
        skipped: total - migrated,
    }))
}

pub fn song_routes() -> Router<AppState> {
    Router::new()
        .route("/api/songs", get(list_songs).post(create_song).delete(delete_all_songs))
        .route(
            "/api/songs/:id",
            get(get_song).put(update_song).delete(delete_song),
        )
        .route("/api/songs/delete", post(delete_selected_songs))
        .route("/api/songs/migrate", post(migrate_songs))
}

