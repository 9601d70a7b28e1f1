//! Reading session endpoints
//!
//! The client opens a session with the scrollable height of its lyrics
//! viewport, then drives play/pause and tempo while following the offsets
//! streamed over SSE.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::sse::{Event, KeepAlive, Sse},
    routing::{delete, get, post, put},
    Extension, Json, Router,
};
use capo_common::autoscroll::{MAX_TEMPO, MIN_TEMPO, TEMPO_STEP};
use capo_common::db::songs;
use capo_common::identity::Identity;
use capo_common::sse::HEARTBEAT_INTERVAL;
use futures::stream::Stream;
use serde::{Deserialize, Serialize};
use std::convert::Infallible;
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

use crate::error::{ApiError, ApiResult};
use crate::reading::{ReadingSession, ReadingStatus, ReadingUpdate};
use crate::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OpenReadingRequest {
    pub song_id: Uuid,
    /// Scrollable distance of the lyrics viewport
    pub max_offset: f64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TempoRange {
    pub min: u32,
    pub max: u32,
    pub step: u32,
}

const TEMPO_RANGE: TempoRange = TempoRange {
    min: MIN_TEMPO,
    max: MAX_TEMPO,
    step: TEMPO_STEP,
};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReadingResponse {
    pub session_id: Uuid,
    pub song_id: Uuid,
    pub tempo_range: TempoRange,
    #[serde(flatten)]
    pub update: ReadingUpdate,
}

impl ReadingResponse {
    fn new(session: &ReadingSession, update: ReadingUpdate) -> Self {
        Self {
            session_id: session.id,
            song_id: session.song_id,
            tempo_range: TEMPO_RANGE,
            update,
        }
    }
}

async fn find_session(
    state: &AppState,
    identity: &Identity,
    id: Uuid,
) -> ApiResult<Arc<ReadingSession>> {
    state
        .reading
        .get(identity.user_id, id)
        .await
        .ok_or_else(|| ApiError::NotFound(format!("Reading session {}", id)))
}

/// POST /api/reading
///
/// Opens the song at its category's default tempo, paused at the top.
/// Any session the caller had open is closed.
pub async fn open_reading(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Json(request): Json<OpenReadingRequest>,
) -> ApiResult<(StatusCode, Json<ReadingResponse>)> {
    if !request.max_offset.is_finite() {
        return Err(ApiError::BadRequest("maxOffset must be a number".to_string()));
    }

    let song = songs::get(&state.db, identity.user_id, request.song_id).await?;
    let session = state
        .reading
        .open(ReadingSession::new(
            identity.user_id,
            song.id,
            request.max_offset,
            song.category.default_tempo(),
        ))
        .await;

    Ok((
        StatusCode::CREATED,
        Json(ReadingResponse::new(&session, session.current())),
    ))
}

/// POST /api/reading/:id/toggle
pub async fn toggle_reading(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<ReadingResponse>> {
    let session = find_session(&state, &identity, id).await?;
    let update = session.toggle().await;
    Ok(Json(ReadingResponse::new(&session, update)))
}

#[derive(Debug, Deserialize)]
pub struct TempoRequest {
    pub tempo: u32,
}

/// PUT /api/reading/:id/tempo
///
/// Out-of-range tempos are clamped.
pub async fn set_reading_tempo(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(id): Path<Uuid>,
    Json(request): Json<TempoRequest>,
) -> ApiResult<Json<ReadingResponse>> {
    let session = find_session(&state, &identity, id).await?;
    let update = session.set_tempo(request.tempo).await;
    Ok(Json(ReadingResponse::new(&session, update)))
}

/// DELETE /api/reading/:id
pub async fn close_reading(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    if state.reading.close(identity.user_id, id).await {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::NotFound(format!("Reading session {}", id)))
    }
}

fn update_event(update: &ReadingUpdate) -> Event {
    let name = match update.status {
        ReadingStatus::Finished => "ReadingFinished",
        ReadingStatus::Closed => "ReadingClosed",
        ReadingStatus::Paused | ReadingStatus::Scrolling => "ScrollOffset",
    };
    let data = serde_json::to_string(update).unwrap_or_else(|_| "{}".to_string());
    Event::default().event(name).data(data)
}

/// GET /api/reading/:id/events
///
/// Streams the current state, then every change until the session closes.
pub async fn reading_events(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(id): Path<Uuid>,
) -> ApiResult<Sse<impl Stream<Item = Result<Event, Infallible>>>> {
    let session = find_session(&state, &identity, id).await?;
    let mut updates = session.subscribe();
    drop(session);

    debug!(session_id = %id, "SSE client following reading session");

    let stream = async_stream::stream! {
        let current = *updates.borrow_and_update();
        yield Ok(update_event(&current));

        let mut closed = current.status == ReadingStatus::Closed;
        while !closed && updates.changed().await.is_ok() {
            let update = *updates.borrow_and_update();
            yield Ok(update_event(&update));
            closed = update.status == ReadingStatus::Closed;
        }
    };

    Ok(Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(HEARTBEAT_INTERVAL)
            .text("heartbeat"),
    ))
}

pub fn reading_routes() -> Router<AppState> {
    Router::new()
        .route("/api/reading", post(open_reading))
        .route("/api/reading/:id", delete(close_reading))
        .route("/api/reading/:id/toggle", post(toggle_reading))
        .route("/api/reading/:id/tempo", put(set_reading_tempo))
        .route("/api/reading/:id/events", get(reading_events))
}
