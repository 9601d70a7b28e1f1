//! General connection-status event stream

use axum::{
    response::sse::{Event, Sse},
    routing::get,
    Router,
};
use futures::stream::Stream;
use std::convert::Infallible;

use crate::AppState;

/// GET /api/events - heartbeat stream for connection status
pub async fn event_stream() -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    capo_common::sse::create_heartbeat_sse_stream("capo-ui")
}

pub fn event_routes() -> Router<AppState> {
    Router::new().route("/api/events", get(event_stream))
}
