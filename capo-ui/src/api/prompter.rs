//! Prompter endpoints
//!
//! `GET /api/prompter` draws once. `GET /api/prompter/events` keeps the
//! rotation running: the current cards first, then a countdown tick every
//! second and fresh cards whenever the countdown runs out.

use axum::{
    extract::State,
    response::sse::{Event, KeepAlive, Sse},
    routing::get,
    Extension, Json, Router,
};
use capo_common::db::songs;
use capo_common::identity::Identity;
use capo_common::prompter::{draw_cards, Countdown, PrompterCard};
use capo_common::settings::PrompterSettings;
use capo_common::sse::HEARTBEAT_INTERVAL;
use futures::stream::Stream;
use serde::Serialize;
use std::convert::Infallible;
use std::time::Duration;
use tokio::time::MissedTickBehavior;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::error::ApiResult;
use crate::AppState;

const TICK_INTERVAL: Duration = Duration::from_secs(1);

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PrompterResponse {
    pub cards: Vec<PrompterCard>,
    /// Seconds between redraws
    pub rotation_interval: u32,
    /// Countdown start, `m:ss`
    pub time_left: String,
    pub settings: PrompterSettings,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct PrompterTick {
    time_left: String,
}

async fn draw_for(state: &AppState, user_id: Uuid) -> capo_common::Result<PrompterResponse> {
    let all = songs::list_by_owner(&state.db, user_id).await?;
    let settings = state.settings.get(&state.db, user_id).await?;

    let cards = draw_cards(&all, &settings.prompter, &settings.app, &mut rand::thread_rng());
    let countdown = Countdown::new(settings.prompter.rotation_interval);

    Ok(PrompterResponse {
        cards,
        rotation_interval: settings.prompter.rotation_interval,
        time_left: countdown.display(),
        settings: settings.prompter,
    })
}

/// GET /api/prompter
///
/// Draws one random song per prompter category.
pub async fn draw(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
) -> ApiResult<Json<PrompterResponse>> {
    Ok(Json(draw_for(&state, identity.user_id).await?))
}

fn json_event<T: Serialize>(name: &str, value: &T) -> Event {
    let data = serde_json::to_string(value).unwrap_or_else(|_| "{}".to_string());
    Event::default().event(name).data(data)
}

/// GET /api/prompter/events
///
/// Events `PrompterCards` (a full draw) and `PrompterTick` (`timeLeft`).
/// A changed rotation interval takes effect at the next redraw.
pub async fn prompter_events(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
) -> ApiResult<Sse<impl Stream<Item = Result<Event, Infallible>>>> {
    let first = draw_for(&state, identity.user_id).await?;
    let user_id = identity.user_id;

    debug!(user_id = %user_id, "SSE client following prompter rotation");

    let stream = async_stream::stream! {
        let mut countdown = Countdown::new(first.rotation_interval);
        yield Ok(json_event("PrompterCards", &first));

        let mut interval = tokio::time::interval(TICK_INTERVAL);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
        // First tick completes immediately
        interval.tick().await;

        loop {
            interval.tick().await;
            if !countdown.tick() {
                yield Ok(json_event("PrompterTick", &PrompterTick { time_left: countdown.display() }));
                continue;
            }

            match draw_for(&state, user_id).await {
                Ok(response) => {
                    if response.rotation_interval != countdown.interval() {
                        countdown = Countdown::new(response.rotation_interval);
                    }
                    yield Ok(json_event("PrompterCards", &response));
                }
                Err(e) => warn!(user_id = %user_id, "Prompter redraw failed: {}", e),
            }
        }
    };

    Ok(Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(HEARTBEAT_INTERVAL)
            .text("heartbeat"),
    ))
}

pub fn prompter_routes() -> Router<AppState> {
    Router::new()
        .route("/api/prompter", get(draw))
        .route("/api/prompter/events", get(prompter_events))
}
