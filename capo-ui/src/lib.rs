//! capo-ui library - CapoCanto song library service
//!
//! JSON API over the song library, prompter, display settings and reading
//! sessions. Every `/api` route runs with the caller's identity.

use axum::Router;
use sqlx::SqlitePool;
use tower_http::trace::TraceLayer;

pub mod api;
pub mod error;
pub mod reading;
pub mod settings;

use reading::ReadingRegistry;
use settings::SettingsCache;

/// Application state shared across HTTP handlers
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool
    pub db: SqlitePool,
    /// Per-user display settings, written through on change
    pub settings: SettingsCache,
    /// Open reading sessions
    pub reading: ReadingRegistry,
}

impl AppState {
    pub fn new(db: SqlitePool) -> Self {
        Self {
            db,
            settings: SettingsCache::new(),
            reading: ReadingRegistry::new(),
        }
    }
}

/// Build application router
///
/// `/health` is public; everything under `/api` requires an identity.
pub fn build_router(state: AppState) -> Router {
    use axum::middleware;

    let protected = Router::new()
        .merge(api::song_routes())
        .merge(api::transfer_routes())
        .merge(api::prompter_routes())
        .merge(api::settings_routes())
        .merge(api::reading_routes())
        .merge(api::identity_routes())
        .merge(api::event_routes())
        .layer(middleware::from_fn_with_state(
            state.clone(),
            api::identity_middleware,
        ));

    Router::new()
        .merge(protected)
        .merge(api::health_routes())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
