//! Display settings endpoints
//!
//! Settings belong to the caller. Updates are partial; the new value is
//! persisted before the cached copy changes.

use axum::{extract::State, routing::get, Extension, Json, Router};
use capo_common::identity::Identity;
use capo_common::settings::{AppSettings, AppSettingsPatch, PrompterSettings, PrompterSettingsPatch};
use tracing::info;

use crate::error::ApiResult;
use crate::AppState;

/// GET /api/settings/prompter
pub async fn get_prompter_settings(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
) -> ApiResult<Json<PrompterSettings>> {
    let settings = state.settings.get(&state.db, identity.user_id).await?;
    Ok(Json(settings.prompter))
}

/// PATCH /api/settings/prompter
pub async fn patch_prompter_settings(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Json(patch): Json<PrompterSettingsPatch>,
) -> ApiResult<Json<PrompterSettings>> {
    let updated = state
        .settings
        .update_prompter(&state.db, identity.user_id, &patch)
        .await?;

    info!(user_id = %identity.user_id, ?updated, "Prompter settings changed");
    Ok(Json(updated))
}

/// GET /api/settings/app
pub async fn get_app_settings(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
) -> ApiResult<Json<AppSettings>> {
    let settings = state.settings.get(&state.db, identity.user_id).await?;
    Ok(Json(settings.app))
}

/// PATCH /api/settings/app
pub async fn patch_app_settings(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Json(patch): Json<AppSettingsPatch>,
) -> ApiResult<Json<AppSettings>> {
    let updated = state
        .settings
        .update_app(&state.db, identity.user_id, &patch)
        .await?;

    info!(user_id = %identity.user_id, ?updated, "App settings changed");
    Ok(Json(updated))
}

pub fn settings_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/api/settings/prompter",
            get(get_prompter_settings).patch(patch_prompter_settings),
        )
        .route(
            "/api/settings/app",
            get(get_app_settings).patch(patch_app_settings),
        )
}
