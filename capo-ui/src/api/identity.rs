//! Caller identity
//!
//! The fronting proxy authenticates users and forwards the user id in the
//! `x-user-id` header. The middleware resolves it to an [`Identity`]
//! (role from the profiles table) and stores it in the request extensions.

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
    routing::get,
    Extension, Json, Router,
};
use capo_common::db::profiles;
use capo_common::identity::{Identity, USER_ID_HEADER};
use tracing::debug;
use uuid::Uuid;

use crate::error::{ApiError, ApiResult};
use crate::AppState;

/// Reject requests without a valid caller id; attach the caller's identity
pub async fn identity_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> ApiResult<Response> {
    let header = request
        .headers()
        .get(USER_ID_HEADER)
        .ok_or_else(|| ApiError::Unauthorized(format!("Missing {} header", USER_ID_HEADER)))?;

    let user_id = header
        .to_str()
        .ok()
        .and_then(|value| Uuid::parse_str(value.trim()).ok())
        .ok_or_else(|| ApiError::Unauthorized(format!("Malformed {} header", USER_ID_HEADER)))?;

    let role = profiles::role_for(&state.db, user_id).await?;
    debug!(user_id = %user_id, role = role.as_str(), "Resolved caller");

    request.extensions_mut().insert(Identity { user_id, role });
    Ok(next.run(request).await)
}

/// GET /api/me
pub async fn get_me(Extension(identity): Extension<Identity>) -> Json<Identity> {
    Json(identity)
}

pub fn identity_routes() -> Router<AppState> {
    Router::new().route("/api/me", get(get_me))
}
