//! Admin login

use axum::extract::State;
use axum::{Extension, Json};
use serde::{Deserialize, Serialize};
use shared::error::{AppError, ErrorCode};

use crate::api::ApiResult;
use crate::auth::AdminIdentity;
use crate::auth::admin_auth::{JWT_EXPIRY_HOURS, create_token};
use crate::state::AppState;
use crate::validation::MAX_PASSWORD_LEN;

#[derive(Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub expires_in: i64,
    pub username: String,
}

/// POST /api/admin/login
pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> ApiResult<LoginResponse> {
    if req.password.len() > MAX_PASSWORD_LEN {
        return Err(AppError::invalid_credentials());
    }

    let admin = crate::db::admins::find_by_username(&state.pool, req.username.trim())
        .await
        .map_err(|e| {
            tracing::error!("DB error during login: {e}");
            AppError::new(ErrorCode::InternalError)
        })?;

    let Some(admin) = admin.filter(|a| crate::util::verify_password(&req.password, &a.password_hash))
    else {
        tracing::warn!(username = %req.username, "Admin login failed");
        return Err(AppError::invalid_credentials());
    };

    let token = create_token(admin.id, &admin.username, &state.jwt_secret).map_err(|e| {
        tracing::error!("JWT creation failed: {e}");
        AppError::new(ErrorCode::InternalError)
    })?;

    tracing::info!(admin_id = admin.id, username = %admin.username, "Admin logged in");
    Ok(Json(LoginResponse {
        token,
        expires_in: JWT_EXPIRY_HOURS * 3600,
        username: admin.username,
    }))
}

/// GET /api/admin/me
pub async fn me(Extension(identity): Extension<AdminIdentity>) -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "admin_id": identity.admin_id,
        "username": identity.username,
    }))
}
