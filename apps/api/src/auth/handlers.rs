use axum::{
    extract::{Request, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;

use crate::auth::{bearer_token, Session};
use crate::errors::AppError;
use crate::state::AppState;

#[derive(Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// POST /api/admin/login
pub async fn handle_login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<Session>, AppError> {
    if req.email.trim().is_empty() || req.password.is_empty() {
        return Err(AppError::Validation("Email and password are required".to_string()));
    }
    let session = state.auth.sign_in(req.email.trim(), &req.password).await?;
    Ok(Json(session))
}

/// POST /api/admin/logout
pub async fn handle_logout(
    State(state): State<AppState>,
    request: Request,
) -> Result<StatusCode, AppError> {
    let token = bearer_token(&request)
        .ok_or_else(|| AppError::Unauthorized("Missing bearer token".to_string()))?
        .to_string();
    state.auth.sign_out(&token).await?;
    Ok(StatusCode::NO_CONTENT)
}
