use axum::{extract::State, http::StatusCode, routing::post, Json, Router};
use axum_extra::extract::WithRejection;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::error::{AppError, Result};
use crate::models::UserSummary;
use crate::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
}

#[derive(Debug, Deserialize, Validate)]
pub struct CredentialsRequest {
    #[validate(length(min = 1, max = 64, message = "username must be 1-64 characters"))]
    pub username: String,
    #[validate(length(min = 1, message = "password is required"))]
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub user: UserSummary,
}

async fn register(
    State(state): State<AppState>,
    WithRejection(Json(payload), _): WithRejection<Json<CredentialsRequest>, AppError>,
) -> Result<(StatusCode, Json<MessageResponse>)> {
    payload.validate()?;

    state
        .auth
        .register(&payload.username, &payload.password)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(MessageResponse {
            message: "Registration successful".to_string(),
        }),
    ))
}

async fn login(
    State(state): State<AppState>,
    WithRejection(Json(payload), _): WithRejection<Json<CredentialsRequest>, AppError>,
) -> Result<Json<LoginResponse>> {
    let user = state
        .auth
        .verify_credentials(&payload.username, &payload.password)
        .await?;

    let token = state.sessions.issue(user.id)?;
    tracing::info!(user_id = %user.id, "User logged in");

    Ok(Json(LoginResponse {
        token,
        user: user.summary(),
    }))
}
