use axum::{extract::State, http::StatusCode, routing::{get, post}, Json, Router};

use crate::extract::ApiJson;
use crate::middleware::AuthUser;
use crate::services::accounts::{LoginRequest, RegisterRequest, TokenResponse};
use crate::services::views::UserProfile;
use crate::state::AppState;
use crate::Result;

pub(super) fn routes() -> Router<AppState> {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/user", get(profile))
}

async fn register(State(s): State<AppState>, ApiJson(r): ApiJson<RegisterRequest>) -> Result<(StatusCode, Json<TokenResponse>)> {
    let token = s.account_service().register(r).await?;
    Ok((StatusCode::CREATED, Json(token)))
}

async fn login(State(s): State<AppState>, ApiJson(r): ApiJson<LoginRequest>) -> Result<Json<TokenResponse>> {
    Ok(Json(s.account_service().login(r).await?))
}

async fn profile(State(s): State<AppState>, AuthUser(user_id): AuthUser) -> Result<Json<UserProfile>> {
    Ok(Json(s.account_service().profile(user_id).await?))
}
