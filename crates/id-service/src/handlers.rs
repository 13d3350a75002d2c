use crate::errors::IdError;
use crate::models::{LoginRequest, LoginResponse, RegisterRequest};
use crate::services::{auth_service, token_service::TokenIssuer};
use crate::store::CredentialStore;
use axum::{extract::State, http::StatusCode, Json};
use chrono::Utc;
use std::sync::Arc;

/// Application state shared across handlers
pub struct AppState {
    pub store: Arc<dyn CredentialStore>,
    pub issuer: TokenIssuer,
}

/// Handle registration
///
/// POST /api/auth/register
pub async fn register(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<RegisterRequest>,
) -> Result<StatusCode, IdError> {
    auth_service::register(state.store.as_ref(), &payload.email, &payload.password).await?;

    Ok(StatusCode::OK)
}

/// Handle login
///
/// POST /api/auth/login
pub async fn login(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, IdError> {
    let response = auth_service::login(
        state.store.as_ref(),
        &state.issuer,
        &payload.email,
        &payload.password,
        Utc::now(),
    )
    .await?;

    Ok(Json(response))
}
