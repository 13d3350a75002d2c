//! Bearer-credential verification for protected routers.
//!
//! The content routers (posts, categories, images) sit behind
//! [`require_writer`]; every mutating call re-verifies the presented
//! credential's signature and expiry here, regardless of what the client's
//! cached session believed. Verified claims are stored in request
//! extensions for downstream handlers.

use crate::errors::IdError;
use crate::handlers::AppState;
use axum::{
    extract::{Request, State},
    http::HeaderMap,
    middleware::Next,
    response::IntoResponse,
};
use common::{Claims, Role};
use std::sync::Arc;

/// Middleware requiring a valid, non-expired credential carrying `Writer`.
pub async fn require_writer(
    State(state): State<Arc<AppState>>,
    mut req: Request,
    next: Next,
) -> Result<impl IntoResponse, IdError> {
    let claims = authorize(&state, req.headers(), Role::Writer)?;

    req.extensions_mut().insert(claims);

    Ok(next.run(req).await)
}

fn authorize(state: &AppState, headers: &HeaderMap, required: Role) -> Result<Claims, IdError> {
    let auth_header = headers
        .get("authorization")
        .and_then(|h| h.to_str().ok())
        .ok_or_else(|| IdError::InvalidToken("Missing Authorization header".to_string()))?;

    let token = auth_header.strip_prefix("Bearer ").ok_or_else(|| {
        IdError::InvalidToken("Invalid Authorization header format".to_string())
    })?;

    let claims = state.issuer.verify(token)?;

    if !claims.has_role(required) {
        return Err(IdError::InsufficientRole { required });
    }

    Ok(claims)
}
