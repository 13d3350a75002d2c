use crate::store::StoreError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use common::Role;
use serde::Serialize;
use std::collections::BTreeMap;
use thiserror::Error;

/// Field-level validation failures, rendered as the validation-problem
/// payload the console expects: `{"errors": {"<field>": ["message", ...]}}`.
/// The empty-string field keys global errors.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationErrors {
    pub errors: BTreeMap<String, Vec<String>>,
}

impl ValidationErrors {
    /// A single global (field-less) error.
    pub fn global(message: impl Into<String>) -> Self {
        let mut errors = Self::default();
        errors.push("", message);
        errors
    }

    /// Append a message under a field ("" for global).
    pub fn push(&mut self, field: &str, message: impl Into<String>) {
        self.errors
            .entry(field.to_string())
            .or_default()
            .push(message.into());
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    /// All messages across fields, in field order. Used by tests and logs.
    #[must_use]
    pub fn messages(&self) -> Vec<&str> {
        self.errors
            .values()
            .flatten()
            .map(String::as_str)
            .collect()
    }
}

impl IntoResponse for ValidationErrors {
    fn into_response(self) -> Response {
        (StatusCode::BAD_REQUEST, Json(self)).into_response()
    }
}

#[derive(Debug, Error)]
pub enum IdError {
    #[error("Store error: {0}")]
    Store(String),

    #[error("Cryptographic error: {0}")]
    Crypto(String),

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Validation failed")]
    Validation(ValidationErrors),

    #[error("Invalid token: {0}")]
    InvalidToken(String),

    #[error("Insufficient role: required {required}")]
    InsufficientRole { required: Role },

    #[error("Internal server error")]
    Internal,
}

impl From<StoreError> for IdError {
    fn from(err: StoreError) -> Self {
        IdError::Store(err.to_string())
    }
}

impl IntoResponse for IdError {
    fn into_response(self) -> Response {
        let (status, errors) = match self {
            // The one deliberately uninformative failure: unknown email and
            // wrong password must be indistinguishable to the caller.
            IdError::InvalidCredentials => (
                StatusCode::BAD_REQUEST,
                ValidationErrors::global("Email or password incorrect"),
            ),
            IdError::Validation(errors) => (StatusCode::BAD_REQUEST, errors),
            IdError::InvalidToken(_) => (
                StatusCode::UNAUTHORIZED,
                ValidationErrors::global("The access token is invalid or expired"),
            ),
            IdError::InsufficientRole { required } => (
                StatusCode::FORBIDDEN,
                ValidationErrors::global(format!("Requires role: {}", required)),
            ),
            IdError::Store(_) | IdError::Crypto(_) | IdError::Internal => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ValidationErrors::global("An internal error occurred"),
            ),
        };

        (status, Json(errors)).into_response()
    }
}
