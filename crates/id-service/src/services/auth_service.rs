//! Registration and login orchestration.
//!
//! Register: validate, create the user with zero roles, then grant
//! `Reader`. The two store steps are independently fallible; when the role
//! grant fails after creation succeeded, the errors are surfaced and the
//! user record stays (see DESIGN.md for the rationale - there is no
//! compensation step).
//!
//! Login: the unknown-email and wrong-password paths return the identical
//! error and do comparable work, so a caller can't probe which emails are
//! registered.

use crate::crypto;
use crate::errors::{IdError, ValidationErrors};
use crate::models::LoginResponse;
use crate::services::token_service::TokenIssuer;
use crate::store::{CredentialStore, StoreError};
use chrono::{DateTime, Utc};
use common::Role;
use secrecy::{ExposeSecret, SecretString};

const MIN_PASSWORD_LENGTH: usize = 8;

/// Register a new user.
///
/// The email is trimmed before any other handling. New users always end up
/// with exactly the `Reader` role; `Writer` is never granted here.
pub async fn register(
    store: &dyn CredentialStore,
    email: &str,
    password: &SecretString,
) -> Result<(), IdError> {
    let email = email.trim();

    let mut errors = ValidationErrors::default();
    if !is_valid_email(email) {
        errors.push("email", "Email address is not valid.");
    }
    validate_password(password.expose_secret(), &mut errors);
    if !errors.is_empty() {
        return Err(IdError::Validation(errors));
    }

    let password_hash = crypto::hash_password(password.expose_secret())?;

    let user = match store.create_user(email, &password_hash).await {
        Ok(user) => user,
        Err(StoreError::DuplicateEmail) => {
            return Err(IdError::Validation(ValidationErrors::global(
                StoreError::DuplicateEmail.to_string(),
            )));
        }
        Err(StoreError::Backend(detail)) => {
            tracing::error!(error = %detail, "User creation failed");
            return Err(IdError::Store(detail));
        }
    };

    if let Err(e) = store.assign_role(user.user_id, Role::Reader).await {
        // The user record now exists without its role. Deliberately not
        // compensated; surfaced to the caller and left for reconciliation.
        tracing::warn!(
            user_id = %user.user_id,
            error = %e,
            "Role assignment failed after user creation; user record retained without role"
        );
        return Err(IdError::Validation(ValidationErrors::global(format!(
            "Unable to assign the {} role.",
            Role::Reader
        ))));
    }

    tracing::info!(user_id = %user.user_id, "User registered");
    Ok(())
}

/// Authenticate and mint a credential.
///
/// Unknown email and wrong password both produce
/// [`IdError::InvalidCredentials`] - nothing else observable differs
/// between the two.
pub async fn login(
    store: &dyn CredentialStore,
    issuer: &TokenIssuer,
    email: &str,
    password: &SecretString,
    now: DateTime<Utc>,
) -> Result<LoginResponse, IdError> {
    let email = email.trim();

    let user = store.find_by_email(email).await?;

    // Always run bcrypt, against a dummy hash on a miss, so both failure
    // paths cost the same
    let hash_to_verify = match &user {
        Some(user) => user.password_hash.as_str(),
        None => crypto::DUMMY_PASSWORD_HASH,
    };
    let password_ok = crypto::verify_password(password.expose_secret(), hash_to_verify)?;

    let user = user.ok_or(IdError::InvalidCredentials)?;
    if !password_ok {
        return Err(IdError::InvalidCredentials);
    }

    let roles = store.roles_of(user.user_id).await?;
    let token = issuer.issue(&user.email, &roles, now)?;

    tracing::debug!(user_id = %user.user_id, "Login succeeded");

    Ok(LoginResponse {
        email: user.email,
        roles,
        token,
    })
}

/// Minimal email shape check: non-empty local part, domain with at least
/// one dot and no empty labels.
fn is_valid_email(email: &str) -> bool {
    let mut parts = email.split('@');
    let (local, domain) = match (parts.next(), parts.next(), parts.next()) {
        (Some(local), Some(domain), None) => (local, domain),
        _ => return false,
    };

    if local.is_empty() {
        return false;
    }

    let domain_parts: Vec<&str> = domain.split('.').collect();
    if domain_parts.len() < 2 {
        return false;
    }

    domain_parts.iter().all(|p| !p.is_empty())
}

/// Password policy, one message per violated constraint.
fn validate_password(password: &str, errors: &mut ValidationErrors) {
    if password.len() < MIN_PASSWORD_LENGTH {
        errors.push(
            "password",
            format!("Password must be at least {} characters.", MIN_PASSWORD_LENGTH),
        );
    }
    if !password.chars().any(|c| c.is_ascii_digit()) {
        errors.push("password", "Password must contain at least one digit.");
    }
    if !password.chars().any(|c| c.is_lowercase()) {
        errors.push(
            "password",
            "Password must contain at least one lowercase letter.",
        );
    }
    if !password.chars().any(|c| c.is_uppercase()) {
        errors.push(
            "password",
            "Password must contain at least one uppercase letter.",
        );
    }
    if password.chars().all(|c| c.is_alphanumeric()) {
        errors.push(
            "password",
            "Password must contain at least one non-alphanumeric character.",
        );
    }
}
