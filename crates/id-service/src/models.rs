use common::Role;
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Registration request body.
#[derive(Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: SecretString,
}

impl fmt::Debug for RegisterRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegisterRequest")
            .field("email", &self.email)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

/// Login request body.
#[derive(Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: SecretString,
}

impl fmt::Debug for LoginRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoginRequest")
            .field("email", &self.email)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

/// Successful login payload: the caller's identity, role list, and the
/// signed credential. This is the server-side view of a session; the
/// console stores it and decodes the token locally for UX.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginResponse {
    pub email: String,
    pub roles: Vec<Role>,
    pub token: String,
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_request_debug_redacts_password() {
        let request: LoginRequest =
            serde_json::from_str(r#"{"email":"alice@example.com","password":"Secret123!"}"#)
                .unwrap();

        let debug_str = format!("{:?}", request);
        assert!(debug_str.contains("alice@example.com"));
        assert!(!debug_str.contains("Secret123!"));
    }

    #[test]
    fn test_login_response_serialization_shape() {
        let response = LoginResponse {
            email: "alice@example.com".to_string(),
            roles: vec![Role::Reader],
            token: "abc.def.ghi".to_string(),
        };

        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "email": "alice@example.com",
                "roles": ["Reader"],
                "token": "abc.def.ghi",
            })
        );
    }
}
