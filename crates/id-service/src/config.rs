use crate::crypto;
use base64::{engine::general_purpose, Engine as _};
use secrecy::{ExposeSecret, SecretBox, SecretString};
use std::collections::HashMap;
use std::env;
use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// Default fixed credential lifetime (1 hour).
pub const DEFAULT_TOKEN_TTL_SECS: u64 = 3600;

/// Which credential store backs the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreKind {
    Postgres,
    Memory,
}

/// Signing material and token lifetime for the token issuer.
///
/// Always constructed from configuration and passed in explicitly - the
/// signing key is never process-global state.
pub struct TokenConfig {
    /// Ed25519 private key, PKCS#8 DER.
    pub signing_key: SecretBox<Vec<u8>>,
    /// Public half, PEM, derived from the private key at load time.
    pub public_key_pem: String,
    /// Fixed credential lifetime; not adjustable per call.
    pub lifetime: Duration,
}

impl TokenConfig {
    /// Build from a PKCS#8 private key, deriving the public half.
    pub fn from_pkcs8(private_key_pkcs8: Vec<u8>, lifetime: Duration) -> Result<Self, ConfigError> {
        let public_key_pem = crypto::public_key_pem_from_pkcs8(&private_key_pkcs8)
            .map_err(|e| ConfigError::InvalidSigningKey(e.to_string()))?;

        Ok(TokenConfig {
            signing_key: SecretBox::new(Box::new(private_key_pkcs8)),
            public_key_pem,
            lifetime,
        })
    }
}

impl Clone for TokenConfig {
    fn clone(&self) -> Self {
        Self {
            signing_key: SecretBox::new(Box::new(self.signing_key.expose_secret().clone())),
            public_key_pem: self.public_key_pem.clone(),
            lifetime: self.lifetime,
        }
    }
}

impl fmt::Debug for TokenConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenConfig")
            .field("signing_key", &"[REDACTED]")
            .field("public_key_pem", &self.public_key_pem)
            .field("lifetime", &self.lifetime)
            .finish()
    }
}

/// Initial editor account seeded at startup (both roles), mirroring the
/// deployment's provisioned admin. Optional.
#[derive(Clone)]
pub struct SeedEditor {
    pub email: String,
    pub password: SecretString,
}

impl fmt::Debug for SeedEditor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SeedEditor")
            .field("email", &self.email)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub bind_address: String,
    pub store_kind: StoreKind,
    pub database_url: Option<String>,
    pub token: TokenConfig,
    pub seed_editor: Option<SeedEditor>,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid signing key: {0}")]
    InvalidSigningKey(String),

    #[error("Base64 decode error: {0}")]
    Base64Error(#[from] base64::DecodeError),

    #[error("Invalid token lifetime: {0}")]
    InvalidTokenTtl(String),

    #[error("Invalid credential store kind: {0}")]
    InvalidStoreKind(String),

    #[error("SEED_EDITOR_EMAIL and SEED_EDITOR_PASSWORD must be set together")]
    IncompleteSeedEditor,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(&env::vars().collect())
    }

    /// Load configuration from a HashMap (for testing)
    pub fn from_vars(vars: &HashMap<String, String>) -> Result<Self, ConfigError> {
        let bind_address = vars
            .get("BIND_ADDRESS")
            .cloned()
            .unwrap_or_else(|| "0.0.0.0:8080".to_string());

        let store_kind = match vars.get("CREDENTIAL_STORE").map(String::as_str) {
            None | Some("postgres") => StoreKind::Postgres,
            Some("memory") => StoreKind::Memory,
            Some(other) => return Err(ConfigError::InvalidStoreKind(other.to_string())),
        };

        let database_url = vars.get("DATABASE_URL").cloned();
        if store_kind == StoreKind::Postgres && database_url.is_none() {
            return Err(ConfigError::MissingEnvVar("DATABASE_URL".to_string()));
        }

        let lifetime_secs = match vars.get("TOKEN_TTL_SECS") {
            None => DEFAULT_TOKEN_TTL_SECS,
            Some(raw) => raw
                .parse::<u64>()
                .ok()
                .filter(|secs| *secs > 0)
                .ok_or_else(|| ConfigError::InvalidTokenTtl(raw.clone()))?,
        };
        let lifetime = Duration::from_secs(lifetime_secs);

        let token = match vars.get("ID_SIGNING_KEY") {
            Some(key_base64) => {
                let private_key = general_purpose::STANDARD
                    .decode(key_base64)
                    .map_err(ConfigError::Base64Error)?;
                TokenConfig::from_pkcs8(private_key, lifetime)?
            }
            // The memory store is a development mode; an ephemeral key keeps
            // it zero-config at the cost of invalidating tokens on restart.
            None if store_kind == StoreKind::Memory => {
                tracing::warn!(
                    "ID_SIGNING_KEY not set; generated an ephemeral signing key \
                     (issued tokens will not survive a restart)"
                );
                let (_, private_key) = crypto::generate_signing_key()
                    .map_err(|e| ConfigError::InvalidSigningKey(e.to_string()))?;
                TokenConfig::from_pkcs8(private_key, lifetime)?
            }
            None => return Err(ConfigError::MissingEnvVar("ID_SIGNING_KEY".to_string())),
        };

        let seed_editor = match (
            vars.get("SEED_EDITOR_EMAIL"),
            vars.get("SEED_EDITOR_PASSWORD"),
        ) {
            (Some(email), Some(password)) => Some(SeedEditor {
                email: email.clone(),
                password: SecretString::from(password.clone()),
            }),
            (None, None) => None,
            _ => return Err(ConfigError::IncompleteSeedEditor),
        };

        Ok(Config {
            bind_address,
            store_kind,
            database_url,
            token,
            seed_editor,
        })
    }
}
