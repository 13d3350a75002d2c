//! Cryptographic operations: token signing/verification and password
//! hashing.
//!
//! Tokens are EdDSA (Ed25519) JWTs; passwords are bcrypt. The signing key
//! is always passed in explicitly - there is no process-global key state.

use crate::errors::IdError;
use base64::{engine::general_purpose, Engine as _};
use common::{Claims, MAX_TOKEN_SIZE_BYTES};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use ring::{
    rand::SystemRandom,
    signature::{Ed25519KeyPair, KeyPair},
};
use tracing::instrument;

/// Bcrypt cost factor (2^cost iterations). ~200ms per hash, which is the
/// point: it rate-limits offline guessing against a leaked hash.
pub const BCRYPT_COST: u32 = 12;

/// A valid bcrypt hash matching no password anyone will present.
///
/// Login runs verification against this when the email is unknown, so the
/// unknown-email and wrong-password paths do comparable work and stay
/// indistinguishable from timing.
pub const DUMMY_PASSWORD_HASH: &str =
    "$2b$12$LQv3c1yqBWVHxkd0LHAkCOYz6TtxMQJqhN8/LewY5GyYqExt7YD3a";

/// Generate an EdDSA (Ed25519) keypair using the system CSPRNG.
///
/// Returns `(public_key_pem, private_key_pkcs8)`.
#[instrument(skip_all)]
pub fn generate_signing_key() -> Result<(String, Vec<u8>), IdError> {
    let rng = SystemRandom::new();

    let pkcs8_bytes = Ed25519KeyPair::generate_pkcs8(&rng)
        .map_err(|e| IdError::Crypto(format!("Keypair generation failed: {}", e)))?;

    let public_key_pem = public_key_pem_from_pkcs8(pkcs8_bytes.as_ref())?;

    Ok((public_key_pem, pkcs8_bytes.as_ref().to_vec()))
}

/// Derive the PEM-encoded public key from an Ed25519 PKCS#8 private key.
///
/// Accepts both PKCS#8 v1 and v2 documents (openssl emits v1).
pub fn public_key_pem_from_pkcs8(private_key_pkcs8: &[u8]) -> Result<String, IdError> {
    let key_pair = Ed25519KeyPair::from_pkcs8_maybe_unchecked(private_key_pkcs8)
        .map_err(|e| IdError::Crypto(format!("Invalid private key format: {}", e)))?;

    let public_key_bytes = key_pair.public_key().as_ref();

    Ok(format!(
        "-----BEGIN PUBLIC KEY-----\n{}\n-----END PUBLIC KEY-----",
        general_purpose::STANDARD.encode(public_key_bytes)
    ))
}

/// Sign a claim set with an EdDSA private key.
#[instrument(skip_all)]
pub fn sign_token(claims: &Claims, private_key_pkcs8: &[u8]) -> Result<String, IdError> {
    // Validate the private key format before handing it to jsonwebtoken
    let _key_pair = Ed25519KeyPair::from_pkcs8_maybe_unchecked(private_key_pkcs8)
        .map_err(|e| IdError::Crypto(format!("Invalid private key format: {}", e)))?;

    let encoding_key = EncodingKey::from_ed_der(private_key_pkcs8);

    let mut header = Header::new(Algorithm::EdDSA);
    header.typ = Some("JWT".to_string());

    encode(&header, claims, &encoding_key)
        .map_err(|e| IdError::Crypto(format!("Token signing operation failed: {}", e)))
}

/// Verify a credential with an EdDSA public key.
///
/// Validates:
/// - Token size (must be <= [`MAX_TOKEN_SIZE_BYTES`]) before any parsing
/// - Signature (EdDSA/Ed25519)
/// - Expiration (`exp` claim), with zero leeway so server-side expiry
///   agrees with the client guard's comparison
///
/// Failures collapse into one generic message; the distinguishing detail
/// goes to the debug log only.
#[instrument(skip_all)]
pub fn verify_token(token: &str, public_key_pem: &str) -> Result<Claims, IdError> {
    if token.len() > MAX_TOKEN_SIZE_BYTES {
        tracing::debug!(
            target: "crypto",
            token_size = token.len(),
            max_size = MAX_TOKEN_SIZE_BYTES,
            "Token rejected: size exceeds maximum allowed"
        );
        return Err(IdError::InvalidToken(
            "The access token is invalid or expired".to_string(),
        ));
    }

    // Extract base64 from PEM format
    let public_key_b64 = public_key_pem
        .lines()
        .filter(|line| !line.starts_with("-----"))
        .collect::<String>();

    let public_key_bytes = general_purpose::STANDARD
        .decode(&public_key_b64)
        .map_err(|e| {
            tracing::debug!(target: "crypto", error = %e, "Invalid public key encoding");
            IdError::InvalidToken("The access token is invalid or expired".to_string())
        })?;

    let decoding_key = DecodingKey::from_ed_der(&public_key_bytes);

    let mut validation = Validation::new(Algorithm::EdDSA);
    validation.validate_exp = true;
    validation.leeway = 0;

    let token_data = decode::<Claims>(token, &decoding_key, &validation).map_err(|e| {
        tracing::debug!(target: "crypto", error = %e, "Token verification failed");
        IdError::InvalidToken("The access token is invalid or expired".to_string())
    })?;

    Ok(token_data.claims)
}

/// Hash a password with bcrypt.
#[instrument(skip_all)]
pub fn hash_password(password: &str) -> Result<String, IdError> {
    bcrypt::hash(password, BCRYPT_COST)
        .map_err(|e| IdError::Crypto(format!("Password hashing failed: {}", e)))
}

/// Verify a password against a bcrypt hash.
#[instrument(skip_all)]
pub fn verify_password(password: &str, hash: &str) -> Result<bool, IdError> {
    bcrypt::verify(password, hash)
        .map_err(|e| IdError::Crypto(format!("Password verification failed: {}", e)))
}
