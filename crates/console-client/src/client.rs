//! API client for the console: authentication calls plus the outbound
//! credential attacher.
//!
//! Every request built through [`ApiClient::request`] carries the stored
//! bearer credential when a session exists, and nothing otherwise. The
//! attacher never checks expiry - that is the navigation guard's job, and
//! the identity service is the final authority for API calls.

use crate::session::{Session, SessionStore};
use common::secret::{ExposeSecret, SecretString};
use common::Role;
use reqwest::Method;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, instrument, trace, warn};

/// Default HTTP request timeout.
pub const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(10);

/// Default connection timeout for the HTTP client.
const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Errors surfaced to the console.
#[derive(Debug, Error)]
pub enum ClientError {
    /// Transport-level failure.
    #[error("HTTP client error: {0}")]
    Http(String),

    /// The response body was not what the API contract promises.
    #[error("Invalid response body: {0}")]
    InvalidResponse(String),

    /// The server rejected the request with validation messages.
    #[error("Request rejected: {}", join_messages(.messages))]
    Rejected { messages: Vec<String> },

    /// A status outside the contract (e.g. a proxy error page).
    #[error("Unexpected status: {0}")]
    UnexpectedStatus(u16),
}

fn join_messages(messages: &[String]) -> String {
    messages.join("; ")
}

/// Successful login payload from the identity service.
#[derive(Deserialize)]
struct LoginPayload {
    email: String,
    roles: Vec<Role>,
    token: String,
}

impl std::fmt::Debug for LoginPayload {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoginPayload")
            .field("email", &self.email)
            .field("roles", &self.roles)
            .field("token", &"[REDACTED]")
            .finish()
    }
}

/// Validation-problem payload: field name to messages, `""` for global.
#[derive(Debug, Deserialize)]
struct ValidationProblem {
    errors: BTreeMap<String, Vec<String>>,
}

impl ValidationProblem {
    fn into_messages(self) -> Vec<String> {
        self.errors.into_values().flatten().collect()
    }
}

pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    session: SessionStore,
}

impl ApiClient {
    /// Build a client against the identity service's base URL, sharing
    /// `session` with the navigation guard.
    pub fn new(base_url: impl Into<String>, session: SessionStore) -> Result<Self, ClientError> {
        let http = reqwest::Client::builder()
            .timeout(DEFAULT_HTTP_TIMEOUT)
            .connect_timeout(DEFAULT_CONNECT_TIMEOUT)
            .build()
            .map_err(|e| ClientError::Http(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            session,
        })
    }

    /// The session store this client reads and writes.
    #[must_use]
    pub fn session(&self) -> &SessionStore {
        &self.session
    }

    /// Build a request with the stored bearer credential attached.
    ///
    /// A strict no-op when no session is stored: no header, no error.
    #[must_use]
    pub fn request(&self, method: Method, path: &str) -> reqwest::RequestBuilder {
        let builder = self.http.request(method, format!("{}{}", self.base_url, path));

        match self.session.snapshot() {
            Some(session) => builder.bearer_auth(session.token.expose_secret()),
            None => builder,
        }
    }

    /// Register a new account.
    ///
    /// Success carries no payload; rejection carries the server's
    /// validation messages.
    #[instrument(skip_all)]
    pub async fn register(&self, email: &str, password: &str) -> Result<(), ClientError> {
        let url = format!("{}/api/auth/register", self.base_url);

        debug!(target: "console.client", url = %url, "Submitting registration");

        let response = self
            .http
            .post(&url)
            .json(&serde_json::json!({"email": email, "password": password}))
            .send()
            .await
            .map_err(|e| ClientError::Http(e.to_string()))?;

        let status = response.status();
        if status.is_success() {
            debug!(target: "console.client", "Registration accepted");
            return Ok(());
        }

        Err(self.rejection(response).await)
    }

    /// Log in, store the resulting session, and return it.
    ///
    /// A fresh login supersedes any previously stored session.
    #[instrument(skip_all)]
    pub async fn login(&self, email: &str, password: &str) -> Result<Session, ClientError> {
        let url = format!("{}/api/auth/login", self.base_url);

        debug!(target: "console.client", url = %url, "Submitting login");

        let response = self
            .http
            .post(&url)
            .json(&serde_json::json!({"email": email, "password": password}))
            .send()
            .await
            .map_err(|e| ClientError::Http(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(self.rejection(response).await);
        }

        let payload: LoginPayload = response.json().await.map_err(|e| {
            warn!(target: "console.client", error = %e, "Failed to parse login response");
            ClientError::InvalidResponse(e.to_string())
        })?;

        let session = Session {
            token: SecretString::from(payload.token),
            email: payload.email,
            roles: payload.roles,
        };
        self.session.set(session.clone());

        debug!(target: "console.client", "Login succeeded, session stored");
        Ok(session)
    }

    /// Destroy the stored session.
    pub fn logout(&self) {
        self.session.clear();
        debug!(target: "console.client", "Session cleared");
    }

    /// Turn a non-success response into a `ClientError`.
    async fn rejection(&self, response: reqwest::Response) -> ClientError {
        let status = response.status();

        if status.as_u16() == 400 || status.as_u16() == 401 || status.as_u16() == 403 {
            // Body may carry validation messages; log at trace level only
            match response.json::<ValidationProblem>().await {
                Ok(problem) => {
                    let messages = problem.into_messages();
                    trace!(
                        target: "console.client",
                        status = %status,
                        messages = ?messages,
                        "Request rejected with validation messages"
                    );
                    ClientError::Rejected { messages }
                }
                Err(e) => {
                    warn!(target: "console.client", status = %status, error = %e, "Unparseable rejection body");
                    ClientError::InvalidResponse(e.to_string())
                }
            }
        } else {
            warn!(target: "console.client", status = %status, "Unexpected response status");
            ClientError::UnexpectedStatus(status.as_u16())
        }
    }
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.base_url)
            .field("session", &self.session)
            .finish()
    }
}
