//! End-to-end console flows against a real identity service on an
//! ephemeral port: register, login, guard decisions, bearer attachment,
//! logout.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

use axum::Router;
use chrono::Utc;
use common::Role;
use console_client::{ApiClient, ClientError, GuardDecision, RouteAccess, SessionGuard, SessionStore};
use id_service::handlers::AppState;
use id_service::services::token_service::TokenIssuer;
use id_service::store::{ensure_seed_user, MemoryCredentialStore};
use id_service::{crypto, middleware, routes};
use std::sync::Arc;

/// Serve the identity routes plus a stand-in protected content route.
async fn spawn_server() -> (String, Arc<AppState>) {
    let state = Arc::new(AppState {
        store: Arc::new(MemoryCredentialStore::new()),
        issuer: TokenIssuer::new(id_test_utils::test_token_config(1, 3600)).unwrap(),
    });

    let protected = Router::new()
        .route("/api/posts", axum::routing::post(|| async { "created" }))
        .route_layer(axum::middleware::from_fn_with_state(
            state.clone(),
            middleware::require_writer,
        ));

    let app = routes::build_routes(state.clone()).merge(protected);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    (format!("http://{addr}"), state)
}

#[tokio::test]
async fn test_register_login_and_guard_decisions() {
    let (base_url, _) = spawn_server().await;
    let store = SessionStore::new();
    let client = ApiClient::new(base_url, store.clone()).unwrap();
    let guard = SessionGuard::new(store.clone());

    client
        .register("alice@example.com", "Secret123!")
        .await
        .unwrap();
    let session = client.login("alice@example.com", "Secret123!").await.unwrap();

    assert_eq!(session.email, "alice@example.com");
    assert_eq!(session.roles, vec![Role::Reader]);

    // Any authenticated route is open to a fresh session
    assert_eq!(
        guard.check(&RouteAccess::public("/admin/profile"), Utc::now()),
        GuardDecision::Allow
    );

    // A Writer route denies the Reader without logging them out
    assert_eq!(
        guard.check(
            &RouteAccess::requiring("/admin/blogposts/add", Role::Writer),
            Utc::now()
        ),
        GuardDecision::Deny
    );
    assert!(store.snapshot().is_some());
}

#[tokio::test]
async fn test_login_failure_surfaces_generic_message() {
    let (base_url, _) = spawn_server().await;
    let client = ApiClient::new(base_url, SessionStore::new()).unwrap();

    let result = client.login("bob@example.com", "Whatever1!").await;

    match result {
        Err(ClientError::Rejected { messages }) => {
            assert_eq!(messages, vec!["Email or password incorrect".to_string()]);
        }
        other => panic!("expected rejection, got {:?}", other.map(|_| ())),
    }
}

#[tokio::test]
async fn test_register_failure_lists_validation_messages() {
    let (base_url, _) = spawn_server().await;
    let client = ApiClient::new(base_url, SessionStore::new()).unwrap();

    let result = client.register("not-an-email", "weak").await;

    match result {
        Err(ClientError::Rejected { messages }) => {
            assert!(messages.iter().any(|m| m.contains("Email address")));
            assert!(messages.iter().any(|m| m.contains("8 characters")));
        }
        other => panic!("expected rejection, got {:?}", other.map(|_| ())),
    }
}

#[tokio::test]
async fn test_bearer_attachment_against_protected_route() {
    let (base_url, state) = spawn_server().await;
    let store = SessionStore::new();
    let client = ApiClient::new(base_url, store.clone()).unwrap();

    // Provision the editor account the deployment would seed
    let password_hash = crypto::hash_password("Admin@123").unwrap();
    ensure_seed_user(state.store.as_ref(), "editor@example.com", &password_hash)
        .await
        .unwrap();

    let session = client.login("editor@example.com", "Admin@123").await.unwrap();
    assert_eq!(session.roles, vec![Role::Reader, Role::Writer]);

    // Attached credential passes the Writer gate
    let created = client
        .request(reqwest::Method::POST, "/api/posts")
        .send()
        .await
        .unwrap();
    assert_eq!(created.status(), reqwest::StatusCode::OK);

    // After logout the attacher is a no-op and the server rejects the call
    client.logout();
    let rejected = client
        .request(reqwest::Method::POST, "/api/posts")
        .send()
        .await
        .unwrap();
    assert_eq!(rejected.status(), reqwest::StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_reader_credential_is_forbidden_on_writer_route() {
    let (base_url, _) = spawn_server().await;
    let client = ApiClient::new(base_url, SessionStore::new()).unwrap();

    client
        .register("alice@example.com", "Secret123!")
        .await
        .unwrap();
    client.login("alice@example.com", "Secret123!").await.unwrap();

    let response = client
        .request(reqwest::Method::POST, "/api/posts")
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), reqwest::StatusCode::FORBIDDEN);
}
