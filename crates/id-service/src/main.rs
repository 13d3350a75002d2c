mod config;
mod crypto;
mod errors;
mod handlers;
mod middleware;
mod models;
mod routes;
mod services;
mod store;

use config::{Config, StoreKind};
use handlers::AppState;
use secrecy::ExposeSecret;
use services::token_service::TokenIssuer;
use std::net::SocketAddr;
use std::sync::Arc;
use store::{CredentialStore, MemoryCredentialStore, PgCredentialStore};
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "id_service=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Identity Controller");

    // Load configuration
    let config = Config::from_env().map_err(|e| {
        error!("Failed to load configuration: {}", e);
        e
    })?;

    info!("Configuration loaded successfully");

    // Construct the credential store
    let credential_store: Arc<dyn CredentialStore> = match config.store_kind {
        StoreKind::Postgres => {
            let database_url = config
                .database_url
                .as_deref()
                .ok_or("DATABASE_URL is required for the postgres store")?;

            info!("Connecting to database...");
            let db_pool = sqlx::postgres::PgPoolOptions::new()
                .max_connections(5)
                .connect(database_url)
                .await
                .map_err(|e| {
                    error!("Failed to connect to database: {}", e);
                    e
                })?;
            info!("Database connection established");

            Arc::new(PgCredentialStore::new(db_pool))
        }
        StoreKind::Memory => {
            info!("Using in-memory credential store (development mode)");
            Arc::new(MemoryCredentialStore::new())
        }
    };

    // Seed the provisioned editor account, if configured
    if let Some(seed) = &config.seed_editor {
        let password_hash = crypto::hash_password(seed.password.expose_secret())?;
        store::ensure_seed_user(credential_store.as_ref(), &seed.email, &password_hash)
            .await
            .map_err(|e| {
                error!("Failed to seed editor account: {}", e);
                e
            })?;
    }

    // Parse bind address before moving config
    let bind_address = config.bind_address.clone();

    // Create application state
    let issuer = TokenIssuer::new(config.token)?;
    let state = Arc::new(AppState {
        store: credential_store,
        issuer,
    });

    // Build application routes
    let app = routes::build_routes(state);

    let addr: SocketAddr = bind_address.parse().map_err(|e| {
        error!("Invalid bind address: {}", e);
        e
    })?;

    info!("Identity Controller listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
