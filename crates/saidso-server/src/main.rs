//! Saidso Server — application entry point.

use std::net::SocketAddr;

use saidso_db::DbManager;
use saidso_server::config::ServerConfig;
use saidso_server::state::AppState;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "saidso=info,tower_http=info".into()),
        )
        .init();

    let config = ServerConfig::from_env();

    let db = DbManager::connect(&config.db)
        .await
        .expect("failed to connect to SurrealDB");
    saidso_db::run_migrations(db.client())
        .await
        .expect("failed to run migrations");

    let state = AppState::build(&db, &config);
    let app = saidso_server::app(state)
        .into_make_service_with_connect_info::<SocketAddr>();

    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .expect("failed to bind listener");
    tracing::info!(addr = %addr, "listening");

    axum::serve(listener, app).await.expect("server error");
}
