mod action;
mod config;
mod db;
mod frame;
mod routes;
mod services;
mod state;

use std::sync::Arc;

use services::users::{MemoryUserStore, PgUserStore, UserStore};

#[tokio::main]
async fn main() {
    let _ = dotenvy::dotenv();
    tracing_subscriber::fmt::init();

    let config = config::Config::from_env().expect("invalid configuration");

    // Users persist only when a database is configured.
    let users: Arc<dyn UserStore> = match &config.database_url {
        Some(url) => {
            let pool = db::init_pool(url, config.db_max_connections)
                .await
                .expect("database init failed");
            tracing::info!(max_connections = config.db_max_connections, "user store: postgres");
            Arc::new(PgUserStore::new(pool))
        }
        None => {
            tracing::warn!("DATABASE_URL not set, users are kept in memory");
            Arc::new(MemoryUserStore::new())
        }
    };

    let port = config.port;
    let state = state::AppState::new(config, users);

    let app = routes::app(state);
    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{port}"))
        .await
        .expect("failed to bind");

    tracing::info!(%port, "syncedvideo listening");
    axum::serve(listener, app).await.expect("server failed");
}
