use sqlx::mysql::MySqlPoolOptions;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use trip_server::core::{AppState, Config, encode_jwt};
use trip_server::create_router;
use trip_server::notifications::NotificationHub;
use trip_server::repositories::{MemoryStore, MySqlStore, UnitOfWork};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Inizializza il logging (RUST_LOG sovrascrive il default)
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,trip_server=debug")),
        )
        .init();

    // Inizializza la configurazione
    let config = Config::from_env()?;
    config.print_info();

    match &config.database_url {
        Some(url) => {
            let pool = MySqlPoolOptions::new()
                .max_connections(config.max_connections)
                .connect(url)
                .await?;
            sqlx::migrate!("./migrations").run(&pool).await?;
            info!("Database migrations applied");
            serve(MySqlStore::new(pool), &config).await
        }
        None => {
            warn!("DATABASE_URL not set, using the in-memory store");
            let store = seed_dev_store(&config).await?;
            serve(store, &config).await
        }
    }
}

/// Carica `DEV_USERS` nello store in memoria e stampa un token per ciascuno,
/// altrimenti nessuna route autenticata sarebbe raggiungibile
async fn seed_dev_store(config: &Config) -> Result<MemoryStore, Box<dyn std::error::Error>> {
    let store = MemoryStore::new();
    if config.dev_users.is_empty() {
        warn!("DEV_USERS is empty, every authenticated request will be rejected");
    }
    store.seed_dev_users(&config.dev_users).await;
    for user in &config.dev_users {
        let token = encode_jwt(user.username.clone(), user.user_id, &config.jwt_secret)?;
        info!(user_id = user.user_id, username = %user.username, "Dev user token: {}", token);
    }
    Ok(store)
}

async fn serve<U: UnitOfWork>(store: U, config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    let state = Arc::new(AppState::from_config(store, config));

    let app = create_router(state.clone())
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let listener = TcpListener::bind((config.server_host.as_str(), config.server_port)).await?;
    info!("Server listening on http://{}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(state.notifications.clone()))
        .await?;

    info!("Server stopped");
    Ok(())
}

/// Ctrl+C: chiude gli stream SSE aperti, altrimenti lo shutdown resterebbe in attesa
async fn shutdown_signal(notifications: Arc<NotificationHub>) {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
    notifications.close();
}
