//! Inki Server Binary
//!
//! Runs the Inki HTTP server for signed SSH key distribution.

use std::env;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use inki_server::{
    create_router, spawn_expiry_sweeper, AppState, ConfigResolver, KeyRegistry, ServerConfig,
};

#[tokio::main]
async fn main() {
    // Initialize logging
    let log_level = env::var("INKI_LOG_LEVEL")
        .unwrap_or_else(|_| "info".into())
        .parse()
        .unwrap_or(Level::INFO);

    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(true)
        .with_thread_ids(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .expect("Failed to set tracing subscriber");

    // Configuration
    let config_path = env::var("INKI_CONFIG").ok();
    let mut config = ServerConfig::load_or_default(config_path.as_deref())
        .expect("Failed to load configuration");

    if let Ok(port) = env::var("INKI_PORT") {
        config.port = port.parse().expect("INKI_PORT must be a valid port number");
    }

    let registry = Arc::new(KeyRegistry::new());
    let resolver = Arc::new(ConfigResolver::new(&config));

    let _sweeper = config.sweep_interval_secs.map(|secs| {
        info!(interval_secs = secs, "Starting expired key sweeper");
        spawn_expiry_sweeper(Arc::clone(&registry), Duration::from_secs(secs.max(1)))
    });

    info!(
        port = config.port,
        users = config.users.len(),
        "Starting Inki server"
    );

    let state = Arc::new(AppState::new(resolver, registry));
    let app = create_router(state);

    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .expect("Failed to bind to address");

    info!(addr = %addr, "Inki server listening");

    axum::serve(listener, app)
        .await
        .expect("Server error");
}
