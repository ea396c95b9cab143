use dashboard_portal::{
    AppState,
    config::{AppConfig, Env},
    create_router,
};
use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// main
///
/// Loads configuration, installs logging, wires the shared state and serves
/// the dashboard.
#[tokio::main]
async fn main() {
    // 1. Configuration (fail-fast on missing production secrets)
    dotenv::dotenv().ok();
    let config = AppConfig::load();

    // 2. Logging filter: RUST_LOG wins, otherwise sensible local defaults.
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "dashboard_portal=debug,tower_http=info,axum=trace".into());

    // 3. Pretty logs locally, JSON in production.
    match config.env {
        Env::Local => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().pretty())
                .init();
        }
        Env::Production => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        }
    }

    tracing::info!("Dashboard starting in {:?} mode", config.env);
    tracing::info!(
        api = %config.api_base_url,
        protected = ?config.protected_prefixes,
        sign_in = %config.sign_in_path,
        "route guard configured"
    );

    let bind_addr = config.bind_addr.clone();

    // 4. Shared state
    let app_state = AppState::from_config(config).expect("FATAL: Failed to build HTTP client.");

    // 5. Router and server
    let app = create_router(app_state);
    let listener = TcpListener::bind(&bind_addr)
        .await
        .expect("FATAL: Failed to bind listen address. Check BIND_ADDR.");

    tracing::info!("Listening on {}", bind_addr);
    tracing::info!("API Documentation (Swagger UI) available at /swagger-ui");

    axum::serve(listener, app).await.unwrap();
}
