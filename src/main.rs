use std::net::SocketAddr;
use std::sync::Arc;

use tower_http::trace::TraceLayer;
use tracing::info;
use tracing_subscriber::EnvFilter;

use places_server::config::Config;
use places_server::routes;
use places_server::state::AppState;
use places_server::store;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("info".parse()?))
        .init();

    info!("places-server starting");

    let config = Config::from_env()?;
    let store = store::from_config(&config)?;
    info!(backend = ?config.backend, "Store backend ready");

    let state = Arc::new(AppState::new(store, &config));
    let app = routes::build_router(state).layer(TraceLayer::new_for_http());

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(port = config.port, "Listening on http://{}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
