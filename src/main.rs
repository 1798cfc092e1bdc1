use std::sync::Arc;

use anyhow::Context;
use axum::Router;
use tokio::net::TcpListener;

use reviewbot::core::config::AppPaths;
use reviewbot::core::logging;
use reviewbot::server;
use reviewbot::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let paths = Arc::new(AppPaths::new());
    logging::init(&paths, true).context("Failed to install logging")?;

    let state = AppState::initialize(paths).await?;
    state.spawn_index_warmup();
    state.spawn_session_sweeper();

    let bind_addr = format!("{}:{}", state.settings.server.host, state.settings.server.port);
    let listener = TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("Failed to bind to {}", bind_addr))?;
    let addr = listener.local_addr()?;

    println!("REVIEWBOT_PORT={}", addr.port());
    tracing::info!("Listening on {}", addr);

    let app: Router = server::router::router(state.clone());

    axum::serve(listener, app).await.context("Server error")?;

    Ok(())
}
