//! Pitlane observer server.
//!
//! Serves the observer page at `/`, a health probe at `/health` and the
//! command/event WebSocket at `/ws`. Every WebSocket connection gets its own
//! event conduit and command dispatcher; see [`ws`].

pub mod config;
pub mod error;
pub mod routes;
pub mod ws;

pub use config::ServerConfig;
pub use error::ServerError;
pub use routes::{router, AppState};

use pitlane_core::CancellationToken;
use tokio::net::TcpListener;
use tracing::info;

/// Bind `config.bind` and serve until `shutdown` is cancelled.
pub async fn serve(config: &ServerConfig, shutdown: CancellationToken) -> Result<(), ServerError> {
    config.validate()?;
    let listener = TcpListener::bind(config.bind)
        .await
        .map_err(|source| ServerError::Bind {
            addr: config.bind,
            source,
        })?;

    let state = AppState::new(config.sim_env(), config.sink_capacity, shutdown);
    serve_on(listener, state).await
}

/// Serve on an already bound listener until the state's shutdown token is
/// cancelled. Open connections cancel their runs and close.
pub async fn serve_on(listener: TcpListener, state: AppState) -> Result<(), ServerError> {
    let addr = listener.local_addr().map_err(ServerError::Serve)?;
    info!(%addr, "Listening");

    let shutdown = state.shutdown.clone();
    axum::serve(listener, router(state))
        .with_graceful_shutdown(async move { shutdown.cancelled().await })
        .await
        .map_err(ServerError::Serve)?;

    info!("Server stopped");
    Ok(())
}
