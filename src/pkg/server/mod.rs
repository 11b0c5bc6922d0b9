pub mod handlers;
pub mod middlewares;
pub mod router;
pub mod state;

use std::sync::Arc;

use crate::{conf::Settings, prelude::Result};
use router::build_routes;
use state::AppState;

pub async fn listen(settings: Settings) -> Result<()> {
    let settings = Arc::new(settings);
    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", settings.port)).await?;
    tracing::info!("Listening at port {}", settings.port);
    // Account resolution runs behind the listener; relay routes answer 503 until it settles.
    let state = AppState::new(settings);
    tokio::select! {
        r = axum::serve(listener, build_routes(state)) => {
            tracing::warn!("server ended unexpectedly: {:?}", &r)
        },
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("received ctrl+c interrupt, closing server");
        }
    }
    Ok(())
}
