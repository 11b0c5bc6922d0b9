use axum::{Json, extract::State};
use serde_json::{Value, json};

use crate::{pkg::server::state::AppState, prelude::Result};

pub async fn livez() -> Result<()> {
    tracing::debug!("service is live");
    Ok(())
}

pub async fn healthz(State(state): State<AppState>) -> Result<Json<Value>> {
    let contract = state.contract()?;
    tracing::debug!("service is healthy");
    Ok(Json(json!({
        "status": "ready",
        "account": contract.sender(),
    })))
}
