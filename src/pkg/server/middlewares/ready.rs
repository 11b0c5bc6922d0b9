use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};

use crate::{pkg::server::state::AppState, prelude::Result};

/// Refuse relay requests until the contract client is ready, then hand the
/// client to the handler as an extension.
pub async fn require_ready(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response> {
    let contract = state.contract()?;
    request.extensions_mut().insert(contract);
    Ok(next.run(request).await)
}
