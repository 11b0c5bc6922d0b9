use axum::middleware::from_fn_with_state;
use axum::routing::{post, put};
use axum::{Router, routing::get};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use super::handlers::{employers, jobs, probes, seekers};
use super::middlewares::ready;
use super::state::AppState;

pub fn build_routes(state: AppState) -> Router {
    Router::new()
        .route("/register-employer", post(employers::register))
        .route("/update-employer", put(employers::update))
        .route("/register-job-seeker", post(seekers::register))
        .route("/update-job-seeker", put(seekers::update))
        .route("/post-job", post(jobs::post))
        .route("/apply-job", post(jobs::apply))
        .route("/job-applications/{job_id}", get(jobs::applications))
        .route("/my-applications", get(jobs::mine))
        .layer(from_fn_with_state(state.clone(), ready::require_ready))
        .route("/healthz", get(probes::healthz))
        .route("/livez", get(probes::livez))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
