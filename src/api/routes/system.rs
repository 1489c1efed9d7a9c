// src/api/routes/system.rs
use axum::{routing::get, Router};

use crate::api::handlers::system;
use crate::api::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new().route("/system/health", get(system::health))
}
