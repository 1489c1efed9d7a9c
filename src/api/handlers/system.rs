use axum::{extract::State, http::StatusCode, Json};
use serde::{Deserialize, Serialize};

use crate::api::state::AppState;
use crate::config::StorageBackend;
use crate::storage::database;

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub storage: StorageBackend,
    pub constituents: usize,
}

/// 資料庫無法連線時回 503
pub async fn health(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    let storage_ok = match &state.db_pool {
        Some(pool) => database::health_check(pool).await,
        None => true,
    };

    let (status, label) = if storage_ok {
        (StatusCode::OK, "ok")
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, "degraded")
    };

    let health_response = HealthResponse {
        status: label.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        storage: state.backend,
        constituents: state.service.constituent_cache().snapshot().len(),
    };

    (status, Json(health_response))
}
