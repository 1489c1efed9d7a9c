use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::api::{error::ApiResult, state::AppState};
use crate::storage::{IndexConstituent, IndexConstituentInsert};

#[derive(Debug, Default, Deserialize)]
pub struct ConstituentQuery {
    pub sector: Option<String>,
    pub industry: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ReplaceConstituentsResponse {
    pub count: usize,
    pub loaded_at: Option<DateTime<Utc>>,
}

pub async fn list_constituents(
    State(state): State<AppState>,
    Query(query): Query<ConstituentQuery>,
) -> ApiResult<Json<Vec<IndexConstituent>>> {
    let rows = state
        .service
        .list_constituents(query.sector.as_deref(), query.industry.as_deref())
        .await?;
    Ok(Json(rows))
}

pub async fn replace_constituents(
    State(state): State<AppState>,
    payload: Result<Json<Vec<IndexConstituentInsert>>, JsonRejection>,
) -> ApiResult<Json<ReplaceConstituentsResponse>> {
    let Json(rows) = payload?;
    let snapshot = state.service.replace_constituents(rows).await?;
    Ok(Json(ReplaceConstituentsResponse {
        count: snapshot.len(),
        loaded_at: snapshot.loaded_at(),
    }))
}

pub async fn get_constituent(
    State(state): State<AppState>,
    Path(ticker): Path<String>,
) -> ApiResult<Json<IndexConstituent>> {
    Ok(Json(state.service.lookup_constituent(&ticker)?))
}
