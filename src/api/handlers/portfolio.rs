use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::api::{error::ApiResult, state::AppState};
use crate::portfolio::{PortfolioDetail, PortfolioInput};
use crate::storage::{HoldingUpsertOutcome, Page, PageQuery, Portfolio};

#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    pub page: Option<i64>,
    pub page_size: Option<i64>,
}

impl ListQuery {
    fn page_query(&self) -> PageQuery {
        let default = PageQuery::default();
        PageQuery::new(
            self.page.unwrap_or(default.page),
            self.page_size.unwrap_or(default.page_size),
        )
    }
}

/// 新增持股請求
///
/// `shares` 可為字串或數字，其他型別與缺漏皆視為未輸入。
#[derive(Debug, Deserialize)]
pub struct AddStockRequest {
    pub ticker: String,
    #[serde(default)]
    pub shares: Option<Value>,
}

impl AddStockRequest {
    /// 股數的文字形式，數字 `2.5` 會成為 "2.5"，後續轉換為 1
    pub fn shares_text(&self) -> Option<String> {
        match self.shares.as_ref()? {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PortfolioValueResponse {
    pub portfolio_id: i32,
    pub total_value: f64,
}

pub async fn list_portfolios(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> ApiResult<Json<Page<Portfolio>>> {
    let page = state.service.list_portfolios(query.page_query()).await?;
    Ok(Json(page))
}

pub async fn create_portfolio(
    State(state): State<AppState>,
    payload: Result<Json<PortfolioInput>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<Portfolio>)> {
    let Json(input) = payload?;
    let portfolio = state.service.create_portfolio(&input).await?;
    Ok((StatusCode::CREATED, Json(portfolio)))
}

pub async fn get_portfolio(
    State(state): State<AppState>,
    Path(portfolio_id): Path<i32>,
) -> ApiResult<Json<PortfolioDetail>> {
    let detail = state.service.portfolio_detail(portfolio_id).await?;
    Ok(Json(detail))
}

pub async fn update_portfolio(
    State(state): State<AppState>,
    Path(portfolio_id): Path<i32>,
    payload: Result<Json<PortfolioInput>, JsonRejection>,
) -> ApiResult<Json<Portfolio>> {
    let Json(input) = payload?;
    let portfolio = state.service.update_portfolio(portfolio_id, &input).await?;
    Ok(Json(portfolio))
}

pub async fn delete_portfolio(
    State(state): State<AppState>,
    Path(portfolio_id): Path<i32>,
) -> ApiResult<StatusCode> {
    state.service.delete_portfolio(portfolio_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// 新建持倉回 201，累加既有持倉回 200
pub async fn add_stock(
    State(state): State<AppState>,
    Path(portfolio_id): Path<i32>,
    payload: Result<Json<AddStockRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<HoldingUpsertOutcome>)> {
    let Json(request) = payload?;
    let shares = request.shares_text();

    let outcome = state
        .service
        .add_stock(portfolio_id, &request.ticker, shares.as_deref())
        .await?;

    let status = if outcome.holding_created {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };
    Ok((status, Json(outcome)))
}

pub async fn remove_holding(
    State(state): State<AppState>,
    Path((portfolio_id, holding_id)): Path<(i32, i32)>,
) -> ApiResult<StatusCode> {
    state.service.remove_holding(portfolio_id, holding_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn portfolio_value(
    State(state): State<AppState>,
    Path(portfolio_id): Path<i32>,
) -> ApiResult<Json<PortfolioValueResponse>> {
    let total_value = state.service.portfolio_value(portfolio_id).await?;
    Ok(Json(PortfolioValueResponse {
        portfolio_id,
        total_value,
    }))
}
