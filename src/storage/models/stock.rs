use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// 股票主檔模型，每個代號一筆，所有投資組合共用
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Stock {
    pub stock_id: i32,
    pub ticker_symbol: String,
    pub company_name: String,
    pub price: Option<f64>,
    pub price_updated_at: DateTime<Utc>,
}
