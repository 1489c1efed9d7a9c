use serde::{Deserialize, Serialize};

use crate::domain_types::{ShareCount, Ticker};
use crate::storage::models::stock::Stock;

/// 投資組合持倉模型
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Holding {
    pub holding_id: i32,
    pub portfolio_id: i32,
    pub stock_id: i32,
    pub shares: i32,
}

/// 持倉加上股票資訊，供明細與估值使用
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct HoldingWithStock {
    pub holding_id: i32,
    pub portfolio_id: i32,
    pub stock_id: i32,
    pub shares: i32,
    pub ticker_symbol: String,
    pub company_name: String,
    pub price: Option<f64>,
}

impl HoldingWithStock {
    /// 持倉市值，價格未知時為 0
    pub fn market_value(&self) -> f64 {
        f64::from(self.shares) * self.price.unwrap_or(0.0)
    }
}

/// 新增持股請求，代號與行情皆已由呼叫端解析完成
#[derive(Debug, Clone, PartialEq)]
pub struct HoldingUpsert {
    pub portfolio_id: i32,
    pub ticker: Ticker,
    pub shares: ShareCount,
    pub company_name: String,
    pub price: f64,
}

/// 新增持股的結果
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HoldingUpsertOutcome {
    pub holding: Holding,
    pub stock: Stock,
    /// 本次交易是否新建了股票主檔
    pub stock_created: bool,
    /// 本次交易是否新建了持倉（否則為累加股數）
    pub holding_created: bool,
}
