use serde::{Deserialize, Serialize};

/// 投資組合模型
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Portfolio {
    pub portfolio_id: i32,
    pub name: String,
    pub description: Option<String>,
}

/// 投資組合插入與更新模型
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortfolioInsert {
    pub name: String,
    pub description: Option<String>,
}
