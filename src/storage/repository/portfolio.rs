use anyhow::Result;
use async_trait::async_trait;
use sqlx::PgPool;

use crate::storage::{
    models::portfolio::{Portfolio, PortfolioInsert},
    repository::{DbExecutor, Page, PageQuery},
};

/// 投資組合儲存庫特性
#[async_trait]
pub trait PortfolioRepository: Send + Sync {
    async fn get_portfolio_by_id(&self, portfolio_id: i32) -> Result<Option<Portfolio>>;
    async fn get_portfolios(&self, page: PageQuery) -> Result<Page<Portfolio>>;
    async fn insert_portfolio(&self, portfolio: &PortfolioInsert) -> Result<Portfolio>;
    /// 更新名稱與描述，投資組合不存在時回傳 None
    async fn update_portfolio(
        &self,
        portfolio_id: i32,
        portfolio: &PortfolioInsert,
    ) -> Result<Option<Portfolio>>;
    /// 連同持倉一起刪除，回傳是否有刪除
    async fn delete_portfolio(&self, portfolio_id: i32) -> Result<bool>;
}

/// PostgreSQL 投資組合儲存庫實現
pub struct PgPortfolioRepository {
    pool: PgPool,
}

impl PgPortfolioRepository {
    /// 創建新的 PostgreSQL 投資組合儲存庫實例
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

impl DbExecutor for PgPortfolioRepository {
    fn get_pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl PortfolioRepository for PgPortfolioRepository {
    async fn get_portfolio_by_id(&self, portfolio_id: i32) -> Result<Option<Portfolio>> {
        let portfolio = sqlx::query_as::<_, Portfolio>(
            "SELECT portfolio_id, name, description FROM portfolio WHERE portfolio_id = $1",
        )
        .bind(portfolio_id)
        .fetch_optional(self.get_pool())
        .await?;

        Ok(portfolio)
    }

    async fn get_portfolios(&self, page: PageQuery) -> Result<Page<Portfolio>> {
        let portfolios = sqlx::query_as::<_, Portfolio>(
            "SELECT portfolio_id, name, description FROM portfolio
             ORDER BY portfolio_id
             LIMIT $1 OFFSET $2",
        )
        .bind(page.page_size)
        .bind(page.offset())
        .fetch_all(self.get_pool())
        .await?;

        let total = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM portfolio")
            .fetch_one(self.get_pool())
            .await?;

        Ok(Page::new(portfolios, total, page.page, page.page_size))
    }

    async fn insert_portfolio(&self, portfolio: &PortfolioInsert) -> Result<Portfolio> {
        let created = sqlx::query_as::<_, Portfolio>(
            "INSERT INTO portfolio (name, description) VALUES ($1, $2)
             RETURNING portfolio_id, name, description",
        )
        .bind(&portfolio.name)
        .bind(&portfolio.description)
        .fetch_one(self.get_pool())
        .await?;

        Ok(created)
    }

    async fn update_portfolio(
        &self,
        portfolio_id: i32,
        portfolio: &PortfolioInsert,
    ) -> Result<Option<Portfolio>> {
        let updated = sqlx::query_as::<_, Portfolio>(
            "UPDATE portfolio SET name = $1, description = $2
             WHERE portfolio_id = $3
             RETURNING portfolio_id, name, description",
        )
        .bind(&portfolio.name)
        .bind(&portfolio.description)
        .bind(portfolio_id)
        .fetch_optional(self.get_pool())
        .await?;

        Ok(updated)
    }

    async fn delete_portfolio(&self, portfolio_id: i32) -> Result<bool> {
        let mut tx = self.get_pool().begin().await?;

        // 先刪持倉，股票主檔保留給其他投資組合
        sqlx::query("DELETE FROM portfolio_holding WHERE portfolio_id = $1")
            .bind(portfolio_id)
            .execute(&mut *tx)
            .await?;

        let result = sqlx::query("DELETE FROM portfolio WHERE portfolio_id = $1")
            .bind(portfolio_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(result.rows_affected() > 0)
    }
}
