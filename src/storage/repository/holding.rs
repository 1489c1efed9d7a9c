use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::{PgPool, Postgres, Transaction};
use tracing::debug;

use crate::storage::{
    models::{
        holding::{Holding, HoldingUpsert, HoldingUpsertOutcome, HoldingWithStock},
        stock::Stock,
    },
    repository::DbExecutor,
};

/// 持倉儲存庫特性
#[async_trait]
pub trait HoldingRepository: Send + Sync {
    /// 在單一交易內更新股票主檔並累加或建立持倉
    ///
    /// 任一步驟失敗時整筆交易回滾，不會留下只建了股票主檔的狀態。
    async fn upsert_holding(&self, upsert: &HoldingUpsert) -> Result<HoldingUpsertOutcome>;

    /// 刪除指定投資組合下的持倉，回傳是否有刪除
    async fn remove_holding(&self, portfolio_id: i32, holding_id: i32) -> Result<bool>;

    /// 投資組合持倉及其股票資訊，依代號排序
    async fn get_holdings_with_stock(&self, portfolio_id: i32) -> Result<Vec<HoldingWithStock>>;

    /// 投資組合市值 SUM(shares * price)，價格為空的持倉不計
    async fn get_portfolio_value(&self, portfolio_id: i32) -> Result<f64>;

    async fn get_stock_by_ticker(&self, ticker: &str) -> Result<Option<Stock>>;
}

/// 帶有「是否為新插入」旗標的股票列
#[derive(sqlx::FromRow)]
struct StockUpsertRow {
    #[sqlx(flatten)]
    stock: Stock,
    inserted: bool,
}

/// 帶有「是否為新插入」旗標的持倉列
#[derive(sqlx::FromRow)]
struct HoldingUpsertRow {
    #[sqlx(flatten)]
    holding: Holding,
    inserted: bool,
}

/// PostgreSQL 持倉儲存庫實現
pub struct PgHoldingRepository {
    pool: PgPool,
    lock_timeout: Option<Duration>,
}

impl PgHoldingRepository {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool,
            lock_timeout: None,
        }
    }

    /// 設定持倉行鎖的等待上限，逾時視為交易失敗
    pub fn with_lock_timeout(mut self, lock_timeout: Option<Duration>) -> Self {
        self.lock_timeout = lock_timeout;
        self
    }

    /// 取得股票主檔，不存在時以本次報價建立
    ///
    /// 已存在的列只讀取不鎖定，價格留待交易結尾再寫入。
    async fn ensure_stock(
        tx: &mut Transaction<'_, Postgres>,
        upsert: &HoldingUpsert,
    ) -> Result<StockUpsertRow> {
        let inserted = sqlx::query_as::<_, StockUpsertRow>(
            r#"
            INSERT INTO stock (ticker_symbol, company_name, price, price_updated_at)
            VALUES ($1, $2, $3, now())
            ON CONFLICT (ticker_symbol) DO NOTHING
            RETURNING stock_id, ticker_symbol, company_name, price, price_updated_at,
                      true AS inserted
            "#,
        )
        .bind(upsert.ticker.as_str())
        .bind(&upsert.company_name)
        .bind(upsert.price)
        .fetch_optional(&mut **tx)
        .await
        .with_context(|| format!("建立股票主檔失敗: {}", upsert.ticker))?;

        if let Some(row) = inserted {
            return Ok(row);
        }

        sqlx::query_as::<_, StockUpsertRow>(
            "SELECT stock_id, ticker_symbol, company_name, price, price_updated_at,
                    false AS inserted
             FROM stock WHERE ticker_symbol = $1",
        )
        .bind(upsert.ticker.as_str())
        .fetch_one(&mut **tx)
        .await
        .with_context(|| format!("讀取股票主檔失敗: {}", upsert.ticker))
    }

    /// 更新共用股票的最新價格（保留原名稱）
    ///
    /// 另一筆交易正在寫入同一檔股票的價格時略過本次寫入，
    /// 因此不同持倉組合之間不會互相等待股票列鎖。
    async fn refresh_stock_price(
        tx: &mut Transaction<'_, Postgres>,
        stock: Stock,
        price: f64,
    ) -> Result<Stock> {
        let updated = sqlx::query_as::<_, Stock>(
            r#"
            UPDATE stock SET price = $2, price_updated_at = now()
            WHERE stock_id = (
                SELECT stock_id FROM stock WHERE stock_id = $1
                FOR NO KEY UPDATE SKIP LOCKED
            )
            RETURNING stock_id, ticker_symbol, company_name, price, price_updated_at
            "#,
        )
        .bind(stock.stock_id)
        .bind(price)
        .fetch_optional(&mut **tx)
        .await
        .with_context(|| format!("更新股票價格失敗: {}", stock.ticker_symbol))?;

        match updated {
            Some(stock) => Ok(stock),
            None => {
                debug!(ticker = %stock.ticker_symbol, "股票價格正由其他交易寫入，略過");
                Ok(stock)
            }
        }
    }

    /// 鎖定 (portfolio_id, stock_id) 持倉後決定累加或新增
    async fn upsert_locked_holding(
        tx: &mut Transaction<'_, Postgres>,
        portfolio_id: i32,
        stock_id: i32,
        shares: i32,
    ) -> Result<HoldingUpsertRow> {
        let existing = sqlx::query_as::<_, Holding>(
            "SELECT holding_id, portfolio_id, stock_id, shares FROM portfolio_holding
             WHERE portfolio_id = $1 AND stock_id = $2
             FOR UPDATE",
        )
        .bind(portfolio_id)
        .bind(stock_id)
        .fetch_optional(&mut **tx)
        .await
        .context("鎖定持倉失敗")?;

        let row = match existing {
            Some(holding) => {
                let holding = sqlx::query_as::<_, Holding>(
                    "UPDATE portfolio_holding SET shares = shares + $1
                     WHERE holding_id = $2
                     RETURNING holding_id, portfolio_id, stock_id, shares",
                )
                .bind(shares)
                .bind(holding.holding_id)
                .fetch_one(&mut **tx)
                .await
                .context("累加持股失敗")?;

                HoldingUpsertRow {
                    holding,
                    inserted: false,
                }
            }
            // 無列可鎖時，同一組合可能正被另一筆交易首次插入；
            // ON CONFLICT 會等待對方結束後改為累加，不會產生重複持倉
            None => sqlx::query_as::<_, HoldingUpsertRow>(
                r#"
                INSERT INTO portfolio_holding (portfolio_id, stock_id, shares)
                VALUES ($1, $2, $3)
                ON CONFLICT ON CONSTRAINT uq_portfolio_holding_pair DO UPDATE
                    SET shares = portfolio_holding.shares + EXCLUDED.shares
                RETURNING holding_id, portfolio_id, stock_id, shares, (xmax = 0) AS inserted
                "#,
            )
            .bind(portfolio_id)
            .bind(stock_id)
            .bind(shares)
            .fetch_one(&mut **tx)
            .await
            .context("新增持倉失敗")?,
        };

        Ok(row)
    }
}

impl DbExecutor for PgHoldingRepository {
    fn get_pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl HoldingRepository for PgHoldingRepository {
    async fn upsert_holding(&self, upsert: &HoldingUpsert) -> Result<HoldingUpsertOutcome> {
        let mut tx = self.get_pool().begin().await.context("無法開始交易")?;

        if let Some(timeout) = self.lock_timeout {
            // SET 不支援參數綁定，毫秒數為整數可直接格式化
            sqlx::query(&format!("SET LOCAL lock_timeout = '{}ms'", timeout.as_millis()))
                .execute(&mut *tx)
                .await?;
        }

        let stock_row = Self::ensure_stock(&mut tx, upsert).await?;
        let holding_row = Self::upsert_locked_holding(
            &mut tx,
            upsert.portfolio_id,
            stock_row.stock.stock_id,
            upsert.shares.get(),
        )
        .await?;

        // 股票列鎖只保留到提交為止
        let stock = if stock_row.inserted {
            stock_row.stock
        } else {
            Self::refresh_stock_price(&mut tx, stock_row.stock, upsert.price).await?
        };

        tx.commit().await.context("提交交易失敗")?;

        debug!(
            portfolio_id = upsert.portfolio_id,
            ticker = %upsert.ticker,
            shares = holding_row.holding.shares,
            "持倉更新完成"
        );

        Ok(HoldingUpsertOutcome {
            holding: holding_row.holding,
            stock,
            stock_created: stock_row.inserted,
            holding_created: holding_row.inserted,
        })
    }

    async fn remove_holding(&self, portfolio_id: i32, holding_id: i32) -> Result<bool> {
        let result = sqlx::query(
            "DELETE FROM portfolio_holding WHERE holding_id = $1 AND portfolio_id = $2",
        )
        .bind(holding_id)
        .bind(portfolio_id)
        .execute(self.get_pool())
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn get_holdings_with_stock(&self, portfolio_id: i32) -> Result<Vec<HoldingWithStock>> {
        let holdings = sqlx::query_as::<_, HoldingWithStock>(
            "SELECT ph.holding_id, ph.portfolio_id, ph.stock_id, ph.shares,
                    s.ticker_symbol, s.company_name, s.price
             FROM portfolio_holding ph
             JOIN stock s ON ph.stock_id = s.stock_id
             WHERE ph.portfolio_id = $1
             ORDER BY s.ticker_symbol",
        )
        .bind(portfolio_id)
        .fetch_all(self.get_pool())
        .await?;

        Ok(holdings)
    }

    async fn get_portfolio_value(&self, portfolio_id: i32) -> Result<f64> {
        let total = sqlx::query_scalar::<_, f64>(
            "SELECT COALESCE(SUM(ph.shares * s.price), 0)::DOUBLE PRECISION
             FROM portfolio_holding ph
             JOIN stock s ON ph.stock_id = s.stock_id
             WHERE ph.portfolio_id = $1",
        )
        .bind(portfolio_id)
        .fetch_one(self.get_pool())
        .await?;

        Ok(total)
    }

    async fn get_stock_by_ticker(&self, ticker: &str) -> Result<Option<Stock>> {
        let stock = sqlx::query_as::<_, Stock>(
            "SELECT stock_id, ticker_symbol, company_name, price, price_updated_at
             FROM stock WHERE ticker_symbol = $1",
        )
        .bind(ticker)
        .fetch_optional(self.get_pool())
        .await?;

        Ok(stock)
    }
}
