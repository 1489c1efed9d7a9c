//! 記憶體儲存後端
//!
//! 以單一非同步互斥鎖包住所有資料表，每個操作從取得鎖到寫回都是一個完整交易，
//! 多步驟操作先在區域變數中暫存變更，全部成功後才寫回，失敗時不留下部分狀態。
//! 約束（代號唯一、持倉組合唯一、外鍵、股數 >= 1）與 Postgres 結構一致。

use std::collections::{BTreeMap, HashSet};

use anyhow::{anyhow, bail, Result};
use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::Mutex;

use crate::storage::models::{
    ConstituentFilter, Holding, HoldingUpsert, HoldingUpsertOutcome, HoldingWithStock,
    IndexConstituent, IndexConstituentInsert, Portfolio, PortfolioInsert, Stock,
};
use crate::storage::repository::{
    HoldingRepository, IndexConstituentRepository, Page, PageQuery, PortfolioRepository,
};

#[derive(Debug, Default)]
struct Tables {
    portfolios: BTreeMap<i32, Portfolio>,
    stocks: BTreeMap<i32, Stock>,
    holdings: BTreeMap<i32, Holding>,
    constituents: Vec<IndexConstituent>,
    last_portfolio_id: i32,
    last_stock_id: i32,
    last_holding_id: i32,
    last_constituent_id: i32,
}

impl Tables {
    fn stock_by_ticker(&self, ticker: &str) -> Option<&Stock> {
        self.stocks.values().find(|s| s.ticker_symbol == ticker)
    }

    fn holding_for_pair(&self, portfolio_id: i32, stock_id: i32) -> Option<&Holding> {
        self.holdings
            .values()
            .find(|h| h.portfolio_id == portfolio_id && h.stock_id == stock_id)
    }
}

/// 記憶體儲存，實作全部儲存庫特性
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// 股票主檔筆數
    pub async fn stock_count(&self) -> usize {
        self.tables.lock().await.stocks.len()
    }

    /// 持倉總筆數
    pub async fn holding_count(&self) -> usize {
        self.tables.lock().await.holdings.len()
    }
}

#[async_trait]
impl PortfolioRepository for MemoryStore {
    async fn get_portfolio_by_id(&self, portfolio_id: i32) -> Result<Option<Portfolio>> {
        Ok(self.tables.lock().await.portfolios.get(&portfolio_id).cloned())
    }

    async fn get_portfolios(&self, page: PageQuery) -> Result<Page<Portfolio>> {
        let tables = self.tables.lock().await;
        let data = tables
            .portfolios
            .values()
            .skip(page.offset() as usize)
            .take(page.page_size as usize)
            .cloned()
            .collect();

        Ok(Page::new(
            data,
            tables.portfolios.len() as i64,
            page.page,
            page.page_size,
        ))
    }

    async fn insert_portfolio(&self, portfolio: &PortfolioInsert) -> Result<Portfolio> {
        let mut tables = self.tables.lock().await;
        tables.last_portfolio_id += 1;
        let created = Portfolio {
            portfolio_id: tables.last_portfolio_id,
            name: portfolio.name.clone(),
            description: portfolio.description.clone(),
        };
        tables.portfolios.insert(created.portfolio_id, created.clone());
        Ok(created)
    }

    async fn update_portfolio(
        &self,
        portfolio_id: i32,
        portfolio: &PortfolioInsert,
    ) -> Result<Option<Portfolio>> {
        let mut tables = self.tables.lock().await;
        Ok(tables.portfolios.get_mut(&portfolio_id).map(|existing| {
            existing.name = portfolio.name.clone();
            existing.description = portfolio.description.clone();
            existing.clone()
        }))
    }

    async fn delete_portfolio(&self, portfolio_id: i32) -> Result<bool> {
        let mut tables = self.tables.lock().await;
        if tables.portfolios.remove(&portfolio_id).is_none() {
            return Ok(false);
        }
        tables.holdings.retain(|_, h| h.portfolio_id != portfolio_id);
        Ok(true)
    }
}

#[async_trait]
impl HoldingRepository for MemoryStore {
    async fn upsert_holding(&self, upsert: &HoldingUpsert) -> Result<HoldingUpsertOutcome> {
        // 鎖在整個交易期間持有，同一持倉的並發請求因此依序執行
        let mut tables = self.tables.lock().await;
        let now = Utc::now();

        let (stock, stock_created) = match tables.stock_by_ticker(upsert.ticker.as_str()) {
            Some(existing) => {
                let mut stock = existing.clone();
                stock.price = Some(upsert.price);
                stock.price_updated_at = now;
                (stock, false)
            }
            None => (
                Stock {
                    stock_id: tables.last_stock_id + 1,
                    ticker_symbol: upsert.ticker.as_str().to_string(),
                    company_name: upsert.company_name.clone(),
                    price: Some(upsert.price),
                    price_updated_at: now,
                },
                true,
            ),
        };

        // 讓出執行權，其他請求會在鎖上等待
        tokio::task::yield_now().await;

        if !tables.portfolios.contains_key(&upsert.portfolio_id) {
            bail!(
                "違反外鍵約束: portfolio_holding.portfolio_id = {} 不存在",
                upsert.portfolio_id
            );
        }

        let delta = upsert.shares.get();
        let (holding, holding_created) =
            match tables.holding_for_pair(upsert.portfolio_id, stock.stock_id) {
                Some(existing) => {
                    let mut holding = existing.clone();
                    holding.shares = holding
                        .shares
                        .checked_add(delta)
                        .ok_or_else(|| anyhow!("持股數超出整數範圍: holding_id = {}", holding.holding_id))?;
                    (holding, false)
                }
                None => (
                    Holding {
                        holding_id: tables.last_holding_id + 1,
                        portfolio_id: upsert.portfolio_id,
                        stock_id: stock.stock_id,
                        shares: delta,
                    },
                    true,
                ),
            };

        // 提交
        if stock_created {
            tables.last_stock_id = stock.stock_id;
        }
        if holding_created {
            tables.last_holding_id = holding.holding_id;
        }
        tables.stocks.insert(stock.stock_id, stock.clone());
        tables.holdings.insert(holding.holding_id, holding.clone());

        Ok(HoldingUpsertOutcome {
            holding,
            stock,
            stock_created,
            holding_created,
        })
    }

    async fn remove_holding(&self, portfolio_id: i32, holding_id: i32) -> Result<bool> {
        let mut tables = self.tables.lock().await;
        match tables.holdings.get(&holding_id) {
            Some(h) if h.portfolio_id == portfolio_id => {
                tables.holdings.remove(&holding_id);
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn get_holdings_with_stock(&self, portfolio_id: i32) -> Result<Vec<HoldingWithStock>> {
        let tables = self.tables.lock().await;
        let mut holdings = tables
            .holdings
            .values()
            .filter(|h| h.portfolio_id == portfolio_id)
            .map(|h| {
                let stock = tables
                    .stocks
                    .get(&h.stock_id)
                    .ok_or_else(|| anyhow!("持倉 {} 參照的股票 {} 不存在", h.holding_id, h.stock_id))?;
                Ok(HoldingWithStock {
                    holding_id: h.holding_id,
                    portfolio_id: h.portfolio_id,
                    stock_id: h.stock_id,
                    shares: h.shares,
                    ticker_symbol: stock.ticker_symbol.clone(),
                    company_name: stock.company_name.clone(),
                    price: stock.price,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        holdings.sort_by(|a, b| a.ticker_symbol.cmp(&b.ticker_symbol));
        Ok(holdings)
    }

    async fn get_portfolio_value(&self, portfolio_id: i32) -> Result<f64> {
        Ok(self
            .get_holdings_with_stock(portfolio_id)
            .await?
            .iter()
            .map(HoldingWithStock::market_value)
            .sum())
    }

    async fn get_stock_by_ticker(&self, ticker: &str) -> Result<Option<Stock>> {
        Ok(self.tables.lock().await.stock_by_ticker(ticker).cloned())
    }
}

#[async_trait]
impl IndexConstituentRepository for MemoryStore {
    async fn replace_all(&self, rows: &[IndexConstituentInsert]) -> Result<Vec<IndexConstituent>> {
        let mut seen = HashSet::with_capacity(rows.len());
        if let Some(duplicate) = rows.iter().find(|r| !seen.insert(r.ticker.as_str())) {
            bail!("違反唯一約束: index_constituent.ticker = {}", duplicate.ticker);
        }

        let mut tables = self.tables.lock().await;
        let mut next_id = tables.last_constituent_id;
        let replaced: Vec<IndexConstituent> = rows
            .iter()
            .map(|row| {
                next_id += 1;
                IndexConstituent {
                    id: next_id,
                    ticker: row.ticker.clone(),
                    short_name: row.short_name.clone(),
                    sector: row.sector.clone(),
                    industry: row.industry.clone(),
                    price: row.price,
                }
            })
            .collect();

        tables.last_constituent_id = next_id;
        tables.constituents = replaced.clone();
        Ok(replaced)
    }

    async fn list_constituents(&self, filter: &ConstituentFilter) -> Result<Vec<IndexConstituent>> {
        let tables = self.tables.lock().await;
        let mut rows: Vec<IndexConstituent> = tables
            .constituents
            .iter()
            .filter(|c| filter.matches(c))
            .cloned()
            .collect();
        rows.sort_by(|a, b| a.ticker.cmp(&b.ticker));
        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain_types::{ShareCount, Ticker};

    fn upsert(portfolio_id: i32, ticker: &str, shares: i32, price: f64) -> HoldingUpsert {
        HoldingUpsert {
            portfolio_id,
            ticker: Ticker::parse(ticker).unwrap(),
            shares: ShareCount::new(shares).unwrap(),
            company_name: format!("{} Inc.", ticker),
            price,
        }
    }

    async fn store_with_portfolio() -> (MemoryStore, i32) {
        let store = MemoryStore::new();
        let portfolio = store
            .insert_portfolio(&PortfolioInsert {
                name: "Growth".to_string(),
                description: None,
            })
            .await
            .unwrap();
        (store, portfolio.portfolio_id)
    }

    #[tokio::test]
    async fn test_failed_holding_write_discards_staged_stock() {
        let store = MemoryStore::new();

        let result = store.upsert_holding(&upsert(42, "NVDA", 1, 900.0)).await;

        assert!(result.is_err());
        assert_eq!(store.stock_count().await, 0);
        assert!(store.get_stock_by_ticker("NVDA").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_share_overflow_rolls_back_price_update() {
        let (store, pid) = store_with_portfolio().await;
        store.upsert_holding(&upsert(pid, "AAPL", i32::MAX, 150.0)).await.unwrap();

        let result = store.upsert_holding(&upsert(pid, "AAPL", 1, 999.0)).await;

        assert!(result.is_err());
        let stock = store.get_stock_by_ticker("AAPL").await.unwrap().unwrap();
        assert_eq!(stock.price, Some(150.0));
    }

    #[tokio::test]
    async fn test_delete_portfolio_keeps_shared_stock() {
        let (store, pid) = store_with_portfolio().await;
        store.upsert_holding(&upsert(pid, "MSFT", 2, 400.0)).await.unwrap();

        assert!(store.delete_portfolio(pid).await.unwrap());
        assert_eq!(store.holding_count().await, 0);
        assert_eq!(store.stock_count().await, 1);
        assert!(!store.delete_portfolio(pid).await.unwrap());
    }

    #[tokio::test]
    async fn test_remove_holding_is_scoped_to_portfolio() {
        let (store, pid) = store_with_portfolio().await;
        let outcome = store.upsert_holding(&upsert(pid, "MSFT", 2, 400.0)).await.unwrap();

        assert!(!store.remove_holding(pid + 1, outcome.holding.holding_id).await.unwrap());
        assert!(store.remove_holding(pid, outcome.holding.holding_id).await.unwrap());
        assert_eq!(store.stock_count().await, 1);
    }

    #[tokio::test]
    async fn test_replace_all_rejects_duplicate_tickers() {
        let store = MemoryStore::new();
        let row = IndexConstituentInsert {
            ticker: "AAPL".to_string(),
            short_name: None,
            sector: None,
            industry: None,
            price: None,
        };

        assert!(store.replace_all(&[row.clone(), row]).await.is_err());
        assert!(store
            .list_constituents(&ConstituentFilter::default())
            .await
            .unwrap()
            .is_empty());
    }
}
