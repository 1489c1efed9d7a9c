use std::sync::Arc;
use std::time::Instant;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::data_provider::{
    normalize_constituents, ConstituentCache, ConstituentSnapshot, QuoteProvider,
};
use crate::domain_types::{ShareCount, Ticker};
use crate::monitor::{PortfolioMetrics, UpsertOutcome};
use crate::portfolio::error::{PortfolioError, PortfolioResult};
use crate::storage::models::{
    ConstituentFilter, HoldingUpsert, HoldingUpsertOutcome, HoldingWithStock, IndexConstituent,
    IndexConstituentInsert, Portfolio, PortfolioInsert,
};
use crate::storage::repository::{
    HoldingRepository, IndexConstituentRepository, Page, PageQuery, PortfolioRepository,
};
use crate::storage::MemoryStore;

/// 投資組合名稱長度上限
pub const MAX_NAME_LEN: usize = 100;
/// 投資組合描述長度上限
pub const MAX_DESCRIPTION_LEN: usize = 200;

/// 建立或編輯投資組合的使用者輸入
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PortfolioInput {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

impl PortfolioInput {
    pub fn new(name: impl Into<String>, description: Option<&str>) -> Self {
        Self {
            name: name.into(),
            description: description.map(str::to_string),
        }
    }

    /// 去除空白並檢查長度，空白描述視為未填
    pub fn validate(&self) -> PortfolioResult<PortfolioInsert> {
        let name = self.name.trim();
        if name.is_empty() {
            return Err(PortfolioError::InvalidInput("請提供投資組合名稱".to_string()));
        }
        if name.chars().count() > MAX_NAME_LEN {
            return Err(PortfolioError::InvalidInput(format!(
                "投資組合名稱不可超過 {} 字元",
                MAX_NAME_LEN
            )));
        }

        let description = self
            .description
            .as_deref()
            .map(str::trim)
            .filter(|d| !d.is_empty());
        if let Some(d) = description {
            if d.chars().count() > MAX_DESCRIPTION_LEN {
                return Err(PortfolioError::InvalidInput(format!(
                    "投資組合描述不可超過 {} 字元",
                    MAX_DESCRIPTION_LEN
                )));
            }
        }

        Ok(PortfolioInsert {
            name: name.to_string(),
            description: description.map(str::to_string),
        })
    }
}

/// 明細頁的單筆持倉
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HoldingView {
    pub holding_id: i32,
    pub stock_id: i32,
    pub ticker: String,
    pub company_name: String,
    pub shares: i32,
    pub price: Option<f64>,
    pub market_value: f64,
    pub sector: Option<String>,
    pub industry: Option<String>,
}

impl HoldingView {
    fn from_holding(holding: HoldingWithStock, snapshot: &ConstituentSnapshot) -> Self {
        let constituent = snapshot.get(&holding.ticker_symbol);
        let market_value = holding.market_value();

        Self {
            holding_id: holding.holding_id,
            stock_id: holding.stock_id,
            sector: constituent.and_then(|c| c.sector.clone()),
            industry: constituent.and_then(|c| c.industry.clone()),
            ticker: holding.ticker_symbol,
            company_name: holding.company_name,
            shares: holding.shares,
            price: holding.price,
            market_value,
        }
    }
}

/// 投資組合明細
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortfolioDetail {
    pub portfolio: Portfolio,
    pub holdings: Vec<HoldingView>,
    pub total_value: f64,
}

/// 投資組合服務
///
/// 負責前置條件檢查（投資組合存在、代號格式、行情可取得），
/// 再把持倉寫入交給儲存庫的單一交易完成。
pub struct PortfolioService {
    portfolios: Arc<dyn PortfolioRepository>,
    holdings: Arc<dyn HoldingRepository>,
    constituents: Arc<dyn IndexConstituentRepository>,
    quotes: Arc<dyn QuoteProvider>,
    cache: Arc<ConstituentCache>,
}

impl PortfolioService {
    pub fn new(
        portfolios: Arc<dyn PortfolioRepository>,
        holdings: Arc<dyn HoldingRepository>,
        constituents: Arc<dyn IndexConstituentRepository>,
        quotes: Arc<dyn QuoteProvider>,
        cache: Arc<ConstituentCache>,
    ) -> Self {
        Self {
            portfolios,
            holdings,
            constituents,
            quotes,
            cache,
        }
    }

    /// 以記憶體儲存建立服務
    pub fn with_memory_store(store: Arc<MemoryStore>, quotes: Arc<dyn QuoteProvider>) -> Self {
        Self::new(
            store.clone(),
            store.clone(),
            store,
            quotes,
            Arc::new(ConstituentCache::new()),
        )
    }

    pub fn constituent_cache(&self) -> &Arc<ConstituentCache> {
        &self.cache
    }

    async fn require_portfolio(&self, portfolio_id: i32) -> PortfolioResult<Portfolio> {
        self.portfolios
            .get_portfolio_by_id(portfolio_id)
            .await
            .map_err(PortfolioError::storage)?
            .ok_or(PortfolioError::PortfolioNotFound(portfolio_id))
    }

    pub async fn create_portfolio(&self, input: &PortfolioInput) -> PortfolioResult<Portfolio> {
        let insert = input.validate()?;
        let portfolio = self
            .portfolios
            .insert_portfolio(&insert)
            .await
            .map_err(PortfolioError::storage)?;

        info!(portfolio_id = portfolio.portfolio_id, name = %portfolio.name, "已建立投資組合");
        Ok(portfolio)
    }

    pub async fn list_portfolios(&self, page: PageQuery) -> PortfolioResult<Page<Portfolio>> {
        self.portfolios
            .get_portfolios(page)
            .await
            .map_err(PortfolioError::storage)
    }

    pub async fn get_portfolio(&self, portfolio_id: i32) -> PortfolioResult<Portfolio> {
        self.require_portfolio(portfolio_id).await
    }

    pub async fn update_portfolio(
        &self,
        portfolio_id: i32,
        input: &PortfolioInput,
    ) -> PortfolioResult<Portfolio> {
        let update = input.validate()?;
        self.portfolios
            .update_portfolio(portfolio_id, &update)
            .await
            .map_err(PortfolioError::storage)?
            .ok_or(PortfolioError::PortfolioNotFound(portfolio_id))
    }

    /// 刪除投資組合及其持倉，股票主檔保留
    pub async fn delete_portfolio(&self, portfolio_id: i32) -> PortfolioResult<()> {
        let deleted = self
            .portfolios
            .delete_portfolio(portfolio_id)
            .await
            .map_err(PortfolioError::transaction)?;

        if !deleted {
            return Err(PortfolioError::PortfolioNotFound(portfolio_id));
        }
        info!(portfolio_id, "已刪除投資組合");
        Ok(())
    }

    /// 投資組合明細，產業資訊取自成分股快照
    pub async fn portfolio_detail(&self, portfolio_id: i32) -> PortfolioResult<PortfolioDetail> {
        let portfolio = self.require_portfolio(portfolio_id).await?;
        let holdings = self
            .holdings
            .get_holdings_with_stock(portfolio_id)
            .await
            .map_err(PortfolioError::storage)?;

        let snapshot = self.cache.snapshot();
        let holdings: Vec<HoldingView> = holdings
            .into_iter()
            .map(|h| HoldingView::from_holding(h, &snapshot))
            .collect();
        let total_value = holdings.iter().map(|h| h.market_value).sum();

        Ok(PortfolioDetail {
            portfolio,
            holdings,
            total_value,
        })
    }

    /// 投資組合市值，價格為空的持倉以 0 計
    pub async fn portfolio_value(&self, portfolio_id: i32) -> PortfolioResult<f64> {
        self.require_portfolio(portfolio_id).await?;
        self.holdings
            .get_portfolio_value(portfolio_id)
            .await
            .map_err(PortfolioError::storage)
    }

    /// 新增持股
    ///
    /// 依序檢查投資組合、正規化代號、查詢行情、轉換股數，最後以單一交易寫入。
    /// 股數輸入無法解析時視為 1，不會回傳錯誤。
    pub async fn add_stock(
        &self,
        portfolio_id: i32,
        ticker_input: &str,
        shares_input: Option<&str>,
    ) -> PortfolioResult<HoldingUpsertOutcome> {
        self.require_portfolio(portfolio_id).await?;

        let ticker = Ticker::parse(ticker_input)?;

        let quote = match self.quotes.latest_quote(&ticker).await {
            Ok(quote) => quote,
            Err(e) => {
                PortfolioMetrics::record_quote_failure(self.quotes.name());
                warn!(%ticker, error = %e, "行情查詢失敗");
                return Err(PortfolioError::quote(ticker.as_str(), e));
            }
        };

        let shares = ShareCount::coerce_opt(shares_input);
        let upsert = HoldingUpsert {
            portfolio_id,
            ticker,
            shares,
            company_name: quote.short_name,
            price: quote.price,
        };

        let started = Instant::now();
        match self.holdings.upsert_holding(&upsert).await {
            Ok(outcome) => {
                PortfolioMetrics::record_upsert(UpsertOutcome::from(&outcome), started.elapsed());
                if outcome.stock_created {
                    PortfolioMetrics::record_stock_created();
                }
                info!(
                    portfolio_id,
                    ticker = %upsert.ticker,
                    added = shares.get(),
                    total = outcome.holding.shares,
                    created = outcome.holding_created,
                    "已新增持股"
                );
                Ok(outcome)
            }
            Err(e) => {
                PortfolioMetrics::record_upsert(UpsertOutcome::Failed, started.elapsed());
                warn!(portfolio_id, ticker = %upsert.ticker, error = %e, "持倉交易失敗");
                Err(PortfolioError::transaction(e))
            }
        }
    }

    /// 刪除持倉，不影響共用的股票主檔
    pub async fn remove_holding(&self, portfolio_id: i32, holding_id: i32) -> PortfolioResult<()> {
        self.require_portfolio(portfolio_id).await?;
        let removed = self
            .holdings
            .remove_holding(portfolio_id, holding_id)
            .await
            .map_err(PortfolioError::storage)?;

        if !removed {
            return Err(PortfolioError::HoldingNotFound(holding_id));
        }
        info!(portfolio_id, holding_id, "已刪除持倉");
        Ok(())
    }

    /// 以新資料整批取代成分股並更新快照
    ///
    /// 代號格式錯誤時不寫入任何資料。
    pub async fn replace_constituents(
        &self,
        rows: Vec<IndexConstituentInsert>,
    ) -> PortfolioResult<Arc<ConstituentSnapshot>> {
        let rows = normalize_constituents(rows)?;
        self.cache
            .refresh_from(self.constituents.as_ref(), rows)
            .await
            .map_err(PortfolioError::transaction)
    }

    /// 依產業類別篩選成分股，"All" 或未提供視為不篩選
    pub async fn list_constituents(
        &self,
        sector: Option<&str>,
        industry: Option<&str>,
    ) -> PortfolioResult<Vec<IndexConstituent>> {
        let filter = ConstituentFilter::from_selection(sector, industry);
        self.constituents
            .list_constituents(&filter)
            .await
            .map_err(PortfolioError::storage)
    }

    /// 在快照中查詢成分股，不分大小寫
    pub fn lookup_constituent(&self, ticker: &str) -> PortfolioResult<IndexConstituent> {
        self.cache
            .lookup(ticker)
            .ok_or_else(|| PortfolioError::ConstituentNotFound(ticker.trim().to_uppercase()))
    }

    /// 啟動時載入成分股快照
    pub async fn load_constituents(&self) -> PortfolioResult<usize> {
        let snapshot = self
            .cache
            .load_from(self.constituents.as_ref())
            .await
            .map_err(PortfolioError::storage)?;
        Ok(snapshot.len())
    }
}
