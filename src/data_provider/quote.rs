use std::collections::HashMap;

use async_trait::async_trait;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain_types::Ticker;

/// 行情查詢錯誤
#[derive(Debug, Error)]
pub enum QuoteError {
    #[error("查無行情: {0}")]
    NotFound(String),

    #[error("行情缺少欄位 {field}: {ticker}")]
    MissingField { ticker: String, field: &'static str },

    #[error("行情價格無效 {ticker}: {price}")]
    InvalidPrice { ticker: String, price: f64 },

    #[error("行情來源回應 HTTP {status}: {ticker}")]
    Status { ticker: String, status: u16 },

    #[error("行情來源錯誤 {code}: {description}")]
    Upstream { code: String, description: String },

    #[error("行情請求失敗: {0}")]
    Request(#[from] reqwest::Error),
}

/// 單一股票的最新行情
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StockQuote {
    pub ticker: Ticker,
    pub short_name: String,
    pub price: f64,
}

impl StockQuote {
    /// 建立行情，名稱不可為空白，價格必須為有限數值
    pub fn new(ticker: Ticker, short_name: &str, price: f64) -> Result<Self, QuoteError> {
        let short_name = short_name.trim();
        if short_name.is_empty() {
            return Err(QuoteError::MissingField {
                ticker: ticker.into_inner(),
                field: "shortName",
            });
        }
        if !price.is_finite() {
            return Err(QuoteError::InvalidPrice {
                ticker: ticker.into_inner(),
                price,
            });
        }

        Ok(Self {
            ticker,
            short_name: short_name.to_string(),
            price,
        })
    }
}

/// 行情來源特性
#[async_trait]
pub trait QuoteProvider: Send + Sync {
    /// 來源名稱，用於日誌與指標標籤
    fn name(&self) -> &'static str;

    /// 取得最新名稱與價格
    async fn latest_quote(&self, ticker: &Ticker) -> Result<StockQuote, QuoteError>;
}

/// 固定行情來源，供測試與離線執行使用
#[derive(Debug, Default)]
pub struct StaticQuoteProvider {
    quotes: RwLock<HashMap<String, (String, f64)>>,
}

impl StaticQuoteProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_quote(self, ticker: &str, short_name: &str, price: f64) -> Self {
        self.set_quote(ticker, short_name, price);
        self
    }

    /// 設定或覆寫某代號的行情
    pub fn set_quote(&self, ticker: &str, short_name: &str, price: f64) {
        self.quotes.write().insert(
            crate::domain_types::canonicalize(ticker),
            (short_name.to_string(), price),
        );
    }
}

#[async_trait]
impl QuoteProvider for StaticQuoteProvider {
    fn name(&self) -> &'static str {
        "static"
    }

    async fn latest_quote(&self, ticker: &Ticker) -> Result<StockQuote, QuoteError> {
        let entry = self.quotes.read().get(ticker.as_str()).cloned();
        match entry {
            Some((short_name, price)) => StockQuote::new(ticker.clone(), &short_name, price),
            None => Err(QuoteError::NotFound(ticker.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    fn ticker(s: &str) -> Ticker {
        Ticker::parse(s).unwrap()
    }

    #[tokio::test]
    async fn test_static_provider_lookup() {
        let provider = StaticQuoteProvider::new().with_quote("brk.b", "Berkshire Hathaway", 410.5);

        let quote = provider.latest_quote(&ticker("BRK-B")).await.unwrap();
        assert_eq!(quote.short_name, "Berkshire Hathaway");
        assert_eq!(quote.price, 410.5);

        assert_matches!(
            provider.latest_quote(&ticker("MSFT")).await,
            Err(QuoteError::NotFound(t)) if t == "MSFT"
        );
    }

    #[test]
    fn test_quote_requires_name_and_finite_price() {
        assert_matches!(
            StockQuote::new(ticker("AAPL"), "  ", 1.0),
            Err(QuoteError::MissingField { field: "shortName", .. })
        );
        assert_matches!(
            StockQuote::new(ticker("AAPL"), "Apple", f64::NAN),
            Err(QuoteError::InvalidPrice { .. })
        );
        assert!(StockQuote::new(ticker("AAPL"), "Apple", 0.0).is_ok());
    }
}
