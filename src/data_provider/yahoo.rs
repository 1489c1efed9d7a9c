//! Yahoo Finance 行情來源
//!
//! 使用 chart 端點 `{base_url}/{ticker}?interval=1d&range=1d`，
//! 名稱取 `meta.shortName`（無則 `meta.longName`），價格取 `meta.regularMarketPrice`。

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};
use serde_json::Value;
use tracing::{debug, warn};

use crate::config::types::QuoteConfig;
use crate::data_provider::quote::{QuoteError, QuoteProvider, StockQuote};
use crate::domain_types::Ticker;

pub struct YahooQuoteProvider {
    client: reqwest::Client,
    base_url: String,
}

impl YahooQuoteProvider {
    pub fn new(config: &QuoteConfig) -> Result<Self, QuoteError> {
        let mut headers = HeaderMap::new();
        if let Ok(agent) = HeaderValue::from_str(&config.user_agent) {
            headers.insert(USER_AGENT, agent);
        }

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(config.request_timeout())
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    fn chart_url(&self, ticker: &Ticker) -> String {
        format!("{}/{}?interval=1d&range=1d", self.base_url, ticker)
    }
}

/// 解析 chart 回應
pub fn parse_chart_response(ticker: &Ticker, data: &Value) -> Result<StockQuote, QuoteError> {
    let chart = data.get("chart");

    if let Some(error) = chart.and_then(|c| c.get("error")).and_then(Value::as_object) {
        let code = error.get("code").and_then(Value::as_str).unwrap_or("unknown");
        let description = error
            .get("description")
            .and_then(Value::as_str)
            .unwrap_or("");
        if code == "Not Found" {
            return Err(QuoteError::NotFound(ticker.to_string()));
        }
        return Err(QuoteError::Upstream {
            code: code.to_string(),
            description: description.to_string(),
        });
    }

    let meta = chart
        .and_then(|c| c.get("result"))
        .and_then(|r| r.get(0))
        .and_then(|r| r.get("meta"))
        .ok_or_else(|| QuoteError::NotFound(ticker.to_string()))?;

    let short_name = ["shortName", "longName"]
        .iter()
        .filter_map(|key| meta.get(*key).and_then(Value::as_str))
        .find(|name| !name.trim().is_empty())
        .ok_or_else(|| QuoteError::MissingField {
            ticker: ticker.to_string(),
            field: "shortName",
        })?;

    let price = meta
        .get("regularMarketPrice")
        .and_then(Value::as_f64)
        .ok_or_else(|| QuoteError::MissingField {
            ticker: ticker.to_string(),
            field: "regularMarketPrice",
        })?;

    StockQuote::new(ticker.clone(), short_name, price)
}

#[async_trait]
impl QuoteProvider for YahooQuoteProvider {
    fn name(&self) -> &'static str {
        "yahoo"
    }

    async fn latest_quote(&self, ticker: &Ticker) -> Result<StockQuote, QuoteError> {
        let url = self.chart_url(ticker);
        debug!(%ticker, %url, "查詢 Yahoo 行情");

        let response = self.client.get(&url).send().await?;
        let status = response.status();

        // chart 端點對未知代號回 404 並附上錯誤內容
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(QuoteError::NotFound(ticker.to_string()));
        }
        if !status.is_success() {
            warn!(%ticker, status = status.as_u16(), "Yahoo 行情請求失敗");
            return Err(QuoteError::Status {
                ticker: ticker.to_string(),
                status: status.as_u16(),
            });
        }

        let data: Value = response.json().await?;
        parse_chart_response(ticker, &data)
    }
}
