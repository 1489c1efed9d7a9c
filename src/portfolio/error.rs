use thiserror::Error;

use crate::data_provider::QuoteError;
use crate::domain_types::TickerError;

/// 投資組合服務錯誤
///
/// 前四種為使用者可修正的前置條件錯誤，不會產生任何寫入；
/// `TransactionFailed` 表示交易已整筆回滾；`Storage` 為讀取路徑的儲存錯誤。
#[derive(Debug, Error)]
pub enum PortfolioError {
    #[error("找不到投資組合: {0}")]
    PortfolioNotFound(i32),

    #[error("找不到持倉: {0}")]
    HoldingNotFound(i32),

    #[error("找不到成分股: {0}")]
    ConstituentNotFound(String),

    #[error("輸入無效: {0}")]
    InvalidInput(String),

    #[error("無法取得 {ticker} 的行情: {reason}")]
    QuoteUnavailable { ticker: String, reason: String },

    #[error("交易失敗，已回滾: {0}")]
    TransactionFailed(String),

    #[error("儲存錯誤: {0}")]
    Storage(String),
}

impl PortfolioError {
    /// 讀取路徑的儲存錯誤，保留完整的錯誤鏈
    pub fn storage(err: anyhow::Error) -> Self {
        PortfolioError::Storage(format!("{:#}", err))
    }

    pub fn transaction(err: anyhow::Error) -> Self {
        PortfolioError::TransactionFailed(format!("{:#}", err))
    }

    pub fn quote(ticker: &str, err: QuoteError) -> Self {
        PortfolioError::QuoteUnavailable {
            ticker: ticker.to_string(),
            reason: err.to_string(),
        }
    }
}

impl From<TickerError> for PortfolioError {
    fn from(err: TickerError) -> Self {
        PortfolioError::InvalidInput(err.to_string())
    }
}

pub type PortfolioResult<T> = Result<T, PortfolioError>;

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Context;

    #[test]
    fn test_transaction_error_keeps_chain() {
        let err: anyhow::Result<()> =
            Err(anyhow::anyhow!("deadlock detected")).context("累加持股失敗");
        let mapped = PortfolioError::transaction(err.unwrap_err());

        assert_eq!(
            mapped.to_string(),
            "交易失敗，已回滾: 累加持股失敗: deadlock detected"
        );
    }

    #[test]
    fn test_ticker_error_is_invalid_input() {
        let err: PortfolioError = TickerError::Empty.into();
        assert!(matches!(err, PortfolioError::InvalidInput(_)));
    }
}
