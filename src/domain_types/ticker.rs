use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// 股票代號最大長度，與資料表欄位一致
pub const MAX_TICKER_LEN: usize = 16;

/// 代號格式錯誤
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TickerError {
    #[error("請提供股票代號")]
    Empty,

    #[error("股票代號過長: {0}（上限 {MAX_TICKER_LEN} 字元）")]
    TooLong(String),

    #[error("股票代號包含無效字元: {0}")]
    InvalidCharacter(String),
}

/// 正規化後的股票代號
///
/// 去除前後空白、轉為大寫，並把 `.` 換成 `-`（例如 `brk.b` → `BRK-B`），
/// 與行情來源使用的代號格式一致。
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Ticker(String);

impl Ticker {
    /// 解析並正規化使用者輸入的代號
    pub fn parse(input: &str) -> Result<Self, TickerError> {
        let trimmed = input.trim();
        // 非 ASCII 字元轉大寫後可能變成 ASCII（例如 ß → SS），須在正規化前拒絕
        if !trimmed.is_ascii() {
            return Err(TickerError::InvalidCharacter(trimmed.to_string()));
        }
        let canonical = canonicalize(trimmed);

        if canonical.is_empty() {
            return Err(TickerError::Empty);
        }
        if canonical.len() > MAX_TICKER_LEN {
            return Err(TickerError::TooLong(canonical));
        }
        if !canonical
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '^' | '='))
        {
            return Err(TickerError::InvalidCharacter(canonical));
        }

        Ok(Self(canonical))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

/// 只做正規化、不做驗證，供成分股刷新等批次資料使用
pub fn canonicalize(input: &str) -> String {
    input.trim().to_uppercase().replace('.', "-")
}

impl FromStr for Ticker {
    type Err = TickerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for Ticker {
    type Error = TickerError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Ticker> for String {
    fn from(ticker: Ticker) -> Self {
        ticker.0
    }
}

impl AsRef<str> for Ticker {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Ticker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("AAPL", "AAPL")]
    #[case("  aapl ", "AAPL")]
    #[case("brk.b", "BRK-B")]
    #[case("BF.B", "BF-B")]
    #[case("^gspc", "^GSPC")]
    #[case("eurusd=x", "EURUSD=X")]
    fn test_parse_canonicalizes(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(Ticker::parse(input).unwrap().as_str(), expected);
    }

    #[rstest]
    #[case("", TickerError::Empty)]
    #[case("   ", TickerError::Empty)]
    #[case("AB CD", TickerError::InvalidCharacter("AB CD".to_string()))]
    #[case("AAPL;DROP", TickerError::InvalidCharacter("AAPL;DROP".to_string()))]
    #[case("ABCDEFGHIJKLMNOPQ", TickerError::TooLong("ABCDEFGHIJKLMNOPQ".to_string()))]
    #[case("ß", TickerError::InvalidCharacter("ß".to_string()))]
    #[case(" ﬁx ", TickerError::InvalidCharacter("ﬁx".to_string()))]
    fn test_parse_rejects(#[case] input: &str, #[case] expected: TickerError) {
        assert_eq!(Ticker::parse(input).unwrap_err(), expected);
    }

    #[test]
    fn test_serde_goes_through_parse() {
        let ticker: Ticker = serde_json::from_str("\"msft\"").unwrap();
        assert_eq!(ticker.as_str(), "MSFT");
        assert_eq!(serde_json::to_string(&ticker).unwrap(), "\"MSFT\"");
        assert!(serde_json::from_str::<Ticker>("\"\"").is_err());
    }
}
