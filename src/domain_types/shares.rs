use serde::{Deserialize, Serialize};
use std::fmt;

/// 持股數量，恆大於等於 1
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ShareCount(i32);

impl ShareCount {
    /// 未輸入或無法解析時使用的預設股數
    pub const DEFAULT: ShareCount = ShareCount(1);

    /// 建立股數，小於 1 時回傳 None
    pub fn new(value: i32) -> Option<Self> {
        (value >= 1).then_some(Self(value))
    }

    /// 將使用者輸入的自由文字轉為股數
    ///
    /// 空字串或無法解析為整數時為 1；小於 1 的值提升為 1；
    /// 超過 `i32::MAX` 的值截為 `i32::MAX`。此函數不會失敗。
    pub fn coerce(input: &str) -> Self {
        let trimmed = input.trim();
        match trimmed.parse::<i64>() {
            Ok(value) => Self(value.clamp(1, i64::from(i32::MAX)) as i32),
            // 位數超出 i64 的整數仍依正負號截斷
            Err(_) => match trimmed.strip_prefix('-') {
                Some(digits) if is_digits(digits) => Self::DEFAULT,
                _ if is_digits(trimmed.strip_prefix('+').unwrap_or(trimmed)) => Self(i32::MAX),
                _ => Self::DEFAULT,
            },
        }
    }

    /// 從可選輸入轉換，None 視為未輸入
    pub fn coerce_opt(input: Option<&str>) -> Self {
        input.map(Self::coerce).unwrap_or(Self::DEFAULT)
    }

    pub fn get(self) -> i32 {
        self.0
    }
}

fn is_digits(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit())
}

impl Default for ShareCount {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl fmt::Display for ShareCount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
