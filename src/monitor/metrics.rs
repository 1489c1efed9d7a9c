use metrics::{counter, gauge, histogram};
use std::time::Duration;

use crate::storage::models::HoldingUpsertOutcome;

/// 監控指標命名空間
pub const METRIC_NAMESPACE: &str = "portfolio";

/// 持倉寫入結果分類
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    /// 新建持倉
    Created,
    /// 累加既有持倉
    Incremented,
    /// 交易失敗並回滾
    Failed,
}

impl UpsertOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            UpsertOutcome::Created => "created",
            UpsertOutcome::Incremented => "incremented",
            UpsertOutcome::Failed => "failed",
        }
    }
}

impl From<&HoldingUpsertOutcome> for UpsertOutcome {
    fn from(outcome: &HoldingUpsertOutcome) -> Self {
        if outcome.holding_created {
            UpsertOutcome::Created
        } else {
            UpsertOutcome::Incremented
        }
    }
}

/// 投資組合服務指標記錄器
pub struct PortfolioMetrics;

impl PortfolioMetrics {
    /// 記錄一次持倉寫入
    ///
    /// # Arguments
    /// * `outcome` - 寫入結果
    /// * `duration` - 交易耗時
    pub fn record_upsert(outcome: UpsertOutcome, duration: Duration) {
        counter!(
            format!("{}_holding_upserts_total", METRIC_NAMESPACE),
            "outcome" => outcome.as_str()
        )
        .increment(1);

        histogram!(
            format!("{}_holding_upsert_duration_seconds", METRIC_NAMESPACE),
            "outcome" => outcome.as_str()
        )
        .record(duration.as_secs_f64());
    }

    /// 記錄新建的股票主檔
    pub fn record_stock_created() {
        counter!(format!("{}_stocks_created_total", METRIC_NAMESPACE)).increment(1);
    }

    /// 記錄行情查詢失敗
    pub fn record_quote_failure(provider: &'static str) {
        counter!(
            format!("{}_quote_failures_total", METRIC_NAMESPACE),
            "provider" => provider
        )
        .increment(1);
    }

    /// 記錄成分股快照更新
    pub fn record_constituent_refresh(count: usize, success: bool) {
        counter!(
            format!("{}_constituent_refreshes_total", METRIC_NAMESPACE),
            "result" => if success { "success" } else { "error" }
        )
        .increment(1);

        if success {
            gauge!(format!("{}_constituents", METRIC_NAMESPACE)).set(count as f64);
        }
    }
}
