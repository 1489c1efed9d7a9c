// monitor.rs - 監控指標模組

pub mod metrics;

pub use metrics::{PortfolioMetrics, UpsertOutcome, METRIC_NAMESPACE};
