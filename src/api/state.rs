use std::sync::Arc;

use sqlx::PgPool;

use crate::config::StorageBackend;
use crate::portfolio::PortfolioService;

/// 各處理器共用的應用狀態
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<PortfolioService>,
    /// 使用 Postgres 後端時的連線池，供健康檢查使用
    pub db_pool: Option<PgPool>,
    pub backend: StorageBackend,
}

impl AppState {
    pub fn new(service: Arc<PortfolioService>, backend: StorageBackend) -> Self {
        Self {
            service,
            db_pool: None,
            backend,
        }
    }

    pub fn with_db_pool(mut self, pool: PgPool) -> Self {
        self.db_pool = Some(pool);
        self
    }
}
