use anyhow::{Context, Result};
use sqlx::postgres::{PgConnectOptions, PgPool, PgPoolOptions};
use sqlx::ConnectOptions;

use crate::config::DatabaseConfig;

/// 資料庫池類型
pub type DatabasePool = PgPool;

/// 由配置建立連線參數
pub fn connect_options(config: &DatabaseConfig) -> PgConnectOptions {
    PgConnectOptions::new()
        .host(&config.host)
        .port(config.port)
        .username(&config.username)
        .password(&config.password)
        .database(&config.database)
        .disable_statement_logging()
}

/// 初始化資料庫連接池
pub async fn init_db_pool(config: &DatabaseConfig) -> Result<PgPool> {
    let pool = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .min_connections(config.min_connections)
        .max_lifetime(config.max_lifetime())
        .acquire_timeout(config.acquire_timeout())
        .idle_timeout(config.idle_timeout())
        .connect_with(connect_options(config))
        .await
        .with_context(|| {
            format!(
                "無法連線至資料庫 {}:{}/{}",
                config.host, config.port, config.database
            )
        })?;

    // 測試連接
    sqlx::query("SELECT 1").execute(&pool).await?;

    Ok(pool)
}

/// 健康檢查
pub async fn health_check(pool: &PgPool) -> bool {
    sqlx::query("SELECT 1").fetch_one(pool).await.is_ok()
}
