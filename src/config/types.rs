use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::config::validation::{ValidationError, ValidationUtils, Validator};

/// 應用程序配置結構
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApplicationConfig {
    pub database: DatabaseConfig,
    pub log: LogConfig,
    pub server: ServerConfig,
    pub storage: StorageConfig,
    pub quotes: QuoteConfig,
    #[serde(default)]
    pub metrics: MetricsConfig,
}

impl Validator for ApplicationConfig {
    fn validate(&self) -> Result<(), ValidationError> {
        // 記憶體儲存不需要資料庫連線設定
        if self.storage.backend == StorageBackend::Postgres {
            self.database.validate()?;
        }
        self.log.validate()?;
        self.server.validate()?;
        self.quotes.validate()?;
        self.metrics.validate()?;

        Ok(())
    }
}

/// 數據庫配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    pub database: String,
    pub max_connections: u32,
    pub min_connections: u32,
    pub max_lifetime_secs: u64,
    pub acquire_timeout_secs: u64,
    pub idle_timeout_secs: u64,
    /// 持倉行鎖等待上限（毫秒），0 表示沿用資料庫預設（不逾時）
    #[serde(default)]
    pub lock_timeout_ms: u64,
}

impl Validator for DatabaseConfig {
    fn validate(&self) -> Result<(), ValidationError> {
        ValidationUtils::not_empty(&self.host, "database.host")?;
        ValidationUtils::not_empty(&self.username, "database.username")?;
        ValidationUtils::not_empty(&self.database, "database.database")?;
        ValidationUtils::in_range(self.port, 1, 65535, "database.port")?;
        ValidationUtils::in_range(
            self.max_connections,
            self.min_connections.max(1),
            1000,
            "database.max_connections",
        )?;
        ValidationUtils::in_range(self.lock_timeout_ms, 0, 600_000, "database.lock_timeout_ms")?;

        Ok(())
    }
}

impl DatabaseConfig {
    /// 獲取最大生命週期持續時間
    pub fn max_lifetime(&self) -> Duration {
        Duration::from_secs(self.max_lifetime_secs)
    }

    /// 獲取獲取連接超時持續時間
    pub fn acquire_timeout(&self) -> Duration {
        Duration::from_secs(self.acquire_timeout_secs)
    }

    /// 獲取閒置超時持續時間
    pub fn idle_timeout(&self) -> Duration {
        Duration::from_secs(self.idle_timeout_secs)
    }

    /// 行鎖等待上限，未設定時為 None
    pub fn lock_timeout(&self) -> Option<Duration> {
        (self.lock_timeout_ms > 0).then(|| Duration::from_millis(self.lock_timeout_ms))
    }
}

/// 日誌配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogConfig {
    pub level: String,
    pub format: String,
    /// 設定後另外輸出每日滾動的日誌檔
    #[serde(default)]
    pub directory: Option<String>,
}

impl Validator for LogConfig {
    fn validate(&self) -> Result<(), ValidationError> {
        ValidationUtils::one_of(
            &self.level.to_lowercase().as_str(),
            &["trace", "debug", "info", "warn", "error"],
            "log.level",
        )?;

        ValidationUtils::one_of(
            &self.format.to_lowercase().as_str(),
            &["pretty", "json"],
            "log.format",
        )?;

        if let Some(dir) = &self.directory {
            ValidationUtils::not_empty(dir, "log.directory")?;
        }

        Ok(())
    }
}

/// 伺服器配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub base_path: String,
    pub request_timeout_secs: u64,
    pub enable_compression: bool,
    pub enable_cors: bool,
    #[serde(default)]
    pub cors_allowed_origins: Vec<String>,
}

impl Validator for ServerConfig {
    fn validate(&self) -> Result<(), ValidationError> {
        ValidationUtils::not_empty(&self.host, "server.host")?;
        ValidationUtils::in_range(self.port, 1, 65535, "server.port")?;
        ValidationUtils::in_range(self.request_timeout_secs, 1, 300, "server.request_timeout_secs")?;

        if !self.base_path.starts_with('/') {
            return Err(ValidationError::InvalidValue(format!(
                "server.base_path 必須以 '/' 開頭: {}",
                self.base_path
            )));
        }

        // CORS設定驗證
        if self.enable_cors && self.cors_allowed_origins.is_empty() {
            return Err(ValidationError::InvalidValue(
                "啟用CORS但未指定允許的來源".to_string(),
            ));
        }

        Ok(())
    }
}

/// 儲存後端類型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    Postgres,
    Memory,
}

/// 儲存配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    pub backend: StorageBackend,
    /// 啟動時是否自動執行遷移
    #[serde(default = "default_true")]
    pub run_migrations: bool,
}

/// 行情來源類型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuoteProviderKind {
    Yahoo,
    Static,
}

/// 行情查詢配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuoteConfig {
    pub provider: QuoteProviderKind,
    pub base_url: String,
    pub request_timeout_secs: u64,
    pub user_agent: String,
}

impl Validator for QuoteConfig {
    fn validate(&self) -> Result<(), ValidationError> {
        if self.provider == QuoteProviderKind::Yahoo {
            ValidationUtils::not_empty(&self.base_url, "quotes.base_url")?;
            ValidationUtils::not_empty(&self.user_agent, "quotes.user_agent")?;
        }
        ValidationUtils::in_range(self.request_timeout_secs, 1, 120, "quotes.request_timeout_secs")?;

        Ok(())
    }
}

impl QuoteConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

/// Prometheus 指標輸出配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsConfig {
    pub enabled: bool,
    pub listen_port: u16,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            listen_port: 9000,
        }
    }
}

impl Validator for MetricsConfig {
    fn validate(&self) -> Result<(), ValidationError> {
        ValidationUtils::check_dependency(
            self.enabled,
            self.listen_port > 0,
            "metrics.enabled",
            "metrics.listen_port",
        )
    }
}

fn default_true() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    fn database_config() -> DatabaseConfig {
        DatabaseConfig {
            host: "localhost".to_string(),
            port: 5432,
            username: "portfolio_user".to_string(),
            password: "portfolio_pass".to_string(),
            database: "portfolio".to_string(),
            max_connections: 10,
            min_connections: 1,
            max_lifetime_secs: 1800,
            acquire_timeout_secs: 5,
            idle_timeout_secs: 600,
            lock_timeout_ms: 0,
        }
    }

    #[test]
    fn test_database_config_durations() {
        let mut config = database_config();
        assert_eq!(config.acquire_timeout(), Duration::from_secs(5));
        assert_eq!(config.lock_timeout(), None);

        config.lock_timeout_ms = 250;
        assert_eq!(config.lock_timeout(), Some(Duration::from_millis(250)));
    }

    #[test]
    fn test_database_config_rejects_inverted_pool_bounds() {
        let mut config = database_config();
        config.min_connections = 20;
        config.max_connections = 5;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_server_config_base_path() {
        let mut config = ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 8080,
            base_path: "/api".to_string(),
            request_timeout_secs: 30,
            enable_compression: true,
            enable_cors: false,
            cors_allowed_origins: Vec::new(),
        };
        assert!(config.validate().is_ok());

        config.base_path = "api".to_string();
        assert!(config.validate().is_err());

        config.base_path = "/api".to_string();
        config.enable_cors = true;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_log_config_options() {
        let config = LogConfig {
            level: "INFO".to_string(),
            format: "json".to_string(),
            directory: None,
        };
        assert!(config.validate().is_ok());

        let config = LogConfig {
            level: "verbose".to_string(),
            format: "pretty".to_string(),
            directory: None,
        };
        assert!(config.validate().is_err());
    }
}
