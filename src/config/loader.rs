use config::{Config, ConfigError, Environment as ConfigEnvironment, File};
use serde::Deserialize;
use std::env;
use std::path::Path;

/// 環境類型枚舉
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Development,
    Production,
}

impl Environment {
    /// 從環境變數取得當前環境設定
    pub fn from_env() -> Self {
        match env::var("PORTFOLIO_ENV")
            .unwrap_or_else(|_| "development".into())
            .to_lowercase()
            .as_str()
        {
            "production" => Environment::Production,
            _ => Environment::Development,
        }
    }

    /// 轉換為配置文件名
    pub fn as_filename(&self) -> &'static str {
        match self {
            Environment::Development => "development.toml",
            Environment::Production => "production.toml",
        }
    }
}

/// 配置加載器，負責根據環境加載適當的配置
pub struct ConfigLoader;

impl ConfigLoader {
    /// 載入指定環境的配置
    pub fn load(env: Environment) -> Result<Config, ConfigError> {
        let config_dir = env::var("CONFIG_DIR").unwrap_or_else(|_| "config".into());
        Self::load_from_dir(Path::new(&config_dir), env)
    }

    /// 從指定目錄載入配置
    pub fn load_from_dir(config_dir: &Path, env: Environment) -> Result<Config, ConfigError> {
        let config_path = config_dir.join(env.as_filename());

        Config::builder()
            .add_source(File::from(config_path))
            // 環境變數優先級高於文件配置，例如 PORTFOLIO__SERVER__PORT=9090
            .add_source(
                ConfigEnvironment::with_prefix("PORTFOLIO")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
    }

    /// 載入當前環境的配置
    pub fn load_current() -> Result<Config, ConfigError> {
        Self::load(Environment::from_env())
    }
}

/// 配置獲取輔助特性
pub trait ConfigExt {
    /// 從配置中獲取並反序列化指定部分
    fn get_section<'a, T: Deserialize<'a>>(&'a self, section: &str) -> Result<T, ConfigError>;
}

impl ConfigExt for Config {
    fn get_section<'a, T: Deserialize<'a>>(&'a self, section: &str) -> Result<T, ConfigError> {
        self.get(section)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    #[serial]
    fn test_environment_from_env() {
        env::remove_var("PORTFOLIO_ENV");
        assert_eq!(Environment::from_env(), Environment::Development);

        env::set_var("PORTFOLIO_ENV", "production");
        assert_eq!(Environment::from_env(), Environment::Production);

        env::set_var("PORTFOLIO_ENV", "staging");
        assert_eq!(Environment::from_env(), Environment::Development);

        env::remove_var("PORTFOLIO_ENV");
    }

    #[test]
    fn test_environment_as_filename() {
        assert_eq!(Environment::Development.as_filename(), "development.toml");
        assert_eq!(Environment::Production.as_filename(), "production.toml");
    }

    #[test]
    #[serial]
    fn test_load_from_dir_reads_section() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("development.toml"),
            "[server]\nhost = \"0.0.0.0\"\nport = 8181\n",
        )
        .unwrap();

        let config = ConfigLoader::load_from_dir(dir.path(), Environment::Development).unwrap();
        let port: u16 = config.get_section("server.port").unwrap();
        assert_eq!(port, 8181);
    }

    #[test]
    fn test_missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(ConfigLoader::load_from_dir(dir.path(), Environment::Production).is_err());
    }
}
