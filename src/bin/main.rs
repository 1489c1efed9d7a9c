use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use metrics_exporter_prometheus::PrometheusBuilder;
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use portfolio_tracker::api::{AppState, RestApi};
use portfolio_tracker::config::{
    self, ApplicationConfig, LogConfig, MetricsConfig, QuoteProviderKind, StorageBackend,
};
use portfolio_tracker::data_provider::{
    ConstituentCache, QuoteProvider, StaticQuoteProvider, YahooQuoteProvider,
};
use portfolio_tracker::portfolio::PortfolioService;
use portfolio_tracker::storage::{
    init_db_pool, run_migrations, MemoryStore, PgHoldingRepository,
    PgIndexConstituentRepository, PgPortfolioRepository,
};

#[tokio::main]
async fn main() -> Result<()> {
    // 初始化配置
    let app_config = config::init_config().context("載入配置失敗")?;

    // 初始化日誌系統，guard 需存活到程式結束才會寫完檔案
    let _log_guard = init_logging(&app_config.log)?;

    if app_config.metrics.enabled {
        init_metrics(&app_config.metrics)?;
    }

    let quotes = build_quote_provider(app_config)?;
    let state = build_state(app_config, quotes).await?;

    match state.service.load_constituents().await {
        Ok(count) => info!(count, "成分股快照載入完成"),
        Err(e) => warn!(error = %e, "無法載入成分股快照，以空快照啟動"),
    }

    info!("伺服器初始化完成，監聽端口: {}", app_config.server.port);
    RestApi::new(app_config.server.clone(), state).start().await
}

fn build_quote_provider(app_config: &ApplicationConfig) -> Result<Arc<dyn QuoteProvider>> {
    let provider: Arc<dyn QuoteProvider> = match app_config.quotes.provider {
        QuoteProviderKind::Yahoo => Arc::new(
            YahooQuoteProvider::new(&app_config.quotes).context("無法建立 Yahoo 行情客戶端")?,
        ),
        QuoteProviderKind::Static => {
            warn!("使用固定行情來源，未設定的代號一律查無行情");
            Arc::new(StaticQuoteProvider::new())
        }
    };
    info!(provider = provider.name(), "行情來源已就緒");
    Ok(provider)
}

async fn build_state(
    app_config: &ApplicationConfig,
    quotes: Arc<dyn QuoteProvider>,
) -> Result<AppState> {
    let backend = app_config.storage.backend;

    match backend {
        StorageBackend::Postgres => {
            let pool = init_db_pool(&app_config.database).await?;

            if app_config.storage.run_migrations {
                run_migrations(&pool).await.context("資料庫遷移失敗")?;
            }

            let holdings = PgHoldingRepository::new(pool.clone())
                .with_lock_timeout(app_config.database.lock_timeout());
            let service = PortfolioService::new(
                Arc::new(PgPortfolioRepository::new(pool.clone())),
                Arc::new(holdings),
                Arc::new(PgIndexConstituentRepository::new(pool.clone())),
                quotes,
                Arc::new(ConstituentCache::new()),
            );

            Ok(AppState::new(Arc::new(service), backend).with_db_pool(pool))
        }
        StorageBackend::Memory => {
            warn!("使用記憶體儲存，重新啟動後資料將遺失");
            let service = PortfolioService::with_memory_store(Arc::new(MemoryStore::new()), quotes);
            Ok(AppState::new(Arc::new(service), backend))
        }
    }
}

// 初始化日誌系統
fn init_logging(log_config: &LogConfig) -> Result<Option<WorkerGuard>> {
    // RUST_LOG 優先，否則使用配置的等級
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(log_config.level.to_lowercase()))
        .context("無效的日誌等級")?;

    let (file_layer, guard) = match &log_config.directory {
        Some(directory) => {
            let appender = tracing_appender::rolling::daily(directory, "portfolio_tracker.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            (
                Some(fmt::layer().with_ansi(false).with_writer(writer)),
                Some(guard),
            )
        }
        None => (None, None),
    };

    let registry = tracing_subscriber::registry().with(filter).with(file_layer);
    let result = if log_config.format == "json" {
        registry.with(fmt::layer().json()).try_init()
    } else {
        registry.with(fmt::layer().pretty()).try_init()
    };
    result.map_err(|e| anyhow!("設置日誌系統失敗: {}", e))?;

    info!("日誌系統初始化完成");
    Ok(guard)
}

fn init_metrics(metrics_config: &MetricsConfig) -> Result<()> {
    PrometheusBuilder::new()
        .with_http_listener(([0, 0, 0, 0], metrics_config.listen_port))
        .install()
        .context("無法啟動 Prometheus 指標輸出")?;

    info!(port = metrics_config.listen_port, "Prometheus 指標輸出已啟動");
    Ok(())
}
