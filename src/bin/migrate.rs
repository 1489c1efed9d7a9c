use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use portfolio_tracker::config::ApplicationConfig;
use portfolio_tracker::storage;
use tracing::info;
use tracing_subscriber::fmt::format::FmtSpan;

#[derive(Parser)]
#[command(name = "migrate", about = "portfolio-tracker 數據庫遷移工具")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// 運行所有未應用的遷移
    Run,

    /// 檢查遷移狀態
    Status,
}

#[tokio::main]
async fn main() -> Result<()> {
    // 初始化日誌系統
    tracing_subscriber::fmt()
        .with_env_filter("portfolio_tracker=info,migrate=info")
        .with_span_events(FmtSpan::CLOSE)
        .init();

    // 解析命令行參數
    let cli = Cli::parse();

    // 遷移只需要資料庫設定，不受 storage.backend 影響
    let app_config = ApplicationConfig::load_from_env().context("載入配置失敗")?;
    let pool = storage::init_db_pool(&app_config.database)
        .await
        .context("無法初始化資料庫連接池")?;

    match cli.command {
        Commands::Run => {
            info!("開始運行資料庫遷移...");
            storage::run_migrations(&pool)
                .await
                .context("資料庫遷移執行失敗")?;
            info!("資料庫遷移完成！");
        }
        Commands::Status => {
            info!("檢查資料庫遷移狀態...");
            let status = storage::migration_status(&pool).await?;
            for (version, description, applied) in &status {
                println!(
                    "{:>16}  {:<9}  {}",
                    version,
                    if *applied { "applied" } else { "pending" },
                    description
                );
            }
            let pending = status.iter().filter(|(_, _, applied)| !applied).count();
            info!(total = status.len(), pending, "遷移狀態檢查完成");
        }
    }

    Ok(())
}
