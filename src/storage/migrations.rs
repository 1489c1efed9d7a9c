use anyhow::Result;
use sqlx::{migrate::Migrator, PgPool};
use tracing::info;

// 靜態嵌入遷移目錄（此目錄應放在專案根目錄）
static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

/// 執行數據庫遷移
pub async fn run_migrations(pool: &PgPool) -> Result<()> {
    info!("開始執行數據庫遷移...");
    MIGRATOR.run(pool).await?;
    info!("SQLx 遷移完成");
    Ok(())
}

/// 遷移狀態：(版本, 描述, 是否已套用)
pub async fn migration_status(pool: &PgPool) -> Result<Vec<(i64, String, bool)>> {
    // 尚未執行過任何遷移時 _sqlx_migrations 不存在
    let table_exists = sqlx::query_scalar::<_, bool>(
        "SELECT EXISTS (SELECT 1 FROM information_schema.tables WHERE table_name = '_sqlx_migrations')",
    )
    .fetch_one(pool)
    .await?;

    let applied: Vec<i64> = if table_exists {
        sqlx::query_scalar::<_, i64>("SELECT version FROM _sqlx_migrations WHERE success")
            .fetch_all(pool)
            .await?
    } else {
        Vec::new()
    };

    Ok(MIGRATOR
        .iter()
        .map(|m| {
            (
                m.version,
                m.description.to_string(),
                applied.contains(&m.version),
            )
        })
        .collect())
}
