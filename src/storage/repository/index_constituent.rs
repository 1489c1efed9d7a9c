use anyhow::Result;
use async_trait::async_trait;
use sqlx::{PgPool, Postgres, QueryBuilder};

use crate::storage::{
    models::index_constituent::{ConstituentFilter, IndexConstituent, IndexConstituentInsert},
    repository::DbExecutor,
};

/// 每批插入筆數，5 個參數 × 1000 筆仍在 Postgres 綁定上限內
const INSERT_CHUNK_SIZE: usize = 1000;

const CONSTITUENT_COLUMNS: &str = "id, ticker, short_name, sector, industry, price";

/// 指數成分股儲存庫特性
#[async_trait]
pub trait IndexConstituentRepository: Send + Sync {
    /// 刪除全部後重新插入，於同一交易內完成
    async fn replace_all(&self, rows: &[IndexConstituentInsert]) -> Result<Vec<IndexConstituent>>;

    /// 依產業類別篩選，依代號排序
    async fn list_constituents(&self, filter: &ConstituentFilter) -> Result<Vec<IndexConstituent>>;
}

/// PostgreSQL 成分股儲存庫實現
pub struct PgIndexConstituentRepository {
    pool: PgPool,
}

impl PgIndexConstituentRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

impl DbExecutor for PgIndexConstituentRepository {
    fn get_pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl IndexConstituentRepository for PgIndexConstituentRepository {
    async fn replace_all(&self, rows: &[IndexConstituentInsert]) -> Result<Vec<IndexConstituent>> {
        let mut tx = self.get_pool().begin().await?;

        sqlx::query("DELETE FROM index_constituent")
            .execute(&mut *tx)
            .await?;

        let mut inserted = Vec::with_capacity(rows.len());
        for chunk in rows.chunks(INSERT_CHUNK_SIZE) {
            let mut builder: QueryBuilder<Postgres> = QueryBuilder::new(
                "INSERT INTO index_constituent (ticker, short_name, sector, industry, price) ",
            );
            builder.push_values(chunk, |mut b, row| {
                b.push_bind(&row.ticker)
                    .push_bind(&row.short_name)
                    .push_bind(&row.sector)
                    .push_bind(&row.industry)
                    .push_bind(row.price);
            });
            builder.push(" RETURNING ");
            builder.push(CONSTITUENT_COLUMNS);

            let batch = builder
                .build_query_as::<IndexConstituent>()
                .fetch_all(&mut *tx)
                .await?;
            inserted.extend(batch);
        }

        tx.commit().await?;
        Ok(inserted)
    }

    async fn list_constituents(&self, filter: &ConstituentFilter) -> Result<Vec<IndexConstituent>> {
        let mut builder: QueryBuilder<Postgres> = QueryBuilder::new("SELECT ");
        builder.push(CONSTITUENT_COLUMNS);
        builder.push(" FROM index_constituent WHERE 1=1");

        if let Some(sector) = &filter.sector {
            builder.push(" AND sector = ").push_bind(sector);
        }
        if let Some(industry) = &filter.industry {
            builder.push(" AND industry = ").push_bind(industry);
        }
        builder.push(" ORDER BY ticker");

        let rows = builder
            .build_query_as::<IndexConstituent>()
            .fetch_all(self.get_pool())
            .await?;

        Ok(rows)
    }
}
