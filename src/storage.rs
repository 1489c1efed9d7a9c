pub mod database;
pub mod memory;
pub mod migrations;
pub mod models;
pub mod repository;

// 只匯出必要的數據庫功能
pub use database::{init_db_pool, DatabasePool};

// 匯出主要的模型
pub use models::{
    Holding, HoldingUpsert, HoldingUpsertOutcome, HoldingWithStock, IndexConstituent,
    IndexConstituentInsert, Portfolio, PortfolioInsert, Stock,
};

// 匯出主要的倉儲接口和實現
pub use repository::{
    DbExecutor, HoldingRepository, IndexConstituentRepository, Page, PageQuery,
    PgHoldingRepository, PgIndexConstituentRepository, PgPortfolioRepository,
    PortfolioRepository,
};

pub use memory::MemoryStore;

// 匯出遷移功能
pub use migrations::{migration_status, run_migrations};
