use serde::Serialize;
use sqlx::PgPool;

// 重新導出子模塊
pub mod holding;
pub mod index_constituent;
pub mod portfolio;

// 重新導出常用類型
pub use holding::{HoldingRepository, PgHoldingRepository};
pub use index_constituent::{IndexConstituentRepository, PgIndexConstituentRepository};
pub use portfolio::{PgPortfolioRepository, PortfolioRepository};

/// 分頁結果
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Page<T> {
    pub data: Vec<T>,
    pub total: i64,
    pub page: i64,
    pub page_size: i64,
    pub total_pages: i64,
}

impl<T> Page<T> {
    pub fn new(data: Vec<T>, total: i64, page: i64, page_size: i64) -> Self {
        let total_pages = if page_size > 0 {
            (total as f64 / page_size as f64).ceil() as i64
        } else {
            0
        };
        Self {
            data,
            total,
            page,
            page_size,
            total_pages,
        }
    }

    pub fn empty(page: i64, page_size: i64) -> Self {
        Self::new(Vec::new(), 0, page, page_size)
    }
}

/// 查詢分頁參數
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageQuery {
    pub page: i64,
    pub page_size: i64,
}

impl PageQuery {
    /// 每頁筆數上限
    pub const MAX_PAGE_SIZE: i64 = 200;

    /// 建立分頁參數，頁碼至少為 1，每頁筆數限制在 1..=MAX_PAGE_SIZE
    pub fn new(page: i64, page_size: i64) -> Self {
        Self {
            page: page.max(1),
            page_size: page_size.clamp(1, Self::MAX_PAGE_SIZE),
        }
    }

    pub fn offset(&self) -> i64 {
        (self.page - 1) * self.page_size
    }
}

impl Default for PageQuery {
    fn default() -> Self {
        Self {
            page: 1,
            page_size: 20,
        }
    }
}

/// 通用的數據庫操作特性
pub trait DbExecutor {
    fn get_pool(&self) -> &PgPool;
}
