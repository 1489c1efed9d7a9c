pub mod holding;
pub mod index_constituent;
pub mod portfolio;
pub mod stock;

// 重新匯出常用模型類型
pub use holding::*;
pub use index_constituent::*;
pub use portfolio::*;
pub use stock::*;
