// api.rs - API服務模組，宣告子模組
//
// 以 JSON REST 介面提供投資組合管理、持股新增與成分股查詢。

/// 錯誤與 HTTP 狀態碼對應
pub mod error;
/// API處理器模組
pub mod handlers;
/// REST API實現
pub mod rest;
/// API路由定義
pub mod routes;
/// 共享狀態
pub mod state;

pub use error::ApiError;
pub use rest::RestApi;
pub use state::AppState;
