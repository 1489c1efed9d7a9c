#![allow(dead_code)]

use std::sync::Arc;

use axum::{
    body::{to_bytes, Body},
    http::{Method, Request, StatusCode},
    Router,
};
use portfolio_tracker::{
    api::{AppState, RestApi},
    config::{ServerConfig, StorageBackend},
    data_provider::StaticQuoteProvider,
    portfolio::PortfolioService,
    storage::{run_migrations, MemoryStore},
};
use serde_json::Value;
use sqlx::{postgres::PgPoolOptions, PgPool};
use tower::ServiceExt;

/// 連線到測試資料庫並清空資料表，未設定 DATABASE_URL 時回傳 None
pub async fn setup_test_db() -> Option<PgPool> {
    let database_url = match std::env::var("DATABASE_URL") {
        Ok(url) => url,
        Err(_) => {
            eprintln!("DATABASE_URL 未設定，略過 Postgres 測試");
            return None;
        }
    };

    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(&database_url)
        .await
        .expect("Failed to connect to test database");

    run_migrations(&pool)
        .await
        .expect("Failed to run migrations");

    sqlx::query(
        "TRUNCATE portfolio_holding, stock, portfolio, index_constituent RESTART IDENTITY CASCADE",
    )
    .execute(&pool)
    .await
    .expect("Failed to clean test tables");

    Some(pool)
}

pub fn test_quotes() -> Arc<StaticQuoteProvider> {
    Arc::new(
        StaticQuoteProvider::new()
            .with_quote("AAPL", "Apple Inc.", 150.0)
            .with_quote("MSFT", "Microsoft Corporation", 400.0)
            .with_quote("NVDA", "NVIDIA Corporation", 900.0),
    )
}

pub fn test_server_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 3001,
        base_path: "/api".to_string(),
        request_timeout_secs: 5,
        enable_compression: false,
        enable_cors: false,
        cors_allowed_origins: Vec::new(),
    }
}

/// 以記憶體儲存建立完整的路由
pub fn memory_app(quotes: Arc<StaticQuoteProvider>) -> (Router, Arc<MemoryStore>) {
    let store = Arc::new(MemoryStore::new());
    let service = PortfolioService::with_memory_store(store.clone(), quotes);
    let state = AppState::new(Arc::new(service), StorageBackend::Memory);
    let app = RestApi::new(test_server_config(), state).build_app();
    (app, store)
}

/// 送出請求並解析 JSON 回應，沒有內容時回傳 Value::Null
pub async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(json) => builder
            .header("content-type", "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or_else(|_| {
            Value::String(String::from_utf8_lossy(&bytes).into_owned())
        })
    };

    (status, value)
}
