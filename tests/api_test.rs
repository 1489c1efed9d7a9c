mod common;

use axum::http::{Method, StatusCode};
use serde_json::json;

use common::{memory_app, send, test_quotes};

#[tokio::test]
async fn test_health() {
    let (app, _) = memory_app(test_quotes());

    let (status, body) = send(&app, Method::GET, "/api/system/health", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["storage"], "memory");
    assert_eq!(body["constituents"], 0);
}

#[tokio::test]
async fn test_portfolio_lifecycle() {
    let (app, _) = memory_app(test_quotes());

    let (status, created) = send(
        &app,
        Method::POST,
        "/api/portfolios",
        Some(json!({"name": "Growth", "description": "Tech heavy"})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let id = created["portfolio_id"].as_i64().unwrap();

    let (status, page) = send(&app, Method::GET, "/api/portfolios?page=1&page_size=10", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(page["total"], 1);
    assert_eq!(page["data"][0]["name"], "Growth");

    let (status, updated) = send(
        &app,
        Method::PUT,
        &format!("/api/portfolios/{}", id),
        Some(json!({"name": "Growth 2"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["name"], "Growth 2");
    assert!(updated["description"].is_null());

    let (status, _) = send(&app, Method::DELETE, &format!("/api/portfolios/{}", id), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, body) = send(&app, Method::GET, &format!("/api/portfolios/{}", id), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body["error"].as_str().unwrap().contains(&id.to_string()));
}

#[tokio::test]
async fn test_add_stock_flow() {
    let quotes = test_quotes();
    let (app, store) = memory_app(quotes.clone());
    let (_, created) = send(&app, Method::POST, "/api/portfolios", Some(json!({"name": "Growth"}))).await;
    let id = created["portfolio_id"].as_i64().unwrap();
    let holdings_uri = format!("/api/portfolios/{}/holdings", id);

    let (status, first) = send(
        &app,
        Method::POST,
        &holdings_uri,
        Some(json!({"ticker": "aapl", "shares": "2"})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(first["holding"]["shares"], 2);
    assert_eq!(first["stock"]["ticker_symbol"], "AAPL");
    assert_eq!(first["stock_created"], true);

    quotes.set_quote("AAPL", "Apple Inc.", 152.5);
    let (status, second) = send(
        &app,
        Method::POST,
        &holdings_uri,
        Some(json!({"ticker": "AAPL", "shares": 3})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(second["holding"]["shares"], 5);
    assert_eq!(second["holding_created"], false);

    // 無法解析的股數視為 1
    let (status, third) = send(
        &app,
        Method::POST,
        &holdings_uri,
        Some(json!({"ticker": "AAPL", "shares": "lots"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(third["holding"]["shares"], 6);

    let (status, value) = send(&app, Method::GET, &format!("/api/portfolios/{}/value", id), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(value["total_value"], 6.0 * 152.5);

    let (status, detail) = send(&app, Method::GET, &format!("/api/portfolios/{}", id), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(detail["holdings"].as_array().unwrap().len(), 1);
    assert_eq!(detail["holdings"][0]["company_name"], "Apple Inc.");
    assert_eq!(detail["total_value"], 6.0 * 152.5);

    let holding_id = first["holding"]["holding_id"].as_i64().unwrap();
    let (status, _) = send(
        &app,
        Method::DELETE,
        &format!("{}/{}", holdings_uri, holding_id),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert_eq!(store.stock_count().await, 1);
    assert_eq!(store.holding_count().await, 0);

    let (status, _) = send(
        &app,
        Method::DELETE,
        &format!("{}/{}", holdings_uri, holding_id),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_add_stock_errors() {
    let (app, store) = memory_app(test_quotes());
    let (_, created) = send(&app, Method::POST, "/api/portfolios", Some(json!({"name": "Growth"}))).await;
    let id = created["portfolio_id"].as_i64().unwrap();

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/portfolios/999/holdings",
        Some(json!({"ticker": "AAPL"})),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body["error"].is_string());

    let holdings_uri = format!("/api/portfolios/{}/holdings", id);
    let (status, _) = send(&app, Method::POST, &holdings_uri, Some(json!({"ticker": ""}))).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    let (status, body) = send(&app, Method::POST, &holdings_uri, Some(json!({"ticker": "ZZZZ"}))).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body["error"].as_str().unwrap().contains("ZZZZ"));

    let (status, body) = send(&app, Method::POST, "/api/portfolios", Some(json!({"name": "   "}))).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body["error"].is_string());

    assert_eq!(store.stock_count().await, 0);
}

#[tokio::test]
async fn test_constituent_endpoints() {
    let (app, _) = memory_app(test_quotes());

    let (status, body) = send(
        &app,
        Method::PUT,
        "/api/index/constituents",
        Some(json!([
            {"ticker": "brk.b", "short_name": "Berkshire Hathaway", "sector": "Financials", "industry": "Multi-Sector Holdings", "price": 410.0},
            {"ticker": "BRK-B", "short_name": "Duplicate", "sector": "Energy"},
            {"ticker": "XOM", "sector": "Energy", "industry": "Integrated Oil & Gas"},
            {"ticker": "NVDA", "sector": "Information Technology", "industry": "Semiconductors"}
        ])),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["count"], 3);

    let (status, all) = send(&app, Method::GET, "/api/index/constituents?sector=All", None).await;
    assert_eq!(status, StatusCode::OK);
    let tickers: Vec<_> = all
        .as_array()
        .unwrap()
        .iter()
        .map(|c| c["ticker"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(tickers, vec!["BRK-B", "NVDA", "XOM"]);

    let (_, energy) = send(&app, Method::GET, "/api/index/constituents?sector=Energy", None).await;
    assert_eq!(energy.as_array().unwrap().len(), 1);
    assert_eq!(energy[0]["ticker"], "XOM");

    let (status, brk) = send(&app, Method::GET, "/api/index/constituents/brk.b", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(brk["sector"], "Financials");

    let (status, _) = send(&app, Method::GET, "/api/index/constituents/TSLA", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, health) = send(&app, Method::GET, "/api/system/health", None).await;
    assert_eq!(health["constituents"], 3);
}

#[tokio::test]
async fn test_replace_constituents_rejects_malformed_tickers() {
    let (app, _) = memory_app(test_quotes());
    let (status, _) = send(
        &app,
        Method::PUT,
        "/api/index/constituents",
        Some(json!([{"ticker": "XOM", "sector": "Energy"}])),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    for ticker in ["ABCDEFGHIJKLMNOPQ", "AB CD;x"] {
        let (status, body) = send(
            &app,
            Method::PUT,
            "/api/index/constituents",
            Some(json!([
                {"ticker": "CVX", "sector": "Energy"},
                {"ticker": ticker, "sector": "Energy"}
            ])),
        )
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert!(body["error"].is_string());
    }

    let (_, all) = send(&app, Method::GET, "/api/index/constituents", None).await;
    assert_eq!(all.as_array().unwrap().len(), 1);
    assert_eq!(all[0]["ticker"], "XOM");
}
