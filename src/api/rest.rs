// src/api/rest.rs
use std::net::SocketAddr;
use std::time::Duration;

use anyhow::{Context, Result};
use axum::http::{header, HeaderValue, Method};
use axum::Router;
use tokio::net::TcpListener;
use tower_http::{
    compression::CompressionLayer,
    cors::CorsLayer,
    timeout::TimeoutLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::{info, warn};

use super::{routes::api_routes, state::AppState};
use crate::config::ServerConfig;

pub struct RestApi {
    server_config: ServerConfig,
    state: AppState,
}

impl RestApi {
    pub fn new(server_config: ServerConfig, state: AppState) -> Self {
        Self {
            server_config,
            state,
        }
    }

    /// 啟動服務，收到 Ctrl-C 後停止接受新連線並等待進行中的請求完成
    pub async fn start(self) -> Result<()> {
        let app = self.build_app();

        let addr = SocketAddr::from((
            self.server_config
                .host
                .parse::<std::net::IpAddr>()
                .with_context(|| format!("無效的監聽位址: {}", self.server_config.host))?,
            self.server_config.port,
        ));

        info!("Starting REST API server on {}", addr);

        let listener = TcpListener::bind(addr)
            .await
            .with_context(|| format!("無法綁定 {}", addr))?;
        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        info!("REST API server stopped");
        Ok(())
    }

    pub fn build_app(&self) -> Router {
        let base_path = self.server_config.base_path.trim_end_matches('/');
        let api_router = api_routes();

        // 根路徑不能 nest，直接合併
        let router = if base_path.is_empty() {
            Router::new().merge(api_router)
        } else {
            Router::new().nest(base_path, api_router)
        };

        let mut app = router
            .layer(
                TraceLayer::new_for_http()
                    .make_span_with(DefaultMakeSpan::new().include_headers(false))
                    .on_response(DefaultOnResponse::new()),
            )
            .layer(TimeoutLayer::new(Duration::from_secs(
                self.server_config.request_timeout_secs,
            )));

        if self.server_config.enable_compression {
            app = app.layer(CompressionLayer::new());
        }
        if self.server_config.enable_cors {
            app = app.layer(self.build_cors_layer());
        }

        app.with_state(self.state.clone())
    }

    fn build_cors_layer(&self) -> CorsLayer {
        let origins: Vec<HeaderValue> = self
            .server_config
            .cors_allowed_origins
            .iter()
            .filter_map(|origin| match origin.parse() {
                Ok(value) => Some(value),
                Err(_) => {
                    warn!(%origin, "略過無效的 CORS 來源");
                    None
                }
            })
            .collect();

        CorsLayer::new()
            .allow_methods(vec![Method::GET, Method::POST, Method::PUT, Method::DELETE])
            .allow_headers(vec![header::CONTENT_TYPE])
            .allow_origin(origins)
    }
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("接收到關閉信號，正在退出..."),
        Err(err) => warn!("無法監聽關閉信號: {}", err),
    }
}
