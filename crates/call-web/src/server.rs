//! Web服务器

use axum::{
    routing::{get, post},
    Router,
};
use call_core::Result;
use std::net::SocketAddr;
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::info;

use crate::handlers::{
    api_root, call, cancel, complete, export_csv, get_state, health, mark_absent, recall,
    register, renumber, reset,
};
use crate::service::AppState;
use crate::sse::display_stream;

pub struct WebServer {
    addr: SocketAddr,
    app: Router,
}

impl WebServer {
    pub fn new(addr: SocketAddr, state: AppState) -> Self {
        let app = Self::create_app(state);
        Self { addr, app }
    }

    fn create_app(state: AppState) -> Router {
        Router::new()
            // 根路径
            .route("/", get(api_root))

            // 健康检查
            .route("/health", get(health))

            // API路由
            .nest("/api/v1", api_routes())
            .with_state(state)

            // 全局中间件
            .layer(
                ServiceBuilder::new()
                    .layer(TraceLayer::new_for_http())
                    .layer(
                        CorsLayer::new()
                            .allow_origin(Any)
                            .allow_methods(Any)
                            .allow_headers(Any),
                    ),
            )
    }

    pub async fn run(self) -> Result<()> {
        info!("Starting web server on {}", self.addr);

        let listener = tokio::net::TcpListener::bind(self.addr).await?;
        axum::serve(listener, self.app).await?;

        Ok(())
    }
}

/// API v1 路由
fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/state", get(get_state))
        .route("/register", post(register))
        .route("/call", post(call))
        .route("/absent", post(mark_absent))
        .route("/recall", post(recall))
        .route("/complete", post(complete))
        .route("/cancel", post(cancel))
        .route("/renumber", post(renumber))
        .route("/reset", post(reset))
        .route("/export", get(export_csv))
        .route("/display/stream", get(display_stream))
}
