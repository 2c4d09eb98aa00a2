pub mod adapters;
pub mod cli;
pub mod config;
pub mod db;
pub mod domain;
pub mod error;
pub mod handlers;
pub mod health;
pub mod middleware;
pub mod openapi;
pub mod ports;
pub mod schemas;
pub mod use_cases;
pub mod utils;
pub mod validation;

use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use std::time::Instant;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::middleware::{request_logger_middleware, RequestLogConfig};
use crate::openapi::ApiDoc;
use crate::ports::LedgerStore;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn LedgerStore>,
    pub start_time: Instant,
    pub request_log: RequestLogConfig,
}

impl AppState {
    pub fn new(store: Arc<dyn LedgerStore>) -> Self {
        Self {
            store,
            start_time: Instant::now(),
            request_log: RequestLogConfig::default(),
        }
    }
}

pub fn create_app(state: AppState) -> Router {
    let request_log = state.request_log;

    Router::new()
        .route("/", get(handlers::root))
        .route("/health", get(handlers::health))
        .route("/api/v1/wallets/:wallet_id", get(handlers::wallets::get_balance))
        .route(
            "/api/v1/wallets/:wallet_id/operation",
            post(handlers::wallets::wallet_operation),
        )
        .route(
            "/api/v1/wallets/:wallet_id/transactions",
            get(handlers::wallets::list_transactions),
        )
        .with_state(state)
        .merge(SwaggerUi::new("/docs").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(axum::middleware::from_fn_with_state(
            request_log,
            request_logger_middleware,
        ))
}
