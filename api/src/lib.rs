//! Storefront backend: persistence, collection queries, cart cleanup and the
//! HTTP API served by `storefront-server`.

pub mod catalog;
pub mod cleanup_service;
pub mod config;
pub mod database;
pub mod openapi;
pub mod query;

use config::AppConfig;
use database::Database;
use poem::{middleware::Cors, Endpoint, EndpointExt, Route};
use poem_openapi::OpenApiService;
use std::sync::Arc;

/// HTTP application: the OpenAPI service under `/api/v1` and Swagger UI under `/docs`
pub fn build_app(database: Arc<Database>, config: AppConfig) -> impl Endpoint {
    let api_service = OpenApiService::new(
        openapi::create_combined_api(),
        "Storefront API",
        env!("CARGO_PKG_VERSION"),
    )
    .server(format!("http://localhost:{}/api/v1", config.port));
    let swagger_ui = api_service.swagger_ui();

    Route::new()
        .nest("/api/v1", api_service)
        .nest("/docs", swagger_ui)
        .data(database)
        .data(config)
        .with(Cors::new())
}
