//! # API REST
//!
//! REST API for the case tracker.
//!
//! Handles:
//! - HTTP endpoints with axum
//! - OpenAPI/Swagger documentation
//! - REST-specific concerns (JSON bodies, status codes, CORS, the HTML month page)
//!
//! All case logic lives in `case-core`; handlers translate requests into `CaseService` calls
//! and `CaseError`s into status codes.

#![warn(rust_2018_idioms)]

pub mod dto;
mod handlers;

use axum::{
    routing::{delete, get},
    Router,
};
use case_core::CaseService;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

pub use handlers::error_status;

/// Application state shared across REST handlers.
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<CaseService>,
}

impl AppState {
    pub fn new(service: CaseService) -> Self {
        Self {
            service: Arc::new(service),
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::health,
        handlers::list_cases,
        handlers::submit_case,
        handlers::delete_case_at,
        handlers::delete_case_by_key,
        handlers::month_view,
        handlers::month_html,
    ),
    components(schemas(
        dto::HealthRes,
        dto::ErrorRes,
        dto::CaseFormReq,
        dto::CasesRes,
        dto::DeleteRes,
        dto::DayRes,
        dto::MonthRes,
    ))
)]
pub struct ApiDoc;

/// Builds the REST router with Swagger UI mounted at `/swagger-ui`.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        .route(
            "/cases",
            get(handlers::list_cases).post(handlers::submit_case),
        )
        .route("/cases/:index", delete(handlers::delete_case_at))
        .route("/cases/key/:key", delete(handlers::delete_case_by_key))
        .route("/month", get(handlers::month_view))
        .route("/month/html", get(handlers::month_html))
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Binds `addr` and serves the router until the process stops.
pub async fn serve(addr: &str, state: AppState) -> anyhow::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("-- Case REST API listening on {}", listener.local_addr()?);
    axum::serve(listener, router(state)).await?;
    Ok(())
}
