//! API module - HTTP routes and handlers

pub mod handlers;
pub mod openapi;

use std::sync::Arc;
use std::time::{Duration, Instant};

use actix_web::web;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::api::openapi::ApiDoc;
use crate::config::Settings;
use crate::engine::Mockup;

const MAX_BODY_BYTES: usize = 32 * 1024 * 1024;

/// Application state shared across all handlers
pub struct AppState {
    pub settings: Settings,
    pub mockup: Arc<Mockup>,
    /// Client for screenshot URLs
    pub http_client: reqwest::Client,
    pub started_at: Instant,
}

impl AppState {
    pub fn new(settings: Settings, mockup: Arc<Mockup>) -> Result<Self, reqwest::Error> {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(settings.server.fetch_timeout_secs))
            .user_agent(concat!("device-mockup/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(AppState {
            settings,
            mockup,
            http_client,
            started_at: Instant::now(),
        })
    }
}

/// Configure all API routes
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/v1")
            .service(
                web::scope("/mockups")
                    // Screenshots arrive base64 encoded in JSON bodies
                    .app_data(web::JsonConfig::default().limit(MAX_BODY_BYTES))
                    .route("/compose", web::post().to(handlers::compose::compose_mockup))
            )
            .route("/devices", web::get().to(handlers::devices::list_devices))
    )
    .route("/health", web::get().to(handlers::health::health_check))
    // Swagger UI and OpenAPI spec
    .service(
        SwaggerUi::new("/swagger-ui/{_:.*}")
            .url("/api-docs/openapi.json", ApiDoc::openapi())
    );
}
