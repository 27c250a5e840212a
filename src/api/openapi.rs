//! OpenAPI 3.0 specification definition

use utoipa::OpenApi;

use crate::api::handlers::{
    health::HealthResponse,
    devices::{DeviceInfo, DevicesResponse},
    compose::{ComposeRequest, ComposeResponse, ComposeMetadata, Dimensions, ScreenshotInput},
    ErrorResponse, ApiError,
};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Device Mockup API",
        version = "1.0.0",
        description = "Compose app screenshots into device frames on a single canvas",
        license(
            name = "MIT",
            url = "https://opensource.org/licenses/MIT"
        )
    ),
    servers(
        (url = "/", description = "Current server")
    ),
    tags(
        (name = "system", description = "System health and status endpoints"),
        (name = "devices", description = "Available device frames"),
        (name = "mockups", description = "Mockup composition endpoints")
    ),
    paths(
        crate::api::handlers::health::health_check,
        crate::api::handlers::devices::list_devices,
        crate::api::handlers::compose::compose_mockup,
    ),
    components(
        schemas(
            // Health schemas
            HealthResponse,
            // Device schemas
            DeviceInfo,
            DevicesResponse,
            // Compose schemas
            ComposeRequest,
            ScreenshotInput,
            ComposeResponse,
            ComposeMetadata,
            Dimensions,
            ErrorResponse,
            ApiError,
        )
    )
)]
pub struct ApiDoc;
