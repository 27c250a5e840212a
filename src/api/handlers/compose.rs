//! Mockup composition endpoint

use std::collections::{HashMap, HashSet};
use std::time::Instant;

use actix_web::http::StatusCode;
use actix_web::{web, HttpResponse};
use base64::Engine;
use bytes::Bytes;
use futures::future::try_join_all;
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};
use utoipa::ToSchema;

use super::error_response;
use crate::AppState;
use crate::domain::{find_spec, Background, StatusBarStyle};
use crate::engine::{
    encode_png, CompositorError, LayoutError, LayoutOptions, MockupOutput, MockupRequest,
    OutputMode, ScreenshotSource,
};

/// Where to get a screenshot from; exactly one field must be set
#[derive(Debug, Deserialize, ToSchema)]
pub struct ScreenshotInput {
    /// HTTP(S) URL of the screenshot
    pub url: Option<String>,
    /// Base64 encoded image, optionally as a `data:` URL
    pub base64: Option<String>,
}

/// Request body for mockup composition
#[derive(Debug, Deserialize, ToSchema)]
pub struct ComposeRequest {
    /// Screenshot per device, keyed by device name or key (e.g. "iPhone X" or "iphone_x")
    pub screenshots: HashMap<String, ScreenshotInput>,
    pub width: Option<u32>,
    pub height: Option<u32>,
    /// CSS color, `0xRRGGBBAA` string or packed number
    #[schema(value_type = Option<String>)]
    pub background: Option<serde_json::Value>,
    /// none, light or dark
    pub status_bar: Option<String>,
    pub padding_x: Option<f64>,
    pub padding_y: Option<f64>,
}

/// Response for a successful composition
#[derive(Serialize, ToSchema)]
pub struct ComposeResponse {
    pub success: bool,
    /// PNG as a data URL
    pub mockup_url: String,
    pub metadata: ComposeMetadata,
}

#[derive(Serialize, ToSchema)]
pub struct ComposeMetadata {
    pub generation_time_ms: u64,
    /// Devices in drawing order
    pub devices: Vec<String>,
    pub dimensions: Dimensions,
    pub bytes: usize,
}

#[derive(Serialize, ToSchema)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

/// A request that can't be served, with the status to answer with
struct Rejection {
    status: StatusCode,
    code: &'static str,
    message: String,
}

impl Rejection {
    fn bad_request(code: &'static str, message: impl Into<String>) -> Self {
        Rejection {
            status: StatusCode::BAD_REQUEST,
            code,
            message: message.into(),
        }
    }

    fn internal(code: &'static str, message: impl Into<String>) -> Self {
        Rejection {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            code,
            message: message.into(),
        }
    }

    fn into_response(self) -> HttpResponse {
        if self.status.is_server_error() {
            error!(code = self.code, error = %self.message, "Mockup composition failed");
        } else {
            warn!(code = self.code, error = %self.message, "Rejected compose request");
        }
        error_response(self.status, self.code, self.message)
    }
}

impl From<LayoutError> for Rejection {
    fn from(err: LayoutError) -> Self {
        let message = err.to_string();
        match err {
            LayoutError::NoScreenshots(_) => Rejection::bad_request("NO_SCREENSHOTS", message),
            LayoutError::UnknownDevice(_) => Rejection::bad_request("UNKNOWN_DEVICE", message),
            LayoutError::InvalidBackground(_) => {
                Rejection::bad_request("INVALID_BACKGROUND", message)
            }
            LayoutError::Placement(_) => Rejection::bad_request("INVALID_OPTIONS", message),
            LayoutError::Compositor(CompositorError::MissingScreenshot(_))
            | LayoutError::Compositor(CompositorError::ScreenshotDecode { .. }) => {
                Rejection::bad_request("INVALID_SCREENSHOT", message)
            }
            LayoutError::Compositor(CompositorError::Catalog(_))
            | LayoutError::Write { .. }
            | LayoutError::Task(_) => Rejection::internal("COMPOSITION_FAILED", message),
        }
    }
}

impl ComposeRequest {
    /// Overlay request fields on the configured defaults
    fn layout_options(&self, defaults: LayoutOptions) -> Result<LayoutOptions, Rejection> {
        let background = match &self.background {
            None => defaults.background,
            Some(value) => parse_background(value).map_err(Rejection::from)?,
        };
        let status_bar = match &self.status_bar {
            None => defaults.status_bar,
            Some(style) => StatusBarStyle::parse(style)
                .map_err(|e| Rejection::bad_request("INVALID_STATUS_BAR", e))?,
        };

        Ok(LayoutOptions {
            width: self.width.unwrap_or(defaults.width),
            height: self.height.unwrap_or(defaults.height),
            background,
            status_bar,
            padding_x: self.padding_x.unwrap_or(defaults.padding_x),
            padding_y: self.padding_y.unwrap_or(defaults.padding_y),
        })
    }
}

fn parse_background(value: &serde_json::Value) -> Result<Background, LayoutError> {
    serde_json::from_value::<Background>(value.clone())
        .map_err(|_| LayoutError::InvalidBackground(value.to_string()))
}

/// Decode a base64 payload, accepting a `data:image/...;base64,` prefix
fn decode_base64(input: &str) -> Result<Bytes, base64::DecodeError> {
    let payload = match input.strip_prefix("data:") {
        Some(rest) => rest.split_once(',').map(|(_, data)| data).unwrap_or(rest),
        None => input,
    };
    base64::engine::general_purpose::STANDARD
        .decode(payload.trim())
        .map(Bytes::from)
}

/// Turn one input into screenshot bytes
async fn fetch_screenshot(
    client: &reqwest::Client,
    device: &str,
    input: &ScreenshotInput,
) -> Result<ScreenshotSource, Rejection> {
    match (&input.url, &input.base64) {
        (Some(url), None) => {
            info!(device = %device, url = %url, "Fetching screenshot");
            let response = client.get(url).send().await.map_err(|e| {
                Rejection::bad_request("FETCH_FAILED", format!("{device}: {e}"))
            })?;

            if !response.status().is_success() {
                return Err(Rejection::bad_request(
                    "FETCH_FAILED",
                    format!("{device}: HTTP {} from {url}", response.status()),
                ));
            }

            let bytes = response.bytes().await.map_err(|e| {
                Rejection::bad_request("FETCH_FAILED", format!("{device}: {e}"))
            })?;
            Ok(ScreenshotSource::Bytes(bytes))
        }
        (None, Some(data)) => decode_base64(data)
            .map(ScreenshotSource::Bytes)
            .map_err(|e| Rejection::bad_request("INVALID_BASE64", format!("{device}: {e}"))),
        _ => Err(Rejection::bad_request(
            "INVALID_SCREENSHOT",
            format!("{device}: set exactly one of url or base64"),
        )),
    }
}

/// POST /api/v1/mockups/compose - Compose screenshots into device frames
#[utoipa::path(
    post,
    path = "/api/v1/mockups/compose",
    tag = "mockups",
    request_body = ComposeRequest,
    responses(
        (status = 200, description = "Mockup composed successfully", body = ComposeResponse),
        (status = 400, description = "Unknown device, bad screenshot or invalid options", body = super::ErrorResponse),
        (status = 500, description = "Composition failed", body = super::ErrorResponse)
    )
)]
pub async fn compose_mockup(
    state: web::Data<AppState>,
    body: web::Json<ComposeRequest>,
) -> HttpResponse {
    match compose(&state, body.into_inner()).await {
        Ok(response) => HttpResponse::Ok().json(response),
        Err(rejection) => rejection.into_response(),
    }
}

async fn compose(state: &AppState, request: ComposeRequest) -> Result<ComposeResponse, Rejection> {
    let start = Instant::now();

    let defaults = state
        .settings
        .defaults
        .layout_options()
        .map_err(|e| Rejection::internal("INVALID_CONFIGURATION", e))?;
    let options = request.layout_options(defaults)?;
    options.validate().map_err(LayoutError::from)?;

    if request.screenshots.is_empty() {
        return Err(LayoutError::NoScreenshots(format!(
            "expected one of: {}",
            state.mockup.device_names().join(", ")
        ))
        .into());
    }

    // Resolve device aliases before fetching anything
    let mut inputs = Vec::with_capacity(request.screenshots.len());
    let mut seen = HashSet::new();
    for (key, input) in &request.screenshots {
        let spec = find_spec(key).ok_or_else(|| LayoutError::UnknownDevice(key.clone()))?;
        if !seen.insert(spec.name) {
            return Err(Rejection::bad_request(
                "DUPLICATE_DEVICE",
                format!("{} was given more than one screenshot", spec.name),
            ));
        }
        inputs.push((spec.name, input));
    }

    info!(
        devices = inputs.len(),
        width = options.width,
        height = options.height,
        "Processing compose request"
    );

    let client = &state.http_client;
    let sources = try_join_all(inputs.into_iter().map(|(name, input)| async move {
        let source = fetch_screenshot(client, name, input).await?;
        Ok::<_, Rejection>((name.to_string(), source))
    }))
    .await?;

    let mockup_request = MockupRequest::new(sources.into_iter().collect())
        .with_options(options)
        .with_output(OutputMode::InMemory);

    let image = match state.mockup.up(mockup_request).await? {
        MockupOutput::Image(image) => image,
        MockupOutput::Written(path) => {
            return Err(Rejection::internal(
                "COMPOSITION_FAILED",
                format!("unexpected file output {}", path.display()),
            ))
        }
    };

    let (width, height) = image.dimensions();
    let png = web::block(move || encode_png(&image))
        .await
        .map_err(|e| Rejection::internal("ENCODING_FAILED", e.to_string()))?
        .map_err(|e| Rejection::internal("ENCODING_FAILED", e.to_string()))?;

    let mut devices: Vec<String> = request
        .screenshots
        .keys()
        .filter_map(|key| find_spec(key).map(|spec| spec.name))
        .map(String::from)
        .collect();
    let order = state.mockup.device_names();
    devices.sort_by_key(|name| order.iter().position(|known| known == name));

    let elapsed = start.elapsed().as_millis() as u64;
    info!(
        generation_time_ms = elapsed,
        bytes = png.len(),
        "Mockup composed successfully"
    );

    Ok(ComposeResponse {
        success: true,
        mockup_url: format!(
            "data:image/png;base64,{}",
            base64::engine::general_purpose::STANDARD.encode(&png)
        ),
        metadata: ComposeMetadata {
            generation_time_ms: elapsed,
            devices,
            dimensions: Dimensions { width, height },
            bytes: png.len(),
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use actix_web::{test as actix_test, App};
    use image::Rgba;
    use serde_json::json;

    use crate::config::Settings;
    use crate::engine::{testing, Mockup};

    fn png_base64(w: u32, h: u32) -> String {
        let mut png = Vec::new();
        testing::solid(w, h, Rgba([10, 120, 240, 255]))
            .write_to(&mut std::io::Cursor::new(&mut png), image::ImageOutputFormat::Png)
            .unwrap();
        base64::engine::general_purpose::STANDARD.encode(png)
    }

    async fn post(body: serde_json::Value) -> (StatusCode, serde_json::Value) {
        let mockup = Arc::new(Mockup::from_catalog(testing::catalog()));
        let state = web::Data::new(AppState::new(Settings::default(), mockup).unwrap());
        let app = actix_test::init_service(
            App::new()
                .app_data(state)
                .configure(crate::api::configure_routes),
        )
        .await;

        let req = actix_test::TestRequest::post()
            .uri("/api/v1/mockups/compose")
            .set_json(body)
            .to_request();
        let resp = actix_test::call_service(&app, req).await;
        let status = resp.status();
        let body: serde_json::Value = actix_test::read_body_json(resp).await;
        (status, body)
    }

    #[actix_rt::test]
    async fn test_compose_returns_png_data_url() {
        let (status, body) = post(json!({
            "screenshots": {
                "iphone_x": { "base64": png_base64(375, 812) },
                "PC": { "base64": format!("data:image/png;base64,{}", png_base64(1920, 1080)) }
            },
            "width": 800,
            "height": 600,
            "background": "#ffffff"
        }))
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);
        assert_eq!(body["metadata"]["dimensions"]["width"], 800);
        assert_eq!(body["metadata"]["devices"], json!(["PC", "iPhone X"]));

        let url = body["mockup_url"].as_str().unwrap();
        let png = decode_base64(url).unwrap();
        let image = image::load_from_memory(&png).unwrap().to_rgba8();
        assert_eq!(image.dimensions(), (800, 600));
        assert_eq!(*image.get_pixel(0, 0), Rgba([255, 255, 255, 255]));
    }

    #[actix_rt::test]
    async fn test_unknown_device_is_bad_request() {
        let (status, body) = post(json!({
            "screenshots": { "Galaxy S9": { "base64": png_base64(10, 10) } }
        }))
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "UNKNOWN_DEVICE");
    }

    #[actix_rt::test]
    async fn test_empty_screenshots_is_bad_request() {
        let (status, body) = post(json!({ "screenshots": {} })).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "NO_SCREENSHOTS");
    }

    #[actix_rt::test]
    async fn test_bad_inputs_are_rejected() {
        let (status, body) = post(json!({
            "screenshots": { "iPad": { "base64": "!!not base64!!" } }
        }))
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "INVALID_BASE64");

        let (status, body) = post(json!({
            "screenshots": { "iPad": { "base64": "aGVsbG8=" } }
        }))
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "INVALID_SCREENSHOT");

        let (status, body) = post(json!({
            "screenshots": { "iPad": {} }
        }))
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "INVALID_SCREENSHOT");
    }

    #[actix_rt::test]
    async fn test_invalid_options_are_rejected() {
        let shot = json!({ "iPad": { "base64": png_base64(10, 10) } });

        let (status, body) = post(json!({ "screenshots": shot.clone(), "background": "chartreuse-ish" })).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "INVALID_BACKGROUND");

        let (status, body) = post(json!({ "screenshots": shot.clone(), "status_bar": "blue" })).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "INVALID_STATUS_BAR");

        let (status, body) = post(json!({ "screenshots": shot, "padding_x": 2.0 })).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "INVALID_OPTIONS");
    }

    #[actix_rt::test]
    async fn test_oversized_canvas_is_rejected() {
        let (status, body) = post(json!({
            "screenshots": { "iPad": { "base64": png_base64(10, 10) } },
            "width": 100000,
            "height": 100000
        }))
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "INVALID_OPTIONS");
    }

    #[actix_rt::test]
    async fn test_same_device_twice_is_rejected() {
        let (status, body) = post(json!({
            "screenshots": {
                "iPhone X": { "base64": png_base64(375, 812) },
                "iphone_x": { "base64": png_base64(375, 812) }
            }
        }))
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "DUPLICATE_DEVICE");
    }

    #[test]
    fn test_numeric_background() {
        let bg = parse_background(&json!(0xff0000ffu32)).unwrap();
        assert_eq!(bg, Background::rgba(255, 0, 0, 255));
        assert!(parse_background(&json!(true)).is_err());
    }
}
