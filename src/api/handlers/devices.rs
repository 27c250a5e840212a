//! Device listing endpoint

use actix_web::{web, HttpResponse};
use serde::Serialize;
use utoipa::ToSchema;

use crate::AppState;
use crate::domain::DEVICES;

/// A device that can be requested
#[derive(Serialize, ToSchema)]
pub struct DeviceInfo {
    /// Name used as key in compose requests
    pub name: String,
    /// Lowercase alias accepted by the CLI and the API
    pub key: String,
    pub screen_width: u32,
    pub screen_height: u32,
    pub template_width: u32,
    pub template_height: u32,
    pub supports_status_bar: bool,
    pub rotates_to_fit: bool,
}

#[derive(Serialize, ToSchema)]
pub struct DevicesResponse {
    pub success: bool,
    pub data: Vec<DeviceInfo>,
    pub count: usize,
}

/// GET /api/v1/devices - List loaded devices in drawing order
#[utoipa::path(
    get,
    path = "/api/v1/devices",
    tag = "devices",
    responses(
        (status = 200, description = "Devices available for composition", body = DevicesResponse)
    )
)]
pub async fn list_devices(state: web::Data<AppState>) -> HttpResponse {
    let catalog = state.mockup.catalog();

    let data: Vec<DeviceInfo> = DEVICES
        .iter()
        .filter_map(|spec| {
            let device = catalog.lookup(spec.name).ok()?;
            Some(DeviceInfo {
                name: spec.name.to_string(),
                key: spec.cli_key(),
                screen_width: spec.screen.w,
                screen_height: spec.screen.h,
                template_width: device.template.width(),
                template_height: device.template.height(),
                supports_status_bar: spec.supports_status_bar(),
                rotates_to_fit: spec.rotates_to_fit,
            })
        })
        .collect();

    HttpResponse::Ok().json(DevicesResponse {
        success: true,
        count: data.len(),
        data,
    })
}
