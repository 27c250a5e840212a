//! Layout engine
//!
//! Places dressed devices on a canvas in the fixed device-table order. The
//! bounding region is threaded through that order as a value: a device that
//! locks the region (the PC) replaces it for itself and every device after it.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use image::imageops::{self, FilterType};
use image::RgbaImage;
use thiserror::Error;
use tracing::{debug, info};

use crate::domain::{
    validate_canvas, validate_padding, validate_scale, Background, BoundingRegion, DeviceLayout, PlacementError,
    StatusBarStyle, DEVICES,
};
use super::catalog::{DeviceCatalog, DeviceDescriptor};
use super::compositor::{dress, CompositorError, ScreenshotSource};
use super::raster::{apply_opacity, blur, darken};

/// Extra transparent border around a device when its shadow is built
const SHADOW_SPREAD: u32 = 20;
/// Vertical distance between the shadow canvas and the device
const SHADOW_LIFT: i64 = 15;
const SHADOW_OPACITY: f32 = 0.1;
const SHADOW_BLUR_SIGMA: f32 = 4.0;

/// Layout errors
#[derive(Debug, Error)]
pub enum LayoutError {
    #[error("No screenshot provided for a valid device ({0})")]
    NoScreenshots(String),
    #[error("{0} is not a known device")]
    UnknownDevice(String),
    #[error("Invalid background color: {0}")]
    InvalidBackground(String),
    #[error(transparent)]
    Placement(#[from] PlacementError),
    #[error(transparent)]
    Compositor(#[from] CompositorError),
    #[error("Couldn't write image to {path:?}: {reason}")]
    Write { path: PathBuf, reason: String },
    #[error("Composition task failed: {0}")]
    Task(String),
}

/// Canvas and layout options
#[derive(Debug, Clone, PartialEq)]
pub struct LayoutOptions {
    pub width: u32,
    pub height: u32,
    pub background: Background,
    pub status_bar: Option<StatusBarStyle>,
    /// Width fraction used when a device locks the region on a portrait canvas
    pub padding_x: f64,
    /// Height fraction used when a device locks the region on a landscape canvas
    pub padding_y: f64,
}

impl Default for LayoutOptions {
    fn default() -> Self {
        LayoutOptions {
            width: 1280,
            height: 720,
            background: Background::TRANSPARENT,
            status_bar: None,
            padding_x: 0.8,
            padding_y: 0.8,
        }
    }
}

impl LayoutOptions {
    pub fn validate(&self) -> Result<(), PlacementError> {
        validate_canvas(self.width, self.height)?;
        validate_padding(self.padding_x)?;
        validate_padding(self.padding_y)?;
        Ok(())
    }
}

/// Where a device ended up on the canvas
#[derive(Debug, Clone, PartialEq)]
pub struct PlacedDevice {
    pub name: &'static str,
    pub x: i64,
    pub y: i64,
    pub width: u32,
    pub height: u32,
    pub region: BoundingRegion,
}

/// Final canvas plus the placement of every device on it
pub struct ComposedMockup {
    pub image: RgbaImage,
    pub placements: Vec<PlacedDevice>,
}

/// Canvas being composed
pub struct Composition {
    image: RgbaImage,
    placements: Vec<PlacedDevice>,
}

impl Composition {
    pub fn new(width: u32, height: u32, background: Background) -> Result<Self, PlacementError> {
        validate_canvas(width, height)?;
        Ok(Composition {
            image: RgbaImage::from_pixel(width, height, background.to_rgba()),
            placements: Vec::new(),
        })
    }

    /// Scale a dressed device into `region` and draw it with its shadow
    pub fn add_device(
        &mut self,
        name: &'static str,
        device: &RgbaImage,
        region: &BoundingRegion,
        layout: &DeviceLayout,
    ) {
        let (width, height) = region.fit_dimensions(device.width(), device.height(), layout.y_scale);
        let scaled = imageops::resize(device, width, height, FilterType::Lanczos3);

        let (x, y) = region.offset_for(width, height, layout.h_align, layout.v_align);
        let (x, y) = (x.round() as i64, y.round() as i64);

        let shadow = drop_shadow(&scaled);
        imageops::overlay(&mut self.image, &shadow, x - SHADOW_SPREAD as i64, y - SHADOW_LIFT);
        imageops::overlay(&mut self.image, &scaled, x, y);

        debug!(device = name, x, y, width, height, "Placed device");

        self.placements.push(PlacedDevice {
            name,
            x,
            y,
            width,
            height,
            region: *region,
        });
    }

    pub fn finish(self) -> ComposedMockup {
        ComposedMockup {
            image: self.image,
            placements: self.placements,
        }
    }
}

/// Soft black silhouette of `device`, padded by `SHADOW_SPREAD` on every side
fn drop_shadow(device: &RgbaImage) -> RgbaImage {
    let mut shadow = RgbaImage::new(
        device.width() + 2 * SHADOW_SPREAD,
        device.height() + 2 * SHADOW_SPREAD,
    );
    imageops::overlay(&mut shadow, device, SHADOW_SPREAD as i64, SHADOW_SPREAD as i64);
    darken(&mut shadow);
    apply_opacity(&mut shadow, SHADOW_OPACITY);
    blur(&shadow, SHADOW_BLUR_SIGMA)
}

/// Region for `device` given the region used by the devices before it
pub fn next_region(
    current: BoundingRegion,
    device: &DeviceDescriptor,
    options: &LayoutOptions,
) -> BoundingRegion {
    if !device.spec.layout.locks_region {
        return current;
    }
    BoundingRegion::aspect_locked(
        options.width,
        options.height,
        device.template_aspect(),
        options.padding_x,
        options.padding_y,
    )
}

/// Reject empty requests and unknown device names before any image work
pub fn validate_request<'a>(
    catalog: &DeviceCatalog,
    names: impl IntoIterator<Item = &'a String>,
) -> Result<(), LayoutError> {
    let mut count = 0;
    for name in names {
        count += 1;
        let known = DEVICES.iter().any(|spec| spec.name == name.as_str());
        if !known || !catalog.contains(name) {
            return Err(LayoutError::UnknownDevice(name.clone()));
        }
    }
    if count == 0 {
        return Err(LayoutError::NoScreenshots(format!(
            "expected one of: {}",
            catalog.device_names().join(", ")
        )));
    }
    Ok(())
}

/// Compose all screenshots into one canvas
pub fn compose(
    catalog: &DeviceCatalog,
    mut screenshots: HashMap<String, ScreenshotSource>,
    options: &LayoutOptions,
) -> Result<ComposedMockup, LayoutError> {
    options.validate()?;
    validate_request(catalog, screenshots.keys())?;

    let mut composition = Composition::new(options.width, options.height, options.background)?;
    let mut region = BoundingRegion::default_for(options.width, options.height);

    for spec in DEVICES {
        let Some(source) = screenshots.remove(spec.name) else {
            continue;
        };
        validate_scale(spec.layout.y_scale)?;

        let device = catalog.lookup(spec.name).map_err(CompositorError::from)?;
        region = next_region(region, &device, options);

        info!(device = spec.name, "Creating device");
        let screenshot = source.decode(spec.name)?;
        let dressed = dress(&device, &screenshot, options.status_bar);

        info!(device = spec.name, "Composing device into image");
        composition.add_device(spec.name, &dressed, &region, &spec.layout);
    }

    Ok(composition.finish())
}

/// Save to `path`; the format follows the file extension
pub fn write_image(image: &RgbaImage, path: &Path) -> Result<(), LayoutError> {
    image.save(path).map_err(|e| LayoutError::Write {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })
}
