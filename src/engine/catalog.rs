//! Device asset catalog
//!
//! Loads every device frame from the asset directory once at startup. The
//! catalog is immutable afterwards and shared between compositions.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use image::RgbaImage;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::domain::{DeviceSpec, StatusBarStyle, DEVICES};
use super::raster::{autocrop, extract_screen_offset, ScreenOffset};

/// Color tolerance for cropping masks and overlays
const CROP_TOLERANCE: f64 = 0.0002;

/// Catalog errors
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("Couldn't initialize {device}: can't read {path:?}: {reason}")]
    AssetLoad {
        device: String,
        path: PathBuf,
        reason: String,
    },
    #[error("Screen mask of {0} has no non-black pixels")]
    InvalidMask(String),
    #[error("{0} is not a known device")]
    UnknownDevice(String),
    #[error("Asset loading task failed: {0}")]
    Task(String),
}

/// Decoded images for one device
pub struct DeviceAssets {
    pub template: RgbaImage,
    pub mask: RgbaImage,
    pub status_bar_light: Option<RgbaImage>,
    pub status_bar_dark: Option<RgbaImage>,
}

impl DeviceAssets {
    /// Read the asset files named by `spec` from `dir`
    pub fn load(spec: &DeviceSpec, dir: &Path) -> Result<Self, CatalogError> {
        let read = |file: &str| -> Result<RgbaImage, CatalogError> {
            let path = dir.join(file);
            image::open(&path)
                .map(|img| img.to_rgba8())
                .map_err(|e| CatalogError::AssetLoad {
                    device: spec.name.to_string(),
                    path,
                    reason: e.to_string(),
                })
        };

        let template = read(spec.template_file)?;
        let (status_bar_light, status_bar_dark) = match spec.status_bar_files {
            Some(files) => (Some(read(files.light)?), Some(read(files.dark)?)),
            None => (None, None),
        };
        let mask = read(spec.mask_file)?;

        Ok(DeviceAssets {
            template,
            mask,
            status_bar_light,
            status_bar_dark,
        })
    }
}

/// Status bar overlay with its measured height
pub struct StatusBar {
    pub image: RgbaImage,
    pub height: u32,
}

impl StatusBar {
    fn new(image: RgbaImage) -> Self {
        let height = autocrop(&image, CROP_TOLERANCE, false).height();
        StatusBar { image, height }
    }
}

/// A device frame with everything derived from its assets
pub struct DeviceDescriptor {
    pub spec: &'static DeviceSpec,
    pub template: RgbaImage,
    /// Mask cropped to the screen area
    pub screen_mask: RgbaImage,
    /// Where the screen starts on the template
    pub screen_offset: ScreenOffset,
    pub status_bar_light: Option<StatusBar>,
    pub status_bar_dark: Option<StatusBar>,
}

impl DeviceDescriptor {
    /// Validate assets and compute the screen offset and mask size
    pub fn new(spec: &'static DeviceSpec, assets: DeviceAssets) -> Result<Self, CatalogError> {
        let screen_offset = extract_screen_offset(&assets.mask)
            .ok_or_else(|| CatalogError::InvalidMask(spec.name.to_string()))?;

        if assets.mask.dimensions() != assets.template.dimensions() {
            warn!(
                device = spec.name,
                template = ?assets.template.dimensions(),
                mask = ?assets.mask.dimensions(),
                "Mask and template sizes differ"
            );
        }

        let screen_mask = autocrop(&assets.mask, CROP_TOLERANCE, true);

        debug!(
            device = spec.name,
            offset_x = screen_offset.x,
            offset_y = screen_offset.y,
            screen_w = screen_mask.width(),
            screen_h = screen_mask.height(),
            "Computed screen geometry"
        );

        Ok(DeviceDescriptor {
            spec,
            template: assets.template,
            screen_mask,
            screen_offset,
            status_bar_light: assets.status_bar_light.map(StatusBar::new),
            status_bar_dark: assets.status_bar_dark.map(StatusBar::new),
        })
    }

    pub fn name(&self) -> &'static str {
        self.spec.name
    }

    /// Overlay for the requested style, if this device has one
    pub fn status_bar(&self, style: Option<StatusBarStyle>) -> Option<&StatusBar> {
        match style? {
            StatusBarStyle::Light => self.status_bar_light.as_ref(),
            StatusBarStyle::Dark => self.status_bar_dark.as_ref(),
        }
    }

    /// Template aspect ratio (w / h)
    pub fn template_aspect(&self) -> f64 {
        let (w, h) = self.template.dimensions();
        w as f64 / h.max(1) as f64
    }
}

/// All loaded device frames
pub struct DeviceCatalog {
    devices: HashMap<&'static str, Arc<DeviceDescriptor>>,
}

impl DeviceCatalog {
    /// Build a catalog from already prepared descriptors
    pub fn from_descriptors(descriptors: impl IntoIterator<Item = DeviceDescriptor>) -> Self {
        let devices = descriptors
            .into_iter()
            .map(|d| (d.name(), Arc::new(d)))
            .collect();
        DeviceCatalog { devices }
    }

    /// Load every device in the table from `dir`
    ///
    /// Fails on the first missing or undecodable asset.
    pub async fn load(dir: &Path) -> Result<Self, CatalogError> {
        let dir = dir.to_path_buf();

        // Spawn blocking task for file I/O and decoding
        let descriptors = tokio::task::spawn_blocking(move || {
            DEVICES
                .iter()
                .map(|spec| {
                    let assets = DeviceAssets::load(spec, &dir)?;
                    let descriptor = DeviceDescriptor::new(spec, assets)?;
                    info!(
                        device = spec.name,
                        width = descriptor.template.width(),
                        height = descriptor.template.height(),
                        status_bars = descriptor.status_bar_light.is_some(),
                        "Loaded device"
                    );
                    Ok(descriptor)
                })
                .collect::<Result<Vec<_>, CatalogError>>()
        })
        .await
        .map_err(|e| CatalogError::Task(e.to_string()))??;

        Ok(Self::from_descriptors(descriptors))
    }

    /// Get a device by name
    pub fn lookup(&self, name: &str) -> Result<Arc<DeviceDescriptor>, CatalogError> {
        self.devices
            .get(name)
            .cloned()
            .ok_or_else(|| CatalogError::UnknownDevice(name.to_string()))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.devices.contains_key(name)
    }

    /// Names of loaded devices, in drawing order
    pub fn device_names(&self) -> Vec<&'static str> {
        DEVICES
            .iter()
            .map(|spec| spec.name)
            .filter(|name| self.devices.contains_key(name))
            .collect()
    }

    pub fn device_count(&self) -> usize {
        self.devices.len()
    }
}
