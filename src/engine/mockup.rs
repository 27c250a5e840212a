//! Mockup facade
//!
//! Owns the device catalog and runs a full request: decode screenshots,
//! compose the canvas and hand back or write the image.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use futures::future::try_join_all;
use image::codecs::png::PngEncoder;
use image::{ImageEncoder, RgbaImage};
use tracing::info;

use crate::domain::StatusBarStyle;
use super::catalog::{CatalogError, DeviceCatalog};
use super::compositor::{compose_device, CompositorError, ScreenshotSource};
use super::layout::{compose, validate_request, write_image, LayoutError, LayoutOptions};

/// Default file written when no output path is given
pub const DEFAULT_OUTPUT: &str = "mock-up.png";

/// What to do with the composed canvas
#[derive(Debug, Clone, PartialEq)]
pub enum OutputMode {
    /// Write to a file; the format follows the extension
    File(PathBuf),
    /// Return the image to the caller
    InMemory,
}

impl Default for OutputMode {
    fn default() -> Self {
        OutputMode::File(PathBuf::from(DEFAULT_OUTPUT))
    }
}

/// A full composition request
#[derive(Debug, Clone, Default)]
pub struct MockupRequest {
    /// Screenshot per device name
    pub screenshots: HashMap<String, ScreenshotSource>,
    pub options: LayoutOptions,
    pub output: OutputMode,
}

impl MockupRequest {
    pub fn new(screenshots: HashMap<String, ScreenshotSource>) -> Self {
        MockupRequest {
            screenshots,
            ..Default::default()
        }
    }

    pub fn with_options(mut self, options: LayoutOptions) -> Self {
        self.options = options;
        self
    }

    pub fn with_output(mut self, output: OutputMode) -> Self {
        self.output = output;
        self
    }
}

/// Result of [`Mockup::up`]
pub enum MockupOutput {
    Written(PathBuf),
    Image(RgbaImage),
}

/// Device mockup generator
pub struct Mockup {
    catalog: Arc<DeviceCatalog>,
}

impl Mockup {
    /// Load all device assets from `assets_dir`
    pub async fn init(assets_dir: &Path) -> Result<Self, CatalogError> {
        info!(path = %assets_dir.display(), "Loading device assets");
        let catalog = DeviceCatalog::load(assets_dir).await?;
        Ok(Self::from_catalog(catalog))
    }

    pub fn from_catalog(catalog: DeviceCatalog) -> Self {
        Mockup {
            catalog: Arc::new(catalog),
        }
    }

    pub fn catalog(&self) -> &DeviceCatalog {
        &self.catalog
    }

    /// Devices that can be requested, in drawing order
    pub fn device_names(&self) -> Vec<&'static str> {
        self.catalog.device_names()
    }

    /// Dress a single device without placing it on a canvas
    pub fn compose_device(
        &self,
        device: &str,
        screenshot: ScreenshotSource,
        status_bar: Option<StatusBarStyle>,
    ) -> Result<RgbaImage, CompositorError> {
        compose_device(&self.catalog, device, screenshot, status_bar)
    }

    /// Compose a mockup
    ///
    /// Nothing is written unless every requested device composes.
    pub async fn up(&self, request: MockupRequest) -> Result<MockupOutput, LayoutError> {
        let MockupRequest {
            screenshots,
            options,
            output,
        } = request;

        options.validate()?;
        validate_request(&self.catalog, screenshots.keys())?;

        info!(devices = screenshots.len(), "Getting ready");

        // Decode all screenshots concurrently
        let decoded = try_join_all(screenshots.into_iter().map(|(name, source)| async move {
            let device = name.clone();
            let image = tokio::task::spawn_blocking(move || source.decode(&device))
                .await
                .map_err(|e| LayoutError::Task(e.to_string()))??;
            Ok::<_, LayoutError>((name, ScreenshotSource::Image(image)))
        }))
        .await?;

        let catalog = Arc::clone(&self.catalog);
        let composed = tokio::task::spawn_blocking(move || {
            compose(&catalog, decoded.into_iter().collect(), &options)
        })
        .await
        .map_err(|e| LayoutError::Task(e.to_string()))??;

        match output {
            OutputMode::InMemory => Ok(MockupOutput::Image(composed.image)),
            OutputMode::File(path) => {
                info!(path = %path.display(), "Writing image");
                let target = path.clone();
                tokio::task::spawn_blocking(move || write_image(&composed.image, &target))
                    .await
                    .map_err(|e| LayoutError::Task(e.to_string()))??;
                Ok(MockupOutput::Written(path))
            }
        }
    }
}

/// Encode to PNG bytes (keeps transparency)
pub fn encode_png(image: &RgbaImage) -> Result<Vec<u8>, image::ImageError> {
    let mut buffer = Vec::new();
    PngEncoder::new(&mut buffer).write_image(
        image.as_raw(),
        image.width(),
        image.height(),
        image::ColorType::Rgba8,
    )?;
    Ok(buffer)
}
