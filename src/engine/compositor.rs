//! Device compositor
//!
//! Dresses a device frame with a screenshot: the screenshot is cropped to the
//! screen, masked, optionally given a status bar, and placed behind the bezel.

use std::path::{Path, PathBuf};

use bytes::Bytes;
use image::imageops;
use image::{DynamicImage, GenericImageView, RgbaImage};
use thiserror::Error;
use tracing::debug;

use crate::domain::StatusBarStyle;
use super::catalog::{CatalogError, DeviceCatalog, DeviceDescriptor};
use super::raster::{apply_mask, composite_behind, cover, darken};

/// Compositing errors
#[derive(Debug, Error)]
pub enum CompositorError {
    #[error(transparent)]
    Catalog(#[from] CatalogError),
    #[error("Can't compose {0} without a screenshot")]
    MissingScreenshot(String),
    #[error("Can't read screenshot for {device} from {source_desc}: {reason}")]
    ScreenshotDecode {
        device: String,
        source_desc: String,
        reason: String,
    },
}

/// Where a screenshot comes from
#[derive(Debug, Clone)]
pub enum ScreenshotSource {
    /// Already decoded image
    Image(DynamicImage),
    /// Encoded image bytes (PNG, JPEG, ...)
    Bytes(Bytes),
    /// Image file on disk
    Path(PathBuf),
}

impl ScreenshotSource {
    /// Human readable origin, used in error messages
    pub fn describe(&self) -> String {
        match self {
            ScreenshotSource::Image(img) => format!("image ({}x{})", img.width(), img.height()),
            ScreenshotSource::Bytes(bytes) => format!("buffer ({} bytes)", bytes.len()),
            ScreenshotSource::Path(path) => format!("'{}'", path.display()),
        }
    }

    /// Decode into an image
    pub fn decode(self, device: &str) -> Result<DynamicImage, CompositorError> {
        let source_desc = self.describe();
        let decode_err = |e: image::ImageError| CompositorError::ScreenshotDecode {
            device: device.to_string(),
            source_desc: source_desc.clone(),
            reason: e.to_string(),
        };
        let missing = || CompositorError::MissingScreenshot(device.to_string());

        match self {
            ScreenshotSource::Image(img) => {
                if img.width() == 0 || img.height() == 0 {
                    return Err(missing());
                }
                Ok(img)
            }
            ScreenshotSource::Bytes(bytes) => {
                if bytes.is_empty() {
                    return Err(missing());
                }
                image::load_from_memory(&bytes).map_err(decode_err)
            }
            ScreenshotSource::Path(path) => {
                if path.as_os_str().is_empty() {
                    return Err(missing());
                }
                image::open(&path).map_err(decode_err)
            }
        }
    }
}

impl From<DynamicImage> for ScreenshotSource {
    fn from(img: DynamicImage) -> Self {
        ScreenshotSource::Image(img)
    }
}

impl From<RgbaImage> for ScreenshotSource {
    fn from(img: RgbaImage) -> Self {
        ScreenshotSource::Image(DynamicImage::ImageRgba8(img))
    }
}

impl From<Bytes> for ScreenshotSource {
    fn from(bytes: Bytes) -> Self {
        ScreenshotSource::Bytes(bytes)
    }
}

impl From<Vec<u8>> for ScreenshotSource {
    fn from(bytes: Vec<u8>) -> Self {
        ScreenshotSource::Bytes(Bytes::from(bytes))
    }
}

impl From<PathBuf> for ScreenshotSource {
    fn from(path: PathBuf) -> Self {
        ScreenshotSource::Path(path)
    }
}

impl From<&Path> for ScreenshotSource {
    fn from(path: &Path) -> Self {
        ScreenshotSource::Path(path.to_path_buf())
    }
}

/// Look up `device` and dress it with the screenshot
pub fn compose_device(
    catalog: &DeviceCatalog,
    device: &str,
    screenshot: ScreenshotSource,
    status_bar: Option<StatusBarStyle>,
) -> Result<RgbaImage, CompositorError> {
    let descriptor = catalog.lookup(device)?;
    let screenshot = screenshot.decode(device)?;
    Ok(dress(&descriptor, &screenshot, status_bar))
}

/// Composite a decoded screenshot into a device frame
///
/// The descriptor is never modified; rotation works on local copies.
pub fn dress(
    device: &DeviceDescriptor,
    screenshot: &DynamicImage,
    status_bar: Option<StatusBarStyle>,
) -> RgbaImage {
    let mut template = device.template.clone();
    let mut offset = device.screen_offset;
    let mask = &device.screen_mask;
    let overlay = device.status_bar(status_bar);

    let (mask_w, mask_h) = mask.dimensions();
    let screen_aspect = mask_w as f64 / mask_h.max(1) as f64;
    let (shot_w, shot_h) = screenshot.dimensions();
    let shot_aspect = shot_w as f64 / shot_h.max(1) as f64;

    let rotate = device.spec.rotates_to_fit
        && screen_aspect < 1.0
        && shot_aspect > 1.0
        && overlay.is_none();

    let masked = if rotate {
        // Portrait screen, landscape screenshot: lay the device on its side.
        let mask = imageops::rotate90(mask);
        template = imageops::rotate90(&template);
        offset = offset.swapped();

        let mut shot = cover(screenshot, mask.width(), mask.height());
        apply_mask(&mut shot, &mask, 0, 0);
        shot
    } else if let Some(bar) = overlay {
        let shot = cover(screenshot, mask_w, mask_h);
        imageops::overlay(&mut template, &bar.image, 0, 0);

        // Push the screenshot down below the status bar and cut it to the screen.
        let mut shifted = RgbaImage::new(mask_w, mask_h + bar.height);
        imageops::overlay(&mut shifted, &shot, 0, bar.height as i64);
        let mut shifted_mask = shifted.clone();
        darken(&mut shifted_mask);
        imageops::overlay(&mut shifted_mask, mask, 0, 0);
        apply_mask(&mut shifted, &shifted_mask, 0, 0);
        shifted
    } else {
        let mut shot = cover(screenshot, mask_w, mask_h);
        apply_mask(&mut shot, mask, 0, 0);
        shot
    };

    debug!(
        device = device.name(),
        rotated = rotate,
        status_bar = overlay.is_some(),
        offset_x = offset.x,
        offset_y = offset.y,
        screenshot_w = masked.width(),
        screenshot_h = masked.height(),
        "Dressed device"
    );

    composite_behind(&mut template, &masked, offset.x as i64, offset.y as i64);
    template
}
