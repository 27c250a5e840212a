//! Mockup generation engine
//!
//! This module contains the core mockup generation logic including:
//! - Device asset loading
//! - Dressing a device frame with a screenshot
//! - Canvas layout and the request facade

mod catalog;
mod compositor;
mod layout;
mod mockup;
mod raster;

#[cfg(test)]
pub(crate) mod testing;

pub use catalog::{CatalogError, DeviceCatalog, DeviceDescriptor, StatusBar};
pub use compositor::{compose_device, dress, CompositorError, ScreenshotSource};
pub use layout::{
    compose, next_region, write_image, ComposedMockup, Composition, LayoutError, LayoutOptions,
    PlacedDevice,
};
pub use mockup::{encode_png, Mockup, MockupOutput, MockupRequest, OutputMode, DEFAULT_OUTPUT};
pub use raster::ScreenOffset;
