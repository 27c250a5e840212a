//! Domain types and models

pub mod color;
pub mod device;
mod placement;

pub use color::Background;
pub use device::{find_spec, DeviceLayout, DeviceSpec, ScreenSize, StatusBarStyle, DEVICES};
pub use placement::{
    validate_canvas, validate_padding, validate_scale, BoundingRegion, HorizontalAlign, PlacementError,
    VerticalAlign,
};
