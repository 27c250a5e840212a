//! Placement geometry for dressed devices
//!
//! All values are canvas pixels. Regions keep fractional coordinates so the
//! aspect-locked region derived from a device template is exact; pixel rounding
//! happens only when an image is blitted.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Default region margins relative to canvas size
pub const DEFAULT_MARGIN_X: f64 = 0.1;
pub const DEFAULT_MARGIN_Y: f64 = 0.075;

/// Horizontal bias used for LEFT/RIGHT alignment. Devices are not pushed flush
/// against the region edge.
pub const EDGE_BIAS: f64 = 0.1;

/// Largest accepted canvas side, in pixels
pub const MAX_CANVAS_SIDE: u32 = 16_384;
/// Largest accepted canvas area, in pixels (64 MP)
pub const MAX_CANVAS_PIXELS: u64 = 64 * 1024 * 1024;

/// Placement errors
#[derive(Debug, Error, PartialEq)]
pub enum PlacementError {
    #[error("Scale must be greater than 0.0 and at most 1.0, got {0}")]
    InvalidScale(f64),
    #[error("Padding must be greater than 0.0 and at most 1.0, got {0}")]
    InvalidPadding(f64),
    #[error("Canvas must be at least 1x1 pixels, got {0}x{1}")]
    EmptyCanvas(u32, u32),
    #[error("Canvas of {0}x{1} pixels is too large (at most 16384 per side, 64 MP in total)")]
    CanvasTooLarge(u32, u32),
}

/// Horizontal alignment inside a bounding region
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HorizontalAlign {
    Left,
    Center,
    Right,
}

/// Vertical alignment inside a bounding region
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VerticalAlign {
    Top,
    Bottom,
    Center,
}

/// Rectangle of the canvas a single device must fit into
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BoundingRegion {
    pub x: f64,
    pub y: f64,
    pub w: f64,
    pub h: f64,
}

impl BoundingRegion {
    /// Centered region leaving 10% horizontal and 7.5% vertical margin
    pub fn default_for(canvas_w: u32, canvas_h: u32) -> Self {
        let (w, h) = (canvas_w as f64, canvas_h as f64);
        BoundingRegion {
            x: (w * DEFAULT_MARGIN_X).round(),
            y: (h * DEFAULT_MARGIN_Y).round(),
            w: (w * (1.0 - 2.0 * DEFAULT_MARGIN_X)).round(),
            h: (h * (1.0 - 2.0 * DEFAULT_MARGIN_Y)).round(),
        }
    }

    /// Centered region with the given aspect ratio (w / h)
    ///
    /// On a landscape canvas the height is fixed at `padding_y * canvas_h`;
    /// otherwise the width is fixed at `padding_x * canvas_w`. The other side
    /// follows from the aspect ratio.
    pub fn aspect_locked(
        canvas_w: u32,
        canvas_h: u32,
        aspect: f64,
        padding_x: f64,
        padding_y: f64,
    ) -> Self {
        let (cw, ch) = (canvas_w as f64, canvas_h as f64);
        let (w, h) = if ch < cw {
            let h = padding_y * ch;
            (h * aspect, h)
        } else {
            let w = padding_x * cw;
            (w, w / aspect)
        };

        BoundingRegion {
            x: ((cw - w) / 2.0).round(),
            y: ((ch - h) / 2.0).round(),
            w,
            h,
        }
    }

    /// Largest size with the source aspect ratio that fits in
    /// `w x (h * y_scale)`
    pub fn fit_dimensions(&self, src_w: u32, src_h: u32, y_scale: f64) -> (u32, u32) {
        let max_w = self.w.floor().max(1.0);
        let max_h = (self.h * y_scale).floor().max(1.0);
        let (sw, sh) = (src_w.max(1) as f64, src_h.max(1) as f64);

        let ratio = (max_w / sw).min(max_h / sh);
        let w = (sw * ratio).round().clamp(1.0, max_w);
        let h = (sh * ratio).round().clamp(1.0, max_h);

        (w as u32, h as u32)
    }

    /// Top-left corner for a device of the given size
    pub fn offset_for(
        &self,
        device_w: u32,
        device_h: u32,
        h_align: HorizontalAlign,
        v_align: VerticalAlign,
    ) -> (f64, f64) {
        let (dw, dh) = (device_w as f64, device_h as f64);

        let y = match v_align {
            VerticalAlign::Top => self.y,
            VerticalAlign::Bottom => self.y + self.h - dh,
            VerticalAlign::Center => self.y + (self.h - dh) / 2.0,
        };

        let x = match h_align {
            HorizontalAlign::Left => self.x + (self.w - dw) * EDGE_BIAS,
            HorizontalAlign::Center => self.x + (self.w - dw) / 2.0,
            HorizontalAlign::Right => self.x + (self.w - dw) * (1.0 - EDGE_BIAS),
        };

        (x, y)
    }
}

/// Validate a vertical scale factor
pub fn validate_scale(y_scale: f64) -> Result<(), PlacementError> {
    if !(y_scale > 0.0 && y_scale <= 1.0) {
        return Err(PlacementError::InvalidScale(y_scale));
    }
    Ok(())
}

/// Validate canvas dimensions before any buffer is allocated
pub fn validate_canvas(width: u32, height: u32) -> Result<(), PlacementError> {
    if width == 0 || height == 0 {
        return Err(PlacementError::EmptyCanvas(width, height));
    }
    let too_large = || PlacementError::CanvasTooLarge(width, height);
    if width > MAX_CANVAS_SIDE || height > MAX_CANVAS_SIDE {
        return Err(too_large());
    }
    let pixels = u64::from(width) * u64::from(height);
    if pixels > MAX_CANVAS_PIXELS {
        return Err(too_large());
    }
    // RGBA8 buffer length must fit in memory addressing
    (width as usize)
        .checked_mul(height as usize)
        .and_then(|p| p.checked_mul(4))
        .ok_or_else(too_large)?;
    Ok(())
}

/// Validate a padding fraction
pub fn validate_padding(padding: f64) -> Result<(), PlacementError> {
    if !(padding > 0.0 && padding <= 1.0) {
        return Err(PlacementError::InvalidPadding(padding));
    }
    Ok(())
}
