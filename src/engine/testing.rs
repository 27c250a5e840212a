//! Synthetic device assets for tests
//!
//! Each template is a flat gray bezel with a transparent screen hole; each mask
//! is black with a white rectangle over the same hole.

use image::{DynamicImage, Rgba, RgbaImage};

use crate::domain::{DeviceSpec, DEVICES};
use super::catalog::{DeviceAssets, DeviceCatalog, DeviceDescriptor};
use tempfile::TempDir;

pub const BEZEL: Rgba<u8> = Rgba([40, 40, 40, 255]);
pub const STATUS_LIGHT: Rgba<u8> = Rgba([250, 250, 250, 255]);
pub const STATUS_DARK: Rgba<u8> = Rgba([5, 5, 5, 255]);
pub const STATUS_BAR_HEIGHT: u32 = 4;

/// Template size and screen rectangle `(x, y, w, h)` per device
pub fn geometry(name: &str) -> ((u32, u32), (u32, u32, u32, u32)) {
    match name {
        "PC" => ((160, 100), (10, 10, 140, 70)),
        "iPad" => ((80, 100), (8, 10, 64, 80)),
        "iPhone X" => ((50, 100), (5, 10, 40, 80)),
        _ => ((100, 50), (10, 5, 80, 40)),
    }
}

fn in_rect(x: u32, y: u32, rect: (u32, u32, u32, u32)) -> bool {
    x >= rect.0 && x < rect.0 + rect.2 && y >= rect.1 && y < rect.1 + rect.3
}

fn status_bar(size: (u32, u32), screen: (u32, u32, u32, u32), color: Rgba<u8>) -> RgbaImage {
    let strip = (screen.0, screen.1, screen.2, STATUS_BAR_HEIGHT);
    RgbaImage::from_fn(size.0, size.1, |x, y| {
        if in_rect(x, y, strip) {
            color
        } else {
            Rgba([0, 0, 0, 0])
        }
    })
}

pub fn assets_for(spec: &DeviceSpec) -> DeviceAssets {
    let (size, screen) = geometry(spec.name);

    let template = RgbaImage::from_fn(size.0, size.1, |x, y| {
        if in_rect(x, y, screen) {
            Rgba([0, 0, 0, 0])
        } else {
            BEZEL
        }
    });
    let mask = RgbaImage::from_fn(size.0, size.1, |x, y| {
        if in_rect(x, y, screen) {
            Rgba([255, 255, 255, 255])
        } else {
            Rgba([0, 0, 0, 255])
        }
    });

    let has_bars = spec.supports_status_bar();
    DeviceAssets {
        template,
        mask,
        status_bar_light: has_bars.then(|| status_bar(size, screen, STATUS_LIGHT)),
        status_bar_dark: has_bars.then(|| status_bar(size, screen, STATUS_DARK)),
    }
}

pub fn catalog() -> DeviceCatalog {
    DeviceCatalog::from_descriptors(
        DEVICES
            .iter()
            .map(|spec| DeviceDescriptor::new(spec, assets_for(spec)).unwrap()),
    )
}

pub fn solid(w: u32, h: u32, color: Rgba<u8>) -> DynamicImage {
    DynamicImage::ImageRgba8(RgbaImage::from_pixel(w, h, color))
}

/// Write the synthetic assets as PNG files into a fresh temp directory,
/// removed when the returned guard drops
pub fn write_assets_dir() -> TempDir {
    let temp = TempDir::new().unwrap();
    let dir = temp.path();

    for spec in DEVICES {
        let assets = assets_for(spec);
        assets.template.save(dir.join(spec.template_file)).unwrap();
        assets.mask.save(dir.join(spec.mask_file)).unwrap();
        if let Some(files) = spec.status_bar_files {
            assets.status_bar_light.unwrap().save(dir.join(files.light)).unwrap();
            assets.status_bar_dark.unwrap().save(dir.join(files.dark)).unwrap();
        }
    }

    temp
}
