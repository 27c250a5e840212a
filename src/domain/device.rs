//! Device table
//!
//! One row per supported device frame, in the fixed priority order used by the
//! layout engine. Later rows are drawn on top of earlier ones, so adding a device
//! means adding a row here and shipping its assets.

use serde::{Deserialize, Serialize};

use super::placement::{HorizontalAlign, VerticalAlign};

/// Status bar overlay style
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusBarStyle {
    Light,
    Dark,
}

impl StatusBarStyle {
    /// Parse a status bar style; `"none"` and the empty string mean no status bar
    pub fn parse(s: &str) -> Result<Option<Self>, String> {
        match s.trim().to_lowercase().as_str() {
            "" | "none" => Ok(None),
            "light" => Ok(Some(StatusBarStyle::Light)),
            "dark" => Ok(Some(StatusBarStyle::Dark)),
            other => Err(format!(
                "unknown status bar style '{}' (expected none, light or dark)",
                other
            )),
        }
    }
}

impl std::fmt::Display for StatusBarStyle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StatusBarStyle::Light => write!(f, "light"),
            StatusBarStyle::Dark => write!(f, "dark"),
        }
    }
}

/// Nominal screen size in CSS pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ScreenSize {
    pub w: u32,
    pub h: u32,
}

/// Status bar overlay files for devices that have them
#[derive(Debug, Clone, Copy)]
pub struct StatusBarFiles {
    pub light: &'static str,
    pub dark: &'static str,
}

/// How a dressed device sits inside the bounding region
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DeviceLayout {
    pub h_align: HorizontalAlign,
    pub v_align: VerticalAlign,
    /// At 1.0 the device is as high as the bounding region
    pub y_scale: f64,
    /// Re-fit the bounding region to this device's template aspect ratio.
    /// The adjusted region is used by every device drawn after it.
    pub locks_region: bool,
}

/// Static description of one device frame
#[derive(Debug, Clone, Copy)]
pub struct DeviceSpec {
    pub name: &'static str,
    pub screen: ScreenSize,
    pub template_file: &'static str,
    pub mask_file: &'static str,
    pub status_bar_files: Option<StatusBarFiles>,
    pub layout: DeviceLayout,
    /// Rotate the frame when a landscape screenshot meets a portrait screen
    pub rotates_to_fit: bool,
}

impl DeviceSpec {
    /// Name as used on the command line: lowercase, spaces replaced by `_`
    pub fn cli_key(&self) -> String {
        self.name.to_lowercase().replace(' ', "_")
    }

    pub fn supports_status_bar(&self) -> bool {
        self.status_bar_files.is_some()
    }
}

// Screen sizes follow the Chrome DevTools emulated device list.
pub const DEVICES: &[DeviceSpec] = &[
    DeviceSpec {
        name: "PC",
        screen: ScreenSize { w: 960, h: 540 },
        template_file: "pc_1.png",
        mask_file: "pc_1-mask.png",
        status_bar_files: None,
        layout: DeviceLayout {
            h_align: HorizontalAlign::Center,
            v_align: VerticalAlign::Center,
            y_scale: 1.0,
            locks_region: true,
        },
        rotates_to_fit: true,
    },
    DeviceSpec {
        name: "iPad",
        screen: ScreenSize { w: 768, h: 1024 },
        template_file: "ipad.png",
        mask_file: "ipad-mask.png",
        status_bar_files: None,
        layout: DeviceLayout {
            h_align: HorizontalAlign::Left,
            v_align: VerticalAlign::Bottom,
            y_scale: 0.7,
            locks_region: false,
        },
        rotates_to_fit: true,
    },
    DeviceSpec {
        name: "iPhone X",
        screen: ScreenSize { w: 375, h: 812 },
        template_file: "iphone_x.png",
        mask_file: "iphone_x-mask.png",
        status_bar_files: Some(StatusBarFiles {
            light: "iphone_x-statuslight.png",
            dark: "iphone_x-statusdark.png",
        }),
        layout: DeviceLayout {
            h_align: HorizontalAlign::Right,
            v_align: VerticalAlign::Bottom,
            y_scale: 0.6,
            locks_region: false,
        },
        rotates_to_fit: true,
    },
    DeviceSpec {
        name: "iPhone 6/7/8",
        screen: ScreenSize { w: 667, h: 375 },
        template_file: "iphone.png",
        mask_file: "iphone-mask.png",
        status_bar_files: None,
        layout: DeviceLayout {
            h_align: HorizontalAlign::Right,
            v_align: VerticalAlign::Bottom,
            y_scale: 0.58,
            locks_region: false,
        },
        rotates_to_fit: true,
    },
];

/// Find a device row by exact name, falling back to its CLI key
pub fn find_spec(name: &str) -> Option<&'static DeviceSpec> {
    DEVICES
        .iter()
        .find(|spec| spec.name == name)
        .or_else(|| {
            let key = name.trim().to_lowercase().replace(' ', "_");
            DEVICES.iter().find(|spec| spec.cli_key() == key)
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_priority_order() {
        let names: Vec<_> = DEVICES.iter().map(|d| d.name).collect();
        assert_eq!(names, vec!["PC", "iPad", "iPhone X", "iPhone 6/7/8"]);
    }

    #[test]
    fn test_only_first_row_locks_region() {
        assert!(DEVICES[0].layout.locks_region);
        assert!(DEVICES[1..].iter().all(|d| !d.layout.locks_region));
    }

    #[test]
    fn test_cli_key() {
        assert_eq!(find_spec("iPhone X").map(|s| s.cli_key()), Some("iphone_x".to_string()));
        assert_eq!(find_spec("iphone_6/7/8").map(|s| s.name), Some("iPhone 6/7/8"));
        assert!(find_spec("Galaxy S9").is_none());
    }

    #[test]
    fn test_status_bar_support() {
        let supported: Vec<_> = DEVICES
            .iter()
            .filter(|d| d.supports_status_bar())
            .map(|d| d.name)
            .collect();
        assert_eq!(supported, vec!["iPhone X"]);
    }

    #[test]
    fn test_parse_status_bar_style() {
        assert_eq!(StatusBarStyle::parse("none"), Ok(None));
        assert_eq!(StatusBarStyle::parse("Dark"), Ok(Some(StatusBarStyle::Dark)));
        assert!(StatusBarStyle::parse("purple").is_err());
    }
}
