//! Canvas background colors
//!
//! Accepts CSS color strings and packed `0xRRGGBBAA` integers.

use std::str::FromStr;

use image::Rgba;
use serde::{Deserialize, Deserializer};

/// Canvas fill color (straight, non-premultiplied RGBA)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Background(pub Rgba<u8>);

impl Background {
    pub const TRANSPARENT: Background = Background(Rgba([0, 0, 0, 0]));

    pub fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Background(Rgba([r, g, b, a]))
    }

    pub fn to_rgba(self) -> Rgba<u8> {
        self.0
    }
}

impl Default for Background {
    fn default() -> Self {
        Background::TRANSPARENT
    }
}

impl From<u32> for Background {
    fn from(packed: u32) -> Self {
        let [r, g, b, a] = packed.to_be_bytes();
        Background::rgba(r, g, b, a)
    }
}

impl FromStr for Background {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim().to_lowercase();
        if s.is_empty() {
            return Err("empty color string".to_owned());
        }

        if let Some(hex) = s.strip_prefix('#') {
            return parse_hex(hex);
        }
        if let Some(hex) = s.strip_prefix("0x") {
            return u32::from_str_radix(hex, 16)
                .map(Background::from)
                .map_err(|_| format!("invalid packed color \"{s}\""));
        }
        if let Some(args) = function_args(&s, "rgba").or_else(|| function_args(&s, "rgb")) {
            return parse_rgb_args(&args);
        }
        if let Some(args) = function_args(&s, "hsla").or_else(|| function_args(&s, "hsl")) {
            return parse_hsl_args(&args);
        }

        named_color(&s).ok_or_else(|| format!("unknown color \"{s}\""))
    }
}

impl<'de> Deserialize<'de> for Background {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Repr {
            Packed(u32),
            Css(String),
        }

        match Repr::deserialize(deserializer)? {
            Repr::Packed(v) => Ok(Background::from(v)),
            Repr::Css(s) => s.parse().map_err(serde::de::Error::custom),
        }
    }
}

fn parse_hex(hex: &str) -> Result<Background, String> {
    fn nibble(c: char) -> Result<u8, String> {
        c.to_digit(16)
            .map(|d| (d as u8) * 17)
            .ok_or_else(|| format!("invalid hex digit '{c}'"))
    }
    fn byte(pair: &str) -> Result<u8, String> {
        u8::from_str_radix(pair, 16).map_err(|_| format!("invalid hex byte \"{pair}\""))
    }

    if !hex.is_ascii() {
        return Err(format!("invalid hex color \"#{hex}\""));
    }
    let chars: Vec<char> = hex.chars().collect();
    match chars.len() {
        3 | 4 => {
            let a = if chars.len() == 4 { nibble(chars[3])? } else { 255 };
            Ok(Background::rgba(nibble(chars[0])?, nibble(chars[1])?, nibble(chars[2])?, a))
        }
        6 | 8 => {
            let a = if hex.len() == 8 { byte(&hex[6..8])? } else { 255 };
            Ok(Background::rgba(byte(&hex[0..2])?, byte(&hex[2..4])?, byte(&hex[4..6])?, a))
        }
        _ => Err("hex color must be #rgb, #rgba, #rrggbb or #rrggbbaa".to_owned()),
    }
}

fn function_args(s: &str, name: &str) -> Option<Vec<String>> {
    let inner = s.strip_prefix(name)?.trim_start().strip_prefix('(')?.strip_suffix(')')?;
    Some(
        inner
            .split(|c| c == ',' || c == '/' || c == ' ')
            .map(str::trim)
            .filter(|part| !part.is_empty())
            .map(str::to_owned)
            .collect(),
    )
}

/// Channel value: `0..255` or a percentage
fn channel(v: &str) -> Result<u8, String> {
    let value = if let Some(pct) = v.strip_suffix('%') {
        pct.parse::<f64>().map(|p| p / 100.0 * 255.0)
    } else {
        v.parse::<f64>()
    }
    .map_err(|_| format!("invalid color channel \"{v}\""))?;
    Ok(value.clamp(0.0, 255.0).round() as u8)
}

/// Alpha value: `0..1` or a percentage
fn alpha(v: &str) -> Result<u8, String> {
    let value = if let Some(pct) = v.strip_suffix('%') {
        pct.parse::<f64>().map(|p| p / 100.0)
    } else {
        v.parse::<f64>()
    }
    .map_err(|_| format!("invalid alpha \"{v}\""))?;
    Ok((value.clamp(0.0, 1.0) * 255.0).round() as u8)
}

fn fraction(v: &str) -> Result<f64, String> {
    let pct = v.strip_suffix('%').unwrap_or(v);
    pct.parse::<f64>()
        .map(|p| (p / 100.0).clamp(0.0, 1.0))
        .map_err(|_| format!("invalid percentage \"{v}\""))
}

fn parse_rgb_args(args: &[String]) -> Result<Background, String> {
    match args {
        [r, g, b] => Ok(Background::rgba(channel(r)?, channel(g)?, channel(b)?, 255)),
        [r, g, b, a] => Ok(Background::rgba(channel(r)?, channel(g)?, channel(b)?, alpha(a)?)),
        _ => Err("rgb() takes 3 or 4 arguments".to_owned()),
    }
}

fn parse_hsl_args(args: &[String]) -> Result<Background, String> {
    let (h, s, l, a) = match args {
        [h, s, l] => (h, s, l, 255),
        [h, s, l, a] => (h, s, l, alpha(a)?),
        _ => return Err("hsl() takes 3 or 4 arguments".to_owned()),
    };
    let h = h
        .trim_end_matches("deg")
        .parse::<f64>()
        .map_err(|_| format!("invalid hue \"{h}\""))?;
    let [r, g, b] = hsl_to_rgb(h, fraction(s)?, fraction(l)?);
    Ok(Background::rgba(r, g, b, a))
}

fn hsl_to_rgb(h: f64, s: f64, l: f64) -> [u8; 3] {
    fn to_u8(x: f64) -> u8 {
        (x.clamp(0.0, 1.0) * 255.0).round() as u8
    }

    let h = (h % 360.0 + 360.0) % 360.0 / 360.0;
    if s == 0.0 {
        return [to_u8(l); 3];
    }

    fn hue_to_rgb(p: f64, q: f64, mut t: f64) -> f64 {
        if t < 0.0 {
            t += 1.0;
        }
        if t > 1.0 {
            t -= 1.0;
        }
        if t < 1.0 / 6.0 {
            return p + (q - p) * 6.0 * t;
        }
        if t < 1.0 / 2.0 {
            return q;
        }
        if t < 2.0 / 3.0 {
            return p + (q - p) * (2.0 / 3.0 - t) * 6.0;
        }
        p
    }

    let q = if l < 0.5 { l * (1.0 + s) } else { l + s - l * s };
    let p = 2.0 * l - q;
    [
        to_u8(hue_to_rgb(p, q, h + 1.0 / 3.0)),
        to_u8(hue_to_rgb(p, q, h)),
        to_u8(hue_to_rgb(p, q, h - 1.0 / 3.0)),
    ]
}

fn named_color(name: &str) -> Option<Background> {
    let rgb = match name {
        "transparent" => return Some(Background::TRANSPARENT),
        "black" => 0x000000,
        "white" => 0xffffff,
        "red" => 0xff0000,
        "green" => 0x008000,
        "lime" => 0x00ff00,
        "blue" => 0x0000ff,
        "yellow" => 0xffff00,
        "cyan" | "aqua" => 0x00ffff,
        "magenta" | "fuchsia" => 0xff00ff,
        "gray" | "grey" => 0x808080,
        "silver" => 0xc0c0c0,
        "lightgray" | "lightgrey" => 0xd3d3d3,
        "darkgray" | "darkgrey" => 0xa9a9a9,
        "whitesmoke" => 0xf5f5f5,
        "gainsboro" => 0xdcdcdc,
        "maroon" => 0x800000,
        "olive" => 0x808000,
        "navy" => 0x000080,
        "purple" => 0x800080,
        "teal" => 0x008080,
        "orange" => 0xffa500,
        "pink" => 0xffc0cb,
        "brown" => 0xa52a2a,
        "gold" => 0xffd700,
        "indigo" => 0x4b0082,
        "violet" => 0xee82ee,
        "coral" => 0xff7f50,
        "salmon" => 0xfa8072,
        "tomato" => 0xff6347,
        "crimson" => 0xdc143c,
        "turquoise" => 0x40e0d0,
        "skyblue" => 0x87ceeb,
        "steelblue" => 0x4682b4,
        "royalblue" => 0x4169e1,
        "dodgerblue" => 0x1e90ff,
        "slategray" | "slategrey" => 0x708090,
        "darkslategray" | "darkslategrey" => 0x2f4f4f,
        "midnightblue" => 0x191970,
        "beige" => 0xf5f5dc,
        "ivory" => 0xfffff0,
        "lavender" => 0xe6e6fa,
        "khaki" => 0xf0e68c,
        "tan" => 0xd2b48c,
        "chocolate" => 0xd2691e,
        "forestgreen" => 0x228b22,
        "seagreen" => 0x2e8b57,
        "darkgreen" => 0x006400,
        "darkblue" => 0x00008b,
        "darkred" => 0x8b0000,
        _ => return None,
    };
    Some(Background::from((rgb << 8) | 0xff))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_packed_rgba() {
        assert_eq!(Background::from(0x11223344), Background::rgba(0x11, 0x22, 0x33, 0x44));
        assert_eq!(Background::from(0x00000000), Background::TRANSPARENT);
    }

    #[test]
    fn test_hex_forms() {
        assert_eq!("#fff".parse(), Ok(Background::rgba(255, 255, 255, 255)));
        assert_eq!("#0f08".parse(), Ok(Background::rgba(0, 255, 0, 0x88)));
        assert_eq!("#336699".parse(), Ok(Background::rgba(0x33, 0x66, 0x99, 255)));
        assert_eq!("#33669980".parse(), Ok(Background::rgba(0x33, 0x66, 0x99, 0x80)));
        assert_eq!("0xff000080".parse(), Ok(Background::rgba(255, 0, 0, 0x80)));
        assert!("#12345".parse::<Background>().is_err());
    }

    #[test]
    fn test_functional_forms() {
        assert_eq!("rgb(10, 20, 30)".parse(), Ok(Background::rgba(10, 20, 30, 255)));
        assert_eq!("rgba(10,20,30,0.5)".parse(), Ok(Background::rgba(10, 20, 30, 128)));
        assert_eq!("hsl(0, 100%, 50%)".parse(), Ok(Background::rgba(255, 0, 0, 255)));
        assert_eq!("hsla(120, 100%, 25%, 1)".parse(), Ok(Background::rgba(0, 128, 0, 255)));
    }

    #[test]
    fn test_named() {
        assert_eq!("transparent".parse(), Ok(Background::TRANSPARENT));
        assert_eq!(" White ".parse(), Ok(Background::rgba(255, 255, 255, 255)));
        assert!("notacolor".parse::<Background>().is_err());
    }

    #[test]
    fn test_deserialize_string_or_number() {
        let bg: Background = serde_json::from_str("\"#000\"").unwrap();
        assert_eq!(bg, Background::rgba(0, 0, 0, 255));
        let bg: Background = serde_json::from_str("4278190335").unwrap();
        assert_eq!(bg, Background::rgba(255, 0, 0, 255));
    }
}
