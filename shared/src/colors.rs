use serde::{Deserialize, Serialize};

pub type Rgb = (u8, u8, u8);

pub const DEFAULT_DARKEN_FACTOR: f64 = 0.7;
pub const DEFAULT_LIGHTEN_FACTOR: f64 = 0.3;
/// Returned by [`darken`] when the input is not a `#RRGGBB` color.
pub const DARKEN_FALLBACK: &str = "#888888";
/// Returned by [`lighten`] when the input is not a `#RRGGBB` color.
pub const LIGHTEN_FALLBACK: &str = "#CCCCCC";
pub const DARK_TEXT: &str = "#000000";
pub const LIGHT_TEXT: &str = "#FFFFFF";

/// Parse a strict `#RRGGBB` string (hex digits in either case).
pub fn parse_hex_color(hex: &str) -> Option<Rgb> {
    let hex = hex.strip_prefix('#')?;
    if hex.len() != 6 || !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
        return None;
    }
    let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
    let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
    let b = u8::from_str_radix(&hex[4..6], 16).ok()?;
    Some((r, g, b))
}

pub fn to_hex((r, g, b): Rgb) -> String {
    format!("#{r:02X}{g:02X}{b:02X}")
}

pub fn darken(hex: &str) -> String {
    darken_by(hex, DEFAULT_DARKEN_FACTOR)
}

/// Scale every channel toward 0. `factor` is clamped to `0..=1`; lower is darker.
pub fn darken_by(hex: &str, factor: f64) -> String {
    let Some(rgb) = parse_hex_color(hex) else {
        return DARKEN_FALLBACK.to_string();
    };
    let factor = factor.clamp(0.0, 1.0);
    to_hex(map_channels(rgb, |c| (c as f64 * factor).floor() as u8))
}

pub fn lighten(hex: &str) -> String {
    lighten_by(hex, DEFAULT_LIGHTEN_FACTOR)
}

/// Move every channel toward 255. `factor` is clamped to `0..=1`; higher is lighter.
pub fn lighten_by(hex: &str, factor: f64) -> String {
    let Some(rgb) = parse_hex_color(hex) else {
        return LIGHTEN_FALLBACK.to_string();
    };
    let factor = factor.clamp(0.0, 1.0);
    to_hex(map_channels(rgb, |c| {
        (c as f64 + (255.0 - c as f64) * factor).floor() as u8
    }))
}

fn map_channels((r, g, b): Rgb, f: impl Fn(u8) -> u8) -> Rgb {
    (f(r), f(g), f(b))
}

/// Perceived brightness on the 0..=255 scale.
pub fn brightness((r, g, b): Rgb) -> f64 {
    (r as f64 * 299.0 + g as f64 * 587.0 + b as f64 * 114.0) / 1000.0
}

/// Black text on bright backgrounds, white text on dark ones.
pub fn contrasting_text_color(rgb: Rgb) -> &'static str {
    if brightness(rgb) > 128.0 {
        DARK_TEXT
    } else {
        LIGHT_TEXT
    }
}

/// How a roster color cell should be painted after someone edits it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SwatchFormat {
    pub background: String,
    pub text_color: String,
}

/// `Some` only for a valid `#RRGGBB`; anything else leaves the cell untouched.
pub fn swatch_format(value: &str) -> Option<SwatchFormat> {
    let rgb = parse_hex_color(value)?;
    Some(SwatchFormat {
        background: value.to_string(),
        text_color: contrasting_text_color(rgb).to_string(),
    })
}
