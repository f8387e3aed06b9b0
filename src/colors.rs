//! Color-opacity composition for layer styling.
//!
//! Style colors arrive as hex (`#rgb` / `#rrggbb`), `rgb(...)`, `rgba(...)`,
//! or arbitrary strings (named colors). Opacity is folded into an explicit
//! alpha channel where the format allows it:
//! - `rgba(...)` already carries alpha and passes through unchanged
//! - `rgb(...)` becomes `rgba(...)` by literal text substitution
//! - hex is expanded (short form doubled) and rewritten as `rgba(r, g, b, a)`
//! - anything else passes through untouched for the rendering surface to try
//!
//! Malformed hex resolves to opaque black instead of failing.

use log::warn;

pub const OPAQUE_BLACK: &str = "rgba(0, 0, 0, 1)";

/// Compose a color string with an opacity in `0..=1`.
pub fn with_opacity(color: &str, opacity: f64) -> String {
    if color.starts_with("rgba") {
        return color.to_string();
    }
    if color.starts_with("rgb") {
        return color
            .replacen("rgb", "rgba", 1)
            .replacen(')', &format!(", {opacity})"), 1);
    }
    if let Some(hex) = color.strip_prefix('#') {
        return match parse_hex(hex) {
            Some((r, g, b)) => format!("rgba({r}, {g}, {b}, {opacity})"),
            None => {
                warn!("Invalid hex color {color:?}, using opaque black");
                OPAQUE_BLACK.to_string()
            }
        };
    }
    color.to_string()
}

/// Decode a hex color body (without `#`). Short `rgb` form is doubled to
/// `rrggbb` first; anything that is not 6 hex digits after expansion is
/// rejected.
fn parse_hex(hex: &str) -> Option<(u8, u8, u8)> {
    let expanded: String = if hex.len() == 3 {
        hex.chars().flat_map(|c| [c, c]).collect()
    } else {
        hex.to_string()
    };

    if expanded.len() != 6 || !expanded.is_ascii() {
        return None;
    }

    let r = u8::from_str_radix(&expanded[0..2], 16).ok()?;
    let g = u8::from_str_radix(&expanded[2..4], 16).ok()?;
    let b = u8::from_str_radix(&expanded[4..6], 16).ok()?;
    Some((r, g, b))
}
