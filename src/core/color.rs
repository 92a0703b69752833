//! Color token resolution
//!
//! Resolves the compact xcolor-style tokens used by PGFPlots and TikZ
//! options into concrete RGBA values:
//!
//! - named palette entries (`red`, `teal`, `lightgray`, ...)
//! - hex codes (`#f80`, `#ff8800`)
//! - explicit triples (`{rgb,255:red,10;green,20;blue,30}`)
//! - mixes (`blue!50!white`, `red!30!blue!60!black`)
//! - a trailing single-color percentage (`green!20`)
//!
//! One resolver serves both output encodings. They differ only in how a
//! trailing `color!pct` is treated: [`resolve_hex`] mixes with white (the
//! xcolor meaning, used by the chart preview) while [`resolve_css`] and
//! [`SingleBlend::Alpha`] turn the percentage into alpha (used by the shape
//! preview, the CLI and the WASM bindings).

use lazy_static::lazy_static;
use phf::phf_map;
use regex::Regex;

/// Color used when a token cannot be resolved.
pub const FALLBACK: Rgba = Rgba::opaque(0.0, 0.0, 0.0);

lazy_static! {
    static ref RGB_TRIPLE: Regex = Regex::new(
        r"^\{?\s*rgb\s*,\s*255\s*:\s*red\s*,\s*(\d+(?:\.\d+)?)\s*;\s*green\s*,\s*(\d+(?:\.\d+)?)\s*;\s*blue\s*,\s*(\d+(?:\.\d+)?)\s*\}?$"
    )
    .unwrap();
}

/// xcolor base colors, as 0-255 channels.
static PALETTE: phf::Map<&'static str, (u8, u8, u8)> = phf_map! {
    "red" => (255, 0, 0),
    "green" => (0, 255, 0),
    "blue" => (0, 0, 255),
    "cyan" => (0, 255, 255),
    "magenta" => (255, 0, 255),
    "yellow" => (255, 255, 0),
    "black" => (0, 0, 0),
    "white" => (255, 255, 255),
    "gray" => (128, 128, 128),
    "grey" => (128, 128, 128),
    "darkgray" => (64, 64, 64),
    "darkgrey" => (64, 64, 64),
    "lightgray" => (191, 191, 191),
    "lightgrey" => (191, 191, 191),
    "brown" => (191, 128, 64),
    "lime" => (191, 255, 0),
    "olive" => (128, 128, 0),
    "orange" => (255, 128, 0),
    "pink" => (255, 191, 191),
    "purple" => (191, 0, 64),
    "teal" => (0, 128, 128),
    "violet" => (128, 0, 128),
};

/// A resolved color. Channels are 0-255 and kept fractional so mixes stay
/// exact; alpha is 0-1.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rgba {
    pub r: f64,
    pub g: f64,
    pub b: f64,
    pub a: f64,
}

impl Rgba {
    pub const fn opaque(r: f64, g: f64, b: f64) -> Self {
        Rgba { r, g, b, a: 1.0 }
    }

    /// Linear per-channel mix: `weight` of `self`, the rest of `other`.
    pub fn mix(self, other: Rgba, weight: f64) -> Rgba {
        let w = weight.clamp(0.0, 1.0);
        let lerp = |a: f64, b: f64| a * w + b * (1.0 - w);
        Rgba {
            r: lerp(self.r, other.r),
            g: lerp(self.g, other.g),
            b: lerp(self.b, other.b),
            a: lerp(self.a, other.a),
        }
    }

    fn channel(v: f64) -> u8 {
        v.round().clamp(0.0, 255.0) as u8
    }

    /// `#rrggbb`; alpha is dropped.
    pub fn to_hex(self) -> String {
        format!(
            "#{:02x}{:02x}{:02x}",
            Self::channel(self.r),
            Self::channel(self.g),
            Self::channel(self.b)
        )
    }

    /// `rgb(r, g, b)`, or `rgba(r, g, b, a)` when not opaque.
    pub fn to_css(self) -> String {
        let (r, g, b) = (
            Self::channel(self.r),
            Self::channel(self.g),
            Self::channel(self.b),
        );
        if self.a >= 1.0 {
            format!("rgb({}, {}, {})", r, g, b)
        } else {
            let a = (self.a.clamp(0.0, 1.0) * 1000.0).round() / 1000.0;
            format!("rgba({}, {}, {}, {})", r, g, b, a)
        }
    }
}

/// How a trailing `color!pct` (no second color) is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SingleBlend {
    /// Mix with white, as xcolor does.
    White,
    /// Keep the color and use the percentage as opacity.
    Alpha,
}

/// Resolve with xcolor semantics. Never fails; unknown tokens yield [`FALLBACK`].
pub fn resolve(token: &str) -> Rgba {
    resolve_with(token, SingleBlend::White).unwrap_or(FALLBACK)
}

/// Resolve and encode as `#rrggbb`.
pub fn resolve_hex(token: &str) -> String {
    resolve(token).to_hex()
}

/// Resolve with alpha-style single blends and encode as a CSS function.
pub fn resolve_css(token: &str) -> String {
    resolve_with(token, SingleBlend::Alpha)
        .unwrap_or(FALLBACK)
        .to_css()
}

/// Resolve a token, returning `None` when no rule applies.
pub fn resolve_with(token: &str, single: SingleBlend) -> Option<Rgba> {
    let token = token.trim();
    if token.is_empty() {
        return None;
    }
    if let Some(color) = resolve_atom(token) {
        return Some(color);
    }
    if token.contains('!') {
        return resolve_mix(token, single);
    }
    None
}

/// True when the token resolves without falling back.
pub fn is_color(token: &str) -> bool {
    resolve_with(token, SingleBlend::White).is_some()
}

fn resolve_atom(token: &str) -> Option<Rgba> {
    let token = token.trim();
    if let Some(&(r, g, b)) = PALETTE.get(token) {
        return Some(Rgba::opaque(r as f64, g as f64, b as f64));
    }
    if let Some(hex) = token.strip_prefix('#') {
        return parse_hex(hex);
    }
    if let Some(caps) = RGB_TRIPLE.captures(token) {
        let channel = |i: usize| -> Option<f64> {
            caps.get(i)?
                .as_str()
                .parse::<f64>()
                .ok()
                .map(|v| v.clamp(0.0, 255.0))
        };
        return Some(Rgba::opaque(channel(1)?, channel(2)?, channel(3)?));
    }
    None
}

fn parse_hex(hex: &str) -> Option<Rgba> {
    if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }
    let expanded: String = match hex.len() {
        3 => hex.chars().flat_map(|c| [c, c]).collect(),
        6 => hex.to_string(),
        _ => return None,
    };
    let channel = |i: usize| u8::from_str_radix(&expanded[i..i + 2], 16).ok();
    Some(Rgba::opaque(
        channel(0)? as f64,
        channel(2)? as f64,
        channel(4)? as f64,
    ))
}

/// `c1!p1!c2!p2!c3...` folds left: `(c1!p1!c2)!p2!c3`. A trailing `!p`
/// without a color applies the single-color rule.
fn resolve_mix(token: &str, single: SingleBlend) -> Option<Rgba> {
    let parts: Vec<&str> = token.split('!').map(str::trim).collect();
    let mut color = resolve_atom(parts.first()?)?;
    let mut rest = &parts[1..];
    while let Some((pct, tail)) = rest.split_first() {
        let pct = pct.parse::<f64>().ok().filter(|p| p.is_finite())?;
        let weight = pct.clamp(0.0, 100.0) / 100.0;
        match tail.split_first() {
            Some((other, tail)) => {
                color = color.mix(resolve_atom(other)?, weight);
                rest = tail;
            }
            None => {
                color = match single {
                    SingleBlend::White => color.mix(Rgba::opaque(255.0, 255.0, 255.0), weight),
                    SingleBlend::Alpha => Rgba {
                        a: color.a * weight,
                        ..color
                    },
                };
                rest = &[];
            }
        }
    }
    Some(color)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_named_and_hex() {
        assert_eq!(resolve_hex("teal"), "#008080");
        assert_eq!(resolve_hex("#F80"), "#ff8800");
        assert_eq!(resolve_hex("#123456"), "#123456");
        assert_eq!(resolve_css("red"), "rgb(255, 0, 0)");
    }

    #[test]
    fn test_rgb_triple() {
        assert_eq!(resolve_hex("{rgb,255:red,10;green,20;blue,30}"), "#0a141e");
        assert_eq!(resolve_hex("rgb,255:red,255; green,0; blue,0"), "#ff0000");
    }

    #[test]
    fn test_two_color_mix_midpoint() {
        let c = resolve("blue!50!white");
        assert_eq!((c.r, c.g, c.b), (127.5, 127.5, 255.0));
    }

    #[test]
    fn test_mix_extremes_are_exact() {
        assert_eq!(resolve("red!100!blue"), resolve("red"));
        assert_eq!(resolve("red!0!blue"), resolve("blue"));
    }

    #[test]
    fn test_chained_mix() {
        let expected = resolve("red").mix(resolve("blue"), 0.5).mix(resolve("black"), 0.5);
        assert_eq!(resolve("red!50!blue!50!black"), expected);
    }

    #[test]
    fn test_single_blend_encodings_differ() {
        // xcolor: 20% green, 80% white.
        assert_eq!(resolve_hex("green!20"), "#ccffcc");
        assert_eq!(resolve_css("green!20"), "rgba(0, 255, 0, 0.2)");
    }

    #[test]
    fn test_fallback() {
        assert_eq!(resolve_hex("notacolor"), "#000000");
        assert_eq!(resolve_hex(""), "#000000");
        assert_eq!(resolve_hex("red!abc!blue"), "#000000");
        assert_eq!(resolve_hex("#12"), "#000000");
        assert_eq!(resolve_css("red!nan!blue"), "rgb(0, 0, 0)");
        assert_eq!(resolve_css("red!inf"), "rgb(0, 0, 0)");
        assert!(!is_color("green!NaN"));
        assert!(!is_color("thick"));
        assert!(is_color("red!20"));
    }
}
