//! Shared settings and SVG helpers for the chart and shape previews.

use serde::{Deserialize, Serialize};
use std::fmt::Write;

/// Pixel size of a preview surface.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub width: f64,
    pub height: f64,
}

impl Viewport {
    pub fn new(width: f64, height: f64) -> Self {
        Viewport {
            width: width.max(1.0),
            height: height.max(1.0),
        }
    }
}

impl Default for Viewport {
    fn default() -> Self {
        Viewport::new(400.0, 300.0)
    }
}

/// Preview appearance. Every field has a default so partial config files work.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PreviewOptions {
    /// Shape previews: padding around the bounding box, in model units.
    pub shape_padding: f64,
    /// Stroke used for de-emphasized shapes in focus mode.
    pub muted_stroke: String,
    pub background: String,
    pub font_size: f64,
    /// Series colors used when a series has no color of its own.
    pub palette: Vec<String>,
    /// 3D view angles in degrees (PGFPlots default `view={25}{30}`).
    pub view_azimuth: f64,
    pub view_elevation: f64,
    /// Samples per axis for 3D surfaces in the preview, capped to keep
    /// the output small.
    pub max_surface_samples: u32,
}

impl Default for PreviewOptions {
    fn default() -> Self {
        PreviewOptions {
            shape_padding: 0.5,
            muted_stroke: "#cccccc".to_string(),
            background: "white".to_string(),
            font_size: 12.0,
            palette: ["blue", "red", "brown!60!black", "black", "teal", "orange"]
                .iter()
                .map(|c| c.to_string())
                .collect(),
            view_azimuth: 25.0,
            view_elevation: 30.0,
            max_surface_samples: 30,
        }
    }
}

impl PreviewOptions {
    /// Palette entry for the `index`-th series.
    pub fn cycle_color(&self, index: usize) -> &str {
        if self.palette.is_empty() {
            "blue"
        } else {
            &self.palette[index % self.palette.len()]
        }
    }
}

/// Format a coordinate for SVG/TikZ output: at most three decimals,
/// no trailing zeros, no negative zero.
pub fn fmt_num(value: f64) -> String {
    if !value.is_finite() {
        return "0".to_string();
    }
    let rounded = (value * 1000.0).round() / 1000.0;
    if rounded == 0.0 {
        return "0".to_string();
    }
    let mut s = format!("{:.3}", rounded);
    while s.ends_with('0') {
        s.pop();
    }
    if s.ends_with('.') {
        s.pop();
    }
    s
}

pub fn escape_xml(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(c),
        }
    }
    out
}

/// Strip inline math delimiters and a few common commands so a LaTeX label
/// reads sensibly as plain SVG text.
pub fn plain_label(latex: &str) -> String {
    let mut s = latex.replace('$', "");
    for (cmd, repl) in [
        ("\\,", " "),
        ("\\cdot", "·"),
        ("\\pi", "π"),
        ("\\theta", "θ"),
        ("\\alpha", "α"),
        ("\\beta", "β"),
        ("\\infty", "∞"),
        ("\\textbf", ""),
        ("\\mathrm", ""),
        ("\\text", ""),
    ] {
        s = s.replace(cmd, repl);
    }
    s.replace(['{', '}'], "").trim().to_string()
}

/// Open an `<svg>` element sized to the viewport and paint the background.
pub fn open_svg(out: &mut String, viewport: Viewport, background: Option<&str>) {
    let _ = write!(
        out,
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="{w}" height="{h}" viewBox="0 0 {w} {h}">"#,
        w = fmt_num(viewport.width),
        h = fmt_num(viewport.height)
    );
    if let Some(bg) = background {
        let _ = write!(
            out,
            r#"<rect x="0" y="0" width="{}" height="{}" fill="{}"/>"#,
            fmt_num(viewport.width),
            fmt_num(viewport.height),
            escape_xml(bg)
        );
    }
}

pub fn close_svg(out: &mut String) {
    out.push_str("</svg>");
}

/// SVG `stroke-dasharray` for a TikZ line style, scaled by stroke width.
pub fn dash_array(style: texform_model::LineStyle, width: f64) -> Option<String> {
    use texform_model::LineStyle;
    let w = width.max(1.0);
    match style {
        LineStyle::Solid => None,
        LineStyle::Dashed => Some(format!("{} {}", fmt_num(3.0 * w), fmt_num(3.0 * w))),
        LineStyle::Dotted => Some(format!("{} {}", fmt_num(w), fmt_num(2.0 * w))),
        LineStyle::DashDotted => Some(format!(
            "{} {} {} {}",
            fmt_num(3.0 * w),
            fmt_num(2.0 * w),
            fmt_num(w),
            fmt_num(2.0 * w)
        )),
    }
}

/// Parse a TeX dimension into points. Bare numbers are points.
pub fn dimension_to_pt(dim: &str) -> Option<f64> {
    let dim = dim.trim();
    let split = dim
        .find(|c: char| c.is_ascii_alphabetic())
        .unwrap_or(dim.len());
    let value: f64 = dim[..split].trim().parse().ok()?;
    let factor = match dim[split..].trim() {
        "" | "pt" => 1.0,
        "bp" => 72.27 / 72.0,
        "px" => 0.75,
        "mm" => 2.845_276,
        "cm" => 28.452_756,
        "in" => 72.27,
        "em" => 10.0,
        "ex" => 4.3,
        _ => return None,
    };
    Some(value * factor)
}
