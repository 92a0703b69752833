//! Name lookups for the model's closed vocabularies.
//!
//! Used where names arrive as text (CLI flags, WASM arguments). Unknown names
//! are an error rather than a silent default.

use phf::phf_map;
use texform_model::{ChartType, LineStyle, MathTag, SurfaceStyle};

use super::error::{TranscodeError, TranscodeResult};

static LINE_STYLES: phf::Map<&'static str, LineStyle> = phf_map! {
    "solid" => LineStyle::Solid,
    "dashed" => LineStyle::Dashed,
    "dotted" => LineStyle::Dotted,
    "dashdotted" => LineStyle::DashDotted,
    "dash-dotted" => LineStyle::DashDotted,
};

static CHART_TYPES: phf::Map<&'static str, ChartType> = phf_map! {
    "line" => ChartType::Line,
    "scatter" => ChartType::Scatter,
    "bar" => ChartType::Bar,
    "area" => ChartType::Area,
};

static SURFACE_STYLES: phf::Map<&'static str, SurfaceStyle> = phf_map! {
    "surf" => SurfaceStyle::Surf,
    "mesh" => SurfaceStyle::Mesh,
};

/// Accepts the kebab-case tag names, e.g. `partial-derivative`.
pub fn math_tag(name: &str) -> TranscodeResult<MathTag> {
    MathTag::from_name(name.trim()).ok_or_else(|| TranscodeError::unknown("math tag", name))
}

pub fn line_style(name: &str) -> TranscodeResult<LineStyle> {
    LINE_STYLES
        .get(name.trim())
        .copied()
        .ok_or_else(|| TranscodeError::unknown("line style", name))
}

pub fn chart_type(name: &str) -> TranscodeResult<ChartType> {
    CHART_TYPES
        .get(name.trim())
        .copied()
        .ok_or_else(|| TranscodeError::unknown("chart type", name))
}

pub fn surface_style(name: &str) -> TranscodeResult<SurfaceStyle> {
    SURFACE_STYLES
        .get(name.trim())
        .copied()
        .ok_or_else(|| TranscodeError::unknown("surface style", name))
}
