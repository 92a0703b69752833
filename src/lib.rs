//! # texform
//!
//! Structured editing transcoders for three kinds of LaTeX content:
//!
//! - **Math fragments**: classify a fragment (fraction, integral, matrix, …),
//!   parse it into an editable [`MathComponent`], rebuild canonical text.
//! - **PGFPlots charts**: parse `axis` code into a [`PlotConfig`], rebuild
//!   canonical code, render an SVG preview.
//! - **TikZ shapes**: generate `tikzpicture` code from a shape list and
//!   render an SVG preview with optional focus on one shape.
//!
//! ## Example
//!
//! ```
//! use texform::{build_math, classify_math, parse_math, MathTag};
//!
//! let text = r"\frac{a+b}{c}";
//! assert_eq!(classify_math(text), MathTag::Fraction);
//! let component = parse_math(text);
//! assert_eq!(build_math(&component), text);
//! ```
//!
//! Every entry point is a pure function. Parsing never fails on malformed
//! input; the only "no result" case is chart code without a usable `axis`.

pub mod core;
pub mod utils;

pub mod wasm;

pub use texform_model::{
    AxisConfig, ChartType, LineStyle, MathComponent, MathTag, MatrixDelimiter, PlotConfig,
    PlotSeries, Point, SeriesId, SeriesKind, SeriesStyle, Shape, ShapeId, ShapeKind, ShapeSet,
    SumKind, SurfaceStyle,
};

pub use crate::core::color::{resolve as resolve_color, resolve_css, resolve_hex, Rgba};
pub use crate::core::pgfplots::DataTables;
pub use crate::core::preview::{PreviewOptions, Viewport};
pub use crate::utils::error::{TranscodeError, TranscodeResult};
pub use crate::utils::loss::{LossKind, LossRecord, LossReport};

/// Classify a LaTeX math fragment.
pub fn classify_math(text: &str) -> MathTag {
    core::math::classify(text)
}

/// Classify and parse a LaTeX math fragment.
pub fn parse_math(text: &str) -> MathComponent {
    core::math::parse_auto(text)
}

/// Canonical LaTeX for a math component.
pub fn build_math(component: &MathComponent) -> String {
    core::math::build(component)
}

/// Parse PGFPlots code. `None` without an `axis` holding a series.
pub fn parse_chart(code: &str) -> Option<PlotConfig> {
    core::pgfplots::parse(code)
}

/// Canonical PGFPlots code for a chart.
pub fn build_chart(config: &PlotConfig) -> String {
    core::pgfplots::build(config)
}

/// `tikzpicture` code for a shape list.
pub fn generate_tikz(shapes: &[Shape]) -> String {
    core::tikz::generate_code(shapes)
}
