//! Core transcoders
//!
//! - `math`: LaTeX math fragment ↔ [`texform_model::MathComponent`]
//! - `pgfplots`: PGFPlots axis code ↔ [`texform_model::PlotConfig`], SVG preview
//! - `tikz`: shapes → TikZ code, SVG preview
//!
//! `scan`, `color` and `preview` are the primitives they share.

pub mod color;
pub mod math;
pub mod pgfplots;
pub mod preview;
pub mod scan;
pub mod tikz;
