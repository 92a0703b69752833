//! Structured editing models for LaTeX math fragments, PGFPlots charts and
//! TikZ figures.
//!
//! These types carry no parsing or rendering logic; the `texform` crate
//! converts them to and from text.

mod math;
mod plot;
mod shape;

pub use math::{MathComponent, MathTag, MatrixDelimiter, SumKind};
pub use plot::{
    AxisConfig, ChartType, LineStyle, PlotConfig, PlotSeries, SeriesId, SeriesKind, SeriesStyle,
    SurfaceStyle,
};
pub use shape::{Point, Shape, ShapeId, ShapeKind, ShapeSet};
