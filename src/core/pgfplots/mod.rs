//! PGFPlots chart transcoder
//!
//! Converts between PGFPlots `axis` code and the structured [`PlotConfig`]
//! chart model, and renders an SVG preview of a model.
//!
//! Parsing is lenient and lossy: options outside the model's vocabulary are
//! dropped (see [`parse_with_report`]). Building always produces the same
//! canonical layout, so `build(parse(build(c)))` equals `build(c)`.
//!
//! ## Example
//!
//! ```
//! use texform::core::pgfplots;
//!
//! let code = r"\begin{axis}[title=Demo] \addplot[blue] {x^2}; \end{axis}";
//! let config = pgfplots::parse(code).unwrap();
//! assert_eq!(config.axis.title, "Demo");
//! assert!(pgfplots::build(&config).contains(r"\addplot[color=blue"));
//! ```

mod builder;
pub mod data;
pub mod eval;
mod parser;
mod render;
pub mod rewrite;

use texform_model::PlotConfig;

pub use data::DataTables;

use crate::core::preview::{PreviewOptions, Viewport};
use crate::utils::error::TranscodeResult;
use crate::utils::loss::LossReport;

/// Parse chart code. `None` when there is no `axis` environment or it
/// holds no recognized series.
pub fn parse(code: &str) -> Option<PlotConfig> {
    parse_with_tables(code, &DataTables::new())
}

/// Parse with a registry of named tables for `table {\name}` payloads.
/// Tables defined in `code` with `\pgfplotstableread` take precedence.
pub fn parse_with_tables(code: &str, tables: &DataTables) -> Option<PlotConfig> {
    parser::parse_document(code, tables, &mut LossReport::new()).ok()
}

/// Like [`parse_with_tables`], also returning what was dropped.
pub fn parse_with_report(code: &str, tables: &DataTables) -> (Option<PlotConfig>, LossReport) {
    let mut report = LossReport::new();
    let config = parser::parse_document(code, tables, &mut report).ok();
    (config, report)
}

/// Like [`parse`], but says why there is no result.
pub fn try_parse(code: &str) -> TranscodeResult<PlotConfig> {
    parser::parse_document(code, &DataTables::new(), &mut LossReport::new())
}

/// Generate canonical PGFPlots code for `config`.
pub fn build(config: &PlotConfig) -> String {
    builder::build_document(config)
}

/// Render an SVG preview into `out`, replacing its previous contents.
pub fn render(config: &PlotConfig, viewport: Viewport, options: &PreviewOptions, out: &mut String) {
    render::render_chart(config, viewport, options, out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::error::TranscodeError;
    use pretty_assertions::assert_eq;
    use texform_model::{ChartType, SeriesKind, SeriesStyle};

    #[test]
    fn test_try_parse_reasons() {
        assert_eq!(try_parse("plain text"), Err(TranscodeError::NoAxis));
        assert_eq!(
            try_parse(r"\begin{axis}\end{axis}"),
            Err(TranscodeError::NoSeries)
        );
        assert!(parse(r"\begin{axis}\end{axis}").is_none());
    }

    #[test]
    fn test_build_is_stable() {
        let mut config = PlotConfig::default();
        config.axis.title = "Mixed, chart".into();
        config.axis.xlabel = "$t$".into();
        let style = SeriesStyle {
            color: "blue!60!black".into(),
            legend: "wave".into(),
            ..SeriesStyle::default()
        };
        config.push_series(style, SeriesKind::function_2d("sin(x)/x"));
        config.push_series(
            SeriesStyle::default(),
            SeriesKind::data(ChartType::Scatter, "0,1\n1,3\n2,2"),
        );
        config.push_series(SeriesStyle::default(), SeriesKind::function_3d("exp(-x^2-y^2)"));

        let first = build(&config);
        let reparsed = parse(&first).expect("built code parses");
        assert_eq!(build(&reparsed), first);
    }

    #[test]
    fn test_report_lists_dropped_options() {
        let code = r"\begin{axis}[axis lines=left]
\addplot[smooth, red] {x};
\end{axis}";
        let (config, report) = parse_with_report(code, &DataTables::new());
        assert_eq!(config.unwrap().plots[0].style.color, "red");
        assert_eq!(report.names(), vec!["axis lines", "smooth"]);
    }

    #[test]
    fn test_render_replaces_buffer() {
        let config = parse(r"\begin{axis} \addplot {x}; \end{axis}").unwrap();
        let mut out = String::from("<old/>");
        render(&config, Viewport::default(), &PreviewOptions::default(), &mut out);
        assert!(out.starts_with("<svg"));
        assert!(!out.contains("<old/>"));
    }
}
