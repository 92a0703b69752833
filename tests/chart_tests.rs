//! Integration tests for the PGFPlots chart transcoder

use pretty_assertions::assert_eq;
use texform::core::pgfplots::{self, DataTables};
use texform::{
    AxisConfig, ChartType, LineStyle, LossKind, PlotConfig, PreviewOptions, SeriesKind,
    SeriesStyle, SurfaceStyle, TranscodeError, Viewport,
};

const SALES: &str = r"\begin{tikzpicture}
\begin{axis}[title={Sales}, xlabel=Month, legend pos=north west, axis lines=left]
\addplot[ybar, fill=blue] table[x=month, y=total, col sep=comma] {
month,total
1,10
2,15
};
\addlegendentry{Total}
\addplot[red, thick, dashed, mark=*] coordinates {(0,1) (1,2) (2,4)};
\legend{ignored, Doubling}
\end{axis}
\end{tikzpicture}";

// ============================================================================
// Building
// ============================================================================

mod building {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_single_function_without_legend() {
        let mut config = PlotConfig::default();
        let style = SeriesStyle {
            color: "blue".into(),
            ..SeriesStyle::default()
        };
        config.push_series(style, SeriesKind::function_2d("x^2"));
        let code = pgfplots::build(&config);
        assert_eq!(
            code,
            "\\begin{tikzpicture}\n\\begin{axis}\n\\addplot[color=blue, domain=-5:5, samples=100] {x^2};\n\\end{axis}\n\\end{tikzpicture}"
        );
        assert_eq!(code.matches("\\addplot").count(), 1);
        assert!(!code.contains("legend pos"));
    }

    #[test]
    fn test_trig_and_log_are_rewritten() {
        let mut config = PlotConfig::default();
        config.push_series(SeriesStyle::default(), SeriesKind::function_2d("sin(x) + log(x)"));
        let code = pgfplots::build(&config);
        assert!(code.contains("{sin(deg(x)) + ln(x)}"));
        let parsed = pgfplots::parse(&code).unwrap();
        match &parsed.plots[0].kind {
            SeriesKind::Function2d { expression, .. } => assert_eq!(expression, "sin(x) + log(x)"),
            other => panic!("unexpected kind {:?}", other),
        }
    }

    #[test]
    fn test_legend_adds_default_position() {
        let mut config = PlotConfig::default();
        let style = SeriesStyle {
            legend: "$f$".into(),
            ..SeriesStyle::default()
        };
        config.push_series(style, SeriesKind::function_2d("x"));
        let code = pgfplots::build(&config);
        assert!(code.contains("legend pos=north east,"));
        assert!(code.contains("\\addlegendentry{$f$}"));
    }
}

// ============================================================================
// Parsing
// ============================================================================

mod parsing {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_mixed_document() {
        let (config, report) = pgfplots::parse_with_report(SALES, &DataTables::new());
        let config = config.expect("axis with series");

        assert_eq!(config.axis.title, "Sales");
        assert_eq!(config.axis.xlabel, "Month");
        assert_eq!(config.axis.legend_pos, "north west");
        assert_eq!(config.plots.len(), 2);

        let bars = &config.plots[0];
        assert_eq!(bars.style.legend, "Total");
        assert_eq!(
            bars.kind,
            SeriesKind::Data {
                chart_type: ChartType::Bar,
                data: "month,total\n1,10\n2,15".into(),
                x_column: "month".into(),
                y_column: "total".into(),
                has_header: true,
            }
        );

        let line = &config.plots[1];
        assert_eq!(line.style.color, "red");
        assert_eq!(line.style.line_width, "0.8pt");
        assert_eq!(line.style.line_style, LineStyle::Dashed);
        assert_eq!(line.style.marker, "*");
        assert_eq!(line.style.legend, "Doubling");
        assert_eq!(
            line.kind,
            SeriesKind::Data {
                chart_type: ChartType::Line,
                data: "0,1\n1,2\n2,4".into(),
                x_column: String::new(),
                y_column: String::new(),
                has_header: false,
            }
        );

        assert_eq!(report.names(), vec!["axis lines", "fill"]);
        assert!(report
            .losses
            .iter()
            .all(|l| l.kind == LossKind::UnknownOption));
    }

    #[test]
    fn test_no_result_cases() {
        assert!(pgfplots::parse("").is_none());
        assert!(pgfplots::parse(r"\begin{tikzpicture}\draw (0,0) -- (1,1);\end{tikzpicture}").is_none());
        assert_eq!(
            pgfplots::try_parse(r"\begin{axis}[title=Empty] \draw (0,0); \end{axis}"),
            Err(TranscodeError::NoSeries)
        );
    }

    #[test]
    fn test_unknown_command_before_series_on_same_line() {
        let (config, report) = pgfplots::parse_with_report(
            r"\begin{axis}\pgfplotsset{x} \addplot {x};\end{axis}",
            &DataTables::new(),
        );
        let config = config.expect("series after unknown command");
        assert_eq!(config.plots.len(), 1);
        assert_eq!(report.names(), vec![r"\pgfplotsset"]);
    }

    #[test]
    fn test_deeply_nested_domain_does_not_crash() {
        let code = format!(
            r"\begin{{axis}}\addplot[domain={}1:2] {{x}};\end{{axis}}",
            "-".repeat(200_000)
        );
        let config = pgfplots::parse(&code).expect("series survives");
        assert_eq!(config.plots.len(), 1);
    }

    #[test]
    fn test_table_read_and_registry() {
        let code = r"\pgfplotstableread{
a b
1 2
3 5
}\loaded
\begin{axis}
\addplot table[x=a, y=b] {\loaded};
\addplot table {\external};
\addplot table {\missing};
\end{axis}";
        let mut registry = DataTables::new();
        registry.insert("external".into(), "0 0\n1 1".into());
        let (config, report) = pgfplots::parse_with_report(code, &registry);
        let config = config.unwrap();
        let data: Vec<&str> = config
            .plots
            .iter()
            .map(|p| match &p.kind {
                SeriesKind::Data { data, .. } => data.as_str(),
                _ => "",
            })
            .collect();
        assert_eq!(data, vec!["a b\n1 2\n3 5", "0 0\n1 1", "\\missing"]);
        assert_eq!(report.losses.len(), 1);
        assert_eq!(report.losses[0].kind, LossKind::UnresolvedTable);
        assert_eq!(report.losses[0].name, "missing");
    }

    #[test]
    fn test_surface_series() {
        let code = r"\begin{axis}
\addplot3[mesh, domain=-1:1, y domain=0:2, samples=10, colormap/viridis] {x*y};
\end{axis}";
        let config = pgfplots::parse(code).unwrap();
        assert_eq!(
            config.plots[0].kind,
            SeriesKind::Function3d {
                expression: "x*y".into(),
                domain_x: [-1.0, 1.0],
                domain_y: [0.0, 2.0],
                samples: 10,
                plot_style: SurfaceStyle::Mesh,
                colormap: "viridis".into(),
            }
        );
    }
}

// ============================================================================
// Stability
// ============================================================================

mod stability {
    use super::*;
    use pretty_assertions::assert_eq;

    fn assert_stable(config: &PlotConfig) {
        let first = pgfplots::build(config);
        let reparsed = pgfplots::parse(&first).expect("built code parses");
        assert_eq!(pgfplots::build(&reparsed), first);
    }

    #[test]
    fn test_parsed_document_is_stable() {
        let config = pgfplots::parse(SALES).unwrap();
        assert_stable(&config);
    }

    #[test]
    fn test_every_chart_type_is_stable() {
        let mut config = PlotConfig::new(AxisConfig {
            title: "All kinds".into(),
            ylabel: "value, units".into(),
            ymin: "0".into(),
            grid: "both".into(),
            width: "10cm".into(),
            ..AxisConfig::default()
        });
        for (i, chart_type) in [
            ChartType::Line,
            ChartType::Scatter,
            ChartType::Bar,
            ChartType::Area,
        ]
        .into_iter()
        .enumerate()
        {
            let style = SeriesStyle {
                color: format!("blue!{}!black", 20 * (i + 1)),
                line_style: LineStyle::Dotted,
                legend: format!("series {}", i),
                ..SeriesStyle::default()
            };
            config.push_series(style, SeriesKind::data(chart_type, "1 2\n2 4\n3 1"));
        }
        config.push_series(
            SeriesStyle::default(),
            SeriesKind::Data {
                chart_type: ChartType::Line,
                data: "t,v\n0,1\n1,0".into(),
                x_column: "t".into(),
                y_column: "v".into(),
                has_header: true,
            },
        );
        config.push_series(
            SeriesStyle::default(),
            SeriesKind::Data {
                chart_type: ChartType::Scatter,
                data: "measurements.csv".into(),
                x_column: "0".into(),
                y_column: "2".into(),
                has_header: false,
            },
        );
        assert_stable(&config);
    }

    #[test]
    fn test_blank_fields_are_stable() {
        let mut config = PlotConfig::default();
        config.push_series(
            SeriesStyle {
                marker: "none".into(),
                legend: "  ".into(),
                ..SeriesStyle::default()
            },
            SeriesKind::function_2d(""),
        );
        config.push_series(
            SeriesStyle {
                color: " red ".into(),
                ..SeriesStyle::default()
            },
            SeriesKind::function_2d("x"),
        );
        assert_stable(&config);
        let code = pgfplots::build(&config);
        assert_eq!(code.matches(r"\addplot").count(), 2);
        assert!(!code.contains("mark=none"));
        assert!(!code.contains(r"\addlegendentry"));
    }
}

// ============================================================================
// Preview
// ============================================================================

mod preview {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_render_parsed_document() {
        let config = pgfplots::parse(SALES).unwrap();
        let mut svg = String::new();
        pgfplots::render(
            &config,
            Viewport::new(640.0, 480.0),
            &PreviewOptions::default(),
            &mut svg,
        );
        assert!(svg.starts_with("<svg"));
        assert!(svg.ends_with("</svg>"));
        assert!(svg.contains(r#"width="640""#));
        assert!(svg.contains("<polyline"));
        assert!(svg.contains(r#"fill-opacity="0.8""#));
        assert!(svg.contains(r#"<g class="legend">"#));
        assert!(svg.contains(">Sales</text>"));
    }

    #[test]
    fn test_non_finite_color_percentage_falls_back_to_black() {
        let mut config = PlotConfig::default();
        config.push_series(
            SeriesStyle {
                color: "red!nan!blue".into(),
                ..SeriesStyle::default()
            },
            SeriesKind::function_2d("x"),
        );
        let mut svg = String::new();
        pgfplots::render(
            &config,
            Viewport::new(320.0, 240.0),
            &PreviewOptions::default(),
            &mut svg,
        );
        let line = svg.split("<polyline").nth(1).expect("series drawn");
        assert!(line.contains(r##"stroke="#000000""##));
    }
}
