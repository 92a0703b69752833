//! [`PlotConfig`] → PGFPlots text.

use std::fmt::Write;

use texform_model::{ChartType, LineStyle, PlotConfig, PlotSeries, SeriesKind, SeriesStyle};

use super::data;
use super::rewrite::to_pgfplots;
use crate::core::scan::option_value;

const DEFAULT_LEGEND_POS: &str = "north east";
const INDENT: &str = "    ";
/// Stand-in for an empty function, so the series survives a reparse.
const EMPTY_EXPRESSION: &str = "0";

/// Generate a complete `tikzpicture` with one `axis`.
pub fn build_document(config: &PlotConfig) -> String {
    let mut output = String::new();
    output.push_str("\\begin{tikzpicture}\n");

    let options = axis_options(config);
    if options.is_empty() {
        output.push_str("\\begin{axis}\n");
    } else {
        output.push_str("\\begin{axis}[\n");
        for opt in &options {
            let _ = writeln!(output, "{}{},", INDENT, opt);
        }
        output.push_str("]\n");
    }

    for series in &config.plots {
        emit_series(series, &mut output);
    }

    output.push_str("\\end{axis}\n");
    output.push_str("\\end{tikzpicture}");
    output
}

fn axis_options(config: &PlotConfig) -> Vec<String> {
    let axis = &config.axis;
    let mut opts = Vec::new();
    // Free text is braced so commas and `=` survive the option splitter.
    for (key, value) in [
        ("title", &axis.title),
        ("xlabel", &axis.xlabel),
        ("ylabel", &axis.ylabel),
        ("zlabel", &axis.zlabel),
    ] {
        if !value.is_empty() {
            opts.push(format!("{}={{{}}}", key, value));
        }
    }
    for (key, value) in [
        ("xmin", &axis.xmin),
        ("xmax", &axis.xmax),
        ("ymin", &axis.ymin),
        ("ymax", &axis.ymax),
        ("grid", &axis.grid),
    ] {
        push_option(&mut opts, key, value);
    }
    if config.has_legend() {
        let pos = match axis.legend_pos.trim() {
            "" => DEFAULT_LEGEND_POS,
            pos => pos,
        };
        opts.push(format!("legend pos={}", option_value(pos)));
    }
    for (key, value) in [("width", &axis.width), ("height", &axis.height)] {
        push_option(&mut opts, key, value);
    }
    opts
}

/// `key=value`, skipped when the value is blank.
fn push_option(opts: &mut Vec<String>, key: &str, value: &str) {
    if !value.trim().is_empty() {
        opts.push(format!("{}={}", key, option_value(value)));
    }
}

fn style_options(style: &SeriesStyle, opts: &mut Vec<String>) {
    push_option(opts, "color", &style.color);
    push_option(opts, "line width", &style.line_width);
    if style.line_style != LineStyle::Solid {
        opts.push(style.line_style.keyword().to_string());
    }
    // `mark=none` reads back as no marker.
    if style.marker.trim() != "none" {
        push_option(opts, "mark", &style.marker);
    }
}

fn function_payload(expression: &str) -> String {
    match expression.trim() {
        "" => format!("{{{}}}", EMPTY_EXPRESSION),
        expr => format!("{{{}}}", to_pgfplots(expr)),
    }
}

fn emit_series(series: &PlotSeries, output: &mut String) {
    let mut opts = Vec::new();
    let mut command = "\\addplot";
    let payload = match &series.kind {
        SeriesKind::Function2d {
            expression,
            domain,
            samples,
        } => {
            style_options(&series.style, &mut opts);
            opts.push(format!("domain={}:{}", domain[0], domain[1]));
            opts.push(format!("samples={}", (*samples).max(1)));
            function_payload(expression)
        }
        SeriesKind::Function3d {
            expression,
            domain_x,
            domain_y,
            samples,
            plot_style,
            colormap,
        } => {
            command = "\\addplot3";
            opts.push(plot_style.keyword().to_string());
            style_options(&series.style, &mut opts);
            opts.push(format!("domain={}:{}", domain_x[0], domain_x[1]));
            opts.push(format!("y domain={}:{}", domain_y[0], domain_y[1]));
            opts.push(format!("samples={}", (*samples).max(1)));
            if !colormap.trim().is_empty() {
                opts.push(format!("colormap/{}", colormap.trim()));
            }
            function_payload(expression)
        }
        SeriesKind::Data {
            chart_type,
            data,
            x_column,
            y_column,
            has_header,
        } => {
            match chart_type {
                ChartType::Line => {}
                ChartType::Scatter => opts.push("only marks".to_string()),
                ChartType::Bar => opts.push("ybar".to_string()),
                ChartType::Area => opts.push("area style".to_string()),
            }
            style_options(&series.style, &mut opts);
            let mut payload = data_payload(data, x_column, y_column, *has_header);
            if *chart_type == ChartType::Area {
                payload.push_str(" \\closedcycle");
            }
            payload
        }
    };

    output.push_str(command);
    if !opts.is_empty() {
        let _ = write!(output, "[{}]", opts.join(", "));
    }
    let _ = writeln!(output, " {};", payload);

    let legend = series.style.legend.trim();
    if !legend.is_empty() {
        let _ = writeln!(output, "\\addlegendentry{{{}}}", legend);
    }
}

fn data_payload(data: &str, x_column: &str, y_column: &str, has_header: bool) -> String {
    let reference = data::is_file_reference(data);
    if x_column.is_empty() && y_column.is_empty() && !reference {
        return format!("coordinates {{{}}}", data::format_coordinates(data, has_header));
    }

    let mut topts = Vec::new();
    let (x_key, y_key) = if has_header {
        ("x", "y")
    } else {
        ("x index", "y index")
    };
    if !x_column.is_empty() {
        topts.push(format!("{}={}", x_key, option_value(x_column)));
    }
    if !y_column.is_empty() {
        topts.push(format!("{}={}", y_key, option_value(y_column)));
    }
    if !has_header {
        topts.push("header=false".to_string());
    }
    if data.contains(',') {
        topts.push("col sep=comma".to_string());
    }

    let mut payload = String::from("table");
    if !topts.is_empty() {
        let _ = write!(payload, "[{}]", topts.join(", "));
    }
    if reference {
        let _ = write!(payload, " {{{}}}", data.trim());
    } else {
        let _ = write!(payload, " {{\n{}\n}}", data::normalize_rows(data));
    }
    payload
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use texform_model::{AxisConfig, SeriesKind, SeriesStyle};

    #[test]
    fn test_minimal_document() {
        let mut cfg = PlotConfig::default();
        cfg.push_series(SeriesStyle::default(), SeriesKind::function_2d("x^2"));
        assert_eq!(
            build_document(&cfg),
            "\\begin{tikzpicture}\n\\begin{axis}\n\\addplot[domain=-5:5, samples=100] {x^2};\n\\end{axis}\n\\end{tikzpicture}"
        );
    }

    #[test]
    fn test_axis_options_and_legend_pos() {
        let mut cfg = PlotConfig::new(AxisConfig {
            title: "Growth, fast".into(),
            xmin: "0".into(),
            grid: "major".into(),
            ..AxisConfig::default()
        });
        let style = SeriesStyle {
            legend: "$e^x$".into(),
            ..SeriesStyle::default()
        };
        cfg.push_series(style, SeriesKind::function_2d("exp(x)"));
        let out = build_document(&cfg);
        assert!(out.contains("\\begin{axis}[\n    title={Growth, fast},\n    xmin=0,\n    grid=major,\n    legend pos=north east,\n]\n"));
        assert!(out.contains("\\addlegendentry{$e^x$}\n"));
    }

    #[test]
    fn test_series_styling_and_rewrite() {
        let mut cfg = PlotConfig::default();
        let style = SeriesStyle {
            color: "red!50!black".into(),
            line_width: "1pt".into(),
            line_style: LineStyle::Dotted,
            marker: "o".into(),
            legend: String::new(),
        };
        cfg.push_series(style, SeriesKind::function_2d("sin(x) + log(x)"));
        let out = build_document(&cfg);
        assert!(out.contains(
            "\\addplot[color=red!50!black, line width=1pt, dotted, mark=o, domain=-5:5, samples=100] {sin(deg(x)) + ln(x)};"
        ));
    }

    #[test]
    fn test_surface_series() {
        let mut cfg = PlotConfig::default();
        let mut kind = SeriesKind::function_3d("x^2 - y^2");
        if let SeriesKind::Function3d { colormap, .. } = &mut kind {
            *colormap = "hot".into();
        }
        cfg.push_series(SeriesStyle::default(), kind);
        assert!(build_document(&cfg).contains(
            "\\addplot3[surf, domain=-2:2, y domain=-2:2, samples=25, colormap/hot] {x^2 - y^2};"
        ));
    }

    #[test]
    fn test_data_payload_forms() {
        assert_eq!(
            data_payload("1,2\n3,4", "", "", false),
            "coordinates {(1,2) (3,4)}"
        );
        assert_eq!(
            data_payload("t,v\n0,1", "t", "v", true),
            "table[x=t, y=v, col sep=comma] {\nt,v\n0,1\n}"
        );
        assert_eq!(
            data_payload("data.dat", "0", "2", false),
            "table[x index=0, y index=2, header=false] {data.dat}"
        );
    }

    #[test]
    fn test_canonical_edge_values() {
        let mut cfg = PlotConfig::default();
        let style = SeriesStyle {
            color: " rgb,255:red,10;green,20;blue,30 ".into(),
            marker: "none".into(),
            legend: "  ".into(),
            ..SeriesStyle::default()
        };
        cfg.push_series(
            style,
            SeriesKind::Function2d {
                expression: "  ".into(),
                domain: [0.0, 1.0],
                samples: 0,
            },
        );
        assert_eq!(
            build_document(&cfg),
            "\\begin{tikzpicture}\n\\begin{axis}\n\\addplot[color={rgb,255:red,10;green,20;blue,30}, domain=0:1, samples=1] {0};\n\\end{axis}\n\\end{tikzpicture}"
        );
    }

    #[test]
    fn test_area_closes_cycle() {
        let mut cfg = PlotConfig::default();
        cfg.push_series(
            SeriesStyle::default(),
            SeriesKind::data(ChartType::Area, "0,0\n1,1"),
        );
        assert!(build_document(&cfg)
            .contains("\\addplot[area style] coordinates {(0,0) (1,1)} \\closedcycle;"));
    }
}
