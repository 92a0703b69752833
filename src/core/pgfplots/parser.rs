//! PGFPlots text → [`PlotConfig`].
//!
//! The parser is lenient: it locates the `axis` environment, reads the
//! recognized axis options, then walks the body for `\addplot` commands.
//! Everything outside the model's vocabulary is dropped and recorded in the
//! [`LossReport`].

use texform_model::{
    AxisConfig, ChartType, LineStyle, PlotConfig, SeriesKind, SeriesStyle, SurfaceStyle,
};

use super::data::{self, DataTables};
use super::eval::eval_constant;
use super::rewrite::from_pgfplots;
use crate::core::color;
use crate::core::scan::{
    extract_group, extract_group_at, extract_optional_arg, find_matching_brace,
    find_matching_bracket, skip_whitespace, split_key_value, split_options,
};
use crate::utils::error::{TranscodeError, TranscodeResult};
use crate::utils::loss::{LossKind, LossReport};

const BEGIN_AXIS: &str = r"\begin{axis}";
const END_AXIS: &str = r"\end{axis}";

/// Default `domain` and `samples` of PGFPlots itself, used when a series
/// does not set them.
const PGF_DOMAIN: [f64; 2] = [-5.0, 5.0];
const PGF_SAMPLES: u32 = 25;

/// TikZ line-width flags in points.
fn width_flag(flag: &str) -> Option<&'static str> {
    Some(match flag {
        "ultra thin" => "0.1pt",
        "very thin" => "0.2pt",
        "thin" => "0.4pt",
        "semithick" => "0.6pt",
        "thick" => "0.8pt",
        "very thick" => "1.2pt",
        "ultra thick" => "1.6pt",
        _ => return None,
    })
}

fn line_style_flag(flag: &str) -> Option<LineStyle> {
    let base = flag
        .strip_prefix("densely ")
        .or_else(|| flag.strip_prefix("loosely "))
        .unwrap_or(flag);
    Some(match base {
        "solid" => LineStyle::Solid,
        "dashed" => LineStyle::Dashed,
        "dotted" => LineStyle::Dotted,
        "dashdotted" | "dash dot" => LineStyle::DashDotted,
        _ => return None,
    })
}

/// Options of one `\addplot`, before the payload decides the series kind.
#[derive(Default)]
struct SeriesOptions {
    style: SeriesStyle,
    chart_type: Option<ChartType>,
    surface: Option<SurfaceStyle>,
    domain: Option<[f64; 2]>,
    y_domain: Option<[f64; 2]>,
    samples: Option<u32>,
    colormap: String,
}

fn parse_domain(value: &str) -> Option<[f64; 2]> {
    let (lo, hi) = value.split_once(':')?;
    Some([eval_constant(lo.trim())?, eval_constant(hi.trim())?])
}

fn read_series_options(opts: &str, context: &str, report: &mut LossReport) -> SeriesOptions {
    let mut out = SeriesOptions::default();
    for opt in split_options(opts) {
        let (key, value) = split_key_value(&opt);
        let has_value = opt.contains('=');
        match key.as_str() {
            "color" | "draw" if has_value => out.style.color = value,
            "line width" if has_value => out.style.line_width = value,
            "mark" if has_value => {
                out.style.marker = if value == "none" { String::new() } else { value }
            }
            "no markers" | "no marks" => out.style.marker.clear(),
            "only marks" => out.chart_type = Some(ChartType::Scatter),
            "ybar" => out.chart_type = Some(ChartType::Bar),
            "area style" => out.chart_type = Some(ChartType::Area),
            "surf" => out.surface = Some(SurfaceStyle::Surf),
            "mesh" => out.surface = Some(SurfaceStyle::Mesh),
            "samples" if has_value => match value.trim().parse::<u32>() {
                Ok(n) if n > 0 => out.samples = Some(n),
                _ => report.push(LossKind::UnknownOption, opt.as_str(), context),
            },
            "domain" if has_value => match parse_domain(&value) {
                Some(d) => out.domain = Some(d),
                None => report.push(LossKind::UnknownOption, opt.as_str(), context),
            },
            "y domain" if has_value => match parse_domain(&value) {
                Some(d) => out.y_domain = Some(d),
                None => report.push(LossKind::UnknownOption, opt.as_str(), context),
            },
            "colormap name" if has_value => out.colormap = value,
            k if !has_value && k.starts_with("colormap/") => {
                out.colormap = k["colormap/".len()..].to_string()
            }
            k if !has_value => {
                if let Some(width) = width_flag(k) {
                    out.style.line_width = width.to_string();
                } else if let Some(style) = line_style_flag(k) {
                    out.style.line_style = style;
                } else if color::is_color(k) {
                    out.style.color = k.to_string();
                } else {
                    report.push(LossKind::UnknownOption, k, context);
                }
            }
            _ => report.push(LossKind::UnknownOption, key.as_str(), context),
        }
    }
    out
}

fn read_axis_options(opts: &str, report: &mut LossReport) -> AxisConfig {
    let mut axis = AxisConfig::default();
    for opt in split_options(opts) {
        let (key, value) = split_key_value(&opt);
        let slot = match key.as_str() {
            "title" => &mut axis.title,
            "xlabel" => &mut axis.xlabel,
            "ylabel" => &mut axis.ylabel,
            "zlabel" => &mut axis.zlabel,
            "xmin" => &mut axis.xmin,
            "xmax" => &mut axis.xmax,
            "ymin" => &mut axis.ymin,
            "ymax" => &mut axis.ymax,
            "grid" => &mut axis.grid,
            "legend pos" => &mut axis.legend_pos,
            "width" => &mut axis.width,
            "height" => &mut axis.height,
            _ => {
                report.push(LossKind::UnknownOption, key.as_str(), "axis");
                continue;
            }
        };
        *slot = value;
    }
    axis
}

/// Index of the `;` ending a series, outside any `{}`, `[]` or `()`.
fn series_end(body: &str, from: usize) -> usize {
    let bytes = body.as_bytes();
    let mut i = from;
    let mut parens = 0usize;
    while i < bytes.len() {
        match bytes[i] {
            b'{' => {
                i = find_matching_brace(body, i) + 1;
                continue;
            }
            b'[' => {
                i = find_matching_bracket(body, i) + 1;
                continue;
            }
            b'(' => parens += 1,
            b')' => parens = parens.saturating_sub(1),
            b';' if parens == 0 => return i,
            _ => {}
        }
        i += 1;
    }
    bytes.len()
}

/// Index past the `[...]` and `{...}` arguments directly following `from`.
fn skip_arguments(body: &str, from: usize) -> usize {
    let mut pos = from;
    loop {
        if let Some((_, after)) = extract_optional_arg(body, pos) {
            pos = after;
        } else if let Some((_, after)) = extract_group_at(body, pos) {
            pos = after;
        } else {
            return pos;
        }
    }
}

struct Parser<'a> {
    body: &'a str,
    local_tables: DataTables,
    tables: &'a DataTables,
    report: &'a mut LossReport,
    config: PlotConfig,
}

impl Parser<'_> {
    fn context(&self) -> String {
        format!("series {}", self.config.plots.len() + 1)
    }

    fn resolve_table(&mut self, name: &str) -> Option<String> {
        self.local_tables
            .get(name)
            .or_else(|| self.tables.get(name))
            .cloned()
    }

    /// Read a `table[opts]{...}` payload (after the `table` keyword).
    fn table_payload(&mut self, rest: &str, chart_type: ChartType) -> SeriesKind {
        let context = self.context();
        let (opts, after) = extract_optional_arg(rest, 0).unwrap_or_default();
        let content = match extract_group_at(rest, after) {
            Some((content, _)) => content,
            None => rest[after..].trim().to_string(),
        };

        let mut x_column = String::new();
        let mut y_column = String::new();
        let mut has_header = true;
        for opt in split_options(&opts) {
            let (key, value) = split_key_value(&opt);
            match key.as_str() {
                "x" | "x index" => x_column = value,
                "y" | "y index" => y_column = value,
                "header" => has_header = value.trim() != "false",
                // Separators are re-derived from the rows on build.
                "col sep" | "row sep" => {}
                _ => self.report.push(LossKind::UnknownOption, key.as_str(), context.as_str()),
            }
        }

        let data = match data::table_reference(&content) {
            Some(name) => match self.resolve_table(name) {
                Some(rows) => rows,
                None => {
                    self.report
                        .push(LossKind::UnresolvedTable, name, context.as_str());
                    content.trim().to_string()
                }
            },
            None if data::is_file_reference(&content) => content.trim().to_string(),
            None => data::normalize_rows(&content),
        };

        SeriesKind::Data {
            chart_type,
            data,
            x_column,
            y_column,
            has_header,
        }
    }

    /// Parse one `\addplot` starting at `start`. Returns the index after it.
    fn series(&mut self, start: usize) -> usize {
        let body = self.body;
        let mut pos = start + r"\addplot".len();
        let is_3d = body[pos..].starts_with('3');
        if is_3d {
            pos += 1;
        }
        if body[pos..].starts_with('+') {
            pos += 1;
        }
        let (opts, after) = extract_optional_arg(body, pos).unwrap_or((String::new(), pos));
        let end = series_end(body, after);
        let payload = body[after..end].trim();
        let payload = payload
            .strip_suffix(r"\closedcycle")
            .unwrap_or(payload)
            .trim();

        let context = self.context();
        let options = read_series_options(&opts, &context, self.report);
        let kind = self.payload(payload, is_3d, &options);

        let mut next = (end + 1).min(body.len());
        let Some(kind) = kind else {
            self.report
                .push(LossKind::EmptyPayload, r"\addplot", context.as_str());
            return next;
        };

        let mut style = options.style;
        let legend_at = skip_whitespace(body, next);
        if body[legend_at..].starts_with(r"\addlegendentry") {
            let arg = legend_at + r"\addlegendentry".len();
            if let Some((legend, after)) = extract_group_at(body, arg) {
                style.legend = legend.trim().to_string();
                next = after;
            }
        }

        self.config.push_series(style, kind);
        next
    }

    fn payload(
        &mut self,
        payload: &str,
        is_3d: bool,
        options: &SeriesOptions,
    ) -> Option<SeriesKind> {
        let chart_type = options.chart_type.unwrap_or(ChartType::Line);
        if let Some(rest) = payload.strip_prefix("coordinates") {
            let rows = extract_group(rest, 0)
                .map(|(inner, _)| data::parse_coordinates(&inner))
                .unwrap_or_default();
            return Some(SeriesKind::Data {
                chart_type,
                data: rows,
                x_column: String::new(),
                y_column: String::new(),
                has_header: false,
            });
        }
        if let Some(rest) = payload.strip_prefix("table") {
            return Some(self.table_payload(rest, chart_type));
        }

        let expression = if payload.starts_with('{') {
            extract_group(payload, 0).map(|(inner, _)| inner)?
        } else {
            payload.to_string()
        };
        let expression = from_pgfplots(expression.trim());
        if expression.is_empty() {
            return None;
        }

        if options.chart_type.is_some() {
            let flag = match chart_type {
                ChartType::Scatter => "only marks",
                ChartType::Bar => "ybar",
                ChartType::Area => "area style",
                ChartType::Line => "",
            };
            let context = self.context();
            self.report
                .push(LossKind::UnknownOption, flag, context.as_str());
        }

        let domain = options.domain.unwrap_or(PGF_DOMAIN);
        let samples = options.samples.unwrap_or(PGF_SAMPLES);
        Some(if is_3d {
            SeriesKind::Function3d {
                expression,
                domain_x: domain,
                domain_y: options.y_domain.unwrap_or(domain),
                samples,
                plot_style: options.surface.unwrap_or_default(),
                colormap: options.colormap.clone(),
            }
        } else {
            SeriesKind::Function2d {
                expression,
                domain,
                samples,
            }
        })
    }

    /// `\legend{a,b,...}` labels series positionally where they lack one.
    fn apply_legend_list(&mut self, labels: &str) {
        for (series, label) in self.config.plots.iter_mut().zip(split_options(labels)) {
            if series.style.legend.is_empty() {
                series.style.legend = label;
            }
        }
    }

    fn skip_unknown_command(&mut self, at: usize) -> usize {
        let body = self.body;
        let name_end = body[at + 1..]
            .find(|c: char| !c.is_ascii_alphabetic())
            .map(|i| at + 1 + i)
            .unwrap_or(body.len());
        let name = &body[at..name_end.max(at + 1)];
        self.report.push(LossKind::UnknownCommand, name, "axis");
        // Drawing commands run to `;`, others take their bracket and brace
        // arguments.
        match name {
            r"\draw" | r"\node" | r"\fill" | r"\path" => {
                (series_end(body, name_end) + 1).min(body.len())
            }
            _ => skip_arguments(body, name_end),
        }
    }

    fn run(&mut self) {
        let body = self.body;
        let bytes = body.as_bytes();
        let mut pos = 0;
        while pos < bytes.len() {
            match bytes[pos] {
                b'%' => {
                    pos = body[pos..]
                        .find('\n')
                        .map(|i| pos + i + 1)
                        .unwrap_or(body.len());
                }
                b'\\' if body[pos..].starts_with(r"\addplot") => pos = self.series(pos),
                b'\\' if body[pos..].starts_with(r"\legend{") => {
                    match extract_group_at(body, pos + r"\legend".len()) {
                        Some((labels, after)) => {
                            self.apply_legend_list(&labels);
                            pos = after;
                        }
                        None => pos += 1,
                    }
                }
                b'\\' if body[pos + 1..].starts_with(|c: char| c.is_ascii_alphabetic()) => {
                    pos = self.skip_unknown_command(pos)
                }
                _ => pos += 1,
            }
        }
    }
}

/// Parse chart code, recording dropped input in `report`.
pub(super) fn parse_document(
    code: &str,
    tables: &DataTables,
    report: &mut LossReport,
) -> TranscodeResult<PlotConfig> {
    let Some(begin) = code.find(BEGIN_AXIS) else {
        tracing::debug!("no axis environment");
        return Err(TranscodeError::NoAxis);
    };
    let after_begin = begin + BEGIN_AXIS.len();
    let (opts, body_start) =
        extract_optional_arg(code, after_begin).unwrap_or((String::new(), after_begin));
    let body_end = code[body_start..]
        .find(END_AXIS)
        .map(|i| body_start + i)
        .unwrap_or(code.len());

    let axis = read_axis_options(&opts, report);
    let mut parser = Parser {
        body: &code[body_start..body_end],
        local_tables: data::collect_table_reads(code),
        tables,
        report,
        config: PlotConfig::new(axis),
    };
    parser.run();

    if parser.config.plots.is_empty() {
        tracing::debug!("axis environment has no recognized series");
        return Err(TranscodeError::NoSeries);
    }
    Ok(parser.config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn parse(code: &str) -> (TranscodeResult<PlotConfig>, LossReport) {
        let mut report = LossReport::new();
        let result = parse_document(code, &DataTables::new(), &mut report);
        (result, report)
    }

    #[test]
    fn test_no_axis_and_no_series() {
        assert_eq!(parse(r"\begin{tikzpicture}\end{tikzpicture}").0, Err(TranscodeError::NoAxis));
        assert_eq!(
            parse(r"\begin{axis}[title=Empty] \end{axis}").0,
            Err(TranscodeError::NoSeries)
        );
    }

    #[test]
    fn test_axis_options() {
        let code = r"\begin{axis}[title={A, B}, xlabel=$x$, xmin=-1, legend pos=north west, axis lines=middle]
\addplot {x};
\end{axis}";
        let (cfg, report) = parse(code);
        let cfg = cfg.unwrap();
        assert_eq!(cfg.axis.title, "A, B");
        assert_eq!(cfg.axis.xlabel, "$x$");
        assert_eq!(cfg.axis.xmin, "-1");
        assert_eq!(cfg.axis.legend_pos, "north west");
        assert_eq!(report.names(), vec!["axis lines"]);
    }

    #[test]
    fn test_function_series_options() {
        let code = r"\begin{axis}
\addplot[red, thick, dashed, mark=*, domain=-pi:pi, samples=50] {sin(deg(x))};
\addlegendentry{$\sin x$}
\end{axis}";
        let cfg = parse(code).0.unwrap();
        let series = &cfg.plots[0];
        assert_eq!(series.style.color, "red");
        assert_eq!(series.style.line_width, "0.8pt");
        assert_eq!(series.style.line_style, LineStyle::Dashed);
        assert_eq!(series.style.marker, "*");
        assert_eq!(series.style.legend, r"$\sin x$");
        match &series.kind {
            SeriesKind::Function2d {
                expression,
                domain,
                samples,
            } => {
                assert_eq!(expression, "sin(x)");
                assert!((domain[0] + std::f64::consts::PI).abs() < 1e-12);
                assert_eq!(*samples, 50);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_defaults_follow_pgfplots() {
        let cfg = parse(r"\begin{axis}\addplot x^2; \end{axis}").0.unwrap();
        assert_eq!(
            cfg.plots[0].kind,
            SeriesKind::Function2d {
                expression: "x^2".into(),
                domain: [-5.0, 5.0],
                samples: 25,
            }
        );
    }

    #[test]
    fn test_addplot3_surface() {
        let code = r"\begin{axis}
\addplot3[mesh, domain=-1:1, y domain=0:2, samples=10, colormap/viridis] {x*y};
\end{axis}";
        let cfg = parse(code).0.unwrap();
        assert_eq!(
            cfg.plots[0].kind,
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

    #[test]
    fn test_coordinates_and_chart_flags() {
        let code = r"\begin{axis}
\addplot+[only marks] coordinates {(0,1) (1,2)};
\addplot[ybar, fill=blue] coordinates {(1,3)};
\addplot[area style] coordinates {(0,0) (1,1)} \closedcycle;
\end{axis}";
        let (cfg, report) = parse(code);
        let cfg = cfg.unwrap();
        let types: Vec<ChartType> = cfg
            .plots
            .iter()
            .map(|p| match &p.kind {
                SeriesKind::Data { chart_type, .. } => *chart_type,
                _ => panic!("expected data"),
            })
            .collect();
        assert_eq!(types, vec![ChartType::Scatter, ChartType::Bar, ChartType::Area]);
        match &cfg.plots[0].kind {
            SeriesKind::Data { data, .. } => assert_eq!(data, "0,1\n1,2"),
            _ => unreachable!(),
        }
        assert_eq!(report.names(), vec!["fill"]);
    }

    #[test]
    fn test_table_columns_and_header() {
        let code = r"\begin{axis}
\addplot table[x=t, y=v, col sep=comma] {
t,v
0,1
};
\addplot table[x index=0, y index=2, header=false] {data.csv};
\end{axis}";
        let cfg = parse(code).0.unwrap();
        assert_eq!(
            cfg.plots[0].kind,
            SeriesKind::Data {
                chart_type: ChartType::Line,
                data: "t,v\n0,1".into(),
                x_column: "t".into(),
                y_column: "v".into(),
                has_header: true,
            }
        );
        assert_eq!(
            cfg.plots[1].kind,
            SeriesKind::Data {
                chart_type: ChartType::Line,
                data: "data.csv".into(),
                x_column: "0".into(),
                y_column: "2".into(),
                has_header: false,
            }
        );
    }

    #[test]
    fn test_table_references() {
        let code = r"\pgfplotstableread{
a b
1 2
}\local
\begin{tikzpicture}
\begin{axis}
\addplot table[x=a, y=b] {\local};
\addplot table {\external};
\addplot table {\missing};
\end{axis}
\end{tikzpicture}";
        let mut tables = DataTables::new();
        tables.insert("external".into(), "5 6".into());
        let mut report = LossReport::new();
        let cfg = parse_document(code, &tables, &mut report).unwrap();
        let datas: Vec<&str> = cfg
            .plots
            .iter()
            .map(|p| match &p.kind {
                SeriesKind::Data { data, .. } => data.as_str(),
                _ => panic!("expected data"),
            })
            .collect();
        assert_eq!(datas, vec!["a b\n1 2", "5 6", r"\missing"]);
        assert_eq!(report.losses.len(), 1);
        assert_eq!(report.losses[0].kind, LossKind::UnresolvedTable);
        assert_eq!(report.losses[0].name, "missing");
    }

    #[test]
    fn test_legend_list_and_unknown_commands() {
        let code = r"\begin{axis}
% comment \addplot {ignored};
\addplot {x};
\addplot {2*x};
\addlegendentry{kept}
\node at (1,1) {note; here};
\legend{first, second}
\end{axis}";
        let (cfg, report) = parse(code);
        let cfg = cfg.unwrap();
        assert_eq!(cfg.plots.len(), 2);
        assert_eq!(cfg.plots[0].style.legend, "first");
        assert_eq!(cfg.plots[1].style.legend, "kept");
        assert_eq!(report.names(), vec![r"\node"]);
    }

    #[test]
    fn test_unknown_command_keeps_later_series_on_line() {
        let (cfg, report) = parse(
            r"\begin{axis}\pgfplotsset{every axis/.style={thick}} \addplot {x}; \foo[a]{b}{c}\addplot {2*x};\end{axis}",
        );
        let cfg = cfg.unwrap();
        assert_eq!(cfg.plots.len(), 2);
        assert_eq!(report.names(), vec![r"\pgfplotsset", r"\foo"]);
    }

    #[test]
    fn test_deep_domain_expression_is_reported() {
        let code = format!(
            r"\begin{{axis}}\addplot[domain={}1:2] {{x}};\end{{axis}}",
            "-".repeat(200_000)
        );
        let (cfg, report) = parse(&code);
        let cfg = cfg.unwrap();
        assert_eq!(cfg.plots.len(), 1);
        assert_eq!(report.losses[0].kind, LossKind::UnknownOption);
    }

    #[test]
    fn test_empty_payload_is_dropped() {
        let (cfg, report) = parse(r"\begin{axis} \addplot {}; \addplot {x}; \end{axis}");
        assert_eq!(cfg.unwrap().plots.len(), 1);
        assert_eq!(report.losses[0].kind, LossKind::EmptyPayload);
    }
}
