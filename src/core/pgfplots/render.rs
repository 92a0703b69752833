//! SVG preview of a [`PlotConfig`].
//!
//! 2D charts sample functions through the expression evaluator and read
//! data rows directly. When any series is a surface the chart switches to a
//! projected 3D view using the PGFPlots default camera.

use std::fmt::Write;

use texform_model::{ChartType, LineStyle, PlotConfig, PlotSeries, SeriesKind, SurfaceStyle};

use super::data;
use super::eval::{compile, eval_constant, Expr};
use crate::core::color::{self, Rgba};
use crate::core::preview::{
    close_svg, dash_array, dimension_to_pt, escape_xml, fmt_num, open_svg, plain_label,
    PreviewOptions, Viewport,
};

const MAX_SAMPLES: u32 = 1000;
const MARKER_RADIUS: f64 = 3.0;
const GRID_STROKE: &str = "#e0e0e0";
const DEFAULT_STROKE_WIDTH: f64 = 1.5;
const TICK_TARGET: usize = 5;

// ============================================================================
// Layout
// ============================================================================

#[derive(Debug, Clone, Copy)]
struct Area {
    left: f64,
    top: f64,
    width: f64,
    height: f64,
}

impl Area {
    fn right(&self) -> f64 {
        self.left + self.width
    }

    fn bottom(&self) -> f64 {
        self.top + self.height
    }
}

fn plot_area(config: &PlotConfig, viewport: Viewport, options: &PreviewOptions) -> Area {
    let fs = options.font_size;
    let axis = &config.axis;
    let top = if axis.title.is_empty() { fs } else { fs * 2.5 };
    let bottom = fs * if axis.xlabel.is_empty() { 2.0 } else { 3.5 };
    let left = fs * if axis.ylabel.is_empty() { 3.5 } else { 5.0 };
    let right = fs * 1.5;
    Area {
        left,
        top,
        width: (viewport.width - left - right).max(1.0),
        height: (viewport.height - top - bottom).max(1.0),
    }
}

/// Data-to-pixel mapping for a 2D chart.
struct Frame {
    area: Area,
    x: [f64; 2],
    y: [f64; 2],
}

impl Frame {
    fn px(&self, x: f64) -> f64 {
        self.area.left + (x - self.x[0]) / (self.x[1] - self.x[0]) * self.area.width
    }

    fn py(&self, y: f64) -> f64 {
        self.area.bottom() - (y - self.y[0]) / (self.y[1] - self.y[0]) * self.area.height
    }
}

/// Round tick positions covering `[lo, hi]` with a 1/2/5 step.
fn nice_ticks(lo: f64, hi: f64, target: usize) -> Vec<f64> {
    let span = hi - lo;
    if !(span.is_finite() && span > 0.0) {
        return vec![lo];
    }
    let raw = span / target.max(1) as f64;
    let magnitude = 10f64.powi(raw.log10().floor() as i32);
    let step = [1.0, 2.0, 5.0, 10.0]
        .iter()
        .map(|m| m * magnitude)
        .find(|s| *s >= raw)
        .unwrap_or(10.0 * magnitude);
    let first = (lo / step - 1e-9).ceil() as i64;
    let last = (hi / step + 1e-9).floor() as i64;
    (first..=last).map(|k| k as f64 * step).collect()
}

/// Widen an empty or inverted range so the mapping stays finite.
fn sane_range(lo: f64, hi: f64) -> [f64; 2] {
    if !(lo.is_finite() && hi.is_finite()) || hi < lo {
        return [0.0, 1.0];
    }
    if hi - lo < 1e-12 {
        return [lo - 1.0, hi + 1.0];
    }
    [lo, hi]
}

fn axis_bound(value: &str) -> Option<f64> {
    if value.trim().is_empty() {
        None
    } else {
        eval_constant(value)
    }
}

// ============================================================================
// Series sampling
// ============================================================================

enum Trace {
    Curve(Vec<Vec<(f64, f64)>>),
    Scatter(Vec<(f64, f64)>),
    Bars(Vec<(f64, f64)>),
    Area(Vec<(f64, f64)>),
}

impl Trace {
    fn points(&self) -> Box<dyn Iterator<Item = &(f64, f64)> + '_> {
        match self {
            Trace::Curve(segments) => Box::new(segments.iter().flatten()),
            Trace::Scatter(pts) | Trace::Bars(pts) | Trace::Area(pts) => Box::new(pts.iter()),
        }
    }
}

struct Drawn<'a> {
    series: &'a PlotSeries,
    color: String,
    stroke_width: f64,
    trace: Trace,
}

fn series_color(series: &PlotSeries, index: usize, options: &PreviewOptions) -> String {
    if series.style.color.is_empty() {
        color::resolve_hex(options.cycle_color(index))
    } else {
        color::resolve_hex(&series.style.color)
    }
}

fn stroke_width(series: &PlotSeries) -> f64 {
    dimension_to_pt(&series.style.line_width)
        .map(|pt| (pt * 2.0).max(0.5))
        .unwrap_or(DEFAULT_STROKE_WIDTH)
}

fn compile_logged(expression: &str, series: &PlotSeries) -> Option<Expr> {
    match compile(expression) {
        Ok(expr) => Some(expr),
        Err(err) => {
            tracing::debug!(series = %series.id, %err, "expression not previewable");
            None
        }
    }
}

fn sample_function(expr: &Expr, domain: [f64; 2], samples: u32) -> Vec<Vec<(f64, f64)>> {
    let n = samples.clamp(2, MAX_SAMPLES);
    let [lo, hi] = domain;
    let mut segments = Vec::new();
    let mut current = Vec::new();
    for i in 0..n {
        let x = lo + (hi - lo) * f64::from(i) / f64::from(n - 1);
        let y = expr.eval(x, 0.0);
        if y.is_finite() {
            current.push((x, y));
        } else if !current.is_empty() {
            segments.push(std::mem::take(&mut current));
        }
    }
    if !current.is_empty() {
        segments.push(current);
    }
    segments
}

fn trace_2d(series: &PlotSeries) -> Option<Trace> {
    match &series.kind {
        SeriesKind::Function2d {
            expression,
            domain,
            samples,
        } => {
            let expr = compile_logged(expression, series)?;
            Some(Trace::Curve(sample_function(&expr, *domain, *samples)))
        }
        SeriesKind::Data {
            chart_type,
            data: rows,
            x_column,
            y_column,
            has_header,
        } => {
            if data::is_file_reference(rows) {
                tracing::debug!(series = %series.id, "external data file not previewed");
                return None;
            }
            let pts = data::points(rows, x_column, y_column, *has_header);
            Some(match chart_type {
                ChartType::Line => Trace::Curve(vec![pts]),
                ChartType::Scatter => Trace::Scatter(pts),
                ChartType::Bar => Trace::Bars(pts),
                ChartType::Area => Trace::Area(pts),
            })
        }
        SeriesKind::Function3d { .. } => None,
    }
}

// ============================================================================
// Entry point
// ============================================================================

/// Render `config` as SVG into `out`, replacing its contents.
pub fn render_chart(
    config: &PlotConfig,
    viewport: Viewport,
    options: &PreviewOptions,
    out: &mut String,
) {
    out.clear();
    open_svg(out, viewport, Some(options.background.as_str()));
    let area = plot_area(config, viewport, options);

    let is_3d = config
        .plots
        .iter()
        .any(|p| matches!(p.kind, SeriesKind::Function3d { .. }));
    if is_3d {
        render_3d(config, area, options, out);
    } else {
        render_2d(config, area, options, out);
    }

    draw_titles(config, viewport, area, options, is_3d, out);
    draw_legend(config, area, options, out);
    close_svg(out);
}

// ============================================================================
// 2D charts
// ============================================================================

fn render_2d(config: &PlotConfig, area: Area, options: &PreviewOptions, out: &mut String) {
    let drawn: Vec<Drawn> = config
        .plots
        .iter()
        .enumerate()
        .filter_map(|(i, series)| {
            Some(Drawn {
                series,
                color: series_color(series, i, options),
                stroke_width: stroke_width(series),
                trace: trace_2d(series)?,
            })
        })
        .collect();

    let frame = frame_2d(config, &drawn, area);

    let _ = write!(
        out,
        r#"<defs><clipPath id="plot-area"><rect x="{}" y="{}" width="{}" height="{}"/></clipPath></defs>"#,
        fmt_num(area.left),
        fmt_num(area.top),
        fmt_num(area.width),
        fmt_num(area.height)
    );

    let xticks = nice_ticks(frame.x[0], frame.x[1], TICK_TARGET);
    let yticks = nice_ticks(frame.y[0], frame.y[1], TICK_TARGET);
    if matches!(config.axis.grid.as_str(), "major" | "both" | "minor") {
        for &x in &xticks {
            let px = fmt_num(frame.px(x));
            let _ = write!(
                out,
                r#"<line x1="{px}" y1="{}" x2="{px}" y2="{}" stroke="{GRID_STROKE}" stroke-width="1"/>"#,
                fmt_num(area.top),
                fmt_num(area.bottom()),
            );
        }
        for &y in &yticks {
            let py = fmt_num(frame.py(y));
            let _ = write!(
                out,
                r#"<line x1="{}" y1="{py}" x2="{}" y2="{py}" stroke="{GRID_STROKE}" stroke-width="1"/>"#,
                fmt_num(area.left),
                fmt_num(area.right()),
            );
        }
    }

    let _ = write!(
        out,
        r##"<rect x="{}" y="{}" width="{}" height="{}" fill="none" stroke="#000000" stroke-width="1"/>"##,
        fmt_num(area.left),
        fmt_num(area.top),
        fmt_num(area.width),
        fmt_num(area.height)
    );

    let tick_size = options.font_size * 0.8;
    for &x in &xticks {
        let px = fmt_num(frame.px(x));
        let _ = write!(
            out,
            r##"<line x1="{px}" y1="{b}" x2="{px}" y2="{t}" stroke="#000000" stroke-width="1"/><text x="{px}" y="{ty}" font-size="{fs}" font-family="sans-serif" text-anchor="middle">{label}</text>"##,
            b = fmt_num(area.bottom()),
            t = fmt_num(area.bottom() - 4.0),
            ty = fmt_num(area.bottom() + tick_size + 4.0),
            fs = fmt_num(tick_size),
            label = fmt_num(x)
        );
    }
    for &y in &yticks {
        let py = fmt_num(frame.py(y));
        let _ = write!(
            out,
            r##"<line x1="{l}" y1="{py}" x2="{r}" y2="{py}" stroke="#000000" stroke-width="1"/><text x="{tx}" y="{ty}" font-size="{fs}" font-family="sans-serif" text-anchor="end">{label}</text>"##,
            l = fmt_num(area.left),
            r = fmt_num(area.left + 4.0),
            tx = fmt_num(area.left - 4.0),
            ty = fmt_num(frame.py(y) + tick_size * 0.35),
            fs = fmt_num(tick_size),
            label = fmt_num(y)
        );
    }

    out.push_str(r#"<g clip-path="url(#plot-area)">"#);
    let bar_count = drawn
        .iter()
        .filter(|d| matches!(d.trace, Trace::Bars(_)))
        .count();
    let mut bar_index = 0;
    for d in &drawn {
        match &d.trace {
            Trace::Curve(segments) => {
                for segment in segments {
                    draw_polyline(out, &frame, segment, d);
                }
                if !matches!(d.series.style.marker.trim(), "" | "none") {
                    for &(x, y) in segments.iter().flatten() {
                        draw_marker(out, frame.px(x), frame.py(y), d, options);
                    }
                }
            }
            Trace::Scatter(points) => {
                for &(x, y) in points {
                    draw_marker(out, frame.px(x), frame.py(y), d, options);
                }
            }
            Trace::Bars(points) => {
                draw_bars(out, &frame, points, d, bar_index, bar_count);
                bar_index += 1;
            }
            Trace::Area(points) => draw_area(out, &frame, points, d),
        }
    }
    out.push_str("</g>");
}

fn frame_2d(config: &PlotConfig, drawn: &[Drawn], area: Area) -> Frame {
    let mut x = [f64::INFINITY, f64::NEG_INFINITY];
    let mut y = [f64::INFINITY, f64::NEG_INFINITY];
    let include = |range: &mut [f64; 2], v: f64| {
        range[0] = range[0].min(v);
        range[1] = range[1].max(v);
    };
    for d in drawn {
        if let SeriesKind::Function2d { domain, .. } = &d.series.kind {
            include(&mut x, domain[0]);
            include(&mut x, domain[1]);
        }
        for &(px, py) in d.trace.points() {
            include(&mut x, px);
            include(&mut y, py);
        }
        if matches!(d.trace, Trace::Bars(_) | Trace::Area(_)) {
            include(&mut y, 0.0);
        }
    }
    let has_bars = drawn.iter().any(|d| matches!(d.trace, Trace::Bars(_)));
    if has_bars && x[0] <= x[1] {
        let pad = ((x[1] - x[0]) * 0.1).max(0.5);
        x = [x[0] - pad, x[1] + pad];
    }

    let axis = &config.axis;
    let x = sane_range(
        axis_bound(&axis.xmin).unwrap_or(x[0]),
        axis_bound(&axis.xmax).unwrap_or(x[1]),
    );
    let y = sane_range(
        axis_bound(&axis.ymin).unwrap_or(y[0]),
        axis_bound(&axis.ymax).unwrap_or(y[1]),
    );
    Frame { area, x, y }
}

fn stroke_attrs(d: &Drawn) -> String {
    let mut attrs = format!(
        r#" stroke="{}" stroke-width="{}""#,
        d.color,
        fmt_num(d.stroke_width)
    );
    if let Some(dash) = dash_array(d.series.style.line_style, d.stroke_width) {
        let _ = write!(attrs, r#" stroke-dasharray="{}""#, dash);
    }
    attrs
}

fn points_attr(frame: &Frame, points: &[(f64, f64)]) -> String {
    points
        .iter()
        .map(|&(x, y)| format!("{},{}", fmt_num(frame.px(x)), fmt_num(frame.py(y))))
        .collect::<Vec<_>>()
        .join(" ")
}

fn draw_polyline(out: &mut String, frame: &Frame, points: &[(f64, f64)], d: &Drawn) {
    if points.len() < 2 {
        return;
    }
    let _ = write!(
        out,
        r#"<polyline points="{}" fill="none"{} stroke-linejoin="round"/>"#,
        points_attr(frame, points),
        stroke_attrs(d)
    );
}

fn draw_marker(out: &mut String, x: f64, y: f64, d: &Drawn, options: &PreviewOptions) {
    let marker = d.series.style.marker.as_str();
    // Hollow marks (`o`, `square`) are filled with the background.
    let filled = marker.is_empty() || marker.ends_with('*') || marker == "x" || marker == "+";
    let fill = if filled {
        d.color.clone()
    } else {
        escape_xml(&options.background)
    };
    if marker.starts_with("square") {
        let _ = write!(
            out,
            r#"<rect x="{}" y="{}" width="{s}" height="{s}" fill="{}" stroke="{}" stroke-width="1"/>"#,
            fmt_num(x - MARKER_RADIUS),
            fmt_num(y - MARKER_RADIUS),
            fill,
            d.color,
            s = fmt_num(MARKER_RADIUS * 2.0)
        );
    } else {
        let _ = write!(
            out,
            r#"<circle cx="{}" cy="{}" r="{}" fill="{}" stroke="{}" stroke-width="1"/>"#,
            fmt_num(x),
            fmt_num(y),
            fmt_num(MARKER_RADIUS),
            fill,
            d.color
        );
    }
}

fn draw_bars(
    out: &mut String,
    frame: &Frame,
    points: &[(f64, f64)],
    d: &Drawn,
    index: usize,
    count: usize,
) {
    let mut xs: Vec<f64> = points.iter().map(|p| frame.px(p.0)).collect();
    xs.sort_by(f64::total_cmp);
    let spacing = xs
        .windows(2)
        .map(|w| w[1] - w[0])
        .filter(|gap| *gap > 0.0)
        .fold(f64::INFINITY, f64::min);
    let group = if spacing.is_finite() {
        spacing * 0.7
    } else {
        frame.area.width * 0.2
    };
    let width = (group / count.max(1) as f64).min(40.0);
    let offset = (index as f64 - (count as f64 - 1.0) / 2.0) * width;
    let base = frame.py(0.0f64.clamp(frame.y[0], frame.y[1]));
    for &(x, y) in points {
        let top = frame.py(y);
        let _ = write!(
            out,
            r#"<rect x="{}" y="{}" width="{}" height="{}" fill="{}" fill-opacity="0.8"{}/>"#,
            fmt_num(frame.px(x) + offset - width / 2.0),
            fmt_num(top.min(base)),
            fmt_num(width),
            fmt_num((base - top).abs()),
            d.color,
            stroke_attrs(d)
        );
    }
}

fn draw_area(out: &mut String, frame: &Frame, points: &[(f64, f64)], d: &Drawn) {
    let (Some(first), Some(last)) = (points.first(), points.last()) else {
        return;
    };
    let base = 0.0f64.clamp(frame.y[0], frame.y[1]);
    let mut outline = points.to_vec();
    outline.push((last.0, base));
    outline.push((first.0, base));
    let _ = write!(
        out,
        r#"<polygon points="{}" fill="{}" fill-opacity="0.3"{}/>"#,
        points_attr(frame, &outline),
        d.color,
        stroke_attrs(d)
    );
}

// ============================================================================
// 3D surfaces
// ============================================================================

/// Colormap stops as RGB 0-255.
fn colormap_stops(name: &str) -> &'static [[f64; 3]] {
    match name {
        "viridis" => &[
            [68.0, 1.0, 84.0],
            [59.0, 82.0, 139.0],
            [33.0, 145.0, 140.0],
            [94.0, 201.0, 98.0],
            [253.0, 231.0, 37.0],
        ],
        "jet" => &[
            [0.0, 0.0, 128.0],
            [0.0, 0.0, 255.0],
            [0.0, 255.0, 255.0],
            [255.0, 255.0, 0.0],
            [255.0, 0.0, 0.0],
            [128.0, 0.0, 0.0],
        ],
        "cool" => &[[255.0, 255.0, 255.0], [0.0, 128.0, 255.0], [255.0, 0.0, 255.0]],
        "blackwhite" => &[[0.0, 0.0, 0.0], [255.0, 255.0, 255.0]],
        "bluered" => &[
            [0.0, 0.0, 180.0],
            [0.0, 255.0, 255.0],
            [100.0, 255.0, 0.0],
            [255.0, 255.0, 0.0],
            [255.0, 0.0, 0.0],
            [128.0, 0.0, 0.0],
        ],
        "hot2" => &[
            [0.0, 0.0, 0.0],
            [255.0, 0.0, 0.0],
            [255.0, 255.0, 0.0],
            [255.0, 255.0, 255.0],
        ],
        // PGFPlots' default `hot`.
        _ => &[
            [0.0, 0.0, 255.0],
            [255.0, 255.0, 0.0],
            [255.0, 128.0, 0.0],
            [255.0, 0.0, 0.0],
        ],
    }
}

fn colormap_at(name: &str, t: f64) -> Rgba {
    let stops = colormap_stops(name);
    let t = if t.is_finite() { t.clamp(0.0, 1.0) } else { 0.0 };
    let scaled = t * (stops.len() - 1) as f64;
    let i = (scaled.floor() as usize).min(stops.len() - 2);
    let f = scaled - i as f64;
    let [r0, g0, b0] = stops[i];
    let [r1, g1, b1] = stops[i + 1];
    Rgba::opaque(r0 + (r1 - r0) * f, g0 + (g1 - g0) * f, b0 + (b1 - b0) * f)
}

struct Grid<'a> {
    series: &'a PlotSeries,
    style: SurfaceStyle,
    colormap: &'a str,
    xs: Vec<f64>,
    ys: Vec<f64>,
    /// `z[j][i]` at `(xs[i], ys[j])`.
    z: Vec<Vec<f64>>,
}

fn sample_surface<'a>(series: &'a PlotSeries, options: &PreviewOptions) -> Option<Grid<'a>> {
    let SeriesKind::Function3d {
        expression,
        domain_x,
        domain_y,
        samples,
        plot_style,
        colormap,
    } = &series.kind
    else {
        return None;
    };
    let expr = compile_logged(expression, series)?;
    let n = (*samples).min(options.max_surface_samples).max(2);
    let axis = |d: [f64; 2]| -> Vec<f64> {
        (0..n)
            .map(|i| d[0] + (d[1] - d[0]) * f64::from(i) / f64::from(n - 1))
            .collect()
    };
    let xs = axis(*domain_x);
    let ys = axis(*domain_y);
    let z = ys
        .iter()
        .map(|&y| xs.iter().map(|&x| expr.eval(x, y)).collect())
        .collect();
    Some(Grid {
        series,
        style: *plot_style,
        colormap,
        xs,
        ys,
        z,
    })
}

struct Projection {
    cos_az: f64,
    sin_az: f64,
    cos_el: f64,
    sin_el: f64,
    x: [f64; 2],
    y: [f64; 2],
    z: [f64; 2],
    scale: f64,
    center: (f64, f64),
}

impl Projection {
    fn new(options: &PreviewOptions, x: [f64; 2], y: [f64; 2], z: [f64; 2], area: Area) -> Self {
        let (az, el) = (
            options.view_azimuth.to_radians(),
            options.view_elevation.to_radians(),
        );
        let mut p = Projection {
            cos_az: az.cos(),
            sin_az: az.sin(),
            cos_el: el.cos(),
            sin_el: el.sin(),
            x,
            y,
            z,
            scale: 1.0,
            center: (0.0, 0.0),
        };
        // Fit the projected unit cube into the plot area.
        let mut min = (f64::INFINITY, f64::INFINITY);
        let mut max = (f64::NEG_INFINITY, f64::NEG_INFINITY);
        for &u in &[-0.5, 0.5] {
            for &v in &[-0.5, 0.5] {
                for &w in &[-0.5, 0.5] {
                    let (sx, sy) = p.unit(u, v, w);
                    min = (min.0.min(sx), min.1.min(sy));
                    max = (max.0.max(sx), max.1.max(sy));
                }
            }
        }
        p.scale = (area.width / (max.0 - min.0)).min(area.height / (max.1 - min.1));
        let mid = ((min.0 + max.0) / 2.0, (min.1 + max.1) / 2.0);
        p.center = (
            area.left + area.width / 2.0 - mid.0 * p.scale,
            area.top + area.height / 2.0 + mid.1 * p.scale,
        );
        p
    }

    fn normalize(&self, x: f64, y: f64, z: f64) -> (f64, f64, f64) {
        let n = |v: f64, r: [f64; 2]| (v - r[0]) / (r[1] - r[0]) - 0.5;
        (n(x, self.x), n(y, self.y), n(z, self.z))
    }

    /// Screen offset (y up) of a normalized point.
    fn unit(&self, u: f64, v: f64, w: f64) -> (f64, f64) {
        let sx = u * self.cos_az + v * self.sin_az;
        let sy = -u * self.sin_az * self.sin_el + v * self.cos_az * self.sin_el + w * self.cos_el;
        (sx, sy)
    }

    fn project(&self, x: f64, y: f64, z: f64) -> (f64, f64) {
        let (u, v, w) = self.normalize(x, y, z);
        let (sx, sy) = self.unit(u, v, w);
        (self.center.0 + sx * self.scale, self.center.1 - sy * self.scale)
    }

    /// Larger is closer to the viewer.
    fn depth(&self, x: f64, y: f64, z: f64) -> f64 {
        let (u, v, w) = self.normalize(x, y, z);
        u * self.sin_az * self.cos_el - v * self.cos_az * self.cos_el + w * self.sin_el
    }
}

struct Quad {
    depth: f64,
    corners: [(f64, f64); 4],
    fill: Option<String>,
    stroke: String,
}

fn render_3d(config: &PlotConfig, area: Area, options: &PreviewOptions, out: &mut String) {
    let grids: Vec<Grid> = config
        .plots
        .iter()
        .filter_map(|series| sample_surface(series, options))
        .collect();
    if config.plots.len() > grids.len() {
        tracing::debug!("2D series are not drawn in a 3D preview");
    }

    let mut x = [f64::INFINITY, f64::NEG_INFINITY];
    let mut y = [f64::INFINITY, f64::NEG_INFINITY];
    let mut z = [f64::INFINITY, f64::NEG_INFINITY];
    for grid in &grids {
        for &v in &grid.xs {
            x = [x[0].min(v), x[1].max(v)];
        }
        for &v in &grid.ys {
            y = [y[0].min(v), y[1].max(v)];
        }
        for &v in grid.z.iter().flatten().filter(|v| v.is_finite()) {
            z = [z[0].min(v), z[1].max(v)];
        }
    }
    let axis = &config.axis;
    let x = sane_range(
        axis_bound(&axis.xmin).unwrap_or(x[0]),
        axis_bound(&axis.xmax).unwrap_or(x[1]),
    );
    let y = sane_range(
        axis_bound(&axis.ymin).unwrap_or(y[0]),
        axis_bound(&axis.ymax).unwrap_or(y[1]),
    );
    let z = sane_range(z[0], z[1]);
    let proj = Projection::new(options, x, y, z, area);

    draw_3d_axes(config, &proj, options, out);

    let mut quads = Vec::new();
    for grid in &grids {
        for j in 0..grid.ys.len().saturating_sub(1) {
            for i in 0..grid.xs.len().saturating_sub(1) {
                let pts = [(i, j), (i + 1, j), (i + 1, j + 1), (i, j + 1)]
                    .map(|(a, b)| (grid.xs[a], grid.ys[b], grid.z[b][a]));
                if pts.iter().any(|p| !p.2.is_finite()) {
                    continue;
                }
                let mean = pts.iter().map(|p| p.2).sum::<f64>() / 4.0;
                let center = (
                    (grid.xs[i] + grid.xs[i + 1]) / 2.0,
                    (grid.ys[j] + grid.ys[j + 1]) / 2.0,
                );
                let shade = colormap_at(grid.colormap, (mean - z[0]) / (z[1] - z[0])).to_hex();
                let (fill, stroke) = match grid.style {
                    SurfaceStyle::Surf => (Some(shade), "#333333".to_string()),
                    SurfaceStyle::Mesh => (None, shade),
                };
                quads.push(Quad {
                    depth: proj.depth(center.0, center.1, mean),
                    corners: pts.map(|p| proj.project(p.0, p.1, p.2)),
                    fill,
                    stroke,
                });
            }
        }
        tracing::trace!(series = %grid.series.id, "sampled surface");
    }

    // Painter's order: farthest first.
    quads.sort_by(|a, b| a.depth.total_cmp(&b.depth));
    for quad in &quads {
        let points = quad
            .corners
            .iter()
            .map(|&(px, py)| format!("{},{}", fmt_num(px), fmt_num(py)))
            .collect::<Vec<_>>()
            .join(" ");
        let fill = quad.fill.as_deref().unwrap_or("none");
        let width = if quad.fill.is_some() { "0.3" } else { "1" };
        let _ = write!(
            out,
            r#"<polygon points="{}" fill="{}" stroke="{}" stroke-width="{}"/>"#,
            points, fill, quad.stroke, width
        );
    }
}

fn draw_3d_axes(config: &PlotConfig, proj: &Projection, options: &PreviewOptions, out: &mut String) {
    let origin = (proj.x[0], proj.y[0], proj.z[0]);
    let ends = [
        ((proj.x[1], proj.y[0], proj.z[0]), &config.axis.xlabel, proj.x),
        ((proj.x[0], proj.y[1], proj.z[0]), &config.axis.ylabel, proj.y),
        ((proj.x[0], proj.y[0], proj.z[1]), &config.axis.zlabel, proj.z),
    ];
    let (ox, oy) = proj.project(origin.0, origin.1, origin.2);
    let tick_size = options.font_size * 0.8;
    for (end, label, range) in ends {
        let (ex, ey) = proj.project(end.0, end.1, end.2);
        let _ = write!(
            out,
            r##"<line x1="{}" y1="{}" x2="{}" y2="{}" stroke="#000000" stroke-width="1"/>"##,
            fmt_num(ox),
            fmt_num(oy),
            fmt_num(ex),
            fmt_num(ey)
        );
        let _ = write!(
            out,
            r#"<text x="{}" y="{}" font-size="{}" font-family="sans-serif" text-anchor="middle">{}</text>"#,
            fmt_num(ex),
            fmt_num(ey + tick_size),
            fmt_num(tick_size),
            fmt_num(range[1])
        );
        if !label.is_empty() {
            let _ = write!(
                out,
                r#"<text x="{}" y="{}" font-size="{}" font-family="sans-serif" text-anchor="start">{}</text>"#,
                fmt_num(ex + 6.0),
                fmt_num(ey - 4.0),
                fmt_num(options.font_size),
                escape_xml(&plain_label(label))
            );
        }
    }
}

// ============================================================================
// Titles and legend
// ============================================================================

fn draw_titles(
    config: &PlotConfig,
    viewport: Viewport,
    area: Area,
    options: &PreviewOptions,
    is_3d: bool,
    out: &mut String,
) {
    let fs = options.font_size;
    let axis = &config.axis;
    if !axis.title.is_empty() {
        let _ = write!(
            out,
            r#"<text x="{}" y="{}" font-size="{}" font-family="sans-serif" font-weight="bold" text-anchor="middle">{}</text>"#,
            fmt_num(area.left + area.width / 2.0),
            fmt_num(fs * 1.5),
            fmt_num(fs * 1.1),
            escape_xml(&plain_label(&axis.title))
        );
    }
    // 3D axis labels sit at the axis ends instead.
    if is_3d {
        return;
    }
    if !axis.xlabel.is_empty() {
        let _ = write!(
            out,
            r#"<text x="{}" y="{}" font-size="{}" font-family="sans-serif" text-anchor="middle">{}</text>"#,
            fmt_num(area.left + area.width / 2.0),
            fmt_num(viewport.height - fs * 0.6),
            fmt_num(fs),
            escape_xml(&plain_label(&axis.xlabel))
        );
    }
    if !axis.ylabel.is_empty() {
        let x = fs * 1.2;
        let y = area.top + area.height / 2.0;
        let _ = write!(
            out,
            r#"<text x="{x}" y="{y}" font-size="{}" font-family="sans-serif" text-anchor="middle" transform="rotate(-90 {x} {y})">{}</text>"#,
            fmt_num(fs),
            escape_xml(&plain_label(&axis.ylabel)),
            x = fmt_num(x),
            y = fmt_num(y)
        );
    }
}

fn draw_legend(config: &PlotConfig, area: Area, options: &PreviewOptions, out: &mut String) {
    let entries: Vec<(usize, &PlotSeries)> = config
        .plots
        .iter()
        .enumerate()
        .filter(|(_, s)| !s.style.legend.is_empty())
        .collect();
    if entries.is_empty() {
        return;
    }

    let fs = options.font_size;
    let row = fs * 1.4;
    let labels: Vec<String> = entries
        .iter()
        .map(|(_, s)| plain_label(&s.style.legend))
        .collect();
    let longest = labels.iter().map(|l| l.chars().count()).max().unwrap_or(0);
    let width = longest as f64 * fs * 0.6 + 36.0;
    let height = entries.len() as f64 * row + 8.0;
    let inset = 6.0;
    let pos = config.axis.legend_pos.as_str();
    let x = if pos.ends_with("west") {
        area.left + inset
    } else {
        area.right() - width - inset
    };
    let y = if pos.starts_with("south") {
        area.bottom() - height - inset
    } else {
        area.top + inset
    };

    let _ = write!(
        out,
        r##"<g class="legend"><rect x="{}" y="{}" width="{}" height="{}" fill="{}" stroke="#000000" stroke-width="0.5"/>"##,
        fmt_num(x),
        fmt_num(y),
        fmt_num(width),
        fmt_num(height),
        escape_xml(&options.background)
    );
    for (row_index, ((index, series), label)) in entries.iter().zip(&labels).enumerate() {
        let cy = y + 4.0 + row * (row_index as f64 + 0.5);
        let color = series_color(series, *index, options);
        let sample = match &series.kind {
            SeriesKind::Data {
                chart_type: ChartType::Scatter,
                ..
            } => format!(
                r#"<circle cx="{}" cy="{}" r="{}" fill="{}"/>"#,
                fmt_num(x + 16.0),
                fmt_num(cy),
                fmt_num(MARKER_RADIUS),
                color
            ),
            _ => {
                let width = stroke_width(series);
                let dash = match series.style.line_style {
                    LineStyle::Solid => String::new(),
                    style => dash_array(style, width)
                        .map(|d| format!(r#" stroke-dasharray="{}""#, d))
                        .unwrap_or_default(),
                };
                format!(
                    r#"<line x1="{}" y1="{cy}" x2="{}" y2="{cy}" stroke="{}" stroke-width="{}"{}/>"#,
                    fmt_num(x + 6.0),
                    fmt_num(x + 26.0),
                    color,
                    fmt_num(width),
                    dash,
                    cy = fmt_num(cy)
                )
            }
        };
        out.push_str(&sample);
        let _ = write!(
            out,
            r#"<text x="{}" y="{}" font-size="{}" font-family="sans-serif">{}</text>"#,
            fmt_num(x + 32.0),
            fmt_num(cy + fs * 0.35),
            fmt_num(fs),
            escape_xml(label)
        );
    }
    out.push_str("</g>");
}
