//! Shapes → SVG preview.

use std::fmt::Write;

use texform_model::{Point, Shape, ShapeId};

use super::geometry::{center, extent, outline, Outline};
use crate::core::color::{self, SingleBlend};
use crate::core::preview::{
    close_svg, dash_array, escape_xml, fmt_num, open_svg, plain_label, PreviewOptions, Viewport,
};

/// TikZ units are centimetres; line widths are in points.
const PT_PER_CM: f64 = 28.452_756;
const DEFAULT_LINE_WIDTH_PT: f64 = 0.4;
const DEFAULT_STROKE: &str = "#000000";

const SHADOW_FILTER: &str = r##"<defs><filter id="shadow" x="-20%" y="-20%" width="140%" height="140%"><feDropShadow dx="2" dy="2" stdDeviation="1.5" flood-color="#000000" flood-opacity="0.35"/></filter></defs>"##;

/// Model (Y up, cm) → viewport (Y down, px).
struct Mapping {
    scale: f64,
    origin: (f64, f64),
    min_x: f64,
    max_y: f64,
}

impl Mapping {
    fn fit(shapes: &[Shape], viewport: Viewport, padding: f64) -> Self {
        let mut min = Point::new(f64::INFINITY, f64::INFINITY);
        let mut max = Point::new(f64::NEG_INFINITY, f64::NEG_INFINITY);
        for (lo, hi) in shapes.iter().filter_map(extent) {
            min = Point::new(min.x.min(lo.x), min.y.min(lo.y));
            max = Point::new(max.x.max(hi.x), max.y.max(hi.y));
        }
        if !(min.x.is_finite() && max.x.is_finite()) {
            min = Point::new(0.0, 0.0);
            max = Point::new(1.0, 1.0);
        }
        let (min_x, min_y) = (min.x - padding, min.y - padding);
        let (max_x, max_y) = (max.x + padding, max.y + padding);
        let width = (max_x - min_x).max(1e-9);
        let height = (max_y - min_y).max(1e-9);
        let scale = (viewport.width / width).min(viewport.height / height);
        Mapping {
            scale,
            origin: (
                (viewport.width - width * scale) / 2.0,
                (viewport.height - height * scale) / 2.0,
            ),
            min_x,
            max_y,
        }
    }

    fn map(&self, p: Point) -> (f64, f64) {
        (
            self.origin.0 + (p.x - self.min_x) * self.scale,
            self.origin.1 + (self.max_y - p.y) * self.scale,
        )
    }

    fn length(&self, cm: f64) -> f64 {
        cm * self.scale
    }
}

/// Paint attributes after focus mode is applied.
struct Paint {
    fill: String,
    fill_opacity: Option<f64>,
    stroke: String,
    stroke_opacity: Option<f64>,
    width: f64,
    dash: Option<String>,
    opacity: Option<f64>,
    shadow: bool,
    label: Option<String>,
}

/// Hex color plus the opacity a trailing `color!pct` asks for.
fn svg_color(token: &str) -> (String, Option<f64>) {
    let c = color::resolve_with(token, SingleBlend::Alpha).unwrap_or(color::FALLBACK);
    (c.to_hex(), (c.a < 1.0).then(|| c.a.max(0.0)))
}

fn paint(shape: &Shape, muted: bool, mapping: &Mapping, options: &PreviewOptions) -> Paint {
    let width_pt = if muted {
        DEFAULT_LINE_WIDTH_PT
    } else {
        shape.line_width.unwrap_or(DEFAULT_LINE_WIDTH_PT)
    };
    let width = (mapping.length(width_pt / PT_PER_CM)).max(0.5);
    if muted {
        return Paint {
            fill: "none".to_string(),
            fill_opacity: None,
            stroke: escape_xml(&options.muted_stroke),
            stroke_opacity: None,
            width,
            dash: None,
            opacity: None,
            shadow: false,
            label: None,
        };
    }
    let (fill, fill_opacity) = shape
        .fill
        .as_deref()
        .filter(|c| !c.trim().is_empty())
        .map(svg_color)
        .unwrap_or_else(|| ("none".to_string(), None));
    let (stroke, stroke_opacity) = shape
        .stroke
        .as_deref()
        .filter(|c| !c.trim().is_empty())
        .map(svg_color)
        .unwrap_or_else(|| (DEFAULT_STROKE.to_string(), None));
    Paint {
        fill,
        fill_opacity,
        stroke,
        stroke_opacity,
        width,
        dash: shape.line_style.and_then(|style| dash_array(style, width)),
        opacity: shape.opacity.filter(|o| *o < 1.0).map(|o| o.max(0.0)),
        shadow: shape.shadow,
        label: shape
            .label
            .as_deref()
            .filter(|l| !l.is_empty())
            .map(plain_label),
    }
}

fn render_shape(
    out: &mut String,
    shape: &Shape,
    muted: bool,
    mapping: &Mapping,
    options: &PreviewOptions,
) {
    let p = paint(shape, muted, mapping, options);
    let pivot = mapping.map(center(shape));

    let mut attrs = format!(
        r#" fill="{}" stroke="{}" stroke-width="{}""#,
        p.fill,
        p.stroke,
        fmt_num(p.width)
    );
    if let Some(opacity) = p.fill_opacity {
        let _ = write!(attrs, r#" fill-opacity="{}""#, fmt_num(opacity));
    }
    if let Some(opacity) = p.stroke_opacity {
        let _ = write!(attrs, r#" stroke-opacity="{}""#, fmt_num(opacity));
    }
    if let Some(dash) = &p.dash {
        let _ = write!(attrs, r#" stroke-dasharray="{}""#, dash);
    }
    if let Some(opacity) = p.opacity {
        let _ = write!(attrs, r#" opacity="{}""#, fmt_num(opacity));
    }
    if p.shadow {
        attrs.push_str(r#" filter="url(#shadow)""#);
    }
    // Model rotation is counter-clockwise; SVG's Y axis points down.
    if let Some(degrees) = shape.rotation.filter(|r| *r != 0.0) {
        let _ = write!(
            attrs,
            r#" transform="rotate({} {} {})""#,
            fmt_num(-degrees),
            fmt_num(pivot.0),
            fmt_num(pivot.1)
        );
    }

    let _ = write!(out, r#"<g id="{}">"#, shape.id);
    match outline(shape) {
        Outline::Circle { center, radius } => {
            let (cx, cy) = mapping.map(center);
            let _ = write!(
                out,
                r#"<circle cx="{}" cy="{}" r="{}"{}/>"#,
                fmt_num(cx),
                fmt_num(cy),
                fmt_num(mapping.length(radius.abs())),
                attrs
            );
        }
        Outline::Rect {
            corner,
            width,
            height,
        } => {
            // Top-left in SVG space is the model's upper-left corner.
            let (x, y) = mapping.map(Point::new(
                corner.x.min(corner.x + width),
                corner.y.max(corner.y + height),
            ));
            let _ = write!(
                out,
                r#"<rect x="{}" y="{}" width="{}" height="{}"{}/>"#,
                fmt_num(x),
                fmt_num(y),
                fmt_num(mapping.length(width.abs())),
                fmt_num(mapping.length(height.abs())),
                attrs
            );
        }
        Outline::Polygon(points) => {
            let points = points
                .iter()
                .map(|&pt| {
                    let (x, y) = mapping.map(pt);
                    format!("{},{}", fmt_num(x), fmt_num(y))
                })
                .collect::<Vec<_>>()
                .join(" ");
            let _ = write!(out, r#"<polygon points="{}"{}/>"#, points, attrs);
        }
    }
    if let Some(label) = &p.label {
        let _ = write!(
            out,
            r#"<text x="{}" y="{}" font-size="{}" font-family="sans-serif" text-anchor="middle" dominant-baseline="central">{}</text>"#,
            fmt_num(pivot.0),
            fmt_num(pivot.1),
            fmt_num(options.font_size),
            escape_xml(label)
        );
    }
    out.push_str("</g>");
}

/// Render shapes as SVG into `out`, replacing its contents. With
/// `selected`, every other shape is drawn as a muted outline.
pub fn render_shapes(
    shapes: &[Shape],
    viewport: Viewport,
    selected: Option<ShapeId>,
    options: &PreviewOptions,
    out: &mut String,
) {
    out.clear();
    open_svg(out, viewport, Some(options.background.as_str()));
    if shapes.is_empty() {
        close_svg(out);
        return;
    }

    let mapping = Mapping::fit(shapes, viewport, options.shape_padding);
    let is_muted = |shape: &Shape| selected.is_some_and(|id| id != shape.id);

    if shapes.iter().any(|s| s.shadow && !is_muted(s)) {
        out.push_str(SHADOW_FILTER);
    }
    for shape in shapes {
        if let Outline::Polygon(points) = outline(shape) {
            if points.is_empty() {
                continue;
            }
        }
        render_shape(out, shape, is_muted(shape), &mapping, options);
    }
    close_svg(out);
}
