//! Shapes → TikZ code.

use std::fmt::Write;

use texform_model::{LineStyle, Shape, ShapeKind};

use super::geometry::{center, outline, Outline};
use crate::core::preview::fmt_num;
use crate::core::scan::option_value;

/// TikZ's default line width in points; not emitted.
const DEFAULT_LINE_WIDTH: f64 = 0.4;

fn coord(x: f64, y: f64) -> String {
    format!("({},{})", fmt_num(x), fmt_num(y))
}

/// Non-default presentation options, in a fixed order.
fn style_options(shape: &Shape, rotation_key: RotationKey) -> Vec<String> {
    let mut opts = Vec::new();
    if let Some(fill) = shape.fill.as_deref().filter(|c| !c.trim().is_empty()) {
        opts.push(format!("fill={}", option_value(fill)));
    }
    if let Some(stroke) = shape.stroke.as_deref().filter(|c| !c.trim().is_empty()) {
        opts.push(format!("draw={}", option_value(stroke)));
    }
    if let Some(width) = shape.line_width {
        if (width - DEFAULT_LINE_WIDTH).abs() > 1e-9 {
            opts.push(format!("line width={}pt", fmt_num(width)));
        }
    }
    if let Some(style) = shape.line_style.filter(|s| *s != LineStyle::Solid) {
        opts.push(style.keyword().to_string());
    }
    if let Some(opacity) = shape.opacity.filter(|o| *o < 1.0) {
        opts.push(format!("opacity={}", fmt_num(opacity.max(0.0))));
    }
    if let Some(degrees) = shape.rotation.filter(|r| *r != 0.0) {
        match rotation_key {
            RotationKey::Around => {
                let c = center(shape);
                opts.push(format!(
                    "rotate around={{{}:{}}}",
                    fmt_num(degrees),
                    coord(c.x, c.y)
                ));
            }
            // A node is placed at its centre; rotating the node is enough.
            RotationKey::Node => opts.push(format!("rotate={}", fmt_num(degrees))),
        }
    }
    if shape.shadow {
        opts.push("drop shadow".to_string());
    }
    opts
}

#[derive(Clone, Copy)]
enum RotationKey {
    Around,
    Node,
}

fn draw_command(output: &mut String, opts: &[String], path: &str) {
    output.push_str("\\draw");
    if !opts.is_empty() {
        let _ = write!(output, "[{}]", opts.join(", "));
    }
    let _ = writeln!(output, " {};", path);
}

fn polygon_path(points: &[texform_model::Point]) -> String {
    let mut path = points
        .iter()
        .map(|p| coord(p.x, p.y))
        .collect::<Vec<_>>()
        .join(" -- ");
    path.push_str(" -- cycle");
    path
}

fn emit_shape(shape: &Shape, output: &mut String) {
    if let ShapeKind::RegularPolygon { sides, radius } = &shape.kind {
        let mut opts = vec![
            "draw".to_string(),
            "regular polygon".to_string(),
            format!("regular polygon sides={}", (*sides).max(3)),
            format!("minimum size={}cm", fmt_num(radius * 2.0)),
        ];
        opts.extend(style_options(shape, RotationKey::Node));
        let _ = writeln!(
            output,
            "\\node[{}] at {} {{{}}};",
            opts.join(", "),
            coord(shape.position.x, shape.position.y),
            shape.label.as_deref().unwrap_or("")
        );
        return;
    }

    let opts = style_options(shape, RotationKey::Around);
    let path = match outline(shape) {
        Outline::Circle { center, radius } => format!(
            "{} circle ({})",
            coord(center.x, center.y),
            fmt_num(radius)
        ),
        Outline::Rect {
            corner,
            width,
            height,
        } => format!(
            "{} rectangle {}",
            coord(corner.x, corner.y),
            coord(corner.x + width, corner.y + height)
        ),
        Outline::Polygon(points) if points.is_empty() => {
            tracing::debug!(shape = %shape.id, "polygon without vertices skipped");
            return;
        }
        Outline::Polygon(points) => polygon_path(&points),
    };
    draw_command(output, &opts, &path);

    if let Some(label) = shape.label.as_deref().filter(|l| !l.is_empty()) {
        let c = center(shape);
        let _ = writeln!(output, "\\node at {} {{{}}};", coord(c.x, c.y), label);
    }
}

/// A `tikzpicture` with one command per shape, in list order.
pub fn generate_code(shapes: &[Shape]) -> String {
    let mut output = String::from("\\begin{tikzpicture}\n");
    for shape in shapes {
        emit_shape(shape, &mut output);
    }
    output.push_str("\\end{tikzpicture}");
    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use texform_model::{Point, ShapeId};

    fn shape(kind: ShapeKind, x: f64, y: f64) -> Shape {
        Shape::new(ShapeId(0), kind, Point::new(x, y))
    }

    #[test]
    fn test_empty_skeleton() {
        assert_eq!(generate_code(&[]), "\\begin{tikzpicture}\n\\end{tikzpicture}");
    }

    #[test]
    fn test_geometry_per_kind() {
        let shapes = vec![
            shape(ShapeKind::Circle { radius: 1.5 }, 0.0, 0.0),
            shape(
                ShapeKind::Rectangle {
                    width: 2.0,
                    height: 1.0,
                },
                1.0,
                1.0,
            ),
            shape(ShapeKind::Square { side: 1.0 }, -1.0, 0.5),
            shape(
                ShapeKind::Triangle {
                    base: 2.0,
                    height: 3.0,
                },
                0.0,
                0.0,
            ),
            shape(
                ShapeKind::CustomPolygon {
                    vertices: vec![Point::new(0.0, 0.0), Point::new(1.0, 0.0), Point::new(0.0, 1.0)],
                },
                2.0,
                2.0,
            ),
        ];
        let code = generate_code(&shapes);
        assert_eq!(
            code,
            "\\begin{tikzpicture}\n\
             \\draw (0,0) circle (1.5);\n\
             \\draw (1,1) rectangle (3,2);\n\
             \\draw (-1,0.5) rectangle (0,1.5);\n\
             \\draw (0,0) -- (2,0) -- (1,3) -- cycle;\n\
             \\draw (2,2) -- (3,2) -- (2,3) -- cycle;\n\
             \\end{tikzpicture}"
        );
    }

    #[test]
    fn test_options_only_when_non_default() {
        let mut s = shape(ShapeKind::Square { side: 2.0 }, 0.0, 0.0);
        s.fill = Some("blue!20".into());
        s.stroke = Some("blue".into());
        s.line_width = Some(0.4);
        s.line_style = Some(LineStyle::Dashed);
        s.opacity = Some(1.0);
        s.rotation = Some(30.0);
        s.shadow = true;
        s.label = Some("A".into());
        let code = generate_code(&[s]);
        assert!(code.contains(
            "\\draw[fill=blue!20, draw=blue, dashed, rotate around={30:(1,1)}, drop shadow] (0,0) rectangle (2,2);\n\\node at (1,1) {A};\n"
        ));
    }

    #[test]
    fn test_color_specs_are_braced() {
        let mut s = shape(ShapeKind::Circle { radius: 1.0 }, 0.0, 0.0);
        s.fill = Some("rgb,255:red,10;green,20;blue,30".into());
        s.stroke = Some(" red!50 ".into());
        assert_eq!(
            generate_code(&[s]),
            "\\begin{tikzpicture}\n\\draw[fill={rgb,255:red,10;green,20;blue,30}, draw=red!50] (0,0) circle (1);\n\\end{tikzpicture}"
        );
    }

    #[test]
    fn test_regular_polygon_node() {
        let mut s = shape(ShapeKind::RegularPolygon { sides: 6, radius: 1.0 }, 2.0, 3.0);
        s.label = Some("hex".into());
        s.opacity = Some(0.5);
        s.line_width = Some(1.2);
        assert_eq!(
            generate_code(&[s]),
            "\\begin{tikzpicture}\n\\node[draw, regular polygon, regular polygon sides=6, minimum size=2cm, line width=1.2pt, opacity=0.5] at (2,3) {hex};\n\\end{tikzpicture}"
        );
    }

    #[test]
    fn test_empty_custom_polygon_skipped() {
        let s = shape(ShapeKind::CustomPolygon { vertices: vec![] }, 0.0, 0.0);
        assert_eq!(generate_code(&[s]), "\\begin{tikzpicture}\n\\end{tikzpicture}");
    }
}
