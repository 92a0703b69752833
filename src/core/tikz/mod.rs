//! TikZ shape generator
//!
//! Turns a list of [`Shape`]s into `tikzpicture` code and renders the same
//! list as an SVG preview. Generation is one-way: there is no TikZ parser.
//!
//! Both directions share [`geometry`], which resolves each shape kind to a
//! circle, rectangle or vertex list in model coordinates (centimetres,
//! Y up).

pub mod geometry;
mod generate;
mod render;

use texform_model::{Shape, ShapeId};

use crate::core::preview::{PreviewOptions, Viewport};

/// Generate a `tikzpicture` with one command per shape, in list order.
pub fn generate_code(shapes: &[Shape]) -> String {
    generate::generate_code(shapes)
}

/// Render an SVG preview into `out`, replacing its previous contents.
///
/// With `selected` set, only that shape keeps its paint; the others are
/// drawn as muted outlines.
pub fn render(
    shapes: &[Shape],
    viewport: Viewport,
    selected: Option<ShapeId>,
    options: &PreviewOptions,
    out: &mut String,
) {
    render::render_shapes(shapes, viewport, selected, options, out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use texform_model::{Point, ShapeKind, ShapeSet};

    #[test]
    fn test_code_and_preview_agree_on_order() {
        let mut set = ShapeSet::new();
        let a = set.add(ShapeKind::Circle { radius: 1.0 }, Point::new(0.0, 0.0));
        let b = set.add(ShapeKind::Square { side: 1.0 }, Point::new(2.0, 0.0));

        let code = generate_code(set.shapes());
        let circle = code.find("circle").unwrap();
        let rect = code.find("rectangle").unwrap();
        assert!(circle < rect);

        let mut svg = String::new();
        render(
            set.shapes(),
            Viewport::default(),
            None,
            &PreviewOptions::default(),
            &mut svg,
        );
        let first = svg.find(&format!(r#"id="{}""#, a)).unwrap();
        let second = svg.find(&format!(r#"id="{}""#, b)).unwrap();
        assert!(first < second);
    }

    #[test]
    fn test_removed_shape_leaves_output() {
        let mut set = ShapeSet::new();
        let a = set.add(ShapeKind::Circle { radius: 1.0 }, Point::new(0.0, 0.0));
        set.add(ShapeKind::Square { side: 1.0 }, Point::new(2.0, 0.0));
        set.remove(a);
        let code = generate_code(set.shapes());
        assert!(!code.contains("circle"));
        assert!(code.contains("rectangle"));
    }
}
