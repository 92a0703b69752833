//! Geometric construction shared by the code generator and the renderer.

use texform_model::{Point, Shape, ShapeKind};

/// Resolved outline of a shape in model coordinates (Y up, unrotated).
#[derive(Debug, Clone, PartialEq)]
pub enum Outline {
    Circle { center: Point, radius: f64 },
    Rect { corner: Point, width: f64, height: f64 },
    Polygon(Vec<Point>),
}

/// Vertices of a regular polygon as TikZ places them: odd side counts
/// have a vertex at the top, even ones a flat top and bottom.
pub fn regular_polygon_vertices(center: Point, sides: u32, radius: f64) -> Vec<Point> {
    let n = sides.max(3);
    let step = 360.0 / f64::from(n);
    let start = if n % 2 == 1 { 90.0 } else { 90.0 - step / 2.0 };
    (0..n)
        .map(|k| {
            let angle = (start + step * f64::from(k)).to_radians();
            Point::new(center.x + radius * angle.cos(), center.y + radius * angle.sin())
        })
        .collect()
}

pub fn outline(shape: &Shape) -> Outline {
    let p = shape.position;
    match &shape.kind {
        ShapeKind::Circle { radius } => Outline::Circle {
            center: p,
            radius: *radius,
        },
        ShapeKind::Rectangle { width, height } => Outline::Rect {
            corner: p,
            width: *width,
            height: *height,
        },
        ShapeKind::Square { side } => Outline::Rect {
            corner: p,
            width: *side,
            height: *side,
        },
        ShapeKind::Triangle { base, height } => Outline::Polygon(vec![
            p,
            Point::new(p.x + base, p.y),
            Point::new(p.x + base / 2.0, p.y + height),
        ]),
        ShapeKind::RegularPolygon { sides, radius } => {
            Outline::Polygon(regular_polygon_vertices(p, *sides, *radius))
        }
        ShapeKind::CustomPolygon { vertices } => Outline::Polygon(
            vertices
                .iter()
                .map(|v| Point::new(p.x + v.x, p.y + v.y))
                .collect(),
        ),
    }
}

/// Visual centre: rotation pivot and label anchor.
pub fn center(shape: &Shape) -> Point {
    match outline(shape) {
        Outline::Circle { center, .. } => center,
        Outline::Rect {
            corner,
            width,
            height,
        } => Point::new(corner.x + width / 2.0, corner.y + height / 2.0),
        Outline::Polygon(points) => match &shape.kind {
            ShapeKind::RegularPolygon { .. } => shape.position,
            _ if points.is_empty() => shape.position,
            _ => {
                let n = points.len() as f64;
                Point::new(
                    points.iter().map(|p| p.x).sum::<f64>() / n,
                    points.iter().map(|p| p.y).sum::<f64>() / n,
                )
            }
        },
    }
}

fn rotate_about(p: Point, pivot: Point, degrees: f64) -> Point {
    let (sin, cos) = degrees.to_radians().sin_cos();
    let (dx, dy) = (p.x - pivot.x, p.y - pivot.y);
    Point::new(
        pivot.x + dx * cos - dy * sin,
        pivot.y + dx * sin + dy * cos,
    )
}

/// Axis-aligned extent `(min, max)` including rotation, or `None` for a
/// polygon without vertices.
pub fn extent(shape: &Shape) -> Option<(Point, Point)> {
    let rotation = shape.rotation.unwrap_or(0.0);
    let pivot = center(shape);
    let corners: Vec<Point> = match outline(shape) {
        Outline::Circle { center, radius } => {
            let r = radius.abs();
            return Some((
                Point::new(center.x - r, center.y - r),
                Point::new(center.x + r, center.y + r),
            ));
        }
        Outline::Rect {
            corner,
            width,
            height,
        } => vec![
            corner,
            Point::new(corner.x + width, corner.y),
            Point::new(corner.x + width, corner.y + height),
            Point::new(corner.x, corner.y + height),
        ],
        Outline::Polygon(points) => points,
    };
    let mut iter = corners
        .into_iter()
        .map(|p| rotate_about(p, pivot, rotation));
    let first = iter.next()?;
    Some(iter.fold((first, first), |(min, max), p| {
        (
            Point::new(min.x.min(p.x), min.y.min(p.y)),
            Point::new(max.x.max(p.x), max.y.max(p.y)),
        )
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use texform_model::ShapeId;

    fn close(a: Point, b: Point) -> bool {
        (a.x - b.x).abs() < 1e-9 && (a.y - b.y).abs() < 1e-9
    }

    #[test]
    fn test_regular_polygon_orientation() {
        let tri = regular_polygon_vertices(Point::new(0.0, 0.0), 3, 1.0);
        assert!(close(tri[0], Point::new(0.0, 1.0)));
        let square = regular_polygon_vertices(Point::new(0.0, 0.0), 4, 1.0);
        // Flat top: the first two vertices share a y coordinate.
        assert!((square[0].y - square[1].y).abs() < 1e-9);
        assert_eq!(regular_polygon_vertices(Point::default(), 1, 1.0).len(), 3);
    }

    #[test]
    fn test_centers() {
        let rect = Shape::new(
            ShapeId(0),
            ShapeKind::Rectangle {
                width: 4.0,
                height: 2.0,
            },
            Point::new(1.0, 1.0),
        );
        assert_eq!(center(&rect), Point::new(3.0, 2.0));
        let tri = Shape::new(
            ShapeId(1),
            ShapeKind::Triangle {
                base: 3.0,
                height: 3.0,
            },
            Point::new(0.0, 0.0),
        );
        assert!(close(center(&tri), Point::new(1.5, 1.0)));
    }

    #[test]
    fn test_extent_with_rotation() {
        let mut square = Shape::new(ShapeId(0), ShapeKind::Square { side: 2.0 }, Point::default());
        assert_eq!(
            extent(&square),
            Some((Point::new(0.0, 0.0), Point::new(2.0, 2.0)))
        );
        square.rotation = Some(45.0);
        let (min, max) = extent(&square).unwrap();
        let half_diag = 2f64.sqrt();
        assert!(close(min, Point::new(1.0 - half_diag, 1.0 - half_diag)));
        assert!(close(max, Point::new(1.0 + half_diag, 1.0 + half_diag)));
    }

    #[test]
    fn test_empty_custom_polygon_has_no_extent() {
        let shape = Shape::new(
            ShapeId(0),
            ShapeKind::CustomPolygon { vertices: vec![] },
            Point::default(),
        );
        assert_eq!(extent(&shape), None);
    }
}
