use serde::{Deserialize, Serialize};

use crate::LineStyle;

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Point { x, y }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ShapeId(pub u32);

impl std::fmt::Display for ShapeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "shape-{}", self.0)
    }
}

/// Geometry of a shape. Dimensions are in TikZ units (cm).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum ShapeKind {
    Circle { radius: f64 },
    Rectangle { width: f64, height: f64 },
    Square { side: f64 },
    Triangle { base: f64, height: f64 },
    RegularPolygon { sides: u32, radius: f64 },
    /// Vertices are offsets from the shape position.
    CustomPolygon { vertices: Vec<Point> },
}

/// One shape of a figure.
///
/// `position` is the centre of circles and regular polygons, the lower-left
/// corner of rectangles, squares and triangles, and the origin of a custom
/// polygon's vertices.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Shape {
    pub id: ShapeId,
    pub kind: ShapeKind,
    #[serde(default)]
    pub position: Point,
    #[serde(default)]
    pub fill: Option<String>,
    #[serde(default)]
    pub stroke: Option<String>,
    #[serde(default)]
    pub line_width: Option<f64>,
    #[serde(default)]
    pub line_style: Option<LineStyle>,
    #[serde(default)]
    pub opacity: Option<f64>,
    /// Degrees, counter-clockwise.
    #[serde(default)]
    pub rotation: Option<f64>,
    #[serde(default)]
    pub shadow: bool,
    #[serde(default)]
    pub label: Option<String>,
}

impl Shape {
    pub fn new(id: ShapeId, kind: ShapeKind, position: Point) -> Self {
        Shape {
            id,
            kind,
            position,
            fill: None,
            stroke: None,
            line_width: None,
            line_style: None,
            opacity: None,
            rotation: None,
            shadow: false,
            label: None,
        }
    }
}

/// The shapes of one editing session, in drawing order.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ShapeSet {
    shapes: Vec<Shape>,
    #[serde(default)]
    next_id: u32,
}

impl ShapeSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, kind: ShapeKind, position: Point) -> ShapeId {
        let floor = self.shapes.iter().map(|s| s.id.0.saturating_add(1)).max().unwrap_or(0);
        let id = ShapeId(self.next_id.max(floor));
        self.next_id = id.0.saturating_add(1);
        self.shapes.push(Shape::new(id, kind, position));
        id
    }

    pub fn remove(&mut self, id: ShapeId) -> Option<Shape> {
        let index = self.shapes.iter().position(|s| s.id == id)?;
        Some(self.shapes.remove(index))
    }

    pub fn get(&self, id: ShapeId) -> Option<&Shape> {
        self.shapes.iter().find(|s| s.id == id)
    }

    pub fn get_mut(&mut self, id: ShapeId) -> Option<&mut Shape> {
        self.shapes.iter_mut().find(|s| s.id == id)
    }

    pub fn shapes(&self) -> &[Shape] {
        &self.shapes
    }

    pub fn len(&self) -> usize {
        self.shapes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.shapes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_and_remove_keep_order() {
        let mut set = ShapeSet::new();
        let a = set.add(ShapeKind::Circle { radius: 1.0 }, Point::new(0.0, 0.0));
        let b = set.add(ShapeKind::Square { side: 2.0 }, Point::new(1.0, 1.0));
        let c = set.add(
            ShapeKind::Triangle {
                base: 2.0,
                height: 1.0,
            },
            Point::default(),
        );
        assert_eq!(set.remove(b).map(|s| s.id), Some(b));
        let ids: Vec<_> = set.shapes().iter().map(|s| s.id).collect();
        assert_eq!(ids, vec![a, c]);
        assert!(set.remove(b).is_none());
    }

    #[test]
    fn get_mut_edits_in_place() {
        let mut set = ShapeSet::new();
        let id = set.add(ShapeKind::Circle { radius: 1.0 }, Point::default());
        set.get_mut(id).unwrap().label = Some("A".into());
        assert_eq!(set.get(id).unwrap().label.as_deref(), Some("A"));
    }

    #[test]
    fn max_id_does_not_overflow() {
        let json = format!(
            r#"{{"shapes":[{{"id":{},"kind":{{"type":"circle","radius":1.0}},"position":{{"x":0.0,"y":0.0}}}}]}}"#,
            u32::MAX
        );
        let mut set: ShapeSet = serde_json::from_str(&json).unwrap();
        let id = set.add(ShapeKind::Square { side: 1.0 }, Point::default());
        assert_eq!(id, ShapeId(u32::MAX));
        assert_eq!(set.len(), 2);
    }
}
