//! Geometry sources for emit and death zones
//!
//! Zones never care which shape they hold. They only need a shape to answer
//! `contains(x, y)` (death zones) or to hand out points (emit zones).

mod polygon;
mod primitives;

pub use polygon::Polygon;
pub use primitives::{Circle, Line, Rectangle};

use crate::math::Vec2;
use crate::util::Rng;
use serde::{Deserialize, Serialize};

/// Shapes that can answer a point-inside query
pub trait Contains {
    fn contains(&self, x: f32, y: f32) -> bool;
}

/// Shapes that can produce spawn points
pub trait PointSource {
    /// Points spread evenly along the outline.
    ///
    /// When `quantity` is 0 and `step_rate` is positive, the quantity is the
    /// outline length divided by `step_rate`.
    fn get_points(&self, quantity: usize, step_rate: f32) -> Vec<Vec2>;

    /// A uniformly distributed point inside the shape (on it, for lines)
    fn random_point(&self, rng: &mut Rng) -> Vec2;
}

/// Resolve the point count for an outline of the given length
pub(crate) fn outline_quantity(quantity: usize, step_rate: f32, perimeter: f32) -> usize {
    if quantity == 0 && step_rate > 0.0 {
        (perimeter / step_rate) as usize
    } else {
        quantity
    }
}

/// Any zone source, tagged by `type` in configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Shape {
    #[serde(alias = "rect")]
    Rectangle(Rectangle),
    Circle(Circle),
    Line(Line),
    Polygon(Polygon),
}

impl Shape {
    /// Outline length, used to derive point counts from a step rate
    pub fn perimeter(&self) -> f32 {
        match self {
            Self::Rectangle(r) => r.perimeter(),
            Self::Circle(c) => c.circumference(),
            Self::Line(l) => l.length(),
            Self::Polygon(p) => p.perimeter(),
        }
    }
}

impl Contains for Shape {
    fn contains(&self, x: f32, y: f32) -> bool {
        match self {
            Self::Rectangle(r) => r.contains(x, y),
            Self::Circle(c) => c.contains(x, y),
            Self::Line(_) => false,
            Self::Polygon(p) => p.contains(x, y),
        }
    }
}

impl PointSource for Shape {
    fn get_points(&self, quantity: usize, step_rate: f32) -> Vec<Vec2> {
        match self {
            Self::Rectangle(r) => r.get_points(quantity, step_rate),
            Self::Circle(c) => c.get_points(quantity, step_rate),
            Self::Line(l) => l.get_points(quantity, step_rate),
            Self::Polygon(p) => p.get_points(quantity, step_rate),
        }
    }

    fn random_point(&self, rng: &mut Rng) -> Vec2 {
        match self {
            Self::Rectangle(r) => r.random_point(rng),
            Self::Circle(c) => c.random_point(rng),
            Self::Line(l) => l.random_point(rng),
            Self::Polygon(p) => p.random_point(rng),
        }
    }
}

impl From<Rectangle> for Shape {
    fn from(r: Rectangle) -> Self {
        Self::Rectangle(r)
    }
}

impl From<Circle> for Shape {
    fn from(c: Circle) -> Self {
        Self::Circle(c)
    }
}

impl From<Line> for Shape {
    fn from(l: Line) -> Self {
        Self::Line(l)
    }
}

impl From<Polygon> for Shape {
    fn from(p: Polygon) -> Self {
        Self::Polygon(p)
    }
}

/// Check if a point is inside a polygon using ray casting algorithm
pub fn point_in_polygon(px: f32, py: f32, vertices: &[Vec2]) -> bool {
    let n = vertices.len();
    if n < 3 {
        return false;
    }

    let mut inside = false;
    let mut j = n - 1;

    for i in 0..n {
        let (xi, yi) = (vertices[i].x, vertices[i].y);
        let (xj, yj) = (vertices[j].x, vertices[j].y);

        // Skip horizontal edges (avoid division by zero)
        let dy = yj - yi;
        if dy.abs() > f32::EPSILON && ((yi > py) != (yj > py)) {
            let x_intersect = (xj - xi) * (py - yi) / dy + xi;
            if px < x_intersect {
                inside = !inside;
            }
        }
        j = i;
    }

    inside
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shape_tagged_json() {
        let json = r#"{"type":"circle","x":10,"y":20,"radius":5}"#;
        let shape: Shape = serde_json::from_str(json).unwrap();
        assert_eq!(shape, Shape::Circle(Circle::new(10.0, 20.0, 5.0)));

        let rect: Shape =
            serde_json::from_str(r#"{"type":"rect","x":0,"y":0,"w":4,"h":2}"#).unwrap();
        assert_eq!(rect, Shape::Rectangle(Rectangle::new(0.0, 0.0, 4.0, 2.0)));
        assert_eq!(rect.perimeter(), 12.0);
    }

    #[test]
    fn test_line_never_contains() {
        let line = Shape::Line(Line::new(0.0, 0.0, 10.0, 0.0));
        assert!(!line.contains(5.0, 0.0));
    }

    #[test]
    fn test_point_in_polygon_square() {
        let square = [
            Vec2::new(0.0, 0.0),
            Vec2::new(10.0, 0.0),
            Vec2::new(10.0, 10.0),
            Vec2::new(0.0, 10.0),
        ];
        assert!(point_in_polygon(5.0, 5.0, &square));
        assert!(!point_in_polygon(15.0, 5.0, &square));
        assert!(!point_in_polygon(5.0, 5.0, &square[..2]));
    }

    #[test]
    fn test_outline_quantity_from_step_rate() {
        assert_eq!(outline_quantity(0, 10.0, 100.0), 10);
        assert_eq!(outline_quantity(4, 10.0, 100.0), 4);
        assert_eq!(outline_quantity(0, 0.0, 100.0), 0);
    }
}
