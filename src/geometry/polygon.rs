use super::{outline_quantity, point_in_polygon, Contains, PointSource};
use crate::math::Vec2;
use crate::util::Rng;
use serde::{Deserialize, Serialize};

/// Rejection sampling attempts before falling back to the centroid
const RANDOM_POINT_ATTEMPTS: usize = 64;

/// A simple polygon defined by its points, implicitly closed
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Polygon {
    #[serde(alias = "vertices")]
    pub points: Vec<Vec2>,
}

impl Polygon {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_points(points: Vec<Vec2>) -> Self {
        Self { points }
    }

    pub fn add_point(&mut self, x: f32, y: f32) {
        self.points.push(Vec2::new(x, y));
    }

    pub fn is_closed(&self) -> bool {
        self.points.len() >= 3
    }

    /// Get the bounding box (min_x, min_y, max_x, max_y)
    pub fn bounds(&self) -> Option<(f32, f32, f32, f32)> {
        if self.points.is_empty() {
            return None;
        }

        let mut min_x = f32::MAX;
        let mut min_y = f32::MAX;
        let mut max_x = f32::MIN;
        let mut max_y = f32::MIN;

        for p in &self.points {
            min_x = min_x.min(p.x);
            min_y = min_y.min(p.y);
            max_x = max_x.max(p.x);
            max_y = max_y.max(p.y);
        }

        Some((min_x, min_y, max_x, max_y))
    }

    /// Edges as point pairs, including the closing edge
    pub fn edges(&self) -> impl Iterator<Item = (&Vec2, &Vec2)> {
        let n = self.points.len();
        (0..n).map(move |i| (&self.points[i], &self.points[(i + 1) % n]))
    }

    pub fn perimeter(&self) -> f32 {
        if self.points.len() < 2 {
            return 0.0;
        }
        self.edges().map(|(a, b)| a.distance(b)).sum()
    }

    /// Average of the points
    pub fn centroid(&self) -> Option<Vec2> {
        if self.points.is_empty() {
            return None;
        }

        let n = self.points.len() as f32;
        let sum_x: f32 = self.points.iter().map(|p| p.x).sum();
        let sum_y: f32 = self.points.iter().map(|p| p.y).sum();

        Some(Vec2::new(sum_x / n, sum_y / n))
    }

    /// Point `distance` units along the outline, starting at the first point
    fn point_along(&self, distance: f32) -> Vec2 {
        let mut remaining = distance;
        for (a, b) in self.edges() {
            let len = a.distance(b);
            if remaining <= len {
                if len <= 0.0 {
                    return *a;
                }
                return a.lerp(b, remaining / len);
            }
            remaining -= len;
        }
        self.points.first().copied().unwrap_or_default()
    }
}

impl Contains for Polygon {
    fn contains(&self, x: f32, y: f32) -> bool {
        point_in_polygon(x, y, &self.points)
    }
}

impl PointSource for Polygon {
    fn get_points(&self, quantity: usize, step_rate: f32) -> Vec<Vec2> {
        let perimeter = self.perimeter();
        let quantity = outline_quantity(quantity, step_rate, perimeter);
        if self.points.is_empty() {
            return Vec::new();
        }
        (0..quantity)
            .map(|i| self.point_along(perimeter * (i as f32 / quantity as f32)))
            .collect()
    }

    fn random_point(&self, rng: &mut Rng) -> Vec2 {
        let Some((min_x, min_y, max_x, max_y)) = self.bounds() else {
            return Vec2::ZERO;
        };

        for _ in 0..RANDOM_POINT_ATTEMPTS {
            let x = rng.range_f32(min_x, max_x);
            let y = rng.range_f32(min_y, max_y);
            if self.contains(x, y) {
                return Vec2::new(x, y);
            }
        }

        self.centroid().unwrap_or_default()
    }
}
