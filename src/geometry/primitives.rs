use super::{outline_quantity, Contains, PointSource};
use crate::math::Vec2;
use crate::util::Rng;
use serde::{Deserialize, Serialize};
use std::f32::consts::TAU;

/// Axis-aligned rectangle anchored at its top-left corner
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Rectangle {
    #[serde(default)]
    pub x: f32,
    #[serde(default)]
    pub y: f32,
    #[serde(alias = "w")]
    pub width: f32,
    #[serde(alias = "h")]
    pub height: f32,
}

impl Rectangle {
    pub const fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    #[inline]
    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    #[inline]
    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }

    pub fn perimeter(&self) -> f32 {
        2.0 * (self.width + self.height)
    }

    /// Point at `position` (0..1) along the perimeter, clockwise from top-left
    pub fn point_on_perimeter(&self, position: f32) -> Vec2 {
        if position <= 0.0 || position >= 1.0 {
            return Vec2::new(self.x, self.y);
        }

        let mut p = self.perimeter() * position;

        if position > 0.5 {
            p -= self.width + self.height;
            if p <= self.width {
                // Bottom edge, right to left
                Vec2::new(self.right() - p, self.bottom())
            } else {
                // Left edge, bottom to top
                Vec2::new(self.x, self.bottom() - (p - self.width))
            }
        } else if p <= self.width {
            // Top edge
            Vec2::new(self.x + p, self.y)
        } else {
            // Right edge
            Vec2::new(self.right(), self.y + (p - self.width))
        }
    }
}

impl Contains for Rectangle {
    fn contains(&self, x: f32, y: f32) -> bool {
        if self.width <= 0.0 || self.height <= 0.0 {
            return false;
        }
        x >= self.x && x < self.right() && y >= self.y && y < self.bottom()
    }
}

impl PointSource for Rectangle {
    fn get_points(&self, quantity: usize, step_rate: f32) -> Vec<Vec2> {
        let quantity = outline_quantity(quantity, step_rate, self.perimeter());
        (0..quantity)
            .map(|i| self.point_on_perimeter(i as f32 / quantity as f32))
            .collect()
    }

    fn random_point(&self, rng: &mut Rng) -> Vec2 {
        Vec2::new(
            self.x + rng.next_f32() * self.width,
            self.y + rng.next_f32() * self.height,
        )
    }
}

/// Circle defined by its center and radius
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Circle {
    #[serde(default)]
    pub x: f32,
    #[serde(default)]
    pub y: f32,
    pub radius: f32,
}

impl Circle {
    pub const fn new(x: f32, y: f32, radius: f32) -> Self {
        Self { x, y, radius }
    }

    pub fn circumference(&self) -> f32 {
        TAU * self.radius
    }

    pub fn point_at_angle(&self, angle: f32) -> Vec2 {
        Vec2::new(
            self.x + self.radius * angle.cos(),
            self.y + self.radius * angle.sin(),
        )
    }
}

impl Contains for Circle {
    fn contains(&self, x: f32, y: f32) -> bool {
        if self.radius <= 0.0 {
            return false;
        }
        let dx = self.x - x;
        let dy = self.y - y;
        dx * dx + dy * dy <= self.radius * self.radius
    }
}

impl PointSource for Circle {
    fn get_points(&self, quantity: usize, step_rate: f32) -> Vec<Vec2> {
        let quantity = outline_quantity(quantity, step_rate, self.circumference());
        (0..quantity)
            .map(|i| self.point_at_angle(i as f32 / quantity as f32 * TAU))
            .collect()
    }

    fn random_point(&self, rng: &mut Rng) -> Vec2 {
        // Triangle-distributed radius keeps the density uniform over the area
        let t = TAU * rng.next_f32();
        let u = rng.next_f32() + rng.next_f32();
        let r = if u > 1.0 { 2.0 - u } else { u };
        Vec2::new(
            self.x + r * t.cos() * self.radius,
            self.y + r * t.sin() * self.radius,
        )
    }
}

/// Line segment
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Line {
    pub x1: f32,
    pub y1: f32,
    pub x2: f32,
    pub y2: f32,
}

impl Line {
    pub const fn new(x1: f32, y1: f32, x2: f32, y2: f32) -> Self {
        Self { x1, y1, x2, y2 }
    }

    pub fn length(&self) -> f32 {
        Vec2::new(self.x2 - self.x1, self.y2 - self.y1).length()
    }

    pub fn point_at(&self, position: f32) -> Vec2 {
        Vec2::new(
            self.x1 + (self.x2 - self.x1) * position,
            self.y1 + (self.y2 - self.y1) * position,
        )
    }
}

impl PointSource for Line {
    fn get_points(&self, quantity: usize, step_rate: f32) -> Vec<Vec2> {
        let quantity = outline_quantity(quantity, step_rate, self.length());
        (0..quantity)
            .map(|i| self.point_at(i as f32 / quantity as f32))
            .collect()
    }

    fn random_point(&self, rng: &mut Rng) -> Vec2 {
        self.point_at(rng.next_f32())
    }
}
