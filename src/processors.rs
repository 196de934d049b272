//! Force fields and colliders applied to particles every tick

use crate::geometry::Rectangle;
use crate::math::Vec2;
use crate::particle::Particle;
use std::fmt;

/// Something that adjusts a live particle each update, after its velocity
/// has been integrated and before its position is.
pub trait ParticleProcessor: fmt::Debug + Send + Sync {
    fn update(&mut self, particle: &mut Particle, delta_ms: f32, step: f32, t: f32);

    /// Inactive processors are skipped
    fn active(&self) -> bool {
        true
    }

    fn set_active(&mut self, _active: bool) {}

    fn name(&self) -> &str;
}

/// A point that pulls particles towards itself
#[derive(Debug, Clone, PartialEq)]
pub struct GravityWell {
    pub x: f32,
    pub y: f32,
    pub active: bool,
    power: f32,
    epsilon_sq: f32,
    gravity: f32,
    /// `power * gravity`
    strength: f32,
}

impl GravityWell {
    pub const DEFAULT_GRAVITY: f32 = 50.0;

    pub fn new(x: f32, y: f32, power: f32, epsilon: f32, gravity: f32) -> Self {
        Self {
            x,
            y,
            active: true,
            power,
            epsilon_sq: epsilon * epsilon,
            gravity,
            strength: power * gravity,
        }
    }

    pub fn power(&self) -> f32 {
        self.power
    }

    pub fn set_power(&mut self, power: f32) {
        self.power = power;
        self.strength = power * self.gravity;
    }

    pub fn epsilon(&self) -> f32 {
        self.epsilon_sq.sqrt()
    }

    /// Minimum effective distance, stored squared
    pub fn set_epsilon(&mut self, epsilon: f32) {
        self.epsilon_sq = epsilon * epsilon;
    }

    pub fn gravity(&self) -> f32 {
        self.gravity
    }

    pub fn set_gravity(&mut self, gravity: f32) {
        self.gravity = gravity;
        self.strength = self.power * gravity;
    }
}

impl Default for GravityWell {
    fn default() -> Self {
        Self::new(0.0, 0.0, 0.0, 100.0, Self::DEFAULT_GRAVITY)
    }
}

impl ParticleProcessor for GravityWell {
    fn update(&mut self, particle: &mut Particle, delta_ms: f32, _step: f32, _t: f32) {
        let offset = Vec2::new(self.x, self.y) - particle.pos;
        let mut d_sq = offset.length_squared();

        if d_sq == 0.0 {
            return;
        }

        let d = d_sq.sqrt();
        if d_sq < self.epsilon_sq {
            d_sq = self.epsilon_sq;
        }

        let factor = self.strength * delta_ms / (d_sq * d) * 100.0;
        particle.vel += offset * factor;
    }

    fn active(&self) -> bool {
        self.active
    }

    fn set_active(&mut self, active: bool) {
        self.active = active;
    }

    fn name(&self) -> &str {
        "GravityWell"
    }
}

/// Rectangle that particles bounce off, per edge
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParticleBounds {
    pub rect: Rectangle,
    pub collide_left: bool,
    pub collide_right: bool,
    pub collide_top: bool,
    pub collide_bottom: bool,
    pub active: bool,
}

impl ParticleBounds {
    pub fn new(rect: Rectangle) -> Self {
        Self {
            rect,
            collide_left: true,
            collide_right: true,
            collide_top: true,
            collide_bottom: true,
            active: true,
        }
    }

    pub fn with_collisions(mut self, left: bool, right: bool, top: bool, bottom: bool) -> Self {
        self.collide_left = left;
        self.collide_right = right;
        self.collide_top = top;
        self.collide_bottom = bottom;
        self
    }

    /// Push an escaped particle back onto the edge and reflect that axis of
    /// its velocity, scaled by the particle's bounce.
    pub fn apply(&self, particle: &mut Particle) {
        let r = &self.rect;
        let bounce = -particle.bounce;
        let pos = &mut particle.pos;
        let vel = &mut particle.vel;

        if pos.x < r.x && self.collide_left {
            pos.x = r.x;
            vel.x *= bounce;
        } else if pos.x > r.right() && self.collide_right {
            pos.x = r.right();
            vel.x *= bounce;
        }

        if pos.y < r.y && self.collide_top {
            pos.y = r.y;
            vel.y *= bounce;
        } else if pos.y > r.bottom() && self.collide_bottom {
            pos.y = r.bottom();
            vel.y *= bounce;
        }
    }
}

impl ParticleProcessor for ParticleBounds {
    fn update(&mut self, particle: &mut Particle, _delta_ms: f32, _step: f32, _t: f32) {
        self.apply(particle);
    }

    fn active(&self) -> bool {
        self.active
    }

    fn set_active(&mut self, active: bool) {
        self.active = active;
    }

    fn name(&self) -> &str {
        "ParticleBounds"
    }
}
