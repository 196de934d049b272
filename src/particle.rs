//! A single simulated particle
//!
//! Particles are owned by an emitter's pool and are recycled rather than
//! dropped. Everything a particle needs from its emitter while firing or
//! updating arrives through a borrowed context.

use crate::emitter::EmitterEvent;
use crate::math::Vec2;
use crate::ops::{EmitterOps, OpKey};
use crate::processors::{ParticleBounds, ParticleProcessor};
use crate::util::{deg_to_rad, pack_color, Rng};
use crate::zones::DeathZone;

/// Per-property range used by eased ops as a particle ages
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Anchor {
    pub min: f32,
    pub max: f32,
}

impl Anchor {
    pub const fn new(min: f32, max: f32) -> Self {
        Self { min, max }
    }
}

/// What a particle reads from its emitter while being fired
pub struct FireContext<'a> {
    pub ops: &'a mut EmitterOps,
    pub rng: &'a mut Rng,
    pub radial: bool,
    pub move_to: bool,
    pub acceleration: bool,
    /// Spawn point chosen by the current emit zone
    pub zone_point: Option<Vec2>,
    pub frame: Option<String>,
    pub anim: Option<String>,
    pub index: usize,
    pub death_zones: &'a [DeathZone],
    pub events: &'a mut Vec<EmitterEvent>,
}

/// What a particle reads from its emitter while being updated
pub struct UpdateContext<'a> {
    pub ops: &'a mut EmitterOps,
    pub gravity: Vec2,
    pub move_to: bool,
    pub bounds: Option<&'a ParticleBounds>,
    pub death_zones: &'a [DeathZone],
    pub processors: &'a mut [Box<dyn ParticleProcessor>],
    pub events: &'a mut Vec<EmitterEvent>,
}

/// A single particle
#[derive(Debug, Clone, PartialEq)]
pub struct Particle {
    pub pos: Vec2,
    pub vel: Vec2,
    pub accel: Vec2,
    pub max_vel: Vec2,
    pub bounce: f32,
    pub scale_x: f32,
    pub scale_y: f32,
    /// Degrees
    pub angle: f32,
    /// Radians, derived from `angle`
    pub rotation: f32,
    pub alpha: f32,
    /// 24-bit RGB
    pub tint: u32,
    /// Packed ARGB from `tint` and `alpha`
    pub color: u32,
    /// Total lifespan in ms
    pub life: f32,
    /// Remaining life in ms
    pub life_current: f32,
    pub delay_current: f32,
    /// Remaining time spent fully aged after `life_current` runs out
    pub hold_current: f32,
    /// Normalized age, 0 at birth and 1 at death
    pub life_t: f32,
    /// Emission order within the emitter
    pub index: usize,
    pub move_to: Vec2,
    pub frame: Option<String>,
    pub anim: Option<String>,
    anchors: [Anchor; OpKey::COUNT],
}

impl Default for Particle {
    fn default() -> Self {
        Self {
            pos: Vec2::ZERO,
            vel: Vec2::ZERO,
            accel: Vec2::ZERO,
            max_vel: Vec2::new(10_000.0, 10_000.0),
            bounce: 0.0,
            scale_x: 1.0,
            scale_y: 1.0,
            angle: 0.0,
            rotation: 0.0,
            alpha: 1.0,
            tint: 0x00FF_FFFF,
            color: 0xFFFF_FFFF,
            life: 1000.0,
            life_current: 0.0,
            delay_current: 0.0,
            hold_current: 0.0,
            life_t: 0.0,
            index: 0,
            move_to: Vec2::ZERO,
            frame: None,
            anim: None,
            anchors: [Anchor::default(); OpKey::COUNT],
        }
    }
}

impl Particle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Alive while it has life left or is being held
    #[inline]
    pub fn is_alive(&self) -> bool {
        self.life_current > 0.0 || self.hold_current > 0.0
    }

    #[inline]
    pub fn is_delayed(&self) -> bool {
        self.delay_current > 0.0
    }

    /// Mark the particle dead; the next update reports the death
    pub fn kill(&mut self) {
        self.life_current = 0.0;
        self.hold_current = 0.0;
    }

    pub fn set_position(&mut self, x: f32, y: f32) {
        self.pos = Vec2::new(x, y);
    }

    pub fn anchor(&self, key: OpKey) -> Anchor {
        self.anchors[key.index()]
    }

    pub fn anchor_mut(&mut self, key: OpKey) -> &mut Anchor {
        &mut self.anchors[key.index()]
    }

    /// Get normalized age (0 = just born, 1 = about to die)
    #[inline]
    pub fn age(&self) -> f32 {
        if self.life <= 0.0 {
            return 1.0;
        }
        1.0 - self.life_current / self.life
    }

    /// Bring the particle to life using the emitter's ops.
    ///
    /// The spawn position is the zone point, plus the explicit coordinates
    /// when given, plus whatever the `x` and `y` ops emit. Returns false when
    /// an undelayed particle lands in a death zone; it is dead already and
    /// belongs back in the pool.
    pub fn fire(&mut self, ctx: &mut FireContext<'_>, spawn_x: Option<f32>, spawn_y: Option<f32>) -> bool {
        let ops = &mut *ctx.ops;
        let rng = &mut *ctx.rng;

        self.frame = ctx.frame.take();
        self.anim = ctx.anim.take();
        self.index = ctx.index;

        let origin = ctx.zone_point.unwrap_or(Vec2::ZERO);
        self.pos = origin + Vec2::new(spawn_x.unwrap_or(0.0), spawn_y.unwrap_or(0.0));
        let ox = ops.x.emit(Some(&mut *self), rng, 0.0);
        let oy = ops.y.emit(Some(&mut *self), rng, 0.0);
        self.pos += Vec2::new(ox, oy);

        let previous_life = self.life;
        self.life = ops.lifespan.emit(Some(&mut *self), rng, previous_life);
        self.life_current = self.life;
        self.life_t = 0.0;

        self.delay_current = ops.delay.emit(Some(&mut *self), rng, 0.0);
        self.hold_current = ops.hold.emit(Some(&mut *self), rng, 0.0).max(0.0);

        self.scale_x = ops.scale_x.emit(Some(&mut *self), rng, 1.0);
        self.scale_y = if ops.scale_y.is_active() {
            ops.scale_y.emit(Some(&mut *self), rng, 1.0)
        } else {
            self.scale_x
        };

        self.angle = ops.rotate.emit(Some(&mut *self), rng, 0.0);
        self.rotation = deg_to_rad(self.angle);

        let sx = ops.speed_x.emit(Some(&mut *self), rng, 0.0);
        let sy = if ops.speed_y.is_active() {
            ops.speed_y.emit(Some(&mut *self), rng, 0.0)
        } else {
            sx
        };

        if ctx.radial {
            let rad = deg_to_rad(ops.angle.emit(Some(&mut *self), rng, 0.0));
            self.vel = Vec2::new(rad.cos() * sx.abs(), rad.sin() * sy.abs());
        } else if ctx.move_to {
            let mx = ops.move_to_x.emit(Some(&mut *self), rng, 0.0);
            let my = ops.move_to_y.emit(Some(&mut *self), rng, 0.0);
            self.move_to = Vec2::new(mx, my);
            self.vel = self.seek(self.life);
        } else {
            self.vel = Vec2::new(sx, sy);
        }

        self.accel = if ctx.acceleration {
            let ax = ops.acceleration_x.emit(Some(&mut *self), rng, 0.0);
            let ay = ops.acceleration_y.emit(Some(&mut *self), rng, 0.0);
            Vec2::new(ax, ay)
        } else {
            Vec2::ZERO
        };

        let Vec2 { x: cap_x, y: cap_y } = self.max_vel;
        let cap_x = ops.max_velocity_x.emit(Some(&mut *self), rng, cap_x);
        let cap_y = ops.max_velocity_y.emit(Some(&mut *self), rng, cap_y);
        self.max_vel = Vec2::new(cap_x, cap_y);

        self.bounce = ops.bounce.emit(Some(&mut *self), rng, 0.0);
        self.alpha = ops.alpha.emit(Some(&mut *self), rng, 1.0).clamp(0.0, 1.0);

        self.tint = match ops.color.emit() {
            Some(tint) => tint,
            None => {
                let previous_tint = self.tint as f32;
                to_tint(ops.tint.emit(Some(&mut *self), rng, previous_tint))
            }
        };
        self.color = pack_color(self.tint, self.alpha);

        !(self.delay_current <= 0.0 && self.hit_death_zone(ctx.death_zones, ctx.events))
    }

    /// Advance the particle by one tick. Returns true when it just died.
    pub fn update(&mut self, ctx: &mut UpdateContext<'_>, delta_ms: f32, step: f32) -> bool {
        if self.life_current <= 0.0 {
            // Lingering at the end of life; killed particles have no hold
            if self.hold_current > 0.0 {
                self.hold_current -= delta_ms;
                return self.hold_current <= 0.0;
            }
            return true;
        }

        if self.delay_current > 0.0 {
            self.delay_current -= delta_ms;
            return false;
        }

        let ops = &mut *ctx.ops;
        let t = self.age();
        self.life_t = t;

        self.pos.x = ops.x.update(self, t, self.pos.x);
        self.pos.y = ops.y.update(self, t, self.pos.y);

        if ctx.move_to {
            let mx = ops.move_to_x.update(self, t, self.move_to.x);
            let my = ops.move_to_y.update(self, t, self.move_to.y);
            self.move_to = Vec2::new(mx, my);
            self.vel = self.seek(self.life_current);
        }

        // Velocity
        let ax = ops.acceleration_x.update(self, t, self.accel.x);
        let ay = ops.acceleration_y.update(self, t, self.accel.y);
        self.accel = Vec2::new(ax, ay);

        let mx = ops.max_velocity_x.update(self, t, self.max_vel.x);
        let my = ops.max_velocity_y.update(self, t, self.max_vel.y);
        self.max_vel = Vec2::new(mx, my);

        self.bounce = ops.bounce.update(self, t, self.bounce);

        self.vel += ctx.gravity * step + self.accel * step;
        self.vel.x = clamp_symmetric(self.vel.x, mx);
        self.vel.y = clamp_symmetric(self.vel.y, my);

        for processor in ctx.processors.iter_mut() {
            if processor.active() {
                processor.update(self, delta_ms, step, t);
            }
        }

        self.pos += self.vel * step;

        if let Some(bounds) = ctx.bounds {
            bounds.apply(self);
        }

        if self.hit_death_zone(ctx.death_zones, ctx.events) {
            return true;
        }

        self.scale_x = ops.scale_x.update(self, t, self.scale_x);
        self.scale_y = if ops.scale_y.is_active() {
            ops.scale_y.update(self, t, self.scale_y)
        } else {
            self.scale_x
        };

        self.angle = ops.rotate.update(self, t, self.angle);
        self.rotation = deg_to_rad(self.angle);

        self.alpha = ops.alpha.update(self, t, self.alpha).clamp(0.0, 1.0);
        self.tint = match ops.color.update(t) {
            Some(tint) => tint,
            None => to_tint(ops.tint.update(self, t, self.tint as f32)),
        };
        self.color = pack_color(self.tint, self.alpha);

        self.life_current -= delta_ms;

        self.life_current <= 0.0 && self.hold_current <= 0.0
    }

    /// Kill the particle if any death zone claims it, queueing the event
    fn hit_death_zone(&mut self, zones: &[DeathZone], events: &mut Vec<EmitterEvent>) -> bool {
        let Some(zone) = zones.iter().position(|zone| zone.will_kill(self)) else {
            return false;
        };
        self.life_current = 0.0;
        self.hold_current = 0.0;
        events.push(EmitterEvent::DeathZone {
            zone,
            particle: Box::new(self.clone()),
        });
        true
    }

    /// Velocity that reaches `move_to` in `remaining_ms`
    fn seek(&self, remaining_ms: f32) -> Vec2 {
        let secs = remaining_ms / 1000.0;
        if secs <= 0.0 {
            return Vec2::ZERO;
        }
        (self.move_to - self.pos) * (1.0 / secs)
    }
}

#[inline]
fn to_tint(value: f32) -> u32 {
    (value.max(0.0) as u32) & 0x00FF_FFFF
}

#[inline]
fn clamp_symmetric(value: f32, limit: f32) -> f32 {
    let limit = limit.abs();
    value.clamp(-limit, limit)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ease::EaseRegistry;
    use crate::geometry::{Circle, Rectangle};
    use crate::ops::OpConfig;
    use crate::processors::GravityWell;

    struct Harness {
        ops: EmitterOps,
        rng: Rng,
        events: Vec<EmitterEvent>,
        death_zones: Vec<DeathZone>,
        processors: Vec<Box<dyn ParticleProcessor>>,
        bounds: Option<ParticleBounds>,
        gravity: Vec2,
    }

    impl Harness {
        fn new() -> Self {
            Self {
                ops: EmitterOps::default(),
                rng: Rng::new(42),
                events: Vec::new(),
                death_zones: Vec::new(),
                processors: Vec::new(),
                bounds: None,
                gravity: Vec2::ZERO,
            }
        }

        fn set(&mut self, key: OpKey, config: OpConfig) {
            self.ops.get_mut(key).set_config(config, &EaseRegistry::new());
        }

        fn fire(&mut self, radial: bool, x: f32, y: f32) -> Particle {
            let (p, _) = self.try_fire(radial, x, y);
            p
        }

        fn try_fire(&mut self, radial: bool, x: f32, y: f32) -> (Particle, bool) {
            let move_to = self.ops.has_move_to();
            let acceleration = self.ops.has_acceleration();
            let mut ctx = FireContext {
                ops: &mut self.ops,
                rng: &mut self.rng,
                radial,
                move_to,
                acceleration,
                zone_point: None,
                frame: None,
                anim: None,
                index: 0,
                death_zones: &self.death_zones,
                events: &mut self.events,
            };
            let mut p = Particle::new();
            let live = p.fire(&mut ctx, Some(x), Some(y));
            (p, live)
        }

        fn update(&mut self, p: &mut Particle, delta_ms: f32) -> bool {
            let move_to = self.ops.has_move_to();
            let mut ctx = UpdateContext {
                ops: &mut self.ops,
                gravity: self.gravity,
                move_to,
                bounds: self.bounds.as_ref(),
                death_zones: &self.death_zones,
                processors: &mut self.processors,
                events: &mut self.events,
            };
            p.update(&mut ctx, delta_ms, delta_ms / 1000.0)
        }
    }

    #[test]
    fn test_fire_defaults() {
        let mut h = Harness::new();
        let p = h.fire(false, 10.0, 20.0);
        assert_eq!(p.pos, Vec2::new(10.0, 20.0));
        assert_eq!(p.life, 1000.0);
        assert_eq!(p.life_current, 1000.0);
        assert_eq!(p.scale_x, 1.0);
        assert_eq!(p.tint, 0xFF_FFFF);
        assert_eq!(p.color, 0xFFFF_FFFF);
        assert_eq!(p.vel, Vec2::ZERO);
    }

    #[test]
    fn test_fire_radial_velocity() {
        let mut h = Harness::new();
        h.set(OpKey::SpeedX, OpConfig::Constant(100.0));
        h.set(OpKey::Angle, OpConfig::Constant(90.0));
        h.ops.speed_y.set_active(false);
        let p = h.fire(true, 0.0, 0.0);
        assert!(p.vel.approx_eq(&Vec2::new(0.0, 100.0), 1e-3));
    }

    #[test]
    fn test_fire_move_to_arrives_at_end_of_life() {
        let mut h = Harness::new();
        h.set(OpKey::MoveToX, OpConfig::Constant(100.0));
        h.set(OpKey::MoveToY, OpConfig::Constant(50.0));
        h.set(OpKey::Lifespan, OpConfig::Constant(2000.0));
        let mut p = h.fire(false, 0.0, 0.0);
        assert!(p.vel.approx_eq(&Vec2::new(50.0, 25.0), 1e-3));

        for _ in 0..20 {
            h.update(&mut p, 100.0);
        }
        assert!(p.pos.approx_eq(&Vec2::new(100.0, 50.0), 1e-2));
    }

    #[test]
    fn test_scale_y_follows_scale_x_when_inactive() {
        let mut h = Harness::new();
        h.set(OpKey::ScaleX, OpConfig::eased(1.0, 0.0, "Linear"));
        h.ops.scale_y.set_active(false);
        let mut p = h.fire(false, 0.0, 0.0);
        assert_eq!(p.scale_y, 1.0);
        h.update(&mut p, 250.0);
        h.update(&mut p, 250.0);
        assert_eq!(p.scale_x, 0.75);
        assert_eq!(p.scale_y, p.scale_x);
    }

    #[test]
    fn test_delayed_particle_neither_moves_nor_ages() {
        let mut h = Harness::new();
        h.set(OpKey::Delay, OpConfig::Constant(100.0));
        h.set(OpKey::SpeedX, OpConfig::Constant(50.0));
        let mut p = h.fire(false, 0.0, 0.0);

        assert!(!h.update(&mut p, 60.0));
        assert_eq!(p.pos, Vec2::ZERO);
        assert_eq!(p.life_current, 1000.0);
        assert!(!h.update(&mut p, 60.0));
        assert!(!p.is_delayed());
        h.update(&mut p, 100.0);
        assert!(p.pos.x > 0.0);
        assert_eq!(p.life_current, 900.0);
    }

    #[test]
    fn test_dies_when_life_runs_out() {
        let mut h = Harness::new();
        h.set(OpKey::Lifespan, OpConfig::Constant(100.0));
        let mut p = h.fire(false, 0.0, 0.0);
        assert!(!h.update(&mut p, 50.0));
        assert!(h.update(&mut p, 50.0));
        assert!(!p.is_alive());
    }

    #[test]
    fn test_killed_particle_reports_death() {
        let mut h = Harness::new();
        let mut p = h.fire(false, 0.0, 0.0);
        p.kill();
        assert!(h.update(&mut p, 16.0));
    }

    #[test]
    fn test_gravity_and_velocity_cap() {
        let mut h = Harness::new();
        h.gravity = Vec2::new(0.0, 1000.0);
        h.set(OpKey::MaxVelocityY, OpConfig::Constant(50.0));
        let mut p = h.fire(false, 0.0, 0.0);
        h.update(&mut p, 100.0);
        assert_eq!(p.vel.y, 50.0);
        assert!((p.pos.y - 5.0).abs() < 1e-4);
    }

    #[test]
    fn test_bounds_reflect_velocity() {
        let mut h = Harness::new();
        h.bounds = Some(ParticleBounds::new(Rectangle::new(0.0, 0.0, 100.0, 100.0)));
        h.set(OpKey::SpeedX, OpConfig::Constant(-200.0));
        h.set(OpKey::Bounce, OpConfig::Constant(0.5));
        let mut p = h.fire(false, 5.0, 50.0);
        h.update(&mut p, 100.0);
        assert_eq!(p.pos.x, 0.0);
        assert_eq!(p.vel.x, 100.0);
        assert_eq!(p.pos.y, 50.0);
    }

    #[test]
    fn test_death_zone_kills_and_queues_event() {
        let mut h = Harness::new();
        h.death_zones
            .push(DeathZone::on_enter(Circle::new(0.0, 0.0, 10.0).into()));
        h.set(OpKey::SpeedX, OpConfig::Constant(-1000.0));
        h.set(OpKey::Alpha, OpConfig::eased(1.0, 0.0, "Linear"));
        let mut p = h.fire(false, 15.0, 0.0);
        assert!(p.is_alive());
        assert!(h.events.is_empty());

        assert!(h.update(&mut p, 10.0));
        assert!(!p.is_alive());
        assert_eq!(p.alpha, 1.0);
        assert!(matches!(h.events.as_slice(), [EmitterEvent::DeathZone { zone: 0, .. }]));
    }

    #[test]
    fn test_fired_inside_death_zone_is_rejected() {
        let mut h = Harness::new();
        h.death_zones
            .push(DeathZone::on_enter(Circle::new(0.0, 0.0, 10.0).into()));
        let (p, live) = h.try_fire(false, 1.0, 1.0);
        assert!(!live);
        assert!(!p.is_alive());
        assert_eq!(h.events.len(), 1);

        // A delayed particle is only judged once it starts moving
        h.events.clear();
        h.set(OpKey::Delay, OpConfig::Constant(50.0));
        let (mut p, live) = h.try_fire(false, 1.0, 1.0);
        assert!(live);
        assert!(h.events.is_empty());
        assert!(!h.update(&mut p, 60.0));
        assert!(h.update(&mut p, 16.0));
    }

    #[test]
    fn test_hold_keeps_particle_after_lifespan() {
        let mut h = Harness::new();
        h.set(OpKey::Lifespan, OpConfig::Constant(100.0));
        h.set(OpKey::Hold, OpConfig::Constant(50.0));
        h.set(OpKey::SpeedX, OpConfig::Constant(100.0));
        let mut p = h.fire(false, 0.0, 0.0);
        assert_eq!(p.hold_current, 50.0);

        assert!(!h.update(&mut p, 100.0));
        assert!(p.is_alive());
        let x = p.pos.x;
        assert!(!h.update(&mut p, 30.0));
        assert_eq!(p.pos.x, x);
        assert!(h.update(&mut p, 30.0));
        assert!(!p.is_alive());
    }

    #[test]
    fn test_kill_skips_hold() {
        let mut h = Harness::new();
        h.set(OpKey::Hold, OpConfig::Constant(500.0));
        let mut p = h.fire(false, 0.0, 0.0);
        p.kill();
        assert!(!p.is_alive());
        assert!(h.update(&mut p, 16.0));
    }

    #[test]
    fn test_color_ramp_overrides_tint() {
        let mut h = Harness::new();
        h.set(OpKey::Tint, OpConfig::Constant(f32::from(0x12_u8)));
        h.ops
            .color
            .set_colors(vec![0xFF_00_00, 0x00_00_FF], None, &EaseRegistry::new());
        let mut p = h.fire(false, 0.0, 0.0);
        assert_eq!(p.tint, 0xFF_00_00);

        h.update(&mut p, 500.0);
        h.update(&mut p, 10.0);
        assert_eq!(p.tint, 0x80_00_80);
        assert_eq!(p.color, 0xFF80_0080);
    }

    #[test]
    fn test_processor_pulls_velocity() {
        let mut h = Harness::new();
        h.processors
            .push(Box::new(GravityWell::new(100.0, 0.0, 1.0, 100.0, 50.0)));
        let mut p = h.fire(false, 0.0, 0.0);
        h.update(&mut p, 16.0);
        assert!(p.vel.x > 0.0);
        assert_eq!(p.vel.y, 0.0);
    }

    #[test]
    fn test_alpha_clamped_and_color_packed() {
        let mut h = Harness::new();
        h.set(OpKey::Alpha, OpConfig::eased(2.0, 0.0, "Linear"));
        h.set(OpKey::Tint, OpConfig::Constant(f32::from(0x12_u8)));
        let mut p = h.fire(false, 0.0, 0.0);
        assert_eq!(p.alpha, 1.0);
        h.update(&mut p, 750.0);
        h.update(&mut p, 10.0);
        assert_eq!(p.alpha, 0.5);
        assert_eq!(p.color, 0x8000_0012);
    }
}
