//! Particle emitter
//!
//! An emitter owns one [`ValueOp`](crate::ops::ValueOp) per particle property
//! and a pool of particles. Each `update` ages the alive particles, recycles
//! the dead, and then spawns new ones according to the emission mode:
//!
//! - `frequency > 0`: flow, emitting `quantity` particles every `frequency` ms
//! - `frequency == 0`: emit `quantity` particles on every update
//! - `frequency < 0`: explode only, nothing is emitted by `update`

mod config;
mod events;
mod frames;
mod sort;

pub use events::EmitterEvent;
pub use frames::{FrameConfig, FrameSelector};
pub use sort::SortProperty;

use crate::geometry::{Contains, Rectangle};
use crate::math::Vec2;
use crate::ops::{
    CallbackRegistry, EmitterOps, OpConfig, OpKey, ParticleCallback, SortCallback, ValueOp,
};
use crate::particle::{FireContext, Particle, UpdateContext};
use crate::processors::{GravityWell, ParticleBounds, ParticleProcessor};
use crate::util::Rng;
use crate::zones::{DeathZone, EmitZone};
use log::{debug, trace};
use serde_json::{Map, Value};
use std::collections::VecDeque;

/// Default `fast_forward` step, one frame at 60 Hz
pub const DEFAULT_STEP_MS: f32 = 1000.0 / 60.0;

/// Bookkeeping reset whenever emission (re)starts
#[derive(Debug, Clone, Copy, Default, PartialEq)]
struct Counters {
    /// Time until the next flow emission
    flow: f32,
    /// Time spent emitting, checked against `duration`
    elapsed: f32,
    /// Particles emitted, checked against `stop_after`
    emitted: usize,
    /// Set while a `Complete` event is owed
    complete_armed: bool,
    zone_index: usize,
    zone_total: i32,
}

/// A pooled particle emitter
#[derive(Debug)]
pub struct Emitter {
    ops: EmitterOps,
    registry: CallbackRegistry,
    config: Map<String, Value>,
    rng: Rng,

    alive: VecDeque<Particle>,
    dead: Vec<Particle>,

    emit_zones: Vec<EmitZone>,
    death_zones: Vec<DeathZone>,
    processors: Vec<Box<dyn ParticleProcessor>>,
    bounds: Option<ParticleBounds>,

    emit_callback: Option<ParticleCallback>,
    death_callback: Option<ParticleCallback>,

    frames: FrameSelector,
    anims: FrameSelector,

    sort_property: Option<SortProperty>,
    sort_callback: Option<SortCallback>,

    follow: Option<Vec2>,
    follow_offset: Vec2,

    radial: bool,
    move_to: bool,
    acceleration: bool,
    emitting: bool,
    active: bool,
    frequency: f32,
    skipping: bool,
    counters: Counters,
    /// Particles fired over the emitter's lifetime
    fired: usize,
    events: Vec<EmitterEvent>,

    /// Constant force applied to every particle, in px/s²
    pub gravity: Vec2,
    /// Stop after emitting for this many ms; 0 emits forever
    pub duration: f32,
    /// Stop after emitting this many particles; 0 emits forever
    pub stop_after: usize,
    /// Cap on alive plus pooled particles; 0 is unlimited
    pub max_particles: usize,
    /// Cap on alive particles; 0 is unlimited
    pub max_alive_particles: usize,
    pub time_scale: f32,
    /// New particles go to the back of the alive list (drawn last) when set
    pub particle_bring_to_top: bool,
    /// Direction used with a sort property
    pub sort_order_asc: bool,
    pub blend_mode: String,
    pub name: String,
}

impl Default for Emitter {
    fn default() -> Self {
        Self::new(CallbackRegistry::new())
    }
}

impl Emitter {
    /// An emitting, radial emitter with default ops. Configuration loaded
    /// later resolves names against `registry`.
    pub fn new(registry: CallbackRegistry) -> Self {
        Self {
            ops: EmitterOps::default(),
            registry,
            config: Map::new(),
            rng: Rng::default(),
            alive: VecDeque::new(),
            dead: Vec::new(),
            emit_zones: Vec::new(),
            death_zones: Vec::new(),
            processors: Vec::new(),
            bounds: None,
            emit_callback: None,
            death_callback: None,
            frames: FrameSelector::default(),
            anims: FrameSelector::default(),
            sort_property: None,
            sort_callback: None,
            follow: None,
            follow_offset: Vec2::ZERO,
            radial: true,
            move_to: false,
            acceleration: false,
            emitting: true,
            active: true,
            frequency: 0.0,
            skipping: false,
            counters: Counters::default(),
            fired: 0,
            events: Vec::new(),
            gravity: Vec2::ZERO,
            duration: 0.0,
            stop_after: 0,
            max_particles: 0,
            max_alive_particles: 0,
            time_scale: 1.0,
            particle_bring_to_top: true,
            sort_order_asc: true,
            blend_mode: "NORMAL".to_string(),
            name: String::new(),
        }
    }

    /// Replace the random source, for reproducible runs
    pub fn with_rng(mut self, rng: Rng) -> Self {
        self.rng = rng;
        self
    }

    pub fn set_rng(&mut self, rng: Rng) {
        self.rng = rng;
    }

    // ------------------------------------------------------------------
    // Lifecycle
    // ------------------------------------------------------------------

    /// Start emitting. Does nothing if already emitting.
    ///
    /// `advance_ms` fast-forwards the simulation first; `duration_ms` stops
    /// emission again after that long.
    pub fn start(&mut self, advance_ms: f32, duration_ms: Option<f32>) -> &mut Self {
        if self.emitting {
            return self;
        }

        if advance_ms > 0.0 {
            self.fast_forward(advance_ms, None);
        }

        self.emitting = true;
        self.reset_counters(self.frequency, true);

        if let Some(duration) = duration_ms {
            self.duration = duration.abs();
        }

        debug!("emitter '{}' started, frequency {}", self.name, self.frequency);
        self.events.push(EmitterEvent::Start);
        self
    }

    /// Stop emitting, optionally killing every alive particle
    pub fn stop(&mut self, kill: bool) -> &mut Self {
        if !self.emitting {
            return self;
        }

        self.emitting = false;
        if kill {
            self.kill_all();
        }

        debug!("emitter '{}' stopped, {} alive", self.name, self.alive.len());
        self.events.push(EmitterEvent::Stop);
        self
    }

    /// Emit `quantity` particles (default 1) every `frequency` ms, stopping
    /// after `stop_after` particles when given.
    pub fn flow(&mut self, frequency: f32, quantity: Option<f32>, stop_after: Option<usize>) -> &mut Self {
        self.emitting = false;
        self.frequency = frequency;
        self.set_quantity(quantity.unwrap_or(1.0));

        if let Some(stop_after) = stop_after {
            self.stop_after = stop_after;
        }

        self.start(0.0, None)
    }

    /// Switch to explode mode and emit a burst right away.
    ///
    /// `count` defaults to the quantity op. Returns the last particle fired.
    pub fn explode(&mut self, count: Option<usize>, x: Option<f32>, y: Option<f32>) -> Option<&Particle> {
        self.frequency = -1.0;
        self.reset_counters(-1.0, true);

        let snapshot = self.emit_particle(count, x, y).cloned().map(Box::new);
        let fired = snapshot.is_some();

        debug!("emitter '{}' exploded, {} alive", self.name, self.alive.len());
        self.events.push(EmitterEvent::Explode { particle: snapshot });

        if fired {
            self.last_fired()
        } else {
            None
        }
    }

    pub fn pause(&mut self) -> &mut Self {
        self.active = false;
        self
    }

    pub fn resume(&mut self) -> &mut Self {
        self.active = true;
        self
    }

    /// Stop, drop every particle, zone, processor and callback, and stop
    /// accepting updates.
    pub fn destroy(&mut self) {
        debug!("emitter '{}' destroyed", self.name);
        self.emitting = false;
        self.active = false;
        self.alive.clear();
        self.dead.clear();
        self.emit_zones.clear();
        self.death_zones.clear();
        self.processors.clear();
        self.bounds = None;
        self.emit_callback = None;
        self.death_callback = None;
        self.sort_callback = None;
        self.follow = None;
        self.events.clear();
    }

    fn reset_counters(&mut self, frequency: f32, arm_complete: bool) {
        self.counters = Counters {
            flow: frequency,
            complete_armed: arm_complete,
            ..Counters::default()
        };
        self.frames.reset_counter();
        self.anims.reset_counter();
    }

    // ------------------------------------------------------------------
    // Simulation
    // ------------------------------------------------------------------

    /// Advance the emitter by `delta_ms`. Ignored while paused.
    pub fn update(&mut self, delta_ms: f32) {
        if !self.active {
            return;
        }
        self.step(delta_ms);
    }

    /// Simulate `time_ms` in increments of `step_ms` (default one 60 Hz
    /// frame) without counting it against `duration` or `stop_after`.
    pub fn fast_forward(&mut self, time_ms: f32, step_ms: Option<f32>) -> &mut Self {
        let step = step_ms.filter(|s| *s > 0.0).unwrap_or(DEFAULT_STEP_MS);
        let target = time_ms.abs();

        self.skipping = true;
        let mut total = 0.0;
        while total < target {
            self.step(step);
            total += step;
        }
        self.skipping = false;

        self
    }

    fn step(&mut self, delta_ms: f32) {
        let delta = delta_ms * self.time_scale;
        let step = delta / 1000.0;

        self.update_particles(delta, step);

        if !self.emitting && !self.skipping {
            if self.counters.complete_armed && self.alive.is_empty() {
                self.counters.complete_armed = false;
                debug!("emitter '{}' complete", self.name);
                self.events.push(EmitterEvent::Complete);
            }
            return;
        }

        if self.frequency == 0.0 {
            self.emit_particle(None, None, None);
        } else if self.frequency > 0.0 {
            self.counters.flow -= delta;
            while self.counters.flow <= 0.0 {
                self.emit_particle(None, None, None);
                // Carry the remainder into the next interval
                let next = self.counters.flow + self.frequency;
                if next == self.counters.flow {
                    // Interval below the counter's precision; drop the backlog
                    self.counters.flow = self.frequency;
                    break;
                }
                self.counters.flow = next;
            }
        }

        if !self.skipping {
            if self.duration > 0.0 {
                self.counters.elapsed += delta;
                if self.counters.elapsed >= self.duration {
                    self.stop(false);
                }
            }

            if self.stop_after > 0 && self.counters.emitted >= self.stop_after {
                self.stop(false);
            }
        }
    }

    fn update_particles(&mut self, delta: f32, step: f32) {
        if self.alive.is_empty() {
            return;
        }

        let mut ctx = UpdateContext {
            ops: &mut self.ops,
            gravity: self.gravity,
            move_to: self.move_to,
            bounds: self.bounds.as_ref(),
            death_zones: &self.death_zones,
            processors: &mut self.processors,
            events: &mut self.events,
        };

        let mut rip = Vec::new();
        self.alive.retain_mut(|particle| {
            if particle.update(&mut ctx, delta, step) {
                rip.push(std::mem::take(particle));
                false
            } else {
                true
            }
        });

        for mut particle in rip {
            if let Some(callback) = &self.death_callback {
                (callback.func)(&particle);
            }
            particle.set_position(0.0, 0.0);
            self.dead.push(particle);
        }

        self.depth_sort();
    }

    /// Fire `count` particles (default: the quantity op) from the pool.
    ///
    /// Spawns at the follow target when following, otherwise at `x`/`y`,
    /// offset by the current emit zone. Stops early at the particle limits
    /// or `stop_after`. Returns the last particle fired.
    pub fn emit_particle(&mut self, count: Option<usize>, x: Option<f32>, y: Option<f32>) -> Option<&Particle> {
        if self.at_limit() || self.stop_after_reached() {
            return None;
        }

        let count = match count {
            Some(count) => count,
            None => self.ops.quantity.emit(None, &mut self.rng, 1.0).max(0.0) as usize,
        };

        let (spawn_x, spawn_y) = match self.follow {
            Some(target) => (
                Some(target.x + self.follow_offset.x),
                Some(target.y + self.follow_offset.y),
            ),
            None => (x, y),
        };

        let mut fired = 0;
        for _ in 0..count {
            let mut particle = self.dead.pop().unwrap_or_else(|| {
                trace!("emitter '{}' pool grows to {}", self.name, self.alive.len() + 1);
                Particle::new()
            });

            let zone_point = self.next_zone_point();
            let frame = self.frames.next(&mut self.rng);
            let anim = self.anims.next(&mut self.rng);
            let mut ctx = FireContext {
                ops: &mut self.ops,
                rng: &mut self.rng,
                radial: self.radial,
                move_to: self.move_to,
                acceleration: self.acceleration,
                zone_point,
                frame,
                anim,
                index: self.fired,
                death_zones: &self.death_zones,
                events: &mut self.events,
            };

            if particle.fire(&mut ctx, spawn_x, spawn_y) {
                self.fired += 1;
                fired += 1;

                if let Some(callback) = &self.emit_callback {
                    (callback.func)(&particle);
                }

                if self.particle_bring_to_top {
                    self.alive.push_back(particle);
                } else {
                    self.alive.push_front(particle);
                }

                if self.stop_after > 0 {
                    self.counters.emitted += 1;
                    if self.stop_after_reached() {
                        break;
                    }
                }
            } else {
                // Spawned inside a death zone
                particle.set_position(0.0, 0.0);
                self.dead.push(particle);
            }

            if self.at_limit() {
                break;
            }
        }

        if fired == 0 {
            return None;
        }
        self.last_fired()
    }

    /// Fire `count` particles at `(x, y)`; see [`Emitter::emit_particle`]
    pub fn emit_particle_at(&mut self, x: f32, y: f32, count: Option<usize>) -> Option<&Particle> {
        self.emit_particle(count, Some(x), Some(y))
    }

    fn last_fired(&self) -> Option<&Particle> {
        if self.particle_bring_to_top {
            self.alive.back()
        } else {
            self.alive.front()
        }
    }

    fn stop_after_reached(&self) -> bool {
        self.stop_after > 0 && self.counters.emitted >= self.stop_after
    }

    /// Point from the current emit zone, handing over to the next zone once
    /// this one has served its `total`.
    fn next_zone_point(&mut self) -> Option<Vec2> {
        let len = self.emit_zones.len();
        let zone = self.emit_zones.get_mut(self.counters.zone_index)?;
        let point = zone.get_point(&mut self.rng);

        let total = zone.total();
        if total > 0 {
            self.counters.zone_total += 1;
            if self.counters.zone_total >= total {
                self.counters.zone_total = 0;
                self.counters.zone_index = (self.counters.zone_index + 1) % len;
            }
        }

        point
    }

    /// Zone the next particle will be spawned from
    pub fn current_emit_zone(&self) -> Option<&EmitZone> {
        self.emit_zones.get(self.counters.zone_index)
    }

    /// Index of the first death zone that would kill `particle`
    pub fn death_zone_for(&self, particle: &Particle) -> Option<usize> {
        self.death_zones
            .iter()
            .position(|zone| zone.will_kill(particle))
    }

    /// Pre-fill the dead pool, up to `max_particles` when that is set
    pub fn reserve(&mut self, count: usize) -> &mut Self {
        let count = if self.max_particles > 0 {
            count.min(self.max_particles.saturating_sub(self.particle_count()))
        } else {
            count
        };

        if count > 0 {
            trace!("emitter '{}' reserves {} particles", self.name, count);
            self.dead.extend((0..count).map(|_| Particle::new()));
        }
        self
    }

    /// Move every alive particle to the pool, without death callbacks
    pub fn kill_all(&mut self) -> &mut Self {
        while let Some(particle) = self.alive.pop_back() {
            self.dead.push(particle);
        }
        self
    }

    pub fn for_each_alive(&self, mut f: impl FnMut(&Particle)) {
        self.alive.iter().for_each(|p| f(p));
    }

    pub fn for_each_dead(&self, mut f: impl FnMut(&Particle)) {
        self.dead.iter().for_each(|p| f(p));
    }

    /// Alive particles in draw order
    pub fn alive(&self) -> impl Iterator<Item = &Particle> {
        self.alive.iter()
    }

    pub fn alive_count(&self) -> usize {
        self.alive.len()
    }

    pub fn dead_count(&self) -> usize {
        self.dead.len()
    }

    pub fn particle_count(&self) -> usize {
        self.alive.len() + self.dead.len()
    }

    /// True when either particle cap has been reached
    pub fn at_limit(&self) -> bool {
        (self.max_particles > 0 && self.particle_count() >= self.max_particles)
            || (self.max_alive_particles > 0 && self.alive.len() >= self.max_alive_particles)
    }

    /// Alive particles whose position lies inside `target`
    pub fn overlap<T: Contains + ?Sized>(&self, target: &T) -> Vec<&Particle> {
        self.alive
            .iter()
            .filter(|p| target.contains(p.pos.x, p.pos.y))
            .collect()
    }

    /// Reorder the alive list with the sort callback, or else by the sort
    /// property. Equal particles keep their order. Runs after every update.
    pub fn depth_sort(&mut self) -> &mut Self {
        let particles = self.alive.make_contiguous();
        if let Some(callback) = &self.sort_callback {
            particles.sort_by(|a, b| (callback.func)(a, b));
        } else if let Some(property) = self.sort_property {
            let ascending = self.sort_order_asc;
            particles.sort_by(|a, b| property.compare(a, b, ascending));
        }
        self
    }

    /// Keep the alive list ordered by `property`; `None` stops sorting
    pub fn set_sort_property(&mut self, property: Option<SortProperty>, ascending: bool) -> &mut Self {
        self.sort_property = property;
        self.sort_order_asc = ascending;
        self
    }

    /// Custom draw-order comparator, taking precedence over the sort
    /// property; `None` clears it
    pub fn set_sort_callback(&mut self, callback: Option<SortCallback>) -> &mut Self {
        self.sort_callback = callback;
        self
    }

    pub fn sort_property(&self) -> Option<SortProperty> {
        self.sort_property
    }

    pub fn sort_callback(&self) -> Option<&SortCallback> {
        self.sort_callback.as_ref()
    }

    /// Take every queued notification, oldest first
    pub fn drain_events(&mut self) -> Vec<EmitterEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn events(&self) -> &[EmitterEvent] {
        &self.events
    }

    // ------------------------------------------------------------------
    // Properties
    // ------------------------------------------------------------------

    pub fn is_emitting(&self) -> bool {
        self.emitting
    }

    /// False while paused
    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn is_radial(&self) -> bool {
        self.radial
    }

    pub fn has_move_to(&self) -> bool {
        self.move_to
    }

    pub fn has_acceleration(&self) -> bool {
        self.acceleration
    }

    pub fn frequency(&self) -> f32 {
        self.frequency
    }

    pub fn ops(&self) -> &EmitterOps {
        &self.ops
    }

    pub fn op(&self, key: OpKey) -> &ValueOp {
        self.ops.get(key)
    }

    pub fn registry(&self) -> &CallbackRegistry {
        &self.registry
    }

    /// Configure one property and refresh the derived motion flags
    pub fn set_op(&mut self, key: OpKey, config: OpConfig) -> &mut Self {
        self.ops.get_mut(key).set_config(config, self.registry.eases());
        self.refresh_motion_flags();
        self
    }

    fn refresh_motion_flags(&mut self) {
        self.move_to = self.ops.has_move_to();
        self.acceleration = self.ops.has_acceleration();
    }

    /// Set the flow interval; positive values also restart the flow timer
    pub fn set_frequency(&mut self, frequency: f32, quantity: Option<f32>) -> &mut Self {
        self.frequency = frequency;
        self.counters.flow = frequency.max(0.0);
        if let Some(quantity) = quantity {
            self.set_quantity(quantity);
        }
        self
    }

    pub fn set_quantity(&mut self, quantity: f32) -> &mut Self {
        self.set_op(OpKey::Quantity, OpConfig::Constant(quantity))
    }

    /// Radial speed; a distinct `y` gives an elliptical spread
    pub fn set_particle_speed(&mut self, x: f32, y: Option<f32>) -> &mut Self {
        self.set_op(OpKey::SpeedX, OpConfig::Constant(x));
        match y {
            Some(y) if y != x => {
                self.set_op(OpKey::SpeedY, OpConfig::Constant(y));
                self.ops.speed_y.set_active(true);
            }
            _ => self.ops.speed_y.set_active(false),
        }
        self.radial = true;
        self
    }

    pub fn set_particle_scale(&mut self, x: f32, y: Option<f32>) -> &mut Self {
        self.set_op(OpKey::ScaleX, OpConfig::Constant(x));
        let y = y.unwrap_or(x);
        self.set_op(OpKey::ScaleY, OpConfig::Constant(y));
        self.ops.scale_y.set_active(true);
        self
    }

    pub fn set_particle_gravity(&mut self, x: f32, y: f32) -> &mut Self {
        self.gravity = Vec2::new(x, y);
        self
    }

    pub fn set_particle_alpha(&mut self, config: OpConfig) -> &mut Self {
        self.set_op(OpKey::Alpha, config)
    }

    pub fn set_particle_tint(&mut self, config: OpConfig) -> &mut Self {
        self.set_op(OpKey::Tint, config)
    }

    pub fn set_emitter_angle(&mut self, config: OpConfig) -> &mut Self {
        self.set_op(OpKey::Angle, config)
    }

    pub fn set_particle_lifespan(&mut self, config: OpConfig) -> &mut Self {
        self.set_op(OpKey::Lifespan, config)
    }

    /// Radial emitters aim each particle along the `angle` op
    pub fn set_radial(&mut self, radial: bool) -> &mut Self {
        self.radial = radial;
        self
    }

    pub fn add_particle_bounds(&mut self, rect: Rectangle, left: bool, right: bool, top: bool, bottom: bool) -> &mut ParticleBounds {
        self.bounds
            .insert(ParticleBounds::new(rect).with_collisions(left, right, top, bottom))
    }

    pub fn bounds(&self) -> Option<&ParticleBounds> {
        self.bounds.as_ref()
    }

    pub fn remove_particle_bounds(&mut self) -> Option<ParticleBounds> {
        self.bounds.take()
    }

    // ------------------------------------------------------------------
    // Following
    // ------------------------------------------------------------------

    /// Spawn at `(x, y)` plus `offset` regardless of the coordinates passed
    /// to `emit_particle` or `explode`.
    pub fn start_follow(&mut self, x: f32, y: f32, offset: Vec2) -> &mut Self {
        self.follow = Some(Vec2::new(x, y));
        self.follow_offset = offset;
        self
    }

    /// Move the follow target; ignored when not following
    pub fn set_follow_position(&mut self, x: f32, y: f32) -> &mut Self {
        if let Some(target) = self.follow.as_mut() {
            *target = Vec2::new(x, y);
        }
        self
    }

    pub fn stop_follow(&mut self) -> &mut Self {
        self.follow = None;
        self.follow_offset = Vec2::ZERO;
        self
    }

    pub fn follow(&self) -> Option<Vec2> {
        self.follow
    }

    pub fn follow_offset(&self) -> Vec2 {
        self.follow_offset
    }

    // ------------------------------------------------------------------
    // Zones
    // ------------------------------------------------------------------

    /// Append an emit zone, returning its index
    pub fn add_emit_zone(&mut self, zone: impl Into<EmitZone>) -> usize {
        self.emit_zones.push(zone.into());
        self.emit_zones.len() - 1
    }

    pub fn remove_emit_zone(&mut self, index: usize) -> Option<EmitZone> {
        if index >= self.emit_zones.len() {
            return None;
        }
        self.counters.zone_index = 0;
        self.counters.zone_total = 0;
        Some(self.emit_zones.remove(index))
    }

    pub fn clear_emit_zones(&mut self) -> &mut Self {
        self.emit_zones.clear();
        self.counters.zone_index = 0;
        self.counters.zone_total = 0;
        self
    }

    /// Make the zone at `index` the current one; out of range is ignored
    pub fn set_emit_zone(&mut self, index: usize) -> &mut Self {
        if index < self.emit_zones.len() {
            self.counters.zone_index = index;
            self.counters.zone_total = 0;
        }
        self
    }

    pub fn emit_zones(&self) -> &[EmitZone] {
        &self.emit_zones
    }

    pub fn add_death_zone(&mut self, zone: impl Into<DeathZone>) -> usize {
        self.death_zones.push(zone.into());
        self.death_zones.len() - 1
    }

    pub fn remove_death_zone(&mut self, index: usize) -> Option<DeathZone> {
        (index < self.death_zones.len()).then(|| self.death_zones.remove(index))
    }

    pub fn clear_death_zones(&mut self) -> &mut Self {
        self.death_zones.clear();
        self
    }

    pub fn death_zones(&self) -> &[DeathZone] {
        &self.death_zones
    }

    // ------------------------------------------------------------------
    // Processors and callbacks
    // ------------------------------------------------------------------

    /// Append a processor, returning its index
    pub fn add_processor(&mut self, processor: impl ParticleProcessor + 'static) -> usize {
        self.processors.push(Box::new(processor));
        self.processors.len() - 1
    }

    pub fn remove_processor(&mut self, index: usize) -> Option<Box<dyn ParticleProcessor>> {
        (index < self.processors.len()).then(|| self.processors.remove(index))
    }

    pub fn create_gravity_well(&mut self, x: f32, y: f32, power: f32, epsilon: f32, gravity: f32) -> usize {
        self.add_processor(GravityWell::new(x, y, power, epsilon, gravity))
    }

    pub fn processors(&self) -> &[Box<dyn ParticleProcessor>] {
        &self.processors
    }

    pub fn processors_mut(&mut self) -> &mut [Box<dyn ParticleProcessor>] {
        &mut self.processors
    }

    /// Called with each particle right after it fires; `None` clears it
    pub fn on_particle_emit(&mut self, callback: Option<ParticleCallback>) -> &mut Self {
        self.emit_callback = callback;
        self
    }

    /// Called with each particle as it returns to the pool; `None` clears it
    pub fn on_particle_death(&mut self, callback: Option<ParticleCallback>) -> &mut Self {
        self.death_callback = callback;
        self
    }

    // ------------------------------------------------------------------
    // Frames
    // ------------------------------------------------------------------

    pub fn set_emitter_frame(&mut self, names: Vec<String>, pick_random: bool, quantity: usize) -> &mut Self {
        self.frames = FrameSelector::new(names, pick_random, quantity);
        self
    }

    pub fn set_anim(&mut self, names: Vec<String>, pick_random: bool, quantity: usize) -> &mut Self {
        self.anims = FrameSelector::new(names, pick_random, quantity);
        self
    }

    pub fn frames(&self) -> &FrameSelector {
        &self.frames
    }

    pub fn anims(&self) -> &FrameSelector {
        &self.anims
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{Circle, Line};
    use crate::zones::EdgeZone;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn emitter() -> Emitter {
        Emitter::default().with_rng(Rng::new(7))
    }

    fn counter() -> (Arc<AtomicUsize>, ParticleCallback) {
        let count = Arc::new(AtomicUsize::new(0));
        let inner = Arc::clone(&count);
        let callback = ParticleCallback::new(move |_| {
            inner.fetch_add(1, Ordering::SeqCst);
        });
        (count, callback)
    }

    #[test]
    fn test_explode_places_particles() {
        let mut e = emitter();
        let last = e.explode(Some(5), Some(100.0), Some(200.0)).cloned();
        assert_eq!(e.alive_count(), 5);
        e.for_each_alive(|p| assert_eq!(p.pos, Vec2::new(100.0, 200.0)));
        assert_eq!(last.map(|p| p.index), Some(4));
        assert!(matches!(
            e.drain_events().as_slice(),
            [EmitterEvent::Explode { particle: Some(_) }]
        ));
    }

    #[test]
    fn test_flow_emits_once_per_interval() {
        let mut e = emitter();
        let (count, callback) = counter();
        e.on_particle_emit(Some(callback));
        e.stop(false);
        e.flow(500.0, Some(1.0), None);

        for i in 1..=1000 {
            e.update(500.0);
            assert_eq!(count.load(Ordering::SeqCst), i);
        }
    }

    #[test]
    fn test_flow_carries_remainder() {
        let mut e = emitter();
        e.set_frequency(100.0, Some(1.0));
        e.update(250.0);
        assert_eq!(e.alive_count(), 2);
        e.update(50.0);
        assert_eq!(e.alive_count(), 3);
    }

    #[test]
    fn test_zero_frequency_emits_every_update() {
        let mut e = emitter();
        e.set_quantity(3.0);
        e.update(16.0);
        e.update(16.0);
        assert_eq!(e.alive_count(), 6);
    }

    #[test]
    fn test_pool_respects_max_particles() {
        let mut e = emitter();
        e.max_particles = 10;
        e.set_particle_lifespan(OpConfig::Constant(50.0));
        e.set_quantity(4.0);

        let mut previous = 0;
        for _ in 0..100 {
            e.update(16.0);
            let total = e.particle_count();
            assert!(total <= 10);
            assert!(total >= previous);
            previous = total;
        }
        assert!(e.at_limit());
    }

    #[test]
    fn test_max_alive_particles() {
        let mut e = emitter();
        e.max_alive_particles = 3;
        e.explode(Some(10), None, None);
        assert_eq!(e.alive_count(), 3);
        assert!(e.at_limit());
        assert!(e.emit_particle(Some(1), None, None).is_none());
    }

    #[test]
    fn test_dead_particles_recycle() {
        let mut e = emitter();
        let (deaths, callback) = counter();
        e.on_particle_death(Some(callback));
        e.set_particle_lifespan(OpConfig::Constant(100.0));
        e.explode(Some(4), Some(30.0), Some(30.0));

        e.update(100.0);
        assert_eq!(e.alive_count(), 0);
        assert_eq!(e.dead_count(), 4);
        assert_eq!(deaths.load(Ordering::SeqCst), 4);
        e.for_each_dead(|p| assert_eq!(p.pos, Vec2::ZERO));

        e.explode(Some(2), None, None);
        assert_eq!(e.dead_count(), 2);
        assert_eq!(e.particle_count(), 4);
    }

    #[test]
    fn test_death_zone_reports_once() {
        let mut e = emitter();
        let (deaths, callback) = counter();
        e.on_particle_death(Some(callback));
        e.add_death_zone(DeathZone::on_enter(Circle::new(0.0, 0.0, 50.0).into()));
        e.set_radial(false);
        e.set_op(OpKey::SpeedX, OpConfig::Constant(-1000.0));
        e.explode(Some(1), Some(60.0), Some(0.0));
        assert_eq!(e.alive_count(), 1);
        e.drain_events();

        e.update(16.0);
        assert_eq!(e.alive_count(), 0);
        assert_eq!(deaths.load(Ordering::SeqCst), 1);
        e.update(16.0);
        assert_eq!(deaths.load(Ordering::SeqCst), 1);

        let events = e.drain_events();
        let zone_events = events
            .iter()
            .filter(|ev| matches!(ev, EmitterEvent::DeathZone { zone: 0, .. }))
            .count();
        assert_eq!(zone_events, 1);
    }

    #[test]
    fn test_spawn_inside_death_zone_is_recycled() {
        let mut e = emitter();
        let (deaths, on_death) = counter();
        let (emits, on_emit) = counter();
        e.on_particle_death(Some(on_death));
        e.on_particle_emit(Some(on_emit));
        e.stop_after = 2;
        e.add_death_zone(DeathZone::on_enter(Circle::new(0.0, 0.0, 50.0).into()));

        assert!(e.explode(Some(3), Some(0.0), Some(0.0)).is_none());
        assert_eq!(e.alive_count(), 0);
        assert_eq!(e.dead_count(), 1);
        assert_eq!(emits.load(Ordering::SeqCst), 0);

        e.update(16.0);
        assert_eq!(deaths.load(Ordering::SeqCst), 0);

        let zone_events = e
            .drain_events()
            .iter()
            .filter(|ev| matches!(ev, EmitterEvent::DeathZone { .. }))
            .count();
        assert_eq!(zone_events, 3);

        // Rejected spawns do not count towards stop_after
        assert_eq!(e.emit_particle_at(100.0, 0.0, Some(2)).map(|p| p.pos.x), Some(100.0));
        assert_eq!(e.alive_count(), 2);
    }

    #[test]
    fn test_complete_fires_once() {
        let mut e = emitter();
        e.set_particle_lifespan(OpConfig::Constant(100.0));
        e.explode(Some(3), None, None);
        e.stop(false);
        e.drain_events();

        for _ in 0..10 {
            e.update(50.0);
        }
        let completes = e
            .drain_events()
            .into_iter()
            .filter(|ev| *ev == EmitterEvent::Complete)
            .count();
        assert_eq!(completes, 1);
    }

    #[test]
    fn test_start_and_stop_are_idempotent() {
        let mut e = emitter();
        e.start(0.0, None);
        assert!(e.events().is_empty());
        e.stop(true);
        e.stop(true);
        e.start(0.0, Some(-200.0));
        assert_eq!(e.duration, 200.0);
        let names: Vec<_> = e.drain_events().iter().map(EmitterEvent::name).collect();
        assert_eq!(names, vec!["emitterstop", "emitterstart"]);
    }

    #[test]
    fn test_duration_stops_emission() {
        let mut e = emitter();
        e.stop(false);
        e.set_frequency(10.0, None);
        e.start(0.0, Some(100.0));
        for _ in 0..5 {
            e.update(25.0);
        }
        assert!(!e.is_emitting());
        let alive = e.alive_count();
        e.update(25.0);
        assert_eq!(e.alive_count(), alive);
    }

    #[test]
    fn test_stop_after() {
        let mut e = emitter();
        e.stop(false);
        e.flow(10.0, Some(2.0), Some(5));
        for _ in 0..20 {
            e.update(10.0);
        }
        assert_eq!(e.alive_count(), 5);
        assert!(!e.is_emitting());
    }

    #[test]
    fn test_flow_with_negligible_frequency_terminates() {
        let mut e = emitter();
        e.flow(1e-12, Some(1.0), None);
        e.update(16.0);
        e.update(16.0);
        assert_eq!(e.alive_count(), 2);
    }

    #[test]
    fn test_paused_emitter_ignores_updates() {
        let mut e = emitter();
        e.pause();
        e.update(16.0);
        assert_eq!(e.alive_count(), 0);
        e.resume();
        e.update(16.0);
        assert_eq!(e.alive_count(), 1);
    }

    #[test]
    fn test_fast_forward_skips_bookkeeping() {
        let mut e = emitter();
        e.stop(false);
        e.set_frequency(100.0, None);
        e.start(1000.0, Some(500.0));
        assert!(e.is_emitting());
        assert!(e.alive_count() >= 8);
    }

    #[test]
    fn test_reserve_truncates_to_limit() {
        let mut e = emitter();
        e.max_particles = 8;
        e.explode(Some(3), None, None);
        e.reserve(100);
        assert_eq!(e.dead_count(), 5);
        assert_eq!(e.particle_count(), 8);
    }

    #[test]
    fn test_emit_zones_round_robin() {
        let mut e = emitter();
        let mut first = EmitZone::from(EdgeZone::new(Line::new(0.0, 0.0, 0.0, 0.0).into(), 1, 0.0));
        if let EmitZone::Edge(zone) = &mut first {
            zone.total = 2;
        }
        e.add_emit_zone(first);
        e.add_emit_zone(EdgeZone::new(Line::new(50.0, 0.0, 50.0, 0.0).into(), 1, 0.0));

        e.explode(Some(5), None, None);
        let xs: Vec<f32> = e.alive().map(|p| p.pos.x).collect();
        assert_eq!(xs, vec![0.0, 0.0, 50.0, 0.0, 0.0]);
    }

    #[test]
    fn test_follow_overrides_coordinates() {
        let mut e = emitter();
        e.start_follow(10.0, 20.0, Vec2::new(1.0, 2.0));
        e.explode(Some(1), Some(500.0), Some(500.0));
        assert_eq!(e.alive().next().map(|p| p.pos), Some(Vec2::new(11.0, 22.0)));

        e.set_follow_position(0.0, 0.0);
        e.stop_follow();
        e.explode(Some(1), Some(5.0), Some(5.0));
        assert_eq!(e.alive().last().map(|p| p.pos), Some(Vec2::new(5.0, 5.0)));
    }

    #[test]
    fn test_bring_to_top_order() {
        let mut e = emitter();
        e.particle_bring_to_top = false;
        e.explode(Some(3), None, None);
        let order: Vec<usize> = e.alive().map(|p| p.index).collect();
        assert_eq!(order, vec![2, 1, 0]);
    }

    #[test]
    fn test_depth_sort_by_property() {
        let mut e = emitter();
        e.set_op(OpKey::Y, OpConfig::stepped(30.0, 0.0, 3, false));
        e.explode(Some(3), None, None);
        let ys = |e: &Emitter| e.alive().map(|p| p.pos.y).collect::<Vec<_>>();
        assert_eq!(ys(&e), vec![30.0, 20.0, 10.0]);

        e.set_sort_property(Some(SortProperty::Y), true);
        e.update(1.0);
        assert_eq!(ys(&e), vec![10.0, 20.0, 30.0]);

        e.set_sort_property(Some(SortProperty::Y), false).depth_sort();
        assert_eq!(ys(&e), vec![30.0, 20.0, 10.0]);
    }

    #[test]
    fn test_sort_callback_wins_over_property() {
        let mut e = emitter();
        e.set_sort_property(Some(SortProperty::Index), true);
        e.set_sort_callback(Some(SortCallback::new(|a, b| b.index.cmp(&a.index))));
        e.explode(Some(3), None, None);
        e.update(1.0);
        let order: Vec<usize> = e.alive().map(|p| p.index).collect();
        assert_eq!(order, vec![2, 1, 0]);
    }

    #[test]
    fn test_overlap() {
        let mut e = emitter();
        e.set_op(OpKey::X, OpConfig::stepped(0.0, 300.0, 3, false));
        e.explode(Some(3), None, None);

        let hits: Vec<f32> = e
            .overlap(&Rectangle::new(50.0, -10.0, 200.0, 20.0))
            .iter()
            .map(|p| p.pos.x)
            .collect();
        assert_eq!(hits, vec![100.0, 200.0]);
        assert_eq!(e.overlap(&Circle::new(0.0, 0.0, 1.0)).len(), 1);
    }

    #[test]
    fn test_zone_queries() {
        let mut e = emitter();
        assert!(e.current_emit_zone().is_none());
        e.add_emit_zone(EdgeZone::new(Line::new(0.0, 0.0, 10.0, 0.0).into(), 2, 0.0));
        assert!(e.current_emit_zone().is_some());

        e.add_death_zone(DeathZone::on_enter(Circle::new(0.0, 0.0, 5.0).into()));
        e.add_death_zone(DeathZone::on_leave(Circle::new(0.0, 0.0, 100.0).into()));
        let mut p = Particle::new();
        p.set_position(1.0, 0.0);
        assert_eq!(e.death_zone_for(&p), Some(0));
        p.set_position(50.0, 0.0);
        assert_eq!(e.death_zone_for(&p), None);
        p.set_position(200.0, 0.0);
        assert_eq!(e.death_zone_for(&p), Some(1));
    }

    #[test]
    fn test_gravity_well_processor() {
        let mut e = emitter();
        let index = e.create_gravity_well(100.0, 0.0, 1.0, 100.0, 50.0);
        assert_eq!(e.processors()[index].name(), "GravityWell");
        e.explode(Some(1), None, None);
        e.update(16.0);
        assert!(e.alive().all(|p| p.vel.x > 0.0));
        assert!(e.remove_processor(index).is_some());
        assert!(e.processors().is_empty());
    }

    #[test]
    fn test_frames_assigned_on_fire() {
        let mut e = emitter();
        e.set_emitter_frame(vec!["a".into(), "b".into()], false, 1);
        e.explode(Some(3), None, None);
        let frames: Vec<_> = e.alive().map(|p| p.frame.clone()).collect();
        assert_eq!(
            frames,
            vec![Some("a".to_string()), Some("b".to_string()), Some("a".to_string())]
        );
    }

    #[test]
    fn test_destroy_clears_everything() {
        let mut e = emitter();
        e.explode(Some(3), None, None);
        e.add_death_zone(DeathZone::on_leave(Circle::new(0.0, 0.0, 1.0).into()));
        e.destroy();
        assert_eq!(e.particle_count(), 0);
        assert!(e.death_zones().is_empty());
        assert!(!e.is_active());
        e.update(16.0);
        assert_eq!(e.alive_count(), 0);
    }
}
