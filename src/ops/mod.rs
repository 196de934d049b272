//! Per-property value generators
//!
//! Every animated particle property is driven by a [`ValueOp`]. An op is
//! configured with an [`OpConfig`] and from it derives two behaviors: the
//! value handed to a particle when it is fired, and the value it takes on
//! each update tick as it ages.

mod callbacks;
mod color;
mod config;

pub use callbacks::{
    CallbackRegistry, EmitCallback, EmitFn, Named, ParticleCallback, ParticleFn, SortCallback,
    SortFn, UpdateCallback, UpdateFn,
};
pub use color::ColorOp;
pub use config::{OpConfig, OpMethod};

pub(crate) use config::number as number_json;

use crate::ease::{Ease, EaseRegistry, Interpolation};
use crate::particle::{Anchor, Particle};
use crate::util::Rng;
use serde_json::{Map, Value};
use std::fmt;

/// Identity of each op-driven particle property
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OpKey {
    X,
    Y,
    AccelerationX,
    AccelerationY,
    MaxVelocityX,
    MaxVelocityY,
    SpeedX,
    SpeedY,
    MoveToX,
    MoveToY,
    Bounce,
    ScaleX,
    ScaleY,
    Tint,
    Alpha,
    Lifespan,
    Angle,
    Rotate,
    Quantity,
    Delay,
    Hold,
}

impl OpKey {
    pub const COUNT: usize = 21;

    pub const ALL: [Self; Self::COUNT] = [
        Self::X,
        Self::Y,
        Self::AccelerationX,
        Self::AccelerationY,
        Self::MaxVelocityX,
        Self::MaxVelocityY,
        Self::SpeedX,
        Self::SpeedY,
        Self::MoveToX,
        Self::MoveToY,
        Self::Bounce,
        Self::ScaleX,
        Self::ScaleY,
        Self::Tint,
        Self::Alpha,
        Self::Lifespan,
        Self::Angle,
        Self::Rotate,
        Self::Quantity,
        Self::Delay,
        Self::Hold,
    ];

    /// Configuration key for this property
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::X => "x",
            Self::Y => "y",
            Self::AccelerationX => "accelerationX",
            Self::AccelerationY => "accelerationY",
            Self::MaxVelocityX => "maxVelocityX",
            Self::MaxVelocityY => "maxVelocityY",
            Self::SpeedX => "speedX",
            Self::SpeedY => "speedY",
            Self::MoveToX => "moveToX",
            Self::MoveToY => "moveToY",
            Self::Bounce => "bounce",
            Self::ScaleX => "scaleX",
            Self::ScaleY => "scaleY",
            Self::Tint => "tint",
            Self::Alpha => "alpha",
            Self::Lifespan => "lifespan",
            Self::Angle => "angle",
            Self::Rotate => "rotate",
            Self::Quantity => "quantity",
            Self::Delay => "delay",
            Self::Hold => "hold",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.as_str() == name)
    }

    #[inline]
    pub const fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for OpKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Travel direction of a yoyo stepped op
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum StepDirection {
    #[default]
    Up,
    Down,
}

#[derive(Clone)]
enum EmitBehavior {
    Passthrough,
    Static,
    RandomElement,
    Stepped,
    EasedStart,
    RandomFloat,
    RandomInt,
    FirstValue,
    Callback(EmitFn),
}

#[derive(Clone)]
enum UpdateBehavior {
    Passthrough,
    Eased,
    Interpolated,
    Callback(UpdateFn),
}

/// One property's value generator
#[derive(Clone)]
pub struct ValueOp {
    key: OpKey,
    config: OpConfig,
    default_config: OpConfig,
    method: OpMethod,
    start: f32,
    end: f32,
    steps: u32,
    /// Stepped slot index in `0..steps`
    counter: u32,
    direction: StepDirection,
    yoyo: bool,
    values: Vec<f32>,
    ease: Ease,
    interpolation: Interpolation,
    emit: EmitBehavior,
    update: UpdateBehavior,
    current: f32,
    active: bool,
    emit_only: bool,
}

impl ValueOp {
    /// Create an op resolved to its default configuration.
    ///
    /// Emit-only ops never change a particle after it is fired.
    pub fn new(key: OpKey, default_config: OpConfig, emit_only: bool) -> Self {
        let mut op = Self {
            key,
            config: default_config.clone(),
            default_config,
            method: OpMethod::Identity,
            start: 0.0,
            end: 0.0,
            steps: 0,
            counter: 0,
            direction: StepDirection::Up,
            yoyo: false,
            values: Vec::new(),
            ease: Ease::linear(),
            interpolation: Interpolation::Linear,
            emit: EmitBehavior::Passthrough,
            update: UpdateBehavior::Passthrough,
            current: 0.0,
            active: true,
            emit_only,
        };
        op.resolve(&EaseRegistry::new());
        op
    }

    /// Load this op's key from a configuration object, falling back to the
    /// default when the key is absent. Always re-resolves.
    pub fn load(&mut self, config: &Map<String, Value>, registry: &CallbackRegistry) {
        self.load_as(config, self.key.as_str(), registry);
    }

    /// Load from an aliased key such as `speed` or `scale`
    pub fn load_as(&mut self, config: &Map<String, Value>, name: &str, registry: &CallbackRegistry) {
        self.config = match config.get(name) {
            Some(value) => OpConfig::classify(value, name, registry),
            None => self.default_config.clone(),
        };
        self.resolve(registry.eases());
    }

    /// Replace the configuration.
    ///
    /// An unchanged configuration keeps its resolved state (stepped counters
    /// included), except for bare callbacks which always re-resolve.
    pub fn set_config(&mut self, config: OpConfig, eases: &EaseRegistry) {
        if config == self.config && config.method() != OpMethod::Callback {
            return;
        }
        self.config = config;
        self.resolve(eases);
    }

    /// Re-derive the method and both behaviors from the configuration
    pub fn resolve(&mut self, eases: &EaseRegistry) {
        let mut emit = EmitBehavior::Passthrough;
        let mut update = UpdateBehavior::Passthrough;
        let mut current = self.current;

        self.method = self.config.method();

        match &self.config {
            OpConfig::Identity => {}
            OpConfig::Constant(v) => {
                emit = EmitBehavior::Static;
                current = *v;
            }
            OpConfig::RandomArray(values) => {
                self.values.clone_from(values);
                emit = EmitBehavior::RandomElement;
                current = values.first().copied().unwrap_or_default();
            }
            OpConfig::Callback(cb) => {
                emit = EmitBehavior::Callback(cb.func.clone());
            }
            OpConfig::Stepped {
                start,
                end,
                steps,
                yoyo,
            } => {
                self.start = *start;
                self.end = *end;
                self.steps = (*steps).max(1);
                self.counter = 0;
                self.yoyo = *yoyo;
                self.direction = StepDirection::Up;
                emit = EmitBehavior::Stepped;
                current = *start;
            }
            OpConfig::Eased {
                start,
                end,
                ease,
                ease_params,
                random,
            } => {
                self.start = *start;
                self.end = *end;
                self.ease = eases.ease(ease.as_deref().unwrap_or("Linear"), ease_params);
                emit = if *random {
                    EmitBehavior::RandomFloat
                } else {
                    EmitBehavior::EasedStart
                };
                update = UpdateBehavior::Eased;
                current = *start;
            }
            OpConfig::MinMax { min, max, int } => {
                self.start = *min;
                self.end = *max;
                emit = if *int {
                    EmitBehavior::RandomInt
                } else {
                    EmitBehavior::RandomFloat
                };
                current = *min;
            }
            OpConfig::RandomRange { min, max } => {
                self.start = *min;
                self.end = *max;
                emit = EmitBehavior::RandomFloat;
                current = *min;
            }
            OpConfig::Custom { on_emit, on_update } => {
                if let Some(cb) = on_emit {
                    emit = EmitBehavior::Callback(cb.func.clone());
                }
                if let Some(cb) = on_update {
                    update = UpdateBehavior::Callback(cb.func.clone());
                }
            }
            OpConfig::Interpolated {
                values,
                interpolation,
                ease,
                ease_params,
            } => {
                self.values.clone_from(values);
                self.start = values.first().copied().unwrap_or_default();
                self.end = values.last().copied().unwrap_or_default();
                self.ease = eases.ease(ease.as_deref().unwrap_or("Linear"), ease_params);
                self.interpolation =
                    eases.interpolation(interpolation.as_deref().unwrap_or("linear"));
                emit = EmitBehavior::FirstValue;
                update = UpdateBehavior::Interpolated;
                current = self.start;
            }
        }

        if self.emit_only {
            update = UpdateBehavior::Passthrough;
        }

        self.emit = emit;
        self.update = update;
        self.current = current;
    }

    /// Value for a particle being fired. `value` is the particle's current
    /// value for this property, passed through by identity behaviors.
    pub fn emit(&mut self, particle: Option<&mut Particle>, rng: &mut Rng, value: f32) -> f32 {
        let key = self.key;
        let result = match self.emit {
            EmitBehavior::Passthrough => return value,
            EmitBehavior::Static => self.current,
            EmitBehavior::RandomElement => rng.pick(&self.values).copied().unwrap_or(value),
            EmitBehavior::Stepped => self.advance_step(),
            EmitBehavior::EasedStart => {
                if let Some(p) = particle {
                    *p.anchor_mut(key) = Anchor::new(self.start, self.end);
                }
                self.start
            }
            EmitBehavior::RandomFloat => {
                let v = rng.range_f32(self.start, self.end);
                if let Some(p) = particle {
                    *p.anchor_mut(key) = Anchor::new(v, self.end);
                }
                v
            }
            EmitBehavior::RandomInt => {
                let v = rng.range_i32(self.start.round() as i32, self.end.round() as i32) as f32;
                if let Some(p) = particle {
                    *p.anchor_mut(key) = Anchor::new(v, self.end);
                }
                v
            }
            EmitBehavior::FirstValue => {
                if let Some(p) = particle {
                    *p.anchor_mut(key) = Anchor::new(self.start, self.end);
                }
                self.start
            }
            EmitBehavior::Callback(ref f) => f(particle.as_deref(), key.as_str(), value),
        };
        self.current = result;
        result
    }

    /// Value for a particle at normalized age `t`
    pub fn update(&mut self, particle: &Particle, t: f32, value: f32) -> f32 {
        let result = match self.update {
            UpdateBehavior::Passthrough => return value,
            UpdateBehavior::Eased => {
                let anchor = particle.anchor(self.key);
                (anchor.max - anchor.min) * self.ease.apply(t) + anchor.min
            }
            UpdateBehavior::Interpolated => {
                let v = self.ease.apply(t);
                self.interpolation.apply(&self.values, v)
            }
            UpdateBehavior::Callback(ref f) => f(particle, self.key.as_str(), t, value),
        };
        self.current = result;
        result
    }

    /// Return the counter's value, then move it one slot
    fn advance_step(&mut self) -> f32 {
        let steps = self.steps.max(1);
        let step = (self.end - self.start) / steps as f32;
        let current = self.start + self.counter as f32 * step;

        if !self.yoyo {
            self.counter = (self.counter + 1) % steps;
            return current;
        }

        match self.direction {
            StepDirection::Up => {
                let next = self.counter + 1;
                if next >= steps {
                    // Mirror the overshoot back from the last slot
                    let over = next - steps;
                    self.counter = (steps - 1).saturating_sub(over);
                    self.direction = StepDirection::Down;
                } else {
                    self.counter = next;
                }
            }
            StepDirection::Down => {
                if self.counter == 0 {
                    self.direction = StepDirection::Up;
                } else {
                    self.counter -= 1;
                }
            }
        }

        current
    }

    /// Nudge the current value from outside, keeping it consistent with the
    /// method: stepped ops snap to their grid, ranged ops clamp.
    pub fn on_change(&mut self, value: f32) {
        match self.method {
            OpMethod::Constant | OpMethod::Callback | OpMethod::CustomCallbacks => {
                self.current = value;
            }
            OpMethod::RandomArray => {
                if self.values.contains(&value) {
                    self.current = value;
                }
            }
            OpMethod::Stepped => {
                let steps = self.steps.max(1);
                let step = (self.end - self.start) / steps as f32;
                let slot = if step == 0.0 {
                    0.0
                } else {
                    ((value - self.start) / step).round()
                };
                self.counter = slot.clamp(0.0, (steps - 1) as f32) as u32;
                self.current = self.start + self.counter as f32 * step;
            }
            OpMethod::Eased | OpMethod::MinMax | OpMethod::RandomRange => {
                let (lo, hi) = if self.start <= self.end {
                    (self.start, self.end)
                } else {
                    (self.end, self.start)
                };
                self.current = value.clamp(lo, hi);
            }
            OpMethod::Interpolated => {
                self.current = self.values.first().copied().unwrap_or_default();
            }
            OpMethod::Identity => {}
        }
    }

    pub fn key(&self) -> OpKey {
        self.key
    }

    pub fn config(&self) -> &OpConfig {
        &self.config
    }

    pub fn method(&self) -> OpMethod {
        self.method
    }

    /// Most recently produced value
    pub fn current(&self) -> f32 {
        self.current
    }

    pub fn start(&self) -> f32 {
        self.start
    }

    pub fn end(&self) -> f32 {
        self.end
    }

    pub fn steps(&self) -> u32 {
        self.steps
    }

    pub fn direction(&self) -> StepDirection {
        self.direction
    }

    pub fn ease(&self) -> &Ease {
        &self.ease
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn set_active(&mut self, active: bool) {
        self.active = active;
    }

    pub fn is_emit_only(&self) -> bool {
        self.emit_only
    }

    /// True when the op is unset or a constant zero
    pub fn is_zero(&self) -> bool {
        match self.config {
            OpConfig::Identity => true,
            OpConfig::Constant(v) => v == 0.0,
            _ => false,
        }
    }

    pub fn to_json(&self) -> Value {
        self.config.to_json()
    }
}

impl fmt::Debug for ValueOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ValueOp")
            .field("key", &self.key)
            .field("method", &self.method)
            .field("config", &self.config)
            .field("current", &self.current)
            .field("active", &self.active)
            .finish_non_exhaustive()
    }
}

/// The full set of ops an emitter drives its particles with
#[derive(Debug, Clone)]
pub struct EmitterOps {
    pub x: ValueOp,
    pub y: ValueOp,
    pub acceleration_x: ValueOp,
    pub acceleration_y: ValueOp,
    pub max_velocity_x: ValueOp,
    pub max_velocity_y: ValueOp,
    pub speed_x: ValueOp,
    pub speed_y: ValueOp,
    pub move_to_x: ValueOp,
    pub move_to_y: ValueOp,
    pub bounce: ValueOp,
    pub scale_x: ValueOp,
    pub scale_y: ValueOp,
    pub tint: ValueOp,
    pub alpha: ValueOp,
    pub lifespan: ValueOp,
    pub angle: ValueOp,
    pub rotate: ValueOp,
    pub quantity: ValueOp,
    pub delay: ValueOp,
    /// Time a particle lingers, fully aged, after its lifespan runs out
    pub hold: ValueOp,
    /// Overrides `tint` while it holds any colors
    pub color: ColorOp,
}

impl Default for EmitterOps {
    fn default() -> Self {
        use OpKey as K;
        let op = |key, default: OpConfig| ValueOp::new(key, default, false);
        let emit_only = |key, default: OpConfig| ValueOp::new(key, default, true);

        Self {
            x: op(K::X, OpConfig::Constant(0.0)),
            y: op(K::Y, OpConfig::Constant(0.0)),
            acceleration_x: op(K::AccelerationX, OpConfig::Constant(0.0)),
            acceleration_y: op(K::AccelerationY, OpConfig::Constant(0.0)),
            max_velocity_x: op(K::MaxVelocityX, OpConfig::Constant(10_000.0)),
            max_velocity_y: op(K::MaxVelocityY, OpConfig::Constant(10_000.0)),
            speed_x: emit_only(K::SpeedX, OpConfig::Constant(0.0)),
            speed_y: emit_only(K::SpeedY, OpConfig::Constant(0.0)),
            move_to_x: op(K::MoveToX, OpConfig::Identity),
            move_to_y: op(K::MoveToY, OpConfig::Identity),
            bounce: op(K::Bounce, OpConfig::Constant(0.0)),
            scale_x: op(K::ScaleX, OpConfig::Constant(1.0)),
            scale_y: op(K::ScaleY, OpConfig::Constant(1.0)),
            tint: op(K::Tint, OpConfig::Constant(16_777_215.0)),
            alpha: op(K::Alpha, OpConfig::Constant(1.0)),
            lifespan: emit_only(K::Lifespan, OpConfig::Constant(1000.0)),
            angle: emit_only(K::Angle, OpConfig::range(0.0, 360.0)),
            rotate: op(K::Rotate, OpConfig::Constant(0.0)),
            quantity: emit_only(K::Quantity, OpConfig::Constant(1.0)),
            delay: emit_only(K::Delay, OpConfig::Constant(0.0)),
            hold: emit_only(K::Hold, OpConfig::Constant(0.0)),
            color: ColorOp::new(),
        }
    }
}

impl EmitterOps {
    pub fn get(&self, key: OpKey) -> &ValueOp {
        match key {
            OpKey::X => &self.x,
            OpKey::Y => &self.y,
            OpKey::AccelerationX => &self.acceleration_x,
            OpKey::AccelerationY => &self.acceleration_y,
            OpKey::MaxVelocityX => &self.max_velocity_x,
            OpKey::MaxVelocityY => &self.max_velocity_y,
            OpKey::SpeedX => &self.speed_x,
            OpKey::SpeedY => &self.speed_y,
            OpKey::MoveToX => &self.move_to_x,
            OpKey::MoveToY => &self.move_to_y,
            OpKey::Bounce => &self.bounce,
            OpKey::ScaleX => &self.scale_x,
            OpKey::ScaleY => &self.scale_y,
            OpKey::Tint => &self.tint,
            OpKey::Alpha => &self.alpha,
            OpKey::Lifespan => &self.lifespan,
            OpKey::Angle => &self.angle,
            OpKey::Rotate => &self.rotate,
            OpKey::Quantity => &self.quantity,
            OpKey::Delay => &self.delay,
            OpKey::Hold => &self.hold,
        }
    }

    pub fn get_mut(&mut self, key: OpKey) -> &mut ValueOp {
        match key {
            OpKey::X => &mut self.x,
            OpKey::Y => &mut self.y,
            OpKey::AccelerationX => &mut self.acceleration_x,
            OpKey::AccelerationY => &mut self.acceleration_y,
            OpKey::MaxVelocityX => &mut self.max_velocity_x,
            OpKey::MaxVelocityY => &mut self.max_velocity_y,
            OpKey::SpeedX => &mut self.speed_x,
            OpKey::SpeedY => &mut self.speed_y,
            OpKey::MoveToX => &mut self.move_to_x,
            OpKey::MoveToY => &mut self.move_to_y,
            OpKey::Bounce => &mut self.bounce,
            OpKey::ScaleX => &mut self.scale_x,
            OpKey::ScaleY => &mut self.scale_y,
            OpKey::Tint => &mut self.tint,
            OpKey::Alpha => &mut self.alpha,
            OpKey::Lifespan => &mut self.lifespan,
            OpKey::Angle => &mut self.angle,
            OpKey::Rotate => &mut self.rotate,
            OpKey::Quantity => &mut self.quantity,
            OpKey::Delay => &mut self.delay,
            OpKey::Hold => &mut self.hold,
        }
    }

    /// Ops in configuration key order
    pub fn iter(&self) -> impl Iterator<Item = &ValueOp> {
        OpKey::ALL.into_iter().map(move |k| self.get(k))
    }

    /// Load every op from a configuration object; absent keys reset to
    /// their defaults.
    pub fn load(&mut self, config: &Map<String, Value>, registry: &CallbackRegistry) {
        for key in OpKey::ALL {
            self.get_mut(key).load(config, registry);
        }
        self.color.load(config, registry);
    }

    /// Particles move towards a target when both target ops are set
    pub fn has_move_to(&self) -> bool {
        self.move_to_x.method() != OpMethod::Identity && self.move_to_y.method() != OpMethod::Identity
    }

    pub fn has_acceleration(&self) -> bool {
        !(self.acceleration_x.is_zero() && self.acceleration_y.is_zero())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::util::Rng;
    use proptest::prelude::*;
    use serde_json::json;

    fn op_with(config: OpConfig) -> ValueOp {
        let mut op = ValueOp::new(OpKey::Alpha, OpConfig::Identity, false);
        op.set_config(config, &EaseRegistry::new());
        op
    }

    fn emit_n(op: &mut ValueOp, n: usize) -> Vec<f32> {
        let mut rng = Rng::new(1);
        (0..n).map(|_| op.emit(None, &mut rng, 0.0)).collect()
    }

    #[test]
    fn test_identity_passes_through() {
        let mut op = op_with(OpConfig::Identity);
        let mut rng = Rng::new(1);
        let p = Particle::default();
        assert_eq!(op.emit(None, &mut rng, 7.0), 7.0);
        assert_eq!(op.update(&p, 0.5, 3.0), 3.0);
    }

    #[test]
    fn test_constant_emits_current() {
        let mut op = op_with(OpConfig::Constant(4.0));
        assert_eq!(emit_n(&mut op, 3), vec![4.0, 4.0, 4.0]);
        op.on_change(9.0);
        assert_eq!(emit_n(&mut op, 1), vec![9.0]);
    }

    #[test]
    fn test_stepped_wraps() {
        let mut op = op_with(OpConfig::stepped(0.0, 10.0, 5, false));
        assert_eq!(emit_n(&mut op, 7), vec![0.0, 2.0, 4.0, 6.0, 8.0, 0.0, 2.0]);
    }

    #[test]
    fn test_stepped_yoyo_reflects() {
        let mut op = op_with(OpConfig::stepped(0.0, 10.0, 5, true));
        assert_eq!(
            emit_n(&mut op, 12),
            vec![0.0, 2.0, 4.0, 6.0, 8.0, 8.0, 6.0, 4.0, 2.0, 0.0, 0.0, 2.0]
        );
    }

    #[test]
    fn test_stepped_on_change_snaps() {
        let mut op = op_with(OpConfig::stepped(0.0, 10.0, 5, false));
        op.on_change(5.1);
        assert_eq!(op.current(), 6.0);
        assert_eq!(emit_n(&mut op, 2), vec![6.0, 8.0]);
    }

    #[test]
    fn test_set_config_keeps_counter_when_unchanged() {
        let mut op = op_with(OpConfig::stepped(0.0, 10.0, 5, false));
        emit_n(&mut op, 2);
        op.set_config(OpConfig::stepped(0.0, 10.0, 5, false), &EaseRegistry::new());
        assert_eq!(emit_n(&mut op, 1), vec![4.0]);
    }

    #[test]
    fn test_eased_random_anchors() {
        let mut op = op_with(OpConfig::Eased {
            start: 0.0,
            end: 1.0,
            ease: Some("Quad.easeIn".into()),
            ease_params: Vec::new(),
            random: true,
        });
        let mut rng = Rng::new(5);
        let mut a = Particle::default();
        let mut b = Particle::default();
        let va = op.emit(Some(&mut a), &mut rng, 0.0);
        let vb = op.emit(Some(&mut b), &mut rng, 0.0);

        assert_ne!(va, vb);
        assert_eq!(a.anchor(OpKey::Alpha), Anchor::new(va, 1.0));
        assert_eq!(b.anchor(OpKey::Alpha), Anchor::new(vb, 1.0));
        assert!((op.update(&a, 1.0, 0.0) - 1.0).abs() < 1e-6);
        assert!((op.update(&b, 1.0, 0.0) - 1.0).abs() < 1e-6);
        assert_eq!(op.ease().name(), "Quad.easeIn");
    }

    #[test]
    fn test_eased_update_uses_anchor() {
        let mut op = op_with(OpConfig::eased(1.0, 0.0, "Linear"));
        let mut rng = Rng::new(1);
        let mut p = Particle::default();
        assert_eq!(op.emit(Some(&mut p), &mut rng, 0.0), 1.0);
        assert_eq!(op.update(&p, 0.25, 0.0), 0.75);
    }

    #[test]
    fn test_min_max_int() {
        let mut op = op_with(OpConfig::MinMax {
            min: 1.0,
            max: 3.0,
            int: true,
        });
        for v in emit_n(&mut op, 50) {
            assert!([1.0, 2.0, 3.0].contains(&v));
        }
    }

    #[test]
    fn test_random_range_floats() {
        let mut op = op_with(OpConfig::RandomRange { min: 2.0, max: 5.0 });
        let values = emit_n(&mut op, 50);
        assert!(values.iter().all(|v| (2.0..=5.0).contains(v)));
        assert!(values.iter().any(|v| v.fract() != 0.0));
    }

    #[test]
    fn test_interpolated_emit_and_update() {
        let mut op = op_with(OpConfig::Interpolated {
            values: vec![0.0, 10.0, 0.0],
            interpolation: None,
            ease: None,
            ease_params: Vec::new(),
        });
        let mut rng = Rng::new(1);
        let mut p = Particle::default();
        assert_eq!(op.emit(Some(&mut p), &mut rng, 0.0), 0.0);
        assert_eq!(p.anchor(OpKey::Alpha), Anchor::new(0.0, 0.0));
        assert_eq!(op.update(&p, 0.5, 0.0), 10.0);
    }

    #[test]
    fn test_custom_callbacks() {
        let mut registry = CallbackRegistry::new();
        registry
            .register_emit("ten", |_, _, _| 10.0)
            .register_update("age", |_, key, t, _| if key == "alpha" { t } else { -1.0 });
        let config = OpConfig::classify(
            &json!({"onEmit": "ten", "onUpdate": "age"}),
            "alpha",
            &registry,
        );
        let mut op = op_with(config);
        let mut rng = Rng::new(1);
        let p = Particle::default();
        assert_eq!(op.emit(None, &mut rng, 0.0), 10.0);
        assert_eq!(op.update(&p, 0.3, 0.0), 0.3);
        assert_eq!(op.current(), 0.3);
    }

    #[test]
    fn test_emit_only_ignores_update() {
        let mut op = ValueOp::new(OpKey::Lifespan, OpConfig::Constant(1000.0), true);
        op.set_config(OpConfig::eased(0.0, 1.0, "Linear"), &EaseRegistry::new());
        let p = Particle::default();
        assert_eq!(op.update(&p, 0.5, 42.0), 42.0);
    }

    #[test]
    fn test_on_change_clamps_ranges() {
        let mut op = op_with(OpConfig::range(10.0, 0.0));
        op.on_change(20.0);
        assert_eq!(op.current(), 10.0);

        let mut array = op_with(OpConfig::RandomArray(vec![1.0, 2.0]));
        array.on_change(5.0);
        assert_eq!(array.current(), 1.0);
        array.on_change(2.0);
        assert_eq!(array.current(), 2.0);
    }

    #[test]
    fn test_load_falls_back_to_default() {
        let registry = CallbackRegistry::new();
        let mut ops = EmitterOps::default();
        let config = json!({"alpha": {"start": 1, "end": 0}, "lifespan": 500});
        ops.load(config.as_object().unwrap(), &registry);
        assert_eq!(ops.alpha.method(), OpMethod::Eased);
        assert_eq!(ops.lifespan.current(), 500.0);
        assert_eq!(ops.angle.method(), OpMethod::MinMax);
        assert!(!ops.has_move_to());
        assert!(!ops.has_acceleration());
    }

    #[test]
    fn test_key_names_round_trip() {
        for key in OpKey::ALL {
            assert_eq!(OpKey::from_name(key.as_str()), Some(key));
            assert_eq!(key.index(), OpKey::ALL.iter().position(|k| *k == key).unwrap());
        }
    }

    proptest! {
        #[test]
        fn prop_stepped_period_is_steps(steps in 1u32..40, start in -100i32..100, span in 1i32..200) {
            let start = start as f32;
            let end = start + span as f32;
            let mut op = op_with(OpConfig::stepped(start, end, steps, false));
            let values = emit_n(&mut op, steps as usize + 1);
            prop_assert_eq!(values[0], values[steps as usize]);
            prop_assert!(values.iter().all(|v| *v >= start && *v < end));
        }
    }
}
