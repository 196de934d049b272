//! Easing and interpolation functions
//!
//! Eases map normalized particle age `t` in [0, 1] to an eased factor.
//! Names follow the usual tweening vocabulary: `Linear`, `Power0`..`Power4`,
//! `Quad`, `Cubic`, `Quart`, `Quint`, `Sine`, `Expo`, `Circ`, `Back`,
//! `Bounce`, `Elastic` and `Stepped`, each with `.easeIn`, `.easeOut` and
//! `.easeInOut` variants (`.in`, `.out` and `.inOut` are accepted too).
//! A bare name means the `easeOut` variant.
//!
//! Interpolations sample a list of values at a factor: `linear`, `bezier` and
//! `catmull`. Both kinds can be extended with named functions.

use std::collections::HashMap;
use std::f32::consts::{FRAC_PI_2, PI, TAU};
use std::fmt;
use std::sync::Arc;

/// A user supplied easing function
pub type EaseFn = Arc<dyn Fn(f32) -> f32 + Send + Sync>;

/// A user supplied interpolation function over a list of samples
pub type InterpolationFn = Arc<dyn Fn(&[f32], f32) -> f32 + Send + Sync>;

const BACK_OVERSHOOT: f32 = 1.70158;
const ELASTIC_AMPLITUDE: f32 = 0.1;
const ELASTIC_PERIOD: f32 = 0.1;

/// Built-in easing curve families
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EaseKind {
    Linear,
    Quad,
    Cubic,
    Quart,
    Quint,
    Sine,
    Expo,
    Circ,
    Back,
    Bounce,
    Elastic,
    Stepped,
}

impl EaseKind {
    fn from_name(name: &str) -> Option<Self> {
        let kind = match name.to_ascii_lowercase().as_str() {
            "linear" | "power0" => Self::Linear,
            "quad" | "power1" => Self::Quad,
            "cubic" | "power2" => Self::Cubic,
            "quart" | "power3" => Self::Quart,
            "quint" | "power4" => Self::Quint,
            "sine" => Self::Sine,
            "expo" => Self::Expo,
            "circ" => Self::Circ,
            "back" => Self::Back,
            "bounce" => Self::Bounce,
            "elastic" => Self::Elastic,
            "stepped" => Self::Stepped,
            _ => return None,
        };
        Some(kind)
    }
}

/// Which end of the curve the easing applies to
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum EaseMode {
    In,
    #[default]
    Out,
    InOut,
}

impl EaseMode {
    fn from_suffix(suffix: &str) -> Option<Self> {
        match suffix.to_ascii_lowercase().as_str() {
            "in" | "easein" => Some(Self::In),
            "out" | "easeout" => Some(Self::Out),
            "inout" | "easeinout" => Some(Self::InOut),
            _ => None,
        }
    }
}

#[derive(Clone)]
enum EaseFunc {
    Builtin(EaseKind, EaseMode),
    Custom(EaseFn),
}

/// A resolved ease with its parameters bound
#[derive(Clone)]
pub struct Ease {
    name: String,
    params: Vec<f32>,
    func: EaseFunc,
}

impl Ease {
    pub fn linear() -> Self {
        Self {
            name: "Linear".to_string(),
            params: Vec::new(),
            func: EaseFunc::Builtin(EaseKind::Linear, EaseMode::Out),
        }
    }

    pub fn builtin(kind: EaseKind, mode: EaseMode, params: &[f32]) -> Self {
        Self {
            name: format!("{kind:?}"),
            params: params.to_vec(),
            func: EaseFunc::Builtin(kind, mode),
        }
    }

    pub fn custom(name: impl Into<String>, func: EaseFn) -> Self {
        Self {
            name: name.into(),
            params: Vec::new(),
            func: EaseFunc::Custom(func),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn params(&self) -> &[f32] {
        &self.params
    }

    /// Evaluate the ease at `t`
    pub fn apply(&self, t: f32) -> f32 {
        match &self.func {
            EaseFunc::Builtin(kind, mode) => evaluate(*kind, *mode, t, &self.params),
            EaseFunc::Custom(f) => f(t),
        }
    }
}

impl Default for Ease {
    fn default() -> Self {
        Self::linear()
    }
}

impl fmt::Debug for Ease {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Ease")
            .field("name", &self.name)
            .field("params", &self.params)
            .finish()
    }
}

impl PartialEq for Ease {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name && self.params == other.params
    }
}

/// Sample interpolation families
#[derive(Clone, Default)]
pub enum Interpolation {
    #[default]
    Linear,
    Bezier,
    CatmullRom,
    Custom {
        name: String,
        func: InterpolationFn,
    },
}

impl Interpolation {
    pub fn name(&self) -> &str {
        match self {
            Self::Linear => "linear",
            Self::Bezier => "bezier",
            Self::CatmullRom => "catmull",
            Self::Custom { name, .. } => name,
        }
    }

    /// Sample `values` at factor `k`
    pub fn apply(&self, values: &[f32], k: f32) -> f32 {
        match values {
            [] => 0.0,
            [only] => *only,
            _ => match self {
                Self::Linear => linear_interpolation(values, k),
                Self::Bezier => bezier_interpolation(values, k),
                Self::CatmullRom => catmull_rom_interpolation(values, k),
                Self::Custom { func, .. } => func(values, k),
            },
        }
    }
}

impl fmt::Debug for Interpolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Interpolation({})", self.name())
    }
}

impl PartialEq for Interpolation {
    fn eq(&self, other: &Self) -> bool {
        self.name() == other.name()
    }
}

/// Named custom eases and interpolations, consulted before the built-ins
#[derive(Clone, Default)]
pub struct EaseRegistry {
    eases: HashMap<String, EaseFn>,
    interpolations: HashMap<String, InterpolationFn>,
}

impl EaseRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register_ease<F>(&mut self, name: impl Into<String>, func: F)
    where
        F: Fn(f32) -> f32 + Send + Sync + 'static,
    {
        self.eases.insert(name.into(), Arc::new(func));
    }

    pub fn register_interpolation<F>(&mut self, name: impl Into<String>, func: F)
    where
        F: Fn(&[f32], f32) -> f32 + Send + Sync + 'static,
    {
        self.interpolations.insert(name.into(), Arc::new(func));
    }

    /// Resolve an ease name. Unknown names fall back to linear.
    pub fn ease(&self, name: &str, params: &[f32]) -> Ease {
        if let Some(func) = self.eases.get(name) {
            return Ease::custom(name, Arc::clone(func));
        }

        match parse_ease_name(name) {
            Some((kind, mode)) => Ease {
                name: name.to_string(),
                params: params.to_vec(),
                func: EaseFunc::Builtin(kind, mode),
            },
            None => {
                log::warn!("unknown ease '{name}', falling back to Linear");
                Ease::linear()
            }
        }
    }

    /// Resolve an interpolation name. Unknown names fall back to linear.
    pub fn interpolation(&self, name: &str) -> Interpolation {
        if let Some(func) = self.interpolations.get(name) {
            return Interpolation::Custom {
                name: name.to_string(),
                func: Arc::clone(func),
            };
        }

        match name.to_ascii_lowercase().as_str() {
            "linear" => Interpolation::Linear,
            "bezier" => Interpolation::Bezier,
            "catmull" | "catmullrom" => Interpolation::CatmullRom,
            _ => {
                log::warn!("unknown interpolation '{name}', falling back to linear");
                Interpolation::Linear
            }
        }
    }
}

impl fmt::Debug for EaseRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EaseRegistry")
            .field("eases", &self.eases.keys().collect::<Vec<_>>())
            .field("interpolations", &self.interpolations.keys().collect::<Vec<_>>())
            .finish()
    }
}

fn parse_ease_name(name: &str) -> Option<(EaseKind, EaseMode)> {
    match name.split_once('.') {
        None => {
            let kind = EaseKind::from_name(name)?;
            // The PowerN aliases are all easeOut curves
            Some((kind, EaseMode::Out))
        }
        Some((family, suffix)) => {
            if family.to_ascii_lowercase().starts_with("power") {
                return None;
            }
            Some((EaseKind::from_name(family)?, EaseMode::from_suffix(suffix)?))
        }
    }
}

fn param(params: &[f32], i: usize, default: f32) -> f32 {
    params.get(i).copied().unwrap_or(default)
}

fn evaluate(kind: EaseKind, mode: EaseMode, v: f32, params: &[f32]) -> f32 {
    match kind {
        EaseKind::Linear => v,
        EaseKind::Quad => polynomial(2, mode, v),
        EaseKind::Cubic => polynomial(3, mode, v),
        EaseKind::Quart => polynomial(4, mode, v),
        EaseKind::Quint => polynomial(5, mode, v),
        EaseKind::Sine => sine(mode, v),
        EaseKind::Expo => expo(mode, v),
        EaseKind::Circ => circ(mode, v),
        EaseKind::Back => back(mode, v, param(params, 0, BACK_OVERSHOOT)),
        EaseKind::Bounce => bounce(mode, v),
        EaseKind::Elastic => elastic(
            mode,
            v,
            param(params, 0, ELASTIC_AMPLITUDE),
            param(params, 1, ELASTIC_PERIOD),
        ),
        EaseKind::Stepped => stepped(v, param(params, 0, 1.0)),
    }
}

fn polynomial(power: i32, mode: EaseMode, v: f32) -> f32 {
    match mode {
        EaseMode::In => v.powi(power),
        EaseMode::Out => 1.0 - (1.0 - v).powi(power),
        EaseMode::InOut => {
            if v < 0.5 {
                0.5 * (2.0 * v).powi(power)
            } else {
                1.0 - 0.5 * (2.0 - 2.0 * v).powi(power)
            }
        }
    }
}

fn sine(mode: EaseMode, v: f32) -> f32 {
    if v <= 0.0 {
        return 0.0;
    }
    if v >= 1.0 {
        return 1.0;
    }
    match mode {
        EaseMode::In => 1.0 - (v * FRAC_PI_2).cos(),
        EaseMode::Out => (v * FRAC_PI_2).sin(),
        EaseMode::InOut => 0.5 * (1.0 - (PI * v).cos()),
    }
}

fn expo(mode: EaseMode, v: f32) -> f32 {
    match mode {
        EaseMode::In => 2f32.powf(10.0 * (v - 1.0)) - 0.001,
        EaseMode::Out => 1.0 - 2f32.powf(-10.0 * v),
        EaseMode::InOut => {
            let v = v * 2.0;
            if v < 1.0 {
                0.5 * 2f32.powf(10.0 * (v - 1.0))
            } else {
                0.5 * (2.0 - 2f32.powf(-10.0 * (v - 1.0)))
            }
        }
    }
}

fn circ(mode: EaseMode, v: f32) -> f32 {
    match mode {
        EaseMode::In => 1.0 - (1.0 - v * v).max(0.0).sqrt(),
        EaseMode::Out => {
            let u = v - 1.0;
            (1.0 - u * u).max(0.0).sqrt()
        }
        EaseMode::InOut => {
            let v = v * 2.0;
            if v < 1.0 {
                -0.5 * ((1.0 - v * v).max(0.0).sqrt() - 1.0)
            } else {
                let u = v - 2.0;
                0.5 * ((1.0 - u * u).max(0.0).sqrt() + 1.0)
            }
        }
    }
}

fn back(mode: EaseMode, v: f32, overshoot: f32) -> f32 {
    match mode {
        EaseMode::In => v * v * ((overshoot + 1.0) * v - overshoot),
        EaseMode::Out => {
            let u = v - 1.0;
            u * u * ((overshoot + 1.0) * u + overshoot) + 1.0
        }
        EaseMode::InOut => {
            let s = overshoot * 1.525;
            let v = v * 2.0;
            if v < 1.0 {
                0.5 * (v * v * ((s + 1.0) * v - s))
            } else {
                let u = v - 2.0;
                0.5 * (u * u * ((s + 1.0) * u + s) + 2.0)
            }
        }
    }
}

fn bounce_out(v: f32) -> f32 {
    if v < 1.0 / 2.75 {
        7.5625 * v * v
    } else if v < 2.0 / 2.75 {
        let u = v - 1.5 / 2.75;
        7.5625 * u * u + 0.75
    } else if v < 2.5 / 2.75 {
        let u = v - 2.25 / 2.75;
        7.5625 * u * u + 0.9375
    } else {
        let u = v - 2.625 / 2.75;
        7.5625 * u * u + 0.984_375
    }
}

fn bounce(mode: EaseMode, v: f32) -> f32 {
    match mode {
        EaseMode::In => 1.0 - bounce_out(1.0 - v),
        EaseMode::Out => bounce_out(v),
        EaseMode::InOut => {
            if v < 0.5 {
                (1.0 - bounce_out(1.0 - 2.0 * v)) * 0.5
            } else {
                bounce_out(2.0 * v - 1.0) * 0.5 + 0.5
            }
        }
    }
}

fn elastic(mode: EaseMode, v: f32, amplitude: f32, period: f32) -> f32 {
    if v <= 0.0 {
        return 0.0;
    }
    if v >= 1.0 {
        return 1.0;
    }

    let (amplitude, s) = if amplitude < 1.0 {
        (1.0, period / 4.0)
    } else {
        (amplitude, period * (1.0 / amplitude).asin() / TAU)
    };
    let wave = |u: f32| ((u - s) * TAU / period).sin();

    match mode {
        EaseMode::In => {
            let u = v - 1.0;
            -(amplitude * 2f32.powf(10.0 * u) * wave(u))
        }
        EaseMode::Out => amplitude * 2f32.powf(-10.0 * v) * wave(v) + 1.0,
        EaseMode::InOut => {
            let u = v * 2.0 - 1.0;
            if u < 0.0 {
                -0.5 * (amplitude * 2f32.powf(10.0 * u) * wave(u))
            } else {
                amplitude * 2f32.powf(-10.0 * u) * wave(u) * 0.5 + 1.0
            }
        }
    }
}

fn stepped(v: f32, steps: f32) -> f32 {
    if v <= 0.0 {
        0.0
    } else if v >= 1.0 {
        1.0
    } else {
        let steps = steps.max(1.0);
        ((steps * v).floor() + 1.0) * (1.0 / steps)
    }
}

#[inline]
fn lerp(p0: f32, p1: f32, t: f32) -> f32 {
    (p1 - p0) * t + p0
}

fn linear_interpolation(v: &[f32], k: f32) -> f32 {
    let m = v.len() - 1;
    let f = m as f32 * k;

    if k < 0.0 {
        return lerp(v[0], v[1], f);
    }
    if k > 1.0 {
        return lerp(v[m], v[m - 1], m as f32 - f);
    }

    let i = (f.floor() as usize).min(m);
    lerp(v[i], v[(i + 1).min(m)], f - i as f32)
}

/// De Casteljau evaluation; stays finite for any number of control values
fn bezier_interpolation(v: &[f32], k: f32) -> f32 {
    let k = f64::from(k);
    let mut points: Vec<f64> = v.iter().map(|&p| f64::from(p)).collect();
    for len in (1..points.len()).rev() {
        for i in 0..len {
            points[i] += (points[i + 1] - points[i]) * k;
        }
    }
    points.first().copied().unwrap_or_default() as f32
}

fn catmull_rom(t: f32, p0: f32, p1: f32, p2: f32, p3: f32) -> f32 {
    let v0 = (p2 - p0) * 0.5;
    let v1 = (p3 - p1) * 0.5;
    let t2 = t * t;
    let t3 = t * t2;
    (2.0 * p1 - 2.0 * p2 + v0 + v1) * t3 + (-3.0 * p1 + 3.0 * p2 - 2.0 * v0 - v1) * t2 + v0 * t + p1
}

fn catmull_rom_interpolation(v: &[f32], k: f32) -> f32 {
    let m = v.len() - 1;
    let mut f = m as f32 * k;

    // Closed loop when the ends meet
    if v[0] == v[m] {
        if k < 0.0 {
            f = m as f32 * (1.0 + k);
        }
        let i = f.floor().max(0.0) as usize;
        return catmull_rom(
            f - i as f32,
            v[(i + m - 1) % m],
            v[i % m],
            v[(i + 1) % m],
            v[(i + 2) % m],
        );
    }

    if k < 0.0 {
        return v[0] - (catmull_rom(-f, v[0], v[0], v[1], v[1]) - v[0]);
    }
    if k > 1.0 {
        return v[m] - (catmull_rom(f - m as f32, v[m], v[m], v[m - 1], v[m - 1]) - v[m]);
    }

    let i = (f.floor() as usize).min(m);
    catmull_rom(
        f - i as f32,
        v[i.saturating_sub(1)],
        v[i],
        v[(i + 1).min(m)],
        v[(i + 2).min(m)],
    )
}
