//! Spawn and kill zones
//!
//! Emit zones place new particles, either anywhere inside a shape or at
//! points walked along its outline. Death zones kill particles that enter
//! (or leave) a shape.

use crate::geometry::{Contains, PointSource, Shape};
use crate::math::Vec2;
use crate::ops::StepDirection;
use crate::particle::Particle;
use crate::util::Rng;
use serde::{Deserialize, Serialize};

fn one() -> i32 {
    1
}

fn yes() -> bool {
    true
}

/// Serialized form of an emit zone, tagged by `type`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum EmitZoneConfig {
    Random {
        source: Shape,
        #[serde(default = "one")]
        total: i32,
    },
    #[serde(rename_all = "camelCase")]
    Edge {
        source: Shape,
        #[serde(default = "one_usize")]
        quantity: usize,
        #[serde(default)]
        step_rate: f32,
        #[serde(default)]
        yoyo: bool,
        #[serde(default = "yes")]
        seamless: bool,
        #[serde(default = "one")]
        total: i32,
    },
}

fn one_usize() -> usize {
    1
}

/// Spawns at uniformly random points inside its source
#[derive(Debug, Clone, PartialEq)]
pub struct RandomZone {
    pub source: Shape,
    pub total: i32,
}

impl RandomZone {
    pub fn new(source: Shape) -> Self {
        Self { source, total: 1 }
    }

    pub fn get_point(&self, rng: &mut Rng) -> Vec2 {
        self.source.random_point(rng)
    }
}

/// Spawns at evenly spaced points along its source's outline, in order
#[derive(Debug, Clone, PartialEq)]
pub struct EdgeZone {
    pub source: Shape,
    pub quantity: usize,
    pub step_rate: f32,
    pub yoyo: bool,
    pub seamless: bool,
    pub total: i32,
    points: Vec<Vec2>,
    counter: Option<usize>,
    direction: StepDirection,
}

impl EdgeZone {
    pub fn new(source: Shape, quantity: usize, step_rate: f32) -> Self {
        let mut zone = Self {
            source,
            quantity,
            step_rate,
            yoyo: false,
            seamless: true,
            total: 1,
            points: Vec::new(),
            counter: None,
            direction: StepDirection::Up,
        };
        zone.update_source();
        zone
    }

    pub fn with_yoyo(mut self, yoyo: bool) -> Self {
        self.yoyo = yoyo;
        self
    }

    pub fn with_seamless(mut self, seamless: bool) -> Self {
        self.seamless = seamless;
        self.update_source();
        self
    }

    /// Recompute the outline points after the source or quantity changed
    pub fn update_source(&mut self) {
        self.points = self.source.get_points(self.quantity, self.step_rate);

        // Closed outlines would otherwise spawn twice on the seam
        if self.seamless && self.points.len() > 1 {
            let first = self.points[0];
            if self.points.last() == Some(&first) {
                self.points.pop();
            }
        }

        if let Some(counter) = self.counter {
            self.counter = Some(counter.min(self.points.len().saturating_sub(1)));
        }
    }

    pub fn points(&self) -> &[Vec2] {
        &self.points
    }

    /// Next point in the walk, or `None` when the outline has no points
    pub fn get_point(&mut self) -> Option<Vec2> {
        let len = self.points.len();
        if len == 0 {
            return None;
        }
        let last = len - 1;

        let next = match (self.direction, self.counter) {
            (StepDirection::Up, None) => 0,
            (StepDirection::Up, Some(c)) if c >= last => {
                if self.yoyo {
                    self.direction = StepDirection::Down;
                    last
                } else {
                    0
                }
            }
            (StepDirection::Up, Some(c)) => c + 1,
            (StepDirection::Down, Some(0) | None) => {
                if self.yoyo {
                    self.direction = StepDirection::Up;
                    0
                } else {
                    last
                }
            }
            (StepDirection::Down, Some(c)) => c - 1,
        };

        self.counter = Some(next);
        self.points.get(next).copied()
    }
}

/// A configured spawn zone
#[derive(Debug, Clone, PartialEq)]
pub enum EmitZone {
    Random(RandomZone),
    Edge(EdgeZone),
}

impl EmitZone {
    /// Points this zone serves before the emitter moves to the next zone.
    /// Negative means it never hands over.
    pub fn total(&self) -> i32 {
        match self {
            Self::Random(z) => z.total,
            Self::Edge(z) => z.total,
        }
    }

    pub fn source(&self) -> &Shape {
        match self {
            Self::Random(z) => &z.source,
            Self::Edge(z) => &z.source,
        }
    }

    pub fn get_point(&mut self, rng: &mut Rng) -> Option<Vec2> {
        match self {
            Self::Random(z) => Some(z.get_point(rng)),
            Self::Edge(z) => z.get_point(),
        }
    }

    pub fn config(&self) -> EmitZoneConfig {
        match self {
            Self::Random(z) => EmitZoneConfig::Random {
                source: z.source.clone(),
                total: z.total,
            },
            Self::Edge(z) => EmitZoneConfig::Edge {
                source: z.source.clone(),
                quantity: z.quantity,
                step_rate: z.step_rate,
                yoyo: z.yoyo,
                seamless: z.seamless,
                total: z.total,
            },
        }
    }
}

impl From<EmitZoneConfig> for EmitZone {
    fn from(config: EmitZoneConfig) -> Self {
        match config {
            EmitZoneConfig::Random { source, total } => Self::Random(RandomZone { source, total }),
            EmitZoneConfig::Edge {
                source,
                quantity,
                step_rate,
                yoyo,
                seamless,
                total,
            } => {
                let mut zone = EdgeZone::new(source, quantity, step_rate)
                    .with_yoyo(yoyo)
                    .with_seamless(seamless);
                zone.total = total;
                Self::Edge(zone)
            }
        }
    }
}

impl From<RandomZone> for EmitZone {
    fn from(zone: RandomZone) -> Self {
        Self::Random(zone)
    }
}

impl From<EdgeZone> for EmitZone {
    fn from(zone: EdgeZone) -> Self {
        Self::Edge(zone)
    }
}

/// Serialized form of a death zone
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum DeathZoneConfig {
    #[serde(rename = "onEnter")]
    OnEnter { source: Shape },
    #[serde(rename = "onLeave")]
    OnLeave { source: Shape },
}

/// Kills particles inside its source (`kill_on_enter`) or outside it
#[derive(Debug, Clone, PartialEq)]
pub struct DeathZone {
    pub source: Shape,
    pub kill_on_enter: bool,
}

impl DeathZone {
    pub fn new(source: Shape, kill_on_enter: bool) -> Self {
        Self {
            source,
            kill_on_enter,
        }
    }

    pub fn on_enter(source: Shape) -> Self {
        Self::new(source, true)
    }

    pub fn on_leave(source: Shape) -> Self {
        Self::new(source, false)
    }

    pub fn will_kill(&self, particle: &Particle) -> bool {
        self.source.contains(particle.pos.x, particle.pos.y) == self.kill_on_enter
    }

    pub fn config(&self) -> DeathZoneConfig {
        let source = self.source.clone();
        if self.kill_on_enter {
            DeathZoneConfig::OnEnter { source }
        } else {
            DeathZoneConfig::OnLeave { source }
        }
    }
}

impl From<DeathZoneConfig> for DeathZone {
    fn from(config: DeathZoneConfig) -> Self {
        match config {
            DeathZoneConfig::OnEnter { source } => Self::on_enter(source),
            DeathZoneConfig::OnLeave { source } => Self::on_leave(source),
        }
    }
}
