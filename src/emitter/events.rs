use crate::particle::Particle;
use std::fmt;

/// Notification queued by an emitter, drained with [`super::Emitter::drain_events`]
#[derive(Debug, Clone, PartialEq)]
pub enum EmitterEvent {
    /// Emission started, via `start`, `flow` or a configuration with `emitting`
    Start,
    /// Emission stopped by `stop`, a finished duration, or `stopAfter`
    Stop,
    /// An explosion fired; carries the last particle it spawned
    Explode { particle: Option<Box<Particle>> },
    /// The emitter stopped and its last alive particle died
    Complete,
    /// A death zone killed a particle
    DeathZone { zone: usize, particle: Box<Particle> },
}

impl EmitterEvent {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Start => "emitterstart",
            Self::Stop => "emitterstop",
            Self::Explode { .. } => "emitterexplode",
            Self::Complete => "emittercomplete",
            Self::DeathZone { .. } => "emitterdeathzone",
        }
    }
}

impl fmt::Display for EmitterEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
