//! sparkfall: pooled 2D particle emitters
//!
//! Every animated particle property is driven by a declarative value
//! generator ([`ops::ValueOp`]) loaded from a flat JSON configuration. An
//! [`Emitter`] owns those generators, a recycled pool of [`Particle`]s,
//! spawn and kill zones, and force processors. Rendering is left to the
//! caller, which reads the alive particles after each `update`.
//!
//! ```no_run
//! use sparkfall::{CallbackRegistry, Emitter};
//!
//! let config = serde_json::json!({
//!     "frequency": 50,
//!     "speed": {"min": 100, "max": 200},
//!     "lifespan": 1500,
//!     "alpha": {"start": 1, "end": 0},
//! });
//! let mut emitter = Emitter::from_config(&config, &CallbackRegistry::new())?;
//! emitter.update(16.0);
//! emitter.for_each_alive(|p| println!("{:?}", p.pos));
//! # Ok::<(), sparkfall::ConfigError>(())
//! ```

pub mod ease;
pub mod emitter;
pub mod error;
pub mod geometry;
pub mod math;
pub mod ops;
pub mod particle;
pub mod processors;
pub mod util;
pub mod zones;

pub use emitter::{Emitter, EmitterEvent, SortProperty};
pub use error::{ConfigError, Result};
pub use math::Vec2;
pub use ops::{CallbackRegistry, OpConfig, OpKey, OpMethod, ValueOp};
pub use particle::Particle;
pub use processors::{GravityWell, ParticleBounds, ParticleProcessor};
pub use util::Rng;
