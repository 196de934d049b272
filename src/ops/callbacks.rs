//! User callbacks and the name registry used to reference them from JSON

use crate::ease::EaseRegistry;
use crate::particle::Particle;
use std::cmp::Ordering;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Emit callback: `(particle, property key, previous value) -> new value`.
/// The particle is absent when an op is sampled outside of a fire, as the
/// emitter does for `quantity`.
pub type EmitFn = Arc<dyn Fn(Option<&Particle>, &str, f32) -> f32 + Send + Sync>;

/// Update callback: `(particle, property key, t, previous value) -> new value`
pub type UpdateFn = Arc<dyn Fn(&Particle, &str, f32, f32) -> f32 + Send + Sync>;

/// Per-particle notification, used for emit and death callbacks
pub type ParticleFn = Arc<dyn Fn(&Particle) + Send + Sync>;

/// Draw-order comparator for alive particles
pub type SortFn = Arc<dyn Fn(&Particle, &Particle) -> Ordering + Send + Sync>;

/// A callback with the registry name it was resolved from, if any.
///
/// Unnamed callbacks work normally but cannot be written back to JSON.
#[derive(Clone)]
pub struct Named<F> {
    pub name: Option<String>,
    pub func: F,
}

pub type EmitCallback = Named<EmitFn>;
pub type UpdateCallback = Named<UpdateFn>;
pub type ParticleCallback = Named<ParticleFn>;
pub type SortCallback = Named<SortFn>;

impl<F> Named<F> {
    pub fn named(name: impl Into<String>, func: F) -> Self {
        Self {
            name: Some(name.into()),
            func,
        }
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }
}

impl EmitCallback {
    pub fn new<F>(func: F) -> Self
    where
        F: Fn(Option<&Particle>, &str, f32) -> f32 + Send + Sync + 'static,
    {
        Self {
            name: None,
            func: Arc::new(func),
        }
    }
}

impl UpdateCallback {
    pub fn new<F>(func: F) -> Self
    where
        F: Fn(&Particle, &str, f32, f32) -> f32 + Send + Sync + 'static,
    {
        Self {
            name: None,
            func: Arc::new(func),
        }
    }
}

impl ParticleCallback {
    pub fn new<F>(func: F) -> Self
    where
        F: Fn(&Particle) + Send + Sync + 'static,
    {
        Self {
            name: None,
            func: Arc::new(func),
        }
    }
}

impl SortCallback {
    pub fn new<F>(func: F) -> Self
    where
        F: Fn(&Particle, &Particle) -> Ordering + Send + Sync + 'static,
    {
        Self {
            name: None,
            func: Arc::new(func),
        }
    }
}

impl<F> fmt::Debug for Named<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.name {
            Some(name) => write!(f, "Callback({name})"),
            None => f.write_str("Callback(<anonymous>)"),
        }
    }
}

// Two callbacks are the same when they share a name, or are the same
// closure when anonymous.
macro_rules! impl_named_eq {
    ($t:ty) => {
        impl PartialEq for Named<$t> {
            fn eq(&self, other: &Self) -> bool {
                match (&self.name, &other.name) {
                    (Some(a), Some(b)) => a == b,
                    (None, None) => Arc::ptr_eq(&self.func, &other.func),
                    _ => false,
                }
            }
        }
    };
}

impl_named_eq!(EmitFn);
impl_named_eq!(UpdateFn);
impl_named_eq!(ParticleFn);
impl_named_eq!(SortFn);

/// Named callbacks, eases and interpolations available to configuration.
///
/// A configuration references callbacks by string: `"x": "wobble"` installs
/// the emit callback registered as `wobble`.
#[derive(Clone, Default)]
pub struct CallbackRegistry {
    emit: HashMap<String, EmitFn>,
    update: HashMap<String, UpdateFn>,
    particle: HashMap<String, ParticleFn>,
    sort: HashMap<String, SortFn>,
    eases: EaseRegistry,
}

impl CallbackRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register_emit<F>(&mut self, name: impl Into<String>, func: F) -> &mut Self
    where
        F: Fn(Option<&Particle>, &str, f32) -> f32 + Send + Sync + 'static,
    {
        self.emit.insert(name.into(), Arc::new(func));
        self
    }

    pub fn register_update<F>(&mut self, name: impl Into<String>, func: F) -> &mut Self
    where
        F: Fn(&Particle, &str, f32, f32) -> f32 + Send + Sync + 'static,
    {
        self.update.insert(name.into(), Arc::new(func));
        self
    }

    /// Register an emit or death notification
    pub fn register_particle<F>(&mut self, name: impl Into<String>, func: F) -> &mut Self
    where
        F: Fn(&Particle) + Send + Sync + 'static,
    {
        self.particle.insert(name.into(), Arc::new(func));
        self
    }

    /// Register a draw-order comparator for `sortCallback`
    pub fn register_sort<F>(&mut self, name: impl Into<String>, func: F) -> &mut Self
    where
        F: Fn(&Particle, &Particle) -> Ordering + Send + Sync + 'static,
    {
        self.sort.insert(name.into(), Arc::new(func));
        self
    }

    pub fn register_ease<F>(&mut self, name: impl Into<String>, func: F) -> &mut Self
    where
        F: Fn(f32) -> f32 + Send + Sync + 'static,
    {
        self.eases.register_ease(name, func);
        self
    }

    pub fn register_interpolation<F>(&mut self, name: impl Into<String>, func: F) -> &mut Self
    where
        F: Fn(&[f32], f32) -> f32 + Send + Sync + 'static,
    {
        self.eases.register_interpolation(name, func);
        self
    }

    pub fn emit(&self, name: &str) -> Option<EmitCallback> {
        self.emit
            .get(name)
            .map(|func| Named::named(name, Arc::clone(func)))
    }

    pub fn update(&self, name: &str) -> Option<UpdateCallback> {
        self.update
            .get(name)
            .map(|func| Named::named(name, Arc::clone(func)))
    }

    pub fn particle(&self, name: &str) -> Option<ParticleCallback> {
        self.particle
            .get(name)
            .map(|func| Named::named(name, Arc::clone(func)))
    }

    pub fn sort(&self, name: &str) -> Option<SortCallback> {
        self.sort
            .get(name)
            .map(|func| Named::named(name, Arc::clone(func)))
    }

    pub fn eases(&self) -> &EaseRegistry {
        &self.eases
    }
}

impl fmt::Debug for CallbackRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CallbackRegistry")
            .field("emit", &self.emit.keys().collect::<Vec<_>>())
            .field("update", &self.update.keys().collect::<Vec<_>>())
            .field("particle", &self.particle.keys().collect::<Vec<_>>())
            .field("sort", &self.sort.keys().collect::<Vec<_>>())
            .field("eases", &self.eases)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_keeps_name() {
        let mut registry = CallbackRegistry::new();
        registry.register_emit("double", |_, _, v| v * 2.0);

        let cb = registry.emit("double").unwrap();
        assert_eq!(cb.name(), Some("double"));
        assert_eq!((cb.func)(None, "x", 4.0), 8.0);
        assert!(registry.emit("missing").is_none());
    }

    #[test]
    fn test_named_equality() {
        let mut registry = CallbackRegistry::new();
        registry.register_emit("a", |_, _, v| v);

        assert_eq!(registry.emit("a"), registry.emit("a"));

        let anon = EmitCallback::new(|_, _, v| v);
        assert_eq!(anon, anon.clone());
        assert_ne!(anon, EmitCallback::new(|_, _, v| v));
        assert_ne!(anon, registry.emit("a").unwrap());
    }
}
