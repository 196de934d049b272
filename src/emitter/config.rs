//! Loading and saving emitter configuration
//!
//! A configuration is one flat JSON object. Op keys are classified by
//! [`OpConfig::classify`](crate::ops::OpConfig::classify); scalar keys only
//! change the emitter when present, so `update_config` can merge a partial
//! object over the stored one and reload it.

use super::{Emitter, EmitterEvent, FrameConfig, FrameSelector, SortProperty};
use crate::error::{json_kind, ConfigError, Result};
use crate::geometry::Rectangle;
use crate::math::Vec2;
use crate::ops::{number_json, CallbackRegistry, OpConfig, ParticleCallback, SortCallback};
use crate::processors::ParticleBounds;
use crate::zones::{DeathZone, DeathZoneConfig, EmitZone, EmitZoneConfig};
use log::{debug, warn};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{json, Map, Value};

type Config = Map<String, Value>;

/// Keys kept for compatibility with renderer-side configuration
const IGNORED_KEYS: [&str; 4] = [
    "callbackScope",
    "emitCallbackScope",
    "deathCallbackScope",
    "particleClass",
];

impl Emitter {
    /// Build an emitter from a configuration object
    pub fn from_config(config: &Value, registry: &CallbackRegistry) -> Result<Self> {
        let mut emitter = Self::new(registry.clone());
        emitter.set_config(config)?;
        Ok(emitter)
    }

    /// Build an emitter from configuration text
    pub fn from_json(text: &str, registry: &CallbackRegistry) -> Result<Self> {
        let value: Value = serde_json::from_str(text)?;
        Self::from_config(&value, registry)
    }

    /// Load a configuration, replacing the stored one.
    ///
    /// Every op is reloaded (absent ops return to their defaults). Other keys
    /// only take effect when present.
    pub fn set_config(&mut self, config: &Value) -> Result<&mut Self> {
        let config = as_object(config)?.clone();
        self.apply_config(config);
        Ok(self)
    }

    /// Merge `config` over the stored configuration and reload the result
    pub fn update_config(&mut self, config: &Value) -> Result<&mut Self> {
        let patch = as_object(config)?;
        let mut merged = self.config.clone();
        for (key, value) in patch {
            merged.insert(key.clone(), value.clone());
        }
        self.apply_config(merged);
        Ok(self)
    }

    /// The most recently loaded configuration
    pub fn config(&self) -> &Map<String, Value> {
        &self.config
    }

    fn apply_config(&mut self, config: Config) {
        self.ops.load(&config, &self.registry);
        self.ops.speed_y.set_active(true);
        self.ops.scale_y.set_active(true);

        if let Some(v) = read::<bool>(&config, "active") {
            self.active = v;
        }
        if let Some(v) = read::<bool>(&config, "emitting") {
            self.emitting = v;
        }
        if let Some(v) = read::<bool>(&config, "particleBringToTop") {
            self.particle_bring_to_top = v;
        }
        if let Some(v) = read::<f32>(&config, "frequency") {
            self.frequency = v;
        }
        if let Some(v) = read::<f32>(&config, "duration") {
            self.duration = v;
        }
        if let Some(v) = read::<f32>(&config, "timeScale") {
            self.time_scale = v;
        }
        if let Some(v) = read::<f32>(&config, "gravityX") {
            self.gravity.x = v;
        }
        if let Some(v) = read::<f32>(&config, "gravityY") {
            self.gravity.y = v;
        }
        if let Some(v) = read_count(&config, "maxParticles") {
            self.max_particles = v;
        }
        if let Some(v) = read_count(&config, "maxAliveParticles") {
            self.max_alive_particles = v;
        }
        if let Some(v) = read_count(&config, "stopAfter") {
            self.stop_after = v;
        }
        if let Some(v) = read::<String>(&config, "name") {
            self.name = v;
        }
        if let Some(v) = config.get("blendMode") {
            match v {
                Value::String(s) => self.blend_mode.clone_from(s),
                Value::Number(n) => self.blend_mode = n.to_string(),
                other => warn!("config 'blendMode': expected a name, got {}", json_kind(other)),
            }
        }

        self.refresh_motion_flags();

        if config.contains_key("speed") {
            self.ops.speed_x.load_as(&config, "speed", &self.registry);
            self.ops.speed_y.set_active(false);
        }

        // An explicit `radial` wins over the point-emitter implied by
        // per-axis speeds or a move-to target.
        match read::<bool>(&config, "radial") {
            Some(radial) => self.radial = radial,
            None => {
                if config.contains_key("speedX") || config.contains_key("speedY") || self.move_to {
                    self.radial = false;
                }
            }
        }

        if config.contains_key("scale") {
            self.ops.scale_x.load_as(&config, "scale", &self.registry);
            self.ops.scale_y.load_as(&config, "scale", &self.registry);
            self.ops.scale_y.set_active(false);
        }

        if config.contains_key("emitCallback") {
            self.emit_callback = read_callback(&config, "emitCallback", &self.registry);
        }
        if config.contains_key("deathCallback") {
            self.death_callback = read_callback(&config, "deathCallback", &self.registry);
        }

        if let Some(name) = read::<String>(&config, "sortProperty") {
            self.sort_property = SortProperty::from_name(&name);
            if self.sort_property.is_none() {
                warn!("config 'sortProperty': unknown particle property '{name}'");
            }
        }
        if let Some(v) = read::<bool>(&config, "sortOrderAsc") {
            self.sort_order_asc = v;
        }
        if let Some(name) = read::<String>(&config, "sortCallback") {
            self.sort_callback = self.registry.sort(&name);
            if self.sort_callback.is_none() {
                warn!("config 'sortCallback': no sort callback registered as '{name}'");
            }
        }
        for key in IGNORED_KEYS {
            if config.contains_key(key) {
                debug!("config '{key}' has no effect here, ignoring");
            }
        }

        if let Some(zones) = read_list::<EmitZoneConfig>(&config, "emitZone", "random") {
            self.emit_zones = zones.into_iter().map(EmitZone::from).collect();
            self.counters.zone_index = 0;
            self.counters.zone_total = 0;
        }
        if let Some(zones) = read_list::<DeathZoneConfig>(&config, "deathZone", "onEnter") {
            self.death_zones = zones.into_iter().map(DeathZone::from).collect();
        }

        if let Some(rect) = read::<Rectangle>(&config, "bounds") {
            let edge = |key: &str| read::<bool>(&config, key).unwrap_or(true);
            self.bounds = Some(ParticleBounds::new(rect).with_collisions(
                edge("collideLeft"),
                edge("collideRight"),
                edge("collideTop"),
                edge("collideBottom"),
            ));
        }

        if let Some(target) = read::<Vec2>(&config, "follow") {
            self.follow = Some(target);
        }
        if let Some(offset) = read::<Vec2>(&config, "followOffset") {
            self.follow_offset = offset;
        }

        if let Some(frames) = read::<FrameConfig>(&config, "frame") {
            self.frames = FrameSelector::from(frames);
        }
        if let Some(anims) = read::<FrameConfig>(&config, "anim") {
            self.anims = FrameSelector::from(anims);
        }

        if let Some(count) = read_count(&config, "reserve") {
            self.reserve(count);
        }
        if let Some(advance) = read::<f32>(&config, "advance") {
            self.fast_forward(advance, None);
        }

        self.config = config;
        self.reset_counters(self.frequency, self.emitting);

        debug!(
            "emitter '{}' configured: frequency {}, {} emit zones, {} death zones",
            self.name,
            self.frequency,
            self.emit_zones.len(),
            self.death_zones.len()
        );

        if self.emitting {
            self.events.push(EmitterEvent::Start);
        }
    }

    /// Serialize the emitter's current settings in configuration form.
    ///
    /// `speedX`/`speedY` collapse into `speed` when `speedY` is inactive, and
    /// `scaleX`/`scaleY` into `scale` when `scaleY` is inactive or holds the
    /// same fixed value. Random scales stay per axis, each axis draws its own.
    pub fn to_json(&self) -> Value {
        let mut out = Map::new();

        out.insert("active".into(), json!(self.active));
        out.insert("emitting".into(), json!(self.emitting));
        out.insert("frequency".into(), number_json(self.frequency));
        out.insert("maxParticles".into(), json!(self.max_particles));
        out.insert("maxAliveParticles".into(), json!(self.max_alive_particles));
        out.insert("duration".into(), number_json(self.duration));
        out.insert("stopAfter".into(), json!(self.stop_after));
        out.insert("gravityX".into(), number_json(self.gravity.x));
        out.insert("gravityY".into(), number_json(self.gravity.y));
        out.insert("radial".into(), json!(self.radial));
        out.insert("particleBringToTop".into(), json!(self.particle_bring_to_top));
        out.insert("timeScale".into(), number_json(self.time_scale));
        out.insert("blendMode".into(), json!(self.blend_mode));
        out.insert("name".into(), json!(self.name));

        for op in self.ops.iter() {
            out.insert(op.key().as_str().into(), op.to_json());
        }

        if !self.ops.speed_y.is_active() {
            out.remove("speedX");
            out.remove("speedY");
            out.insert("speed".into(), self.ops.speed_x.to_json());
        }

        let same_fixed_scale = self.ops.scale_x.config() == self.ops.scale_y.config()
            && matches!(self.ops.scale_x.config(), OpConfig::Identity | OpConfig::Constant(_));
        if !self.ops.scale_y.is_active() || same_fixed_scale {
            out.remove("scaleX");
            out.remove("scaleY");
            out.insert("scale".into(), self.ops.scale_x.to_json());
        }

        if !self.emit_zones.is_empty() {
            let zones: Vec<_> = self.emit_zones.iter().map(EmitZone::config).collect();
            out.insert("emitZone".into(), to_value(&zones));
        }
        if !self.death_zones.is_empty() {
            let zones: Vec<_> = self.death_zones.iter().map(DeathZone::config).collect();
            out.insert("deathZone".into(), to_value(&zones));
        }

        if let Some(bounds) = &self.bounds {
            out.insert("bounds".into(), to_value(&bounds.rect));
            out.insert("collideLeft".into(), json!(bounds.collide_left));
            out.insert("collideRight".into(), json!(bounds.collide_right));
            out.insert("collideTop".into(), json!(bounds.collide_top));
            out.insert("collideBottom".into(), json!(bounds.collide_bottom));
        }

        if let Some(target) = self.follow {
            out.insert("follow".into(), to_value(&target));
        }
        if self.follow_offset != Vec2::ZERO {
            out.insert("followOffset".into(), to_value(&self.follow_offset));
        }

        if let Some(frames) = self.frames.config() {
            out.insert("frame".into(), to_value(&frames));
        }
        if let Some(anims) = self.anims.config() {
            out.insert("anim".into(), to_value(&anims));
        }

        if let Some(name) = self.emit_callback.as_ref().and_then(ParticleCallback::name) {
            out.insert("emitCallback".into(), json!(name));
        }
        if let Some(name) = self.death_callback.as_ref().and_then(ParticleCallback::name) {
            out.insert("deathCallback".into(), json!(name));
        }

        out.extend(self.ops.color.to_json());

        if let Some(property) = self.sort_property {
            out.insert("sortProperty".into(), json!(property.as_str()));
        }
        out.insert("sortOrderAsc".into(), json!(self.sort_order_asc));
        if let Some(name) = self.sort_callback.as_ref().and_then(SortCallback::name) {
            out.insert("sortCallback".into(), json!(name));
        }

        Value::Object(out)
    }
}

fn as_object(config: &Value) -> Result<&Config> {
    config
        .as_object()
        .ok_or_else(|| ConfigError::NotAnObject(json_kind(config)))
}

/// Read a typed key. Absent and null keys are `None`; anything that fails
/// to deserialize is logged and treated as absent.
fn read<T: DeserializeOwned>(config: &Config, key: &str) -> Option<T> {
    let value = config.get(key).filter(|v| !v.is_null())?;
    match serde_json::from_value(value.clone()) {
        Ok(v) => Some(v),
        Err(err) => {
            warn!("config '{key}': ignoring {}: {err}", json_kind(value));
            None
        }
    }
}

/// Counts accept any non-negative number
fn read_count(config: &Config, key: &str) -> Option<usize> {
    read::<f64>(config, key).map(|v| v.max(0.0) as usize)
}

/// A single object or an array of them; objects without a `type` get
/// `default_type`.
fn read_list<T: DeserializeOwned>(config: &Config, key: &str, default_type: &str) -> Option<Vec<T>> {
    let value = config.get(key).filter(|v| !v.is_null())?;
    let items = match value {
        Value::Array(items) => items.clone(),
        other => vec![other.clone()],
    };

    let parsed = items
        .into_iter()
        .filter_map(|item| {
            let item = match item {
                Value::Object(mut obj) => {
                    obj.entry("type").or_insert_with(|| json!(default_type));
                    Value::Object(obj)
                }
                other => other,
            };
            match serde_json::from_value(item) {
                Ok(zone) => Some(zone),
                Err(err) => {
                    warn!("config '{key}': skipping entry: {err}");
                    None
                }
            }
        })
        .collect();
    Some(parsed)
}

fn read_callback(config: &Config, key: &str, registry: &CallbackRegistry) -> Option<ParticleCallback> {
    let name = read::<String>(config, key)?;
    let callback = registry.particle(&name);
    if callback.is_none() {
        warn!("config '{key}': no particle callback registered as '{name}'");
    }
    callback
}

fn to_value<T: Serialize>(value: &T) -> Value {
    serde_json::to_value(value).unwrap_or_default()
}
