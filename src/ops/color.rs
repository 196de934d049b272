//! Tint driven through a list of colors over a particle's life

use super::callbacks::CallbackRegistry;
use crate::ease::{Ease, EaseRegistry, Interpolation};
use crate::error::json_kind;
use crate::util::{rgb_to_tint, tint_to_rgb};
use log::warn;
use serde_json::{json, Map, Value};

/// Color ramp for the `color` and `colorEase` keys.
///
/// While it holds any colors it replaces the `tint` op: particles are fired
/// with the first color and blend channel by channel towards the last one
/// as they age.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ColorOp {
    colors: Vec<u32>,
    r: Vec<f32>,
    g: Vec<f32>,
    b: Vec<f32>,
    ease: Ease,
    ease_name: Option<String>,
    current: u32,
}

impl ColorOp {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the ramp. An empty list turns the op off.
    pub fn set_colors(&mut self, colors: Vec<u32>, ease: Option<&str>, eases: &EaseRegistry) {
        let channels = colors.iter().map(|&c| tint_to_rgb(c));
        self.r = channels.clone().map(|(r, _, _)| f32::from(r)).collect();
        self.g = channels.clone().map(|(_, g, _)| f32::from(g)).collect();
        self.b = channels.map(|(_, _, b)| f32::from(b)).collect();
        self.current = colors.first().copied().unwrap_or(0x00FF_FFFF) & 0x00FF_FFFF;
        self.colors = colors;

        self.ease_name = ease.map(str::to_string);
        self.ease = eases.ease(ease.unwrap_or("Linear"), &[]);
    }

    /// Read `color` and `colorEase`. A missing `color` turns the op off.
    pub fn load(&mut self, config: &Map<String, Value>, registry: &CallbackRegistry) {
        let colors = match config.get("color") {
            None | Some(Value::Null) => Vec::new(),
            Some(Value::Array(items)) => items
                .iter()
                .filter_map(|item| match item.as_f64() {
                    Some(c) if c >= 0.0 => Some((c as u32) & 0x00FF_FFFF),
                    _ => {
                        warn!("config 'color': skipping {}", json_kind(item));
                        None
                    }
                })
                .collect(),
            Some(Value::Number(n)) => n
                .as_f64()
                .map(|c| vec![(c.max(0.0) as u32) & 0x00FF_FFFF])
                .unwrap_or_default(),
            Some(other) => {
                warn!("config 'color': expected a list of colors, got {}", json_kind(other));
                Vec::new()
            }
        };

        let ease = config.get("colorEase").and_then(Value::as_str);
        self.set_colors(colors, ease, registry.eases());
    }

    pub fn is_active(&self) -> bool {
        !self.colors.is_empty()
    }

    pub fn colors(&self) -> &[u32] {
        &self.colors
    }

    pub fn ease_name(&self) -> Option<&str> {
        self.ease_name.as_deref()
    }

    /// Most recently produced tint
    pub fn current(&self) -> u32 {
        self.current
    }

    /// Tint for a particle being fired, `None` while inactive
    pub fn emit(&mut self) -> Option<u32> {
        let first = *self.colors.first()?;
        self.current = first;
        Some(first)
    }

    /// Tint at normalized age `t`, `None` while inactive
    pub fn update(&mut self, t: f32) -> Option<u32> {
        if !self.is_active() {
            return None;
        }
        let v = self.ease.apply(t);
        let channel = |values: &[f32]| {
            Interpolation::Linear.apply(values, v).round().clamp(0.0, 255.0) as u8
        };
        self.current = rgb_to_tint((channel(&self.r), channel(&self.g), channel(&self.b)));
        Some(self.current)
    }

    /// `color` and `colorEase` entries, empty while inactive
    pub fn to_json(&self) -> Map<String, Value> {
        let mut out = Map::new();
        if self.is_active() {
            out.insert("color".into(), json!(self.colors));
            if let Some(name) = &self.ease_name {
                out.insert("colorEase".into(), json!(name));
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ramp(colors: Vec<u32>, ease: Option<&str>) -> ColorOp {
        let mut op = ColorOp::new();
        op.set_colors(colors, ease, &EaseRegistry::new());
        op
    }

    #[test]
    fn test_inactive_without_colors() {
        let mut op = ColorOp::new();
        assert!(!op.is_active());
        assert_eq!(op.emit(), None);
        assert_eq!(op.update(0.5), None);
        assert!(op.to_json().is_empty());
    }

    #[test]
    fn test_blends_channels() {
        let mut op = ramp(vec![0xFF_00_00, 0x00_00_FF], None);
        assert_eq!(op.emit(), Some(0xFF_00_00));
        assert_eq!(op.update(0.0), Some(0xFF_00_00));
        assert_eq!(op.update(0.5), Some(0x80_00_80));
        assert_eq!(op.update(1.0), Some(0x00_00_FF));
    }

    #[test]
    fn test_three_stop_ramp() {
        let mut op = ramp(vec![0x00_00_00, 0xFF_FF_FF, 0x00_00_00], None);
        assert_eq!(op.update(0.5), Some(0xFF_FF_FF));
        assert_eq!(op.update(0.25), Some(0x80_80_80));
    }

    #[test]
    fn test_ease_shapes_the_blend() {
        let mut op = ramp(vec![0x00_00_00, 0x00_00_FF], Some("Quad.easeIn"));
        // 0.5 squared is a quarter of the way
        assert_eq!(op.update(0.5), Some(0x00_00_40));
        assert_eq!(op.ease_name(), Some("Quad.easeIn"));
    }

    #[test]
    fn test_load_from_config() {
        let config = json!({"color": [16711680, 255, "red"], "colorEase": "Sine.easeOut"});
        let mut op = ColorOp::new();
        op.load(config.as_object().unwrap(), &CallbackRegistry::new());
        assert_eq!(op.colors(), &[0xFF_00_00, 0x00_00_FF]);

        let out = op.to_json();
        assert_eq!(out["color"], json!([16711680, 255]));
        assert_eq!(out["colorEase"], json!("Sine.easeOut"));

        op.load(&Map::new(), &CallbackRegistry::new());
        assert!(!op.is_active());
    }
}
