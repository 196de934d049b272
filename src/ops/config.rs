//! Op configuration shapes and their JSON form

use super::callbacks::{CallbackRegistry, EmitCallback, UpdateCallback};
use crate::error::json_kind;
use serde_json::{json, Map, Value};

/// How an op produces values, in classification order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum OpMethod {
    /// Pass the incoming value through unchanged
    Identity = 0,
    Constant = 1,
    RandomArray = 2,
    Callback = 3,
    Stepped = 4,
    Eased = 5,
    MinMax = 6,
    RandomRange = 7,
    CustomCallbacks = 8,
    Interpolated = 9,
}

impl OpMethod {
    pub fn index(self) -> u8 {
        self as u8
    }
}

/// A classified op configuration.
///
/// Produced from JSON by [`OpConfig::classify`] or built directly. The shape
/// alone decides the [`OpMethod`].
#[derive(Debug, Clone, Default, PartialEq)]
pub enum OpConfig {
    #[default]
    Identity,
    Constant(f32),
    RandomArray(Vec<f32>),
    Callback(EmitCallback),
    Stepped {
        start: f32,
        end: f32,
        steps: u32,
        yoyo: bool,
    },
    Eased {
        start: f32,
        end: f32,
        ease: Option<String>,
        ease_params: Vec<f32>,
        random: bool,
    },
    MinMax {
        min: f32,
        max: f32,
        int: bool,
    },
    RandomRange {
        min: f32,
        max: f32,
    },
    Custom {
        on_emit: Option<EmitCallback>,
        on_update: Option<UpdateCallback>,
    },
    Interpolated {
        values: Vec<f32>,
        interpolation: Option<String>,
        ease: Option<String>,
        ease_params: Vec<f32>,
    },
}

impl From<f32> for OpConfig {
    fn from(value: f32) -> Self {
        Self::Constant(value)
    }
}

impl From<Vec<f32>> for OpConfig {
    fn from(values: Vec<f32>) -> Self {
        Self::RandomArray(values)
    }
}

impl OpConfig {
    pub fn range(min: f32, max: f32) -> Self {
        Self::MinMax {
            min,
            max,
            int: false,
        }
    }

    pub fn eased(start: f32, end: f32, ease: &str) -> Self {
        Self::Eased {
            start,
            end,
            ease: Some(ease.to_string()),
            ease_params: Vec::new(),
            random: false,
        }
    }

    pub fn stepped(start: f32, end: f32, steps: u32, yoyo: bool) -> Self {
        Self::Stepped {
            start,
            end,
            steps,
            yoyo,
        }
    }

    pub fn method(&self) -> OpMethod {
        match self {
            Self::Identity => OpMethod::Identity,
            Self::Constant(_) => OpMethod::Constant,
            Self::RandomArray(_) => OpMethod::RandomArray,
            Self::Callback(_) => OpMethod::Callback,
            Self::Stepped { .. } => OpMethod::Stepped,
            Self::Eased { .. } => OpMethod::Eased,
            Self::MinMax { .. } => OpMethod::MinMax,
            Self::RandomRange { .. } => OpMethod::RandomRange,
            Self::Custom { .. } => OpMethod::CustomCallbacks,
            Self::Interpolated { .. } => OpMethod::Interpolated,
        }
    }

    /// Classify a JSON value for the op named `key`.
    ///
    /// More specific shapes are checked first. Shapes that match nothing,
    /// and callback names missing from the registry, become `Identity`.
    pub fn classify(value: &Value, key: &str, registry: &CallbackRegistry) -> Self {
        match value {
            Value::Null => Self::Identity,
            Value::Number(n) => Self::Constant(n.as_f64().unwrap_or_default() as f32),
            Value::Array(items) => match numbers(items) {
                Some(values) if !values.is_empty() => Self::RandomArray(values),
                _ => {
                    log::warn!("op '{key}': expected a non-empty array of numbers");
                    Self::Identity
                }
            },
            Value::String(name) => match registry.emit(name) {
                Some(cb) => Self::Callback(cb),
                None => {
                    log::warn!("op '{key}': no emit callback registered as '{name}'");
                    Self::Identity
                }
            },
            Value::Object(obj) => classify_object(obj, key, registry),
            Value::Bool(_) => {
                log::warn!("op '{key}': cannot use {} as a value", json_kind(value));
                Self::Identity
            }
        }
    }

    /// The JSON form of this configuration. Unnamed callbacks become `null`.
    pub fn to_json(&self) -> Value {
        match self {
            Self::Identity => Value::Null,
            Self::Constant(v) => number(*v),
            Self::RandomArray(values) => number_array(values),
            Self::Callback(cb) => callback_name(cb.name()),
            Self::Stepped {
                start,
                end,
                steps,
                yoyo,
            } => {
                let mut obj = Map::new();
                obj.insert("start".into(), number(*start));
                obj.insert("end".into(), number(*end));
                obj.insert("steps".into(), json!(steps));
                if *yoyo {
                    obj.insert("yoyo".into(), Value::Bool(true));
                }
                Value::Object(obj)
            }
            Self::Eased {
                start,
                end,
                ease,
                ease_params,
                random,
            } => {
                let mut obj = Map::new();
                obj.insert("start".into(), number(*start));
                obj.insert("end".into(), number(*end));
                insert_ease(&mut obj, ease.as_deref(), ease_params);
                if *random {
                    obj.insert("random".into(), Value::Bool(true));
                }
                Value::Object(obj)
            }
            Self::MinMax { min, max, int } => {
                let mut obj = Map::new();
                obj.insert("min".into(), number(*min));
                obj.insert("max".into(), number(*max));
                if *int {
                    obj.insert("int".into(), Value::Bool(true));
                }
                Value::Object(obj)
            }
            Self::RandomRange { min, max } => json!({ "random": [number(*min), number(*max)] }),
            Self::Custom { on_emit, on_update } => {
                let mut obj = Map::new();
                if let Some(cb) = on_emit {
                    obj.insert("onEmit".into(), callback_name(cb.name()));
                }
                if let Some(cb) = on_update {
                    obj.insert("onUpdate".into(), callback_name(cb.name()));
                }
                // Keep the shape recognisable even with neither side set
                if obj.is_empty() {
                    obj.insert("onEmit".into(), Value::Null);
                }
                Value::Object(obj)
            }
            Self::Interpolated {
                values,
                interpolation,
                ease,
                ease_params,
            } => {
                let mut obj = Map::new();
                obj.insert("values".into(), number_array(values));
                if let Some(name) = interpolation {
                    obj.insert("interpolation".into(), Value::String(name.clone()));
                }
                insert_ease(&mut obj, ease.as_deref(), ease_params);
                Value::Object(obj)
            }
        }
    }
}

fn classify_object(obj: &Map<String, Value>, key: &str, registry: &CallbackRegistry) -> OpConfig {
    let has = |k: &str| obj.contains_key(k);

    if has("start") && has("end") {
        let start = required_number(obj, "start", key);
        let end = required_number(obj, "end", key);

        if has("steps") {
            let steps = required_number(obj, "steps", key);
            return OpConfig::Stepped {
                start,
                end,
                steps: steps.max(1.0) as u32,
                yoyo: flag(obj, "yoyo"),
            };
        }

        return OpConfig::Eased {
            start,
            end,
            ease: string(obj, "ease"),
            ease_params: ease_params(obj),
            random: flag(obj, "random"),
        };
    }

    if has("min") && has("max") {
        return OpConfig::MinMax {
            min: required_number(obj, "min", key),
            max: required_number(obj, "max", key),
            int: flag(obj, "int"),
        };
    }

    if has("random") {
        return match obj.get("random").and_then(Value::as_array).and_then(|a| numbers(a)) {
            Some(range) if range.len() >= 2 => OpConfig::RandomRange {
                min: range[0],
                max: range[1],
            },
            _ => {
                log::warn!("op '{key}': 'random' must be an array of two numbers");
                OpConfig::Identity
            }
        };
    }

    if has("onEmit") || has("onUpdate") {
        let on_emit = obj
            .get("onEmit")
            .and_then(Value::as_str)
            .and_then(|name| lookup(name, key, |n| registry.emit(n)));
        let on_update = obj
            .get("onUpdate")
            .and_then(Value::as_str)
            .and_then(|name| lookup(name, key, |n| registry.update(n)));
        return OpConfig::Custom { on_emit, on_update };
    }

    if has("values") || has("interpolation") {
        let values = obj
            .get("values")
            .and_then(Value::as_array)
            .and_then(|a| numbers(a))
            .unwrap_or_else(|| {
                log::warn!("op '{key}': 'values' must be an array of numbers");
                Vec::new()
            });
        return OpConfig::Interpolated {
            values,
            interpolation: string(obj, "interpolation"),
            ease: string(obj, "ease"),
            ease_params: ease_params(obj),
        };
    }

    log::warn!("op '{key}': unrecognised configuration object");
    OpConfig::Identity
}

fn lookup<T>(name: &str, key: &str, find: impl FnOnce(&str) -> Option<T>) -> Option<T> {
    let found = find(name);
    if found.is_none() {
        log::warn!("op '{key}': no callback registered as '{name}'");
    }
    found
}

fn numbers(items: &[Value]) -> Option<Vec<f32>> {
    items
        .iter()
        .map(|v| v.as_f64().map(|n| n as f32))
        .collect()
}

fn required_number(obj: &Map<String, Value>, field: &str, key: &str) -> f32 {
    match obj.get(field) {
        Some(Value::Number(n)) => n.as_f64().unwrap_or_default() as f32,
        Some(other) => {
            log::warn!("op '{key}': '{field}' should be a number, got {}", json_kind(other));
            0.0
        }
        None => 0.0,
    }
}

fn flag(obj: &Map<String, Value>, field: &str) -> bool {
    obj.get(field).and_then(Value::as_bool).unwrap_or(false)
}

fn string(obj: &Map<String, Value>, field: &str) -> Option<String> {
    obj.get(field).and_then(Value::as_str).map(str::to_string)
}

fn ease_params(obj: &Map<String, Value>) -> Vec<f32> {
    obj.get("easeParams")
        .and_then(Value::as_array)
        .and_then(|a| numbers(a))
        .unwrap_or_default()
}

fn insert_ease(obj: &mut Map<String, Value>, ease: Option<&str>, params: &[f32]) {
    if let Some(name) = ease {
        obj.insert("ease".into(), Value::String(name.to_string()));
    }
    if !params.is_empty() {
        obj.insert("easeParams".into(), number_array(params));
    }
}

fn callback_name(name: Option<&str>) -> Value {
    name.map_or(Value::Null, |n| Value::String(n.to_string()))
}

/// Whole numbers are written as JSON integers
pub(crate) fn number(v: f32) -> Value {
    if v.fract() == 0.0 && v.abs() < 1e15 {
        Value::from(v as i64)
    } else {
        Value::from(f64::from(v))
    }
}

fn number_array(values: &[f32]) -> Value {
    Value::Array(values.iter().map(|v| number(*v)).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn classify(value: Value) -> OpConfig {
        let mut registry = CallbackRegistry::new();
        registry
            .register_emit("jitter", |_, _, v| v + 1.0)
            .register_update("fade", |_, _, t, _| 1.0 - t);
        OpConfig::classify(&value, "alpha", &registry)
    }

    #[test]
    fn test_classification_order() {
        let cases = [
            (json!(null), OpMethod::Identity),
            (json!(4), OpMethod::Constant),
            (json!([1, 2, 3]), OpMethod::RandomArray),
            (json!("jitter"), OpMethod::Callback),
            (json!({"start": 0, "end": 1, "steps": 4}), OpMethod::Stepped),
            (json!({"start": 0, "end": 1}), OpMethod::Eased),
            (json!({"start": 0, "end": 1, "min": 0, "max": 1}), OpMethod::Eased),
            (json!({"min": 0, "max": 1}), OpMethod::MinMax),
            (json!({"random": [2, 5]}), OpMethod::RandomRange),
            (json!({"onUpdate": "fade"}), OpMethod::CustomCallbacks),
            (json!({"values": [1, 2]}), OpMethod::Interpolated),
            (json!({"interpolation": "catmull"}), OpMethod::Interpolated),
        ];
        for (value, method) in cases {
            assert_eq!(classify(value.clone()).method(), method, "{value}");
        }
    }

    #[test]
    fn test_degrades_to_identity() {
        for value in [
            json!(true),
            json!([]),
            json!(["a"]),
            json!("missing"),
            json!({"random": 3}),
            json!({"unrelated": 1}),
        ] {
            assert_eq!(classify(value.clone()), OpConfig::Identity, "{value}");
        }
    }

    #[test]
    fn test_steps_clamped_to_one() {
        assert_eq!(
            classify(json!({"start": 0, "end": 10, "steps": 0})),
            OpConfig::stepped(0.0, 10.0, 1, false)
        );
    }

    #[test]
    fn test_json_shapes() {
        assert_eq!(classify(json!(0.5)).to_json(), json!(0.5));
        assert_eq!(classify(json!("jitter")).to_json(), json!("jitter"));
        assert_eq!(
            classify(json!({"start": 1, "end": 0, "ease": "Quad.easeIn", "random": true}))
                .to_json(),
            json!({"start": 1, "end": 0, "ease": "Quad.easeIn", "random": true})
        );
        assert_eq!(
            classify(json!({"onEmit": "jitter", "onUpdate": "fade"})).to_json(),
            json!({"onEmit": "jitter", "onUpdate": "fade"})
        );
        assert_eq!(
            OpConfig::Callback(EmitCallback::new(|_, _, v| v)).to_json(),
            Value::Null
        );
    }

    #[test]
    fn test_whole_numbers_stay_integers() {
        assert_eq!(number(3.0).to_string(), "3");
        assert_eq!(number(0.25).to_string(), "0.25");
    }
}
