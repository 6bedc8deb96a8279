use std::collections::BTreeMap;
use std::fmt;
use tracing::warn;

/// Live value of one tunable, carrying its kind and bounds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ParameterValue {
    Float { value: f32, min: f32, max: f32 },
    Int { value: i32, min: i32, max: i32 },
    Bool(bool),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParameterKind {
    Float,
    Int,
    Bool,
}

/// Untyped input accepted by [`ParameterStore::set`]; coerced to the declared kind.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Scalar {
    Float(f32),
    Int(i32),
    Bool(bool),
}

impl ParameterValue {
    pub fn float(value: f32, min: f32, max: f32) -> Self {
        let (min, max) = if min <= max { (min, max) } else { (max, min) };
        Self::Float {
            value: value.clamp(min, max),
            min,
            max,
        }
    }

    pub fn int(value: i32, min: i32, max: i32) -> Self {
        let (min, max) = if min <= max { (min, max) } else { (max, min) };
        Self::Int {
            value: value.clamp(min, max),
            min,
            max,
        }
    }

    pub fn kind(&self) -> ParameterKind {
        match self {
            Self::Float { .. } => ParameterKind::Float,
            Self::Int { .. } => ParameterKind::Int,
            Self::Bool(_) => ParameterKind::Bool,
        }
    }

    pub fn as_f32(&self) -> f32 {
        match *self {
            Self::Float { value, .. } => value,
            Self::Int { value, .. } => value as f32,
            Self::Bool(v) => {
                if v {
                    1.0
                } else {
                    0.0
                }
            }
        }
    }

    pub fn as_i32(&self) -> i32 {
        match *self {
            Self::Float { value, .. } => value.round() as i32,
            Self::Int { value, .. } => value,
            Self::Bool(v) => i32::from(v),
        }
    }

    pub fn as_bool(&self) -> bool {
        match *self {
            Self::Float { value, .. } => value != 0.0,
            Self::Int { value, .. } => value != 0,
            Self::Bool(v) => v,
        }
    }

    pub fn scalar(&self) -> Scalar {
        match *self {
            Self::Float { value, .. } => Scalar::Float(value),
            Self::Int { value, .. } => Scalar::Int(value),
            Self::Bool(v) => Scalar::Bool(v),
        }
    }

    /// Text form used by snapshot files.
    pub fn to_raw(&self) -> String {
        match *self {
            Self::Float { value, .. } => format!("{value}"),
            Self::Int { value, .. } => format!("{value}"),
            Self::Bool(v) => String::from(if v { "1" } else { "0" }),
        }
    }

    fn assign(&mut self, input: Scalar) -> bool {
        match self {
            Self::Float { value, min, max } => {
                let v = match input {
                    Scalar::Float(v) => v,
                    Scalar::Int(v) => v as f32,
                    Scalar::Bool(v) => f32::from(u8::from(v)),
                };
                if !v.is_finite() {
                    return false;
                }
                *value = v.clamp(*min, *max);
            }
            Self::Int { value, min, max } => {
                let v = match input {
                    Scalar::Float(v) => {
                        if !v.is_finite() {
                            return false;
                        }
                        v.clamp(*min as f32, *max as f32).round() as i32
                    }
                    Scalar::Int(v) => v,
                    Scalar::Bool(v) => i32::from(v),
                };
                *value = v.clamp(*min, *max);
            }
            Self::Bool(value) => {
                *value = match input {
                    Scalar::Float(v) => v != 0.0,
                    Scalar::Int(v) => v != 0,
                    Scalar::Bool(v) => v,
                };
            }
        }
        true
    }

    fn assign_raw(&mut self, raw: &str) -> bool {
        let raw = raw.trim();
        let input = match self.kind() {
            ParameterKind::Float => match raw.parse::<f32>() {
                Ok(v) => Scalar::Float(v),
                Err(_) => return false,
            },
            ParameterKind::Int => match raw.parse::<i32>() {
                Ok(v) => Scalar::Int(v),
                Err(_) => match raw.parse::<f32>() {
                    Ok(v) => Scalar::Float(v),
                    Err(_) => return false,
                },
            },
            ParameterKind::Bool => match parse_bool(raw) {
                Some(v) => Scalar::Bool(v),
                None => return false,
            },
        };
        self.assign(input)
    }
}

impl fmt::Display for ParameterValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Self::Float { value, .. } => write!(f, "{value:.3}"),
            Self::Int { value, .. } => write!(f, "{value}"),
            Self::Bool(v) => write!(f, "{}", if v { "on" } else { "off" }),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParamError {
    KeyNotFound(String),
    InvalidValue { key: String, raw: String },
}

impl fmt::Display for ParamError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::KeyNotFound(key) => write!(f, "unknown parameter: {key}"),
            Self::InvalidValue { key, raw } => write!(f, "invalid value for {key}: '{raw}'"),
        }
    }
}

impl std::error::Error for ParamError {}

pub type ListenerId = usize;

type Listener = Box<dyn FnMut(&str, &ParameterValue)>;

struct ListenerSlot {
    id: ListenerId,
    prefix: String,
    callback: Listener,
}

/// Flat `group:subgroup:leaf` keyed store of the live configuration.
///
/// Keys are declared once (see `registry::default_store`); writes to
/// undeclared keys are dropped with a warning. Listeners run synchronously,
/// in registration order, after every accepted write under their prefix.
pub struct ParameterStore {
    values: BTreeMap<String, ParameterValue>,
    listeners: Vec<ListenerSlot>,
    next_listener: ListenerId,
}

impl Default for ParameterStore {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ParameterStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ParameterStore")
            .field("values", &self.values)
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

impl ParameterStore {
    pub fn new() -> Self {
        Self {
            values: BTreeMap::new(),
            listeners: Vec::new(),
            next_listener: 1,
        }
    }

    pub fn declare(&mut self, key: impl Into<String>, value: ParameterValue) {
        self.values.insert(key.into(), value);
    }

    pub fn contains(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn get(&self, key: &str) -> Result<ParameterValue, ParamError> {
        self.values
            .get(key)
            .copied()
            .ok_or_else(|| ParamError::KeyNotFound(key.to_string()))
    }

    pub fn get_f32(&self, key: &str) -> Option<f32> {
        self.values.get(key).map(ParameterValue::as_f32)
    }

    pub fn get_i32(&self, key: &str) -> Option<i32> {
        self.values.get(key).map(ParameterValue::as_i32)
    }

    pub fn get_bool(&self, key: &str) -> Option<bool> {
        self.values.get(key).map(ParameterValue::as_bool)
    }

    /// Returns false when the key is unknown or the input is not a finite number.
    pub fn set(&mut self, key: &str, input: Scalar) -> bool {
        let Some(slot) = self.values.get_mut(key) else {
            warn!(key, "ignoring write to unknown parameter");
            return false;
        };
        if !slot.assign(input) {
            warn!(key, ?input, "ignoring non-finite parameter value");
            return false;
        }
        self.notify(key);
        true
    }

    /// Parses `raw` according to the declared kind of `key`.
    pub fn set_raw(&mut self, key: &str, raw: &str) -> Result<(), ParamError> {
        let Some(slot) = self.values.get_mut(key) else {
            return Err(ParamError::KeyNotFound(key.to_string()));
        };
        if !slot.assign_raw(raw) {
            return Err(ParamError::InvalidValue {
                key: key.to_string(),
                raw: raw.to_string(),
            });
        }
        self.notify(key);
        Ok(())
    }

    /// Adds `delta` to a numeric parameter, saturating at its bounds.
    pub fn nudge(&mut self, key: &str, delta: f32) -> bool {
        let Some(current) = self.get_f32(key) else {
            warn!(key, "ignoring nudge of unknown parameter");
            return false;
        };
        self.set(key, Scalar::Float(current + delta))
    }

    pub fn toggle(&mut self, key: &str) -> bool {
        let Some(current) = self.get_bool(key) else {
            warn!(key, "ignoring toggle of unknown parameter");
            return false;
        };
        self.set(key, Scalar::Bool(!current))
    }

    /// Steps an integer parameter forward, wrapping from max back to min.
    pub fn cycle(&mut self, key: &str) -> bool {
        let next = match self.values.get(key) {
            Some(ParameterValue::Int { value, min, max }) => {
                let span = i64::from(*max) - i64::from(*min) + 1;
                let offset = (i64::from(*value) - i64::from(*min) + 1).rem_euclid(span);
                (i64::from(*min) + offset) as i32
            }
            Some(ParameterValue::Bool(v)) => i32::from(!*v),
            Some(ParameterValue::Float { .. }) => {
                warn!(key, "cannot cycle a float parameter");
                return false;
            }
            None => {
                warn!(key, "ignoring cycle of unknown parameter");
                return false;
            }
        };
        self.set(key, Scalar::Int(next))
    }

    /// Iterates `(key, value)` pairs inside a group, in key order. An empty
    /// prefix yields everything.
    pub fn for_each<'a>(
        &'a self,
        prefix: &'a str,
    ) -> impl Iterator<Item = (&'a str, &'a ParameterValue)> + 'a {
        self.values
            .iter()
            .filter(move |(key, _)| key_in_group(key, prefix))
            .map(|(key, value)| (key.as_str(), value))
    }

    pub fn subscribe(
        &mut self,
        prefix: impl Into<String>,
        callback: impl FnMut(&str, &ParameterValue) + 'static,
    ) -> ListenerId {
        let id = self.next_listener;
        self.next_listener += 1;
        self.listeners.push(ListenerSlot {
            id,
            prefix: prefix.into(),
            callback: Box::new(callback),
        });
        id
    }

    pub fn unsubscribe(&mut self, id: ListenerId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|slot| slot.id != id);
        self.listeners.len() != before
    }

    fn notify(&mut self, key: &str) {
        let Some(value) = self.values.get(key).copied() else {
            return;
        };
        for slot in &mut self.listeners {
            if key_in_group(key, &slot.prefix) {
                (slot.callback)(key, &value);
            }
        }
    }
}

/// `settings:fluid` contains `settings:fluid:speed` but not `settings:fluidity`.
pub fn key_in_group(key: &str, prefix: &str) -> bool {
    let prefix = prefix.trim_end_matches(':');
    if prefix.is_empty() {
        return true;
    }
    match key.strip_prefix(prefix) {
        Some(rest) => rest.is_empty() || rest.starts_with(':'),
        None => false,
    }
}

pub fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
