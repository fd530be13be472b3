use image::RgbaImage;
use std::fmt;

/// A coerced descriptor value.
///
/// Quoted text becomes `Str`, then integer and float parses are tried in
/// that order. Anything else (comma separated delays, hotspots) stays `Raw`.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Str(String),
    Int(i64),
    Float(f64),
    Raw(String),
}

impl Value {
    pub fn coerce(text: &str) -> Self {
        if text.starts_with('"') {
            return Value::Str(text.replace('"', ""));
        }
        if let Ok(i) = text.parse::<i64>() {
            return Value::Int(i);
        }
        if let Ok(f) = text.parse::<f64>() {
            return Value::Float(f);
        }
        Value::Raw(text.to_string())
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Int(i) => Some(*i as f64),
            Value::Float(f) => Some(*f),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Str(s) | Value::Raw(s) => f.write_str(s),
            Value::Int(i) => write!(f, "{}", i),
            // Whole floats keep their trailing `.0` so `4.0` stays `4.0`
            Value::Float(v) if v.is_finite() && v.fract() == 0.0 && v.abs() < 1e16 => {
                write!(f, "{:.1}", v)
            }
            Value::Float(v) => write!(f, "{}", v),
        }
    }
}

#[derive(Debug, Clone)]
pub struct StateDeclaration {
    pub name: String,
    pub dirs: u32,
    pub frames: u32,
    pub delay: Option<Value>,
    /// Any other attributes of the block (`loop`, `rewind`, `hotspot`...), in order.
    pub extra: Vec<(String, Value)>,
    /// Global frame indices owned by this state, frame-major then direction.
    pub frame_indices: Vec<usize>,
    /// Pixel blocks aligned with `frame_indices`.
    pub pixel_tiles: Vec<RgbaImage>,
}

impl StateDeclaration {
    pub fn new(name: impl Into<String>, dirs: u32, frames: u32) -> Self {
        Self {
            name: name.into(),
            dirs,
            frames,
            delay: None,
            extra: Vec::new(),
            frame_indices: Vec::new(),
            pixel_tiles: Vec::new(),
        }
    }

    pub fn with_delay(mut self, delay: Value) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Number of grid slots this state occupies (`frames * dirs`).
    pub fn slot_count(&self) -> usize {
        self.frames as usize * self.dirs as usize
    }
}

#[derive(Debug, Clone)]
pub struct Descriptor {
    pub version: Value,
    pub width: u32,
    pub height: u32,
    pub states: Vec<StateDeclaration>,
}

impl Descriptor {
    /// First state declared under `name`.
    pub fn state(&self, name: &str) -> Option<&StateDeclaration> {
        self.states.iter().find(|s| s.name == name)
    }

    pub fn total_frames(&self) -> usize {
        self.states.iter().map(StateDeclaration::slot_count).sum()
    }
}
