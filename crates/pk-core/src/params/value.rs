//! Parameter values and bound parameter sets

use std::fmt;
use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};

use super::ParameterError;

/// A single parameter value
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ParamValue {
    Float(f64),
    Int(i64),
    Bool(bool),
    Text(String),
    /// Nested record of sub-parameters
    Record(Params),
}

impl ParamValue {
    /// Short type name used in error messages
    pub fn type_name(&self) -> &'static str {
        match self {
            ParamValue::Float(_) => "float",
            ParamValue::Int(_) => "int",
            ParamValue::Bool(_) => "bool",
            ParamValue::Text(_) => "text",
            ParamValue::Record(_) => "record",
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            ParamValue::Float(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            ParamValue::Int(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            ParamValue::Bool(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            ParamValue::Text(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_record(&self) -> Option<&Params> {
        match self {
            ParamValue::Record(v) => Some(v),
            _ => None,
        }
    }
}

// Floats compare and hash by bit pattern so bound parameter sets can key
// the geometry cache. Validation canonicalizes -0.0 and rejects NaN.
impl PartialEq for ParamValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (ParamValue::Float(a), ParamValue::Float(b)) => a.to_bits() == b.to_bits(),
            (ParamValue::Int(a), ParamValue::Int(b)) => a == b,
            (ParamValue::Bool(a), ParamValue::Bool(b)) => a == b,
            (ParamValue::Text(a), ParamValue::Text(b)) => a == b,
            (ParamValue::Record(a), ParamValue::Record(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for ParamValue {}

impl Hash for ParamValue {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            ParamValue::Float(v) => v.to_bits().hash(state),
            ParamValue::Int(v) => v.hash(state),
            ParamValue::Bool(v) => v.hash(state),
            ParamValue::Text(v) => v.hash(state),
            ParamValue::Record(v) => v.hash(state),
        }
    }
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamValue::Float(v) => write!(f, "{v:?}"),
            ParamValue::Int(v) => write!(f, "{v}"),
            ParamValue::Bool(v) => write!(f, "{v}"),
            ParamValue::Text(v) => write!(f, "{v:?}"),
            ParamValue::Record(v) => write!(f, "({v})"),
        }
    }
}

impl From<f64> for ParamValue {
    fn from(v: f64) -> Self {
        ParamValue::Float(v)
    }
}

impl From<f32> for ParamValue {
    fn from(v: f32) -> Self {
        ParamValue::Float(v as f64)
    }
}

impl From<i64> for ParamValue {
    fn from(v: i64) -> Self {
        ParamValue::Int(v)
    }
}

impl From<i32> for ParamValue {
    fn from(v: i32) -> Self {
        ParamValue::Int(v as i64)
    }
}

impl From<u32> for ParamValue {
    fn from(v: u32) -> Self {
        ParamValue::Int(v as i64)
    }
}

impl From<bool> for ParamValue {
    fn from(v: bool) -> Self {
        ParamValue::Bool(v)
    }
}

impl From<&str> for ParamValue {
    fn from(v: &str) -> Self {
        ParamValue::Text(v.to_string())
    }
}

impl From<String> for ParamValue {
    fn from(v: String) -> Self {
        ParamValue::Text(v)
    }
}

impl From<Params> for ParamValue {
    fn from(v: Params) -> Self {
        ParamValue::Record(v)
    }
}

impl From<ParamArgs> for ParamValue {
    fn from(v: ParamArgs) -> Self {
        ParamValue::Record(Params { entries: v.values })
    }
}

/// A validated, ordered set of parameter values (declaration order)
///
/// Only produced by schema binding, so every value has passed its domain
/// check. Read-only: there is no setter.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Params {
    entries: Vec<(String, ParamValue)>,
}

impl Params {
    pub(crate) fn from_entries(entries: Vec<(String, ParamValue)>) -> Self {
        Self { entries }
    }

    pub fn get(&self, name: &str) -> Option<&ParamValue> {
        self.entries.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }

    fn require(&self, name: &str) -> Result<&ParamValue, ParameterError> {
        self.get(name)
            .ok_or_else(|| ParameterError::Unknown(name.to_string()))
    }

    fn mismatch(name: &str, expected: &str, found: &ParamValue) -> ParameterError {
        ParameterError::TypeMismatch {
            name: name.to_string(),
            expected: expected.to_string(),
            found: found.type_name().to_string(),
        }
    }

    pub fn float(&self, name: &str) -> Result<f64, ParameterError> {
        let value = self.require(name)?;
        value
            .as_f64()
            .ok_or_else(|| Self::mismatch(name, "float", value))
    }

    pub fn int(&self, name: &str) -> Result<i64, ParameterError> {
        let value = self.require(name)?;
        value.as_i64().ok_or_else(|| Self::mismatch(name, "int", value))
    }

    pub fn bool(&self, name: &str) -> Result<bool, ParameterError> {
        let value = self.require(name)?;
        value
            .as_bool()
            .ok_or_else(|| Self::mismatch(name, "bool", value))
    }

    pub fn text(&self, name: &str) -> Result<&str, ParameterError> {
        let value = self.require(name)?;
        value.as_str().ok_or_else(|| Self::mismatch(name, "text", value))
    }

    pub fn record(&self, name: &str) -> Result<&Params, ParameterError> {
        let value = self.require(name)?;
        value
            .as_record()
            .ok_or_else(|| Self::mismatch(name, "record", value))
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ParamValue)> {
        self.entries.iter().map(|(n, v)| (n.as_str(), v))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(n, _)| n.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Turn the bound values back into construction arguments
    pub fn to_args(&self) -> ParamArgs {
        ParamArgs {
            values: self.entries.clone(),
        }
    }
}

impl fmt::Display for Params {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, (name, value)) in self.entries.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{name}={value}")?;
        }
        Ok(())
    }
}

/// Keyword arguments supplied at construction time (unvalidated)
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParamArgs {
    values: Vec<(String, ParamValue)>,
}

impl ParamArgs {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style setter; a repeated name replaces the earlier value
    pub fn with(mut self, name: impl Into<String>, value: impl Into<ParamValue>) -> Self {
        self.set(name, value);
        self
    }

    pub fn set(&mut self, name: impl Into<String>, value: impl Into<ParamValue>) {
        let name = name.into();
        let value = value.into();
        match self.values.iter_mut().find(|(n, _)| *n == name) {
            Some((_, slot)) => *slot = value,
            None => self.values.push((name, value)),
        }
    }

    pub fn get(&self, name: &str) -> Option<&ParamValue> {
        self.values.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.values.iter().map(|(n, _)| n.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}
