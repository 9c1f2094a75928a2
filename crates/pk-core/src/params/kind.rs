//! Parameter kinds and their domain checks

use serde::{Deserialize, Serialize};

use super::{ParamSchema, ParamValue, ParameterError};

/// One end of a float range
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Bound {
    Inclusive(f64),
    Exclusive(f64),
}

/// The declared type and domain of a parameter
#[derive(Debug, Clone, PartialEq)]
pub enum ParamKind {
    Float { min: Option<Bound>, max: Option<Bound> },
    Int { min: Option<i64>, max: Option<i64> },
    Bool,
    Text,
    /// Text restricted to a fixed set of options
    Choice(Vec<String>),
    /// Nested group of parameters with its own schema
    Record(ParamSchema),
}

impl ParamKind {
    pub fn float() -> Self {
        ParamKind::Float {
            min: None,
            max: None,
        }
    }

    /// Float strictly greater than zero
    pub fn positive_float() -> Self {
        ParamKind::Float {
            min: Some(Bound::Exclusive(0.0)),
            max: None,
        }
    }

    pub fn non_negative_float() -> Self {
        ParamKind::Float {
            min: Some(Bound::Inclusive(0.0)),
            max: None,
        }
    }

    /// Float in the closed range `[min, max]`
    pub fn float_range(min: f64, max: f64) -> Self {
        ParamKind::Float {
            min: Some(Bound::Inclusive(min)),
            max: Some(Bound::Inclusive(max)),
        }
    }

    pub fn int() -> Self {
        ParamKind::Int {
            min: None,
            max: None,
        }
    }

    pub fn positive_int() -> Self {
        ParamKind::Int {
            min: Some(1),
            max: None,
        }
    }

    pub fn non_negative_int() -> Self {
        ParamKind::Int {
            min: Some(0),
            max: None,
        }
    }

    pub fn int_range(min: i64, max: i64) -> Self {
        ParamKind::Int {
            min: Some(min),
            max: Some(max),
        }
    }

    pub fn choice<S: AsRef<str>>(options: &[S]) -> Self {
        ParamKind::Choice(options.iter().map(|s| s.as_ref().to_string()).collect())
    }

    pub fn record(schema: ParamSchema) -> Self {
        ParamKind::Record(schema)
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            ParamKind::Float { .. } => "float",
            ParamKind::Int { .. } => "int",
            ParamKind::Bool => "bool",
            ParamKind::Text | ParamKind::Choice(_) => "text",
            ParamKind::Record(_) => "record",
        }
    }

    /// Check `value` against this kind, returning the canonical value
    ///
    /// Ints widen to floats; nothing else is coerced. `-0.0` is stored as
    /// `0.0` so equal parameter sets hash equally.
    pub fn validate(&self, name: &str, value: ParamValue) -> Result<ParamValue, ParameterError> {
        match (self, value) {
            (ParamKind::Float { min, max }, ParamValue::Float(v)) => {
                check_float(name, v, min, max).map(ParamValue::Float)
            }
            (ParamKind::Float { min, max }, ParamValue::Int(v)) => {
                check_float(name, v as f64, min, max).map(ParamValue::Float)
            }
            (ParamKind::Int { min, max }, ParamValue::Int(v)) => {
                if let Some(lo) = min
                    && v < *lo
                {
                    return Err(out_of_domain(name, v, format!("must be >= {lo}")));
                }
                if let Some(hi) = max
                    && v > *hi
                {
                    return Err(out_of_domain(name, v, format!("must be <= {hi}")));
                }
                Ok(ParamValue::Int(v))
            }
            (ParamKind::Bool, ParamValue::Bool(v)) => Ok(ParamValue::Bool(v)),
            (ParamKind::Text, ParamValue::Text(v)) => Ok(ParamValue::Text(v)),
            (ParamKind::Choice(options), ParamValue::Text(v)) => {
                if options.iter().any(|o| *o == v) {
                    Ok(ParamValue::Text(v))
                } else {
                    Err(out_of_domain(
                        name,
                        format!("{v:?}"),
                        format!("must be one of [{}]", options.join(", ")),
                    ))
                }
            }
            (ParamKind::Record(schema), ParamValue::Record(inner)) => schema
                .bind(&inner.to_args())
                .map(ParamValue::Record)
                .map_err(|e| e.nested_in(name)),
            (kind, value) => Err(ParameterError::TypeMismatch {
                name: name.to_string(),
                expected: kind.type_name().to_string(),
                found: value.type_name().to_string(),
            }),
        }
    }
}

fn out_of_domain(name: &str, value: impl ToString, constraint: String) -> ParameterError {
    ParameterError::OutOfDomain {
        name: name.to_string(),
        value: value.to_string(),
        constraint,
    }
}

fn check_float(
    name: &str,
    v: f64,
    min: &Option<Bound>,
    max: &Option<Bound>,
) -> Result<f64, ParameterError> {
    if !v.is_finite() {
        return Err(out_of_domain(name, v, "must be finite".into()));
    }
    match min {
        Some(Bound::Inclusive(lo)) if v < *lo => {
            return Err(out_of_domain(name, v, format!("must be >= {lo}")));
        }
        Some(Bound::Exclusive(lo)) if v <= *lo => {
            return Err(out_of_domain(name, v, format!("must be > {lo}")));
        }
        _ => {}
    }
    match max {
        Some(Bound::Inclusive(hi)) if v > *hi => {
            return Err(out_of_domain(name, v, format!("must be <= {hi}")));
        }
        Some(Bound::Exclusive(hi)) if v >= *hi => {
            return Err(out_of_domain(name, v, format!("must be < {hi}")));
        }
        _ => {}
    }
    // -0.0 == 0.0, so this only rewrites the sign bit
    Ok(if v == 0.0 { 0.0 } else { v })
}
