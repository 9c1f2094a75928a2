//! Parameter system
//!
//! Every component class declares a [`ParamSchema`]. Construction binds the
//! supplied [`ParamArgs`] against it, producing an immutable [`Params`] set
//! that identifies the component's geometry.

mod kind;
mod schema;
mod value;

pub use kind::{Bound, ParamKind};
pub use schema::{ParamDescriptor, ParamSchema, ParamSchemaBuilder};
pub use value::{ParamArgs, ParamValue, Params};

use thiserror::Error;

/// Parameter validation error
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParameterError {
    #[error("Parameter '{name}' = {value} is out of domain: {constraint}")]
    OutOfDomain {
        name: String,
        value: String,
        constraint: String,
    },

    #[error("Parameter '{name}' expects {expected}, got {found}")]
    TypeMismatch {
        name: String,
        expected: String,
        found: String,
    },

    #[error("Missing required parameter '{0}'")]
    Missing(String),

    #[error("Unknown parameter '{0}'")]
    Unknown(String),

    #[error("Parameter '{0}' is declared more than once")]
    DuplicateDeclaration(String),

    #[error("Invalid default for parameter '{name}': {reason}")]
    InvalidDefault {
        name: String,
        reason: Box<ParameterError>,
    },
}

impl ParameterError {
    /// Name of the offending parameter
    pub fn param_name(&self) -> &str {
        match self {
            ParameterError::OutOfDomain { name, .. }
            | ParameterError::TypeMismatch { name, .. }
            | ParameterError::InvalidDefault { name, .. } => name,
            ParameterError::Missing(name)
            | ParameterError::Unknown(name)
            | ParameterError::DuplicateDeclaration(name) => name,
        }
    }

    /// Qualify the parameter name with the enclosing record's name
    pub(crate) fn nested_in(self, record: &str) -> Self {
        let qualify = |name: String| format!("{record}.{name}");
        match self {
            ParameterError::OutOfDomain {
                name,
                value,
                constraint,
            } => ParameterError::OutOfDomain {
                name: qualify(name),
                value,
                constraint,
            },
            ParameterError::TypeMismatch {
                name,
                expected,
                found,
            } => ParameterError::TypeMismatch {
                name: qualify(name),
                expected,
                found,
            },
            ParameterError::Missing(name) => ParameterError::Missing(qualify(name)),
            ParameterError::Unknown(name) => ParameterError::Unknown(qualify(name)),
            other => other,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::hash_map::DefaultHasher;
    use std::hash::{Hash, Hasher};

    fn box_schema() -> ParamSchema {
        ParamSchema::builder()
            .param("length", ParamKind::positive_float(), 10.0, "size along X")
            .param("width", ParamKind::positive_float(), 10.0, "size along Y")
            .param("height", ParamKind::positive_float(), 10.0, "size along Z")
            .build()
            .unwrap()
    }

    fn hash_of<T: Hash>(value: &T) -> u64 {
        let mut hasher = DefaultHasher::new();
        value.hash(&mut hasher);
        hasher.finish()
    }

    #[test]
    fn test_defaults_fill_in() {
        let params = box_schema().bind(&ParamArgs::new().with("height", 2.5)).unwrap();
        assert_eq!(params.float("length").unwrap(), 10.0);
        assert_eq!(params.float("height").unwrap(), 2.5);
        let names: Vec<_> = params.names().collect();
        assert_eq!(names, ["length", "width", "height"]);
    }

    #[test]
    fn test_negative_length_rejected() {
        let err = box_schema()
            .bind(&ParamArgs::new().with("length", -1.0))
            .unwrap_err();
        assert_eq!(err.param_name(), "length");
        assert!(matches!(err, ParameterError::OutOfDomain { .. }));
        assert!(err.to_string().contains("must be > 0"));
    }

    #[test]
    fn test_first_failure_in_declaration_order() {
        // args supplied in reverse order, error still names the first descriptor
        let err = box_schema()
            .bind(&ParamArgs::new().with("height", 0.0).with("length", -3.0))
            .unwrap_err();
        assert_eq!(err.param_name(), "length");
    }

    #[test]
    fn test_int_widens_to_float() {
        let params = box_schema().bind(&ParamArgs::new().with("width", 4)).unwrap();
        assert_eq!(params.get("width"), Some(&ParamValue::Float(4.0)));
    }

    #[test]
    fn test_float_does_not_narrow_to_int() {
        let schema = ParamSchema::builder()
            .param("teeth", ParamKind::positive_int(), 12, "tooth count")
            .build()
            .unwrap();
        let err = schema.bind(&ParamArgs::new().with("teeth", 12.0)).unwrap_err();
        assert_eq!(
            err,
            ParameterError::TypeMismatch {
                name: "teeth".into(),
                expected: "int".into(),
                found: "float".into(),
            }
        );
        let err = schema.bind(&ParamArgs::new().with("teeth", 0)).unwrap_err();
        assert!(err.to_string().contains("must be >= 1"));
    }

    #[test]
    fn test_non_finite_rejected() {
        let err = box_schema()
            .bind(&ParamArgs::new().with("width", f64::INFINITY))
            .unwrap_err();
        assert!(err.to_string().contains("finite"));
        let err = ParamKind::float()
            .validate("x", ParamValue::Float(f64::NAN))
            .unwrap_err();
        assert_eq!(err.param_name(), "x");
    }

    #[test]
    fn test_unknown_and_missing() {
        let err = box_schema()
            .bind(&ParamArgs::new().with("depth", 1.0))
            .unwrap_err();
        assert_eq!(err, ParameterError::Unknown("depth".into()));

        let schema = ParamSchema::builder()
            .required("radius", ParamKind::positive_float(), "")
            .build()
            .unwrap();
        assert_eq!(
            schema.defaults().unwrap_err(),
            ParameterError::Missing("radius".into())
        );
    }

    #[test]
    fn test_choice_domain() {
        let schema = ParamSchema::builder()
            .param("finish", ParamKind::choice(&["raw", "anodized"]), "raw", "")
            .param("label", ParamKind::Text, "", "")
            .param("hollow", ParamKind::Bool, false, "")
            .build()
            .unwrap();
        let params = schema
            .bind(&ParamArgs::new().with("finish", "anodized").with("hollow", true))
            .unwrap();
        assert_eq!(params.text("finish").unwrap(), "anodized");
        assert!(params.bool("hollow").unwrap());

        let err = schema
            .bind(&ParamArgs::new().with("finish", "painted"))
            .unwrap_err();
        assert!(err.to_string().contains("must be one of [raw, anodized]"));
    }

    #[test]
    fn test_definition_time_errors() {
        let dup = ParamSchema::builder()
            .param("a", ParamKind::float(), 1.0, "")
            .param("a", ParamKind::float(), 2.0, "")
            .build();
        assert_eq!(dup.unwrap_err(), ParameterError::DuplicateDeclaration("a".into()));

        let bad_default = ParamSchema::builder()
            .param("size", ParamKind::positive_float(), -2.0, "")
            .build()
            .unwrap_err();
        assert!(matches!(bad_default, ParameterError::InvalidDefault { ref name, .. } if name == "size"));
    }

    #[test]
    fn test_nested_record() {
        let hole = ParamSchema::builder()
            .param("diameter", ParamKind::positive_float(), 3.0, "")
            .param("depth", ParamKind::positive_float(), 5.0, "")
            .build()
            .unwrap();
        let schema = ParamSchema::builder()
            .param("thickness", ParamKind::positive_float(), 2.0, "")
            .record("hole", hole, "mounting hole")
            .build()
            .unwrap();

        let params = schema.defaults().unwrap();
        assert_eq!(params.record("hole").unwrap().float("depth").unwrap(), 5.0);

        let args = ParamArgs::new().with("hole", ParamArgs::new().with("diameter", 4));
        let params = schema.bind(&args).unwrap();
        let hole = params.record("hole").unwrap();
        assert_eq!(hole.float("diameter").unwrap(), 4.0);
        assert_eq!(hole.float("depth").unwrap(), 5.0);

        let args = ParamArgs::new().with("hole", ParamArgs::new().with("diameter", -1.0));
        let err = schema.bind(&args).unwrap_err();
        assert_eq!(err.param_name(), "hole.diameter");
    }

    #[test]
    fn test_negative_zero_is_canonical() {
        let schema = ParamSchema::builder()
            .param("offset", ParamKind::float(), 0.0, "")
            .build()
            .unwrap();
        let a = schema.bind(&ParamArgs::new().with("offset", -0.0)).unwrap();
        let b = schema.defaults().unwrap();
        assert_eq!(a, b);
        assert_eq!(hash_of(&a), hash_of(&b));
    }

    #[test]
    fn test_getter_errors() {
        let params = box_schema().defaults().unwrap();
        assert_eq!(
            params.int("length").unwrap_err(),
            ParameterError::TypeMismatch {
                name: "length".into(),
                expected: "int".into(),
                found: "float".into(),
            }
        );
        assert_eq!(
            params.float("radius").unwrap_err(),
            ParameterError::Unknown("radius".into())
        );
    }

    #[test]
    fn test_display_and_ron_round_trip() {
        let params = box_schema()
            .bind(&ParamArgs::new().with("length", 20.0))
            .unwrap();
        assert_eq!(params.to_string(), "length=20.0, width=10.0, height=10.0");

        let text = ron::to_string(&params).unwrap();
        let restored: Params = ron::from_str(&text).unwrap();
        assert_eq!(restored, params);
        // restored values re-bind to the same set
        assert_eq!(box_schema().bind(&restored.to_args()).unwrap(), params);
    }
}
