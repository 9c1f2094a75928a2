//! Parameter schemas: ordered descriptors bound once per component class

use super::{ParamArgs, ParamKind, ParamValue, ParameterError, Params};

/// Declaration of a single parameter
#[derive(Debug, Clone, PartialEq)]
pub struct ParamDescriptor {
    pub name: String,
    pub kind: ParamKind,
    /// Canonical default, `None` for required parameters
    pub default: Option<ParamValue>,
    pub doc: String,
}

/// Ordered set of parameter descriptors for a component class
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParamSchema {
    descriptors: Vec<ParamDescriptor>,
}

impl ParamSchema {
    pub fn builder() -> ParamSchemaBuilder {
        ParamSchemaBuilder::default()
    }

    pub fn descriptors(&self) -> &[ParamDescriptor] {
        &self.descriptors
    }

    pub fn get(&self, name: &str) -> Option<&ParamDescriptor> {
        self.descriptors.iter().find(|d| d.name == name)
    }

    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }

    /// Validate supplied arguments and fill in defaults
    ///
    /// Descriptors are checked in declaration order and the first failure is
    /// returned. Arguments naming no descriptor are rejected afterwards.
    pub fn bind(&self, args: &ParamArgs) -> Result<Params, ParameterError> {
        let mut entries = Vec::with_capacity(self.descriptors.len());
        for desc in &self.descriptors {
            let value = match args.get(&desc.name).or(desc.default.as_ref()) {
                Some(v) => v.clone(),
                None => return Err(ParameterError::Missing(desc.name.clone())),
            };
            let value = desc.kind.validate(&desc.name, value)?;
            entries.push((desc.name.clone(), value));
        }

        if let Some(unknown) = args.names().find(|n| self.get(n).is_none()) {
            return Err(ParameterError::Unknown(unknown.to_string()));
        }

        Ok(Params::from_entries(entries))
    }

    /// Bind with defaults only
    pub fn defaults(&self) -> Result<Params, ParameterError> {
        self.bind(&ParamArgs::new())
    }
}

/// Collects descriptors and checks them when the class is defined
#[derive(Debug, Default)]
pub struct ParamSchemaBuilder {
    descriptors: Vec<ParamDescriptor>,
}

impl ParamSchemaBuilder {
    /// Optional parameter with a default value
    pub fn param(
        mut self,
        name: impl Into<String>,
        kind: ParamKind,
        default: impl Into<ParamValue>,
        doc: impl Into<String>,
    ) -> Self {
        self.descriptors.push(ParamDescriptor {
            name: name.into(),
            kind,
            default: Some(default.into()),
            doc: doc.into(),
        });
        self
    }

    /// Parameter that must be supplied at construction
    pub fn required(mut self, name: impl Into<String>, kind: ParamKind, doc: impl Into<String>) -> Self {
        self.descriptors.push(ParamDescriptor {
            name: name.into(),
            kind,
            default: None,
            doc: doc.into(),
        });
        self
    }

    /// Nested record parameter; defaults to the nested defaults when all of
    /// them are optional, otherwise it is required
    pub fn record(mut self, name: impl Into<String>, schema: ParamSchema, doc: impl Into<String>) -> Self {
        let default = schema.defaults().ok().map(ParamValue::Record);
        self.descriptors.push(ParamDescriptor {
            name: name.into(),
            kind: ParamKind::Record(schema),
            default,
            doc: doc.into(),
        });
        self
    }

    pub fn build(self) -> Result<ParamSchema, ParameterError> {
        let mut descriptors: Vec<ParamDescriptor> = Vec::with_capacity(self.descriptors.len());
        for mut desc in self.descriptors {
            if descriptors.iter().any(|d| d.name == desc.name) {
                return Err(ParameterError::DuplicateDeclaration(desc.name));
            }
            if let Some(default) = desc.default.take() {
                let canonical = desc.kind.validate(&desc.name, default).map_err(|e| {
                    ParameterError::InvalidDefault {
                        name: desc.name.clone(),
                        reason: Box::new(e),
                    }
                })?;
                desc.default = Some(canonical);
            }
            descriptors.push(desc);
        }
        Ok(ParamSchema { descriptors })
    }
}
