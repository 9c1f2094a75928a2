//! Catalogue records and document files
//!
//! A [`ComponentRecord`] is the serializable identity of a component:
//! class name plus parameters, recursively for assembly children. Records
//! are turned back into live components through a [`ClassRegistry`].

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::assembly::AssemblyClass;
use crate::component::{BuildConfig, Component};
use crate::error::{ModelError, ModelResult};
use crate::params::Params;
use crate::part::PartClass;

/// Current document format version
pub const DOCUMENT_VERSION: u32 = 1;

/// Class name and parameters of a component and, for assemblies, its children
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComponentRecord {
    pub class: String,
    pub params: Params,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<(String, ComponentRecord)>,
}

impl ComponentRecord {
    pub fn to_ron(&self) -> Result<String, RecordError> {
        ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())
            .map_err(|e| RecordError::Serialize(e.to_string()))
    }

    pub fn from_ron(text: &str) -> Result<Self, RecordError> {
        ron::from_str(text).map_err(|e| RecordError::Deserialize(e.to_string()))
    }
}

impl Component {
    pub fn to_record(&self) -> ComponentRecord {
        let children = match self {
            Component::Part(_) => Vec::new(),
            Component::Assembly(a) => a
                .children()
                .map(|(name, child)| (name.to_string(), child.to_record()))
                .collect(),
        };
        ComponentRecord {
            class: self.class_name().to_string(),
            params: self.params().clone(),
            children,
        }
    }
}

/// A saved model: root record plus build configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub version: u32,
    pub name: String,
    pub root: ComponentRecord,
    #[serde(default)]
    pub config: BuildConfig,
}

impl Document {
    pub fn new(name: impl Into<String>, root: &Component) -> Self {
        Self {
            version: DOCUMENT_VERSION,
            name: name.into(),
            root: root.to_record(),
            config: BuildConfig::default(),
        }
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), RecordError> {
        let content = self.to_bytes()?;
        std::fs::write(path.as_ref(), content).map_err(|e| RecordError::Io(e.to_string()))?;
        Ok(())
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>, RecordError> {
        let content = ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())
            .map_err(|e| RecordError::Serialize(e.to_string()))?;
        Ok(content.into_bytes())
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, RecordError> {
        let content = std::fs::read(path.as_ref()).map_err(|e| RecordError::Io(e.to_string()))?;
        Self::load_from_bytes(&content)
    }

    pub fn load_from_bytes(data: &[u8]) -> Result<Self, RecordError> {
        let content = std::str::from_utf8(data).map_err(|e| RecordError::Deserialize(e.to_string()))?;
        let document: Document =
            ron::from_str(content).map_err(|e| RecordError::Deserialize(e.to_string()))?;
        if document.version > DOCUMENT_VERSION {
            return Err(RecordError::UnsupportedVersion(document.version));
        }
        Ok(document)
    }
}

/// Record and document errors
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RecordError {
    #[error("IO error: {0}")]
    Io(String),
    #[error("Serialization error: {0}")]
    Serialize(String),
    #[error("Deserialization error: {0}")]
    Deserialize(String),
    #[error("Unsupported document version: {0}")]
    UnsupportedVersion(u32),
}

enum ClassEntry {
    Part(Arc<PartClass>),
    Assembly(Arc<AssemblyClass>),
}

/// Component classes by name, for rebuilding components from records
#[derive(Default)]
pub struct ClassRegistry {
    classes: HashMap<String, ClassEntry>,
}

impl ClassRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register_part(&mut self, class: Arc<PartClass>) -> ModelResult<()> {
        self.insert(class.name().to_string(), ClassEntry::Part(class))
    }

    pub fn register_assembly(&mut self, class: Arc<AssemblyClass>) -> ModelResult<()> {
        self.insert(class.name().to_string(), ClassEntry::Assembly(class))
    }

    fn insert(&mut self, name: String, entry: ClassEntry) -> ModelResult<()> {
        if self.classes.contains_key(&name) {
            return Err(ModelError::Definition(format!("class '{name}' is already registered")));
        }
        self.classes.insert(name, entry);
        Ok(())
    }

    pub fn part_class(&self, name: &str) -> Option<&Arc<PartClass>> {
        match self.classes.get(name)? {
            ClassEntry::Part(class) => Some(class),
            ClassEntry::Assembly(_) => None,
        }
    }

    pub fn assembly_class(&self, name: &str) -> Option<&Arc<AssemblyClass>> {
        match self.classes.get(name)? {
            ClassEntry::Assembly(class) => Some(class),
            ClassEntry::Part(_) => None,
        }
    }

    /// Registered class names, sorted
    pub fn class_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.classes.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Rebuild a component from its record
    ///
    /// Parameters are re-validated against the class schema. Assembly
    /// children whose records differ from what the class lays out are
    /// rebuilt and swapped in.
    pub fn reconstruct(&self, record: &ComponentRecord) -> ModelResult<Component> {
        match self.classes.get(&record.class) {
            Some(ClassEntry::Part(class)) => Ok(class.instantiate(record.params.to_args())?.into()),
            Some(ClassEntry::Assembly(class)) => {
                let mut assembly = class.instantiate(record.params.to_args())?;
                for (name, child_record) in &record.children {
                    let current = assembly
                        .child(name)
                        .ok_or_else(|| ModelError::NotFound(name.clone()))?;
                    if current.to_record() != *child_record {
                        let rebuilt = self.reconstruct(child_record)?;
                        assembly.replace(name, rebuilt)?;
                    }
                }
                Ok(assembly.into())
            }
            None => Err(ModelError::UnknownClass(record.class.clone())),
        }
    }

    pub fn load_document(&self, document: &Document) -> ModelResult<Component> {
        self.reconstruct(&document.root)
    }
}

impl std::fmt::Debug for ClassRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClassRegistry")
            .field("classes", &self.class_names())
            .finish()
    }
}
