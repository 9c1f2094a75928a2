//! Assemblies: components composed of named children and constraints
//!
//! An assembly class turns its parameters into a [`Layout`] (children plus
//! placement constraints). The resulting [`Assembly`] checks the layout's
//! structure up front; placements and aggregate geometry are resolved
//! lazily and cached.

mod edit;
mod geometry;
mod plan;
mod resolve;

pub use geometry::Aggregate;
pub use resolve::Placements;

use std::fmt;
use std::sync::Arc;

use pk_kernel::Transform;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::cache::{CacheSlot, CacheState, Stamped};
use crate::component::{Component, DetachedPolicy, FrameSlot, MateFn, MateTable};
use crate::constants::PATH_SEPARATOR;
use crate::constraint::Constraint;
use crate::error::{ModelError, ModelResult};
use crate::params::{ParamArgs, ParamKind, ParamSchema, ParamSchemaBuilder, ParamValue, ParameterError, Params};

/// Structural problem in an assembly's children or constraints
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StructureError {
    #[error("Constraint cycle: {}", .cycle.join(" -> "))]
    ConstraintCycle { cycle: Vec<String> },

    #[error("Constraint {constraint} references unknown '{reference}'")]
    UnresolvedConstraint { constraint: String, reference: String },

    #[error("Component '{target}' is placed by more than one constraint")]
    DuplicateConstraint { target: String },

    #[error("Component '{0}' has no placing constraint")]
    UnconstrainedComponent(String),

    #[error("Duplicate component name '{0}'")]
    DuplicateChild(String),

    #[error("Invalid component name '{0}'")]
    InvalidChildName(String),
}

/// How children without a placing constraint are positioned
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum DefaultPlacement {
    /// At the assembly's origin
    #[default]
    Identity,
    /// Not allowed: every child must be constrained
    Explicit,
}

/// Children and constraints produced by an assembly class
#[derive(Debug, Clone, Default)]
pub struct Layout {
    components: Vec<(String, Component)>,
    constraints: Vec<Constraint>,
}

impl Layout {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn component(mut self, name: impl Into<String>, component: impl Into<Component>) -> Self {
        self.add_component(name, component);
        self
    }

    pub fn constrain(mut self, constraint: Constraint) -> Self {
        self.constraints.push(constraint);
        self
    }

    pub fn add_component(&mut self, name: impl Into<String>, component: impl Into<Component>) {
        self.components.push((name.into(), component.into()));
    }

    pub fn add_constraint(&mut self, constraint: Constraint) {
        self.constraints.push(constraint);
    }
}

/// Produces an assembly's layout from its parameters
pub type LayoutFn = dyn Fn(&Params) -> ModelResult<Layout> + Send + Sync;

/// An assembly class: parameter schema, mates and layout function
pub struct AssemblyClass {
    name: String,
    doc: String,
    schema: ParamSchema,
    mates: MateTable,
    placement: DefaultPlacement,
    layout: Box<LayoutFn>,
}

impl AssemblyClass {
    pub fn builder(name: impl Into<String>) -> AssemblyClassBuilder {
        AssemblyClassBuilder {
            name: name.into(),
            doc: String::new(),
            params: ParamSchema::builder(),
            mates: Vec::new(),
            placement: DefaultPlacement::default(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn doc(&self) -> &str {
        &self.doc
    }

    pub fn schema(&self) -> &ParamSchema {
        &self.schema
    }

    pub fn mate_names(&self) -> Vec<&str> {
        self.mates.names()
    }

    pub fn default_placement(&self) -> DefaultPlacement {
        self.placement
    }

    /// Validate `args`, lay out the children and check the structure
    pub fn instantiate(self: &Arc<Self>, args: ParamArgs) -> ModelResult<Assembly> {
        let params = self.schema.bind(&args)?;
        let layout = (self.layout)(&params)?;
        Assembly::from_layout(self.clone(), params, layout)
    }

    pub fn with_defaults(self: &Arc<Self>) -> ModelResult<Assembly> {
        self.instantiate(ParamArgs::new())
    }
}

impl fmt::Debug for AssemblyClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AssemblyClass")
            .field("name", &self.name)
            .field("schema", &self.schema)
            .field("mates", &self.mates.names())
            .field("placement", &self.placement)
            .finish()
    }
}

pub struct AssemblyClassBuilder {
    name: String,
    doc: String,
    params: ParamSchemaBuilder,
    mates: Vec<(String, Box<MateFn>)>,
    placement: DefaultPlacement,
}

impl AssemblyClassBuilder {
    pub fn doc(mut self, doc: impl Into<String>) -> Self {
        self.doc = doc.into();
        self
    }

    pub fn param(
        mut self,
        name: impl Into<String>,
        kind: ParamKind,
        default: impl Into<ParamValue>,
        doc: impl Into<String>,
    ) -> Self {
        self.params = self.params.param(name, kind, default, doc);
        self
    }

    pub fn required(mut self, name: impl Into<String>, kind: ParamKind, doc: impl Into<String>) -> Self {
        self.params = self.params.required(name, kind, doc);
        self
    }

    pub fn record(mut self, name: impl Into<String>, schema: ParamSchema, doc: impl Into<String>) -> Self {
        self.params = self.params.record(name, schema, doc);
        self
    }

    pub fn mate<F>(mut self, name: impl Into<String>, locate: F) -> Self
    where
        F: Fn(&Params) -> Result<Transform, ParameterError> + Send + Sync + 'static,
    {
        self.mates.push((name.into(), Box::new(locate)));
        self
    }

    pub fn placement(mut self, placement: DefaultPlacement) -> Self {
        self.placement = placement;
        self
    }

    pub fn build<F>(self, layout: F) -> ModelResult<Arc<AssemblyClass>>
    where
        F: Fn(&Params) -> ModelResult<Layout> + Send + Sync + 'static,
    {
        let schema = self.params.build()?;
        let mut mates = MateTable::default();
        for (name, locate) in self.mates {
            mates.insert(name, locate)?;
        }
        Ok(Arc::new(AssemblyClass {
            name: self.name,
            doc: self.doc,
            schema,
            mates,
            placement: self.placement,
            layout: Box::new(layout),
        }))
    }
}

#[derive(Debug, Clone)]
pub(crate) struct Child {
    pub name: String,
    pub component: Component,
}

/// A composite component
pub struct Assembly {
    id: Uuid,
    class: Arc<AssemblyClass>,
    params: Params,
    children: Vec<Child>,
    constraints: Vec<Constraint>,
    placement: CacheSlot<Stamped<Arc<Placements>>>,
    geometry: CacheSlot<Stamped<Arc<Aggregate>>>,
    frame: FrameSlot,
}

impl Assembly {
    fn from_layout(class: Arc<AssemblyClass>, params: Params, layout: Layout) -> ModelResult<Self> {
        let structure = |source: StructureError| ModelError::Structure {
            path: String::new(),
            source,
        };

        let mut children: Vec<Child> = Vec::with_capacity(layout.components.len());
        for (name, component) in layout.components {
            if name.is_empty() || name.contains(PATH_SEPARATOR) {
                return Err(structure(StructureError::InvalidChildName(name)));
            }
            if children.iter().any(|c| c.name == name) {
                return Err(structure(StructureError::DuplicateChild(name)));
            }
            // a child adopted from elsewhere gets its frame from this assembly
            component.detach();
            children.push(Child { name, component });
        }

        plan::plan(&children, &layout.constraints, class.placement).map_err(structure)?;

        tracing::debug!(
            class = %class.name,
            children = children.len(),
            constraints = layout.constraints.len(),
            "Created assembly"
        );

        Ok(Self {
            id: Uuid::new_v4(),
            class,
            params,
            children,
            constraints: layout.constraints,
            placement: CacheSlot::new(),
            geometry: CacheSlot::new(),
            frame: FrameSlot::default(),
        })
    }

    /// Stable identity of this instance
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn class(&self) -> &Arc<AssemblyClass> {
        &self.class
    }

    pub fn class_name(&self) -> &str {
        &self.class.name
    }

    pub fn params(&self) -> &Params {
        &self.params
    }

    pub fn len(&self) -> usize {
        self.children.len()
    }

    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }

    /// Children in insertion order
    pub fn children(&self) -> impl Iterator<Item = (&str, &Component)> {
        self.children.iter().map(|c| (c.name.as_str(), &c.component))
    }

    pub fn child(&self, name: &str) -> Option<&Component> {
        self.children
            .iter()
            .find(|c| c.name == name)
            .map(|c| &c.component)
    }

    pub(crate) fn child_index(&self, name: &str) -> Option<usize> {
        self.children.iter().position(|c| c.name == name)
    }

    pub fn constraints(&self) -> &[Constraint] {
        &self.constraints
    }

    /// Component at a dotted path relative to this assembly
    pub fn find(&self, path: &str) -> Option<&Component> {
        let (head, rest) = match path.split_once(PATH_SEPARATOR) {
            Some((head, rest)) => (head, Some(rest)),
            None => (path, None),
        };
        let child = self.child(head)?;
        match (rest, child) {
            (None, _) => Some(child),
            (Some(rest), Component::Assembly(sub)) => sub.find(rest),
            (Some(_), Component::Part(_)) => None,
        }
    }

    /// State of the placement cache
    pub fn state(&self) -> CacheState {
        self.placement.state()
    }

    /// State of the aggregate geometry cache
    pub fn geometry_state(&self) -> CacheState {
        self.geometry.state()
    }

    pub fn mate(&self, name: &str) -> ModelResult<Transform> {
        match self.class.mates.locate(name, &self.params) {
            Some(frame) => Ok(frame?),
            None => Err(ModelError::UnknownMate {
                class: self.class.name.clone(),
                mate: name.to_string(),
            }),
        }
    }

    pub fn has_mate(&self, name: &str) -> bool {
        self.class.mates.contains(name)
    }

    /// Discard this assembly's own placement and geometry caches
    pub fn invalidate(&self) -> bool {
        let placement = self.placement.invalidate();
        let geometry = self.geometry.invalidate();
        placement || geometry
    }

    pub fn world_transform(&self, policy: DetachedPolicy) -> ModelResult<Transform> {
        self.frame.resolve(policy, &self.class.name, self.id)
    }

    /// Place this assembly as a root. Descendant frames are refreshed on the
    /// next resolve.
    pub fn attach_to_world(&self, frame: Transform) {
        if self.frame.set(Some(frame)) {
            self.clear_descendant_frames();
        }
    }

    pub fn detach(&self) {
        self.frame.set(None);
        self.clear_descendant_frames();
    }

    pub(crate) fn frame(&self) -> &FrameSlot {
        &self.frame
    }

    pub(crate) fn clear_descendant_frames(&self) {
        for child in &self.children {
            child.component.detach();
        }
    }
}

impl Clone for Assembly {
    /// A copy with fresh identities throughout; caches are carried over
    fn clone(&self) -> Self {
        Self {
            id: Uuid::new_v4(),
            class: self.class.clone(),
            params: self.params.clone(),
            children: self.children.clone(),
            constraints: self.constraints.clone(),
            placement: self.placement.clone(),
            geometry: self.geometry.clone(),
            frame: FrameSlot::default(),
        }
    }
}

impl fmt::Debug for Assembly {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Assembly")
            .field("id", &self.id)
            .field("class", &self.class.name)
            .field("params", &self.params)
            .field("children", &self.children)
            .field("constraints", &self.constraints)
            .field("state", &self.placement.state())
            .finish()
    }
}

impl fmt::Display for Assembly {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", self.class.name, self.params)
    }
}
