//! The Type Graph.
//!
//! An arena of schema nodes indexed by [`TypeId`]. Named nodes (objects,
//! enums, scalars) are unique per name; wrapper nodes are interned by their
//! inner node so equal wrappings share identity as well. Forward and cyclic
//! references go through [`TypeNode::Pending`] slots that are filled in place
//! once the named declaration is processed, so every reference taken before
//! the fill observes the final node.

use std::collections::HashMap;

use indexmap::IndexMap;

use crate::error::SchemaError;
use crate::model::{DeclId, FieldRef, RootKind};

/// Identity of a node in the [`TypeGraph`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TypeId(u32);

impl TypeId {
    pub fn index(self) -> usize {
        self.0 as usize
    }

    pub(crate) fn from_index(index: usize) -> Self {
        Self(index as u32)
    }
}

#[derive(Debug, Clone)]
pub enum TypeNode {
    /// Name-keyed slot awaiting its declaration.
    Pending { name: String },
    Object(ObjectType),
    Enum(EnumType),
    Scalar(ScalarType),
    List(TypeId),
    NonNull(TypeId),
    /// Type parameter of a generic declaration, used by factory templates.
    GenericPlaceholder(String),
}

impl TypeNode {
    fn describe(&self) -> &'static str {
        match self {
            Self::Pending { .. } => "pending reference",
            Self::Object(_) => "object type",
            Self::Enum(_) => "enum type",
            Self::Scalar(_) => "scalar type",
            Self::List(_) => "list type",
            Self::NonNull(_) => "non-null type",
            Self::GenericPlaceholder(_) => "generic placeholder",
        }
    }
}

/// Where an object type came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ObjectOrigin {
    Declared(DeclId),
    Instantiated { generic: DeclId, argument: TypeId },
}

#[derive(Debug, Clone)]
pub struct ObjectType {
    pub name: String,
    pub description: Option<String>,
    pub root: Option<RootKind>,
    pub origin: ObjectOrigin,
    pub fields: Vec<ResolvedField>,
}

#[derive(Debug, Clone)]
pub struct EnumType {
    pub name: String,
    pub decl: DeclId,
}

#[derive(Debug, Clone)]
pub struct ScalarType {
    pub name: String,
    /// `None` for the built-in scalars.
    pub decl: Option<DeclId>,
}

impl ScalarType {
    pub fn is_builtin(&self) -> bool {
        self.decl.is_none()
    }
}

/// A field whose declared type has been resolved into the graph.
#[derive(Debug, Clone)]
pub struct ResolvedField {
    pub name: String,
    pub ty: TypeId,
    pub args: Vec<ResolvedArgument>,
    /// The originating field descriptor.
    pub source: FieldRef,
}

#[derive(Debug, Clone)]
pub struct ResolvedArgument {
    pub name: String,
    pub ty: TypeId,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum Wrapper {
    List,
    NonNull,
}

#[derive(Debug, Default)]
pub struct TypeGraph {
    nodes: Vec<TypeNode>,
    named: IndexMap<String, TypeId>,
    wrappers: HashMap<(Wrapper, TypeId), TypeId>,
    placeholders: HashMap<String, TypeId>,
}

impl TypeGraph {
    pub fn new() -> Self {
        Self::default()
    }

    fn push(&mut self, node: TypeNode) -> TypeId {
        let id = TypeId::from_index(self.nodes.len());
        self.nodes.push(node);
        id
    }

    pub fn node(&self, id: TypeId) -> &TypeNode {
        &self.nodes[id.index()]
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Looks up a named node (defined or pending).
    pub fn lookup(&self, name: &str) -> Option<TypeId> {
        self.named.get(name).copied()
    }

    /// Named nodes in creation order.
    pub fn named(&self) -> impl Iterator<Item = (&str, TypeId)> {
        self.named.iter().map(|(name, &id)| (name.as_str(), id))
    }

    /// Returns the node for `name`, creating a pending slot if none exists.
    pub fn placeholder(&mut self, name: &str) -> TypeId {
        if let Some(id) = self.lookup(name) {
            return id;
        }
        let id = self.push(TypeNode::Pending {
            name: name.to_string(),
        });
        self.named.insert(name.to_string(), id);
        id
    }

    /// Fills the named slot `id`.
    ///
    /// # Errors
    ///
    /// Returns `TypeConflict` if the slot already holds a definition.
    pub fn define(
        &mut self,
        id: TypeId,
        node: TypeNode,
        declaration: &str,
    ) -> Result<(), SchemaError> {
        let slot = &mut self.nodes[id.index()];
        match slot {
            TypeNode::Pending { .. } => {
                *slot = node;
                Ok(())
            }
            existing => Err(SchemaError::TypeConflict {
                name: self
                    .named
                    .iter()
                    .find(|(_, named)| **named == id)
                    .map(|(name, _)| name.clone())
                    .unwrap_or_default(),
                existing: existing.describe().to_string(),
                declaration: declaration.to_string(),
            }),
        }
    }

    /// Creates and fills the node for `name` in one step.
    pub fn insert_named(
        &mut self,
        name: &str,
        node: TypeNode,
        declaration: &str,
    ) -> Result<TypeId, SchemaError> {
        let id = self.placeholder(name);
        self.define(id, node, declaration)?;
        Ok(id)
    }

    pub fn list_of(&mut self, inner: TypeId) -> TypeId {
        self.wrap(Wrapper::List, inner)
    }

    pub fn non_null(&mut self, inner: TypeId) -> TypeId {
        self.wrap(Wrapper::NonNull, inner)
    }

    fn wrap(&mut self, wrapper: Wrapper, inner: TypeId) -> TypeId {
        if let Some(&id) = self.wrappers.get(&(wrapper, inner)) {
            return id;
        }
        let id = self.push(match wrapper {
            Wrapper::List => TypeNode::List(inner),
            Wrapper::NonNull => TypeNode::NonNull(inner),
        });
        self.wrappers.insert((wrapper, inner), id);
        id
    }

    pub fn generic_placeholder(&mut self, param: &str) -> TypeId {
        if let Some(&id) = self.placeholders.get(param) {
            return id;
        }
        let id = self.push(TypeNode::GenericPlaceholder(param.to_string()));
        self.placeholders.insert(param.to_string(), id);
        id
    }

    /// Strips list and non-null wrappers.
    pub fn named_type(&self, mut id: TypeId) -> TypeId {
        loop {
            match self.node(id) {
                TypeNode::List(inner) | TypeNode::NonNull(inner) => id = *inner,
                _ => return id,
            }
        }
    }

    /// Schema name of a named node, placeholder or pending slot.
    pub fn type_name(&self, id: TypeId) -> Option<&str> {
        match self.node(id) {
            TypeNode::Pending { name } => Some(name),
            TypeNode::Object(object) => Some(&object.name),
            TypeNode::Enum(enumeration) => Some(&enumeration.name),
            TypeNode::Scalar(scalar) => Some(&scalar.name),
            TypeNode::GenericPlaceholder(param) => Some(param),
            TypeNode::List(_) | TypeNode::NonNull(_) => None,
        }
    }

    pub fn object(&self, id: TypeId) -> Option<&ObjectType> {
        match self.node(id) {
            TypeNode::Object(object) => Some(object),
            _ => None,
        }
    }

    /// Slots that were referenced but never defined, in creation order.
    pub fn pending(&self) -> impl Iterator<Item = (TypeId, &str)> {
        self.named.values().filter_map(|&id| match self.node(id) {
            TypeNode::Pending { name } => Some((id, name.as_str())),
            _ => None,
        })
    }

    /// Renders a type in SDL notation, e.g. `[User!]!`.
    pub fn render(&self, id: TypeId) -> String {
        match self.node(id) {
            TypeNode::List(inner) => format!("[{}]", self.render(*inner)),
            TypeNode::NonNull(inner) => format!("{}!", self.render(*inner)),
            _ => self.type_name(id).unwrap_or_default().to_string(),
        }
    }
}
