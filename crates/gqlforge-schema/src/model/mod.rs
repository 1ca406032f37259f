//! The Source Model: normalized, order-preserving declarations.
//!
//! Produced once per compilation unit by [`extract`] and immutable afterwards.
//! Nothing in here knows about schema nodes; downstream stages refer back to
//! declarations and fields through [`DeclId`] and [`FieldRef`] indices.

mod extract;
pub mod host;

pub use extract::extract;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Index of a declaration within its [`SourceModel`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DeclId(pub(crate) usize);

impl DeclId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// Non-owning reference to a field of a declaration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FieldRef {
    pub decl: DeclId,
    pub index: usize,
}

/// Entry points an object can be registered as.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RootKind {
    Query,
    Mutation,
}

/// Participating declarations of one compilation unit, in source order.
#[derive(Debug, Clone)]
pub struct SourceModel {
    unit: String,
    declarations: Vec<SourceDeclaration>,
    index: IndexMap<String, DeclId>,
}

impl SourceModel {
    pub(crate) fn new(unit: impl Into<String>) -> Self {
        Self {
            unit: unit.into(),
            declarations: Vec::new(),
            index: IndexMap::new(),
        }
    }

    /// Appends a declaration. Returns `None` if the name is already taken.
    pub(crate) fn push(&mut self, declaration: SourceDeclaration) -> Option<DeclId> {
        if self.index.contains_key(declaration.name()) {
            return None;
        }
        let id = DeclId(self.declarations.len());
        self.index.insert(declaration.name().to_string(), id);
        self.declarations.push(declaration);
        Some(id)
    }

    pub fn unit(&self) -> &str {
        &self.unit
    }

    pub fn len(&self) -> usize {
        self.declarations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.declarations.is_empty()
    }

    pub fn get(&self, id: DeclId) -> &SourceDeclaration {
        &self.declarations[id.0]
    }

    pub fn lookup(&self, name: &str) -> Option<(DeclId, &SourceDeclaration)> {
        self.index.get(name).map(|&id| (id, self.get(id)))
    }

    /// Declarations in source order.
    pub fn iter(&self) -> impl Iterator<Item = (DeclId, &SourceDeclaration)> {
        self.declarations
            .iter()
            .enumerate()
            .map(|(i, decl)| (DeclId(i), decl))
    }

    /// Resolves a field reference to its descriptor.
    pub fn field(&self, field: FieldRef) -> Option<&FieldDescriptor> {
        self.get(field.decl).fields().get(field.index)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeclKind {
    Object,
    Enum,
    Scalar,
    GenericObject,
}

#[derive(Debug, Clone)]
pub enum SourceDeclaration {
    Object(ObjectDecl),
    Enum(EnumDecl),
    Scalar(ScalarDecl),
    GenericObject(GenericObjectDecl),
}

impl SourceDeclaration {
    pub fn name(&self) -> &str {
        match self {
            Self::Object(decl) => &decl.name,
            Self::Enum(decl) => &decl.name,
            Self::Scalar(decl) => &decl.name,
            Self::GenericObject(decl) => &decl.name,
        }
    }

    pub fn kind(&self) -> DeclKind {
        match self {
            Self::Object(_) => DeclKind::Object,
            Self::Enum(_) => DeclKind::Enum,
            Self::Scalar(_) => DeclKind::Scalar,
            Self::GenericObject(_) => DeclKind::GenericObject,
        }
    }

    pub fn description(&self) -> Option<&str> {
        match self {
            Self::Object(decl) => decl.description.as_deref(),
            Self::Enum(decl) => decl.description.as_deref(),
            Self::Scalar(decl) => decl.description.as_deref(),
            Self::GenericObject(decl) => decl.description.as_deref(),
        }
    }

    /// Fields in declaration order; empty for enums and scalars.
    pub fn fields(&self) -> &[FieldDescriptor] {
        match self {
            Self::Object(decl) => &decl.fields,
            Self::GenericObject(decl) => &decl.fields,
            Self::Enum(_) | Self::Scalar(_) => &[],
        }
    }
}

#[derive(Debug, Clone)]
pub struct ObjectDecl {
    pub name: String,
    pub description: Option<String>,
    pub root: Option<RootKind>,
    pub fields: Vec<FieldDescriptor>,
}

/// An object declaration with exactly one type parameter.
#[derive(Debug, Clone)]
pub struct GenericObjectDecl {
    pub name: String,
    pub description: Option<String>,
    pub type_param: String,
    pub fields: Vec<FieldDescriptor>,
}

#[derive(Debug, Clone)]
pub struct EnumDecl {
    pub name: String,
    pub description: Option<String>,
    pub values: Vec<EnumValue>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumValue {
    pub name: String,
    pub description: Option<String>,
    pub deprecation: Option<String>,
}

#[derive(Debug, Clone)]
pub struct ScalarDecl {
    pub name: String,
    pub description: Option<String>,
    /// Internal representation type the scalar is bound to.
    pub internal_type: String,
    pub tag: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessKind {
    /// Read directly off the parent value.
    Property,
    /// Invoked on the parent value.
    Accessor,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EffectKind {
    Immediate,
    /// The result must be awaited by the runtime before serialization.
    Deferred,
}

#[derive(Debug, Clone)]
pub struct FieldDescriptor {
    /// Declaration this field belongs to.
    pub owner: DeclId,
    pub name: String,
    /// Host member identifier the resolver reads or invokes.
    pub member: String,
    pub ty: TypeExpr,
    /// Disambiguation tag, already defaulted from the owning declaration.
    pub tag: Option<String>,
    /// Set when `tag` came from the declaration rather than the field.
    pub tag_inherited: bool,
    pub args: Vec<ArgumentDescriptor>,
    pub access: AccessKind,
    pub effect: EffectKind,
    pub description: Option<String>,
    pub deprecation: Option<String>,
}

impl FieldDescriptor {
    pub fn is_nullable(&self) -> bool {
        self.ty.nullable
    }

    pub fn list_depth(&self) -> usize {
        self.ty.list_depth()
    }

    pub fn is_callable(&self) -> bool {
        !self.args.is_empty()
    }
}

#[derive(Debug, Clone)]
pub struct ArgumentDescriptor {
    pub name: String,
    pub ty: TypeExpr,
    pub tag: Option<String>,
    pub tag_inherited: bool,
    pub description: Option<String>,
}

/// Normalized declared type: a shape plus its own nullability.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeExpr {
    pub kind: TypeExprKind,
    pub nullable: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeExprKind {
    Named(String),
    List(Box<TypeExpr>),
    /// A generic declaration applied to named type arguments.
    Generic { name: String, args: Vec<String> },
}

impl TypeExpr {
    pub fn required(kind: TypeExprKind) -> Self {
        Self {
            kind,
            nullable: false,
        }
    }

    pub fn list_depth(&self) -> usize {
        match &self.kind {
            TypeExprKind::List(element) => 1 + element.list_depth(),
            _ => 0,
        }
    }

    /// Whether a named reference to `name` occurs anywhere in this type.
    pub fn mentions(&self, name: &str) -> bool {
        match &self.kind {
            TypeExprKind::Named(named) => named == name,
            TypeExprKind::List(element) => element.mentions(name),
            TypeExprKind::Generic { args, .. } => args.iter().any(|arg| arg == name),
        }
    }
}
