//! Declaration metadata as supplied by the host type-checker.
//!
//! These types are the wire shape of one compilation unit. They carry no
//! schema knowledge; [`extract`](super::extract) turns them into a
//! [`SourceModel`](super::SourceModel).

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use super::RootKind;

/// One compilation unit as handed over by the host.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HostUnit {
    pub name: String,

    #[serde(default)]
    pub declarations: Vec<HostDeclaration>,

    /// Out-of-band opt-in table for declarations that cannot carry an inline
    /// marker. An entry here overrides the declaration's own flag.
    #[serde(default)]
    pub participation: IndexMap<String, HostParticipation>,
}

/// Participation entry in the out-of-band registration table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HostParticipation {
    pub participates: bool,

    /// Disambiguation tag applied to every field of the declaration.
    #[serde(default)]
    pub tag: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HostDeclarationKind {
    Object,
    Enum,
    Scalar,
    GenericObject,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HostDeclaration {
    pub name: String,
    pub kind: HostDeclarationKind,

    #[serde(default)]
    pub participates: bool,

    #[serde(default)]
    pub description: Option<String>,

    /// Default disambiguation tag for fields that carry none.
    #[serde(default)]
    pub tag: Option<String>,

    #[serde(default)]
    pub fields: Vec<HostField>,

    #[serde(default)]
    pub type_params: Vec<String>,

    #[serde(default)]
    pub values: Vec<HostEnumValue>,

    /// Internal representation type of a scalar declaration.
    #[serde(default)]
    pub internal_type: Option<String>,

    #[serde(default)]
    pub root: Option<RootKind>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HostAccess {
    #[default]
    Property,
    Accessor,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HostField {
    pub name: String,

    /// Host member identifier; defaults to the snake_case field name.
    #[serde(default)]
    pub member: Option<String>,

    #[serde(rename = "type")]
    pub ty: HostTypeShape,

    #[serde(default)]
    pub tag: Option<String>,

    #[serde(default)]
    pub access: HostAccess,

    #[serde(default)]
    pub deferred: bool,

    #[serde(default)]
    pub args: Vec<HostArgument>,

    #[serde(default)]
    pub description: Option<String>,

    #[serde(default)]
    pub deprecation: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HostArgument {
    pub name: String,

    #[serde(rename = "type")]
    pub ty: HostTypeShape,

    #[serde(default)]
    pub tag: Option<String>,

    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HostEnumValue {
    pub name: String,

    #[serde(default)]
    pub description: Option<String>,

    #[serde(default)]
    pub deprecation: Option<String>,
}

/// Raw declared type shape of a field or argument.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum HostTypeShape {
    Named { name: String },
    Null,
    Union { members: Vec<HostTypeShape> },
    Array { element: Box<HostTypeShape> },
    Generic { name: String, args: Vec<HostTypeShape> },
}

impl HostTypeShape {
    pub fn named(name: impl Into<String>) -> Self {
        Self::Named { name: name.into() }
    }

    /// `shape | null`
    pub fn nullable(shape: HostTypeShape) -> Self {
        Self::Union {
            members: vec![shape, Self::Null],
        }
    }

    pub fn array(element: HostTypeShape) -> Self {
        Self::Array {
            element: Box::new(element),
        }
    }

    pub fn generic(name: impl Into<String>, args: impl IntoIterator<Item = HostTypeShape>) -> Self {
        Self::Generic {
            name: name.into(),
            args: args.into_iter().collect(),
        }
    }
}

impl HostUnit {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn with_declaration(mut self, declaration: HostDeclaration) -> Self {
        self.declarations.push(declaration);
        self
    }

    pub fn with_participation(mut self, name: impl Into<String>, entry: HostParticipation) -> Self {
        self.participation.insert(name.into(), entry);
        self
    }
}

impl HostDeclaration {
    fn new(name: impl Into<String>, kind: HostDeclarationKind) -> Self {
        Self {
            name: name.into(),
            kind,
            participates: true,
            description: None,
            tag: None,
            fields: Vec::new(),
            type_params: Vec::new(),
            values: Vec::new(),
            internal_type: None,
            root: None,
        }
    }

    pub fn object(name: impl Into<String>) -> Self {
        Self::new(name, HostDeclarationKind::Object)
    }

    pub fn enumeration<I, S>(name: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut decl = Self::new(name, HostDeclarationKind::Enum);
        decl.values = values
            .into_iter()
            .map(|value| HostEnumValue {
                name: value.into(),
                description: None,
                deprecation: None,
            })
            .collect();
        decl
    }

    pub fn scalar(name: impl Into<String>, internal_type: impl Into<String>) -> Self {
        let mut decl = Self::new(name, HostDeclarationKind::Scalar);
        decl.internal_type = Some(internal_type.into());
        decl
    }

    pub fn generic(name: impl Into<String>, type_param: impl Into<String>) -> Self {
        let mut decl = Self::new(name, HostDeclarationKind::GenericObject);
        decl.type_params = vec![type_param.into()];
        decl
    }

    pub fn with_field(mut self, field: HostField) -> Self {
        self.fields.push(field);
        self
    }

    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tag = Some(tag.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn as_root(mut self, root: RootKind) -> Self {
        self.root = Some(root);
        self
    }

    pub fn opted_out(mut self) -> Self {
        self.participates = false;
        self
    }
}

impl HostField {
    fn new(name: impl Into<String>, ty: HostTypeShape, access: HostAccess) -> Self {
        Self {
            name: name.into(),
            member: None,
            ty,
            tag: None,
            access,
            deferred: false,
            args: Vec::new(),
            description: None,
            deprecation: None,
        }
    }

    /// A stored property read directly off the parent value.
    pub fn property(name: impl Into<String>, ty: HostTypeShape) -> Self {
        Self::new(name, ty, HostAccess::Property)
    }

    /// A computed accessor invoked on the parent value.
    pub fn accessor(name: impl Into<String>, ty: HostTypeShape) -> Self {
        Self::new(name, ty, HostAccess::Accessor)
    }

    pub fn deferred(mut self) -> Self {
        self.deferred = true;
        self
    }

    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tag = Some(tag.into());
        self
    }

    pub fn with_member(mut self, member: impl Into<String>) -> Self {
        self.member = Some(member.into());
        self
    }

    pub fn with_arg(mut self, arg: HostArgument) -> Self {
        self.args.push(arg);
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn deprecated(mut self, reason: impl Into<String>) -> Self {
        self.deprecation = Some(reason.into());
        self
    }
}

impl HostArgument {
    pub fn new(name: impl Into<String>, ty: HostTypeShape) -> Self {
        Self {
            name: name.into(),
            ty,
            tag: None,
            description: None,
        }
    }

    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tag = Some(tag.into());
        self
    }
}
