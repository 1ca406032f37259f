//! Scalar Registry.
//!
//! Maps an internal representation type (optionally extended by a
//! disambiguation tag) to exactly one scalar node of the Type Graph. The
//! registry lives for one compilation pass and is discarded with it.
//!
//! Built-in bindings:
//!
//! | representation | tag     | scalar    |
//! |----------------|---------|-----------|
//! | `string`       |         | `String`  |
//! | `boolean`      |         | `Boolean` |
//! | `number`       | `Int`   | `Int`     |
//! | `number`       | `Float` | `Float`   |
//! | `ID`           |         | `ID`      |
//!
//! The two numeric built-ins share one representation, so an untagged
//! `number` never resolves on its own.

use std::fmt;

use indexmap::IndexMap;

use crate::error::SchemaError;
use crate::schema::{ScalarType, TypeGraph, TypeId, TypeNode};

/// The representation shared by the numeric built-ins.
pub const NUMERIC_REPRESENTATION: &str = "number";

/// Schema names of the built-in scalars.
pub const BUILTIN_SCALARS: [&str; 5] = ["String", "Boolean", "Int", "Float", "ID"];

const BUILTIN_BINDINGS: [(&str, Option<&str>, &str); 5] = [
    ("string", None, "String"),
    ("boolean", None, "Boolean"),
    (NUMERIC_REPRESENTATION, Some("Int"), "Int"),
    (NUMERIC_REPRESENTATION, Some("Float"), "Float"),
    ("ID", None, "ID"),
];

/// Checks if a schema name belongs to a built-in scalar.
pub fn is_builtin_scalar(name: &str) -> bool {
    BUILTIN_SCALARS.contains(&name)
}

/// Registry key: representation plus optional disambiguation tag.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ScalarKey {
    pub internal_type: String,
    pub tag: Option<String>,
}

impl ScalarKey {
    pub fn new(internal_type: impl Into<String>, tag: Option<&str>) -> Self {
        Self {
            internal_type: internal_type.into(),
            tag: tag.map(str::to_string),
        }
    }
}

impl fmt::Display for ScalarKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.tag {
            Some(tag) => write!(f, "{}#{}", self.internal_type, tag),
            None => f.write_str(&self.internal_type),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ScalarBinding {
    pub node: TypeId,
    /// Declaration that claimed the key, or `builtin`.
    pub declared_by: String,
}

/// Why a lookup failed. Converted into a [`SchemaError`] at the use site.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScalarLookupError {
    Unknown,
    AmbiguousNumeric { candidates: Vec<String> },
}

impl ScalarLookupError {
    /// Attaches the declaration and field the lookup was made for.
    pub fn at(self, key: &ScalarKey, declaration: &str, field: Option<&str>) -> SchemaError {
        match self {
            Self::Unknown => SchemaError::UnknownScalar {
                internal_type: key.internal_type.clone(),
                tag: key.tag.clone(),
                declaration: declaration.to_string(),
                field: field.map(str::to_string),
            },
            Self::AmbiguousNumeric { candidates } => SchemaError::AmbiguousNumericScalar {
                internal_type: key.internal_type.clone(),
                candidates,
                declaration: declaration.to_string(),
                field: field.map(str::to_string),
            },
        }
    }
}

#[derive(Debug, Default)]
pub struct ScalarRegistry {
    bindings: IndexMap<ScalarKey, ScalarBinding>,
}

impl ScalarRegistry {
    /// Creates a registry without any bindings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a registry holding the built-in bindings.
    ///
    /// Built-in scalars are also reachable by their schema name, so a field
    /// declared as `Int` needs no tag.
    pub fn with_builtins(graph: &mut TypeGraph) -> Self {
        let mut registry = Self::new();
        for (internal_type, tag, name) in BUILTIN_BINDINGS {
            let node = match graph.lookup(name) {
                Some(node) => node,
                None => graph.push_builtin_scalar(name),
            };
            for key in [ScalarKey::new(internal_type, tag), ScalarKey::new(name, None)] {
                registry.bindings.entry(key).or_insert(ScalarBinding {
                    node,
                    declared_by: "builtin".into(),
                });
            }
        }
        registry
    }

    /// Binds `key` to a scalar node.
    ///
    /// # Errors
    ///
    /// Returns `DuplicateScalarBinding` if the key is taken. An untagged
    /// binding is also refused for a representation that is only reachable
    /// through tags, because it would silently become the default.
    pub fn register(
        &mut self,
        key: ScalarKey,
        node: TypeId,
        declaration: &str,
    ) -> Result<(), SchemaError> {
        let existing = self
            .bindings
            .get(&key)
            .or_else(|| {
                if key.tag.is_some() {
                    return None;
                }
                self.tagged(&key.internal_type).next().map(|(_, binding)| binding)
            })
            .map(|binding| binding.declared_by.clone());
        if let Some(existing) = existing {
            return Err(SchemaError::DuplicateScalarBinding {
                internal_type: key.internal_type,
                tag: key.tag,
                existing,
                declaration: declaration.to_string(),
            });
        }

        self.bindings.insert(
            key,
            ScalarBinding {
                node,
                declared_by: declaration.to_string(),
            },
        );
        Ok(())
    }

    /// Returns the scalar node bound to `internal_type` (and `tag`).
    pub fn lookup(
        &self,
        internal_type: &str,
        tag: Option<&str>,
    ) -> Result<TypeId, ScalarLookupError> {
        let key = ScalarKey::new(internal_type, tag);
        if let Some(binding) = self.bindings.get(&key) {
            return Ok(binding.node);
        }

        if tag.is_none() && internal_type == NUMERIC_REPRESENTATION {
            let candidates: Vec<String> = self
                .tagged(internal_type)
                .filter_map(|(key, _)| key.tag.clone())
                .collect();
            if !candidates.is_empty() {
                return Err(ScalarLookupError::AmbiguousNumeric { candidates });
            }
        }

        Err(ScalarLookupError::Unknown)
    }

    /// Whether any binding (tagged or not) uses this representation.
    pub fn has_representation(&self, internal_type: &str) -> bool {
        self.bindings
            .keys()
            .any(|key| key.internal_type == internal_type)
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    pub fn bindings(&self) -> impl Iterator<Item = (&ScalarKey, &ScalarBinding)> {
        self.bindings.iter()
    }

    fn tagged<'a>(
        &'a self,
        internal_type: &'a str,
    ) -> impl Iterator<Item = (&'a ScalarKey, &'a ScalarBinding)> + 'a {
        self.bindings
            .iter()
            .filter(move |(key, _)| key.internal_type == internal_type && key.tag.is_some())
    }
}

impl TypeGraph {
    fn push_builtin_scalar(&mut self, name: &str) -> TypeId {
        let id = self.placeholder(name);
        let node = TypeNode::Scalar(ScalarType {
            name: name.to_string(),
            decl: None,
        });
        // A fresh graph never holds a built-in name yet.
        let _ = self.define(id, node, "builtin");
        id
    }
}
