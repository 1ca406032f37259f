//! Error types for the schema compilation pipeline.
//!
//! Every error is raised while a compilation pass runs; none of them is ever
//! deferred into an emitted artifact. Each variant carries the identity of the
//! declaration (and field, where one is involved) that caused it.

use thiserror::Error;

/// Errors raised by one stage of the pipeline.
#[derive(Debug, Error)]
pub enum SchemaError {
    /// A participating declaration is malformed.
    #[error("cannot extract {}: {message}", site(.declaration, .field))]
    Extraction {
        declaration: String,
        field: Option<String>,
        message: String,
    },

    /// A type name is still dangling after every declaration was processed.
    #[error("unresolved type reference `{name}` (referenced from {})", site(.declaration, .field))]
    UnresolvedTypeReference {
        name: String,
        declaration: String,
        field: Option<String>,
    },

    /// Two scalars claim the same internal representation.
    #[error(
        "scalar `{declaration}` binds representation `{}` already bound to `{existing}`",
        key(.internal_type, .tag)
    )]
    DuplicateScalarBinding {
        internal_type: String,
        tag: Option<String>,
        existing: String,
        declaration: String,
    },

    /// An untagged use of the shared numeric representation.
    #[error(
        "ambiguous numeric scalar `{internal_type}` at {}: tag it with one of {}",
        site(.declaration, .field),
        .candidates.join(", ")
    )]
    AmbiguousNumericScalar {
        internal_type: String,
        candidates: Vec<String>,
        declaration: String,
        field: Option<String>,
    },

    /// No scalar binding exists for a representation (and tag).
    #[error("unknown scalar `{}` at {}", key(.internal_type, .tag), site(.declaration, .field))]
    UnknownScalar {
        internal_type: String,
        tag: Option<String>,
        declaration: String,
        field: Option<String>,
    },

    /// A generic declaration applied to the wrong number of arguments.
    #[error(
        "`{generic}` expects {expected} type argument(s) but {actual} were given at {}",
        site(.declaration, .field)
    )]
    InvalidGenericArity {
        generic: String,
        expected: usize,
        actual: usize,
        declaration: String,
        field: Option<String>,
    },

    /// A computed accessor cannot be bound to a resolver.
    #[error("cannot bind accessor `{declaration}.{field}`: {reason}")]
    UnboundAccessor {
        declaration: String,
        field: String,
        reason: String,
        #[source]
        source: Option<Box<SchemaError>>,
    },

    /// A second node was constructed for a name the graph already holds.
    #[error("type `{name}` is defined twice (already a {existing}), conflicting with `{declaration}`")]
    TypeConflict {
        name: String,
        existing: String,
        declaration: String,
    },

    /// An emitted artifact failed its own validation.
    #[error("emitted schema is invalid: {0}")]
    Emit(String),

    /// The pass did not run to completion.
    #[error("internal error: {0}")]
    Internal(String),
}

/// Stage an error originates from, for logging and exit reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Extraction,
    Resolution,
    Registry,
    Generic,
    Binding,
    Emission,
    Internal,
}

impl SchemaError {
    /// Creates an extraction error for a declaration.
    pub fn extraction(declaration: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Extraction {
            declaration: declaration.into(),
            field: None,
            message: message.into(),
        }
    }

    /// Creates an extraction error for one field of a declaration.
    pub fn extraction_at(
        declaration: impl Into<String>,
        field: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::Extraction {
            declaration: declaration.into(),
            field: Some(field.into()),
            message: message.into(),
        }
    }

    /// Creates an accessor binding error with no underlying cause.
    pub fn unbound_accessor(
        declaration: impl Into<String>,
        field: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self::UnboundAccessor {
            declaration: declaration.into(),
            field: field.into(),
            reason: reason.into(),
            source: None,
        }
    }

    /// Wraps a resolution failure of an accessor's return shape.
    pub fn accessor_unresolved(
        declaration: impl Into<String>,
        field: impl Into<String>,
        cause: SchemaError,
    ) -> Self {
        Self::UnboundAccessor {
            declaration: declaration.into(),
            field: field.into(),
            reason: "declared return type does not resolve".into(),
            source: Some(Box::new(cause)),
        }
    }

    /// Returns the innermost error, looking through accessor wrappers.
    pub fn root_cause(&self) -> &SchemaError {
        match self {
            Self::UnboundAccessor {
                source: Some(inner),
                ..
            } => inner.root_cause(),
            other => other,
        }
    }

    /// Returns the declaration this error is attached to, if any.
    pub fn declaration(&self) -> Option<&str> {
        match self {
            Self::Extraction { declaration, .. }
            | Self::UnresolvedTypeReference { declaration, .. }
            | Self::DuplicateScalarBinding { declaration, .. }
            | Self::AmbiguousNumericScalar { declaration, .. }
            | Self::UnknownScalar { declaration, .. }
            | Self::InvalidGenericArity { declaration, .. }
            | Self::UnboundAccessor { declaration, .. }
            | Self::TypeConflict { declaration, .. } => Some(declaration),
            Self::Emit(_) | Self::Internal(_) => None,
        }
    }

    /// Get error category for logging
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Extraction { .. } => ErrorCategory::Extraction,
            Self::UnresolvedTypeReference { .. } | Self::TypeConflict { .. } => {
                ErrorCategory::Resolution
            }
            Self::DuplicateScalarBinding { .. }
            | Self::AmbiguousNumericScalar { .. }
            | Self::UnknownScalar { .. } => ErrorCategory::Registry,
            Self::InvalidGenericArity { .. } => ErrorCategory::Generic,
            Self::UnboundAccessor { .. } => ErrorCategory::Binding,
            Self::Emit(_) => ErrorCategory::Emission,
            Self::Internal(_) => ErrorCategory::Internal,
        }
    }
}

/// A failed compilation unit. Sibling units are unaffected.
#[derive(Debug, Error)]
#[error("compilation unit `{unit}` failed: {source}")]
pub struct CompileError {
    pub unit: String,
    #[source]
    pub source: SchemaError,
}

impl CompileError {
    pub fn new(unit: impl Into<String>, source: SchemaError) -> Self {
        Self {
            unit: unit.into(),
            source,
        }
    }
}

fn site(declaration: &str, field: &Option<String>) -> String {
    match field {
        Some(field) => format!("`{declaration}.{field}`"),
        None => format!("`{declaration}`"),
    }
}

fn key(internal_type: &str, tag: &Option<String>) -> String {
    match tag {
        Some(tag) => format!("{internal_type}#{tag}"),
        None => internal_type.to_string(),
    }
}
