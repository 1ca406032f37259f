//! Type Graph construction.
//!
//! ## Components
//!
//! - [`TypeGraph`] - arena of deduplicated schema nodes
//! - [`TypeResolver`] - walks the Source Model and fills the graph
//! - [`GenericEngine`] - memoized instantiation of generic declarations
//!
//! The resolver owns the Scalar Registry and the memo table for exactly one
//! pass and hands both out with the [`ResolvedSchema`].

mod generic;
mod graph;
mod type_resolver;

pub use generic::{
    GenericEngine, GenericTemplate, InstantiationKey, TemplateField, TemplateType,
    instantiated_name,
};
pub use graph::{
    EnumType, ObjectOrigin, ObjectType, ResolvedArgument, ResolvedField, ScalarType, TypeGraph,
    TypeId, TypeNode,
};
pub use type_resolver::{ResolvedSchema, TypeResolver};
