//! # gqlforge-schema
//!
//! Build-time compiler from annotated object-model declarations to GraphQL
//! schema artifacts.
//!
//! A compilation pass takes one [`HostUnit`] of declaration metadata and
//! produces an SDL document plus Rust resolver bindings for the
//! `async-graphql` dynamic schema API.
//!
//! ## Pipeline
//!
//! Data flows strictly in one direction; no stage mutates an upstream
//! artifact:
//!
//! 1. [`model`] - Declaration Extractor, producing the Source Model
//! 2. [`types`] - Scalar Registry, consulted by the resolver
//! 3. [`schema`] - Type Resolver and Generic Instantiation Engine, producing
//!    the Type Graph
//! 4. [`resolvers`] - Resolver Binder
//! 5. [`emit`] - Schema Emitter
//!
//! [`compiler`] drives a pass per unit.
//!
//! ## Configuration
//!
//! Add to `gqlforge.toml`:
//!
//! ```toml
//! [compiler]
//! model_module = "crate::model"
//! id_type = "async_graphql::ID"
//! emit_sdl = true
//! emit_bindings = true
//! ```

pub mod compiler;
pub mod config;
pub mod emit;
pub mod error;
pub mod model;
pub mod naming;
pub mod resolvers;
pub mod schema;
pub mod types;

// Re-export main types
pub use compiler::{CompiledUnit, PassStats, UnitOutcome, compile_unit, compile_units};
pub use config::CompilerConfig;
pub use emit::{EmittedSchema, Emitter, GENERATED_HEADER};
pub use error::{CompileError, ErrorCategory, SchemaError};
pub use model::host::HostUnit;
pub use model::{SourceModel, extract};
pub use resolvers::{Bindings, ResolverBinder};
pub use schema::{ResolvedSchema, TypeGraph, TypeResolver};
pub use types::ScalarRegistry;

/// Result type for pipeline stages.
pub type Result<T> = std::result::Result<T, SchemaError>;
