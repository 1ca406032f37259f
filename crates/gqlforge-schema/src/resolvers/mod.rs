//! Resolver bindings.
//!
//! Connects every schema field back to the declaration member it reads or
//! invokes:
//! - stored properties are read off the parent value
//! - computed accessors are invoked on it, with decoded arguments
//! - deferred accessors are awaited by the runtime

mod binder;

pub use binder::{
    Accessor, ArgumentBinding, ArgumentDecode, ArgumentShape, Bindings, ParentSource,
    ResolverBinder, ResolverBinding,
};
