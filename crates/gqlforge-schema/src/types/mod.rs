//! Scalar bindings.
//!
//! The [`ScalarRegistry`] maps internal representation types (plus an
//! optional disambiguation tag) to scalar nodes of the Type Graph. One
//! registry exists per compilation pass.

mod scalars;

pub use scalars::{
    BUILTIN_SCALARS, NUMERIC_REPRESENTATION, ScalarBinding, ScalarKey, ScalarLookupError,
    ScalarRegistry, is_builtin_scalar,
};
