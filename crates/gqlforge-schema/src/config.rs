//! Compiler configuration.
//!
//! Configuration can be specified in `gqlforge.toml` under the `[compiler]` section.
//!
//! # Example Configuration
//!
//! ```toml
//! [compiler]
//! model_module = "crate::model"
//! id_type = "async_graphql::ID"
//! emit_sdl = true
//! emit_bindings = true
//! ```

use serde::{Deserialize, Serialize};

/// Schema compiler configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompilerConfig {
    /// Module path the emitted Rust bindings import host types from.
    /// Default: `crate::model`
    #[serde(default = "default_model_module")]
    pub model_module: String,

    /// Type that raw `ID` arguments are converted into before being passed
    /// to an accessor. Must implement `From<String>`.
    /// Default: `async_graphql::ID`
    #[serde(default = "default_id_type")]
    pub id_type: String,

    /// Emit the SDL artifact.
    /// Default: true
    #[serde(default = "default_emit_sdl")]
    pub emit_sdl: bool,

    /// Emit the Rust bindings artifact.
    /// Default: true
    #[serde(default = "default_emit_bindings")]
    pub emit_bindings: bool,
}

fn default_model_module() -> String {
    "crate::model".to_string()
}

fn default_id_type() -> String {
    "async_graphql::ID".to_string()
}

fn default_emit_sdl() -> bool {
    true
}

fn default_emit_bindings() -> bool {
    true
}

impl Default for CompilerConfig {
    fn default() -> Self {
        Self {
            model_module: default_model_module(),
            id_type: default_id_type(),
            emit_sdl: default_emit_sdl(),
            emit_bindings: default_emit_bindings(),
        }
    }
}

impl CompilerConfig {
    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration values are invalid.
    pub fn validate(&self) -> Result<(), String> {
        if self.model_module.trim().is_empty() {
            return Err("compiler.model_module must not be empty".into());
        }
        if self.id_type.trim().is_empty() {
            return Err("compiler.id_type must not be empty".into());
        }
        if !self.emit_sdl && !self.emit_bindings {
            return Err("at least one of compiler.emit_sdl and compiler.emit_bindings must be enabled".into());
        }
        Ok(())
    }
}
