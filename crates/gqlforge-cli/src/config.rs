//! `gqlforge.toml` loading.
//!
//! ```toml
//! [compiler]
//! model_module = "crate::model"
//! id_type = "async_graphql::ID"
//! emit_sdl = true
//! emit_bindings = true
//!
//! [output]
//! dir = "generated"
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use gqlforge_schema::CompilerConfig;
use serde::{Deserialize, Serialize};

use crate::cli::BuildArgs;

pub const DEFAULT_CONFIG_FILE: &str = "gqlforge.toml";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileConfig {
    #[serde(default)]
    pub compiler: CompilerConfig,

    #[serde(default)]
    pub output: OutputConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Directory artifacts are written to.
    /// Default: `generated`
    #[serde(default = "default_output_dir")]
    pub dir: PathBuf,
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("generated")
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: default_output_dir(),
        }
    }
}

/// Loads the configuration file.
///
/// An explicit path must exist; without one, `./gqlforge.toml` is used when
/// present and defaults otherwise.
pub fn load(path: Option<&Path>) -> Result<FileConfig> {
    let path = match path {
        Some(path) => path.to_path_buf(),
        None => {
            let default = PathBuf::from(DEFAULT_CONFIG_FILE);
            if !default.exists() {
                return Ok(FileConfig::default());
            }
            default
        }
    };

    let content = fs::read_to_string(&path)
        .with_context(|| format!("Cannot read config file {}", path.display()))?;
    let config: FileConfig = toml::from_str(&content)
        .with_context(|| format!("Invalid config file {}", path.display()))?;
    tracing::debug!(path = %path.display(), "Loaded configuration");
    Ok(config)
}

impl FileConfig {
    /// Applies command-line flags on top of file values.
    pub fn apply_overrides(&mut self, args: &BuildArgs) {
        if let Some(dir) = &args.out_dir {
            self.output.dir = dir.clone();
        }
        if let Some(module) = &args.model_module {
            self.compiler.model_module = module.clone();
        }
        if let Some(id_type) = &args.id_type {
            self.compiler.id_type = id_type.clone();
        }
        if args.no_sdl {
            self.compiler.emit_sdl = false;
        }
        if args.no_bindings {
            self.compiler.emit_bindings = false;
        }
    }

    pub fn validate(&self) -> Result<()> {
        self.compiler.validate().map_err(anyhow::Error::msg)?;
        if self.output.dir.as_os_str().is_empty() {
            anyhow::bail!("output.dir must not be empty");
        }
        Ok(())
    }
}
