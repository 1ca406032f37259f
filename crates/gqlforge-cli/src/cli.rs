use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "gqlforge")]
#[command(about = "gqlforge: compile annotated declarations into GraphQL schema artifacts")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Path to gqlforge.toml (defaults to ./gqlforge.toml when present)
    #[arg(short, long, global = true, env = "GQLFORGE_CONFIG")]
    pub config: Option<PathBuf>,

    /// Log level used when RUST_LOG is not set
    #[arg(long, global = true, default_value = "warn")]
    pub log_level: String,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Compile units and write their artifacts
    Build(BuildArgs),
    /// Compile units and report errors without writing anything
    Check(CheckArgs),
}

#[derive(clap::Args)]
pub struct BuildArgs {
    /// Host metadata documents (JSON); each holds one unit or an array of units
    #[arg(required = true)]
    pub inputs: Vec<PathBuf>,

    /// Output directory (overrides [output] dir)
    #[arg(short, long)]
    pub out_dir: Option<PathBuf>,

    /// Module path the bindings import host types from
    #[arg(long)]
    pub model_module: Option<String>,

    /// Type ID arguments are converted into
    #[arg(long)]
    pub id_type: Option<String>,

    /// Skip the SDL artifact
    #[arg(long)]
    pub no_sdl: bool,

    /// Skip the Rust bindings artifact
    #[arg(long)]
    pub no_bindings: bool,
}

#[derive(clap::Args)]
pub struct CheckArgs {
    /// Host metadata documents (JSON); each holds one unit or an array of units
    #[arg(required = true)]
    pub inputs: Vec<PathBuf>,
}
