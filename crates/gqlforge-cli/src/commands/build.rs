use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use gqlforge_schema::{CompiledUnit, compile_units};

use crate::cli::BuildArgs;
use crate::config::FileConfig;
use crate::output::{print_compiled, print_failure, print_summary};

/// Compiles every unit and writes the artifacts of the ones that succeed.
/// Returns whether all units compiled.
pub async fn build(args: &BuildArgs, mut config: FileConfig) -> Result<bool> {
    config.apply_overrides(args);
    config.validate()?;

    let units = super::load_units(&args.inputs)?;
    let out_dir = config.output.dir.clone();
    fs::create_dir_all(&out_dir)
        .with_context(|| format!("Cannot create output directory {}", out_dir.display()))?;

    let outcomes = compile_units(units, config.compiler).await;
    let mut compiled = 0;
    let mut failed = 0;
    for outcome in &outcomes {
        match &outcome.result {
            Ok(unit) => {
                let written = write_artifacts(&out_dir, unit)?;
                tracing::info!(unit = %unit.unit, files = ?written, "Wrote artifacts");
                print_compiled(&unit.unit, &unit.stats);
                compiled += 1;
            }
            Err(err) => {
                tracing::warn!(unit = %err.unit, category = ?err.source.category(), "Unit failed");
                print_failure(err);
                failed += 1;
            }
        }
    }

    print_summary(compiled, failed);
    Ok(failed == 0)
}

/// Writes `<unit>.graphql` and `<unit>.rs` for whichever artifacts exist.
pub fn write_artifacts(out_dir: &Path, unit: &CompiledUnit) -> Result<Vec<PathBuf>> {
    let stem = super::file_stem(&unit.unit);
    let mut written = Vec::new();
    for (artifact, extension) in [(&unit.sdl, "graphql"), (&unit.bindings, "rs")] {
        let Some(content) = artifact else {
            continue;
        };
        let path = out_dir.join(format!("{stem}.{extension}"));
        fs::write(&path, content).with_context(|| format!("Cannot write {}", path.display()))?;
        written.push(path);
    }
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use gqlforge_schema::PassStats;

    fn compiled(name: &str, sdl: Option<&str>, bindings: Option<&str>) -> CompiledUnit {
        CompiledUnit {
            unit: name.to_string(),
            sdl: sdl.map(str::to_string),
            bindings: bindings.map(str::to_string),
            stats: PassStats::default(),
        }
    }

    #[test]
    fn test_writes_both_artifacts() {
        let dir = tempfile::tempdir().unwrap();
        let unit = compiled("accounts", Some("type A {\n  b: String\n}\n"), Some("// bindings\n"));

        let written = write_artifacts(dir.path(), &unit).unwrap();
        assert_eq!(
            written,
            [dir.path().join("accounts.graphql"), dir.path().join("accounts.rs")]
        );
        assert_eq!(
            fs::read_to_string(dir.path().join("accounts.graphql")).unwrap(),
            "type A {\n  b: String\n}\n"
        );
    }

    #[test]
    fn test_skips_disabled_artifact() {
        let dir = tempfile::tempdir().unwrap();
        let unit = compiled("accounts", Some("scalar A\n"), None);
        let written = write_artifacts(dir.path(), &unit).unwrap();
        assert_eq!(written, [dir.path().join("accounts.graphql")]);
        assert!(!dir.path().join("accounts.rs").exists());
    }
}
