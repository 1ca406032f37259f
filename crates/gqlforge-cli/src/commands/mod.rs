pub mod build;
pub mod check;

use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use gqlforge_schema::HostUnit;
use serde::Deserialize;

/// A metadata document holds one unit or a list of them.
#[derive(Deserialize)]
#[serde(untagged)]
enum Document {
    Many(Vec<HostUnit>),
    One(HostUnit),
}

/// Reads every input document, keeping units in argument order.
pub fn load_units(inputs: &[PathBuf]) -> Result<Vec<HostUnit>> {
    let mut units = Vec::new();
    for path in inputs {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Cannot read input {}", path.display()))?;
        let document: Document = serde_json::from_str(&content)
            .with_context(|| format!("Invalid host metadata in {}", path.display()))?;
        match document {
            Document::Many(many) => units.extend(many),
            Document::One(one) => units.push(one),
        }
    }

    let mut stems: HashMap<String, &str> = HashMap::new();
    for unit in &units {
        if let Some(other) = stems.insert(file_stem(&unit.name), &unit.name) {
            if other == unit.name {
                anyhow::bail!("Unit `{}` is defined more than once", unit.name);
            }
            anyhow::bail!(
                "Units `{other}` and `{}` would both write `{}.*`",
                unit.name,
                file_stem(&unit.name)
            );
        }
    }
    tracing::info!(units = units.len(), "Loaded host metadata");
    Ok(units)
}

/// File name for a unit; anything outside `[A-Za-z0-9_.-]` becomes `_`.
pub(crate) fn file_stem(unit: &str) -> String {
    unit.chars()
        .map(|ch| match ch {
            'a'..='z' | 'A'..='Z' | '0'..='9' | '_' | '-' | '.' => ch,
            _ => '_',
        })
        .collect()
}
