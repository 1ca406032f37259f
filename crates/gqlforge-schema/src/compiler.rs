//! Compilation pass driver.
//!
//! One pass runs Extractor, Type Resolver, Resolver Binder and Emitter in
//! sequence with a fresh Scalar Registry and memo table. Several units run
//! as independent passes on the blocking pool; a failing unit never affects
//! its siblings.

use std::sync::Arc;

use tokio::task::JoinSet;
use tracing::{debug, warn};

use crate::config::CompilerConfig;
use crate::emit::Emitter;
use crate::error::{CompileError, SchemaError};
use crate::model::extract;
use crate::model::host::HostUnit;
use crate::resolvers::ResolverBinder;
use crate::schema::TypeResolver;

/// Counts reported for a compiled unit.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PassStats {
    pub declarations: usize,
    pub types: usize,
    pub instantiations: usize,
    pub scalars: usize,
    pub bound_fields: usize,
}

#[derive(Debug, Clone)]
pub struct CompiledUnit {
    pub unit: String,
    pub sdl: Option<String>,
    pub bindings: Option<String>,
    pub stats: PassStats,
}

/// Result of one unit in a multi-unit run.
#[derive(Debug)]
pub struct UnitOutcome {
    pub unit: String,
    pub result: Result<CompiledUnit, CompileError>,
}

/// Runs the whole pipeline on one unit.
pub fn compile_unit(
    unit: &HostUnit,
    config: &CompilerConfig,
) -> Result<CompiledUnit, CompileError> {
    run_pass(unit, config).map_err(|err| CompileError::new(&unit.name, err))
}

fn run_pass(unit: &HostUnit, config: &CompilerConfig) -> Result<CompiledUnit, SchemaError> {
    config.validate().map_err(SchemaError::Internal)?;

    let model = extract(unit)?;
    let schema = TypeResolver::new(&model).resolve()?;
    let bindings = ResolverBinder::new(&model, &schema).bind()?;
    let emitted = Emitter::new(&model, &schema, &bindings, config).emit()?;

    let stats = PassStats {
        declarations: model.len(),
        types: schema.graph.named().count(),
        instantiations: schema.generics.len(),
        scalars: schema.registry.len(),
        bound_fields: bindings.len(),
    };
    debug!(unit = %unit.name, ?stats, "Compiled unit");

    Ok(CompiledUnit {
        unit: unit.name.clone(),
        sdl: emitted.sdl,
        bindings: emitted.bindings,
        stats,
    })
}

/// Compiles every unit as its own pass. Outcomes keep the input order.
pub async fn compile_units(units: Vec<HostUnit>, config: CompilerConfig) -> Vec<UnitOutcome> {
    let config = Arc::new(config);
    let names: Vec<String> = units.iter().map(|unit| unit.name.clone()).collect();

    let mut join_set = JoinSet::new();
    for (index, unit) in units.into_iter().enumerate() {
        let config = Arc::clone(&config);
        join_set.spawn_blocking(move || (index, compile_unit(&unit, &config)));
    }

    let mut slots: Vec<Option<Result<CompiledUnit, CompileError>>> =
        names.iter().map(|_| None).collect();
    while let Some(joined) = join_set.join_next().await {
        match joined {
            Ok((index, result)) => slots[index] = Some(result),
            Err(err) => warn!(error = %err, "Compilation task did not finish"),
        }
    }

    names
        .into_iter()
        .zip(slots)
        .map(|(unit, slot)| {
            let result = slot.unwrap_or_else(|| {
                Err(CompileError::new(
                    &unit,
                    SchemaError::Internal("compilation task aborted".into()),
                ))
            });
            UnitOutcome { unit, result }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::host::{HostDeclaration, HostField, HostTypeShape};

    fn unit(name: &str, field_type: &str) -> HostUnit {
        HostUnit::new(name).with_declaration(
            HostDeclaration::object("Item")
                .with_field(HostField::property("value", HostTypeShape::named(field_type))),
        )
    }

    #[test]
    fn test_compile_unit_stats() {
        let compiled = compile_unit(&unit("a", "string"), &CompilerConfig::default()).unwrap();
        assert_eq!(compiled.unit, "a");
        assert_eq!(compiled.stats.declarations, 1);
        assert_eq!(compiled.stats.bound_fields, 1);
        assert_eq!(compiled.stats.instantiations, 0);
        assert!(compiled.sdl.is_some());
        assert!(compiled.bindings.is_some());
    }

    #[test]
    fn test_error_names_unit() {
        let err = compile_unit(&unit("broken", "Missing"), &CompilerConfig::default()).unwrap_err();
        assert_eq!(err.unit, "broken");
        assert!(matches!(err.source, SchemaError::UnresolvedTypeReference { .. }));
    }

    #[test]
    fn test_invalid_config_fails_pass() {
        let config = CompilerConfig {
            emit_sdl: false,
            emit_bindings: false,
            ..Default::default()
        };
        let err = compile_unit(&unit("a", "string"), &config).unwrap_err();
        assert!(matches!(err.source, SchemaError::Internal(_)));
    }

    #[test]
    fn test_units_keep_input_order() {
        let units = vec![
            unit("first", "string"),
            unit("second", "Missing"),
            unit("third", "boolean"),
        ];
        let outcomes = tokio_test::block_on(compile_units(units, CompilerConfig::default()));

        let names: Vec<&str> = outcomes.iter().map(|outcome| outcome.unit.as_str()).collect();
        assert_eq!(names, ["first", "second", "third"]);
        assert!(outcomes[0].result.is_ok());
        assert!(outcomes[1].result.is_err());
        assert!(outcomes[2].result.is_ok());
    }
}
