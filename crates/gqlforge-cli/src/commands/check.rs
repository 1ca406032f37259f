use anyhow::Result;
use gqlforge_schema::compile_units;

use crate::cli::CheckArgs;
use crate::config::FileConfig;
use crate::output::{print_compiled, print_failure, print_summary};

/// Runs every pass without writing artifacts. Returns whether all units
/// compiled.
pub async fn check(args: &CheckArgs, config: FileConfig) -> Result<bool> {
    config.validate()?;
    let units = super::load_units(&args.inputs)?;

    let outcomes = compile_units(units, config.compiler).await;
    let mut failed = 0;
    for outcome in &outcomes {
        match &outcome.result {
            Ok(unit) => print_compiled(&unit.unit, &unit.stats),
            Err(err) => {
                print_failure(err);
                failed += 1;
            }
        }
    }

    print_summary(outcomes.len() - failed, failed);
    Ok(failed == 0)
}
