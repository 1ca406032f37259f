use std::error::Error;

use colored::Colorize;
use gqlforge_schema::{CompileError, PassStats};

pub fn print_success(msg: &str) {
    println!("{} {}", "✓".green(), msg);
}

pub fn print_error(msg: &str) {
    eprintln!("{} {}", "✗".red(), msg);
}

pub fn print_compiled(unit: &str, stats: &PassStats) {
    print_success(&format!(
        "{} {}",
        unit.bold(),
        format!(
            "({} declarations, {} types, {} instantiations, {} fields)",
            stats.declarations, stats.types, stats.instantiations, stats.bound_fields
        )
        .dimmed()
    ));
}

/// Prints a failed unit with its cause chain.
pub fn print_failure(err: &CompileError) {
    print_error(&format!(
        "{} [{:?}] {}",
        err.unit.bold(),
        err.source.category(),
        err.source
    ));
    let mut cause = err.source.source();
    while let Some(inner) = cause {
        eprintln!("  {} {}", "caused by:".yellow(), inner);
        cause = inner.source();
    }
}

pub fn print_summary(compiled: usize, failed: usize) {
    let line = format!("{compiled} unit(s) compiled, {failed} failed");
    if failed == 0 {
        println!("{}", line.cyan());
    } else {
        eprintln!("{}", line.red());
    }
}
