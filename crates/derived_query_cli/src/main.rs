//! Derived-query compiler CLI.
//!
//! # Responsibility
//! - Load a JSON mapping and compile method names against one aggregate root.
//! - Print each method's SQL and placeholder order, or its violation.
//!
//! # Invariants
//! - Exit status is non-zero when any method fails to compile.

use clap::Parser;
use derived_query_core::{
    core_version, default_log_level, init_logging, CompileError, CompiledQuery,
    DefaultSqlGenerator, DerivedQueryCompiler, LoggingConfig, MappingContext,
};
use log::info;
use serde_json::json;
use std::path::PathBuf;
use std::process::ExitCode;

/// Compile repository method names into SQL
#[derive(Parser)]
#[command(author, version = core_version(), about, long_about = None)]
struct Cli {
    /// JSON mapping document (`{ "entities": [..] }`)
    #[arg(long)]
    mapping: PathBuf,

    /// Aggregate root entity the methods belong to
    #[arg(long)]
    root: String,

    /// Log level (trace|debug|info|warn|error); needs `--log-dir`
    #[arg(long, requires = "log_dir")]
    log_level: Option<String>,

    /// Absolute directory for rolling log files; logging is off when omitted
    #[arg(long)]
    log_dir: Option<PathBuf>,

    /// Print results as a JSON array
    #[arg(long)]
    json: bool,

    /// Method names such as `findByFirstNameAndLastName`
    #[arg(required = true)]
    methods: Vec<String>,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Some(log_dir) = &cli.log_dir {
        let level = cli.log_level.as_deref().unwrap_or(default_log_level());
        if let Err(err) = init_logging(&LoggingConfig::new(level, log_dir)) {
            eprintln!("Logging error: {err}");
            return ExitCode::FAILURE;
        }
    }

    let mapping = match MappingContext::from_json_file(&cli.mapping) {
        Ok(mapping) => mapping,
        Err(err) => {
            eprintln!("Mapping error: {err}");
            return ExitCode::FAILURE;
        }
    };

    let compiler = DerivedQueryCompiler::new(&mapping, DefaultSqlGenerator::new(&mapping));
    let results: Vec<(&str, Result<CompiledQuery, CompileError>)> = cli
        .methods
        .iter()
        .map(|method| (method.as_str(), compiler.compile(&cli.root, method)))
        .collect();
    let failures = results.iter().filter(|(_, result)| result.is_err()).count();

    if cli.json {
        print_json(&results);
    } else {
        print_text(&results);
    }

    info!(
        "event=cli_compile module=cli status={} root={} methods={} failures={}",
        if failures == 0 { "ok" } else { "error" },
        cli.root,
        results.len(),
        failures
    );

    if failures == 0 {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

fn placeholders(compiled: &CompiledQuery) -> Vec<&str> {
    compiled
        .bindings()
        .iter()
        .map(|binding| binding.placeholder.name())
        .collect()
}

fn print_text(results: &[(&str, Result<CompiledQuery, CompileError>)]) {
    for (method, result) in results {
        match result {
            Ok(compiled) => {
                println!("{method} => {}", compiled.sql());
                println!("  placeholders: [{}]", placeholders(compiled).join(", "));
            }
            Err(err) => eprintln!("{method} => error[{}]: {err}", err.violation.code()),
        }
    }
}

fn print_json(results: &[(&str, Result<CompiledQuery, CompileError>)]) {
    let entries: Vec<serde_json::Value> = results
        .iter()
        .map(|(method, result)| match result {
            Ok(compiled) => json!({
                "method": method,
                "sql": compiled.sql(),
                "placeholders": placeholders(compiled),
                "arity": compiled.arity(),
            }),
            Err(err) => json!({
                "method": method,
                "error": err.violation.code(),
                "message": err.to_string(),
            }),
        })
        .collect();

    match serde_json::to_string_pretty(&entries) {
        Ok(text) => println!("{text}"),
        Err(err) => eprintln!("Output error: {err}"),
    }
}

#[cfg(test)]
mod tests {
    use super::Cli;
    use clap::error::ErrorKind;
    use clap::Parser;

    #[test]
    fn log_level_requires_log_dir() {
        let err = Cli::try_parse_from([
            "derived_query_cli",
            "--mapping",
            "mapping.json",
            "--root",
            "Person",
            "--log-level",
            "debug",
            "findByFirstName",
        ])
        .err()
        .expect("log level without directory must fail");
        assert_eq!(err.kind(), ErrorKind::MissingRequiredArgument);

        let cli = Cli::try_parse_from([
            "derived_query_cli",
            "--mapping",
            "mapping.json",
            "--root",
            "Person",
            "--log-level",
            "debug",
            "--log-dir",
            "/tmp/derived_query_logs",
            "findByFirstName",
        ])
        .expect("level with directory");
        assert_eq!(cli.log_level.as_deref(), Some("debug"));
        assert_eq!(cli.methods, vec!["findByFirstName".to_string()]);
    }
}
