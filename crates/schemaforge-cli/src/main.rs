use std::fs;
use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand, ValueEnum};
use jsonschema::JSONSchema;
use schemaforge_core::{
    emission_report, validate_graph, Error as CoreError, LoadOptions, OnInconsistency,
    SchemaDocument, SchemaGraph,
};
use schemaforge_ddl::{compile, CompileError, Dialect};
use thiserror::Error;

#[derive(Debug, Error)]
enum CliError {
    #[error("core error: {0}")]
    Core(#[from] CoreError),
    #[error("compile error: {0}")]
    Compile(#[from] CompileError),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("document schema error: {0}")]
    DocumentSchema(String),
    #[error("document is invalid: {0} issue(s)")]
    DocumentInvalid(usize),
}

#[derive(Parser, Debug)]
#[command(name = "schemaforge", version, about = "Schemaforge CLI")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Compile a schema document into a DDL script.
    Compile(CompileArgs),
    /// Validate a schema document without compiling it.
    Validate(DocumentArgs),
    /// Print the table emission plan for a schema document.
    Order(DocumentArgs),
    /// Emit the JSON Schema that schema documents must satisfy.
    Schema,
}

#[derive(Args, Debug)]
struct CompileArgs {
    /// Path to the schema document.
    input: PathBuf,
    /// Output path for the generated script; stdout when omitted.
    #[arg(long)]
    out: Option<PathBuf>,
    /// Target SQL dialect.
    #[arg(long, value_enum, default_value = "mysql")]
    dialect: DialectArg,
    /// Repair inconsistent foreign keys instead of rejecting the document.
    #[arg(long, default_value_t = false)]
    repair: bool,
}

#[derive(Args, Debug)]
struct DocumentArgs {
    /// Path to the schema document.
    input: PathBuf,
    /// Repair inconsistent foreign keys instead of rejecting the document.
    #[arg(long, default_value_t = false)]
    repair: bool,
}

#[derive(ValueEnum, Debug, Clone, Copy)]
enum DialectArg {
    Mysql,
}

impl From<DialectArg> for Dialect {
    fn from(value: DialectArg) -> Self {
        match value {
            DialectArg::Mysql => Dialect::MySql,
        }
    }
}

fn main() -> Result<(), CliError> {
    init_logging();
    let cli = Cli::parse();

    match cli.command {
        Command::Compile(args) => run_compile(args),
        Command::Validate(args) => run_validate(args),
        Command::Order(args) => run_order(args),
        Command::Schema => run_schema(),
    }
}

fn init_logging() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn run_compile(args: CompileArgs) -> Result<(), CliError> {
    let graph = load_graph(&args.input, args.repair)?;
    if graph.database_name().is_empty() {
        tracing::warn!(event = "missing_database_name", "script header will be omitted");
    }

    let script = compile(&graph, args.dialect.into())?;
    tracing::info!(
        event = "compiled",
        tables = graph.tables().len(),
        bytes = script.len()
    );

    match args.out {
        Some(path) => {
            fs::write(&path, script)?;
            tracing::info!(event = "script_written", path = %path.display());
        }
        None => print!("{script}"),
    }
    Ok(())
}

fn run_validate(args: DocumentArgs) -> Result<(), CliError> {
    let raw = fs::read_to_string(&args.input)?;
    let value: serde_json::Value = serde_json::from_str(&raw)?;

    let issues = check_document_shape(&value)?;
    for issue in &issues {
        println!("shape: {issue}");
    }
    if !issues.is_empty() {
        return Err(CliError::DocumentInvalid(issues.len()));
    }

    let document: SchemaDocument = serde_json::from_value(value)?;
    let graph = document.into_graph(load_options(args.repair))?;
    validate_graph(&graph)?;

    tracing::info!(event = "document_valid", tables = graph.tables().len());
    println!(
        "document is valid: {} table(s), {} connection(s)",
        graph.tables().len(),
        graph.connections().len()
    );
    Ok(())
}

fn run_order(args: DocumentArgs) -> Result<(), CliError> {
    let graph = load_graph(&args.input, args.repair)?;
    let report = emission_report(&graph);
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

fn run_schema() -> Result<(), CliError> {
    let schema = schemars::schema_for!(SchemaDocument);
    println!("{}", serde_json::to_string_pretty(&schema)?);
    Ok(())
}

fn load_graph(path: &Path, repair: bool) -> Result<SchemaGraph, CliError> {
    let raw = fs::read_to_string(path)?;
    let document: SchemaDocument = serde_json::from_str(&raw)?;
    tracing::info!(event = "document_loaded", path = %path.display(), tables = document.tables.len());
    let graph = document.into_graph(load_options(repair))?;
    Ok(graph)
}

fn load_options(repair: bool) -> LoadOptions {
    LoadOptions {
        on_inconsistency: if repair {
            OnInconsistency::Repair
        } else {
            OnInconsistency::Reject
        },
    }
}

/// Check the raw value against the generated document schema before
/// deserializing, so shape problems report a JSON pointer instead of a
/// serde error.
fn check_document_shape(value: &serde_json::Value) -> Result<Vec<String>, CliError> {
    let schema = schemars::schema_for!(SchemaDocument);
    let schema_value = serde_json::to_value(&schema)?;
    let compiled = JSONSchema::compile(&schema_value)
        .map_err(|err| CliError::DocumentSchema(err.to_string()))?;

    let mut issues = Vec::new();
    if let Err(errors) = compiled.validate(value) {
        for error in errors {
            issues.push(format!("{}: {error}", error.instance_path));
        }
    }
    Ok(issues)
}
