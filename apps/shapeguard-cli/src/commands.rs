use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Args;
use schemars::schema_for;
use serde_json::Value;
use shapeguard::manifest::ValidationReport;
use shapeguard::{ContractBook, ContractManifest, PredicateResolver};

#[derive(Args, Clone)]
pub struct ManifestArg {
    /// Path to manifest file (JSON or TOML)
    #[arg(long, env = "SHAPEGUARD_MANIFEST")]
    pub manifest: PathBuf,
}

#[derive(Args, Clone)]
pub struct CheckArgs {
    #[command(flatten)]
    pub manifest: ManifestArg,
    /// Contract name
    #[arg(long)]
    pub contract: String,
    /// Call arguments as a JSON array
    #[arg(long, default_value = "[]")]
    pub args: String,
    /// Produced value as JSON; the return descriptor is only checked when set
    #[arg(long)]
    pub result: Option<String>,
}

#[derive(Args, Clone)]
pub struct ListArgs {
    #[command(flatten)]
    pub manifest: ManifestArg,
}

#[derive(Args, Clone)]
pub struct ValidateArgs {
    #[command(flatten)]
    pub manifest: ManifestArg,
    /// Emit the report as JSON instead of a human summary
    #[arg(long)]
    pub json: bool,
    /// Treat warnings as errors (non-zero exit)
    #[arg(long)]
    pub strict_warnings: bool,
}

#[derive(Args, Clone)]
pub struct PredicatesArgs {
    /// Emit a JSON array
    #[arg(long)]
    pub json: bool,
}

#[derive(Args, Clone)]
pub struct SchemaArgs {
    /// Output path (writes file). If not set, prints to stdout.
    #[arg(long)]
    pub out: Option<PathBuf>,
}

fn load(path: &Path) -> Result<ContractManifest> {
    ContractManifest::from_path(path)
        .with_context(|| format!("loading manifest at {}", path.display()))
}

fn load_book(path: &Path) -> Result<ContractBook> {
    let manifest = load(path)?;
    let book = ContractBook::from_manifest(&manifest, shapeguard_predicates::builtins())
        .with_context(|| format!("compiling contracts from {}", path.display()))?;
    Ok(book)
}

pub fn cmd_check(args: CheckArgs) -> Result<()> {
    let book = load_book(&args.manifest.manifest)?;
    let call_args: Vec<Value> =
        serde_json::from_str(&args.args).context("--args must be a JSON array")?;
    let result = args
        .result
        .as_deref()
        .map(|raw| serde_json::from_str::<Value>(raw))
        .transpose()
        .context("--result must be a JSON value")?;
    tracing::debug!(contract = %args.contract, args = call_args.len(), "checking call");
    book.check_call(&args.contract, &call_args, result.as_ref())?;
    println!("ok");
    Ok(())
}

pub fn cmd_list(args: ListArgs) -> Result<()> {
    let book = load_book(&args.manifest.manifest)?;
    for name in book.names() {
        let signature = book.signature(name)?.signature();
        match book.description(name) {
            Some(description) => println!("{name} {signature}  # {description}"),
            None => println!("{name} {signature}"),
        }
    }
    Ok(())
}

pub fn cmd_validate(args: ValidateArgs) -> Result<()> {
    let path = &args.manifest.manifest;
    let manifest = load(path)?;
    let report = manifest.validate(shapeguard_predicates::builtins());

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_human(&manifest, &report);
    }

    if !report.is_success() {
        anyhow::bail!(
            "manifest has {} error(s); fix and retry",
            report.errors.len()
        );
    }
    if args.strict_warnings && !report.warnings.is_empty() {
        anyhow::bail!(
            "manifest has {} warning(s) (strict); address or drop --strict-warnings",
            report.warnings.len()
        );
    }
    Ok(())
}

fn print_human(manifest: &ContractManifest, report: &ValidationReport) {
    println!(
        "Manifest{}: {} contract(s), {} alias(es)",
        manifest
            .name
            .as_ref()
            .map(|n| format!(" {}", n))
            .unwrap_or_default(),
        manifest.contracts.len(),
        manifest.aliases.len()
    );
    if !report.errors.is_empty() {
        println!("Errors ({}):", report.errors.len());
        for e in &report.errors {
            println!("  - {}: {}", e.field, e.message);
        }
    } else {
        println!("Errors: none");
    }
    if !report.warnings.is_empty() {
        println!("Warnings ({}):", report.warnings.len());
        for w in &report.warnings {
            println!("  - {}: {}", w.field, w.message);
        }
    } else {
        println!("Warnings: none");
    }
}

pub fn cmd_predicates(args: PredicatesArgs) -> Result<()> {
    let names = shapeguard_predicates::builtins().names();
    if args.json {
        println!("{}", serde_json::to_string(&names)?);
    } else {
        for name in names {
            println!("{name}");
        }
    }
    Ok(())
}

pub fn cmd_schema(args: SchemaArgs) -> Result<()> {
    let schema = schema_for!(ContractManifest);
    let json = serde_json::to_string_pretty(&schema)?;
    if let Some(path) = args.out {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).ok();
        }
        std::fs::write(&path, json)
            .with_context(|| format!("writing schema to {}", path.display()))?;
    } else {
        println!("{}", json);
    }
    Ok(())
}
