use clap::{Parser, Subcommand};
use tracing_subscriber::{fmt, EnvFilter};

mod commands;

use commands::{CheckArgs, ListArgs, PredicatesArgs, SchemaArgs, ValidateArgs};

#[derive(Parser)]
#[command(
    name = "shapeguard",
    version,
    about = "Check recorded calls against shapeguard contract manifests"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check one call (arguments and optional result) against a contract
    Check(CheckArgs),
    /// List the contracts in a manifest with their signatures
    List(ListArgs),
    /// Validate a manifest and print a report
    Validate(ValidateArgs),
    /// List the builtin predicate names
    Predicates(PredicatesArgs),
    /// Emit JSON Schema for contract manifests
    Schema(SchemaArgs),
}

fn main() {
    let _ = fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .try_init();

    let cli = Cli::parse();
    let outcome = match cli.command {
        Commands::Check(args) => commands::cmd_check(args),
        Commands::List(args) => commands::cmd_list(args),
        Commands::Validate(args) => commands::cmd_validate(args),
        Commands::Predicates(args) => commands::cmd_predicates(args),
        Commands::Schema(args) => commands::cmd_schema(args),
    };
    if let Err(e) = outcome {
        eprintln!("error: {:#}", e);
        std::process::exit(1);
    }
}
