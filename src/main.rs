use clap::{ArgAction, Parser, Subcommand};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::level_filters::LevelFilter;

use equity::codegen::builder::Step;
use equity::config::{Config, OutputFormat};
use equity::diagnostics::{render_error, CompileError};
use equity::parser::ast::Contract;
use equity::ContractArg;

#[derive(Parser)]
#[command(name = "equityc", version, about = "The Equity contract compiler")]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compile an .equity source file and print its contracts
    Compile {
        /// Source file path
        file: PathBuf,
        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
        /// Include pre-optimization generation steps
        #[arg(long)]
        steps: bool,
        /// Path to equity.toml (defaults to one next to the source file)
        #[arg(long)]
        config: Option<PathBuf>,
    },
    /// Compile a contract and bind arguments into a deployable program
    Instantiate {
        /// Source file path
        file: PathBuf,
        /// Contract to instantiate (defaults to the last one in the file)
        #[arg(long)]
        contract: Option<String>,
        /// Path to equity.toml (defaults to one next to the source file)
        #[arg(long)]
        config: Option<PathBuf>,
        /// Arguments in parameter order: true/false, integers, or 0x-prefixed hex
        #[arg(allow_hyphen_values = true)]
        args: Vec<ContractArg>,
    },
    /// Print the compiler version
    Version,
}

/// A compiled contract with its generation steps attached.
#[derive(Serialize)]
struct ContractOutput<'a> {
    #[serde(flatten)]
    contract: &'a Contract,
    #[serde(skip_serializing_if = "Option::is_none")]
    steps: Option<&'a [Step]>,
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => LevelFilter::WARN,
        1 => LevelFilter::INFO,
        2 => LevelFilter::DEBUG,
        _ => LevelFilter::TRACE,
    };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .with_max_level(level)
        .init();
}

fn load_config(file: &Path, explicit: Option<&Path>) -> Result<Config, CompileError> {
    match explicit {
        Some(path) => Config::load(path),
        None => Ok(Config::discover(file)?.unwrap_or_default()),
    }
}

/// Compiles `file`, printing a diagnostic and exiting on failure.
fn compile_or_exit(file: &Path, config: &Config) -> Vec<Contract> {
    match equity::compile_file(file, &config.import_paths) {
        Ok(contracts) => contracts,
        Err(err) => {
            let source = std::fs::read_to_string(file).unwrap_or_default();
            render_error(&source, &file.to_string_lossy(), &err);
            std::process::exit(1);
        }
    }
}

fn config_or_exit(file: &Path, explicit: Option<&Path>) -> Config {
    load_config(file, explicit).unwrap_or_else(|err| {
        render_error("", &file.to_string_lossy(), &err);
        std::process::exit(1);
    })
}

fn print_text(contracts: &[Contract], steps: bool) {
    for contract in contracts {
        println!("contract {}", contract.name);
        println!("  recursive: {}", contract.recursive);
        println!("  body: {}", equity::hex::encode(&contract.body));
        println!("  opcodes: {}", contract.opcodes);
        if steps {
            println!("  steps:");
            for step in &contract.steps {
                println!("    {:<32} {}", step.opcodes, step.stack);
            }
        }
    }
}

fn print_json(contracts: &[Contract], steps: bool) {
    let out: Vec<ContractOutput<'_>> = contracts
        .iter()
        .map(|c| ContractOutput { contract: c, steps: steps.then_some(c.steps.as_slice()) })
        .collect();
    match serde_json::to_string_pretty(&out) {
        Ok(json) => println!("{json}"),
        Err(e) => {
            eprintln!("error: failed to serialize output: {e}");
            std::process::exit(1);
        }
    }
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Compile { file, json, steps, config } => {
            let config = config_or_exit(&file, config.as_deref());
            let contracts = compile_or_exit(&file, &config);
            let steps = steps || config.steps;
            if json || config.format == OutputFormat::Json {
                print_json(&contracts, steps);
            } else {
                print_text(&contracts, steps);
            }
        }
        Commands::Instantiate { file, contract, config, args } => {
            let config = config_or_exit(&file, config.as_deref());
            let contracts = compile_or_exit(&file, &config);
            let target = match &contract {
                Some(name) => contracts.iter().find(|c| &c.name == name),
                None => contracts.last(),
            };
            let program = match target {
                Some(target) => equity::instantiate(&target.body, &target.params, target.recursive, &args),
                None => Err(CompileError::instantiation(format!(
                    "no contract named \"{}\" in {}",
                    contract.unwrap_or_default(),
                    file.display()
                ))),
            };
            match program {
                Ok(program) => println!("{}", equity::hex::encode(&program)),
                Err(err) => {
                    render_error("", &file.to_string_lossy(), &err);
                    std::process::exit(1);
                }
            }
        }
        Commands::Version => {
            println!("{}", equity::version_with_commit(option_env!("EQUITY_GIT_COMMIT").unwrap_or_default()));
        }
    }
}
