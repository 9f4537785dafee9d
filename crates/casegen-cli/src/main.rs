//! casegen CLI - schema-conformant API test cases with pinned overrides

use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use casegen_core::{ApiSpec, Config, ExplicitOverrides};
use casegen_strategy::{CaseSampler, JsonSchemaGenerator, case_strategy};

#[derive(Parser)]
#[command(name = "casegen")]
#[command(about = "Generate schema-conformant API test cases with pinned overrides")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Draw cases for one operation and print them as JSON lines
    Sample {
        /// Operation label, e.g. "POST /users" (default: from config)
        #[arg(short, long)]
        operation: Option<String>,

        /// OpenAPI spec file (default: from config)
        #[arg(short, long)]
        spec: Option<PathBuf>,

        /// Config file (default: .casegen.toml)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Number of cases to draw
        #[arg(short = 'n', long)]
        count: Option<u32>,

        /// Seed for a reproducible sequence
        #[arg(long)]
        seed: Option<u64>,

        /// Explicit overrides as JSON, e.g. '{"headers": {"X-Id": "1"}}'
        #[arg(long = "override", value_name = "JSON")]
        overrides: Option<String>,
    },

    /// List the operations declared in a spec
    Operations {
        /// OpenAPI spec file (default: from config)
        #[arg(short, long)]
        spec: Option<PathBuf>,
    },

    /// Initialize config file
    Init,

    /// Export JSON Schema for the case format
    Schema,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::from(3)
        }
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn load_config(path: Option<&Path>) -> Result<Config> {
    match path {
        Some(path) => Config::load(path).with_context(|| format!("loading {}", path.display())),
        None => Config::load_default().context("loading default config"),
    }
}

fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Sample {
            operation,
            spec,
            config,
            count,
            seed,
            overrides,
        } => {
            let cfg = load_config(config.as_deref())?;
            let spec_path = spec.unwrap_or_else(|| cfg.spec.clone());
            let api = ApiSpec::load(&spec_path)
                .with_context(|| format!("loading spec {}", spec_path.display()))?;

            let Some(label) = operation.or_else(|| cfg.operation.clone()) else {
                bail!("no operation given; pass --operation or set `operation` in the config");
            };
            let operation = api.operation(&label)?;

            // --override replaces the config table wholesale
            let overrides = match overrides {
                Some(raw) => {
                    let value: serde_json::Value =
                        serde_json::from_str(&raw).context("parsing --override")?;
                    ExplicitOverrides::from_value(&value).context("parsing --override")?
                }
                None => cfg.explicit_overrides()?,
            };

            let generator = JsonSchemaGenerator::new(api.components());
            let strategy = case_strategy(&operation, &overrides, &generator)?;
            let sampler = CaseSampler::new(strategy, seed.or(cfg.seed));
            let count = count.unwrap_or(cfg.count);
            tracing::info!(operation = %label, seed = sampler.seed(), count, "sampling cases");

            let stdout = std::io::stdout();
            let mut out = stdout.lock();
            for case in sampler.take(count as usize) {
                writeln!(out, "{}", serde_json::to_string(&case?)?)?;
            }
            Ok(())
        }

        Commands::Operations { spec } => {
            let spec_path = match spec {
                Some(path) => path,
                None => load_config(None)?.spec,
            };
            let api = ApiSpec::load(&spec_path)
                .with_context(|| format!("loading spec {}", spec_path.display()))?;
            for op in api.operations() {
                println!("{}", op.label());
            }
            Ok(())
        }

        Commands::Init => {
            let config_path = Path::new(".casegen.toml");
            if config_path.exists() {
                bail!("{} already exists", config_path.display());
            }

            std::fs::write(config_path, Config::example())?;
            println!("Created {}", config_path.display());
            println!("\nEdit the file to configure:");
            println!("  - spec: path to your OpenAPI spec");
            println!("  - operation: which operation to sample");
            println!("  - overrides: values pinned in every case");
            Ok(())
        }

        Commands::Schema => {
            println!("{}", casegen_core::case::generate_schema());
            Ok(())
        }
    }
}
