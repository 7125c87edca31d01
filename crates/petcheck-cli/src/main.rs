//! petcheck CLI - contract tests for the Swagger Pet Store HTTP API

mod storage;

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};

use petcheck_core::report::{FanoutSink, JsonlSink, TracingSink, generate_schema};
use petcheck_core::{Config, Outcome, SchemaRegistry, ValidationStatus, validate_config};
use petcheck_runner::{PetStoreApi, ScenarioRunner};

#[derive(Parser)]
#[command(name = "petcheck")]
#[command(about = "Contract tests for the Swagger Pet Store HTTP API")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format
    #[arg(long, global = true, default_value = "terminal")]
    output: OutputFormat,

    /// Debug-level logging (overridden by RUST_LOG)
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    log_json: bool,

    /// Config file (default: .petcheck.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the scenario catalogue against the service
    Run {
        /// Only scenarios of this feature (Pet, Store)
        #[arg(long)]
        feature: Option<String>,

        /// Only scenarios whose title contains this text
        #[arg(long)]
        filter: Option<String>,

        /// Worker threads for independent scenarios
        #[arg(short, long)]
        parallelism: Option<usize>,

        /// Override the configured base URL
        #[arg(long)]
        base_url: Option<String>,

        /// Write summary.json and reproductions.http here
        #[arg(long)]
        report_dir: Option<PathBuf>,
    },

    /// List scenarios and check the config without sending requests
    List {
        #[arg(long)]
        feature: Option<String>,

        #[arg(long)]
        filter: Option<String>,
    },

    /// Initialize config file
    Init,

    /// Export JSON Schema for the report format
    Schema,

    /// Export the registered response schemas as JSON Schema
    Schemas,
}

#[derive(Clone, Copy, ValueEnum, PartialEq, Eq)]
enum OutputFormat {
    Terminal,
    Json,
    Silent,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.log_json);

    match run(cli) {
        Ok(code) => ExitCode::from(u8::try_from(code).unwrap_or(1)),
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::from(3)
        }
    }
}

fn init_logging(verbose: bool, json: bool) {
    use tracing_subscriber::{EnvFilter, fmt, prelude::*};

    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(fmt::layer().compact().with_writer(std::io::stderr))
            .init();
    }
}

fn load_config(path: Option<&Path>) -> Result<Config> {
    let mut cfg = match path {
        Some(path) => Config::load(path)?,
        None => Config::load_default()?,
    };
    cfg.apply_env_overrides(|key| std::env::var(key).ok())?;
    Ok(cfg)
}

fn run(cli: Cli) -> Result<i32> {
    match cli.command {
        Commands::Run {
            feature,
            filter,
            parallelism,
            base_url,
            report_dir,
        } => {
            let mut cfg = load_config(cli.config.as_deref())?;
            if let Some(url) = base_url {
                cfg.base_url = url;
            }
            if let Some(n) = parallelism {
                cfg.parallelism = n;
            }

            let errors: Vec<_> = validate_config(&cfg)
                .into_iter()
                .filter(|v| v.status == ValidationStatus::Error)
                .collect();
            if !errors.is_empty() {
                for v in &errors {
                    eprintln!("Config error [{}]: {}", v.check, v.message);
                }
                return Ok(3);
            }

            let suite = PetStoreApi::suite(&cfg.base_url)
                .filter(feature.as_deref(), filter.as_deref());

            if cli.output != OutputFormat::Silent {
                eprintln!("Config:");
                eprintln!("  base_url:    {}", cfg.base_url);
                eprintln!("  timeout:     {}s", cfg.timeout_secs);
                eprintln!("  parallelism: {}", cfg.parallelism);
                if !cfg.headers.is_empty() {
                    eprintln!("  headers:     {} configured", cfg.headers.len());
                }
                eprintln!("  scenarios:   {}", suite.len());
                eprintln!();
            }

            let mut sink = FanoutSink::new().with(TracingSink);
            if cfg.dump_events {
                let path = cfg.events_path();
                let jsonl = JsonlSink::create(&path)
                    .with_context(|| format!("cannot open event file {}", path.display()))?;
                sink = sink.with(jsonl);
            }
            let runner = ScenarioRunner::from_config(&cfg)?.with_sink(Arc::new(sink));

            let report = suite.run(&runner, cfg.parallelism);
            let verdict = report.verdict();

            match cli.output {
                OutputFormat::Terminal => {
                    println!("{}", report.to_terminal());
                }
                OutputFormat::Json => {
                    let json_output = serde_json::json!({
                        "verdict": verdict,
                        "counts": report.counts(),
                        "duration_ms": report.duration_ms,
                        "scenarios": report.scenarios,
                    });
                    println!("{}", serde_json::to_string_pretty(&json_output)?);
                }
                OutputFormat::Silent => {}
            }

            if let Some(dir) = report_dir {
                let artifacts = storage::RunArtifacts {
                    config: &cfg,
                    report: &report,
                };
                match storage::save_report(&dir, &artifacts) {
                    Ok(paths) => {
                        if cli.output != OutputFormat::Silent {
                            for path in paths {
                                eprintln!("Wrote {}", path.display());
                            }
                        }
                    }
                    Err(e) => eprintln!("Warning: failed to write report: {e}"),
                }
            }

            if cfg.dump_events && cli.output != OutputFormat::Silent {
                eprintln!("Events: {}", cfg.events_path().display());
            }

            if verdict.status != Outcome::Passed {
                tracing::info!(exit_code = verdict.exit_code, "{}", verdict.reason);
            }
            Ok(verdict.exit_code)
        }

        Commands::List { feature, filter } => {
            let cfg = load_config(cli.config.as_deref())?;
            let plan = PetStoreApi::suite(&cfg.base_url)
                .filter(feature.as_deref(), filter.as_deref())
                .plan(&cfg);
            match cli.output {
                OutputFormat::Terminal => {
                    println!("{}", plan.to_terminal());
                }
                OutputFormat::Json => {
                    println!("{}", serde_json::to_string_pretty(&plan)?);
                }
                OutputFormat::Silent => {}
            }
            Ok(i32::from(plan.has_errors()))
        }

        Commands::Init => {
            let config_path = ".petcheck.toml";
            if Path::new(config_path).exists() {
                eprintln!("{config_path} already exists");
                return Ok(1);
            }

            std::fs::write(config_path, Config::example())?;
            println!("Created {config_path}");
            println!("\nEdit the file to configure:");
            println!("  - base_url: service under test");
            println!("  - headers: auth tokens, API keys");
            println!("  - fixture_ids: identifier range for created resources");
            Ok(0)
        }

        Commands::Schema => {
            println!("{}", generate_schema()?);
            Ok(0)
        }

        Commands::Schemas => {
            let cfg = load_config(cli.config.as_deref())?;
            let mut registry = SchemaRegistry::builtin();
            if let Some(dir) = &cfg.schema_dir {
                registry.load_dir(dir)?;
            }
            let schemas: serde_json::Map<String, serde_json::Value> = registry
                .names()
                .filter_map(|name| {
                    registry
                        .get(name)
                        .map(|def| (name.to_string(), def.root.to_json_schema()))
                })
                .collect();
            println!("{}", serde_json::to_string_pretty(&schemas)?);
            Ok(0)
        }
    }
}
