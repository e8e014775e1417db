//! # coexsim
//!
//! Command-line entry point for coexsim analyses.

use clap::{Parser, Subcommand, ValueEnum};
use coexsim_common::BandTable;
use coexsim_model::{builtin_catalog, load_catalog, load_configs};
use coexsim_runner::report::{render_bands, render_demo, render_presets, render_text};
use coexsim_runner::{run_analysis, run_demo, RunnerError};
use std::path::{Path, PathBuf};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

// ============================================================================
// CLI Configuration
// ============================================================================

/// Output format for analysis reports.
#[derive(Clone, Copy, Debug, Default, ValueEnum)]
pub enum OutputFormat {
    /// JSON for programmatic consumption.
    #[default]
    Json,
    /// Human-readable text.
    Text,
}

/// coexsim - multi-radio harmonic and intermodulation analysis
#[derive(Parser, Debug)]
#[command(name = "coexsim")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Analyze one or more layered YAML configuration files
    Analyze(AnalyzeConfig),
    /// Run the reference coexistence scenarios
    Demo {
        /// Output format
        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },
    /// List the built-in system presets
    Presets,
    /// List the bands of the catalog
    Bands {
        /// Band catalog file (built-in catalog if not specified)
        #[arg(long)]
        catalog: Option<PathBuf>,
    },
}

/// Configuration for an analysis run
#[derive(Parser, Debug)]
pub struct AnalyzeConfig {
    /// YAML configuration files, later files override earlier ones
    #[arg(required = true)]
    pub configs: Vec<PathBuf>,

    /// Band catalog file (built-in catalog if not specified)
    #[arg(long)]
    pub catalog: Option<PathBuf>,

    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Json)]
    pub format: OutputFormat,
}

fn catalog(path: Option<&Path>) -> Result<BandTable, RunnerError> {
    Ok(match path {
        Some(p) => load_catalog(p)?,
        None => builtin_catalog()?,
    })
}

fn analyze_command(config: AnalyzeConfig) -> Result<(), RunnerError> {
    let paths: Vec<&Path> = config.configs.iter().map(|p| p.as_path()).collect();
    let analysis = load_configs(&paths)?;
    let catalog = catalog(config.catalog.as_deref())?;
    let report = run_analysis(&analysis, &catalog)?;

    match config.format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
        OutputFormat::Text => print!("{}", render_text(&report)),
    }
    Ok(())
}

fn demo_command(format: OutputFormat) -> Result<(), RunnerError> {
    let runs = run_demo(&builtin_catalog()?)?;
    match format {
        OutputFormat::Json => {
            let reports: Vec<_> = runs.iter().map(|(_, report)| report).collect();
            println!("{}", serde_json::to_string_pretty(&reports)?);
        }
        OutputFormat::Text => print!("{}", render_demo(&runs)),
    }
    Ok(())
}

fn main() -> Result<(), RunnerError> {
    // Default to "warn" level if RUST_LOG is not set
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Analyze(config) => analyze_command(config)?,
        Commands::Demo { format } => demo_command(format)?,
        Commands::Presets => print!("{}", render_presets()),
        Commands::Bands { catalog: path } => print!("{}", render_bands(&catalog(path.as_deref())?)),
    }
    Ok(())
}
