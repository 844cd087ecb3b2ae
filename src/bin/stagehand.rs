//! stagehand — deployment script generator CLI
//!
//! # Usage
//!
//! ```bash
//! # Write a parameter file to fill in
//! stagehand init -o policy.json
//!
//! # Generate every artifact for a new run
//! stagehand generate policy.json --out deploy/
//!
//! # Regenerate from an exported parameter file (deployer)
//! stagehand deploy deploy/deploy_params_POLICY_jdo_20240101_093000.json
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{Local, NaiveDateTime};
use clap::{Parser, Subcommand, ValueEnum};
use colored::*;
use stagehand::assemble::Artifacts;
use stagehand::lint::print_report;
use stagehand::params::ImportedParameters;
use stagehand::prelude::*;
use stagehand::settings::Settings;

#[derive(Parser)]
#[command(name = "stagehand")]
#[command(version)]
#[command(about = "Stage and historic stage deployment script generator", long_about = None)]
#[command(after_help = "EXAMPLES:
    stagehand init -o policy.json
    stagehand generate policy.json --initials jdo --out deploy
    stagehand show policy.json --step 3
    stagehand show policy.json --pipeline daily")]
struct Cli {
    /// Log progress (RUST_LOG takes precedence)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a parameter file with every default filled in
    Init {
        /// Target file
        #[arg(short, long, default_value = "stagehand_params.json")]
        output: PathBuf,
    },
    /// Start a new run and write all artifacts
    Generate {
        /// Parameter file
        config: PathBuf,

        /// Operator initials used in the table suffix
        #[arg(long, env = "STAGEHAND_INITIALS")]
        initials: Option<String>,

        /// Output directory
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Regenerate the artifacts of an exported run
    Deploy {
        /// Exported parameter file
        export: PathBuf,

        /// Output directory
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Print a single artifact
    Show {
        /// Parameter file
        config: PathBuf,

        /// Step number (1-9)
        #[arg(long, conflicts_with = "pipeline", required_unless_present = "pipeline")]
        step: Option<usize>,

        /// Pipeline document
        #[arg(long, value_enum)]
        pipeline: Option<PipelineArg>,
    },
    /// Check a parameter file for input that corrupts the scripts
    Lint {
        /// Parameter file
        config: PathBuf,

        /// Only report errors
        #[arg(long)]
        strict: bool,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum PipelineArg {
    Initial,
    Daily,
    InvalidHs,
    Placeholder,
}

impl From<PipelineArg> for PipelineMode {
    fn from(arg: PipelineArg) -> Self {
        match arg {
            PipelineArg::Initial => PipelineMode::Initial,
            PipelineArg::Daily => PipelineMode::Daily,
            PipelineArg::InvalidHs => PipelineMode::InvalidHs,
            PipelineArg::Placeholder => PipelineMode::Placeholder,
        }
    }
}

fn main() {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "info" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .init();

    let result = Settings::load()
        .context("Failed to load settings")
        .and_then(|settings| match cli.command {
            Commands::Init { output } => init(&output, &settings),
            Commands::Generate {
                config,
                initials,
                out,
            } => generate(&config, initials, out, &settings),
            Commands::Deploy { export, out } => deploy(&export, out, &settings),
            Commands::Show {
                config,
                step,
                pipeline,
            } => show(&config, step, pipeline),
            Commands::Lint { config, strict } => lint(&config, strict),
        });

    if let Err(e) = result {
        eprintln!("{} {:#}", "Error:".red().bold(), e);
        std::process::exit(1);
    }
}

fn now() -> NaiveDateTime {
    Local::now().naive_local()
}

fn read_parameters(path: &Path) -> Result<ImportedParameters> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let imported = import_parameters(&content)
        .with_context(|| format!("Failed to import {}", path.display()))?;
    Ok(imported)
}

/// Resume the exported suffix when there is one, start a new run otherwise.
fn run_for(imported: &ImportedParameters) -> Result<Run> {
    let run = match &imported.table_suffix {
        Some(suffix) => Run::resume(&imported.config, suffix, now())?,
        None => Run::new(&imported.config, now())?,
    };
    Ok(run)
}

fn init(output: &Path, settings: &Settings) -> Result<()> {
    if output.exists() {
        anyhow::bail!("{} already exists", output.display());
    }
    let config = Configuration {
        user_initials: settings.initials(None).unwrap_or_default(),
        ..Configuration::default()
    };
    let json = export_parameters(&config, None, now())?;
    fs::write(output, json)?;
    println!("{} Wrote {}", "✓".green(), output.display().to_string().cyan());
    println!(
        "  {} fill in src_table_name, business_key and scd2_columns, then run 'stagehand generate'",
        "→".dimmed()
    );
    Ok(())
}

fn generate(
    path: &Path,
    initials: Option<String>,
    out: Option<PathBuf>,
    settings: &Settings,
) -> Result<()> {
    let mut config = read_parameters(path)?.config;
    if let Some(initials) = initials {
        config.user_initials = initials;
    } else if config.user_initials.trim().is_empty() {
        config.user_initials = settings.initials(None).unwrap_or_default();
    }

    let run = Run::new(&config, now())?;
    write_artifacts(&run, &settings.output_dir(out))
}

fn deploy(path: &Path, out: Option<PathBuf>, settings: &Settings) -> Result<()> {
    let imported = read_parameters(path)?;
    if imported.table_suffix.is_none() {
        println!(
            "{}",
            "⚠ Export has no table suffix; starting a new run".yellow()
        );
    }
    if let Some(ref at) = imported.exported_at {
        println!("{} {}", "Exported:".dimmed(), at);
    }
    let run = run_for(&imported)?;
    write_artifacts(&run, &settings.output_dir(out))
}

fn write_artifacts(run: &Run, dir: &Path) -> Result<()> {
    println!(
        "{} {} {}",
        "Table:".dimmed(),
        run.src_table().white().bold(),
        format!("(suffix {})", run.table_suffix()).dimmed()
    );

    let issues = lint_config(run.config());
    let warnings = issues
        .iter()
        .filter(|i| i.level == LintLevel::Warning)
        .count();

    let artifacts = Artifacts::build(run)?;
    let written = artifacts
        .write_to(dir)
        .with_context(|| format!("Failed to write to {}", dir.display()))?;

    for step in Step::ALL {
        if artifacts.fragment(step).is_none() {
            println!(
                "  {} {} {}",
                "-".dimmed(),
                step.to_string().dimmed(),
                step.skipped_reason(run).dimmed()
            );
        }
    }
    for path in &written {
        println!("  {} {}", "✓".green(), path.display());
    }
    println!();
    println!(
        "{} {} file(s) written to {}",
        "✓".green().bold(),
        written.len(),
        dir.display().to_string().cyan()
    );
    if warnings > 0 {
        println!(
            "{} {} lint warning(s); run 'stagehand lint' for details",
            "⚠".yellow(),
            warnings
        );
    }
    Ok(())
}

fn show(path: &Path, step: Option<usize>, pipeline: Option<PipelineArg>) -> Result<()> {
    let run = run_for(&read_parameters(path)?)?;

    if let Some(mode) = pipeline {
        let pipeline = Pipeline::build(&run, mode.into());
        println!("{}", pipeline.to_json()?);
        return Ok(());
    }

    let n = step.unwrap_or_default();
    let step = Step::from_number(n)
        .ok_or_else(|| anyhow::anyhow!("No step {}; steps are numbered 1 to 9", n))?;
    println!("{}", format!("-- {}", step).green().bold());
    match step.generate(&run) {
        Some(sql) => print!("{}", sql),
        None => println!("{}", format!("-- {}", step.skipped_reason(&run)).yellow()),
    }
    Ok(())
}

fn lint(path: &Path, strict: bool) -> Result<()> {
    let config = read_parameters(path)?.config;
    println!("{} {}", "Linting:".dimmed(), path.display().to_string().white());
    println!();
    let errors = print_report(&lint_config(&config), strict);
    if errors > 0 {
        anyhow::bail!("{} error(s) found", errors);
    }
    Ok(())
}
