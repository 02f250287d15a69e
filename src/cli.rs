//! Command-line interface: tool check, validation and submission.

use crate::batch::Batch;
use crate::config::ToolConfig;
use crate::convert::Converter;
use crate::pipeline::prepare_batch;
use crate::tools::{check_tools, HealthReport};
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use log::{error, info};
use serde::Serialize;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(author, version, about = "Validate and prepare sequencing batches for upload", long_about = None)]
pub struct Cli {
    /// JSON file with tool locations
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Path to samtools
    #[arg(long)]
    pub samtools: Option<PathBuf>,

    /// Path to the read removal tool
    #[arg(long)]
    pub decontaminator: Option<PathBuf>,

    /// Reference genome used for read removal
    #[arg(long)]
    pub reference: Option<PathBuf>,

    /// Subcommand
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Check that the external tools are installed
    Check,

    /// Validate an upload CSV and print the validation report
    Validate {
        /// Upload CSV describing the samples
        upload_csv: PathBuf,
    },

    /// Validate, decontaminate and print the submission document
    Submission {
        /// Upload CSV describing the samples
        upload_csv: PathBuf,

        /// Directory for the cleaned read files
        #[arg(short, long)]
        outdir: Option<PathBuf>,

        /// Maximum number of concurrent decontamination processes
        #[arg(short, long, default_value_t = 4)]
        threads: usize,
    },
}

impl Cli {
    /// Tool configuration from the config file, with command-line overrides applied.
    pub fn tool_config(&self) -> Result<ToolConfig> {
        let mut config = match &self.config {
            Some(path) => ToolConfig::from_file(path)
                .with_context(|| format!("loading config {}", path.display()))?,
            None => ToolConfig::default(),
        };
        if let Some(samtools) = &self.samtools {
            config.samtools = samtools.clone();
        }
        if let Some(decontaminator) = &self.decontaminator {
            config.decontaminator = decontaminator.clone();
        }
        if let Some(reference) = &self.reference {
            config.reference = reference.clone();
        }
        Ok(config)
    }
}

/// Runs the selected command. Returns `false` when the command completed but
/// the outcome should be reported as a failure exit code.
pub fn run_cli(cli: Cli) -> Result<bool> {
    let config = cli.tool_config()?;

    let health = check_tools(&config);

    match cli.command {
        Commands::Check => {
            print_json(&health)?;
            Ok(health.all_ok())
        }
        Commands::Validate { upload_csv } => {
            let converter = ready_converter(&config, &health)?;
            let batch = Batch::from_path(&upload_csv, &converter)
                .with_context(|| format!("processing {}", upload_csv.display()))?;
            print_json(&batch.validate())?;
            Ok(batch.is_valid())
        }
        Commands::Submission {
            upload_csv,
            outdir,
            threads,
        } => {
            let converter = ready_converter(&config, &health)?;
            let mut batch = Batch::from_path(&upload_csv, &converter)
                .with_context(|| format!("processing {}", upload_csv.display()))?;
            if !batch.is_valid() {
                error!("{} is not valid; no submission built", upload_csv.display());
                print_json(&batch.validate())?;
                return Ok(false);
            }

            let outdir = outdir.unwrap_or_else(std::env::temp_dir);
            let report = prepare_batch(&mut batch, &config, &outdir, threads)?;
            if !report.all_cleaned() {
                error!(
                    "{} sample(s) could not be decontaminated",
                    report.failed.len()
                );
                print_json(&report)?;
                return Ok(false);
            }

            info!("Submission ready for batch {}", batch.name());
            print_json(&batch.make_submission())?;
            Ok(true)
        }
    }
}

/// Aborts before any row is read if a tool is missing.
fn ready_converter(config: &ToolConfig, health: &HealthReport) -> Result<Converter> {
    health.require().context("external tool check failed")?;
    Ok(Converter::new(config.samtools_path()?))
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
