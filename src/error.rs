//! Error types for the uploader.
//!
//! Only fatal conditions live here. Problems with an individual row of the
//! upload CSV are collected as [`crate::batch::ErrorRecord`]s instead and
//! never abort the run.

use std::io;
use std::path::PathBuf;
use std::process::ExitStatus;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum UploaderError {
    #[error("IO error: {0}")]
    IoError(#[from] io::Error),

    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Invalid configuration: {0}")]
    ConfigError(String),

    #[error("Required tool '{tool}' is unavailable: {reason}")]
    ToolUnavailable { tool: String, reason: String },

    #[error("Conversion of {} failed at stage '{stage}' ({status}): {stderr}", .input.display())]
    ConversionFailed {
        input: PathBuf,
        stage: &'static str,
        status: ExitStatus,
        stderr: String,
    },

    #[error("Missing input file: {}", .0.display())]
    MissingInput(PathBuf),

    #[error("Batch is not valid: {0} error(s)")]
    InvalidBatch(usize),

    #[error("Parallel execution error: {0}")]
    ThreadError(String),
}

pub type Result<T> = std::result::Result<T, UploaderError>;
