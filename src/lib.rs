//! Validation and preparation of sequencing batches for upload.
//!
//! An upload CSV is read into a [`batch::Batch`]: each row is checked, BAM
//! files are converted to FASTQ with samtools, and the valid samples are kept.
//! The batch yields a validation report for the operator and, after host read
//! removal ([`decontam`]), a submission document describing the cleaned reads.

pub mod batch;
pub mod checksum;
pub mod cli;
pub mod config;
pub mod convert;
pub mod decontam;
pub mod error;
pub mod pipeline;
pub mod tools;

#[cfg(test)]
mod testutil;

pub use batch::{Batch, ErrorRecord, Sample};
pub use error::{Result, UploaderError};
