//! Preparing a validated batch for upload.
//!
//! Every valid sample is decontaminated on a bounded worker pool, the cleaned
//! files are hashed and the results are attached to the samples so that
//! [`Batch::make_submission`] describes the cleaned reads.

use crate::batch::{Batch, Sample};
use crate::checksum::file_md5;
use crate::config::ToolConfig;
use crate::decontam::{CleanReads, DecontaminationResult, Decontaminator};
use crate::error::{Result, UploaderError};
use log::{error, info};
use rayon::prelude::*;
use serde::Serialize;
use std::fs;
use std::path::Path;

/// A sample whose reads could not be cleaned.
#[derive(Debug, Clone, Serialize)]
pub struct SampleFailure {
    pub sample: String,
    pub name: String,
    pub reason: String,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct PreparationReport {
    /// Generated identifiers of the samples with attached results
    pub cleaned: Vec<String>,
    pub failed: Vec<SampleFailure>,
}

impl PreparationReport {
    pub fn all_cleaned(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Decontaminates and checksums every sample of a valid batch.
///
/// At most `threads` decontamination processes run at once. Samples that fail,
/// including those whose cleaned files cannot be hashed, are listed in the
/// report and left without results; the others carry on.
pub fn prepare_batch(
    batch: &mut Batch,
    config: &ToolConfig,
    outdir: &Path,
    threads: usize,
) -> Result<PreparationReport> {
    if !batch.is_valid() {
        return Err(UploaderError::InvalidBatch(batch.errors().len()));
    }

    let tool = Decontaminator::from_config(config)?;
    fs::create_dir_all(outdir)?;

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(threads.max(1))
        .build()
        .map_err(|e| UploaderError::ThreadError(format!("Failed to build thread pool: {}", e)))?;

    info!(
        "Decontaminating {} sample(s) with up to {} process(es)",
        batch.samples().len(),
        threads.max(1)
    );
    let outcomes: Vec<DecontaminationResult> = pool.install(|| {
        batch
            .samples()
            .par_iter()
            .map(|sample| decontaminate(&tool, sample, outdir))
            .collect()
    });

    let batch_name = batch.name().to_string();
    let mut report = PreparationReport::default();
    for (sample, outcome) in batch.samples_mut().iter_mut().zip(outcomes) {
        match outcome.outputs {
            Some(reads) => match attach(sample, &reads, &batch_name) {
                Ok(()) => report.cleaned.push(sample.id().to_string()),
                Err(e) => {
                    error!(
                        "Cleaned reads of sample {} ({}) could not be hashed: {}",
                        sample.id(),
                        sample.declared_name(),
                        e
                    );
                    report.failed.push(sample_failure(sample, e.to_string()));
                }
            },
            None => {
                error!(
                    "Sample {} ({}) was not cleaned",
                    sample.id(),
                    sample.declared_name()
                );
                let reason = outcome.diagnostics.trim().to_string();
                report.failed.push(sample_failure(sample, reason));
            }
        }
    }

    info!(
        "{} sample(s) cleaned, {} failed",
        report.cleaned.len(),
        report.failed.len()
    );
    Ok(report)
}

/// Runs one sample to completion. Launch problems count as a failed run.
fn decontaminate(tool: &Decontaminator, sample: &Sample, outdir: &Path) -> DecontaminationResult {
    let id = sample.id().to_string();
    let fq1 = match sample.fq1() {
        Some(fq1) => fq1,
        None => return failed(id, "sample has no read files".to_string()),
    };

    // Sample paths are already resolved against the CSV directory.
    match tool.launch(fq1, sample.fq2(), &id, Path::new(""), outdir) {
        Ok(unit) => unit.result(),
        Err(e) => {
            error!("Could not start decontamination for {}: {}", id, e);
            failed(id, e.to_string())
        }
    }
}

fn failed(sample: String, diagnostics: String) -> DecontaminationResult {
    DecontaminationResult {
        sample,
        status: None,
        outputs: None,
        diagnostics,
    }
}

fn sample_failure(sample: &Sample, reason: String) -> SampleFailure {
    SampleFailure {
        sample: sample.id().to_string(),
        name: sample.declared_name().to_string(),
        reason,
    }
}

fn attach(sample: &mut Sample, reads: &CleanReads, batch_name: &str) -> Result<()> {
    match reads {
        CleanReads::Paired(fq1, fq2) => {
            let md5_1 = file_md5(fq1)?;
            let md5_2 = file_md5(fq2)?;
            sample.attach_paired_result(file_name(fq1), &md5_1, file_name(fq2), &md5_2, batch_name);
        }
        CleanReads::Single(fq) => {
            let md5 = file_md5(fq)?;
            sample.attach_single_result(file_name(fq), &md5, batch_name);
        }
    }
    Ok(())
}

fn file_name(path: &Path) -> &Path {
    path.file_name().map(Path::new).unwrap_or(path)
}
