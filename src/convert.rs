//! Conversion of BAM alignment files into gzipped FASTQ read files.
//!
//! Conversion runs synchronously while a row is parsed, so the read files are
//! complete before anyone checks that they exist. Any failing invocation is
//! fatal for the whole batch.

use crate::error::{Result, UploaderError};
use log::{debug, error, info};
use std::io::{self, BufReader, Read};
use std::path::{Path, PathBuf};
use std::process::{Command, Output, Stdio};
use std::thread;

/// Read files written by a conversion, named relative to the working directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConvertedReads {
    Paired { fastq1: String, fastq2: String },
    Single { fastq: String },
}

/// Drives `samtools` to turn a BAM into one or two FASTQ files.
#[derive(Debug, Clone)]
pub struct Converter {
    samtools: PathBuf,
}

impl Converter {
    pub fn new(samtools: impl Into<PathBuf>) -> Self {
        Converter {
            samtools: samtools.into(),
        }
    }

    /// Name-sorts the BAM and splits it into `<stem>_1.fastq.gz` and `<stem>_2.fastq.gz`.
    ///
    /// `sort -n` streams straight into `fastq -1 -2` through a pipe. The sort's
    /// stderr is drained on its own thread so it can never stall the pipe, and
    /// the sort is reaped after the split has finished.
    pub fn to_paired(&self, bam: &str, wd: &Path) -> Result<ConvertedReads> {
        let stem = alignment_stem(bam);
        let fastq1 = format!("{}_1.fastq.gz", stem);
        let fastq2 = format!("{}_2.fastq.gz", stem);
        let input = wd.join(bam);

        info!("Converting {} into paired FASTQ", input.display());
        debug!("{} sort -n {}", self.samtools.display(), input.display());
        let mut sort = Command::new(&self.samtools)
            .arg("sort")
            .arg("-n")
            .arg(&input)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()?;

        let sorted = sort.stdout.take().ok_or_else(|| {
            UploaderError::IoError(io::Error::other("sort stage has no stdout"))
        })?;
        let sort_stderr = sort.stderr.take().ok_or_else(|| {
            UploaderError::IoError(io::Error::other("sort stage has no stderr"))
        })?;
        let stderr_reader = thread::spawn(move || -> io::Result<Vec<u8>> {
            let mut buf = Vec::new();
            BufReader::new(sort_stderr).read_to_end(&mut buf)?;
            Ok(buf)
        });

        debug!(
            "{} fastq -N -1 {} -2 {}",
            self.samtools.display(),
            fastq1,
            fastq2
        );
        let split = Command::new(&self.samtools)
            .arg("fastq")
            .arg("-N")
            .arg("-1")
            .arg(wd.join(&fastq1))
            .arg("-2")
            .arg(wd.join(&fastq2))
            .stdin(Stdio::from(sorted))
            .output();

        // Reap the upstream stage even if the split could not be launched.
        let sort_status = sort.wait()?;
        let sort_stderr = stderr_reader
            .join()
            .map_err(|_| UploaderError::ThreadError("sort stderr reader panicked".to_string()))??;
        let sort_output = Output {
            status: sort_status,
            stdout: Vec::new(),
            stderr: sort_stderr,
        };
        let split_output = split?;

        check_stage(&input, "fastq", &split_output)?;
        check_stage(&input, "sort", &sort_output)?;

        Ok(ConvertedReads::Paired { fastq1, fastq2 })
    }

    /// Writes all reads of the BAM into `<stem>.fastq.gz`.
    pub fn to_single(&self, bam: &str, wd: &Path) -> Result<ConvertedReads> {
        let stem = alignment_stem(bam);
        let fastq = format!("{}.fastq.gz", stem);
        let input = wd.join(bam);

        info!("Converting {} into single-end FASTQ", input.display());
        debug!(
            "{} fastq -o {} {}",
            self.samtools.display(),
            fastq,
            input.display()
        );
        let output = Command::new(&self.samtools)
            .arg("fastq")
            .arg("-o")
            .arg(wd.join(&fastq))
            .arg(&input)
            .stdin(Stdio::null())
            .output()?;

        check_stage(&input, "fastq", &output)?;
        Ok(ConvertedReads::Single { fastq })
    }
}

/// Everything before the first `.bam` in the file name.
pub fn alignment_stem(bam: &str) -> &str {
    bam.split(".bam").next().unwrap_or(bam)
}

fn check_stage(input: &Path, stage: &'static str, output: &Output) -> Result<()> {
    if output.status.success() {
        return Ok(());
    }
    let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
    error!(
        "samtools {} failed on {} ({}): {}",
        stage,
        input.display(),
        output.status,
        stderr
    );
    Err(UploaderError::ConversionFailed {
        input: input.to_path_buf(),
        stage,
        status: output.status,
        stderr,
    })
}
