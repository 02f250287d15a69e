//! Validation of a single row of the upload CSV.

use super::report::ErrorRecord;
use super::sample::Sample;
use super::{field, Row};
use crate::convert::{alignment_stem, ConvertedReads, Converter};
use crate::error::Result;
use chrono::NaiveDate;
use log::debug;
use std::path::{Path, PathBuf};

pub const BAD_DATE: &str = "collectionDate not in ISO format";
pub const NO_TAGS: &str = "must have at least one tag";
pub const BAD_INSTRUMENT: &str = "bad-instrument";
pub const FILE_MISSING: &str = "file-missing";

/// How the reads of a sample were sequenced, taken from `instrument_platform`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Platform {
    /// Paired-end short reads
    Illumina,
    /// Single-end long reads
    Nanopore,
}

impl Platform {
    pub fn from_instrument(instrument: &str) -> Option<Self> {
        if instrument.contains("Illumina") {
            Some(Platform::Illumina)
        } else if instrument.contains("Nanopore") {
            Some(Platform::Nanopore)
        } else {
            None
        }
    }
}

/// Turns rows into samples, converting BAMs first when the CSV lists them.
pub struct RowParser<'a> {
    converter: &'a Converter,
    wd: &'a Path,
    using_bams: bool,
}

impl<'a> RowParser<'a> {
    pub fn new(converter: &'a Converter, wd: &'a Path, using_bams: bool) -> Self {
        RowParser {
            converter,
            wd,
            using_bams,
        }
    }

    /// Parses one row. Always yields a sample, together with every problem found.
    ///
    /// Only a failed conversion is returned as an error, and it is fatal.
    pub fn parse(&self, mut row: Row) -> Result<(Sample, Vec<ErrorRecord>)> {
        let name = field(&row, "name").to_string();
        let mut errors = Vec::new();

        if field(&row, "collectionDate").parse::<NaiveDate>().is_err() {
            errors.push(ErrorRecord::for_sample(&name, BAD_DATE));
        }

        if field(&row, "tags").is_empty() {
            errors.push(ErrorRecord::for_sample(&name, NO_TAGS));
        }

        let platform = match Platform::from_instrument(field(&row, "instrument_platform")) {
            Some(platform) => platform,
            None => {
                errors.push(ErrorRecord::for_sample(&name, BAD_INSTRUMENT));
                return Ok((Sample::new(row, None, None), errors));
            }
        };

        if self.using_bams {
            self.convert(&mut row, platform)?;
        }

        let sample = match platform {
            Platform::Illumina => {
                let fq1 = self.resolve(&row, "fastq1");
                let fq2 = self.resolve(&row, "fastq2");
                if !fq1.is_file() || !fq2.is_file() {
                    errors.push(ErrorRecord::for_sample(&name, FILE_MISSING));
                }
                Sample::new(row, Some(fq1), Some(fq2))
            }
            Platform::Nanopore => {
                let fq = self.resolve(&row, "fastq");
                if !fq.is_file() {
                    errors.push(ErrorRecord::for_sample(&name, FILE_MISSING));
                }
                Sample::new(row, Some(fq), None)
            }
        };

        debug!("Row '{}' parsed with {} error(s)", name, errors.len());
        Ok((sample, errors))
    }

    /// Converts the row's BAM and points the FASTQ columns at the results.
    /// A BAM that does not exist is left for the file check to report.
    fn convert(&self, row: &mut Row, platform: Platform) -> Result<()> {
        let bam = field(row, "bam").to_string();
        let stem = alignment_stem(&bam);
        let converted = if !bam.is_empty() && self.wd.join(&bam).is_file() {
            match platform {
                Platform::Illumina => self.converter.to_paired(&bam, self.wd)?,
                Platform::Nanopore => self.converter.to_single(&bam, self.wd)?,
            }
        } else {
            debug!("BAM '{}' not found in {}", bam, self.wd.display());
            match platform {
                Platform::Illumina => ConvertedReads::Paired {
                    fastq1: format!("{}_1.fastq.gz", stem),
                    fastq2: format!("{}_2.fastq.gz", stem),
                },
                Platform::Nanopore => ConvertedReads::Single {
                    fastq: format!("{}.fastq.gz", stem),
                },
            }
        };

        match converted {
            ConvertedReads::Paired { fastq1, fastq2 } => {
                row.insert("fastq1".to_string(), fastq1);
                row.insert("fastq2".to_string(), fastq2);
            }
            ConvertedReads::Single { fastq } => {
                row.insert("fastq".to_string(), fastq);
            }
        }
        Ok(())
    }

    fn resolve(&self, row: &Row, column: &str) -> PathBuf {
        self.wd.join(field(row, column))
    }
}
