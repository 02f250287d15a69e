//! Reading and validating an upload CSV.
//!
//! A [`Batch`] is built from one upload CSV: every data row goes through the
//! [`RowParser`] in file order, valid samples are kept and row problems are
//! collected. The batch can then be rendered as a validation report or, once
//! valid, as a submission document.

pub mod report;
pub mod row;
pub mod sample;

pub use report::{ErrorRecord, Submission, SubmissionSample, ValidatedSample, ValidationReport};
pub use row::{Platform, RowParser};
pub use sample::{ReadsBlock, Sample};

use crate::checksum;
use crate::convert::Converter;
use crate::error::Result;
use chrono::{SecondsFormat, Utc};
use indexmap::IndexMap;
use log::{info, warn};
use report::{SubmissionBatch, SubmissionBody};
use std::collections::HashSet;
use std::path::{Path, PathBuf};

/// One CSV row, column name to value, in column order.
pub type Row = IndexMap<String, String>;

/// Columns every upload CSV must have.
pub const REQUIRED_COLUMNS: [&str; 12] = [
    "name",
    "organisation",
    "tags",
    "specimenOrganism",
    "host",
    "collectionDate",
    "country",
    "submissionTitle",
    "submissionDescription",
    "instrument_platform",
    "instrument_model",
    "flowcell",
];

/// Value of a column, or an empty string when the row lacks it.
pub fn field<'r>(row: &'r Row, key: &str) -> &'r str {
    row.get(key).map(String::as_str).unwrap_or("")
}

#[derive(Debug)]
pub struct Batch {
    samples: Vec<Sample>,
    errors: Vec<ErrorRecord>,
    parent: PathBuf,
    organisation: Option<String>,
    name: String,
}

impl Batch {
    /// Reads and validates an upload CSV.
    ///
    /// Relative file names in the CSV are resolved against the CSV's own
    /// directory. Row problems end up in [`Batch::errors`]; I/O, CSV and
    /// conversion failures abort with an error.
    pub fn from_path(path: impl AsRef<Path>, converter: &Converter) -> Result<Self> {
        let path = path.as_ref();
        info!("Reading upload file {}", path.display());

        let parent = path.parent().map(Path::to_path_buf).unwrap_or_default();
        let mut reader = csv::ReaderBuilder::new().flexible(true).from_path(path)?;
        let headers: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();

        let mut errors = check_header(&headers);
        let using_bams = headers.iter().any(|h| h == "bam");
        let parser = RowParser::new(converter, &parent, using_bams);

        let mut samples = Vec::new();
        let mut organisation = None;
        let mut rows = 0usize;

        for record in reader.records() {
            let record = record?;
            let row: Row = headers
                .iter()
                .cloned()
                .zip(record.iter().map(str::to_string))
                .collect();

            let (sample, row_errors) = parser.parse(row)?;
            rows += 1;

            // Last row wins; rows are not checked against each other.
            organisation = Some(sample.organisation().to_string());

            if row_errors.is_empty() {
                samples.push(sample);
            } else {
                for err in &row_errors {
                    warn!(
                        "Row {} ({}): {}",
                        rows,
                        err.sample.as_deref().unwrap_or("-"),
                        err.error
                    );
                }
                errors.extend(row_errors);
            }
        }

        if rows == 0 {
            errors.push(ErrorRecord::for_batch("no samples"));
        }

        let name = checksum::batch_name(path)?;
        info!(
            "Batch {}: {} row(s), {} valid sample(s), {} error(s)",
            name,
            rows,
            samples.len(),
            errors.len()
        );

        Ok(Batch {
            samples,
            errors,
            parent,
            organisation,
            name,
        })
    }

    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn samples(&self) -> &[Sample] {
        &self.samples
    }

    pub fn samples_mut(&mut self) -> &mut [Sample] {
        &mut self.samples
    }

    pub fn errors(&self) -> &[ErrorRecord] {
        &self.errors
    }

    /// Errors that do not belong to a particular row.
    pub fn batch_errors(&self) -> impl Iterator<Item = &ErrorRecord> {
        self.errors.iter().filter(|e| e.is_batch_scope())
    }

    /// Directory the CSV lives in.
    pub fn parent(&self) -> &Path {
        &self.parent
    }

    /// Organisation of the last row read.
    pub fn organisation(&self) -> Option<&str> {
        self.organisation.as_deref()
    }

    /// Batch identifier derived from the CSV content.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn validate(&self) -> ValidationReport {
        if self.is_valid() {
            ValidationReport::completed(
                self.samples
                    .iter()
                    .map(|s| ValidatedSample {
                        sample: s.id().to_string(),
                        files: s.files(),
                    })
                    .collect(),
            )
        } else {
            ValidationReport::failure(self.errors.clone())
        }
    }

    pub fn make_submission(&self) -> Submission {
        Submission {
            submission: SubmissionBody {
                batch: SubmissionBatch {
                    file_name: self.name.clone(),
                    organisation: self.organisation.clone(),
                    uploaded_on: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
                    samples: self.samples.iter().map(Sample::to_submission).collect(),
                },
            },
        }
    }
}

fn check_header(headers: &[String]) -> Vec<ErrorRecord> {
    let present: HashSet<&str> = headers.iter().map(String::as_str).collect();
    let mut errors: Vec<ErrorRecord> = REQUIRED_COLUMNS
        .iter()
        .filter(|col| !present.contains(*col))
        .map(|col| ErrorRecord::for_batch(format!("missing column: {}", col)))
        .collect();

    let has_reads = present.contains("bam")
        || present.contains("fastq")
        || (present.contains("fastq1") && present.contains("fastq2"));
    if !has_reads {
        errors.push(ErrorRecord::for_batch("no read file columns"));
    }
    errors
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::fs;
    use tempfile::tempdir;

    const HEADER: &str = "name,organisation,tags,specimenOrganism,host,collectionDate,country,submissionTitle,submissionDescription,instrument_platform,instrument_model,flowcell";

    fn nanopore_row(name: &str, org: &str, tags: &str, date: &str, fastq: &str) -> String {
        format!(
            "{},{},{},SARS-CoV-2,Homo sapiens,{},GBR,Run 1,Weekly,Oxford Nanopore,GridION,FLO-MIN106,{}",
            name, org, tags, date, fastq
        )
    }

    fn write_csv(dir: &Path, lines: &[String]) -> PathBuf {
        let path = dir.join("upload.csv");
        fs::write(&path, lines.join("\n") + "\n").unwrap();
        path
    }

    #[test]
    fn test_single_nanopore_row_validates() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("s1.fastq.gz"), "reads").unwrap();
        let path = write_csv(
            dir.path(),
            &[
                format!("{},fastq", HEADER),
                nanopore_row("S1", "Lab A", "t1", "2021-03-04", "s1.fastq.gz"),
            ],
        );

        let batch = Batch::from_path(&path, &Converter::new("samtools")).unwrap();
        assert!(batch.is_valid());
        let id = batch.samples()[0].id().to_string();
        assert_eq!(
            serde_json::to_value(batch.validate()).unwrap(),
            json!({"validation": {"status": "completed", "samples": [
                {"sample": id, "files": ["s1.fastq.gz"]}
            ]}})
        );
    }

    #[test]
    fn test_invalid_rows_are_excluded() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("s1.fastq.gz"), "reads").unwrap();
        fs::write(dir.path().join("s2.fastq.gz"), "reads").unwrap();
        let path = write_csv(
            dir.path(),
            &[
                format!("{},fastq", HEADER),
                nanopore_row("S1", "Lab A", "t1", "2021-03-04", "s1.fastq.gz"),
                nanopore_row("S2", "Lab A", "t1", "March 2021", "s2.fastq.gz"),
                nanopore_row("S3", "Lab A", "", "2021-03-04", "s3.fastq.gz"),
            ],
        );

        let batch = Batch::from_path(&path, &Converter::new("samtools")).unwrap();
        assert!(!batch.is_valid());
        assert_eq!(batch.samples().len(), 1);
        assert_eq!(batch.samples()[0].declared_name(), "S1");
        assert_eq!(
            batch.errors(),
            &[
                ErrorRecord::for_sample("S2", "collectionDate not in ISO format"),
                ErrorRecord::for_sample("S3", "must have at least one tag"),
                ErrorRecord::for_sample("S3", "file-missing"),
            ]
        );
        assert_eq!(batch.batch_errors().count(), 0);
        assert!(!batch.validate().is_completed());
    }

    #[test]
    fn test_batch_scope_errors() {
        let dir = tempdir().unwrap();
        let path = write_csv(
            dir.path(),
            &["name,organisation,tags".to_string(), "S1,Lab A,t1".to_string()],
        );

        let batch = Batch::from_path(&path, &Converter::new("samtools")).unwrap();
        assert!(!batch.is_valid());
        let scoped: Vec<&str> = batch.batch_errors().map(|e| e.error.as_str()).collect();
        assert_eq!(scoped.len(), 10);
        assert!(scoped.contains(&"missing column: flowcell"));
        assert!(scoped.contains(&"no read file columns"));
        // The row itself still gets checked.
        assert!(batch
            .errors()
            .iter()
            .any(|e| e.sample.as_deref() == Some("S1") && e.error == "bad-instrument"));
    }

    #[test]
    fn test_empty_upload() {
        let dir = tempdir().unwrap();
        let path = write_csv(dir.path(), &[format!("{},fastq", HEADER)]);

        let batch = Batch::from_path(&path, &Converter::new("samtools")).unwrap();
        assert!(!batch.is_valid());
        assert_eq!(batch.errors(), &[ErrorRecord::for_batch("no samples")]);
        assert!(batch.organisation().is_none());
    }

    #[test]
    fn test_organisation_comes_from_last_row() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("s1.fastq.gz"), "reads").unwrap();
        let path = write_csv(
            dir.path(),
            &[
                format!("{},fastq", HEADER),
                nanopore_row("S1", "Lab A", "t1", "2021-03-04", "s1.fastq.gz"),
                nanopore_row("S2", "Lab B", "t1", "bad-date", "s1.fastq.gz"),
            ],
        );

        let batch = Batch::from_path(&path, &Converter::new("samtools")).unwrap();
        assert_eq!(batch.organisation(), Some("Lab B"));
    }

    #[test]
    fn test_batches_do_not_share_state() {
        let dir = tempdir().unwrap();
        let bad = write_csv(dir.path(), &[format!("{},fastq", HEADER)]);
        let first = Batch::from_path(&bad, &Converter::new("samtools")).unwrap();
        assert!(!first.is_valid());

        let other = tempdir().unwrap();
        fs::write(other.path().join("s1.fastq.gz"), "reads").unwrap();
        let good = write_csv(
            other.path(),
            &[
                format!("{},fastq", HEADER),
                nanopore_row("S1", "Lab A", "t1", "2021-03-04", "s1.fastq.gz"),
            ],
        );
        let second = Batch::from_path(&good, &Converter::new("samtools")).unwrap();
        assert!(second.is_valid());
        assert_eq!(second.samples().len(), 1);
    }

    #[test]
    fn test_submission_keeps_row_order() {
        let dir = tempdir().unwrap();
        let mut lines = vec![format!("{},fastq", HEADER)];
        for i in 0..3 {
            let fastq = format!("s{}.fastq.gz", i);
            fs::write(dir.path().join(&fastq), "reads").unwrap();
            lines.push(nanopore_row(&format!("S{}", i), "Lab A", "a:b:c", "2021-03-04", &fastq));
        }
        let path = write_csv(dir.path(), &lines);

        let batch = Batch::from_path(&path, &Converter::new("samtools")).unwrap();
        let submission = batch.make_submission();
        let body = &submission.submission.batch;

        assert_eq!(body.file_name, batch.name());
        assert_eq!(body.organisation.as_deref(), Some("Lab A"));
        let ids: Vec<String> = batch.samples().iter().map(|s| s.id().to_string()).collect();
        let names: Vec<String> = body.samples.iter().map(|s| s.name.clone()).collect();
        assert_eq!(names, ids);
        assert!(body.samples.iter().all(|s| s.tags == vec!["a", "b", "c"]));

        // e.g. 2026-10-17T09:15:02.123Z
        assert_eq!(body.uploaded_on.len(), 24);
        assert!(body.uploaded_on.ends_with('Z'));
        assert_eq!(&body.uploaded_on[19..20], ".");
    }

    #[test]
    fn test_missing_upload_file() {
        let result = Batch::from_path("/nonexistent/upload.csv", &Converter::new("samtools"));
        assert!(result.is_err());
    }
}
