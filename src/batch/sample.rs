//! A single sequencing sample from the upload CSV.

use super::report::{ForwardRead, Instrument, ReverseRead, SingleRead, SubmissionSample};
use super::Row;
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// Location and checksum of the cleaned reads once they have been processed.
#[derive(Debug, Clone, PartialEq)]
pub enum ReadsBlock {
    Paired(ForwardRead, ReverseRead),
    Single(SingleRead),
}

/// One row of the upload CSV, identified by a random UUID so that nothing
/// derived from the sample (file names, URIs) carries the operator's own name.
#[derive(Debug, Clone)]
pub struct Sample {
    id: Uuid,
    row: Row,
    fq1: Option<PathBuf>,
    fq2: Option<PathBuf>,
    reads: Option<ReadsBlock>,
}

impl Sample {
    pub fn new(row: Row, fq1: Option<PathBuf>, fq2: Option<PathBuf>) -> Self {
        Sample {
            id: Uuid::new_v4(),
            row,
            fq1,
            fq2,
            reads: None,
        }
    }

    /// Generated identifier, used as the sample name in every output.
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Name declared in the CSV. Only used to point operators at bad rows.
    pub fn declared_name(&self) -> &str {
        self.field("name")
    }

    pub fn organisation(&self) -> &str {
        self.field("organisation")
    }

    pub fn row(&self) -> &Row {
        &self.row
    }

    pub fn fq1(&self) -> Option<&Path> {
        self.fq1.as_deref()
    }

    pub fn fq2(&self) -> Option<&Path> {
        self.fq2.as_deref()
    }

    pub fn is_paired(&self) -> bool {
        self.fq2.is_some()
    }

    pub fn reads(&self) -> Option<&ReadsBlock> {
        self.reads.as_ref()
    }

    /// File names (without directories) of the referenced read files.
    pub fn files(&self) -> Vec<String> {
        [self.fq1.as_ref(), self.fq2.as_ref()]
            .into_iter()
            .flatten()
            .map(|p| {
                p.file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_default()
            })
            .collect()
    }

    /// Records the cleaned paired reads. Replaces any earlier result.
    pub fn attach_paired_result(
        &mut self,
        fq1: impl AsRef<Path>,
        fq1_checksum: &str,
        fq2: impl AsRef<Path>,
        fq2_checksum: &str,
        batch_name: &str,
    ) {
        self.reads = Some(ReadsBlock::Paired(
            ForwardRead {
                r1_uri: batch_uri(batch_name, fq1.as_ref()),
                r1_md5: fq1_checksum.to_string(),
            },
            ReverseRead {
                r2_uri: batch_uri(batch_name, fq2.as_ref()),
                r2_md5: fq2_checksum.to_string(),
            },
        ));
    }

    /// Records the cleaned single-end reads. Replaces any earlier result.
    pub fn attach_single_result(&mut self, fq: impl AsRef<Path>, checksum: &str, batch_name: &str) {
        self.reads = Some(ReadsBlock::Single(SingleRead {
            uri: batch_uri(batch_name, fq.as_ref()),
            md5: checksum.to_string(),
        }));
    }

    /// Projection of the sample into the submission document.
    pub fn to_submission(&self) -> SubmissionSample {
        let (pe_reads, se_reads) = match &self.reads {
            Some(ReadsBlock::Paired(r1, r2)) => (Some((r1.clone(), r2.clone())), None),
            Some(ReadsBlock::Single(read)) => (None, Some(vec![read.clone()])),
            None => (None, None),
        };

        SubmissionSample {
            name: self.id.to_string(),
            tags: self.field("tags").split(':').map(str::to_string).collect(),
            specimen_organism: self.field("specimenOrganism").to_string(),
            host: self.field("host").to_string(),
            collection_date: self.field("collectionDate").to_string(),
            country: self.field("country").to_string(),
            submission_title: self.field("submissionTitle").to_string(),
            submission_description: self.field("submissionDescription").to_string(),
            status: "Uploaded".to_string(),
            instrument: Instrument {
                platform: self.field("instrument_platform").to_string(),
                model: self.field("instrument_model").to_string(),
                flowcell: self.field("flowcell").to_string(),
            },
            pe_reads,
            se_reads,
        }
    }

    fn field(&self, key: &str) -> &str {
        super::field(&self.row, key)
    }
}

fn batch_uri(batch_name: &str, file: &Path) -> String {
    Path::new(batch_name).join(file).to_string_lossy().into_owned()
}
