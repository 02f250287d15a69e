//! Documents produced from a batch: the validation report shown to the
//! operator and the submission document sent upstream.

use serde::Serialize;

/// A problem found while reading the upload CSV.
///
/// `sample` is the name declared in the offending row, or `None` when the
/// problem concerns the whole file (e.g. a missing column).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorRecord {
    pub sample: Option<String>,
    pub error: String,
}

impl ErrorRecord {
    pub fn for_sample(sample: &str, error: &str) -> Self {
        ErrorRecord {
            sample: Some(sample.to_string()),
            error: error.to_string(),
        }
    }

    pub fn for_batch(error: impl Into<String>) -> Self {
        ErrorRecord {
            sample: None,
            error: error.into(),
        }
    }

    pub fn is_batch_scope(&self) -> bool {
        self.sample.is_none()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ValidationStatus {
    Completed,
    Failure,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidatedSample {
    pub sample: String,
    pub files: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum ValidationEntries {
    Samples(Vec<ValidatedSample>),
    Errors(Vec<ErrorRecord>),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Validation {
    pub status: ValidationStatus,
    pub samples: ValidationEntries,
}

/// `{"validation": {"status": ..., "samples": [...]}}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationReport {
    pub validation: Validation,
}

impl ValidationReport {
    pub fn completed(samples: Vec<ValidatedSample>) -> Self {
        ValidationReport {
            validation: Validation {
                status: ValidationStatus::Completed,
                samples: ValidationEntries::Samples(samples),
            },
        }
    }

    pub fn failure(errors: Vec<ErrorRecord>) -> Self {
        ValidationReport {
            validation: Validation {
                status: ValidationStatus::Failure,
                samples: ValidationEntries::Errors(errors),
            },
        }
    }

    pub fn is_completed(&self) -> bool {
        self.validation.status == ValidationStatus::Completed
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Instrument {
    pub platform: String,
    pub model: String,
    pub flowcell: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ForwardRead {
    pub r1_uri: String,
    pub r1_md5: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReverseRead {
    pub r2_uri: String,
    pub r2_md5: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SingleRead {
    pub uri: String,
    pub md5: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionSample {
    pub name: String,
    pub tags: Vec<String>,
    pub specimen_organism: String,
    pub host: String,
    pub collection_date: String,
    pub country: String,
    pub submission_title: String,
    pub submission_description: String,
    pub status: String,
    pub instrument: Instrument,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pe_reads: Option<(ForwardRead, ReverseRead)>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub se_reads: Option<Vec<SingleRead>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionBatch {
    pub file_name: String,
    pub organisation: Option<String>,
    pub uploaded_on: String,
    pub samples: Vec<SubmissionSample>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SubmissionBody {
    pub batch: SubmissionBatch,
}

/// `{"submission": {"batch": {...}}}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Submission {
    pub submission: SubmissionBody,
}
