//! Removal of host reads with an external tool.
//!
//! Launching and collecting are separate steps: [`Decontaminator::launch`]
//! starts the process and returns straight away, [`Decontamination::result`]
//! blocks until it has finished. A failed run only affects its own sample.

use crate::config::ToolConfig;
use crate::error::{Result, UploaderError};
use log::{debug, info, warn};
use std::path::{Path, PathBuf};
use std::process::{Child, Command, ExitStatus, Stdio};

/// Cleaned read files written by a successful run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CleanReads {
    Paired(PathBuf, PathBuf),
    Single(PathBuf),
}

impl CleanReads {
    pub fn paths(&self) -> Vec<&Path> {
        match self {
            CleanReads::Paired(fq1, fq2) => vec![fq1.as_path(), fq2.as_path()],
            CleanReads::Single(fq) => vec![fq.as_path()],
        }
    }
}

/// The read removal tool and the reference it filters against.
#[derive(Debug, Clone)]
pub struct Decontaminator {
    binary: PathBuf,
    reference: PathBuf,
}

impl Decontaminator {
    pub fn new(binary: impl Into<PathBuf>, reference: impl Into<PathBuf>) -> Self {
        Decontaminator {
            binary: binary.into(),
            reference: reference.into(),
        }
    }

    pub fn from_config(config: &ToolConfig) -> Result<Self> {
        Ok(Decontaminator::new(
            config.decontaminator_path()?,
            config.reference.clone(),
        ))
    }

    /// Starts decontaminating one sample without waiting for it.
    ///
    /// Relative inputs are resolved against `root`. Outputs are written as
    /// `<outdir>/<sample>.reads_1.fastq.gz` (and `reads_2` when paired). Fails
    /// without starting anything if an input file is missing.
    pub fn launch(
        &self,
        fq1: &Path,
        fq2: Option<&Path>,
        sample: &str,
        root: &Path,
        outdir: &Path,
    ) -> Result<Decontamination> {
        let reads1 = existing_input(root, fq1)?;
        let reads2 = fq2.map(|fq| existing_input(root, fq)).transpose()?;
        let prefix = outdir.join(sample);

        let mut command = Command::new(&self.binary);
        command
            .arg("--ref_fasta")
            .arg(&self.reference)
            .arg("--reads1")
            .arg(&reads1);
        if let Some(reads2) = &reads2 {
            command.arg("--reads2").arg(reads2);
        }
        command
            .arg("--outprefix")
            .arg(&prefix)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        debug!("Launching {:?}", command);
        let child = command.spawn()?;
        info!("Decontaminating {} (pid {})", sample, child.id());

        let expected = match reads2 {
            Some(_) => CleanReads::Paired(
                output_path(&prefix, 1),
                output_path(&prefix, 2),
            ),
            None => CleanReads::Single(output_path(&prefix, 1)),
        };

        Ok(Decontamination {
            sample: sample.to_string(),
            child,
            expected,
        })
    }
}

/// A running decontamination process.
#[derive(Debug)]
pub struct Decontamination {
    sample: String,
    child: Child,
    expected: CleanReads,
}

impl Decontamination {
    pub fn sample(&self) -> &str {
        &self.sample
    }

    /// Waits for the process and reports what it produced.
    pub fn result(self) -> DecontaminationResult {
        let sample = self.sample;
        match self.child.wait_with_output() {
            Ok(output) => {
                let diagnostics = String::from_utf8_lossy(&output.stderr).into_owned();
                let outputs = if output.status.success() {
                    Some(self.expected)
                } else {
                    warn!(
                        "Decontamination of {} exited with {}: {}",
                        sample,
                        output.status,
                        diagnostics.trim()
                    );
                    None
                };
                DecontaminationResult {
                    sample,
                    status: Some(output.status),
                    outputs,
                    diagnostics,
                }
            }
            Err(e) => {
                warn!("Lost decontamination process for {}: {}", sample, e);
                DecontaminationResult {
                    sample,
                    status: None,
                    outputs: None,
                    diagnostics: e.to_string(),
                }
            }
        }
    }
}

/// A finished decontamination. `outputs` is `None` when the tool failed.
#[derive(Debug, Clone)]
pub struct DecontaminationResult {
    pub sample: String,
    pub status: Option<ExitStatus>,
    pub outputs: Option<CleanReads>,
    pub diagnostics: String,
}

impl DecontaminationResult {
    pub fn succeeded(&self) -> bool {
        self.outputs.is_some()
    }
}

fn existing_input(root: &Path, fq: &Path) -> Result<PathBuf> {
    let path = root.join(fq);
    if path.is_file() {
        Ok(path)
    } else {
        warn!("Missing decontamination input {}", path.display());
        Err(UploaderError::MissingInput(path))
    }
}

fn output_path(prefix: &Path, mate: u8) -> PathBuf {
    let mut name = prefix.as_os_str().to_os_string();
    name.push(format!(".reads_{}.fastq.gz", mate));
    PathBuf::from(name)
}
