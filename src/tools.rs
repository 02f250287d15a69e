//! Health check for the external binaries.
//!
//! Nothing here runs implicitly: callers invoke [`check_tools`] before
//! processing a batch and decide what to do with the report.

use crate::config::{resolve_binary, ToolConfig};
use crate::error::{Result, UploaderError};
use log::{debug, info, warn};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

/// Outcome of probing one tool.
#[derive(Debug, Clone, Serialize)]
pub struct ToolStatus {
    pub name: String,
    pub path: Option<PathBuf>,
    pub version: Option<String>,
    pub error: Option<String>,
}

impl ToolStatus {
    pub fn ok(&self) -> bool {
        self.error.is_none()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct HealthReport {
    pub tools: Vec<ToolStatus>,
}

impl HealthReport {
    pub fn all_ok(&self) -> bool {
        self.tools.iter().all(ToolStatus::ok)
    }

    /// Turns the first failed probe into a fatal error.
    pub fn require(&self) -> Result<()> {
        match self.tools.iter().find(|t| !t.ok()) {
            Some(failed) => Err(UploaderError::ToolUnavailable {
                tool: failed.name.clone(),
                reason: failed.error.clone().unwrap_or_default(),
            }),
            None => Ok(()),
        }
    }
}

/// Probes the conversion tool, the decontamination tool and the reference genome.
pub fn check_tools(config: &ToolConfig) -> HealthReport {
    let tools = vec![
        probe_binary("samtools", &config.samtools),
        probe_binary("decontaminator", &config.decontaminator),
        probe_reference(&config.reference),
    ];

    let report = HealthReport { tools };
    if report.all_ok() {
        info!("All external tools available.");
    }
    report
}

fn probe_binary(name: &str, binary: &Path) -> ToolStatus {
    let mut status = ToolStatus {
        name: name.to_string(),
        path: None,
        version: None,
        error: None,
    };

    let path = match resolve_binary(binary) {
        Ok(path) => path,
        Err(e) => {
            warn!("{} not found: {}", name, e);
            status.error = Some(e.to_string());
            return status;
        }
    };
    status.path = Some(path.clone());

    debug!("Probing {} at {}", name, path.display());
    match Command::new(&path)
        .arg("--version")
        .stdin(Stdio::null())
        .output()
    {
        Ok(output) if output.status.success() => {
            let text = if output.stdout.is_empty() {
                String::from_utf8_lossy(&output.stderr).into_owned()
            } else {
                String::from_utf8_lossy(&output.stdout).into_owned()
            };
            status.version = text
                .lines()
                .map(str::trim)
                .find(|l| !l.is_empty())
                .map(str::to_string);
        }
        Ok(output) => {
            warn!("{} --version exited with {}", name, output.status);
            status.error = Some(format!("version check exited with {}", output.status));
        }
        Err(e) => {
            warn!("Failed to execute {}: {}", path.display(), e);
            status.error = Some(format!("failed to execute: {}", e));
        }
    }
    status
}

fn probe_reference(reference: &Path) -> ToolStatus {
    let error = if reference.is_file() {
        None
    } else {
        warn!("Reference genome {} not found", reference.display());
        Some(format!("reference genome {} not found", reference.display()))
    };
    ToolStatus {
        name: "reference".to_string(),
        path: Some(reference.to_path_buf()),
        version: None,
        error,
    }
}
