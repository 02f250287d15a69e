//! External tool configuration.

use crate::error::{Result, UploaderError};
use serde::{Deserialize, Serialize};
use std::env;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

/// Locations of the external binaries and the reference genome.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ToolConfig {
    /// Alignment-to-reads conversion tool
    pub samtools: PathBuf,
    /// Host read removal tool
    pub decontaminator: PathBuf,
    /// Reference genome used for decontamination
    pub reference: PathBuf,
}

impl Default for ToolConfig {
    fn default() -> Self {
        ToolConfig {
            samtools: PathBuf::from("samtools"),
            decontaminator: PathBuf::from("readItAndKeep"),
            reference: PathBuf::from("MN908947.fasta"),
        }
    }
}

impl ToolConfig {
    /// Loads a configuration from a JSON file. Missing keys fall back to the defaults.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| {
            UploaderError::ConfigError(format!("cannot open {}: {}", path.display(), e))
        })?;
        let config = serde_json::from_reader(BufReader::new(file))?;
        Ok(config)
    }

    /// Resolved location of the conversion tool.
    pub fn samtools_path(&self) -> Result<PathBuf> {
        resolve_binary(&self.samtools)
    }

    /// Resolved location of the decontamination tool.
    pub fn decontaminator_path(&self) -> Result<PathBuf> {
        resolve_binary(&self.decontaminator)
    }
}

/// Finds an executable. A path that already exists (e.g. `./samtools`) wins,
/// then bare names are looked up on `PATH`.
///
/// The result is always absolute, so a bare name found in the working
/// directory is not looked up on `PATH` again when it is executed.
pub fn resolve_binary(binary: &Path) -> Result<PathBuf> {
    if binary.is_file() {
        return Ok(std::path::absolute(binary)?);
    }

    if binary.components().count() == 1 {
        if let Some(paths) = env::var_os("PATH") {
            for dir in env::split_paths(&paths) {
                let candidate = dir.join(binary);
                if candidate.is_file() {
                    return Ok(std::path::absolute(candidate)?);
                }
            }
        }
    }

    Err(UploaderError::ToolUnavailable {
        tool: binary.display().to_string(),
        reason: "not found as a file or on PATH".to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::tempdir;

    #[test]
    fn test_partial_config_uses_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("tools.json");
        let mut file = File::create(&path).unwrap();
        writeln!(file, r#"{{"reference": "/refs/covid.fasta"}}"#).unwrap();

        let config = ToolConfig::from_file(&path).unwrap();
        assert_eq!(config.reference, PathBuf::from("/refs/covid.fasta"));
        assert_eq!(config.samtools, PathBuf::from("samtools"));
        assert_eq!(config.decontaminator, PathBuf::from("readItAndKeep"));
    }

    #[test]
    fn test_missing_config_file() {
        let result = ToolConfig::from_file("/nonexistent/tools.json");
        assert!(matches!(result, Err(UploaderError::ConfigError(_))));
    }

    #[test]
    fn test_resolve_existing_path() {
        let dir = tempdir().unwrap();
        let tool = dir.path().join("samtools");
        File::create(&tool).unwrap();

        assert_eq!(resolve_binary(&tool).unwrap(), tool);
    }

    #[test]
    fn test_local_file_resolves_to_absolute_path() {
        let resolved = resolve_binary(Path::new("Cargo.toml")).unwrap();
        assert!(resolved.is_absolute());
        assert_eq!(resolved, env::current_dir().unwrap().join("Cargo.toml"));
    }

    #[test]
    fn test_resolve_unknown_binary() {
        let result = resolve_binary(Path::new("definitely-not-a-real-tool-4d1c"));
        assert!(matches!(result, Err(UploaderError::ToolUnavailable { .. })));
    }
}
