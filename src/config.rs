// In: src/config.rs

//! The single source of truth for solver invocation settings.
//!
//! `SolverConfig` is created once at the application boundary (in code, or
//! from a JSON file) and handed to `bridge::Solver`. Nothing in the library
//! looks the binary location up on its own: where the solver lives and where
//! its files are staged is always whatever this struct says.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::KwaveError;

/// Everything the bridge needs to stage files and launch the solver.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "snake_case")]
pub struct SolverConfig {
    /// Directory holding the solver executables.
    #[serde(default = "default_binary_dir")]
    pub binary_dir: PathBuf,

    /// File name of the executable inside `binary_dir`.
    #[serde(default = "default_binary_name")]
    pub binary_name: String,

    /// Working directory for staged input and output files. Created on demand.
    #[serde(default = "default_data_path")]
    pub data_path: PathBuf,

    /// Stem of the staged file names. Concurrent runs must use distinct names;
    /// nothing locks the working directory.
    #[serde(default = "default_data_name")]
    pub data_name: String,

    /// Zstandard level applied to staged input payloads. `None` writes raw payloads.
    #[serde(default)]
    pub compression_level: Option<i32>,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            binary_dir: default_binary_dir(),
            binary_name: default_binary_name(),
            data_path: default_data_path(),
            data_name: default_data_name(),
            compression_level: None,
        }
    }
}

impl SolverConfig {
    /// Loads a config from a JSON file. Missing keys take their defaults.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, KwaveError> {
        let text = std::fs::read_to_string(path.as_ref())?;
        let config: Self = serde_json::from_str(&text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), KwaveError> {
        if self.binary_name.is_empty() {
            return Err(KwaveError::InvalidConfig("binary_name is empty".into()));
        }
        if self.data_name.is_empty() || self.data_name.contains(['/', '\\']) {
            return Err(KwaveError::InvalidConfig(format!(
                "data_name '{}' must be a non-empty file stem",
                self.data_name
            )));
        }
        if let Some(level) = self.compression_level {
            if !zstd::compression_level_range().contains(&level) {
                return Err(KwaveError::InvalidConfig(format!(
                    "compression_level {level} is outside the zstd range"
                )));
            }
        }
        Ok(())
    }

    pub fn binary_path(&self) -> PathBuf {
        self.binary_dir.join(&self.binary_name)
    }

    /// `<data_path>/<data_name>_input.h5`
    pub fn input_file(&self, data_name: &str) -> PathBuf {
        self.data_path.join(format!("{data_name}_input.h5"))
    }

    /// `<data_path>/<data_name>_output.h5`
    pub fn output_file(&self, data_name: &str) -> PathBuf {
        self.data_path.join(format!("{data_name}_output.h5"))
    }
}

/// Helper for `serde`: binaries ship next to the library in `binaries/`.
fn default_binary_dir() -> PathBuf {
    PathBuf::from("binaries")
}

fn default_binary_name() -> String {
    "kspaceFirstOrder-CUDA.exe".to_string()
}

fn default_data_path() -> PathBuf {
    std::env::temp_dir().join("kwave")
}

fn default_data_name() -> String {
    "kwave_data".to_string()
}
