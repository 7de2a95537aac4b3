// In: src/error.rs

//! This module defines the single, unified error type for the entire kwave library.
//! It uses the `thiserror` crate to provide ergonomic, context-aware error handling.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum KwaveError {
    // =========================================================================
    // === Schema Contract Violations (never proceed past these)
    // =========================================================================
    #[error("Missing required data '{field}' in {record}")]
    MissingRequiredField {
        record: &'static str,
        field: &'static str,
    },

    #[error("Shape mismatch for '{field}': shape {shape:?} matches none of [{patterns}]")]
    ShapeMismatch {
        field: &'static str,
        shape: Vec<usize>,
        /// The admissible patterns, already rendered, e.g. `(1, 1, Nsens)`.
        patterns: String,
    },

    #[error("Cannot construct {record}: required field '{field}' is unset")]
    RecordConstruction {
        record: &'static str,
        field: &'static str,
    },

    // =========================================================================
    // === Container & Solver Errors
    // =========================================================================
    #[error("Container read failed: {0}")]
    ContainerRead(String),

    #[error("Binary not found at {}", .0.display())]
    BinaryNotFound(PathBuf),

    #[error(
        "Solver terminated with {}. Check the input file {}",
        describe_exit(.code),
        .input.display()
    )]
    SolverExecution {
        code: Option<i32>,
        input: PathBuf,
        output: PathBuf,
    },

    #[error("Solver run cancelled. Staged input left at {}", .input.display())]
    Cancelled { input: PathBuf, output: PathBuf },

    #[error(
        "Failed to decode solver output {} (input {}): {source}",
        .output.display(),
        .input.display()
    )]
    Decode {
        input: PathBuf,
        output: PathBuf,
        #[source]
        source: Box<KwaveError>,
    },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // =========================================================================
    // === External Error Wrappers
    // =========================================================================
    /// An error originating from the underlying I/O subsystem (file not found, broken pipe, ...).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// An error from the Serde JSON library, typically while reading a container manifest.
    #[error("Serde JSON error: {0}")]
    SerdeJson(#[from] serde_json::Error),

    #[error("Zstd operation failed: {0}")]
    Zstd(String),

    /// An error from a safe byte-casting operation failing.
    #[error("Byte slice casting error: {0}")]
    PodCast(String), // Manual `From` impl is needed as bytemuck::PodCastError doesn't impl Error
}

fn describe_exit(code: &Option<i32>) -> String {
    match code {
        Some(c) => format!("return code {c}"),
        None => "no return code (terminated by a signal)".to_string(),
    }
}

// =============================================================================
// === Manual `From` Implementations ===
// =============================================================================

impl From<bytemuck::PodCastError> for KwaveError {
    fn from(err: bytemuck::PodCastError) -> Self {
        KwaveError::PodCast(err.to_string())
    }
}

impl From<ndarray::ShapeError> for KwaveError {
    fn from(err: ndarray::ShapeError) -> Self {
        KwaveError::ContainerRead(format!("buffer does not fit its declared shape: {err}"))
    }
}
