//! The solver invocation state machine.

use std::ffi::OsStr;
use std::fmt;
use std::path::{Path, PathBuf};
use std::process::ExitStatus;
use std::sync::Arc;
use std::time::Duration;

use crate::bridge::output::{OutputSink, StdoutSink};
use crate::bridge::runner::{run_process, CancelToken, ProcessOutcome};
use crate::codec;
use crate::config::SolverConfig;
use crate::error::KwaveError;
use crate::schema::Record;

const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Where a run is in its life cycle. Every transition is logged at `info` level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    /// The input container is written to the working directory.
    Prepared,
    /// The solver process is running.
    Running,
    Succeeded,
    Failed,
}

impl fmt::Display for RunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RunState::Prepared => "PREPARED",
            RunState::Running => "RUNNING",
            RunState::Succeeded => "SUCCEEDED",
            RunState::Failed => "FAILED",
        };
        f.write_str(name)
    }
}

/// The input and output file paths of one run. Staged files are never deleted
/// by the bridge, so they remain available for diagnosis after a failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StagedFiles {
    pub input: PathBuf,
    pub output: PathBuf,
}

/// Runs the external solver on encoded records.
pub struct Solver {
    config: SolverConfig,
    sink: Arc<dyn OutputSink>,
    cancel: CancelToken,
    poll_interval: Duration,
}

impl fmt::Debug for Solver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Solver")
            .field("config", &self.config)
            .field("cancelled", &self.cancel.is_cancelled())
            .field("poll_interval", &self.poll_interval)
            .finish()
    }
}

impl Solver {
    pub fn new(config: SolverConfig) -> Self {
        Self {
            config,
            sink: Arc::new(StdoutSink),
            cancel: CancelToken::new(),
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }

    /// Sends the solver's console output somewhere other than stdout.
    pub fn with_sink(mut self, sink: Arc<dyn OutputSink>) -> Self {
        self.sink = sink;
        self
    }

    /// Uses a caller-owned token, so the caller can cancel from another thread.
    pub fn with_cancel_token(mut self, cancel: CancelToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    pub fn config(&self) -> &SolverConfig {
        &self.config
    }

    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    /// The configured executable, checked to exist. No process is spawned when it does not.
    pub fn binary(&self) -> Result<PathBuf, KwaveError> {
        let binary = self.config.binary_path();
        if binary.is_file() {
            Ok(binary)
        } else {
            Err(KwaveError::BinaryNotFound(binary))
        }
    }

    pub fn staged_files(&self, data_name: &str) -> StagedFiles {
        StagedFiles {
            input: self.config.input_file(data_name),
            output: self.config.output_file(data_name),
        }
    }

    /// Encodes `input`, runs the solver on it, and decodes the output file,
    /// staging under the configured `data_name`.
    pub fn run<I: Record, O: Record>(&self, input: &I) -> Result<O, KwaveError> {
        self.run_as(input, &self.config.data_name)
    }

    /// Like `run`, staging under `data_name` instead of the configured one.
    pub fn run_as<I: Record, O: Record>(&self, input: &I, data_name: &str) -> Result<O, KwaveError> {
        let binary = self.binary()?;
        let files = self.staged_files(data_name);

        std::fs::create_dir_all(&self.config.data_path)?;
        codec::encode_file(input, &files.input, self.config.compression_level)?;
        log::info!("[{}] input staged at {}", RunState::Prepared, files.input.display());

        self.execute(&binary, &files)?;

        codec::decode_file(&files.output).map_err(|source| KwaveError::Decode {
            input: files.input.clone(),
            output: files.output.clone(),
            source: Box::new(source),
        })
    }

    /// Runs the solver on an already staged input file.
    ///
    /// Succeeds iff the process exits with status 0. A non-zero exit is a
    /// `SolverExecution` error carrying the exit code and both file paths.
    pub fn run_files(&self, input: &Path, output: &Path) -> Result<(), KwaveError> {
        let binary = self.binary()?;
        self.execute(
            &binary,
            &StagedFiles {
                input: input.to_path_buf(),
                output: output.to_path_buf(),
            },
        )
    }

    fn execute(&self, binary: &Path, files: &StagedFiles) -> Result<(), KwaveError> {
        let args = [
            OsStr::new("-i"),
            files.input.as_os_str(),
            OsStr::new("-o"),
            files.output.as_os_str(),
        ];
        log::info!(
            "[{}] {} -i {} -o {}",
            RunState::Running,
            binary.display(),
            files.input.display(),
            files.output.display()
        );

        let outcome = run_process(
            binary,
            &args,
            Arc::clone(&self.sink),
            &self.cancel,
            self.poll_interval,
        )?;
        match outcome {
            ProcessOutcome::Exited(status) if status.success() => {
                log::info!("[{}] output at {}", RunState::Succeeded, files.output.display());
                Ok(())
            }
            ProcessOutcome::Exited(status) => {
                log::error!(
                    "[{}] {}. Check the input file {}",
                    RunState::Failed,
                    status,
                    files.input.display()
                );
                Err(KwaveError::SolverExecution {
                    code: status.code(),
                    input: files.input.clone(),
                    output: files.output.clone(),
                })
            }
            ProcessOutcome::Cancelled => {
                log::warn!("[{}] cancelled", RunState::Failed);
                Err(KwaveError::Cancelled {
                    input: files.input.clone(),
                    output: files.output.clone(),
                })
            }
        }
    }

    /// Runs `<binary> --version`, relaying its output. Nothing is staged.
    pub fn version(&self) -> Result<ExitStatus, KwaveError> {
        let binary = self.binary()?;
        let outcome = run_process(
            &binary,
            &[OsStr::new("--version")],
            Arc::clone(&self.sink),
            &self.cancel,
            self.poll_interval,
        )?;
        match outcome {
            ProcessOutcome::Exited(status) => Ok(status),
            ProcessOutcome::Cancelled => Err(KwaveError::Cancelled {
                input: PathBuf::new(),
                output: PathBuf::new(),
            }),
        }
    }
}
