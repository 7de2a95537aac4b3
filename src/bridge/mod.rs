// In: src/bridge/mod.rs

// ====================================================================================
// ARCHITECTURAL OVERVIEW: The Bridge Layer
// ====================================================================================
//
// The `bridge` is the boundary between this library and the external solver
// executable. It is a blocking, synchronous bridge: one encode, one process,
// one decode per run.
//
//   PREPARED ──> RUNNING ──┬──> SUCCEEDED ──> decode output file
//                          └──> FAILED      (non-zero exit, or cancelled)
//
//   1. [kspace_first_order (kspace.rs)] -> assembles a SimulationInput with defaults
//         |
//         `-> calls ->
//
//   2. [Solver (solver.rs)]             -> checks the binary, stages
//         |                                <data_path>/<data_name>_input.h5,
//         |                                maps the exit status, decodes
//         |                                <data_name>_output.h5
//         `-> calls ->
//
//   3. [run_process (runner.rs)]        -> spawns `<binary> -i <in> -o <out>`,
//                                          relays stdout/stderr line by line to an
//                                          `OutputSink` (output.rs), polls for exit
//                                          or cancellation
//
// Staged files are never removed, so a failed run can be reproduced by hand.
//
// ====================================================================================
pub mod kspace;
pub mod output;
pub mod runner;
pub mod solver;

pub use kspace::{kspace_first_order, RunOptions};
pub use output::{CaptureSink, LogSink, NullSink, OutputSink, StdoutSink};
pub use runner::{CancelToken, ProcessOutcome};
pub use solver::{RunState, Solver, StagedFiles};

#[cfg(all(test, unix))]
mod tests;
