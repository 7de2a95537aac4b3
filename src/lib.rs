//! This file is the root of the `kwave_core` Rust crate.
//!
//! Its responsibilities are strictly limited to:
//! 1.  Declaring all the top-level modules of our library (`schema`, `codec`,
//!     `bridge`, etc.) so the Rust compiler knows they exist.
//! 2.  Re-exporting the handful of types most callers need, so a simulation can
//!     be set up and run with a single `use kwave_core::...` line.

//==================================================================================
// 0. Constants
//==================================================================================
/// The crate version, automatically set from Cargo.toml at compile time.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
//==================================================================================
// 1. Module Declarations
//==================================================================================
pub mod bridge;
pub mod codec;
pub mod config;
pub mod container;
pub mod error;
pub mod kernels;
pub mod observability;
pub mod records;
pub mod schema;
pub mod types;

//==================================================================================
// 2. Public Surface
//==================================================================================
pub use bridge::{kspace_first_order, CancelToken, OutputSink, RunOptions, Solver};
pub use codec::{decode, decode_file, encode, encode_file, KindMismatch};
pub use config::SolverConfig;
pub use container::{compare_files, containers_equal, Container};
pub use error::KwaveError;
pub use observability::enable_verbose_logging;
pub use records::{SimulationInput, SimulationOutput};
pub use schema::Record;
pub use types::Value;
