//! Pure, stateless byte-level kernels used by the container format.
//!
//! - `bitcast`: typed element buffers to and from their little-endian byte form.
//! - `zstd`: optional Zstandard compression of entry payloads.

pub mod bitcast;
pub mod zstd;
