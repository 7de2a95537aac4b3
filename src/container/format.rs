// In: src/container/format.rs

//! Defines all on-disk structures and constants for the container file.
//! This is the single source of truth for the layout both the writer and the
//! reader agree on.
//!
//! ```text
//! +-------+---------+------------+------------------+---------------------+
//! | magic | version | header_len | header (JSON)    | payloads, in order  |
//! | 4 B   | u16 LE  | u32 LE     | header_len bytes | of header.entries   |
//! +-------+---------+------------+------------------+---------------------+
//! ```

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::KwaveError;
use crate::schema::CANONICAL_RANK;
use crate::types::ElementKind;

//==================================================================================
// I. File-Level Constants
//==================================================================================

/// The magic number to identify a container file.
pub const CONTAINER_MAGIC: &[u8; 4] = b"KWCF";
/// The current version of the container format.
pub const CONTAINER_FORMAT_VERSION: u16 = 1;
/// Size of the fixed prefix: magic(4) + version(2) + header_len(4).
pub const FIXED_HEADER_SIZE: usize = 10;
/// A reasonable limit to prevent OOM from malformed header lengths. (16MB)
pub const MAX_REASONABLE_HEADER_LEN: usize = 16 * 1024 * 1024;

//==================================================================================
// II. Header Structures
//==================================================================================

/// How an entry's payload bytes are stored.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Compression {
    #[default]
    None,
    /// Zstandard frame preceded by the 8-byte uncompressed length.
    Zstd,
}

/// Manifest record for one entry. Payloads follow the header in the same order
/// as these records, which the writer keeps sorted by `name`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct EntryHeader {
    /// Slash-separated path of the entry, e.g. `Nx` or `p/1`.
    pub name: String,
    pub data_type: ElementKind,
    pub shape: [usize; CANONICAL_RANK],
    #[serde(default)]
    pub attrs: BTreeMap<String, String>,
    #[serde(default)]
    pub compression: Compression,
    /// Stored payload size in bytes (after compression, if any).
    pub byte_len: u64,
}

impl EntryHeader {
    /// Payload size before compression, as implied by shape and element type.
    /// Shapes come from the file, so an overflowing size is a read error.
    pub fn raw_len(&self) -> Result<usize, KwaveError> {
        self.shape
            .iter()
            .try_fold(self.data_type.byte_width(), |acc, &n| acc.checked_mul(n))
            .ok_or_else(|| {
                KwaveError::ContainerRead(format!(
                    "Entry '{}' declares shape {:?}, whose size overflows",
                    self.name, self.shape
                ))
            })
    }
}

/// The variable-length header.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct ContainerHeader {
    /// Whole-file attributes (provenance).
    #[serde(default)]
    pub attrs: BTreeMap<String, String>,
    pub entries: Vec<EntryHeader>,
}

/// Metadata extracted from a container without reading its payloads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainerInfo {
    pub format_version: u16,
    pub header: ContainerHeader,
    /// Size of the fixed prefix plus the JSON header.
    pub header_size: usize,
    /// Sum of all stored payload sizes.
    pub data_size: usize,
}
