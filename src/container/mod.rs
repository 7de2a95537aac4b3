// In: src/container/mod.rs

// ====================================================================================
// ARCHITECTURAL OVERVIEW: The Container Layer
// ====================================================================================
//
// A container is the interchange file between this library and the solver. It
// is a flat key-value store of named entries (datasets). Each dataset is a
// rank-3 buffer of one element kind plus a few string attributes; the file as
// a whole carries provenance attributes.
//
//   Container ──┬── attrs   { created_by, creation_date, file_type, ... }
//               └── entries { "Nx" -> Dataset, "p0_source_input" -> Dataset, ... }
//
// Names may contain '/', which groups entries hierarchically ("p/1", "p/2").
//
//   1. [In-memory model (this file)]   -> what the codec writes into / reads from
//   2. [Artifact (artifact.rs)]        -> Container <-> bytes, the on-disk layout
//   3. [Comparator (compare.rs)]       -> structural equality of two containers
//
// ====================================================================================
pub mod artifact;
pub mod compare;
pub mod format;

pub use compare::{compare_containers, compare_files, containers_equal, ComparisonFailure};

use ndarray::Array3;
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use crate::error::KwaveError;
use crate::types::{ElementKind, Value};

//==================================================================================
// 1. Datasets
//==================================================================================

/// The canonical rank-3 buffer of a dataset.
#[derive(Debug, Clone, PartialEq)]
pub enum DatasetData {
    Long(Array3<u64>),
    Float(Array3<f32>),
}

impl DatasetData {
    pub fn kind(&self) -> ElementKind {
        match self {
            DatasetData::Long(_) => ElementKind::Long,
            DatasetData::Float(_) => ElementKind::Float,
        }
    }

    pub fn shape(&self) -> [usize; 3] {
        let dims = match self {
            DatasetData::Long(a) => a.dim(),
            DatasetData::Float(a) => a.dim(),
        };
        [dims.0, dims.1, dims.2]
    }

    pub fn len(&self) -> usize {
        self.shape().iter().product()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// All elements in row-major order, widened to `f64` for comparison.
    pub fn to_f64_vec(&self) -> Vec<f64> {
        match self {
            DatasetData::Long(a) => a.iter().map(|&x| x as f64).collect(),
            DatasetData::Float(a) => a.iter().map(|&x| f64::from(x)).collect(),
        }
    }

    /// Converts into a record value, reducing `(1, 1, 1)` to a bare scalar.
    pub fn into_value(self) -> Value {
        let reduce = self.shape() == [1, 1, 1];
        match self {
            DatasetData::Long(a) if reduce => Value::long(a[[0, 0, 0]]),
            DatasetData::Float(a) if reduce => Value::float(a[[0, 0, 0]]),
            DatasetData::Long(a) => Value::from(a),
            DatasetData::Float(a) => Value::from(a),
        }
    }
}

/// One named entry: a buffer plus its attributes.
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    pub data: DatasetData,
    pub attrs: BTreeMap<String, String>,
}

impl Dataset {
    pub fn new(data: DatasetData) -> Self {
        Self {
            data,
            attrs: BTreeMap::new(),
        }
    }

    pub fn with_attr(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attrs.insert(key.into(), value.into());
        self
    }
}

//==================================================================================
// 2. The Container
//==================================================================================

/// An in-memory container. Entries are kept sorted by name so that the
/// serialised artifact is deterministic.
#[derive(Debug, Clone, Default)]
pub struct Container {
    attrs: BTreeMap<String, String>,
    entries: BTreeMap<String, Dataset>,
    /// Zstandard level applied to payloads on write. `None` stores raw bytes.
    compression_level: Option<i32>,
}

impl Container {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_compression(mut self, level: Option<i32>) -> Self {
        self.compression_level = level;
        self
    }

    pub fn compression_level(&self) -> Option<i32> {
        self.compression_level
    }

    // --- Whole-file attributes ---

    pub fn attrs(&self) -> &BTreeMap<String, String> {
        &self.attrs
    }

    pub fn set_attr(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.attrs.insert(key.into(), value.into());
    }

    pub fn attr(&self, key: &str) -> Option<&str> {
        self.attrs.get(key).map(String::as_str)
    }

    // --- Entries ---

    /// Inserts an entry. An existing entry of the same name is replaced and
    /// the replacement is logged; nested records share one namespace, so this
    /// is how a schema-level name collision shows up.
    pub fn insert(&mut self, name: impl Into<String>, dataset: Dataset) {
        let name = name.into();
        if self.entries.contains_key(&name) {
            log::warn!("Entry '{}' already exists and is overwritten", name);
        }
        self.entries.insert(name, dataset);
    }

    pub fn get(&self, name: &str) -> Option<&Dataset> {
        self.entries.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    pub fn remove(&mut self, name: &str) -> Option<Dataset> {
        self.entries.remove(name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Full paths of every entry, sorted.
    pub fn dataset_names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn datasets(&self) -> impl Iterator<Item = (&str, &Dataset)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Top-level member names: plain entries and the first segment of grouped ones.
    pub fn keys(&self) -> BTreeSet<&str> {
        self.entries
            .keys()
            .filter_map(|name| name.split('/').next())
            .collect()
    }

    /// Entries directly or transitively under `group`, with the group prefix stripped.
    pub fn group<'a>(&'a self, group: &'a str) -> impl Iterator<Item = (&'a str, &'a Dataset)> + 'a {
        self.entries.iter().filter_map(move |(name, ds)| {
            name.strip_prefix(group)
                .and_then(|rest| rest.strip_prefix('/'))
                .map(|rest| (rest, ds))
        })
    }

    // --- Files ---

    /// Writes the container to `path`, replacing any existing file.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), KwaveError> {
        let bytes = self.to_bytes()?;
        std::fs::write(path.as_ref(), bytes)?;
        Ok(())
    }

    /// Reads a container from `path`. Unreadable and malformed files both
    /// surface as `KwaveError::ContainerRead`.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, KwaveError> {
        let path = path.as_ref();
        let bytes = std::fs::read(path)
            .map_err(|e| KwaveError::ContainerRead(format!("{}: {}", path.display(), e)))?;
        Self::from_bytes(&bytes).map_err(|e| match e {
            KwaveError::ContainerRead(msg) => {
                KwaveError::ContainerRead(format!("{}: {}", path.display(), msg))
            }
            other => other,
        })
    }
}
