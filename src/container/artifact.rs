//! Serialisation of a `Container` to its self-describing on-disk form.
//! This module is the single source of truth for writing, reading, and
//! efficient metadata peeking of a container file.

use ndarray::Array3;
use std::io::{Cursor, Read};

use crate::container::format::{
    Compression, ContainerHeader, ContainerInfo, EntryHeader, CONTAINER_FORMAT_VERSION,
    CONTAINER_MAGIC, FIXED_HEADER_SIZE, MAX_REASONABLE_HEADER_LEN,
};
use crate::container::{Container, Dataset, DatasetData};
use crate::error::KwaveError;
use crate::kernels::{bitcast, zstd};
use crate::types::ElementKind;

//==================================================================================
// Core Implementation
//==================================================================================

impl Container {
    /// Serialises the container into a canonical byte vector.
    ///
    /// Entries are written sorted by name, so two containers with the same
    /// content always produce identical bytes.
    pub fn to_bytes(&self) -> Result<Vec<u8>, KwaveError> {
        let mut entries = Vec::with_capacity(self.len());
        let mut payloads = Vec::with_capacity(self.len());

        for (name, dataset) in self.datasets() {
            let raw = encode_payload(&dataset.data);
            let (compression, stored) = match self.compression_level() {
                Some(level) => (Compression::Zstd, zstd::encode(&raw, level)?),
                None => (Compression::None, raw),
            };
            entries.push(EntryHeader {
                name: name.to_string(),
                data_type: dataset.data.kind(),
                shape: dataset.data.shape(),
                attrs: dataset.attrs.clone(),
                compression,
                byte_len: stored.len() as u64,
            });
            payloads.push(stored);
        }

        let header = ContainerHeader {
            attrs: self.attrs().clone(),
            entries,
        };
        let header_json = serde_json::to_vec(&header)?;
        if header_json.len() > MAX_REASONABLE_HEADER_LEN {
            return Err(KwaveError::ContainerRead(format!(
                "Header length ({}) exceeds maximum allowed size ({})",
                header_json.len(),
                MAX_REASONABLE_HEADER_LEN
            )));
        }

        // --- Final Assembly ---
        let data_size: usize = payloads.iter().map(Vec::len).sum();
        let mut final_buf = Vec::with_capacity(FIXED_HEADER_SIZE + header_json.len() + data_size);
        final_buf.extend_from_slice(CONTAINER_MAGIC);
        final_buf.extend_from_slice(&CONTAINER_FORMAT_VERSION.to_le_bytes());
        final_buf.extend_from_slice(&(header_json.len() as u32).to_le_bytes());
        final_buf.extend_from_slice(&header_json);
        for payload in &payloads {
            final_buf.extend_from_slice(payload);
        }

        Ok(final_buf)
    }

    /// Deserialises a full byte slice, reading every payload into memory.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, KwaveError> {
        let info = Self::peek_info(bytes)?;
        let mut cursor = Cursor::new(bytes);
        // Seek the cursor to the beginning of the data payloads.
        cursor.set_position(info.header_size as u64);

        let mut container = Container::new();
        for (key, value) in info.header.attrs {
            container.set_attr(key, value);
        }

        for entry in info.header.entries {
            let mut stored = vec![0u8; entry.byte_len as usize];
            cursor.read_exact(&mut stored).map_err(read_err)?;

            let raw_len = entry.raw_len()?;
            let raw = match entry.compression {
                Compression::None => stored,
                Compression::Zstd => {
                    let declared =
                        zstd::declared_len(&stored).map_err(|e| entry_err(&entry.name, e))?;
                    if declared != raw_len {
                        return Err(KwaveError::ContainerRead(format!(
                            "Entry '{}' declares {} uncompressed bytes but shape {:?} of {} needs {}",
                            entry.name, declared, entry.shape, entry.data_type, raw_len
                        )));
                    }
                    zstd::decode(&stored).map_err(|e| entry_err(&entry.name, e))?
                }
            };
            if raw.len() != raw_len {
                return Err(KwaveError::ContainerRead(format!(
                    "Entry '{}' holds {} bytes but shape {:?} of {} needs {}",
                    entry.name,
                    raw.len(),
                    entry.shape,
                    entry.data_type,
                    raw_len
                )));
            }

            let data = decode_payload(entry.data_type, entry.shape, &raw)?;
            container.insert(
                entry.name,
                Dataset {
                    data,
                    attrs: entry.attrs,
                },
            );
        }

        Ok(container)
    }

    /// Peeks into a serialised container's header to extract metadata without
    /// reading the (potentially large) data payloads.
    pub fn peek_info(bytes: &[u8]) -> Result<ContainerInfo, KwaveError> {
        if bytes.len() < FIXED_HEADER_SIZE {
            return Err(KwaveError::ContainerRead(format!(
                "Container is too small to be valid. Minimum size: {}, got: {}",
                FIXED_HEADER_SIZE,
                bytes.len()
            )));
        }

        let mut cursor = Cursor::new(bytes);

        let mut magic_buf = [0u8; 4];
        cursor.read_exact(&mut magic_buf).map_err(read_err)?;
        if magic_buf != *CONTAINER_MAGIC {
            return Err(KwaveError::ContainerRead(
                "Invalid container magic number".into(),
            ));
        }

        let mut u16_buf = [0u8; 2];
        cursor.read_exact(&mut u16_buf).map_err(read_err)?;
        let version = u16::from_le_bytes(u16_buf);
        if version != CONTAINER_FORMAT_VERSION {
            return Err(KwaveError::ContainerRead(format!(
                "Unsupported container version: expected {}, got {}",
                CONTAINER_FORMAT_VERSION, version
            )));
        }

        let mut u32_buf = [0u8; 4];
        cursor.read_exact(&mut u32_buf).map_err(read_err)?;
        let header_len = u32::from_le_bytes(u32_buf) as usize;
        if header_len > MAX_REASONABLE_HEADER_LEN {
            return Err(KwaveError::ContainerRead(format!(
                "Header length ({}) exceeds maximum allowed size ({})",
                header_len, MAX_REASONABLE_HEADER_LEN
            )));
        }

        let header_size = FIXED_HEADER_SIZE + header_len;
        if bytes.len() < header_size {
            return Err(KwaveError::ContainerRead(
                "Header length exceeds buffer size".into(),
            ));
        }

        let header: ContainerHeader = serde_json::from_slice(&bytes[FIXED_HEADER_SIZE..header_size])
            .map_err(|e| KwaveError::ContainerRead(format!("Malformed header: {}", e)))?;

        let data_size = header
            .entries
            .iter()
            .try_fold(0usize, |acc, e| acc.checked_add(e.byte_len as usize))
            .ok_or_else(|| KwaveError::ContainerRead("Declared payload sizes overflow".into()))?;
        if header_size.saturating_add(data_size) > bytes.len() {
            return Err(KwaveError::ContainerRead(
                "Sum of declared header and data sizes exceeds buffer length.".into(),
            ));
        }

        Ok(ContainerInfo {
            format_version: version,
            header,
            header_size,
            data_size,
        })
    }
}

//==================================================================================
// Private Helpers
//==================================================================================

fn read_err(e: std::io::Error) -> KwaveError {
    KwaveError::ContainerRead(e.to_string())
}

fn entry_err(name: &str, e: KwaveError) -> KwaveError {
    KwaveError::ContainerRead(format!("Entry '{}': {}", name, e))
}

fn encode_payload(data: &DatasetData) -> Vec<u8> {
    match data {
        DatasetData::Long(a) => bitcast::encode(a.iter().copied()),
        DatasetData::Float(a) => bitcast::encode(a.iter().copied()),
    }
}

fn decode_payload(
    kind: ElementKind,
    shape: [usize; 3],
    raw: &[u8],
) -> Result<DatasetData, KwaveError> {
    let dim = (shape[0], shape[1], shape[2]);
    Ok(match kind {
        ElementKind::Long => DatasetData::Long(Array3::from_shape_vec(dim, bitcast::decode(raw)?)?),
        ElementKind::Float => {
            DatasetData::Float(Array3::from_shape_vec(dim, bitcast::decode(raw)?)?)
        }
    })
}

//==================================================================================
// Unit Tests
//==================================================================================
