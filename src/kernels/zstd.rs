//! This module contains the pure, stateless kernels for Zstandard compression
//! of container entry payloads.
//!
//! Compression is optional and chosen per container at write time. A compressed
//! payload is an 8-byte little-endian uncompressed length followed by a single
//! zstd frame; the length lets the reader verify the frame and size its buffer.

use std::io::Read;

use crate::error::KwaveError;

/// Size of the uncompressed-length prefix.
const LEN_PREFIX: usize = 8;
/// Largest buffer reserved from a length prefix before any data is seen. (64MB)
const MAX_PREALLOC: usize = 64 * 1024 * 1024;

//==================================================================================
// 1. Public API
//==================================================================================

/// Compresses `input_bytes` at `level`, prepending the uncompressed length.
pub fn encode(input_bytes: &[u8], level: i32) -> Result<Vec<u8>, KwaveError> {
    let mut output_buf = Vec::with_capacity(LEN_PREFIX + input_bytes.len() / 2);
    output_buf.extend_from_slice(&(input_bytes.len() as u64).to_le_bytes());

    let mut encoder = zstd::stream::Encoder::new(&mut output_buf, level)
        .map_err(|e| KwaveError::Zstd(e.to_string()))?;
    std::io::Write::write_all(&mut encoder, input_bytes)
        .map_err(|e| KwaveError::Zstd(e.to_string()))?;
    // `finish` is essential to finalize the Zstd frame.
    encoder
        .finish()
        .map_err(|e| KwaveError::Zstd(e.to_string()))?;

    Ok(output_buf)
}

/// Reads the uncompressed length recorded in front of a compressed payload.
pub fn declared_len(input_bytes: &[u8]) -> Result<usize, KwaveError> {
    let Some(len_bytes) = input_bytes.get(..LEN_PREFIX) else {
        return Err(KwaveError::Zstd(
            "Input stream too short to contain size header.".to_string(),
        ));
    };
    let mut prefix = [0u8; LEN_PREFIX];
    prefix.copy_from_slice(len_bytes);
    let len = u64::from_le_bytes(prefix);
    usize::try_from(len)
        .map_err(|_| KwaveError::Zstd(format!("Declared size {} does not fit in memory.", len)))
}

/// Reverses `encode`, checking the decompressed size against the prefix.
///
/// The prefix is untrusted: at most `MAX_PREALLOC` bytes are reserved up
/// front, and decompression stops one byte past the declared size.
pub fn decode(input_bytes: &[u8]) -> Result<Vec<u8>, KwaveError> {
    let uncompressed_len = declared_len(input_bytes)?;
    let compressed_data = &input_bytes[LEN_PREFIX..];

    let decoder = zstd::stream::Decoder::new(compressed_data)
        .map_err(|e| KwaveError::Zstd(e.to_string()))?;
    let mut decompressed_data = Vec::with_capacity(uncompressed_len.min(MAX_PREALLOC));
    decoder
        .take((uncompressed_len as u64).saturating_add(1))
        .read_to_end(&mut decompressed_data)
        .map_err(|e| KwaveError::Zstd(e.to_string()))?;

    if decompressed_data.len() != uncompressed_len {
        return Err(KwaveError::Zstd(format!(
            "Decompressed size does not match header. Expected {}, got {}{}.",
            uncompressed_len,
            decompressed_data.len(),
            if decompressed_data.len() > uncompressed_len { " or more" } else { "" }
        )));
    }

    Ok(decompressed_data)
}

//==================================================================================
// 2. Unit Tests
//==================================================================================
