//! This module contains the pure, stateless kernel for converting element
//! buffers to and from their on-disk byte form.
//!
//! Entries are stored little-endian regardless of host. Floats travel as their
//! IEEE-754 bit patterns. The module is panic-free and relies on `bytemuck` for
//! the slice reinterpretation.

use crate::error::KwaveError;
use bytemuck::{Pod, Zeroable};

//==================================================================================
// 1. Element Contract
//==================================================================================

/// An element type that has a fixed-width little-endian bit representation.
pub trait LeElement: Copy {
    type Bits: Pod;

    fn to_le_bits(self) -> Self::Bits;
    fn from_le_bits(bits: Self::Bits) -> Self;
}

impl LeElement for u64 {
    type Bits = u64;

    fn to_le_bits(self) -> u64 {
        self.to_le()
    }

    fn from_le_bits(bits: u64) -> Self {
        u64::from_le(bits)
    }
}

impl LeElement for f32 {
    type Bits = u32;

    fn to_le_bits(self) -> u32 {
        self.to_bits().to_le()
    }

    fn from_le_bits(bits: u32) -> Self {
        f32::from_bits(u32::from_le(bits))
    }
}

//==================================================================================
// 2. Public API
//==================================================================================

/// Serialises elements, in iteration order, into little-endian bytes.
pub fn encode<T, I>(values: I) -> Vec<u8>
where
    T: LeElement,
    I: IntoIterator<Item = T>,
{
    let bits: Vec<T::Bits> = values.into_iter().map(T::to_le_bits).collect();
    bytemuck::cast_slice::<T::Bits, u8>(&bits).to_vec()
}

/// Deserialises little-endian bytes into elements.
///
/// The input does not need to be aligned; it is copied into a correctly
/// aligned buffer before reinterpretation.
pub fn decode<T: LeElement>(bytes: &[u8]) -> Result<Vec<T>, KwaveError> {
    let width = std::mem::size_of::<T::Bits>();
    if bytes.len() % width != 0 {
        return Err(KwaveError::ContainerRead(format!(
            "Buffer length mismatch: expected a multiple of {}, got {}",
            width,
            bytes.len()
        )));
    }

    let mut bits = vec![<T::Bits as Zeroable>::zeroed(); bytes.len() / width];
    bytemuck::try_cast_slice_mut::<T::Bits, u8>(&mut bits)?.copy_from_slice(bytes);
    Ok(bits.into_iter().map(T::from_le_bits).collect())
}

//==================================================================================
// 3. Unit Tests
//==================================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_u64_layout_is_little_endian() {
        let bytes = encode([1u64, 256]);
        assert_eq!(bytes.len(), 16);
        assert_eq!(&bytes[..8], &[1, 0, 0, 0, 0, 0, 0, 0]);
        assert_eq!(&bytes[8..], &[0, 1, 0, 0, 0, 0, 0, 0]);
        assert_eq!(decode::<u64>(&bytes).unwrap(), vec![1, 256]);
    }

    #[test]
    fn test_f32_bit_patterns_survive() {
        let original = vec![1.0f32, -0.0, f32::NAN, std::f32::consts::PI];
        let decoded = decode::<f32>(&encode(original.iter().copied())).unwrap();
        for (a, b) in original.iter().zip(decoded.iter()) {
            assert_eq!(a.to_bits(), b.to_bits());
        }
    }

    #[test]
    fn test_unaligned_input_is_accepted() {
        let mut padded = vec![0xAAu8];
        padded.extend(encode([7u64, 9]));
        assert_eq!(decode::<u64>(&padded[1..]).unwrap(), vec![7, 9]);
    }

    #[test]
    fn test_truncated_buffer_is_rejected() {
        let result = decode::<f32>(&[0, 0, 128]);
        assert!(matches!(result, Err(KwaveError::ContainerRead(msg)) if msg.contains("multiple of 4")));
    }
}
