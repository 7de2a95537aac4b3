//! This module defines the canonical, type-safe representation of element types
//! used by container entries and record fields.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The element type of a container entry, as declared by a field descriptor.
///
/// The solver understands exactly two element types: 64-bit unsigned integers
/// (`"long"`) and 32-bit floats (`"float"`). The string tags are part of the
/// on-disk contract and are written into every entry's `data_type` attribute.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ElementKind {
    Long,
    Float,
}

impl ElementKind {
    /// The value written into the `data_type` attribute.
    pub fn tag(&self) -> &'static str {
        match self {
            Self::Long => "long",
            Self::Float => "float",
        }
    }

    /// Parses a `data_type` attribute value.
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "long" => Some(Self::Long),
            "float" => Some(Self::Float),
            _ => None,
        }
    }

    /// The in-memory element type backing this kind.
    pub fn native(&self) -> NativeKind {
        match self {
            Self::Long => NativeKind::UInt64,
            Self::Float => NativeKind::Float32,
        }
    }

    /// Size of one element on disk, in bytes.
    pub fn byte_width(&self) -> usize {
        match self {
            Self::Long => std::mem::size_of::<u64>(),
            Self::Float => std::mem::size_of::<f32>(),
        }
    }
}

impl fmt::Display for ElementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// The `domain_type` attribute. Only real-valued data is produced today.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum DomainType {
    #[default]
    Real,
}

impl DomainType {
    pub fn tag(&self) -> &'static str {
        match self {
            Self::Real => "real",
        }
    }
}

/// The element type of an in-memory `Value`.
///
/// This is wider than `ElementKind` so that callers may pass the numeric types
/// they naturally have at hand (a `u8` mask, an `f64` pressure map). The encoder
/// casts anything that is not the declared kind's native type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum NativeKind {
    UInt8,
    Int64,
    UInt64,
    Float32,
    Float64,
}

impl NativeKind {
    /// Returns `true` if the native type is a floating-point number.
    pub fn is_float(&self) -> bool {
        matches!(self, Self::Float32 | Self::Float64)
    }
}

/// Provides the canonical string representation for a `NativeKind`.
impl fmt::Display for NativeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::UInt8 => "uint8",
            Self::Int64 => "int64",
            Self::UInt64 => "uint64",
            Self::Float32 => "float32",
            Self::Float64 => "float64",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tags_roundtrip_through_parser() {
        for kind in [ElementKind::Long, ElementKind::Float] {
            assert_eq!(ElementKind::from_tag(kind.tag()), Some(kind));
        }
        assert_eq!(ElementKind::from_tag("double"), None);
    }

    #[test]
    fn test_native_mapping() {
        assert_eq!(ElementKind::Long.native(), NativeKind::UInt64);
        assert_eq!(ElementKind::Float.native(), NativeKind::Float32);
        assert_eq!(ElementKind::Float.byte_width(), 4);
        assert_eq!(NativeKind::Float64.to_string(), "float64");
    }
}
