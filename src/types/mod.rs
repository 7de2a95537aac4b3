//! This module defines the core, strongly-typed data representations used
//! throughout the codec.
//!
//! It includes the on-disk `ElementKind` (the two element types a container
//! entry may hold), the wider `NativeKind` set that callers may hand to the
//! encoder, and the dynamic leaf `Value` that record fields carry.

pub mod element_kind;
pub mod value;

// Re-export the main type(s) for easier access.
pub use element_kind::{DomainType, ElementKind, NativeKind};
pub use value::Value;
