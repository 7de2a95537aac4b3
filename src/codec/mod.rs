// In: src/codec/mod.rs

// ====================================================================================
// ARCHITECTURAL OVERVIEW: The Codec
// ====================================================================================
//
// The codec moves typed records in and out of a `Container` by walking the
// record's schema table, never the struct itself.
//
// Encoding:
//
//   1. [Record::to_fields]   -> FieldValues tree (nested records as subtrees)
//   2. [encoder]             -> per leaf, in schema order:
//                                 absent?       optional: skip / required: MissingRequiredField
//                                 coerce kind   (cast + KindMismatch advisory)
//                                 canonicalize  (left-pad to rank 3)
//                                 validate      (admissible shape vs. earlier siblings)
//   3. [Container]           -> staged entries committed only if every leaf passed
//
// Decoding:
//
//   1. [decoder]             -> per leaf: entry present? reduce (1,1,1) to scalar : unset
//   2. [Record::from_fields] -> typed record, bottom-up; RecordConstruction if a
//                               required field ended up unset
//
// ====================================================================================
pub mod decoder;
pub mod encoder;
pub mod provenance;


pub use decoder::{decode, decode_fields, decode_file};
pub use encoder::{encode, encode_fields, encode_file};

use std::fmt;

use crate::types::{ElementKind, NativeKind};

/// A value whose element type differs from its field's declared kind.
///
/// This is advisory only. The encoder casts and continues; the decoder keeps
/// the stored kind. Every instance is logged at `warn` level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KindMismatch {
    pub field: &'static str,
    pub found: NativeKind,
    pub declared: ElementKind,
}

impl fmt::Display for KindMismatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Type of {} is {}, but annotated {} ({})",
            self.field,
            self.found,
            self.declared,
            self.declared.native()
        )
    }
}
