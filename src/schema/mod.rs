// In: src/schema/mod.rs

//! The schema model: a declarative, language-neutral description of every
//! record type the codec understands.
//!
//! A `RecordSchema` is an ordered table of `FieldDescriptor`s built once per
//! record type. Each leaf declares its element kind, whether it may be absent,
//! and the shapes it may legally take. Shapes are rank-3 patterns mixing fixed
//! extents with symbolic ones (`Nx`, `Nsens`); a field may also pick its
//! pattern from a sibling's value (`p_source_many == 1`). Nested records are
//! composition only: they own no entry and their leaves share the parent's
//! flat namespace.

pub mod field;
pub mod record;
pub mod shape;

pub use field::{Condition, FieldDescriptor, FieldKind, SchemaFn, Siblings};
pub use record::{FieldValues, Record, RecordSchema, Slot};
pub use shape::{render_patterns, shape_matches, Dim, ShapePattern, CANONICAL_RANK};
