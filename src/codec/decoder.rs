//! Container -> record.

use std::path::Path;

use crate::codec::KindMismatch;
use crate::container::Container;
use crate::error::KwaveError;
use crate::schema::{FieldKind, FieldValues, Record, RecordSchema, Siblings, Slot, CANONICAL_RANK};

/// Decodes a record of type `R` from `container`.
///
/// An entry the container lacks leaves its field unset; whether that is
/// acceptable is decided by `R::from_fields`, not here.
pub fn decode<R: Record>(container: &Container) -> Result<R, KwaveError> {
    let (fields, _) = decode_fields(R::schema(), container);
    R::from_fields(fields)
}

/// Opens the container at `path` and decodes a record of type `R` from it.
pub fn decode_file<R: Record>(path: impl AsRef<Path>) -> Result<R, KwaveError> {
    let container = Container::open(path)?;
    decode(&container)
}

/// Schema-driven core of `decode`.
///
/// Builds the `FieldValues` tree for `schema` and reports the fields whose
/// stored kind differs from the declared one. Stored values are kept as-is:
/// a `(1, 1, 1)` entry becomes a bare scalar, anything else keeps its rank-3
/// shape and element type.
pub fn decode_fields(
    schema: &RecordSchema,
    container: &Container,
) -> (FieldValues, Vec<KindMismatch>) {
    let mut mismatches = Vec::new();
    let fields = read_record(schema, container, &mut mismatches);
    check_shapes(schema, &fields);
    (fields, mismatches)
}

fn read_record(
    schema: &RecordSchema,
    container: &Container,
    mismatches: &mut Vec<KindMismatch>,
) -> FieldValues {
    let mut fields = FieldValues::new(schema.name);

    for field in schema.fields() {
        match field.kind {
            FieldKind::Record(child) => {
                let nested = read_record(child(), container, mismatches);
                fields.set(field.name, Slot::Record(nested));
            }
            FieldKind::Leaf { element, .. } => {
                let Some(dataset) = container.get(field.name) else {
                    fields.set(field.name, Slot::Leaf(None));
                    continue;
                };

                if dataset.data.kind() != element {
                    let mismatch = KindMismatch {
                        field: field.name,
                        found: dataset.data.kind().native(),
                        declared: element,
                    };
                    log::warn!("{}", mismatch);
                    mismatches.push(mismatch);
                }
                fields.set(field.name, Slot::Leaf(Some(dataset.data.clone().into_value())));
            }
        }
    }
    fields
}

/// Re-checks decoded shapes against the schema. Decoding never fails on a
/// shape: solver output is trusted, so a violation is only logged.
fn check_shapes(schema: &RecordSchema, fields: &FieldValues) {
    let mut siblings = Siblings::new();

    for field in schema.fields() {
        match field.kind {
            FieldKind::Record(child) => {
                if let Some(nested) = fields.get_record(field.name) {
                    check_shapes(child(), nested);
                }
            }
            FieldKind::Leaf { .. } => {
                let Some(value) = fields.get_leaf(field.name) else {
                    continue;
                };
                let shape = canonical_shape(value.shape());
                if !field.admits(&shape, &siblings) {
                    log::warn!(
                        "Decoded '{}' has shape {:?}, expected one of [{}]",
                        field.name,
                        shape,
                        field.describe_shapes()
                    );
                }
                siblings.insert(field.name, value);
            }
        }
    }
}

fn canonical_shape(shape: &[usize]) -> Vec<usize> {
    let mut padded = vec![1; CANONICAL_RANK.saturating_sub(shape.len())];
    padded.extend_from_slice(shape);
    padded
}
