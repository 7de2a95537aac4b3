//! Record -> container.

use ndarray::{Array3, ArrayD};
use std::collections::BTreeMap;
use std::path::Path;

use crate::codec::provenance;
use crate::codec::KindMismatch;
use crate::container::{Container, Dataset, DatasetData};
use crate::error::KwaveError;
use crate::schema::{FieldDescriptor, FieldKind, FieldValues, Record, RecordSchema, Siblings};
use crate::types::{ElementKind, Value};

/// Encodes `record` into `container`.
///
/// With `top_level` set, the provenance attributes are written first. Entries
/// are staged and only committed once every field has passed validation, so a
/// failed encode leaves the container's entries untouched.
///
/// Returns the kind mismatches that were cast along the way.
pub fn encode<R: Record>(
    record: &R,
    container: &mut Container,
    top_level: bool,
) -> Result<Vec<KindMismatch>, KwaveError> {
    if top_level {
        provenance::write_input_file_attrs(container);
    }
    encode_fields(R::schema(), &record.to_fields(), container)
}

/// Encodes a record and writes the resulting container to `path`.
pub fn encode_file<R: Record>(
    record: &R,
    path: impl AsRef<Path>,
    compression_level: Option<i32>,
) -> Result<Container, KwaveError> {
    let mut container = Container::new().with_compression(compression_level);
    encode(record, &mut container, true)?;
    container.save(path)?;
    Ok(container)
}

/// Schema-driven core of `encode`, usable without a concrete record type.
pub fn encode_fields(
    schema: &RecordSchema,
    values: &FieldValues,
    container: &mut Container,
) -> Result<Vec<KindMismatch>, KwaveError> {
    let mut staged = Vec::new();
    let mut mismatches = Vec::new();
    stage_record(schema, values, &mut staged, &mut mismatches)?;

    for (name, dataset) in staged {
        container.insert(name, dataset);
    }
    Ok(mismatches)
}

fn stage_record(
    schema: &RecordSchema,
    values: &FieldValues,
    staged: &mut Vec<(&'static str, Dataset)>,
    mismatches: &mut Vec<KindMismatch>,
) -> Result<(), KwaveError> {
    let mut siblings = Siblings::new();

    for field in schema.fields() {
        match field.kind {
            FieldKind::Record(child) => match values.get_record(field.name) {
                Some(nested) => stage_record(child(), nested, staged, mismatches)?,
                None if field.optional => continue,
                None => {
                    return Err(KwaveError::MissingRequiredField {
                        record: schema.name,
                        field: field.name,
                    })
                }
            },
            FieldKind::Leaf { element, .. } => {
                let Some(value) = values.get_leaf(field.name) else {
                    if field.optional {
                        log::debug!("-- {}: unset, skipped", field.name);
                        continue;
                    }
                    return Err(KwaveError::MissingRequiredField {
                        record: schema.name,
                        field: field.name,
                    });
                };

                let data = canonicalize(field, coerce(field, element, value, mismatches))?;
                if !field.admits(&data.shape(), &siblings) {
                    return Err(KwaveError::ShapeMismatch {
                        field: field.name,
                        shape: data.shape().to_vec(),
                        patterns: field.describe_shapes(),
                    });
                }
                log::debug!("-- {}: {} {:?}", field.name, element, data.shape());

                siblings.insert(field.name, value);
                staged.push((field.name, Dataset { data, attrs: entry_attrs(field) }));
            }
        }
    }
    Ok(())
}

/// Casts `value` to the declared kind, recording a mismatch if a cast was needed.
fn coerce(
    field: &FieldDescriptor,
    element: ElementKind,
    value: &Value,
    mismatches: &mut Vec<KindMismatch>,
) -> Value {
    if value.native_kind() == element.native() {
        return value.clone();
    }
    let mismatch = KindMismatch {
        field: field.name,
        found: value.native_kind(),
        declared: element,
    };
    log::warn!("{}. Casting...", mismatch);
    mismatches.push(mismatch);
    value.cast_to(element)
}

/// Left-pads a rank 0..=3 value with unit dimensions to exactly rank 3.
fn canonicalize(field: &FieldDescriptor, value: Value) -> Result<DatasetData, KwaveError> {
    let dim = match *value.shape() {
        [] => (1, 1, 1),
        [n] => (1, 1, n),
        [m, n] => (1, m, n),
        [a, b, c] => (a, b, c),
        _ => {
            return Err(KwaveError::ShapeMismatch {
                field: field.name,
                shape: value.shape().to_vec(),
                patterns: field.describe_shapes(),
            })
        }
    };

    match value {
        Value::UInt64(a) => Ok(DatasetData::Long(to_array3(field, a, dim)?)),
        Value::Float32(a) => Ok(DatasetData::Float(to_array3(field, a, dim)?)),
        // `coerce` only ever hands over the two on-disk kinds.
        other => canonicalize(field, other.cast_to(ElementKind::Float)),
    }
}

fn to_array3<T: Copy>(
    field: &FieldDescriptor,
    arr: ArrayD<T>,
    dim: (usize, usize, usize),
) -> Result<Array3<T>, KwaveError> {
    let shape = arr.shape().to_vec();
    Array3::from_shape_vec(dim, arr.iter().copied().collect()).map_err(|_| {
        KwaveError::ShapeMismatch {
            field: field.name,
            shape,
            patterns: field.describe_shapes(),
        }
    })
}

fn entry_attrs(field: &FieldDescriptor) -> BTreeMap<String, String> {
    field
        .entry_attributes()
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}
