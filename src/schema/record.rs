//! Record schemas, the schema-shaped value tree, and the `Record` trait that
//! ties a Rust struct to its schema table.

use std::collections::{BTreeMap, BTreeSet};

use crate::error::KwaveError;
use crate::schema::field::{FieldDescriptor, FieldKind};
use crate::types::Value;

/// An ordered field table for one record type, built once per type.
#[derive(Debug, Clone)]
pub struct RecordSchema {
    pub name: &'static str,
    fields: Vec<FieldDescriptor>,
}

impl RecordSchema {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            fields: Vec::new(),
        }
    }

    pub fn field(mut self, field: FieldDescriptor) -> Self {
        self.fields.push(field);
        self
    }

    /// Fields in declaration order. Encode and decode visit them in this order.
    pub fn fields(&self) -> &[FieldDescriptor] {
        &self.fields
    }

    pub fn get(&self, name: &str) -> Option<&FieldDescriptor> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Entry names this schema produces once nested records are flattened,
    /// in visiting order.
    pub fn flattened_names(&self) -> Vec<&'static str> {
        let mut names = Vec::new();
        for field in &self.fields {
            match field.kind {
                FieldKind::Leaf { .. } => names.push(field.name),
                FieldKind::Record(schema) => names.extend(schema().flattened_names()),
            }
        }
        names
    }

    /// Entry names produced by more than one leaf.
    ///
    /// Nested records share one flat namespace, so a name declared twice makes
    /// the later entry overwrite the earlier one.
    pub fn colliding_names(&self) -> BTreeSet<&'static str> {
        let mut seen = BTreeSet::new();
        self.flattened_names()
            .into_iter()
            .filter(|name| !seen.insert(*name))
            .collect()
    }
}

/// The value held by one field of a `FieldValues` tree.
#[derive(Debug, Clone, PartialEq)]
pub enum Slot {
    Leaf(Option<Value>),
    Record(FieldValues),
}

/// The field values of one record, keyed by field name, with nested records
/// as subtrees. This is what the codec reads and produces; records convert
/// to and from it.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldValues {
    record: &'static str,
    slots: BTreeMap<&'static str, Slot>,
}

impl FieldValues {
    pub fn new(record: &'static str) -> Self {
        Self {
            record,
            slots: BTreeMap::new(),
        }
    }

    pub fn record_name(&self) -> &'static str {
        self.record
    }

    pub fn leaf(mut self, name: &'static str, value: impl Into<Value>) -> Self {
        self.slots.insert(name, Slot::Leaf(Some(value.into())));
        self
    }

    pub fn leaf_opt(mut self, name: &'static str, value: Option<Value>) -> Self {
        self.slots.insert(name, Slot::Leaf(value));
        self
    }

    pub fn nested(mut self, name: &'static str, fields: FieldValues) -> Self {
        self.slots.insert(name, Slot::Record(fields));
        self
    }

    pub fn set(&mut self, name: &'static str, slot: Slot) {
        self.slots.insert(name, slot);
    }

    pub fn get_leaf(&self, name: &str) -> Option<&Value> {
        match self.slots.get(name) {
            Some(Slot::Leaf(value)) => value.as_ref(),
            _ => None,
        }
    }

    pub fn get_record(&self, name: &str) -> Option<&FieldValues> {
        match self.slots.get(name) {
            Some(Slot::Record(fields)) => Some(fields),
            _ => None,
        }
    }

    /// Removes a required leaf, failing if it is unset.
    pub fn take_required(&mut self, name: &'static str) -> Result<Value, KwaveError> {
        self.take_optional(name)
            .ok_or(KwaveError::RecordConstruction {
                record: self.record,
                field: name,
            })
    }

    pub fn take_optional(&mut self, name: &str) -> Option<Value> {
        match self.slots.remove(name) {
            Some(Slot::Leaf(value)) => value,
            _ => None,
        }
    }

    /// True when no leaf of this tree, nested ones included, holds a value.
    pub fn is_unset(&self) -> bool {
        self.slots.values().all(|slot| match slot {
            Slot::Leaf(value) => value.is_none(),
            Slot::Record(fields) => fields.is_unset(),
        })
    }

    /// Removes a nested subtree and builds the record it describes.
    pub fn take_record<R: Record>(&mut self, name: &'static str) -> Result<R, KwaveError> {
        match self.slots.remove(name) {
            Some(Slot::Record(fields)) => R::from_fields(fields),
            _ => Err(KwaveError::RecordConstruction {
                record: self.record,
                field: name,
            }),
        }
    }

    /// Like `take_record`, for an optional nested record. A missing or
    /// entirely unset subtree is `None`.
    pub fn take_optional_record<R: Record>(
        &mut self,
        name: &'static str,
    ) -> Result<Option<R>, KwaveError> {
        match self.slots.remove(name) {
            Some(Slot::Record(fields)) if !fields.is_unset() => R::from_fields(fields).map(Some),
            _ => Ok(None),
        }
    }
}

/// A record type with a declared schema.
///
/// Implementors describe their fields once in `schema()` and convert to and
/// from the schema-shaped `FieldValues` tree. The codec never inspects the
/// struct itself.
pub trait Record: Sized {
    fn schema() -> &'static RecordSchema;

    fn to_fields(&self) -> FieldValues;

    /// Builds the record from decoded values. Fails with
    /// `KwaveError::RecordConstruction` when a required field is unset.
    fn from_fields(fields: FieldValues) -> Result<Self, KwaveError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::OnceLock;

    fn inner() -> &'static RecordSchema {
        static SCHEMA: OnceLock<RecordSchema> = OnceLock::new();
        SCHEMA.get_or_init(|| {
            RecordSchema::new("Inner")
                .field(FieldDescriptor::long("a"))
                .field(FieldDescriptor::float("shared"))
        })
    }

    #[test]
    fn test_flattened_names_and_collisions() {
        let outer = RecordSchema::new("Outer")
            .field(FieldDescriptor::float("shared"))
            .field(FieldDescriptor::record("inner", inner))
            .field(FieldDescriptor::long("z"));

        assert_eq!(outer.flattened_names(), vec!["shared", "a", "shared", "z"]);
        assert_eq!(
            outer.colliding_names().into_iter().collect::<Vec<_>>(),
            vec!["shared"]
        );
    }

    #[test]
    fn test_take_required_reports_record_and_field() {
        let mut fields = FieldValues::new("Grid").leaf_opt("dy", None);
        let err = fields.take_required("Nx").unwrap_err();
        assert!(matches!(
            err,
            KwaveError::RecordConstruction { record: "Grid", field: "Nx" }
        ));
        assert_eq!(fields.take_optional("dy"), None);
    }

    #[test]
    fn test_unset_subtree_is_an_absent_optional_record() {
        let mut parent = FieldValues::new("Outer")
            .nested("inner", FieldValues::new("Inner").leaf_opt("a", None));
        assert!(parent.get_record("inner").unwrap().is_unset());
        assert_eq!(parent.take_optional_record::<Unit>("inner").unwrap(), None);
        assert_eq!(parent.take_optional_record::<Unit>("absent").unwrap(), None);
    }

    #[derive(Debug, PartialEq)]
    struct Unit;

    impl Record for Unit {
        fn schema() -> &'static RecordSchema {
            inner()
        }

        fn to_fields(&self) -> FieldValues {
            FieldValues::new("Inner")
        }

        fn from_fields(_fields: FieldValues) -> Result<Self, KwaveError> {
            Ok(Unit)
        }
    }
}
