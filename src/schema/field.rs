//! Field descriptors: the declarative per-field contract (element kind,
//! optionality, admissible shapes) that the encoder and decoder walk.

use std::collections::BTreeMap;
use std::fmt;

use crate::schema::record::RecordSchema;
use crate::schema::shape::{render_patterns, shape_matches, ShapePattern};
use crate::types::{DomainType, ElementKind, Value};

/// Lazily-built schema of a nested record type.
pub type SchemaFn = fn() -> &'static RecordSchema;

/// What a field holds: a leaf entry, or a nested record flattened into the
/// same container namespace.
#[derive(Clone, Copy)]
pub enum FieldKind {
    Leaf {
        element: ElementKind,
        domain: DomainType,
    },
    Record(SchemaFn),
}

impl fmt::Debug for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldKind::Leaf { element, domain } => f
                .debug_struct("Leaf")
                .field("element", element)
                .field("domain", domain)
                .finish(),
            FieldKind::Record(schema) => f.debug_tuple("Record").field(&schema().name).finish(),
        }
    }
}

/// Sibling leaf values visible to a shape condition: the fields of the same
/// record that were already visited in schema order.
#[derive(Debug, Default)]
pub struct Siblings<'a> {
    values: BTreeMap<&'static str, &'a Value>,
}

impl<'a> Siblings<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: &'static str, value: &'a Value) {
        self.values.insert(name, value);
    }

    pub fn get(&self, name: &str) -> Option<&'a Value> {
        self.values.get(name).copied()
    }
}

/// A predicate over sibling values that selects one admissible shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Condition {
    /// The sibling is set, holds a single element, and that element equals `value`.
    Equals { field: &'static str, value: u64 },
}

impl Condition {
    pub fn equals(field: &'static str, value: u64) -> Self {
        Condition::Equals { field, value }
    }

    pub fn holds(&self, siblings: &Siblings<'_>) -> bool {
        match self {
            Condition::Equals { field, value } => {
                siblings.get(field).and_then(Value::scalar_u64) == Some(*value)
            }
        }
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Condition::Equals { field, value } => write!(f, "{field} == {value}"),
        }
    }
}

const SCALAR_ONLY: &[ShapePattern] = &[ShapePattern::SCALAR];

#[derive(Debug, Clone)]
pub struct FieldDescriptor {
    pub name: &'static str,
    pub kind: FieldKind,
    pub optional: bool,
    shapes: Vec<ShapePattern>,
    conditional_shapes: Vec<(Condition, ShapePattern)>,
}

impl FieldDescriptor {
    fn leaf(name: &'static str, element: ElementKind) -> Self {
        Self {
            name,
            kind: FieldKind::Leaf {
                element,
                domain: DomainType::Real,
            },
            optional: false,
            shapes: Vec::new(),
            conditional_shapes: Vec::new(),
        }
    }

    /// A required `long` field with the default `(1, 1, 1)` shape.
    pub fn long(name: &'static str) -> Self {
        Self::leaf(name, ElementKind::Long)
    }

    /// A required `float` field with the default `(1, 1, 1)` shape.
    pub fn float(name: &'static str) -> Self {
        Self::leaf(name, ElementKind::Float)
    }

    /// A nested record. It owns no entry; its leaves sit beside this record's.
    pub fn record(name: &'static str, schema: SchemaFn) -> Self {
        Self {
            name,
            kind: FieldKind::Record(schema),
            optional: false,
            shapes: Vec::new(),
            conditional_shapes: Vec::new(),
        }
    }

    pub fn optional(mut self) -> Self {
        self.optional = true;
        self
    }

    /// Adds an unconditional admissible shape. Declaration order is kept.
    pub fn shape(mut self, pattern: ShapePattern) -> Self {
        self.shapes.push(pattern);
        self
    }

    /// Adds a shape that applies only while `condition` holds.
    pub fn shape_when(mut self, condition: Condition, pattern: ShapePattern) -> Self {
        self.conditional_shapes.push((condition, pattern));
        self
    }

    pub fn element(&self) -> Option<ElementKind> {
        match self.kind {
            FieldKind::Leaf { element, .. } => Some(element),
            FieldKind::Record(_) => None,
        }
    }

    /// Unconditional shapes, defaulting to `(1, 1, 1)` when none were declared.
    pub fn declared_shapes(&self) -> &[ShapePattern] {
        if self.shapes.is_empty() && self.conditional_shapes.is_empty() {
            SCALAR_ONLY
        } else {
            &self.shapes
        }
    }

    pub fn conditional_shapes(&self) -> &[(Condition, ShapePattern)] {
        &self.conditional_shapes
    }

    pub fn is_conditional(&self) -> bool {
        !self.conditional_shapes.is_empty()
    }

    /// Picks the pattern this field is validated against.
    ///
    /// Conditions are evaluated in declaration order and the first that holds
    /// wins. A field without conditions resolves to its first declared shape.
    /// A conditional field whose conditions all fail resolves to `None`.
    pub fn resolve_admissible_shape(&self, siblings: &Siblings<'_>) -> Option<&ShapePattern> {
        if self.is_conditional() {
            self.conditional_shapes
                .iter()
                .find(|(condition, _)| condition.holds(siblings))
                .map(|(_, pattern)| pattern)
        } else {
            self.declared_shapes().first()
        }
    }

    /// Validates a canonical shape against this field's contract.
    ///
    /// Unconditional fields accept any declared shape; conditional fields
    /// accept only the resolved one.
    pub fn admits(&self, shape: &[usize], siblings: &Siblings<'_>) -> bool {
        if self.is_conditional() {
            self.resolve_admissible_shape(siblings)
                .is_some_and(|pattern| shape_matches(shape, pattern))
        } else {
            self.declared_shapes()
                .iter()
                .any(|pattern| shape_matches(shape, pattern))
        }
    }

    /// Human-readable list of admissible patterns for error messages.
    pub fn describe_shapes(&self) -> String {
        if self.is_conditional() {
            self.conditional_shapes
                .iter()
                .map(|(condition, pattern)| format!("{pattern} if {condition}"))
                .collect::<Vec<_>>()
                .join(", ")
        } else {
            render_patterns(self.declared_shapes())
        }
    }

    /// Attributes attached to this field's entry.
    pub fn entry_attributes(&self) -> Vec<(&'static str, &'static str)> {
        match self.kind {
            FieldKind::Leaf { element, domain } => {
                vec![("data_type", element.tag()), ("domain_type", domain.tag())]
            }
            FieldKind::Record(_) => Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn source_input() -> FieldDescriptor {
        FieldDescriptor::float("p_source_input")
            .optional()
            .shape_when(
                Condition::equals("p_source_many", 0),
                ShapePattern::new(1, "Nt_src", 1),
            )
            .shape_when(
                Condition::equals("p_source_many", 1),
                ShapePattern::new(1, "Nt_src", "Nsrc"),
            )
    }

    #[test]
    fn test_unconditional_field_resolves_to_first_declared() {
        let f = FieldDescriptor::float("rho0")
            .shape(ShapePattern::new("Nz", "Ny", "Nx"))
            .shape(ShapePattern::SCALAR);
        let siblings = Siblings::new();
        assert_eq!(
            f.resolve_admissible_shape(&siblings),
            Some(&ShapePattern::new("Nz", "Ny", "Nx"))
        );
        assert!(f.admits(&[1, 1, 1], &siblings));
        assert!(f.admits(&[4, 8, 8], &siblings));
        assert_eq!(f.describe_shapes(), "(Nz, Ny, Nx), (1, 1, 1)");
    }

    #[test]
    fn test_undeclared_shape_defaults_to_scalar() {
        let f = FieldDescriptor::long("Nx");
        assert_eq!(f.declared_shapes(), &[ShapePattern::SCALAR]);
        assert!(f.admits(&[1, 1, 1], &Siblings::new()));
        assert!(!f.admits(&[1, 1, 2], &Siblings::new()));
    }

    #[test]
    fn test_condition_selects_pattern() {
        let f = source_input();
        let one = Value::long(1);
        let mut siblings = Siblings::new();
        siblings.insert("p_source_many", &one);

        assert_eq!(
            f.resolve_admissible_shape(&siblings),
            Some(&ShapePattern::new(1, "Nt_src", "Nsrc"))
        );
        assert!(f.admits(&[1, 100, 4], &siblings));
        assert!(!f.admits(&[4, 100, 1], &siblings));
    }

    #[test]
    fn test_no_condition_holding_admits_nothing() {
        let f = source_input();
        let siblings = Siblings::new();
        assert_eq!(f.resolve_admissible_shape(&siblings), None);
        assert!(!f.admits(&[1, 100, 1], &siblings));
        assert!(f.describe_shapes().contains("(1, Nt_src, 1) if p_source_many == 0"));
    }

    #[test]
    fn test_entry_attributes() {
        let attrs = FieldDescriptor::long("Nx").entry_attributes();
        assert_eq!(attrs, vec![("data_type", "long"), ("domain_type", "real")]);
    }
}
