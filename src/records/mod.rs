// In: src/records/mod.rs

// ====================================================================================
// The Solver Schema
// ====================================================================================
//
// Concrete record types for the kspaceFirstOrder input and output files.
//
//   SimulationInput  = SimulationFlags + Grid + Medium + Sensor + Source + Pml + KSpace
//   SimulationOutput = SimulationFlagsOutput + Grid + Pml + Sensor + SimulationResults
//
// Nested records own no entry. Every leaf of every nested record lands in one
// flat namespace, so leaf names must be unique across a whole input (or output)
// file; `RecordSchema::colliding_names` is checked for both in the tests.
//
// ====================================================================================

/// The Rust type backing a leaf: `req` fields always hold a value, `opt` ones may be unset.
macro_rules! leaf_type {
    (req) => {
        $crate::types::Value
    };
    (opt) => {
        ::std::option::Option<$crate::types::Value>
    };
}

macro_rules! leaf_descriptor {
    (req, $desc:expr) => {
        $desc
    };
    (opt, $desc:expr) => {
        $desc.optional()
    };
}

macro_rules! put_leaf {
    (req, $fields:expr, $entry:literal, $value:expr) => {
        $fields.leaf($entry, $value.clone())
    };
    (opt, $fields:expr, $entry:literal, $value:expr) => {
        $fields.leaf_opt($entry, $value.clone())
    };
}

macro_rules! take_leaf {
    (req, $fields:ident, $entry:literal) => {
        $fields.take_required($entry)?
    };
    (opt, $fields:ident, $entry:literal) => {
        $fields.take_optional($entry)
    };
}

/// Declares a record made only of leaves, together with its `Record` impl.
///
/// Each field reads `req|opt rust_name: "EntryName" = long|float .shape(..)...`;
/// the trailing builder calls are applied to the `FieldDescriptor` as written.
/// The schema table is built once, on first use.
macro_rules! leaf_record {
    (
        $(#[$meta:meta])*
        pub struct $name:ident as $schema_name:literal {
            $(
                $(#[$field_meta:meta])*
                $req:ident $field:ident : $entry:literal = $ctor:ident
                    $( . $builder:ident ( $($arg:expr),* ) )*
            ),* $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq)]
        pub struct $name {
            $(
                $(#[$field_meta])*
                pub $field: leaf_type!($req),
            )*
        }

        impl $crate::schema::Record for $name {
            fn schema() -> &'static $crate::schema::RecordSchema {
                static SCHEMA: ::std::sync::OnceLock<$crate::schema::RecordSchema> =
                    ::std::sync::OnceLock::new();
                SCHEMA.get_or_init(|| {
                    $crate::schema::RecordSchema::new($schema_name)
                        $(
                            .field(leaf_descriptor!(
                                $req,
                                $crate::schema::FieldDescriptor::$ctor($entry)
                                    $( .$builder($($arg),*) )*
                            ))
                        )*
                })
            }

            fn to_fields(&self) -> $crate::schema::FieldValues {
                let fields = $crate::schema::FieldValues::new($schema_name);
                $( let fields = put_leaf!($req, fields, $entry, self.$field); )*
                fields
            }

            #[allow(unused_mut)]
            fn from_fields(
                mut fields: $crate::schema::FieldValues,
            ) -> Result<Self, $crate::error::KwaveError> {
                Ok(Self {
                    $( $field: take_leaf!($req, fields, $entry), )*
                })
            }
        }
    };
}

pub mod input;
pub mod output;

#[cfg(test)]
mod tests;

pub use input::{
    Grid, KSpaceAndShiftVariables, Medium, Pml, Sensor, SimulationFlags, SimulationInput, Source,
};
pub use output::{SimulationFlagsOutput, SimulationOutput, SimulationResults};
