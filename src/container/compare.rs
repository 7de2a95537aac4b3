//! Structural equality of two containers, used to validate round-trips.
//!
//! Two containers are equal when they hold the same entry names, and every
//! shared entry has the same shape, numerically close values, and the same
//! attribute keys. Whole-file attributes are not compared: provenance
//! (creation date, user) legitimately differs between otherwise equal files.

use std::collections::BTreeSet;
use std::fmt;
use std::path::Path;

use crate::container::Container;

/// Relative tolerance of the element-wise comparison.
pub const RTOL: f64 = 1e-5;
/// Absolute tolerance of the element-wise comparison.
pub const ATOL: f64 = 1e-8;

/// Why two containers are not equal. This is a diagnostic, never raised as an error.
#[derive(Debug, Clone, PartialEq)]
pub enum ComparisonFailure {
    Unreadable {
        reason: String,
    },
    EntryNamesDiffer {
        only_in_first: Vec<String>,
        only_in_second: Vec<String>,
    },
    ShapesDiffer {
        entry: String,
        first: [usize; 3],
        second: [usize; 3],
    },
    ValuesDiffer {
        entry: String,
    },
    AttributesDiffer {
        entry: String,
        first: Vec<String>,
        second: Vec<String>,
    },
}

impl ComparisonFailure {
    /// The entry the comparison failed on, if the failure is entry-specific.
    pub fn entry(&self) -> Option<&str> {
        match self {
            Self::ShapesDiffer { entry, .. }
            | Self::ValuesDiffer { entry }
            | Self::AttributesDiffer { entry, .. } => Some(entry),
            Self::Unreadable { .. } | Self::EntryNamesDiffer { .. } => None,
        }
    }
}

impl fmt::Display for ComparisonFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unreadable { reason } => write!(f, "An error occurred: {reason}"),
            Self::EntryNamesDiffer {
                only_in_first,
                only_in_second,
            } => write!(
                f,
                "Keys in the two files are not the same. Only in first: {only_in_first:?}; only in second: {only_in_second:?}"
            ),
            Self::ShapesDiffer {
                entry,
                first,
                second,
            } => write!(
                f,
                "Data in dataset '{entry}' is different between the two files: shape {first:?} vs {second:?}"
            ),
            Self::ValuesDiffer { entry } => write!(
                f,
                "Data in dataset '{entry}' is different between the two files."
            ),
            Self::AttributesDiffer {
                entry,
                first,
                second,
            } => write!(
                f,
                "Attrs in dataset '{entry}' are different between the two files: {first:?} vs {second:?}"
            ),
        }
    }
}

fn is_close(a: f64, b: f64) -> bool {
    (a - b).abs() <= ATOL + RTOL * b.abs()
}

/// Compares two in-memory containers, stopping at the first difference.
pub fn compare_containers(a: &Container, b: &Container) -> Result<(), ComparisonFailure> {
    let names_a: BTreeSet<&str> = a.dataset_names().collect();
    let names_b: BTreeSet<&str> = b.dataset_names().collect();
    if names_a != names_b {
        return Err(ComparisonFailure::EntryNamesDiffer {
            only_in_first: names_a.difference(&names_b).map(|s| s.to_string()).collect(),
            only_in_second: names_b.difference(&names_a).map(|s| s.to_string()).collect(),
        });
    }

    for (name, first) in a.datasets() {
        let Some(second) = b.get(name) else {
            continue;
        };

        let (shape_a, shape_b) = (first.data.shape(), second.data.shape());
        if shape_a != shape_b {
            return Err(ComparisonFailure::ShapesDiffer {
                entry: name.to_string(),
                first: shape_a,
                second: shape_b,
            });
        }

        let values_a = first.data.to_f64_vec();
        let values_b = second.data.to_f64_vec();
        if !values_a.iter().zip(values_b.iter()).all(|(&x, &y)| is_close(x, y)) {
            return Err(ComparisonFailure::ValuesDiffer {
                entry: name.to_string(),
            });
        }

        let attrs_a: Vec<String> = first.attrs.keys().cloned().collect();
        let attrs_b: Vec<String> = second.attrs.keys().cloned().collect();
        if attrs_a != attrs_b {
            return Err(ComparisonFailure::AttributesDiffer {
                entry: name.to_string(),
                first: attrs_a,
                second: attrs_b,
            });
        }
    }

    Ok(())
}

/// Opens and compares two container files. A file that cannot be opened
/// makes the comparison fail rather than erroring.
pub fn compare_files(a: impl AsRef<Path>, b: impl AsRef<Path>) -> Result<(), ComparisonFailure> {
    let open = |p: &Path| {
        Container::open(p).map_err(|e| ComparisonFailure::Unreadable {
            reason: e.to_string(),
        })
    };
    let first = open(a.as_ref())?;
    let second = open(b.as_ref())?;
    compare_containers(&first, &second)
}

/// Boolean form of `compare_files`, logging the reason for inequality.
/// Safe to use directly in assertions.
pub fn containers_equal(a: impl AsRef<Path>, b: impl AsRef<Path>) -> bool {
    match compare_files(a, b) {
        Ok(()) => true,
        Err(failure) => {
            log::warn!("{}", failure);
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::container::{Dataset, DatasetData};
    use ndarray::Array3;

    fn float_entry(values: &[f32]) -> Dataset {
        Dataset::new(DatasetData::Float(
            Array3::from_shape_vec((1, 1, values.len()), values.to_vec()).unwrap(),
        ))
        .with_attr("data_type", "float")
        .with_attr("domain_type", "real")
    }

    fn base() -> Container {
        let mut c = Container::new();
        c.insert("c0", float_entry(&[1500.0, 1500.0]));
        c.insert("rho0", float_entry(&[1000.0, 1000.0]));
        c
    }

    #[test]
    fn test_identical_and_nearly_identical_containers_are_equal() {
        assert_eq!(compare_containers(&base(), &base()), Ok(()));

        let mut close = base();
        close.insert("c0", float_entry(&[1500.001, 1500.0]));
        assert_eq!(compare_containers(&base(), &close), Ok(()));
    }

    #[test]
    fn test_value_difference_names_the_entry() {
        let mut other = base();
        other.insert("rho0", float_entry(&[1000.0, 1200.0]));
        let failure = compare_containers(&base(), &other).unwrap_err();
        assert_eq!(failure.entry(), Some("rho0"));
        assert!(failure.to_string().contains("rho0"));
    }

    #[test]
    fn test_name_shape_and_attribute_differences() {
        let mut extra = base();
        extra.insert("BonA", float_entry(&[6.0]));
        assert!(matches!(
            compare_containers(&base(), &extra),
            Err(ComparisonFailure::EntryNamesDiffer { only_in_second, .. }) if only_in_second == vec!["BonA".to_string()]
        ));

        let mut reshaped = base();
        reshaped.insert("c0", float_entry(&[1500.0, 1500.0, 1500.0]));
        assert!(matches!(
            compare_containers(&base(), &reshaped),
            Err(ComparisonFailure::ShapesDiffer { .. })
        ));

        let mut bare = base();
        bare.insert(
            "c0",
            Dataset::new(float_entry(&[1500.0, 1500.0]).data),
        );
        assert!(matches!(
            compare_containers(&base(), &bare),
            Err(ComparisonFailure::AttributesDiffer { .. })
        ));
    }

    #[test]
    fn test_file_comparison_fails_closed() {
        let dir = tempfile::tempdir().unwrap();
        let a = dir.path().join("a.h5");
        let b = dir.path().join("b.h5");
        base().save(&a).unwrap();
        base().save(&b).unwrap();
        assert!(containers_equal(&a, &b));

        std::fs::write(&b, b"garbage").unwrap();
        assert!(!containers_equal(&a, &b));
        assert!(!containers_equal(&a, dir.path().join("missing.h5")));
    }
}
