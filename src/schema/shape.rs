//! Shape patterns: fixed-rank tuples whose positions are either a concrete
//! extent or a symbolic dimension resolved by context (`Nx`, `Nsens`, ...).

use std::fmt;

/// Every entry is stored with exactly this many dimensions.
pub const CANONICAL_RANK: usize = 3;

/// One position of a `ShapePattern`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Dim {
    Fixed(usize),
    Symbol(&'static str),
}

impl From<usize> for Dim {
    fn from(n: usize) -> Self {
        Dim::Fixed(n)
    }
}

/// Lets schema tables write plain integer literals.
///
/// # Panics
/// On a negative extent. Schema tables are built once, from literals, so this
/// is a typo in the table rather than a runtime condition.
impl From<i32> for Dim {
    fn from(n: i32) -> Self {
        match usize::try_from(n) {
            Ok(extent) => Dim::Fixed(extent),
            Err(_) => panic!("shape extent must be non-negative, got {n}"),
        }
    }
}

impl From<&'static str> for Dim {
    fn from(name: &'static str) -> Self {
        Dim::Symbol(name)
    }
}

impl fmt::Display for Dim {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Dim::Fixed(n) => write!(f, "{n}"),
            Dim::Symbol(s) => f.write_str(s),
        }
    }
}

/// A rank-3 shape pattern, e.g. `(1, 1, Nsens)` or `(Nz, Ny, Nx)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ShapePattern(pub [Dim; CANONICAL_RANK]);

impl ShapePattern {
    /// The pattern of a single value, `(1, 1, 1)`.
    pub const SCALAR: ShapePattern = ShapePattern([Dim::Fixed(1); CANONICAL_RANK]);

    pub fn new(d0: impl Into<Dim>, d1: impl Into<Dim>, d2: impl Into<Dim>) -> Self {
        ShapePattern([d0.into(), d1.into(), d2.into()])
    }

    pub fn dims(&self) -> &[Dim; CANONICAL_RANK] {
        &self.0
    }

    /// The symbolic names used by this pattern, in position order.
    pub fn symbols(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.0.iter().filter_map(|d| match d {
            Dim::Symbol(s) => Some(*s),
            Dim::Fixed(_) => None,
        })
    }
}

impl fmt::Display for ShapePattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [a, b, c] = &self.0;
        write!(f, "({a}, {b}, {c})")
    }
}

/// True iff `actual` has the pattern's rank and every fixed position agrees.
///
/// Symbolic positions always match. Agreement of the same symbol across
/// fields is the caller's responsibility and is not checked here.
pub fn shape_matches(actual: &[usize], pattern: &ShapePattern) -> bool {
    actual.len() == pattern.0.len()
        && actual.iter().zip(pattern.0.iter()).all(|(&n, dim)| match dim {
            Dim::Fixed(expected) => n == *expected,
            Dim::Symbol(_) => true,
        })
}

/// Renders a list of patterns for error messages.
pub fn render_patterns<'a>(patterns: impl IntoIterator<Item = &'a ShapePattern>) -> String {
    patterns
        .into_iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_positions_must_agree() {
        let p = ShapePattern::new(1, 6, "Ncubes");
        assert!(shape_matches(&[1, 6, 4], &p));
        assert!(shape_matches(&[1, 6, 1], &p));
        assert!(!shape_matches(&[1, 5, 4], &p));
        assert!(!shape_matches(&[2, 6, 4], &p));
    }

    #[test]
    fn test_rank_must_agree() {
        let p = ShapePattern::new("Nz", "Ny", "Nx");
        assert!(shape_matches(&[3, 4, 5], &p));
        assert!(!shape_matches(&[4, 5], &p));
        assert!(!shape_matches(&[1, 3, 4, 5], &p));
    }

    #[test]
    fn test_scalar_pattern_and_rendering() {
        assert!(shape_matches(&[1, 1, 1], &ShapePattern::SCALAR));
        assert!(!shape_matches(&[1, 1, 2], &ShapePattern::SCALAR));
        let pats = [ShapePattern::new(1, "Nt_src", 1), ShapePattern::SCALAR];
        assert_eq!(render_patterns(&pats), "(1, Nt_src, 1), (1, 1, 1)");
        assert_eq!(pats[0].symbols().collect::<Vec<_>>(), vec!["Nt_src"]);
    }

    #[test]
    fn test_integer_literals_become_fixed_extents() {
        assert_eq!(Dim::from(6), Dim::Fixed(6));
        assert_eq!(Dim::from(0), Dim::Fixed(0));
    }

    #[test]
    #[should_panic(expected = "non-negative")]
    fn test_negative_extent_is_rejected() {
        let _ = ShapePattern::new(1, -6, "Ncubes");
    }
}
