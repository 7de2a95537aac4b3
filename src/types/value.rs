//! The dynamic leaf value carried by record fields.
//!
//! A `Value` is an n-dimensional array of rank 0 to 3. Rank 0 is a bare scalar.
//! The element type is whatever the caller supplied (or, after decoding,
//! whatever the container stored); no cast happens until the encoder coerces
//! the value to its field's declared `ElementKind`.

use ndarray::{Array, ArrayD, Dimension, IxDyn};
use num_traits::{AsPrimitive, ToPrimitive};

use crate::types::{ElementKind, NativeKind};

#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    UInt8(ArrayD<u8>),
    Int64(ArrayD<i64>),
    UInt64(ArrayD<u64>),
    Float32(ArrayD<f32>),
    Float64(ArrayD<f64>),
}

/// Applies the same expression to the inner array of every variant.
macro_rules! with_array {
    ($value:expr, $arr:ident => $body:expr) => {
        match $value {
            Value::UInt8($arr) => $body,
            Value::Int64($arr) => $body,
            Value::UInt64($arr) => $body,
            Value::Float32($arr) => $body,
            Value::Float64($arr) => $body,
        }
    };
}

fn cast_array<T, U>(arr: &ArrayD<T>) -> ArrayD<U>
where
    T: AsPrimitive<U>,
    U: Copy + 'static,
{
    arr.mapv(|x| x.as_())
}

impl Value {
    /// A rank-0 `long` value.
    pub fn long(v: u64) -> Self {
        Value::UInt64(ArrayD::from_elem(IxDyn(&[]), v))
    }

    /// A rank-0 `float` value.
    pub fn float(v: f32) -> Self {
        Value::Float32(ArrayD::from_elem(IxDyn(&[]), v))
    }

    pub fn native_kind(&self) -> NativeKind {
        match self {
            Value::UInt8(_) => NativeKind::UInt8,
            Value::Int64(_) => NativeKind::Int64,
            Value::UInt64(_) => NativeKind::UInt64,
            Value::Float32(_) => NativeKind::Float32,
            Value::Float64(_) => NativeKind::Float64,
        }
    }

    pub fn shape(&self) -> &[usize] {
        with_array!(self, a => a.shape())
    }

    pub fn ndim(&self) -> usize {
        with_array!(self, a => a.ndim())
    }

    pub fn len(&self) -> usize {
        with_array!(self, a => a.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns `true` for a bare (rank-0) scalar.
    pub fn is_scalar(&self) -> bool {
        self.ndim() == 0
    }

    /// Converts to the native type of `kind`. Values already of that type are cloned.
    pub fn cast_to(&self, kind: ElementKind) -> Value {
        match kind {
            ElementKind::Long => Value::UInt64(with_array!(self, a => cast_array::<_, u64>(a))),
            ElementKind::Float => Value::Float32(with_array!(self, a => cast_array::<_, f32>(a))),
        }
    }

    /// The single element of a one-element value, as `u64`.
    ///
    /// Returns `None` for multi-element values and for elements that do not
    /// fit (negative or non-finite).
    pub fn scalar_u64(&self) -> Option<u64> {
        if self.len() != 1 {
            return None;
        }
        with_array!(self, a => a.iter().next().and_then(|x| x.to_u64()))
    }

    /// The single element of a one-element value, as `f64`.
    pub fn scalar_f64(&self) -> Option<f64> {
        if self.len() != 1 {
            return None;
        }
        with_array!(self, a => a.iter().next().and_then(|x| x.to_f64()))
    }

    /// All elements in logical (row-major) order, widened to `f64`.
    pub fn to_f64_vec(&self) -> Vec<f64> {
        with_array!(self, a => a.iter().filter_map(|x| x.to_f64()).collect())
    }

    pub fn max_f64(&self) -> Option<f64> {
        self.to_f64_vec().into_iter().reduce(f64::max)
    }

    pub fn min_f64(&self) -> Option<f64> {
        self.to_f64_vec().into_iter().reduce(f64::min)
    }

    pub fn as_u64_array(&self) -> Option<&ArrayD<u64>> {
        match self {
            Value::UInt64(a) => Some(a),
            _ => None,
        }
    }

    pub fn as_f32_array(&self) -> Option<&ArrayD<f32>> {
        match self {
            Value::Float32(a) => Some(a),
            _ => None,
        }
    }
}

macro_rules! impl_value_from {
    ($T:ty, $variant:ident) => {
        impl From<$T> for Value {
            fn from(v: $T) -> Self {
                Value::$variant(ArrayD::from_elem(IxDyn(&[]), v))
            }
        }

        impl<D: Dimension> From<Array<$T, D>> for Value {
            fn from(a: Array<$T, D>) -> Self {
                Value::$variant(a.into_dyn())
            }
        }
    };
}

impl_value_from!(u8, UInt8);
impl_value_from!(i64, Int64);
impl_value_from!(u64, UInt64);
impl_value_from!(f32, Float32);
impl_value_from!(f64, Float64);

impl From<usize> for Value {
    fn from(v: usize) -> Self {
        Value::long(v as u64)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::from(v as i64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{array, Array2};

    #[test]
    fn test_scalar_constructors_are_rank_zero() {
        let v = Value::long(128);
        assert!(v.is_scalar());
        assert_eq!(v.shape(), &[] as &[usize]);
        assert_eq!(v.scalar_u64(), Some(128));
        assert_eq!(Value::float(1.5).scalar_f64(), Some(1.5));
    }

    #[test]
    fn test_cast_to_declared_kind() {
        let v = Value::from(array![1.9f64, 2.0, 3.5]);
        let cast = v.cast_to(ElementKind::Long);
        assert_eq!(cast.native_kind(), NativeKind::UInt64);
        assert_eq!(cast.as_u64_array().unwrap().as_slice().unwrap(), &[1, 2, 3]);

        let mask = Value::from(Array2::<u8>::ones((2, 2)));
        let as_float = mask.cast_to(ElementKind::Float);
        assert_eq!(as_float.shape(), &[2, 2]);
        assert!(as_float.as_f32_array().unwrap().iter().all(|&x| x == 1.0));
    }

    #[test]
    fn test_scalar_accessors_reject_arrays_and_negatives() {
        assert_eq!(Value::from(array![1u64, 2]).scalar_u64(), None);
        assert_eq!(Value::from(-3i64).scalar_u64(), None);
        assert_eq!(Value::from(array![[7u64]]).scalar_u64(), Some(7));
    }

    #[test]
    fn test_min_max() {
        let c = Value::from(array![[1500.0f32, 1800.0], [1400.0, 1600.0]]);
        assert_eq!(c.max_f64(), Some(1800.0));
        assert_eq!(c.min_f64(), Some(1400.0));
    }
}
