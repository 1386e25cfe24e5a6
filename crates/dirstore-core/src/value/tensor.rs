//! Homogeneous n-dimensional numeric arrays.
//!
//! A [`Tensor`] is the in-memory form of the `array` data-kind. On disk it
//! becomes a single-column table: the column label carries the JSON-encoded
//! shape and the rows carry the elements flattened in row-major order. That
//! encoding (and its inverse) lives in the namespace module; this type only
//! owns the data and its dtype class.

use ndarray::ArrayD;

/// A homogeneous n-dimensional numeric array of either float or integer
/// dtype class.
///
/// The dtype class survives a store/load round-trip: a `Float64` tensor
/// comes back as `Float64` and an `Int64` tensor as `Int64`.
#[derive(Debug, Clone, PartialEq)]
pub enum Tensor {
    /// 64-bit floating point elements.
    Float64(ArrayD<f64>),
    /// 64-bit signed integer elements.
    Int64(ArrayD<i64>),
}

impl Tensor {
    /// The shape of the array, outermost dimension first.
    pub fn shape(&self) -> &[usize] {
        match self {
            Tensor::Float64(a) => a.shape(),
            Tensor::Int64(a) => a.shape(),
        }
    }

    /// Number of dimensions (rank). A scalar tensor has rank zero.
    pub fn ndim(&self) -> usize {
        match self {
            Tensor::Float64(a) => a.ndim(),
            Tensor::Int64(a) => a.ndim(),
        }
    }

    /// Total number of elements.
    pub fn len(&self) -> usize {
        match self {
            Tensor::Float64(a) => a.len(),
            Tensor::Int64(a) => a.len(),
        }
    }

    /// Whether the tensor holds no elements.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl From<ArrayD<f64>> for Tensor {
    fn from(a: ArrayD<f64>) -> Self {
        Tensor::Float64(a)
    }
}

impl From<ArrayD<i64>> for Tensor {
    fn from(a: ArrayD<i64>) -> Self {
        Tensor::Int64(a)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::IxDyn;

    #[test]
    fn shape_and_len_agree() {
        let t = Tensor::from(
            ArrayD::from_shape_vec(IxDyn(&[2, 3]), (0..6).map(f64::from).collect()).unwrap(),
        );
        assert_eq!(t.shape(), &[2, 3]);
        assert_eq!(t.ndim(), 2);
        assert_eq!(t.len(), 6);
        assert!(!t.is_empty());
    }

    #[test]
    fn rank_zero_tensor_holds_one_element() {
        let t = Tensor::from(ArrayD::from_shape_vec(IxDyn(&[]), vec![7_i64]).unwrap());
        assert_eq!(t.ndim(), 0);
        assert_eq!(t.len(), 1);
    }
}
