//! BLAS level-1 primitives over segmented vectors.
//!
//! The free functions mirror the classic `dot` / `scal` / `axpy` signatures so iterative
//! solvers read like their textbook form. The slice kernels underneath run on nalgebra
//! vector views of the logical range; reserved capacity is never read or written.

use nalgebra::{DVectorView, DVectorViewMut};

use crate::core::segmented_vector::SegmentedVector;

/// xᵀy over the logical ranges. Requires `x.dim() == y.dim()`.
pub fn dot(x: &SegmentedVector, y: &SegmentedVector) -> f64 {
    x.dot(y)
}

/// x ← αx
pub fn scal(alpha: f64, x: &mut SegmentedVector) {
    x.scal(alpha);
}

/// y ← αx + y. Requires `x.dim() == y.dim()`.
pub fn axpy(alpha: f64, x: &SegmentedVector, y: &mut SegmentedVector) {
    y.axpy(alpha, x);
}

pub(crate) fn dot_slices(x: &[f64], y: &[f64]) -> f64 {
    let n = x.len().min(y.len());
    let x = DVectorView::from_slice(&x[..n], n);
    let y = DVectorView::from_slice(&y[..n], n);
    x.dot(&y)
}

pub(crate) fn scal_slice(alpha: f64, x: &mut [f64]) {
    let n = x.len();
    let mut x = DVectorViewMut::from_slice(x, n);
    x *= alpha;
}

pub(crate) fn axpy_slices(alpha: f64, x: &[f64], y: &mut [f64]) {
    let n = x.len().min(y.len());
    let x = DVectorView::from_slice(&x[..n], n);
    let mut y = DVectorViewMut::from_slice(&mut y[..n], n);
    y.axpy(alpha, &x, 1.0);
}

pub(crate) fn norm_slice(x: &[f64]) -> f64 {
    DVectorView::from_slice(x, x.len()).norm()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slice_kernels() {
        assert_eq!(dot_slices(&[1.0, 2.0, 3.0], &[4.0, 5.0, 6.0]), 32.0);
        assert_eq!(dot_slices(&[], &[]), 0.0);

        let mut x = [1.0, -2.0];
        scal_slice(3.0, &mut x);
        assert_eq!(x, [3.0, -6.0]);

        let mut y = [1.0, 1.0];
        axpy_slices(2.0, &[0.5, -1.0], &mut y);
        assert_eq!(y, [2.0, -1.0]);

        assert_eq!(norm_slice(&[3.0, 4.0]), 5.0);
    }

    #[test]
    fn test_free_functions_match_methods() {
        let x = SegmentedVector::from_values(&[1, 2], vec![1.0, 2.0, 3.0]).expect("valid");
        let mut y = SegmentedVector::from_values(&[2, 1], vec![1.0, 1.0, 1.0]).expect("valid");

        assert_eq!(dot(&x, &y), x.dot(&y));
        assert_eq!(dot(&x, &y), dot(&y, &x));

        axpy(-1.0, &x, &mut y);
        assert_eq!(y.as_slice(), &[0.0, -1.0, -2.0]);

        scal(0.5, &mut y);
        assert_eq!(y.as_slice(), &[0.0, -0.5, -1.0]);
    }
}
