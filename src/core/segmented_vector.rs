//! Segmented vectors: one flat buffer partitioned into per-variable segments.
//!
//! A [`SegmentedVector`] stores the tangent-space values of every optimization variable in a
//! single contiguous `Vec<f64>`. A second, much smaller `Vec<usize>` holds the start offset of
//! each variable, so the segment of variable `i` is the half-open range
//! `offsets[i]..offsets[i + 1]`.
//!
//! ```text
//! dims     = [2, 3, 2]
//! offsets  = [0, 2, 5, 7]
//! values   = [x0 x0 | x1 x1 x1 | x2 x2 | (reserved capacity ...)]
//! ```
//!
//! # Two-phase construction
//!
//! Inner optimization loops build these vectors every iteration. To keep that loop free of
//! allocations the buffer is grown only by [`SegmentedVector::reserve`]; appending a variable
//! with [`SegmentedVector::push_preallocated`] writes into capacity that already exists and
//! panics when there is not enough of it.
//!
//! ```
//! use segmented_values::SegmentedVector;
//!
//! let mut delta = SegmentedVector::from_dims(&[2, 2]);
//! delta.reserve(3, 6);
//! let index = delta.push_preallocated(&[9.0, 9.0]);
//!
//! assert_eq!(index, 2);
//! assert_eq!(delta.len(), 3);
//! assert_eq!(delta.dim(), 6);
//! assert_eq!(&delta[2], &[9.0, 9.0]);
//! ```
//!
//! # Preconditions
//!
//! Whole-vector arithmetic (`+`, `-`) requires identical offset tables and is checked with
//! `debug_assert!`. `dot` and `axpy` only need matching total dimension. The `checked_*` and
//! `try_*` methods return [`CoreError`] instead of panicking.

use std::fmt::{self, Display, Formatter};
use std::ops::{Add, Index, IndexMut, Neg, Range, Sub};

use faer::{Mat, MatRef};
use nalgebra::DVector;
use tracing::{debug, info};

use crate::DEFAULT_TOLERANCE;
use crate::core::iter::{SegmentCursor, Segments, SegmentsMut};
use crate::core::{CoreError, CoreResult};
use crate::linalg::blas;

/// Flat vector of per-variable segments with O(1) segment access.
///
/// `values.len()` is the allocated capacity; the logical dimension is the last offset.
#[derive(Clone, Debug)]
pub struct SegmentedVector {
    values: Vec<f64>,
    offsets: Vec<usize>,
}

/// Prefix-sum a sequence of dimensions into an offset table starting at zero.
fn prefix_offsets<I: IntoIterator<Item = usize>>(dims: I) -> Vec<usize> {
    let dims = dims.into_iter();
    let mut offsets = Vec::with_capacity(dims.size_hint().0 + 1);
    offsets.push(0);
    let mut start = 0;
    for dim in dims {
        start += dim;
        offsets.push(start);
    }
    offsets
}

/// Coordinate comparison used by [`SegmentedVector::equals`].
///
/// Two NaNs compare equal, a NaN never equals a number.
fn coordinate_matches(a: f64, b: f64, tolerance: f64) -> bool {
    if a.is_nan() || b.is_nan() {
        return a.is_nan() && b.is_nan();
    }
    a == b || (a - b).abs() <= tolerance
}

impl Default for SegmentedVector {
    fn default() -> Self {
        Self::new()
    }
}

impl SegmentedVector {
    /// Create an empty vector with zero variables and zero capacity.
    ///
    /// Call [`reserve`](Self::reserve) before appending variables.
    pub fn new() -> Self {
        Self {
            values: Vec::new(),
            offsets: vec![0],
        }
    }

    /// Create a vector with one segment per entry of `dims`.
    ///
    /// The buffer is allocated to exactly `dims.iter().sum()` entries. Values are zero-filled;
    /// callers are expected to overwrite them through indexed access.
    ///
    /// # Arguments
    /// * `dims` - Dimension of each variable, in variable order
    pub fn from_dims(dims: &[usize]) -> Self {
        Self::from_dims_iter(dims.iter().copied())
    }

    /// Same as [`from_dims`](Self::from_dims) for any iterator of dimensions.
    pub fn from_dims_iter<I: IntoIterator<Item = usize>>(dims: I) -> Self {
        let offsets = prefix_offsets(dims);
        let total = offsets[offsets.len() - 1];
        Self {
            values: vec![0.0; total],
            offsets,
        }
    }

    /// Create `variable_count` segments that all have dimension `dim`.
    pub fn uniform(variable_count: usize, dim: usize) -> Self {
        Self::from_dims_iter(std::iter::repeat_n(dim, variable_count))
    }

    /// Create a vector from its dimensions and a pre-built flat buffer.
    ///
    /// # Errors
    /// Returns `CoreError::DimensionMismatch` if `values.len()` differs from the sum of `dims`.
    pub fn from_values(dims: &[usize], values: Vec<f64>) -> CoreResult<Self> {
        let offsets = prefix_offsets(dims.iter().copied());
        let total = offsets[offsets.len() - 1];
        if values.len() != total {
            return Err(CoreError::DimensionMismatch {
                expected: total,
                actual: values.len(),
            }
            .log());
        }
        Ok(Self { values, offsets })
    }

    /// Create a vector from its dimensions and a nalgebra column vector.
    pub fn from_dvector(dims: &[usize], values: &DVector<f64>) -> CoreResult<Self> {
        Self::from_values(dims, values.as_slice().to_vec())
    }

    /// Create a vector from its dimensions and a faer column (e.g. a solver step).
    ///
    /// # Errors
    /// Returns `CoreError::StructureMismatch` if `column` has more than one column, and
    /// `CoreError::DimensionMismatch` if its length differs from the sum of `dims`.
    pub fn from_faer(dims: &[usize], column: MatRef<'_, f64>) -> CoreResult<Self> {
        if column.ncols() != 1 {
            return Err(CoreError::StructureMismatch(format!(
                "expected a single column, got {} columns",
                column.ncols()
            ))
            .log());
        }
        let values = (0..column.nrows()).map(|i| column[(i, 0)]).collect();
        Self::from_values(dims, values)
    }

    /// Create a vector with the same offsets as `other` and a freshly allocated buffer.
    ///
    /// The values are zero-filled and should be treated as uninitialized scratch space.
    pub fn same_structure(other: &SegmentedVector) -> Self {
        Self {
            values: vec![0.0; other.dim()],
            offsets: other.offsets.clone(),
        }
    }

    /// Reserve space for `variable_count` variables totalling `total_dims` scalars.
    ///
    /// Capacity only ever grows; existing segments and values are left untouched.
    pub fn reserve(&mut self, variable_count: usize, total_dims: usize) {
        if total_dims > self.values.len() {
            debug!(
                "segmented vector capacity {} -> {} ({} variables)",
                self.values.len(),
                total_dims,
                variable_count
            );
            self.values.resize(total_dims, 0.0);
        }
        let wanted_offsets = variable_count + 1;
        self.offsets
            .reserve(wanted_offsets.saturating_sub(self.offsets.len()));
    }

    /// Append a variable whose segment is a copy of `segment`, returning its index.
    ///
    /// # Panics
    /// Panics if the reserved capacity cannot hold the new segment. Call
    /// [`reserve`](Self::reserve) first; the buffer is never reallocated here.
    pub fn push_preallocated(&mut self, segment: &[f64]) -> usize {
        let start = self.dim();
        let end = start + segment.len();
        assert!(
            end <= self.values.len(),
            "push_preallocated needs capacity {end} but only {} is reserved",
            self.values.len()
        );
        self.values[start..end].copy_from_slice(segment);
        self.offsets.push(end);
        self.offsets.len() - 2
    }

    /// Fallible form of [`push_preallocated`](Self::push_preallocated).
    ///
    /// # Errors
    /// Returns `CoreError::InsufficientCapacity` and leaves the vector unchanged when the
    /// reserved capacity is too small.
    pub fn try_push_preallocated(&mut self, segment: &[f64]) -> CoreResult<usize> {
        let required = self.dim() + segment.len();
        if required > self.values.len() {
            return Err(CoreError::InsufficientCapacity {
                required,
                capacity: self.values.len(),
            }
            .log());
        }
        Ok(self.push_preallocated(segment))
    }

    /// Number of variables.
    pub fn len(&self) -> usize {
        self.offsets.len() - 1
    }

    /// True when the vector holds no variables.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Total logical dimension (sum of all segment lengths).
    pub fn dim(&self) -> usize {
        self.offsets[self.offsets.len() - 1]
    }

    /// Allocated buffer size; always at least [`dim`](Self::dim).
    pub fn capacity(&self) -> usize {
        self.values.len()
    }

    /// The offset table, of length `len() + 1`.
    pub fn offsets(&self) -> &[usize] {
        &self.offsets
    }

    /// Dimension of every variable, in index order.
    pub fn dims(&self) -> Vec<usize> {
        self.offsets.windows(2).map(|w| w[1] - w[0]).collect()
    }

    /// Dimension of variable `index`.
    ///
    /// # Panics
    /// Panics if `index >= len()`.
    pub fn segment_dim(&self, index: usize) -> usize {
        self.segment_range(index).len()
    }

    /// Buffer range occupied by variable `index`.
    ///
    /// # Panics
    /// Panics if `index >= len()`.
    pub fn segment_range(&self, index: usize) -> Range<usize> {
        assert!(
            index < self.len(),
            "variable index {index} out of range for {} variables",
            self.len()
        );
        self.offsets[index]..self.offsets[index + 1]
    }

    /// Segment of variable `index`, or `None` when out of range.
    pub fn get(&self, index: usize) -> Option<&[f64]> {
        if index < self.len() {
            Some(&self.values[self.offsets[index]..self.offsets[index + 1]])
        } else {
            None
        }
    }

    /// Mutable segment of variable `index`, or `None` when out of range.
    pub fn get_mut(&mut self, index: usize) -> Option<&mut [f64]> {
        if index < self.len() {
            let range = self.offsets[index]..self.offsets[index + 1];
            Some(&mut self.values[range])
        } else {
            None
        }
    }

    /// Segment of variable `index`.
    ///
    /// # Errors
    /// Returns `CoreError::IndexOutOfRange` when `index >= len()`.
    pub fn try_segment(&self, index: usize) -> CoreResult<&[f64]> {
        self.get(index).ok_or_else(|| {
            CoreError::IndexOutOfRange {
                index,
                len: self.len(),
            }
            .log()
        })
    }

    /// The logical flat range `[0, dim())`.
    pub fn as_slice(&self) -> &[f64] {
        &self.values[..self.dim()]
    }

    /// Mutable view of the logical flat range `[0, dim())`.
    pub fn as_mut_slice(&mut self) -> &mut [f64] {
        let dim = self.dim();
        &mut self.values[..dim]
    }

    /// True when both vectors have identical offset tables.
    pub fn has_same_structure(&self, other: &SegmentedVector) -> bool {
        self.offsets == other.offsets
    }

    /// Overwrite the logical range with zeros. Capacity past `dim()` is untouched.
    pub fn make_zero(&mut self) {
        self.as_mut_slice().fill(0.0);
    }

    /// Inner product over the logical range.
    ///
    /// Only the total dimension has to match, not the segment structure.
    pub fn dot(&self, other: &SegmentedVector) -> f64 {
        debug_assert_eq!(
            self.dim(),
            other.dim(),
            "dot requires vectors of equal dimension"
        );
        blas::dot_slices(self.as_slice(), other.as_slice())
    }

    /// Scale the logical range in place by `alpha`.
    pub fn scal(&mut self, alpha: f64) {
        blas::scal_slice(alpha, self.as_mut_slice());
    }

    /// In-place `self += alpha * x` over the logical range.
    pub fn axpy(&mut self, alpha: f64, x: &SegmentedVector) {
        debug_assert_eq!(
            self.dim(),
            x.dim(),
            "axpy requires vectors of equal dimension"
        );
        blas::axpy_slices(alpha, x.as_slice(), self.as_mut_slice());
    }

    /// Euclidean norm over the logical range.
    pub fn norm(&self) -> f64 {
        blas::norm_slice(self.as_slice())
    }

    /// Element-wise sum that reports a structure mismatch instead of asserting.
    pub fn checked_add(&self, other: &SegmentedVector) -> CoreResult<SegmentedVector> {
        self.check_structure(other, "add")?;
        Ok(self + other)
    }

    /// Element-wise difference that reports a structure mismatch instead of asserting.
    pub fn checked_sub(&self, other: &SegmentedVector) -> CoreResult<SegmentedVector> {
        self.check_structure(other, "subtract")?;
        Ok(self - other)
    }

    fn check_structure(&self, other: &SegmentedVector, operation: &str) -> CoreResult<()> {
        if self.has_same_structure(other) {
            return Ok(());
        }
        Err(CoreError::StructureMismatch(format!(
            "cannot {operation} vectors with offsets {:?} and {:?}",
            self.offsets, other.offsets
        ))
        .log())
    }

    /// Combine the logical ranges element-wise into a new vector shaped like `self`.
    fn zip_map(&self, other: &SegmentedVector, op: impl Fn(f64, f64) -> f64) -> SegmentedVector {
        let mut values: Vec<f64> = self
            .as_slice()
            .iter()
            .zip(other.as_slice())
            .map(|(&a, &b)| op(a, b))
            .collect();
        values.resize(self.dim(), 0.0);
        SegmentedVector {
            values,
            offsets: self.offsets.clone(),
        }
    }

    /// Compare with `other` variable by variable using an absolute tolerance.
    ///
    /// Returns false when the variable counts differ, when a pair of segments differ in length,
    /// or on the first coordinate whose difference exceeds `tolerance`.
    pub fn equals(&self, other: &SegmentedVector, tolerance: f64) -> bool {
        if self.len() != other.len() {
            return false;
        }
        self.iter().zip(other.iter()).all(|(a, b)| {
            a.len() == b.len()
                && a
                    .iter()
                    .zip(b)
                    .all(|(&x, &y)| coordinate_matches(x, y, tolerance))
        })
    }

    /// [`equals`](Self::equals) with [`DEFAULT_TOLERANCE`].
    pub fn approx_eq(&self, other: &SegmentedVector) -> bool {
        self.equals(other, DEFAULT_TOLERANCE)
    }

    /// Iterate over the segments in variable order.
    pub fn iter(&self) -> Segments<'_> {
        Segments::new(&self.values, &self.offsets)
    }

    /// Iterate mutably over the segments in variable order.
    pub fn iter_mut(&mut self) -> SegmentsMut<'_> {
        let dim = self.dim();
        SegmentsMut::new(&mut self.values[..dim], &self.offsets)
    }

    /// Random-access cursor positioned on the first variable.
    pub fn cursor(&self) -> SegmentCursor<'_> {
        SegmentCursor::new(self, 0)
    }

    /// Random-access cursor positioned one past the last variable.
    pub fn cursor_end(&self) -> SegmentCursor<'_> {
        SegmentCursor::new(self, self.len())
    }

    /// Copy the logical range into a nalgebra vector.
    pub fn to_dvector(&self) -> DVector<f64> {
        DVector::from_column_slice(self.as_slice())
    }

    /// Copy the logical range into a faer column.
    pub fn to_faer(&self) -> Mat<f64> {
        let values = self.as_slice();
        Mat::from_fn(values.len(), 1, |i, _| values[i])
    }

    /// Textual dump of every segment, prefixed with `label`.
    pub fn dump(&self, label: &str) -> String {
        LabelledDump {
            vector: self,
            label,
        }
        .to_string()
    }

    /// Emit [`dump`](Self::dump) through `tracing` at INFO level.
    pub fn print(&self, label: &str) {
        info!("{}", self.dump(label));
    }

    fn write_dump<W: fmt::Write>(&self, out: &mut W, label: &str) -> fmt::Result {
        writeln!(out, "{label}: {} elements", self.len())?;
        for (index, segment) in self.iter().enumerate() {
            write!(out, "  {index} [")?;
            for (k, value) in segment.iter().enumerate() {
                if k > 0 {
                    write!(out, ", ")?;
                }
                write!(out, "{value}")?;
            }
            writeln!(out, "]")?;
        }
        Ok(())
    }
}

/// [`Display`] adapter that prints a vector under a caller-chosen label.
struct LabelledDump<'a> {
    vector: &'a SegmentedVector,
    label: &'a str,
}

impl Display for LabelledDump<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        self.vector.write_dump(f, self.label)
    }
}

impl Display for SegmentedVector {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        self.write_dump(f, "SegmentedVector")
    }
}

/// Equal structure and equal logical values; reserved capacity is ignored.
impl PartialEq for SegmentedVector {
    fn eq(&self, other: &Self) -> bool {
        self.offsets == other.offsets && self.as_slice() == other.as_slice()
    }
}

impl Index<usize> for SegmentedVector {
    type Output = [f64];

    fn index(&self, index: usize) -> &[f64] {
        let range = self.segment_range(index);
        &self.values[range]
    }
}

impl IndexMut<usize> for SegmentedVector {
    fn index_mut(&mut self, index: usize) -> &mut [f64] {
        let range = self.segment_range(index);
        &mut self.values[range]
    }
}

impl Add<&SegmentedVector> for &SegmentedVector {
    type Output = SegmentedVector;

    fn add(self, rhs: &SegmentedVector) -> SegmentedVector {
        debug_assert!(
            self.has_same_structure(rhs),
            "segmented vectors must share structure to be added"
        );
        self.zip_map(rhs, |a, b| a + b)
    }
}

impl Add for SegmentedVector {
    type Output = SegmentedVector;

    fn add(mut self, rhs: SegmentedVector) -> SegmentedVector {
        debug_assert!(
            self.has_same_structure(&rhs),
            "segmented vectors must share structure to be added"
        );
        blas::axpy_slices(1.0, rhs.as_slice(), self.as_mut_slice());
        self
    }
}

impl Sub<&SegmentedVector> for &SegmentedVector {
    type Output = SegmentedVector;

    fn sub(self, rhs: &SegmentedVector) -> SegmentedVector {
        debug_assert!(
            self.has_same_structure(rhs),
            "segmented vectors must share structure to be subtracted"
        );
        self.zip_map(rhs, |a, b| a - b)
    }
}

impl Sub for SegmentedVector {
    type Output = SegmentedVector;

    fn sub(mut self, rhs: SegmentedVector) -> SegmentedVector {
        debug_assert!(
            self.has_same_structure(&rhs),
            "segmented vectors must share structure to be subtracted"
        );
        blas::axpy_slices(-1.0, rhs.as_slice(), self.as_mut_slice());
        self
    }
}

impl Neg for SegmentedVector {
    type Output = SegmentedVector;

    fn neg(mut self) -> SegmentedVector {
        self.scal(-1.0);
        self
    }
}

impl Neg for &SegmentedVector {
    type Output = SegmentedVector;

    fn neg(self) -> SegmentedVector {
        -(self.clone())
    }
}

impl<'a> IntoIterator for &'a SegmentedVector {
    type Item = &'a [f64];
    type IntoIter = Segments<'a>;

    fn into_iter(self) -> Segments<'a> {
        self.iter()
    }
}

impl<'a> IntoIterator for &'a mut SegmentedVector {
    type Item = &'a mut [f64];
    type IntoIter = SegmentsMut<'a>;

    fn into_iter(self) -> SegmentsMut<'a> {
        self.iter_mut()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scenario() -> SegmentedVector {
        SegmentedVector::from_values(&[2, 3, 2], vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0])
            .expect("dimensions match")
    }

    #[test]
    fn test_from_dims_structure() {
        let dims = [3, 1, 4, 2];
        let v = SegmentedVector::from_dims(&dims);
        assert_eq!(v.len(), 4);
        assert_eq!(v.dim(), 10);
        assert_eq!(v.capacity(), 10);
        assert_eq!(v.offsets(), &[0, 3, 4, 8, 10]);
        for (i, &d) in dims.iter().enumerate() {
            assert_eq!(v[i].len(), d);
            assert_eq!(v.segment_dim(i), d);
        }
        assert_eq!(v.dims(), dims.to_vec());
    }

    #[test]
    fn test_empty_vector() {
        let v = SegmentedVector::new();
        assert!(v.is_empty());
        assert_eq!(v.dim(), 0);
        assert_eq!(v.capacity(), 0);
        assert_eq!(v.dot(&v), 0.0);
        assert!(v.get(0).is_none());
    }

    #[test]
    fn test_uniform_construction() {
        let v = SegmentedVector::uniform(4, 3);
        assert_eq!(v.len(), 4);
        assert_eq!(v.dim(), 12);
        assert!(v.iter().all(|segment| segment.len() == 3));
    }

    #[test]
    fn test_from_values_scenario() {
        let v = scenario();
        assert_eq!(&v[0], &[1.0, 2.0]);
        assert_eq!(&v[1], &[3.0, 4.0, 5.0]);
        assert_eq!(&v[2], &[6.0, 7.0]);
        assert_eq!(v.dim(), 7);
        assert_eq!(v.dot(&v), 140.0);
    }

    #[test]
    fn test_from_values_length_mismatch() {
        let result = SegmentedVector::from_values(&[2, 2], vec![1.0, 2.0, 3.0]);
        assert_eq!(
            result,
            Err(CoreError::DimensionMismatch {
                expected: 4,
                actual: 3
            })
        );
    }

    #[test]
    fn test_from_dvector_and_back() {
        let flat = DVector::from_vec(vec![1.0, -1.0, 2.0]);
        let v = SegmentedVector::from_dvector(&[1, 2], &flat).expect("dimensions match");
        assert_eq!(&v[1], &[-1.0, 2.0]);
        assert_eq!(v.to_dvector(), flat);
    }

    #[test]
    fn test_faer_interop() {
        let v = scenario();
        let column = v.to_faer();
        assert_eq!(column.nrows(), 7);
        assert_eq!(column.ncols(), 1);
        assert_eq!(column[(4, 0)], 5.0);

        let back = SegmentedVector::from_faer(&[2, 3, 2], column.as_ref()).expect("same size");
        assert_eq!(back, v);

        let wide = Mat::<f64>::zeros(7, 2);
        assert!(matches!(
            SegmentedVector::from_faer(&[2, 3, 2], wide.as_ref()),
            Err(CoreError::StructureMismatch(_))
        ));
    }

    #[test]
    fn test_view_round_trip() {
        let mut v = SegmentedVector::from_dims(&[2, 3]);
        v[1].copy_from_slice(&[7.0, 8.0, 9.0]);
        v[0][1] = -4.0;
        assert_eq!(&v[1], &[7.0, 8.0, 9.0]);
        assert_eq!(v[0][1], -4.0);

        if let Some(segment) = v.get_mut(0) {
            segment[0] = 1.5;
        }
        assert_eq!(v.get(0), Some(&[1.5, -4.0][..]));
    }

    #[test]
    #[should_panic(expected = "out of range")]
    fn test_index_out_of_range_panics() {
        let v = SegmentedVector::from_dims(&[2]);
        let _ = &v[1];
    }

    #[test]
    fn test_try_segment_out_of_range() {
        let v = SegmentedVector::from_dims(&[2]);
        assert!(v.try_segment(0).is_ok());
        assert_eq!(
            v.try_segment(5),
            Err(CoreError::IndexOutOfRange { index: 5, len: 1 })
        );
    }

    #[test]
    fn test_same_structure() {
        let v = scenario();
        let scratch = SegmentedVector::same_structure(&v);
        assert_eq!(scratch.len(), v.len());
        assert_eq!(scratch.dim(), v.dim());
        assert!(scratch.has_same_structure(&v));
    }

    #[test]
    fn test_reserve_then_push_preallocated() {
        let mut v = SegmentedVector::from_dims(&[2, 2]);
        v.reserve(3, 6);
        assert_eq!(v.capacity(), 6);
        assert_eq!(v.len(), 2);
        assert_eq!(v.dim(), 4);

        let index = v.push_preallocated(&[9.0, 9.0]);
        assert_eq!(index, 2);
        assert_eq!(v.len(), 3);
        assert_eq!(v.dim(), 6);
        assert_eq!(&v[2], &[9.0, 9.0]);
    }

    #[test]
    fn test_reserve_never_shrinks() {
        let mut v = scenario();
        v.reserve(1, 2);
        assert_eq!(v.capacity(), 7);
        assert_eq!(v.len(), 3);
        assert_eq!(&v[1], &[3.0, 4.0, 5.0]);

        v.reserve(5, 20);
        assert_eq!(v.capacity(), 20);
        assert_eq!(v.dim(), 7);
        assert_eq!(&v[2], &[6.0, 7.0]);
    }

    #[test]
    fn test_push_into_empty_vector() {
        let mut v = SegmentedVector::new();
        v.reserve(2, 5);
        assert_eq!(v.push_preallocated(&[1.0, 2.0, 3.0]), 0);
        assert_eq!(v.push_preallocated(&[4.0, 5.0]), 1);
        assert_eq!(v.dims(), vec![3, 2]);
        assert_eq!(v.as_slice(), &[1.0, 2.0, 3.0, 4.0, 5.0]);
    }

    #[test]
    #[should_panic(expected = "push_preallocated needs capacity")]
    fn test_push_without_capacity_panics() {
        let mut v = SegmentedVector::from_dims(&[2]);
        v.push_preallocated(&[1.0]);
    }

    #[test]
    fn test_try_push_without_capacity_leaves_vector_unchanged() {
        let mut v = SegmentedVector::from_dims(&[2]);
        v.reserve(2, 3);
        let err = v.try_push_preallocated(&[1.0, 2.0]);
        assert_eq!(
            err,
            Err(CoreError::InsufficientCapacity {
                required: 4,
                capacity: 3
            })
        );
        assert_eq!(v.len(), 1);
        assert_eq!(v.dim(), 2);
        assert_eq!(v.try_push_preallocated(&[1.0]), Ok(1));
    }

    #[test]
    fn test_make_zero_only_touches_logical_range() {
        let mut v = scenario();
        v.reserve(4, 9);
        v.make_zero();
        assert_eq!(v.dot(&v), 0.0);
        assert_eq!(v.capacity(), 9);

        let index = v.push_preallocated(&[3.0, 4.0]);
        assert_eq!(&v[index], &[3.0, 4.0]);
        assert_eq!(v.norm(), 5.0);
    }

    #[test]
    fn test_add_is_element_wise() {
        let a = scenario();
        let mut b = SegmentedVector::same_structure(&a);
        for (i, value) in b.as_mut_slice().iter_mut().enumerate() {
            *value = 10.0 * i as f64;
        }
        let sum = &a + &b;
        for i in 0..a.len() {
            for k in 0..a[i].len() {
                assert_eq!(sum[i][k], a[i][k] + b[i][k]);
            }
        }
        assert_eq!(a.clone() + b.clone(), sum);
    }

    #[test]
    fn test_sub_and_neg() {
        let a = scenario();
        let diff = &a - &a;
        assert_eq!(diff.norm(), 0.0);

        let negated = -&a;
        assert_eq!(&negated[1], &[-3.0, -4.0, -5.0]);
        assert_eq!(a.clone() - negated, &a + &a);
    }

    #[test]
    fn test_add_ignores_reserved_tail() {
        let mut a = SegmentedVector::from_dims(&[1]);
        a[0][0] = 1.0;
        a.reserve(3, 10);
        let b = SegmentedVector::same_structure(&a);
        let sum = a + b;
        assert_eq!(sum.dim(), 1);
        assert_eq!(&sum[0], &[1.0]);
    }

    #[test]
    #[cfg(debug_assertions)]
    #[should_panic(expected = "must share structure")]
    fn test_add_structure_mismatch_panics_in_debug() {
        let a = SegmentedVector::from_dims(&[2, 1]);
        let b = SegmentedVector::from_dims(&[1, 2]);
        let _ = &a + &b;
    }

    #[test]
    fn test_checked_add_reports_structure_mismatch() {
        let a = SegmentedVector::from_dims(&[2, 1]);
        let b = SegmentedVector::from_dims(&[1, 2]);
        assert!(matches!(
            a.checked_add(&b),
            Err(CoreError::StructureMismatch(_))
        ));
        assert!(a.checked_sub(&b).is_err());
        assert!(a.checked_add(&a).is_ok());
    }

    #[test]
    fn test_dot_only_requires_equal_dimension() {
        let a = SegmentedVector::from_values(&[2, 1], vec![1.0, 2.0, 3.0]).expect("valid");
        let b = SegmentedVector::from_values(&[1, 2], vec![4.0, 5.0, 6.0]).expect("valid");
        assert_eq!(a.dot(&b), 32.0);
        assert_eq!(a.dot(&b), b.dot(&a));
    }

    #[test]
    fn test_scal_and_axpy() {
        let x = scenario();
        let mut y = SegmentedVector::same_structure(&x);
        for (i, value) in y.as_mut_slice().iter_mut().enumerate() {
            *value = 1.0 - i as f64;
        }
        let alpha = 0.5;
        let expected: Vec<f64> = x
            .as_slice()
            .iter()
            .zip(y.as_slice())
            .map(|(xi, yi)| yi + alpha * xi)
            .collect();

        y.axpy(alpha, &x);
        for (got, want) in y.as_slice().iter().zip(&expected) {
            assert!((got - want).abs() < 1e-12);
        }

        let mut z = x.clone();
        z.scal(-2.0);
        assert_eq!(&z[2], &[-12.0, -14.0]);
    }

    #[test]
    fn test_equals_with_tolerance() {
        let v = scenario();
        assert!(v.equals(&v, 0.0));
        assert!(v.equals(&v, 1e-3));
        assert!(v.approx_eq(&v.clone()));

        let mut perturbed = v.clone();
        perturbed[1][2] += 1e-3;
        assert!(!v.equals(&perturbed, 1e-4));
        assert!(v.equals(&perturbed, 1e-2));

        let shorter = SegmentedVector::from_values(&[2, 3], vec![1.0, 2.0, 3.0, 4.0, 5.0])
            .expect("valid");
        assert!(!v.equals(&shorter, 1.0));

        let regrouped =
            SegmentedVector::from_values(&[3, 2, 2], vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0])
                .expect("valid");
        assert!(!v.equals(&regrouped, 1.0));
    }

    #[test]
    fn test_equals_handles_nan() {
        let a = SegmentedVector::from_values(&[1], vec![f64::NAN]).expect("valid");
        let b = SegmentedVector::from_values(&[1], vec![0.0]).expect("valid");
        assert!(a.equals(&a.clone(), 1e-9));
        assert!(!a.equals(&b, 1e9));
    }

    #[test]
    fn test_partial_eq_ignores_capacity() {
        let a = scenario();
        let mut b = a.clone();
        b.reserve(10, 100);
        assert_eq!(a, b);
    }

    #[test]
    fn test_dump_lists_every_variable() {
        let v = scenario();
        let text = v.dump("delta");
        assert!(text.starts_with("delta: 3 elements"));
        assert!(text.contains("  1 [3, 4, 5]"));
        assert!(text.contains("  2 [6, 7]"));
        assert!(v.to_string().starts_with("SegmentedVector: 3 elements"));
    }

    #[test]
    fn test_into_iterator_impls() {
        let mut v = scenario();
        for segment in &mut v {
            segment[0] = 0.0;
        }
        let heads: Vec<f64> = (&v).into_iter().map(|segment| segment[0]).collect();
        assert_eq!(heads, vec![0.0, 0.0, 0.0]);
    }
}
