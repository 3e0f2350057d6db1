//! Variables for optimization on manifolds.
//!
//! A `Variable` wraps a value living on a Lie group. An optimizer computes a step as one
//! [`SegmentedVector`] whose i-th segment is the tangent delta for the i-th variable, then
//! applies it through the retraction:
//!
//! ```text
//! x_new = x_old ⊞ δx
//! ```
//!
//! The helpers at the bottom of this module move data between slices of variables and
//! segmented vectors in both directions.
//!
//! # Example
//!
//! ```
//! use segmented_values::core::variable::{Variable, apply_segmented_step, dimensions};
//! use segmented_values::manifold::point2::Point2;
//! use segmented_values::SegmentedVector;
//!
//! let mut points = vec![
//!     Variable::new(Point2::new(0.0, 0.0)),
//!     Variable::new(Point2::new(1.0, 1.0)),
//! ];
//! let mut step = SegmentedVector::from_dims(&dimensions(&points));
//! step[0].copy_from_slice(&[0.5, 0.0]);
//! step[1].copy_from_slice(&[0.0, -1.0]);
//!
//! apply_segmented_step(&mut points, &step).unwrap();
//! assert_eq!(points[0].value, Point2::new(0.5, 0.0));
//! assert_eq!(points[1].value, Point2::new(1.0, 0.0));
//! ```

use std::collections::HashSet;

use tracing::debug;

use crate::core::segmented_vector::SegmentedVector;
use crate::core::{CoreError, CoreResult};
use crate::manifold::{LieGroup, Tangent};

/// Generic Variable struct that uses static dispatch with any manifold type.
///
/// # Type Parameters
/// * `M` - The manifold type that implements the LieGroup trait
#[derive(Clone, Debug)]
pub struct Variable<M: LieGroup> {
    /// The manifold value
    pub value: M,
    /// Tangent coordinates that should remain fixed during optimization
    pub fixed_indices: HashSet<usize>,
}

impl<M: LieGroup> Variable<M> {
    /// Create a new, fully free Variable from a manifold value.
    pub fn new(value: M) -> Self {
        Variable {
            value,
            fixed_indices: HashSet::new(),
        }
    }

    pub fn value(&self) -> &M {
        &self.value
    }

    /// Set the manifold value.
    pub fn set_value(&mut self, value: M) {
        self.value = value;
    }

    /// Get the degrees of freedom (tangent space dimension) of the variable.
    pub fn get_size(&self) -> usize {
        self.value.tangent_dim()
    }

    /// Hold every tangent coordinate constant.
    pub fn fix(&mut self) {
        self.fixed_indices = (0..self.get_size()).collect();
    }

    /// Release every tangent coordinate.
    pub fn unfix(&mut self) {
        self.fixed_indices.clear();
    }

    /// True when no coordinate can move.
    pub fn is_fixed(&self) -> bool {
        (0..self.get_size()).all(|i| self.fixed_indices.contains(&i))
    }

    /// Retract the value by `delta`, with fixed coordinates zeroed first.
    ///
    /// # Panics
    /// Panics if `delta.len() != get_size()`.
    pub fn retract(&self, delta: &[f64]) -> M {
        if self.fixed_indices.is_empty() {
            return self.value.retract(delta);
        }
        self.value.retract(&self.masked(delta))
    }

    fn try_retract(&self, delta: &[f64]) -> CoreResult<M> {
        let result = if self.fixed_indices.is_empty() {
            self.value.try_retract(delta)
        } else {
            self.value.try_retract(&self.masked(delta))
        };
        result.map_err(|e| CoreError::Variable("retraction failed".to_string()).log_with_source(e))
    }

    fn masked(&self, delta: &[f64]) -> Vec<f64> {
        let mut masked = delta.to_vec();
        for &fixed_idx in &self.fixed_indices {
            if let Some(coordinate) = masked.get_mut(fixed_idx) {
                *coordinate = 0.0;
            }
        }
        masked
    }

    /// Tangent vector that carries this variable's value to `other`'s.
    pub fn local_coordinates(&self, other: &Self) -> M::TangentVector {
        self.value.local_coordinates(&other.value)
    }
}

/// Tangent dimension of each variable, in order.
pub fn dimensions<M: LieGroup>(variables: &[Variable<M>]) -> Vec<usize> {
    variables.iter().map(Variable::get_size).collect()
}

/// Apply one step vector to a slice of variables.
///
/// Segment `i` of `step` is the tangent delta for `variables[i]`. The whole step is validated
/// before any variable changes, so on error every variable keeps its value.
///
/// # Returns
/// * Step norm (L2 norm) for convergence checking
///
/// # Errors
/// - `CoreError::DimensionMismatch` if the variable count differs from `step.len()`
/// - `CoreError::Variable` if a segment length differs from its variable's tangent dimension
pub fn apply_segmented_step<M: LieGroup>(
    variables: &mut [Variable<M>],
    step: &SegmentedVector,
) -> CoreResult<f64> {
    check_step(variables, step)?;

    let mut updated = Vec::with_capacity(variables.len());
    for (var, delta) in variables.iter().zip(step.iter()) {
        updated.push(var.try_retract(delta)?);
    }
    for (var, value) in variables.iter_mut().zip(updated) {
        var.set_value(value);
    }

    let step_norm = step.norm();
    debug!(
        "applied step to {} variables, norm {:.6e}",
        variables.len(),
        step_norm
    );
    Ok(step_norm)
}

/// Apply the negated step, reverting a previous [`apply_segmented_step`] on Euclidean
/// variables.
pub fn apply_negative_segmented_step<M: LieGroup>(
    variables: &mut [Variable<M>],
    step: &SegmentedVector,
) -> CoreResult<()> {
    apply_segmented_step(variables, &-step).map(|_| ())
}

/// Pack `from[i].local_coordinates(to[i])` for every `i` into one segmented vector.
///
/// # Errors
/// `CoreError::DimensionMismatch` if the slices have different lengths.
pub fn local_coordinates_between<M: LieGroup>(
    from: &[Variable<M>],
    to: &[Variable<M>],
) -> CoreResult<SegmentedVector> {
    if from.len() != to.len() {
        return Err(CoreError::DimensionMismatch {
            expected: from.len(),
            actual: to.len(),
        }
        .log());
    }

    let total: usize = from.iter().map(Variable::get_size).sum();
    let mut packed = SegmentedVector::new();
    packed.reserve(from.len(), total);
    for (a, b) in from.iter().zip(to) {
        let tangent = a.local_coordinates(b);
        packed.try_push_preallocated(tangent.as_slice())?;
    }
    Ok(packed)
}

fn check_step<M: LieGroup>(variables: &[Variable<M>], step: &SegmentedVector) -> CoreResult<()> {
    if variables.len() != step.len() {
        return Err(CoreError::DimensionMismatch {
            expected: variables.len(),
            actual: step.len(),
        }
        .log());
    }
    for (i, var) in variables.iter().enumerate() {
        let segment_dim = step.segment_dim(i);
        if var.get_size() != segment_dim {
            return Err(CoreError::Variable(format!(
                "variable {i} has tangent dimension {} but its step segment has {segment_dim}",
                var.get_size()
            ))
            .log());
        }
    }
    Ok(())
}
