//! Manifold representations for variables updated through tangent-space deltas.
//!
//! An optimizer never adds a step directly to a variable. It hands each variable the slice of
//! the step vector that belongs to it and asks the variable to *retract*, i.e. move along its
//! manifold by that tangent delta. The inverse operation, *local coordinates*, expresses the
//! difference between two values as a tangent vector of the same dimension.
//!
//! Lie group M,° | size | dim | X ∈ M  | T_X M   | Exp(τ)   | Comp.   | Log
//! ------------- | ---- | --- | ------ | ------- | -------- | ------- | -------
//! 2-D point     | R²,+ | 2   | p ∈ R² | v ∈ R²  | p = v    | p₁ + p₂ | v = p
//!
//! The trait layout follows the [manif](https://github.com/artivis/manif) conventions:
//! group operations take optional Jacobian outputs that are only filled when requested.
//!
//! # Retraction law
//!
//! For every implementor and any `p`, `q` of the same type:
//! `p.retract(p.local_coordinates(q).as_slice())` equals `q` up to floating-point tolerance.

use std::ops::Neg;
use std::{
    error, fmt,
    fmt::{Display, Formatter},
};

pub mod point2;

/// Errors that can occur during manifold operations.
#[derive(Debug, Clone, PartialEq)]
pub enum ManifoldError {
    /// Invalid tangent vector dimension
    InvalidTangentDimension { expected: usize, actual: usize },
    /// Normalization failed for manifold element
    NormalizationFailed(String),
    /// NaN or Inf detected in manifold element
    InvalidNumber,
}

impl Display for ManifoldError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            ManifoldError::InvalidTangentDimension { expected, actual } => {
                write!(
                    f,
                    "Invalid tangent dimension: expected {expected}, got {actual}"
                )
            }
            ManifoldError::NormalizationFailed(msg) => {
                write!(f, "Normalization failed: {msg}")
            }
            ManifoldError::InvalidNumber => {
                write!(f, "Invalid number: NaN or Inf detected")
            }
        }
    }
}

impl error::Error for ManifoldError {}

/// Result type for manifold operations.
pub type ManifoldResult<T> = Result<T, ManifoldError>;

/// Core trait for values that live on a Lie group and can be updated by tangent deltas.
///
/// # Dimensions
///
/// `DOF` is the tangent space dimension, i.e. the number of coordinates a variable of this
/// type contributes to a step vector.
pub trait LieGroup: Clone + PartialEq {
    /// The tangent space vector type
    type TangentVector: Tangent<Self>;

    /// The Jacobian matrix type
    type JacobianMatrix: Clone + PartialEq + Neg<Output = Self::JacobianMatrix>;

    /// Degrees of freedom
    const DOF: usize;

    /// Identity element e.
    fn identity() -> Self;

    /// Compute the inverse of this manifold element.
    ///
    /// # Arguments
    /// * `jacobian` - Optional mutable reference to store the Jacobian ∂(g⁻¹)/∂g
    fn inverse(&self, jacobian: Option<&mut Self::JacobianMatrix>) -> Self;

    /// Compose this element with another (group multiplication).
    ///
    /// # Arguments
    /// * `other` - The right operand for composition
    /// * `jacobian_self` - Optional Jacobian ∂(g₁ ∘ g₂)/∂g₁
    /// * `jacobian_other` - Optional Jacobian ∂(g₁ ∘ g₂)/∂g₂
    fn compose(
        &self,
        other: &Self,
        jacobian_self: Option<&mut Self::JacobianMatrix>,
        jacobian_other: Option<&mut Self::JacobianMatrix>,
    ) -> Self;

    /// Compute g₁⁻¹ ∘ g₂ (relative element).
    ///
    /// # Arguments
    /// * `other` - The target element g₂
    /// * `jacobian_self` - Optional Jacobian with respect to g₁
    /// * `jacobian_other` - Optional Jacobian with respect to g₂
    fn between(
        &self,
        other: &Self,
        jacobian_self: Option<&mut Self::JacobianMatrix>,
        jacobian_other: Option<&mut Self::JacobianMatrix>,
    ) -> Self;

    /// Logarithmic map from manifold to tangent space.
    fn log(&self) -> Self::TangentVector;

    /// Check if the element is approximately equal to another element.
    fn is_approx(&self, other: &Self, tolerance: f64) -> bool;

    /// Move along the manifold by `delta`: g ⊞ δ = g ∘ exp(δ).
    ///
    /// # Errors
    /// `ManifoldError::InvalidTangentDimension` if `delta.len() != tangent_dim()`.
    fn try_retract(&self, delta: &[f64]) -> ManifoldResult<Self> {
        let tangent = Self::TangentVector::from_slice(delta)?;
        Ok(self.compose(&tangent.exp(), None, None))
    }

    /// Panicking form of [`LieGroup::try_retract`].
    ///
    /// # Panics
    /// Panics if `delta.len() != tangent_dim()`.
    fn retract(&self, delta: &[f64]) -> Self {
        match self.try_retract(delta) {
            Ok(value) => value,
            Err(err) => panic!("retract: {err}"),
        }
    }

    /// Tangent vector that carries `self` to `other`: log(g₁⁻¹ ∘ g₂).
    fn local_coordinates(&self, other: &Self) -> Self::TangentVector {
        self.between(other, None, None).log()
    }

    /// Get the dimension of the tangent space for this manifold element.
    fn tangent_dim(&self) -> usize {
        Self::DOF
    }
}

/// Tangent space vectors of a Lie group.
///
/// # Type Parameters
///
/// - `Group`: The associated Lie group type
pub trait Tangent<Group: LieGroup>: Clone + PartialEq {
    /// Dimension of the tangent space
    const DIM: usize;

    /// Exponential map to the Lie group.
    fn exp(&self) -> Group;

    /// Coordinates in the flat order used by step vectors.
    fn as_slice(&self) -> &[f64];

    /// Build a tangent vector from flat coordinates.
    ///
    /// # Errors
    /// `ManifoldError::InvalidTangentDimension` when `data.len() != DIM`.
    fn from_slice(data: &[f64]) -> ManifoldResult<Self>;

    /// Zero tangent vector.
    fn zero() -> Self;

    /// Check if the tangent vector is approximately zero.
    fn is_zero(&self, tolerance: f64) -> bool;
}
