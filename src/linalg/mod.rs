//! Linear algebra over segmented vectors.
//!
//! - `blas`: level-1 primitives (`dot`, `scal`, `axpy`)
//! - `conjugate_gradient`: iterative solver for symmetric positive-definite operators

pub mod blas;
pub mod conjugate_gradient;

use thiserror::Error;
use tracing::error;

pub use conjugate_gradient::{
    CgStatus, ConjugateGradient, ConjugateGradientConfig, ConjugateGradientSummary,
    LinearOperator,
};

/// Linear algebra specific error types
#[derive(Debug, Clone, PartialEq, Error)]
pub enum LinAlgError {
    /// Operands of a linear solve do not share a structure
    #[error("Dimension mismatch: {0}")]
    DimensionMismatch(String),

    /// A search direction with non-positive curvature was found
    #[error("Operator is not positive definite (curvature {curvature:.6e})")]
    NotPositiveDefinite { curvature: f64 },

    /// NaN or Inf appeared during the iteration
    #[error("Numerical instability detected: {0}")]
    NumericalInstability(String),
}

impl LinAlgError {
    /// Log the error with tracing::error and return self for chaining
    ///
    /// # Example
    /// ```ignore
    /// return Err(LinAlgError::NotPositiveDefinite { curvature }.log());
    /// ```
    #[must_use]
    pub fn log(self) -> Self {
        error!("{}", self);
        self
    }

    /// Log the error together with the underlying error that caused it
    ///
    /// # Arguments
    /// * `source_error` - The original error (must implement Debug)
    #[must_use]
    pub fn log_with_source<E: std::fmt::Debug>(self, source_error: E) -> Self {
        error!("{} | Source: {:?}", self, source_error);
        self
    }
}

/// Result type for linear algebra operations
pub type LinAlgResult<T> = Result<T, LinAlgError>;
