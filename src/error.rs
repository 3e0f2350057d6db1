//! Error types for the segmented-values library
//!
//! All errors use the `thiserror` crate for automatic trait implementations.
//!
//! # Error Hierarchy
//!
//! - **`SegmentedValuesError`** is the top-level error for callers that mix modules
//! - **Module errors** (`CoreError`, `ManifoldError`, `LinAlgError`) are wrapped inside it
//! - **Error sources** are preserved, allowing full error chain inspection
//!
//! Example error chain:
//! ```text
//! SegmentedValuesError::Core(
//!     CoreError::InsufficientCapacity { required: 9, capacity: 6 }
//! )
//! ```

use crate::{core::CoreError, linalg::LinAlgError, manifold::ManifoldError};
use std::error::Error as StdError;
use thiserror::Error;

/// Main result type used throughout the segmented-values library
pub type SegmentedValuesResult<T> = Result<T, SegmentedValuesError>;

/// Main error type for the segmented-values library
///
/// # Error Chain Access
///
/// ```rust,ignore
/// if let Err(e) = run_iteration(&mut variables) {
///     warn!("Full chain: {}", e.chain());
/// }
/// ```
#[derive(Debug, Error)]
pub enum SegmentedValuesError {
    /// Segmented vector and variable errors
    #[error(transparent)]
    Core(#[from] CoreError),

    /// Manifold operation errors
    #[error(transparent)]
    Manifold(#[from] ManifoldError),

    /// Linear algebra errors
    #[error(transparent)]
    LinearAlgebra(#[from] LinAlgError),
}

impl SegmentedValuesError {
    /// Get the full error chain as a string for logging and debugging.
    ///
    /// Each source below the top-level error is printed on its own line, prefixed by an arrow.
    pub fn chain(&self) -> String {
        let mut chain = vec![self.to_string()];
        let mut source = self.source();

        while let Some(err) = source {
            chain.push(format!("  → {}", err));
            source = err.source();
        }

        chain.join("\n")
    }

    /// Get a compact single-line error chain for logging
    pub fn chain_compact(&self) -> String {
        let mut chain = vec![self.to_string()];
        let mut source = self.source();

        while let Some(err) = source {
            chain.push(err.to_string());
            source = err.source();
        }

        chain.join(" → ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let linalg_error = LinAlgError::NotPositiveDefinite { curvature: -1.0 };
        let error = SegmentedValuesError::from(linalg_error);
        assert!(error.to_string().contains("not positive definite"));
    }

    #[test]
    fn test_error_chain() {
        let core_error = CoreError::InsufficientCapacity {
            required: 9,
            capacity: 6,
        };
        let error = SegmentedValuesError::from(core_error);

        let chain = error.chain();
        assert!(chain.contains("capacity"));
        assert!(chain.contains("need 9"));
    }

    #[test]
    fn test_error_chain_compact() {
        let core_error = CoreError::Variable("Invalid variable index".to_string());
        let error = SegmentedValuesError::from(core_error);

        let chain_compact = error.chain_compact();
        assert!(chain_compact.contains("Invalid variable index"));
        assert!(!chain_compact.contains('\n'));
    }

    #[test]
    fn test_result_with_question_mark() {
        fn pack() -> SegmentedValuesResult<usize> {
            let mut v = crate::SegmentedVector::new();
            v.reserve(1, 1);
            let index = v.try_push_preallocated(&[1.0, 2.0])?;
            Ok(index)
        }

        assert!(matches!(
            pack(),
            Err(SegmentedValuesError::Core(CoreError::InsufficientCapacity { .. }))
        ));
    }

    #[test]
    fn test_transparent_error_conversion() {
        let manifold_error = ManifoldError::InvalidTangentDimension {
            expected: 2,
            actual: 3,
        };

        let error: SegmentedValuesError = manifold_error.into();
        match error {
            SegmentedValuesError::Manifold(_) => { /* Expected */ }
            _ => panic!("Expected Manifold variant"),
        }
    }
}
