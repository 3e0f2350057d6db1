//! Core storage components for the segmented-values library
//!
//! This module contains the building blocks that an optimizer uses to hold per-variable
//! tangent vectors:
//! - The segmented vector container (one flat buffer, one offset index)
//! - Iterators and cursors over its per-variable segments
//! - Variables living on manifolds and the helpers that move deltas between them and
//!   segmented vectors

pub mod iter;
pub mod segmented_vector;
pub mod variable;

use thiserror::Error;
use tracing::error;

/// Core module error types for segmented vectors and variables
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoreError {
    /// Flat buffer length or variable count disagrees with the structure
    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    /// Variable index past the end of the segment index
    #[error("Variable index {index} out of range for {len} variables")]
    IndexOutOfRange { index: usize, len: usize },

    /// Append attempted without enough reserved capacity
    #[error("Insufficient reserved capacity: need {required}, have {capacity}")]
    InsufficientCapacity { required: usize, capacity: usize },

    /// Arithmetic between vectors with different offset tables
    #[error("Structure mismatch: {0}")]
    StructureMismatch(String),

    /// Variable update or packing error
    #[error("Variable error: {0}")]
    Variable(String),
}

impl CoreError {
    /// Log the error with tracing::error and return self for chaining
    ///
    /// # Example
    /// ```ignore
    /// return Err(CoreError::StructureMismatch("offsets differ".to_string()).log());
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

/// Result type for core module operations
pub type CoreResult<T> = Result<T, CoreError>;
