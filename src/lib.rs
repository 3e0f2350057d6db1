//! # Segmented Values
//!
//! Storage for the tangent-space deltas of a nonlinear optimizer. Every variable in a problem
//! owns a short run of coordinates; a [`SegmentedVector`] keeps all of them in one contiguous
//! buffer and indexes them by variable with an offset table.
//!
//! ## Features
//!
//! - **Flat storage**: one `Vec<f64>` for values and one `Vec<usize>` for segment offsets
//! - **Allocation-free appends**: `reserve` once, then `push_preallocated` inside the loop
//! - **Level-1 algebra**: `dot`, `scal`, `axpy`, `norm`, `+`, `-`, negation
//! - **Manifold variables**: the [`LieGroup`](manifold::LieGroup) retraction contract and
//!   [`Point2`] as its reference implementation
//! - **Conjugate gradient**: an SPD solver whose iterates are segmented vectors
//!
//! ## Example
//!
//! ```
//! use segmented_values::SegmentedVector;
//!
//! let mut delta = SegmentedVector::from_dims(&[2, 3]);
//! delta[0].copy_from_slice(&[1.0, 2.0]);
//! delta[1].copy_from_slice(&[3.0, 4.0, 5.0]);
//!
//! let doubled = &delta + &delta;
//! assert_eq!(&doubled[1], &[6.0, 8.0, 10.0]);
//! assert_eq!(delta.dot(&delta), 55.0);
//! ```

pub mod core;
pub mod error;
pub mod linalg;
#[cfg(feature = "logging")]
pub mod logger;
pub mod manifold;

/// Default tolerance for `approx_eq` comparisons.
pub const DEFAULT_TOLERANCE: f64 = 1e-9;

// Re-export core types
pub use core::segmented_vector::SegmentedVector;
pub use core::variable::Variable;
pub use core::{CoreError, CoreResult};
pub use error::{SegmentedValuesError, SegmentedValuesResult};

pub use linalg::{
    ConjugateGradient, ConjugateGradientConfig, ConjugateGradientSummary, LinAlgError,
    LinearOperator,
};
#[cfg(feature = "logging")]
pub use logger::{init_logger, init_logger_with_level, try_init_logger};
pub use manifold::point2::Point2;
pub use manifold::{LieGroup, ManifoldError, Tangent};
