//! Conjugate gradient solver over segmented vectors.
//!
//! Solves `A x = b` for a symmetric positive-definite operator `A` supplied by the caller.
//! Every scratch vector is derived from `b` with [`SegmentedVector::same_structure`], so all
//! arithmetic inside the loop runs between structurally identical vectors and the loop does
//! not allocate.
//!
//! # Example
//!
//! ```
//! use faer::Mat;
//! use segmented_values::SegmentedVector;
//! use segmented_values::linalg::ConjugateGradient;
//!
//! let mut a = Mat::<f64>::zeros(3, 3);
//! a[(0, 0)] = 4.0;
//! a[(1, 1)] = 2.0;
//! a[(2, 2)] = 1.0;
//! a[(1, 2)] = 0.5;
//! a[(2, 1)] = 0.5;
//!
//! let b = SegmentedVector::from_values(&[1, 2], vec![4.0, 2.5, 1.5]).unwrap();
//! let summary = ConjugateGradient::new().solve(&a, &b, None).unwrap();
//!
//! assert!(summary.status.is_converged());
//! assert!((summary.solution[0][0] - 1.0).abs() < 1e-8);
//! ```

use std::fmt::{self, Display, Formatter};

use faer::Mat;
use tracing::{debug, info, warn};
use web_time as time;

use crate::core::segmented_vector::SegmentedVector;
use crate::linalg::{LinAlgError, LinAlgResult};

/// A linear map between segmented vectors of the same structure.
pub trait LinearOperator {
    /// Write `A x` into `out`. `out` has the same structure as `x`.
    fn apply(&self, x: &SegmentedVector, out: &mut SegmentedVector);

    /// `(rows, cols)` when the operator has a fixed size, `None` when it adapts to its input.
    fn shape(&self) -> Option<(usize, usize)> {
        None
    }
}

/// Dense operator whose rows and columns follow the flat variable order.
impl LinearOperator for Mat<f64> {
    fn apply(&self, x: &SegmentedVector, out: &mut SegmentedVector) {
        let input = x.as_slice();
        let column = Mat::from_fn(input.len(), 1, |i, _| input[i]);
        let product = self * &column;
        for (i, value) in out.as_mut_slice().iter_mut().enumerate() {
            *value = product[(i, 0)];
        }
    }

    fn shape(&self) -> Option<(usize, usize)> {
        Some((self.nrows(), self.ncols()))
    }
}

/// Configuration parameters for the conjugate gradient solver.
#[derive(Clone, Debug)]
pub struct ConjugateGradientConfig {
    /// Maximum number of iterations
    pub max_iterations: usize,
    /// Stop once ‖r‖ ≤ relative_tolerance · ‖b‖
    pub relative_tolerance: f64,
    /// Floor on the stopping threshold, used when ‖b‖ is tiny
    pub absolute_tolerance: f64,
    /// Timeout duration
    pub timeout: Option<time::Duration>,
}

impl Default for ConjugateGradientConfig {
    fn default() -> Self {
        Self {
            max_iterations: 100,
            relative_tolerance: 1e-9,
            absolute_tolerance: 1e-12,
            timeout: None,
        }
    }
}

impl ConjugateGradientConfig {
    /// Create a configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the maximum number of iterations
    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    /// Set the relative residual tolerance
    pub fn with_relative_tolerance(mut self, relative_tolerance: f64) -> Self {
        self.relative_tolerance = relative_tolerance;
        self
    }

    /// Set the absolute residual tolerance
    pub fn with_absolute_tolerance(mut self, absolute_tolerance: f64) -> Self {
        self.absolute_tolerance = absolute_tolerance;
        self
    }

    /// Set the timeout duration
    pub fn with_timeout(mut self, timeout: time::Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

/// Why the solver stopped.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CgStatus {
    /// Residual fell below the configured threshold
    Converged,
    /// Iteration budget exhausted
    MaxIterationsReached,
    /// Timeout reached
    Timeout,
}

impl CgStatus {
    pub fn is_converged(&self) -> bool {
        matches!(self, CgStatus::Converged)
    }
}

impl Display for CgStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            CgStatus::Converged => write!(f, "Converged"),
            CgStatus::MaxIterationsReached => write!(f, "Maximum iterations reached"),
            CgStatus::Timeout => write!(f, "Timeout"),
        }
    }
}

/// Result of a conjugate gradient solve.
#[derive(Clone, Debug)]
pub struct ConjugateGradientSummary {
    /// Final iterate, with the structure of the right-hand side
    pub solution: SegmentedVector,
    /// Number of iterations performed
    pub iterations: usize,
    /// ‖b - A x‖ tracked by the recurrence
    pub residual_norm: f64,
    /// Termination reason
    pub status: CgStatus,
    /// Total time elapsed
    pub elapsed_time: time::Duration,
}

impl Display for ConjugateGradientSummary {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} after {} iterations, residual norm {:.3e}, {:.3} ms",
            self.status,
            self.iterations,
            self.residual_norm,
            self.elapsed_time.as_secs_f64() * 1000.0
        )
    }
}

/// Conjugate gradient solver.
#[derive(Clone, Debug, Default)]
pub struct ConjugateGradient {
    config: ConjugateGradientConfig,
}

impl ConjugateGradient {
    /// Create a solver with the default configuration.
    pub fn new() -> Self {
        Self::with_config(ConjugateGradientConfig::default())
    }

    /// Create a solver with the given configuration.
    pub fn with_config(config: ConjugateGradientConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ConjugateGradientConfig {
        &self.config
    }

    /// Solve `operator · x = rhs`, starting from `initial_guess` or from zero.
    ///
    /// # Errors
    /// - `LinAlgError::DimensionMismatch` if `initial_guess` is shaped differently from `rhs`,
    ///   or if `operator.shape()` is not square with side `rhs.dim()`
    /// - `LinAlgError::NotPositiveDefinite` if a direction with pᵀAp ≤ 0 is met
    /// - `LinAlgError::NumericalInstability` if NaN or Inf appears
    pub fn solve<A: LinearOperator + ?Sized>(
        &self,
        operator: &A,
        rhs: &SegmentedVector,
        initial_guess: Option<&SegmentedVector>,
    ) -> LinAlgResult<ConjugateGradientSummary> {
        let start_time = time::Instant::now();

        let n = rhs.dim();
        if let Some((rows, cols)) = operator.shape().filter(|&shape| shape != (n, n)) {
            return Err(LinAlgError::DimensionMismatch(format!(
                "operator is {rows}x{cols}, right-hand side has dimension {n}"
            ))
            .log());
        }

        let mut x = match initial_guess {
            Some(guess) if !guess.has_same_structure(rhs) => {
                return Err(LinAlgError::DimensionMismatch(format!(
                    "initial guess has offsets {:?}, right-hand side has {:?}",
                    guess.offsets(),
                    rhs.offsets()
                ))
                .log());
            }
            Some(guess) => guess.clone(),
            None => SegmentedVector::same_structure(rhs),
        };
        if initial_guess.is_none() {
            x.make_zero();
        }

        let mut product = SegmentedVector::same_structure(rhs);
        operator.apply(&x, &mut product);
        let mut residual = rhs - &product;
        let mut direction = residual.clone();
        let mut residual_sq = residual.dot(&residual);
        if !residual_sq.is_finite() {
            return Err(LinAlgError::NumericalInstability(
                "initial residual is not finite".to_string(),
            )
            .log());
        }

        let threshold =
            (self.config.relative_tolerance * rhs.norm()).max(self.config.absolute_tolerance);
        let mut iterations = 0;

        let status = loop {
            if residual_sq.sqrt() <= threshold {
                break CgStatus::Converged;
            }
            if iterations >= self.config.max_iterations {
                break CgStatus::MaxIterationsReached;
            }
            if self
                .config
                .timeout
                .is_some_and(|timeout| start_time.elapsed() >= timeout)
            {
                break CgStatus::Timeout;
            }

            operator.apply(&direction, &mut product);
            let curvature = direction.dot(&product);
            if !curvature.is_finite() {
                return Err(LinAlgError::NumericalInstability(format!(
                    "curvature became {curvature} at iteration {iterations}"
                ))
                .log());
            }
            if curvature <= 0.0 {
                return Err(LinAlgError::NotPositiveDefinite { curvature }.log());
            }

            let alpha = residual_sq / curvature;
            x.axpy(alpha, &direction);
            residual.axpy(-alpha, &product);

            let next_residual_sq = residual.dot(&residual);
            direction.scal(next_residual_sq / residual_sq);
            direction.axpy(1.0, &residual);
            residual_sq = next_residual_sq;
            iterations += 1;

            debug!(
                "cg iteration {}: residual norm {:.6e}",
                iterations,
                residual_sq.sqrt()
            );
        };

        let summary = ConjugateGradientSummary {
            solution: x,
            iterations,
            residual_norm: residual_sq.sqrt(),
            status,
            elapsed_time: start_time.elapsed(),
        };
        if status.is_converged() {
            info!("Conjugate gradient: {}", summary);
        } else {
            warn!("Conjugate gradient stopped early: {}", summary);
        }
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spd_matrix() -> Mat<f64> {
        // [4 1 0; 1 3 1; 0 1 2]
        let mut a = Mat::zeros(3, 3);
        a[(0, 0)] = 4.0;
        a[(0, 1)] = 1.0;
        a[(1, 0)] = 1.0;
        a[(1, 1)] = 3.0;
        a[(1, 2)] = 1.0;
        a[(2, 1)] = 1.0;
        a[(2, 2)] = 2.0;
        a
    }

    #[test]
    fn test_config_builder() {
        let config = ConjugateGradientConfig::new()
            .with_max_iterations(7)
            .with_relative_tolerance(1e-4)
            .with_absolute_tolerance(1e-6)
            .with_timeout(time::Duration::from_secs(1));
        assert_eq!(config.max_iterations, 7);
        assert_eq!(config.relative_tolerance, 1e-4);
        assert_eq!(config.absolute_tolerance, 1e-6);
        assert_eq!(config.timeout, Some(time::Duration::from_secs(1)));

        let solver = ConjugateGradient::with_config(config);
        assert_eq!(solver.config().max_iterations, 7);
    }

    #[test]
    fn test_dense_operator_apply() {
        let a = spd_matrix();
        let x = SegmentedVector::from_values(&[1, 2], vec![1.0, 2.0, 3.0]).expect("valid");
        let mut out = SegmentedVector::same_structure(&x);
        a.apply(&x, &mut out);
        assert_eq!(out.as_slice(), &[6.0, 10.0, 8.0]);
    }

    #[test]
    fn test_solves_small_spd_system() {
        let a = spd_matrix();
        let expected =
            SegmentedVector::from_values(&[1, 2], vec![1.0, -2.0, 0.5]).expect("valid");
        let mut b = SegmentedVector::same_structure(&expected);
        a.apply(&expected, &mut b);

        let summary = ConjugateGradient::new()
            .solve(&a, &b, None)
            .expect("spd system");
        assert_eq!(summary.status, CgStatus::Converged);
        assert!(summary.iterations <= 3);
        assert!(summary.solution.equals(&expected, 1e-8));
        assert!(summary.solution.has_same_structure(&b));
    }

    #[test]
    fn test_zero_rhs_converges_immediately() {
        let a = spd_matrix();
        let b = SegmentedVector::uniform(3, 1);
        let summary = ConjugateGradient::new().solve(&a, &b, None).expect("solve");
        assert_eq!(summary.iterations, 0);
        assert_eq!(summary.residual_norm, 0.0);
        assert_eq!(summary.solution.norm(), 0.0);
    }

    #[test]
    fn test_exact_initial_guess() {
        let a = spd_matrix();
        let x = SegmentedVector::from_values(&[3], vec![0.5, 0.5, 0.5]).expect("valid");
        let mut b = SegmentedVector::same_structure(&x);
        a.apply(&x, &mut b);

        let summary = ConjugateGradient::new()
            .solve(&a, &b, Some(&x))
            .expect("solve");
        assert_eq!(summary.iterations, 0);
        assert!(summary.solution.equals(&x, 1e-12));
    }

    #[test]
    fn test_iteration_budget() {
        let a = spd_matrix();
        let b = SegmentedVector::from_values(&[3], vec![1.0, 1.0, 1.0]).expect("valid");
        let solver = ConjugateGradient::with_config(
            ConjugateGradientConfig::new().with_max_iterations(1),
        );
        let summary = solver.solve(&a, &b, None).expect("solve");
        assert_eq!(summary.status, CgStatus::MaxIterationsReached);
        assert_eq!(summary.iterations, 1);
        assert!(summary.residual_norm > 0.0);
    }

    #[test]
    fn test_mismatched_initial_guess() {
        let a = spd_matrix();
        let b = SegmentedVector::from_values(&[3], vec![1.0, 1.0, 1.0]).expect("valid");
        let guess = SegmentedVector::uniform(3, 1);
        let err = ConjugateGradient::new()
            .solve(&a, &b, Some(&guess))
            .expect_err("structure differs");
        assert!(matches!(err, LinAlgError::DimensionMismatch(_)));
    }

    #[test]
    fn test_dense_operator_shape() {
        assert_eq!(LinearOperator::shape(&spd_matrix()), Some((3, 3)));
        assert_eq!(LinearOperator::shape(&Mat::<f64>::zeros(2, 4)), Some((2, 4)));
    }

    #[test]
    fn test_operator_size_mismatch_is_an_error() {
        let b = SegmentedVector::from_values(&[3], vec![1.0; 3]).expect("valid");
        let err = ConjugateGradient::new()
            .solve(&Mat::<f64>::identity(2, 2), &b, None)
            .expect_err("2x2 operator, 3-dimensional rhs");
        assert!(matches!(err, LinAlgError::DimensionMismatch(_)));

        let err = ConjugateGradient::new()
            .solve(&Mat::<f64>::zeros(3, 2), &b, None)
            .expect_err("non-square operator");
        assert!(matches!(err, LinAlgError::DimensionMismatch(_)));
    }

    #[test]
    fn test_indefinite_operator_is_rejected() {
        let mut a = Mat::zeros(2, 2);
        a[(0, 0)] = -1.0;
        a[(1, 1)] = -1.0;
        let b = SegmentedVector::from_values(&[2], vec![1.0, 0.0]).expect("valid");
        let err = ConjugateGradient::new()
            .solve(&a, &b, None)
            .expect_err("negative definite");
        assert_eq!(err, LinAlgError::NotPositiveDefinite { curvature: -1.0 });
    }
}
