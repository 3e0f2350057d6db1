//! Point2 - points in the plane
//!
//! R² with vector addition as the group operation. The tangent space is R² itself, so the
//! exponential and logarithmic maps are the identity embedding and retraction is plain
//! coordinate-wise addition.
//!
//! Point2 elements are represented using nalgebra's `Vector2<f64>`.

use crate::DEFAULT_TOLERANCE;
use crate::manifold::{LieGroup, ManifoldError, ManifoldResult, Tangent};
use nalgebra::{Matrix2, Vector2};
use std::ops::{Add, AddAssign, Div, Mul, MulAssign, Neg, Sub};
use std::{
    fmt,
    fmt::{Display, Formatter},
};

/// A point in the plane.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Point2 {
    coords: Vector2<f64>,
}

impl Default for Point2 {
    fn default() -> Self {
        Self::new(0.0, 0.0)
    }
}

impl Display for Point2 {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "Point2({}, {})", self.x(), self.y())
    }
}

impl From<Vector2<f64>> for Point2 {
    fn from(coords: Vector2<f64>) -> Self {
        Point2::from_vector(coords)
    }
}

impl From<Point2> for Vector2<f64> {
    fn from(point: Point2) -> Self {
        point.coords
    }
}

impl Point2 {
    /// Tangent space dimension
    pub const DIM: usize = 2;

    pub fn new(x: f64, y: f64) -> Self {
        Self {
            coords: Vector2::new(x, y),
        }
    }

    pub fn from_vector(coords: Vector2<f64>) -> Self {
        Self { coords }
    }

    /// Build a point from two flat coordinates.
    ///
    /// # Errors
    /// `ManifoldError::InvalidTangentDimension` unless `data.len() == 2`.
    pub fn from_slice(data: &[f64]) -> ManifoldResult<Self> {
        match data {
            [x, y] => Ok(Self::new(*x, *y)),
            _ => Err(ManifoldError::InvalidTangentDimension {
                expected: Self::DIM,
                actual: data.len(),
            }),
        }
    }

    pub fn x(&self) -> f64 {
        self.coords.x
    }

    pub fn y(&self) -> f64 {
        self.coords.y
    }

    pub fn vector(&self) -> Vector2<f64> {
        self.coords
    }

    /// Number of tangent coordinates, always 2.
    pub fn dim() -> usize {
        Self::DIM
    }

    /// Exponential map at the origin.
    pub fn expmap(v: &Vector2<f64>) -> Self {
        Self::from_vector(*v)
    }

    /// Logarithmic map at the origin.
    pub fn logmap(p: &Point2) -> Vector2<f64> {
        p.coords
    }

    pub fn norm(&self) -> f64 {
        self.coords.norm()
    }

    /// Unit vector in the direction of this point.
    ///
    /// # Panics
    /// Panics at the origin.
    pub fn unit(&self) -> Self {
        match self.try_unit() {
            Ok(unit) => unit,
            Err(err) => panic!("{err}"),
        }
    }

    pub fn try_unit(&self) -> ManifoldResult<Self> {
        let norm = self.norm();
        if !norm.is_finite() {
            return Err(ManifoldError::InvalidNumber);
        }
        if norm == 0.0 {
            return Err(ManifoldError::NormalizationFailed(
                "cannot normalize a point at the origin".to_string(),
            ));
        }
        Ok(*self / norm)
    }

    /// Euclidean distance to `other`.
    pub fn dist(&self, other: &Point2) -> f64 {
        (other.coords - self.coords).norm()
    }

    /// Per-coordinate comparison, `|aᵢ - bᵢ| <= tolerance`.
    pub fn equals(&self, other: &Point2, tolerance: f64) -> bool {
        (self.x() - other.x()).abs() <= tolerance && (self.y() - other.y()).abs() <= tolerance
    }

    pub fn approx_eq(&self, other: &Point2) -> bool {
        self.equals(other, DEFAULT_TOLERANCE)
    }

    /// Uniformly distributed point in [-1, 1]².
    pub fn random() -> Self {
        Self::new(
            rand::random::<f64>() * 2.0 - 1.0,
            rand::random::<f64>() * 2.0 - 1.0,
        )
    }
}

impl LieGroup for Point2 {
    type TangentVector = Point2Tangent;
    type JacobianMatrix = Matrix2<f64>;

    const DOF: usize = 2;

    fn identity() -> Self {
        Self::default()
    }

    fn inverse(&self, jacobian: Option<&mut Self::JacobianMatrix>) -> Self {
        if let Some(jac) = jacobian {
            *jac = -Matrix2::identity();
        }
        -*self
    }

    fn compose(
        &self,
        other: &Self,
        jacobian_self: Option<&mut Self::JacobianMatrix>,
        jacobian_other: Option<&mut Self::JacobianMatrix>,
    ) -> Self {
        if let Some(jac) = jacobian_self {
            *jac = Matrix2::identity();
        }
        if let Some(jac) = jacobian_other {
            *jac = Matrix2::identity();
        }
        *self + *other
    }

    fn between(
        &self,
        other: &Self,
        jacobian_self: Option<&mut Self::JacobianMatrix>,
        jacobian_other: Option<&mut Self::JacobianMatrix>,
    ) -> Self {
        if let Some(jac) = jacobian_self {
            *jac = -Matrix2::identity();
        }
        if let Some(jac) = jacobian_other {
            *jac = Matrix2::identity();
        }
        *other - *self
    }

    fn log(&self) -> Self::TangentVector {
        Point2Tangent::new(self.coords)
    }

    fn is_approx(&self, other: &Self, tolerance: f64) -> bool {
        self.equals(other, tolerance)
    }
}

impl Neg for Point2 {
    type Output = Point2;

    fn neg(self) -> Point2 {
        Point2::from_vector(-self.coords)
    }
}

impl Add for Point2 {
    type Output = Point2;

    fn add(self, rhs: Point2) -> Point2 {
        Point2::from_vector(self.coords + rhs.coords)
    }
}

impl Sub for Point2 {
    type Output = Point2;

    fn sub(self, rhs: Point2) -> Point2 {
        Point2::from_vector(self.coords - rhs.coords)
    }
}

impl Mul<f64> for Point2 {
    type Output = Point2;

    fn mul(self, s: f64) -> Point2 {
        Point2::from_vector(self.coords * s)
    }
}

impl Mul<Point2> for f64 {
    type Output = Point2;

    fn mul(self, p: Point2) -> Point2 {
        p * self
    }
}

impl Div<f64> for Point2 {
    type Output = Point2;

    fn div(self, s: f64) -> Point2 {
        Point2::from_vector(self.coords / s)
    }
}

impl AddAssign for Point2 {
    fn add_assign(&mut self, rhs: Point2) {
        self.coords += rhs.coords;
    }
}

impl MulAssign<f64> for Point2 {
    fn mul_assign(&mut self, s: f64) {
        self.coords *= s;
    }
}

/// Tangent vector of [`Point2`], a plain 2-vector.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Point2Tangent {
    data: Vector2<f64>,
}

impl Point2Tangent {
    pub fn new(data: Vector2<f64>) -> Self {
        Self { data }
    }

    pub fn vector(&self) -> Vector2<f64> {
        self.data
    }
}

impl From<Vector2<f64>> for Point2Tangent {
    fn from(data: Vector2<f64>) -> Self {
        Point2Tangent::new(data)
    }
}

impl From<Point2Tangent> for Vector2<f64> {
    fn from(tangent: Point2Tangent) -> Self {
        tangent.data
    }
}

impl Tangent<Point2> for Point2Tangent {
    const DIM: usize = 2;

    fn exp(&self) -> Point2 {
        Point2::from_vector(self.data)
    }

    fn as_slice(&self) -> &[f64] {
        self.data.as_slice()
    }

    fn from_slice(data: &[f64]) -> ManifoldResult<Self> {
        if data.len() != Self::DIM {
            return Err(ManifoldError::InvalidTangentDimension {
                expected: Self::DIM,
                actual: data.len(),
            });
        }
        Ok(Self::new(Vector2::from_column_slice(data)))
    }

    fn zero() -> Self {
        Self::new(Vector2::zeros())
    }

    fn is_zero(&self, tolerance: f64) -> bool {
        self.data.norm() <= tolerance
    }
}
