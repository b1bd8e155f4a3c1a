use crate::error::Result;
use crate::mesh::FieldDerivative;
use num_traits::{Float, FromPrimitive};
use std::fmt::Debug;

/// A trait for types that can be used as scalars when evaluating fields.
/// Must support basic arithmetic, debug printing, and conversion from f64.
pub trait Scalar: Float + FromPrimitive + Debug + 'static {}

impl<T: Float + FromPrimitive + Debug + 'static> Scalar for T {}

/// The point at which a field is evaluated: element-local xi plus time.
/// `xi.len()` is the dimension of the element being evaluated.
#[derive(Debug, Clone, Copy)]
pub struct EvaluationPoint<'a> {
    pub xi: &'a [f64],
    pub time: f64,
}

impl<'a> EvaluationPoint<'a> {
    pub fn new(xi: &'a [f64], time: f64) -> Self {
        Self { xi, time }
    }

    pub fn dimension(&self) -> usize {
        self.xi.len()
    }
}

/// Evaluation capability shared by every numerical field kind.
pub trait FieldEvaluator {
    /// Number of real components produced per evaluation.
    fn number_of_components(&self) -> usize;

    /// Whether the field can be evaluated in an element of this dimension.
    fn is_defined_at(&self, dimension: usize) -> bool;

    /// Writes all component values at `point` into `out`.
    /// `out` must hold at least `number_of_components()` values.
    fn evaluate(&self, point: &EvaluationPoint, out: &mut [f64]) -> Result<()>;

    /// Writes the derivative tensor at `point` into `out`, laid out as
    /// `component * derivative.term_count() + term`. Second derivative
    /// terms are ordered `i * dimension + j`.
    fn evaluate_derivative(
        &self,
        point: &EvaluationPoint,
        derivative: &FieldDerivative,
        out: &mut [f64],
    ) -> Result<()>;
}
