//! Fields: a closed set of kinds behind the [`FieldEvaluator`] capability.
use crate::autodiff::{Dual, HyperDual};
use crate::equation_engine::{self, Bytecode, VM};
use crate::error::{FieldError, Result};
use crate::mesh::FieldDerivative;
use crate::shape::MAXIMUM_ELEMENT_XI_DIMENSIONS;
use crate::traits::{EvaluationPoint, FieldEvaluator, Scalar};
use std::rc::Rc;

/// Variable names available to expression fields, in VM variable order.
pub const EXPRESSION_VARIABLES: [&str; 4] = ["xi1", "xi2", "xi3", "time"];
const TIME_VARIABLE: usize = 3;

/// Owner of fields and field caches. Compared by identity.
#[derive(Debug)]
pub struct Region {
    name: String,
}

impl Region {
    pub fn new(name: impl Into<String>) -> Rc<Self> {
        Rc::new(Self { name: name.into() })
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueType {
    Real,
    String,
}

/// Field with the same real values everywhere.
#[derive(Debug, Clone)]
pub struct ConstantField {
    values: Vec<f64>,
}

impl ConstantField {
    pub fn new(values: &[f64]) -> Result<Self> {
        if values.is_empty() {
            return Err(FieldError::argument("constant field needs at least one value"));
        }
        Ok(Self {
            values: values.to_vec(),
        })
    }
}

impl FieldEvaluator for ConstantField {
    fn number_of_components(&self) -> usize {
        self.values.len()
    }

    fn is_defined_at(&self, _dimension: usize) -> bool {
        true
    }

    fn evaluate(&self, _point: &EvaluationPoint, out: &mut [f64]) -> Result<()> {
        check_buffer(out, self.values.len())?;
        out[..self.values.len()].copy_from_slice(&self.values);
        Ok(())
    }

    fn evaluate_derivative(
        &self,
        point: &EvaluationPoint,
        derivative: &FieldDerivative,
        out: &mut [f64],
    ) -> Result<()> {
        check_derivative(point, derivative)?;
        let size = self.values.len() * derivative.term_count();
        check_buffer(out, size)?;
        out[..size].fill(0.0);
        Ok(())
    }
}

/// Field given by one analytic expression per component over
/// `xi1`, `xi2`, `xi3`, `time` and named parameters. Derivatives are exact,
/// computed with dual numbers.
#[derive(Debug, Clone)]
pub struct ExpressionField {
    components: Vec<Bytecode>,
    parameters: Vec<f64>,
    required_dimension: usize,
}

impl ExpressionField {
    pub fn new(components: &[&str], parameters: &[(&str, f64)]) -> anyhow::Result<Self> {
        if components.is_empty() {
            anyhow::bail!("Expression field needs at least one component");
        }
        let parameter_names: Vec<&str> = parameters.iter().map(|(name, _)| *name).collect();
        let components = components
            .iter()
            .enumerate()
            .map(|(c, source)| {
                equation_engine::compile(source, &EXPRESSION_VARIABLES, &parameter_names)
                    .map_err(|err| err.context(format!("Component {}", c + 1)))
            })
            .collect::<anyhow::Result<Vec<_>>>()?;
        let required_dimension = (0..MAXIMUM_ELEMENT_XI_DIMENSIONS)
            .filter(|&i| components.iter().any(|code| code.uses_var(i)))
            .map(|i| i + 1)
            .max()
            .unwrap_or(0);
        Ok(Self {
            components,
            parameters: parameters.iter().map(|(_, value)| *value).collect(),
            required_dimension,
        })
    }

    /// Smallest element dimension providing every xi variable referenced.
    pub fn required_dimension(&self) -> usize {
        self.required_dimension
    }

    /// Variable values in VM order; xi beyond the point's dimension are 0.
    fn variables(&self, point: &EvaluationPoint) -> [f64; EXPRESSION_VARIABLES.len()] {
        let mut values = [0.0; EXPRESSION_VARIABLES.len()];
        values[..point.dimension()].copy_from_slice(point.xi);
        values[TIME_VARIABLE] = point.time;
        values
    }

    fn execute_all<T: Scalar>(&self, vars: &[T]) -> Result<Vec<T>> {
        let params = self
            .parameters
            .iter()
            .map(|&p| T::from_f64(p))
            .collect::<Option<Vec<T>>>()
            .ok_or_else(|| FieldError::general("unrepresentable expression parameter"))?;
        let mut stack = Vec::with_capacity(16);
        self.components
            .iter()
            .enumerate()
            .map(|(c, code)| {
                VM::execute(code, vars, &params, &mut stack).map_err(|err| {
                    FieldError::general(format!("component {} evaluation failed: {err:#}", c + 1))
                })
            })
            .collect()
    }

    fn check_defined(&self, point: &EvaluationPoint) -> Result<()> {
        if !self.is_defined_at(point.dimension()) {
            return Err(FieldError::general(format!(
                "expression needs a {}-D element, location is {}-D",
                self.required_dimension,
                point.dimension()
            )));
        }
        Ok(())
    }
}

impl FieldEvaluator for ExpressionField {
    fn number_of_components(&self) -> usize {
        self.components.len()
    }

    fn is_defined_at(&self, dimension: usize) -> bool {
        dimension >= self.required_dimension && dimension <= MAXIMUM_ELEMENT_XI_DIMENSIONS
    }

    fn evaluate(&self, point: &EvaluationPoint, out: &mut [f64]) -> Result<()> {
        self.check_defined(point)?;
        check_buffer(out, self.components.len())?;
        let values = self.execute_all(&self.variables(point))?;
        out[..values.len()].copy_from_slice(&values);
        check_finite(&out[..values.len()], "value")
    }

    fn evaluate_derivative(
        &self,
        point: &EvaluationPoint,
        derivative: &FieldDerivative,
        out: &mut [f64],
    ) -> Result<()> {
        self.check_defined(point)?;
        check_derivative(point, derivative)?;
        let dimension = point.dimension();
        let terms = derivative.term_count();
        let size = self.components.len() * terms;
        check_buffer(out, size)?;
        match derivative.order() {
            1 => {
                for j in 0..dimension {
                    let vars = Dual::seed(&self.variables(point), j);
                    for (c, value) in self.execute_all(&vars)?.iter().enumerate() {
                        out[c * terms + j] = value.eps;
                    }
                }
            }
            2 => {
                for i in 0..dimension {
                    for j in i..dimension {
                        let vars = HyperDual::seed(&self.variables(point), i, j);
                        for (c, value) in self.execute_all(&vars)?.iter().enumerate() {
                            out[c * terms + i * dimension + j] = value.eps12;
                            out[c * terms + j * dimension + i] = value.eps12;
                        }
                    }
                }
            }
            order => {
                return Err(FieldError::not_implemented(format!(
                    "derivatives of order {order}"
                )))
            }
        }
        check_finite(&out[..size], "derivative")
    }
}

fn check_buffer(out: &[f64], size: usize) -> Result<()> {
    if out.len() < size {
        return Err(FieldError::argument(format!(
            "output buffer holds {} values, {} needed",
            out.len(),
            size
        )));
    }
    Ok(())
}

fn check_derivative(point: &EvaluationPoint, derivative: &FieldDerivative) -> Result<()> {
    if derivative.mesh_dimension() != point.dimension() {
        return Err(FieldError::argument(format!(
            "derivative is for a {}-D mesh, location is {}-D",
            derivative.mesh_dimension(),
            point.dimension()
        )));
    }
    Ok(())
}

fn check_finite(values: &[f64], what: &str) -> Result<()> {
    if values.iter().any(|v| !v.is_finite()) {
        return Err(FieldError::general(format!("field {what} is not finite")));
    }
    Ok(())
}

#[derive(Debug, Clone)]
pub enum FieldKind {
    Constant(ConstantField),
    Expression(ExpressionField),
    StringConstant(String),
}

/// A named field in a region. Shared as `Rc<Field>`.
#[derive(Debug)]
pub struct Field {
    name: String,
    region: Rc<Region>,
    kind: FieldKind,
}

impl Field {
    pub fn new(region: &Rc<Region>, name: impl Into<String>, kind: FieldKind) -> Rc<Self> {
        Rc::new(Self {
            name: name.into(),
            region: Rc::clone(region),
            kind,
        })
    }

    pub fn constant(region: &Rc<Region>, name: impl Into<String>, values: &[f64]) -> Result<Rc<Self>> {
        Ok(Self::new(region, name, FieldKind::Constant(ConstantField::new(values)?)))
    }

    /// Compiles one expression per component; see [`ExpressionField`].
    pub fn expression(
        region: &Rc<Region>,
        name: impl Into<String>,
        components: &[&str],
        parameters: &[(&str, f64)],
    ) -> Result<Rc<Self>> {
        let expression = ExpressionField::new(components, parameters)
            .map_err(|err| FieldError::argument(format!("{err:#}")))?;
        Ok(Self::new(region, name, FieldKind::Expression(expression)))
    }

    pub fn string_constant(
        region: &Rc<Region>,
        name: impl Into<String>,
        text: impl Into<String>,
    ) -> Rc<Self> {
        Self::new(region, name, FieldKind::StringConstant(text.into()))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn region(&self) -> &Rc<Region> {
        &self.region
    }

    pub fn belongs_to(&self, region: &Rc<Region>) -> bool {
        Rc::ptr_eq(&self.region, region)
    }

    pub fn kind(&self) -> &FieldKind {
        &self.kind
    }

    pub fn value_type(&self) -> ValueType {
        match self.kind {
            FieldKind::StringConstant(_) => ValueType::String,
            _ => ValueType::Real,
        }
    }

    pub fn is_numerical(&self) -> bool {
        self.value_type() == ValueType::Real
    }

    /// Evaluation capability; `None` for non-numerical fields.
    pub fn evaluator(&self) -> Option<&dyn FieldEvaluator> {
        match &self.kind {
            FieldKind::Constant(field) => Some(field as &dyn FieldEvaluator),
            FieldKind::Expression(field) => Some(field as &dyn FieldEvaluator),
            FieldKind::StringConstant(_) => None,
        }
    }

    pub fn number_of_components(&self) -> usize {
        self.evaluator().map_or(1, |e| e.number_of_components())
    }
}
