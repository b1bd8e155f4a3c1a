use crate::error::{FieldError, Result};
use crate::field::{Field, Region};
use crate::field_range::FieldRange;
use crate::location::{Location, MeshLocation};
use crate::mesh::{ElementHandle, FieldDerivative};
use crate::traits::{EvaluationPoint, FieldEvaluator};
use std::cell::{Cell, RefCell};
use std::rc::Rc;

/// Evaluation context for fields of one region: the current location and
/// time. Shared as `Rc<FieldCache>`; repositioning uses interior
/// mutability, so a cache must stay on one thread (it is `!Sync`).
#[derive(Debug)]
pub struct FieldCache {
    region: Rc<Region>,
    location: RefCell<Location>,
    time: Cell<f64>,
}

impl FieldCache {
    pub fn new(region: &Rc<Region>) -> Rc<Self> {
        Rc::new(Self {
            region: Rc::clone(region),
            location: RefCell::new(Location::None),
            time: Cell::new(0.0),
        })
    }

    pub fn region(&self) -> &Rc<Region> {
        &self.region
    }

    pub fn location(&self) -> Location {
        self.location.borrow().clone()
    }

    pub fn time(&self) -> f64 {
        self.time.get()
    }

    pub fn set_time(&self, time: f64) {
        self.time.set(time);
    }

    /// Moves the cache to `xi` in `element`; `xi` must lie in the element.
    pub fn set_mesh_location(&self, element: &ElementHandle, xi: &[f64]) -> Result<()> {
        let location = MeshLocation::new(element.clone(), xi)?;
        *self.location.borrow_mut() = Location::Element(location);
        Ok(())
    }

    pub fn set_node(&self, identifier: i32) {
        *self.location.borrow_mut() = Location::Node(identifier);
    }

    pub fn clear_location(&self) {
        *self.location.borrow_mut() = Location::None;
    }

    /// Puts back a location previously read with [`FieldCache::location`].
    pub(crate) fn restore_location(&self, location: Location) {
        *self.location.borrow_mut() = location;
    }

    /// Checks `field` can be evaluated through this cache and returns its
    /// evaluator.
    pub fn check_field<'f>(&self, field: &'f Field) -> Result<&'f dyn FieldEvaluator> {
        if !field.belongs_to(&self.region) {
            return Err(FieldError::argument(format!(
                "field \"{}\" is not from the cache's region \"{}\"",
                field.name(),
                self.region.name()
            )));
        }
        field.evaluator().ok_or_else(|| {
            FieldError::argument(format!("field \"{}\" is not numerical", field.name()))
        })
    }

    /// Runs `evaluate` with the field's evaluator at the current element location.
    fn with_point<R>(
        &self,
        field: &Field,
        evaluate: impl FnOnce(&dyn FieldEvaluator, &EvaluationPoint) -> Result<R>,
    ) -> Result<R> {
        let evaluator = self.check_field(field)?;
        let location = self.location.borrow();
        let mesh_location = location.mesh_location().ok_or_else(|| {
            FieldError::general("field cache has no element location to evaluate at")
        })?;
        if !evaluator.is_defined_at(mesh_location.dimension()) {
            return Err(FieldError::general(format!(
                "field \"{}\" is not defined at this location",
                field.name()
            )));
        }
        let point = EvaluationPoint::new(&mesh_location.xi, self.time.get());
        evaluate(evaluator, &point)
    }

    pub fn is_defined_at_location(&self, field: &Field) -> bool {
        self.with_point(field, |_, _| Ok(())).is_ok()
    }

    /// Evaluates all components of `field` at the current location into `out`.
    pub fn evaluate_real(&self, field: &Field, out: &mut [f64]) -> Result<()> {
        self.with_point(field, |evaluator, point| evaluator.evaluate(point, out))
    }

    /// Evaluates `derivative` of `field` at the current location into `out`,
    /// `number_of_components * derivative.term_count()` values.
    pub fn evaluate_derivative(
        &self,
        field: &Field,
        derivative: &FieldDerivative,
        out: &mut [f64],
    ) -> Result<()> {
        self.with_point(field, |evaluator, point| {
            evaluator.evaluate_derivative(point, derivative, out)
        })
    }

    pub fn create_field_range(self: &Rc<Self>) -> FieldRange {
        FieldRange::new(self)
    }

    /// Evaluates the range of `field` at this cache's element into `range`,
    /// which must have been created from this cache.
    pub fn evaluate_field_range(
        self: &Rc<Self>,
        field: &Rc<Field>,
        range: &mut FieldRange,
    ) -> Result<()> {
        if !Rc::ptr_eq(range.cache(), self) {
            return Err(FieldError::argument(
                "field range was created from a different field cache",
            ));
        }
        range.evaluate_range(field)
    }
}
