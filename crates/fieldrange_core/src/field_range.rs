//! Per-component minimum and maximum of a field over an element or a mesh.
//!
//! A [`FieldRange`] is created from a [`FieldCache`] and filled by
//! [`FieldRange::evaluate_range`], which works on the element the cache
//! currently points at. Results stay queryable until the next evaluation.

mod component_limit;
mod element_range;
mod types;

pub use component_limit::find_component_limit;
pub use element_range::{evaluate_element_range, ElementRange};
pub use types::{ComponentLimit, ComponentRangeSummary, FieldRangeSummary, LimitKind, RangeSettings};

use crate::cache::FieldCache;
use crate::error::{FieldError, Result};
use crate::field::Field;
use crate::location::{Location, MeshLocation};
use crate::mesh::{ElementHandle, Mesh};
use log::debug;
use std::rc::Rc;

/// Range of a field: for every component, where its minimum and maximum
/// occur and all field components evaluated there.
///
/// Accessors fail with `NotFound` until an evaluation has succeeded. A
/// failed evaluation leaves the range invalid.
#[derive(Debug)]
pub struct FieldRange {
    cache: Rc<FieldCache>,
    settings: RangeSettings,
    field: Option<Rc<Field>>,
    valid_range: bool,
    minimum: Vec<ComponentLimit>,
    maximum: Vec<ComponentLimit>,
}

impl FieldRange {
    pub fn new(cache: &Rc<FieldCache>) -> Self {
        Self {
            cache: Rc::clone(cache),
            settings: RangeSettings::default(),
            field: None,
            valid_range: false,
            minimum: Vec::new(),
            maximum: Vec::new(),
        }
    }

    pub fn settings(&self) -> &RangeSettings {
        &self.settings
    }

    /// Replaces the search settings used by later evaluations.
    pub fn set_settings(&mut self, settings: RangeSettings) -> Result<()> {
        settings.validate()?;
        self.settings = settings;
        Ok(())
    }

    pub fn cache(&self) -> &Rc<FieldCache> {
        &self.cache
    }

    /// Field of the last successful evaluation.
    pub fn field(&self) -> Option<&Rc<Field>> {
        self.field.as_ref()
    }

    pub fn has_valid_range(&self) -> bool {
        self.valid_range
    }

    /// Number of components held; 0 without a valid range.
    pub fn number_of_components(&self) -> usize {
        self.minimum.len()
    }

    /// Discards all results.
    pub fn reset(&mut self) {
        self.valid_range = false;
        self.field = None;
        self.minimum.clear();
        self.maximum.clear();
    }

    fn commit(
        &mut self,
        field: &Rc<Field>,
        minimum: Vec<ComponentLimit>,
        maximum: Vec<ComponentLimit>,
    ) {
        self.field = Some(Rc::clone(field));
        self.minimum = minimum;
        self.maximum = maximum;
        self.valid_range = true;
    }

    /// Evaluates the range of `field` over the element holding the cache's
    /// current location. The cache location is put back afterwards.
    ///
    /// Node locations are not supported (`NotImplemented`); a cache with no
    /// location is an argument error. Argument errors leave the current
    /// range untouched; any later failure leaves it invalid.
    pub fn evaluate_range(&mut self, field: &Rc<Field>) -> Result<()> {
        self.cache.check_field(field)?;
        let saved = self.cache.location();
        let element = match &saved {
            Location::Element(location) => location.element.clone(),
            Location::Node(identifier) => {
                return Err(FieldError::not_implemented(format!(
                    "range evaluation at node {identifier}; only element locations are supported"
                )))
            }
            Location::None => {
                return Err(FieldError::argument("field cache has no location"));
            }
        };
        self.reset();

        debug!("evaluating range of \"{}\" over {:?}", field.name(), element);
        let result = evaluate_element_range(field, &element, &self.cache, &self.settings);
        self.cache.restore_location(saved);
        match result {
            Ok(range) => {
                self.commit(field, range.minimum, range.maximum);
                debug!("range of \"{}\" evaluated", field.name());
                Ok(())
            }
            Err(err) => {
                debug!("range of \"{}\" aborted: {err}", field.name());
                Err(err)
            }
        }
    }

    /// Evaluates the range of `field` over every element of `mesh` on which
    /// it is defined. For each component the element extremum with the
    /// strictly smaller (larger) own value is kept, so earlier elements win
    /// ties. The cache location is put back afterwards.
    pub fn evaluate_mesh_range(&mut self, field: &Rc<Field>, mesh: &Rc<Mesh>) -> Result<()> {
        let evaluator = self.cache.check_field(field)?;
        self.reset();
        if !evaluator.is_defined_at(mesh.dimension()) {
            return Err(FieldError::not_found(format!(
                "field \"{}\" is not defined on any element of the {}-D mesh",
                field.name(),
                mesh.dimension()
            )));
        }

        debug!(
            "evaluating range of \"{}\" over {} elements",
            field.name(),
            mesh.size()
        );
        let saved = self.cache.location();
        let result: Result<Option<ElementRange>> = mesh
            .elements()
            .try_fold(None, |best: Option<ElementRange>, element| {
                let range = evaluate_element_range(field, &element, &self.cache, &self.settings)?;
                Ok(Some(match best {
                    None => range,
                    Some(best) => merge(best, range),
                }))
            });
        self.cache.restore_location(saved);

        match result {
            Ok(Some(range)) => {
                self.commit(field, range.minimum, range.maximum);
                debug!("mesh range of \"{}\" evaluated", field.name());
                Ok(())
            }
            Ok(None) => Err(FieldError::not_found("mesh has no elements")),
            Err(err) => {
                debug!("mesh range of \"{}\" aborted: {err}", field.name());
                Err(err)
            }
        }
    }

    fn limits(&self, kind: LimitKind) -> Result<&[ComponentLimit]> {
        if !self.valid_range {
            return Err(FieldError::not_found("field range has not been evaluated"));
        }
        Ok(match kind {
            LimitKind::Minimum => self.minimum.as_slice(),
            LimitKind::Maximum => self.maximum.as_slice(),
        })
    }

    fn limit(&self, kind: LimitKind, component: usize) -> Result<&ComponentLimit> {
        let limits = self.limits(kind)?;
        limits.get(component).ok_or_else(|| {
            FieldError::argument(format!(
                "component {} out of range for {} components",
                component + 1,
                limits.len()
            ))
        })
    }

    /// Location of the minimum of `component` (0-based), if evaluated.
    pub fn component_minimum_location(&self, component: usize) -> Option<&MeshLocation> {
        self.limit(LimitKind::Minimum, component).ok().map(|l| &l.location)
    }

    pub fn component_maximum_location(&self, component: usize) -> Option<&MeshLocation> {
        self.limit(LimitKind::Maximum, component).ok().map(|l| &l.location)
    }

    fn get_mesh_location(
        &self,
        kind: LimitKind,
        component: usize,
        xi: &mut [f64],
    ) -> Result<ElementHandle> {
        let limit = self.limit(kind, component)?;
        if xi.is_empty() {
            return Err(FieldError::argument("xi buffer is empty"));
        }
        let count = xi.len().min(limit.location.dimension());
        xi[..count].copy_from_slice(&limit.location.xi[..count]);
        Ok(limit.location.element.clone())
    }

    /// Writes the xi of the minimum of `component` into `xi`, as many
    /// coordinates as fit, and returns its element.
    pub fn get_component_minimum_mesh_location(
        &self,
        component: usize,
        xi: &mut [f64],
    ) -> Result<ElementHandle> {
        self.get_mesh_location(LimitKind::Minimum, component, xi)
    }

    pub fn get_component_maximum_mesh_location(
        &self,
        component: usize,
        xi: &mut [f64],
    ) -> Result<ElementHandle> {
        self.get_mesh_location(LimitKind::Maximum, component, xi)
    }

    fn get_values(&self, kind: LimitKind, component: usize, out: &mut [f64]) -> Result<()> {
        let limit = self.limit(kind, component)?;
        let values = &limit.values;
        if out.len() < values.len() {
            return Err(FieldError::argument(format!(
                "value buffer holds {}, field has {} components",
                out.len(),
                values.len()
            )));
        }
        out[..values.len()].copy_from_slice(values);
        Ok(())
    }

    /// Writes all field components evaluated at the minimum of `component`.
    pub fn get_component_minimum_values(&self, component: usize, out: &mut [f64]) -> Result<()> {
        self.get_values(LimitKind::Minimum, component, out)
    }

    pub fn get_component_maximum_values(&self, component: usize, out: &mut [f64]) -> Result<()> {
        self.get_values(LimitKind::Maximum, component, out)
    }

    /// Writes the overall minimum and maximum of each component, taken over
    /// the values recorded at every extremum location, not only its own.
    pub fn get_range(&self, minimum: &mut [f64], maximum: &mut [f64]) -> Result<()> {
        let components = self.limits(LimitKind::Minimum)?.len();
        if minimum.len() < components || maximum.len() < components {
            return Err(FieldError::argument(format!(
                "range buffers hold {} and {}, field has {} components",
                minimum.len(),
                maximum.len(),
                components
            )));
        }
        minimum[..components].fill(f64::INFINITY);
        maximum[..components].fill(f64::NEG_INFINITY);
        for limit in self.minimum.iter().chain(&self.maximum) {
            for (c, &value) in limit.values.iter().enumerate() {
                minimum[c] = minimum[c].min(value);
                maximum[c] = maximum[c].max(value);
            }
        }
        Ok(())
    }

    /// False if any search stopped at the iteration cap, or there is no
    /// valid range.
    pub fn all_converged(&self) -> bool {
        self.valid_range
            && self
                .minimum
                .iter()
                .chain(&self.maximum)
                .all(|limit| limit.converged)
    }

    pub fn summary(&self) -> Result<FieldRangeSummary> {
        let field = self
            .field
            .as_ref()
            .filter(|_| self.valid_range)
            .ok_or_else(|| FieldError::not_found("field range has not been evaluated"))?;
        let components = self
            .minimum
            .iter()
            .zip(&self.maximum)
            .map(|(low, high)| {
                Ok(ComponentRangeSummary {
                    minimum_element: low.location.element.identifier()?,
                    minimum_xi: low.location.xi.clone(),
                    minimum_values: low.values.clone(),
                    maximum_element: high.location.element.identifier()?,
                    maximum_xi: high.location.xi.clone(),
                    maximum_values: high.values.clone(),
                })
            })
            .collect::<Result<Vec<_>>>()?;
        let count = self.minimum.len();
        let mut minimum = vec![0.0; count];
        let mut maximum = vec![0.0; count];
        self.get_range(&mut minimum, &mut maximum)?;
        Ok(FieldRangeSummary {
            field: field.name().to_string(),
            components,
            minimum,
            maximum,
            all_converged: self.all_converged(),
        })
    }
}

/// Keeps, per component, whichever of `best` and `other` holds the better
/// own-component value; `best` wins ties.
fn merge(mut best: ElementRange, other: ElementRange) -> ElementRange {
    for (c, (low, high)) in other.minimum.into_iter().zip(other.maximum).enumerate() {
        if low.values[c] < best.minimum[c].values[c] {
            best.minimum[c] = low;
        }
        if high.values[c] > best.maximum[c].values[c] {
            best.maximum[c] = high;
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::field::Region;
    use crate::shape::ElementShape;
    use approx::assert_abs_diff_eq;

    struct Setup {
        region: Rc<Region>,
        mesh: Rc<Mesh>,
        cache: Rc<FieldCache>,
    }

    fn setup(shapes: &[ElementShape]) -> Setup {
        let region = Region::new("range");
        let mut mesh = Mesh::new(shapes[0].dimension()).unwrap();
        for (i, shape) in shapes.iter().enumerate() {
            mesh.add_element(i as i32 + 1, *shape).unwrap();
        }
        let mesh = Rc::new(mesh);
        let cache = FieldCache::new(&region);
        let element = mesh.element(0).unwrap();
        let centre = vec![0.25; element.dimension().unwrap()];
        cache.set_mesh_location(&element, &centre).unwrap();
        Setup {
            region,
            mesh,
            cache,
        }
    }

    fn evaluated(setup: &Setup, field: &Rc<Field>) -> FieldRange {
        let mut range = setup.cache.create_field_range();
        range.evaluate_range(field).expect("range should evaluate");
        range
    }

    #[test]
    fn quadratic_minimum_is_located() {
        let setup = setup(&[ElementShape::Square]);
        let field = Field::expression(
            &setup.region,
            "bowl",
            &["(xi1 - 0.3)^2 + (xi2 - 0.7)^2"],
            &[],
        )
        .unwrap();
        let range = evaluated(&setup, &field);

        let mut xi = [0.0; 2];
        range.get_component_minimum_mesh_location(0, &mut xi).unwrap();
        assert_abs_diff_eq!(xi[0], 0.3, epsilon = 1e-6);
        assert_abs_diff_eq!(xi[1], 0.7, epsilon = 1e-6);
        let mut value = [f64::NAN];
        range.get_component_minimum_values(0, &mut value).unwrap();
        assert_abs_diff_eq!(value[0], 0.0, epsilon = 1e-11);

        range.get_component_maximum_mesh_location(0, &mut xi).unwrap();
        assert_eq!(xi, [1.0, 0.0]);
        assert!(range.all_converged());
    }

    #[test]
    fn linear_field_extrema_are_clamped_into_element() {
        let setup = setup(&[ElementShape::Triangle]);
        let field = Field::expression(&setup.region, "ramp", &["3 * xi1 - xi2"], &[]).unwrap();
        let range = evaluated(&setup, &field);
        for location in [
            range.component_minimum_location(0).unwrap(),
            range.component_maximum_location(0).unwrap(),
        ] {
            assert!(ElementShape::Triangle.contains(&location.xi, 0.0));
        }
        assert_eq!(range.component_maximum_location(0).unwrap().xi, vec![1.0, 0.0]);
        assert_eq!(range.component_minimum_location(0).unwrap().xi, vec![0.0, 1.0]);
    }

    #[test]
    fn constant_field_range_is_its_value() {
        let setup = setup(&[ElementShape::Cube]);
        let field = Field::constant(&setup.region, "c", &[1.5, -2.0]).unwrap();
        let range = evaluated(&setup, &field);
        let (mut minimum, mut maximum) = ([0.0; 2], [0.0; 2]);
        range.get_range(&mut minimum, &mut maximum).unwrap();
        assert_eq!(minimum, [1.5, -2.0]);
        assert_eq!(maximum, [1.5, -2.0]);
        // searches stop immediately at the first cell corner
        assert_eq!(range.component_minimum_location(1).unwrap().xi, vec![0.0; 3]);
    }

    #[test]
    fn repeated_evaluation_is_identical() {
        let setup = setup(&[ElementShape::Square]);
        let field = Field::expression(
            &setup.region,
            "wave",
            &["sin(3 * xi1) * cos(2 * xi2)", "exp(xi1 * xi2)"],
            &[],
        )
        .unwrap();
        let mut range = setup.cache.create_field_range();
        range.evaluate_range(&field).unwrap();
        let first = range.summary().unwrap();
        range.evaluate_range(&field).unwrap();
        let second = range.summary().unwrap();
        for (a, b) in first.components.iter().zip(&second.components) {
            for (x, y) in a.minimum_xi.iter().zip(&b.minimum_xi) {
                assert_eq!(x.to_bits(), y.to_bits());
            }
            for (x, y) in a.maximum_values.iter().zip(&b.maximum_values) {
                assert_eq!(x.to_bits(), y.to_bits());
            }
        }
        assert_eq!(first, second);
    }

    #[test]
    fn aggregate_range_bounds_every_stored_value() {
        let setup = setup(&[ElementShape::Square]);
        let field = Field::expression(
            &setup.region,
            "coupled",
            &["xi1 - xi2", "xi1 * xi2", "(xi1 - 0.5)^2"],
            &[],
        )
        .unwrap();
        let range = evaluated(&setup, &field);
        let (mut minimum, mut maximum) = ([0.0; 3], [0.0; 3]);
        range.get_range(&mut minimum, &mut maximum).unwrap();
        let mut values = [0.0; 3];
        let getters: [fn(&FieldRange, usize, &mut [f64]) -> Result<()>; 2] = [
            FieldRange::get_component_minimum_values,
            FieldRange::get_component_maximum_values,
        ];
        for component in 0..3 {
            for get in getters {
                get(&range, component, &mut values).unwrap();
                for c in 0..3 {
                    assert!(minimum[c] <= values[c]);
                    assert!(maximum[c] >= values[c]);
                }
            }
        }
        assert_eq!(minimum[0], -1.0);
        assert_eq!(maximum[0], 1.0);
    }

    #[test]
    fn fresh_range_reports_not_found_and_writes_nothing() {
        let setup = setup(&[ElementShape::Square]);
        let range = setup.cache.create_field_range();
        assert!(!range.has_valid_range());
        assert_eq!(range.number_of_components(), 0);
        assert!(range.field().is_none());

        let mut xi = [7.0; 2];
        let err = range.get_component_minimum_mesh_location(0, &mut xi).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
        let err = range.get_component_maximum_mesh_location(0, &mut xi).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
        let mut values = [7.0; 2];
        for err in [
            range.get_component_minimum_values(0, &mut values).unwrap_err(),
            range.get_component_maximum_values(0, &mut values).unwrap_err(),
        ] {
            assert_eq!(err.kind(), ErrorKind::NotFound);
        }
        let (mut minimum, mut maximum) = ([7.0; 2], [7.0; 2]);
        let err = range.get_range(&mut minimum, &mut maximum).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
        assert_eq!(range.summary().unwrap_err().kind(), ErrorKind::NotFound);

        assert_eq!(xi, [7.0; 2]);
        assert_eq!(values, [7.0; 2]);
        assert_eq!(minimum, [7.0; 2]);
        assert_eq!(maximum, [7.0; 2]);
        assert!(range.component_minimum_location(0).is_none());
        assert!(!range.all_converged());
    }

    #[test]
    fn xi_components_reach_element_edges() {
        let setup = setup(&[ElementShape::Square]);
        let field = Field::expression(&setup.region, "coordinates", &["xi1", "xi2"], &[]).unwrap();
        let range = evaluated(&setup, &field);
        assert_eq!(range.number_of_components(), 2);

        let mut xi = [0.0; 2];
        let mut values = [0.0; 2];
        let element = range.get_component_minimum_mesh_location(0, &mut xi).unwrap();
        assert_eq!(element.identifier().unwrap(), 1);
        assert_eq!(xi[0], 0.0);
        range.get_component_minimum_values(0, &mut values).unwrap();
        assert_eq!(values, [0.0, xi[1]]);

        range.get_component_maximum_mesh_location(0, &mut xi).unwrap();
        assert_eq!(xi[0], 1.0);
        range.get_component_maximum_values(0, &mut values).unwrap();
        assert_eq!(values, [1.0, xi[1]]);

        range.get_component_minimum_mesh_location(1, &mut xi).unwrap();
        assert_eq!(xi[1], 0.0);
        range.get_component_maximum_mesh_location(1, &mut xi).unwrap();
        assert_eq!(xi[1], 1.0);
        range.get_component_maximum_values(1, &mut values).unwrap();
        assert_eq!(values, [xi[0], 1.0]);

        let (mut minimum, mut maximum) = ([0.0; 2], [0.0; 2]);
        range.get_range(&mut minimum, &mut maximum).unwrap();
        assert_eq!(minimum, [0.0, 0.0]);
        assert_eq!(maximum, [1.0, 1.0]);
    }

    #[test]
    fn accessors_check_component_and_buffers() {
        let setup = setup(&[ElementShape::Square]);
        let field = Field::expression(&setup.region, "f", &["xi1", "xi2"], &[]).unwrap();
        let range = evaluated(&setup, &field);

        let mut xi = [0.0; 2];
        let err = range.get_component_minimum_mesh_location(2, &mut xi).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Argument);
        let err = range.get_component_minimum_mesh_location(0, &mut []).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Argument);

        let mut short = [0.0; 1];
        range.get_component_maximum_mesh_location(1, &mut short).unwrap();
        let err = range.get_component_maximum_values(0, &mut short).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Argument);
        let err = range.get_range(&mut short, &mut [0.0; 2]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Argument);
    }

    #[test]
    fn node_location_is_not_implemented() {
        let setup = setup(&[ElementShape::Square]);
        let field = Field::expression(&setup.region, "f", &["xi1"], &[]).unwrap();
        setup.cache.set_node(3);
        let mut range = setup.cache.create_field_range();
        let err = range.evaluate_range(&field).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotImplemented);
        assert_eq!(err.status_code(), crate::error::ERROR_NOT_IMPLEMENTED);
        assert!(!range.has_valid_range());
        assert_eq!(setup.cache.location(), Location::Node(3));

        setup.cache.clear_location();
        let err = range.evaluate_range(&field).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Argument);
    }

    #[test]
    fn field_must_be_numerical_and_from_cache_region() {
        let setup = setup(&[ElementShape::Square]);
        let mut range = setup.cache.create_field_range();
        let text = Field::string_constant(&setup.region, "label", "text");
        assert_eq!(range.evaluate_range(&text).unwrap_err().kind(), ErrorKind::Argument);

        let elsewhere = Region::new("elsewhere");
        let field = Field::constant(&elsewhere, "c", &[1.0]).unwrap();
        assert_eq!(range.evaluate_range(&field).unwrap_err().kind(), ErrorKind::Argument);
    }

    #[test]
    fn failed_evaluation_discards_previous_range() {
        let setup = setup(&[ElementShape::Square]);
        let good = Field::expression(&setup.region, "good", &["xi1"], &[]).unwrap();
        let bad = Field::expression(&setup.region, "bad", &["log(xi1 - 0.5)"], &[]).unwrap();
        let mut range = setup.cache.create_field_range();
        range.evaluate_range(&good).unwrap();
        assert!(range.has_valid_range());

        let err = range.evaluate_range(&bad).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::General);
        assert!(!range.has_valid_range());
        assert!(range.field().is_none());
        let mut values = [0.0];
        let err = range.get_component_minimum_values(0, &mut values).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[test]
    fn cache_location_is_restored() {
        let setup = setup(&[ElementShape::Square]);
        let before = setup.cache.location();
        let field = Field::expression(&setup.region, "f", &["xi1 * xi2"], &[]).unwrap();
        let _ = evaluated(&setup, &field);
        assert_eq!(setup.cache.location(), before);
    }

    #[test]
    fn non_convergence_is_reported_not_raised() {
        let _ = env_logger::builder().is_test(true).try_init();
        let setup = setup(&[ElementShape::Line]);
        let field = Field::expression(&setup.region, "wave", &["sin(20 * xi1)"], &[]).unwrap();
        let mut range = setup.cache.create_field_range();
        range
            .set_settings(RangeSettings {
                max_iterations: 1,
                ..Default::default()
            })
            .unwrap();
        range.evaluate_range(&field).unwrap();
        assert!(range.has_valid_range());
        assert!(!range.all_converged());
        assert!(!range.summary().unwrap().all_converged);
    }

    #[test]
    fn settings_are_validated() {
        let setup = setup(&[ElementShape::Line]);
        let mut range = setup.cache.create_field_range();
        let err = range
            .set_settings(RangeSettings {
                cells_per_xi: 0,
                ..Default::default()
            })
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Argument);
        assert_eq!(range.settings(), &RangeSettings::default());
    }

    #[test]
    fn cache_entry_point_checks_range_binding() {
        let setup = setup(&[ElementShape::Square]);
        let field = Field::expression(&setup.region, "f", &["xi1"], &[]).unwrap();
        let mut range = setup.cache.create_field_range();
        setup.cache.evaluate_field_range(&field, &mut range).unwrap();
        assert!(range.has_valid_range());
        assert!(Rc::ptr_eq(range.field().unwrap(), &field));

        let other = FieldCache::new(&setup.region);
        let err = other.evaluate_field_range(&field, &mut range).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Argument);
    }

    #[test]
    fn mesh_range_keeps_best_element() {
        let setup = setup(&[ElementShape::Triangle, ElementShape::Square]);
        let field = Field::expression(&setup.region, "sum", &["xi1 + xi2"], &[]).unwrap();
        let mut range = setup.cache.create_field_range();
        range.evaluate_mesh_range(&field, &setup.mesh).unwrap();

        let summary = range.summary().unwrap();
        assert_eq!(summary.field, "sum");
        let component = &summary.components[0];
        // both elements reach 0 at the origin; the first keeps it
        assert_eq!(component.minimum_element, 1);
        assert_eq!(component.minimum_values, vec![0.0]);
        assert_eq!(component.maximum_element, 2);
        assert_eq!(component.maximum_xi, vec![1.0, 1.0]);
        assert_eq!(summary.maximum, vec![2.0]);
    }

    #[test]
    fn mesh_range_needs_a_defined_element() {
        let setup = setup(&[ElementShape::Line]);
        let field = Field::expression(&setup.region, "f", &["xi1 + xi3"], &[]).unwrap();
        let mut range = setup.cache.create_field_range();
        let err = range.evaluate_mesh_range(&field, &setup.mesh).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);

        let empty = Rc::new(Mesh::new(2).unwrap());
        let field = Field::expression(&setup.region, "g", &["xi1"], &[]).unwrap();
        let err = range.evaluate_mesh_range(&field, &empty).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[test]
    fn summary_serializes() {
        let setup = setup(&[ElementShape::Line]);
        let field = Field::expression(&setup.region, "line", &["2 * xi1 - 1"], &[]).unwrap();
        let range = evaluated(&setup, &field);
        let json = serde_json::to_value(range.summary().unwrap()).unwrap();
        assert_eq!(json["field"], "line");
        assert_eq!(json["minimum"][0], -1.0);
        assert_eq!(json["maximum"][0], 1.0);
        assert_eq!(json["components"][0]["maximum_xi"][0], 1.0);
        assert_eq!(json["all_converged"], true);
    }

    #[test]
    fn argument_errors_keep_previous_range() {
        let setup = setup(&[ElementShape::Square]);
        let field = Field::expression(&setup.region, "f", &["xi1"], &[]).unwrap();
        let mut range = setup.cache.create_field_range();
        range.evaluate_range(&field).unwrap();

        let text = Field::string_constant(&setup.region, "label", "text");
        assert_eq!(range.evaluate_range(&text).unwrap_err().kind(), ErrorKind::Argument);
        let elsewhere = Field::constant(&Region::new("elsewhere"), "c", &[1.0]).unwrap();
        let err = range.evaluate_mesh_range(&elsewhere, &setup.mesh).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Argument);
        setup.cache.clear_location();
        assert_eq!(range.evaluate_range(&field).unwrap_err().kind(), ErrorKind::Argument);

        assert!(range.has_valid_range());
        assert!(Rc::ptr_eq(range.field().unwrap(), &field));
        let mut xi = [0.5; 2];
        range.get_component_maximum_mesh_location(0, &mut xi).unwrap();
        assert_eq!(xi[0], 1.0);
    }

    #[test]
    fn clamped_coordinates_are_positive_zero() {
        let setup = setup(&[ElementShape::Triangle]);
        let field = Field::expression(&setup.region, "ramp", &["xi1 + 2 * xi2"], &[]).unwrap();
        let range = evaluated(&setup, &field);
        let maximum = range.component_maximum_location(0).unwrap();
        assert_eq!(maximum.xi, vec![0.0, 1.0]);
        assert!(maximum.xi.iter().all(|x| x.is_sign_positive()));
        let json = serde_json::to_string(&range.summary().unwrap()).unwrap();
        assert!(!json.contains("-0.0"), "{json}");
    }

    #[test]
    fn wedge_element_range() {
        let setup = setup(&[ElementShape::TriangleLine { linked: (0, 1) }]);
        let field = Field::expression(
            &setup.region,
            "wedge",
            &["xi1 + xi3", "-(xi1 - 0.2)^2 - (xi2 - 0.3)^2 - (xi3 - 0.5)^2"],
            &[],
        )
        .unwrap();
        let range = evaluated(&setup, &field);
        let wedge = ElementShape::TriangleLine { linked: (0, 1) };

        assert_eq!(range.component_maximum_location(0).unwrap().xi, vec![1.0, 0.0, 1.0]);
        assert_eq!(range.component_minimum_location(0).unwrap().xi[0], 0.0);
        assert_eq!(range.component_minimum_location(0).unwrap().xi[2], 0.0);

        let peak = range.component_maximum_location(1).unwrap();
        assert_abs_diff_eq!(peak.xi[0], 0.2, epsilon = 1e-5);
        assert_abs_diff_eq!(peak.xi[1], 0.3, epsilon = 1e-5);
        assert_abs_diff_eq!(peak.xi[2], 0.5, epsilon = 1e-5);
        for c in 0..2 {
            for location in [
                range.component_minimum_location(c).unwrap(),
                range.component_maximum_location(c).unwrap(),
            ] {
                assert!(wedge.contains(&location.xi, 0.0));
            }
        }
        assert!(range.all_converged());
    }
}
