use super::component_limit::find_component_limit;
use super::types::{ComponentLimit, LimitKind, RangeSettings};
use crate::cache::FieldCache;
use crate::error::{FieldError, Result};
use crate::field::Field;
use crate::mesh::ElementHandle;
use crate::shape::MAXIMUM_ELEMENT_XI_DIMENSIONS;

/// Per-component extrema of a field over one element, in component order.
#[derive(Debug, Clone, PartialEq)]
pub struct ElementRange {
    pub minimum: Vec<ComponentLimit>,
    pub maximum: Vec<ComponentLimit>,
}

/// Sample indices of the smallest and largest value of each component.
/// `values` holds `components` values per sample. Ties keep the earlier sample.
fn coarse_limits(values: &[f64], components: usize) -> Vec<(usize, usize)> {
    (0..components)
        .map(|c| {
            let mut low = 0;
            let mut high = 0;
            for (sample, row) in values.chunks_exact(components).enumerate() {
                if row[c] < values[low * components + c] {
                    low = sample;
                }
                if row[c] > values[high * components + c] {
                    high = sample;
                }
            }
            (low, high)
        })
        .collect()
}

/// Finds the minimum and maximum of every component of `field` over
/// `element`.
///
/// The element is sampled at cell corners, the best sample of each component
/// seeds a minimum and a maximum search, and every search must succeed. The
/// cache is moved around the element while searching.
pub fn evaluate_element_range(
    field: &Field,
    element: &ElementHandle,
    cache: &FieldCache,
    settings: &RangeSettings,
) -> Result<ElementRange> {
    settings.validate()?;
    let components = cache.check_field(field)?.number_of_components();
    let shape = element.shape()?;
    let dimension = shape.dimension();
    let samples = shape.cell_corner_points(&[settings.cells_per_xi; MAXIMUM_ELEMENT_XI_DIMENSIONS])?;
    if samples.is_empty() {
        return Err(FieldError::general("cell corner sampling produced no points"));
    }

    let mut values = vec![0.0; samples.len() * components];
    for (xi, row) in samples.iter().zip(values.chunks_exact_mut(components)) {
        cache.set_mesh_location(element, &xi[..dimension])?;
        cache.evaluate_real(field, row)?;
    }

    let mut range = ElementRange {
        minimum: Vec::with_capacity(components),
        maximum: Vec::with_capacity(components),
    };
    for (component, (low, high)) in coarse_limits(&values, components).into_iter().enumerate() {
        range.minimum.push(find_component_limit(
            field,
            component,
            element,
            cache,
            &samples[low][..dimension],
            LimitKind::Minimum,
            settings,
        )?);
        range.maximum.push(find_component_limit(
            field,
            component,
            element,
            cache,
            &samples[high][..dimension],
            LimitKind::Maximum,
            settings,
        )?);
    }
    Ok(range)
}
