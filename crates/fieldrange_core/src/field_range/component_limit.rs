use super::types::{ComponentLimit, LimitKind, RangeSettings};
use crate::cache::FieldCache;
use crate::error::{FieldError, Result};
use crate::field::Field;
use crate::location::MeshLocation;
use crate::mesh::ElementHandle;
use log::{trace, warn};
use nalgebra::{DMatrix, DVector};

/// Searches one element for the minimum or maximum of one field component,
/// starting from `initial_xi`.
///
/// Each iteration takes a step along the normalised gradient of the
/// component. The step is the vertex `-b / 2a` of the quadratic model given
/// by the gradient magnitude `b` and directional curvature `a` when the
/// curvature sign suits the search, otherwise the full step cap; it is
/// always limited to the cap for the current iteration. Xi is clamped to the
/// element after every step. Reaching the iteration cap is not an error: the
/// last xi is used and `converged` is false.
///
/// The returned values hold every field component at the final location.
/// The cache is left at that location.
pub fn find_component_limit(
    field: &Field,
    component: usize,
    element: &ElementHandle,
    cache: &FieldCache,
    initial_xi: &[f64],
    kind: LimitKind,
    settings: &RangeSettings,
) -> Result<ComponentLimit> {
    settings.validate()?;
    let evaluator = cache.check_field(field)?;
    let components = evaluator.number_of_components();
    if component >= components {
        return Err(FieldError::argument(format!(
            "component {} out of range for {} components",
            component + 1,
            components
        )));
    }
    let mesh = element.mesh()?;
    let shape = element.shape()?;
    let dimension = shape.dimension();
    if initial_xi.len() != dimension {
        return Err(FieldError::argument(format!(
            "initial xi has {} values, element is {}-D",
            initial_xi.len(),
            dimension
        )));
    }
    let (first, second) = match (mesh.field_derivative(1), mesh.field_derivative(2)) {
        (Some(first), Some(second)) => (first, second),
        _ => {
            return Err(FieldError::general(
                "mesh does not supply first and second field derivatives",
            ))
        }
    };

    let first_terms = first.term_count();
    let second_terms = second.term_count();
    let mut first_values = vec![0.0; components * first_terms];
    let mut second_values = vec![0.0; components * second_terms];
    let mut xi = initial_xi.to_vec();
    let mut iterations = 0;
    let mut converged = false;

    while iterations < settings.max_iterations {
        cache.set_mesh_location(element, &xi)?;
        cache.evaluate_derivative(field, &first, &mut first_values)?;
        let offset = component * first_terms;
        let gradient = DVector::from_column_slice(&first_values[offset..offset + first_terms]);
        let b = gradient.norm();
        if b == 0.0 {
            converged = true;
            break;
        }
        let direction = gradient / b;

        cache.evaluate_derivative(field, &second, &mut second_values)?;
        let offset = component * second_terms;
        let hessian = DMatrix::from_row_slice(
            dimension,
            dimension,
            &second_values[offset..offset + second_terms],
        );
        let a = direction.dot(&(&hessian * &direction));

        let max_delta_xi = settings.max_delta_xi_at(iterations);
        let favourable = match kind {
            LimitKind::Minimum => a > 0.0,
            LimitKind::Maximum => a < 0.0,
        };
        let step = if favourable {
            (-b / (2.0 * a)).clamp(-max_delta_xi, max_delta_xi)
        } else {
            match kind {
                LimitKind::Minimum => -max_delta_xi,
                LimitKind::Maximum => max_delta_xi,
            }
        };

        let previous = xi.clone();
        for (x, d) in xi.iter_mut().zip(direction.iter()) {
            *x += step * d;
        }
        shape.limit_xi(&mut xi, 0.0)?;
        iterations += 1;
        trace!(
            "{kind:?} of component {}: iteration {iterations} xi {xi:?} step {step} curvature {a}",
            component + 1
        );

        if step.abs() < settings.xi_tolerance
            || xi
                .iter()
                .zip(&previous)
                .all(|(x, p)| (x - p).abs() < settings.xi_tolerance)
        {
            converged = true;
            break;
        }
    }

    if !converged {
        warn!(
            "{kind:?} of component {} of field \"{}\" did not converge in {} iterations; using xi {:?}",
            component + 1,
            field.name(),
            settings.max_iterations,
            xi
        );
    }

    let location = MeshLocation::new(element.clone(), &xi)?;
    cache.set_mesh_location(element, &xi)?;
    let mut values = vec![0.0; components];
    cache.evaluate_real(field, &mut values)?;
    Ok(ComponentLimit {
        location,
        values,
        iterations,
        converged,
    })
}
