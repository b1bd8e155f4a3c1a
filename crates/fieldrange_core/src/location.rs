use crate::error::{FieldError, Result};
use crate::mesh::ElementHandle;
use crate::shape::LOCATION_TOLERANCE;

/// A point in an element: the element plus its xi coordinates.
#[derive(Debug, Clone, PartialEq)]
pub struct MeshLocation {
    pub element: ElementHandle,
    pub xi: Vec<f64>,
}

impl MeshLocation {
    /// Builds a location, checking `xi` matches the element dimension and
    /// lies inside the element shape.
    pub fn new(element: ElementHandle, xi: &[f64]) -> Result<Self> {
        let shape = element.shape()?;
        if xi.len() != shape.dimension() {
            return Err(FieldError::argument(format!(
                "{} xi values given for a {}-D element",
                xi.len(),
                shape.dimension()
            )));
        }
        if !shape.contains(xi, LOCATION_TOLERANCE) {
            return Err(FieldError::argument(format!(
                "xi {xi:?} is outside the {shape:?} element"
            )));
        }
        Ok(Self {
            element,
            xi: xi.to_vec(),
        })
    }

    pub fn dimension(&self) -> usize {
        self.xi.len()
    }
}

/// Where a field cache currently evaluates.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Location {
    #[default]
    None,
    Element(MeshLocation),
    /// A node, by identifier. Fields here are not evaluated by this crate.
    Node(i32),
}

impl Location {
    pub fn mesh_location(&self) -> Option<&MeshLocation> {
        match self {
            Location::Element(location) => Some(location),
            _ => None,
        }
    }
}
