use crate::error::{FieldError, Result};
use crate::shape::{ElementShape, MAXIMUM_ELEMENT_XI_DIMENSIONS};
use std::fmt;
use std::rc::{Rc, Weak};

/// Highest derivative order any mesh can supply.
pub const MAXIMUM_DERIVATIVE_ORDER: usize = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Element {
    pub identifier: i32,
    pub shape: ElementShape,
}

/// Derivatives of a field with respect to the xi coordinates of a mesh.
/// Evaluated tensors have `term_count()` terms per component.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldDerivative {
    mesh_dimension: usize,
    order: usize,
}

impl FieldDerivative {
    pub fn mesh_dimension(&self) -> usize {
        self.mesh_dimension
    }

    pub fn order(&self) -> usize {
        self.order
    }

    pub fn term_count(&self) -> usize {
        self.mesh_dimension.pow(self.order as u32)
    }
}

/// A set of elements of one dimension.
#[derive(Debug)]
pub struct Mesh {
    dimension: usize,
    elements: Vec<Element>,
    maximum_derivative_order: usize,
}

impl Mesh {
    pub fn new(dimension: usize) -> Result<Self> {
        if dimension == 0 || dimension > MAXIMUM_ELEMENT_XI_DIMENSIONS {
            return Err(FieldError::argument(format!(
                "mesh dimension must be 1 to {MAXIMUM_ELEMENT_XI_DIMENSIONS}, got {dimension}"
            )));
        }
        Ok(Self {
            dimension,
            elements: Vec::new(),
            maximum_derivative_order: MAXIMUM_DERIVATIVE_ORDER,
        })
    }

    /// Limits the derivative orders this mesh hands out through
    /// [`Mesh::field_derivative`].
    pub fn with_maximum_derivative_order(mut self, order: usize) -> Result<Self> {
        if order > MAXIMUM_DERIVATIVE_ORDER {
            return Err(FieldError::argument(format!(
                "derivative order {order} exceeds maximum {MAXIMUM_DERIVATIVE_ORDER}"
            )));
        }
        self.maximum_derivative_order = order;
        Ok(self)
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }

    pub fn size(&self) -> usize {
        self.elements.len()
    }

    /// Appends an element and returns its index in the element table.
    pub fn add_element(&mut self, identifier: i32, shape: ElementShape) -> Result<usize> {
        shape.validate()?;
        if shape.dimension() != self.dimension {
            return Err(FieldError::argument(format!(
                "{shape:?} element does not fit a {}-D mesh",
                self.dimension
            )));
        }
        if self.elements.iter().any(|e| e.identifier == identifier) {
            return Err(FieldError::argument(format!(
                "element identifier {identifier} already in use"
            )));
        }
        self.elements.push(Element { identifier, shape });
        Ok(self.elements.len() - 1)
    }

    pub fn element_at(&self, index: usize) -> Option<&Element> {
        self.elements.get(index)
    }

    pub fn element(self: &Rc<Self>, index: usize) -> Option<ElementHandle> {
        (index < self.elements.len()).then(|| ElementHandle {
            mesh: Rc::downgrade(self),
            index,
        })
    }

    pub fn find_element_by_identifier(self: &Rc<Self>, identifier: i32) -> Option<ElementHandle> {
        let index = self.elements.iter().position(|e| e.identifier == identifier)?;
        self.element(index)
    }

    pub fn elements(self: &Rc<Self>) -> impl Iterator<Item = ElementHandle> + '_ {
        (0..self.elements.len()).map(move |index| ElementHandle {
            mesh: Rc::downgrade(self),
            index,
        })
    }

    /// Derivative descriptor for `order`, or `None` if the mesh cannot
    /// supply derivatives of that order.
    pub fn field_derivative(&self, order: usize) -> Option<FieldDerivative> {
        (order >= 1 && order <= self.maximum_derivative_order).then_some(FieldDerivative {
            mesh_dimension: self.dimension,
            order,
        })
    }
}

/// Non-owning reference to an element: the owning mesh plus the index into
/// its element table. The mesh controls the element's lifetime.
#[derive(Clone)]
pub struct ElementHandle {
    mesh: Weak<Mesh>,
    index: usize,
}

impl ElementHandle {
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn mesh(&self) -> Result<Rc<Mesh>> {
        self.mesh
            .upgrade()
            .ok_or_else(|| FieldError::general("element's mesh no longer exists"))
    }

    pub fn element(&self) -> Result<Element> {
        let mesh = self.mesh()?;
        mesh.element_at(self.index)
            .copied()
            .ok_or_else(|| FieldError::general(format!("no element at index {}", self.index)))
    }

    pub fn identifier(&self) -> Result<i32> {
        Ok(self.element()?.identifier)
    }

    pub fn shape(&self) -> Result<ElementShape> {
        Ok(self.element()?.shape)
    }

    pub fn dimension(&self) -> Result<usize> {
        Ok(self.shape()?.dimension())
    }

    pub fn belongs_to(&self, mesh: &Rc<Mesh>) -> bool {
        std::ptr::eq(self.mesh.as_ptr(), Rc::as_ptr(mesh))
    }
}

impl PartialEq for ElementHandle {
    fn eq(&self, other: &Self) -> bool {
        self.index == other.index && Weak::ptr_eq(&self.mesh, &other.mesh)
    }
}

impl fmt::Debug for ElementHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.identifier() {
            Ok(identifier) => write!(f, "Element({identifier})"),
            Err(_) => write!(f, "Element(index {}, detached)", self.index),
        }
    }
}
