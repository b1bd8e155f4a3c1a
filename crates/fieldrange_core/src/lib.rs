pub mod autodiff;
pub mod cache;
pub mod equation_engine;
pub mod error;
pub mod field;
pub mod field_range;
pub mod location;
pub mod mesh;
pub mod shape;
/// The `fieldrange_core` crate finds the per-component minimum and maximum of
/// a field over a finite element or a whole mesh.
///
/// Key components:
/// - **Field Range**: `FieldRange` container, element range evaluation from a
///   cell-corner starting grid, and the damped curvature-guided extremum search.
/// - **Fields**: constant and expression fields evaluated through a `FieldCache`.
/// - **Equation Engine**: a bytecode VM for user-supplied component expressions.
/// - **Autodiff**: `Dual` and `HyperDual` numbers for exact first and second xi derivatives.
/// - **Meshes**: element shapes, xi clamping and sampling, derivative descriptors.
pub mod traits;

pub use cache::FieldCache;
pub use error::{ErrorKind, FieldError, Result};
pub use field::{Field, Region};
pub use field_range::{FieldRange, FieldRangeSummary, LimitKind, RangeSettings};
pub use location::{Location, MeshLocation};
pub use mesh::{ElementHandle, Mesh};
pub use shape::ElementShape;
