//! Reference element shapes: xi domain membership, clamping and
//! cell-corner sampling.
use crate::error::{FieldError, Result};
use serde::{Deserialize, Serialize};

/// Largest element dimension supported.
pub const MAXIMUM_ELEMENT_XI_DIMENSIONS: usize = 3;

/// Rounding allowance when checking a location lies inside its element.
pub const LOCATION_TOLERANCE: f64 = 1.0e-12;

/// Xi coordinates padded to three entries; unused trailing entries are 0.
pub type XiTriple = [f64; MAXIMUM_ELEMENT_XI_DIMENSIONS];

/// Reference domain of an element.
///
/// Line-based shapes span `[0, 1]` in each xi direction. Simplex shapes
/// additionally require the linked xi coordinates to sum to at most 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ElementShape {
    Line,
    Square,
    Triangle,
    Cube,
    Tetrahedron,
    /// Triangle in the two `linked` xi directions, line in the remaining one.
    TriangleLine { linked: (usize, usize) },
}

impl ElementShape {
    pub fn dimension(&self) -> usize {
        match self {
            ElementShape::Line => 1,
            ElementShape::Square | ElementShape::Triangle => 2,
            ElementShape::Cube | ElementShape::Tetrahedron | ElementShape::TriangleLine { .. } => 3,
        }
    }

    /// Checks the shape is well formed (wedge linkage names two distinct
    /// directions out of three).
    pub fn validate(&self) -> Result<()> {
        if let ElementShape::TriangleLine { linked: (a, b) } = *self {
            if a == b || a >= 3 || b >= 3 {
                return Err(FieldError::argument(format!(
                    "invalid triangle-line linkage ({a}, {b})"
                )));
            }
        }
        Ok(())
    }

    /// Xi directions tied together by a simplex constraint.
    fn simplex_directions(&self) -> &'static [usize] {
        match self {
            ElementShape::Triangle => &[0, 1],
            ElementShape::Tetrahedron => &[0, 1, 2],
            ElementShape::TriangleLine { linked } => match linked {
                (0, 1) | (1, 0) => &[0, 1],
                (0, 2) | (2, 0) => &[0, 2],
                _ => &[1, 2],
            },
            _ => &[],
        }
    }

    fn line_direction(&self) -> Option<usize> {
        match self {
            ElementShape::TriangleLine { .. } => {
                let linked = self.simplex_directions();
                (0..3).find(|i| !linked.contains(i))
            }
            _ => None,
        }
    }

    /// Returns true if `xi` is inside the shape, allowing `tolerance` outside.
    pub fn contains(&self, xi: &[f64], tolerance: f64) -> bool {
        if xi.len() != self.dimension() {
            return false;
        }
        if xi.iter().any(|&x| !(x >= -tolerance && x <= 1.0 + tolerance)) {
            return false;
        }
        let simplex = self.simplex_directions();
        if simplex.is_empty() {
            return true;
        }
        simplex.iter().map(|&i| xi[i]).sum::<f64>() <= 1.0 + tolerance
    }

    /// Moves `xi` onto the nearest face if it lies further than `tolerance`
    /// outside the shape. Simplex excess is removed equally from the linked
    /// directions, repeating over the directions not yet at their lower
    /// bound, before each coordinate is limited to `[-tolerance, 1 + tolerance]`.
    pub fn limit_xi(&self, xi: &mut [f64], tolerance: f64) -> Result<()> {
        let dimension = self.dimension();
        if xi.len() < dimension {
            return Err(FieldError::argument(format!(
                "xi has {} coordinates, shape needs {}",
                xi.len(),
                dimension
            )));
        }
        // 0.0 - tolerance keeps a zero lower bound at +0.0
        let lower = 0.0 - tolerance;
        let upper = 1.0 + tolerance;
        let simplex = self.simplex_directions();
        for pass in 0..simplex.len() {
            let excess = simplex.iter().map(|&i| xi[i]).sum::<f64>() - 1.0 - tolerance;
            if excess <= 0.0 {
                break;
            }
            let free: Vec<usize> = simplex
                .iter()
                .copied()
                .filter(|&i| pass == 0 || xi[i] > lower)
                .collect();
            if free.is_empty() {
                break;
            }
            let share = excess / free.len() as f64;
            for &i in &free {
                xi[i] -= share;
            }
            for &i in simplex {
                if xi[i] < lower {
                    xi[i] = lower;
                }
            }
        }
        for x in xi.iter_mut().take(dimension) {
            if *x < lower {
                *x = lower;
            } else if *x > upper {
                *x = upper;
            }
        }
        Ok(())
    }

    /// Xi locations at the corners of a uniform grid of cells over the shape,
    /// `number_in_xi[i]` cells in direction `i`. Simplex shapes use the
    /// largest count among their linked directions.
    pub fn cell_corner_points(&self, number_in_xi: &[usize]) -> Result<Vec<XiTriple>> {
        let dimension = self.dimension();
        if number_in_xi.len() < dimension {
            return Err(FieldError::general(format!(
                "cell corner sampling needs {} cell counts, got {}",
                dimension,
                number_in_xi.len()
            )));
        }
        if let Some(i) = number_in_xi[..dimension].iter().position(|&n| n == 0) {
            return Err(FieldError::general(format!(
                "non-positive number of cells in xi{}",
                i + 1
            )));
        }
        let fraction = |i: usize, n: usize| i as f64 / n as f64;
        let simplex_n = self
            .simplex_directions()
            .iter()
            .map(|&i| number_in_xi[i])
            .max()
            .unwrap_or(0);

        let mut points = Vec::new();
        match self {
            ElementShape::Line => {
                let n0 = number_in_xi[0];
                for i in 0..=n0 {
                    points.push([fraction(i, n0), 0.0, 0.0]);
                }
            }
            ElementShape::Square => {
                let (n0, n1) = (number_in_xi[0], number_in_xi[1]);
                for j in 0..=n1 {
                    for i in 0..=n0 {
                        points.push([fraction(i, n0), fraction(j, n1), 0.0]);
                    }
                }
            }
            ElementShape::Cube => {
                let (n0, n1, n2) = (number_in_xi[0], number_in_xi[1], number_in_xi[2]);
                for k in 0..=n2 {
                    for j in 0..=n1 {
                        for i in 0..=n0 {
                            points.push([fraction(i, n0), fraction(j, n1), fraction(k, n2)]);
                        }
                    }
                }
            }
            ElementShape::Triangle => {
                let n = simplex_n;
                for j in 0..=n {
                    for i in 0..=(n - j) {
                        points.push([fraction(i, n), fraction(j, n), 0.0]);
                    }
                }
            }
            ElementShape::Tetrahedron => {
                let n = simplex_n;
                for k in 0..=n {
                    for j in 0..=(n - k) {
                        for i in 0..=(n - k - j) {
                            points.push([fraction(i, n), fraction(j, n), fraction(k, n)]);
                        }
                    }
                }
            }
            ElementShape::TriangleLine { .. } => {
                let n = simplex_n;
                let linked = self.simplex_directions();
                let line = self.line_direction().ok_or_else(|| {
                    FieldError::general("triangle-line shape has no line direction")
                })?;
                let n_line = number_in_xi[line];
                for k in 0..=n_line {
                    for j in 0..=n {
                        for i in 0..=(n - j) {
                            let mut xi = [0.0; MAXIMUM_ELEMENT_XI_DIMENSIONS];
                            xi[linked[0]] = fraction(i, n);
                            xi[linked[1]] = fraction(j, n);
                            xi[line] = fraction(k, n_line);
                            points.push(xi);
                        }
                    }
                }
            }
        }
        Ok(points)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn square_corners_run_xi1_fastest() {
        let points = ElementShape::Square
            .cell_corner_points(&[2, 2, 2])
            .expect("sampling should succeed");
        assert_eq!(points.len(), 9);
        assert_eq!(points[0], [0.0, 0.0, 0.0]);
        assert_eq!(points[1], [0.5, 0.0, 0.0]);
        assert_eq!(points[3], [0.0, 0.5, 0.0]);
        assert_eq!(points[8], [1.0, 1.0, 0.0]);
    }

    #[test]
    fn simplex_point_counts() {
        let triangle = ElementShape::Triangle.cell_corner_points(&[2, 1]).unwrap();
        assert_eq!(triangle.len(), 6);
        assert!(triangle.iter().all(|xi| xi[0] + xi[1] <= 1.0));

        let tetrahedron = ElementShape::Tetrahedron
            .cell_corner_points(&[2, 2, 2])
            .unwrap();
        assert_eq!(tetrahedron.len(), 10);
        assert!(tetrahedron
            .iter()
            .all(|xi| ElementShape::Tetrahedron.contains(xi, 0.0)));

        let wedge = ElementShape::TriangleLine { linked: (1, 2) };
        let points = wedge.cell_corner_points(&[3, 2, 2]).unwrap();
        assert_eq!(points.len(), 6 * 4);
        assert!(points.iter().all(|xi| xi[1] + xi[2] <= 1.0));
        assert_eq!(points[23][0], 1.0);
    }

    #[test]
    fn sampling_rejects_zero_cells() {
        let err = ElementShape::Cube.cell_corner_points(&[2, 0, 2]).unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::General);
        assert!(ElementShape::Square.cell_corner_points(&[2]).is_err());
    }

    #[test]
    fn limit_xi_clamps_to_unit_box() {
        let mut xi = [-0.2, 1.4];
        ElementShape::Square.limit_xi(&mut xi, 0.0).unwrap();
        assert_eq!(xi, [0.0, 1.0]);
        assert!(xi[0].is_sign_positive());
    }

    #[test]
    fn limit_xi_lower_bound_is_positive_zero() {
        let mut xi = [0.3, -0.05, 0.9];
        ElementShape::Tetrahedron.limit_xi(&mut xi, 0.0).unwrap();
        assert_eq!(xi[1].to_bits(), 0.0f64.to_bits());
        assert!(xi.iter().all(|x| x.is_sign_positive()));
    }

    #[test]
    fn limit_xi_projects_onto_simplex_face() {
        let mut xi = [0.8, 0.6];
        ElementShape::Triangle.limit_xi(&mut xi, 0.0).unwrap();
        assert!((xi[0] - 0.6).abs() < 1e-15);
        assert!((xi[1] - 0.4).abs() < 1e-15);
        assert!(ElementShape::Triangle.contains(&xi, 1e-12));
    }

    #[test]
    fn limit_xi_keeps_clamped_tetrahedron_points_inside() {
        let mut xi = [1.5, -0.3, 0.2];
        ElementShape::Tetrahedron.limit_xi(&mut xi, 0.0).unwrap();
        assert!(ElementShape::Tetrahedron.contains(&xi, LOCATION_TOLERANCE));
        assert!((xi[0] - 1.0).abs() < 1e-12);
        assert_eq!(xi[1], 0.0);
        assert!(xi[2].abs() < 1e-12);
    }

    #[test]
    fn limit_xi_leaves_interior_points() {
        let mut xi = [0.25, 0.5, 0.125];
        ElementShape::Tetrahedron.limit_xi(&mut xi, 0.0).unwrap();
        assert_eq!(xi, [0.25, 0.5, 0.125]);
    }

    #[test]
    fn wedge_linkage_must_be_distinct() {
        assert!(ElementShape::TriangleLine { linked: (0, 0) }.validate().is_err());
        assert!(ElementShape::TriangleLine { linked: (0, 3) }.validate().is_err());
        assert!(ElementShape::TriangleLine { linked: (2, 0) }.validate().is_ok());
    }
}
