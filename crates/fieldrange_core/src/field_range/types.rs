use crate::error::{FieldError, Result};
use crate::location::MeshLocation;
use serde::{Deserialize, Serialize};

/// Which end of a component's range to search for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LimitKind {
    Minimum,
    Maximum,
}

/// Numeric controls for range evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RangeSettings {
    /// Iteration cap for one extremum search.
    pub max_iterations: usize,
    /// Steps and xi changes below this are converged.
    pub xi_tolerance: f64,
    /// Largest step along the search direction for early iterations.
    pub max_delta_xi: f64,
    pub reduce_step_after: usize,
    pub reduced_max_delta_xi: f64,
    pub final_step_after: usize,
    pub final_max_delta_xi: f64,
    /// Cells per xi direction for the cell-corner starting grid.
    pub cells_per_xi: usize,
}

impl Default for RangeSettings {
    fn default() -> Self {
        Self {
            max_iterations: 100,
            xi_tolerance: 1.0e-6,
            max_delta_xi: 0.2,
            reduce_step_after: 5,
            reduced_max_delta_xi: 0.1,
            final_step_after: 20,
            final_max_delta_xi: 0.05,
            cells_per_xi: 2,
        }
    }
}

impl RangeSettings {
    pub fn validate(&self) -> Result<()> {
        if self.max_iterations == 0 {
            return Err(FieldError::argument("max_iterations must be greater than zero"));
        }
        if self.cells_per_xi == 0 {
            return Err(FieldError::argument("cells_per_xi must be greater than zero"));
        }
        let positive = [
            ("xi_tolerance", self.xi_tolerance),
            ("max_delta_xi", self.max_delta_xi),
            ("reduced_max_delta_xi", self.reduced_max_delta_xi),
            ("final_max_delta_xi", self.final_max_delta_xi),
        ];
        for (name, value) in positive {
            if !(value.is_finite() && value > 0.0) {
                return Err(FieldError::argument(format!(
                    "{name} must be positive, got {value}"
                )));
            }
        }
        Ok(())
    }

    /// Step cap after `iteration` completed iterations.
    pub fn max_delta_xi_at(&self, iteration: usize) -> f64 {
        if iteration >= self.final_step_after {
            self.final_max_delta_xi
        } else if iteration >= self.reduce_step_after {
            self.reduced_max_delta_xi
        } else {
            self.max_delta_xi
        }
    }
}

/// Outcome of one extremum search for one component.
#[derive(Debug, Clone, PartialEq)]
pub struct ComponentLimit {
    pub location: MeshLocation,
    /// All field components evaluated at `location`.
    pub values: Vec<f64>,
    pub iterations: usize,
    /// False if the search stopped at the iteration cap.
    pub converged: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComponentRangeSummary {
    pub minimum_element: i32,
    pub minimum_xi: Vec<f64>,
    pub minimum_values: Vec<f64>,
    pub maximum_element: i32,
    pub maximum_xi: Vec<f64>,
    pub maximum_values: Vec<f64>,
}

/// Plain snapshot of a valid range, detached from meshes and caches.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldRangeSummary {
    pub field: String,
    pub components: Vec<ComponentRangeSummary>,
    pub minimum: Vec<f64>,
    pub maximum: Vec<f64>,
    pub all_converged: bool,
}
