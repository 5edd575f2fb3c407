//! Solver configuration.

use super::flux::{BoundaryCondition, FluxType};
use super::integrator::TimeScheme;
use super::operator::Execution;
use crate::{Error, Result};

/// Default number of steps between probe samples.
pub const DEFAULT_VISUALIZATION_STRIDE: u64 = 100;

/// Default polynomial order of the nodal basis.
pub const DEFAULT_ORDER: usize = 3;

/// Flat solver configuration, read-only once handed to a [`Solver`](super::Solver).
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct Options {
    /// Final simulated time
    pub t_final: f64,
    /// Time step
    pub dt: f64,
    /// Numerical flux across faces
    pub flux_type: FluxType,
    /// Treatment of boundary faces
    pub boundary_condition: BoundaryCondition,
    /// Steps between probe samples and observer callbacks
    pub visualization_stride: u64,
    /// Polynomial order of the nodal basis
    pub order: usize,
    /// Time-stepping scheme
    pub integrator: TimeScheme,
    /// Serial or threaded operator evaluation
    pub execution: Execution,
    /// Draw a progress bar while running
    pub show_progress: bool,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            t_final: 1.0,
            dt: 1e-3,
            flux_type: FluxType::default(),
            boundary_condition: BoundaryCondition::default(),
            visualization_stride: DEFAULT_VISUALIZATION_STRIDE,
            order: DEFAULT_ORDER,
            integrator: TimeScheme::default(),
            execution: Execution::default(),
            show_progress: true,
        }
    }
}

impl Options {
    /// Options running to `t_final` with step `dt`, defaults elsewhere.
    pub fn new(t_final: f64, dt: f64) -> Self {
        Self {
            t_final,
            dt,
            ..Self::default()
        }
    }

    /// Set the numerical flux.
    pub fn with_flux_type(mut self, flux_type: FluxType) -> Self {
        self.flux_type = flux_type;
        self
    }

    /// Set the boundary condition.
    pub fn with_boundary_condition(mut self, boundary_condition: BoundaryCondition) -> Self {
        self.boundary_condition = boundary_condition;
        self
    }

    /// Set the sampling stride.
    pub fn with_visualization_stride(mut self, stride: u64) -> Self {
        self.visualization_stride = stride;
        self
    }

    /// Set the polynomial order.
    pub fn with_order(mut self, order: usize) -> Self {
        self.order = order;
        self
    }

    /// Set the time-stepping scheme.
    pub fn with_integrator(mut self, integrator: TimeScheme) -> Self {
        self.integrator = integrator;
        self
    }

    /// Set serial or parallel evaluation.
    pub fn with_execution(mut self, execution: Execution) -> Self {
        self.execution = execution;
        self
    }

    /// Enable or disable the progress bar.
    pub fn with_show_progress(mut self, show_progress: bool) -> Self {
        self.show_progress = show_progress;
        self
    }

    /// Check value ranges.
    pub fn validate(&self) -> Result<()> {
        if !(self.t_final.is_finite() && self.t_final > 0.0) {
            return Err(Error::Config(format!(
                "t_final must be positive (got {})",
                self.t_final
            )));
        }
        if !(self.dt.is_finite() && self.dt > 0.0) {
            return Err(Error::Config(format!("dt must be positive (got {})", self.dt)));
        }
        if self.visualization_stride == 0 {
            return Err(Error::Config("visualization_stride must be at least 1".into()));
        }
        if self.order == 0 {
            return Err(Error::Config("polynomial order must be at least 1".into()));
        }
        Ok(())
    }

    /// Number of steps and the length of the last one.
    ///
    /// The step count is `ceil(t_final / dt)`. The last step is shortened to
    /// end exactly on `t_final` only when a full step would overshoot it by
    /// more than half a step.
    pub fn schedule(&self) -> (u64, f64) {
        let steps = ((self.t_final / self.dt) - 1e-9).ceil().max(1.0) as u64;
        let remainder = self.t_final - (steps - 1) as f64 * self.dt;
        let last = if remainder < 0.5 * self.dt {
            remainder
        } else {
            self.dt
        };
        (steps, last)
    }
}
