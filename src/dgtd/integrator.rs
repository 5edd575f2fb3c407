//! Explicit time integration of the semi-discrete system.

use super::operator::EvolutionOperator;
use crate::arrays::FieldState;

/// Explicit time-stepping scheme.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum TimeScheme {
    /// First order; unstable with centered fluxes.
    ForwardEuler,
    /// Classical four-stage, fourth-order Runge-Kutta.
    #[default]
    RungeKutta4,
    /// Carpenter-Kennedy five-stage, fourth-order low-storage Runge-Kutta.
    LowStorageRk4,
}

impl TimeScheme {
    /// Order of accuracy.
    pub fn order(self) -> usize {
        match self {
            TimeScheme::ForwardEuler => 1,
            TimeScheme::RungeKutta4 | TimeScheme::LowStorageRk4 => 4,
        }
    }

    /// Operator evaluations per step.
    pub fn stages(self) -> usize {
        match self {
            TimeScheme::ForwardEuler => 1,
            TimeScheme::RungeKutta4 => 4,
            TimeScheme::LowStorageRk4 => 5,
        }
    }
}

const LSRK_A: [f64; 5] = [
    0.0,
    -567301805773.0 / 1357537059087.0,
    -2404267990393.0 / 2016746695238.0,
    -3550918686646.0 / 2091501179385.0,
    -1275806237668.0 / 842570457699.0,
];

const LSRK_B: [f64; 5] = [
    1432997174477.0 / 9575080441755.0,
    5161836677717.0 / 13612068292357.0,
    1720146321549.0 / 2090206949498.0,
    3134564353537.0 / 4481467310338.0,
    2277821191437.0 / 14882151754819.0,
];

const LSRK_C: [f64; 5] = [
    0.0,
    1432997174477.0 / 9575080441755.0,
    2526269341429.0 / 6820363183375.0,
    2006345519317.0 / 3224310063776.0,
    2802321613138.0 / 2924317926251.0,
];

/// Advances a [`FieldState`] with a fixed scheme, owning its stage buffers.
#[derive(Debug, Clone)]
pub struct TimeIntegrator {
    scheme: TimeScheme,
    rate: FieldState,
    stage: FieldState,
    accumulator: FieldState,
}

impl TimeIntegrator {
    /// Integrator with buffers shaped like `template`.
    pub fn new(scheme: TimeScheme, template: &FieldState) -> Self {
        let zeros = || FieldState::zeros(template.num_elements(), template.nodes_per_element());
        Self {
            scheme,
            rate: zeros(),
            stage: zeros(),
            accumulator: zeros(),
        }
    }

    /// The scheme in use.
    pub fn scheme(&self) -> TimeScheme {
        self.scheme
    }

    /// Advance `state` from `time` to `time + dt`.
    pub fn step(
        &mut self,
        operator: &EvolutionOperator<'_>,
        state: &mut FieldState,
        time: f64,
        dt: f64,
    ) {
        match self.scheme {
            TimeScheme::ForwardEuler => {
                operator.apply(time, state, &mut self.rate);
                state.axpy(dt, &self.rate);
            }
            TimeScheme::RungeKutta4 => self.rk4(operator, state, time, dt),
            TimeScheme::LowStorageRk4 => self.low_storage_rk4(operator, state, time, dt),
        }
    }

    fn rk4(&mut self, operator: &EvolutionOperator<'_>, state: &mut FieldState, time: f64, dt: f64) {
        let Self {
            rate,
            stage,
            accumulator,
            ..
        } = self;

        // k1
        operator.apply(time, state, rate);
        accumulator.copy_from(rate);
        stage.assign_sum(state, 0.5 * dt, rate);
        // k2
        operator.apply(time + 0.5 * dt, stage, rate);
        accumulator.axpy(2.0, rate);
        stage.assign_sum(state, 0.5 * dt, rate);
        // k3
        operator.apply(time + 0.5 * dt, stage, rate);
        accumulator.axpy(2.0, rate);
        stage.assign_sum(state, dt, rate);
        // k4
        operator.apply(time + dt, stage, rate);
        accumulator.axpy(1.0, rate);

        state.axpy(dt / 6.0, accumulator);
    }

    fn low_storage_rk4(
        &mut self,
        operator: &EvolutionOperator<'_>,
        state: &mut FieldState,
        time: f64,
        dt: f64,
    ) {
        let Self {
            rate, accumulator, ..
        } = self;

        accumulator.clear();
        for i in 0..5 {
            operator.apply(time + LSRK_C[i] * dt, state, rate);
            accumulator.scale(LSRK_A[i]);
            accumulator.axpy(dt, rate);
            state.axpy(LSRK_B[i], accumulator);
        }
    }
}
