//! Run diagnostics.

/// Discrete electromagnetic energy at one sampling point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EnergySample {
    /// Step index when the sample was taken
    pub step: u64,

    /// Simulated time
    pub time: f64,

    /// Electric field energy
    pub e_energy: f64,

    /// Magnetic field energy
    pub h_energy: f64,

    /// Total energy (E + H)
    pub total_energy: f64,
}

impl EnergySample {
    /// Create a new energy sample.
    pub fn new(step: u64, time: f64, e_energy: f64, h_energy: f64) -> Self {
        Self {
            step,
            time,
            e_energy,
            h_energy,
            total_energy: e_energy + h_energy,
        }
    }
}

/// Reason why a run ended.
#[derive(Debug, Clone, PartialEq)]
pub enum TerminationReason {
    /// Reached the final time
    Completed,

    /// An observer requested early termination
    ObserverStop {
        /// Reason provided by the observer
        reason: String,
    },
}

/// Summary of a finished run.
#[derive(Debug, Clone)]
pub struct SolverStats {
    /// Steps taken
    pub timesteps: u64,

    /// Simulated time reached
    pub sim_time: f64,

    /// Wall clock time (seconds)
    pub wall_time: f64,

    /// Largest total energy seen at a sampling point
    pub peak_energy: f64,

    /// Total energy at the end of the run
    pub final_energy: f64,

    /// Degrees of freedom advanced per second, in millions
    pub speed_mdofs_per_sec: f64,

    /// Why the run ended
    pub termination: TerminationReason,
}
