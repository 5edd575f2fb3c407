//! Discontinuous Galerkin time-domain discretization and solver.
//!
//! Fields are expanded in a nodal Lagrange basis on Legendre-Gauss-Lobatto
//! points within each element. Neighbouring elements couple only through
//! numerical fluxes on shared faces, which keeps the mass matrix diagonal
//! and the scheme fully explicit.

pub mod basis;
pub mod flux;
mod integrator;
mod operator;
mod options;
mod probe;
mod solver;
mod source;
mod stats;

pub use basis::{LobattoRule, ReferenceElement};
pub use flux::{BoundaryCondition, FluxType};
pub use integrator::{TimeIntegrator, TimeScheme};
pub use operator::{EvolutionOperator, Execution};
pub use options::{Options, DEFAULT_ORDER, DEFAULT_VISUALIZATION_STRIDE};
pub use probe::{Probe, ProbeSample, Probes};
pub use solver::{Solver, SolverState};
pub use source::{Injection, Source, Sources};
pub use stats::{EnergySample, SolverStats, TerminationReason};
