//! Discontinuous Galerkin time-domain (DGTD) solver for Maxwell's equations.
//!
//! The crate advances the electric and magnetic fields over a mesh of
//! axis-aligned tensor-product elements (segments, quadrilaterals or
//! hexahedra), each tagged with a [`Material`]. The main entry points are:
//!
//! - [`Model`]: the mesh plus its attribute to material mapping
//! - [`Sources`] / [`Probes`]: initial or boundary-injected Gaussian profiles
//!   and point samplers
//! - [`Solver`]: orchestrates the evolution operator and time integrator
//!
//! ```no_run
//! use maxwell_dgtd::{Direction, FieldType, Material, Mesh, Model, Options, Probes, Solver, Source, Sources};
//!
//! # fn main() -> maxwell_dgtd::Result<()> {
//! let mesh = Mesh::cartesian_1d(51, 1.0)?;
//! let model = Model::new(mesh, [(1, Material::new(1.0, 1.0))])?;
//!
//! let mut sources = Sources::new();
//! sources.add_source(Source::gaussian(&model, 2.0, Direction::Y, FieldType::E)?);
//!
//! let mut solver = Solver::new(&model, Probes::new(), sources, Options::new(1.0, 1e-3))?;
//! let stats = solver.run()?;
//! println!("{} steps, final energy {:.3e}", stats.timesteps, stats.final_energy);
//! # Ok(())
//! # }
//! ```

pub mod arrays;
pub mod dgtd;
pub mod extensions;
pub mod geometry;
pub mod model;

pub use arrays::{Direction, FieldState, FieldType};
pub use dgtd::{
    BoundaryCondition, EnergySample, EvolutionOperator, Execution, FluxType, Injection, Options,
    Probe, ProbeSample, Probes, Solver, SolverState, SolverStats, Source, Sources,
    TerminationReason, TimeIntegrator, TimeScheme,
};
pub use extensions::{FieldRecorder, FieldView, Observer, RecordedFrame};
pub use geometry::{BoundingBox, Mesh, Point};
pub use model::{Attribute, Material, Model};

/// Errors raised while building or driving a solver.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Invalid options, materials, sources or field requests.
    #[error("configuration error: {0}")]
    Config(String),

    /// Malformed mesh topology or geometry.
    #[error("mesh error: {0}")]
    Mesh(String),

    /// Probe points that cannot be sampled.
    #[error("sampling error: {0}")]
    Sampling(String),
}

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, Error>;
