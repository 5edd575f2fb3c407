//! High-level solver control.
//!
//! The [`Solver`] ties a [`Model`] to an [`EvolutionOperator`] and a
//! [`TimeIntegrator`], applies the sources, and drives the time loop while
//! sampling probes and energy.

use super::integrator::TimeIntegrator;
use super::operator::EvolutionOperator;
use super::options::Options;
use super::probe::{ProbeSample, Probes};
use super::source::{Injection, Sources};
use super::stats::{EnergySample, SolverStats, TerminationReason};
use crate::arrays::{Direction, FieldState, FieldType};
use crate::extensions::{FieldView, Observer};
use crate::geometry::Point;
use crate::model::Model;
use crate::{Error, Result};

use indicatif::{ProgressBar, ProgressStyle};
use instant::Instant;
use log::{debug, info, warn};
use nalgebra::DVector;

/// Solver lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SolverState {
    /// Operator built, sources not yet applied
    Constructed,
    /// Sources applied, ready to run
    Initialized,
    /// Inside `run()`
    Running,
    /// Reached the final time
    Completed,
    /// Stopped early by an observer
    Stopped,
    /// Aborted by an observer error
    Failed,
}

/// Time-domain Maxwell solver over a borrowed [`Model`].
pub struct Solver<'a> {
    model: &'a Model,
    options: Options,
    operator: EvolutionOperator<'a>,
    integrator: TimeIntegrator,
    fields: FieldState,
    probes: Probes,
    /// Element and reference coordinates of every probe point
    probe_sites: Vec<Vec<(usize, Point)>>,
    energy_samples: Vec<EnergySample>,
    step: u64,
    time: f64,
    state: SolverState,
}

impl<'a> Solver<'a> {
    /// Validate the configuration, build the operator and apply the sources.
    pub fn new(model: &'a Model, probes: Probes, sources: Sources, options: Options) -> Result<Self> {
        options.validate()?;
        let dim = model.dim();

        for source in &sources {
            if !source.direction().is_active(dim) {
                return Err(Error::Config(format!(
                    "source direction {:?} is not active in {dim}-D",
                    source.direction()
                )));
            }
        }

        let probe_sites = probes
            .iter()
            .map(|probe| {
                if !probe.direction().is_active(dim) {
                    return Err(Error::Config(format!(
                        "probe direction {:?} is not active in {dim}-D",
                        probe.direction()
                    )));
                }
                probe.locate(model)
            })
            .collect::<Result<Vec<_>>>()?;

        let boundary_sources = sources
            .iter()
            .filter(|s| s.injection() == Injection::Boundary)
            .cloned()
            .collect();
        let operator = EvolutionOperator::new(model, &options, boundary_sources)?;
        let fields = operator.zero_state();
        let integrator = TimeIntegrator::new(options.integrator, &fields);

        info!(
            "DGTD model: {}-D, {} elements, order {} -> {} nodes",
            dim,
            model.num_elements(),
            options.order,
            operator.num_nodes()
        );
        info!(
            "DGTD options: t_final {}, dt {:.3e}, {:?} flux, {:?} boundaries, {:?}",
            options.t_final,
            options.dt,
            options.flux_type,
            options.boundary_condition,
            options.integrator
        );

        let mut solver = Self {
            model,
            options,
            operator,
            integrator,
            fields,
            probes,
            probe_sites,
            energy_samples: Vec::new(),
            step: 0,
            time: 0.0,
            state: SolverState::Constructed,
        };
        solver.initialize(&sources);
        Ok(solver)
    }

    fn initialize(&mut self, sources: &Sources) {
        for source in sources.iter().filter(|s| s.injection() == Injection::Initial) {
            self.operator.add_projection(
                &mut self.fields,
                source.field_type(),
                source.direction(),
                |x| source.evaluate(x),
            );
        }
        debug!("applied {} sources", sources.len());
        self.state = SolverState::Initialized;
    }

    /// Run to `t_final` without an observer.
    ///
    /// A solver runs once; calling `run` again is a configuration error.
    pub fn run(&mut self) -> Result<SolverStats> {
        self.run_with(&mut ())
    }

    /// Run to `t_final`, reporting to `observer`.
    ///
    /// An error returned by an observer hook aborts the run, leaves the
    /// solver in [`SolverState::Failed`] and is passed through.
    pub fn run_with<O: Observer>(&mut self, observer: &mut O) -> Result<SolverStats> {
        if self.state != SolverState::Initialized {
            return Err(Error::Config(format!(
                "solver cannot run from state {:?}",
                self.state
            )));
        }
        self.state = SolverState::Running;

        let (steps, last_dt) = self.options.schedule();
        debug!(
            "{} steps of {:?}, last step {:.3e}, Courant number ~{:.3}, observer '{}'",
            steps,
            self.integrator.scheme(),
            last_dt,
            self.operator.courant_number(self.options.dt),
            observer.name()
        );

        let progress = self.options.show_progress.then(|| {
            let pb = ProgressBar::new(steps);
            if let Ok(style) = ProgressStyle::default_bar()
                .template("[{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} ({per_sec})")
            {
                pb.set_style(style.progress_chars("##-"));
            }
            pb
        });

        let start_time = Instant::now();
        let outcome = self.advance(observer, steps, last_dt, progress.as_ref());

        let termination = match outcome {
            Ok(termination) => {
                if let Some(pb) = progress {
                    pb.finish_with_message("Run complete");
                }
                termination
            }
            Err(err) => {
                if let Some(pb) = progress {
                    pb.abandon_with_message("Run aborted");
                }
                warn!(
                    "Observer '{}' failed at step {}: {}",
                    observer.name(),
                    self.step,
                    err
                );
                self.state = SolverState::Failed;
                return Err(err);
            }
        };

        let wall_time = start_time.elapsed().as_secs_f64();
        self.state = match termination {
            TerminationReason::Completed => SolverState::Completed,
            TerminationReason::ObserverStop { .. } => SolverState::Stopped,
        };

        let peak_energy = self
            .energy_samples
            .iter()
            .map(|s| s.total_energy)
            .fold(0.0, f64::max);
        let final_energy = self.energy().total_energy;
        let dofs = (self.operator.num_nodes() * 6) as f64;
        let speed = if wall_time > 0.0 {
            self.step as f64 * dofs / wall_time / 1e6
        } else {
            0.0
        };

        let stats = SolverStats {
            timesteps: self.step,
            sim_time: self.time,
            wall_time,
            peak_energy,
            final_energy,
            speed_mdofs_per_sec: speed,
            termination,
        };

        info!(
            "Completed {} steps to t = {:.4} in {:.2}s ({:.2} MDOF/s)",
            stats.timesteps, stats.sim_time, stats.wall_time, stats.speed_mdofs_per_sec
        );

        Ok(stats)
    }

    /// Step loop with sampling and observer hooks.
    fn advance<O: Observer>(
        &mut self,
        observer: &mut O,
        steps: u64,
        last_dt: f64,
        progress: Option<&ProgressBar>,
    ) -> Result<TerminationReason> {
        let dt = self.options.dt;
        let stride = self.options.visualization_stride;

        self.sample();
        observer.on_start(&self.view())?;

        let mut termination = TerminationReason::Completed;
        for n in 1..=steps {
            let h = if n == steps { last_dt } else { dt };
            self.integrator
                .step(&self.operator, &mut self.fields, self.time, h);
            self.step = n;
            self.time = if h < dt {
                self.options.t_final
            } else {
                n as f64 * dt
            };

            if n % stride == 0 {
                self.sample();
                observer.on_sample(&self.view())?;
                if let Some(reason) = observer.check_termination() {
                    info!("Observer '{}' stopped the run: {} at step {}", observer.name(), reason, n);
                    termination = TerminationReason::ObserverStop { reason };
                    break;
                }
            }

            if let Some(pb) = progress {
                if n % 100 == 0 || n == steps {
                    pb.set_position(n);
                }
            }
        }

        if self.step % stride != 0 {
            self.sample();
        }
        observer.on_finish(&self.view())?;
        Ok(termination)
    }

    /// Record probe values and energy at the current time.
    fn sample(&mut self) {
        let (e_energy, h_energy) = self.operator.energy(&self.fields);
        self.energy_samples
            .push(EnergySample::new(self.step, self.time, e_energy, h_energy));

        for (probe, sites) in self.probes.iter_mut().zip(&self.probe_sites) {
            let (field, direction) = (probe.field_type(), probe.direction());
            let values = sites
                .iter()
                .map(|(element, reference)| {
                    self.operator
                        .interpolate(&self.fields, *element, reference, field, direction)
                })
                .collect();
            probe.push(ProbeSample {
                time: self.time,
                values,
            });
        }
    }

    fn view(&self) -> FieldView<'_> {
        FieldView::new(self.step, self.time, &self.fields, self.model)
    }

    /// Snapshot of one field component, element by element.
    ///
    /// Valid in any state. Directions that do not evolve in the mesh
    /// dimension (x in 1-D) are rejected.
    pub fn field_in_direction(&self, field: FieldType, direction: Direction) -> Result<DVector<f64>> {
        self.fields
            .active_component(field, direction, self.model.dim())
    }

    /// Recorded series of every probe, in insertion order.
    pub fn field_at_points(&self) -> Vec<&[ProbeSample]> {
        self.probes.iter().map(|p| p.samples()).collect()
    }

    /// The probes with their recorded samples.
    pub fn probes(&self) -> &Probes {
        &self.probes
    }

    /// Energy recorded at every sampling point.
    pub fn energy_samples(&self) -> &[EnergySample] {
        &self.energy_samples
    }

    /// Energy of the current state.
    pub fn energy(&self) -> EnergySample {
        let (e_energy, h_energy) = self.operator.energy(&self.fields);
        EnergySample::new(self.step, self.time, e_energy, h_energy)
    }

    /// Current coefficient arena.
    pub fn fields(&self) -> &FieldState {
        &self.fields
    }

    /// The spatial operator.
    pub fn operator(&self) -> &EvolutionOperator<'a> {
        &self.operator
    }

    /// Options in use.
    pub fn options(&self) -> &Options {
        &self.options
    }

    /// Lifecycle state.
    pub fn state(&self) -> SolverState {
        self.state
    }

    /// Simulated time.
    pub fn time(&self) -> f64 {
        self.time
    }

    /// Steps taken.
    pub fn step(&self) -> u64 {
        self.step
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dgtd::{BoundaryCondition, FluxType, Probe, Source};
    use crate::extensions::FieldRecorder;
    use crate::geometry::Mesh;
    use crate::model::Material;
    use nalgebra::DMatrix;

    fn model() -> Model {
        Model::new(Mesh::cartesian_1d(10, 1.0).unwrap(), [(1, Material::vacuum())]).unwrap()
    }

    fn quiet(t_final: f64, dt: f64) -> Options {
        Options::new(t_final, dt).with_show_progress(false)
    }

    #[test]
    fn test_lifecycle() {
        let model = model();
        let mut sources = Sources::new();
        sources.add_source(Source::gaussian(&model, 2.0, Direction::Y, FieldType::E).unwrap());

        let options = quiet(0.05, 0.01).with_visualization_stride(2);
        let mut solver = Solver::new(&model, Probes::new(), sources, options).unwrap();
        assert_eq!(solver.state(), SolverState::Initialized);
        assert!(solver.energy().total_energy > 0.0);

        let stats = solver.run().unwrap();
        assert_eq!(solver.state(), SolverState::Completed);
        assert_eq!(stats.timesteps, 5);
        assert_eq!(stats.termination, TerminationReason::Completed);
        // t = 0, steps 2 and 4, and the final step.
        let steps: Vec<u64> = solver.energy_samples().iter().map(|s| s.step).collect();
        assert_eq!(steps, vec![0, 2, 4, 5]);

        assert!(matches!(solver.run(), Err(Error::Config(_))));
    }

    #[test]
    fn test_inactive_directions_rejected() {
        let model = model();
        let solver = Solver::new(&model, Probes::new(), Sources::new(), quiet(0.1, 0.01)).unwrap();
        assert!(matches!(
            solver.field_in_direction(FieldType::E, Direction::X),
            Err(Error::Config(_))
        ));
        assert_eq!(
            solver.field_in_direction(FieldType::H, Direction::Z).unwrap().len(),
            40
        );

        let mut sources = Sources::new();
        sources.add_source(Source::gaussian(&model, 2.0, Direction::X, FieldType::E).unwrap());
        assert!(Solver::new(&model, Probes::new(), sources, quiet(0.1, 0.01)).is_err());

        let mut probes = Probes::new();
        probes.add_probe(Probe::at(FieldType::H, Direction::X, 0.5));
        assert!(Solver::new(&model, probes, Sources::new(), quiet(0.1, 0.01)).is_err());
    }

    #[test]
    fn test_probe_outside_domain_rejected() {
        let model = model();
        let mut probes = Probes::new();
        probes.add_probe(Probe::at(FieldType::E, Direction::Y, 1.5));
        assert!(matches!(
            Solver::new(&model, probes, Sources::new(), quiet(0.1, 0.01)),
            Err(Error::Sampling(_))
        ));

        let mut probes = Probes::new();
        probes.add_probe(Probe::new(
            FieldType::E,
            Direction::Y,
            DMatrix::from_column_slice(2, 1, &[0.5, 0.5]),
        ));
        assert!(matches!(
            Solver::new(&model, probes, Sources::new(), quiet(0.1, 0.01)),
            Err(Error::Sampling(_))
        ));
    }

    #[test]
    fn test_non_finite_probe_point_rejected() {
        let model = model();
        for x in [f64::NAN, f64::INFINITY, f64::NEG_INFINITY] {
            let mut probes = Probes::new();
            probes.add_probe(Probe::at(FieldType::E, Direction::Y, x));
            assert!(matches!(
                Solver::new(&model, probes, Sources::new(), quiet(0.1, 0.01)),
                Err(Error::Sampling(_))
            ));
        }
    }

    #[test]
    fn test_invalid_options_rejected() {
        let model = model();
        let centered_sma = quiet(0.1, 0.01)
            .with_flux_type(FluxType::Centered)
            .with_boundary_condition(BoundaryCondition::Sma);
        assert!(matches!(
            Solver::new(&model, Probes::new(), Sources::new(), centered_sma),
            Err(Error::Config(_))
        ));
        assert!(Solver::new(&model, Probes::new(), Sources::new(), quiet(-1.0, 0.01)).is_err());
    }

    struct StopAfter {
        samples: usize,
        seen: usize,
        finished: bool,
    }

    impl Observer for StopAfter {
        fn name(&self) -> &str {
            "stop-after"
        }

        fn on_sample(&mut self, _view: &FieldView<'_>) -> Result<()> {
            self.seen += 1;
            Ok(())
        }

        fn on_finish(&mut self, _view: &FieldView<'_>) -> Result<()> {
            self.finished = true;
            Ok(())
        }

        fn check_termination(&self) -> Option<String> {
            (self.seen >= self.samples).then(|| "enough".to_string())
        }
    }

    #[test]
    fn test_observer_stops_run() {
        let model = model();
        let options = quiet(1.0, 0.01).with_visualization_stride(10);
        let mut solver = Solver::new(&model, Probes::new(), Sources::new(), options).unwrap();
        let mut observer = StopAfter {
            samples: 3,
            seen: 0,
            finished: false,
        };

        let stats = solver.run_with(&mut observer).unwrap();
        assert_eq!(solver.state(), SolverState::Stopped);
        assert_eq!(stats.timesteps, 30);
        assert!(observer.finished);
        assert!(matches!(
            stats.termination,
            TerminationReason::ObserverStop { ref reason } if reason == "enough"
        ));
        assert!(solver.run().is_err());
    }

    struct FailOnSample;

    impl Observer for FailOnSample {
        fn name(&self) -> &str {
            "fail-on-sample"
        }

        fn on_sample(&mut self, view: &FieldView<'_>) -> Result<()> {
            Err(Error::Config(format!("refused sample at step {}", view.step)))
        }
    }

    #[test]
    fn test_observer_error_fails_run() {
        let model = model();
        let options = quiet(0.1, 0.01).with_visualization_stride(2);
        let mut solver = Solver::new(&model, Probes::new(), Sources::new(), options).unwrap();

        let err = solver.run_with(&mut FailOnSample).unwrap_err();
        assert!(err.to_string().contains("step 2"));
        assert_eq!(solver.state(), SolverState::Failed);
        assert_eq!(solver.step(), 2);
        assert!(matches!(solver.run(), Err(Error::Config(_))));
    }

    #[test]
    fn test_recorder_error_leaves_terminal_state() {
        let model = model();
        let mut solver =
            Solver::new(&model, Probes::new(), Sources::new(), quiet(0.1, 0.01)).unwrap();
        let mut recorder = FieldRecorder::new([(FieldType::E, Direction::X)]);

        assert!(solver.run_with(&mut recorder).is_err());
        assert_eq!(solver.state(), SolverState::Failed);
        assert_eq!(solver.step(), 0);
    }
}
