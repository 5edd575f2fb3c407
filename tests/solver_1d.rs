#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;
    use maxwell_dgtd::{
        BoundaryCondition, Direction, FieldType, FluxType, Injection, Material, Mesh, Model,
        Options, Probe, Probes, Solver, SolverState, Source, Sources, TimeScheme,
    };
    use nalgebra::{DMatrix, DVector};

    // 51 vacuum elements on [0, 1], as in the reference cavity setup.
    fn vacuum_model() -> Model {
        let mesh = Mesh::cartesian_1d(51, 1.0).unwrap();
        Model::new(mesh, [(1, Material::new(1.0, 1.0))]).unwrap()
    }

    fn pulse(model: &Model, direction: Direction, field: FieldType) -> Sources {
        let mut sources = Sources::new();
        sources.add_source(Source::gaussian(model, 2.0, direction, field).unwrap());
        sources
    }

    fn options(t_final: f64) -> Options {
        Options::new(t_final, 1e-3).with_show_progress(false)
    }

    fn distance(a: &DVector<f64>, b: &DVector<f64>) -> f64 {
        (a - b).norm()
    }

    #[test]
    fn test_centered_pec_inverts_pulse() {
        let model = vacuum_model();
        let opts = options(1.0).with_flux_type(FluxType::Centered);
        let mut solver =
            Solver::new(&model, Probes::new(), pulse(&model, Direction::Y, FieldType::E), opts)
                .unwrap();

        let e_old = -solver.field_in_direction(FieldType::E, Direction::Y).unwrap();
        solver.run().unwrap();
        let e_new = solver.field_in_direction(FieldType::E, Direction::Y).unwrap();

        assert!(distance(&e_old, &e_new) < 2e-3);
        assert_eq!(solver.state(), SolverState::Completed);
        assert_relative_eq!(solver.time(), 1.0, epsilon = 1e-9);
    }

    #[test]
    fn test_centered_pec_conserves_energy() {
        let model = vacuum_model();
        let opts = options(1.0).with_flux_type(FluxType::Centered);
        let mut solver =
            Solver::new(&model, Probes::new(), pulse(&model, Direction::Y, FieldType::E), opts)
                .unwrap();

        let initial = solver.energy().total_energy;
        let stats = solver.run().unwrap();
        assert!(((stats.final_energy - initial) / initial).abs() < 1e-6);

        for sample in solver.energy_samples() {
            assert!(((sample.total_energy - initial) / initial).abs() < 1e-6);
        }
        assert_relative_eq!(stats.peak_energy, initial, max_relative = 1e-6);
    }

    #[test]
    fn test_upwind_pec_restores_pulse() {
        let model = vacuum_model();
        let opts = options(2.0).with_visualization_stride(50);
        let mut solver =
            Solver::new(&model, Probes::new(), pulse(&model, Direction::Y, FieldType::E), opts)
                .unwrap();

        let e_old = solver.field_in_direction(FieldType::E, Direction::Y).unwrap();
        let stats = solver.run().unwrap();
        let e_new = solver.field_in_direction(FieldType::E, Direction::Y).unwrap();

        assert!(distance(&e_old, &e_new) < 2e-3);
        assert_eq!(stats.timesteps, 2000);
        // Upwinding only dissipates.
        assert!(stats.final_energy <= solver.energy_samples()[0].total_energy);
    }

    #[test]
    fn test_pmc_returns_magnetic_field_to_zero() {
        let model = vacuum_model();
        let opts = options(1.0)
            .with_boundary_condition(BoundaryCondition::Pmc)
            .with_visualization_stride(5);
        let mut solver =
            Solver::new(&model, Probes::new(), pulse(&model, Direction::Y, FieldType::E), opts)
                .unwrap();

        let h_old = solver.field_in_direction(FieldType::H, Direction::Z).unwrap();
        assert_eq!(h_old.amax(), 0.0);
        solver.run().unwrap();
        let h_new = solver.field_in_direction(FieldType::H, Direction::Z).unwrap();

        assert!(distance(&h_old, &h_new) < 2e-3);
    }

    #[test]
    fn test_absorbing_boundaries_empty_domain() {
        let model = vacuum_model();
        let opts = options(1.0)
            .with_boundary_condition(BoundaryCondition::Sma)
            .with_visualization_stride(5);
        let mut solver =
            Solver::new(&model, Probes::new(), pulse(&model, Direction::Y, FieldType::E), opts)
                .unwrap();

        solver.run().unwrap();
        let e_y = solver.field_in_direction(FieldType::E, Direction::Y).unwrap();
        let h_z = solver.field_in_direction(FieldType::H, Direction::Z).unwrap();
        assert!(e_y.norm() < 2e-3);
        assert!(h_z.norm() < 2e-3);
        assert!(solver.energy().total_energy < 1e-8);
    }

    #[test]
    fn test_two_sources_travel_right() {
        let model = vacuum_model();
        let opts = options(0.7)
            .with_boundary_condition(BoundaryCondition::Sma)
            .with_visualization_stride(5);

        let mut probes = Probes::new();
        probes.add_probe(Probe::new(
            FieldType::E,
            Direction::Y,
            DMatrix::from_row_slice(1, 2, &[0.5, 0.8]),
        ));

        let mut sources = Sources::new();
        sources
            .add_source(Source::gaussian(&model, 2.0, Direction::Y, FieldType::E).unwrap())
            .add_source(Source::gaussian(&model, 2.0, Direction::Z, FieldType::H).unwrap());

        let mut solver = Solver::new(&model, probes, sources, opts).unwrap();
        solver.run().unwrap();

        let series = solver.field_at_points();
        assert_eq!(series.len(), 1);
        let samples = series[0];
        // t = 0, every fifth step to 0.7.
        assert_eq!(samples.len(), 141);
        assert_eq!(samples[0].time, 0.0);
        assert_relative_eq!(samples[0].values[0], 1.0, epsilon = 1e-4);

        let later = solver.probes().get(0).unwrap().closest_sample(0.3).unwrap();
        assert_relative_eq!(later.time, 0.3, epsilon = 1e-9);
        assert!((samples[0].values[0] - later.values[1]).abs() < 2e-3);
    }

    #[test]
    fn test_boundary_injected_pulse_reaches_probe() {
        let model = vacuum_model();
        let opts = options(1.2)
            .with_boundary_condition(BoundaryCondition::Sma)
            .with_visualization_stride(5);

        let mut probes = Probes::new();
        probes.add_probe(Probe::at(FieldType::E, Direction::Y, 0.5));

        // Peak starts at x = -0.4, outside the domain.
        let mut sources = Sources::new();
        sources.add_source(
            Source::gaussian(&model, 2.0, Direction::Y, FieldType::E)
                .unwrap()
                .with_delay(-0.9)
                .with_injection(Injection::Boundary),
        );

        let mut solver = Solver::new(&model, probes, sources, opts).unwrap();
        assert_eq!(solver.energy().total_energy, 0.0);
        solver.run().unwrap();

        let samples = solver.field_at_points()[0];
        assert_eq!(samples[0].values[0], 0.0);
        let peak = samples
            .iter()
            .max_by(|a, b| a.values[0].total_cmp(&b.values[0]))
            .unwrap();
        assert_relative_eq!(peak.values[0], 1.0, epsilon = 1e-3);
        assert_relative_eq!(peak.time, 0.9, epsilon = 1e-2);
    }

    #[test]
    fn test_boundary_injection_requires_absorbing_boundaries() {
        let model = vacuum_model();
        let mut sources = Sources::new();
        sources.add_source(
            Source::gaussian(&model, 2.0, Direction::Y, FieldType::E)
                .unwrap()
                .with_injection(Injection::Boundary),
        );
        assert!(Solver::new(&model, Probes::new(), sources, options(1.0)).is_err());
    }

    #[test]
    fn test_material_interface_reflection() {
        // Z = 1 on the left half, Z = 1/2 on the right: reflection coefficient -1/3.
        let mut mesh = Mesh::cartesian_1d(60, 1.0).unwrap();
        for e in 30..60 {
            mesh.set_attribute(e, 2).unwrap();
        }
        let model = Model::new(
            mesh,
            [(1, Material::vacuum()), (2, Material::new(4.0, 1.0))],
        )
        .unwrap();

        let mut sources = Sources::new();
        for (direction, field) in [(Direction::Y, FieldType::E), (Direction::Z, FieldType::H)] {
            sources.add_source(
                Source::gaussian(&model, 4.0, direction, field)
                    .unwrap()
                    .with_delay(-0.25),
            );
        }
        let mut probes = Probes::new();
        probes.add_probe(Probe::at(FieldType::E, Direction::Y, 0.25));

        let opts = options(0.5)
            .with_boundary_condition(BoundaryCondition::Sma)
            .with_visualization_stride(5);
        let mut solver = Solver::new(&model, probes, sources, opts).unwrap();
        solver.run().unwrap();

        let samples = solver.field_at_points()[0];
        let last = samples.last().unwrap();
        assert_relative_eq!(last.time, 0.5, epsilon = 1e-9);
        assert_relative_eq!(last.values[0], -1.0 / 3.0, epsilon = 1e-2);
    }

    #[test]
    fn test_low_storage_scheme_matches_classical() {
        let model = vacuum_model();
        let run = |scheme: TimeScheme| {
            let opts = options(0.1).with_integrator(scheme);
            let mut solver =
                Solver::new(&model, Probes::new(), pulse(&model, Direction::Y, FieldType::E), opts)
                    .unwrap();
            solver.run().unwrap();
            solver.field_in_direction(FieldType::E, Direction::Y).unwrap()
        };

        let classical = run(TimeScheme::RungeKutta4);
        let low_storage = run(TimeScheme::LowStorageRk4);
        assert!(distance(&classical, &low_storage) < 1e-6);
    }

    #[test]
    fn test_inactive_direction_rejected() {
        let model = vacuum_model();
        let solver = Solver::new(&model, Probes::new(), Sources::new(), options(1.0)).unwrap();
        assert!(solver.field_in_direction(FieldType::E, Direction::X).is_err());
        assert!(solver.field_in_direction(FieldType::H, Direction::X).is_err());
        assert!(solver.field_in_direction(FieldType::E, Direction::Z).is_ok());
    }
}
