#[cfg(test)]
mod tests {
    use maxwell_dgtd::{Error, Material, Mesh, Model, Options, Probes, Solver, Sources};

    // Left half attribute 1, right half attribute 2, refined `times` times.
    fn two_attribute_mesh(times: usize) -> Mesh {
        let mut mesh = Mesh::cartesian_1d(2, 1.0).unwrap();
        mesh.set_attribute(0, 1).unwrap();
        mesh.set_attribute(1, 2).unwrap();
        mesh.refine(times);
        mesh
    }

    #[test]
    fn test_refinement_alternates_attributes() {
        for times in 0..=4 {
            let mesh = two_attribute_mesh(times);
            assert_eq!(mesh.num_elements(), 1 << (times + 1));
            for (e, attribute) in mesh.attributes().enumerate() {
                let expected = if e % 2 == 0 { 1 } else { 2 };
                assert_eq!(attribute, expected, "element {e} after {times} refinements");
            }
        }
    }

    #[test]
    fn test_refined_mesh_keeps_material_halves() {
        let mesh = two_attribute_mesh(3);
        let model = Model::new(
            mesh,
            [(1, Material::vacuum()), (2, Material::new(2.0, 1.0))],
        )
        .unwrap();

        for e in 0..model.num_elements() {
            let x = model.vertex_of(e)[0];
            let expected = if x < 0.5 { 1.0 } else { 2.0 };
            assert_eq!(model.material_of(e).permittivity(), expected);
        }

        // Topology follows geometry, not element numbering.
        let options = Options::new(0.01, 1e-3).with_show_progress(false);
        let mut solver = Solver::new(&model, Probes::new(), Sources::new(), options).unwrap();
        solver.run().unwrap();
    }

    #[test]
    fn test_missing_attribute_fails_model() {
        let mesh = two_attribute_mesh(1);
        let err = Model::new(mesh, [(1, Material::vacuum())]).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
        assert!(err.to_string().contains("attribute 2"));
    }

    #[test]
    fn test_refined_square_and_cube_counts() {
        let mut square = Mesh::cartesian_2d(2, 3, 1.0, 1.5).unwrap();
        square.refine(2);
        assert_eq!(square.num_elements(), 6 * 16);
        assert_eq!(square.num_vertices(), 9 * 13);

        let mut cube = Mesh::cartesian_3d(1, 1, 1, 1.0, 1.0, 1.0).unwrap();
        cube.refine(1);
        let model = Model::new(cube, [(1, Material::vacuum())]).unwrap();
        assert_eq!(model.num_elements(), 8);
        assert_eq!(model.topology().num_interior_faces(), 12);
        assert_eq!(model.topology().num_boundary_faces(), 24);
    }
}
