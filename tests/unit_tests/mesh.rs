use fedsolve::mesh::procedural::{
    create_rectangular_uniform_tri_mesh_2d, create_uniform_interval_mesh_1d, create_unit_interval_mesh_1d,
    create_unit_square_uniform_tri_mesh_2d,
};
use fedsolve::space::{DofSpace, ElementMesh, LinearLagrangeSpace};
use fedsolve::AssemblyError;
use matrixcompare::assert_scalar_eq;
use nalgebra::{Matrix2, Point1, Point2, Vector2};

#[test]
fn interval_mesh() {
    let mesh = create_uniform_interval_mesh_1d(-1.0, 3.0, 4);
    let expected_vertices: Vec<_> = [-1.0, 0.0, 1.0, 2.0, 3.0].iter().map(|&x| Point1::new(x)).collect();
    assert_eq!(mesh.vertices(), expected_vertices.as_slice());
    assert_eq!(mesh.cells(), &[[0, 1], [1, 2], [2, 3], [3, 4]]);
    assert_eq!(mesh.find_boundary_vertices(), vec![0, 4]);
    assert_eq!(mesh.num_elements(), 4);

    let segment = mesh.element_transform(2);
    assert_eq!(segment.vertices(), &[Point1::new(1.0), Point1::new(2.0)]);
    assert_eq!(mesh.get_simplex(2), Some(segment));
    assert_eq!(mesh.get_simplex(4), None);
}

#[test]
fn empty_interval_mesh() {
    let mesh = create_unit_interval_mesh_1d::<f64>(0);
    assert!(mesh.vertices().is_empty());
    assert!(mesh.cells().is_empty());
    assert!(mesh.find_boundary_vertices().is_empty());
}

#[test]
fn unit_square_mesh() {
    let mesh = create_unit_square_uniform_tri_mesh_2d::<f64>(2);
    assert_eq!(mesh.vertices().len(), 9);
    assert_eq!(mesh.cells().len(), 8);
    assert_eq!(mesh.vertices()[4], Point2::new(0.5, 0.5));
    assert_eq!(mesh.vertices()[8], Point2::new(1.0, 1.0));
    assert_eq!(mesh.find_boundary_vertices(), vec![0, 1, 2, 3, 5, 6, 7, 8]);

    let total_area: f64 = (0..mesh.num_elements())
        .map(|e| {
            let [a, b, c] = mesh.element_transform(e).vertices().clone();
            let det = Matrix2::from_columns(&[b - a, c - a]).determinant();
            // Every triangle is counter-clockwise
            assert!(det > 0.0);
            det / 2.0
        })
        .sum();
    assert_scalar_eq!(total_area, 1.0, comp = abs, tol = 1e-14);
}

#[test]
fn rectangular_mesh_with_offset() {
    let mesh = create_rectangular_uniform_tri_mesh_2d(0.5, 3, 1, 1, &Vector2::new(1.0, -1.0));
    assert_eq!(mesh.vertices().len(), 8);
    assert_eq!(mesh.cells().len(), 6);
    assert_eq!(mesh.vertices()[0], Point2::new(1.0, -1.0));
    assert_eq!(mesh.vertices()[7], Point2::new(2.5, -0.5));
    // Every vertex of a single strip of cells is on the boundary
    assert_eq!(mesh.find_boundary_vertices(), (0..8).collect::<Vec<_>>());
}

#[test]
fn linear_lagrange_space() {
    let mesh = create_unit_square_uniform_tri_mesh_2d::<f64>(2);
    let space = LinearLagrangeSpace::new(&mesh);
    assert_eq!(space.num_dofs(), 9);
    assert_eq!(space.element_dof_count(3), 3);
    assert!(space.free_dof_mask().iter().all(|&free| free));

    let mut dofs = Vec::new();
    space.populate_element_dofs(1, &mut dofs);
    assert_eq!(dofs, mesh.cells()[1].to_vec());
    assert_eq!(space.element(1).num_nodes(), 3);

    let constrained = space.with_boundary_constrained();
    let free: Vec<_> = (0..9).filter(|&dof| constrained.free_dof_mask()[dof]).collect();
    assert_eq!(free, vec![4]);
}

#[test]
fn linear_lagrange_space_with_constrained_dofs() {
    let mesh = create_unit_interval_mesh_1d::<f64>(3);
    let space = LinearLagrangeSpace::new(&mesh).with_constrained_dofs([0, 2]).unwrap();
    assert_eq!(space.free_dof_mask(), vec![false, true, false, true]);

    let err = LinearLagrangeSpace::new(&mesh).with_constrained_dofs([4]).unwrap_err();
    assert!(matches!(err, AssemblyError::IndexOutOfRange { index: 4, bound: 4, .. }));
}
