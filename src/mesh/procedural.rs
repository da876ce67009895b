//! Basic procedural mesh generation routines.
use crate::mesh::{Mesh, SegmentMesh1d, TriangleMesh2d};
use crate::Real;
use nalgebra::{Point1, Point2, Vector2};

/// Generates a uniform mesh of the interval `[a, b]` with the given number of cells.
///
/// Vertices are numbered from left to right, and cell `i` connects vertices `i` and `i + 1`.
pub fn create_uniform_interval_mesh_1d<T>(a: T, b: T, num_cells: usize) -> SegmentMesh1d<T>
where
    T: Real,
{
    if num_cells == 0 {
        return Mesh::from_vertices_and_cells(Vec::new(), Vec::new());
    }

    let n = T::from_usize(num_cells).expect("Must be able to fit usize in T");
    let h = (b - a) / n;
    let vertices = (0..=num_cells)
        .map(|i| {
            let i_as_t = T::from_usize(i).expect("Must be able to fit usize in T");
            Point1::new(a + i_as_t * h)
        })
        .collect();
    let cells = (0..num_cells).map(|i| [i, i + 1]).collect();
    Mesh::from_vertices_and_cells(vertices, cells)
}

pub fn create_unit_interval_mesh_1d<T>(num_cells: usize) -> SegmentMesh1d<T>
where
    T: Real,
{
    create_uniform_interval_mesh_1d(T::zero(), T::one(), num_cells)
}

pub fn create_unit_square_uniform_tri_mesh_2d<T>(cells_per_dim: usize) -> TriangleMesh2d<T>
where
    T: Real,
{
    create_rectangular_uniform_tri_mesh_2d(T::one(), 1, 1, cells_per_dim, &Vector2::zeros())
}

/// Generates an axis-aligned rectangular uniform triangle mesh given a unit length,
/// dimensions as multipliers of the unit length and the number of cells per unit length.
///
/// Every square cell is split into two counter-clockwise oriented triangles along the diagonal
/// from its bottom-left to its top-right corner.
pub fn create_rectangular_uniform_tri_mesh_2d<T>(
    unit_length: T,
    units_x: usize,
    units_y: usize,
    cells_per_unit: usize,
    bottom_left: &Vector2<T>,
) -> TriangleMesh2d<T>
where
    T: Real,
{
    if cells_per_unit == 0 || units_x == 0 || units_y == 0 {
        return Mesh::from_vertices_and_cells(Vec::new(), Vec::new());
    }

    let cells_per_unit_as_t = T::from_usize(cells_per_unit).expect("Must be able to fit usize in T");
    let cell_size = unit_length / cells_per_unit_as_t;
    let num_cells_x = units_x * cells_per_unit;
    let num_cells_y = units_y * cells_per_unit;
    let num_vertices_x = num_cells_x + 1;
    let num_vertices_y = num_cells_y + 1;

    let to_global_vertex_index = |i: usize, j: usize| num_vertices_x * j + i;

    let mut vertices = Vec::with_capacity(num_vertices_x * num_vertices_y);
    for j in 0..num_vertices_y {
        for i in 0..num_vertices_x {
            let i_as_t = T::from_usize(i).expect("Must be able to fit usize in T");
            let j_as_t = T::from_usize(j).expect("Must be able to fit usize in T");
            let v = bottom_left + Vector2::new(i_as_t, j_as_t) * cell_size;
            vertices.push(Point2::from(v));
        }
    }

    let mut cells = Vec::with_capacity(2 * num_cells_x * num_cells_y);
    for j in 0..num_cells_y {
        for i in 0..num_cells_x {
            let idx = &to_global_vertex_index;
            cells.push([idx(i, j), idx(i + 1, j), idx(i + 1, j + 1)]);
            cells.push([idx(i, j), idx(i + 1, j + 1), idx(i, j + 1)]);
        }
    }

    Mesh::from_vertices_and_cells(vertices, cells)
}
