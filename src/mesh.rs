//! Simplex meshes of segments and triangles, and their boundaries.
use crate::space::ElementMesh;
use fedsolve_nested_vec::NestedVec;
use itertools::Itertools;
use nalgebra::allocator::Allocator;
use nalgebra::{DefaultAllocator, DimName, OPoint, Scalar, U1, U2};
use std::collections::BTreeMap;

pub mod procedural;

/// Index-based data structure for conforming simplex meshes (i.e. no hanging nodes).
///
/// Every cell is a simplex with `NODES` vertices, referenced by index into the vertex array.
#[derive(Debug, Clone, PartialEq)]
pub struct Mesh<T, D, const NODES: usize>
where
    T: Scalar,
    D: DimName,
    DefaultAllocator: Allocator<T, D>,
{
    vertices: Vec<OPoint<T, D>>,
    cells: Vec<[usize; NODES]>,
}

pub type SegmentMesh1d<T> = Mesh<T, U1, 2>;
pub type TriangleMesh2d<T> = Mesh<T, U2, 3>;

/// The vertices of a single simplex cell.
///
/// This is the geometric transformation handed to element evaluators for linear elements:
/// the map from the reference simplex is fully determined by the vertices.
#[derive(Debug, Clone, PartialEq)]
pub struct Simplex<T, D, const NODES: usize>
where
    T: Scalar,
    D: DimName,
    DefaultAllocator: Allocator<T, D>,
{
    vertices: [OPoint<T, D>; NODES],
}

pub type Segment1d<T> = Simplex<T, U1, 2>;
pub type Triangle2d<T> = Simplex<T, U2, 3>;

impl<T, D, const NODES: usize> Simplex<T, D, NODES>
where
    T: Scalar,
    D: DimName,
    DefaultAllocator: Allocator<T, D>,
{
    pub fn from_vertices(vertices: [OPoint<T, D>; NODES]) -> Self {
        Self { vertices }
    }

    pub fn vertices(&self) -> &[OPoint<T, D>; NODES] {
        &self.vertices
    }
}

impl<T, D, const NODES: usize> Mesh<T, D, NODES>
where
    T: Scalar,
    D: DimName,
    DefaultAllocator: Allocator<T, D>,
{
    /// Construct a mesh from vertices and cells.
    ///
    /// # Panics
    ///
    /// Panics if a cell references a vertex index out of bounds.
    pub fn from_vertices_and_cells(vertices: Vec<OPoint<T, D>>, cells: Vec<[usize; NODES]>) -> Self {
        let num_vertices = vertices.len();
        for (cell_index, cell) in cells.iter().enumerate() {
            assert!(
                cell.iter().all(|&v| v < num_vertices),
                "Cell {cell_index} references a vertex out of bounds ({num_vertices} vertices)"
            );
        }
        Self { vertices, cells }
    }

    pub fn vertices(&self) -> &[OPoint<T, D>] {
        &self.vertices
    }

    pub fn cells(&self) -> &[[usize; NODES]] {
        &self.cells
    }

    pub fn get_simplex(&self, index: usize) -> Option<Simplex<T, D, NODES>> {
        let cell = self.cells.get(index)?;
        Some(Simplex::from_vertices(cell.map(|v| self.vertices[v].clone())))
    }

    /// Returns a sorted list of vertices that lie on the boundary of the mesh.
    ///
    /// A facet (a cell with one vertex removed) is on the boundary if it belongs to exactly one
    /// cell, and a vertex is on the boundary if it belongs to a boundary facet.
    pub fn find_boundary_vertices(&self) -> Vec<usize> {
        let num_facets = NODES * self.cells.len();
        let mut sorted_facets = NestedVec::with_capacity(num_facets, NODES.saturating_sub(1) * num_facets);
        for cell in &self.cells {
            for excluded in 0..NODES {
                let mut appender = sorted_facets.begin_array();
                for (local_idx, &v) in cell.iter().enumerate() {
                    if local_idx != excluded {
                        appender.push_single(v);
                    }
                }
            }
        }

        for i in 0..sorted_facets.len() {
            if let Some(facet) = sorted_facets.get_mut(i) {
                facet.sort_unstable();
            }
        }

        // BTreeMap keeps the result deterministic
        let mut facet_counts = BTreeMap::new();
        for facet in sorted_facets.iter() {
            *facet_counts.entry(facet).or_insert(0usize) += 1;
        }

        facet_counts
            .into_iter()
            .filter(|&(_, count)| count == 1)
            .flat_map(|(facet, _)| facet.iter().copied())
            .sorted_unstable()
            .dedup()
            .collect()
    }
}

impl<T, D, const NODES: usize> ElementMesh for Mesh<T, D, NODES>
where
    T: Scalar,
    D: DimName,
    DefaultAllocator: Allocator<T, D>,
{
    type Transform = Simplex<T, D, NODES>;

    fn num_elements(&self) -> usize {
        self.cells.len()
    }

    fn element_transform(&self, element_index: usize) -> Self::Transform {
        let cell = &self.cells[element_index];
        Simplex::from_vertices(cell.map(|v| self.vertices[v].clone()))
    }
}
