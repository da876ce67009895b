use crate::error::{AssemblyError, Result};
use crate::mesh::Mesh;
use crate::space::DofSpace;
use nalgebra::allocator::Allocator;
use nalgebra::{DefaultAllocator, DimName, Scalar};

/// The finite element of a continuous piecewise linear Lagrange space on simplices.
///
/// One shape function is associated with each vertex of the simplex.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct LinearLagrangeElement {
    num_nodes: usize,
}

impl LinearLagrangeElement {
    pub fn new(num_nodes: usize) -> Self {
        Self { num_nodes }
    }

    pub fn num_nodes(&self) -> usize {
        self.num_nodes
    }
}

/// A continuous piecewise linear Lagrange space on a simplex mesh.
///
/// DOF `i` is the value at vertex `i` of the mesh. By default all DOFs are free.
#[derive(Debug, Clone)]
pub struct LinearLagrangeSpace<'a, T, D, const NODES: usize>
where
    T: Scalar,
    D: DimName,
    DefaultAllocator: Allocator<T, D>,
{
    mesh: &'a Mesh<T, D, NODES>,
    free: Vec<bool>,
}

impl<'a, T, D, const NODES: usize> LinearLagrangeSpace<'a, T, D, NODES>
where
    T: Scalar,
    D: DimName,
    DefaultAllocator: Allocator<T, D>,
{
    pub fn new(mesh: &'a Mesh<T, D, NODES>) -> Self {
        Self {
            mesh,
            free: vec![true; mesh.vertices().len()],
        }
    }

    /// Constrains the DOFs associated with the vertices on the boundary of the mesh.
    pub fn with_boundary_constrained(mut self) -> Self {
        for vertex in self.mesh.find_boundary_vertices() {
            self.free[vertex] = false;
        }
        self
    }

    /// Constrains the given DOFs, in addition to any previously constrained DOFs.
    pub fn with_constrained_dofs(mut self, dofs: impl IntoIterator<Item = usize>) -> Result<Self> {
        let num_dofs = self.free.len();
        for dof in dofs {
            let entry = self
                .free
                .get_mut(dof)
                .ok_or(AssemblyError::IndexOutOfRange {
                    index: dof,
                    bound: num_dofs,
                    element: None,
                })?;
            *entry = false;
        }
        Ok(self)
    }

    pub fn mesh(&self) -> &'a Mesh<T, D, NODES> {
        self.mesh
    }
}

impl<'a, T, D, const NODES: usize> DofSpace for LinearLagrangeSpace<'a, T, D, NODES>
where
    T: Scalar,
    D: DimName,
    DefaultAllocator: Allocator<T, D>,
{
    type Element = LinearLagrangeElement;

    fn num_dofs(&self) -> usize {
        self.mesh.vertices().len()
    }

    fn num_elements(&self) -> usize {
        self.mesh.cells().len()
    }

    fn element_dof_count(&self, _element_index: usize) -> usize {
        NODES
    }

    fn populate_element_dofs(&self, element_index: usize, dofs: &mut Vec<usize>) {
        if let Some(cell) = self.mesh.cells().get(element_index) {
            dofs.extend_from_slice(cell);
        }
    }

    fn element(&self, _element_index: usize) -> Self::Element {
        LinearLagrangeElement::new(NODES)
    }

    fn free_dof_mask(&self) -> Vec<bool> {
        self.free.clone()
    }
}
