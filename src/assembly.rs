//! The element loop: evaluation of local contributions and their scatter into global storage.
use crate::error::{AssemblyError, Result};
use crate::incidence::ElementDofTable;
use crate::matrix::{ScatterWorkspace, SymmetricCsrMatrix};
use crate::space::{DofSpace, ElementMatrixEvaluator, ElementMesh, ElementVectorEvaluator};
use crate::Real;
use eyre::eyre;
use log::{debug, trace};
use nalgebra::storage::Storage;
use nalgebra::{DMatrix, DMatrixViewMut, DVector, DVectorViewMut, Dyn, Matrix, Scalar, U1};
use std::cell::RefCell;
use std::cmp::min;

/// Buffers holding the local data of a single element.
///
/// The buffers are resized and zeroed at the start of every element, so that at most one
/// element's worth of local data is alive at any time.
#[derive(Debug, Clone)]
pub struct ElementBuffers<T: Scalar> {
    element_dofs: Vec<usize>,
    element_matrix: DMatrix<T>,
    element_vector: DVector<T>,
    scatter: ScatterWorkspace<T>,
}

impl<T: Real> Default for ElementBuffers<T> {
    fn default() -> Self {
        Self {
            element_dofs: Vec::new(),
            element_matrix: DMatrix::zeros(0, 0),
            element_vector: DVector::zeros(0),
            scatter: ScatterWorkspace::default(),
        }
    }
}

impl<T: Real> ElementBuffers<T> {
    fn prepare(&mut self, dofs: &[usize]) {
        let n = dofs.len();
        self.element_dofs.clear();
        self.element_dofs.extend_from_slice(dofs);
        self.element_matrix.resize_mut(n, n, T::zero());
        self.element_matrix.fill(T::zero());
        self.element_vector.resize_vertically_mut(n, T::zero());
        self.element_vector.fill(T::zero());
    }

    fn evaluate_matrix<Element, Transform, Bilinear>(
        &mut self,
        element_index: usize,
        element: &Element,
        transform: &Transform,
        bilinear: &Bilinear,
        symmetry_tolerance: Option<T>,
    ) -> Result<()>
    where
        Bilinear: ?Sized + ElementMatrixEvaluator<T, Element, Transform>,
    {
        bilinear
            .evaluate_element_matrix(element, transform, DMatrixViewMut::from(&mut self.element_matrix))
            .and_then(|_| match symmetry_tolerance {
                Some(tolerance) => check_symmetry(&self.element_matrix, tolerance),
                None => Ok(()),
            })
            .map_err(|err| AssemblyError::evaluator_failure(element_index, err))
    }

    fn evaluate_vector<Element, Transform, Linear>(
        &mut self,
        element_index: usize,
        element: &Element,
        transform: &Transform,
        linear: &Linear,
    ) -> Result<()>
    where
        Linear: ?Sized + ElementVectorEvaluator<T, Element, Transform>,
    {
        linear
            .evaluate_element_vector(element, transform, DVectorViewMut::from(&mut self.element_vector))
            .map_err(|err| AssemblyError::evaluator_failure(element_index, err))
    }

    fn scatter_matrix(&mut self, element_index: usize, matrix: &mut SymmetricCsrMatrix<T>) -> Result<()> {
        matrix
            .scatter_add_block_with_workspace(&self.element_dofs, &self.element_matrix, &mut self.scatter)
            .map_err(|err| err.at_element(element_index))
    }

    fn scatter_vector(&self, element_index: usize, rhs: &mut DVector<T>) -> Result<()> {
        add_indirect(rhs, &self.element_dofs, &self.element_vector).map_err(|err| err.at_element(element_index))
    }
}

/// Assembles global matrices and vectors from element contributions.
///
/// Elements are always visited in index order, so that repeated assembly of the same system
/// produces bit-identical results.
#[derive(Debug, Clone)]
pub struct Assembler<T: Scalar> {
    // Buffers that prevent unnecessary allocations when assembling
    // many elements or multiple systems with the same assembler
    workspace: RefCell<ElementBuffers<T>>,
    symmetry_tolerance: Option<T>,
}

impl<T: Real> Default for Assembler<T> {
    fn default() -> Self {
        Self {
            workspace: RefCell::new(ElementBuffers::default()),
            symmetry_tolerance: None,
        }
    }
}

impl<T: Real> Assembler<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reject local matrices that are not symmetric up to the given relative tolerance.
    ///
    /// Only the lower triangle of a local matrix is scattered, so an asymmetric local matrix
    /// would otherwise silently lose its upper triangle.
    pub fn with_symmetry_check(self, tolerance: T) -> Self {
        Self {
            symmetry_tolerance: Some(tolerance),
            ..self
        }
    }

    /// Assembles the global matrix of `bilinear` and the global vector of `linear` in a single
    /// pass over the elements.
    ///
    /// The matrix and vector are zeroed before assembly. The matrix must have been allocated
    /// from the sparsity graph of `table`.
    #[allow(clippy::too_many_arguments)]
    pub fn assemble_system_into<Space, Mesh, Bilinear, Linear>(
        &self,
        table: &ElementDofTable,
        space: &Space,
        mesh: &Mesh,
        bilinear: &Bilinear,
        linear: &Linear,
        matrix: &mut SymmetricCsrMatrix<T>,
        rhs: &mut DVector<T>,
    ) -> Result<()>
    where
        Space: ?Sized + DofSpace,
        Mesh: ?Sized + ElementMesh,
        Bilinear: ?Sized + ElementMatrixEvaluator<T, Space::Element, Mesh::Transform>,
        Linear: ?Sized + ElementVectorEvaluator<T, Space::Element, Mesh::Transform>,
    {
        check_element_count(table, mesh)?;
        check_matrix_dimensions(table, matrix)?;
        check_vector_dimensions(table, rhs)?;
        matrix.zero();
        rhs.fill(T::zero());

        let ws = &mut *self.workspace.borrow_mut();
        for (element_index, dofs) in table.iter().enumerate() {
            ws.prepare(dofs);
            let element = space.element(element_index);
            let transform = mesh.element_transform(element_index);
            ws.evaluate_matrix(element_index, &element, &transform, bilinear, self.symmetry_tolerance)?;
            ws.evaluate_vector(element_index, &element, &transform, linear)?;
            ws.scatter_matrix(element_index, matrix)?;
            ws.scatter_vector(element_index, rhs)?;
            trace!("Assembled element {element_index} with DOFs {dofs:?}");
        }

        debug!(
            "Assembled system with {} elements, {} DOFs and {} stored matrix entries",
            table.num_elements(),
            table.num_dofs(),
            matrix.nnz()
        );
        Ok(())
    }

    /// Assembles the global matrix of `bilinear`.
    pub fn assemble_matrix_into<Space, Mesh, Bilinear>(
        &self,
        table: &ElementDofTable,
        space: &Space,
        mesh: &Mesh,
        bilinear: &Bilinear,
        matrix: &mut SymmetricCsrMatrix<T>,
    ) -> Result<()>
    where
        Space: ?Sized + DofSpace,
        Mesh: ?Sized + ElementMesh,
        Bilinear: ?Sized + ElementMatrixEvaluator<T, Space::Element, Mesh::Transform>,
    {
        check_element_count(table, mesh)?;
        check_matrix_dimensions(table, matrix)?;
        matrix.zero();

        let ws = &mut *self.workspace.borrow_mut();
        for (element_index, dofs) in table.iter().enumerate() {
            ws.prepare(dofs);
            let element = space.element(element_index);
            let transform = mesh.element_transform(element_index);
            ws.evaluate_matrix(element_index, &element, &transform, bilinear, self.symmetry_tolerance)?;
            ws.scatter_matrix(element_index, matrix)?;
        }

        debug!("Assembled matrix with {} stored entries", matrix.nnz());
        Ok(())
    }

    /// Assembles the global vector of `linear`.
    pub fn assemble_vector_into<Space, Mesh, Linear>(
        &self,
        table: &ElementDofTable,
        space: &Space,
        mesh: &Mesh,
        linear: &Linear,
        rhs: &mut DVector<T>,
    ) -> Result<()>
    where
        Space: ?Sized + DofSpace,
        Mesh: ?Sized + ElementMesh,
        Linear: ?Sized + ElementVectorEvaluator<T, Space::Element, Mesh::Transform>,
    {
        check_element_count(table, mesh)?;
        check_vector_dimensions(table, rhs)?;
        rhs.fill(T::zero());

        let ws = &mut *self.workspace.borrow_mut();
        for (element_index, dofs) in table.iter().enumerate() {
            ws.prepare(dofs);
            let element = space.element(element_index);
            let transform = mesh.element_transform(element_index);
            ws.evaluate_vector(element_index, &element, &transform, linear)?;
            ws.scatter_vector(element_index, rhs)?;
        }

        debug!("Assembled vector with {} entries", rhs.len());
        Ok(())
    }
}

/// Adds a local element vector to the entries of `global` given by `dofs`.
///
/// A DOF listed several times receives the sum of its local entries.
pub fn add_indirect<T, S>(global: &mut DVector<T>, dofs: &[usize], local: &Matrix<T, Dyn, U1, S>) -> Result<()>
where
    T: Real,
    S: Storage<T, Dyn, U1>,
{
    if local.len() != dofs.len() {
        return Err(AssemblyError::DimensionMismatch {
            expected: dofs.len(),
            actual: local.len(),
        });
    }
    if let Some(&dof) = dofs.iter().find(|&&dof| dof >= global.len()) {
        return Err(AssemblyError::IndexOutOfRange {
            index: dof,
            bound: global.len(),
            element: None,
        });
    }
    for (&dof, &value) in dofs.iter().zip(local.iter()) {
        global[dof] += value;
    }
    Ok(())
}

fn check_element_count<Mesh: ?Sized + ElementMesh>(table: &ElementDofTable, mesh: &Mesh) -> Result<()> {
    check_element_counts(table.num_elements(), mesh.num_elements())
}

/// Checks that two collections of elements agree on the number of elements.
///
/// On mismatch, the reported element is the first one that exists in only one of the two,
/// which is out of bounds for the smaller collection.
pub(crate) fn check_element_counts(num_elements: usize, other_num_elements: usize) -> Result<()> {
    if num_elements != other_num_elements {
        let bound = min(num_elements, other_num_elements);
        return Err(AssemblyError::ElementOutOfRange {
            element: bound,
            num_elements: bound,
        });
    }
    Ok(())
}

fn check_matrix_dimensions<T: Real>(table: &ElementDofTable, matrix: &SymmetricCsrMatrix<T>) -> Result<()> {
    if matrix.nrows() != table.num_dofs() {
        return Err(AssemblyError::DimensionMismatch {
            expected: table.num_dofs(),
            actual: matrix.nrows(),
        });
    }
    Ok(())
}

fn check_vector_dimensions<T: Real>(table: &ElementDofTable, rhs: &DVector<T>) -> Result<()> {
    if rhs.len() != table.num_dofs() {
        return Err(AssemblyError::DimensionMismatch {
            expected: table.num_dofs(),
            actual: rhs.len(),
        });
    }
    Ok(())
}

fn check_symmetry<T: Real>(matrix: &DMatrix<T>, tolerance: T) -> eyre::Result<()> {
    let n = matrix.nrows();
    let scale = matrix.iter().fold(T::one(), |scale, &x| scale.max(x.abs()));
    for j in 0..n {
        for i in (j + 1)..n {
            let difference = (matrix[(i, j)] - matrix[(j, i)]).abs();
            if difference > tolerance * scale {
                return Err(eyre!(
                    "local matrix is not symmetric: entries ({i}, {j}) and ({j}, {i}) differ by {difference}"
                ));
            }
        }
    }
    Ok(())
}
