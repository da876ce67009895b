//! Interfaces to the collaborators of an assembly pass.
//!
//! An assembly pass consumes three kinds of collaborators:
//!
//! - a [`DofSpace`], which knows how DOFs are attached to elements and which DOFs are
//!   constrained,
//! - an [`ElementMesh`], which enumerates elements and provides the geometric transformation
//!   of each element,
//! - element evaluators ([`ElementMatrixEvaluator`], [`ElementVectorEvaluator`]), which compute
//!   the local contributions of a bilinear and a linear form.
use nalgebra::{DMatrixViewMut, DVectorViewMut, Scalar};

mod linear_lagrange;

pub use linear_lagrange::*;

/// A space of degrees of freedom attached to the elements of a mesh.
pub trait DofSpace {
    /// A handle to the finite element (shape functions) of an element, passed on to the
    /// element evaluators.
    type Element;

    /// The total number of DOFs in the space.
    fn num_dofs(&self) -> usize;

    /// The number of elements the space attaches DOFs to.
    fn num_elements(&self) -> usize;

    /// The number of DOFs associated with the given element.
    ///
    /// Only called with `element_index < self.num_elements()`.
    fn element_dof_count(&self, element_index: usize) -> usize;

    /// Writes the global DOF indices of the given element into `dofs`.
    ///
    /// The buffer is cleared before it is handed to the space. The indices must be written in
    /// the order in which the element evaluators expect them, and the number of indices must
    /// agree with [`element_dof_count`](Self::element_dof_count).
    fn populate_element_dofs(&self, element_index: usize, dofs: &mut Vec<usize>);

    fn element(&self, element_index: usize) -> Self::Element;

    /// Returns a mask with one entry per DOF, with `true` for free and `false` for
    /// constrained DOFs.
    fn free_dof_mask(&self) -> Vec<bool>;
}

/// A collection of elements, each with an associated geometric transformation.
pub trait ElementMesh {
    type Transform;

    fn num_elements(&self) -> usize;

    fn element_transform(&self, element_index: usize) -> Self::Transform;
}

/// Computes the local matrix of a symmetric bilinear form on a single element.
pub trait ElementMatrixEvaluator<T: Scalar, Element, Transform> {
    /// Adds the local matrix to `output`.
    ///
    /// `output` is a zeroed square matrix with one row per element DOF.
    fn evaluate_element_matrix(
        &self,
        element: &Element,
        transform: &Transform,
        output: DMatrixViewMut<T>,
    ) -> eyre::Result<()>;
}

/// Computes the local vector of a linear form on a single element.
pub trait ElementVectorEvaluator<T: Scalar, Element, Transform> {
    /// Adds the local vector to `output`.
    ///
    /// `output` is a zeroed vector with one entry per element DOF.
    fn evaluate_element_vector(
        &self,
        element: &Element,
        transform: &Transform,
        output: DVectorViewMut<T>,
    ) -> eyre::Result<()>;
}
