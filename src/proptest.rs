//! Strategies for property-based testing of assembly.
use ::proptest::collection::vec;
use ::proptest::prelude::*;
use nalgebra::DMatrix;

/// Element DOF lists over a random number of DOFs.
///
/// Produces `(num_dofs, element_dofs)` where every DOF index is smaller than `num_dofs`.
/// Elements may be empty, and an element may list the same DOF more than once.
pub fn element_dof_lists(
    max_dofs: usize,
    max_elements: usize,
    max_element_dofs: usize,
) -> impl Strategy<Value = (usize, Vec<Vec<usize>>)> {
    (1..=max_dofs.max(1)).prop_flat_map(move |num_dofs| {
        let element = vec(0..num_dofs, 0..=max_element_dofs);
        (Just(num_dofs), vec(element, 0..=max_elements))
    })
}

/// Element DOF lists in which no element lists the same DOF twice.
pub fn distinct_element_dof_lists(
    max_dofs: usize,
    max_elements: usize,
    max_element_dofs: usize,
) -> impl Strategy<Value = (usize, Vec<Vec<usize>>)> {
    element_dof_lists(max_dofs, max_elements, max_element_dofs).prop_map(|(num_dofs, mut elements)| {
        for dofs in &mut elements {
            let mut seen = vec![false; num_dofs];
            dofs.retain(|&dof| !std::mem::replace(&mut seen[dof], true));
        }
        (num_dofs, elements)
    })
}

/// A symmetric matrix with entries in `[-10, 10]`.
pub fn symmetric_matrix(dim: usize) -> impl Strategy<Value = DMatrix<f64>> {
    vec(-10.0..10.0, dim * dim).prop_map(move |values| {
        let a = DMatrix::from_column_slice(dim, dim, &values);
        (&a + a.transpose()) / 2.0
    })
}

/// A symmetric positive definite matrix with eigenvalues bounded below by one.
pub fn spd_matrix(dim: usize) -> impl Strategy<Value = DMatrix<f64>> {
    vec(-1.0..1.0, dim * dim).prop_map(move |values| {
        let a = DMatrix::from_column_slice(dim, dim, &values);
        a.transpose() * &a + DMatrix::identity(dim, dim)
    })
}

/// A free DOF mask with at least one free DOF.
pub fn free_dof_mask(num_dofs: usize) -> impl Strategy<Value = Vec<bool>> {
    (vec(any::<bool>(), num_dofs), 0..num_dofs.max(1)).prop_map(move |(mut mask, free)| {
        if num_dofs > 0 {
            mask[free] = true;
        }
        mask
    })
}
