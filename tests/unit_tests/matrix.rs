use crate::dense_reference;
use fedsolve::matrix::SymmetricCsrMatrix;
use fedsolve::proptest::{distinct_element_dof_lists, element_dof_lists, symmetric_matrix};
use fedsolve::sparsity::SparsityGraph;
use fedsolve::AssemblyError;
use matrixcompare::assert_matrix_eq;
use nalgebra::{DMatrix, DVector};
use proptest::collection::vec;
use proptest::prelude::*;
use std::sync::Arc;

fn chain_matrix() -> SymmetricCsrMatrix<f64> {
    let graph = SparsityGraph::from_element_dofs(3, [[0, 1].as_slice(), [1, 2].as_slice()]).unwrap();
    SymmetricCsrMatrix::from_graph(graph)
}

fn element_blocks(elements: Vec<Vec<usize>>) -> impl Strategy<Value = (Vec<Vec<usize>>, Vec<DMatrix<f64>>)> {
    let blocks: Vec<_> = elements.iter().map(|dofs| symmetric_matrix(dofs.len())).collect();
    (Just(elements), blocks)
}

#[test]
fn new_matrix_is_zero() {
    let matrix = chain_matrix();
    assert_eq!(matrix.nrows(), 3);
    assert_eq!(matrix.nnz(), 5);
    assert!(matrix.values().iter().all(|&v| v == 0.0));
    assert_eq!(matrix.get(0, 0), Some(0.0));
    assert_eq!(matrix.get(0, 2), None);
}

#[test]
fn accumulate_is_symmetric() {
    let mut matrix = chain_matrix();
    matrix.accumulate(1, 2, 3.0).unwrap();
    matrix.accumulate(2, 1, 1.5).unwrap();
    matrix.accumulate(1, 1, 2.0).unwrap();

    assert_eq!(matrix.get(1, 2), Some(4.5));
    assert_eq!(matrix.get(2, 1), Some(4.5));
    assert_eq!(matrix.get(1, 1), Some(2.0));

    #[rustfmt::skip]
    let expected = DMatrix::from_row_slice(3, 3, &[
        0.0, 0.0, 0.0,
        0.0, 2.0, 4.5,
        0.0, 4.5, 0.0,
    ]);
    assert_matrix_eq!(matrix.to_dense(), expected);
}

#[test]
fn accumulate_outside_pattern_fails() {
    let mut matrix = chain_matrix();
    let err = matrix.accumulate(0, 2, 1.0).unwrap_err();
    assert!(matches!(
        err,
        AssemblyError::OutOfPatternAccess {
            row: 0,
            col: 2,
            element: None
        }
    ));
    assert!(matrix.values().iter().all(|&v| v == 0.0));

    let err = matrix.accumulate(3, 0, 1.0).unwrap_err();
    assert!(matches!(err, AssemblyError::IndexOutOfRange { index: 3, bound: 3, .. }));
}

#[test]
fn scatter_add_chain() {
    let mut matrix = chain_matrix();
    let stiffness = DMatrix::from_row_slice(2, 2, &[1.0, -1.0, -1.0, 1.0]);
    matrix.scatter_add_block(&[0, 1], &stiffness).unwrap();
    matrix.scatter_add_block(&[1, 2], &stiffness).unwrap();

    #[rustfmt::skip]
    let expected = DMatrix::from_row_slice(3, 3, &[
        1.0, -1.0, 0.0,
        -1.0, 2.0, -1.0,
        0.0, -1.0, 1.0,
    ]);
    assert_matrix_eq!(matrix.to_dense(), expected);
    assert_matrix_eq!(matrix.to_full_csr(), expected);
}

#[test]
fn scatter_add_with_unsorted_dofs() {
    let graph = SparsityGraph::from_element_dofs(3, [[2, 0, 1].as_slice()]).unwrap();
    let mut matrix = SymmetricCsrMatrix::from_graph(graph);
    #[rustfmt::skip]
    let block = DMatrix::from_row_slice(3, 3, &[
        1.0, 2.0, 3.0,
        2.0, 4.0, 5.0,
        3.0, 5.0, 6.0,
    ]);
    matrix.scatter_add_block(&[2, 0, 1], &block).unwrap();
    let expected = dense_reference(3, &[vec![2, 0, 1]], &[block]);
    assert_matrix_eq!(matrix.to_dense(), expected);
}

#[test]
fn scatter_add_duplicate_dofs_accumulates_every_occurrence() {
    let graph = SparsityGraph::from_element_dofs(2, [[0, 0, 1].as_slice()]).unwrap();
    let mut matrix = SymmetricCsrMatrix::from_graph(graph);
    #[rustfmt::skip]
    let block = DMatrix::from_row_slice(3, 3, &[
        1.0, 2.0, 3.0,
        2.0, 4.0, 5.0,
        3.0, 5.0, 6.0,
    ]);
    matrix.scatter_add_block(&[0, 0, 1], &block).unwrap();

    assert_eq!(matrix.get(0, 0), Some(1.0 + 2.0 + 2.0 + 4.0));
    assert_eq!(matrix.get(1, 0), Some(3.0 + 5.0));
    assert_eq!(matrix.get(1, 1), Some(6.0));
}

#[test]
fn scatter_add_outside_pattern_fails() {
    let mut matrix = chain_matrix();
    let block = DMatrix::from_element(2, 2, 1.0);
    let err = matrix.scatter_add_block(&[0, 2], &block).unwrap_err();
    assert!(matches!(err, AssemblyError::OutOfPatternAccess { row: 2, col: 0, .. }));
    assert_eq!(err.element(), None);
}

#[test]
fn failed_scatter_leaves_matrix_unchanged() {
    let mut matrix = chain_matrix();
    let stiffness = DMatrix::from_row_slice(2, 2, &[1.0, -1.0, -1.0, 1.0]);
    matrix.scatter_add_block(&[0, 1], &stiffness).unwrap();
    let before = matrix.clone();

    // Rows 1 and 0 are in the pattern, row 2 is not coupled to DOF 0
    let block = DMatrix::from_element(3, 3, 1.0);
    let err = matrix.scatter_add_block(&[1, 0, 2], &block).unwrap_err();
    assert!(matches!(err, AssemblyError::OutOfPatternAccess { row: 2, col: 0, .. }));
    assert_eq!(matrix, before);
}

#[test]
fn scatter_add_rejects_mismatched_block() {
    let mut matrix = chain_matrix();
    let block = DMatrix::from_element(3, 2, 1.0);
    let err = matrix.scatter_add_block(&[0, 1], &block).unwrap_err();
    assert!(matches!(
        err,
        AssemblyError::LocalBlockShapeMismatch {
            rows: 3,
            cols: 2,
            num_dofs: 2
        }
    ));
}

#[test]
fn zero_resets_values_but_keeps_graph() {
    let mut matrix = chain_matrix();
    matrix.accumulate(1, 0, 2.0).unwrap();
    let graph = Arc::clone(matrix.graph());
    matrix.zero();
    assert!(matrix.values().iter().all(|&v| v == 0.0));
    assert!(Arc::ptr_eq(&graph, matrix.graph()));
}

#[test]
fn matrices_can_share_a_graph() {
    let graph = Arc::new(SparsityGraph::from_element_dofs(2, [[0, 1].as_slice()]).unwrap());
    let mut a = SymmetricCsrMatrix::<f64>::from_graph(Arc::clone(&graph));
    let b = SymmetricCsrMatrix::<f64>::from_graph(Arc::clone(&graph));
    a.accumulate(1, 0, 1.0).unwrap();
    assert_eq!(a.get(0, 1), Some(1.0));
    assert_eq!(b.get(0, 1), Some(0.0));
    assert!(Arc::ptr_eq(a.graph(), b.graph()));
}

#[test]
fn mul_vector_rejects_wrong_length() {
    let matrix = chain_matrix();
    let err = matrix.mul_vector(&DVector::zeros(2)).unwrap_err();
    assert!(matches!(err, AssemblyError::DimensionMismatch { expected: 3, actual: 2 }));
}

proptest! {
    #[test]
    fn scatter_add_agrees_with_dense_scatter(
        (num_dofs, (elements, blocks)) in element_dof_lists(8, 6, 4)
            .prop_flat_map(|(num_dofs, elements)| (Just(num_dofs), element_blocks(elements)))
    ) {
        let graph = SparsityGraph::from_element_dofs(num_dofs, elements.iter().map(Vec::as_slice)).unwrap();
        let mut matrix = SymmetricCsrMatrix::from_graph(graph);
        for (dofs, block) in elements.iter().zip(&blocks) {
            matrix.scatter_add_block(dofs, block).unwrap();
        }
        let expected = dense_reference(num_dofs, &elements, &blocks);
        assert_matrix_eq!(matrix.to_dense(), expected, comp = abs, tol = 1e-12);
        assert_matrix_eq!(matrix.to_full_csr(), expected, comp = abs, tol = 1e-12);
    }

    #[test]
    fn mul_vector_agrees_with_dense_product(
        ((num_dofs, (elements, blocks)), x) in distinct_element_dof_lists(8, 6, 4)
            .prop_flat_map(|(num_dofs, elements)| (Just(num_dofs), element_blocks(elements)))
            .prop_flat_map(|system| {
                let num_dofs = system.0;
                (Just(system), vec(-10.0..10.0, num_dofs))
            })
    ) {
        let graph = SparsityGraph::from_element_dofs(num_dofs, elements.iter().map(Vec::as_slice)).unwrap();
        let mut matrix = SymmetricCsrMatrix::from_graph(graph);
        for (dofs, block) in elements.iter().zip(&blocks) {
            matrix.scatter_add_block(dofs, block).unwrap();
        }
        let x = DVector::from_vec(x);
        let y = matrix.mul_vector(&x).unwrap();
        let expected = dense_reference(num_dofs, &elements, &blocks) * &x;
        assert_matrix_eq!(y, expected, comp = abs, tol = 1e-10);
    }
}
