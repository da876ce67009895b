use fedsolve::incidence::ElementDofTable;
use fedsolve::proptest::element_dof_lists;
use fedsolve::sparsity::{canonical_entry, SparsityGraph};
use fedsolve::AssemblyError;
use proptest::prelude::*;
use std::collections::BTreeSet;

fn graph_from(num_dofs: usize, elements: &[Vec<usize>]) -> SparsityGraph {
    SparsityGraph::from_element_dofs(num_dofs, elements.iter().map(Vec::as_slice)).unwrap()
}

#[test]
fn chain_graph_stores_lower_triangle() {
    let graph = graph_from(3, &[vec![0, 1], vec![1, 2]]);

    assert_eq!(graph.num_dofs(), 3);
    assert_eq!(graph.nnz(), 5);
    assert_eq!(graph.row_columns(0), Some([0].as_slice()));
    assert_eq!(graph.row_columns(1), Some([0, 1].as_slice()));
    assert_eq!(graph.row_columns(2), Some([1, 2].as_slice()));
    assert_eq!(graph.row_columns(3), None);

    assert!(graph.contains(2, 1));
    assert!(graph.contains(1, 2));
    assert!(!graph.contains(0, 2));
    assert!(!graph.contains(2, 0));
    assert_eq!(graph.slot(1, 2), graph.slot(2, 1));
    assert_eq!(graph.slot(0, 0), Some(0));
    assert_eq!(graph.slot(2, 2), Some(4));

    let entries: Vec<_> = graph.entries().collect();
    assert_eq!(entries, vec![(0, 0), (1, 0), (1, 1), (2, 1), (2, 2)]);
}

#[test]
fn graph_from_incidence_table() {
    let elements = [vec![2, 0], vec![0]];
    let table = ElementDofTable::from_element_dofs(3, elements.iter().map(Vec::as_slice)).unwrap();
    let graph = SparsityGraph::from_incidence(&table);
    assert_eq!(graph.entries().collect::<Vec<_>>(), vec![(0, 0), (2, 0), (2, 2)]);
}

#[test]
fn untouched_dofs_give_empty_rows() {
    let graph = graph_from(6, &[vec![3, 1]]);
    assert_eq!(graph.row_columns(0), Some([].as_slice()));
    assert_eq!(graph.row_columns(1), Some([1].as_slice()));
    assert_eq!(graph.row_columns(2), Some([].as_slice()));
    assert_eq!(graph.row_columns(3), Some([1, 3].as_slice()));
    assert_eq!(graph.row_columns(4), Some([].as_slice()));
    assert_eq!(graph.row_columns(5), Some([].as_slice()));
    assert_eq!(graph.nnz(), 3);
}

#[test]
fn single_dof_element_gives_diagonal_entry() {
    let graph = graph_from(2, &[vec![1]]);
    assert_eq!(graph.entries().collect::<Vec<_>>(), vec![(1, 1)]);
}

#[test]
fn duplicate_entries_collapse() {
    let graph = graph_from(2, &[vec![0, 1, 1], vec![1, 0], vec![0, 0]]);
    assert_eq!(graph.entries().collect::<Vec<_>>(), vec![(0, 0), (1, 0), (1, 1)]);
}

#[test]
fn empty_graph() {
    let graph = graph_from(0, &[]);
    assert_eq!(graph.num_dofs(), 0);
    assert_eq!(graph.nnz(), 0);
    assert_eq!(graph.entries().count(), 0);
}

#[test]
fn out_of_range_dof_is_rejected() {
    let err = SparsityGraph::from_element_dofs(2, [[0usize, 2].as_slice()]).unwrap_err();
    assert!(matches!(
        err,
        AssemblyError::IndexOutOfRange {
            index: 2,
            bound: 2,
            element: Some(0)
        }
    ));
}

proptest! {
    #[test]
    fn graph_is_exactly_the_set_of_touched_pairs((num_dofs, elements) in element_dof_lists(12, 10, 5)) {
        let graph = graph_from(num_dofs, &elements);

        let expected: BTreeSet<_> = elements
            .iter()
            .flat_map(|dofs| dofs.iter().flat_map(move |&i| dofs.iter().map(move |&j| canonical_entry(i, j))))
            .collect();
        let actual: BTreeSet<_> = graph.entries().collect();
        prop_assert_eq!(&actual, &expected);
        prop_assert_eq!(graph.nnz(), expected.len());

        for row in 0..num_dofs {
            let columns = graph.row_columns(row).unwrap();
            prop_assert!(columns.windows(2).all(|w| w[0] < w[1]));
            prop_assert!(columns.iter().all(|&col| col <= row));
        }
    }

    #[test]
    fn graph_does_not_depend_on_element_order((num_dofs, elements) in element_dof_lists(12, 10, 5)) {
        let mut reversed = elements.clone();
        reversed.reverse();
        prop_assert_eq!(graph_from(num_dofs, &elements), graph_from(num_dofs, &reversed));
    }
}
