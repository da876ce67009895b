use crate::ExplicitSpace;
use fedsolve::partition::DofPartition;
use fedsolve::AssemblyError;
use nalgebra::DVector;

#[test]
fn partition_from_mask() {
    let partition = DofPartition::from_mask(vec![false, true, true, false, true]);

    assert_eq!(partition.num_dofs(), 5);
    assert_eq!(partition.num_free(), 3);
    assert_eq!(partition.num_constrained(), 2);
    assert_eq!(partition.free_dofs(), &[1, 2, 4]);
    assert_eq!(partition.constrained_dofs(), &[0, 3]);
    assert_eq!(partition.mask(), &[false, true, true, false, true]);

    assert!(!partition.is_free(0));
    assert!(partition.is_free(4));
    assert!(!partition.is_free(5));

    assert_eq!(partition.restricted_index(0), None);
    assert_eq!(partition.restricted_index(1), Some(0));
    assert_eq!(partition.restricted_index(2), Some(1));
    assert_eq!(partition.restricted_index(4), Some(2));
    assert_eq!(partition.restricted_index(5), None);
}

#[test]
fn restrict_and_scatter_free() {
    let partition = DofPartition::from_mask(vec![false, true, true, false]);
    let vector = DVector::from_column_slice(&[1.0, 2.0, 3.0, 4.0]);

    assert_eq!(partition.restrict(&vector).unwrap(), DVector::from_column_slice(&[2.0, 3.0]));
    assert_eq!(
        partition.restrict_constrained(&vector).unwrap(),
        DVector::from_column_slice(&[1.0, 4.0])
    );

    let mut global = vector.clone();
    partition
        .scatter_free(&DVector::from_column_slice(&[-2.0, -3.0]), &mut global)
        .unwrap();
    assert_eq!(global, DVector::from_column_slice(&[1.0, -2.0, -3.0, 4.0]));
}

#[test]
fn restrict_rejects_wrong_length() {
    let partition = DofPartition::from_mask(vec![true, true]);
    let err = partition.restrict(&DVector::<f64>::zeros(3)).unwrap_err();
    assert!(matches!(err, AssemblyError::DimensionMismatch { expected: 2, actual: 3 }));

    let mut global = DVector::zeros(2);
    let err = partition
        .scatter_free(&DVector::<f64>::zeros(1), &mut global)
        .unwrap_err();
    assert!(matches!(err, AssemblyError::DimensionMismatch { expected: 2, actual: 1 }));
}

#[test]
fn partition_from_space() {
    let space = ExplicitSpace::new(3, vec![vec![0, 1, 2]]).with_constrained(&[2]);
    let partition = DofPartition::from_space(&space).unwrap();
    assert_eq!(partition.free_dofs(), &[0, 1]);
    assert_eq!(partition.constrained_dofs(), &[2]);
}

#[test]
fn partition_from_space_rejects_mask_of_wrong_length() {
    let space = ExplicitSpace::new(3, vec![]).with_free_mask(vec![true; 2]);
    let err = DofPartition::from_space(&space).unwrap_err();
    assert!(matches!(err, AssemblyError::MaskLengthMismatch { expected: 3, actual: 2 }));
}

#[test]
fn fully_constrained_partition() {
    let partition = DofPartition::from_mask(vec![false; 3]);
    assert_eq!(partition.num_free(), 0);
    assert_eq!(partition.restrict(&DVector::from_element(3, 1.0)).unwrap().len(), 0);
}
