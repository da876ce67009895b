//! Partitioning of DOFs into free and constrained DOFs.
use crate::error::{AssemblyError, Result};
use crate::space::DofSpace;
use crate::Real;
use log::{debug, warn};
use nalgebra::DVector;
use serde::{Deserialize, Serialize};

/// A split of the DOFs of a space into free DOFs, which are solved for, and constrained DOFs,
/// whose values are imposed.
///
/// Free DOFs are numbered consecutively in increasing global order, which defines the row and
/// column order of the restricted system.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DofPartition {
    mask: Vec<bool>,
    free_dofs: Vec<usize>,
    constrained_dofs: Vec<usize>,
    /// Maps a global DOF to its index among the free DOFs, or `usize::MAX` for constrained DOFs.
    restricted_indices: Vec<usize>,
}

impl DofPartition {
    /// Builds the partition from a mask with `true` for free DOFs.
    pub fn from_mask(mask: Vec<bool>) -> Self {
        let mut free_dofs = Vec::new();
        let mut constrained_dofs = Vec::new();
        let mut restricted_indices = vec![usize::MAX; mask.len()];
        for (dof, &is_free) in mask.iter().enumerate() {
            if is_free {
                restricted_indices[dof] = free_dofs.len();
                free_dofs.push(dof);
            } else {
                constrained_dofs.push(dof);
            }
        }

        if free_dofs.is_empty() && !mask.is_empty() {
            warn!("All {} DOFs are constrained, nothing to solve for", mask.len());
        }
        debug!(
            "Partitioned {} DOFs into {} free and {} constrained DOFs",
            mask.len(),
            free_dofs.len(),
            constrained_dofs.len()
        );

        Self {
            mask,
            free_dofs,
            constrained_dofs,
            restricted_indices,
        }
    }

    /// Builds the partition from the constraint metadata of a space.
    ///
    /// Fails with [`AssemblyError::MaskLengthMismatch`] if the mask does not have one entry
    /// per DOF of the space.
    pub fn from_space<Space: ?Sized + DofSpace>(space: &Space) -> Result<Self> {
        let mask = space.free_dof_mask();
        if mask.len() != space.num_dofs() {
            return Err(AssemblyError::MaskLengthMismatch {
                expected: space.num_dofs(),
                actual: mask.len(),
            });
        }
        Ok(Self::from_mask(mask))
    }

    pub fn num_dofs(&self) -> usize {
        self.mask.len()
    }

    pub fn num_free(&self) -> usize {
        self.free_dofs.len()
    }

    pub fn num_constrained(&self) -> usize {
        self.constrained_dofs.len()
    }

    /// Returns `false` for constrained DOFs and for DOFs out of bounds.
    pub fn is_free(&self, dof: usize) -> bool {
        self.mask.get(dof).copied().unwrap_or(false)
    }

    /// The free DOFs in increasing order.
    pub fn free_dofs(&self) -> &[usize] {
        &self.free_dofs
    }

    /// The constrained DOFs in increasing order.
    pub fn constrained_dofs(&self) -> &[usize] {
        &self.constrained_dofs
    }

    /// The index of a free DOF among the free DOFs, or `None` if the DOF is constrained.
    pub fn restricted_index(&self, dof: usize) -> Option<usize> {
        self.restricted_indices
            .get(dof)
            .copied()
            .filter(|&idx| idx != usize::MAX)
    }

    /// Extracts the free entries of a global vector.
    pub fn restrict<T: Real>(&self, vector: &DVector<T>) -> Result<DVector<T>> {
        self.check_len(vector)?;
        Ok(DVector::from_iterator(
            self.num_free(),
            self.free_dofs.iter().map(|&dof| vector[dof]),
        ))
    }

    /// Extracts the constrained entries of a global vector.
    pub fn restrict_constrained<T: Real>(&self, vector: &DVector<T>) -> Result<DVector<T>> {
        self.check_len(vector)?;
        Ok(DVector::from_iterator(
            self.num_constrained(),
            self.constrained_dofs.iter().map(|&dof| vector[dof]),
        ))
    }

    /// Overwrites the free entries of `global` with the entries of the restricted vector.
    ///
    /// Constrained entries of `global` are left untouched.
    pub fn scatter_free<T: Real>(&self, restricted: &DVector<T>, global: &mut DVector<T>) -> Result<()> {
        self.check_len(global)?;
        if restricted.len() != self.num_free() {
            return Err(AssemblyError::DimensionMismatch {
                expected: self.num_free(),
                actual: restricted.len(),
            });
        }
        for (&dof, &value) in self.free_dofs.iter().zip(restricted.iter()) {
            global[dof] = value;
        }
        Ok(())
    }

    pub fn mask(&self) -> &[bool] {
        &self.mask
    }

    fn check_len<T: Real>(&self, vector: &DVector<T>) -> Result<()> {
        if vector.len() != self.num_dofs() {
            return Err(AssemblyError::DimensionMismatch {
                expected: self.num_dofs(),
                actual: vector.len(),
            });
        }
        Ok(())
    }
}
