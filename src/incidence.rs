//! The element-to-DOF incidence table.
use crate::error::{AssemblyError, Result};
use crate::space::DofSpace;
use fedsolve_nested_vec::NestedVec;
use log::{debug, warn};
use serde::{Deserialize, Serialize};

/// For each element, the ordered global DOF indices of the element.
///
/// The table is built once per assembly pass and is read-only afterwards. Every stored index is
/// guaranteed to be smaller than [`num_dofs`](Self::num_dofs). An element may list the same DOF
/// more than once.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElementDofTable {
    num_dofs: usize,
    element_dofs: NestedVec<usize>,
}

impl ElementDofTable {
    /// Queries the DOFs of the first `num_elements` elements of the space.
    ///
    /// The space is queried twice: once for the DOF count of every element, which determines the
    /// storage layout, and once for the DOF indices themselves.
    ///
    /// # Errors
    ///
    /// - [`AssemblyError::InconsistentIncidence`] if the number of indices written by
    ///   [`DofSpace::populate_element_dofs`] differs from [`DofSpace::element_dof_count`].
    /// - [`AssemblyError::IndexOutOfRange`] if an index is not smaller than
    ///   [`DofSpace::num_dofs`].
    /// - [`AssemblyError::ElementOutOfRange`] if the space has fewer than `num_elements`
    ///   elements.
    pub fn build<Space>(space: &Space, num_elements: usize) -> Result<Self>
    where
        Space: ?Sized + DofSpace,
    {
        let space_elements = space.num_elements();
        if num_elements > space_elements {
            return Err(AssemblyError::ElementOutOfRange {
                element: space_elements,
                num_elements: space_elements,
            });
        }
        let num_dofs = space.num_dofs();
        let counts = (0..num_elements).map(|element_index| space.element_dof_count(element_index));
        let mut element_dofs = NestedVec::from_counts(counts, usize::MAX);

        let mut buffer = Vec::with_capacity(element_dofs.max_array_len());
        for element_index in 0..num_elements {
            buffer.clear();
            space.populate_element_dofs(element_index, &mut buffer);

            let slot = element_dofs
                .get_mut(element_index)
                .expect("Table has been sized for every element");
            if slot.len() != buffer.len() {
                return Err(AssemblyError::InconsistentIncidence {
                    element: element_index,
                    expected: slot.len(),
                    actual: buffer.len(),
                });
            }
            check_dofs_in_bounds(&buffer, num_dofs, element_index)?;
            slot.copy_from_slice(&buffer);
        }

        let table = Self { num_dofs, element_dofs };
        let num_empty = table.iter().filter(|dofs| dofs.is_empty()).count();
        if num_empty > 0 {
            warn!("{num_empty} elements have no associated DOFs and do not contribute to the system");
        }
        debug!(
            "Built element-DOF table with {} elements, {} DOFs and {} entries",
            table.num_elements(),
            table.num_dofs(),
            table.total_entries()
        );
        Ok(table)
    }

    /// Constructs a table directly from the DOF lists of every element.
    pub fn from_element_dofs<'a, I>(num_dofs: usize, element_dofs: I) -> Result<Self>
    where
        I: IntoIterator<Item = &'a [usize]>,
    {
        let mut table = NestedVec::new();
        for (element_index, dofs) in element_dofs.into_iter().enumerate() {
            check_dofs_in_bounds(dofs, num_dofs, element_index)?;
            table.push(dofs);
        }
        Ok(Self {
            num_dofs,
            element_dofs: table,
        })
    }

    pub fn num_elements(&self) -> usize {
        self.element_dofs.len()
    }

    pub fn num_dofs(&self) -> usize {
        self.num_dofs
    }

    pub fn element_dofs(&self, element_index: usize) -> Option<&[usize]> {
        self.element_dofs.get(element_index)
    }

    pub fn iter(&self) -> impl '_ + ExactSizeIterator<Item = &[usize]> {
        self.element_dofs.iter()
    }

    /// The sum of the DOF counts of all elements, duplicates included.
    pub fn total_entries(&self) -> usize {
        self.element_dofs.total_num_elements()
    }

    /// The largest number of DOFs associated with a single element.
    pub fn max_element_dofs(&self) -> usize {
        self.element_dofs.max_array_len()
    }
}

fn check_dofs_in_bounds(dofs: &[usize], num_dofs: usize, element_index: usize) -> Result<()> {
    match dofs.iter().find(|&&dof| dof >= num_dofs) {
        Some(&dof) => Err(AssemblyError::IndexOutOfRange {
            index: dof,
            bound: num_dofs,
            element: Some(element_index),
        }),
        None => Ok(()),
    }
}
