//! The sparsity graph of a symmetric global matrix.
use crate::error::{AssemblyError, Result};
use crate::incidence::ElementDofTable;
use log::debug;
use nalgebra_sparse::pattern::SparsityPattern;
use std::cmp::{max, min};
use std::ops::Range;

/// Returns the canonical orientation `(max, min)` of a matrix entry in symmetric storage.
#[inline]
pub fn canonical_entry(row: usize, col: usize) -> (usize, usize) {
    (max(row, col), min(row, col))
}

/// The set of entries of a symmetric matrix that may be non-zero.
///
/// Only the lower triangle is represented: the graph is stored as a row-major sparsity pattern
/// in which every row `i` holds the sorted, unique columns `j <= i`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SparsityGraph {
    pattern: SparsityPattern,
}

impl SparsityGraph {
    /// Computes the graph induced by element-DOF incidence.
    ///
    /// Every pair of DOFs sharing an element is connected, and every DOF touched by an element
    /// is connected to itself.
    pub fn from_incidence(table: &ElementDofTable) -> Self {
        let graph = Self::from_element_dofs(table.num_dofs(), table.iter())
            .expect("Element-DOF table only holds indices in bounds");
        debug!(
            "Built sparsity graph for {} DOFs with {} stored entries",
            graph.num_dofs(),
            graph.nnz()
        );
        graph
    }

    /// Computes the graph induced by the given element DOF lists.
    ///
    /// Returns [`AssemblyError::IndexOutOfRange`] if any DOF index is not smaller
    /// than `num_dofs`.
    pub fn from_element_dofs<'a, I>(num_dofs: usize, element_dofs: I) -> Result<Self>
    where
        I: IntoIterator<Item = &'a [usize]>,
    {
        // Collect all (including duplicate) entries and then sort and deduplicate. Compared
        // to inserting into an ordered set this is cheaper, and the result does not depend
        // on the order in which elements are visited.
        let mut entries = Vec::new();
        for (element_index, dofs) in element_dofs.into_iter().enumerate() {
            for &dof_i in dofs {
                if dof_i >= num_dofs {
                    return Err(AssemblyError::IndexOutOfRange {
                        index: dof_i,
                        bound: num_dofs,
                        element: Some(element_index),
                    });
                }
                for &dof_j in dofs {
                    if dof_i >= dof_j {
                        entries.push((dof_i, dof_j));
                    }
                }
            }
        }

        entries.sort_unstable();
        entries.dedup();

        let mut offsets = Vec::with_capacity(num_dofs + 1);
        let mut column_indices = Vec::with_capacity(entries.len());
        offsets.push(0);
        for (i, j) in entries {
            while offsets.len() < i + 1 {
                // Reaching a new row. Looping correctly handles consecutive empty rows
                offsets.push(column_indices.len());
            }
            column_indices.push(j);
        }

        // Fill out offsets for remaining empty rows
        while offsets.len() < num_dofs + 1 {
            offsets.push(column_indices.len());
        }

        let pattern = SparsityPattern::try_from_offsets_and_indices(num_dofs, num_dofs, offsets, column_indices)
            .expect("Sorted and deduplicated entries always form a valid pattern");
        Ok(Self { pattern })
    }

    /// The number of rows (and columns) of the matrix.
    pub fn num_dofs(&self) -> usize {
        self.pattern.major_dim()
    }

    /// The number of stored entries in the lower triangle, diagonal included.
    pub fn nnz(&self) -> usize {
        self.pattern.nnz()
    }

    /// The underlying lower-triangular row-major pattern.
    pub fn pattern(&self) -> &SparsityPattern {
        &self.pattern
    }

    pub(crate) fn row_range(&self, row: usize) -> Option<Range<usize>> {
        let offsets = self.pattern.major_offsets();
        let begin = *offsets.get(row)?;
        let end = *offsets.get(row + 1)?;
        Some(begin..end)
    }

    /// The sorted columns `j <= row` stored in the given row.
    pub fn row_columns(&self, row: usize) -> Option<&[usize]> {
        let range = self.row_range(row)?;
        Some(&self.pattern.minor_indices()[range])
    }

    /// The storage slot of the entry `(row, col)`, in either orientation.
    pub fn slot(&self, row: usize, col: usize) -> Option<usize> {
        let (row, col) = canonical_entry(row, col);
        let range = self.row_range(row)?;
        self.pattern.minor_indices()[range.clone()]
            .binary_search(&col)
            .ok()
            .map(|local_idx| range.start + local_idx)
    }

    pub fn contains(&self, row: usize, col: usize) -> bool {
        self.slot(row, col).is_some()
    }

    /// Iterates over the stored entries `(row, col)` with `row >= col`, in storage order.
    pub fn entries(&self) -> impl '_ + Iterator<Item = (usize, usize)> {
        (0..self.num_dofs()).flat_map(move |row| {
            self.row_columns(row)
                .unwrap_or_default()
                .iter()
                .map(move |&col| (row, col))
        })
    }
}
