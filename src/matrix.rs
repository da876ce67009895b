//! Symmetric sparse matrices with a fixed sparsity graph.
use crate::error::{AssemblyError, Result};
use crate::sparsity::SparsityGraph;
use crate::Real;
use nalgebra::storage::Storage;
use nalgebra::{DMatrix, DVector, Dyn, Matrix};
use nalgebra_sparse::{CooMatrix, CsrMatrix};
use std::sync::Arc;

/// Reusable buffers for scattering element blocks.
#[derive(Debug, Clone)]
pub(crate) struct ScatterWorkspace<T> {
    sorted_permutation: Vec<usize>,
    /// Value slots and the values to add to them, resolved before any value is written.
    pending: Vec<(usize, T)>,
}

impl<T> Default for ScatterWorkspace<T> {
    fn default() -> Self {
        Self {
            sorted_permutation: Vec::new(),
            pending: Vec::new(),
        }
    }
}

/// A symmetric matrix in compressed sparse row format storing only its lower triangle.
///
/// The storage layout is determined once by a [`SparsityGraph`] and never changes: values can
/// only be accumulated into entries that are part of the graph. Several matrices may share
/// the same graph.
#[derive(Debug, Clone, PartialEq)]
pub struct SymmetricCsrMatrix<T> {
    graph: Arc<SparsityGraph>,
    values: Vec<T>,
}

impl<T: Real> SymmetricCsrMatrix<T> {
    /// Allocates a zero matrix with the layout of the given graph.
    pub fn from_graph(graph: impl Into<Arc<SparsityGraph>>) -> Self {
        let graph = graph.into();
        let values = vec![T::zero(); graph.nnz()];
        Self { graph, values }
    }

    pub fn zero(&mut self) {
        self.values.fill(T::zero());
    }

    pub fn nrows(&self) -> usize {
        self.graph.num_dofs()
    }

    pub fn ncols(&self) -> usize {
        self.graph.num_dofs()
    }

    /// The number of stored entries in the lower triangle.
    pub fn nnz(&self) -> usize {
        self.values.len()
    }

    pub fn graph(&self) -> &Arc<SparsityGraph> {
        &self.graph
    }

    /// The stored values, in the storage order of the graph.
    pub fn values(&self) -> &[T] {
        &self.values
    }

    /// Returns the entry `(row, col)`, or `None` if the entry is not part of the graph.
    pub fn get(&self, row: usize, col: usize) -> Option<T> {
        self.graph.slot(row, col).map(|slot| self.values[slot])
    }

    /// Adds `value` to the entry `(row, col)` and, by symmetry, to `(col, row)`.
    ///
    /// Fails with [`AssemblyError::OutOfPatternAccess`] if the entry is not part of the graph.
    pub fn accumulate(&mut self, row: usize, col: usize, value: T) -> Result<()> {
        for index in [row, col] {
            self.check_index(index)?;
        }
        let slot = self
            .graph
            .slot(row, col)
            .ok_or(AssemblyError::OutOfPatternAccess {
                row,
                col,
                element: None,
            })?;
        self.values[slot] += value;
        Ok(())
    }

    /// Adds a dense symmetric element block to the rows and columns given by `dofs`.
    ///
    /// Local entry `(i, j)` contributes to the global entry `(dofs[i], dofs[j])`. Since only the
    /// lower triangle is stored, only local entries with `dofs[i] >= dofs[j]` are read: the
    /// block is assumed to be symmetric. A DOF listed several times contributes once for every
    /// occurrence.
    ///
    /// The matrix is left unchanged if the block touches an entry outside of the graph.
    pub fn scatter_add_block<S>(&mut self, dofs: &[usize], block: &Matrix<T, Dyn, Dyn, S>) -> Result<()>
    where
        S: Storage<T, Dyn, Dyn>,
    {
        self.scatter_add_block_with_workspace(dofs, block, &mut ScatterWorkspace::default())
    }

    /// Same as [`scatter_add_block`](Self::scatter_add_block), but reuses the buffers of the
    /// given workspace.
    pub(crate) fn scatter_add_block_with_workspace<S>(
        &mut self,
        dofs: &[usize],
        block: &Matrix<T, Dyn, Dyn, S>,
        workspace: &mut ScatterWorkspace<T>,
    ) -> Result<()>
    where
        S: Storage<T, Dyn, Dyn>,
    {
        let n = dofs.len();
        if block.nrows() != n || block.ncols() != n {
            return Err(AssemblyError::LocalBlockShapeMismatch {
                rows: block.nrows(),
                cols: block.ncols(),
                num_dofs: n,
            });
        }
        for &dof in dofs {
            self.check_index(dof)?;
        }

        let ScatterWorkspace {
            sorted_permutation,
            pending,
        } = workspace;
        sorted_permutation.clear();
        sorted_permutation.extend(0..n);
        sorted_permutation.sort_by_key(|&local_idx| dofs[local_idx]);
        pending.clear();

        let graph = &*self.graph;
        let all_columns = graph.pattern().minor_indices();
        for (local_row, &global_row) in dofs.iter().enumerate() {
            let range = graph
                .row_range(global_row)
                .expect("Row index has been checked to be in bounds");
            let row_offset = range.start;
            let columns = &all_columns[range];

            // Walk the columns of the element in increasing global order, so that the stored
            // columns of the row only need to be traversed once
            let mut cursor = 0;
            for &local_col in sorted_permutation.iter() {
                let global_col = dofs[local_col];
                if global_col > global_row {
                    break;
                }
                cursor += columns[cursor..].partition_point(|&c| c < global_col);
                match columns.get(cursor) {
                    Some(&c) if c == global_col => {
                        pending.push((row_offset + cursor, block[(local_row, local_col)]));
                    }
                    _ => {
                        return Err(AssemblyError::OutOfPatternAccess {
                            row: global_row,
                            col: global_col,
                            element: None,
                        })
                    }
                }
            }
        }

        // Every entry has been located, so no partial update can happen past this point
        for &(slot, value) in pending.iter() {
            self.values[slot] += value;
        }
        Ok(())
    }

    /// Computes the product `A x` of the full symmetric matrix with a vector.
    pub fn mul_vector(&self, x: &DVector<T>) -> Result<DVector<T>> {
        if x.len() != self.ncols() {
            return Err(AssemblyError::DimensionMismatch {
                expected: self.ncols(),
                actual: x.len(),
            });
        }
        let mut y = DVector::zeros(self.nrows());
        for (row, col, value) in self.triplet_iter() {
            y[row] += value * x[col];
            if row != col {
                y[col] += value * x[row];
            }
        }
        Ok(y)
    }

    /// Iterates over the stored lower-triangle entries `(row, col, value)`.
    pub fn triplet_iter(&self) -> impl '_ + Iterator<Item = (usize, usize, T)> {
        self.graph
            .entries()
            .zip(self.values.iter())
            .map(|((row, col), &value)| (row, col, value))
    }

    /// Expands the matrix into a CSR matrix storing both triangles.
    pub fn to_full_csr(&self) -> CsrMatrix<T> {
        CsrMatrix::from(&self.to_full_coo())
    }

    pub fn to_dense(&self) -> DMatrix<T> {
        let mut dense = DMatrix::zeros(self.nrows(), self.ncols());
        for (row, col, value) in self.triplet_iter() {
            dense[(row, col)] = value;
            dense[(col, row)] = value;
        }
        dense
    }

    pub(crate) fn to_full_coo(&self) -> CooMatrix<T> {
        let mut coo = CooMatrix::new(self.nrows(), self.ncols());
        for (row, col, value) in self.triplet_iter() {
            coo.push(row, col, value);
            if row != col {
                coo.push(col, row, value);
            }
        }
        coo
    }

    fn check_index(&self, index: usize) -> Result<()> {
        if index < self.nrows() {
            Ok(())
        } else {
            Err(AssemblyError::IndexOutOfRange {
                index,
                bound: self.nrows(),
                element: None,
            })
        }
    }
}
