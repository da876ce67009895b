//! Direct solution of the global system restricted to free DOFs.
use crate::error::{AssemblyError, Result};
use crate::matrix::SymmetricCsrMatrix;
use crate::options::PipelineOptions;
use crate::partition::DofPartition;
use crate::Real;
use log::debug;
use nalgebra::{DMatrix, DVector, Scalar};
use nalgebra_sparse::factorization::CscCholesky;
use nalgebra_sparse::{CooMatrix, CscMatrix};
use serde::{Deserialize, Serialize};

/// An operator that applies the inverse of a (restricted) system matrix.
pub trait InverseOperator<T: Scalar> {
    /// The dimension of the restricted system.
    fn dim(&self) -> usize;

    /// Solves the restricted system with the given right-hand side.
    fn apply(&self, rhs: &DVector<T>) -> Result<DVector<T>>;
}

/// A direct solver for symmetric systems restricted to the free DOFs of a partition.
pub trait DirectSolver<T: Real> {
    type Factorization: InverseOperator<T>;

    /// Factorizes the submatrix of `matrix` whose rows and columns are free in `partition`.
    ///
    /// Fails with [`AssemblyError::SingularSystem`] if the submatrix is not numerically
    /// symmetric positive definite.
    fn factorize(&self, matrix: &SymmetricCsrMatrix<T>, partition: &DofPartition) -> Result<Self::Factorization>;

    /// Adopts the relevant settings of the given options. Does nothing by default.
    fn configure(&mut self, _options: &PipelineOptions) {}
}

/// A sparse Cholesky solver.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct CholeskySolver {
    pivot_tolerance: f64,
}

impl Default for CholeskySolver {
    fn default() -> Self {
        Self::from_options(&PipelineOptions::default())
    }
}

impl CholeskySolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_options(options: &PipelineOptions) -> Self {
        Self {
            pivot_tolerance: options.pivot_tolerance,
        }
    }

    /// Sets the tolerance below which a pivot, relative to the largest pivot, is considered zero.
    pub fn with_pivot_tolerance(self, pivot_tolerance: f64) -> Self {
        Self { pivot_tolerance }
    }

    pub fn pivot_tolerance(&self) -> f64 {
        self.pivot_tolerance
    }
}

/// The Cholesky factorization of a restricted system.
#[derive(Debug, Clone)]
pub struct CholeskyFactorization<T: Real> {
    cholesky: CscCholesky<T>,
    dim: usize,
}

impl<T: Real> CholeskyFactorization<T> {
    /// The lower triangular factor `L` of `A = L L^T`.
    pub fn l_factor(&self) -> &CscMatrix<T> {
        self.cholesky.l()
    }
}

impl<T: Real> InverseOperator<T> for CholeskyFactorization<T> {
    fn dim(&self) -> usize {
        self.dim
    }

    fn apply(&self, rhs: &DVector<T>) -> Result<DVector<T>> {
        if rhs.len() != self.dim {
            return Err(AssemblyError::DimensionMismatch {
                expected: self.dim,
                actual: rhs.len(),
            });
        }
        let b = DMatrix::from_column_slice(self.dim, 1, rhs.as_slice());
        let x = self.cholesky.solve(&b);
        Ok(DVector::from_column_slice(x.as_slice()))
    }
}

impl<T: Real> DirectSolver<T> for CholeskySolver {
    type Factorization = CholeskyFactorization<T>;

    fn factorize(&self, matrix: &SymmetricCsrMatrix<T>, partition: &DofPartition) -> Result<Self::Factorization> {
        // A zero or negative diagonal entry can never belong to an SPD matrix, and the
        // factorization does not report which DOF caused a breakdown
        for &dof in partition.free_dofs() {
            let diagonal = matrix.get(dof, dof).unwrap_or_else(T::zero);
            if !(diagonal > T::zero()) {
                return Err(AssemblyError::SingularSystem { pivot: Some(dof) });
            }
        }

        let restricted = restrict_matrix(matrix, partition)?;
        let cholesky = CscCholesky::factor(&restricted).map_err(|_| AssemblyError::SingularSystem { pivot: None })?;

        // Pivots are the squared diagonal entries of L
        let pivots: Vec<(usize, T)> = cholesky
            .l()
            .triplet_iter()
            .filter(|(i, j, _)| i == j)
            .map(|(i, _, &l_ii)| (i, l_ii * l_ii))
            .collect();
        let max_pivot = pivots
            .iter()
            .fold(T::zero(), |max_pivot, &(_, pivot)| max_pivot.max(pivot));
        let threshold = nalgebra::convert::<f64, T>(self.pivot_tolerance) * max_pivot;
        if let Some(&(restricted_index, _)) = pivots.iter().find(|(_, pivot)| !(*pivot > threshold)) {
            return Err(AssemblyError::SingularSystem {
                pivot: Some(partition.free_dofs()[restricted_index]),
            });
        }

        debug!(
            "Factorized restricted system with {} free DOFs, {} non-zeros in the factor",
            partition.num_free(),
            cholesky.l().nnz()
        );
        Ok(CholeskyFactorization {
            cholesky,
            dim: partition.num_free(),
        })
    }

    fn configure(&mut self, options: &PipelineOptions) {
        self.pivot_tolerance = options.pivot_tolerance;
    }
}

/// Extracts the submatrix of free rows and columns as a full (both triangles) CSC matrix.
///
/// Row and column `k` of the result correspond to the `k`-th free DOF.
pub fn restrict_matrix<T: Real>(matrix: &SymmetricCsrMatrix<T>, partition: &DofPartition) -> Result<CscMatrix<T>> {
    check_partition(matrix, partition)?;
    let n = partition.num_free();
    let mut coo = CooMatrix::new(n, n);
    for (row, col, value) in matrix.triplet_iter() {
        if let (Some(i), Some(j)) = (partition.restricted_index(row), partition.restricted_index(col)) {
            coo.push(i, j, value);
            if i != j {
                coo.push(j, i, value);
            }
        }
    }
    Ok(CscMatrix::from(&coo))
}

/// Computes the right-hand side of the restricted system, `b_f - A_fc u_c`.
///
/// `field` provides the imposed values `u_c` in its constrained entries. Its free entries are
/// ignored.
pub fn restricted_load_vector<T: Real>(
    matrix: &SymmetricCsrMatrix<T>,
    rhs: &DVector<T>,
    partition: &DofPartition,
    field: &DVector<T>,
) -> Result<DVector<T>> {
    check_partition(matrix, partition)?;
    let mut b = partition.restrict(rhs)?;
    if field.len() != partition.num_dofs() {
        return Err(AssemblyError::DimensionMismatch {
            expected: partition.num_dofs(),
            actual: field.len(),
        });
    }

    if partition.num_constrained() > 0 {
        for (row, col, value) in matrix.triplet_iter() {
            match (partition.restricted_index(row), partition.restricted_index(col)) {
                (Some(i), None) => b[i] -= value * field[col],
                (None, Some(j)) => b[j] -= value * field[row],
                _ => {}
            }
        }
    }
    Ok(b)
}

/// Solves `A u = b` for the free entries of `field`, with the constrained entries of `field`
/// taken as imposed values.
///
/// Constrained entries of `field` are never modified. If there are no free DOFs, no
/// factorization takes place.
pub fn solve_constrained<T, Solver>(
    solver: &Solver,
    matrix: &SymmetricCsrMatrix<T>,
    rhs: &DVector<T>,
    partition: &DofPartition,
    field: &mut DVector<T>,
) -> Result<()>
where
    T: Real,
    Solver: ?Sized + DirectSolver<T>,
{
    let b = restricted_load_vector(matrix, rhs, partition, field)?;
    if partition.num_free() == 0 {
        debug!("No free DOFs, skipping factorization");
        return Ok(());
    }
    let factorization = solver.factorize(matrix, partition)?;
    let x = factorization.apply(&b)?;
    partition.scatter_free(&x, field)
}

fn check_partition<T: Real>(matrix: &SymmetricCsrMatrix<T>, partition: &DofPartition) -> Result<()> {
    if matrix.nrows() != partition.num_dofs() {
        return Err(AssemblyError::MaskLengthMismatch {
            expected: matrix.nrows(),
            actual: partition.num_dofs(),
        });
    }
    Ok(())
}
