//! Assembly of global finite element systems and their solution by sparse direct factorization.
//!
//! The crate is organized in the order in which data flows through an assembly pass:
//!
//! 1. [`incidence`]: the element-to-DOF table, queried from a [`DofSpace`](space::DofSpace).
//! 2. [`sparsity`]: the symmetric sparsity graph induced by the table.
//! 3. [`matrix`]: a symmetric CSR matrix whose layout is fixed by the graph.
//! 4. [`assembly`]: the element loop that evaluates local contributions and scatters them.
//! 5. [`partition`]: the split of DOFs into free and constrained DOFs.
//! 6. [`solve`]: direct factorization of the system restricted to free DOFs.
//! 7. [`pipeline`]: sequencing of the above.
//!
//! Meshes, DOF spaces and element evaluators are consumed through the traits in [`space`].
//! The [`mesh`], [`space::LinearLagrangeSpace`] and [`operators`] modules provide simple
//! implementations for piecewise linear elements on simplices.
use nalgebra::RealField;

pub mod assembly;
pub mod diagnostics;
pub mod error;
pub mod incidence;
pub mod matrix;
pub mod mesh;
pub mod operators;
pub mod options;
pub mod partition;
pub mod pipeline;
pub mod solve;
pub mod space;
pub mod sparsity;

#[cfg(feature = "proptest")]
pub mod proptest;

pub use error::{AssemblyError, Result};
pub use pipeline::{assemble_and_solve, assemble_and_solve_into, Pipeline, PipelineError, Stage};

pub extern crate fedsolve_nested_vec as nested_vec;
pub extern crate nalgebra;
pub extern crate nalgebra_sparse;

/// Scalar types supported by assembly and factorization.
pub trait Real: RealField + Copy {}

impl<T: RealField + Copy> Real for T {}
