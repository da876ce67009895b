//! Sequencing of a complete assembly and solve pass.
use crate::assembly::{check_element_counts, Assembler};
use crate::diagnostics::{DiagnosticSink, NoDiagnostics};
use crate::error::AssemblyError;
use crate::incidence::ElementDofTable;
use crate::matrix::SymmetricCsrMatrix;
use crate::options::PipelineOptions;
use crate::partition::DofPartition;
use crate::solve::{solve_constrained, CholeskySolver, DirectSolver};
use crate::space::{DofSpace, ElementMatrixEvaluator, ElementMesh, ElementVectorEvaluator};
use crate::sparsity::SparsityGraph;
use crate::Real;
use log::debug;
use nalgebra::{DVector, Scalar};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fmt::{Display, Formatter};
use std::mem;
use std::sync::Arc;
use thiserror::Error;

/// The stages of a pipeline, in the order in which they run.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Stage {
    BuildIncidence,
    BuildSparsity,
    AllocateSystem,
    Assemble,
    Partition,
    Solve,
    WriteBack,
}

impl Stage {
    pub fn name(&self) -> &'static str {
        match self {
            Stage::BuildIncidence => "build incidence",
            Stage::BuildSparsity => "build sparsity",
            Stage::AllocateSystem => "allocate system",
            Stage::Assemble => "assemble",
            Stage::Partition => "partition",
            Stage::Solve => "solve",
            Stage::WriteBack => "write back",
        }
    }
}

impl Display for Stage {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// The observable state of a pipeline.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum PipelineState {
    /// No stage has run yet.
    Init,
    /// The given stage has completed successfully.
    Completed(Stage),
    /// All stages have completed successfully.
    Done,
    /// The given stage has failed.
    Failed(Stage),
}

impl PipelineState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, PipelineState::Done | PipelineState::Failed(_))
    }
}

/// An error raised by one of the stages of a pipeline.
#[derive(Debug, Error)]
#[error("assembly pipeline failed in stage '{stage}'")]
pub struct PipelineError {
    stage: Stage,
    #[source]
    error: AssemblyError,
}

impl PipelineError {
    pub fn new(stage: Stage, error: AssemblyError) -> Self {
        Self { stage, error }
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    pub fn error(&self) -> &AssemblyError {
        &self.error
    }

    pub fn into_error(self) -> AssemblyError {
        self.error
    }

    /// The element associated with the underlying error, if any.
    pub fn element(&self) -> Option<usize> {
        self.error.element()
    }

    /// The DOF associated with the underlying error, if any.
    pub fn dof(&self) -> Option<usize> {
        self.error.dof()
    }
}

/// The global system produced by the assembly stages.
#[derive(Debug, Clone, PartialEq)]
pub struct AssembledSystem<T: Scalar> {
    pub table: ElementDofTable,
    pub matrix: SymmetricCsrMatrix<T>,
    pub rhs: DVector<T>,
}

impl<T: Real> AssembledSystem<T> {
    pub fn num_dofs(&self) -> usize {
        self.rhs.len()
    }
}

/// The data owned by a pipeline between two stages.
#[derive(Debug)]
enum Progress<T: Real> {
    Init,
    Incidence(ElementDofTable),
    Sparsity(ElementDofTable, Arc<SparsityGraph>),
    Allocated(ElementDofTable, SymmetricCsrMatrix<T>, DVector<T>),
    Assembled(AssembledSystem<T>),
    Partitioned(AssembledSystem<T>, DofPartition),
    Solved(DVector<T>),
    Done(DVector<T>),
    Failed(Stage),
}

impl<T: Real> Progress<T> {
    fn state(&self) -> PipelineState {
        use PipelineState::*;
        match self {
            Progress::Init => Init,
            Progress::Incidence(..) => Completed(Stage::BuildIncidence),
            Progress::Sparsity(..) => Completed(Stage::BuildSparsity),
            Progress::Allocated(..) => Completed(Stage::AllocateSystem),
            Progress::Assembled(..) => Completed(Stage::Assemble),
            Progress::Partitioned(..) => Completed(Stage::Partition),
            Progress::Solved(..) => Completed(Stage::Solve),
            Progress::Done(..) => Done,
            Progress::Failed(stage) => Failed(*stage),
        }
    }

    fn next_stage(&self) -> Option<Stage> {
        match self {
            Progress::Init => Some(Stage::BuildIncidence),
            Progress::Incidence(..) => Some(Stage::BuildSparsity),
            Progress::Sparsity(..) => Some(Stage::AllocateSystem),
            Progress::Allocated(..) => Some(Stage::Assemble),
            Progress::Assembled(..) => Some(Stage::Partition),
            Progress::Partitioned(..) => Some(Stage::Solve),
            Progress::Solved(..) => Some(Stage::WriteBack),
            Progress::Done(..) | Progress::Failed(..) => None,
        }
    }

    fn last_stage(&self) -> Stage {
        match self {
            Progress::Failed(stage) => *stage,
            _ => Stage::WriteBack,
        }
    }
}

/// Assembles a global system from element contributions and solves it for the free DOFs.
///
/// A pipeline runs the stages of [`Stage`] in order, either all at once with
/// [`run`](Self::run) or one at a time with [`step`](Self::step). The first failing stage
/// moves the pipeline into a terminal failed state; nothing is retried. A pipeline can only
/// run once.
pub struct Pipeline<'a, T, Space, Mesh, Bilinear, Linear, Solver = CholeskySolver, Sink = NoDiagnostics>
where
    T: Real,
    Space: ?Sized,
    Mesh: ?Sized,
    Bilinear: ?Sized,
    Linear: ?Sized,
{
    space: &'a Space,
    mesh: &'a Mesh,
    bilinear: &'a Bilinear,
    linear: &'a Linear,
    solver: Solver,
    diagnostics: Sink,
    options: PipelineOptions,
    assembler: Assembler<T>,
    field: Option<&'a mut DVector<T>>,
    progress: Progress<T>,
}

impl<'a, T, Space, Mesh, Bilinear, Linear> Pipeline<'a, T, Space, Mesh, Bilinear, Linear>
where
    T: Real,
    Space: ?Sized + DofSpace,
    Mesh: ?Sized + ElementMesh,
    Bilinear: ?Sized + ElementMatrixEvaluator<T, Space::Element, Mesh::Transform>,
    Linear: ?Sized + ElementVectorEvaluator<T, Space::Element, Mesh::Transform>,
{
    /// Creates a pipeline with default options, a sparse Cholesky solver and no diagnostics.
    pub fn new(space: &'a Space, mesh: &'a Mesh, bilinear: &'a Bilinear, linear: &'a Linear) -> Self {
        Self {
            space,
            mesh,
            bilinear,
            linear,
            solver: CholeskySolver::default(),
            diagnostics: NoDiagnostics,
            options: PipelineOptions::default(),
            assembler: Assembler::default(),
            field: None,
            progress: Progress::Init,
        }
    }
}

impl<'a, T, Space, Mesh, Bilinear, Linear, Solver, Sink> Pipeline<'a, T, Space, Mesh, Bilinear, Linear, Solver, Sink>
where
    T: Real,
    Space: ?Sized + DofSpace,
    Mesh: ?Sized + ElementMesh,
    Bilinear: ?Sized + ElementMatrixEvaluator<T, Space::Element, Mesh::Transform>,
    Linear: ?Sized + ElementVectorEvaluator<T, Space::Element, Mesh::Transform>,
    Solver: DirectSolver<T>,
    Sink: DiagnosticSink<T>,
{
    /// Applies the options to the pipeline and its current solver.
    pub fn with_options(mut self, options: PipelineOptions) -> Self {
        self.solver.configure(&options);
        self.assembler = if options.check_symmetry {
            Assembler::default().with_symmetry_check(nalgebra::convert(options.symmetry_tolerance))
        } else {
            Assembler::default()
        };
        self.options = options;
        self
    }

    /// Replaces the solver. The solver is used as given, without applying the pipeline options.
    pub fn with_solver<Solver2>(self, solver: Solver2) -> Pipeline<'a, T, Space, Mesh, Bilinear, Linear, Solver2, Sink>
    where
        Solver2: DirectSolver<T>,
    {
        Pipeline {
            space: self.space,
            mesh: self.mesh,
            bilinear: self.bilinear,
            linear: self.linear,
            solver,
            diagnostics: self.diagnostics,
            options: self.options,
            assembler: self.assembler,
            field: self.field,
            progress: self.progress,
        }
    }

    pub fn with_diagnostics<Sink2>(self, diagnostics: Sink2) -> Pipeline<'a, T, Space, Mesh, Bilinear, Linear, Solver, Sink2>
    where
        Sink2: DiagnosticSink<T>,
    {
        Pipeline {
            space: self.space,
            mesh: self.mesh,
            bilinear: self.bilinear,
            linear: self.linear,
            solver: self.solver,
            diagnostics,
            options: self.options,
            assembler: self.assembler,
            field: self.field,
            progress: self.progress,
        }
    }

    /// Uses `field` as the unknown field.
    ///
    /// The constrained entries of `field` are taken as the imposed values. When the pipeline
    /// completes, the free entries of `field` hold the solution. Without a field, all imposed
    /// values are zero.
    pub fn with_field(self, field: &'a mut DVector<T>) -> Self {
        Self {
            field: Some(field),
            ..self
        }
    }

    pub fn options(&self) -> &PipelineOptions {
        &self.options
    }

    pub fn state(&self) -> PipelineState {
        self.progress.state()
    }

    pub fn diagnostics(&self) -> &Sink {
        &self.diagnostics
    }

    /// The solution, once the pipeline is done.
    pub fn solution(&self) -> Option<&DVector<T>> {
        match &self.progress {
            Progress::Done(solution) => Some(solution),
            _ => None,
        }
    }

    /// Runs the next stage and returns the resulting state.
    ///
    /// Stepping a pipeline that is done or has failed is an error.
    pub fn step(&mut self) -> Result<PipelineState, PipelineError> {
        let stage = self
            .progress
            .next_stage()
            .ok_or_else(|| PipelineError::new(self.progress.last_stage(), AssemblyError::PipelineReused))?;

        let progress = mem::replace(&mut self.progress, Progress::Failed(stage));
        match self.advance(progress) {
            Ok(next) => {
                self.progress = next;
                debug!("Completed pipeline stage '{stage}'");
                Ok(self.state())
            }
            Err(error) => {
                debug!("Pipeline stage '{stage}' failed: {error}");
                Err(PipelineError::new(stage, error))
            }
        }
    }

    /// Runs all remaining stages and returns the solution.
    pub fn run(mut self) -> Result<DVector<T>, PipelineError> {
        while self.step()? != PipelineState::Done {}
        match self.progress {
            Progress::Done(solution) => Ok(solution),
            _ => Err(PipelineError::new(self.progress.last_stage(), AssemblyError::PipelineReused)),
        }
    }

    /// Runs the stages up to and including assembly and returns the assembled system.
    pub fn assemble_only(mut self) -> Result<AssembledSystem<T>, PipelineError> {
        while self
            .progress
            .next_stage()
            .map_or(false, |stage| stage <= Stage::Assemble)
        {
            self.step()?;
        }
        match self.progress {
            Progress::Assembled(system) => Ok(system),
            _ => Err(PipelineError::new(self.progress.last_stage(), AssemblyError::PipelineReused)),
        }
    }

    fn advance(&mut self, progress: Progress<T>) -> Result<Progress<T>, AssemblyError> {
        match progress {
            Progress::Init => {
                check_element_counts(self.space.num_elements(), self.mesh.num_elements())?;
                let table = ElementDofTable::build(self.space, self.mesh.num_elements())?;
                self.diagnostics.element_dof_table(&table);
                Ok(Progress::Incidence(table))
            }
            Progress::Incidence(table) => {
                let graph = SparsityGraph::from_incidence(&table);
                self.diagnostics.sparsity_graph(&graph);
                Ok(Progress::Sparsity(table, Arc::new(graph)))
            }
            Progress::Sparsity(table, graph) => {
                let matrix = SymmetricCsrMatrix::from_graph(graph);
                let rhs = DVector::zeros(table.num_dofs());
                Ok(Progress::Allocated(table, matrix, rhs))
            }
            Progress::Allocated(table, mut matrix, mut rhs) => {
                self.assembler.assemble_system_into(
                    &table,
                    self.space,
                    self.mesh,
                    self.bilinear,
                    self.linear,
                    &mut matrix,
                    &mut rhs,
                )?;
                self.diagnostics.assembled_system(&matrix, &rhs);
                Ok(Progress::Assembled(AssembledSystem { table, matrix, rhs }))
            }
            Progress::Assembled(system) => {
                let partition = DofPartition::from_space(self.space)?;
                Ok(Progress::Partitioned(system, partition))
            }
            Progress::Partitioned(system, partition) => {
                let mut solution = match self.field.as_deref() {
                    Some(field) => field.clone(),
                    None => DVector::zeros(system.num_dofs()),
                };
                solve_constrained(&self.solver, &system.matrix, &system.rhs, &partition, &mut solution)?;
                Ok(Progress::Solved(solution))
            }
            Progress::Solved(solution) => {
                if let Some(field) = self.field.as_deref_mut() {
                    field.copy_from(&solution);
                }
                self.diagnostics.solution(&solution);
                Ok(Progress::Done(solution))
            }
            Progress::Done(..) | Progress::Failed(..) => Err(AssemblyError::PipelineReused),
        }
    }
}

/// Assembles and solves the system with zero imposed values, returning the full solution.
pub fn assemble_and_solve<T, Space, Mesh, Bilinear, Linear>(
    space: &Space,
    mesh: &Mesh,
    bilinear: &Bilinear,
    linear: &Linear,
) -> Result<DVector<T>, PipelineError>
where
    T: Real,
    Space: ?Sized + DofSpace,
    Mesh: ?Sized + ElementMesh,
    Bilinear: ?Sized + ElementMatrixEvaluator<T, Space::Element, Mesh::Transform>,
    Linear: ?Sized + ElementVectorEvaluator<T, Space::Element, Mesh::Transform>,
{
    Pipeline::new(space, mesh, bilinear, linear).run()
}

/// Assembles and solves the system, reading imposed values from and writing the solution into
/// `field`.
///
/// Constrained entries of `field` are left untouched. On failure, `field` is not modified.
pub fn assemble_and_solve_into<T, Space, Mesh, Bilinear, Linear>(
    space: &Space,
    mesh: &Mesh,
    bilinear: &Bilinear,
    linear: &Linear,
    field: &mut DVector<T>,
) -> Result<(), PipelineError>
where
    T: Real,
    Space: ?Sized + DofSpace,
    Mesh: ?Sized + ElementMesh,
    Bilinear: ?Sized + ElementMatrixEvaluator<T, Space::Element, Mesh::Transform>,
    Linear: ?Sized + ElementVectorEvaluator<T, Space::Element, Mesh::Transform>,
{
    Pipeline::new(space, mesh, bilinear, linear)
        .with_field(field)
        .run()
        .map(|_| ())
}
