//! Solves `-Δu = 1` on the unit square with homogeneous boundary conditions.
use fedsolve::diagnostics::RecordingDiagnostics;
use fedsolve::mesh::procedural::create_unit_square_uniform_tri_mesh_2d;
use fedsolve::operators::{LaplaceEvaluator, SourceEvaluator};
use fedsolve::options::PipelineOptions;
use fedsolve::space::{DofSpace, LinearLagrangeSpace};
use fedsolve::Pipeline;

fn main() -> eyre::Result<()> {
    let cells_per_dim = std::env::args()
        .nth(1)
        .map(|arg| arg.parse::<usize>())
        .transpose()?
        .unwrap_or(32);

    let mesh = create_unit_square_uniform_tri_mesh_2d::<f64>(cells_per_dim);
    let space = LinearLagrangeSpace::new(&mesh).with_boundary_constrained();
    let laplace = LaplaceEvaluator::new(1.0);
    let source = SourceEvaluator::new(1.0);

    let mut diagnostics = RecordingDiagnostics::default();
    let u = Pipeline::new(&space, &mesh, &laplace, &source)
        .with_options(PipelineOptions::default().with_symmetry_check(1e-10))
        .with_diagnostics(&mut diagnostics)
        .run()?;

    let num_free = space.free_dof_mask().iter().filter(|&&free| free).count();
    let nnz = diagnostics.matrix.as_ref().map(|matrix| matrix.nnz()).unwrap_or(0);
    println!("Cells per dimension: {cells_per_dim}");
    println!("DOFs: {} ({} free)", space.num_dofs(), num_free);
    println!("Stored matrix entries (lower triangle): {nnz}");
    println!("max u = {:.6}", u.max());
    Ok(())
}
