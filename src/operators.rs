//! Element evaluators for piecewise linear Lagrange elements on simplices.
use crate::space::LinearLagrangeElement;
use eyre::ensure;

mod laplace;
mod source;

pub use laplace::*;
pub use source::*;

fn check_node_count(element: &LinearLagrangeElement, expected: usize) -> eyre::Result<()> {
    ensure!(
        element.num_nodes() == expected,
        "element has {} nodes, but the geometry has {} vertices",
        element.num_nodes(),
        expected
    );
    Ok(())
}
