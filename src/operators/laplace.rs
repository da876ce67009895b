use crate::mesh::{Segment1d, Triangle2d};
use crate::operators::check_node_count;
use crate::space::{ElementMatrixEvaluator, LinearLagrangeElement};
use crate::Real;
use eyre::ensure;
use nalgebra::{DMatrixViewMut, Matrix2, Matrix2x3};
use numeric_literals::replace_float_literals;
use serde::{Deserialize, Serialize};

/// The bilinear form `a(u, v) = ∫ c ∇u · ∇v dx` with a constant coefficient `c`.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct LaplaceEvaluator<T> {
    coefficient: T,
}

impl<T: Real> Default for LaplaceEvaluator<T> {
    fn default() -> Self {
        Self::new(T::one())
    }
}

impl<T: Real> LaplaceEvaluator<T> {
    pub fn new(coefficient: T) -> Self {
        Self { coefficient }
    }

    pub fn coefficient(&self) -> T {
        self.coefficient
    }
}

impl<T: Real> ElementMatrixEvaluator<T, LinearLagrangeElement, Segment1d<T>> for LaplaceEvaluator<T> {
    fn evaluate_element_matrix(
        &self,
        element: &LinearLagrangeElement,
        segment: &Segment1d<T>,
        mut output: DMatrixViewMut<T>,
    ) -> eyre::Result<()> {
        check_node_count(element, 2)?;
        let [a, b] = segment.vertices();
        let length = (b.x - a.x).abs();
        ensure!(length > T::zero(), "segment has zero length");

        let k = self.coefficient / length;
        output[(0, 0)] += k;
        output[(0, 1)] -= k;
        output[(1, 0)] -= k;
        output[(1, 1)] += k;
        Ok(())
    }
}

impl<T: Real> ElementMatrixEvaluator<T, LinearLagrangeElement, Triangle2d<T>> for LaplaceEvaluator<T> {
    #[replace_float_literals(T::from_f64(literal).expect("Literal must fit in T"))]
    fn evaluate_element_matrix(
        &self,
        element: &LinearLagrangeElement,
        triangle: &Triangle2d<T>,
        mut output: DMatrixViewMut<T>,
    ) -> eyre::Result<()> {
        check_node_count(element, 3)?;
        let [a, b, c] = triangle.vertices();
        let jacobian = Matrix2::from_columns(&[b - a, c - a]);
        let det = jacobian.determinant();
        ensure!(det != T::zero(), "triangle is degenerate");
        let jacobian_inv_t = jacobian
            .try_inverse()
            .ok_or_else(|| eyre::eyre!("triangle is degenerate"))?
            .transpose();

        // Gradients of the barycentric coordinates on the reference triangle, mapped to the
        // physical triangle. Column i is the gradient of the basis function of vertex i
        #[rustfmt::skip]
        let reference_gradients = Matrix2x3::new(
            -1.0, 1.0, 0.0,
            -1.0, 0.0, 1.0,
        );
        let gradients = jacobian_inv_t * reference_gradients;
        let area = det.abs() / 2.0;
        let local = gradients.transpose() * gradients * (self.coefficient * area);
        for i in 0..3 {
            for j in 0..3 {
                output[(i, j)] += local[(i, j)];
            }
        }
        Ok(())
    }
}
