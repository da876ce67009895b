use crate::mesh::{Segment1d, Triangle2d};
use crate::operators::check_node_count;
use crate::space::{ElementVectorEvaluator, LinearLagrangeElement};
use crate::Real;
use eyre::ensure;
use nalgebra::{DVectorViewMut, Matrix2};
use numeric_literals::replace_float_literals;
use serde::{Deserialize, Serialize};

/// The linear form `l(v) = ∫ f v dx` with a constant source `f`.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceEvaluator<T> {
    value: T,
}

impl<T: Real> Default for SourceEvaluator<T> {
    fn default() -> Self {
        Self::new(T::one())
    }
}

impl<T: Real> SourceEvaluator<T> {
    pub fn new(value: T) -> Self {
        Self { value }
    }

    pub fn zero() -> Self {
        Self::new(T::zero())
    }

    pub fn value(&self) -> T {
        self.value
    }
}

impl<T: Real> ElementVectorEvaluator<T, LinearLagrangeElement, Segment1d<T>> for SourceEvaluator<T> {
    #[replace_float_literals(T::from_f64(literal).expect("Literal must fit in T"))]
    fn evaluate_element_vector(
        &self,
        element: &LinearLagrangeElement,
        segment: &Segment1d<T>,
        mut output: DVectorViewMut<T>,
    ) -> eyre::Result<()> {
        check_node_count(element, 2)?;
        let [a, b] = segment.vertices();
        let length = (b.x - a.x).abs();
        ensure!(length > T::zero(), "segment has zero length");

        let contribution = self.value * length / 2.0;
        output[0] += contribution;
        output[1] += contribution;
        Ok(())
    }
}

impl<T: Real> ElementVectorEvaluator<T, LinearLagrangeElement, Triangle2d<T>> for SourceEvaluator<T> {
    #[replace_float_literals(T::from_f64(literal).expect("Literal must fit in T"))]
    fn evaluate_element_vector(
        &self,
        element: &LinearLagrangeElement,
        triangle: &Triangle2d<T>,
        mut output: DVectorViewMut<T>,
    ) -> eyre::Result<()> {
        check_node_count(element, 3)?;
        let [a, b, c] = triangle.vertices();
        let det = Matrix2::from_columns(&[b - a, c - a]).determinant();
        ensure!(det != T::zero(), "triangle is degenerate");

        // Every barycentric coordinate integrates to a third of the area
        let contribution = self.value * det.abs() / 6.0;
        for i in 0..3 {
            output[i] += contribution;
        }
        Ok(())
    }
}
