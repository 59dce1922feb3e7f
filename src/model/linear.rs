//! Dense linear projection layer
//!
//! The only learnable building block of the model: every Q/K/V projection,
//! head merge, embedding and output head is one of these.

use ndarray::{Array1, Array2, Array3, Axis};
use ndarray_rand::RandomExt;
use rand::rngs::StdRng;
use rand_distr::Normal;
use serde::{Deserialize, Serialize};

/// A dense projection `y = x W + b` applied to the trailing feature axis
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Linear {
    /// Weight matrix [in_features, out_features]
    weight: Array2<f64>,
    /// Optional bias [out_features]
    bias: Option<Array1<f64>>,
}

impl Linear {
    /// Create a new layer with Xavier/Glorot-initialized weights
    pub fn new(in_features: usize, out_features: usize, rng: &mut StdRng) -> Self {
        Self::init(in_features, out_features, true, rng)
    }

    /// Create a new layer without a bias term
    pub fn without_bias(in_features: usize, out_features: usize, rng: &mut StdRng) -> Self {
        Self::init(in_features, out_features, false, rng)
    }

    fn init(in_features: usize, out_features: usize, bias: bool, rng: &mut StdRng) -> Self {
        let std = (2.0 / (in_features + out_features) as f64).sqrt();
        // std > 0 for all valid layer widths
        let dist = Normal::new(0.0, std).unwrap();
        let weight = Array2::random_using((in_features, out_features), dist, rng);

        Self {
            weight,
            bias: bias.then(|| Array1::zeros(out_features)),
        }
    }

    /// Input feature width
    pub fn in_features(&self) -> usize {
        self.weight.nrows()
    }

    /// Output feature width
    pub fn out_features(&self) -> usize {
        self.weight.ncols()
    }

    /// Project a 2D input [rows, in_features] -> [rows, out_features]
    pub fn forward_2d(&self, x: &Array2<f64>) -> Array2<f64> {
        let mut out = x.dot(&self.weight);
        if let Some(ref b) = self.bias {
            out += b;
        }
        out
    }

    /// Project a sequence tensor [batch, time, in_features] -> [batch, time, out_features]
    pub fn forward(&self, x: &Array3<f64>) -> Array3<f64> {
        let (batch_size, seq_len, _) = x.dim();
        let mut out = Array3::zeros((batch_size, seq_len, self.out_features()));

        for b in 0..batch_size {
            let projected = self.forward_2d(&x.index_axis(Axis(0), b).to_owned());
            out.index_axis_mut(Axis(0), b).assign(&projected);
        }

        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use rand::SeedableRng;

    #[test]
    fn test_forward_shape() {
        let mut rng = StdRng::seed_from_u64(0);
        let layer = Linear::new(6, 10, &mut rng);

        let x = Array3::zeros((2, 5, 6));
        assert_eq!(layer.forward(&x).dim(), (2, 5, 10));
    }

    #[test]
    fn test_zero_input_hits_bias() {
        let mut rng = StdRng::seed_from_u64(0);
        let layer = Linear::new(4, 3, &mut rng);

        let out = layer.forward_2d(&Array2::zeros((2, 4)));
        for v in out.iter() {
            assert_abs_diff_eq!(*v, 0.0, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_without_bias_has_none() {
        let mut rng = StdRng::seed_from_u64(0);
        let layer = Linear::without_bias(4, 3, &mut rng);
        assert_eq!(layer.in_features(), 4);
        assert_eq!(layer.out_features(), 3);

        // Pure matmul: zero input -> zero output
        let out = layer.forward_2d(&Array2::zeros((1, 4)));
        assert_abs_diff_eq!(out.sum(), 0.0, epsilon = 1e-12);
    }

    #[test]
    fn test_deterministic_init() {
        let mut rng_a = StdRng::seed_from_u64(7);
        let mut rng_b = StdRng::seed_from_u64(7);
        let a = Linear::new(8, 8, &mut rng_a);
        let b = Linear::new(8, 8, &mut rng_b);
        assert_eq!(a.weight, b.weight);
    }
}
