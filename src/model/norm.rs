//! Layer normalization over the feature axis

use ndarray::{Array1, Array3, Axis};
use serde::{Deserialize, Serialize};

const NORM_EPS: f64 = 1e-6;

/// Per-sample, per-position normalization of feature channels to zero
/// mean and unit variance, followed by a learned affine transform.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LayerNorm {
    /// Learned scale [d_model]
    gamma: Array1<f64>,
    /// Learned shift [d_model]
    beta: Array1<f64>,
}

impl LayerNorm {
    /// Create a new layer with identity affine parameters
    pub fn new(d_model: usize) -> Self {
        Self {
            gamma: Array1::ones(d_model),
            beta: Array1::zeros(d_model),
        }
    }

    /// Normalize [batch, time, d_model] along the feature axis
    pub fn forward(&self, x: &Array3<f64>) -> Array3<f64> {
        let (batch_size, seq_len, d_model) = x.dim();
        let mut out = Array3::zeros(x.dim());

        for b in 0..batch_size {
            for t in 0..seq_len {
                let row = x.index_axis(Axis(0), b);
                let row = row.index_axis(Axis(0), t);

                let mean = row.mean().unwrap_or(0.0);
                let var = row.mapv(|v| (v - mean).powi(2)).mean().unwrap_or(0.0);
                let std = (var + NORM_EPS).sqrt();

                for d in 0..d_model {
                    out[[b, t, d]] = self.gamma[d] * (row[d] - mean) / std + self.beta[d];
                }
            }
        }

        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_output_is_standardized() {
        let norm = LayerNorm::new(8);
        let x = Array3::from_shape_fn((2, 3, 8), |(b, t, d)| (b + t * 2 + d * 3) as f64 * 0.7);

        let out = norm.forward(&x);
        for b in 0..2 {
            for t in 0..3 {
                let row = out.index_axis(Axis(0), b);
                let row = row.index_axis(Axis(0), t);
                let mean = row.mean().unwrap();
                let var = row.mapv(|v| (v - mean).powi(2)).mean().unwrap();
                assert_abs_diff_eq!(mean, 0.0, epsilon = 1e-9);
                assert_abs_diff_eq!(var, 1.0, epsilon = 1e-3);
            }
        }
    }

    #[test]
    fn test_constant_row_stays_finite() {
        let norm = LayerNorm::new(4);
        let x = Array3::from_elem((1, 1, 4), 3.5);

        let out = norm.forward(&x);
        for v in out.iter() {
            assert!(v.is_finite());
        }
    }

    #[test]
    fn test_shape_preserved() {
        let norm = LayerNorm::new(16);
        let x = Array3::zeros((3, 7, 16));
        assert_eq!(norm.forward(&x).dim(), (3, 7, 16));
    }
}
