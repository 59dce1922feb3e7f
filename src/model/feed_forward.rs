//! Position-wise feed-forward network
//!
//! Two-layer nonlinear transform applied independently at every time
//! position: expansion to `d_ff`, GELU, contraction back to `d_model`,
//! residual and layer norm. No cross-position interaction happens here;
//! that is the attention sublayer's job.

use crate::model::linear::Linear;
use crate::model::norm::LayerNorm;
use ndarray::Array3;
use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};

/// Position-wise feed-forward sublayer with residual + layer norm
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PositionwiseFeedForward {
    expand: Linear,
    contract: Linear,
    norm: LayerNorm,
}

impl PositionwiseFeedForward {
    pub fn new(d_model: usize, d_ff: usize, rng: &mut StdRng) -> Self {
        Self {
            expand: Linear::new(d_model, d_ff, rng),
            contract: Linear::new(d_ff, d_model, rng),
            norm: LayerNorm::new(d_model),
        }
    }

    /// Transform [batch, time, d_model] -> [batch, time, d_model]
    pub fn forward(&self, x: &Array3<f64>) -> Array3<f64> {
        let hidden = self.expand.forward(x).mapv(gelu);
        let out = self.contract.forward(&hidden);
        self.norm.forward(&(out + x))
    }
}

/// GELU activation, tanh approximation:
/// `0.5 * x * (1 + tanh(sqrt(2/pi) * (x + 0.044715 * x^3)))`
pub fn gelu(x: f64) -> f64 {
    let sqrt_2_over_pi = (2.0 / std::f64::consts::PI).sqrt();
    0.5 * x * (1.0 + (sqrt_2_over_pi * (x + 0.044715 * x.powi(3))).tanh())
}
