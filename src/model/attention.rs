//! Scaled dot-product and multi-head attention
//!
//! The attention primitives the whole model is built from. Scaled
//! dot-product attention computes the weighted value aggregation for one
//! head; multi-head attention projects into parallel subspaces, delegates
//! per head, merges, and applies the residual + layer norm.

use crate::error::{ModelError, Result};
use crate::model::linear::Linear;
use crate::model::norm::LayerNorm;
use ndarray::{s, Array2, Array3, Array4, Axis};
use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Score assigned to forbidden positions before normalization
const MASK_FILL: f64 = -1e9;

/// Scaled dot-product attention for a single head.
///
/// No learnable parameters; the per-head projections live in
/// [`MultiHeadAttention`].
#[derive(Debug, Clone, Copy)]
pub struct ScaledDotProductAttention {
    /// Query/key width, used for the 1/sqrt(d_k) score scaling
    pub d_k: usize,
}

impl ScaledDotProductAttention {
    pub fn new(d_k: usize) -> Self {
        Self { d_k }
    }

    /// Compute attention for one head.
    ///
    /// # Arguments
    /// * `q` - Queries [len_q, d_k]
    /// * `k` - Keys [len_k, d_k]
    /// * `v` - Values [len_k, d_v]
    /// * `mask` - Optional forbidden positions [len_q, len_k]
    ///
    /// # Returns
    /// Context [len_q, d_v] and attention weights [len_q, len_k]; each
    /// weight row is a probability distribution over the key axis.
    pub fn forward(
        &self,
        q: &Array2<f64>,
        k: &Array2<f64>,
        v: &Array2<f64>,
        mask: Option<&Array2<bool>>,
    ) -> (Array2<f64>, Array2<f64>) {
        // Scaling by 1/sqrt(d_k) keeps the softmax out of saturation for
        // large head widths
        let scale = (self.d_k as f64).sqrt();
        let mut scores = q.dot(&k.t()) / scale;

        if let Some(mask) = mask {
            for ((i, j), s) in scores.indexed_iter_mut() {
                if mask[[i, j]] {
                    *s = MASK_FILL;
                }
            }
        }

        let weights = masked_softmax(&scores, mask);
        let context = weights.dot(v);
        (context, weights)
    }
}

/// Row-wise stable softmax over the key axis.
///
/// A fully-masked row has no valid key to attend to; it degenerates to a
/// uniform distribution (with a warning) rather than propagating NaN.
fn masked_softmax(scores: &Array2<f64>, mask: Option<&Array2<bool>>) -> Array2<f64> {
    let (len_q, len_k) = scores.dim();
    let mut weights = Array2::zeros((len_q, len_k));

    for i in 0..len_q {
        let all_masked = mask.map_or(false, |m| (0..len_k).all(|j| m[[i, j]]));
        if all_masked {
            warn!(query = i, "attention row fully masked, falling back to uniform weights");
            weights.row_mut(i).fill(1.0 / len_k as f64);
            continue;
        }

        let row = scores.row(i);
        let max = row.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
        let exp: Vec<f64> = row.iter().map(|&s| (s - max).exp()).collect();
        let sum: f64 = exp.iter().sum();

        for j in 0..len_k {
            weights[[i, j]] = exp[j] / sum;
        }
    }

    weights
}

/// Multi-head attention with residual connection and layer normalization.
///
/// Projects queries, keys and values into `n_heads` parallel subspaces of
/// width `d_k` (`d_v` for values), runs scaled dot-product attention per
/// head, concatenates head outputs, merges back to `d_model`, adds the
/// pre-projection query input as a residual and layer-normalizes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MultiHeadAttention {
    w_q: Linear,
    w_k: Linear,
    w_v: Linear,
    /// Merge projection [n_heads * d_v, d_model]
    w_out: Linear,
    norm: LayerNorm,
    d_model: usize,
    d_k: usize,
    d_v: usize,
    n_heads: usize,
}

impl MultiHeadAttention {
    /// Create a new multi-head attention layer.
    ///
    /// `n_heads * d_k` and `n_heads * d_v` need not equal `d_model`; the
    /// merge projection restores the model width.
    pub fn new(d_model: usize, d_k: usize, d_v: usize, n_heads: usize, rng: &mut StdRng) -> Self {
        Self {
            w_q: Linear::new(d_model, n_heads * d_k, rng),
            w_k: Linear::new(d_model, n_heads * d_k, rng),
            w_v: Linear::new(d_model, n_heads * d_v, rng),
            w_out: Linear::new(n_heads * d_v, d_model, rng),
            norm: LayerNorm::new(d_model),
            d_model,
            d_k,
            d_v,
            n_heads,
        }
    }

    /// Forward pass.
    ///
    /// # Arguments
    /// * `q`, `k`, `v` - Sequence tensors [batch, time, d_model]; key and
    ///   value must share their time axis
    /// * `mask` - Optional forbidden positions [batch, len_q, len_k],
    ///   broadcast across heads
    ///
    /// # Returns
    /// Normalized output [batch, len_q, d_model] and per-head attention
    /// weights [batch, n_heads, len_q, len_k] for external inspection.
    pub fn forward(
        &self,
        q: &Array3<f64>,
        k: &Array3<f64>,
        v: &Array3<f64>,
        mask: Option<&Array3<bool>>,
    ) -> Result<(Array3<f64>, Array4<f64>)> {
        let (batch_size, len_q, dq) = q.dim();
        let (_, len_k, dk) = k.dim();
        let (_, len_v, dv) = v.dim();

        if dq != self.d_model || dk != self.d_model || dv != self.d_model {
            return Err(ModelError::shape(format!(
                "attention inputs must have feature width {}, got q={} k={} v={}",
                self.d_model, dq, dk, dv
            )));
        }

        if len_k != len_v {
            return Err(ModelError::shape(format!(
                "key length {} does not match value length {}",
                len_k, len_v
            )));
        }

        if let Some(m) = mask {
            if m.dim() != (batch_size, len_q, len_k) {
                return Err(ModelError::shape(format!(
                    "mask shape {:?} does not broadcast to ({}, {}, {})",
                    m.dim(),
                    batch_size,
                    len_q,
                    len_k
                )));
            }
        }

        // Project into concatenated head subspaces
        let q_s = self.w_q.forward(q); // [batch, len_q, n_heads * d_k]
        let k_s = self.w_k.forward(k); // [batch, len_k, n_heads * d_k]
        let v_s = self.w_v.forward(v); // [batch, len_k, n_heads * d_v]

        let head = ScaledDotProductAttention::new(self.d_k);
        let mut contexts = Array3::zeros((batch_size, len_q, self.n_heads * self.d_v));
        let mut weights = Array4::zeros((batch_size, self.n_heads, len_q, len_k));

        for b in 0..batch_size {
            let sample_mask = mask.map(|m| m.index_axis(Axis(0), b).to_owned());

            for h in 0..self.n_heads {
                let qk_cols = h * self.d_k..(h + 1) * self.d_k;
                let v_cols = h * self.d_v..(h + 1) * self.d_v;

                let q_h = q_s.slice(s![b, .., qk_cols.clone()]).to_owned();
                let k_h = k_s.slice(s![b, .., qk_cols]).to_owned();
                let v_h = v_s.slice(s![b, .., v_cols.clone()]).to_owned();

                let (context, attn) = head.forward(&q_h, &k_h, &v_h, sample_mask.as_ref());

                contexts.slice_mut(s![b, .., v_cols]).assign(&context);
                weights.slice_mut(s![b, h, .., ..]).assign(&attn);
            }
        }

        // Merge heads, add the pre-projection input, normalize
        let merged = self.w_out.forward(&contexts);
        let output = self.norm.forward(&(merged + q));
        Ok((output, weights))
    }
}
