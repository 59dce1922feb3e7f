//! Sinusoidal positional encoding
//!
//! Attention is order-agnostic, so sequence order is injected additively:
//! even channels carry sine, odd channels cosine, with frequencies decaying
//! geometrically across channels ("Attention is All You Need" encoding).

use crate::error::{ModelError, Result};
use crate::model::config::Mode;
use ndarray::{s, Array2, Array3};
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Base of the geometric frequency progression
const FREQ_BASE: f64 = 10000.0;

/// Additive sinusoidal positional encoding with a precomputed table.
///
/// The table is computed once for `max_len` positions and never mutated;
/// each call slices the prefix matching the input's time length.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PositionalEncoding {
    d_model: usize,
    max_len: usize,
    dropout: f64,
    /// Precomputed encoding table [max_len, d_model]
    table: Array2<f64>,
}

impl PositionalEncoding {
    /// Precompute the encoding table for up to `max_len` positions
    pub fn new(d_model: usize, max_len: usize, dropout: f64) -> Self {
        let mut table = Array2::zeros((max_len, d_model));

        for pos in 0..max_len {
            for i in 0..(d_model + 1) / 2 {
                let angle = pos as f64
                    / FREQ_BASE.powf(2.0 * i as f64 / d_model as f64);
                table[[pos, 2 * i]] = angle.sin();
                if 2 * i + 1 < d_model {
                    table[[pos, 2 * i + 1]] = angle.cos();
                }
            }
        }

        Self {
            d_model,
            max_len,
            dropout,
            table,
        }
    }

    /// Maximum supported sequence length
    pub fn max_len(&self) -> usize {
        self.max_len
    }

    /// Add positional signal to `x` of shape [batch, time, d_model].
    ///
    /// In [`Mode::Train`] the result is additionally passed through inverted
    /// dropout; in [`Mode::Inference`] the output is deterministic.
    ///
    /// Fails with a shape error when the time axis exceeds the
    /// precomputed maximum or the feature axis is not `d_model` wide.
    pub fn forward(&self, x: &Array3<f64>, mode: Mode) -> Result<Array3<f64>> {
        let (_, seq_len, d_model) = x.dim();

        if d_model != self.d_model {
            return Err(ModelError::shape(format!(
                "positional encoding expects d_model {}, got {}",
                self.d_model, d_model
            )));
        }

        if seq_len > self.max_len {
            return Err(ModelError::shape(format!(
                "sequence length {} exceeds precomputed maximum {}",
                seq_len, self.max_len
            )));
        }

        let prefix = self.table.slice(s![..seq_len, ..]);
        let mut out = x + &prefix;

        if mode == Mode::Train && self.dropout > 0.0 {
            let keep = 1.0 - self.dropout;
            let mut rng = rand::thread_rng();
            out.mapv_inplace(|v| {
                if rng.gen::<f64>() < keep {
                    v / keep
                } else {
                    0.0
                }
            });
        }

        Ok(out)
    }
}
