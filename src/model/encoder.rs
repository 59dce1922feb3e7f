//! Encoder stack
//!
//! Embeds raw input features to `d_model`, adds positional encoding and
//! applies `n_layers` encoder blocks. The encoder attends freely over the
//! full input window; no mask is used.

use crate::error::{ModelError, Result};
use crate::model::attention::MultiHeadAttention;
use crate::model::config::{Mode, ModelConfig};
use crate::model::feed_forward::PositionwiseFeedForward;
use crate::model::linear::Linear;
use crate::model::positional::PositionalEncoding;
use ndarray::{Array3, Array4};
use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};

/// One encoder block: self-attention followed by feed-forward
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EncoderLayer {
    self_attn: MultiHeadAttention,
    feed_forward: PositionwiseFeedForward,
}

impl EncoderLayer {
    pub fn new(config: &ModelConfig, rng: &mut StdRng) -> Self {
        Self {
            self_attn: MultiHeadAttention::new(
                config.d_model,
                config.d_k,
                config.d_v,
                config.n_heads,
                rng,
            ),
            feed_forward: PositionwiseFeedForward::new(config.d_model, config.d_ff, rng),
        }
    }

    /// Forward one block; returns the block output and its self-attention
    /// weights [batch, n_heads, time, time]
    pub fn forward(&self, x: &Array3<f64>) -> Result<(Array3<f64>, Array4<f64>)> {
        let (attended, weights) = self.self_attn.forward(x, x, x, None)?;
        Ok((self.feed_forward.forward(&attended), weights))
    }
}

/// Encoder: linear embedding + positional encoding + stacked layers.
///
/// Layers are created once at construction and applied strictly in
/// sequence; each layer consumes the previous layer's output.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Encoder {
    embedding: Linear,
    positional: PositionalEncoding,
    layers: Vec<EncoderLayer>,
    input_size: usize,
}

impl Encoder {
    pub fn new(config: &ModelConfig, rng: &mut StdRng) -> Self {
        let layers = (0..config.n_layers)
            .map(|_| EncoderLayer::new(config, rng))
            .collect();

        Self {
            embedding: Linear::new(config.src_input_size, config.d_model, rng),
            positional: PositionalEncoding::new(config.d_model, config.max_seq_len, config.dropout),
            layers,
            input_size: config.src_input_size,
        }
    }

    /// Encode raw input [batch, time, src_input_size].
    ///
    /// # Returns
    /// Contextual representation [batch, time, d_model] and one
    /// self-attention weight tensor per layer.
    pub fn forward(&self, x: &Array3<f64>, mode: Mode) -> Result<(Array3<f64>, Vec<Array4<f64>>)> {
        let (_, _, n_features) = x.dim();
        if n_features != self.input_size {
            return Err(ModelError::shape(format!(
                "encoder expects {} input features, got {}",
                self.input_size, n_features
            )));
        }

        let embedded = self.embedding.forward(x);
        let mut hidden = self.positional.forward(&embedded, mode)?;

        let mut attentions = Vec::with_capacity(self.layers.len());
        for layer in &self.layers {
            let (out, attn) = layer.forward(&hidden)?;
            hidden = out;
            attentions.push(attn);
        }

        Ok((hidden, attentions))
    }
}
