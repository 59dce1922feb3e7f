//! Decoder stack
//!
//! Causally-masked self-attention over the decoder context, cross-attention
//! against the encoder output, then feed-forward. The causal mask keeps the
//! forecaster autoregressive: position `i` never sees positions after `i`.

use crate::error::{ModelError, Result};
use crate::model::attention::MultiHeadAttention;
use crate::model::config::{Mode, ModelConfig};
use crate::model::feed_forward::PositionwiseFeedForward;
use crate::model::linear::Linear;
use crate::model::mask::{causal_mask, combine_masks, padding_mask};
use crate::model::positional::PositionalEncoding;
use ndarray::{Array3, Array4};
use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};

/// One decoder block: masked self-attention, cross-attention, feed-forward
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecoderLayer {
    self_attn: MultiHeadAttention,
    cross_attn: MultiHeadAttention,
    feed_forward: PositionwiseFeedForward,
}

impl DecoderLayer {
    pub fn new(config: &ModelConfig, rng: &mut StdRng) -> Self {
        let attn = |rng: &mut StdRng| {
            MultiHeadAttention::new(config.d_model, config.d_k, config.d_v, config.n_heads, rng)
        };
        Self {
            self_attn: attn(rng),
            cross_attn: attn(rng),
            feed_forward: PositionwiseFeedForward::new(config.d_model, config.d_ff, rng),
        }
    }

    /// Forward one block.
    ///
    /// # Arguments
    /// * `x` - Decoder hidden state [batch, dec_time, d_model]
    /// * `encoder_output` - Encoder representation used as the
    ///   cross-attention key/value source [batch, enc_time, d_model]
    /// * `self_mask` - Forbidden positions for self-attention
    ///
    /// # Returns
    /// Block output plus self- and cross-attention weights.
    pub fn forward(
        &self,
        x: &Array3<f64>,
        encoder_output: &Array3<f64>,
        self_mask: &Array3<bool>,
    ) -> Result<(Array3<f64>, Array4<f64>, Array4<f64>)> {
        let (hidden, self_weights) = self.self_attn.forward(x, x, x, Some(self_mask))?;
        // Full access to the encoder context, no mask
        let (hidden, cross_weights) =
            self.cross_attn
                .forward(&hidden, encoder_output, encoder_output, None)?;
        Ok((self.feed_forward.forward(&hidden), self_weights, cross_weights))
    }
}

/// Attention weights collected from one decoder pass
#[derive(Debug, Clone)]
pub struct DecoderAttention {
    /// Per-layer self-attention weights [batch, n_heads, dec_time, dec_time]
    pub self_attn: Vec<Array4<f64>>,
    /// Per-layer cross-attention weights [batch, n_heads, dec_time, enc_time]
    pub cross_attn: Vec<Array4<f64>>,
}

/// Decoder: embedding + positional encoding + stacked masked layers
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Decoder {
    embedding: Linear,
    positional: PositionalEncoding,
    layers: Vec<DecoderLayer>,
    input_size: usize,
    pad_value: Option<f64>,
}

impl Decoder {
    pub fn new(config: &ModelConfig, rng: &mut StdRng) -> Self {
        let layers = (0..config.n_layers)
            .map(|_| DecoderLayer::new(config, rng))
            .collect();

        Self {
            embedding: Linear::new(config.tgt_input_size, config.d_model, rng),
            positional: PositionalEncoding::new(config.d_model, config.max_seq_len, config.dropout),
            layers,
            input_size: config.tgt_input_size,
            pad_value: config.pad_value,
        }
    }

    /// Decode [batch, dec_time, tgt_input_size] conditioned on the encoder
    /// output.
    ///
    /// The self-attention mask is causal; when a pad value is configured it
    /// additionally forbids attending to all-pad key positions.
    pub fn forward(
        &self,
        x: &Array3<f64>,
        encoder_output: &Array3<f64>,
        mode: Mode,
    ) -> Result<(Array3<f64>, DecoderAttention)> {
        let (batch_size, seq_len, n_features) = x.dim();
        if n_features != self.input_size {
            return Err(ModelError::shape(format!(
                "decoder expects {} input features, got {}",
                self.input_size, n_features
            )));
        }

        let embedded = self.embedding.forward(x);
        let mut hidden = self.positional.forward(&embedded, mode)?;

        let mut self_mask = causal_mask(batch_size, seq_len);
        if let Some(pad_value) = self.pad_value {
            let pad = padding_mask(x, seq_len, pad_value);
            self_mask = combine_masks(&self_mask, &pad);
        }

        let mut attention = DecoderAttention {
            self_attn: Vec::with_capacity(self.layers.len()),
            cross_attn: Vec::with_capacity(self.layers.len()),
        };

        for layer in &self.layers {
            let (out, self_w, cross_w) = layer.forward(&hidden, encoder_output, &self_mask)?;
            hidden = out;
            attention.self_attn.push(self_w);
            attention.cross_attn.push(cross_w);
        }

        Ok((hidden, attention))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    fn config() -> ModelConfig {
        ModelConfig {
            src_input_size: 3,
            tgt_input_size: 1,
            d_model: 8,
            d_ff: 16,
            d_k: 2,
            d_v: 2,
            n_heads: 4,
            n_layers: 1,
            max_seq_len: 32,
            ..Default::default()
        }
    }

    fn encoder_output(batch: usize, len: usize) -> Array3<f64> {
        Array3::from_shape_fn((batch, len, 8), |(b, t, d)| ((b + t * 2 + d) as f64).cos())
    }

    #[test]
    fn test_decoder_output_shape() {
        let mut rng = StdRng::seed_from_u64(0);
        let decoder = Decoder::new(&config(), &mut rng);

        let x = Array3::from_shape_fn((2, 4, 1), |(b, t, _)| (b + t) as f64 * 0.5);
        let enc = encoder_output(2, 5);
        let (out, attn) = decoder.forward(&x, &enc, Mode::Inference).unwrap();

        assert_eq!(out.dim(), (2, 4, 8));
        assert_eq!(attn.self_attn.len(), 1);
        assert_eq!(attn.cross_attn.len(), 1);
        assert_eq!(attn.self_attn[0].dim(), (2, 4, 4, 4));
        assert_eq!(attn.cross_attn[0].dim(), (2, 4, 4, 5));
    }

    #[test]
    fn test_self_attention_is_causal() {
        let mut rng = StdRng::seed_from_u64(1);
        let decoder = Decoder::new(&config(), &mut rng);

        let x = Array3::from_shape_fn((1, 5, 1), |(_, t, _)| t as f64);
        let enc = encoder_output(1, 6);
        let (_, attn) = decoder.forward(&x, &enc, Mode::Inference).unwrap();

        let weights = &attn.self_attn[0];
        for h in 0..4 {
            for i in 0..5 {
                for j in (i + 1)..5 {
                    assert!(
                        weights[[0, h, i, j]] <= 1e-12,
                        "future position attended: head {} ({}, {})",
                        h,
                        i,
                        j
                    );
                }
            }
        }
    }

    #[test]
    fn test_padding_positions_excluded_when_configured() {
        let cfg = ModelConfig {
            pad_value: Some(0.0),
            ..config()
        };
        let mut rng = StdRng::seed_from_u64(2);
        let decoder = Decoder::new(&cfg, &mut rng);

        // Position 1 is all-pad
        let mut x = Array3::from_elem((1, 4, 1), 1.0);
        x[[0, 1, 0]] = 0.0;

        let enc = encoder_output(1, 4);
        let (_, attn) = decoder.forward(&x, &enc, Mode::Inference).unwrap();

        let weights = &attn.self_attn[0];
        for h in 0..4 {
            for q in 2..4 {
                assert!(weights[[0, h, q, 1]] <= 1e-12);
            }
        }
    }

    #[test]
    fn test_decoder_rejects_wrong_feature_width() {
        let mut rng = StdRng::seed_from_u64(3);
        let decoder = Decoder::new(&config(), &mut rng);

        let x = Array3::zeros((1, 4, 2));
        let enc = encoder_output(1, 5);
        assert!(decoder.forward(&x, &enc, Mode::Inference).is_err());
    }
}
