//! Model configuration
//!
//! All architecture hyperparameters for the seq2seq transformer.

use crate::error::{ModelError, Result};
use serde::{Deserialize, Serialize};

/// Execution mode for a forward pass
///
/// Threaded explicitly through every call instead of living as hidden
/// mutable state on the layers. Dropout only draws in [`Mode::Train`],
/// so inference is fully deterministic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Mode {
    /// Training pass: stochastic dropout enabled
    Train,
    /// Inference pass: deterministic, no dropout
    Inference,
}

/// Configuration of the seq2seq transformer forecaster
///
/// # Example
///
/// ```
/// use attn_forecaster::ModelConfig;
///
/// let config = ModelConfig {
///     src_input_size: 8,
///     tgt_input_size: 1,
///     d_model: 32,
///     n_heads: 4,
///     ..Default::default()
/// };
///
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    // Input/Output
    /// Number of raw features per encoder time step
    pub src_input_size: usize,
    /// Number of raw features per decoder time step (also the forecast width)
    pub tgt_input_size: usize,

    // Architecture
    /// Width of every intermediate representation
    pub d_model: usize,
    /// Hidden width of the position-wise feed-forward layers
    pub d_ff: usize,
    /// Per-head query/key width
    pub d_k: usize,
    /// Per-head value width
    pub d_v: usize,
    /// Number of attention heads
    pub n_heads: usize,
    /// Number of layers in both the encoder and the decoder stack
    pub n_layers: usize,

    // Sequence handling
    /// Maximum sequence length supported by the positional table
    pub max_seq_len: usize,
    /// Dropout rate applied after positional encoding in `Mode::Train`
    pub dropout: f64,
    /// Optional pad value. When set, decoder self-attention masks out key
    /// positions whose feature vector is entirely equal to this value,
    /// in addition to the causal mask.
    pub pad_value: Option<f64>,

    /// Seed for parameter initialization; identical configs build
    /// identical models
    pub seed: u64,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            src_input_size: 8,
            tgt_input_size: 1,
            d_model: 32,
            d_ff: 64,
            d_k: 8,
            d_v: 8,
            n_heads: 4,
            n_layers: 1,
            max_seq_len: 1024,
            dropout: 0.0,
            pad_value: None,
            seed: 42,
        }
    }
}

impl ModelConfig {
    /// Create a new configuration with default parameters
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.src_input_size == 0 || self.tgt_input_size == 0 {
            return Err(ModelError::config("input sizes must be > 0"));
        }

        if self.d_model == 0 || self.d_ff == 0 {
            return Err(ModelError::config("d_model and d_ff must be > 0"));
        }

        if self.n_heads == 0 || self.d_k == 0 || self.d_v == 0 {
            return Err(ModelError::config("n_heads, d_k and d_v must be > 0"));
        }

        if self.n_layers == 0 {
            return Err(ModelError::config("n_layers must be > 0"));
        }

        if self.max_seq_len == 0 {
            return Err(ModelError::config("max_seq_len must be > 0"));
        }

        if !(0.0..1.0).contains(&self.dropout) {
            return Err(ModelError::config(format!(
                "dropout ({}) must be in [0, 1)",
                self.dropout
            )));
        }

        Ok(())
    }

    /// Total query/key projection width across heads
    pub fn qk_width(&self) -> usize {
        self.n_heads * self.d_k
    }

    /// Total value projection width across heads
    pub fn v_width(&self) -> usize {
        self.n_heads * self.d_v
    }

    /// Small configuration for experiments and tests
    pub fn small() -> Self {
        Self {
            d_model: 16,
            d_ff: 32,
            d_k: 4,
            d_v: 4,
            n_heads: 4,
            n_layers: 1,
            max_seq_len: 256,
            ..Default::default()
        }
    }

    /// Larger configuration for longer horizons
    pub fn large() -> Self {
        Self {
            d_model: 128,
            d_ff: 256,
            d_k: 16,
            d_v: 16,
            n_heads: 8,
            n_layers: 3,
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_valid() {
        assert!(ModelConfig::default().validate().is_ok());
    }

    #[test]
    fn test_small_and_large_valid() {
        assert!(ModelConfig::small().validate().is_ok());
        assert!(ModelConfig::large().validate().is_ok());
    }

    #[test]
    fn test_zero_heads_rejected() {
        let config = ModelConfig {
            n_heads: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_invalid_dropout_rejected() {
        let config = ModelConfig {
            dropout: 1.0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_projection_widths() {
        let config = ModelConfig {
            n_heads: 4,
            d_k: 8,
            d_v: 6,
            ..Default::default()
        };
        assert_eq!(config.qk_width(), 32);
        assert_eq!(config.v_width(), 24);
    }
}
