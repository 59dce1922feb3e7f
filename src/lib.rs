//! Seq2seq Transformer Forecaster
//!
//! A sequence-to-sequence forecasting model for multivariate time series,
//! built from scratch on `ndarray`: sinusoidal positional encoding, scaled
//! dot-product attention, multi-head attention, position-wise feed-forward
//! layers and an encoder-decoder stack with causal masking.
//!
//! The model is a pure feed-forward function of its inputs: all parameters
//! are allocated deterministically at construction, mutated only by an
//! external optimizer, and read-only during a forward pass.
//!
//! # Example
//!
//! ```
//! use attn_forecaster::{Mode, ModelConfig, Seq2SeqTransformer};
//! use ndarray::Array3;
//!
//! let config = ModelConfig::small();
//! let model = Seq2SeqTransformer::new(config).unwrap();
//!
//! // 2 samples: 24 steps of history, 8 steps of decoder context
//! let history = Array3::from_elem((2, 24, 8), 0.1);
//! let context = Array3::from_elem((2, 8, 1), 0.1);
//!
//! let forecast = model.forecast(&history, &context, Mode::Inference).unwrap();
//! assert_eq!(forecast.dim(), (2, 8, 1));
//! ```

pub mod data;
pub mod error;
pub mod metrics;
pub mod model;

pub use error::{ModelError, Result};
pub use metrics::ForecastMetrics;
pub use model::{
    Decoder, DecoderAttention, Encoder, ForecastAttention, LayerNorm, Linear, Mode, ModelConfig,
    MultiHeadAttention, PositionalEncoding, PositionwiseFeedForward, ScaledDotProductAttention,
    Seq2SeqTransformer,
};
