//! Seq2seq transformer model components

pub mod attention;
pub mod config;
pub mod decoder;
pub mod encoder;
pub mod feed_forward;
pub mod linear;
pub mod mask;
pub mod norm;
pub mod positional;
pub mod seq2seq;

pub use attention::{MultiHeadAttention, ScaledDotProductAttention};
pub use config::{Mode, ModelConfig};
pub use decoder::{Decoder, DecoderAttention, DecoderLayer};
pub use encoder::{Encoder, EncoderLayer};
pub use feed_forward::PositionwiseFeedForward;
pub use linear::Linear;
pub use mask::{causal_mask, combine_masks, padding_mask};
pub use norm::LayerNorm;
pub use positional::PositionalEncoding;
pub use seq2seq::{ForecastAttention, Seq2SeqTransformer};
