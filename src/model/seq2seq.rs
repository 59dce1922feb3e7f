//! Top-level seq2seq forecasting model
//!
//! Wires encoder, decoder and the output projection into the one entry
//! point the rest of the pipeline calls: history and decoder context in,
//! forecast out. Pure feed-forward given fixed parameters; no state
//! persists between calls beyond the weights themselves.

use crate::error::Result;
use crate::model::config::{Mode, ModelConfig};
use crate::model::decoder::{Decoder, DecoderAttention};
use crate::model::encoder::Encoder;
use crate::model::linear::Linear;
use ndarray::{Array3, Array4};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

/// Attention weights from a full forward pass, for diagnostics
#[derive(Debug, Clone)]
pub struct ForecastAttention {
    /// Encoder self-attention, one [batch, n_heads, enc_time, enc_time]
    /// tensor per layer
    pub encoder_self: Vec<Array4<f64>>,
    /// Decoder self- and cross-attention per layer
    pub decoder: DecoderAttention,
}

/// Seq2seq transformer forecaster.
///
/// # Example
///
/// ```
/// use attn_forecaster::{Mode, ModelConfig, Seq2SeqTransformer};
/// use ndarray::Array3;
///
/// let config = ModelConfig {
///     src_input_size: 3,
///     tgt_input_size: 1,
///     d_model: 8,
///     d_ff: 16,
///     d_k: 2,
///     d_v: 2,
///     n_heads: 4,
///     n_layers: 1,
///     ..Default::default()
/// };
/// let model = Seq2SeqTransformer::new(config).unwrap();
///
/// let history = Array3::zeros((2, 5, 3));
/// let context = Array3::zeros((2, 4, 1));
/// let forecast = model.forecast(&history, &context, Mode::Inference).unwrap();
/// assert_eq!(forecast.dim(), (2, 4, 1));
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Seq2SeqTransformer {
    config: ModelConfig,
    encoder: Encoder,
    decoder: Decoder,
    /// Output head [d_model, tgt_input_size], bias-free
    projection: Linear,
}

impl Seq2SeqTransformer {
    /// Build a model from a validated configuration.
    ///
    /// All parameter tensors are allocated here, deterministically from
    /// `config.seed`; no IO happens.
    pub fn new(config: ModelConfig) -> Result<Self> {
        config.validate()?;
        let mut rng = StdRng::seed_from_u64(config.seed);

        let encoder = Encoder::new(&config, &mut rng);
        let decoder = Decoder::new(&config, &mut rng);
        let projection = Linear::without_bias(config.d_model, config.tgt_input_size, &mut rng);

        Ok(Self {
            config,
            encoder,
            decoder,
            projection,
        })
    }

    /// Model configuration
    pub fn config(&self) -> &ModelConfig {
        &self.config
    }

    /// Produce a forecast.
    ///
    /// # Arguments
    /// * `encoder_input` - History window [batch, enc_time, src_input_size]
    /// * `decoder_input` - Decoder context [batch, dec_time, tgt_input_size]
    ///
    /// # Returns
    /// Forecast [batch, dec_time, tgt_input_size]
    pub fn forecast(
        &self,
        encoder_input: &Array3<f64>,
        decoder_input: &Array3<f64>,
        mode: Mode,
    ) -> Result<Array3<f64>> {
        let (forecast, _) = self.forecast_with_attention(encoder_input, decoder_input, mode)?;
        Ok(forecast)
    }

    /// Produce a forecast along with every attention-weight tensor
    pub fn forecast_with_attention(
        &self,
        encoder_input: &Array3<f64>,
        decoder_input: &Array3<f64>,
        mode: Mode,
    ) -> Result<(Array3<f64>, ForecastAttention)> {
        let (encoder_output, encoder_self) = self.encoder.forward(encoder_input, mode)?;
        let (decoder_output, decoder_attn) =
            self.decoder.forward(decoder_input, &encoder_output, mode)?;
        let forecast = self.projection.forward(&decoder_output);

        Ok((
            forecast,
            ForecastAttention {
                encoder_self,
                decoder: decoder_attn,
            },
        ))
    }

    /// Save all parameters to `<dir>/<run_name>.json`
    pub fn save(&self, dir: impl AsRef<Path>, run_name: &str) -> Result<()> {
        let dir = dir.as_ref();
        std::fs::create_dir_all(dir)?;
        let file = File::create(dir.join(format!("{run_name}.json")))?;
        serde_json::to_writer(BufWriter::new(file), self)?;
        Ok(())
    }

    /// Load a model previously written by [`Seq2SeqTransformer::save`]
    pub fn load(dir: impl AsRef<Path>, run_name: &str) -> Result<Self> {
        let file = File::open(dir.as_ref().join(format!("{run_name}.json")))?;
        let model = serde_json::from_reader(BufReader::new(file))?;
        Ok(model)
    }
}
