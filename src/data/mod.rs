//! Windowing and batching of pre-scaled tensors
//!
//! The model consumes already-scaled sliding windows; this module slices
//! them into encoder history and decoder context and regroups samples
//! into fixed-size batches. Scaling itself happens upstream.

use crate::error::{ModelError, Result};
use ndarray::{s, Array3};

/// One batch of aligned model inputs and targets
#[derive(Debug, Clone)]
pub struct Batch {
    /// Encoder history [batch_size, enc_time, src_features]
    pub encoder_input: Array3<f64>,
    /// Decoder context [batch_size, dec_time, tgt_features]
    pub decoder_input: Array3<f64>,
    /// Forecast targets [batch_size, dec_time, tgt_features]
    pub target: Array3<f64>,
}

/// Split a window tensor [n, window, features] into the encoder history
/// (everything before the last `dec_len` steps) and the decoder context
/// (the last `dec_len` steps).
pub fn split_window(
    windows: &Array3<f64>,
    dec_len: usize,
) -> Result<(Array3<f64>, Array3<f64>)> {
    let (_, window, _) = windows.dim();
    if dec_len == 0 || dec_len >= window {
        return Err(ModelError::shape(format!(
            "decoder length {} must be in 1..{} (window length)",
            dec_len, window
        )));
    }

    let split = window - dec_len;
    let encoder = windows.slice(s![.., ..split, ..]).to_owned();
    let decoder = windows.slice(s![.., split.., ..]).to_owned();
    Ok((encoder, decoder))
}

/// Regroup aligned sample tensors into batches of `batch_size`.
///
/// All three tensors must agree on the sample axis. When the sample count
/// is not a multiple of the batch size, the *leading* `n % batch_size`
/// samples are dropped so the most recent samples survive.
pub fn batchify(
    encoder_input: &Array3<f64>,
    decoder_input: &Array3<f64>,
    target: &Array3<f64>,
    batch_size: usize,
) -> Result<Vec<Batch>> {
    let n = encoder_input.dim().0;
    if decoder_input.dim().0 != n || target.dim().0 != n {
        return Err(ModelError::shape(format!(
            "sample counts disagree: encoder {}, decoder {}, target {}",
            n,
            decoder_input.dim().0,
            target.dim().0
        )));
    }

    if batch_size == 0 || batch_size > n {
        return Err(ModelError::shape(format!(
            "batch size {} invalid for {} samples",
            batch_size, n
        )));
    }

    let n_batches = n / batch_size;
    let mut start = n % batch_size;

    let mut batches = Vec::with_capacity(n_batches);
    for _ in 0..n_batches {
        let end = start + batch_size;
        batches.push(Batch {
            encoder_input: encoder_input.slice(s![start..end, .., ..]).to_owned(),
            decoder_input: decoder_input.slice(s![start..end, .., ..]).to_owned(),
            target: target.slice(s![start..end, .., ..]).to_owned(),
        });
        start = end;
    }

    Ok(batches)
}

/// Hold out the trailing `n_test` batches for evaluation
pub fn train_test_split(batches: Vec<Batch>, n_test: usize) -> Result<(Vec<Batch>, Vec<Batch>)> {
    if n_test >= batches.len() {
        return Err(ModelError::shape(format!(
            "cannot hold out {} of {} batches",
            n_test,
            batches.len()
        )));
    }

    let mut train = batches;
    let test = train.split_off(train.len() - n_test);
    Ok((train, test))
}
