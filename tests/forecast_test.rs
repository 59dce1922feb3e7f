//! End-to-end tests for the seq2seq transformer forecaster

use approx::assert_abs_diff_eq;
use attn_forecaster::data::{batchify, split_window};
use attn_forecaster::{Mode, ModelConfig, Seq2SeqTransformer};
use ndarray::{Array3, Axis};

fn tiny_config() -> ModelConfig {
    ModelConfig {
        src_input_size: 3,
        tgt_input_size: 1,
        d_model: 8,
        d_ff: 16,
        d_k: 2,
        d_v: 2,
        n_heads: 4,
        n_layers: 1,
        max_seq_len: 64,
        ..Default::default()
    }
}

fn history(batch: usize, len: usize) -> Array3<f64> {
    Array3::from_shape_fn((batch, len, 3), |(b, t, f)| {
        (0.3 * (b * 17 + t * 5 + f) as f64).sin()
    })
}

fn context(batch: usize, len: usize) -> Array3<f64> {
    Array3::from_shape_fn((batch, len, 1), |(b, t, _)| (0.3 * (b * 7 + t) as f64).cos())
}

#[test]
fn forecast_shape_finite_and_reproducible() {
    let model = Seq2SeqTransformer::new(tiny_config()).unwrap();

    let enc = history(2, 5);
    let dec = context(2, 4);

    let a = model.forecast(&enc, &dec, Mode::Inference).unwrap();
    assert_eq!(a.dim(), (2, 4, 1));
    assert!(a.iter().all(|v| v.is_finite()));

    let b = model.forecast(&enc, &dec, Mode::Inference).unwrap();
    assert_eq!(a, b);
}

#[test]
fn attention_rows_are_distributions() {
    let model = Seq2SeqTransformer::new(tiny_config()).unwrap();

    let (_, attention) = model
        .forecast_with_attention(&history(2, 6), &context(2, 4), Mode::Inference)
        .unwrap();

    for weights in attention
        .encoder_self
        .iter()
        .chain(attention.decoder.self_attn.iter())
        .chain(attention.decoder.cross_attn.iter())
    {
        for batch_heads in weights.axis_iter(Axis(0)) {
            for head in batch_heads.axis_iter(Axis(0)) {
                for row in head.axis_iter(Axis(0)) {
                    assert_abs_diff_eq!(row.sum(), 1.0, epsilon = 1e-9);
                }
            }
        }
    }
}

#[test]
fn decoder_self_attention_never_looks_ahead() {
    let model = Seq2SeqTransformer::new(tiny_config()).unwrap();

    let (_, attention) = model
        .forecast_with_attention(&history(1, 5), &context(1, 6), Mode::Inference)
        .unwrap();

    let weights = &attention.decoder.self_attn[0];
    let (_, n_heads, len, _) = weights.dim();
    for h in 0..n_heads {
        for i in 0..len {
            for j in (i + 1)..len {
                assert!(weights[[0, h, i, j]] <= 1e-12);
            }
        }
    }
}

#[test]
fn windowed_pipeline_produces_forecasts() {
    // window = 12 steps of which the last 4 are decoder context
    let windows = Array3::from_shape_fn((20, 12, 3), |(i, t, f)| {
        (0.2 * (i + t) as f64 + f as f64).sin()
    });

    let (enc, dec_full) = split_window(&windows, 4).unwrap();
    let dec = dec_full.slice(ndarray::s![.., .., ..1]).to_owned();
    let targets = dec.clone();

    let batches = batchify(&enc, &dec, &targets, 8).unwrap();
    assert_eq!(batches.len(), 2);

    let model = Seq2SeqTransformer::new(tiny_config()).unwrap();
    for batch in &batches {
        let forecast = model
            .forecast(&batch.encoder_input, &batch.decoder_input, Mode::Inference)
            .unwrap();
        assert_eq!(forecast.dim(), (8, 4, 1));
        assert!(forecast.iter().all(|v| v.is_finite()));
    }
}

#[test]
fn saved_model_reproduces_forecasts() {
    let dir = tempfile::tempdir().unwrap();
    let model = Seq2SeqTransformer::new(tiny_config()).unwrap();

    let enc = history(2, 5);
    let dec = context(2, 4);
    let before = model.forecast(&enc, &dec, Mode::Inference).unwrap();

    model.save(dir.path(), "run-1").unwrap();
    let restored = Seq2SeqTransformer::load(dir.path(), "run-1").unwrap();
    let after = restored.forecast(&enc, &dec, Mode::Inference).unwrap();

    assert_eq!(before, after);
}

#[test]
fn padded_decoder_context_is_ignored() {
    let config = ModelConfig {
        pad_value: Some(0.0),
        ..tiny_config()
    };
    let model = Seq2SeqTransformer::new(config).unwrap();

    // Last two decoder positions are padding
    let mut dec = context(1, 6);
    for t in 4..6 {
        dec[[0, t, 0]] = 0.0;
    }

    let (_, attention) = model
        .forecast_with_attention(&history(1, 5), &dec, Mode::Inference)
        .unwrap();

    let weights = &attention.decoder.self_attn[0];
    for h in 0..4 {
        for q in 0..6 {
            for k in 4..6 {
                if k > q {
                    continue; // already causally masked
                }
                assert!(weights[[0, h, q, k]] <= 1e-12);
            }
        }
    }
}

#[test]
fn sequence_lengths_may_vary_between_calls() {
    let model = Seq2SeqTransformer::new(tiny_config()).unwrap();

    for (enc_len, dec_len) in [(10, 8), (3, 2), (7, 7)] {
        let forecast = model
            .forecast(&history(1, enc_len), &context(1, dec_len), Mode::Inference)
            .unwrap();
        assert_eq!(forecast.dim(), (1, dec_len, 1));
    }
}

#[test]
fn over_length_input_fails_fast() {
    let config = ModelConfig {
        max_seq_len: 8,
        ..tiny_config()
    };
    let model = Seq2SeqTransformer::new(config).unwrap();

    let result = model.forecast(&history(1, 9), &context(1, 4), Mode::Inference);
    assert!(result.is_err());
}
