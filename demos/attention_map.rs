//! Inspect attention weights of a forward pass
//!
//! Prints ASCII heat maps of decoder self-attention (note the causal
//! triangle) and decoder-to-encoder cross-attention.
//!
//! Usage:
//!     cargo run --example attention_map

use anyhow::Result;
use attn_forecaster::{Mode, ModelConfig, Seq2SeqTransformer};
use ndarray::{Array3, Array4};

const SHADES: [char; 5] = [' ', '.', ':', '*', '#'];

fn print_head(weights: &Array4<f64>, head: usize, title: &str) {
    let (_, _, len_q, len_k) = weights.dim();
    println!("{title} (head {head})");

    for q in 0..len_q {
        let row: String = (0..len_k)
            .map(|k| {
                let w = weights[[0, head, q, k]];
                let bucket = ((w * (SHADES.len() - 1) as f64 * 2.0).round() as usize)
                    .min(SHADES.len() - 1);
                SHADES[bucket]
            })
            .collect();
        println!("  q{:>2} |{}|", q, row);
    }
    println!();
}

fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let config = ModelConfig {
        src_input_size: 4,
        tgt_input_size: 1,
        d_model: 16,
        d_ff: 32,
        d_k: 4,
        d_v: 4,
        n_heads: 4,
        n_layers: 1,
        max_seq_len: 64,
        ..Default::default()
    };
    let model = Seq2SeqTransformer::new(config)?;

    let history = Array3::from_shape_fn((1, 12, 4), |(_, t, f)| {
        (0.4 * t as f64 + f as f64).sin()
    });
    let context = Array3::from_shape_fn((1, 8, 1), |(_, t, _)| (0.4 * t as f64).sin());

    let (_, attention) = model.forecast_with_attention(&history, &context, Mode::Inference)?;

    for head in 0..4 {
        print_head(&attention.decoder.self_attn[0], head, "decoder self-attention");
    }
    print_head(&attention.decoder.cross_attn[0], 0, "decoder-encoder cross-attention");
    print_head(&attention.encoder_self[0], 0, "encoder self-attention");

    Ok(())
}
