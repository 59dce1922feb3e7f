//! Attention mask builders
//!
//! Masks are boolean tensors of shape [batch, query_time, key_time];
//! a `true` entry forbids that query position from attending to that
//! key position. Multi-head attention broadcasts them across heads.

use ndarray::Array3;

/// Causal (subsequent-position) mask: query `i` may only attend to keys
/// `j <= i`, so everything strictly above the diagonal is forbidden.
pub fn causal_mask(batch_size: usize, seq_len: usize) -> Array3<bool> {
    Array3::from_shape_fn((batch_size, seq_len, seq_len), |(_, q, k)| k > q)
}

/// Padding mask over key positions.
///
/// A key position counts as padding when *every* feature at that time
/// step equals `pad_value`; every query is then forbidden from attending
/// to it. `len_q` sizes the query axis of the returned mask.
pub fn padding_mask(seq: &Array3<f64>, len_q: usize, pad_value: f64) -> Array3<bool> {
    let (batch_size, len_k, n_features) = seq.dim();
    let mut mask = Array3::from_elem((batch_size, len_q, len_k), false);

    for b in 0..batch_size {
        for k in 0..len_k {
            let is_pad = (0..n_features).all(|f| seq[[b, k, f]] == pad_value);
            if is_pad {
                for q in 0..len_q {
                    mask[[b, q, k]] = true;
                }
            }
        }
    }

    mask
}

/// Combine two masks: a position is forbidden if either mask forbids it
pub fn combine_masks(a: &Array3<bool>, b: &Array3<bool>) -> Array3<bool> {
    debug_assert_eq!(a.dim(), b.dim());
    Array3::from_shape_fn(a.dim(), |idx| a[idx] || b[idx])
}
