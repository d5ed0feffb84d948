//! Shared numeric utilities for attention-based scorers.
//!
//! The attention helper is single-head and batched: `q`, `k` and `v` follow
//! the `(batch, seq, width)` convention and the optional mask is additive,
//! broadcastable to the `(batch, seq, seq)` score tensor.

use candle_core::{DType, Device, Result, Tensor};
use candle_nn::ops::softmax_last_dim;

/// Additive score for masked keys. Large enough that the softmax weight of a
/// masked key underflows to exactly zero in f32.
const MASKED_SCORE: f64 = -1e9;

/// Masked scaled dot-product attention.
///
/// Computes `softmax(q @ k^T * scale + mask) @ v`. Masked keys receive zero
/// weight regardless of the query.
pub fn scaled_dot_product_attention(
    q: &Tensor,
    k: &Tensor,
    v: &Tensor,
    scale: f64,
    mask: Option<&Tensor>,
) -> Result<Tensor> {
    let scores = q.matmul(&k.transpose(1, 2)?)?.affine(scale, 0.0)?;
    let scores = match mask {
        Some(mask) => scores.broadcast_add(mask)?,
        None => scores,
    };
    let weights = softmax_last_dim(&scores)?;
    weights.matmul(v)
}

/// Turn a `[batch, seq]` 0/1 validity tensor into an additive attention mask.
///
/// Valid keys map to 0, padded keys to [`MASKED_SCORE`]. The result is shaped
/// `[batch, 1, seq]` so one mask broadcasts over every query position.
pub fn attention_mask_from_validity(valid: &Tensor) -> Result<Tensor> {
    valid
        .to_dtype(DType::F32)?
        .affine(-MASKED_SCORE, MASKED_SCORE)?
        .unsqueeze(1)
}

/// Materialize `0..len` as an I64 tensor for index arithmetic.
pub fn arange_i64(len: usize, device: &Device) -> Result<Tensor> {
    Tensor::arange(0i64, len as i64, device)
}
