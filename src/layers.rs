//! Self-attention building blocks.

use candle_core::{Result, Tensor};
use candle_nn::{Dropout, LayerNorm, Linear, Module, VarBuilder};

use crate::ops;

/// One self-attention block with its own parameter set.
///
/// The block projects the hidden states to query and key spaces without
/// bias; the key vectors double as values. The attention context runs
/// through a two-layer perceptron, then dropout, the residual add and a
/// learned layer norm, in that order.
#[derive(Debug)]
pub struct AttentionBlock {
    query: Linear,
    key: Linear,
    w1: Linear,
    w2: Linear,
    norm: LayerNorm,
    dropout: Dropout,
    scale: f64,
}

impl AttentionBlock {
    pub fn new(emb_size: usize, dropout_rate: f32, vb: VarBuilder) -> Result<Self> {
        let query = candle_nn::linear_no_bias(emb_size, emb_size, vb.pp("query"))?;
        let key = candle_nn::linear_no_bias(emb_size, emb_size, vb.pp("key"))?;
        let w1 = candle_nn::linear(emb_size, emb_size, vb.pp("w1"))?;
        let w2 = candle_nn::linear(emb_size, emb_size, vb.pp("w2"))?;
        let norm = candle_nn::layer_norm(emb_size, 1e-5, vb.pp("norm"))?;
        let dropout = Dropout::new(dropout_rate);
        let scale = 1.0 / (emb_size as f64).sqrt();

        Ok(AttentionBlock {
            query,
            key,
            w1,
            w2,
            norm,
            dropout,
            scale,
        })
    }

    /// Run the block. `mask` is the `[batch, 1, seq]` additive validity mask
    /// shared by every layer of the stack.
    pub fn forward(&self, hidden: &Tensor, mask: &Tensor, train: bool) -> Result<Tensor> {
        let residual = hidden;
        let queries = self.query.forward(hidden)?;
        let keys = self.key.forward(hidden)?;
        let context =
            ops::scaled_dot_product_attention(&queries, &keys, &keys, self.scale, Some(mask))?;
        let context = self.w1.forward(&context)?.relu()?;
        let out = self.w2.forward(&context)?;
        let out = self.dropout.forward(&out, train)?;
        self.norm.forward(&residual.add(&out)?)
    }
}
