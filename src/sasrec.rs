//! Self-attentive sequential recommendation scorer.
//!
//! The model embeds each history item, injects a distance-from-end position
//! encoding, refines the sequence with stacked [`AttentionBlock`]s and pools
//! the valid positions into one vector per instance. Candidates are scored
//! by dot product against that pooled vector.

use candle_core::{DType, Result, Tensor, D};
use candle_nn::{Embedding, Module, VarBuilder};

use crate::batch::Batch;
use crate::config::ScorerConfig;
use crate::layers::AttentionBlock;
use crate::ops;
use crate::scorer::{ScorerOutput, SequentialScorer};

/// Next-item scorer over stacked masked self-attention blocks.
#[derive(Debug)]
pub struct SasRec {
    config: ScorerConfig,
    item_embeddings: Embedding,
    pos_embeddings: Embedding,
    blocks: Vec<AttentionBlock>,
    len_range: Tensor,
}

impl SasRec {
    /// Allocate the embedding tables and per-layer parameter sets.
    pub fn new(config: ScorerConfig, vb: VarBuilder) -> Result<Self> {
        config.validate()?;

        let item_embeddings =
            candle_nn::embedding(config.item_num, config.emb_size, vb.pp("item_emb"))?;
        // Distance-from-end positions range over 0..=history_max.
        let pos_embeddings =
            candle_nn::embedding(config.history_max + 1, config.emb_size, vb.pp("pos_emb"))?;

        let mut blocks = Vec::with_capacity(config.num_layers);
        for i in 0..config.num_layers {
            blocks.push(AttentionBlock::new(
                config.emb_size,
                config.dropout,
                vb.pp(format!("blocks.{}", i)),
            )?);
        }

        let len_range = ops::arange_i64(config.history_max, &config.device)?;

        log::info!(
            "sasrec init item_num={} emb_size={} history_max={} num_layers={} dropout={}",
            config.item_num,
            config.emb_size,
            config.history_max,
            config.num_layers,
            config.dropout
        );

        Ok(SasRec {
            config,
            item_embeddings,
            pos_embeddings,
            blocks,
            len_range,
        })
    }

    /// Per-slot position index: distance from the sequence end, 0 at padding.
    ///
    /// For `lengths [4, 2]` over five slots this yields
    /// `[[4, 3, 2, 1, 0], [2, 1, 0, 0, 0]]`. Values never exceed
    /// `history_max`.
    pub fn position_indices(&self, history: &Tensor, lengths: &Tensor) -> Result<Tensor> {
        let (_batch, seq_len) = history.dims2()?;
        let valid = history.ne(0u32)?;

        // Padded slots go negative before masking, so stay in i64 until then.
        let range = self.len_range.narrow(0, 0, seq_len)?.unsqueeze(0)?;
        let lengths = lengths.to_dtype(DType::I64)?.unsqueeze(1)?;
        let position = lengths.broadcast_sub(&range)?;
        let position = position.mul(&valid.to_dtype(DType::I64)?)?;
        position.to_dtype(DType::U32)
    }

    /// Encode histories into one pooled vector per instance, `[B, D]`.
    ///
    /// Pooling is a masked mean over valid positions, carried out in f64 and
    /// cast back to the embedding dtype.
    pub fn encode(&self, history: &Tensor, lengths: &Tensor, train: bool) -> Result<Tensor> {
        let valid = history.ne(0u32)?;

        let his_vectors = self.item_embeddings.forward(history)?;
        let position = self.position_indices(history, lengths)?;
        let pos_vectors = self.pos_embeddings.forward(&position)?;
        let mut his_vectors = his_vectors.add(&pos_vectors)?;

        let mask = ops::attention_mask_from_validity(&valid)?;
        for block in &self.blocks {
            his_vectors = block.forward(&his_vectors, &mask, train)?;
        }

        let valid_f64 = valid.to_dtype(DType::F64)?.unsqueeze(2)?;
        let summed = his_vectors
            .to_dtype(DType::F64)?
            .broadcast_mul(&valid_f64)?
            .sum(1)?;
        let lengths_f64 = lengths.to_dtype(DType::F64)?.unsqueeze(1)?;
        let pooled = summed.broadcast_div(&lengths_f64)?;
        pooled.to_dtype(DType::F32)
    }

    pub fn item_embeddings(&self) -> &Embedding {
        &self.item_embeddings
    }

    pub fn position_embeddings(&self) -> &Embedding {
        &self.pos_embeddings
    }

    /// Number of learned parameters.
    pub fn count_parameters(&self) -> usize {
        let d = self.config.emb_size;
        let embeddings = self.config.item_num * d + (self.config.history_max + 1) * d;
        // Per block: bias-free query/key, biased w1/w2, norm scale and shift.
        let per_block = 2 * d * d + 2 * (d * d + d) + 2 * d;
        embeddings + self.config.num_layers * per_block
    }
}

impl SequentialScorer for SasRec {
    fn config(&self) -> &ScorerConfig {
        &self.config
    }

    fn forward(&self, batch: &Batch, train: bool) -> Result<ScorerOutput> {
        let i_vectors = self.item_embeddings.forward(batch.item_ids())?;
        let his_vector = self.encode(batch.history(), batch.lengths(), train)?;

        let prediction = his_vector
            .unsqueeze(1)?
            .broadcast_mul(&i_vectors)?
            .sum(D::Minus1)?;

        Ok(ScorerOutput {
            prediction,
            check: Vec::new(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use candle_core::Device;
    use candle_nn::{VarBuilder, VarMap};

    fn scorer(config: ScorerConfig) -> SasRec {
        let device = config.device.clone();
        let varmap = VarMap::new();
        let vb = VarBuilder::from_varmap(&varmap, DType::F32, &device);
        SasRec::new(config, vb).unwrap()
    }

    #[test]
    fn construction_rejects_invalid_config() {
        let device = Device::Cpu;
        let varmap = VarMap::new();
        let vb = VarBuilder::from_varmap(&varmap, DType::F32, &device);
        let config = ScorerConfig::new(1, device);
        assert!(SasRec::new(config, vb).is_err());
    }

    #[test]
    fn parameter_count_matches_layout() {
        let mut config = ScorerConfig::new(10, Device::Cpu);
        config.emb_size = 4;
        config.history_max = 3;
        config.num_layers = 2;
        let model = scorer(config);

        let embeddings = 10 * 4 + 4 * 4;
        let per_block = 2 * 16 + 2 * 20 + 8;
        assert_eq!(model.count_parameters(), embeddings + 2 * per_block);
    }

    #[test]
    fn position_indices_support_short_sequences() -> Result<()> {
        let mut config = ScorerConfig::new(10, Device::Cpu);
        config.history_max = 5;
        let model = scorer(config);

        // Two slots only, both valid.
        let history = Tensor::from_vec(vec![3u32, 4], (1, 2), &Device::Cpu)?;
        let lengths = Tensor::from_vec(vec![2u32], (1,), &Device::Cpu)?;
        let position = model.position_indices(&history, &lengths)?;

        assert_eq!(position.to_vec2::<u32>()?, vec![vec![2, 1]]);
        Ok(())
    }
}
