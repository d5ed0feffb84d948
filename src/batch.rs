//! Forward-pass input batches.

use candle_core::{bail, Device, Result, Tensor};

/// One scoring batch: per-instance candidate ids, the interaction history
/// and the count of valid history entries.
///
/// `history` is right-padded with the reserved id 0; `lengths` gives the
/// number of leading valid slots per row.
#[derive(Debug, Clone)]
pub struct Batch {
    item_ids: Tensor,
    history: Tensor,
    lengths: Tensor,
}

impl Batch {
    /// Wrap pre-built tensors: `item_ids [B, C]`, `history [B, H]` and
    /// `lengths [B]`, all U32.
    pub fn new(item_ids: Tensor, history: Tensor, lengths: Tensor) -> Result<Self> {
        let (batch, _candidates) = item_ids.dims2()?;
        let (history_batch, _seq_len) = history.dims2()?;
        let length_batch = lengths.dims1()?;
        if history_batch != batch || length_batch != batch {
            bail!(
                "batch dimensions disagree: item_ids {}, history {}, lengths {}",
                batch,
                history_batch,
                length_batch
            );
        }
        Ok(Batch {
            item_ids,
            history,
            lengths,
        })
    }

    /// Build a batch from host sequences.
    ///
    /// Each history is truncated to its most recent `history_max` items and
    /// right-padded with 0. Every row must carry the same number of
    /// candidates and at least one valid history item.
    pub fn from_slices(
        candidates: &[Vec<u32>],
        histories: &[Vec<u32>],
        history_max: usize,
        device: &Device,
    ) -> Result<Self> {
        if candidates.is_empty() {
            bail!("batch must contain at least one instance");
        }
        if candidates.len() != histories.len() {
            bail!(
                "candidate rows ({}) and history rows ({}) disagree",
                candidates.len(),
                histories.len()
            );
        }
        let num_candidates = candidates[0].len();
        if num_candidates == 0 {
            bail!("each instance needs at least one candidate");
        }

        let batch = candidates.len();
        let mut item_data = Vec::with_capacity(batch * num_candidates);
        for row in candidates {
            if row.len() != num_candidates {
                bail!("all instances must share the same candidate count");
            }
            item_data.extend_from_slice(row);
        }

        let mut history_data = vec![0u32; batch * history_max];
        let mut length_data = Vec::with_capacity(batch);
        for (b, seq) in histories.iter().enumerate() {
            let keep = seq.len().min(history_max);
            if keep == 0 {
                bail!("history for instance {} is empty", b);
            }
            let recent = &seq[seq.len() - keep..];
            history_data[b * history_max..b * history_max + keep].copy_from_slice(recent);
            length_data.push(keep as u32);
        }

        let item_ids = Tensor::from_vec(item_data, (batch, num_candidates), device)?;
        let history = Tensor::from_vec(history_data, (batch, history_max), device)?;
        let lengths = Tensor::from_vec(length_data, (batch,), device)?;
        Batch::new(item_ids, history, lengths)
    }

    /// Candidate item ids, `[B, C]`.
    pub fn item_ids(&self) -> &Tensor {
        &self.item_ids
    }

    /// History item ids, `[B, H]`, 0 marking padding.
    pub fn history(&self) -> &Tensor {
        &self.history
    }

    /// Valid-entry counts, `[B]`.
    pub fn lengths(&self) -> &Tensor {
        &self.lengths
    }

    pub fn batch_size(&self) -> Result<usize> {
        self.lengths.dims1()
    }
}
