use candle_core::{Result, Tensor};

use crate::batch::Batch;
use crate::config::ScorerConfig;

/// Result of one scoring pass.
#[derive(Debug)]
pub struct ScorerOutput {
    /// Relevance score per candidate, `[batch, candidates]`.
    pub prediction: Tensor,
    /// Named diagnostic tensors surfaced to the host. May be empty.
    pub check: Vec<(String, Tensor)>,
}

/// Scoring interface shared by sequential recommenders.
///
/// Parameter definition is each implementation's constructor taking a
/// [`ScorerConfig`] and a `VarBuilder`; this trait covers the forward hook.
pub trait SequentialScorer {
    fn config(&self) -> &ScorerConfig;

    /// Score every candidate in the batch against its instance's history.
    fn forward(&self, batch: &Batch, train: bool) -> Result<ScorerOutput>;
}
