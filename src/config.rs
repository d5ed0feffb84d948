use candle_core::{Device, Error, Result};

/// Hyperparameters shared by the sequential scorers in this crate.
#[derive(Debug, Clone)]
pub struct ScorerConfig {
    /// Number of item ids, including the reserved padding id 0.
    pub item_num: usize,
    /// Embedding width.
    pub emb_size: usize,
    /// History-length cap. Positions range over `0..=history_max`.
    pub history_max: usize,
    /// Number of stacked self-attention blocks. Zero is legal and leaves
    /// the pooled history equal to the masked mean of the raw embeddings.
    pub num_layers: usize,
    /// Dropout probability applied inside each block.
    pub dropout: f32,
    /// Device hosting the parameters.
    pub device: Device,
}

impl ScorerConfig {
    /// Create a configuration with the conventional defaults.
    pub fn new(item_num: usize, device: Device) -> Self {
        ScorerConfig {
            item_num,
            emb_size: 64,
            history_max: 20,
            num_layers: 1,
            dropout: 0.0,
            device,
        }
    }

    /// Validate structural invariants before parameter allocation.
    pub fn validate(&self) -> Result<()> {
        if self.item_num < 2 {
            return Err(Error::Msg(
                "item_num must leave room for real items beyond the padding id".into(),
            ));
        }
        if self.emb_size == 0 {
            return Err(Error::Msg("emb_size must be greater than zero".into()));
        }
        if self.history_max == 0 {
            return Err(Error::Msg("history_max must be at least one".into()));
        }
        if !(0.0..1.0).contains(&self.dropout) {
            return Err(Error::Msg("dropout must be in [0, 1)".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = ScorerConfig::new(100, Device::Cpu);
        assert_eq!(config.emb_size, 64);
        assert_eq!(config.history_max, 20);
        assert_eq!(config.num_layers, 1);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn zero_layers_is_valid() {
        let mut config = ScorerConfig::new(100, Device::Cpu);
        config.num_layers = 0;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn rejects_padding_only_vocabulary() {
        let config = ScorerConfig::new(1, Device::Cpu);
        assert!(config.validate().is_err());
    }

    #[test]
    fn rejects_out_of_range_dropout() {
        let mut config = ScorerConfig::new(100, Device::Cpu);
        config.dropout = 1.0;
        assert!(config.validate().is_err());
        config.dropout = -0.1;
        assert!(config.validate().is_err());
    }

    #[test]
    fn rejects_zero_width() {
        let mut config = ScorerConfig::new(100, Device::Cpu);
        config.emb_size = 0;
        assert!(config.validate().is_err());
        config.emb_size = 64;
        config.history_max = 0;
        assert!(config.validate().is_err());
    }
}
