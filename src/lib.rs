//! Self-attentive sequential recommendation scoring on candle.
//!
//! Given a user's ordered history of interacted items and a set of candidate
//! items, [`SasRec`] produces one relevance score per candidate. The crate
//! owns parameter definition and the forward scoring computation; training
//! loops, data loading and evaluation live with the host.

pub mod batch;
pub mod config;
pub mod layers;
pub mod ops;
pub mod sasrec;
pub mod scorer;

pub use batch::Batch;
pub use config::ScorerConfig;
pub use sasrec::SasRec;
pub use scorer::{ScorerOutput, SequentialScorer};

use anyhow::Result;
use candle_core::Device;

/// Pick the compute device, preferring accelerators when compiled in.
///
/// `CANDLE_FORCE_CPU` overrides everything.
pub fn setup_device() -> Result<Device> {
    if std::env::var("CANDLE_FORCE_CPU").is_ok() {
        log::info!("CANDLE_FORCE_CPU set, using CPU backend");
        return Ok(Device::Cpu);
    }

    #[cfg(feature = "metal")]
    {
        match Device::new_metal(0) {
            Ok(device) => {
                log::info!("Metal device selected: {:?}", device);
                return Ok(device);
            }
            Err(_) => log::info!("Metal unavailable, falling back..."),
        }
    }

    match Device::cuda_if_available(0) {
        Ok(device) if device.is_cuda() => {
            log::info!("CUDA device selected: {:?}", device);
            Ok(device)
        }
        Ok(_) | Err(_) => {
            log::info!("Using CPU backend");
            Ok(Device::Cpu)
        }
    }
}
