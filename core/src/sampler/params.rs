use std::sync::{
    atomic::{AtomicU64, Ordering},
    Arc,
};

use crate::{sound::SoundInitOptions, voice::AdsrParameters};

use super::SamplerInfo;

/// Options for initializing a [`Sampler`](super::Sampler).
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Deserialize, serde::Serialize),
    serde(default)
)]
pub struct SamplerConfig {
    /// The maximum number of voices sounding at once.
    ///
    /// Default: `3`
    pub polyphony: usize,

    /// The envelope used for new notes until it is changed.
    pub envelope: AdsrParameters,

    /// Options used when building sounds from loaded files.
    pub sound_options: SoundInitOptions,
}

impl Default for SamplerConfig {
    fn default() -> Self {
        Self {
            polyphony: SamplerInfo::DEFAULT_POLYPHONY,
            envelope: Default::default(),
            sound_options: Default::default(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct SamplerStats {
    pub(super) voice_counter: Arc<AtomicU64>,
}

impl SamplerStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub(super) fn set_voice_count(&self, count: usize) {
        self.voice_counter.store(count as u64, Ordering::Relaxed);
    }
}

/// Reads the statistics of a sampler from any thread.
#[derive(Debug, Clone)]
pub struct SamplerStatsReader {
    stats: SamplerStats,
}

impl SamplerStatsReader {
    pub fn new(stats: SamplerStats) -> Self {
        Self { stats }
    }

    /// The number of active voices after the last rendered block.
    pub fn voice_count(&self) -> u64 {
        self.stats.voice_counter.load(Ordering::Relaxed)
    }
}
