use simple_sampler_core::sampler::SamplerConfig;

/// Options for initializing a [`RealtimeSampler`](crate::RealtimeSampler).
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Deserialize, serde::Serialize),
    serde(default)
)]
pub struct RealtimeSamplerConfig {
    /// The length of the buffer reserved for the audio renderer, in milliseconds.
    ///
    /// Smaller values have lower latency but risk audio dropouts.
    ///
    /// Default: `10.0`
    pub render_window_ms: f64,

    /// Polyphony, initial envelope and sound options of the sampler.
    pub sampler: SamplerConfig,

    /// Pass the output through a volume limiter to avoid clipping.
    ///
    /// Default: `true`
    pub use_limiter: bool,
}

impl Default for RealtimeSamplerConfig {
    fn default() -> Self {
        Self {
            render_window_ms: 10.0,
            sampler: Default::default(),
            use_limiter: true,
        }
    }
}

impl RealtimeSamplerConfig {
    /// The render window converted to frames at `sample_rate`, at least one.
    pub fn render_window_frames(&self, sample_rate: u32) -> usize {
        ((sample_rate as f64 * self.render_window_ms / 1000.0) as usize).max(1)
    }
}
