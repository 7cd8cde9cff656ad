use simple_sampler_core::{sampler::SamplerConfig, ChannelCount};

/// Supported audio formats of the render output.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Default)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum SamplerRenderAudioFormat {
    /// 32-bit float WAV
    #[default]
    Wav,
}

/// Options for rendering a MIDI file through the sampler.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Deserialize, serde::Serialize),
    serde(default)
)]
pub struct SamplerRenderConfig {
    /// Polyphony, envelope and sound options of the sampler.
    pub sampler: SamplerConfig,

    /// Pass the output through a volume limiter.
    ///
    /// Default: `true`
    pub use_limiter: bool,

    /// Default: `48000`
    pub sample_rate: u32,

    /// Default: `Stereo`
    pub audio_channels: ChannelCount,

    /// Default: `Wav`
    pub audio_format: SamplerRenderAudioFormat,

    /// Drop the silence before the first sound.
    ///
    /// Default: `false`
    pub trim_leading_silence: bool,

    /// Upper bound for the release tail rendered after the last event, in seconds.
    ///
    /// Default: `30.0`
    pub max_tail_secs: f64,
}

impl Default for SamplerRenderConfig {
    fn default() -> Self {
        Self {
            sampler: Default::default(),
            use_limiter: true,
            sample_rate: 48000,
            audio_channels: ChannelCount::Stereo,
            audio_format: SamplerRenderAudioFormat::Wav,
            trim_leading_silence: false,
            max_tail_secs: 30.0,
        }
    }
}
