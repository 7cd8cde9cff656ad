/// Type of the audio sample interpolation algorithm.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum Interpolator {
    /// Nearest neighbor interpolation
    ///
    /// See more info about this method [here](https://en.wikipedia.org/wiki/Nearest-neighbor_interpolation)
    Nearest,

    /// Linear interpolation
    ///
    /// See more info about this method [here](https://en.wikipedia.org/wiki/Linear_interpolation)
    #[default]
    Linear,
}

/// Options for building a [`SamplerSound`](super::SamplerSound) from audio data.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Deserialize, serde::Serialize),
    serde(default)
)]
pub struct SoundInitOptions {
    /// The MIDI key at which the sample plays at its recorded pitch.
    ///
    /// Default: `60`
    pub root_note: u8,

    /// Audio beyond this length is dropped when the sound is built.
    ///
    /// Default: `10.0`
    pub max_sample_length_secs: f32,

    /// The type of interpolator to use for playback. See the
    /// documentation of the `Interpolator` enum for available options.
    ///
    /// Default: `Linear`
    pub interpolator: Interpolator,

    /// If set to true, voices release linearly from their current level.
    /// Otherwise a convex curve is used.
    ///
    /// Default: `true`
    pub linear_release: bool,
}

impl Default for SoundInitOptions {
    fn default() -> Self {
        Self {
            root_note: 60,
            max_sample_length_secs: 10.0,
            interpolator: Interpolator::Linear,
            linear_release: true,
        }
    }
}
