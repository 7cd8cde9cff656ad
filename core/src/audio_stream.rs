/// Number of interleaved output channels.
///
/// The sampler only renders mono or stereo layouts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum ChannelCount {
    Mono,
    Stereo,
}

impl ChannelCount {
    pub fn count(&self) -> u16 {
        match self {
            ChannelCount::Mono => 1,
            ChannelCount::Stereo => 2,
        }
    }

    /// Returns `None` for any layout other than mono or stereo.
    pub fn from_count(count: u16) -> Option<Self> {
        match count {
            1 => Some(ChannelCount::Mono),
            2 => Some(ChannelCount::Stereo),
            _ => None,
        }
    }
}

impl Default for ChannelCount {
    fn default() -> Self {
        ChannelCount::Stereo
    }
}

impl From<ChannelCount> for u16 {
    fn from(value: ChannelCount) -> Self {
        value.count()
    }
}

/// Parameters of the output audio stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct AudioStreamParams {
    pub sample_rate: u32,
    pub channels: ChannelCount,
}

impl AudioStreamParams {
    pub fn new(sample_rate: u32, channels: ChannelCount) -> Self {
        Self {
            sample_rate,
            channels,
        }
    }
}

impl Default for AudioStreamParams {
    fn default() -> Self {
        Self::new(44100, ChannelCount::Stereo)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_mono_and_stereo_layouts_exist() {
        assert_eq!(ChannelCount::from_count(0), None);
        assert_eq!(ChannelCount::from_count(1), Some(ChannelCount::Mono));
        assert_eq!(ChannelCount::from_count(2), Some(ChannelCount::Stereo));
        assert_eq!(ChannelCount::from_count(6), None);
    }
}
