use crate::ChannelCount;

/// Fixed facts about the instrument, as reported to a host.
pub struct SamplerInfo;

impl SamplerInfo {
    pub const NAME: &'static str = "SimpleSampler";

    pub const ACCEPTS_MIDI: bool = true;
    pub const PRODUCES_MIDI: bool = false;
    pub const IS_MIDI_EFFECT: bool = false;

    /// Voices end with their envelope, nothing rings after the last voice.
    pub const TAIL_LENGTH_SECS: f64 = 0.0;

    pub const NUM_PROGRAMS: usize = 1;
    pub const CURRENT_PROGRAM: usize = 0;

    pub const DEFAULT_POLYPHONY: usize = 3;

    /// Only mono and stereo outputs are supported.
    pub fn supports_output_channels(channels: u16) -> bool {
        ChannelCount::from_count(channels).is_some()
    }

    /// Program names are empty, there is only the one program.
    pub fn program_name(_index: usize) -> &'static str {
        ""
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn supports_mono_and_stereo_only() {
        assert!(!SamplerInfo::supports_output_channels(0));
        assert!(SamplerInfo::supports_output_channels(1));
        assert!(SamplerInfo::supports_output_channels(2));
        assert!(!SamplerInfo::supports_output_channels(6));
    }
}
