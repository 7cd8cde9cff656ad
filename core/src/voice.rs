mod envelopes;
pub use envelopes::*;

mod sample;
pub use sample::*;

mod output;
pub use output::*;

mod base;
pub use base::*;

mod constant;
pub use constant::*;

mod sampler;
pub use sampler::*;

mod control;
pub use control::*;

/// How a voice should be released.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ReleaseType {
    /// Standard release. Uses the voice's envelope.
    Standard,

    /// Kills the voice with a fadeout of 1ms.
    Kill,
}

/// Per-channel control values that running voices follow.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct VoiceControlData {
    /// Pitch multiplier from pitch bend.
    pub voice_pitch_multiplier: f32,
}

impl VoiceControlData {
    pub fn new_defaults() -> Self {
        VoiceControlData {
            voice_pitch_multiplier: 1.0,
        }
    }
}

impl Default for VoiceControlData {
    fn default() -> Self {
        Self::new_defaults()
    }
}

pub trait VoiceGeneratorBase: Sync + Send {
    fn ended(&self) -> bool;
    fn signal_release(&mut self, rel_type: ReleaseType);
    fn process_controls(&mut self, control: &VoiceControlData);
}

pub trait VoiceSampleGenerator: VoiceGeneratorBase {
    /// Adds the rendered interleaved samples onto `buffer`.
    fn render_to(&mut self, buffer: &mut [f32]);
}

pub trait Voice: VoiceSampleGenerator + Send + Sync {
    fn is_releasing(&self) -> bool;
    fn is_killed(&self) -> bool;

    fn velocity(&self) -> u8;
}
