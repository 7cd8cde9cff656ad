use crate::voice::{ReleaseType, VoiceControlData};

use super::{Voice, VoiceGeneratorBase, VoiceSampleGenerator};

/// One sounding note: the rendered signal chain plus the note's release state.
///
/// A kill also counts as a release, so a killed note is never released again.
pub struct NoteVoice<T: Send + Sync + VoiceSampleGenerator> {
    chain: T,
    released: Option<ReleaseType>,
    velocity: u8,
}

impl<T: Send + Sync + VoiceSampleGenerator> NoteVoice<T> {
    pub fn new(velocity: u8, chain: T) -> NoteVoice<T> {
        NoteVoice {
            chain,
            released: None,
            velocity,
        }
    }
}

impl<T: Send + Sync + VoiceSampleGenerator> VoiceGeneratorBase for NoteVoice<T> {
    #[inline(always)]
    fn ended(&self) -> bool {
        self.chain.ended()
    }

    fn signal_release(&mut self, rel_type: ReleaseType) {
        if self.released != Some(ReleaseType::Kill) {
            self.released = Some(rel_type);
        }
        self.chain.signal_release(rel_type)
    }

    #[inline(always)]
    fn process_controls(&mut self, control: &VoiceControlData) {
        self.chain.process_controls(control)
    }
}

impl<T: Send + Sync + VoiceSampleGenerator> VoiceSampleGenerator for NoteVoice<T> {
    #[inline(always)]
    fn render_to(&mut self, buffer: &mut [f32]) {
        self.chain.render_to(buffer)
    }
}

impl<T: Send + Sync + VoiceSampleGenerator> Voice for NoteVoice<T> {
    fn is_releasing(&self) -> bool {
        self.released.is_some()
    }

    fn is_killed(&self) -> bool {
        self.released == Some(ReleaseType::Kill)
    }

    fn velocity(&self) -> u8 {
        self.velocity
    }
}
