use crate::voice::{ReleaseType, VoiceControlData};

use super::{SampleMono, VoiceGenerator, VoiceGeneratorBase};

/// Generator that follows one value of the channel's [`VoiceControlData`].
pub struct VoiceControl {
    value: f32,
    update: fn(&VoiceControlData) -> f32,
}

impl VoiceControl {
    pub fn new(control: &VoiceControlData, update: fn(&VoiceControlData) -> f32) -> VoiceControl {
        VoiceControl {
            value: (update)(control),
            update,
        }
    }
}

impl VoiceGeneratorBase for VoiceControl {
    #[inline(always)]
    fn ended(&self) -> bool {
        false
    }

    #[inline(always)]
    fn signal_release(&mut self, _rel_type: ReleaseType) {}

    #[inline(always)]
    fn process_controls(&mut self, control: &VoiceControlData) {
        self.value = (self.update)(control);
    }
}

impl VoiceGenerator<SampleMono> for VoiceControl {
    #[inline(always)]
    fn next_sample(&mut self) -> SampleMono {
        SampleMono(self.value)
    }
}
