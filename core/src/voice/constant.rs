use crate::voice::{ReleaseType, VoiceControlData};

use super::{SampleMono, VoiceGenerator, VoiceGeneratorBase};

/// Generator that outputs the same mono value forever.
pub struct Constant {
    value: f32,
}

impl Constant {
    pub fn new(value: f32) -> Constant {
        Constant { value }
    }
}

impl VoiceGeneratorBase for Constant {
    #[inline(always)]
    fn ended(&self) -> bool {
        false
    }

    #[inline(always)]
    fn signal_release(&mut self, _rel_type: ReleaseType) {}

    #[inline(always)]
    fn process_controls(&mut self, _control: &VoiceControlData) {}
}

impl VoiceGenerator<SampleMono> for Constant {
    #[inline(always)]
    fn next_sample(&mut self) -> SampleMono {
        SampleMono(self.value)
    }
}
