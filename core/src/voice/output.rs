use crate::{voice::VoiceControlData, ChannelCount};

use super::{ReleaseType, SampleStereo, VoiceGenerator, VoiceGeneratorBase, VoiceSampleGenerator};

/// Writes a stereo generator into an interleaved output buffer.
///
/// Mono outputs receive the average of both sides.
pub struct InterleavedVoice<T: VoiceGenerator<SampleStereo>> {
    generator: T,
    channels: ChannelCount,
}

impl<T: VoiceGenerator<SampleStereo>> InterleavedVoice<T> {
    pub fn new(generator: T, channels: ChannelCount) -> InterleavedVoice<T> {
        InterleavedVoice {
            generator,
            channels,
        }
    }
}

impl<T> VoiceGeneratorBase for InterleavedVoice<T>
where
    T: VoiceGenerator<SampleStereo>,
{
    #[inline(always)]
    fn ended(&self) -> bool {
        self.generator.ended()
    }

    #[inline(always)]
    fn signal_release(&mut self, rel_type: ReleaseType) {
        self.generator.signal_release(rel_type)
    }

    #[inline(always)]
    fn process_controls(&mut self, control: &VoiceControlData) {
        self.generator.process_controls(control)
    }
}

impl<T> VoiceSampleGenerator for InterleavedVoice<T>
where
    T: VoiceGenerator<SampleStereo>,
{
    fn render_to(&mut self, buffer: &mut [f32]) {
        match self.channels {
            ChannelCount::Stereo => {
                for frame in buffer.chunks_exact_mut(2) {
                    let sample = self.generator.next_sample();
                    frame[0] += sample.0;
                    frame[1] += sample.1;
                }
            }
            ChannelCount::Mono => {
                for frame in buffer.iter_mut() {
                    let sample = self.generator.next_sample();
                    *frame += (sample.0 + sample.1) * 0.5;
                }
            }
        }
    }
}
