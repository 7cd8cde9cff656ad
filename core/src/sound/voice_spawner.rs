use std::sync::Arc;

use crate::{
    voice::{
        Constant, EnvelopeParameters, F32BufferSampler, InterleavedVoice, NoteVoice,
        SampleGrabbers, SampleMono, SampleReader, SampleStereo, StereoVoiceSampler, Voice,
        VoiceCombiner, VoiceControl, VoiceControlData, VoiceEnvelope, VoiceGenerator,
    },
    AudioStreamParams,
};

use super::{Interpolator, SamplerSound};

/// Builds the voice chain for one note of a [`SamplerSound`]:
/// sample reader, velocity gain, envelope and output interleaving.
pub struct SampledVoiceSpawner {
    speed_mult: f32,
    amp: f32,
    envelope: EnvelopeParameters,
    samples: (Arc<[f32]>, Arc<[f32]>),
    interpolator: Interpolator,
    vel: u8,
    stream_params: AudioStreamParams,
}

impl SampledVoiceSpawner {
    pub fn new(
        sound: &SamplerSound,
        key: u8,
        vel: u8,
        envelope: EnvelopeParameters,
        stream_params: AudioStreamParams,
    ) -> Self {
        Self {
            speed_mult: sound.speed_multiplier(key, stream_params.sample_rate),
            amp: vel.min(127) as f32 / 127.0,
            envelope,
            samples: sound.stereo_channels(),
            interpolator: sound.options().interpolator,
            vel,
            stream_params,
        }
    }

    pub fn spawn_voice(&self, control: &VoiceControlData) -> Box<dyn Voice> {
        let make_grabber = |samples: &Arc<[f32]>| {
            SampleGrabbers::new(
                self.interpolator,
                SampleReader::new(F32BufferSampler::new(samples.clone())),
            )
        };
        let left = make_grabber(&self.samples.0);
        let right = make_grabber(&self.samples.1);

        let pitch_fac = self.create_pitch_fac(control);
        let sampler = StereoVoiceSampler::new(left, right, pitch_fac);

        let gen = self.apply_velocity(sampler);
        let gen = self.apply_envelope(gen);
        self.convert_to_voice(gen)
    }

    fn create_pitch_fac(&self, control: &VoiceControlData) -> impl VoiceGenerator<SampleMono> {
        let pitch_fac = Constant::new(self.speed_mult);
        let pitch_multiplier = VoiceControl::new(control, |vc| vc.voice_pitch_multiplier);
        VoiceCombiner::mult::<SampleMono, SampleMono, _, _>(pitch_fac, pitch_multiplier)
    }

    fn apply_velocity(
        &self,
        gen: impl VoiceGenerator<SampleStereo>,
    ) -> impl VoiceGenerator<SampleStereo> {
        let amp = Constant::new(self.amp);
        VoiceCombiner::mult::<SampleMono, SampleStereo, _, _>(amp, gen)
    }

    fn apply_envelope(
        &self,
        gen: impl VoiceGenerator<SampleStereo>,
    ) -> impl VoiceGenerator<SampleStereo> {
        let envelope = VoiceEnvelope::new(self.envelope, self.stream_params.sample_rate as f32);
        VoiceCombiner::mult::<SampleMono, SampleStereo, _, _>(envelope, gen)
    }

    fn convert_to_voice(&self, gen: impl 'static + VoiceGenerator<SampleStereo>) -> Box<dyn Voice> {
        let flattened = InterleavedVoice::new(gen, self.stream_params.channels);
        Box::new(NoteVoice::new(self.vel, flattened))
    }
}
