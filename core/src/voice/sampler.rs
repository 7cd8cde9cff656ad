use std::sync::Arc;

use crate::sound::Interpolator;
use crate::voice::{ReleaseType, VoiceControlData};

use super::{SampleMono, SampleStereo, VoiceGenerator, VoiceGeneratorBase};

mod linear;
pub use linear::*;

mod nearest;
pub use nearest::*;

// Terminology:
//
// BufferSampler: returns the sample at an integer index
//
// SampleReader: reads a buffer from the start of the sample until its end
//
// SampleGrabber: turns a fractional read position into an interpolated value

pub trait BufferSampler: Send + Sync {
    fn get(&self, pos: usize) -> f32;
    fn length(&self) -> usize;
}

pub trait SampleGrabber: Send + Sync {
    /// `index` is the truncated read position, `fractional` the 0-1 remainder.
    fn get(&mut self, index: usize, fractional: f32) -> f32;

    fn is_past_end(&self, pos: f64) -> bool;
}

/// Reads a shared `f32` channel, returning silence outside of it.
#[derive(Clone)]
pub struct F32BufferSampler(Arc<[f32]>);

impl F32BufferSampler {
    pub fn new(samples: Arc<[f32]>) -> Self {
        F32BufferSampler(samples)
    }
}

impl BufferSampler for F32BufferSampler {
    #[inline(always)]
    fn get(&self, pos: usize) -> f32 {
        self.0.get(pos).copied().unwrap_or(0.0)
    }

    fn length(&self) -> usize {
        self.0.len()
    }
}

/// Plays a buffer once from start to end.
pub struct SampleReader<Sampler: BufferSampler> {
    buffer: Sampler,
    length: usize,
}

impl<Sampler: BufferSampler> SampleReader<Sampler> {
    pub fn new(buffer: Sampler) -> Self {
        let length = buffer.length();
        Self { buffer, length }
    }

    #[inline(always)]
    pub fn get(&self, pos: usize) -> f32 {
        self.buffer.get(pos)
    }

    #[inline(always)]
    pub fn is_past_end(&self, pos: usize) -> bool {
        pos >= self.length
    }
}

pub enum SampleGrabbers<Sampler: BufferSampler> {
    Nearest(NearestSampleGrabber<Sampler>),
    Linear(LinearSampleGrabber<Sampler>),
}

impl<Sampler: BufferSampler> SampleGrabbers<Sampler> {
    pub fn new(interpolator: Interpolator, reader: SampleReader<Sampler>) -> Self {
        match interpolator {
            Interpolator::Nearest => SampleGrabbers::Nearest(NearestSampleGrabber::new(reader)),
            Interpolator::Linear => SampleGrabbers::Linear(LinearSampleGrabber::new(reader)),
        }
    }
}

impl<Sampler: BufferSampler> SampleGrabber for SampleGrabbers<Sampler> {
    #[inline(always)]
    fn get(&mut self, index: usize, fractional: f32) -> f32 {
        match self {
            SampleGrabbers::Nearest(grabber) => grabber.get(index, fractional),
            SampleGrabbers::Linear(grabber) => grabber.get(index, fractional),
        }
    }

    #[inline(always)]
    fn is_past_end(&self, pos: f64) -> bool {
        match self {
            SampleGrabbers::Nearest(grabber) => grabber.is_past_end(pos),
            SampleGrabbers::Linear(grabber) => grabber.is_past_end(pos),
        }
    }
}

/// Reads two channels in lockstep at the speed given by `pitch_gen`.
pub struct StereoVoiceSampler<Pitch, Grabber>
where
    Pitch: VoiceGenerator<SampleMono>,
    Grabber: SampleGrabber,
{
    grabber_left: Grabber,
    grabber_right: Grabber,

    pitch_gen: Pitch,

    time: f64,
}

impl<Pitch, Grabber> StereoVoiceSampler<Pitch, Grabber>
where
    Pitch: VoiceGenerator<SampleMono>,
    Grabber: SampleGrabber,
{
    pub fn new(grabber_left: Grabber, grabber_right: Grabber, pitch_gen: Pitch) -> Self {
        StereoVoiceSampler {
            grabber_left,
            grabber_right,
            pitch_gen,
            time: 0.0,
        }
    }

    fn increment_time(&mut self, by: f64) -> f64 {
        let time = self.time;
        self.time += by;
        time
    }
}

impl<Pitch, Grabber> VoiceGeneratorBase for StereoVoiceSampler<Pitch, Grabber>
where
    Pitch: VoiceGenerator<SampleMono>,
    Grabber: SampleGrabber,
{
    #[inline(always)]
    fn ended(&self) -> bool {
        self.grabber_left.is_past_end(self.time)
    }

    #[inline(always)]
    fn signal_release(&mut self, rel_type: ReleaseType) {
        self.pitch_gen.signal_release(rel_type);
    }

    #[inline(always)]
    fn process_controls(&mut self, control: &VoiceControlData) {
        self.pitch_gen.process_controls(control);
    }
}

impl<Pitch, Grabber> VoiceGenerator<SampleStereo> for StereoVoiceSampler<Pitch, Grabber>
where
    Pitch: VoiceGenerator<SampleMono>,
    Grabber: SampleGrabber,
{
    #[inline(always)]
    fn next_sample(&mut self) -> SampleStereo {
        let speed = self.pitch_gen.next_sample().0.max(0.0);
        let time = self.increment_time(speed as f64);
        let index = time as usize;
        let fractional = time.fract() as f32;

        SampleStereo(
            self.grabber_left.get(index, fractional),
            self.grabber_right.get(index, fractional),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::voice::Constant;

    fn reader(values: &[f32]) -> SampleReader<F32BufferSampler> {
        SampleReader::new(F32BufferSampler::new(values.into()))
    }

    #[test]
    fn linear_interpolates_between_samples() {
        let left = SampleGrabbers::new(Interpolator::Linear, reader(&[0.0, 1.0, 0.0]));
        let right = SampleGrabbers::new(Interpolator::Linear, reader(&[0.0, -1.0, 0.0]));
        let mut sampler = StereoVoiceSampler::new(left, right, Constant::new(0.5));

        let frames: Vec<SampleStereo> = (0..4).map(|_| sampler.next_sample()).collect();
        assert_eq!(
            frames,
            vec![
                SampleStereo(0.0, 0.0),
                SampleStereo(0.5, -0.5),
                SampleStereo(1.0, -1.0),
                SampleStereo(0.5, -0.5),
            ]
        );
    }

    #[test]
    fn nearest_truncates_position() {
        let left = SampleGrabbers::new(Interpolator::Nearest, reader(&[0.25, 0.75]));
        let right = SampleGrabbers::new(Interpolator::Nearest, reader(&[0.25, 0.75]));
        let mut sampler = StereoVoiceSampler::new(left, right, Constant::new(0.5));

        let left: Vec<f32> = (0..4).map(|_| sampler.next_sample().0).collect();
        assert_eq!(left, vec![0.25, 0.25, 0.75, 0.75]);
    }

    #[test]
    fn ends_after_last_sample() {
        let left = SampleGrabbers::new(Interpolator::Linear, reader(&[1.0, 1.0, 1.0]));
        let right = SampleGrabbers::new(Interpolator::Linear, reader(&[1.0, 1.0, 1.0]));
        let mut sampler = StereoVoiceSampler::new(left, right, Constant::new(1.0));

        for _ in 0..3 {
            assert!(!sampler.ended());
            sampler.next_sample();
        }
        assert!(sampler.ended());
    }
}
