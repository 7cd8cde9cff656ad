use super::{BufferSampler, SampleGrabber, SampleReader};

pub struct LinearSampleGrabber<Sampler: BufferSampler> {
    sampler_reader: SampleReader<Sampler>,
}

impl<Sampler: BufferSampler> LinearSampleGrabber<Sampler> {
    pub fn new(sampler_reader: SampleReader<Sampler>) -> Self {
        LinearSampleGrabber { sampler_reader }
    }
}

impl<Sampler: BufferSampler> SampleGrabber for LinearSampleGrabber<Sampler> {
    #[inline(always)]
    fn get(&mut self, index: usize, fractional: f32) -> f32 {
        let first = self.sampler_reader.get(index);
        let second = self.sampler_reader.get(index + 1);
        first * (1.0 - fractional) + second * fractional
    }

    fn is_past_end(&self, pos: f64) -> bool {
        self.sampler_reader.is_past_end(pos as usize)
    }
}
