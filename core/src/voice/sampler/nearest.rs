use super::{BufferSampler, SampleGrabber, SampleReader};

pub struct NearestSampleGrabber<Sampler: BufferSampler> {
    sampler_reader: SampleReader<Sampler>,
}

impl<Sampler: BufferSampler> NearestSampleGrabber<Sampler> {
    pub fn new(sampler_reader: SampleReader<Sampler>) -> Self {
        NearestSampleGrabber { sampler_reader }
    }
}

impl<Sampler: BufferSampler> SampleGrabber for NearestSampleGrabber<Sampler> {
    #[inline(always)]
    fn get(&mut self, index: usize, _fractional: f32) -> f32 {
        self.sampler_reader.get(index)
    }

    fn is_past_end(&self, pos: f64) -> bool {
        self.sampler_reader.is_past_end(pos as usize)
    }
}
