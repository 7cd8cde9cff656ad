use crate::ChannelCount;

/// Follows the loudness of one channel and scales samples against it.
#[derive(Debug, Clone)]
struct ChannelLimiter {
    loudness: f32,
}

impl ChannelLimiter {
    /// Smoothing when the signal gets louder, in samples.
    const ATTACK: f32 = 100.0;
    /// Smoothing when the signal gets quieter, in samples.
    const FALLOFF: f32 = 16000.0;
    /// Signals below full scale pass unchanged.
    const THRESHOLD: f32 = 1.0;

    fn new() -> Self {
        Self {
            loudness: Self::THRESHOLD,
        }
    }

    fn process(&mut self, sample: f32) -> f32 {
        let level = sample.abs();
        let smoothing = if level > self.loudness {
            Self::ATTACK
        } else {
            Self::FALLOFF
        };
        self.loudness = ((self.loudness * smoothing + level) / (smoothing + 1.0)).max(Self::THRESHOLD);

        sample / self.loudness
    }
}

/// A multi-channel limiter for interleaved audio.
///
/// Keeps the summed voices from clipping when several loud notes overlap.
#[derive(Debug, Clone)]
pub struct VolumeLimiter {
    channels: Vec<ChannelLimiter>,
}

impl VolumeLimiter {
    pub fn new(channels: ChannelCount) -> VolumeLimiter {
        VolumeLimiter {
            channels: vec![ChannelLimiter::new(); channels.count() as usize],
        }
    }

    /// Limits an interleaved buffer in place.
    pub fn limit(&mut self, samples: &mut [f32]) {
        let count = self.channels.len();
        for frame in samples.chunks_mut(count) {
            for (sample, channel) in frame.iter_mut().zip(self.channels.iter_mut()) {
                *sample = channel.process(*sample);
            }
        }
    }

    /// Limits interleaved samples as they are pulled from `samples`.
    pub fn limit_iter<'a, T: 'a + Iterator<Item = f32>>(
        &'a mut self,
        samples: T,
    ) -> impl 'a + Iterator<Item = f32> {
        let count = self.channels.len();
        samples
            .enumerate()
            .map(move |(i, sample)| self.channels[i % count].process(sample))
    }

    /// Forgets the loudness history, for example after a seek.
    pub fn reset(&mut self) {
        for channel in self.channels.iter_mut() {
            *channel = ChannelLimiter::new();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quiet_audio_passes_unchanged() {
        let mut limiter = VolumeLimiter::new(ChannelCount::Stereo);
        let mut samples = vec![0.5, -0.5, 0.9, -0.9];
        limiter.limit(&mut samples);
        assert_eq!(samples, vec![0.5, -0.5, 0.9, -0.9]);
    }

    #[test]
    fn loud_audio_is_pulled_into_range() {
        let mut limiter = VolumeLimiter::new(ChannelCount::Mono);
        let samples: Vec<f32> = limiter.limit_iter(std::iter::repeat(3.0).take(5000)).collect();

        assert!(samples[0] < 3.0);
        assert!(samples[4999].abs() <= 1.01);
        assert!(samples.windows(2).all(|w| w[1] <= w[0]));
    }

    #[test]
    fn channels_are_independent() {
        let mut limiter = VolumeLimiter::new(ChannelCount::Stereo);
        let mut samples: Vec<f32> = [4.0, 0.5].repeat(2000);
        limiter.limit(&mut samples);

        assert_eq!(samples[samples.len() - 1], 0.5);
        assert!(samples[samples.len() - 2] < 1.1);
    }
}
