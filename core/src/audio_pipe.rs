use crate::AudioStreamParams;

/// An object to read audio samples from.
pub trait AudioPipe {
    /// The audio stream parameters of the audio pipe.
    fn stream_params(&self) -> &'_ AudioStreamParams;

    /// Reads interleaved samples from the pipe.
    ///
    /// The amount of samples read advances the time of the pipe. A note-on
    /// sent to a sampler followed by reading 44100 frames at 44.1kHz keeps the
    /// note audible for one second; the matching note-off only takes effect on
    /// the next read.
    fn read_samples(&mut self, to: &mut [f32]) {
        assert!(to.len() % self.stream_params().channels.count() as usize == 0);
        self.read_samples_unchecked(to);
    }

    /// Reads samples from the pipe without checking the channel count of the output.
    fn read_samples_unchecked(&mut self, to: &mut [f32]);
}

/// Wraps a render closure into an [`AudioPipe`].
pub struct FunctionAudioPipe<F: 'static + FnMut(&mut [f32]) + Send> {
    func: F,
    stream_params: AudioStreamParams,
}

impl<F: 'static + FnMut(&mut [f32]) + Send> AudioPipe for FunctionAudioPipe<F> {
    fn stream_params(&self) -> &'_ AudioStreamParams {
        &self.stream_params
    }

    fn read_samples_unchecked(&mut self, to: &mut [f32]) {
        (self.func)(to);
    }
}

impl<F: 'static + FnMut(&mut [f32]) + Send> FunctionAudioPipe<F> {
    pub fn new(stream_params: AudioStreamParams, func: F) -> Self {
        FunctionAudioPipe {
            func,
            stream_params,
        }
    }
}
