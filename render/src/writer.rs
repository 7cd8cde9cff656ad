use std::{fs::File, io::BufWriter, path::Path};

use hound::{WavSpec, WavWriter};

use crate::config::{SamplerRenderAudioFormat, SamplerRenderConfig};

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
enum AudioWriterState {
    /// Waiting for the first non-silent sample
    Idle,
    Writing,
    Finished,
}

pub struct AudioFileWriter {
    format: SamplerRenderAudioFormat,
    channels: usize,
    state: AudioWriterState,
    wav_writer: Option<WavWriter<BufWriter<File>>>,
}

impl AudioFileWriter {
    pub fn new(config: &SamplerRenderConfig, path: &Path) -> Result<Self, hound::Error> {
        let state = if config.trim_leading_silence {
            AudioWriterState::Idle
        } else {
            AudioWriterState::Writing
        };

        match config.audio_format {
            SamplerRenderAudioFormat::Wav => {
                let spec = WavSpec {
                    channels: config.audio_channels.count(),
                    sample_rate: config.sample_rate,
                    bits_per_sample: 32,
                    sample_format: hound::SampleFormat::Float,
                };
                let writer = WavWriter::create(path, spec)?;

                Ok(Self {
                    format: config.audio_format,
                    channels: config.audio_channels.count() as usize,
                    state,
                    wav_writer: Some(writer),
                })
            }
        }
    }

    /// Writes and drains `samples`.
    pub fn write_samples(&mut self, samples: &mut Vec<f32>) -> Result<(), hound::Error> {
        match self.format {
            SamplerRenderAudioFormat::Wav => {
                let Some(writer) = &mut self.wav_writer else {
                    samples.clear();
                    return Ok(());
                };

                let start = if self.state == AudioWriterState::Idle {
                    match samples.iter().position(|s| *s != 0.0) {
                        Some(first) => {
                            self.state = AudioWriterState::Writing;
                            first - first % self.channels
                        }
                        None => samples.len(),
                    }
                } else {
                    0
                };

                for s in samples.drain(..).skip(start) {
                    writer.write_sample(s)?;
                }
            }
        }
        Ok(())
    }

    pub fn finalize(&mut self) -> Result<(), hound::Error> {
        match self.format {
            SamplerRenderAudioFormat::Wav => {
                if let Some(writer) = self.wav_writer.take() {
                    writer.finalize()?;
                }
            }
        }
        self.state = AudioWriterState::Finished;
        Ok(())
    }
}
