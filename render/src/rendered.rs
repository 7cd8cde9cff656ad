use std::path::Path;

use thiserror::Error;
use tracing::{debug, info};

use simple_sampler_core::{
    effects::VolumeLimiter,
    helpers::is_silent,
    sampler::{Sampler, SamplerEvent},
    sound::LoadSoundError,
    waveform::Waveform,
    AudioPipe, AudioStreamParams,
};

use crate::{config::SamplerRenderConfig, midi::MidiParseError, writer::AudioFileWriter};

/// Longest stretch of audio rendered in one go, in seconds.
const MAX_BATCH_SECS: f64 = 10.0;

/// Peak level below which the release tail counts as finished.
const SILENCE_THRESHOLD: f32 = 0.0001;

#[derive(Debug, Error)]
pub enum SamplerRenderError {
    #[error("Sample loading failed")]
    LoadSound(#[from] LoadSoundError),

    #[error("MIDI loading failed")]
    MidiParse(#[from] MidiParseError),

    #[error("Writing the audio file failed")]
    Wav(#[from] hound::Error),
}

struct BatchRenderElements {
    output_vec: Vec<f32>,
    missed_samples: f64,
}

/// Renders sampler events into an audio file, faster than realtime.
pub struct SamplerRender {
    config: SamplerRenderConfig,
    sampler: Sampler,
    audio_writer: AudioFileWriter,
    audio_params: AudioStreamParams,
    limiter: Option<VolumeLimiter>,
    render_elements: BatchRenderElements,
}

impl SamplerRender {
    pub fn new(config: SamplerRenderConfig, out_path: &Path) -> Result<Self, SamplerRenderError> {
        let audio_params = AudioStreamParams::new(config.sample_rate, config.audio_channels);
        let sampler = Sampler::new(audio_params, config.sampler);

        let audio_writer = AudioFileWriter::new(&config, out_path)?;

        let limiter = if config.use_limiter {
            Some(VolumeLimiter::new(config.audio_channels))
        } else {
            None
        };

        Ok(Self {
            config,
            sampler,
            audio_writer,
            audio_params,
            limiter,
            render_elements: BatchRenderElements {
                output_vec: vec![0.0],
                missed_samples: 0.0,
            },
        })
    }

    pub fn get_params(&self) -> AudioStreamParams {
        self.audio_params
    }

    /// Decodes `path` and makes it the sound of the sampler.
    pub fn load_sound(&mut self, path: &Path) -> Result<Waveform, SamplerRenderError> {
        Ok(self.sampler.load_file(path)?)
    }

    pub fn send_event(&mut self, event: SamplerEvent) {
        self.sampler.process_event(event);
    }

    /// Renders `event_time` seconds of audio and appends it to the file.
    pub fn render_batch(&mut self, event_time: f64) -> Result<(), SamplerRenderError> {
        if event_time > MAX_BATCH_SECS {
            let mut remaining_time = event_time;
            loop {
                if remaining_time > MAX_BATCH_SECS {
                    self.render_batch(MAX_BATCH_SECS)?;
                    remaining_time -= MAX_BATCH_SECS;
                } else {
                    return self.render_batch(remaining_time);
                }
            }
        }

        let samples =
            self.config.sample_rate as f64 * event_time + self.render_elements.missed_samples;
        self.render_elements.missed_samples = samples % 1.0;
        let samples = samples as usize * self.config.audio_channels.count() as usize;
        if samples == 0 {
            return Ok(());
        }

        self.render_elements.output_vec.clear();
        self.render_elements.output_vec.resize(samples, 0.0);
        self.sampler
            .read_samples(&mut self.render_elements.output_vec);

        if let Some(limiter) = &mut self.limiter {
            limiter.limit(&mut self.render_elements.output_vec);
        }

        self.audio_writer
            .write_samples(&mut self.render_elements.output_vec)?;
        Ok(())
    }

    /// Renders the release tails until they fall silent, then closes the file.
    pub fn finalize(mut self) -> Result<(), SamplerRenderError> {
        let chunk = self.config.sample_rate as usize * self.config.audio_channels.count() as usize;
        let max_chunks = self.config.max_tail_secs.max(0.0).ceil() as usize;

        let mut rendered = 0;
        while rendered < max_chunks {
            self.render_elements.output_vec.clear();
            self.render_elements.output_vec.resize(chunk, 0.0);
            self.sampler
                .read_samples(&mut self.render_elements.output_vec);

            if is_silent(&self.render_elements.output_vec, SILENCE_THRESHOLD) {
                break;
            }

            if let Some(limiter) = &mut self.limiter {
                limiter.limit(&mut self.render_elements.output_vec);
            }
            self.audio_writer
                .write_samples(&mut self.render_elements.output_vec)?;
            rendered += 1;
        }
        debug!(tail_secs = rendered, "rendered release tail");

        self.audio_writer.finalize()?;
        info!("render finished");
        Ok(())
    }

    pub fn voice_count(&self) -> u64 {
        self.sampler.voice_count() as u64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use simple_sampler_core::{
        sampler::SamplerAudioEvent,
        voice::AdsrParameters,
        ChannelCount,
    };

    fn write_sample(path: &Path, rate: u32, secs: f32) {
        let spec = hound::WavSpec {
            channels: 1,
            sample_rate: rate,
            bits_per_sample: 32,
            sample_format: hound::SampleFormat::Float,
        };
        let mut writer = hound::WavWriter::create(path, spec).unwrap();
        for _ in 0..(rate as f32 * secs) as usize {
            writer.write_sample(0.5f32).unwrap();
        }
        writer.finalize().unwrap();
    }

    fn config() -> SamplerRenderConfig {
        let mut config = SamplerRenderConfig {
            sample_rate: 1000,
            audio_channels: ChannelCount::Mono,
            use_limiter: false,
            ..Default::default()
        };
        config.sampler.envelope = AdsrParameters::new(0.0, 0.0, 1.0, 0.0);
        config
    }

    fn read_output(path: &Path) -> Vec<f32> {
        hound::WavReader::open(path)
            .unwrap()
            .samples::<f32>()
            .map(|s| s.unwrap())
            .collect()
    }

    #[test]
    fn renders_exact_frame_counts() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("out.wav");

        let config = SamplerRenderConfig {
            sample_rate: 1024,
            ..config()
        };

        // Half a frame each, carried over to the next batch
        let mut render = SamplerRender::new(config, &out).unwrap();
        render.render_batch(0.25).unwrap();
        render.render_batch(1.0 / 2048.0).unwrap();
        render.render_batch(1.0 / 2048.0).unwrap();
        render.finalize().unwrap();

        let reader = hound::WavReader::open(&out).unwrap();
        assert_eq!(reader.spec().channels, 1);
        assert_eq!(reader.spec().sample_rate, 1024);
        assert_eq!(reader.len(), 257);
    }

    #[test]
    fn renders_note_and_stops_after_tail() {
        let dir = tempfile::tempdir().unwrap();
        let sample = dir.path().join("sample.wav");
        let out = dir.path().join("out.wav");
        write_sample(&sample, 1000, 2.0);

        let mut render = SamplerRender::new(config(), &out).unwrap();
        render.load_sound(&sample).unwrap();

        render.send_event(SamplerAudioEvent::NoteOn { key: 60, vel: 127 }.into());
        render.render_batch(0.1).unwrap();
        assert_eq!(render.voice_count(), 1);

        render.send_event(SamplerAudioEvent::NoteOff { key: 60 }.into());
        render.finalize().unwrap();

        let samples = read_output(&out);
        assert!(samples.len() >= 100);
        assert!(samples[..100].iter().all(|s| (s - 0.5).abs() < 1e-3));
        assert!(samples.len() < 1100);
    }

    #[test]
    fn missing_sample_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("out.wav");

        let mut render = SamplerRender::new(config(), &out).unwrap();
        let result = render.load_sound(&dir.path().join("missing.wav"));
        assert!(matches!(result, Err(SamplerRenderError::LoadSound(_))));
    }
}
