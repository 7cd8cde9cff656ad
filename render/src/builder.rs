use crate::{
    config::SamplerRenderConfig,
    midi::parse_midi_file,
    SamplerRender, SamplerRenderError,
};

use std::path::Path;

use simple_sampler_core::{
    sampler::SamplerAudioEvent,
    sound::Interpolator,
    voice::AdsrParameters,
    ChannelCount,
};

pub struct SamplerRenderStats {
    /// Seconds of MIDI rendered so far
    pub progress: f64,
    /// Length of the MIDI file in seconds
    pub length: f64,
    pub voice_count: u64,
}

pub struct SamplerRenderBuilder<'a, StatsCallback: FnMut(SamplerRenderStats)> {
    config: SamplerRenderConfig,
    sample_path: &'a Path,
    midi_path: &'a Path,
    out_path: &'a Path,
    stats_callback: StatsCallback,
}

/// Renders `midi_path` with the sound in `sample_path` into `out_path`.
pub fn sampler_renderer<'a>(
    sample_path: &'a Path,
    midi_path: &'a Path,
    out_path: &'a Path,
) -> SamplerRenderBuilder<'a, impl FnMut(SamplerRenderStats)> {
    SamplerRenderBuilder {
        config: SamplerRenderConfig::default(),
        sample_path,
        midi_path,
        out_path,
        stats_callback: |_| {},
    }
}

impl<'a, ProgressCallback: FnMut(SamplerRenderStats)> SamplerRenderBuilder<'a, ProgressCallback> {
    // Config functions
    pub fn with_config(mut self, config: SamplerRenderConfig) -> Self {
        self.config = config;
        self
    }

    pub fn use_limiter(mut self, use_limiter: bool) -> Self {
        self.config.use_limiter = use_limiter;
        self
    }

    pub fn with_sample_rate(mut self, sample_rate: u32) -> Self {
        self.config.sample_rate = sample_rate;
        self
    }

    pub fn with_audio_channels(mut self, audio_channels: ChannelCount) -> Self {
        self.config.audio_channels = audio_channels;
        self
    }

    pub fn with_polyphony(mut self, polyphony: usize) -> Self {
        self.config.sampler.polyphony = polyphony;
        self
    }

    pub fn with_envelope(mut self, envelope: AdsrParameters) -> Self {
        self.config.sampler.envelope = envelope;
        self
    }

    pub fn with_interpolator(mut self, interpolator: Interpolator) -> Self {
        self.config.sampler.sound_options.interpolator = interpolator;
        self
    }

    pub fn trim_leading_silence(mut self, trim: bool) -> Self {
        self.config.trim_leading_silence = trim;
        self
    }

    pub fn with_progress_callback<F: FnMut(SamplerRenderStats)>(
        self,
        stats_callback: F,
    ) -> SamplerRenderBuilder<'a, F> {
        SamplerRenderBuilder {
            config: self.config,
            sample_path: self.sample_path,
            midi_path: self.midi_path,
            out_path: self.out_path,
            stats_callback,
        }
    }

    pub fn run(mut self) -> Result<(), SamplerRenderError> {
        let sequence = parse_midi_file(self.midi_path)?;

        let mut sampler = SamplerRender::new(self.config, self.out_path)?;
        sampler.load_sound(self.sample_path)?;

        let mut pos: f64 = 0.0;
        for e in sequence.events {
            let delta = e.time - pos;
            if delta > 0.0 {
                sampler.render_batch(delta)?;
                pos = e.time;
                (self.stats_callback)(SamplerRenderStats {
                    progress: pos,
                    length: sequence.length_secs,
                    voice_count: sampler.voice_count(),
                });
            }
            sampler.send_event(e.event.into());
        }

        if sequence.length_secs > pos {
            sampler.render_batch(sequence.length_secs - pos)?;
        }
        (self.stats_callback)(SamplerRenderStats {
            progress: sequence.length_secs,
            length: sequence.length_secs,
            voice_count: sampler.voice_count(),
        });

        sampler.send_event(SamplerAudioEvent::AllNotesOff.into());
        sampler.send_event(SamplerAudioEvent::ResetControl.into());
        sampler.finalize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn renders_midi_file_with_sample() {
        let dir = tempfile::tempdir().unwrap();
        let sample = dir.path().join("sample.wav");
        let midi = dir.path().join("song.mid");
        let out = dir.path().join("out.wav");

        let spec = hound::WavSpec {
            channels: 1,
            sample_rate: 1000,
            bits_per_sample: 32,
            sample_format: hound::SampleFormat::Float,
        };
        let mut writer = hound::WavWriter::create(&sample, spec).unwrap();
        for _ in 0..2000 {
            writer.write_sample(0.5f32).unwrap();
        }
        writer.finalize().unwrap();

        let mut bytes = b"MThd\x00\x00\x00\x06\x00\x00\x00\x01\x01\xE0MTrk\x00\x00\x00\x14".to_vec();
        bytes.extend_from_slice(&[
            0x00, 0xFF, 0x51, 0x03, 0x07, 0xA1, 0x20, 0x00, 0x90, 0x3C, 0x64, 0x83, 0x60, 0x80,
            0x3C, 0x00, 0x00, 0xFF, 0x2F, 0x00,
        ]);
        fs::write(&midi, bytes).unwrap();

        let mut progress = Vec::new();
        sampler_renderer(&sample, &midi, &out)
            .with_sample_rate(1000)
            .with_audio_channels(ChannelCount::Mono)
            .with_envelope(AdsrParameters::new(0.0, 0.0, 1.0, 0.0))
            .use_limiter(false)
            .with_progress_callback(|stats| progress.push(stats.progress))
            .run()
            .unwrap();

        assert_eq!(progress.last().copied(), Some(0.5));

        let samples: Vec<f32> = hound::WavReader::open(&out)
            .unwrap()
            .samples::<f32>()
            .map(|s| s.unwrap())
            .collect();
        assert_eq!(samples.len(), 500);
        let gain = 100.0 / 127.0;
        assert!(samples.iter().all(|s| (s - 0.5 * gain).abs() < 1e-3));
    }

    #[test]
    fn builder_writes_float_wav() {
        let path = Path::new("unused");
        let builder = sampler_renderer(path, path, path)
            .with_sample_rate(22050)
            .with_polyphony(4);
        assert_eq!(
            builder.config.audio_format,
            crate::config::SamplerRenderAudioFormat::Wav
        );
        assert_eq!(builder.config.sample_rate, 22050);
        assert_eq!(builder.config.sampler.polyphony, 4);
    }
}
