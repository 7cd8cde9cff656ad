use std::{
    path::Path,
    sync::{Arc, Mutex},
};

use cpal::{
    traits::{DeviceTrait, HostTrait, StreamTrait},
    BuildStreamError, DefaultStreamConfigError, Device, FromSample, PauseStreamError,
    PlayStreamError, SizedSample, Stream, SupportedStreamConfig, SupportedStreamConfigsError,
};
use crossbeam_channel::unbounded;
use thiserror::Error;
use tracing::{error, info};

use simple_sampler_core::{
    buffered_renderer::{BufferedRenderer, BufferedRendererStatsReader},
    effects::VolumeLimiter,
    helpers::prepare_cache_vec,
    sampler::{Sampler, SamplerConfigEvent, SamplerEvent, SamplerStatsReader},
    sound::{LoadSoundError, SamplerSound, SoundInitOptions},
    voice::{AdsrParameter, AdsrParameters},
    waveform::Waveform,
    AudioPipe, AudioStreamParams, ChannelCount, FunctionAudioPipe,
};

use crate::{RealtimeEventSender, RealtimeSamplerConfig};

#[derive(Debug, Error)]
pub enum RealtimeError {
    #[error("No audio output device found")]
    NoOutputDevice,

    #[error("Failed to query the default output config")]
    DefaultStreamConfig(#[from] DefaultStreamConfigError),

    #[error("Failed to query the supported output configs")]
    SupportedStreamConfigs(#[from] SupportedStreamConfigsError),

    #[error("The output device has no mono or stereo layout ({0} channels)")]
    UnsupportedChannelCount(u16),

    #[error("Unsupported output sample format {0:?}")]
    UnsupportedSampleFormat(cpal::SampleFormat),

    #[error("Failed to build the output stream")]
    BuildStream(#[from] BuildStreamError),

    #[error("Failed to start the output stream")]
    PlayStream(#[from] PlayStreamError),
}

pub struct RealtimeSamplerStatsReader {
    buffered_stats: BufferedRendererStatsReader,
    sampler_stats: SamplerStatsReader,
}

impl RealtimeSamplerStatsReader {
    pub(self) fn new(
        sampler_stats: SamplerStatsReader,
        buffered_stats: BufferedRendererStatsReader,
    ) -> RealtimeSamplerStatsReader {
        RealtimeSamplerStatsReader {
            sampler_stats,
            buffered_stats,
        }
    }

    /// The number of active voices.
    pub fn voice_count(&self) -> u64 {
        self.sampler_stats.voice_count()
    }

    /// Statistics of the render buffer.
    pub fn buffer(&self) -> &BufferedRendererStatsReader {
        &self.buffered_stats
    }
}

/// The sampler playing live through an audio output device.
///
/// The sampler itself lives on the render thread. Notes, controls and new
/// sounds reach it through a [`RealtimeEventSender`].
pub struct RealtimeSampler {
    buffered_renderer: Arc<Mutex<BufferedRenderer>>,

    stream: Stream,

    event_sender: RealtimeEventSender,

    stats: SamplerStatsReader,

    stream_params: AudioStreamParams,

    sound_options: SoundInitOptions,
}

impl RealtimeSampler {
    /// Opens the sampler on the default output device with default options.
    pub fn open_with_all_defaults() -> Result<Self, RealtimeError> {
        Self::open_with_default_output(Default::default())
    }

    /// Opens the sampler on the default output device of the default host.
    pub fn open_with_default_output(config: RealtimeSamplerConfig) -> Result<Self, RealtimeError> {
        let host = cpal::default_host();

        let device = host
            .default_output_device()
            .ok_or(RealtimeError::NoOutputDevice)?;
        info!(
            device = %device.name().unwrap_or_else(|_| "unknown".into()),
            "selected output device"
        );

        let stream_config = preferred_output_config(&device)?;

        Self::open(config, &device, stream_config)
    }

    pub fn open(
        config: RealtimeSamplerConfig,
        device: &Device,
        stream_config: SupportedStreamConfig,
    ) -> Result<Self, RealtimeError> {
        let sample_rate = stream_config.sample_rate().0;
        let channels = ChannelCount::from_count(stream_config.channels())
            .ok_or(RealtimeError::UnsupportedChannelCount(stream_config.channels()))?;
        let stream_params = AudioStreamParams::new(sample_rate, channels);

        let mut sampler = Sampler::new(stream_params, config.sampler);
        let stats = sampler.get_stats();

        let (event_sender, event_receiver) = unbounded::<SamplerEvent>();

        let render = FunctionAudioPipe::new(stream_params, move |out| {
            sampler.push_events_iter(event_receiver.try_iter());
            sampler.read_samples(out);
        });

        let buffered = Arc::new(Mutex::new(BufferedRenderer::new(
            render,
            stream_params,
            config.render_window_frames(sample_rate),
        )));

        fn build_stream<T: SizedSample + FromSample<f32>>(
            device: &Device,
            stream_config: SupportedStreamConfig,
            buffered: Arc<Mutex<BufferedRenderer>>,
            mut limiter: Option<VolumeLimiter>,
        ) -> Result<Stream, BuildStreamError> {
            let err_fn = |err: cpal::StreamError| error!(%err, "an error occurred on the output stream");
            let mut output_vec = Vec::new();

            device.build_output_stream(
                &stream_config.into(),
                move |data: &mut [T], _: &cpal::OutputCallbackInfo| {
                    prepare_cache_vec(&mut output_vec, data.len(), 0.0);
                    if let Ok(mut buffered) = buffered.lock() {
                        buffered.read(&mut output_vec);
                    }
                    if let Some(limiter) = limiter.as_mut() {
                        limiter.limit(&mut output_vec);
                    }
                    for (out, sample) in data.iter_mut().zip(output_vec.iter()) {
                        *out = T::from_sample(*sample);
                    }
                },
                err_fn,
                None,
            )
        }

        let limiter = config.use_limiter.then(|| VolumeLimiter::new(channels));
        let stream = match stream_config.sample_format() {
            cpal::SampleFormat::F32 => {
                build_stream::<f32>(device, stream_config, buffered.clone(), limiter)?
            }
            cpal::SampleFormat::I16 => {
                build_stream::<i16>(device, stream_config, buffered.clone(), limiter)?
            }
            cpal::SampleFormat::U16 => {
                build_stream::<u16>(device, stream_config, buffered.clone(), limiter)?
            }
            format => return Err(RealtimeError::UnsupportedSampleFormat(format)),
        };

        stream.play()?;

        info!(
            sample_rate,
            channels = channels.count(),
            render_window_ms = config.render_window_ms,
            "realtime sampler started"
        );

        Ok(Self {
            buffered_renderer: buffered,

            event_sender: RealtimeEventSender::new(event_sender),
            stream,
            stats,
            stream_params,
            sound_options: config.sampler.sound_options,
        })
    }

    pub fn send_event(&self, event: SamplerEvent) {
        self.event_sender.send_event(event);
    }

    pub fn get_sender_ref(&self) -> &RealtimeEventSender {
        &self.event_sender
    }

    pub fn get_senders(&self) -> RealtimeEventSender {
        self.event_sender.clone()
    }

    /// Decodes `path` on the calling thread and hands the sound to the sampler.
    ///
    /// Returns the display waveform. On failure the previous sound keeps playing.
    pub fn load_sound(&self, path: impl AsRef<Path>) -> Result<Waveform, LoadSoundError> {
        let (sound, waveform) =
            SamplerSound::load(path.as_ref(), self.stream_params, self.sound_options)?;

        self.event_sender
            .send_config(SamplerConfigEvent::SetSounds(vec![Arc::new(sound)]));
        Ok(waveform)
    }

    pub fn set_envelope(&self, envelope: AdsrParameters) {
        self.event_sender
            .send_config(SamplerConfigEvent::SetEnvelope(envelope));
    }

    pub fn set_envelope_parameter(&self, parameter: AdsrParameter, value: f32) {
        self.event_sender
            .send_config(SamplerConfigEvent::SetEnvelopeParameter(parameter, value));
    }

    pub fn set_polyphony(&self, polyphony: usize) {
        self.event_sender
            .send_config(SamplerConfigEvent::SetPolyphony(polyphony));
    }

    pub fn get_stats(&self) -> RealtimeSamplerStatsReader {
        let buffered_stats = match self.buffered_renderer.lock() {
            Ok(buffered) => buffered.get_buffer_stats(),
            Err(poisoned) => poisoned.into_inner().get_buffer_stats(),
        };

        RealtimeSamplerStatsReader::new(self.stats.clone(), buffered_stats)
    }

    pub fn stream_params(&self) -> &AudioStreamParams {
        &self.stream_params
    }

    pub fn pause(&mut self) -> Result<(), PauseStreamError> {
        self.stream.pause()
    }

    pub fn resume(&mut self) -> Result<(), PlayStreamError> {
        self.stream.play()
    }
}

/// The device's default output config, or a mono/stereo config at the same
/// rate when the default layout has more channels.
fn preferred_output_config(device: &Device) -> Result<SupportedStreamConfig, RealtimeError> {
    let default = device.default_output_config()?;
    if ChannelCount::from_count(default.channels()).is_some() {
        return Ok(default);
    }

    let sample_rate = default.sample_rate();
    device
        .supported_output_configs()?
        .filter(|range| ChannelCount::from_count(range.channels()).is_some())
        .filter(|range| range.min_sample_rate() <= sample_rate && sample_rate <= range.max_sample_rate())
        .max_by_key(|range| range.channels())
        .map(|range| range.with_sample_rate(sample_rate))
        .ok_or(RealtimeError::UnsupportedChannelCount(default.channels()))
}
