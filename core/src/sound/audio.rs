use std::{
    fs::File,
    io,
    path::{Path, PathBuf},
};

use symphonia::core::formats::FormatOptions;
use symphonia::core::{audio::AudioBuffer, conv::IntoSample, probe::Hint, sample::Sample};
use symphonia::core::{audio::AudioBufferRef, meta::MetadataOptions};
use symphonia::core::{audio::Signal, io::MediaSourceStream};
use symphonia::core::{
    codecs::{CodecParameters, DecoderOptions},
    errors::Error,
};

use thiserror::Error;
use tracing::{debug, warn};

use crate::ChannelCount;

pub mod resample;

use self::resample::resample_channels;

/// File extensions accepted when a file is dropped onto the instrument.
pub const SUPPORTED_EXTENSIONS: [&str; 2] = ["wav", "mp3"];

#[derive(Debug, Error)]
pub enum AudioLoadError {
    #[error("IO Error")]
    IOError(#[from] io::Error),

    #[error("Audio decoding failed for {0}")]
    AudioDecodingFailed(PathBuf, #[source] Error),

    #[error("Audio file {0} has an invalid channel count ({1})")]
    InvalidChannelCount(PathBuf, usize),

    #[error("Audio file {0} has no tracks")]
    NoTracks(PathBuf),

    #[error("Audio file {0} contains no audio")]
    Empty(PathBuf),

    #[error("Audio file {0} does not report its sample rate")]
    UnknownSampleRate(PathBuf),

    #[error("Resampling failed: {0}")]
    ResampleFailed(String),
}

/// Returns true for the file types the drop target accepts (`.wav` and `.mp3`).
pub fn is_supported_audio_file(path: impl AsRef<Path>) -> bool {
    path.as_ref()
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| {
            SUPPORTED_EXTENSIONS
                .iter()
                .any(|supported| ext.eq_ignore_ascii_case(supported))
        })
        .unwrap_or(false)
}

/// Decoded audio file.
#[derive(Debug, Clone)]
pub struct DecodedAudio {
    /// Sample rate of the file.
    pub source_sample_rate: u32,

    /// Channels at the file's own sample rate, full length.
    pub source_channels: Vec<Vec<f32>>,

    /// Sample rate of `channels`.
    pub sample_rate: u32,

    /// Channels resampled to the requested rate, cut to the requested length.
    pub channels: Vec<Vec<f32>>,
}

impl DecodedAudio {
    pub fn channel_count(&self) -> ChannelCount {
        // Only mono and stereo files are accepted by the loader.
        if self.channels.len() == 1 {
            ChannelCount::Mono
        } else {
            ChannelCount::Stereo
        }
    }

    /// Length of the resampled channels, in frames.
    pub fn frames(&self) -> usize {
        self.channels.first().map(|c| c.len()).unwrap_or(0)
    }
}

fn track_sample_rate(params: &CodecParameters, path: &Path) -> Result<u32, AudioLoadError> {
    match params.sample_rate {
        Some(rate) if rate > 0 => Ok(rate),
        _ => Err(AudioLoadError::UnknownSampleRate(path.to_path_buf())),
    }
}

/// Decodes the default track of an audio file and resamples it to `new_sample_rate`.
///
/// With `max_length_secs`, only that much audio is resampled for playback.
/// `source_channels` always hold the whole file.
pub fn load_audio_file(
    path: impl AsRef<Path>,
    new_sample_rate: u32,
    max_length_secs: Option<f32>,
) -> Result<DecodedAudio, AudioLoadError> {
    let path = path.as_ref().to_path_buf();
    let extension = path.extension().and_then(|ext| ext.to_str());

    let file = Box::new(File::open(&path)?);

    let mss = MediaSourceStream::new(file, Default::default());

    // The extension lets symphonia try the matching reader first.
    let mut hint = Hint::new();
    if let Some(extension) = extension {
        hint.with_extension(extension);
    }

    let format_opts: FormatOptions = Default::default();
    let metadata_opts: MetadataOptions = Default::default();
    let decoder_opts: DecoderOptions = Default::default();

    let detected = symphonia::default::get_probe()
        .format(&hint, mss, &format_opts, &metadata_opts)
        .map_err(|x| AudioLoadError::AudioDecodingFailed(path.clone(), x))?;

    let mut format = detected.format;

    let track = format
        .default_track()
        .ok_or_else(|| AudioLoadError::NoTracks(path.clone()))?;

    let source_sample_rate = track_sample_rate(&track.codec_params, &path)?;

    let mut decoder = symphonia::default::get_codecs()
        .make(&track.codec_params, &decoder_opts)
        .map_err(|x| AudioLoadError::AudioDecodingFailed(path.clone(), x))?;

    let track_id = track.id;

    let mut builder = BuilderVecs::new();

    loop {
        let packet = match format.next_packet() {
            Err(Error::IoError(error)) if error.kind() == io::ErrorKind::UnexpectedEof => {
                // End of stream is reported as an EOF error.
                break;
            }
            Err(Error::ResetRequired) => {
                debug!(path = ?path, "track list changed, stopping decode");
                break;
            }
            Err(error) => return Err(AudioLoadError::AudioDecodingFailed(path.clone(), error)),
            Ok(packet) => packet,
        };

        if packet.track_id() != track_id {
            continue;
        }

        match decoder.decode(&packet) {
            Ok(audio_buf) => builder.push(audio_buf),
            Err(Error::DecodeError(err)) => {
                warn!(path = ?path, err, "skipping undecodable packet");
            }
            Err(e) => return Err(AudioLoadError::AudioDecodingFailed(path.clone(), e)),
        }
    }

    let source_channels = builder.finish();
    match source_channels.len() {
        0 => return Err(AudioLoadError::Empty(path)),
        1 | 2 => {}
        count => return Err(AudioLoadError::InvalidChannelCount(path, count)),
    }
    if source_channels[0].is_empty() {
        return Err(AudioLoadError::Empty(path));
    }

    let channels = match max_length_secs {
        Some(secs) => {
            let max_frames = (secs.max(0.0) as f64 * source_sample_rate as f64).ceil() as usize;
            let kept: Vec<Vec<f32>> = source_channels
                .iter()
                .map(|c| c[..c.len().min(max_frames)].to_vec())
                .collect();
            resample_channels(&kept, source_sample_rate, new_sample_rate)?
        }
        None => resample_channels(&source_channels, source_sample_rate, new_sample_rate)?,
    };

    debug!(
        path = ?path,
        source_sample_rate,
        sample_rate = new_sample_rate,
        channels = channels.len(),
        "decoded audio file"
    );

    Ok(DecodedAudio {
        source_sample_rate,
        source_channels,
        sample_rate: new_sample_rate,
        channels,
    })
}

/// Collects decoded packets into planar `f32` channels.
struct BuilderVecs {
    vecs: Vec<Vec<f32>>,
}

impl BuilderVecs {
    fn new() -> Self {
        Self { vecs: Vec::new() }
    }

    fn push(&mut self, buffer: AudioBufferRef) {
        match buffer {
            AudioBufferRef::U8(buf) => self.push_buffer(&buf),
            AudioBufferRef::U16(buf) => self.push_buffer(&buf),
            AudioBufferRef::U24(buf) => self.push_buffer(&buf),
            AudioBufferRef::U32(buf) => self.push_buffer(&buf),
            AudioBufferRef::S8(buf) => self.push_buffer(&buf),
            AudioBufferRef::S16(buf) => self.push_buffer(&buf),
            AudioBufferRef::S24(buf) => self.push_buffer(&buf),
            AudioBufferRef::S32(buf) => self.push_buffer(&buf),
            AudioBufferRef::F32(buf) => self.push_buffer(&buf),
            AudioBufferRef::F64(buf) => self.push_buffer(&buf),
        }
    }

    fn push_buffer(&mut self, buffer: &AudioBuffer<impl Sample + IntoSample<f32>>) {
        let channels = buffer.spec().channels.count();
        if self.vecs.len() < channels {
            self.vecs.resize_with(channels, Vec::new);
        }

        for c in 0..channels {
            let channel = buffer.chan(c);
            self.vecs[c].extend(channel.iter().map(|&sample| sample.into_sample()));
        }
    }

    fn finish(self) -> Vec<Vec<f32>> {
        let mut vecs = self.vecs;
        for chan in vecs.iter_mut() {
            chan.shrink_to_fit();
        }
        vecs
    }
}
