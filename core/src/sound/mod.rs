use std::{
    ops::RangeInclusive,
    path::Path,
    sync::Arc,
};

use thiserror::Error;
use tracing::info;

use crate::{helpers::speed_mult_from_keys, waveform::Waveform, AudioStreamParams};

pub mod audio;
pub use audio::{is_supported_audio_file, load_audio_file, AudioLoadError, DecodedAudio};

mod config;
pub use config::*;

mod voice_spawner;
pub use voice_spawner::*;

#[derive(Debug, Error)]
pub enum LoadSoundError {
    #[error("Failed to load audio file")]
    AudioLoadError(#[from] AudioLoadError),
}

/// A sample mapped across the keyboard.
///
/// Holds one or two channels of audio at `sample_rate`. Mono sounds play the
/// same channel on both sides.
#[derive(Debug)]
pub struct SamplerSound {
    name: String,
    channels: Arc<[Arc<[f32]>]>,
    sample_rate: u32,
    root_note: u8,
    keys: RangeInclusive<u8>,
    options: SoundInitOptions,
}

impl SamplerSound {
    /// Builds a sound from planar channels. Audio longer than
    /// `options.max_sample_length_secs` is cut off.
    pub fn new(
        name: impl Into<String>,
        channels: Vec<Vec<f32>>,
        sample_rate: u32,
        options: SoundInitOptions,
    ) -> Self {
        let max_len = (options.max_sample_length_secs.max(0.0) as f64 * sample_rate as f64) as usize;

        let channels: Arc<[Arc<[f32]>]> = channels
            .into_iter()
            .take(2)
            .map(|mut channel| {
                channel.truncate(max_len);
                Arc::<[f32]>::from(channel)
            })
            .collect();

        SamplerSound {
            name: name.into(),
            channels,
            sample_rate,
            root_note: options.root_note.min(127),
            keys: 0..=127,
            options,
        }
    }

    /// Decodes `path` at the stream's sample rate.
    ///
    /// Returns the sound, named after the file stem, and the display waveform
    /// built from the file's first channel.
    pub fn load(
        path: impl AsRef<Path>,
        stream_params: AudioStreamParams,
        options: SoundInitOptions,
    ) -> Result<(SamplerSound, Waveform), LoadSoundError> {
        let path = path.as_ref();
        let decoded = load_audio_file(
            path,
            stream_params.sample_rate,
            Some(options.max_sample_length_secs),
        )?;

        let name = display_name(path);
        let waveform = Waveform::from_decoded(&name, &decoded);
        let sound = SamplerSound::new(name, decoded.channels, decoded.sample_rate, options);

        info!(
            path = ?path,
            name = sound.name(),
            frames = sound.len(),
            channels = sound.channel_count(),
            "loaded sample"
        );

        Ok((sound, waveform))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn root_note(&self) -> u8 {
        self.root_note
    }

    pub fn options(&self) -> &SoundInitOptions {
        &self.options
    }

    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }

    /// Length in frames.
    pub fn len(&self) -> usize {
        self.channels.first().map(|c| c.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn applies_to_note(&self, key: u8) -> bool {
        self.keys.contains(&key) && !self.is_empty()
    }

    /// Playback speed for `key` when rendering at `output_sample_rate`.
    pub fn speed_multiplier(&self, key: u8, output_sample_rate: u32) -> f32 {
        let rate_fac = self.sample_rate as f32 / output_sample_rate.max(1) as f32;
        speed_mult_from_keys(key, self.root_note) * rate_fac
    }

    /// Left and right channel data.
    pub fn stereo_channels(&self) -> (Arc<[f32]>, Arc<[f32]>) {
        let left = self
            .channels
            .first()
            .cloned()
            .unwrap_or_else(|| Arc::from(Vec::new()));
        let right = self.channels.get(1).cloned().unwrap_or_else(|| left.clone());
        (left, right)
    }
}

/// The file name without its extension.
pub fn display_name(path: &Path) -> String {
    path.file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{test_utils::write_wav, ChannelCount};

    #[test]
    fn truncates_to_max_length() {
        let options = SoundInitOptions {
            max_sample_length_secs: 0.5,
            ..Default::default()
        };
        let sound = SamplerSound::new("long", vec![vec![0.0; 100]], 100, options);
        assert_eq!(sound.len(), 50);
    }

    #[test]
    fn mono_plays_on_both_sides() {
        let sound = SamplerSound::new("mono", vec![vec![1.0, 2.0]], 100, Default::default());
        let (left, right) = sound.stereo_channels();
        assert_eq!(&*left, &*right);
        assert_eq!(sound.channel_count(), 1);
    }

    #[test]
    fn root_note_plays_at_recorded_speed() {
        let sound = SamplerSound::new("s", vec![vec![0.0; 10]], 48000, Default::default());
        assert_eq!(sound.speed_multiplier(60, 48000), 1.0);
        assert!((sound.speed_multiplier(72, 48000) - 2.0).abs() < 1e-4);
        assert!((sound.speed_multiplier(60, 96000) - 0.5).abs() < 1e-6);
    }

    #[test]
    fn covers_every_key() {
        let sound = SamplerSound::new("s", vec![vec![0.0; 10]], 48000, Default::default());
        assert!(sound.applies_to_note(0));
        assert!(sound.applies_to_note(127));

        let empty = SamplerSound::new("e", vec![Vec::new()], 48000, Default::default());
        assert!(!empty.applies_to_note(60));
    }

    #[test]
    fn display_name_drops_extension() {
        assert_eq!(display_name(Path::new("/samples/Kick 01.wav")), "Kick 01");
        assert_eq!(display_name(Path::new("snare.final.mp3")), "snare.final");
    }

    #[test]
    fn loads_sound_and_waveform_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("Piano C4.wav");
        write_wav(&path, 44100, 2, 441);

        let params = AudioStreamParams::new(44100, ChannelCount::Stereo);
        let (sound, waveform) = SamplerSound::load(&path, params, Default::default()).unwrap();

        assert_eq!(sound.name(), "Piano C4");
        assert_eq!(sound.len(), 441);
        assert_eq!(sound.channel_count(), 2);
        assert_eq!(waveform.name(), "Piano C4");
        assert_eq!(waveform.len(), 441);
    }
}
