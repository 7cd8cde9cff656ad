use std::{path::Path, sync::Arc};

use tracing::{debug, warn};

use crate::{
    sound::{LoadSoundError, SampledVoiceSpawner, SamplerSound, SoundInitOptions},
    voice::{AdsrParameter, AdsrParameters, VoiceControlData},
    waveform::Waveform,
    AudioPipe, AudioStreamParams, ChannelCount,
};

use self::voice_buffer::VoiceBuffer;

mod voice_buffer;

mod event;
pub use event::*;

mod info;
pub use info::*;

mod params;
pub use params::*;

struct ControlEventData {
    selected_lsb: i8,
    selected_msb: i8,
    pitch_bend_sensitivity_lsb: u8,
    pitch_bend_sensitivity_msb: u8,
    pitch_bend_sensitivity: f32,
    pitch_bend_value: f32,
    volume: f32, // 0.0 = silent, 1.0 = max volume
    pan: f32,    // 0.0 = left, 0.5 = center, 1.0 = right
    expression: f32,
}

impl ControlEventData {
    pub fn new_defaults() -> Self {
        ControlEventData {
            selected_lsb: -1,
            selected_msb: -1,
            pitch_bend_sensitivity_lsb: 0,
            pitch_bend_sensitivity_msb: 2,
            pitch_bend_sensitivity: 2.0,
            pitch_bend_value: 0.0,
            volume: 1.0,
            pan: 0.5,
            expression: 1.0,
        }
    }
}

/// A polyphonic sampler playing the loaded sound across the keyboard.
///
/// Every note starts a voice shaped by the current ADSR envelope. Notes,
/// controllers and configuration changes are applied through
/// [`Sampler::process_event`], or at exact frame offsets with
/// [`Sampler::render_block`].
pub struct Sampler {
    stream_params: AudioStreamParams,
    sound_options: SoundInitOptions,
    sounds: Vec<Arc<SamplerSound>>,
    envelope: AdsrParameters,

    voices: VoiceBuffer,
    stats: SamplerStats,

    /// The helper struct for keeping track of MIDI control event data
    control_event_data: ControlEventData,

    /// Processed control data, ready to feed to voices
    voice_control_data: VoiceControlData,
}

impl Sampler {
    pub fn new(stream_params: AudioStreamParams, config: SamplerConfig) -> Sampler {
        Sampler {
            stream_params,
            sound_options: config.sound_options,
            sounds: Vec::new(),
            envelope: config.envelope.clamped(),

            voices: VoiceBuffer::new(config.polyphony),
            stats: SamplerStats::new(),

            control_event_data: ControlEventData::new_defaults(),
            voice_control_data: VoiceControlData::new_defaults(),
        }
    }

    /// Replaces the loaded sounds. Voices already playing finish normally.
    pub fn set_sounds(&mut self, sounds: Vec<Arc<SamplerSound>>) {
        self.sounds = sounds;
        debug!(count = self.sounds.len(), "sounds replaced");
    }

    pub fn clear_sounds(&mut self) {
        self.set_sounds(Vec::new());
    }

    pub fn num_sounds(&self) -> usize {
        self.sounds.len()
    }

    pub fn sounds(&self) -> &[Arc<SamplerSound>] {
        &self.sounds
    }

    pub fn sound_options(&self) -> &SoundInitOptions {
        &self.sound_options
    }

    /// Decodes `path` and replaces the loaded sound with it.
    ///
    /// Decoding happens on the calling thread. On failure the previous sound
    /// stays loaded.
    pub fn load_file(&mut self, path: impl AsRef<Path>) -> Result<Waveform, LoadSoundError> {
        let path = path.as_ref();
        match SamplerSound::load(path, self.stream_params, self.sound_options) {
            Ok((sound, waveform)) => {
                self.set_sounds(vec![Arc::new(sound)]);
                Ok(waveform)
            }
            Err(err) => {
                warn!(path = ?path, error = %err, "failed to load sample, keeping the previous sound");
                Err(err)
            }
        }
    }

    pub fn envelope(&self) -> AdsrParameters {
        self.envelope
    }

    /// Sets the envelope of notes started from now on.
    pub fn set_envelope(&mut self, envelope: AdsrParameters) {
        self.envelope = envelope.clamped();
        debug!(envelope = ?self.envelope, "envelope changed");
    }

    pub fn set_envelope_parameter(&mut self, parameter: AdsrParameter, value: f32) {
        self.envelope.set(parameter, value);
        debug!(
            parameter = parameter.label(),
            value = self.envelope.get(parameter),
            "envelope parameter changed"
        );
    }

    pub fn polyphony(&self) -> usize {
        self.voices.max_voices()
    }

    pub fn set_polyphony(&mut self, polyphony: usize) {
        self.voices.set_max_voices(polyphony);
        debug!(polyphony = self.voices.max_voices(), "polyphony changed");
    }

    /// Switches the output format. Sounding voices are dropped.
    pub fn set_stream_params(&mut self, stream_params: AudioStreamParams) {
        if stream_params == self.stream_params {
            return;
        }
        self.voices.clear();
        self.stream_params = stream_params;
        self.stats.set_voice_count(0);
        debug!(
            sample_rate = stream_params.sample_rate,
            channels = stream_params.channels.count(),
            "stream parameters changed"
        );
    }

    pub fn set_sample_rate(&mut self, sample_rate: u32) {
        self.set_stream_params(AudioStreamParams::new(
            sample_rate,
            self.stream_params.channels,
        ));
    }

    pub fn get_stats(&self) -> SamplerStatsReader {
        SamplerStatsReader::new(self.stats.clone())
    }

    pub fn voice_count(&self) -> usize {
        self.voices.voice_count()
    }

    /// Clears `out` and renders it, applying every event at its frame offset.
    ///
    /// Events are applied in slice order. An event placed before the previous
    /// one, or past the end of the block, is moved forward to the nearest
    /// valid frame.
    pub fn render_block(&mut self, out: &mut [f32], events: &[TimedEvent]) {
        let channels = self.stream_params.channels.count() as usize;
        let frames = out.len() / channels;

        out.fill(0.0);

        let mut cursor = 0;
        for timed in events {
            let frame = timed.frame.clamp(cursor, frames);
            if frame > cursor {
                self.render_segment(&mut out[cursor * channels..frame * channels]);
                cursor = frame;
            }
            self.process_audio_event(timed.event.clone());
        }
        if cursor < frames {
            self.render_segment(&mut out[cursor * channels..frames * channels]);
        }

        self.voices.remove_ended_voices();
        self.stats.set_voice_count(self.voices.voice_count());
    }

    fn render_segment(&mut self, out: &mut [f32]) {
        self.voices.render_to(out);
        self.apply_channel_effects(out);
    }

    fn apply_channel_effects(&self, out: &mut [f32]) {
        let control = &self.control_event_data;

        // Volume
        let gain = control.volume * control.expression;
        if gain != 1.0 {
            for sample in out.iter_mut() {
                *sample *= gain;
            }
        }

        // Panning
        if self.stream_params.channels == ChannelCount::Stereo {
            let left = ((1.0 - control.pan) * 2.0).min(1.0);
            let right = (control.pan * 2.0).min(1.0);
            for frame in out.chunks_exact_mut(2) {
                frame[0] *= left;
                frame[1] *= right;
            }
        }
    }

    fn propagate_voice_controls(&mut self) {
        self.voices.process_controls(&self.voice_control_data);
    }

    fn start_note(&mut self, key: u8, vel: u8) {
        if vel == 0 {
            self.voices.release_key(key);
            return;
        }

        let control = self.voice_control_data;
        let mut new_voices = Vec::with_capacity(self.sounds.len());
        for sound in self.sounds.iter().filter(|s| s.applies_to_note(key)) {
            let envelope = self.envelope.to_envelope_params(
                self.stream_params.sample_rate,
                sound.options().linear_release,
            );
            let spawner = SampledVoiceSpawner::new(sound, key, vel, envelope, self.stream_params);
            new_voices.push(spawner.spawn_voice(&control));
        }

        if !new_voices.is_empty() {
            self.voices.push_voices(key, new_voices);
        }
    }

    fn set_envelope_from_controller(&mut self, parameter: AdsrParameter, value: u8) {
        self.set_envelope_parameter(parameter, parameter.from_midi_value(value));
    }

    pub fn process_control_event(&mut self, event: ControlEvent) {
        match event {
            ControlEvent::Raw(controller, value) => match controller {
                0x64 => {
                    self.control_event_data.selected_lsb = value as i8;
                }
                0x65 => {
                    self.control_event_data.selected_msb = value as i8;
                }
                0x06 | 0x26 => {
                    let data = &mut self.control_event_data;
                    if data.selected_lsb == 0 && data.selected_msb == 0 {
                        if controller == 0x06 {
                            data.pitch_bend_sensitivity_msb = value;
                        } else {
                            data.pitch_bend_sensitivity_lsb = value;
                        }

                        let sensitivity = (data.pitch_bend_sensitivity_msb as f32)
                            + (data.pitch_bend_sensitivity_lsb as f32) / 100.0;
                        self.process_control_event(ControlEvent::PitchBendSensitivity(sensitivity))
                    }
                }
                0x07 => {
                    // Volume
                    self.control_event_data.volume = value as f32 / 128.0;
                }
                0x0A => {
                    // Pan
                    self.control_event_data.pan = value as f32 / 128.0;
                }
                0x0B => {
                    // Expression
                    self.control_event_data.expression = value as f32 / 128.0;
                }
                0x40 => {
                    // Damper / Sustain
                    self.voices.set_damper(value >= 64);
                }
                0x48 => self.set_envelope_from_controller(AdsrParameter::Release, value),
                0x49 => self.set_envelope_from_controller(AdsrParameter::Attack, value),
                0x4B => self.set_envelope_from_controller(AdsrParameter::Decay, value),
                0x78 => {
                    // All Sounds Off
                    if value == 0 {
                        self.process_audio_event(SamplerAudioEvent::AllNotesKilled);
                    }
                }
                0x79 => {
                    // Reset All Controllers
                    if value == 0 {
                        self.reset_control();
                    }
                }
                0x7B => {
                    // All Notes Off
                    if value == 0 {
                        self.process_audio_event(SamplerAudioEvent::AllNotesOff);
                    }
                }
                _ => {}
            },
            ControlEvent::PitchBendSensitivity(sensitivity) => {
                let data = &mut self.control_event_data;
                data.pitch_bend_sensitivity = sensitivity;
                let pitch_bend = data.pitch_bend_sensitivity * data.pitch_bend_value;
                self.process_control_event(ControlEvent::PitchBend(pitch_bend));
            }
            ControlEvent::PitchBendValue(value) => {
                let data = &mut self.control_event_data;
                data.pitch_bend_value = value;
                let pitch_bend = data.pitch_bend_sensitivity * data.pitch_bend_value;
                self.process_control_event(ControlEvent::PitchBend(pitch_bend));
            }
            ControlEvent::PitchBend(value) => {
                self.voice_control_data.voice_pitch_multiplier = 2.0f32.powf(value / 12.0);
                self.propagate_voice_controls();
            }
        }
    }

    fn process_audio_event(&mut self, event: SamplerAudioEvent) {
        match event {
            SamplerAudioEvent::NoteOn { key, vel } => {
                if key < 128 {
                    self.start_note(key, vel);
                }
            }
            SamplerAudioEvent::NoteOff { key } => self.voices.release_key(key),
            SamplerAudioEvent::AllNotesOff => self.voices.release_all_voices(),
            SamplerAudioEvent::AllNotesKilled => self.voices.kill_all_voices(),
            SamplerAudioEvent::ResetControl => self.reset_control(),
            SamplerAudioEvent::Control(control) => self.process_control_event(control),
        }
    }

    fn process_config_event(&mut self, event: SamplerConfigEvent) {
        match event {
            SamplerConfigEvent::SetSounds(sounds) => self.set_sounds(sounds),
            SamplerConfigEvent::ClearSounds => self.clear_sounds(),
            SamplerConfigEvent::SetEnvelope(envelope) => self.set_envelope(envelope),
            SamplerConfigEvent::SetEnvelopeParameter(parameter, value) => {
                self.set_envelope_parameter(parameter, value)
            }
            SamplerConfigEvent::SetPolyphony(polyphony) => self.set_polyphony(polyphony),
        }
    }

    pub fn process_event(&mut self, event: SamplerEvent) {
        self.push_events_iter(std::iter::once(event));
    }

    pub fn push_events_iter<T: IntoIterator<Item = SamplerEvent>>(&mut self, iter: T) {
        for e in iter {
            match e {
                SamplerEvent::Audio(audio) => self.process_audio_event(audio),
                SamplerEvent::Config(config) => self.process_config_event(config),
            }
        }
    }

    fn reset_control(&mut self) {
        self.control_event_data = ControlEventData::new_defaults();
        self.voice_control_data = VoiceControlData::new_defaults();
        self.propagate_voice_controls();

        self.voices.set_damper(false);
    }
}

impl AudioPipe for Sampler {
    fn stream_params(&self) -> &AudioStreamParams {
        &self.stream_params
    }

    fn read_samples_unchecked(&mut self, out: &mut [f32]) {
        self.render_block(out, &[]);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{constant_channel, write_wav};

    const RATE: u32 = 100;

    fn instant_envelope() -> AdsrParameters {
        AdsrParameters::new(0.0, 0.0, 1.0, 0.0)
    }

    fn sampler(channels: ChannelCount) -> Sampler {
        let config = SamplerConfig {
            envelope: instant_envelope(),
            ..Default::default()
        };
        let mut sampler = Sampler::new(AudioStreamParams::new(RATE, channels), config);
        let sound = SamplerSound::new("ones", vec![constant_channel(1.0, 100)], RATE, Default::default());
        sampler.set_sounds(vec![Arc::new(sound)]);
        sampler
    }

    fn note_on(key: u8, vel: u8) -> SamplerEvent {
        SamplerAudioEvent::NoteOn { key, vel }.into()
    }

    fn note_off(key: u8) -> SamplerEvent {
        SamplerAudioEvent::NoteOff { key }.into()
    }

    fn cc(controller: u8, value: u8) -> SamplerEvent {
        SamplerAudioEvent::Control(ControlEvent::Raw(controller, value)).into()
    }

    fn render(sampler: &mut Sampler, len: usize) -> Vec<f32> {
        let mut out = vec![0.0; len];
        sampler.read_samples(&mut out);
        out
    }

    fn assert_all(values: &[f32], expected: f32) {
        for v in values {
            assert!((v - expected).abs() < 1e-5, "{values:?} != {expected}");
        }
    }

    #[test]
    fn note_on_plays_the_sample() {
        let mut sampler = sampler(ChannelCount::Mono);
        assert_all(&render(&mut sampler, 10), 0.0);

        sampler.process_event(note_on(60, 127));
        assert_all(&render(&mut sampler, 10), 1.0);
        assert_eq!(sampler.get_stats().voice_count(), 1);
    }

    #[test]
    fn note_off_ends_the_voice() {
        let mut sampler = sampler(ChannelCount::Mono);
        sampler.process_event(note_on(60, 127));
        render(&mut sampler, 10);

        sampler.process_event(note_off(60));
        assert_all(&render(&mut sampler, 10), 0.0);
        assert_eq!(sampler.get_stats().voice_count(), 0);
    }

    #[test]
    fn zero_velocity_is_a_note_off() {
        let mut sampler = sampler(ChannelCount::Mono);
        sampler.process_event(note_on(60, 127));
        render(&mut sampler, 10);

        sampler.process_event(note_on(60, 0));
        assert_all(&render(&mut sampler, 10), 0.0);
        assert_eq!(sampler.voice_count(), 0);
    }

    #[test]
    fn keys_without_sound_are_silent() {
        let mut sampler = sampler(ChannelCount::Mono);
        sampler.clear_sounds();
        sampler.process_event(note_on(60, 127));
        assert_all(&render(&mut sampler, 10), 0.0);
        assert_eq!(sampler.voice_count(), 0);
    }

    #[test]
    fn polyphony_is_limited() {
        let mut sampler = sampler(ChannelCount::Mono);
        assert_eq!(sampler.polyphony(), 3);
        for key in 60..65 {
            sampler.process_event(note_on(key, 127));
        }
        render(&mut sampler, 10);
        assert_eq!(sampler.get_stats().voice_count(), 3);

        sampler.process_event(SamplerConfigEvent::SetPolyphony(1).into());
        assert_eq!(sampler.voice_count(), 1);
    }

    #[test]
    fn retrigger_replaces_the_voice() {
        let mut sampler = sampler(ChannelCount::Mono);
        sampler.process_event(note_on(60, 127));
        render(&mut sampler, 10);
        sampler.process_event(note_on(60, 127));

        // The zero-length release ends the old voice right away.
        assert_all(&render(&mut sampler, 10), 1.0);
        assert_eq!(sampler.voice_count(), 1);
    }

    #[test]
    fn events_apply_at_their_frame() {
        let mut sampler = sampler(ChannelCount::Mono);
        let mut out = vec![0.0; 10];
        sampler.render_block(
            &mut out,
            &[TimedEvent::new(4, SamplerAudioEvent::NoteOn { key: 60, vel: 127 })],
        );
        assert_all(&out[..4], 0.0);
        assert_all(&out[4..], 1.0);

        sampler.render_block(
            &mut out,
            &[TimedEvent::new(7, SamplerAudioEvent::NoteOff { key: 60 })],
        );
        assert_all(&out[..7], 1.0);
        assert_all(&out[7..], 0.0);
    }

    #[test]
    fn late_events_are_clamped_into_the_block() {
        let mut sampler = sampler(ChannelCount::Stereo);
        let mut out = vec![0.0; 8];
        sampler.render_block(
            &mut out,
            &[
                TimedEvent::new(2, SamplerAudioEvent::NoteOn { key: 60, vel: 127 }),
                TimedEvent::new(1, SamplerAudioEvent::NoteOff { key: 60 }),
            ],
        );
        // The note-off lands on frame 2, right after the note-on.
        assert_all(&out, 0.0);

        sampler.render_block(
            &mut out,
            &[
                TimedEvent::new(0, SamplerAudioEvent::NoteOn { key: 60, vel: 127 }),
                TimedEvent::new(100, SamplerAudioEvent::NoteOff { key: 60 }),
            ],
        );
        assert_all(&out, 1.0);
        assert_eq!(sampler.voice_count(), 0);
    }

    #[test]
    fn damper_holds_released_notes() {
        let mut sampler = sampler(ChannelCount::Mono);
        sampler.process_event(cc(0x40, 127));
        sampler.process_event(note_on(60, 127));
        sampler.process_event(note_off(60));
        assert_all(&render(&mut sampler, 10), 1.0);

        sampler.process_event(cc(0x40, 0));
        assert_all(&render(&mut sampler, 10), 0.0);
    }

    #[test]
    fn volume_and_pan_controllers() {
        let mut sampler = sampler(ChannelCount::Stereo);
        sampler.process_event(note_on(60, 127));
        sampler.process_event(cc(0x07, 64));
        let out = render(&mut sampler, 4);
        assert_all(&out, 0.5);

        sampler.process_event(cc(0x0A, 0));
        let out = render(&mut sampler, 4);
        assert_all(&[out[0], out[2]], 0.5);
        assert_all(&[out[1], out[3]], 0.0);

        sampler.process_event(SamplerAudioEvent::ResetControl.into());
        assert_all(&render(&mut sampler, 4), 1.0);
    }

    #[test]
    fn controllers_set_envelope_times() {
        let mut sampler = sampler(ChannelCount::Mono);
        sampler.process_event(cc(0x49, 127));
        sampler.process_event(cc(0x48, 0));
        sampler.process_event(cc(0x4B, 127));

        let envelope = sampler.envelope();
        assert_eq!(envelope.attack, 2.0);
        assert_eq!(envelope.release, 0.0);
        assert_eq!(envelope.decay, 2.0);
    }

    #[test]
    fn envelope_changes_apply_to_new_notes() {
        let mut sampler = sampler(ChannelCount::Mono);
        sampler.process_event(note_on(60, 127));

        sampler.process_event(SamplerConfigEvent::SetEnvelopeParameter(AdsrParameter::Attack, 0.1).into());
        assert_eq!(sampler.envelope().attack, 0.1);
        assert_all(&render(&mut sampler, 10), 1.0);

        sampler.process_event(note_off(60));
        sampler.process_event(note_on(62, 127));
        let out = render(&mut sampler, 10);
        // Ten frame attack at 100Hz.
        assert_eq!(out[0], 0.0);
        assert!((out[5] - 0.5).abs() < 1e-5);
    }

    #[test]
    fn all_sound_off_kills_voices() {
        let mut sampler = sampler(ChannelCount::Mono);
        sampler.set_envelope(AdsrParameters::new(0.0, 0.0, 1.0, 2.0));
        sampler.process_event(note_on(60, 127));
        render(&mut sampler, 10);

        sampler.process_event(cc(0x78, 0));
        render(&mut sampler, 10);
        assert_eq!(sampler.voice_count(), 0);
    }

    #[test]
    fn all_notes_off_releases_voices() {
        let mut sampler = sampler(ChannelCount::Mono);
        sampler.set_envelope(AdsrParameters::new(0.0, 0.0, 1.0, 2.0));
        sampler.process_event(note_on(60, 127));
        sampler.process_event(note_on(64, 127));
        render(&mut sampler, 10);

        // Only a zero value is accepted.
        sampler.process_event(cc(0x7B, 1));
        assert_all(&render(&mut sampler, 4), 2.0);

        sampler.process_event(cc(0x7B, 0));
        let out = render(&mut sampler, 10);
        assert!(out[9] < out[0] && out[9] > 0.0);
        assert_eq!(sampler.voice_count(), 2);
    }

    #[test]
    fn reset_all_controllers_restores_defaults() {
        let mut sampler = sampler(ChannelCount::Mono);
        sampler.process_event(note_on(60, 127));
        sampler.process_event(cc(0x07, 64));
        assert_all(&render(&mut sampler, 4), 0.5);

        sampler.process_event(cc(0x79, 3));
        assert_all(&render(&mut sampler, 4), 0.5);

        sampler.process_event(cc(0x79, 0));
        assert_all(&render(&mut sampler, 4), 1.0);

        sampler.process_event(cc(0x40, 127));
        sampler.process_event(note_off(60));
        assert_all(&render(&mut sampler, 4), 1.0);

        // Lifting the damper ends the held note.
        sampler.process_event(cc(0x79, 0));
        assert_all(&render(&mut sampler, 4), 0.0);
        assert_eq!(sampler.voice_count(), 0);
    }

    #[test]
    fn pitch_bend_changes_playback_speed() {
        let mut sampler = sampler(ChannelCount::Mono);
        let ramp: Vec<f32> = (0..100).map(|i| i as f32 / 100.0).collect();
        let sound = SamplerSound::new("ramp", vec![ramp], RATE, Default::default());
        sampler.set_sounds(vec![Arc::new(sound)]);

        // Twelve semitone range, bent fully up doubles the speed.
        sampler.process_event(cc(0x65, 0));
        sampler.process_event(cc(0x64, 0));
        sampler.process_event(cc(0x06, 12));
        sampler.process_event(SamplerAudioEvent::Control(ControlEvent::PitchBendValue(1.0)).into());

        sampler.process_event(note_on(60, 127));
        let out = render(&mut sampler, 4);
        assert!((out[1] - 0.02).abs() < 1e-4);
        assert!((out[3] - 0.06).abs() < 1e-4);
    }

    #[test]
    fn sample_rate_change_drops_voices() {
        let mut sampler = sampler(ChannelCount::Mono);
        sampler.process_event(note_on(60, 127));
        render(&mut sampler, 10);

        sampler.set_sample_rate(200);
        assert_eq!(sampler.voice_count(), 0);
        assert_eq!(sampler.stream_params().sample_rate, 200);

        // Twice the output rate, so the sound plays at half speed.
        sampler.process_event(note_on(60, 127));
        assert_all(&render(&mut sampler, 10), 1.0);
    }

    #[test]
    fn failed_load_keeps_previous_sound() {
        let mut sampler = sampler(ChannelCount::Mono);
        assert!(sampler.load_file("/definitely/not/here.wav").is_err());
        assert_eq!(sampler.num_sounds(), 1);
        assert_eq!(sampler.sounds()[0].name(), "ones");
    }

    #[test]
    fn load_file_replaces_sound() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("Pad.wav");
        write_wav(&path, RATE, 1, 50);

        let mut sampler = sampler(ChannelCount::Mono);
        let waveform = sampler.load_file(&path).unwrap();
        assert_eq!(waveform.name(), "Pad");
        assert_eq!(waveform.len(), 50);
        assert_eq!(sampler.num_sounds(), 1);
        assert_eq!(sampler.sounds()[0].name(), "Pad");
    }
}
