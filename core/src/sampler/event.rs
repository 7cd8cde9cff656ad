use std::sync::Arc;

use crate::{
    sound::SamplerSound,
    voice::{AdsrParameter, AdsrParameters},
};

#[derive(Debug, Clone)]
pub enum SamplerConfigEvent {
    /// Replaces the loaded sounds
    SetSounds(Vec<Arc<SamplerSound>>),
    /// Removes every sound. Voices already playing finish normally.
    ClearSounds,
    /// Sets all four envelope values for notes started afterwards
    SetEnvelope(AdsrParameters),
    /// Sets a single envelope value
    SetEnvelopeParameter(AdsrParameter, f32),
    /// Sets the maximum number of simultaneous voices
    SetPolyphony(usize),
}

#[derive(Debug, Clone, PartialEq)]
pub enum SamplerAudioEvent {
    /// Starts a new note voice. A velocity of 0 releases the key instead.
    NoteOn { key: u8, vel: u8 },
    /// Releases the voices of a key
    NoteOff { key: u8 },
    /// Releases all voices
    AllNotesOff,
    /// Kills all voices with a short fade
    AllNotesKilled,
    /// Resets every controller to its default
    ResetControl,
    /// Control event for the sampler
    Control(ControlEvent),
}

#[derive(Debug, Clone)]
pub enum SamplerEvent {
    /// Note and controller events
    Audio(SamplerAudioEvent),

    /// Configuration changes
    Config(SamplerConfigEvent),
}

impl From<SamplerAudioEvent> for SamplerEvent {
    fn from(event: SamplerAudioEvent) -> Self {
        SamplerEvent::Audio(event)
    }
}

impl From<SamplerConfigEvent> for SamplerEvent {
    fn from(event: SamplerConfigEvent) -> Self {
        SamplerEvent::Config(event)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ControlEvent {
    /// Raw MIDI controller number and value
    Raw(u8, u8),

    /// The pitch bend range, in semitones
    PitchBendSensitivity(f32),

    /// The pitch bend value, between -1 and 1
    PitchBendValue(f32),

    /// The pitch bend in semitones, product of value * sensitivity
    PitchBend(f32),
}

/// An audio event placed at a frame offset inside a render block.
#[derive(Debug, Clone, PartialEq)]
pub struct TimedEvent {
    pub frame: usize,
    pub event: SamplerAudioEvent,
}

impl TimedEvent {
    pub fn new(frame: usize, event: SamplerAudioEvent) -> Self {
        Self { frame, event }
    }
}
