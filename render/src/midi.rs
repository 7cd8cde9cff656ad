//! Standard MIDI file loading.
//!
//! Flattens all tracks into one list of sampler events with absolute times
//! in seconds, following the file's tempo map.

use std::{fs, io, path::Path};

use midly::{Format, MetaMessage, MidiMessage, Smf, Timing, TrackEventKind};
use thiserror::Error;
use tracing::debug;

use simple_sampler_core::sampler::{ControlEvent, SamplerAudioEvent};

/// Tempo of a file without tempo events, in microseconds per beat.
const DEFAULT_TEMPO: u32 = 500_000;

#[derive(Debug, Error)]
pub enum MidiParseError {
    #[error("Failed to read the MIDI file")]
    Io(#[from] io::Error),

    #[error("Invalid MIDI file: {0}")]
    Parse(#[from] midly::Error),
}

#[derive(Debug, Clone, PartialEq)]
pub struct TimedMidiEvent {
    /// Seconds from the start of the file
    pub time: f64,
    pub event: SamplerAudioEvent,
}

#[derive(Debug, Clone, Default)]
pub struct MidiSequence {
    /// Events sorted by time
    pub events: Vec<TimedMidiEvent>,
    /// Time of the last event in the file, including end of track markers
    pub length_secs: f64,
}

pub fn parse_midi_file(path: impl AsRef<Path>) -> Result<MidiSequence, MidiParseError> {
    let bytes = fs::read(path)?;
    parse_midi_bytes(&bytes)
}

enum RawEvent {
    Tempo(u32),
    Audio(SamplerAudioEvent),
    Other,
}

fn convert_message(message: MidiMessage) -> Option<SamplerAudioEvent> {
    match message {
        MidiMessage::NoteOn { key, vel } if vel.as_int() == 0 => {
            Some(SamplerAudioEvent::NoteOff { key: key.as_int() })
        }
        MidiMessage::NoteOn { key, vel } => Some(SamplerAudioEvent::NoteOn {
            key: key.as_int(),
            vel: vel.as_int(),
        }),
        MidiMessage::NoteOff { key, .. } => Some(SamplerAudioEvent::NoteOff { key: key.as_int() }),
        MidiMessage::Controller { controller, value } => Some(SamplerAudioEvent::Control(
            ControlEvent::Raw(controller.as_int(), value.as_int()),
        )),
        MidiMessage::PitchBend { bend } => Some(SamplerAudioEvent::Control(
            ControlEvent::PitchBendValue(bend.as_int() as f32 / 8192.0),
        )),
        _ => None,
    }
}

pub fn parse_midi_bytes(bytes: &[u8]) -> Result<MidiSequence, MidiParseError> {
    let smf = Smf::parse(bytes)?;

    // (tick, event), in track order
    let mut raw = Vec::new();
    let mut track_offset = 0u64;
    for track in smf.tracks.iter() {
        let mut tick = track_offset;
        for event in track.iter() {
            tick += event.delta.as_int() as u64;
            let kind = match event.kind {
                TrackEventKind::Meta(MetaMessage::Tempo(tempo)) => RawEvent::Tempo(tempo.as_int()),
                TrackEventKind::Midi { message, .. } => match convert_message(message) {
                    Some(event) => RawEvent::Audio(event),
                    None => RawEvent::Other,
                },
                _ => RawEvent::Other,
            };
            raw.push((tick, kind));
        }
        if smf.header.format == Format::Sequential {
            track_offset = tick;
        }
    }
    raw.sort_by_key(|(tick, _)| *tick);

    let mut sequence = MidiSequence::default();
    let mut tempo = DEFAULT_TEMPO;
    let mut time = 0.0;
    let mut last_tick = 0u64;

    for (tick, kind) in raw {
        let delta = (tick - last_tick) as f64;
        last_tick = tick;

        time += match smf.header.timing {
            Timing::Metrical(ppq) => {
                delta * tempo as f64 / 1_000_000.0 / ppq.as_int().max(1) as f64
            }
            Timing::Timecode(fps, subframes) => {
                delta / (fps.as_f32() as f64 * subframes.max(1) as f64)
            }
        };

        match kind {
            RawEvent::Tempo(t) => tempo = t,
            RawEvent::Audio(event) => sequence.events.push(TimedMidiEvent { time, event }),
            RawEvent::Other => {}
        }
    }
    sequence.length_secs = time;

    debug!(
        tracks = smf.tracks.len(),
        events = sequence.events.len(),
        length_secs = sequence.length_secs,
        "parsed MIDI file"
    );

    Ok(sequence)
}
