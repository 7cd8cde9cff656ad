use crossbeam_channel::Sender;

use simple_sampler_core::sampler::{
    ControlEvent, SamplerAudioEvent, SamplerConfigEvent, SamplerEvent,
};

/// Decodes a raw MIDI channel message into a sampler event.
///
/// Note-on with a velocity of 0 is treated as a note-off. The MIDI channel is
/// ignored, the sampler listens on all of them. Messages the sampler has no
/// use for return `None`.
pub fn parse_midi_message(message: &[u8]) -> Option<SamplerAudioEvent> {
    let status = *message.first()?;
    let data1 = message.get(1).map(|v| v & 0x7F);
    let data2 = message.get(2).map(|v| v & 0x7F);

    match status >> 4 {
        0x8 => Some(SamplerAudioEvent::NoteOff { key: data1? }),
        0x9 => {
            let key = data1?;
            match data2? {
                0 => Some(SamplerAudioEvent::NoteOff { key }),
                vel => Some(SamplerAudioEvent::NoteOn { key, vel }),
            }
        }
        0xB => Some(SamplerAudioEvent::Control(ControlEvent::Raw(data1?, data2?))),
        0xE => {
            let value = (((data2? as i16) << 7) | data1? as i16) - 8192;
            let value = value as f32 / 8192.0;
            Some(SamplerAudioEvent::Control(ControlEvent::PitchBendValue(
                value,
            )))
        }
        _ => None,
    }
}

/// A helper object to send events to the realtime sampler.
///
/// Events are queued and applied by the render thread before it renders the
/// next window of audio.
#[derive(Clone)]
pub struct RealtimeEventSender {
    sender: Sender<SamplerEvent>,
}

impl RealtimeEventSender {
    pub(super) fn new(sender: Sender<SamplerEvent>) -> RealtimeEventSender {
        RealtimeEventSender { sender }
    }

    /// Sends a SamplerEvent to the realtime sampler.
    pub fn send_event(&self, event: SamplerEvent) {
        // The receiver only goes away together with the sampler.
        self.sender.send(event).ok();
    }

    pub fn send_audio(&self, event: SamplerAudioEvent) {
        self.send_event(SamplerEvent::Audio(event));
    }

    pub fn send_config(&self, event: SamplerConfigEvent) {
        self.send_event(SamplerEvent::Config(event));
    }

    /// Sends a MIDI message given as raw bytes.
    pub fn send_raw_midi(&self, message: &[u8]) {
        if let Some(event) = parse_midi_message(message) {
            self.send_audio(event);
        }
    }

    /// Sends a MIDI message packed into an integer, status byte first.
    pub fn send_event_u32(&self, event: u32) {
        let bytes = event.to_le_bytes();
        self.send_raw_midi(&bytes[..3]);
    }

    /// Kills every voice and resets all control change data.
    pub fn reset_sampler(&self) {
        self.send_audio(SamplerAudioEvent::AllNotesKilled);
        self.send_audio(SamplerAudioEvent::ResetControl);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossbeam_channel::unbounded;

    #[test]
    fn parses_note_messages() {
        assert_eq!(
            parse_midi_message(&[0x90, 60, 100]),
            Some(SamplerAudioEvent::NoteOn { key: 60, vel: 100 })
        );
        assert_eq!(
            parse_midi_message(&[0x93, 60, 0]),
            Some(SamplerAudioEvent::NoteOff { key: 60 })
        );
        assert_eq!(
            parse_midi_message(&[0x85, 61, 40]),
            Some(SamplerAudioEvent::NoteOff { key: 61 })
        );
    }

    #[test]
    fn parses_controls_and_pitch_bend() {
        assert_eq!(
            parse_midi_message(&[0xB0, 64, 127]),
            Some(SamplerAudioEvent::Control(ControlEvent::Raw(64, 127)))
        );
        assert_eq!(
            parse_midi_message(&[0xE0, 0x00, 0x40]),
            Some(SamplerAudioEvent::Control(ControlEvent::PitchBendValue(0.0)))
        );
        assert_eq!(
            parse_midi_message(&[0xE0, 0x00, 0x00]),
            Some(SamplerAudioEvent::Control(ControlEvent::PitchBendValue(-1.0)))
        );
    }

    #[test]
    fn ignores_short_and_unused_messages() {
        assert_eq!(parse_midi_message(&[]), None);
        assert_eq!(parse_midi_message(&[0x90, 60]), None);
        assert_eq!(parse_midi_message(&[0xC0, 5]), None);
        assert_eq!(parse_midi_message(&[0xF8]), None);
    }

    #[test]
    fn sender_queues_events_in_order() {
        let (tx, rx) = unbounded();
        let sender = RealtimeEventSender::new(tx);

        sender.send_event_u32(0x00_64_3C_90);
        sender.send_raw_midi(&[0x80, 0x3C, 0x00]);
        sender.reset_sampler();

        let events: Vec<_> = rx.try_iter().collect();
        assert_eq!(events.len(), 4);
        assert!(matches!(
            events[0],
            SamplerEvent::Audio(SamplerAudioEvent::NoteOn { key: 60, vel: 100 })
        ));
        assert!(matches!(
            events[1],
            SamplerEvent::Audio(SamplerAudioEvent::NoteOff { key: 60 })
        ));
        assert!(matches!(
            events[2],
            SamplerEvent::Audio(SamplerAudioEvent::AllNotesKilled)
        ));
        assert!(matches!(
            events[3],
            SamplerEvent::Audio(SamplerAudioEvent::ResetControl)
        ));
    }
}
