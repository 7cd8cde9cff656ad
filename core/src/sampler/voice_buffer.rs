use std::{
    collections::VecDeque,
    ops::{Deref, DerefMut},
};

use tracing::debug;

use crate::voice::{ReleaseType, Voice, VoiceControlData};

struct PoolVoice {
    id: u64,
    key: u8,
    held_by_damper: bool,
    voice: Box<dyn Voice>,
}

impl Deref for PoolVoice {
    type Target = Box<dyn Voice>;

    #[inline(always)]
    fn deref(&self) -> &Self::Target {
        &self.voice
    }
}

impl DerefMut for PoolVoice {
    #[inline(always)]
    fn deref_mut(&mut self) -> &mut Box<dyn Voice> {
        &mut self.voice
    }
}

/// The voices of the sampler, oldest first.
///
/// Holds at most `max_voices` voices. Starting a note beyond that steals the
/// oldest releasing voice, or the oldest voice if none is releasing.
pub struct VoiceBuffer {
    id_counter: u64,
    buffer: VecDeque<PoolVoice>,
    damper: bool, // false = pedal up, true = pedal down
    max_voices: usize,
}

impl VoiceBuffer {
    pub fn new(max_voices: usize) -> Self {
        VoiceBuffer {
            id_counter: 0,
            buffer: VecDeque::new(),
            damper: false,
            max_voices: max_voices.max(1),
        }
    }

    fn get_id(&mut self) -> u64 {
        self.id_counter += 1;
        self.id_counter
    }

    pub fn max_voices(&self) -> usize {
        self.max_voices
    }

    pub fn set_max_voices(&mut self, max_voices: usize) {
        self.max_voices = max_voices.max(1);
        while self.buffer.len() > self.max_voices {
            self.steal_voice();
        }
    }

    fn steal_voice(&mut self) {
        let index = self
            .buffer
            .iter()
            .position(|v| v.is_releasing())
            .unwrap_or(0);

        if let Some(stolen) = self.buffer.remove(index) {
            debug!(
                key = stolen.key,
                id = stolen.id,
                releasing = stolen.is_releasing(),
                "stealing voice"
            );
        }
    }

    /// Adds the voice of a new note.
    ///
    /// Voices still sounding on the same key are released first.
    pub fn push_voice(&mut self, key: u8, voice: Box<dyn Voice>) {
        self.push_voices(key, std::iter::once(voice));
    }

    /// Adds all voices started by one note, one per matching sound.
    pub fn push_voices(&mut self, key: u8, voices: impl IntoIterator<Item = Box<dyn Voice>>) {
        for v in self.buffer.iter_mut().filter(|v| v.key == key) {
            v.held_by_damper = false;
            if !v.is_releasing() {
                v.signal_release(ReleaseType::Standard);
            }
        }

        for voice in voices {
            while self.buffer.len() >= self.max_voices {
                self.steal_voice();
            }

            let id = self.get_id();
            self.buffer.push_back(PoolVoice {
                id,
                key,
                held_by_damper: false,
                voice,
            });
        }
    }

    /// Releases the held voices of `key`, or marks them as held by the damper.
    pub fn release_key(&mut self, key: u8) {
        let damper = self.damper;
        for v in self.buffer.iter_mut().filter(|v| v.key == key) {
            if v.is_releasing() {
                continue;
            }
            if damper {
                v.held_by_damper = true;
            } else {
                v.signal_release(ReleaseType::Standard);
            }
        }
    }

    /// Releases every voice, including the ones held by the damper.
    pub fn release_all_voices(&mut self) {
        for v in self.buffer.iter_mut() {
            v.held_by_damper = false;
            if !v.is_releasing() {
                v.signal_release(ReleaseType::Standard);
            }
        }
    }

    /// Fades out every voice within a millisecond.
    pub fn kill_all_voices(&mut self) {
        for v in self.buffer.iter_mut() {
            v.held_by_damper = false;
            if !v.is_killed() {
                v.signal_release(ReleaseType::Kill);
            }
        }
    }

    /// Drops every voice immediately.
    pub fn clear(&mut self) {
        self.buffer.clear();
    }

    pub fn damper(&self) -> bool {
        self.damper
    }

    pub fn set_damper(&mut self, damper: bool) {
        self.damper = damper;
        if damper {
            return;
        }

        for v in self.buffer.iter_mut().filter(|v| v.held_by_damper) {
            v.held_by_damper = false;
            if !v.is_releasing() {
                v.signal_release(ReleaseType::Standard);
            }
        }
    }

    pub fn process_controls(&mut self, control: &VoiceControlData) {
        for v in self.buffer.iter_mut() {
            v.process_controls(control);
        }
    }

    /// Adds every voice onto `out` and drops the voices that finished.
    pub fn render_to(&mut self, out: &mut [f32]) {
        for v in self.buffer.iter_mut() {
            v.render_to(out);
        }
        self.remove_ended_voices();
    }

    pub fn remove_ended_voices(&mut self) {
        self.buffer.retain(|v| !v.ended());
    }

    pub fn has_voices(&self) -> bool {
        !self.buffer.is_empty()
    }

    pub fn voice_count(&self) -> usize {
        self.buffer.len()
    }

    /// Keys of the current voices, oldest first.
    pub fn keys(&self) -> impl Iterator<Item = u8> + '_ {
        self.buffer.iter().map(|v| v.key)
    }

    /// Keys of the voices not yet released, oldest first.
    pub fn held_keys(&self) -> impl Iterator<Item = u8> + '_ {
        self.buffer
            .iter()
            .filter(|v| !v.is_releasing())
            .map(|v| v.key)
    }
}
