use lazy_static::lazy_static;

/// Equal temperament frequencies of MIDI keys 0-127, A4 = 440Hz.
fn build_frequencies() -> [f32; 128] {
    let mut freqs = [0.0f32; 128];
    for (key, freq) in freqs.iter_mut().enumerate() {
        *freq = 2.0f32.powf((key as f32 - 69.0) / 12.0) * 440.0;
    }
    freqs
}

lazy_static! {
    /// Static array of all frequencies for keys 0-127.
    pub static ref FREQS: [f32; 128] = build_frequencies();
}

/// Playback speed that transposes a sample recorded at `root_key` to `key`.
pub fn speed_mult_from_keys(key: u8, root_key: u8) -> f32 {
    let key = key.min(127) as usize;
    let root_key = root_key.min(127) as usize;
    FREQS[key] / FREQS[root_key]
}

/// Pitch multiplier of a bend in semitones.
pub fn semitones_to_multiplier(semitones: f32) -> f32 {
    2.0f32.powf(semitones / 12.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn octave_doubles_speed() {
        assert!((speed_mult_from_keys(72, 60) - 2.0).abs() < 1e-4);
        assert!((speed_mult_from_keys(48, 60) - 0.5).abs() < 1e-4);
        assert_eq!(speed_mult_from_keys(60, 60), 1.0);
    }

    #[test]
    fn bend_of_twelve_semitones_is_an_octave() {
        assert!((semitones_to_multiplier(12.0) - 2.0).abs() < 1e-6);
        assert!((semitones_to_multiplier(-12.0) - 0.5).abs() < 1e-6);
    }
}
