use std::path::Path;

/// Writes a 16-bit WAV file whose left channel alternates between 0.5 and 0.25
/// and whose right channel alternates between -0.5 and -0.25.
pub fn write_wav(path: &Path, sample_rate: u32, channels: u16, frames: usize) {
    let spec = hound::WavSpec {
        channels,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut writer = hound::WavWriter::create(path, spec).unwrap();
    for i in 0..frames {
        for c in 0..channels {
            let value: i16 = if c == 0 { 16384 } else { -16384 };
            let value = if i % 2 == 0 { value } else { value / 2 };
            writer.write_sample(value).unwrap();
        }
    }
    writer.finalize().unwrap();
}

/// A constant signal, useful to check gains through the voice chain.
pub fn constant_channel(value: f32, frames: usize) -> Vec<f32> {
    vec![value; frames]
}
