use rayon::prelude::*;
use rubato::{FftFixedIn, Resampler};

use super::AudioLoadError;

const MIN_CHUNK_SIZE: usize = 1024;
const SUB_CHUNKS: usize = 32;

/// Resamples one channel, keeping its duration.
///
/// The whole channel is processed as a single chunk followed by silence
/// until the resampler delay is flushed.
pub fn resample_channel(
    samples: &[f32],
    sample_rate: u32,
    new_sample_rate: u32,
) -> Result<Vec<f32>, AudioLoadError> {
    if sample_rate == new_sample_rate || samples.is_empty() {
        return Ok(samples.to_vec());
    }
    if sample_rate == 0 || new_sample_rate == 0 {
        return Err(AudioLoadError::ResampleFailed(format!(
            "invalid sample rate conversion {sample_rate} -> {new_sample_rate}"
        )));
    }

    let expected_len =
        (samples.len() as u64 * new_sample_rate as u64 / sample_rate as u64) as usize;
    let chunk_size = samples.len().max(MIN_CHUNK_SIZE);

    let mut resampler = FftFixedIn::<f32>::new(
        sample_rate as usize,
        new_sample_rate as usize,
        chunk_size,
        SUB_CHUNKS,
        1,
    )
    .map_err(|e| AudioLoadError::ResampleFailed(e.to_string()))?;
    let delay = resampler.output_delay();

    let mut input = samples.to_vec();
    input.resize(resampler.input_frames_next(), 0.0);

    let mut output = Vec::with_capacity(delay + expected_len);
    while output.len() < delay + expected_len {
        let processed = resampler
            .process(&[&input], None)
            .map_err(|e| AudioLoadError::ResampleFailed(e.to_string()))?;
        match processed.into_iter().next() {
            Some(channel) if !channel.is_empty() => output.extend(channel),
            _ => break,
        }
        input.clear();
        input.resize(resampler.input_frames_next(), 0.0);
    }

    output.resize(delay + expected_len, 0.0);
    Ok(output.split_off(delay))
}

/// Resamples every channel in parallel.
pub fn resample_channels(
    channels: &[Vec<f32>],
    sample_rate: u32,
    new_sample_rate: u32,
) -> Result<Vec<Vec<f32>>, AudioLoadError> {
    channels
        .par_iter()
        .map(|samples| resample_channel(samples, sample_rate, new_sample_rate))
        .collect()
}
