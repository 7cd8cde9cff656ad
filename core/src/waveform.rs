//! Display data for the loaded sample.
//!
//! The editor draws the first channel of the loaded file as a single path.
//! Long files are thinned out by keeping every n-th sample so that roughly
//! one point lands on each horizontal pixel.

use std::sync::Arc;

use crate::sound::DecodedAudio;

/// Vertical distance in pixels between the center line and full scale.
pub const DEFAULT_AMPLITUDE_PX: f32 = 150.0;

/// Text shown instead of the waveform while no file is loaded.
pub const EMPTY_WAVEFORM_HINT: &str = "Drop an Audio File to Load";

/// The first channel of a loaded file at its own sample rate.
#[derive(Debug, Clone)]
pub struct Waveform {
    name: String,
    samples: Arc<[f32]>,
    sample_rate: u32,
}

impl Default for Waveform {
    fn default() -> Self {
        Self::new(String::new(), Vec::<f32>::new(), 0)
    }
}

impl Waveform {
    pub fn new(name: impl Into<String>, samples: impl Into<Arc<[f32]>>, sample_rate: u32) -> Self {
        Self {
            name: name.into(),
            samples: samples.into(),
            sample_rate,
        }
    }

    pub fn from_decoded(name: &str, decoded: &DecodedAudio) -> Self {
        let samples = decoded.source_channels.first().cloned().unwrap_or_default();
        Self::new(name, samples, decoded.source_sample_rate)
    }

    /// File name without extension.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn duration_secs(&self) -> f32 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.samples.len() as f32 / self.sample_rate as f32
    }

    /// Step between the samples kept for a display `width` pixels wide.
    ///
    /// Never below 1, so samples shorter than the display are drawn in full.
    pub fn decimation_ratio(&self, width: usize) -> usize {
        (self.samples.len() / width.max(1)).max(1)
    }

    /// Every `ratio`-th sample, starting with the first.
    pub fn overview(&self, width: usize) -> Vec<f32> {
        let ratio = self.decimation_ratio(width);
        self.samples.iter().step_by(ratio).copied().collect()
    }

    /// Pixel coordinates of the waveform path.
    ///
    /// `x` is the index of the kept sample, `y` maps the amplitude `1.0` to
    /// `height / 2 - amplitude_px` and `-1.0` to `height / 2 + amplitude_px`.
    pub fn path_points(&self, width: usize, height: f32, amplitude_px: f32) -> Vec<(f32, f32)> {
        let center = height / 2.0;
        self.overview(width)
            .into_iter()
            .enumerate()
            .map(|(x, sample)| (x as f32, center - sample * amplitude_px))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ramp(len: usize) -> Vec<f32> {
        (0..len).map(|i| i as f32).collect()
    }

    #[test]
    fn keeps_every_nth_sample() {
        let waveform = Waveform::new("ramp", ramp(1000), 44100);
        assert_eq!(waveform.decimation_ratio(100), 10);

        let overview = waveform.overview(100);
        assert_eq!(overview.len(), 100);
        assert_eq!(overview[0], 0.0);
        assert_eq!(overview[1], 10.0);
        assert_eq!(overview[99], 990.0);
    }

    #[test]
    fn uneven_lengths_round_the_ratio_down() {
        let waveform = Waveform::new("ramp", ramp(1050), 44100);
        assert_eq!(waveform.decimation_ratio(100), 10);
        assert_eq!(waveform.overview(100).len(), 105);
    }

    #[test]
    fn short_samples_are_drawn_in_full() {
        let waveform = Waveform::new("short", ramp(30), 44100);
        assert_eq!(waveform.decimation_ratio(500), 1);
        assert_eq!(waveform.overview(500), ramp(30));
        assert_eq!(waveform.decimation_ratio(0), 30);
    }

    #[test]
    fn maps_amplitude_to_pixels() {
        let waveform = Waveform::new("w", vec![0.0, 1.0, -1.0, 0.5], 4);
        let points = waveform.path_points(4, 400.0, DEFAULT_AMPLITUDE_PX);
        assert_eq!(
            points,
            vec![(0.0, 200.0), (1.0, 50.0), (2.0, 350.0), (3.0, 125.0)]
        );
    }

    #[test]
    fn empty_waveform_has_no_points() {
        let waveform = Waveform::default();
        assert!(waveform.is_empty());
        assert!(waveform.path_points(300, 200.0, DEFAULT_AMPLITUDE_PX).is_empty());
        assert_eq!(waveform.duration_secs(), 0.0);
    }
}
