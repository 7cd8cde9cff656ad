use std::ops::RangeInclusive;

use crate::voice::{ReleaseType, VoiceControlData};

use super::{SampleMono, VoiceGenerator, VoiceGeneratorBase};

/// Fade applied to killed voices, in seconds.
const KILL_FADE_SECS: f32 = 0.001;

/// One of the four user-editable envelope values.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum AdsrParameter {
    Attack,
    Decay,
    Sustain,
    Release,
}

impl AdsrParameter {
    pub const ALL: [AdsrParameter; 4] = [
        AdsrParameter::Attack,
        AdsrParameter::Decay,
        AdsrParameter::Sustain,
        AdsrParameter::Release,
    ];

    /// Editing step of every parameter.
    pub const STEP: f32 = 0.01;

    /// Accepted value range. Times are in seconds, sustain is a level.
    pub fn range(&self) -> RangeInclusive<f32> {
        match self {
            AdsrParameter::Sustain => 0.0..=1.0,
            _ => 0.0..=2.0,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            AdsrParameter::Attack => "Attack",
            AdsrParameter::Decay => "Decay",
            AdsrParameter::Sustain => "Sustain",
            AdsrParameter::Release => "Release",
        }
    }

    /// Clamps `value` into [`AdsrParameter::range`]. NaN becomes the minimum.
    pub fn clamp(&self, value: f32) -> f32 {
        let range = self.range();
        if value.is_nan() {
            return *range.start();
        }
        value.clamp(*range.start(), *range.end())
    }

    /// Maps a 0-127 MIDI controller value linearly onto the range.
    pub fn from_midi_value(&self, value: u8) -> f32 {
        let range = self.range();
        let fac = value.min(127) as f32 / 127.0;
        range.start() + (range.end() - range.start()) * fac
    }
}

/// Attack, decay and release times in seconds, sustain as a 0-1 level.
#[derive(Debug, Copy, Clone, PartialEq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Deserialize, serde::Serialize),
    serde(default)
)]
pub struct AdsrParameters {
    pub attack: f32,
    pub decay: f32,
    pub sustain: f32,
    pub release: f32,
}

impl Default for AdsrParameters {
    fn default() -> Self {
        Self {
            attack: 0.1,
            decay: 0.1,
            sustain: 1.0,
            release: 0.1,
        }
    }
}

impl AdsrParameters {
    /// Builds a parameter set with every value clamped to its range.
    pub fn new(attack: f32, decay: f32, sustain: f32, release: f32) -> Self {
        Self {
            attack,
            decay,
            sustain,
            release,
        }
        .clamped()
    }

    pub fn clamped(self) -> Self {
        Self {
            attack: AdsrParameter::Attack.clamp(self.attack),
            decay: AdsrParameter::Decay.clamp(self.decay),
            sustain: AdsrParameter::Sustain.clamp(self.sustain),
            release: AdsrParameter::Release.clamp(self.release),
        }
    }

    pub fn get(&self, parameter: AdsrParameter) -> f32 {
        match parameter {
            AdsrParameter::Attack => self.attack,
            AdsrParameter::Decay => self.decay,
            AdsrParameter::Sustain => self.sustain,
            AdsrParameter::Release => self.release,
        }
    }

    /// Sets a single parameter, clamped to its range.
    pub fn set(&mut self, parameter: AdsrParameter, value: f32) {
        let value = parameter.clamp(value);
        match parameter {
            AdsrParameter::Attack => self.attack = value,
            AdsrParameter::Decay => self.decay = value,
            AdsrParameter::Sustain => self.sustain = value,
            AdsrParameter::Release => self.release = value,
        }
    }

    #[allow(clippy::wrong_self_convention)]
    pub fn to_envelope_params(&self, sample_rate: u32, linear_release: bool) -> EnvelopeParameters {
        let params = self.clamped();
        let sample_rate = sample_rate as f32;
        let samples = |secs: f32| (secs * sample_rate) as u32;

        let release = if linear_release {
            EnvelopePart::lerp(0.0, samples(params.release))
        } else {
            EnvelopePart::lerp_to_zero_curve(samples(params.release))
        };

        EnvelopeParameters {
            start: 0.0,
            parts: [
                // Attack
                EnvelopePart::lerp(1.0, samples(params.attack)),
                // Decay
                EnvelopePart::lerp(params.sustain, samples(params.decay)),
                // Sustain
                EnvelopePart::hold(params.sustain),
                // Release
                release,
                // Finished
                EnvelopePart::hold(0.0),
            ],
        }
    }
}

/// The stages of the envelope in playback order.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum EnvelopeStage {
    Attack = 0,
    Decay = 1,
    Sustain = 2,
    Release = 3, // Entered as soon as the voice is released
    Finished = 4,
}

impl EnvelopeStage {
    pub fn as_usize(&self) -> usize {
        *self as usize
    }

    pub fn next_stage(&self) -> EnvelopeStage {
        match self {
            EnvelopeStage::Attack => EnvelopeStage::Decay,
            EnvelopeStage::Decay => EnvelopeStage::Sustain,
            EnvelopeStage::Sustain => EnvelopeStage::Release,
            EnvelopeStage::Release => EnvelopeStage::Finished,
            EnvelopeStage::Finished => EnvelopeStage::Finished,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum EnvelopePart {
    Lerp {
        target: f32,   // Value reached at the end of the part
        duration: u32, // Duration in samples
    },
    LerpToZeroCurve {
        duration: u32,
    },
    Hold(f32),
}

impl EnvelopePart {
    pub fn lerp(target: f32, duration: u32) -> EnvelopePart {
        EnvelopePart::Lerp { target, duration }
    }

    pub fn lerp_to_zero_curve(duration: u32) -> EnvelopePart {
        EnvelopePart::LerpToZeroCurve { duration }
    }

    pub fn hold(value: f32) -> EnvelopePart {
        EnvelopePart::Hold(value)
    }
}

/// Sample based envelope shape, built from [`AdsrParameters`] for a sample rate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EnvelopeParameters {
    start: f32,
    pub parts: [EnvelopePart; 5],
}

impl EnvelopeParameters {
    fn get_stage_data(&self, stage: EnvelopeStage, start_amp: f32) -> EnvelopeState {
        match self.parts[stage.as_usize()] {
            EnvelopePart::Lerp { target, duration } => {
                if duration == 0 {
                    self.get_stage_data(stage.next_stage(), target)
                } else {
                    EnvelopeState {
                        current_stage: stage,
                        stage_data: StageData::Lerp {
                            start: start_amp,
                            length: target - start_amp,
                            time: 0,
                            duration,
                        },
                    }
                }
            }
            EnvelopePart::LerpToZeroCurve { duration } => {
                if duration == 0 {
                    self.get_stage_data(stage.next_stage(), 0.0)
                } else {
                    EnvelopeState {
                        current_stage: stage,
                        stage_data: StageData::LerpToZeroCurve {
                            start: start_amp,
                            time: 0,
                            duration,
                        },
                    }
                }
            }
            EnvelopePart::Hold(value) => EnvelopeState {
                current_stage: stage,
                stage_data: StageData::Constant(value),
            },
        }
    }

    pub fn get_stage_duration(&self, stage: EnvelopeStage) -> u32 {
        match self.parts[stage.as_usize()] {
            EnvelopePart::Lerp { duration, .. } => duration,
            EnvelopePart::LerpToZeroCurve { duration } => duration,
            EnvelopePart::Hold(_) => 0,
        }
    }

    pub fn modify_stage_data(&mut self, stage: EnvelopeStage, data: EnvelopePart) {
        self.parts[stage.as_usize()] = data;
    }
}

#[derive(Debug, Clone, Copy)]
enum StageData {
    Lerp {
        start: f32,
        length: f32,
        time: u32,
        duration: u32,
    },
    LerpToZeroCurve {
        start: f32,
        time: u32,
        duration: u32,
    },
    Constant(f32),
}

impl StageData {
    fn value(&self) -> f32 {
        match *self {
            StageData::Lerp {
                start,
                length,
                time,
                duration,
            } => start + length * (time as f32 / duration as f32),
            StageData::LerpToZeroCurve {
                start,
                time,
                duration,
            } => {
                let mult = 1.0 - time as f32 / duration as f32;
                mult.powi(8) * start
            }
            StageData::Constant(value) => value,
        }
    }

    /// Advances one sample, returns true once the part is complete.
    fn advance(&mut self) -> bool {
        match self {
            StageData::Lerp { time, duration, .. }
            | StageData::LerpToZeroCurve { time, duration, .. } => {
                *time += 1;
                *time >= *duration
            }
            StageData::Constant(_) => false,
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct EnvelopeState {
    current_stage: EnvelopeStage,
    stage_data: StageData,
}

/// Per-voice amplitude envelope.
pub struct VoiceEnvelope {
    params: EnvelopeParameters,
    state: EnvelopeState,
    sample_rate: f32,
    killed: bool,
}

impl VoiceEnvelope {
    pub fn new(params: EnvelopeParameters, sample_rate: f32) -> Self {
        let state = params.get_stage_data(EnvelopeStage::Attack, params.start);

        VoiceEnvelope {
            params,
            state,
            sample_rate,
            killed: false,
        }
    }

    pub fn get_value_at_current_time(&self) -> f32 {
        self.state.stage_data.value()
    }

    pub fn current_stage(&self) -> &EnvelopeStage {
        &self.state.current_stage
    }

    fn switch_to_next_stage(&mut self) {
        let amp = self.get_value_at_current_time();
        self.state = self
            .params
            .get_stage_data(self.current_stage().next_stage(), amp);
    }
}

impl VoiceGeneratorBase for VoiceEnvelope {
    #[inline(always)]
    fn ended(&self) -> bool {
        self.state.current_stage == EnvelopeStage::Finished
    }

    fn signal_release(&mut self, rel_type: ReleaseType) {
        if self.ended() || (self.killed && rel_type == ReleaseType::Standard) {
            return;
        }
        if rel_type == ReleaseType::Kill {
            self.params.modify_stage_data(
                EnvelopeStage::Release,
                EnvelopePart::lerp(0.0, (KILL_FADE_SECS * self.sample_rate) as u32),
            );
            self.killed = true;
        }
        let amp = self.get_value_at_current_time();
        self.state = self.params.get_stage_data(EnvelopeStage::Release, amp);
    }

    #[inline(always)]
    fn process_controls(&mut self, _control: &VoiceControlData) {}
}

impl VoiceGenerator<SampleMono> for VoiceEnvelope {
    #[inline(always)]
    fn next_sample(&mut self) -> SampleMono {
        let value = self.get_value_at_current_time();
        if self.state.stage_data.advance() {
            self.switch_to_next_stage();
        }
        SampleMono(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lerp(from: f32, to: f32, fac: f32) -> f32 {
        from + (to - from) * fac
    }

    fn round(values: &mut [f32]) {
        for v in values.iter_mut() {
            *v = (*v * 10000.0).round() / 10000.0;
        }
    }

    // Used with a 10Hz sample rate, so tenths of a second are sample counts.
    fn params_in_samples(attack: f32, decay: f32, sustain: f32, release: f32) -> AdsrParameters {
        AdsrParameters {
            attack,
            decay,
            sustain,
            release,
        }
    }

    #[test]
    fn follows_linear_adsr_shape() {
        let params = params_in_samples(1.5, 1.7, 0.4, 1.6).to_envelope_params(10, true);
        let mut env = VoiceEnvelope::new(params, 10.0);

        let mut vec = Vec::new();
        for _ in 0..48 {
            vec.push(env.next_sample().0);
        }
        env.signal_release(ReleaseType::Standard);
        assert_eq!(env.current_stage(), &EnvelopeStage::Release);
        for _ in 0..32 {
            vec.push(env.next_sample().0);
        }

        let mut expected = Vec::new();
        for i in 0..15 {
            expected.push(lerp(0.0, 1.0, i as f32 / 15.0));
        }
        for i in 0..17 {
            expected.push(lerp(1.0, 0.4, i as f32 / 17.0));
        }
        for _ in 0..16 {
            expected.push(0.4);
        }
        for i in 0..16 {
            expected.push(lerp(0.4, 0.0, i as f32 / 16.0));
        }
        for _ in 0..16 {
            expected.push(0.0);
        }

        round(&mut vec);
        round(&mut expected);
        assert_eq!(vec, expected);
        assert!(env.ended());
    }

    #[test]
    fn release_starts_from_current_level() {
        let params = params_in_samples(1.0, 0.0, 1.0, 0.4).to_envelope_params(10, true);
        let mut env = VoiceEnvelope::new(params, 10.0);

        for _ in 0..5 {
            env.next_sample();
        }
        assert_eq!(env.current_stage(), &EnvelopeStage::Attack);
        env.signal_release(ReleaseType::Standard);

        let mut vec: Vec<f32> = (0..5).map(|_| env.next_sample().0).collect();
        let mut expected = vec![0.5, 0.375, 0.25, 0.125, 0.0];
        round(&mut vec);
        round(&mut expected);
        assert_eq!(vec, expected);
        assert!(env.ended());
    }

    #[test]
    fn zero_length_stages_are_skipped() {
        let params = params_in_samples(0.0, 0.0, 0.6, 0.0).to_envelope_params(10, true);
        let mut env = VoiceEnvelope::new(params, 10.0);

        assert_eq!(env.current_stage(), &EnvelopeStage::Sustain);
        assert_eq!(env.next_sample(), SampleMono(0.6));

        env.signal_release(ReleaseType::Standard);
        assert!(env.ended());
        assert_eq!(env.next_sample(), SampleMono(0.0));
    }

    #[test]
    fn curved_release_reaches_zero() {
        let params = params_in_samples(0.0, 0.0, 1.0, 0.8).to_envelope_params(10, false);
        let mut env = VoiceEnvelope::new(params, 10.0);
        env.signal_release(ReleaseType::Standard);

        let values: Vec<f32> = (0..8).map(|_| env.next_sample().0).collect();
        assert_eq!(values[0], 1.0);
        assert!(values.windows(2).all(|w| w[1] <= w[0]));
        assert!(env.ended());
    }

    #[test]
    fn kill_fades_out_quickly() {
        let params = AdsrParameters::new(0.0, 0.0, 1.0, 2.0).to_envelope_params(48000, true);
        let mut env = VoiceEnvelope::new(params, 48000.0);
        env.signal_release(ReleaseType::Kill);

        for _ in 0..48 {
            env.next_sample();
        }
        assert!(env.ended());
    }

    #[test]
    fn parameters_are_clamped_to_slider_ranges() {
        let params = AdsrParameters::new(-1.0, 5.0, 1.5, f32::NAN);
        assert_eq!(params, AdsrParameters::new(0.0, 2.0, 1.0, 0.0));

        let mut params = AdsrParameters::default();
        params.set(AdsrParameter::Sustain, 0.25);
        params.set(AdsrParameter::Attack, 3.0);
        assert_eq!(params.get(AdsrParameter::Sustain), 0.25);
        assert_eq!(params.get(AdsrParameter::Attack), 2.0);
    }

    #[test]
    fn midi_values_span_the_range() {
        assert_eq!(AdsrParameter::Attack.from_midi_value(0), 0.0);
        assert_eq!(AdsrParameter::Attack.from_midi_value(127), 2.0);
        assert_eq!(AdsrParameter::Sustain.from_midi_value(127), 1.0);
    }
}
