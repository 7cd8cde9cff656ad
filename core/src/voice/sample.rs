use std::{
    marker::PhantomData,
    ops::{Add, Mul},
};

use crate::voice::{ReleaseType, VoiceControlData};

use super::VoiceGeneratorBase;

/// A single frame of generator output, either mono or stereo.
pub trait VoiceSample: Copy + Sync + Send {
    fn zero() -> Self;
}

/// Mono frame
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct SampleMono(pub f32);

impl Mul<SampleMono> for SampleMono {
    type Output = Self;

    fn mul(self, rhs: SampleMono) -> Self {
        Self(self.0 * rhs.0)
    }
}

impl Mul<SampleStereo> for SampleMono {
    type Output = SampleStereo;

    fn mul(self, rhs: SampleStereo) -> Self::Output {
        SampleStereo(self.0 * rhs.0, self.0 * rhs.1)
    }
}

impl Add<SampleMono> for SampleMono {
    type Output = Self;

    fn add(self, rhs: SampleMono) -> Self {
        Self(self.0 + rhs.0)
    }
}

impl Add<SampleStereo> for SampleMono {
    type Output = SampleStereo;

    fn add(self, rhs: SampleStereo) -> Self::Output {
        SampleStereo(self.0 + rhs.0, self.0 + rhs.1)
    }
}

impl VoiceSample for SampleMono {
    fn zero() -> Self {
        SampleMono(0.0)
    }
}

/// Stereo frame
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct SampleStereo(pub f32, pub f32);

impl Mul<SampleStereo> for SampleStereo {
    type Output = Self;

    fn mul(self, rhs: SampleStereo) -> Self {
        Self(self.0 * rhs.0, self.1 * rhs.1)
    }
}

impl Mul<SampleMono> for SampleStereo {
    type Output = SampleStereo;

    fn mul(self, rhs: SampleMono) -> Self::Output {
        SampleStereo(self.0 * rhs.0, self.1 * rhs.0)
    }
}

impl Add<SampleStereo> for SampleStereo {
    type Output = Self;

    fn add(self, rhs: SampleStereo) -> Self {
        Self(self.0 + rhs.0, self.1 + rhs.1)
    }
}

impl Add<SampleMono> for SampleStereo {
    type Output = SampleStereo;

    fn add(self, rhs: SampleMono) -> Self::Output {
        SampleStereo(self.0 + rhs.0, self.1 + rhs.0)
    }
}

impl VoiceSample for SampleStereo {
    fn zero() -> Self {
        SampleStereo(0.0, 0.0)
    }
}

/// A generator producing one frame per call.
pub trait VoiceGenerator<TO: VoiceSample>: VoiceGeneratorBase {
    fn next_sample(&mut self) -> TO;
}

/// Combines the output of two generators frame by frame with `func`.
pub struct VoiceCombine<TI, TO, V1, V2, F>
where
    TI: VoiceSample,
    TO: VoiceSample,
    V1: VoiceGenerator<TI>,
    V2: VoiceGenerator<TO>,
    F: Fn(TI, TO) -> TO,
{
    v1: V1,
    v2: V2,
    func: F,
    _ti: PhantomData<TI>,
    _to: PhantomData<TO>,
}

impl<TI, TO, V1, V2, F> VoiceCombine<TI, TO, V1, V2, F>
where
    TI: VoiceSample,
    TO: VoiceSample,
    V1: VoiceGenerator<TI>,
    V2: VoiceGenerator<TO>,
    F: Fn(TI, TO) -> TO,
{
    pub fn new(v1: V1, v2: V2, func: F) -> Self {
        VoiceCombine {
            v1,
            v2,
            func,
            _ti: PhantomData,
            _to: PhantomData,
        }
    }
}

impl<TI, TO, V1, V2, F> VoiceGeneratorBase for VoiceCombine<TI, TO, V1, V2, F>
where
    TI: VoiceSample,
    TO: VoiceSample,
    V1: VoiceGenerator<TI>,
    V2: VoiceGenerator<TO>,
    F: Sync + Send + Fn(TI, TO) -> TO,
{
    #[inline(always)]
    fn ended(&self) -> bool {
        self.v1.ended() || self.v2.ended()
    }

    #[inline(always)]
    fn signal_release(&mut self, rel_type: ReleaseType) {
        self.v1.signal_release(rel_type);
        self.v2.signal_release(rel_type);
    }

    #[inline(always)]
    fn process_controls(&mut self, control: &VoiceControlData) {
        self.v1.process_controls(control);
        self.v2.process_controls(control);
    }
}

impl<TI, TO, V1, V2, F> VoiceGenerator<TO> for VoiceCombine<TI, TO, V1, V2, F>
where
    TI: VoiceSample,
    TO: VoiceSample,
    V1: VoiceGenerator<TI>,
    V2: VoiceGenerator<TO>,
    F: Sync + Send + Fn(TI, TO) -> TO,
{
    #[inline(always)]
    fn next_sample(&mut self) -> TO {
        (self.func)(self.v1.next_sample(), self.v2.next_sample())
    }
}

/// Base combination functions for generators.
pub struct VoiceCombiner;

impl VoiceCombiner {
    pub fn mult<TI, TO, V1, V2>(voice1: V1, voice2: V2) -> impl VoiceGenerator<TO>
    where
        TI: VoiceSample + Mul<TO, Output = TO>,
        TO: VoiceSample,
        V1: VoiceGenerator<TI>,
        V2: VoiceGenerator<TO>,
    {
        #[inline(always)]
        fn mult<TI, TO>(a: TI, b: TO) -> TO
        where
            TI: Mul<TO, Output = TO>,
        {
            a * b
        }

        VoiceCombine::new(voice1, voice2, mult::<TI, TO>)
    }

    pub fn sum<TI, TO, V1, V2>(voice1: V1, voice2: V2) -> impl VoiceGenerator<TO>
    where
        TI: VoiceSample + Add<TO, Output = TO>,
        TO: VoiceSample,
        V1: VoiceGenerator<TI>,
        V2: VoiceGenerator<TO>,
    {
        #[inline(always)]
        fn add<TI, TO>(a: TI, b: TO) -> TO
        where
            TI: Add<TO, Output = TO>,
        {
            a + b
        }

        VoiceCombine::new(voice1, voice2, add::<TI, TO>)
    }
}
