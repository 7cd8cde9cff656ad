#![allow(clippy::let_and_return)]

pub mod buffered_renderer;

pub mod sampler;

pub mod sound;

pub mod voice;

pub mod waveform;

mod audio_pipe;
pub use audio_pipe::*;

mod audio_stream;
pub use audio_stream::*;

pub mod effects;

pub mod helpers;

#[cfg(test)]
mod test_utils;
