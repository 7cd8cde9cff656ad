mod config;
pub use config::*;

mod realtime_sampler;
pub use realtime_sampler::*;

mod event_senders;
pub use event_senders::*;

pub mod midi_input;
