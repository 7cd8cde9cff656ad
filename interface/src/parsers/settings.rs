use super::ConfigPath;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use simple_sampler_core::{
    sampler::{SamplerConfig, SamplerInfo},
    sound::{Interpolator, SoundInitOptions},
    voice::AdsrParameters,
};
use simple_sampler_realtime::RealtimeSamplerConfig;

#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    // Sampler options
    pub envelope: AdsrParameters,
    pub polyphony: usize,
    pub interpolator: Interpolator,
    pub sample_path: Option<PathBuf>,

    // Realtime options
    pub render_window_ms: f64,
    pub use_limiter: bool,
    pub midi_port: Option<String>,
}

impl Default for Settings {
    fn default() -> Self {
        let realtime = RealtimeSamplerConfig::default();

        Self {
            envelope: AdsrParameters::default(),
            polyphony: SamplerInfo::DEFAULT_POLYPHONY,
            interpolator: Interpolator::default(),
            sample_path: None,
            render_window_ms: realtime.render_window_ms,
            use_limiter: realtime.use_limiter,
            midi_port: None,
        }
    }
}

impl Settings {
    pub fn get_sampler_config(&self) -> RealtimeSamplerConfig {
        RealtimeSamplerConfig {
            render_window_ms: self.render_window_ms,
            sampler: SamplerConfig {
                polyphony: self.polyphony,
                envelope: self.envelope.clamped(),
                sound_options: SoundInitOptions {
                    interpolator: self.interpolator,
                    ..Default::default()
                },
            },
            use_limiter: self.use_limiter,
        }
    }
}

impl ConfigPath for Settings {
    fn filename() -> PathBuf {
        "settings.json".into()
    }
}
