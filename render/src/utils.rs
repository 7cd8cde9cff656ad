use simple_sampler_core::{sound::Interpolator, ChannelCount};

#[inline(always)]
pub fn audio_channels_parser(s: &str) -> Result<ChannelCount, String> {
    match s {
        "mono" => Ok(ChannelCount::Mono),
        "stereo" => Ok(ChannelCount::Stereo),
        _ => Err("Invalid channel count".to_string()),
    }
}

#[inline(always)]
pub fn interpolation_parser(s: &str) -> Result<Interpolator, String> {
    match s {
        "none" => Ok(Interpolator::Nearest),
        "linear" => Ok(Interpolator::Linear),
        _ => Err("Invalid interpolation type".to_string()),
    }
}

/// Parses an envelope time or level, rejecting values outside `0..=max`.
#[inline(always)]
pub fn envelope_value_parser(s: &str, max: f32) -> Result<f32, String> {
    let value: f32 = s.parse().map_err(|e| format!("{}", e))?;
    if (0.0..=max).contains(&value) {
        Ok(value)
    } else {
        Err(format!("Value must be between 0 and {max}"))
    }
}

pub fn envelope_time_parser(s: &str) -> Result<f32, String> {
    envelope_value_parser(s, 2.0)
}

pub fn envelope_level_parser(s: &str) -> Result<f32, String> {
    envelope_value_parser(s, 1.0)
}
