mod utils;
use utils::*;

use std::{
    error::Error,
    io::{self, Write},
    path::PathBuf,
    time::Instant,
};

use clap::{crate_version, Parser};
use tracing::info;
use tracing_subscriber::EnvFilter;

use simple_sampler_core::{sound::Interpolator, voice::AdsrParameters, ChannelCount};
use simple_sampler_render::{sampler_renderer, SamplerRenderConfig, SamplerRenderStats};

#[derive(Parser)]
#[clap(
    version = crate_version!(),
    about = "Renders a MIDI file through SimpleSampler into a WAV file."
)]
struct Cli {
    /// The sample to play, a WAV or MP3 file.
    sample: PathBuf,
    /// The MIDI file to render.
    midi: PathBuf,
    /// The path of the rendered WAV file.
    #[arg(default_value = "out.wav")]
    output: PathBuf,

    #[arg(short = 'r', long, default_value_t = 48000)]
    sample_rate: u32,
    /// Output channels: mono or stereo.
    #[arg(short, long, value_parser = audio_channels_parser, default_value = "stereo")]
    channels: ChannelCount,
    /// Maximum number of notes playing at once.
    #[arg(short, long, default_value_t = 3)]
    polyphony: usize,

    /// Attack time in seconds.
    #[arg(short, long, value_parser = envelope_time_parser, default_value_t = 0.1)]
    attack: f32,
    /// Decay time in seconds.
    #[arg(short, long, value_parser = envelope_time_parser, default_value_t = 0.1)]
    decay: f32,
    /// Sustain level.
    #[arg(short, long, value_parser = envelope_level_parser, default_value_t = 1.0)]
    sustain: f32,
    /// Release time in seconds.
    #[arg(short = 'R', long, value_parser = envelope_time_parser, default_value_t = 0.1)]
    release: f32,

    /// Sample interpolation: none or linear.
    #[arg(short, long, value_parser = interpolation_parser, default_value = "linear")]
    interpolation: Interpolator,
    /// Write the output without passing it through the limiter.
    #[arg(long)]
    no_limiter: bool,
    /// Drop the silence before the first note.
    #[arg(long)]
    trim_silence: bool,
}

fn print_progress(stats: &SamplerRenderStats) {
    let progress = if stats.length > 0.0 {
        (stats.progress / stats.length * 100.0).min(100.0)
    } else {
        100.0
    };
    let bars = progress as usize / 5;

    print!(
        "\rProgress: [{}{}] {progress:.3}% | Voice Count: {}          ",
        "=".repeat(bars),
        " ".repeat(20 - bars),
        stats.voice_count
    );
    io::stdout().flush().ok();
}

fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    let mut config = SamplerRenderConfig {
        use_limiter: !cli.no_limiter,
        sample_rate: cli.sample_rate,
        audio_channels: cli.channels,
        trim_leading_silence: cli.trim_silence,
        ..Default::default()
    };
    config.sampler.polyphony = cli.polyphony;
    config.sampler.envelope = AdsrParameters::new(cli.attack, cli.decay, cli.sustain, cli.release);
    config.sampler.sound_options.interpolator = cli.interpolation;

    info!(
        sample = ?cli.sample,
        midi = ?cli.midi,
        output = ?cli.output,
        "starting render"
    );

    let now = Instant::now();
    let mut last_print = Instant::now();

    sampler_renderer(&cli.sample, &cli.midi, &cli.output)
        .with_config(config)
        .with_progress_callback(|stats| {
            if last_print.elapsed().as_millis() >= 100 || stats.progress >= stats.length {
                print_progress(&stats);
                last_print = Instant::now();
            }
        })
        .run()?;
    println!();

    info!(elapsed = ?now.elapsed(), "render time");
    Ok(())
}
