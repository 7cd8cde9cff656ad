use std::{
    error::Error,
    io::stdin,
    path::{Path, PathBuf},
    thread,
    time::Duration,
};

use clap::{crate_version, Parser};
use hotwatch::{Event, EventKind, Hotwatch};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use simple_sampler_core::{
    sampler::{SamplerConfigEvent, SamplerInfo},
    sound::is_supported_audio_file,
};
use simple_sampler_realtime::{
    midi_input::{self, MidiInputConnection},
    RealtimeEventSender, RealtimeSampler,
};

mod parsers;
use parsers::*;

mod waveform_view;

const CLIENT_NAME: &str = "SimpleSampler";
#[cfg(unix)]
const VIRTUAL_PORT_NAME: &str = "SimpleSampler MIDI In";

#[derive(Parser)]
#[clap(
    version = crate_version!(),
    about = "Plays a sample across the keyboard from a MIDI input."
)]
struct Cli {
    /// The sample to load, a WAV or MP3 file. Overrides the settings file.
    sample: Option<PathBuf>,
    /// MIDI input port, by index or part of its name. Overrides the settings file.
    #[arg(short, long)]
    midi_port: Option<String>,
    /// Lists the MIDI input ports and exits.
    #[arg(short, long)]
    list_ports: bool,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    match run(Cli::parse()) {
        Ok(_) => (),
        Err(err) => error!("{err}"),
    }
}

fn connect_midi(
    port: Option<&str>,
    sender: RealtimeEventSender,
) -> Result<MidiInputConnection, Box<dyn Error>> {
    match port {
        Some(selector) => Ok(midi_input::connect_input(CLIENT_NAME, selector, sender)?),
        #[cfg(unix)]
        None => Ok(midi_input::create_virtual_input(
            CLIENT_NAME,
            VIRTUAL_PORT_NAME,
            sender,
        )?),
        #[cfg(not(unix))]
        None => Err("No MIDI input port selected".into()),
    }
}

fn load_sample(sampler: &RealtimeSampler, path: &Path) {
    if !is_supported_audio_file(path) {
        warn!(path = ?path, "only WAV and MP3 files can be loaded");
        return;
    }

    match sampler.load_sound(path) {
        Ok(waveform) => {
            println!("{} ({:.2}s)", waveform.name(), waveform.duration_secs());
            for line in waveform_view::render_ascii(&waveform, 64, 9) {
                println!("|{line}|");
            }
        }
        Err(err) => warn!(
            path = ?path,
            error = %err,
            "failed to load sample, keeping the previous sound"
        ),
    }
}

/// Reads a path typed or dropped onto the terminal. Surrounding quotes and
/// escaped spaces are removed.
fn dropped_path(line: &str) -> Option<PathBuf> {
    let line = line.trim();
    let unquoted = ['"', '\''].iter().find_map(|&quote| {
        line.strip_prefix(quote)
            .and_then(|rest| rest.strip_suffix(quote))
    });
    let path = match unquoted {
        Some(path) => path.to_owned(),
        None => line.replace("\\ ", " "),
    };

    if path.is_empty() {
        None
    } else {
        Some(PathBuf::from(path))
    }
}

fn run(cli: Cli) -> Result<(), Box<dyn Error>> {
    if cli.list_ports {
        for (i, name) in midi_input::list_input_ports(CLIENT_NAME)?.iter().enumerate() {
            println!("{i}: {name}");
        }
        return Ok(());
    }

    let config = Config::<Settings>::new();
    let settings = config.load()?;
    info!(path = ?config.file_path(), "loaded settings");

    let sampler = RealtimeSampler::open_with_default_output(settings.get_sampler_config())?;
    let sender = sampler.get_senders();
    info!(name = SamplerInfo::NAME, "sampler ready");

    if let Some(path) = cli.sample.as_ref().or(settings.sample_path.as_ref()) {
        load_sample(&sampler, path);
    } else {
        warn!("no sample selected, notes stay silent until one is loaded");
    }

    // Needs to stay alive until the end of the scope
    let midi_port = cli.midi_port.or(settings.midi_port.clone());
    let _conn_in = connect_midi(midi_port.as_deref(), sender.clone())?;

    let mut hotwatch = Hotwatch::new_with_custom_delay(Duration::from_millis(500))?;

    // Watch for settings changes and apply the envelope and polyphony
    let sender_thread = sender.clone();
    hotwatch.watch(config.file_path(), move |event: Event| {
        if let EventKind::Modify(_) = event.kind {
            thread::sleep(Duration::from_millis(10));
            match Config::<Settings>::new().load() {
                Ok(settings) => {
                    let sampler_config = settings.get_sampler_config().sampler;
                    sender_thread
                        .send_config(SamplerConfigEvent::SetEnvelope(sampler_config.envelope));
                    sender_thread
                        .send_config(SamplerConfigEvent::SetPolyphony(sampler_config.polyphony));
                    info!("settings reloaded");
                }
                Err(err) => warn!(error = %err, "failed to reload settings"),
            }
        }
    })?;

    println!("Enter or drop a WAV or MP3 file to load it, or an empty line to exit...");
    for line in stdin().lines() {
        match dropped_path(&line?) {
            Some(path) => load_sample(&sampler, &path),
            None => break,
        }
    }
    sender.reset_sampler();
    println!("Shutting down...");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_dropped_paths() {
        assert_eq!(dropped_path("  /tmp/kick.wav\n"), Some(PathBuf::from("/tmp/kick.wav")));
        assert_eq!(
            dropped_path("'/tmp/my kick.wav'"),
            Some(PathBuf::from("/tmp/my kick.wav"))
        );
        assert_eq!(
            dropped_path("\"C:\\Samples\\snare.mp3\""),
            Some(PathBuf::from("C:\\Samples\\snare.mp3"))
        );
        assert_eq!(
            dropped_path("/tmp/my\\ kick.wav"),
            Some(PathBuf::from("/tmp/my kick.wav"))
        );
    }

    #[test]
    fn empty_line_exits() {
        assert_eq!(dropped_path(""), None);
        assert_eq!(dropped_path("   \r\n"), None);
        assert_eq!(dropped_path("''"), None);
    }
}
