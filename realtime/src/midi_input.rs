//! MIDI input ports feeding a [`RealtimeEventSender`].

use midir::{Ignore, MidiInput, MidiInputPort};
use thiserror::Error;
use tracing::{debug, info};

use crate::RealtimeEventSender;

#[derive(Debug, Error)]
pub enum MidiInputError {
    #[error("Failed to initialize MIDI input")]
    Init(#[from] midir::InitError),

    #[error("Failed to read MIDI port info")]
    PortInfo(#[from] midir::PortInfoError),

    #[error("No MIDI input port matches \"{0}\"")]
    PortNotFound(String),

    #[error("Failed to connect to MIDI input: {0}")]
    Connect(String),
}

/// Keeps a MIDI input open. Messages stop arriving once this is dropped.
pub struct MidiInputConnection {
    _connection: midir::MidiInputConnection<()>,
    port_name: String,
}

impl MidiInputConnection {
    pub fn port_name(&self) -> &str {
        &self.port_name
    }
}

fn new_input(client_name: &str) -> Result<MidiInput, MidiInputError> {
    let mut midi_in = MidiInput::new(client_name)?;
    midi_in.ignore(Ignore::None);
    Ok(midi_in)
}

/// Names of the available MIDI input ports.
pub fn list_input_ports(client_name: &str) -> Result<Vec<String>, MidiInputError> {
    let midi_in = new_input(client_name)?;
    let names = midi_in
        .ports()
        .iter()
        .map(|port| midi_in.port_name(port))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(names)
}

/// Picks a port by index, or by a case-insensitive part of its name.
fn find_port(names: &[String], selector: &str) -> Option<usize> {
    if let Ok(index) = selector.parse::<usize>() {
        if index < names.len() {
            return Some(index);
        }
    }

    let selector = selector.to_lowercase();
    names
        .iter()
        .position(|name| name.to_lowercase().contains(&selector))
}

fn forward_messages(sender: RealtimeEventSender) -> impl FnMut(u64, &[u8], &mut ()) + Send + 'static {
    move |_stamp, message, _| sender.send_raw_midi(message)
}

/// Connects the input port chosen by `selector` to `sender`.
pub fn connect_input(
    client_name: &str,
    selector: &str,
    sender: RealtimeEventSender,
) -> Result<MidiInputConnection, MidiInputError> {
    let midi_in = new_input(client_name)?;
    let ports: Vec<MidiInputPort> = midi_in.ports();
    let names = ports
        .iter()
        .map(|port| midi_in.port_name(port))
        .collect::<Result<Vec<_>, _>>()?;

    let index =
        find_port(&names, selector).ok_or_else(|| MidiInputError::PortNotFound(selector.into()))?;
    let port_name = names[index].clone();
    debug!(index, port = %port_name, "selected MIDI input port");

    let connection = midi_in
        .connect(&ports[index], client_name, forward_messages(sender), ())
        .map_err(|e| MidiInputError::Connect(e.to_string()))?;
    info!(port = %port_name, "connected MIDI input");

    Ok(MidiInputConnection {
        _connection: connection,
        port_name,
    })
}

/// Creates a virtual input port other programs can send MIDI to.
#[cfg(unix)]
pub fn create_virtual_input(
    client_name: &str,
    port_name: &str,
    sender: RealtimeEventSender,
) -> Result<MidiInputConnection, MidiInputError> {
    use midir::os::unix::VirtualInput;

    let midi_in = new_input(client_name)?;
    let connection = midi_in
        .create_virtual(port_name, forward_messages(sender), ())
        .map_err(|e| MidiInputError::Connect(e.to_string()))?;
    info!(port = port_name, "created virtual MIDI input");

    Ok(MidiInputConnection {
        _connection: connection,
        port_name: port_name.into(),
    })
}
