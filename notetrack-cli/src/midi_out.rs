//! MIDI output: sends encoded note events to a midir connection, or prints
//! them when no port is configured.

use anyhow::{anyhow, Result};
use midir::{MidiOutput, MidiOutputConnection};
use notetrack_core::tuning::note_name;
use notetrack_core::{NoteEvent, NoteEventKind};
use tracing::{info, warn};

const CLIENT_NAME: &str = "notetrack";
/// Name of the port created with `--virtual-port`.
pub const VIRTUAL_PORT_NAME: &str = "midi_out";

/// Where note events go.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputTarget {
    Print,
    /// First existing output port whose name contains this text.
    Port(String),
    Virtual,
}

pub struct MidiSink {
    connection: Option<MidiOutputConnection>,
    sounding: Option<i32>,
}

impl MidiSink {
    pub fn open(target: &OutputTarget) -> Result<Self> {
        let connection = match target {
            OutputTarget::Print => None,
            OutputTarget::Port(name) => Some(connect_by_name(name)?),
            OutputTarget::Virtual => Some(create_virtual()?),
        };
        Ok(Self {
            connection,
            sounding: None,
        })
    }

    /// Sends one event. Events whose note does not fit in a MIDI data byte are
    /// dropped with a warning.
    pub fn send(&mut self, event: NoteEvent) {
        let bytes = match event.to_midi() {
            Ok(bytes) => bytes,
            Err(e) => {
                warn!("Dropping {:?} event: {}", event.kind, e);
                return;
            }
        };

        match event.kind {
            NoteEventKind::On => self.sounding = Some(event.note),
            NoteEventKind::Off if self.sounding == Some(event.note) => self.sounding = None,
            NoteEventKind::Off => {}
        }

        match self.connection.as_mut() {
            Some(connection) => {
                if let Err(e) = connection.send(&bytes) {
                    warn!("Failed to send MIDI message: {}", e);
                }
            }
            None => println!("{}", describe(&event)),
        }
    }

    /// The note last switched on and not yet switched off.
    pub fn sounding(&self) -> Option<i32> {
        self.sounding
    }

    /// Switches off a note left sounding, so the receiver is not left hanging.
    pub fn finish(&mut self) {
        if let Some(note) = self.sounding {
            self.send(NoteEvent::off(note));
        }
    }
}

impl Drop for MidiSink {
    fn drop(&mut self) {
        self.finish();
    }
}

/// Human-readable form of an event, e.g. `ON  69 A4`.
pub fn describe(event: &NoteEvent) -> String {
    let kind = match event.kind {
        NoteEventKind::On => "ON ",
        NoteEventKind::Off => "OFF",
    };
    format!("{} {} {}", kind, event.note, note_name(event.note).unwrap_or("?"))
}

pub fn list_output_ports() -> Result<Vec<String>> {
    let midi_output =
        MidiOutput::new(CLIENT_NAME).map_err(|e| anyhow!("Failed to create MIDI output: {}", e))?;
    Ok(midi_output
        .ports()
        .iter()
        .filter_map(|port| midi_output.port_name(port).ok())
        .collect())
}

fn connect_by_name(name: &str) -> Result<MidiOutputConnection> {
    let midi_output =
        MidiOutput::new(CLIENT_NAME).map_err(|e| anyhow!("Failed to create MIDI output: {}", e))?;

    let wanted = name.to_lowercase();
    let ports = midi_output.ports();
    let (port, port_name) = ports
        .iter()
        .filter_map(|port| midi_output.port_name(port).ok().map(|n| (port, n)))
        .find(|(_, n)| n.to_lowercase().contains(&wanted))
        .ok_or_else(|| anyhow!("No MIDI output port found matching '{}'", name))?;

    let connection = midi_output
        .connect(port, VIRTUAL_PORT_NAME)
        .map_err(|e| anyhow!("Failed to connect to MIDI output port '{}': {}", port_name, e))?;
    info!("Sending notes to MIDI output port: {}", port_name);
    Ok(connection)
}

#[cfg(unix)]
fn create_virtual() -> Result<MidiOutputConnection> {
    use midir::os::unix::VirtualOutput;

    let midi_output =
        MidiOutput::new(CLIENT_NAME).map_err(|e| anyhow!("Failed to create MIDI output: {}", e))?;
    let connection = midi_output
        .create_virtual(VIRTUAL_PORT_NAME)
        .map_err(|e| anyhow!("Failed to create virtual MIDI port: {}", e))?;
    info!("Created virtual MIDI output port: {}:{}", CLIENT_NAME, VIRTUAL_PORT_NAME);
    Ok(connection)
}

#[cfg(not(unix))]
fn create_virtual() -> Result<MidiOutputConnection> {
    Err(anyhow!("Virtual MIDI ports are only supported on Unix"))
}
