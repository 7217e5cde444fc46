// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! midir backend for MIDI ports.
//!
//! Ports are opened by exact name. The input callback does no work beyond
//! copying the bytes into a channel; decoding and all looper decisions
//! happen on the receiving side.

use std::time::Instant;

use midir::{Ignore, MidiInput, MidiInputConnection, MidiOutput as MidirPortOutput, MidiOutputConnection};
use tokio::sync::mpsc::UnboundedSender;

use super::MidiOutput;
use crate::error::{LooperError, PortDirection};

const CLIENT_NAME: &str = "tyros-looper";

/// Raw message as delivered by an input port
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawMessage {
    /// Backend timestamp in microseconds
    pub timestamp_micros: u64,
    /// Host time the callback ran
    pub received_at: Instant,
    pub bytes: Vec<u8>,
}

impl RawMessage {
    pub fn new(bytes: Vec<u8>, received_at: Instant) -> Self {
        Self {
            timestamp_micros: 0,
            received_at,
            bytes,
        }
    }
}

/// Open MIDI input streaming raw messages into a channel
pub struct InputPort {
    _connection: MidiInputConnection<()>,
    pub port_name: String,
}

impl InputPort {
    /// Open the input port with exactly this name.
    ///
    /// SysEx, timing and active sensing are not filtered, the looper
    /// needs all of them.
    pub fn open(name: &str, sender: UnboundedSender<RawMessage>) -> Result<Self, LooperError> {
        let mut midi_in = MidiInput::new(CLIENT_NAME)
            .map_err(|e| LooperError::Backend(format!("Failed to create MIDI input: {}", e)))?;
        midi_in.ignore(Ignore::None);

        let ports = midi_in.ports();
        let names: Vec<String> = ports
            .iter()
            .map(|p| midi_in.port_name(p).unwrap_or_default())
            .collect();
        let index = names
            .iter()
            .position(|n| n == name)
            .ok_or_else(|| LooperError::DeviceNotFound {
                direction: PortDirection::Input,
                name: name.to_string(),
                available: names.clone(),
            })?;

        let connection = midi_in
            .connect(
                &ports[index],
                "tyros-looper-in",
                move |timestamp, bytes, _| {
                    let _ = sender.send(RawMessage {
                        timestamp_micros: timestamp,
                        received_at: Instant::now(),
                        bytes: bytes.to_vec(),
                    });
                },
                (),
            )
            .map_err(|e| LooperError::Backend(format!("Failed to connect MIDI input: {}", e)))?;

        tracing::info!(port = name, "MIDI input connected");
        Ok(Self {
            _connection: connection,
            port_name: name.to_string(),
        })
    }
}

/// MIDI output backed by a midir connection
pub struct MidirOutput {
    connection: MidiOutputConnection,
    pub port_name: String,
}

impl MidirOutput {
    /// Open the output port with exactly this name
    pub fn open(name: &str) -> Result<Self, LooperError> {
        let midi_out = MidirPortOutput::new(CLIENT_NAME)
            .map_err(|e| LooperError::Backend(format!("Failed to create MIDI output: {}", e)))?;

        let ports = midi_out.ports();
        let names: Vec<String> = ports
            .iter()
            .map(|p| midi_out.port_name(p).unwrap_or_default())
            .collect();
        let index = names
            .iter()
            .position(|n| n == name)
            .ok_or_else(|| LooperError::DeviceNotFound {
                direction: PortDirection::Output,
                name: name.to_string(),
                available: names.clone(),
            })?;

        let connection = midi_out
            .connect(&ports[index], "tyros-looper-out")
            .map_err(|e| LooperError::Backend(format!("Failed to connect MIDI output: {}", e)))?;

        tracing::info!(port = name, "MIDI output connected");
        Ok(Self {
            connection,
            port_name: name.to_string(),
        })
    }
}

impl MidiOutput for MidirOutput {
    fn send(&mut self, message: &[u8]) -> Result<(), LooperError> {
        self.connection
            .send(message)
            .map_err(|e| LooperError::Backend(format!("Failed to send MIDI: {}", e)))
    }
}

/// List all available MIDI sources (inputs)
pub fn list_sources() -> Result<Vec<String>, LooperError> {
    let midi_in = MidiInput::new(CLIENT_NAME)
        .map_err(|e| LooperError::Backend(format!("Failed to create MIDI input: {}", e)))?;
    Ok(midi_in
        .ports()
        .iter()
        .enumerate()
        .map(|(i, p)| midi_in.port_name(p).unwrap_or_else(|_| format!("Unknown {}", i)))
        .collect())
}

/// List all available MIDI destinations (outputs)
pub fn list_destinations() -> Result<Vec<String>, LooperError> {
    let midi_out = MidirPortOutput::new(CLIENT_NAME)
        .map_err(|e| LooperError::Backend(format!("Failed to create MIDI output: {}", e)))?;
    Ok(midi_out
        .ports()
        .iter()
        .enumerate()
        .map(|(i, p)| midi_out.port_name(p).unwrap_or_else(|_| format!("Unknown {}", i)))
        .collect())
}

/// Print all available MIDI sources to stdout
pub fn print_sources() -> Result<(), LooperError> {
    print_ports("sources (inputs)", &list_sources()?);
    Ok(())
}

/// Print all available MIDI destinations to stdout
pub fn print_destinations() -> Result<(), LooperError> {
    print_ports("destinations (outputs)", &list_destinations()?);
    Ok(())
}

fn print_ports(label: &str, names: &[String]) {
    if names.is_empty() {
        println!("No MIDI {} found.", label);
    } else {
        println!("Available MIDI {}:", label);
        for (i, name) in names.iter().enumerate() {
            println!("  {}: {}", i, name);
        }
    }
}
