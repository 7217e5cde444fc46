// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Error taxonomy for the looper.
//!
//! Only [`LooperError::DeviceNotFound`] is fatal. Everything else is
//! logged where it happens and the looper keeps running.

use thiserror::Error;

/// Direction of a MIDI port
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PortDirection {
    Input,
    Output,
}

impl std::fmt::Display for PortDirection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PortDirection::Input => write!(f, "input"),
            PortDirection::Output => write!(f, "output"),
        }
    }
}

#[derive(Debug, Error)]
pub enum LooperError {
    /// No port with the requested name exists
    #[error("no MIDI {direction} port named '{name}' (available: {available:?})")]
    DeviceNotFound {
        direction: PortDirection,
        name: String,
        available: Vec<String>,
    },

    /// All output channels are bound to loops
    #[error("all {channels} channels are bound to loops, recording is disabled")]
    CapacityExceeded { channels: u8 },

    /// A Note Off arrived without a matching Note On
    #[error("note off without pending note on (channel {channel}, note {note})")]
    UnpairedNoteOff { channel: u8, note: u8 },

    /// Bytes that could not be decoded
    #[error("malformed MIDI message: {0:02X?}")]
    MalformedMessage(Vec<u8>),

    /// Failure reported by the MIDI backend
    #[error("MIDI backend error: {0}")]
    Backend(String),
}

impl LooperError {
    /// Whether the process has to stop
    pub fn is_fatal(&self) -> bool {
        matches!(self, LooperError::DeviceNotFound { .. })
    }
}
