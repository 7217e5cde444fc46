// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! MIDI I/O abstraction layer.
//!
//! This module provides the typed message model, the decoder for raw
//! bytes, and a trait-based abstraction over output devices so the looper
//! can be driven against real ports (midir) or test doubles.

pub mod message;
pub mod ports;

pub use message::{MidiEvent, RealTimeMessage};
pub use ports::{
    list_destinations, list_sources, print_destinations, print_sources, InputPort, MidirOutput,
    RawMessage,
};

use crate::error::LooperError;

/// Number of MIDI channels addressable on one port
pub const CHANNEL_COUNT: u8 = 16;

/// Trait for MIDI output implementations.
///
/// Sending is fire-and-forget: there is no acknowledgement from the
/// device, only an error if the backend refused the bytes.
pub trait MidiOutput: Send {
    /// Send a MIDI message immediately.
    ///
    /// # Arguments
    /// * `message` - Raw MIDI bytes (e.g., `[0x90, 60, 127]` for Note On)
    fn send(&mut self, message: &[u8]) -> Result<(), LooperError>;
}

/// MIDI message constants
pub mod messages {
    // Channel Voice Messages (upper nibble, lower nibble is channel 0-15)
    pub const NOTE_OFF: u8 = 0x80;
    pub const NOTE_ON: u8 = 0x90;
    pub const POLY_AFTERTOUCH: u8 = 0xA0;
    pub const CONTROL_CHANGE: u8 = 0xB0;
    pub const PROGRAM_CHANGE: u8 = 0xC0;
    pub const CHANNEL_AFTERTOUCH: u8 = 0xD0;
    pub const PITCH_BEND: u8 = 0xE0;

    // System Common Messages
    pub const SYSEX_START: u8 = 0xF0;
    pub const TIME_CODE_QUARTER_FRAME: u8 = 0xF1;
    pub const SONG_POSITION_POINTER: u8 = 0xF2;
    pub const SONG_SELECT: u8 = 0xF3;
    pub const TUNE_REQUEST: u8 = 0xF6;
    pub const SYSEX_END: u8 = 0xF7;

    // System Real-Time Messages
    pub const TIMING_CLOCK: u8 = 0xF8;
    pub const START: u8 = 0xFA;
    pub const CONTINUE: u8 = 0xFB;
    pub const STOP: u8 = 0xFC;
    pub const ACTIVE_SENSING: u8 = 0xFE;
    pub const SYSTEM_RESET: u8 = 0xFF;
}

/// Send a Note Off for every note on every channel.
///
/// Errors are logged per message and do not stop the broadcast.
pub fn all_notes_off(output: &mut dyn MidiOutput) {
    for channel in 0..CHANNEL_COUNT {
        for note in 0..=127u8 {
            if let Err(e) = output.send(&[messages::NOTE_OFF | channel, note, 0]) {
                tracing::warn!(channel, note, error = %e, "panic note off failed");
            }
        }
    }
}


#[cfg(test)]
mod tests {
    use super::testing::MockMidiOutput;
    use super::*;

    #[test]
    fn test_mock_midi_output_send() {
        let mut output = MockMidiOutput::new();

        output.send(&[messages::NOTE_ON, 60, 127]).unwrap();

        let messages = output.get_messages();
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0], vec![0x90, 60, 127]);
    }

    #[test]
    fn test_all_notes_off_covers_every_channel_and_note() {
        let mut output = MockMidiOutput::new();
        all_notes_off(&mut output);

        let sent = output.get_messages();
        assert_eq!(sent.len(), 16 * 128);
        assert_eq!(sent[0], vec![0x80, 0, 0]);
        assert_eq!(sent[sent.len() - 1], vec![0x8F, 127, 0]);
    }

    #[test]
    fn test_midi_message_constants() {
        assert_eq!(messages::NOTE_ON, 0x90);
        assert_eq!(messages::NOTE_OFF, 0x80);
        assert_eq!(messages::TIMING_CLOCK, 0xF8);
        assert_eq!(messages::START, 0xFA);
        assert_eq!(messages::STOP, 0xFC);
    }
}
