// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Typed MIDI messages and the raw byte decoder.
//!
//! Every raw message decodes to exactly one [`MidiEvent`]. Bytes that do
//! not form a valid message are kept as [`MidiEvent::Undefined`] so they
//! travel through the looper as data instead of aborting it.

use super::messages;

/// System real-time message types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RealTimeMessage {
    /// MIDI Clock tick (24 per quarter note)
    TimingClock,
    /// Start playback from the beginning
    Start,
    /// Continue playback
    Continue,
    /// Stop playback
    Stop,
    ActiveSensing,
    SystemReset,
}

impl RealTimeMessage {
    fn from_status(status: u8) -> Option<Self> {
        match status {
            messages::TIMING_CLOCK => Some(RealTimeMessage::TimingClock),
            messages::START => Some(RealTimeMessage::Start),
            messages::CONTINUE => Some(RealTimeMessage::Continue),
            messages::STOP => Some(RealTimeMessage::Stop),
            messages::ACTIVE_SENSING => Some(RealTimeMessage::ActiveSensing),
            messages::SYSTEM_RESET => Some(RealTimeMessage::SystemReset),
            _ => None,
        }
    }

    /// Status byte for this message
    pub fn status(self) -> u8 {
        match self {
            RealTimeMessage::TimingClock => messages::TIMING_CLOCK,
            RealTimeMessage::Start => messages::START,
            RealTimeMessage::Continue => messages::CONTINUE,
            RealTimeMessage::Stop => messages::STOP,
            RealTimeMessage::ActiveSensing => messages::ACTIVE_SENSING,
            RealTimeMessage::SystemReset => messages::SYSTEM_RESET,
        }
    }
}

/// Parsed MIDI message types
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MidiEvent {
    /// Note On: channel (0-15), note (0-127), velocity (1-127)
    NoteOn { channel: u8, note: u8, velocity: u8 },
    /// Note Off: channel (0-15), note (0-127), velocity (0-127)
    NoteOff { channel: u8, note: u8, velocity: u8 },
    /// Poly Aftertouch: channel (0-15), note (0-127), pressure (0-127)
    PolyAftertouch { channel: u8, note: u8, pressure: u8 },
    /// Control Change: channel (0-15), controller (0-127), value (0-127)
    ControlChange { channel: u8, controller: u8, value: u8 },
    /// Program Change: channel (0-15), program (0-127)
    ProgramChange { channel: u8, program: u8 },
    /// Channel Aftertouch: channel (0-15), pressure (0-127)
    ChannelAftertouch { channel: u8, pressure: u8 },
    /// Pitch Bend: channel (0-15), value (-8192 to 8191)
    PitchBend { channel: u8, value: i16 },
    /// System Exclusive, including the leading 0xF0 and any terminator
    SystemExclusive(Vec<u8>),
    /// System Common (0xF1, 0xF2, 0xF3, 0xF6) with its data bytes
    SystemCommon { status: u8, data: Vec<u8> },
    /// System Real-Time
    RealTime(RealTimeMessage),
    /// Bytes that do not form a supported message
    Undefined(Vec<u8>),
}

impl MidiEvent {
    /// Parse raw MIDI bytes into a MidiEvent.
    ///
    /// Running status is not supported: a message must start with its own
    /// status byte, otherwise it decodes to `Undefined`.
    pub fn parse(data: &[u8]) -> Self {
        let Some(&status) = data.first() else {
            return MidiEvent::Undefined(Vec::new());
        };

        if status >= 0xF0 {
            return Self::parse_system(status, data);
        }
        if status < 0x80 {
            return MidiEvent::Undefined(data.to_vec());
        }

        let msg_type = status & 0xF0;
        let channel = status & 0x0F;
        let needed = match msg_type {
            messages::PROGRAM_CHANGE | messages::CHANNEL_AFTERTOUCH => 1,
            _ => 2,
        };
        if data.len() < 1 + needed || data[1..=needed].iter().any(|b| b & 0x80 != 0) {
            return MidiEvent::Undefined(data.to_vec());
        }

        match msg_type {
            messages::NOTE_OFF => MidiEvent::NoteOff {
                channel,
                note: data[1],
                velocity: data[2],
            },
            // Yamaha keyboards send Note On with velocity 0 as Note Off
            messages::NOTE_ON if data[2] == 0 => MidiEvent::NoteOff {
                channel,
                note: data[1],
                velocity: 0,
            },
            messages::NOTE_ON => MidiEvent::NoteOn {
                channel,
                note: data[1],
                velocity: data[2],
            },
            messages::POLY_AFTERTOUCH => MidiEvent::PolyAftertouch {
                channel,
                note: data[1],
                pressure: data[2],
            },
            messages::CONTROL_CHANGE => MidiEvent::ControlChange {
                channel,
                controller: data[1],
                value: data[2],
            },
            messages::PROGRAM_CHANGE => MidiEvent::ProgramChange {
                channel,
                program: data[1],
            },
            messages::CHANNEL_AFTERTOUCH => MidiEvent::ChannelAftertouch {
                channel,
                pressure: data[1],
            },
            messages::PITCH_BEND => {
                let lsb = data[1] as i16;
                let msb = data[2] as i16;
                MidiEvent::PitchBend {
                    channel,
                    value: ((msb << 7) | lsb) - 8192,
                }
            }
            _ => MidiEvent::Undefined(data.to_vec()),
        }
    }

    fn parse_system(status: u8, data: &[u8]) -> Self {
        if let Some(rt) = RealTimeMessage::from_status(status) {
            return MidiEvent::RealTime(rt);
        }
        match status {
            // The port layer delivers the whole SysEx including 0xF7
            messages::SYSEX_START => MidiEvent::SystemExclusive(data.to_vec()),
            messages::TIME_CODE_QUARTER_FRAME
            | messages::SONG_POSITION_POINTER
            | messages::SONG_SELECT
            | messages::TUNE_REQUEST => MidiEvent::SystemCommon {
                status,
                data: data[1..].to_vec(),
            },
            _ => MidiEvent::Undefined(data.to_vec()),
        }
    }

    /// Encode back to raw MIDI bytes
    pub fn to_bytes(&self) -> Vec<u8> {
        match *self {
            MidiEvent::NoteOn { channel, note, velocity } => {
                vec![messages::NOTE_ON | channel, note, velocity]
            }
            MidiEvent::NoteOff { channel, note, velocity } => {
                vec![messages::NOTE_OFF | channel, note, velocity]
            }
            MidiEvent::PolyAftertouch { channel, note, pressure } => {
                vec![messages::POLY_AFTERTOUCH | channel, note, pressure]
            }
            MidiEvent::ControlChange { channel, controller, value } => {
                vec![messages::CONTROL_CHANGE | channel, controller, value]
            }
            MidiEvent::ProgramChange { channel, program } => {
                vec![messages::PROGRAM_CHANGE | channel, program]
            }
            MidiEvent::ChannelAftertouch { channel, pressure } => {
                vec![messages::CHANNEL_AFTERTOUCH | channel, pressure]
            }
            MidiEvent::PitchBend { channel, value } => {
                let raw = (value as i32 + 8192).clamp(0, 0x3FFF) as u16;
                vec![
                    messages::PITCH_BEND | channel,
                    (raw & 0x7F) as u8,
                    ((raw >> 7) & 0x7F) as u8,
                ]
            }
            MidiEvent::SystemExclusive(ref bytes) | MidiEvent::Undefined(ref bytes) => bytes.clone(),
            MidiEvent::SystemCommon { status, ref data } => {
                let mut bytes = Vec::with_capacity(1 + data.len());
                bytes.push(status);
                bytes.extend_from_slice(data);
                bytes
            }
            MidiEvent::RealTime(rt) => vec![rt.status()],
        }
    }

    /// Channel of a channel-voice message
    pub fn channel(&self) -> Option<u8> {
        match *self {
            MidiEvent::NoteOn { channel, .. }
            | MidiEvent::NoteOff { channel, .. }
            | MidiEvent::PolyAftertouch { channel, .. }
            | MidiEvent::ControlChange { channel, .. }
            | MidiEvent::ProgramChange { channel, .. }
            | MidiEvent::ChannelAftertouch { channel, .. }
            | MidiEvent::PitchBend { channel, .. } => Some(channel),
            _ => None,
        }
    }

    /// Copy of this message on another channel.
    ///
    /// System messages are returned unchanged.
    pub fn with_channel(&self, new_channel: u8) -> Self {
        let ch = new_channel & 0x0F;
        match self.clone() {
            MidiEvent::NoteOn { note, velocity, .. } => MidiEvent::NoteOn { channel: ch, note, velocity },
            MidiEvent::NoteOff { note, velocity, .. } => MidiEvent::NoteOff { channel: ch, note, velocity },
            MidiEvent::PolyAftertouch { note, pressure, .. } => {
                MidiEvent::PolyAftertouch { channel: ch, note, pressure }
            }
            MidiEvent::ControlChange { controller, value, .. } => {
                MidiEvent::ControlChange { channel: ch, controller, value }
            }
            MidiEvent::ProgramChange { program, .. } => MidiEvent::ProgramChange { channel: ch, program },
            MidiEvent::ChannelAftertouch { pressure, .. } => {
                MidiEvent::ChannelAftertouch { channel: ch, pressure }
            }
            MidiEvent::PitchBend { value, .. } => MidiEvent::PitchBend { channel: ch, value },
            other => other,
        }
    }

    /// Copy of a Note On/Off with a different note number.
    ///
    /// Other messages are returned unchanged.
    pub fn with_note(&self, new_note: u8) -> Self {
        let note = new_note & 0x7F;
        match *self {
            MidiEvent::NoteOn { channel, velocity, .. } => MidiEvent::NoteOn { channel, note, velocity },
            MidiEvent::NoteOff { channel, velocity, .. } => MidiEvent::NoteOff { channel, note, velocity },
            _ => self.clone(),
        }
    }

    /// Note number of a Note On/Off
    pub fn note(&self) -> Option<u8> {
        match *self {
            MidiEvent::NoteOn { note, .. } | MidiEvent::NoteOff { note, .. } => Some(note),
            _ => None,
        }
    }

    /// Check if this is a Note On or Note Off
    pub fn is_note(&self) -> bool {
        matches!(self, MidiEvent::NoteOn { .. } | MidiEvent::NoteOff { .. })
    }

    /// Check if this is a channel-voice message
    pub fn is_channel_voice(&self) -> bool {
        self.channel().is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_note_on() {
        assert_eq!(
            MidiEvent::parse(&[0x90, 60, 100]),
            MidiEvent::NoteOn {
                channel: 0,
                note: 60,
                velocity: 100
            }
        );
    }

    #[test]
    fn test_parse_note_on_velocity_zero() {
        // Note On with velocity 0 should be treated as Note Off
        assert_eq!(
            MidiEvent::parse(&[0x93, 60, 0]),
            MidiEvent::NoteOff {
                channel: 3,
                note: 60,
                velocity: 0
            }
        );
    }

    #[test]
    fn test_parse_note_off() {
        assert_eq!(
            MidiEvent::parse(&[0x80, 60, 64]),
            MidiEvent::NoteOff {
                channel: 0,
                note: 60,
                velocity: 64
            }
        );
    }

    #[test]
    fn test_parse_control_and_program_change() {
        assert_eq!(
            MidiEvent::parse(&[0xB1, 1, 64]),
            MidiEvent::ControlChange {
                channel: 1,
                controller: 1,
                value: 64
            }
        );
        assert_eq!(
            MidiEvent::parse(&[0xC0, 5]),
            MidiEvent::ProgramChange {
                channel: 0,
                program: 5
            }
        );
    }

    #[test]
    fn test_parse_pitch_bend() {
        // Center position (0)
        assert_eq!(
            MidiEvent::parse(&[0xE0, 0x00, 0x40]),
            MidiEvent::PitchBend { channel: 0, value: 0 }
        );
        assert_eq!(
            MidiEvent::parse(&[0xE0, 0x7F, 0x7F]),
            MidiEvent::PitchBend { channel: 0, value: 8191 }
        );
    }

    #[test]
    fn test_parse_aftertouch() {
        assert_eq!(
            MidiEvent::parse(&[0xD2, 33]),
            MidiEvent::ChannelAftertouch {
                channel: 2,
                pressure: 33
            }
        );
        assert_eq!(
            MidiEvent::parse(&[0xA0, 60, 20]),
            MidiEvent::PolyAftertouch {
                channel: 0,
                note: 60,
                pressure: 20
            }
        );
    }

    #[test]
    fn test_parse_real_time_messages() {
        assert_eq!(
            MidiEvent::parse(&[0xF8]),
            MidiEvent::RealTime(RealTimeMessage::TimingClock)
        );
        assert_eq!(MidiEvent::parse(&[0xFA]), MidiEvent::RealTime(RealTimeMessage::Start));
        assert_eq!(MidiEvent::parse(&[0xFB]), MidiEvent::RealTime(RealTimeMessage::Continue));
        assert_eq!(MidiEvent::parse(&[0xFC]), MidiEvent::RealTime(RealTimeMessage::Stop));
        assert_eq!(
            MidiEvent::parse(&[0xFE]),
            MidiEvent::RealTime(RealTimeMessage::ActiveSensing)
        );
        assert_eq!(
            MidiEvent::parse(&[0xFF]),
            MidiEvent::RealTime(RealTimeMessage::SystemReset)
        );
    }

    #[test]
    fn test_parse_sysex_and_system_common() {
        let sysex = [0xF0, 0x43, 0x10, 0x4C, 0x04, 0x00, 0x0C, 0x40, 0xF7];
        assert_eq!(MidiEvent::parse(&sysex), MidiEvent::SystemExclusive(sysex.to_vec()));
        assert_eq!(
            MidiEvent::parse(&[0xF2, 0x10, 0x01]),
            MidiEvent::SystemCommon {
                status: 0xF2,
                data: vec![0x10, 0x01]
            }
        );
    }

    #[test]
    fn test_parse_undefined_bytes() {
        assert_eq!(MidiEvent::parse(&[]), MidiEvent::Undefined(vec![]));
        assert_eq!(MidiEvent::parse(&[0xF9]), MidiEvent::Undefined(vec![0xF9]));
        assert_eq!(MidiEvent::parse(&[0xF4]), MidiEvent::Undefined(vec![0xF4]));
        // Truncated Note On
        assert_eq!(MidiEvent::parse(&[0x90, 60]), MidiEvent::Undefined(vec![0x90, 60]));
    }

    #[test]
    fn test_running_status_is_not_supported() {
        // Data bytes without a status byte
        assert_eq!(MidiEvent::parse(&[60, 100]), MidiEvent::Undefined(vec![60, 100]));
        // Status byte where a data byte should be
        assert_eq!(
            MidiEvent::parse(&[0x90, 0x90, 60]),
            MidiEvent::Undefined(vec![0x90, 0x90, 60])
        );
    }

    #[test]
    fn test_with_channel_returns_new_value() {
        let original = MidiEvent::ProgramChange { channel: 0, program: 12 };
        let moved = original.with_channel(7);

        assert_eq!(moved, MidiEvent::ProgramChange { channel: 7, program: 12 });
        assert_eq!(original.channel(), Some(0));
        assert_eq!(moved.to_bytes(), vec![0xC7, 12]);
    }

    #[test]
    fn test_with_note_only_touches_notes() {
        let on = MidiEvent::NoteOn { channel: 2, note: 60, velocity: 90 };
        assert_eq!(on.with_note(72).note(), Some(72));

        let cc = MidiEvent::ControlChange { channel: 0, controller: 7, value: 100 };
        assert_eq!(cc.with_note(72), cc);
    }

    #[test]
    fn test_to_bytes_matches_wire_format() {
        assert_eq!(
            MidiEvent::NoteOff { channel: 1, note: 64, velocity: 0 }.to_bytes(),
            vec![0x81, 64, 0]
        );
        assert_eq!(MidiEvent::PitchBend { channel: 0, value: 0 }.to_bytes(), vec![0xE0, 0x00, 0x40]);
        assert_eq!(MidiEvent::RealTime(RealTimeMessage::Stop).to_bytes(), vec![0xFC]);
    }
}
