// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Registration Memory selection detection.
//!
//! When a Registration Memory button is pressed the Tyros sends Bank
//! Select MSB/LSB followed by a Program Change 0-7 on its song channel.
//! MSB/LSB identify the registration bank file, the program the button.

use crate::midi::MidiEvent;

const BANK_SELECT_MSB: u8 = 0;
const BANK_SELECT_LSB: u8 = 32;

/// Registration Memory buttons per bank
pub const BUTTONS_PER_BANK: u8 = 8;

/// A selected registration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegistrationSelect {
    /// Bank index, `msb << 8 | lsb`
    pub bank_index: u16,
    /// Button number 0-7
    pub button: u8,
}

/// Watches one channel for registration changes
#[derive(Debug, Clone)]
pub struct RegistrationWatcher {
    channel: u8,
    msb: Option<u8>,
    lsb: Option<u8>,
}

impl RegistrationWatcher {
    pub fn new(channel: u8) -> Self {
        Self {
            channel,
            msb: None,
            lsb: None,
        }
    }

    /// Feed a channel-voice message
    pub fn observe(&mut self, event: &MidiEvent) -> Option<RegistrationSelect> {
        if event.channel() != Some(self.channel) {
            return None;
        }
        match *event {
            MidiEvent::ControlChange { controller: BANK_SELECT_MSB, value, .. } => {
                self.msb = Some(value);
                None
            }
            MidiEvent::ControlChange { controller: BANK_SELECT_LSB, value, .. } => {
                self.lsb = Some(value);
                None
            }
            MidiEvent::ProgramChange { program, .. } if program < BUTTONS_PER_BANK => {
                let msb = self.msb.filter(|msb| *msb <= 3)?;
                let lsb = self.lsb?;
                let select = RegistrationSelect {
                    bank_index: (msb as u16) << 8 | lsb as u16,
                    button: program,
                };
                tracing::info!(bank = select.bank_index, button = select.button, "registration selected");
                Some(select)
            }
            _ => None,
        }
    }
}
