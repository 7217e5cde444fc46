// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Panel buttons reported by the keyboard as SysEx.
//!
//! The Tyros sends a parameter-change SysEx when the Vocal Harmony or
//! Effect button on the microphone panel changes state. The looper uses
//! Vocal Harmony as record intent and Effect as a transpose toggle.

/// Vocal Harmony switched on
pub const VOCAL_HARMONY_ON: [u8; 9] = [0xF0, 0x43, 0x10, 0x4C, 0x04, 0x00, 0x0C, 0x40, 0xF7];
/// Vocal Harmony switched off
pub const VOCAL_HARMONY_OFF: [u8; 9] = [0xF0, 0x43, 0x10, 0x4C, 0x04, 0x00, 0x0C, 0x7F, 0xF7];
/// Effect switched on
pub const EFFECT_ON: [u8; 9] = [0xF0, 0x43, 0x10, 0x4C, 0x03, 0x05, 0x0C, 0x40, 0xF7];
/// Effect switched off
pub const EFFECT_OFF: [u8; 9] = [0xF0, 0x43, 0x10, 0x4C, 0x03, 0x05, 0x0C, 0x7F, 0xF7];

/// A recognised button state change
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Button {
    VocalHarmony(bool),
    Effect(bool),
}

impl Button {
    /// Match a SysEx against the known button patterns
    pub fn decode(sysex: &[u8]) -> Option<Self> {
        if sysex == VOCAL_HARMONY_ON {
            Some(Button::VocalHarmony(true))
        } else if sysex == VOCAL_HARMONY_OFF {
            Some(Button::VocalHarmony(false))
        } else if sysex == EFFECT_ON {
            Some(Button::Effect(true))
        } else if sysex == EFFECT_OFF {
            Some(Button::Effect(false))
        } else {
            None
        }
    }
}

/// What the looper has to do for a button change
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ButtonAction {
    /// Set the record intent flag
    SetVocalHarmony(bool),
    /// Shift every sequence by this many semitones
    Transpose(i16),
}

/// Tracks button state and turns changes into actions
#[derive(Debug, Clone)]
pub struct ButtonHandler {
    effect_on: bool,
    transpose_shift: i16,
}

impl ButtonHandler {
    pub fn new(transpose_shift: i8) -> Self {
        Self {
            effect_on: false,
            transpose_shift: transpose_shift as i16,
        }
    }

    pub fn effect_on(&self) -> bool {
        self.effect_on
    }

    /// Handle a SysEx; `None` if it is not a button or changes nothing.
    ///
    /// Effect ON while already on (and OFF while off) is ignored so the
    /// net transpose is always 0 or the configured shift.
    pub fn handle(&mut self, sysex: &[u8]) -> Option<ButtonAction> {
        match Button::decode(sysex)? {
            Button::VocalHarmony(on) => {
                tracing::info!(on, "vocal harmony button");
                Some(ButtonAction::SetVocalHarmony(on))
            }
            Button::Effect(on) if on == self.effect_on => None,
            Button::Effect(on) => {
                tracing::info!(on, "effect button");
                self.effect_on = on;
                let shift = if on { self.transpose_shift } else { -self.transpose_shift };
                Some(ButtonAction::Transpose(shift))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_patterns() {
        assert_eq!(Button::decode(&VOCAL_HARMONY_ON), Some(Button::VocalHarmony(true)));
        assert_eq!(Button::decode(&VOCAL_HARMONY_OFF), Some(Button::VocalHarmony(false)));
        assert_eq!(Button::decode(&EFFECT_ON), Some(Button::Effect(true)));
        assert_eq!(Button::decode(&EFFECT_OFF), Some(Button::Effect(false)));
        // Same prefix, different address
        assert_eq!(
            Button::decode(&[0xF0, 0x43, 0x10, 0x4C, 0x10, 0x00, 0x0B, 0x7F, 0xF7]),
            None
        );
        assert_eq!(Button::decode(&VOCAL_HARMONY_ON[..8]), None);
    }

    #[test]
    fn test_vocal_harmony_always_reported() {
        let mut handler = ButtonHandler::new(12);
        assert_eq!(
            handler.handle(&VOCAL_HARMONY_ON),
            Some(ButtonAction::SetVocalHarmony(true))
        );
        assert_eq!(
            handler.handle(&VOCAL_HARMONY_ON),
            Some(ButtonAction::SetVocalHarmony(true))
        );
    }

    #[test]
    fn test_effect_toggles_transpose_once() {
        let mut handler = ButtonHandler::new(12);
        assert_eq!(handler.handle(&EFFECT_OFF), None);
        assert_eq!(handler.handle(&EFFECT_ON), Some(ButtonAction::Transpose(12)));
        assert!(handler.effect_on());
        assert_eq!(handler.handle(&EFFECT_ON), None);
        assert_eq!(handler.handle(&EFFECT_OFF), Some(ButtonAction::Transpose(-12)));
        assert!(!handler.effect_on());
    }
}
