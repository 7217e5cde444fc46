// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Live passthrough of voice changes.
//!
//! Program and control changes played on the monitored channel are copied
//! to every channel that is not yet bound to a loop, so the next takes
//! use the sound the performer just selected.

use crate::midi::{MidiEvent, CHANNEL_COUNT};

/// Whether a message is forwarded to free channels
pub fn is_routed(event: &MidiEvent) -> bool {
    matches!(
        event,
        MidiEvent::ControlChange { .. } | MidiEvent::ProgramChange { .. }
    )
}

/// Copies of `event` for every channel from `first_free` through 15
pub fn passthrough(event: &MidiEvent, first_free: u8) -> Vec<MidiEvent> {
    if !is_routed(event) {
        return Vec::new();
    }
    (first_free..CHANNEL_COUNT)
        .map(|channel| event.with_channel(channel))
        .collect()
}
