// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Timing module.
//!
//! Tempo observation from the incoming MIDI stream.

pub mod tempo;

pub use tempo::{decode_tempo_sysex, TempoTracker, PPQN};
