// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Live MIDI looper for the Yamaha Tyros.
//!
//! The performance on one input channel is cut into sequences at fixed
//! clock-tick boundaries. Each committed sequence is bound to the next free
//! output channel and replayed in a loop, up to sixteen at once.

pub mod config;
pub mod engine;
pub mod error;
pub mod looper;
pub mod midi;
pub mod player;
pub mod timing;

pub use config::LooperConfig;
pub use engine::Engine;
pub use error::LooperError;
pub use looper::{Command, Looper};
pub use midi::{MidiEvent, MidiOutput};
pub use player::{SequencePlayer, SharedOutput};
