// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Live looper core.
//!
//! This module provides:
//! - Sequence recording segmented by MIDI Clock
//! - Channel allocation across the 16 output channels
//! - Panel button handling (record intent, transpose)
//! - Live passthrough of voice changes to free channels
//!
//! [`Looper::handle`] is the single entry point. It never performs I/O;
//! it returns [`Command`]s for the engine to execute.

pub mod buttons;
pub mod recorder;
pub mod registration;
pub mod router;
pub mod sequence;

pub use buttons::{Button, ButtonAction, ButtonHandler};
pub use recorder::{Recorder, RecorderStatus};
pub use registration::{RegistrationSelect, RegistrationWatcher};
pub use sequence::{LoopItem, PendingNote, Sequence};

use std::sync::Arc;
use std::time::Instant;

use crate::config::LooperConfig;
use crate::error::LooperError;
use crate::midi::{MidiEvent, RealTimeMessage};
use crate::timing::TempoTracker;

/// Side effect requested by the looper
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// Send raw bytes to the output now
    Send(Vec<u8>),
    /// Begin looping a committed sequence on its channel
    StartLoop(Arc<Sequence>),
    /// Replace the content of a sequence that is already looping
    UpdateLoop(Arc<Sequence>),
}

/// Looper state and event dispatch
pub struct Looper {
    monitored_channel: u8,
    recorder: Recorder,
    buttons: ButtonHandler,
    tempo: TempoTracker,
    registration: RegistrationWatcher,
    last_registration: Option<RegistrationSelect>,
}

impl Looper {
    /// Create a looper from configuration
    pub fn new(config: &LooperConfig) -> Self {
        Self {
            monitored_channel: config.monitored_channel,
            recorder: Recorder::new(config.quarter_notes_per_sequence),
            buttons: ButtonHandler::new(config.transpose_shift),
            tempo: TempoTracker::new(),
            registration: RegistrationWatcher::new(config.registration_channel),
            last_registration: None,
        }
    }

    pub fn recorder(&self) -> &Recorder {
        &self.recorder
    }

    pub fn tempo(&self) -> &TempoTracker {
        &self.tempo
    }

    pub fn buttons(&self) -> &ButtonHandler {
        &self.buttons
    }

    pub fn monitored_channel(&self) -> u8 {
        self.monitored_channel
    }

    /// Most recent Registration Memory selection
    pub fn last_registration(&self) -> Option<RegistrationSelect> {
        self.last_registration
    }

    /// Process one decoded message received at `now`
    pub fn handle(&mut self, event: &MidiEvent, now: Instant) -> Vec<Command> {
        let mut commands = Vec::new();

        match event {
            MidiEvent::RealTime(rt) => self.handle_real_time(*rt, now, &mut commands),
            MidiEvent::SystemExclusive(bytes) => self.handle_sysex(bytes, &mut commands),
            MidiEvent::SystemCommon { status, .. } => {
                tracing::trace!(status, "system common ignored");
            }
            MidiEvent::Undefined(bytes) => {
                if !bytes.is_empty() {
                    let err = LooperError::MalformedMessage(bytes.clone());
                    tracing::debug!(error = %err, "ignoring message");
                }
            }
            voice => self.handle_channel_voice(voice, now, &mut commands),
        }

        commands
    }

    fn handle_real_time(&mut self, rt: RealTimeMessage, now: Instant, commands: &mut Vec<Command>) {
        match rt {
            RealTimeMessage::TimingClock => {
                self.tempo.observe_clock(now);
                self.recorder.tick(now, commands);
            }
            RealTimeMessage::Start => {
                tracing::info!("transport start");
                self.tempo.reset_clock();
                self.recorder.start(now);
            }
            RealTimeMessage::Continue => {
                tracing::info!("transport continue");
                self.recorder.resume();
            }
            RealTimeMessage::Stop => {
                tracing::info!("transport stop");
                self.recorder.stop();
            }
            RealTimeMessage::ActiveSensing | RealTimeMessage::SystemReset => {}
        }
    }

    fn handle_sysex(&mut self, bytes: &[u8], commands: &mut Vec<Command>) {
        match self.buttons.handle(bytes) {
            Some(ButtonAction::SetVocalHarmony(on)) => self.recorder.set_vocal_harmony(on),
            Some(ButtonAction::Transpose(shift)) => self.recorder.transpose_all(shift, commands),
            None => {
                if self.tempo.observe_sysex(bytes).is_none() {
                    tracing::trace!(len = bytes.len(), "sysex ignored");
                }
            }
        }
    }

    fn handle_channel_voice(&mut self, event: &MidiEvent, now: Instant, commands: &mut Vec<Command>) {
        if let Some(select) = self.registration.observe(event) {
            self.last_registration = Some(select);
        }

        if event.channel() != Some(self.monitored_channel) {
            return;
        }
        for routed in router::passthrough(event, self.recorder.recording_channel()) {
            commands.push(Command::Send(routed.to_bytes()));
        }
        self.recorder.record(event, now);
    }
}
