// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Engine: the single owner of looper state.
//!
//! Raw input arrives over an mpsc channel in arrival order. Each message
//! is decoded, dispatched to the [`Looper`], and the resulting commands
//! are executed against the output and the player before the next message
//! is taken.

use std::future::Future;
use std::sync::Arc;
use std::time::Instant;

use tokio::sync::mpsc::UnboundedReceiver;

use crate::looper::{Command, Looper};
use crate::midi::{MidiEvent, RawMessage};
use crate::player::{SequencePlayer, SharedOutput};

pub struct Engine {
    looper: Looper,
    player: SequencePlayer,
    output: SharedOutput,
}

impl Engine {
    pub fn new(looper: Looper, output: SharedOutput) -> Self {
        Self {
            looper,
            player: SequencePlayer::new(Arc::clone(&output)),
            output,
        }
    }

    pub fn looper(&self) -> &Looper {
        &self.looper
    }

    pub fn player(&self) -> &SequencePlayer {
        &self.player
    }

    /// Decode and handle one raw message.
    ///
    /// Must be called from within a tokio runtime, loops are spawned on it.
    pub fn process(&mut self, bytes: &[u8], now: Instant) {
        let event = MidiEvent::parse(bytes);
        for command in self.looper.handle(&event, now) {
            self.execute(command);
        }
    }

    fn execute(&mut self, command: Command) {
        match command {
            Command::Send(bytes) => {
                let mut output = self.output.lock().unwrap_or_else(|e| e.into_inner());
                if let Err(e) = output.send(&bytes) {
                    tracing::warn!(error = %e, "dropped passthrough message");
                }
            }
            Command::StartLoop(sequence) => self.player.start(sequence),
            Command::UpdateLoop(sequence) => self.player.update(sequence),
        }
    }

    /// Run until the input closes or `shutdown` resolves.
    ///
    /// All notes off is always sent before returning.
    pub async fn run<F>(mut self, mut input: UnboundedReceiver<RawMessage>, shutdown: F)
    where
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);
        loop {
            tokio::select! {
                message = input.recv() => match message {
                    Some(raw) => self.process(&raw.bytes, raw.received_at),
                    None => {
                        tracing::info!("MIDI input closed");
                        break;
                    }
                },
                _ = &mut shutdown => {
                    tracing::info!("shutdown requested");
                    break;
                }
            }
        }
        self.player.shutdown();
    }
}
