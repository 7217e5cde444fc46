// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Loop playback.
//!
//! Each committed sequence plays on its own tokio task. A cycle sends
//! every item at `cycle_start + offset`; the next cycle starts exactly one
//! sequence duration later, so timing error does not accumulate.
//!
//! The task reads its sequence through a watch channel. Updates (organ
//! point removal, transposition) are picked up at the next cycle.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{sleep_until, Instant};

use crate::looper::Sequence;
use crate::midi::{all_notes_off, MidiOutput};

/// Output shared between the engine and the loop tasks
pub type SharedOutput = Arc<Mutex<dyn MidiOutput>>;

struct PlayingLoop {
    sequence: watch::Sender<Arc<Sequence>>,
    task: JoinHandle<()>,
}

/// Plays committed sequences until shut down
pub struct SequencePlayer {
    output: SharedOutput,
    loops: BTreeMap<u8, PlayingLoop>,
}

impl SequencePlayer {
    pub fn new(output: SharedOutput) -> Self {
        Self {
            output,
            loops: BTreeMap::new(),
        }
    }

    /// Start looping `sequence` on its channel, beginning now.
    ///
    /// Must be called from within a tokio runtime.
    pub fn start(&mut self, sequence: Arc<Sequence>) {
        let channel = sequence.channel();
        if sequence.duration().is_zero() {
            tracing::warn!(channel, "refusing to loop a sequence without length");
            return;
        }
        if let Some(previous) = self.loops.remove(&channel) {
            previous.task.abort();
        }

        let (sender, receiver) = watch::channel(sequence);
        let task = tokio::spawn(run_loop(receiver, Arc::clone(&self.output)));
        self.loops.insert(channel, PlayingLoop { sequence: sender, task });
        tracing::info!(channel, "loop playback started");
    }

    /// Replace the content of a playing loop from its next cycle on
    pub fn update(&mut self, sequence: Arc<Sequence>) {
        match self.loops.get(&sequence.channel()) {
            Some(playing) => {
                playing.sequence.send_replace(sequence);
            }
            None => tracing::warn!(channel = sequence.channel(), "update for a channel that is not looping"),
        }
    }

    /// Channels with a loop task
    pub fn playing_channels(&self) -> Vec<u8> {
        self.loops.keys().copied().collect()
    }

    pub fn is_playing(&self, channel: u8) -> bool {
        self.loops.contains_key(&channel)
    }

    /// Cancel every loop task
    pub fn stop_all(&mut self) {
        for (_, playing) in std::mem::take(&mut self.loops) {
            playing.task.abort();
        }
    }

    /// Cancel every loop and silence all notes on all channels
    pub fn shutdown(&mut self) {
        let count = self.loops.len();
        self.stop_all();
        let mut output = self.output.lock().unwrap_or_else(|e| e.into_inner());
        all_notes_off(&mut *output);
        tracing::info!(loops = count, "playback stopped, all notes off sent");
    }
}

impl Drop for SequencePlayer {
    fn drop(&mut self) {
        self.stop_all();
    }
}

async fn run_loop(mut sequence: watch::Receiver<Arc<Sequence>>, output: SharedOutput) {
    let mut cycle_start = Instant::now();
    loop {
        let current = Arc::clone(&sequence.borrow_and_update());
        let channel = current.channel();

        for (offset, bytes) in current.rendered() {
            sleep_until(cycle_start + offset).await;
            send(&output, channel, &bytes);
        }

        cycle_start += current.duration();
        sleep_until(cycle_start).await;
    }
}

fn send(output: &SharedOutput, channel: u8, bytes: &[u8]) {
    let mut output = output.lock().unwrap_or_else(|e| e.into_inner());
    if let Err(e) = output.send(bytes) {
        tracing::warn!(channel, error = %e, "dropped loop message");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::LooperError;
    use crate::midi::testing::MockMidiOutput;
    use crate::midi::MidiEvent;
    use std::time::Duration;

    fn sequence(channel: u8) -> Sequence {
        let mut seq = Sequence::new(channel, std::time::Instant::now(), 0);
        seq.push(MidiEvent::NoteOn { channel, note: 60, velocity: 100 }, Duration::ZERO);
        seq.push(
            MidiEvent::NoteOff { channel, note: 60, velocity: 0 },
            Duration::from_millis(200),
        );
        seq.freeze(Duration::from_millis(8000));
        seq
    }

    fn player() -> (SequencePlayer, MockMidiOutput) {
        let mock = MockMidiOutput::new();
        let output: SharedOutput = Arc::new(Mutex::new(mock.clone()));
        (SequencePlayer::new(output), mock)
    }

    #[tokio::test(start_paused = true)]
    async fn test_loop_repeats_every_duration() {
        let (mut player, mock) = player();
        player.start(Arc::new(sequence(0)));

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(mock.get_messages(), vec![vec![0x90, 60, 100]]);

        tokio::time::sleep(Duration::from_millis(8000)).await;
        assert_eq!(
            mock.get_messages(),
            vec![vec![0x90, 60, 100], vec![0x80, 60, 0], vec![0x90, 60, 100]]
        );
        assert!(player.is_playing(0));
    }

    #[tokio::test(start_paused = true)]
    async fn test_update_applies_on_next_cycle() {
        let (mut player, mock) = player();
        player.start(Arc::new(sequence(1)));
        tokio::time::sleep(Duration::from_millis(100)).await;

        let mut shifted = sequence(1);
        shifted.transpose_by(12);
        player.update(Arc::new(shifted));

        tokio::time::sleep(Duration::from_millis(8000)).await;
        let sent = mock.get_messages();
        assert_eq!(sent[1], vec![0x81, 60, 0]);
        assert_eq!(sent[2], vec![0x91, 72, 100]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_cancels_and_silences() {
        let (mut player, mock) = player();
        player.start(Arc::new(sequence(0)));
        player.start(Arc::new(sequence(1)));
        assert_eq!(player.playing_channels(), vec![0, 1]);
        tokio::time::sleep(Duration::from_millis(100)).await;

        player.shutdown();
        let after_shutdown = mock.get_messages().len();
        assert_eq!(after_shutdown, 2 + 16 * 128);
        assert!(player.playing_channels().is_empty());

        tokio::time::sleep(Duration::from_millis(20_000)).await;
        assert_eq!(mock.get_messages().len(), after_shutdown);
    }

    #[tokio::test(start_paused = true)]
    async fn test_zero_length_sequence_is_not_played() {
        let (mut player, _mock) = player();
        let open = Sequence::new(0, std::time::Instant::now(), 0);
        player.start(Arc::new(open));
        assert!(!player.is_playing(0));
    }

    struct FailingOutput;

    impl MidiOutput for FailingOutput {
        fn send(&mut self, _message: &[u8]) -> Result<(), LooperError> {
            Err(LooperError::Backend("device unplugged".to_string()))
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_send_errors_do_not_stop_loop() {
        let output: SharedOutput = Arc::new(Mutex::new(FailingOutput));
        let mut player = SequencePlayer::new(output);
        player.start(Arc::new(sequence(0)));

        tokio::time::sleep(Duration::from_millis(16_500)).await;
        assert!(player.is_playing(0));
        assert!(!player.loops[&0].task.is_finished());
    }
}
