// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Sequence recorder and channel allocator.
//!
//! Recording is segmented by MIDI Clock: every `ticks_per_sequence` ticks
//! the open sequence is cut, committed to the next free output channel
//! and handed to the player. The Vocal Harmony flag decides whether a new
//! sequence opens at the cut.
//!
//! Notes held across a cut get a synthetic Note Off at the end of the
//! sequence they started in. A note still held at the following cut is an
//! organ point: its Note On (and that synthetic Note Off) are removed from
//! the origin sequence so the loop does not re-attack it every cycle.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Instant;

use super::sequence::{PendingNote, Sequence};
use super::Command;
use crate::error::LooperError;
use crate::midi::{MidiEvent, CHANNEL_COUNT};
use crate::timing::PPQN;

/// Observable recorder state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecorderStatus {
    /// No sequence open
    Idle,
    /// A sequence is open on this channel
    Recording(u8),
}

/// Owned recorder state, mutated only through the event methods
#[derive(Debug)]
pub struct Recorder {
    /// Clock ticks per sequence
    ticks_per_sequence: u32,
    /// Next channel to bind; only ever increases
    recording_channel: u8,
    /// Between Start/Continue and Stop
    clock_running: bool,
    /// Start seen, the next clock is position zero
    awaiting_downbeat: bool,
    ticks_since_boundary: u32,
    /// Sequence currently accumulating events
    open: Option<Sequence>,
    /// Committed sequences, indexed by channel
    sequences: Vec<Arc<Sequence>>,
    /// Note Ons awaiting a Note Off, keyed by (input channel, note)
    pending: BTreeMap<(u8, u8), PendingNote>,
    vocal_harmony_on: bool,
    /// Global transpose applied to every sequence
    transpose: i16,
    capacity_reported: bool,
}

impl Recorder {
    /// Create a recorder cutting every `quarter_notes_per_sequence` beats
    pub fn new(quarter_notes_per_sequence: u32) -> Self {
        Self {
            ticks_per_sequence: quarter_notes_per_sequence.max(1) * PPQN,
            recording_channel: 0,
            clock_running: false,
            awaiting_downbeat: false,
            ticks_since_boundary: 0,
            open: None,
            sequences: Vec::new(),
            pending: BTreeMap::new(),
            vocal_harmony_on: false,
            transpose: 0,
            capacity_reported: false,
        }
    }

    pub fn status(&self) -> RecorderStatus {
        match &self.open {
            Some(seq) => RecorderStatus::Recording(seq.channel()),
            None => RecorderStatus::Idle,
        }
    }

    pub fn is_recording(&self) -> bool {
        self.open.is_some()
    }

    /// First channel not bound to a loop (16 when all are taken)
    pub fn recording_channel(&self) -> u8 {
        self.recording_channel
    }

    /// All channels are bound to loops
    pub fn is_full(&self) -> bool {
        self.recording_channel >= CHANNEL_COUNT
    }

    pub fn is_clock_running(&self) -> bool {
        self.clock_running
    }

    pub fn ticks_per_sequence(&self) -> u32 {
        self.ticks_per_sequence
    }

    pub fn ticks_since_boundary(&self) -> u32 {
        self.ticks_since_boundary
    }

    /// Committed sequences, index = channel
    pub fn sequences(&self) -> &[Arc<Sequence>] {
        &self.sequences
    }

    /// Sequence currently recording
    pub fn open_sequence(&self) -> Option<&Sequence> {
        self.open.as_ref()
    }

    pub fn pending_notes(&self) -> impl Iterator<Item = (&(u8, u8), &PendingNote)> {
        self.pending.iter()
    }

    pub fn vocal_harmony_on(&self) -> bool {
        self.vocal_harmony_on
    }

    pub fn transpose(&self) -> i16 {
        self.transpose
    }

    /// Record the Vocal Harmony button state; acted on at the next boundary
    pub fn set_vocal_harmony(&mut self, on: bool) {
        if on && !self.vocal_harmony_on {
            self.capacity_reported = false;
        }
        self.vocal_harmony_on = on;
    }

    /// Transport Start: reset the bar count and open a sequence.
    ///
    /// The sequence is re-anchored on the first clock, which marks the
    /// downbeat.
    pub fn start(&mut self, now: Instant) {
        self.discard_open();
        self.clock_running = true;
        self.awaiting_downbeat = true;
        self.ticks_since_boundary = 0;
        self.capacity_reported = false;
        self.open_new(now);
    }

    /// Transport Continue: resume tick counting
    pub fn resume(&mut self) {
        self.clock_running = true;
    }

    /// Transport Stop: drop the partial sequence without playing it
    pub fn stop(&mut self) {
        self.clock_running = false;
        self.awaiting_downbeat = false;
        self.ticks_since_boundary = 0;
        self.discard_open();
    }

    /// MIDI Clock tick
    pub fn tick(&mut self, now: Instant, commands: &mut Vec<Command>) {
        if !self.clock_running {
            return;
        }
        if self.awaiting_downbeat {
            self.awaiting_downbeat = false;
            if let Some(seq) = self.open.as_mut() {
                seq.rebase(now);
            }
            return;
        }
        self.ticks_since_boundary += 1;
        if self.ticks_since_boundary < self.ticks_per_sequence {
            return;
        }
        self.ticks_since_boundary = 0;

        if self.open.is_some() {
            self.cut(now, commands);
        }
        if self.vocal_harmony_on {
            self.open_new(now);
        }
    }

    /// Record a channel-voice message from the monitored channel
    pub fn record(&mut self, event: &MidiEvent, now: Instant) {
        match *event {
            MidiEvent::NoteOn { channel, note, .. } => self.note_on(event, channel, note, now),
            MidiEvent::NoteOff { channel, note, .. } => self.note_off(event, channel, note, now),
            _ => {
                if let Some(seq) = self.open.as_mut() {
                    let offset = now.saturating_duration_since(seq.started_at());
                    seq.push(event.with_channel(seq.channel()), offset);
                }
            }
        }
    }

    /// Shift every stored and future note
    pub fn transpose_all(&mut self, semitones: i16, commands: &mut Vec<Command>) {
        self.transpose += semitones;
        if let Some(seq) = self.open.as_mut() {
            seq.transpose_by(semitones);
        }
        for seq in self.sequences.iter_mut() {
            Arc::make_mut(seq).transpose_by(semitones);
            commands.push(Command::UpdateLoop(Arc::clone(seq)));
        }
        tracing::info!(transpose = self.transpose, "transposed all sequences");
    }

    fn note_on(&mut self, event: &MidiEvent, in_channel: u8, note: u8, now: Instant) {
        let Some(seq) = self.open.as_mut() else {
            return;
        };
        let offset = now.saturating_duration_since(seq.started_at());

        // Re-attack without release: close the earlier note first
        if let Some(previous) = self.pending.get(&(in_channel, note)) {
            if previous.origin == seq.channel() {
                let off = MidiEvent::NoteOff { channel: seq.channel(), note, velocity: 0 };
                seq.push(off, offset);
            }
        }

        let on_index = seq.push(event.with_channel(seq.channel()), offset);
        self.pending.insert(
            (in_channel, note),
            PendingNote {
                origin: seq.channel(),
                on_index,
                off_index: None,
            },
        );
    }

    fn note_off(&mut self, event: &MidiEvent, in_channel: u8, note: u8, now: Instant) {
        let open_channel = self.open.as_ref().map(|seq| seq.channel());
        match self.pending.remove(&(in_channel, note)) {
            Some(pending) if Some(pending.origin) == open_channel => {
                if let Some(seq) = self.open.as_mut() {
                    let offset = now.saturating_duration_since(seq.started_at());
                    seq.push(event.with_channel(seq.channel()), offset);
                }
            }
            Some(pending) => {
                // The origin already ends with a synthetic Note Off
                tracing::debug!(note, origin = pending.origin, "note from earlier sequence released");
            }
            None if open_channel.is_some() => {
                let err = LooperError::UnpairedNoteOff { channel: in_channel, note };
                tracing::debug!(error = %err, "discarding note off");
            }
            None => {}
        }
    }

    fn open_new(&mut self, now: Instant) {
        if let Err(err) = self.try_open(now) {
            if !self.capacity_reported {
                tracing::warn!(error = %err, "cannot start a new sequence");
                self.capacity_reported = true;
            } else {
                tracing::debug!(error = %err, "cannot start a new sequence");
            }
        }
    }

    fn try_open(&mut self, now: Instant) -> Result<(), LooperError> {
        if self.is_full() {
            return Err(LooperError::CapacityExceeded { channels: CHANNEL_COUNT });
        }
        tracing::info!(channel = self.recording_channel, "recording sequence");
        self.open = Some(Sequence::new(self.recording_channel, now, self.transpose));
        Ok(())
    }

    fn discard_open(&mut self) {
        if let Some(seq) = self.open.take() {
            self.pending.retain(|_, p| p.origin != seq.channel());
            tracing::info!(channel = seq.channel(), items = seq.len(), "discarded partial sequence");
        }
    }

    /// Freeze the open sequence at a boundary and commit it if it holds notes
    fn cut(&mut self, now: Instant, commands: &mut Vec<Command>) {
        let Some(mut seq) = self.open.take() else {
            return;
        };
        let channel = seq.channel();
        let cut_offset = now.saturating_duration_since(seq.started_at());

        self.remove_organ_points(channel, commands);

        for pending in self.pending.values_mut().filter(|p| p.origin == channel) {
            let Some(note) = seq.items()[pending.on_index].event.note() else {
                continue;
            };
            let off = MidiEvent::NoteOff { channel, note, velocity: 0 };
            pending.off_index = Some(seq.push(off, cut_offset));
        }
        seq.freeze(cut_offset);

        if !seq.has_notes() {
            tracing::info!(channel, "silent take discarded");
            return;
        }

        let seq = Arc::new(seq);
        self.sequences.push(Arc::clone(&seq));
        self.recording_channel += 1;
        tracing::info!(
            channel,
            items = seq.len(),
            duration_ms = seq.duration().as_millis() as u64,
            "sequence committed"
        );
        commands.push(Command::StartLoop(seq));
    }

    /// Notes held since an earlier sequence lose their Note On there
    fn remove_organ_points(&mut self, current: u8, commands: &mut Vec<Command>) {
        let mut removals: BTreeMap<u8, Vec<usize>> = BTreeMap::new();
        self.pending.retain(|&(_, note), p| {
            if p.origin == current {
                return true;
            }
            tracing::debug!(note, origin = p.origin, "organ point, removing sustained note");
            let indices = removals.entry(p.origin).or_default();
            indices.push(p.on_index);
            indices.extend(p.off_index);
            false
        });

        for (origin, indices) in removals {
            if let Some(seq) = self.sequences.get_mut(origin as usize) {
                Arc::make_mut(seq).remove_items(indices);
                commands.push(Command::UpdateLoop(Arc::clone(seq)));
            }
        }
    }
}
