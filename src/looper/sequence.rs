// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Recorded sequences.
//!
//! A sequence is one loop's worth of timed events bound to one output
//! channel. Items keep the pitch they were played at; the sequence-level
//! transpose is applied when rendering, so shifting up and back down
//! always restores the exact recorded pitches.

use std::time::{Duration, Instant};

use crate::midi::MidiEvent;

/// A recorded event with its offset from the start of the sequence
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoopItem {
    pub event: MidiEvent,
    pub offset: Duration,
}

impl LoopItem {
    pub fn new(event: MidiEvent, offset: Duration) -> Self {
        Self { event, offset }
    }
}

/// One recorded loop
#[derive(Debug, Clone, PartialEq)]
pub struct Sequence {
    /// Output channel (0-15)
    channel: u8,
    /// Wall-clock start of the recording
    started_at: Instant,
    /// Loop length, zero while still recording
    duration: Duration,
    /// Semitones added to every note on output
    transpose: i16,
    items: Vec<LoopItem>,
}

impl Sequence {
    /// Create an empty, open sequence
    pub fn new(channel: u8, started_at: Instant, transpose: i16) -> Self {
        Self {
            channel,
            started_at,
            duration: Duration::ZERO,
            transpose,
            items: Vec::new(),
        }
    }

    pub fn channel(&self) -> u8 {
        self.channel
    }

    pub fn started_at(&self) -> Instant {
        self.started_at
    }

    /// Loop length; zero while the sequence is still open
    pub fn duration(&self) -> Duration {
        self.duration
    }

    pub fn transpose(&self) -> i16 {
        self.transpose
    }

    pub fn items(&self) -> &[LoopItem] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Whether any Note On or Note Off was recorded
    pub fn has_notes(&self) -> bool {
        self.items.iter().any(|item| item.event.is_note())
    }

    /// Offset of the last item, or zero
    pub fn last_offset(&self) -> Duration {
        self.items.last().map_or(Duration::ZERO, |item| item.offset)
    }

    /// Append an item, returning its index.
    ///
    /// Offsets never go backwards; an earlier offset is raised to the
    /// last one.
    pub(crate) fn push(&mut self, event: MidiEvent, offset: Duration) -> usize {
        let offset = offset.max(self.last_offset());
        self.items.push(LoopItem::new(event, offset));
        self.items.len() - 1
    }

    /// Move the start to `started_at`, keeping item times in place.
    ///
    /// Items recorded before the new start collapse onto offset zero.
    pub(crate) fn rebase(&mut self, started_at: Instant) {
        let shift = started_at.saturating_duration_since(self.started_at);
        for item in self.items.iter_mut() {
            item.offset = item.offset.saturating_sub(shift);
        }
        self.started_at = started_at;
    }

    /// Fix the loop length
    pub(crate) fn freeze(&mut self, duration: Duration) {
        self.duration = duration.max(self.last_offset());
    }

    /// Remove items by index
    pub(crate) fn remove_items(&mut self, mut indices: Vec<usize>) {
        indices.sort_unstable_by(|a, b| b.cmp(a));
        indices.dedup();
        for index in indices {
            if index < self.items.len() {
                self.items.remove(index);
            }
        }
    }

    /// Shift every note by `semitones`
    pub fn transpose_by(&mut self, semitones: i16) {
        self.transpose += semitones;
    }

    /// Event as it is sent: transposed and clamped to the MIDI note range
    pub fn output_event(&self, item: &LoopItem) -> MidiEvent {
        match item.event.note() {
            Some(note) if self.transpose != 0 => {
                let shifted = (note as i16 + self.transpose).clamp(0, 127) as u8;
                item.event.with_note(shifted)
            }
            _ => item.event.clone(),
        }
    }

    /// Pitch of a Note On/Off as it is sent
    pub fn output_note(&self, item: &LoopItem) -> Option<u8> {
        self.output_event(item).note()
    }

    /// Offsets and raw bytes of every item, in playback order
    pub fn rendered(&self) -> Vec<(Duration, Vec<u8>)> {
        self.items
            .iter()
            .map(|item| (item.offset, self.output_event(item).to_bytes()))
            .collect()
    }
}

/// A Note On waiting for its Note Off
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PendingNote {
    /// Channel of the sequence the Note On was recorded into
    pub origin: u8,
    /// Index of the Note On within the origin sequence
    pub on_index: usize,
    /// Index of the synthetic Note Off added when the origin was cut
    pub off_index: Option<usize>,
}
