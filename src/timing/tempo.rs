// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Tempo tracking.
//!
//! Two independent sources are tracked:
//! - the Yamaha tempo SysEx (`F0 43 7E 01 ...`), sent when the tempo
//!   changes on the keyboard
//! - the arrival rate of MIDI Clock ticks, averaged over one bar
//!
//! Sequence length is measured in clock ticks, so neither value drives the
//! looper. They are kept for diagnostics.

use std::collections::VecDeque;
use std::time::{Duration, Instant};

/// Pulses Per Quarter Note - MIDI standard is 24
pub const PPQN: u32 = 24;

/// Header of the Yamaha tempo SysEx
pub const TEMPO_SYSEX_HEADER: [u8; 4] = [0xF0, 0x43, 0x7E, 0x01];

/// Rolling window for clock-derived BPM (1 bar at 24 ppqn in 4/4)
const BPM_WINDOW_CLOCKS: usize = 96;

/// Decode the BPM carried by a Yamaha tempo SysEx.
///
/// The four bytes after the header are 7-bit groups of the quarter-note
/// length in microseconds.
pub fn decode_tempo_sysex(bytes: &[u8]) -> Option<f64> {
    if bytes.len() < TEMPO_SYSEX_HEADER.len() + 4 || bytes[..4] != TEMPO_SYSEX_HEADER {
        return None;
    }
    let b = &bytes[4..8];
    let micros = (b[0] as u32) << 21 | (b[1] as u32) << 14 | (b[2] as u32) << 7 | b[3] as u32;
    if micros == 0 {
        return None;
    }
    Some(60_000_000.0 / micros as f64)
}

/// Tempo state observed from the input stream
#[derive(Debug, Clone, Default)]
pub struct TempoTracker {
    /// Last tempo announced by SysEx
    sysex_bpm: Option<f64>,
    /// Arrival times of the most recent clock ticks
    clock_times: VecDeque<Instant>,
}

impl TempoTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed a SysEx message; returns the new BPM if it was a tempo message
    pub fn observe_sysex(&mut self, bytes: &[u8]) -> Option<f64> {
        let bpm = decode_tempo_sysex(bytes)?;
        if self.sysex_bpm.map_or(true, |old| (old - bpm).abs() >= 0.01) {
            tracing::info!(bpm = format!("{:.2}", bpm), "tempo changed on keyboard");
        }
        self.sysex_bpm = Some(bpm);
        Some(bpm)
    }

    /// Feed a MIDI Clock tick arrival time
    pub fn observe_clock(&mut self, now: Instant) {
        if self.clock_times.len() == BPM_WINDOW_CLOCKS {
            self.clock_times.pop_front();
        }
        self.clock_times.push_back(now);
    }

    /// Forget clock history (on transport Start)
    pub fn reset_clock(&mut self) {
        self.clock_times.clear();
    }

    /// Tempo from the last tempo SysEx
    pub fn sysex_bpm(&self) -> Option<f64> {
        self.sysex_bpm
    }

    /// Average interval between clock ticks over the window
    pub fn tick_interval(&self) -> Option<Duration> {
        let (first, last) = (self.clock_times.front()?, self.clock_times.back()?);
        let intervals = self.clock_times.len().checked_sub(1).filter(|&n| n > 0)?;
        let elapsed = last.saturating_duration_since(*first);
        if elapsed.is_zero() {
            return None;
        }
        Some(elapsed / intervals as u32)
    }

    /// Tempo derived from clock tick arrival
    pub fn clock_bpm(&self) -> Option<f64> {
        let interval = self.tick_interval()?.as_secs_f64();
        Some(60.0 / (interval * PPQN as f64))
    }

    /// Best known tempo, preferring measured clock
    pub fn bpm(&self) -> Option<f64> {
        self.clock_bpm().or(self.sysex_bpm)
    }
}
