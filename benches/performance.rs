// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Performance benchmarks for tyros-looper
//!
//! Run with: cargo bench
//!
//! These benchmarks measure:
//! - Decoding throughput for typical keyboard traffic
//! - Looper dispatch cost per clock tick and per note
//! - Cut cost for sequences of increasing size

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use std::time::{Duration, Instant};

use tyros_looper::midi::RealTimeMessage;
use tyros_looper::{Looper, LooperConfig, MidiEvent};

const TICK: Duration = Duration::from_micros(20_833);

/// Benchmark decoding of the messages the keyboard sends most often
fn bench_decode(c: &mut Criterion) {
    let mut group = c.benchmark_group("decode");

    let messages: [(&str, Vec<u8>); 4] = [
        ("clock", vec![0xF8]),
        ("note_on", vec![0x90, 60, 100]),
        ("control_change", vec![0xB0, 7, 100]),
        ("sysex", vec![0xF0, 0x43, 0x10, 0x4C, 0x04, 0x00, 0x0C, 0x7F, 0xF7]),
    ];
    for (name, bytes) in messages.iter() {
        group.bench_with_input(BenchmarkId::from_parameter(name), bytes, |b, bytes| {
            b.iter(|| black_box(MidiEvent::parse(black_box(bytes))))
        });
    }

    group.finish();
}

/// Benchmark dispatch of a clock tick while recording (the hot path)
fn bench_tick_dispatch(c: &mut Criterion) {
    let mut looper = Looper::new(&LooperConfig::default());
    let mut now = Instant::now();
    looper.handle(&MidiEvent::RealTime(RealTimeMessage::Start), now);
    let clock = MidiEvent::RealTime(RealTimeMessage::TimingClock);

    c.bench_function("tick_dispatch", |b| {
        b.iter(|| {
            now += TICK;
            black_box(looper.handle(&clock, now))
        })
    });
}

/// Benchmark the boundary cut for takes of increasing density
fn bench_cut(c: &mut Criterion) {
    let mut group = c.benchmark_group("cut");

    for notes in [16u32, 256, 2048].iter() {
        group.bench_with_input(BenchmarkId::new("notes", notes), notes, |b, &notes| {
            b.iter_batched(
                || {
                    let config = LooperConfig {
                        quarter_notes_per_sequence: 1,
                        ..Default::default()
                    };
                    let mut looper = Looper::new(&config);
                    let mut now = Instant::now();
                    let clock = MidiEvent::RealTime(RealTimeMessage::TimingClock);
                    looper.handle(&MidiEvent::RealTime(RealTimeMessage::Start), now);
                    looper.handle(&clock, now);
                    for i in 0..notes {
                        let note = (i % 128) as u8;
                        now += Duration::from_micros(100);
                        looper.handle(&MidiEvent::NoteOn { channel: 0, note, velocity: 90 }, now);
                        looper.handle(&MidiEvent::NoteOff { channel: 0, note, velocity: 0 }, now);
                    }
                    for _ in 0..23 {
                        now += TICK;
                        looper.handle(&clock, now);
                    }
                    (looper, now + TICK)
                },
                |(mut looper, now)| {
                    let clock = MidiEvent::RealTime(RealTimeMessage::TimingClock);
                    black_box(looper.handle(&clock, now))
                },
                criterion::BatchSize::SmallInput,
            )
        });
    }

    group.finish();
}

criterion_group!(benches, bench_decode, bench_tick_dispatch, bench_cut);
criterion_main!(benches);
