//! Deterministic peripheral doubles.
//!
//! Used by the unit tests and by the desktop simulator. Time is virtual:
//! [`SimDelay`] advances a shared [`SimClock`] instead of sleeping, and
//! [`SimPin`] stamps every level change with that clock so the buzzer output
//! can be turned back into audio (see [`crate::waveform`]).

use std::cell::Cell;
use std::collections::VecDeque;
use std::rc::Rc;

use crate::hal::{AnalogInput, DelayProvider, DigitalPin, DisplaySurface};

/// Shared virtual time in microseconds.
#[derive(Debug, Clone, Default)]
pub struct SimClock {
    now_us: Rc<Cell<u64>>,
}

impl SimClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn now_us(&self) -> u64 {
        self.now_us.get()
    }

    pub fn advance_us(&self, us: u64) {
        self.now_us.set(self.now_us.get() + us);
    }
}

/// ADC double: hands out queued samples first, then the resting value.
#[derive(Debug, Clone)]
pub struct ScriptedAdc {
    queue: VecDeque<u16>,
    rest: u16,
    /// Number of conversions taken so far
    pub reads: u32,
}

impl ScriptedAdc {
    /// `rest` is returned whenever the queue is empty (0 = stick centered).
    pub fn new(rest: u16) -> Self {
        ScriptedAdc { queue: VecDeque::new(), rest, reads: 0 }
    }

    pub fn push(&mut self, sample: u16) {
        self.queue.push_back(sample);
    }

    pub fn extend<I: IntoIterator<Item = u16>>(&mut self, samples: I) {
        self.queue.extend(samples);
    }

    pub fn set_rest(&mut self, rest: u16) {
        self.rest = rest;
    }

    pub fn pending(&self) -> usize {
        self.queue.len()
    }
}

impl AnalogInput for ScriptedAdc {
    fn read(&mut self) -> u16 {
        self.reads += 1;
        self.queue.pop_front().unwrap_or(self.rest)
    }
}

/// A single pin-level transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PinEdge {
    /// Virtual time of the transition in microseconds
    pub at_us: u64,
    /// Level after the transition
    pub level: bool,
}

/// GPIO double with an edge log.
#[derive(Debug, Clone)]
pub struct SimPin {
    level: bool,
    clock: SimClock,
    edges: Vec<PinEdge>,
    /// Every set_high/set_low call, including ones that did not change the level
    pub writes: u32,
}

impl SimPin {
    pub fn new(clock: SimClock, level: bool) -> Self {
        SimPin { level, clock, edges: Vec::new(), writes: 0 }
    }

    /// Drive the line from outside (e.g. a finger on the button).
    pub fn force(&mut self, level: bool) {
        self.level = level;
    }

    pub fn level(&self) -> bool {
        self.level
    }

    pub fn edges(&self) -> &[PinEdge] {
        &self.edges
    }

    /// Hand over the recorded edges and start a fresh log.
    pub fn take_edges(&mut self) -> Vec<PinEdge> {
        std::mem::take(&mut self.edges)
    }

    fn write(&mut self, level: bool) {
        self.writes += 1;
        if level != self.level {
            self.edges.push(PinEdge { at_us: self.clock.now_us(), level });
            self.level = level;
        }
    }
}

impl DigitalPin for SimPin {
    fn is_high(&mut self) -> bool {
        self.level
    }

    fn set_high(&mut self) {
        self.write(true);
    }

    fn set_low(&mut self) {
        self.write(false);
    }
}

/// Delay double that advances virtual time and counts calls.
#[derive(Debug, Clone, Default)]
pub struct SimDelay {
    clock: SimClock,
    pub ms_calls: u32,
    pub us_calls: u32,
}

impl SimDelay {
    pub fn new(clock: SimClock) -> Self {
        SimDelay { clock, ms_calls: 0, us_calls: 0 }
    }

    pub fn calls(&self) -> u32 {
        self.ms_calls + self.us_calls
    }

    pub fn clock(&self) -> &SimClock {
        &self.clock
    }
}

impl DelayProvider for SimDelay {
    fn delay_ms(&mut self, ms: u32) {
        self.ms_calls += 1;
        self.clock.advance_us(ms as u64 * 1000);
    }

    fn delay_us(&mut self, us: u32) {
        self.us_calls += 1;
        self.clock.advance_us(us as u64);
    }
}

/// One recorded display call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisplayOp {
    Start(u8),
    Byte(u8),
    End,
}

/// Display double that records every call.
#[derive(Debug, Clone, Default)]
pub struct RecordingDisplay {
    pub ops: Vec<DisplayOp>,
}

impl RecordingDisplay {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear(&mut self) {
        self.ops.clear();
    }

    /// Pages in the order their transactions were started.
    pub fn pages_started(&self) -> Vec<u8> {
        self.ops.iter()
            .filter_map(|op| match op { DisplayOp::Start(p) => Some(*p), _ => None })
            .collect()
    }

    /// Bytes of every transaction, paired with its page.
    pub fn transactions(&self) -> Vec<(u8, Vec<u8>)> {
        let mut out: Vec<(u8, Vec<u8>)> = Vec::new();
        for op in &self.ops {
            match *op {
                DisplayOp::Start(p) => out.push((p, Vec::new())),
                DisplayOp::Byte(b) => {
                    if let Some(last) = out.last_mut() { last.1.push(b); }
                }
                DisplayOp::End => {}
            }
        }
        out
    }
}

impl DisplaySurface for RecordingDisplay {
    fn data_start(&mut self, page: u8) {
        self.ops.push(DisplayOp::Start(page));
    }

    fn send(&mut self, byte: u8) {
        self.ops.push(DisplayOp::Byte(byte));
    }

    fn data_end(&mut self) {
        self.ops.push(DisplayOp::End);
    }
}
