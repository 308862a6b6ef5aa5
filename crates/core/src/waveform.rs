//! Buzzer edge log to PCM conversion.
//!
//! The tone generator only produces pin transitions. To hear them on a host,
//! the simulator records each edge with its virtual timestamp and renders the
//! span to mono samples here:
//!
//! 1. **Edge interpolation** Each output sample is the time-weighted
//!    average level inside its sample period, so sub-sample edges do not
//!    alias into harsh clicks.
//! 2. **Idle gate** The buzzer rests high between tones. Any stretch
//!    without an edge for longer than the slowest half-period is rendered as
//!    silence instead of a DC offset.

use crate::sim::PinEdge;

/// Longest half-period the generator emits (freq 0 is a silent hold).
const MAX_HALF_PERIOD_US: u64 = 255;
/// Edge-free time after which the output is considered idle.
const IDLE_AFTER_US: u64 = 2 * MAX_HALF_PERIOD_US + 1;

/// Render `[start_us, end_us)` of a pin's history to samples appended to `out`.
///
/// `level_at_start` is the pin level at `start_us`; `edges` must be sorted and
/// may extend beyond the window. Returns the level at `end_us`.
pub fn render_edges(
    edges: &[PinEdge],
    level_at_start: bool,
    start_us: u64,
    end_us: u64,
    sample_rate: u32,
    volume: f32,
    out: &mut Vec<f32>,
) -> bool {
    if end_us <= start_us || sample_rate == 0 {
        return level_at_start;
    }
    let span = end_us - start_us;
    let n_samples = (span as u128 * sample_rate as u128 / 1_000_000) as usize;
    out.reserve(n_samples);

    let mut level = level_at_start;
    let mut idx = 0;
    // Skip edges before the window
    while idx < edges.len() && edges[idx].at_us < start_us {
        level = edges[idx].level;
        idx += 1;
    }
    let mut last_edge_us: Option<u64> = if idx > 0 { Some(edges[idx - 1].at_us) } else { None };

    for i in 0..n_samples {
        let t0 = start_us as f64 + i as f64 * 1_000_000.0 / sample_rate as f64;
        let t1 = t0 + 1_000_000.0 / sample_rate as f64;
        let mut cursor = t0;
        let mut high_time = 0.0f64;
        while idx < edges.len() && (edges[idx].at_us as f64) < t1 {
            let at = (edges[idx].at_us as f64).max(t0);
            if level {
                high_time += at - cursor;
            }
            cursor = at;
            level = edges[idx].level;
            last_edge_us = Some(edges[idx].at_us);
            idx += 1;
        }
        if level {
            high_time += t1 - cursor;
        }

        let active = match last_edge_us {
            Some(at) => (t1 as u64).saturating_sub(at) <= IDLE_AFTER_US,
            None => false,
        };
        if active {
            let duty = (high_time / (t1 - t0)) as f32;
            out.push((duty * 2.0 - 1.0) * volume);
        } else {
            out.push(0.0);
        }
    }

    while idx < edges.len() && edges[idx].at_us < end_us {
        level = edges[idx].level;
        idx += 1;
    }
    level
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hal::DelayProvider;
    use crate::sim::{SimClock, SimDelay, SimPin};
    use crate::sound::Buzzer;

    #[test]
    fn test_no_edges_is_silence() {
        let mut out = Vec::new();
        let level = render_edges(&[], true, 0, 10_000, 10_000, 0.5, &mut out);
        assert!(level);
        assert_eq!(out.len(), 100);
        assert!(out.iter().all(|&s| s == 0.0));
    }

    #[test]
    fn test_square_wave_swings_both_ways() {
        let clock = SimClock::new();
        let mut delay = SimDelay::new(clock.clone());
        let mut buzzer = Buzzer::new(SimPin::new(clock.clone(), true));
        buzzer.play(&mut delay, true, 155, 50);
        let end = clock.now_us();
        let edges = buzzer.pin_mut().take_edges();

        let mut out = Vec::new();
        render_edges(&edges, true, 0, end, 100_000, 1.0, &mut out);
        // 10 µs sample period, 100 µs half-period: whole samples at ±1
        assert_eq!(out.len(), 1000);
        if cfg!(feature = "buzzer") {
            assert_eq!(out[0], -1.0);
            assert_eq!(out[15], 1.0);
            let mean: f32 = out.iter().sum::<f32>() / out.len() as f32;
            assert!(mean.abs() < 0.05);
        }
    }

    #[test]
    fn test_goes_idle_after_tone() {
        let clock = SimClock::new();
        let mut delay = SimDelay::new(clock.clone());
        let mut buzzer = Buzzer::new(SimPin::new(clock.clone(), true));
        buzzer.play(&mut delay, true, 155, 5);
        delay.delay_ms(10);
        let edges = buzzer.pin_mut().take_edges();
        let mut out = Vec::new();
        render_edges(&edges, true, 0, clock.now_us(), 100_000, 1.0, &mut out);
        assert!(out[out.len() - 1] == 0.0);
    }

    #[test]
    fn test_window_carries_level() {
        let edges = [PinEdge { at_us: 5, level: false }, PinEdge { at_us: 50, level: true }];
        let mut out = Vec::new();
        let level = render_edges(&edges, true, 0, 20, 1_000_000, 1.0, &mut out);
        assert!(!level);
        let level = render_edges(&edges, level, 20, 100, 1_000_000, 1.0, &mut out);
        assert!(level);
        assert_eq!(out.len(), 100);
    }
}
