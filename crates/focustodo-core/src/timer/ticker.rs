//! Tick sources that drive [`SessionCycle::tick`](super::SessionCycle::tick).
//!
//! The cycle never reads the clock itself. Production code hands it an
//! [`IntervalTicker`]; tests use a [`ManualTicker`] and never sleep.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

pub trait Ticker {
    /// Blocks until the next tick is due.
    ///
    /// Returns `false` once the source has been stopped or is exhausted.
    fn wait_tick(&mut self) -> bool;
}

/// Wall-clock ticker with a fixed period.
///
/// Deadlines are absolute (`start + n * period`), so time spent between
/// ticks does not accumulate as drift.
#[derive(Debug)]
pub struct IntervalTicker {
    period: Duration,
    next: Instant,
    stop: Arc<AtomicBool>,
}

impl IntervalTicker {
    pub fn new(period: Duration) -> Self {
        Self {
            period,
            next: Instant::now() + period,
            stop: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn every_second() -> Self {
        Self::new(Duration::from_secs(1))
    }

    /// Shared flag; storing `true` makes the next `wait_tick` return `false`.
    pub fn stop_handle(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.stop)
    }
}

impl Ticker for IntervalTicker {
    fn wait_tick(&mut self) -> bool {
        // Sleep in short slices so a stop request is seen promptly.
        const SLICE: Duration = Duration::from_millis(100);
        loop {
            if self.stop.load(Ordering::SeqCst) {
                return false;
            }
            let now = Instant::now();
            if now >= self.next {
                self.next += self.period;
                return true;
            }
            std::thread::sleep((self.next - now).min(SLICE));
        }
    }
}

/// Yields a fixed number of ticks immediately, then stops.
#[derive(Debug, Clone, Default)]
pub struct ManualTicker {
    remaining: u64,
    delivered: u64,
}

impl ManualTicker {
    pub fn new(ticks: u64) -> Self {
        Self {
            remaining: ticks,
            delivered: 0,
        }
    }

    pub fn delivered(&self) -> u64 {
        self.delivered
    }
}

impl Ticker for ManualTicker {
    fn wait_tick(&mut self) -> bool {
        if self.remaining == 0 {
            return false;
        }
        self.remaining -= 1;
        self.delivered += 1;
        true
    }
}
