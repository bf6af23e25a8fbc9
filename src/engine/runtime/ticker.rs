use std::time::{Duration, Instant};

/// ### English
/// Fires at most once per `interval` of wall-clock time, checked once per frame.
///
/// A late check fires once and restarts the period from that moment; missed periods are not
/// replayed.
///
/// ### 中文
/// 每个 `interval` 的挂钟时间内最多触发一次，每帧检查一次。
///
/// 延迟的检查只触发一次，并从该时刻重新计时；错过的周期不会补发。
#[derive(Debug, Clone, Copy)]
pub struct SecondTicker {
    interval: Duration,
    last: Instant,
}

impl SecondTicker {
    pub fn new(interval: Duration, now: Instant) -> Self {
        Self {
            interval,
            last: now,
        }
    }

    pub fn reset(&mut self, now: Instant) {
        self.last = now;
    }

    pub fn tick(&mut self, now: Instant) -> bool {
        if now.saturating_duration_since(self.last) < self.interval {
            return false;
        }
        self.last = now;
        true
    }
}
