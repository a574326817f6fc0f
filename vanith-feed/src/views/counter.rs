//! Stat counter animation
//!
//! A stat counts up from zero to its target in equal steps over a fixed
//! duration. Frames are pure (`frames()`); `play` paces them on a tokio timer.

use std::time::Duration;
use tokio::time::{interval, MissedTickBehavior};

pub const COUNTER_DURATION: Duration = Duration::from_millis(2000);
pub const COUNTER_STEPS: u32 = 60;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CounterAnimation {
    target: u64,
    duration: Duration,
    steps: u32,
}

impl CounterAnimation {
    pub fn new(target: u64) -> Self {
        Self::with_timing(target, COUNTER_DURATION, COUNTER_STEPS)
    }

    pub fn with_timing(target: u64, duration: Duration, steps: u32) -> Self {
        Self {
            target,
            duration,
            steps: steps.max(1),
        }
    }

    /// No animation while the value is still loading, nor for a zero target
    pub fn for_value(value: Option<u64>) -> Option<Self> {
        match value {
            Some(target) if target > 0 => Some(Self::new(target)),
            _ => None,
        }
    }

    pub fn target(&self) -> u64 {
        self.target
    }

    pub fn steps(&self) -> u32 {
        self.steps
    }

    pub fn frame_interval(&self) -> Duration {
        self.duration / self.steps
    }

    /// Displayed values, one per step; the last is always `target`
    pub fn frames(&self) -> impl Iterator<Item = u64> {
        let target = u128::from(self.target);
        let steps = u128::from(self.steps);
        (1..=steps).map(move |k| (target * k / steps) as u64)
    }

    /// Emit every frame into `sink`, one per frame interval
    pub async fn play(&self, mut sink: impl FnMut(u64)) {
        let mut ticker = interval(self.frame_interval().max(Duration::from_millis(1)));
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // First tick completes immediately
        ticker.tick().await;

        for value in self.frames() {
            ticker.tick().await;
            sink(value);
        }
    }
}
