//! Per-stream counters

use std::sync::atomic::{AtomicU64, Ordering};

/// Counters updated from completion context
#[derive(Debug, Default)]
pub struct StreamStats {
    completions: AtomicU64,
    frames: AtomicU64,
    faults: AtomicU64,
}

/// Point-in-time copy of [`StreamStats`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatsSnapshot {
    /// Completions seen, including faults and cancellations
    pub completions: u64,
    /// Frames decoded and emitted
    pub frames: u64,
    /// Completions classified as ignore, stall or unexpected
    pub faults: u64,
}

impl StreamStats {
    pub fn record_completion(&self) {
        self.completions.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_frame(&self) {
        self.frames.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_fault(&self) {
        self.faults.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            completions: self.completions.load(Ordering::Relaxed),
            frames: self.frames.load(Ordering::Relaxed),
            faults: self.faults.load(Ordering::Relaxed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snapshot() {
        let stats = StreamStats::default();
        stats.record_completion();
        stats.record_completion();
        stats.record_frame();
        stats.record_fault();

        assert_eq!(
            stats.snapshot(),
            StatsSnapshot {
                completions: 2,
                frames: 1,
                faults: 1
            }
        );
    }
}
