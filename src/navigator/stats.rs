//! Shared navigation counters.

use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};

/// Append-only counters shared between controllers.
#[derive(Debug, Default)]
pub struct NavStats {
    taps: AtomicU64,
    swipes: AtomicU64,
    verifications: AtomicU64,
    confirmations: AtomicU64,
    corrections: AtomicU64,
    replans: AtomicU64,
    dynamic_paths: AtomicU64,
    guard_blocks: AtomicU64,
}

/// Point-in-time copy of [`NavStats`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct NavStatsSnapshot {
    pub taps: u64,
    pub swipes: u64,
    pub verifications: u64,
    pub confirmations: u64,
    pub corrections: u64,
    pub replans: u64,
    pub dynamic_paths: u64,
    pub guard_blocks: u64,
}

fn bump(counter: &AtomicU64) {
    counter.fetch_add(1, Ordering::Relaxed);
}

impl NavStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_tap(&self) {
        bump(&self.taps);
    }

    pub fn record_swipe(&self) {
        bump(&self.swipes);
    }

    pub fn record_verification(&self, confirmed: bool) {
        bump(&self.verifications);
        if confirmed {
            bump(&self.confirmations);
        } else {
            bump(&self.corrections);
        }
    }

    pub fn record_replan(&self) {
        bump(&self.replans);
    }

    pub fn record_dynamic_path(&self) {
        bump(&self.dynamic_paths);
    }

    pub fn record_guard_block(&self) {
        bump(&self.guard_blocks);
    }

    pub fn snapshot(&self) -> NavStatsSnapshot {
        NavStatsSnapshot {
            taps: self.taps.load(Ordering::Relaxed),
            swipes: self.swipes.load(Ordering::Relaxed),
            verifications: self.verifications.load(Ordering::Relaxed),
            confirmations: self.confirmations.load(Ordering::Relaxed),
            corrections: self.corrections.load(Ordering::Relaxed),
            replans: self.replans.load(Ordering::Relaxed),
            dynamic_paths: self.dynamic_paths.load(Ordering::Relaxed),
            guard_blocks: self.guard_blocks.load(Ordering::Relaxed),
        }
    }
}
