//! Runaway-execution protection: a hard iteration cap plus an infinite-loop
//! heuristic over recently seen machine states.
//!
//! The heuristic is exactly that. A repeat means "this looks like a cycle",
//! never a proof of non-termination.

use std::collections::{HashSet, VecDeque};

/// Default ceiling on executed cycles.
pub const DEFAULT_MAX_ITERATIONS: u64 = 10_000_000;
/// Consecutive cycles at one instruction pointer before a loop is suspected.
pub const DEFAULT_REPEAT_THRESHOLD: u32 = 1_000;
/// Fingerprints remembered by [`LoopHistory`].
pub const DEFAULT_HISTORY_CAPACITY: usize = 1_000;

/// What [`LoopHistory`] does once it holds `capacity` fingerprints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HistoryPolicy {
    /// Forget everything and start over.
    #[default]
    ClearWhenFull,
    /// Drop the oldest fingerprint to make room (ring buffer).
    EvictOldest,
}

/// Tunable limits for a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Limits {
    pub max_iterations: u64,
    pub loop_detection: bool,
    pub repeat_threshold: u32,
    pub history_capacity: usize,
    pub history_policy: HistoryPolicy,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            max_iterations: DEFAULT_MAX_ITERATIONS,
            loop_detection: true,
            repeat_threshold: DEFAULT_REPEAT_THRESHOLD,
            history_capacity: DEFAULT_HISTORY_CAPACITY,
            history_policy: HistoryPolicy::default(),
        }
    }
}

/// A lossy summary of the machine state at the top of a cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Fingerprint {
    pub cursor: usize,
    pub ip: usize,
    pub cell: u8,
    pub tape_digest: u64,
}

/// Bounded memory of fingerprints with an explicit reset policy.
#[derive(Debug)]
pub struct LoopHistory {
    capacity: usize,
    policy: HistoryPolicy,
    order: VecDeque<Fingerprint>,
    seen: HashSet<Fingerprint>,
}

impl LoopHistory {
    pub fn new(capacity: usize, policy: HistoryPolicy) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            policy,
            order: VecDeque::with_capacity(capacity),
            seen: HashSet::with_capacity(capacity),
        }
    }

    /// Record `fp`. Returns `true` if it was already remembered.
    pub fn record(&mut self, fp: Fingerprint) -> bool {
        if self.seen.contains(&fp) {
            return true;
        }
        if self.order.len() >= self.capacity {
            match self.policy {
                HistoryPolicy::ClearWhenFull => self.clear(),
                HistoryPolicy::EvictOldest => {
                    if let Some(oldest) = self.order.pop_front() {
                        self.seen.remove(&oldest);
                    }
                }
            }
        }
        self.order.push_back(fp);
        self.seen.insert(fp);
        false
    }

    pub fn clear(&mut self) {
        self.order.clear();
        self.seen.clear();
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

/// Why the guard wants execution to stop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Continue,
    IterationLimitExceeded { limit: u64 },
    InfiniteLoopSuspected,
}

/// Per-run guard state. Consulted once per cycle by the engine.
#[derive(Debug)]
pub struct SafetyGuard {
    limits: Limits,
    history: LoopHistory,
    last_ip: Option<usize>,
    same_ip_repeats: u32,
}

impl SafetyGuard {
    pub fn new(limits: Limits) -> Self {
        let history = LoopHistory::new(limits.history_capacity, limits.history_policy);
        Self {
            limits,
            history,
            last_ip: None,
            same_ip_repeats: 0,
        }
    }

    /// Check the iteration counter (already incremented for this cycle).
    pub fn check_iterations(&self, iterations: u64) -> Verdict {
        if iterations > self.limits.max_iterations {
            Verdict::IterationLimitExceeded { limit: self.limits.max_iterations }
        } else {
            Verdict::Continue
        }
    }

    /// Feed this cycle's fingerprint to the loop heuristic.
    pub fn observe(&mut self, fp: Fingerprint) -> Verdict {
        if !self.limits.loop_detection {
            return Verdict::Continue;
        }

        if self.last_ip == Some(fp.ip) {
            self.same_ip_repeats += 1;
            if self.same_ip_repeats > self.limits.repeat_threshold {
                return Verdict::InfiniteLoopSuspected;
            }
        } else {
            self.same_ip_repeats = 0;
        }
        self.last_ip = Some(fp.ip);

        if self.history.record(fp) {
            return Verdict::InfiniteLoopSuspected;
        }
        Verdict::Continue
    }

    /// Input makes later states depend on data from outside, so a recurring
    /// state no longer implies a cycle.
    pub fn forget_history(&mut self) {
        self.history.clear();
    }

    pub fn history(&self) -> &LoopHistory {
        &self.history
    }
}
