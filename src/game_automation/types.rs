// Types shared by the matching core
use serde::Serialize;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Outcome of a single locate call. Produced fresh per call, never stored.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MatchResult {
    /// Tap target (centre of the matched template) in screenshot coordinates
    pub position: Option<(u32, u32)>,
    /// Score in [0, 1], 1.0 meaning an exact match
    pub similarity: f64,
}

impl MatchResult {
    pub fn new(position: (u32, u32), similarity: f64) -> Self {
        Self {
            position: Some(position),
            similarity,
        }
    }

    /// No usable candidate
    pub fn none() -> Self {
        Self {
            position: None,
            similarity: 0.0,
        }
    }

    /// Strictly above the threshold and carrying a position
    pub fn is_match(&self, threshold: f64) -> bool {
        self.similarity > threshold && self.position.is_some()
    }
}

/// Cooperative cancellation flag shared between a poll and its owner.
///
/// Clones share the same flag. Clearing it stops any poll observing it at
/// the start of its next iteration.
#[derive(Debug, Clone)]
pub struct RunningSignal(Arc<AtomicBool>);

impl RunningSignal {
    /// A signal in the running state
    pub fn new() -> Self {
        Self(Arc::new(AtomicBool::new(true)))
    }

    pub fn is_set(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    pub fn set(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    /// Request cancellation
    pub fn clear(&self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

impl Default for RunningSignal {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum PollState {
    Polling,
    Found,
    Exhausted,
    Cancelled,
}

/// What a confirmation poll did before it stopped
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PollReport {
    pub state: PollState,
    /// Failed locate attempts counted against the budget
    pub attempts: u32,
    /// Captures that failed; these are not counted as attempts
    pub capture_failures: u32,
    /// Backoff intervals slept
    pub backoffs: u32,
    /// Score of the last locate call
    pub last_similarity: f64,
    /// Where the action was dispatched, when found
    pub position: Option<(u32, u32)>,
}

impl PollReport {
    pub fn new() -> Self {
        Self {
            state: PollState::Polling,
            attempts: 0,
            capture_failures: 0,
            backoffs: 0,
            last_similarity: 0.0,
            position: None,
        }
    }

    pub fn found(&self) -> bool {
        self.state == PollState::Found
    }
}

impl Default for PollReport {
    fn default() -> Self {
        Self::new()
    }
}
