//! Sequence Validation for Streaming Feeds
//!
//! Classifies each inbound sequence id against the last accepted id and a
//! bounded window of recently accepted ids:
//! - Contiguous: `id == last + 1` (or the very first id)
//! - Gap: `id > last + 1`, messages were dropped but the id is still accepted
//! - Duplicate: `id <= last` and still in the retained window
//! - Out-of-order: `id <= last` and already evicted from the window
//!
//! Forward jumps never block progress. Callers decide what a gap means
//! (the reconnect strategy tears the connection down to force a resync).

use serde::{Deserialize, Serialize};
use std::collections::{HashSet, VecDeque};

/// Outcome class of one validation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum SequenceClass {
    /// Next expected id (or first id ever seen)
    Contiguous,
    /// Forward jump; `size` ids were skipped
    Gap { size: u64 },
    /// Already accepted and still retained
    Duplicate,
    /// Older than anything retained
    OutOfOrder,
    /// Outside the id domain (negative)
    Invalid,
}

/// Result of [`SequenceValidator::validate`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SequenceValidation {
    /// Whether the id was accepted
    pub valid: bool,
    pub class: SequenceClass,
    /// Diagnostic for anything other than a contiguous id
    pub message: Option<String>,
}

impl SequenceValidation {
    fn accepted(class: SequenceClass, message: Option<String>) -> Self {
        Self {
            valid: true,
            class,
            message,
        }
    }

    fn rejected(class: SequenceClass, message: String) -> Self {
        Self {
            valid: false,
            class,
            message: Some(message),
        }
    }

    /// Gap size if this was a gap
    pub fn gap_size(&self) -> Option<u64> {
        match self.class {
            SequenceClass::Gap { size } => Some(size),
            _ => None,
        }
    }

    pub fn is_gap(&self) -> bool {
        matches!(self.class, SequenceClass::Gap { .. })
    }
}

/// Read-only view of validator state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SequenceStats {
    /// Highest accepted id, `None` before the first id
    pub last_accepted: Option<u64>,
    pub gaps_detected: u64,
    pub window_occupancy: usize,
    pub window_capacity: usize,
}

/// Per-connection sequence tracker with a bounded duplicate window
///
/// # Example
///
/// ```
/// use relink_core::resilience::sequence::{SequenceClass, SequenceValidator};
///
/// let mut validator = SequenceValidator::new(1000);
/// assert!(validator.validate(100).valid);
/// assert!(validator.validate(101).valid);
/// let r = validator.validate(103);        // 102 missing
/// assert_eq!(r.class, SequenceClass::Gap { size: 1 });
/// assert!(!validator.validate(101).valid); // duplicate
/// ```
#[derive(Debug, Clone)]
pub struct SequenceValidator {
    last_accepted: Option<u64>,
    gaps_detected: u64,
    /// Accepted ids, oldest at the front
    window: VecDeque<u64>,
    /// Same ids as `window`, for O(1) membership
    members: HashSet<u64>,
    capacity: usize,
}

impl SequenceValidator {
    /// Create a validator retaining up to `capacity` accepted ids
    pub fn new(capacity: usize) -> Self {
        Self {
            last_accepted: None,
            gaps_detected: 0,
            window: VecDeque::with_capacity(capacity),
            members: HashSet::with_capacity(capacity),
            capacity,
        }
    }

    /// Classify an inbound id
    ///
    /// Takes a signed id because transports hand over raw integers; anything
    /// negative is rejected without touching state.
    pub fn validate(&mut self, id: i64) -> SequenceValidation {
        if id < 0 {
            return SequenceValidation::rejected(
                SequenceClass::Invalid,
                "invalid sequence id".to_string(),
            );
        }
        let id = id as u64;

        let last = match self.last_accepted {
            None => {
                self.accept(id);
                return SequenceValidation::accepted(SequenceClass::Contiguous, None);
            }
            Some(last) => last,
        };

        if id > last {
            self.accept(id);

            // id > last so last + 1 cannot overflow
            if id == last + 1 {
                return SequenceValidation::accepted(SequenceClass::Contiguous, None);
            }

            let size = id - last - 1;
            self.gaps_detected += 1;
            return SequenceValidation::accepted(
                SequenceClass::Gap { size },
                Some(format!(
                    "sequence gap: expected {}, got {} ({} missing)",
                    last + 1,
                    id,
                    size
                )),
            );
        }

        if self.members.contains(&id) {
            SequenceValidation::rejected(
                SequenceClass::Duplicate,
                format!("duplicate sequence id {}", id),
            )
        } else {
            SequenceValidation::rejected(
                SequenceClass::OutOfOrder,
                format!(
                    "sequence id {} is out of order (last accepted {})",
                    id, last
                ),
            )
        }
    }

    fn accept(&mut self, id: u64) {
        self.last_accepted = Some(id);

        if self.capacity == 0 {
            return;
        }
        if self.window.len() == self.capacity {
            if let Some(evicted) = self.window.pop_front() {
                self.members.remove(&evicted);
            }
        }
        self.window.push_back(id);
        self.members.insert(id);
    }

    /// Snapshot of validator state
    pub fn stats(&self) -> SequenceStats {
        SequenceStats {
            last_accepted: self.last_accepted,
            gaps_detected: self.gaps_detected,
            window_occupancy: self.window.len(),
            window_capacity: self.capacity,
        }
    }

    #[inline]
    pub fn last_accepted(&self) -> Option<u64> {
        self.last_accepted
    }

    #[inline]
    pub fn gaps_detected(&self) -> u64 {
        self.gaps_detected
    }

    /// Forget everything; the next id is treated as the first
    pub fn reset(&mut self) {
        self.last_accepted = None;
        self.gaps_detected = 0;
        self.window.clear();
        self.members.clear();
    }

    /// Resume from a known id (after a snapshot resync)
    ///
    /// Clears the window and the gap counter, then accepts `id` so the next
    /// contiguous id is `id + 1`.
    pub fn reset_at(&mut self, id: u64) {
        self.reset();
        self.accept(id);
    }
}
