//! Memory-state machine for captured words
//!
//! A word climbs a fixed chain of states on successful reviews and falls
//! back one step on failures. Each state carries a fixed review interval:
//!
//! | state    | interval |
//! |----------|----------|
//! | new      | 0        |
//! | learning | 10 min   |
//! | review1  | 1 day    |
//! | review2  | 3 days   |
//! | review3  | 7 days   |
//! | mastered | 30 days  |

use chrono::Duration;
use serde::{Deserialize, Serialize};

/// Review status of a word in the spaced repetition system
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MemoryState {
    /// Never scheduled
    New,
    /// In initial learning phase
    Learning,
    /// First consolidation pass
    Review1,
    /// Second consolidation pass
    Review2,
    /// Third consolidation pass
    Review3,
    /// Long-interval maintenance
    Mastered,
}

impl Default for MemoryState {
    fn default() -> Self {
        Self::New
    }
}

/// Outcome of a single review attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReviewOutcome {
    Correct,
    Incorrect,
}

impl MemoryState {
    /// The review interval associated with this state
    pub fn interval(&self) -> Duration {
        match self {
            Self::New => Duration::zero(),
            Self::Learning => Duration::minutes(10),
            Self::Review1 => Duration::days(1),
            Self::Review2 => Duration::days(3),
            Self::Review3 => Duration::days(7),
            Self::Mastered => Duration::days(30),
        }
    }

    /// Short display label for UI surfaces
    pub fn label(&self) -> &'static str {
        match self {
            Self::New => "new",
            Self::Learning => "learning",
            Self::Review1 => "consolidating 1",
            Self::Review2 => "consolidating 2",
            Self::Review3 => "consolidating 3",
            Self::Mastered => "mastered",
        }
    }

    /// Display color for UI surfaces (opaque to the core)
    pub fn color(&self) -> &'static str {
        match self {
            Self::New => "#9CA3AF",
            Self::Learning => "#3B82F6",
            Self::Review1 => "#F59E0B",
            Self::Review2 => "#D97706",
            Self::Review3 => "#B45309",
            Self::Mastered => "#10B981",
        }
    }
}

/// Compute the next state and interval for a review outcome.
///
/// Correct advances one step along
/// new → learning → review1 → review2 → review3 → mastered (absorbing);
/// incorrect regresses one step along the same chain down to new
/// (absorbing). The returned interval is always the interval of the
/// *next* state, so the caller derives `next_review_at = now + interval`.
///
/// Pure and total: all 12 state × outcome pairs are written out.
pub fn transition(state: MemoryState, outcome: ReviewOutcome) -> (MemoryState, Duration) {
    use MemoryState::*;
    use ReviewOutcome::*;

    let next = match (state, outcome) {
        (New, Correct) => Learning,
        (Learning, Correct) => Review1,
        (Review1, Correct) => Review2,
        (Review2, Correct) => Review3,
        (Review3, Correct) => Mastered,
        (Mastered, Correct) => Mastered,
        (New, Incorrect) => New,
        (Learning, Incorrect) => New,
        (Review1, Incorrect) => Learning,
        (Review2, Incorrect) => Review1,
        (Review3, Incorrect) => Review2,
        (Mastered, Incorrect) => Review3,
    };

    (next, next.interval())
}
