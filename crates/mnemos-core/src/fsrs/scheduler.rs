//! FSRS-6 Scheduler
//!
//! The engine value wrapping a fixed parameter set. Construct it once with
//! [`FSRSScheduler::new`] and pass it by reference wherever retrievability or
//! review transitions are needed. It holds no mutable state and is
//! `Send + Sync`.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use super::algorithm::{
    initial_difficulty_with_weights, initial_stability_with_weights,
    next_difficulty_with_weights, next_forget_stability_with_weights,
    next_interval_with_decay, next_recall_stability_with_weights, retrievability_with_decay,
    same_day_stability_with_weights, DEFAULT_MAXIMUM_INTERVAL, DEFAULT_RETENTION, FSRS6_WEIGHTS,
    MAX_DIFFICULTY, MAX_STABILITY, MIN_DIFFICULTY,
};
use crate::error::{Result, SchedulerError};

const SECONDS_PER_DAY: f64 = 86_400.0;

// ============================================================================
// RATING
// ============================================================================

/// Learner's self-reported recall quality, ordered ascending
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[repr(u8)]
pub enum Rating {
    /// Failed to recall (lapse)
    Again = 1,
    /// Recalled with serious effort
    Hard = 2,
    /// Recalled after some hesitation
    Good = 3,
    /// Recalled effortlessly
    Easy = 4,
}

impl Rating {
    /// All ratings in ascending order
    pub const ALL: [Rating; 4] = [Rating::Again, Rating::Hard, Rating::Good, Rating::Easy];

    /// Numeric grade (1-4)
    pub fn value(self) -> u8 {
        self as u8
    }

    /// Parse a numeric grade, `None` outside 1-4
    pub fn from_i32(value: i32) -> Option<Self> {
        match value {
            1 => Some(Rating::Again),
            2 => Some(Rating::Hard),
            3 => Some(Rating::Good),
            4 => Some(Rating::Easy),
            _ => None,
        }
    }

    /// Display name
    pub fn as_str(self) -> &'static str {
        match self {
            Rating::Again => "Again",
            Rating::Hard => "Hard",
            Rating::Good => "Good",
            Rating::Easy => "Easy",
        }
    }
}

impl TryFrom<i32> for Rating {
    type Error = SchedulerError;

    fn try_from(value: i32) -> Result<Self> {
        Rating::from_i32(value).ok_or_else(|| SchedulerError::InvalidRating(value.to_string()))
    }
}

impl FromStr for Rating {
    type Err = SchedulerError;

    fn from_str(s: &str) -> Result<Self> {
        let trimmed = s.trim();
        if let Ok(n) = trimmed.parse::<i32>() {
            return Rating::try_from(n);
        }
        match trimmed.to_ascii_lowercase().as_str() {
            "again" => Ok(Rating::Again),
            "hard" => Ok(Rating::Hard),
            "good" => Ok(Rating::Good),
            "easy" => Ok(Rating::Easy),
            _ => Err(SchedulerError::InvalidRating(trimmed.to_string())),
        }
    }
}

impl fmt::Display for Rating {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// MEMORY STATE
// ============================================================================

/// Learner's current grasp of one fact
///
/// Stability is strictly positive and difficulty lies in
/// [`MIN_DIFFICULTY`, `MAX_DIFFICULTY`]. Both are checked on construction
/// and on deserialization.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawMemoryState")]
pub struct MemoryState {
    stability: f64,
    difficulty: f64,
}

#[derive(Deserialize)]
struct RawMemoryState {
    stability: f64,
    difficulty: f64,
}

impl TryFrom<RawMemoryState> for MemoryState {
    type Error = SchedulerError;

    fn try_from(raw: RawMemoryState) -> Result<Self> {
        MemoryState::new(raw.stability, raw.difficulty)
    }
}

impl MemoryState {
    /// Create a validated memory state
    pub fn new(stability: f64, difficulty: f64) -> Result<Self> {
        let stability_ok = stability.is_finite() && stability > 0.0;
        let difficulty_ok =
            difficulty.is_finite() && (MIN_DIFFICULTY..=MAX_DIFFICULTY).contains(&difficulty);
        if !stability_ok || !difficulty_ok {
            return Err(SchedulerError::InvalidState {
                stability,
                difficulty,
            });
        }
        Ok(Self {
            stability,
            difficulty,
        })
    }

    /// Days for retrievability to decay to 90%
    pub fn stability(&self) -> f64 {
        self.stability
    }

    /// Intrinsic resistance to being remembered
    pub fn difficulty(&self) -> f64 {
        self.difficulty
    }
}

// ============================================================================
// PARAMETERS
// ============================================================================

/// Fixed model weights and scheduling targets
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FSRSParameters {
    /// FSRS-6 weights w0..w20; w20 is the forgetting curve decay
    pub weights: [f64; 21],
    /// Retrievability the scheduler aims for at the next review
    pub desired_retention: f64,
    /// Cap on recommended intervals (days)
    pub maximum_interval: f64,
}

impl Default for FSRSParameters {
    fn default() -> Self {
        Self {
            weights: FSRS6_WEIGHTS,
            desired_retention: DEFAULT_RETENTION,
            maximum_interval: DEFAULT_MAXIMUM_INTERVAL,
        }
    }
}

impl FSRSParameters {
    /// Forgetting curve decay (w20)
    pub fn decay(&self) -> f64 {
        self.weights[20]
    }

    /// Check the parameter set before it is handed to an engine
    pub fn validate(&self) -> Result<()> {
        if let Some(i) = self.weights.iter().position(|w| !w.is_finite()) {
            return Err(SchedulerError::InvalidParameters(format!(
                "weight w{i} is not finite"
            )));
        }
        if let Some(i) = self.weights[..4].iter().position(|w| *w <= 0.0) {
            return Err(SchedulerError::InvalidParameters(format!(
                "initial stability w{i} must be positive"
            )));
        }
        if self.weights[15] <= 0.0 || self.weights[15] > 1.0 {
            return Err(SchedulerError::InvalidParameters(format!(
                "hard penalty w15 must lie in (0, 1], got {}",
                self.weights[15]
            )));
        }
        if self.weights[16] < 1.0 {
            return Err(SchedulerError::InvalidParameters(format!(
                "easy bonus w16 must be at least 1, got {}",
                self.weights[16]
            )));
        }
        if self.decay() <= 0.0 {
            return Err(SchedulerError::InvalidParameters(format!(
                "decay w20 must be positive, got {}",
                self.decay()
            )));
        }
        check_retention(self.desired_retention)
            .map_err(|e| SchedulerError::InvalidParameters(e.to_string()))?;
        if !(1.0..=MAX_STABILITY).contains(&self.maximum_interval) {
            return Err(SchedulerError::InvalidParameters(format!(
                "maximum interval must lie between 1 and {MAX_STABILITY} days, got {}",
                self.maximum_interval
            )));
        }
        Ok(())
    }
}

/// What to do with negative elapsed time (a review timestamp in the future)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ElapsedPolicy {
    /// Fail with a domain error
    #[default]
    Reject,
    /// Treat as zero elapsed days
    ClampToZero,
}

// ============================================================================
// RESULTS
// ============================================================================

/// One hypothetical outcome of a review
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemState {
    /// Memory state after the review
    pub memory: MemoryState,
    /// Days until retrievability reaches the desired retention (unrounded)
    pub interval: f64,
}

impl ItemState {
    /// Interval rounded to whole days, at least one
    pub fn scheduled_days(&self) -> u32 {
        self.interval.round().max(1.0) as u32
    }
}

/// The four possible next states, one per rating
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NextStates {
    pub again: ItemState,
    pub hard: ItemState,
    pub good: ItemState,
    pub easy: ItemState,
}

impl NextStates {
    /// Branch for the rating actually given
    pub fn get(&self, rating: Rating) -> &ItemState {
        match rating {
            Rating::Again => &self.again,
            Rating::Hard => &self.hard,
            Rating::Good => &self.good,
            Rating::Easy => &self.easy,
        }
    }
}

/// Result of applying one rating
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewOutcome {
    pub rating: Rating,
    /// Retrievability at the moment of review
    pub retrievability: f64,
    /// Elapsed days the transition was computed with
    pub elapsed_days: f64,
    /// Chosen branch
    pub next: ItemState,
}

// ============================================================================
// SCHEDULER
// ============================================================================

/// FSRS-6 scheduling engine
#[derive(Debug, Clone)]
pub struct FSRSScheduler {
    params: FSRSParameters,
    elapsed_policy: ElapsedPolicy,
}

impl Default for FSRSScheduler {
    fn default() -> Self {
        Self {
            params: FSRSParameters::default(),
            elapsed_policy: ElapsedPolicy::default(),
        }
    }
}

impl FSRSScheduler {
    /// Create an engine from validated parameters
    pub fn new(params: FSRSParameters) -> Result<Self> {
        params.validate()?;
        Ok(Self {
            params,
            elapsed_policy: ElapsedPolicy::default(),
        })
    }

    /// Replace the negative elapsed time policy
    pub fn with_elapsed_policy(mut self, policy: ElapsedPolicy) -> Self {
        self.elapsed_policy = policy;
        self
    }

    /// Parameters in use
    pub fn params(&self) -> &FSRSParameters {
        &self.params
    }

    /// Negative elapsed time policy in use
    pub fn elapsed_policy(&self) -> ElapsedPolicy {
        self.elapsed_policy
    }

    /// Fractional days from `last_review` to `now`
    ///
    /// Not checked against the elapsed policy; the model entry points do that.
    pub fn days_between(&self, last_review: DateTime<Utc>, now: DateTime<Utc>) -> f64 {
        let elapsed = now.signed_duration_since(last_review);
        match elapsed.num_microseconds() {
            Some(us) => us as f64 / 1_000_000.0 / SECONDS_PER_DAY,
            None => elapsed.num_seconds() as f64 / SECONDS_PER_DAY,
        }
    }

    /// Apply the elapsed policy to a raw elapsed value
    fn checked_elapsed(&self, elapsed_days: f64) -> Result<f64> {
        if !elapsed_days.is_finite() {
            return Err(SchedulerError::Domain(format!(
                "elapsed days must be finite, got {elapsed_days}"
            )));
        }
        if elapsed_days >= 0.0 {
            return Ok(elapsed_days);
        }
        match self.elapsed_policy {
            ElapsedPolicy::Reject => Err(SchedulerError::Domain(format!(
                "elapsed days must not be negative, got {elapsed_days}"
            ))),
            ElapsedPolicy::ClampToZero => Ok(0.0),
        }
    }

    // ========================================================================
    // MEMORY MODEL
    // ========================================================================

    /// Probability of recall after `elapsed_days` without review
    pub fn retrievability(&self, state: &MemoryState, elapsed_days: f64) -> Result<f64> {
        let elapsed = self.checked_elapsed(elapsed_days)?;
        Ok(retrievability_with_decay(
            state.stability,
            elapsed,
            self.params.decay(),
        ))
    }

    /// Days until retrievability decays to `desired_retention`
    pub fn next_interval(&self, stability: f64, desired_retention: f64) -> Result<f64> {
        check_retention(desired_retention)?;
        if !stability.is_finite() || stability <= 0.0 {
            return Err(SchedulerError::Domain(format!(
                "stability must be positive, got {stability}"
            )));
        }
        let interval = next_interval_with_decay(stability, desired_retention, self.params.decay());
        Ok(interval.min(self.params.maximum_interval))
    }

    // ========================================================================
    // TRANSITIONS
    // ========================================================================

    /// Compute the next state for every rating
    pub fn next_states(
        &self,
        state: &MemoryState,
        desired_retention: f64,
        elapsed_days: f64,
    ) -> Result<NextStates> {
        check_retention(desired_retention)?;
        let elapsed = self.checked_elapsed(elapsed_days)?;
        let r = retrievability_with_decay(state.stability, elapsed, self.params.decay());

        let branch = |rating: Rating| -> Result<ItemState> {
            let memory = self.transition(state, rating, r, elapsed);
            let interval = self.next_interval(memory.stability, desired_retention)?;
            Ok(ItemState { memory, interval })
        };

        let next = NextStates {
            again: branch(Rating::Again)?,
            hard: branch(Rating::Hard)?,
            good: branch(Rating::Good)?,
            easy: branch(Rating::Easy)?,
        };

        trace!(
            stability = state.stability,
            difficulty = state.difficulty,
            elapsed,
            retrievability = r,
            good_interval = next.good.interval,
            "Computed next states"
        );

        Ok(next)
    }

    /// Apply one rating at the configured desired retention
    pub fn review(
        &self,
        state: &MemoryState,
        rating: Rating,
        elapsed_days: f64,
    ) -> Result<ReviewOutcome> {
        let elapsed = self.checked_elapsed(elapsed_days)?;
        let states = self.next_states(state, self.params.desired_retention, elapsed)?;
        let retrievability = retrievability_with_decay(state.stability, elapsed, self.params.decay());
        let next = *states.get(rating);

        debug!(
            rating = rating.as_str(),
            old_stability = state.stability,
            new_stability = next.memory.stability,
            new_difficulty = next.memory.difficulty,
            interval = next.interval,
            "Review transition"
        );

        Ok(ReviewOutcome {
            rating,
            retrievability,
            elapsed_days: elapsed,
            next,
        })
    }

    /// Memory state for a card's very first review
    ///
    /// Callers opt into this cold-start policy explicitly; the engine never
    /// applies it on its own.
    pub fn initial_state(&self, rating: Rating) -> MemoryState {
        let w = &self.params.weights;
        MemoryState {
            stability: initial_stability_with_weights(rating.value(), w),
            difficulty: initial_difficulty_with_weights(rating.value(), w),
        }
    }

    fn transition(&self, state: &MemoryState, rating: Rating, r: f64, elapsed: f64) -> MemoryState {
        let w = &self.params.weights;
        let grade = rating.value();

        let stability = match rating {
            Rating::Again => {
                next_forget_stability_with_weights(state.stability, state.difficulty, r, w)
            }
            _ if elapsed < 1.0 => same_day_stability_with_weights(state.stability, grade, w),
            _ => next_recall_stability_with_weights(state.stability, state.difficulty, r, grade, w),
        };

        MemoryState {
            stability,
            difficulty: next_difficulty_with_weights(state.difficulty, grade, w),
        }
    }
}

fn check_retention(desired_retention: f64) -> Result<()> {
    if desired_retention.is_finite() && desired_retention > 0.0 && desired_retention < 1.0 {
        Ok(())
    } else {
        Err(SchedulerError::Domain(format!(
            "desired retention must lie strictly between 0 and 1, got {desired_retention}"
        )))
    }
}

// ============================================================================
// TESTS
// ============================================================================
