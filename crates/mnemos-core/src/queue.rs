//! Review Queue
//!
//! Next-card selection and review application over a card collection owned
//! by the caller. The core only sees cards through the [`Reviewable`] and
//! [`ReviewableMut`] traits and never stores them.
//!
//! Selection is an explicit fold over the input slice: a card replaces the
//! current candidate only when its retrievability is strictly lower, so the
//! first of several equally due cards wins.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, trace};

use crate::error::Result;
use crate::fsrs::{FSRSScheduler, MemoryState, Rating, ReviewOutcome};

// ============================================================================
// CARD TRAITS
// ============================================================================

/// Read access to a card's scheduling fields
pub trait Reviewable {
    /// Stable identifier, used for logging
    fn id(&self) -> &str;
    /// Current memory state
    fn memory(&self) -> MemoryState;
    /// Instant of the last review
    fn last_reviewed(&self) -> DateTime<Utc>;
}

/// Write access for review transitions
pub trait ReviewableMut: Reviewable {
    /// Replace memory state and last-review instant together
    ///
    /// Called exactly once per successful transition, after the outcome has
    /// been fully computed.
    fn record_review(&mut self, outcome: &ReviewOutcome, reviewed_at: DateTime<Utc>);
}

// ============================================================================
// RESULTS
// ============================================================================

/// The most-due card with display projections attached
#[derive(Debug, Clone, Copy)]
pub struct DueCard<'a, C> {
    pub card: &'a C,
    /// Index in the input slice
    pub position: usize,
    pub retrievability: f64,
    pub elapsed_days: f64,
    /// Good-branch interval at the configured desired retention
    pub recommended_interval: f64,
}

/// Per-card projection used for listings
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CardSnapshot {
    pub id: String,
    pub retrievability: f64,
    pub elapsed_days: f64,
    pub recommended_interval: f64,
}

#[derive(Debug, Clone, Copy)]
struct Candidate {
    position: usize,
    retrievability: f64,
    elapsed_days: f64,
}

// ============================================================================
// OPERATIONS
// ============================================================================

/// Pick the card with the lowest current retrievability
///
/// Returns `Ok(None)` for an empty collection. Inputs are not modified.
pub fn select_next_card<'a, C: Reviewable>(
    scheduler: &FSRSScheduler,
    cards: &'a [C],
    now: DateTime<Utc>,
) -> Result<Option<DueCard<'a, C>>> {
    let best = cards
        .iter()
        .enumerate()
        .try_fold(None::<Candidate>, |best, (position, card)| -> Result<Option<Candidate>> {
            let elapsed_days = scheduler.days_between(card.last_reviewed(), now);
            let retrievability = scheduler.retrievability(&card.memory(), elapsed_days)?;
            trace!(card = card.id(), retrievability, "Ranked card");

            Ok(match best {
                Some(current) if current.retrievability <= retrievability => Some(current),
                _ => Some(Candidate {
                    position,
                    retrievability,
                    elapsed_days,
                }),
            })
        })?;

    let Some(best) = best else {
        debug!("No cards to review");
        return Ok(None);
    };

    let card = &cards[best.position];
    let recommended_interval = good_interval(scheduler, &card.memory(), best.elapsed_days)?;

    debug!(
        card = card.id(),
        retrievability = best.retrievability,
        recommended_interval,
        "Selected next card"
    );

    Ok(Some(DueCard {
        card,
        position: best.position,
        retrievability: best.retrievability,
        elapsed_days: best.elapsed_days.max(0.0),
        recommended_interval,
    }))
}

/// Retrievability and projected Good interval for every card, in input order
pub fn rank_cards<C: Reviewable>(
    scheduler: &FSRSScheduler,
    cards: &[C],
    now: DateTime<Utc>,
) -> Result<Vec<CardSnapshot>> {
    cards
        .iter()
        .map(|card| -> Result<CardSnapshot> {
            let memory = card.memory();
            let elapsed_days = scheduler.days_between(card.last_reviewed(), now);
            Ok(CardSnapshot {
                id: card.id().to_string(),
                retrievability: scheduler.retrievability(&memory, elapsed_days)?,
                elapsed_days: elapsed_days.max(0.0),
                recommended_interval: good_interval(scheduler, &memory, elapsed_days)?,
            })
        })
        .collect()
}

/// Apply a rating to a card and record the new state
///
/// The outcome is computed before anything is written; on error the card is
/// left untouched.
pub fn apply_review<C: ReviewableMut>(
    scheduler: &FSRSScheduler,
    card: &mut C,
    rating: Rating,
    now: DateTime<Utc>,
) -> Result<ReviewOutcome> {
    let elapsed_days = scheduler.days_between(card.last_reviewed(), now);
    let outcome = scheduler.review(&card.memory(), rating, elapsed_days)?;
    card.record_review(&outcome, now);

    debug!(
        card = card.id(),
        rating = rating.as_str(),
        stability = outcome.next.memory.stability(),
        difficulty = outcome.next.memory.difficulty(),
        interval = outcome.next.interval,
        "Recorded review"
    );

    Ok(outcome)
}

fn good_interval(scheduler: &FSRSScheduler, memory: &MemoryState, elapsed_days: f64) -> Result<f64> {
    let states = scheduler.next_states(memory, scheduler.params().desired_retention, elapsed_days)?;
    Ok(states.good.interval)
}

// ============================================================================
// TESTS
// ============================================================================
