//! Command handlers
//!
//! Each handler loads the deck, calls into the scheduling core, and persists
//! the deck again only when a card changed. Rendering is left to `main`.

use std::path::PathBuf;

use chrono::{DateTime, NaiveDate, TimeDelta, Utc};
use mnemos_core::{
    apply_review, rank_cards, select_next_card, Clock, FSRSScheduler, MemoryState, NextStates,
    Rating, ReviewOutcome, SchedulerError,
};
use serde::Serialize;
use tracing::info;
use uuid::Uuid;

use crate::deck::{Card, Deck, DeckError, DeckLock, Result};

const MILLIS_PER_DAY: f64 = 86_400_000.0;

/// How a new card gets its first memory state
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Seed {
    /// Caller-chosen stability and difficulty
    Explicit(MemoryState),
    /// FSRS-6 first-review values for this rating
    FirstRating(Rating),
}

/// Result of `review`
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewReceipt {
    pub card: Card,
    pub outcome: ReviewOutcome,
    pub next_review_at: DateTime<Utc>,
}

impl ReviewReceipt {
    /// Next review date as `YYYY-MM-DD`
    pub fn next_review_date(&self) -> NaiveDate {
        self.next_review_at.date_naive()
    }
}

/// Result of `preview`
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Preview {
    pub card: Card,
    pub retrievability: f64,
    pub elapsed_days: f64,
    pub next_states: NextStates,
}

/// Application context shared by all commands
pub struct App<C: Clock> {
    deck_path: PathBuf,
    scheduler: FSRSScheduler,
    clock: C,
}

impl<C: Clock> App<C> {
    pub fn new(deck_path: PathBuf, scheduler: FSRSScheduler, clock: C) -> Self {
        Self {
            deck_path,
            scheduler,
            clock,
        }
    }

    pub fn deck_path(&self) -> &PathBuf {
        &self.deck_path
    }

    pub fn scheduler(&self) -> &FSRSScheduler {
        &self.scheduler
    }

    /// Write the sample deck
    pub fn init(&self, force: bool) -> Result<Deck> {
        let _lock = DeckLock::acquire(&self.deck_path)?;
        if self.deck_path.exists() && !force {
            return Err(DeckError::AlreadyExists(self.deck_path.clone()));
        }
        let deck = Deck::sample(self.clock.now())?;
        deck.save(&self.deck_path)?;
        Ok(deck)
    }

    /// Every card with current retrievability and Good interval filled in
    pub fn list(&self) -> Result<Vec<Card>> {
        let deck = Deck::load(&self.deck_path)?;
        let snapshots = rank_cards(&self.scheduler, deck.cards(), self.clock.now())?;

        Ok(deck
            .cards()
            .iter()
            .zip(snapshots)
            .map(|(card, snapshot)| Card {
                retrievability: Some(snapshot.retrievability),
                next_review_interval: Some(snapshot.recommended_interval),
                ..card.clone()
            })
            .collect())
    }

    /// The most-due card, `None` when the deck is empty
    pub fn next(&self) -> Result<Option<Card>> {
        let deck = Deck::load(&self.deck_path)?;
        let due = select_next_card(&self.scheduler, deck.cards(), self.clock.now())?;

        Ok(due.map(|due| Card {
            retrievability: Some(due.retrievability),
            next_review_interval: Some(due.recommended_interval),
            ..due.card.clone()
        }))
    }

    /// All four outcomes for one card
    pub fn preview(&self, id: &str) -> Result<Preview> {
        let deck = Deck::load(&self.deck_path)?;
        let card = deck.get(id)?;
        let memory = card.memory;

        let elapsed_days = self
            .scheduler
            .days_between(card.last_reviewed, self.clock.now());
        let retrievability = self.scheduler.retrievability(&memory, elapsed_days)?;
        let next_states = self.scheduler.next_states(
            &memory,
            self.scheduler.params().desired_retention,
            elapsed_days,
        )?;

        Ok(Preview {
            card: card.clone(),
            retrievability,
            elapsed_days: elapsed_days.max(0.0),
            next_states,
        })
    }

    /// Apply a rating and persist the deck
    pub fn review(&self, id: &str, rating: Rating) -> Result<ReviewReceipt> {
        let now = self.clock.now();
        let _lock = DeckLock::acquire(&self.deck_path)?;
        let mut deck = Deck::load(&self.deck_path)?;

        let card = deck.get_mut(id)?;
        let outcome = apply_review(&self.scheduler, card, rating, now)?;
        let card = card.clone();
        let next_review_at = review_due_at(now, outcome.next.interval)?;
        deck.save(&self.deck_path)?;

        info!(
            card = %card.id,
            rating = rating.as_str(),
            next_review = %next_review_at.date_naive(),
            "Review submitted"
        );

        Ok(ReviewReceipt {
            card,
            outcome,
            next_review_at,
        })
    }

    /// Add a card with a fresh id, creating the deck if needed
    pub fn add(&self, question: &str, answer: &str, seed: Seed) -> Result<Card> {
        let memory = match seed {
            Seed::Explicit(memory) => memory,
            Seed::FirstRating(rating) => self.scheduler.initial_state(rating),
        };

        let _lock = DeckLock::acquire(&self.deck_path)?;
        let mut deck = Deck::load_or_default(&self.deck_path)?;
        let card = Card::new(
            Uuid::new_v4().to_string(),
            question,
            answer,
            memory,
            self.clock.now(),
        );
        deck.insert(card.clone())?;
        deck.save(&self.deck_path)?;

        info!(card = %card.id, "Card added");
        Ok(card)
    }
}

/// Instant `interval_days` after `now`, failing instead of overflowing
fn review_due_at(now: DateTime<Utc>, interval_days: f64) -> Result<DateTime<Utc>> {
    let millis = (interval_days * MILLIS_PER_DAY).round() as i64;
    TimeDelta::try_milliseconds(millis)
        .and_then(|delta| now.checked_add_signed(delta))
        .ok_or_else(|| {
            SchedulerError::Domain(format!(
                "next review {interval_days} days after {now} is out of range"
            ))
            .into()
        })
}

// ============================================================================
// TESTS
// ============================================================================
