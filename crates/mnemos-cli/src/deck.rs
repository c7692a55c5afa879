//! Deck file
//!
//! The card collection lives in a single JSON array on disk. Writes go to a
//! sibling temp file which is then renamed over the deck, so a crash never
//! leaves a half-written deck behind.
//!
//! Commands that rewrite the deck hold a [`DeckLock`] from load to save so
//! that concurrent `mnemos` processes cannot overwrite each other's reviews.

use std::fs::{self, File, OpenOptions};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Duration, Utc};
use fs4::fs_std::FileExt;
use mnemos_core::{MemoryState, ReviewOutcome, Reviewable, ReviewableMut, SchedulerError};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

// ============================================================================
// ERROR TYPES
// ============================================================================

/// Deck error type
#[non_exhaustive]
#[derive(Debug, thiserror::Error)]
pub enum DeckError {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    /// Malformed deck file
    #[error("Invalid deck file: {0}")]
    Json(#[from] serde_json::Error),
    /// No deck at the configured path
    #[error("No deck at {0} (run `mnemos init` first)")]
    Missing(PathBuf),
    /// Card not found
    #[error("Card not found: {0}")]
    NotFound(String),
    /// Card id already in use
    #[error("Card already exists: {0}")]
    DuplicateId(String),
    /// Deck already exists and overwrite was not requested
    #[error("Deck already exists at {0} (use --force to overwrite)")]
    AlreadyExists(PathBuf),
    /// Scheduling rejected the input
    #[error(transparent)]
    Scheduler(#[from] SchedulerError),
}

/// Deck result type
pub type Result<T> = std::result::Result<T, DeckError>;

// ============================================================================
// CARD
// ============================================================================

/// A flashcard with its scheduling state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Card {
    pub id: String,
    pub question: String,
    pub answer: String,
    #[serde(flatten)]
    pub memory: MemoryState,
    pub last_reviewed: DateTime<Utc>,
    /// Last computed retrievability, display only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub retrievability: Option<f64>,
    /// Last computed interval in days, display only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_review_interval: Option<f64>,
}

impl Card {
    pub fn new(
        id: impl Into<String>,
        question: impl Into<String>,
        answer: impl Into<String>,
        memory: MemoryState,
        last_reviewed: DateTime<Utc>,
    ) -> Self {
        Self {
            id: id.into(),
            question: question.into(),
            answer: answer.into(),
            memory,
            last_reviewed,
            retrievability: None,
            next_review_interval: None,
        }
    }
}

impl Reviewable for Card {
    fn id(&self) -> &str {
        &self.id
    }

    fn memory(&self) -> MemoryState {
        self.memory
    }

    fn last_reviewed(&self) -> DateTime<Utc> {
        self.last_reviewed
    }
}

impl ReviewableMut for Card {
    fn record_review(&mut self, outcome: &ReviewOutcome, reviewed_at: DateTime<Utc>) {
        self.memory = outcome.next.memory;
        self.last_reviewed = reviewed_at;
        self.retrievability = Some(outcome.retrievability);
        self.next_review_interval = Some(outcome.next.interval);
    }
}

// ============================================================================
// DECK
// ============================================================================

/// Ordered card collection
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Deck {
    cards: Vec<Card>,
}

impl Deck {
    /// Three starter cards, last reviewed 5, 3 and 2 days before `now`
    pub fn sample(now: DateTime<Utc>) -> Result<Self> {
        let seed = [
            ("1", "What is the capital of France?", "Paris", 1.5, 6.0, 5),
            ("2", "What is 2 + 2?", "4", 2.0, 4.0, 3),
            ("3", "What is the largest planet in the solar system?", "Jupiter", 3.0, 5.0, 2),
        ];

        let cards = seed
            .into_iter()
            .map(|(id, question, answer, stability, difficulty, days_ago)| {
                let memory = MemoryState::new(stability, difficulty)?;
                Ok(Card::new(id, question, answer, memory, now - Duration::days(days_ago)))
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self { cards })
    }

    /// Load a deck, failing with [`DeckError::Missing`] when the file is absent
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(DeckError::Missing(path.to_path_buf()));
        }
        let raw = fs::read_to_string(path)?;
        let deck: Deck = serde_json::from_str(&raw)?;
        debug!(path = %path.display(), cards = deck.cards.len(), "Loaded deck");
        Ok(deck)
    }

    /// Load a deck, starting empty when the file is absent
    pub fn load_or_default(path: &Path) -> Result<Self> {
        match Self::load(path) {
            Err(DeckError::Missing(_)) => Ok(Self::default()),
            other => other,
        }
    }

    /// Write the deck through a temp file and rename
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        let tmp = path.with_extension("json.tmp");
        let json = serde_json::to_string_pretty(self)?;
        fs::write(&tmp, json)?;
        fs::rename(&tmp, path)?;

        info!(path = %path.display(), cards = self.cards.len(), "Saved deck");
        Ok(())
    }

    pub fn cards(&self) -> &[Card] {
        &self.cards
    }

    pub fn len(&self) -> usize {
        self.cards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    pub fn get(&self, id: &str) -> Result<&Card> {
        self.cards
            .iter()
            .find(|c| c.id == id)
            .ok_or_else(|| DeckError::NotFound(id.to_string()))
    }

    pub fn get_mut(&mut self, id: &str) -> Result<&mut Card> {
        self.cards
            .iter_mut()
            .find(|c| c.id == id)
            .ok_or_else(|| DeckError::NotFound(id.to_string()))
    }

    /// Append a card, rejecting duplicate ids
    pub fn insert(&mut self, card: Card) -> Result<()> {
        if self.cards.iter().any(|c| c.id == card.id) {
            return Err(DeckError::DuplicateId(card.id));
        }
        self.cards.push(card);
        Ok(())
    }
}

// ============================================================================
// LOCKING
// ============================================================================

/// Exclusive advisory lock on a deck, released on drop
///
/// Held on a `.lock` sibling rather than the deck itself, since saving
/// renames a new file over the deck path.
#[derive(Debug)]
pub struct DeckLock {
    file: File,
    path: PathBuf,
}

impl DeckLock {
    /// Block until no other process or thread holds the lock for `deck_path`
    pub fn acquire(deck_path: &Path) -> Result<Self> {
        if let Some(parent) = deck_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        let path = deck_path.with_extension("json.lock");
        let file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(&path)?;
        FileExt::lock_exclusive(&file)?;

        debug!(path = %path.display(), "Acquired deck lock");
        Ok(Self { file, path })
    }
}

impl Drop for DeckLock {
    fn drop(&mut self) {
        if let Err(e) = FileExt::unlock(&self.file) {
            warn!(path = %self.path.display(), error = %e, "Failed to release deck lock");
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================
