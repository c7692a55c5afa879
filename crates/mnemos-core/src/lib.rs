//! # Mnemos Core
//!
//! Spaced repetition memory engine built on FSRS-6:
//!
//! - **Memory Model**: power-law forgetting curve mapping stability and elapsed
//!   time to retrievability, with R(S, S) = 0.9
//! - **Transition Engine**: the four next memory states (Again/Hard/Good/Easy)
//!   and their recommended intervals for a target retention
//! - **Review Queue**: picks the card with the lowest current retrievability
//!   from a caller-owned collection
//!
//! Everything here is pure computation over explicit values. The engine is
//! constructed once from fixed weights and passed by reference; it performs
//! no I/O and holds no mutable state, so it can be shared across threads.
//!
//! ## Quick Start
//!
//! ```rust
//! use mnemos_core::{FSRSScheduler, MemoryState};
//!
//! let scheduler = FSRSScheduler::default();
//! let state = MemoryState::new(1.5, 6.0)?;
//!
//! // Chance of recall five days after the last review
//! let r = scheduler.retrievability(&state, 5.0)?;
//! assert!(r < 0.9);
//!
//! // What each rating would do
//! let next = scheduler.next_states(&state, 0.9, 5.0)?;
//! assert!(next.easy.memory.stability() >= next.good.memory.stability());
//! # Ok::<(), mnemos_core::SchedulerError>(())
//! ```

#![cfg_attr(docsrs, feature(doc_cfg))]
#![warn(rustdoc::missing_crate_level_docs)]

// ============================================================================
// MODULES
// ============================================================================

pub mod clock;
pub mod error;
pub mod fsrs;
pub mod queue;

// ============================================================================
// PUBLIC API RE-EXPORTS
// ============================================================================

pub use clock::{Clock, FixedClock, SystemClock};
pub use error::{Result, SchedulerError};

// FSRS-6 algorithm
pub use fsrs::{
    next_interval,
    // Core functions for advanced usage
    retrievability,
    retrievability_with_decay,
    ElapsedPolicy,
    FSRSParameters,
    FSRSScheduler,
    ItemState,
    MemoryState,
    NextStates,
    Rating,
    ReviewOutcome,
    DEFAULT_RETENTION,
    MAX_DIFFICULTY,
    MIN_DIFFICULTY,
};

// Next-card selection
pub use queue::{
    apply_review, rank_cards, select_next_card, CardSnapshot, DueCard, Reviewable, ReviewableMut,
};

// ============================================================================
// VERSION INFO
// ============================================================================

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
