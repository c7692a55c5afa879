//! FSRS-6 (Free Spaced Repetition Scheduler) Module
//!
//! Reference: https://github.com/open-spaced-repetition/fsrs4anki
//!
//! ## Core Formulas:
//! - Retrievability: R = (1 + FACTOR * t / S)^(-w20) where FACTOR = 0.9^(-1/w20) - 1
//! - Interval: t = S/FACTOR * (R^(-1/w20) - 1)
//! - Lapse: S' = w11 * D^(-w12) * ((S+1)^w13 - 1) * e^(w14 * (1-R))
//! - Recall: S' = S * (1 + e^w8 * (11-D) * S^(-w9) * (e^(w10 * (1-R)) - 1) * penalty * bonus)

mod algorithm;
mod scheduler;

pub use algorithm::{
    decay_factor,
    initial_difficulty,
    initial_difficulty_with_weights,
    initial_stability,
    initial_stability_with_weights,
    next_difficulty,
    next_difficulty_with_weights,
    next_forget_stability,
    next_forget_stability_with_weights,
    next_interval,
    next_interval_with_decay,
    next_recall_stability,
    next_recall_stability_with_weights,
    // Core functions
    retrievability,
    retrievability_with_decay,
    same_day_stability,
    same_day_stability_with_weights,
    DEFAULT_DECAY,
    DEFAULT_MAXIMUM_INTERVAL,
    DEFAULT_RETENTION,
    // Constants
    FSRS6_WEIGHTS,
    MAX_DIFFICULTY,
    MAX_STABILITY,
    MIN_DIFFICULTY,
    MIN_STABILITY,
    REFERENCE_RETENTION,
};

pub use scheduler::{
    ElapsedPolicy, FSRSParameters, FSRSScheduler, ItemState, MemoryState, NextStates, Rating,
    ReviewOutcome,
};
