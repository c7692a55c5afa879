//! Error types for the scheduling core

// ============================================================================
// ERROR TYPES
// ============================================================================

/// Scheduler error type
///
/// Every variant is a contract violation by the caller. An empty card
/// collection is not an error; selection returns `Ok(None)` for it.
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SchedulerError {
    /// Rating outside Again/Hard/Good/Easy
    #[error("Invalid rating: {0} (expected 1-4 or again/hard/good/easy)")]
    InvalidRating(String),
    /// Input outside the mathematical domain of the model
    #[error("Domain error: {0}")]
    Domain(String),
    /// Memory state violates its invariants
    #[error("Invalid memory state: stability={stability}, difficulty={difficulty}")]
    InvalidState {
        /// Offending stability
        stability: f64,
        /// Offending difficulty
        difficulty: f64,
    },
    /// Model parameters rejected at construction
    #[error("Invalid parameters: {0}")]
    InvalidParameters(String),
}

/// Scheduler result type
pub type Result<T> = std::result::Result<T, SchedulerError>;
