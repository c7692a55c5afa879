//! FSRS-6 closed-form equations
//!
//! Every function here is pure and operates on plain `f64` values. Inputs are
//! assumed to be validated by the caller (see [`super::FSRSScheduler`]).

// ============================================================================
// CONSTANTS
// ============================================================================

/// FSRS-6 default weights (21 parameters)
pub const FSRS6_WEIGHTS: [f64; 21] = [
    0.212, 1.2931, 2.3065, 8.2956, 6.4133, 0.8334, 3.0194, 0.001, 1.8722, 0.1666, 0.796, 1.4835,
    0.0614, 0.2629, 1.6483, 0.6014, 1.8729, 0.5425, 0.0912, 0.0658, 0.1542,
];

/// Default forgetting curve decay (w20)
pub const DEFAULT_DECAY: f64 = 0.1542;

/// Default desired retention
pub const DEFAULT_RETENTION: f64 = 0.9;

/// Retention reached after exactly `stability` days
pub const REFERENCE_RETENTION: f64 = 0.9;

/// Lower difficulty bound
pub const MIN_DIFFICULTY: f64 = 1.0;

/// Upper difficulty bound
pub const MAX_DIFFICULTY: f64 = 10.0;

/// Lower stability bound (days)
pub const MIN_STABILITY: f64 = 0.001;

/// Upper stability bound (days)
pub const MAX_STABILITY: f64 = 36500.0;

/// Default cap on recommended intervals (days)
pub const DEFAULT_MAXIMUM_INTERVAL: f64 = 36500.0;

// ============================================================================
// FORGETTING CURVE
// ============================================================================

/// Curve factor chosen so that R(S, S) = 0.9 for any decay
#[inline]
pub fn decay_factor(decay: f64) -> f64 {
    REFERENCE_RETENTION.powf(-1.0 / decay) - 1.0
}

/// Retrievability with the default decay
pub fn retrievability(stability: f64, elapsed_days: f64) -> f64 {
    retrievability_with_decay(stability, elapsed_days, DEFAULT_DECAY)
}

/// Power-law forgetting curve: R = (1 + factor * t / S)^(-decay)
pub fn retrievability_with_decay(stability: f64, elapsed_days: f64, decay: f64) -> f64 {
    let factor = decay_factor(decay);
    (1.0 + factor * elapsed_days / stability)
        .powf(-decay)
        .clamp(0.0, 1.0)
}

/// Interval with the default decay
pub fn next_interval(stability: f64, desired_retention: f64) -> f64 {
    next_interval_with_decay(stability, desired_retention, DEFAULT_DECAY)
}

/// Inverse of the forgetting curve: days until R falls to `desired_retention`
///
/// t = S / factor * (r^(-1/decay) - 1)
pub fn next_interval_with_decay(stability: f64, desired_retention: f64, decay: f64) -> f64 {
    let factor = decay_factor(decay);
    stability / factor * (desired_retention.powf(-1.0 / decay) - 1.0)
}

// ============================================================================
// COLD START
// ============================================================================

/// Initial stability for a first review graded `grade` (1-4)
pub fn initial_stability_with_weights(grade: u8, w: &[f64; 21]) -> f64 {
    w[usize::from(grade.clamp(1, 4)) - 1].clamp(MIN_STABILITY, MAX_STABILITY)
}

/// Initial stability with the default weights
pub fn initial_stability(grade: u8) -> f64 {
    initial_stability_with_weights(grade, &FSRS6_WEIGHTS)
}

/// D0(G) = w4 - e^(w5 * (G - 1)) + 1, not clamped
fn raw_initial_difficulty(grade: u8, w: &[f64; 21]) -> f64 {
    w[4] - (w[5] * (f64::from(grade) - 1.0)).exp() + 1.0
}

/// Initial difficulty for a first review graded `grade` (1-4)
pub fn initial_difficulty_with_weights(grade: u8, w: &[f64; 21]) -> f64 {
    raw_initial_difficulty(grade.clamp(1, 4), w).clamp(MIN_DIFFICULTY, MAX_DIFFICULTY)
}

/// Initial difficulty with the default weights
pub fn initial_difficulty(grade: u8) -> f64 {
    initial_difficulty_with_weights(grade, &FSRS6_WEIGHTS)
}

// ============================================================================
// DIFFICULTY
// ============================================================================

/// Next difficulty: linear damping, then mean reversion towards D0(Easy)
pub fn next_difficulty_with_weights(difficulty: f64, grade: u8, w: &[f64; 21]) -> f64 {
    let delta = -w[6] * (f64::from(grade) - 3.0);
    let damped = difficulty + delta * (MAX_DIFFICULTY - difficulty) / 9.0;
    let reverted = w[7] * raw_initial_difficulty(4, w) + (1.0 - w[7]) * damped;
    reverted.clamp(MIN_DIFFICULTY, MAX_DIFFICULTY)
}

/// Next difficulty with the default weights
pub fn next_difficulty(difficulty: f64, grade: u8) -> f64 {
    next_difficulty_with_weights(difficulty, grade, &FSRS6_WEIGHTS)
}

// ============================================================================
// STABILITY
// ============================================================================

/// Stability after a successful recall (Hard/Good/Easy)
pub fn next_recall_stability_with_weights(
    stability: f64,
    difficulty: f64,
    retrievability: f64,
    grade: u8,
    w: &[f64; 21],
) -> f64 {
    let hard_penalty = if grade == 2 { w[15] } else { 1.0 };
    let easy_bonus = if grade == 4 { w[16] } else { 1.0 };

    let growth = w[8].exp()
        * (11.0 - difficulty)
        * stability.powf(-w[9])
        * ((w[10] * (1.0 - retrievability)).exp() - 1.0)
        * hard_penalty
        * easy_bonus;

    (stability * (1.0 + growth)).clamp(MIN_STABILITY, MAX_STABILITY)
}

/// Recall stability with the default weights
pub fn next_recall_stability(stability: f64, difficulty: f64, retrievability: f64, grade: u8) -> f64 {
    next_recall_stability_with_weights(stability, difficulty, retrievability, grade, &FSRS6_WEIGHTS)
}

/// Stability after a lapse (Again)
///
/// Never exceeds the previous stability.
pub fn next_forget_stability_with_weights(
    stability: f64,
    difficulty: f64,
    retrievability: f64,
    w: &[f64; 21],
) -> f64 {
    let post_lapse = w[11]
        * difficulty.powf(-w[12])
        * ((stability + 1.0).powf(w[13]) - 1.0)
        * (w[14] * (1.0 - retrievability)).exp();
    let short_term_cap = stability / (w[17] * w[18]).exp();

    post_lapse
        .min(short_term_cap)
        .min(stability)
        .clamp(MIN_STABILITY, MAX_STABILITY)
}

/// Forget stability with the default weights
pub fn next_forget_stability(stability: f64, difficulty: f64, retrievability: f64) -> f64 {
    next_forget_stability_with_weights(stability, difficulty, retrievability, &FSRS6_WEIGHTS)
}

/// Stability after a successful same-day review (less than a day elapsed)
///
/// S' = S * e^(w17 * (G - 3 + w18)) * S^(-w19), never below S for Good/Easy.
/// Hard is not floored: with the default weights a same-day Hard review
/// lowers stability (S = 5 becomes roughly 2.75).
pub fn same_day_stability_with_weights(stability: f64, grade: u8, w: &[f64; 21]) -> f64 {
    let increase = (w[17] * (f64::from(grade) - 3.0 + w[18])).exp() * stability.powf(-w[19]);
    let mut next = stability * increase;
    if grade >= 3 {
        next = next.max(stability);
    }
    next.clamp(MIN_STABILITY, MAX_STABILITY)
}

/// Same-day stability with the default weights
pub fn same_day_stability(stability: f64, grade: u8) -> f64 {
    same_day_stability_with_weights(stability, grade, &FSRS6_WEIGHTS)
}

// ============================================================================
// TESTS
// ============================================================================
