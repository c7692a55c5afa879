//! Next-card selection
//!
//! The selected card must be the first card with the minimum current
//! retrievability, checked against a brute-force scan over generated decks.

use chrono::{DateTime, Duration, Utc};
use mnemos_core::{rank_cards, select_next_card, FSRSScheduler, SchedulerError};
use mnemos_e2e_tests::mocks::{TestCard, TestDataFactory};
use proptest::prelude::*;

// ============================================================================
// Arbitrary Generators
// ============================================================================

fn arb_deck() -> impl Strategy<Value = Vec<TestCard>> {
    let now = TestDataFactory::epoch();
    prop::collection::vec((0.01f64..=500.0, 1.0f64..=10.0, 0i64..=24 * 400), 1..40).prop_map(
        move |rows| {
            rows.into_iter()
                .enumerate()
                .map(|(i, (s, d, hours_ago))| {
                    TestDataFactory::card(&format!("card-{i}"), s, d, now - Duration::hours(hours_ago))
                })
                .collect()
        },
    )
}

/// First index holding the minimum retrievability, computed card by card
fn brute_force_min(scheduler: &FSRSScheduler, cards: &[TestCard], now: DateTime<Utc>) -> (usize, f64) {
    let mut best = (0, f64::INFINITY);
    for (i, card) in cards.iter().enumerate() {
        let elapsed = scheduler.days_between(card.last_reviewed, now);
        let r = scheduler.retrievability(&card.memory, elapsed).unwrap();
        if r < best.1 {
            best = (i, r);
        }
    }
    best
}

// ============================================================================
// Properties
// ============================================================================

proptest! {
    #[test]
    fn selects_first_minimum(cards in arb_deck()) {
        let scheduler = FSRSScheduler::default();
        let now = TestDataFactory::epoch();

        let due = select_next_card(&scheduler, &cards, now).unwrap().unwrap();
        let (position, retrievability) = brute_force_min(&scheduler, &cards, now);

        prop_assert_eq!(due.position, position);
        prop_assert_eq!(&due.card.id, &cards[position].id);
        prop_assert_eq!(due.retrievability.to_bits(), retrievability.to_bits());
        prop_assert!(due.recommended_interval > 0.0);
    }

    #[test]
    fn duplicated_deck_still_picks_first_copy(cards in arb_deck()) {
        let scheduler = FSRSScheduler::default();
        let now = TestDataFactory::epoch();

        let mut doubled = cards.clone();
        doubled.extend(cards.iter().cloned());

        let single = select_next_card(&scheduler, &cards, now).unwrap().unwrap();
        let double = select_next_card(&scheduler, &doubled, now).unwrap().unwrap();
        prop_assert_eq!(single.position, double.position);
    }

    #[test]
    fn selection_leaves_deck_untouched(cards in arb_deck()) {
        let scheduler = FSRSScheduler::default();
        let before = cards.clone();
        let _ = select_next_card(&scheduler, &cards, TestDataFactory::epoch()).unwrap();
        prop_assert_eq!(cards, before);
    }

    #[test]
    fn ranking_agrees_with_selection(cards in arb_deck()) {
        let scheduler = FSRSScheduler::default();
        let now = TestDataFactory::epoch();

        let ranked = rank_cards(&scheduler, &cards, now).unwrap();
        let due = select_next_card(&scheduler, &cards, now).unwrap().unwrap();

        prop_assert_eq!(ranked.len(), cards.len());
        let min = ranked
            .iter()
            .map(|snapshot| snapshot.retrievability)
            .fold(f64::INFINITY, f64::min);
        prop_assert_eq!(min.to_bits(), due.retrievability.to_bits());
        prop_assert_eq!(&ranked[due.position].id, &due.card.id);
    }
}

// ============================================================================
// Fixed cases
// ============================================================================

#[test]
fn test_empty_deck_has_no_next_card() {
    let scheduler = FSRSScheduler::default();
    let cards: Vec<TestCard> = Vec::new();
    assert!(select_next_card(&scheduler, &cards, TestDataFactory::epoch())
        .unwrap()
        .is_none());
    assert!(rank_cards(&scheduler, &cards, TestDataFactory::epoch())
        .unwrap()
        .is_empty());
}

#[test]
fn test_single_card_is_selected() {
    let scheduler = FSRSScheduler::default();
    let now = TestDataFactory::epoch();
    let cards = vec![TestDataFactory::card("solo", 4.0, 5.0, now - Duration::days(1))];

    let due = select_next_card(&scheduler, &cards, now).unwrap().unwrap();
    assert_eq!(due.card.id, "solo");
    assert!((due.elapsed_days - 1.0).abs() < 1e-9);
}

#[test]
fn test_sample_deck_picks_capital_of_france() {
    let scheduler = FSRSScheduler::default();
    let now = TestDataFactory::epoch();
    let cards = TestDataFactory::sample_deck(now);

    let due = select_next_card(&scheduler, &cards, now).unwrap().unwrap();
    assert_eq!(due.card.id, "capital-of-france");
    assert_eq!(due.position, 0);
    assert!(due.retrievability < 0.9);
}

#[test]
fn test_identical_cards_tie_to_first() {
    let scheduler = FSRSScheduler::default();
    let now = TestDataFactory::epoch();
    let last = now - Duration::days(6);
    let cards = vec![
        TestDataFactory::card("strong", 50.0, 5.0, last),
        TestDataFactory::card("twin-a", 1.0, 7.0, last),
        TestDataFactory::card("twin-b", 1.0, 7.0, last),
    ];

    let due = select_next_card(&scheduler, &cards, now).unwrap().unwrap();
    assert_eq!(due.card.id, "twin-a");
}

#[test]
fn test_future_review_surfaces_as_error() {
    let scheduler = FSRSScheduler::default();
    let now = TestDataFactory::epoch();
    let mut cards = TestDataFactory::sample_deck(now);
    cards.push(TestDataFactory::card("from-the-future", 2.0, 5.0, now + Duration::hours(3)));

    assert!(matches!(
        select_next_card(&scheduler, &cards, now),
        Err(SchedulerError::Domain(_))
    ));
}

#[test]
fn test_parallel_ranking_matches_sequential() {
    let scheduler = FSRSScheduler::default();
    let now = TestDataFactory::epoch();
    let cards = TestDataFactory::create_batch(500, now);

    let sequential = rank_cards(&scheduler, &cards, now).unwrap();

    let parallel: Vec<_> = std::thread::scope(|scope| {
        let handles: Vec<_> = cards
            .chunks(64)
            .map(|chunk| {
                let scheduler = &scheduler;
                scope.spawn(move || rank_cards(scheduler, chunk, now))
            })
            .collect();
        handles
            .into_iter()
            .flat_map(|handle| handle.join().unwrap().unwrap())
            .collect()
    });

    assert_eq!(parallel, sequential);
}
