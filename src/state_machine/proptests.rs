//! Property-based tests for the state machine
//!
//! These tests verify key invariants hold across arbitrary event sequences.

use super::state::*;
use super::transition::*;
use super::*;
use crate::fortune::{FortuneOutcome, DEGRADED_FORTUNE};
use proptest::prelude::*;
use std::collections::HashSet;

// ============================================================================
// Test Helpers
// ============================================================================

fn test_context() -> DrawContext {
    DrawContext::default()
}

/// Abstract step. Runtime events are bound to a cycle when applied, so a
/// sequence can mix current and stale work.
#[derive(Debug, Clone)]
enum Step {
    Start,
    Stop,
    Reset,
    CredentialAccepted,
    Drawn { numbers: Vec<u32>, stale: bool },
    Tick { stale: bool },
    Fortune { outcome: FortuneOutcome, stale: bool },
}

impl Step {
    fn to_event(&self, session: &DrawSession) -> Event {
        let cycle_for = |stale: bool| {
            if stale {
                session.cycle.wrapping_sub(1)
            } else {
                session.cycle
            }
        };
        match self {
            Step::Start => Event::Start,
            Step::Stop => Event::Stop,
            Step::Reset => Event::Reset,
            Step::CredentialAccepted => Event::CredentialAccepted,
            Step::Drawn { numbers, stale } => Event::NumbersDrawn {
                cycle: cycle_for(*stale),
                numbers: numbers.clone(),
            },
            Step::Tick { stale } => Event::RevealTick {
                cycle: cycle_for(*stale),
            },
            Step::Fortune { outcome, stale } => Event::FortuneResolved {
                cycle: cycle_for(*stale),
                outcome: outcome.clone(),
            },
        }
    }
}

// ============================================================================
// Arbitrary Generators
// ============================================================================

fn arb_numbers() -> impl Strategy<Value = Vec<u32>> {
    proptest::sample::subsequence((1..=45).collect::<Vec<u32>>(), 6).prop_shuffle()
}

fn arb_outcome() -> impl Strategy<Value = FortuneOutcome> {
    prop_oneof![
        "[a-zA-Z ]{1,30}".prop_map(FortuneOutcome::Success),
        Just(FortuneOutcome::CredentialInvalid),
        Just(FortuneOutcome::Degraded(DEGRADED_FORTUNE.to_string())),
    ]
}

fn arb_step() -> impl Strategy<Value = Step> {
    prop_oneof![
        3 => Just(Step::Start),
        3 => Just(Step::Stop),
        1 => Just(Step::Reset),
        1 => Just(Step::CredentialAccepted),
        2 => (arb_numbers(), proptest::bool::weighted(0.2))
            .prop_map(|(numbers, stale)| Step::Drawn { numbers, stale }),
        6 => proptest::bool::weighted(0.2).prop_map(|stale| Step::Tick { stale }),
        2 => (arb_outcome(), proptest::bool::weighted(0.2))
            .prop_map(|(outcome, stale)| Step::Fortune { outcome, stale }),
    ]
}

// ============================================================================
// Invariants
// ============================================================================

fn check_invariants(session: &DrawSession) -> Result<(), String> {
    let ctx = test_context();

    if !session.drawn.starts_with(&session.revealed_numbers) {
        return Err(format!(
            "revealed {:?} is not a prefix of drawn {:?}",
            session.revealed_numbers, session.drawn
        ));
    }

    if !session.drawn.is_empty() {
        let unique: HashSet<_> = session.drawn.iter().collect();
        if session.drawn.len() != ctx.count || unique.len() != ctx.count {
            return Err(format!("drawn is not {} distinct numbers", ctx.count));
        }
        if !session
            .drawn
            .iter()
            .all(|n| (ctx.range_min..=ctx.range_max).contains(n))
        {
            return Err("drawn number out of range".to_string());
        }
    }

    match session.status {
        DrawStatus::Idle | DrawStatus::Spinning => {
            if !session.drawn.is_empty()
                || !session.revealed_numbers.is_empty()
                || session.final_numbers.is_some()
                || session.fortune_text.is_some()
                || session.fortune_loading
            {
                return Err(format!("leftover draw state in {:?}", session.status));
            }
        }
        DrawStatus::Drawing => {
            if session.final_numbers.is_some() || session.fortune_loading {
                return Err("finished data while drawing".to_string());
            }
        }
        DrawStatus::Finished => {
            if session.final_numbers.as_ref() != Some(&session.drawn)
                || session.revealed_numbers != session.drawn
            {
                return Err("finished without all numbers revealed".to_string());
            }
        }
    }

    if session.credential_renewed && !session.fortune_loading {
        return Err("key renewal outlived the fortune request".to_string());
    }

    if session.fortune_loading && session.fortune_text.is_some() {
        return Err("stale fortune text shown while loading".to_string());
    }

    Ok(())
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(1000))]

    // Invariant 1: every reachable session is consistent
    #[test]
    fn prop_transitions_preserve_invariants(steps in proptest::collection::vec(arb_step(), 0..40)) {
        let ctx = test_context();
        let mut session = DrawSession::default();

        for step in steps {
            let event = step.to_event(&session);
            if let Ok(result) = transition(&session, &ctx, event) {
                session = result.new_state;
                if let Err(msg) = check_invariants(&session) {
                    prop_assert!(false, "{} in {:?}", msg, session);
                }
            }
        }
    }

    // Invariant 2: work from an abandoned cycle never changes anything
    #[test]
    fn prop_stale_events_never_mutate(steps in proptest::collection::vec(arb_step(), 0..40)) {
        let ctx = test_context();
        let mut session = DrawSession::default();

        for step in steps {
            let event = step.to_event(&session);
            let stale = event.cycle().is_some_and(|c| c != session.cycle);
            match transition(&session, &ctx, event) {
                Ok(result) => {
                    prop_assert!(!stale, "stale event accepted");
                    session = result.new_state;
                }
                Err(e) => {
                    if stale {
                        let is_stale_error = matches!(e, TransitionError::StaleCycle { .. });
                        prop_assert!(is_stale_error);
                    }
                }
            }
        }
    }

    // Invariant 3: the cycle counter never goes backwards
    #[test]
    fn prop_cycle_is_monotonic(steps in proptest::collection::vec(arb_step(), 0..40)) {
        let ctx = test_context();
        let mut session = DrawSession::default();

        for step in steps {
            let event = step.to_event(&session);
            if let Ok(result) = transition(&session, &ctx, event) {
                prop_assert!(result.new_state.cycle >= session.cycle);
                session = result.new_state;
            }
        }
    }

    // Invariant 4: any number of stops after a spin yields one draw
    #[test]
    fn prop_repeated_stop_draws_once(extra_stops in 1usize..10) {
        let ctx = test_context();
        let mut session = transition(&DrawSession::default(), &ctx, Event::Start)
            .unwrap()
            .new_state;
        let mut draws = 0;

        for _ in 0..=extra_stops {
            let result = transition(&session, &ctx, Event::Stop).unwrap();
            draws += result
                .effects
                .iter()
                .filter(|e| matches!(e, Effect::DrawNumbers { .. }))
                .count();
            session = result.new_state;
        }

        prop_assert_eq!(draws, 1);
        prop_assert_eq!(session.status, DrawStatus::Drawing);
    }

    // Invariant 5: the happy path reveals exactly the drawn order
    #[test]
    fn prop_full_cycle_reveals_draw_order(numbers in arb_numbers()) {
        let ctx = test_context();
        let mut session = DrawSession::default();
        for event in [Event::Start, Event::Stop] {
            session = transition(&session, &ctx, event).unwrap().new_state;
        }
        session = transition(
            &session,
            &ctx,
            Event::NumbersDrawn { cycle: session.cycle, numbers: numbers.clone() },
        )
        .unwrap()
        .new_state;

        let mut fortune_requests = Vec::new();
        for i in 0..numbers.len() {
            let result = transition(&session, &ctx, Event::RevealTick { cycle: session.cycle }).unwrap();
            session = result.new_state;
            prop_assert_eq!(&session.revealed_numbers[..], &numbers[..=i]);
            fortune_requests.extend(result.effects.into_iter().filter_map(|e| match e {
                Effect::RequestFortune { numbers, .. } => Some(numbers),
                _ => None,
            }));
        }

        prop_assert_eq!(session.status, DrawStatus::Finished);
        prop_assert_eq!(session.final_numbers.as_ref(), Some(&numbers));
        prop_assert_eq!(fortune_requests, vec![numbers]);
    }
}
