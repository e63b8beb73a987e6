//! Property-based tests for the state machine
//!
//! These tests verify key invariants hold across all possible inputs.

use super::state::*;
use super::transition::*;
use super::*;
use crate::companion::Personality;
use proptest::prelude::*;

// ============================================================================
// Test Helpers
// ============================================================================

fn test_context() -> SessionContext {
    SessionContext::new("test-session")
}

/// How the simulated collaborators answer
#[derive(Debug, Clone, Copy)]
enum Outcome {
    Success,
    Failure,
}

/// Drive one event to completion, answering collaborator effects with
/// `outcome`. Returns the settled step and every reply emitted.
fn settle(step: &SessionStep, event: Event, outcome: Outcome) -> (SessionStep, Vec<String>) {
    let context = test_context();
    let mut state = step.clone();
    let mut replies = Vec::new();
    let mut pending = vec![event];

    while let Some(event) = pending.pop() {
        let result = transition(&state, &context, event).expect("resting steps accept turns");
        state = result.new_state;
        for effect in result.effects {
            match (effect, outcome) {
                (Effect::Reply { text }, _) => replies.push(text),
                (Effect::RequestTherapyReply { text }, Outcome::Success) => {
                    pending.push(Event::TherapyReply {
                        user_text: text,
                        reply: "reply".to_string(),
                    });
                }
                (Effect::RequestSummary { .. }, Outcome::Success) => {
                    pending.push(Event::SummaryReady {
                        reply: "summary".to_string(),
                    });
                }
                (Effect::ExtractDocument { .. }, Outcome::Success) => {
                    pending.push(Event::DocumentExtracted {
                        text: "report".to_string(),
                    });
                }
                (Effect::AppendJournal { .. }, Outcome::Success) => {
                    pending.push(Event::JournalSaved);
                }
                (Effect::RequestTherapyReply { .. } | Effect::RequestSummary { .. }, Outcome::Failure) => {
                    pending.push(Event::LlmFailed {
                        message: "down".to_string(),
                    });
                }
                (Effect::ExtractDocument { .. }, Outcome::Failure) => {
                    pending.push(Event::ExtractionFailed {
                        message: "bad file".to_string(),
                    });
                }
                (Effect::AppendJournal { .. }, Outcome::Failure) => {
                    pending.push(Event::JournalFailed {
                        message: "disk full".to_string(),
                    });
                }
                _ => {}
            }
        }
    }

    (state, replies)
}

// ============================================================================
// Arbitrary Generators
// ============================================================================

fn arb_step() -> impl Strategy<Value = SessionStep> {
    prop_oneof![
        Just(SessionStep::Menu),
        Just(SessionStep::Therapy),
        Just(SessionStep::Summary),
        Just(SessionStep::JournalAwaitingMood),
        "[a-zA-Z ]{1,12}".prop_map(|mood| SessionStep::JournalAwaitingEntry {
            mood: format!("m{mood}")
        }),
    ]
}

fn arb_attachment() -> impl Strategy<Value = Option<Attachment>> {
    prop_oneof![
        Just(None),
        proptest::collection::vec(any::<u8>(), 0..32).prop_map(|data| Some(Attachment {
            name: "upload.pdf".to_string(),
            media_type: "application/pdf".to_string(),
            data,
        })),
    ]
}

fn arb_user_turn() -> impl Strategy<Value = Event> {
    (".{0,24}", arb_attachment()).prop_map(|(text, attachment)| Event::UserTurn { text, attachment })
}

fn arb_outcome() -> impl Strategy<Value = Outcome> {
    prop_oneof![Just(Outcome::Success), Just(Outcome::Failure)]
}

fn arb_personality() -> impl Strategy<Value = Personality> {
    proptest::sample::select(Personality::ALL.to_vec())
}

fn arb_service() -> impl Strategy<Value = Option<Service>> {
    prop_oneof![
        Just(None),
        Just(Some(Service::Therapy)),
        Just(Some(Service::Summary)),
        Just(Some(Service::Journal)),
    ]
}

// ============================================================================
// Properties
// ============================================================================

proptest! {
    /// Every turn from every step ends with exactly one outbound message
    #[test]
    fn prop_every_turn_emits_exactly_one_reply(
        step in arb_step(),
        event in arb_user_turn(),
        outcome in arb_outcome(),
    ) {
        let (_, replies) = settle(&step, event, outcome);
        prop_assert_eq!(replies.len(), 1);
    }

    /// Anything but 1, 2 or 3 leaves the menu untouched
    #[test]
    fn prop_invalid_menu_input_keeps_menu(text in ".{0,24}") {
        prop_assume!(!matches!(text.trim(), "1" | "2" | "3"));
        let result = transition(&SessionStep::Menu, &test_context(), Event::user_turn(text)).unwrap();
        prop_assert_eq!(&result.new_state, &SessionStep::Menu);
        prop_assert_eq!(result.effects.len(), 1);
        let is_invalid_reply =
            matches!(&result.effects[0], Effect::Reply { text } if text == INVALID_OPTION);
        prop_assert!(is_invalid_reply);
    }

    /// Repeated invalid input is idempotent
    #[test]
    fn prop_repeated_invalid_input_is_idempotent(inputs in proptest::collection::vec("[a-z]{1,6}", 1..10)) {
        let mut state = SessionStep::Menu;
        for input in inputs {
            let (next, _) = settle(&state, Event::user_turn(input), Outcome::Success);
            state = next;
            prop_assert_eq!(&state, &SessionStep::Menu);
        }
    }

    /// Settings never move the step
    #[test]
    fn prop_settings_never_change_step(
        step in arb_step(),
        name in "[a-zA-Z ]{0,12}",
        personality in arb_personality(),
        service in arb_service(),
    ) {
        let event = Event::SettingsUpdated {
            companion_name: name,
            personality,
            active_service: service,
        };
        let result = transition(&step, &test_context(), event).unwrap();
        prop_assert_eq!(result.new_state, step);
    }

    /// A successful collaborator call always lands back on the menu
    #[test]
    fn prop_completed_interactions_return_to_menu(step in arb_step(), text in "[a-z]{1,12}") {
        prop_assume!(!matches!(step, SessionStep::Menu | SessionStep::JournalAwaitingMood | SessionStep::Summary));
        let (state, _) = settle(&step, Event::user_turn(text), Outcome::Success);
        prop_assert_eq!(state, SessionStep::Menu);
    }

    /// A pending mood exists exactly while awaiting the entry
    #[test]
    fn prop_pending_mood_tracks_step(
        turns in proptest::collection::vec((arb_user_turn(), arb_outcome()), 1..12),
    ) {
        let mut state = SessionStep::Menu;
        for (event, outcome) in turns {
            let (next, _) = settle(&state, event, outcome);
            state = next;
            let awaiting_entry = matches!(state, SessionStep::JournalAwaitingEntry { .. });
            prop_assert_eq!(state.pending_mood().is_some(), awaiting_entry);
            if let Some(mood) = state.pending_mood() {
                prop_assert!(!mood.trim().is_empty());
            }
        }
    }
}
