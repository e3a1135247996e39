//! Property-based tests for the transition table.
//!
//! These check invariants across every stage and every kind of input, with
//! no store and no transport involved.

use proptest::prelude::*;

use super::event::{ADMIN_DELETE, ADMIN_UPLOAD, BACK, CANCEL, pick_token};
use super::*;
use crate::subsystems::auth::UserId;
use crate::subsystems::papers::{Level, PaperKey, PaperRecord};

// ============================================================================
// Test Helpers
// ============================================================================

fn ctx(privileged: bool) -> TransitionContext {
    TransitionContext { user: UserId::from("prop-user"), privileged }
}

fn store_requests(result: &TransitionResult) -> usize {
    result.effects.iter().filter(|e| matches!(e, Effect::Store(_))).count()
}

// ============================================================================
// Arbitrary Generators
// ============================================================================

fn arb_level() -> impl Strategy<Value = Level> {
    prop_oneof![Just(Level::Foundation), Just(Level::Diploma), Just(Level::Degree)]
}

fn arb_label() -> impl Strategy<Value = String> {
    "[A-Za-z0-9][A-Za-z0-9 ]{0,15}"
}

fn arb_key() -> impl Strategy<Value = PaperKey> {
    (arb_level(), arb_label(), "[0-9]{4}").prop_map(|(l, s, y)| PaperKey::new(l, s, y))
}

fn arb_labels() -> impl Strategy<Value = Vec<String>> {
    proptest::collection::vec(arb_label(), 0..4)
}

fn arb_state() -> impl Strategy<Value = ConversationState> {
    use ConversationState as S;
    prop_oneof![
        Just(S::BrowseLevel),
        (arb_level(), arb_labels()).prop_map(|(level, subjects)| S::BrowseSubject { level, subjects }),
        (arb_level(), arb_label(), arb_labels())
            .prop_map(|(level, subject, years)| S::BrowseYear { level, subject, years }),
        Just(S::ChooseAction),
        Just(S::UploadLevel),
        arb_level().prop_map(|level| S::UploadSubject { level }),
        (arb_level(), arb_label()).prop_map(|(level, subject)| S::UploadYear { level, subject }),
        arb_key().prop_map(|key| S::UploadDocument { key }),
        Just(S::DeleteLevel),
        (arb_level(), arb_labels()).prop_map(|(level, subjects)| S::DeleteSubject { level, subjects }),
        (arb_level(), arb_label(), arb_labels())
            .prop_map(|(level, subject, years)| S::DeleteYear { level, subject, years }),
    ]
}

fn arb_token() -> impl Strategy<Value = String> {
    prop_oneof![
        Just(BACK.to_string()),
        Just(CANCEL.to_string()),
        Just(ADMIN_UPLOAD.to_string()),
        Just(ADMIN_DELETE.to_string()),
        arb_level().prop_map(|l| l.as_str().to_string()),
        (0usize..5).prop_map(pick_token),
        arb_label(),
    ]
}

fn arb_user_event() -> impl Strategy<Value = Event> {
    prop_oneof![
        Just(Event::Start),
        Just(Event::Admin),
        Just(Event::Cancel),
        Just(Event::Unsupported),
        arb_token().prop_map(Event::Choice),
        arb_label().prop_map(Event::Text),
        (arb_label(), proptest::option::of(arb_label()))
            .prop_map(|(reference, name)| Event::Document { reference, name }),
    ]
}

fn arb_store_event() -> impl Strategy<Value = Event> {
    prop_oneof![
        (arb_level(), arb_labels()).prop_map(|(level, subjects)| Event::SubjectsLoaded { level, subjects }),
        (arb_level(), arb_label(), arb_labels())
            .prop_map(|(level, subject, years)| Event::YearsLoaded { level, subject, years }),
        arb_key().prop_map(|key| Event::PaperLookedUp { key, record: None }),
        arb_key().prop_map(|key| Event::PaperLookedUp {
            record: Some(PaperRecord {
                key: key.clone(),
                document_reference: "ref".into(),
                display_name: None,
                uploaded_by: "admin".into(),
                uploaded_at: "2024-01-01T00:00:00Z".into(),
            }),
            key,
        }),
        Just(Event::PaperStored { result: Err("fault".into()) }),
        (arb_key(), any::<bool>())
            .prop_map(|(key, removed)| Event::PaperDeleted { key, result: Ok(removed) }),
        Just(Event::StoreUnavailable),
    ]
}

fn arb_event() -> impl Strategy<Value = Event> {
    prop_oneof![3 => arb_user_event(), 1 => arb_store_event()]
}

// ============================================================================
// Properties
// ============================================================================

proptest! {
    /// Cancel is defined from every stage, ends the flow and never touches the store.
    #[test]
    fn cancel_always_ends_without_store_effects(state in arb_state(), privileged in any::<bool>()) {
        for event in [Event::Cancel, Event::Choice(CANCEL.to_string())] {
            let result = transition(Some(&state), &ctx(privileged), event).unwrap();
            prop_assert!(result.next.is_none());
            prop_assert_eq!(store_requests(&result), 0);
            prop_assert!(matches!(
                result.effects.as_slice(),
                [Effect::Finish(Outcome::Cancelled | Outcome::AdminClosed)]
            ));
        }
    }

    /// The document stage re-prompts on anything but a document and keeps its selections.
    #[test]
    fn document_stage_rejects_non_documents(key in arb_key(), input in prop_oneof![
        arb_label().prop_map(Event::Text),
        arb_label().prop_map(Event::Choice),
        Just(Event::Unsupported),
    ]) {
        let state = ConversationState::UploadDocument { key };
        let result = transition(Some(&state), &ctx(true), input).unwrap();
        prop_assert_eq!(result.effects, vec![Effect::Prompt(Prompt::DocumentRequired)]);
        let next = result.next.expect("still in the flow");
        prop_assert_eq!(next.selections(), state.selections());
        prop_assert_eq!(next, state);
    }

    /// Without privilege no input sequence ever reaches a store write.
    #[test]
    fn unprivileged_users_never_write(events in proptest::collection::vec(arb_user_event(), 1..20)) {
        let ctx = ctx(false);
        let mut state: Option<ConversationState> = None;
        for event in events {
            if let Ok(result) = transition(state.as_ref(), &ctx, event) {
                prop_assert!(!result.effects.iter().any(Effect::is_store_write));
                state = result.next;
            }
            prop_assert!(!matches!(
                state.as_ref().and_then(ConversationState::flow),
                Some(Flow::AdminUpload | Flow::AdminDelete)
            ));
            prop_assert_ne!(state.as_ref(), Some(&ConversationState::ChooseAction));
        }
    }

    /// Every transition asks the store at most once, and rejected inputs name the stage.
    #[test]
    fn at_most_one_store_request(state in proptest::option::of(arb_state()), event in arb_event()) {
        match transition(state.as_ref(), &ctx(true), event) {
            Ok(result) => prop_assert!(store_requests(&result) <= 1),
            Err(TransitionError::NoActiveFlow { .. }) => prop_assert!(state.is_none()),
            Err(TransitionError::UnexpectedInput { stage, .. } | TransitionError::UnknownChoice { stage, .. }) => {
                prop_assert_eq!(Some(stage), state.as_ref().map(ConversationState::stage_name));
            }
        }
    }

    /// Going back from year selection reloads subjects for the level already chosen.
    #[test]
    fn back_from_year_keeps_level(level in arb_level(), subject in arb_label(), years in arb_labels()) {
        let state = ConversationState::BrowseYear { level, subject, years };
        let result = transition(Some(&state), &ctx(false), Event::Choice(BACK.to_string())).unwrap();
        prop_assert_eq!(result.effects, vec![Effect::list_subjects(level)]);
    }

    /// A subject choice in either menu flow asks for the years of the subject at that index.
    #[test]
    fn subject_choice_requests_years(
        level in arb_level(),
        (subjects, index) in arb_labels()
            .prop_filter("non-empty", |s| !s.is_empty())
            .prop_flat_map(|s| {
                let n = s.len();
                (Just(s), 0..n)
            }),
    ) {
        for state in [
            ConversationState::BrowseSubject { level, subjects: subjects.clone() },
            ConversationState::DeleteSubject { level, subjects: subjects.clone() },
        ] {
            let result = transition(Some(&state), &ctx(true), Event::Choice(pick_token(index))).unwrap();
            prop_assert_eq!(result.effects, vec![Effect::list_years(level, subjects[index].clone())]);
            prop_assert_eq!(result.next, Some(state));
        }
    }

    /// Any listed year is reachable by its index, even one spelled like a navigation token.
    #[test]
    fn listed_years_are_picked_by_index(
        key in arb_key(),
        extra in prop_oneof![Just(BACK.to_string()), Just(CANCEL.to_string()), arb_label()],
    ) {
        let years = vec![extra.clone(), key.year.clone()];
        let state = ConversationState::BrowseYear { level: key.level, subject: key.subject.clone(), years };
        for (index, year) in [(0, extra), (1, key.year.clone())] {
            let result = transition(Some(&state), &ctx(false), Event::Choice(pick_token(index))).unwrap();
            let expected = PaperKey::new(key.level, key.subject.clone(), year);
            prop_assert_eq!(result.effects, vec![Effect::Store(StoreRequest::FindPaper { key: expected })]);
        }
    }
}
