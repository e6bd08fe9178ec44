// SPDX-FileCopyrightText: 2026 Vestibule Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The conversation state machine.
//!
//! Each step owns a requirement check and a next-step rule, so the one
//! conditional transition (skipping `SCHEDULING`) is a first-class rule
//! rather than a special case in an index increment. State only moves
//! forward; the sole non-adjacent transition is the explicit end action,
//! which the caller performs by writing `SUBMIT` directly.

use crate::error::VestibuleError;
use crate::fields::{self, keys};
use crate::types::{ConversationState, FieldBag};

/// A node of the transition graph: requirement check plus next-step rule.
struct StepRule {
    state: ConversationState,
    /// Returns the missing or invalid field names for this step.
    requirements: fn(&FieldBag) -> Vec<String>,
    /// Computes the successor given the submitted fields.
    next: fn(&FieldBag) -> ConversationState,
}

fn no_requirements(_: &FieldBag) -> Vec<String> {
    Vec::new()
}

fn present(fields: &FieldBag, key: &str) -> bool {
    fields.get(key).is_some_and(|v| !v.trim().is_empty())
}

fn require_mode(fields: &FieldBag) -> Vec<String> {
    if present(fields, keys::MODE) {
        Vec::new()
    } else {
        vec![keys::MODE.to_string()]
    }
}

fn require_identity(fields: &FieldBag) -> Vec<String> {
    let mut missing = Vec::new();
    if !present(fields, keys::FULL_NAME) {
        missing.push(keys::FULL_NAME.to_string());
    }
    let email_ok = fields
        .get(keys::EMAIL)
        .is_some_and(|v| fields::validate_email(v));
    if !email_ok {
        missing.push(keys::EMAIL.to_string());
    }
    // Phone is optional, but a supplied value must normalize to >= 10 digits.
    if let Some(raw) = fields.get(keys::PHONE) {
        if !fields::phone_is_acceptable(&fields::normalize_phone(raw)) {
            missing.push(keys::PHONE.to_string());
        }
    }
    missing
}

fn require_business_context(fields: &FieldBag) -> Vec<String> {
    if present(fields, keys::BUSINESS_NAME) {
        Vec::new()
    } else {
        vec![keys::BUSINESS_NAME.to_string()]
    }
}

fn require_needs(fields: &FieldBag) -> Vec<String> {
    if present(fields, keys::NEEDS_SUMMARY) {
        Vec::new()
    } else {
        vec![keys::NEEDS_SUMMARY.to_string()]
    }
}

fn require_scheduling(fields: &FieldBag) -> Vec<String> {
    // Satisfied by the external booking link, or by preferred times plus a
    // timezone to interpret them in.
    if fields.get(keys::SCHEDULING_OPTION).map(String::as_str) == Some("link") {
        return Vec::new();
    }
    let mut missing = Vec::new();
    if !present(fields, keys::PREFERRED_TIMES) {
        missing.push(keys::PREFERRED_TIMES.to_string());
    }
    if !present(fields, keys::TIMEZONE) {
        missing.push(keys::TIMEZONE.to_string());
    }
    missing
}

fn require_summary(fields: &FieldBag) -> Vec<String> {
    if present(fields, keys::SUMMARY) {
        Vec::new()
    } else {
        vec![keys::SUMMARY.to_string()]
    }
}

fn next_after_needs(fields: &FieldBag) -> ConversationState {
    if fields.get(keys::SKIP_SCHEDULING).map(String::as_str) == Some("true") {
        ConversationState::Summary
    } else {
        ConversationState::Scheduling
    }
}

const RULES: &[StepRule] = &[
    StepRule {
        state: ConversationState::Welcome,
        requirements: no_requirements,
        next: |_| ConversationState::ModeSelect,
    },
    StepRule {
        state: ConversationState::ModeSelect,
        requirements: require_mode,
        // `mode` branches data downstream, never topology.
        next: |_| ConversationState::Identity,
    },
    StepRule {
        state: ConversationState::Identity,
        requirements: require_identity,
        next: |_| ConversationState::BusinessContext,
    },
    StepRule {
        state: ConversationState::BusinessContext,
        requirements: require_business_context,
        next: |_| ConversationState::Needs,
    },
    StepRule {
        state: ConversationState::Needs,
        requirements: require_needs,
        next: next_after_needs,
    },
    StepRule {
        state: ConversationState::Scheduling,
        requirements: require_scheduling,
        next: |_| ConversationState::Summary,
    },
    StepRule {
        state: ConversationState::Summary,
        requirements: require_summary,
        next: |_| ConversationState::Submit,
    },
    StepRule {
        state: ConversationState::Submit,
        requirements: no_requirements,
        next: |_| ConversationState::Submit,
    },
];

fn rule_for(state: ConversationState) -> &'static StepRule {
    let idx = match state {
        ConversationState::Welcome => 0,
        ConversationState::ModeSelect => 1,
        ConversationState::Identity => 2,
        ConversationState::BusinessContext => 3,
        ConversationState::Needs => 4,
        ConversationState::Scheduling => 5,
        ConversationState::Summary => 6,
        ConversationState::Submit => 7,
    };
    &RULES[idx]
}

/// Validate that `submitted` satisfies the required field set of `state`.
///
/// On failure returns [`VestibuleError::MissingFields`] naming the state and
/// every missing or invalid field.
pub fn validate_required_fields(
    state: ConversationState,
    submitted: &FieldBag,
) -> Result<(), VestibuleError> {
    let missing = (rule_for(state).requirements)(submitted);
    if missing.is_empty() {
        Ok(())
    } else {
        Err(VestibuleError::MissingFields {
            state,
            fields: missing,
        })
    }
}

/// Compute the successor of `state` given the submitted fields, without
/// validating them. `SUBMIT` maps to itself.
pub fn next_state(state: ConversationState, submitted: &FieldBag) -> ConversationState {
    (rule_for(state).next)(submitted)
}

/// Validate and advance in one step: the server-side transition algorithm.
pub fn advance(
    state: ConversationState,
    submitted: &FieldBag,
) -> Result<ConversationState, VestibuleError> {
    validate_required_fields(state, submitted)?;
    Ok(next_state(state, submitted))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bag(entries: &[(&str, &str)]) -> FieldBag {
        entries
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn rule_table_order_matches_states() {
        for rule in RULES {
            assert_eq!(rule_for(rule.state).state, rule.state);
        }
    }

    #[test]
    fn next_state_sequence() {
        assert_eq!(
            next_state(ConversationState::Welcome, &FieldBag::new()),
            ConversationState::ModeSelect
        );
        assert_eq!(
            next_state(ConversationState::ModeSelect, &bag(&[("mode", "prospect")])),
            ConversationState::Identity
        );
        assert_eq!(
            next_state(ConversationState::Needs, &bag(&[("skip_scheduling", "true")])),
            ConversationState::Summary
        );
        assert_eq!(
            next_state(ConversationState::Needs, &bag(&[("skip_scheduling", "false")])),
            ConversationState::Scheduling
        );
        assert_eq!(
            next_state(ConversationState::Summary, &FieldBag::new()),
            ConversationState::Submit
        );
        assert_eq!(
            next_state(ConversationState::Submit, &FieldBag::new()),
            ConversationState::Submit
        );
    }

    #[test]
    fn mode_value_never_branches_topology() {
        // Both modes advance linearly; the value is data for downstream use.
        assert_eq!(
            next_state(ConversationState::ModeSelect, &bag(&[("mode", "client")])),
            ConversationState::Identity
        );
    }

    #[test]
    fn identity_requires_name_and_valid_email() {
        let err = validate_required_fields(
            ConversationState::Identity,
            &bag(&[("full_name", "Jane Doe")]),
        )
        .unwrap_err();
        match err {
            VestibuleError::MissingFields { state, fields } => {
                assert_eq!(state, ConversationState::Identity);
                assert_eq!(fields, vec!["email".to_string()]);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn identity_accepts_empty_phone_but_rejects_short_phone() {
        let ok = bag(&[
            ("full_name", "Jane Doe"),
            ("email", "jane@x.com"),
            ("phone", ""),
        ]);
        validate_required_fields(ConversationState::Identity, &ok).unwrap();

        let short = bag(&[
            ("full_name", "Jane Doe"),
            ("email", "jane@x.com"),
            ("phone", "555-0102"),
        ]);
        let err = validate_required_fields(ConversationState::Identity, &short).unwrap_err();
        match err {
            VestibuleError::MissingFields { fields, .. } => {
                assert_eq!(fields, vec!["phone".to_string()]);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn scheduling_satisfied_by_link_or_times_with_timezone() {
        validate_required_fields(
            ConversationState::Scheduling,
            &bag(&[("scheduling_option", "link")]),
        )
        .unwrap();
        validate_required_fields(
            ConversationState::Scheduling,
            &bag(&[
                ("preferred_times", "tomorrow"),
                ("timezone", "America/Los_Angeles"),
            ]),
        )
        .unwrap();

        let err = validate_required_fields(
            ConversationState::Scheduling,
            &bag(&[("preferred_times", "tomorrow")]),
        )
        .unwrap_err();
        match err {
            VestibuleError::MissingFields { state, fields } => {
                assert_eq!(state, ConversationState::Scheduling);
                assert!(fields.contains(&"timezone".to_string()));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn welcome_advances_on_any_submission() {
        assert_eq!(
            advance(ConversationState::Welcome, &FieldBag::new()).unwrap(),
            ConversationState::ModeSelect
        );
    }

    #[test]
    fn every_non_terminal_step_advances_with_a_complete_field_set() {
        let cases: Vec<(ConversationState, FieldBag, ConversationState)> = vec![
            (
                ConversationState::ModeSelect,
                bag(&[("mode", "prospect")]),
                ConversationState::Identity,
            ),
            (
                ConversationState::Identity,
                bag(&[("full_name", "Jane Doe"), ("email", "jane@x.com")]),
                ConversationState::BusinessContext,
            ),
            (
                ConversationState::BusinessContext,
                bag(&[("business_name", "Acme")]),
                ConversationState::Needs,
            ),
            (
                ConversationState::Needs,
                bag(&[("needs_summary", "New site")]),
                ConversationState::Scheduling,
            ),
            (
                ConversationState::Scheduling,
                bag(&[("preferred_times", "Tue"), ("timezone", "Europe/London")]),
                ConversationState::Summary,
            ),
            (
                ConversationState::Summary,
                bag(&[("summary", "Done")]),
                ConversationState::Submit,
            ),
        ];
        for (state, fields, expected) in cases {
            assert_eq!(advance(state, &fields).unwrap(), expected, "from {state}");
        }
    }

    #[test]
    fn whitespace_only_values_do_not_satisfy_requirements() {
        let err = validate_required_fields(
            ConversationState::Needs,
            &bag(&[("needs_summary", "   ")]),
        )
        .unwrap_err();
        assert!(matches!(err, VestibuleError::MissingFields { .. }));
    }
}
