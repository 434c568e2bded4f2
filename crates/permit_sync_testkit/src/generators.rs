//! Property-based test generators using proptest.
//!
//! Provides strategies for valid permits, unique permit lists and values
//! the validation gate must reject.

use permit_sync_protocol::{Permit, PermitStatus, REQUIRED_PERMIT_FIELDS};
use proptest::prelude::*;
use serde_json::{json, Value};
use std::collections::HashSet;

/// Strategy for generating a permit status.
pub fn permit_status_strategy() -> impl Strategy<Value = PermitStatus> {
    prop::sample::select(PermitStatus::ALL.to_vec())
}

/// Strategy for generating non-blank text.
pub fn text_strategy() -> impl Strategy<Value = String> {
    prop::string::string_regex("[A-Za-z0-9][A-Za-z0-9 .-]{0,23}").expect("Invalid regex")
}

/// Strategy for generating empty or whitespace-only strings.
pub fn blank_strategy() -> impl Strategy<Value = String> {
    prop::string::string_regex("[ \t\n]{0,4}").expect("Invalid regex")
}

/// Strategy for generating valid permits.
pub fn permit_strategy() -> impl Strategy<Value = Permit> {
    (
        prop::string::string_regex("[a-z0-9]{1,12}").expect("Invalid regex"),
        text_strategy(),
        text_strategy(),
        text_strategy(),
        permit_status_strategy(),
    )
        .prop_map(|(id, name, applicant, kind, status)| {
            Permit::with_id(id, name, applicant, kind, status)
        })
}

/// Strategy for generating permit lists with unique ids.
pub fn permit_list_strategy(max_len: usize) -> impl Strategy<Value = Vec<Permit>> {
    prop::collection::vec(permit_strategy(), 0..=max_len).prop_map(|permits| {
        let mut seen = HashSet::new();
        permits
            .into_iter()
            .filter(|p| seen.insert(p.id.clone()))
            .collect()
    })
}

/// Strategy for generating values that are not valid permits.
pub fn invalid_permit_strategy() -> impl Strategy<Value = Value> {
    let broken_field = (
        permit_strategy(),
        prop::sample::select(REQUIRED_PERMIT_FIELDS.to_vec()),
        prop_oneof![
            blank_strategy().prop_map(Value::String),
            any::<i64>().prop_map(|n| json!(n)),
            Just(Value::Null),
            Just(json!([])),
        ],
        any::<bool>(),
    )
        .prop_map(|(permit, field, replacement, remove)| {
            let mut value = json!(permit);
            if let Some(record) = value.as_object_mut() {
                if remove {
                    record.remove(field);
                } else {
                    record.insert(field.to_string(), replacement);
                }
            }
            value
        });

    prop_oneof![
        broken_field,
        Just(json!({"invalid": "data"})),
        any::<i64>().prop_map(|n| json!(n)),
        text_strategy().prop_map(Value::String),
        Just(Value::Null),
    ]
}

/// Strategy for a payload of valid permits with invalid values spliced in.
///
/// Yields the payload and the valid permits in payload order.
pub fn mixed_payload_strategy(
    max_valid: usize,
    max_invalid: usize,
) -> impl Strategy<Value = (Value, Vec<Permit>)> {
    (
        permit_list_strategy(max_valid),
        prop::collection::vec((invalid_permit_strategy(), any::<prop::sample::Index>()), 0..=max_invalid),
    )
        .prop_map(|(valid, invalid)| {
            let mut items: Vec<Value> = valid.iter().map(|p| json!(p)).collect();
            for (value, index) in invalid {
                let at = index.index(items.len() + 1);
                items.insert(at, value);
            }
            (Value::Array(items), valid)
        })
}
