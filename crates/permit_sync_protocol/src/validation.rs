//! Validation gate.
//!
//! Pure checks deciding whether caller-supplied or server-returned data is
//! structurally trustworthy. Nothing in this module performs I/O or mutates
//! shared state; the only side effect is audit logging of dropped entries.
//!
//! Routine checks return a discriminated [`Result`] ([`check_permit`]);
//! the `assert_*` helpers map a failed check onto a [`ValidationError`] for
//! the call paths that must abort (invalid caller input, malformed responses).

use crate::error::{ValidationError, ValidationResult};
use crate::permit::{Permit, PermitStatus};
use serde_json::Value;
use std::fmt;
use tracing::{debug, error, warn};

/// Wire names of the fields every permit must carry as non-blank strings.
pub const REQUIRED_PERMIT_FIELDS: [&str; 5] =
    ["id", "permitName", "applicantName", "permitType", "status"];

/// Why a candidate value is not a valid permit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldIssue {
    /// The candidate is not a JSON object.
    NotAnObject,
    /// A required field is absent.
    Missing(&'static str),
    /// A required field is present but not a string.
    NotAString(&'static str),
    /// A required field is empty or whitespace only.
    Blank(&'static str),
    /// The status is not one of the known values.
    UnknownStatus,
}

impl fmt::Display for FieldIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldIssue::NotAnObject => write!(f, "not an object"),
            FieldIssue::Missing(field) => write!(f, "missing field `{field}`"),
            FieldIssue::NotAString(field) => write!(f, "field `{field}` is not a string"),
            FieldIssue::Blank(field) => write!(f, "field `{field}` is blank"),
            FieldIssue::UnknownStatus => write!(f, "unknown status"),
        }
    }
}

/// Checks a candidate value and returns the typed permit it describes.
pub fn check_permit(candidate: &Value) -> Result<Permit, FieldIssue> {
    let record = candidate.as_object().ok_or(FieldIssue::NotAnObject)?;

    let mut values = [""; REQUIRED_PERMIT_FIELDS.len()];
    for (slot, field) in values.iter_mut().zip(REQUIRED_PERMIT_FIELDS) {
        *slot = match record.get(field) {
            None => return Err(FieldIssue::Missing(field)),
            Some(Value::String(s)) if s.trim().is_empty() => {
                return Err(FieldIssue::Blank(field))
            }
            Some(Value::String(s)) => s.as_str(),
            Some(_) => return Err(FieldIssue::NotAString(field)),
        };
    }

    let [id, permit_name, applicant_name, permit_type, status] = values;
    let status = status
        .parse::<PermitStatus>()
        .map_err(|()| FieldIssue::UnknownStatus)?;

    Ok(Permit::with_id(
        id,
        permit_name,
        applicant_name,
        permit_type,
        status,
    ))
}

/// Returns true if the candidate is a structurally valid permit.
pub fn is_valid_permit(candidate: &Value) -> bool {
    check_permit(candidate).is_ok()
}

/// Returns true if the identifier is non-empty after trimming.
pub fn is_valid_id(id: &str) -> bool {
    !id.trim().is_empty()
}

/// Gate for outgoing create/update calls.
///
/// Must be called before any network request is issued.
pub fn assert_valid_input(permit: &Permit) -> ValidationResult<()> {
    match permit.blank_field() {
        Some(field) => {
            debug!(field, "rejected permit input");
            Err(ValidationError::InvalidInput)
        }
        None => Ok(()),
    }
}

/// Gate for the single permit returned by a create or update call.
pub fn assert_valid_single_response(candidate: &Value) -> ValidationResult<Permit> {
    check_permit(candidate).map_err(|issue| {
        error!(%issue, "single permit validation failed");
        ValidationError::InvalidResponse
    })
}

/// Outcome of filtering a collection payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilteredPermits {
    /// Valid permits, in their original relative order.
    pub permits: Vec<Permit>,
    /// Positions of the entries that were dropped.
    pub dropped: Vec<usize>,
    /// Number of entries in the payload.
    pub total: usize,
}

impl FilteredPermits {
    /// Number of dropped entries.
    pub fn dropped_count(&self) -> usize {
        self.dropped.len()
    }

    /// Returns true if every entry was kept.
    pub fn is_clean(&self) -> bool {
        self.dropped.is_empty()
    }
}

/// Filters a collection payload down to its valid permits.
///
/// Fails only when the root is not an array. Individual bad entries are
/// dropped and logged by position; their contents are never logged.
pub fn filter_valid_permits(payload: &Value) -> ValidationResult<FilteredPermits> {
    let Some(items) = payload.as_array() else {
        error!("invalid permit data filtered out: response is not an array");
        return Err(ValidationError::MalformedEnvelope);
    };

    let mut permits = Vec::with_capacity(items.len());
    let mut dropped = Vec::new();

    for (index, item) in items.iter().enumerate() {
        match check_permit(item) {
            Ok(permit) => permits.push(permit),
            Err(issue) => {
                warn!(index, %issue, "invalid permit data filtered out");
                dropped.push(index);
            }
        }
    }

    if !dropped.is_empty() {
        warn!(
            dropped = dropped.len(),
            total = items.len(),
            "data validation: invalid permits filtered out"
        );
    }

    Ok(FilteredPermits {
        permits,
        dropped,
        total: items.len(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use serde_json::json;

    fn valid() -> Value {
        json!({
            "id": "7f1d",
            "permitName": "Create New Substation",
            "applicantName": "North Bethesda Metro",
            "permitType": "Electrical",
            "status": "SUBMITTED"
        })
    }

    #[test]
    fn accepts_complete_permit() {
        let permit = check_permit(&valid()).unwrap();
        assert_eq!(permit.id, "7f1d");
        assert_eq!(permit.status, PermitStatus::Submitted);
        assert!(is_valid_permit(&valid()));
    }

    #[test]
    fn ignores_extra_fields() {
        let mut value = valid();
        value["notes"] = json!(42);
        assert!(is_valid_permit(&value));
    }

    #[test]
    fn rejects_non_objects() {
        for candidate in [json!(null), json!("permit"), json!(3), json!([valid()])] {
            assert_eq!(check_permit(&candidate), Err(FieldIssue::NotAnObject));
        }
    }

    #[test]
    fn reports_each_field_problem() {
        let mut value = valid();
        value.as_object_mut().unwrap().remove("permitType");
        assert_eq!(check_permit(&value), Err(FieldIssue::Missing("permitType")));

        let mut value = valid();
        value["applicantName"] = json!(12);
        assert_eq!(
            check_permit(&value),
            Err(FieldIssue::NotAString("applicantName"))
        );

        let mut value = valid();
        value["permitName"] = json!(" \t\n");
        assert_eq!(check_permit(&value), Err(FieldIssue::Blank("permitName")));

        let mut value = valid();
        value["status"] = json!("ARCHIVED");
        assert_eq!(check_permit(&value), Err(FieldIssue::UnknownStatus));
    }

    #[test]
    fn input_gate() {
        let good = Permit::with_id("1", "A", "Alice", "Zoning", PermitStatus::Approved);
        assert!(assert_valid_input(&good).is_ok());

        let mut bad = good.clone();
        bad.permit_type = " ".into();
        assert_eq!(assert_valid_input(&bad), Err(ValidationError::InvalidInput));
    }

    #[test]
    fn id_gate() {
        assert!(is_valid_id("abc"));
        assert!(!is_valid_id(""));
        assert!(!is_valid_id("   "));
    }

    #[test]
    fn single_response_gate() {
        assert!(assert_valid_single_response(&valid()).is_ok());
        assert_eq!(
            assert_valid_single_response(&json!({"incomplete": "response"})),
            Err(ValidationError::InvalidResponse)
        );
    }

    #[test]
    fn filter_rejects_non_array_root() {
        assert_eq!(
            filter_valid_permits(&json!({"permits": []})),
            Err(ValidationError::MalformedEnvelope)
        );
        assert_eq!(
            filter_valid_permits(&Value::Null),
            Err(ValidationError::MalformedEnvelope)
        );
    }

    #[test]
    fn filter_keeps_order_and_records_positions() {
        let mut second = valid();
        second["id"] = json!("second");
        let payload = json!([valid(), {"invalid": "data"}, second, null]);

        let filtered = filter_valid_permits(&payload).unwrap();
        assert_eq!(filtered.total, 4);
        assert_eq!(filtered.dropped, vec![1, 3]);
        let ids: Vec<_> = filtered.permits.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["7f1d", "second"]);
        assert!(!filtered.is_clean());
    }

    #[test]
    fn filter_empty_array() {
        let filtered = filter_valid_permits(&json!([])).unwrap();
        assert!(filtered.permits.is_empty());
        assert!(filtered.is_clean());
    }

    proptest! {
        #[test]
        fn blanking_any_required_field_invalidates(
            field in prop::sample::select(REQUIRED_PERMIT_FIELDS.to_vec()),
            blank in "[ \t\n]{0,4}",
        ) {
            let mut value = valid();
            value[field] = json!(blank);
            prop_assert!(!is_valid_permit(&value));
        }
    }
}
