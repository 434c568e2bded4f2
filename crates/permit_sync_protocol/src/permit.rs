//! The permit entity.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Lifecycle status of a permit.
///
/// This is a closed enumeration; the wire form is the upper snake case name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PermitStatus {
    /// Application received.
    Submitted,
    /// Waiting for a reviewer.
    Pending,
    /// A reviewer is assessing the application.
    UnderReview,
    /// Permit granted.
    Approved,
    /// Permit refused.
    Rejected,
    /// Permit no longer in force.
    Expired,
}

impl PermitStatus {
    /// Every status, in lifecycle order.
    pub const ALL: [PermitStatus; 6] = [
        PermitStatus::Submitted,
        PermitStatus::Pending,
        PermitStatus::UnderReview,
        PermitStatus::Approved,
        PermitStatus::Rejected,
        PermitStatus::Expired,
    ];

    /// Returns the wire name.
    pub fn as_str(&self) -> &'static str {
        match self {
            PermitStatus::Submitted => "SUBMITTED",
            PermitStatus::Pending => "PENDING",
            PermitStatus::UnderReview => "UNDER_REVIEW",
            PermitStatus::Approved => "APPROVED",
            PermitStatus::Rejected => "REJECTED",
            PermitStatus::Expired => "EXPIRED",
        }
    }

    /// Returns the human readable label.
    pub fn label(&self) -> &'static str {
        match self {
            PermitStatus::Submitted => "Submitted",
            PermitStatus::Pending => "Pending Review",
            PermitStatus::UnderReview => "Under Review",
            PermitStatus::Approved => "Approved",
            PermitStatus::Rejected => "Rejected",
            PermitStatus::Expired => "Expired",
        }
    }
}

impl fmt::Display for PermitStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PermitStatus {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PermitStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or(())
    }
}

/// A permit record of the tracked collection.
///
/// The identifier is globally unique and never changes once assigned.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Permit {
    /// Unique identifier.
    pub id: String,
    /// Display name of the permit.
    pub permit_name: String,
    /// Name of the applicant.
    pub applicant_name: String,
    /// Category, e.g. "Electrical".
    pub permit_type: String,
    /// Current status.
    pub status: PermitStatus,
}

impl Permit {
    /// Creates a permit with a freshly generated identifier.
    pub fn new(
        permit_name: impl Into<String>,
        applicant_name: impl Into<String>,
        permit_type: impl Into<String>,
        status: PermitStatus,
    ) -> Self {
        Self::with_id(
            Uuid::new_v4().to_string(),
            permit_name,
            applicant_name,
            permit_type,
            status,
        )
    }

    /// Creates a permit with the given identifier.
    pub fn with_id(
        id: impl Into<String>,
        permit_name: impl Into<String>,
        applicant_name: impl Into<String>,
        permit_type: impl Into<String>,
        status: PermitStatus,
    ) -> Self {
        Self {
            id: id.into(),
            permit_name: permit_name.into(),
            applicant_name: applicant_name.into(),
            permit_type: permit_type.into(),
            status,
        }
    }

    /// Name shown to users when referring to this permit.
    pub fn display_name(&self) -> &str {
        &self.permit_name
    }

    /// Returns the wire name of the first required field that is blank.
    pub fn blank_field(&self) -> Option<&'static str> {
        [
            ("id", &self.id),
            ("permitName", &self.permit_name),
            ("applicantName", &self.applicant_name),
            ("permitType", &self.permit_type),
        ]
        .into_iter()
        .find(|(_, value)| value.trim().is_empty())
        .map(|(field, _)| field)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_wire_names_round_trip() {
        for status in PermitStatus::ALL {
            assert_eq!(status.as_str().parse::<PermitStatus>(), Ok(status));
        }
        assert!("UNKNOWN".parse::<PermitStatus>().is_err());
        assert!("approved".parse::<PermitStatus>().is_err());
    }

    #[test]
    fn status_labels() {
        assert_eq!(PermitStatus::Pending.label(), "Pending Review");
        assert_eq!(PermitStatus::UnderReview.label(), "Under Review");
    }

    #[test]
    fn new_assigns_unique_ids() {
        let a = Permit::new("A", "Alice", "Electrical", PermitStatus::Submitted);
        let b = Permit::new("A", "Alice", "Electrical", PermitStatus::Submitted);
        assert_ne!(a.id, b.id);
        assert!(Uuid::parse_str(&a.id).is_ok());
    }

    #[test]
    fn serializes_camel_case() {
        let permit = Permit::with_id("1", "Substation", "Metro", "Electrical", PermitStatus::UnderReview);
        let json = serde_json::to_value(&permit).unwrap();
        assert_eq!(json["permitName"], "Substation");
        assert_eq!(json["applicantName"], "Metro");
        assert_eq!(json["permitType"], "Electrical");
        assert_eq!(json["status"], "UNDER_REVIEW");
    }

    #[test]
    fn blank_field_detection() {
        let mut permit = Permit::with_id("1", "Name", "Applicant", "Zoning", PermitStatus::Pending);
        assert_eq!(permit.blank_field(), None);

        permit.applicant_name = "   ".into();
        assert_eq!(permit.blank_field(), Some("applicantName"));

        permit.id = String::new();
        assert_eq!(permit.blank_field(), Some("id"));
    }
}
