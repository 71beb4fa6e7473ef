//! Shared vocabulary types for the HMS admission registry.
//!
//! These types carry their own validation so that the core crate and the operator
//! front-end agree on what a valid name, gender or status looks like.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Errors that can occur when creating validated text types.
#[derive(Debug, thiserror::Error)]
pub enum TextError {
    /// The input text was empty or contained only whitespace
    #[error("Text cannot be empty")]
    Empty,
}

/// A string type that guarantees non-empty content.
///
/// The input is trimmed of leading and trailing whitespace during construction, so the
/// stored value never starts or ends with whitespace.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NonEmptyText(String);

impl NonEmptyText {
    /// Creates a new `NonEmptyText` from the given input.
    ///
    /// # Errors
    ///
    /// Returns [`TextError::Empty`] if the trimmed input is empty.
    pub fn new(input: impl AsRef<str>) -> Result<Self, TextError> {
        let trimmed = input.as_ref().trim();
        if trimmed.is_empty() {
            return Err(TextError::Empty);
        }
        Ok(Self(trimmed.to_owned()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for NonEmptyText {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(&self.0)
    }
}

impl AsRef<str> for NonEmptyText {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Serialize for NonEmptyText {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for NonEmptyText {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        NonEmptyText::new(&s).map_err(serde::de::Error::custom)
    }
}

/// Returned when text does not name a known enumeration value.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown {kind} '{value}', expected one of: {expected}")]
pub struct UnknownVariant {
    pub kind: &'static str,
    pub value: String,
    pub expected: &'static str,
}

// ============================================================================
// GENDER
// ============================================================================

/// Recorded gender of a patient.
///
/// Stored and displayed as a single upper-case letter.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Gender {
    #[serde(rename = "M")]
    Male,
    #[serde(rename = "F")]
    Female,
    #[serde(rename = "O")]
    Other,
}

impl Gender {
    pub const ALL: [Gender; 3] = [Gender::Male, Gender::Female, Gender::Other];

    pub fn as_str(self) -> &'static str {
        match self {
            Gender::Male => "M",
            Gender::Female => "F",
            Gender::Other => "O",
        }
    }
}

impl fmt::Display for Gender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for Gender {
    type Err = UnknownVariant;

    /// Accepts `M`, `F` or `O` in either case.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "M" | "m" => Ok(Gender::Male),
            "F" | "f" => Ok(Gender::Female),
            "O" | "o" => Ok(Gender::Other),
            other => Err(UnknownVariant {
                kind: "gender",
                value: other.to_owned(),
                expected: "M, F, O",
            }),
        }
    }
}

// ============================================================================
// PATIENT STATUS
// ============================================================================

/// Lifecycle status of an admission record.
///
/// Every record starts as [`PatientStatus::Admitted`]. The three open states may be
/// reached from one another freely; [`PatientStatus::Discharged`] is terminal.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PatientStatus {
    Admitted,
    Stable,
    Critical,
    Discharged,
}

impl PatientStatus {
    pub const ALL: [PatientStatus; 4] = [
        PatientStatus::Admitted,
        PatientStatus::Stable,
        PatientStatus::Critical,
        PatientStatus::Discharged,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            PatientStatus::Admitted => "Admitted",
            PatientStatus::Stable => "Stable",
            PatientStatus::Critical => "Critical",
            PatientStatus::Discharged => "Discharged",
        }
    }

    /// Whether no further status change is allowed on a record in this state.
    pub fn is_terminal(self) -> bool {
        matches!(self, PatientStatus::Discharged)
    }
}

impl fmt::Display for PatientStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for PatientStatus {
    type Err = UnknownVariant;

    /// Case-insensitive match on the status name.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        PatientStatus::ALL
            .into_iter()
            .find(|status| status.as_str().eq_ignore_ascii_case(trimmed))
            .ok_or_else(|| UnknownVariant {
                kind: "status",
                value: trimmed.to_owned(),
                expected: "Admitted, Stable, Critical, Discharged",
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_non_empty_text_trims_input() {
        let text = NonEmptyText::new("  Jane Doe \n").expect("should accept padded text");
        assert_eq!(text.as_str(), "Jane Doe");
    }

    #[test]
    fn test_non_empty_text_rejects_whitespace() {
        let err = NonEmptyText::new(" \t ").expect_err("whitespace-only text should fail");
        assert!(matches!(err, TextError::Empty));
    }

    #[test]
    fn test_non_empty_text_deserialize_rejects_empty() {
        let result = serde_json::from_str::<NonEmptyText>("\"\"");
        assert!(result.is_err(), "empty JSON string should not deserialize");
    }

    #[test]
    fn test_gender_parses_either_case() {
        assert_eq!("m".parse::<Gender>().unwrap(), Gender::Male);
        assert_eq!("F".parse::<Gender>().unwrap(), Gender::Female);
        assert_eq!(" o ".parse::<Gender>().unwrap(), Gender::Other);
    }

    #[test]
    fn test_gender_rejects_unknown_letter() {
        let err = "X".parse::<Gender>().expect_err("X is not a known gender");
        assert_eq!(err.kind, "gender");
        assert_eq!(err.value, "X");
    }

    #[test]
    fn test_gender_serializes_as_letter() {
        let json = serde_json::to_string(&Gender::Female).unwrap();
        assert_eq!(json, "\"F\"");
    }

    #[test]
    fn test_status_parse_is_case_insensitive() {
        assert_eq!(
            "critical".parse::<PatientStatus>().unwrap(),
            PatientStatus::Critical
        );
        assert_eq!(
            "DISCHARGED".parse::<PatientStatus>().unwrap(),
            PatientStatus::Discharged
        );
    }

    #[test]
    fn test_status_display_round_trips_through_from_str() {
        for status in PatientStatus::ALL {
            let parsed: PatientStatus = status.to_string().parse().unwrap();
            assert_eq!(parsed, status);
        }
    }

    #[test]
    fn test_only_discharged_is_terminal() {
        let terminal: Vec<_> = PatientStatus::ALL
            .into_iter()
            .filter(|s| s.is_terminal())
            .collect();
        assert_eq!(terminal, vec![PatientStatus::Discharged]);
    }
}
