//! Patient admission records.
//!
//! A [`PatientRecord`] is created once by an admission and afterwards only its status
//! changes. [`NewAdmission`] is the validated form of the operator's admission input, and
//! [`PatientFilter`] is the optional search applied when listing records.

use crate::validation::{parse_age, required_text};
use crate::PatientResult;
use chrono::{DateTime, Utc};
use hms_types::{Gender, NonEmptyText, PatientStatus};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Store-assigned identifier of a patient record. Never reused once issued.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PatientId(i64);

impl PatientId {
    pub fn new(raw: i64) -> Self {
        Self(raw)
    }

    pub fn get(self) -> i64 {
        self.0
    }
}

impl fmt::Display for PatientId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl FromStr for PatientId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse::<i64>().map(PatientId)
    }
}

/// A persisted admission record.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatientRecord {
    pub id: PatientId,
    pub name: NonEmptyText,
    pub age: u32,
    pub gender: Gender,
    pub condition: NonEmptyText,
    pub admitted_at: DateTime<Utc>,
    pub status: PatientStatus,
}

/// Validated input for admitting a patient.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NewAdmission {
    pub name: NonEmptyText,
    pub age: u32,
    pub gender: Gender,
    pub condition: NonEmptyText,
}

impl NewAdmission {
    /// Validates raw admission form input.
    ///
    /// # Errors
    ///
    /// Returns a validation-family [`PatientError`](crate::PatientError) if:
    /// - `name` or `condition` is empty after trimming,
    /// - `age` is not a non-negative whole number,
    /// - `gender` is not one of `M`, `F`, `O`.
    pub fn parse(name: &str, age: &str, gender: &str, condition: &str) -> PatientResult<Self> {
        Ok(Self {
            name: required_text("name", name)?,
            age: parse_age(age)?,
            gender: gender.parse()?,
            condition: required_text("condition", condition)?,
        })
    }
}

/// Substring search over patient names and ids.
///
/// Names match case-insensitively (ASCII letters only, as folded by SQLite). Ids match when
/// their decimal text contains the query. The query is matched literally, so `%` and `_`
/// carry no wildcard meaning.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PatientFilter(NonEmptyText);

impl PatientFilter {
    /// Builds a filter from search box text. Blank text means "no filter" and yields `None`.
    pub fn new(query: impl AsRef<str>) -> Option<Self> {
        NonEmptyText::new(query).ok().map(Self)
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    /// Applies the same matching rule the store uses, for records already in memory.
    pub fn matches(&self, record: &PatientRecord) -> bool {
        let query = self.0.as_str();
        record
            .name
            .as_str()
            .to_ascii_lowercase()
            .contains(&query.to_ascii_lowercase())
            || record.id.to_string().contains(query)
    }
}
