//! Core runtime configuration.
//!
//! Configuration is resolved once at process startup and then passed into the registry.
//! Nothing in the core reads environment variables; the helpers below take the raw values
//! the binary looked up so they can be tested without touching the process environment.

use crate::billing::{BillingParams, FeeSchedule};
use crate::constants::DEFAULT_DB_FILENAME;
use crate::validation::{ensure_non_negative, parse_amount};
use crate::{PatientError, PatientResult};
use rust_decimal::Decimal;
use std::path::{Path, PathBuf};

/// Core configuration resolved at startup.
#[derive(Clone, Debug)]
pub struct CoreConfig {
    db_path: PathBuf,
    fee_schedule: FeeSchedule,
}

impl CoreConfig {
    /// Create a new `CoreConfig`.
    ///
    /// # Errors
    ///
    /// Returns [`PatientError::InvalidInput`] if `db_path` is empty or any fee in the
    /// schedule is negative.
    pub fn new(db_path: PathBuf, fee_schedule: FeeSchedule) -> PatientResult<Self> {
        if db_path.as_os_str().is_empty() {
            return Err(PatientError::InvalidInput(
                "database path cannot be empty".into(),
            ));
        }
        ensure_non_negative("room rate", fee_schedule.room_rate_per_day)?;
        ensure_non_negative("doctor fee", fee_schedule.doctor_fee)?;
        ensure_non_negative("medical/lab cost", fee_schedule.misc_cost)?;

        Ok(Self {
            db_path,
            fee_schedule,
        })
    }

    pub fn db_path(&self) -> &Path {
        &self.db_path
    }

    pub fn fee_schedule(&self) -> &FeeSchedule {
        &self.fee_schedule
    }

    /// Billing parameters pre-filled from the configured fee schedule.
    pub fn default_billing_params(&self) -> BillingParams {
        BillingParams::from_schedule(&self.fee_schedule)
    }
}

/// Resolve the database path from an optional configured value.
///
/// If `value` is `None` or blank, returns [`DEFAULT_DB_FILENAME`] relative to the working
/// directory.
pub fn db_path_from_env_value(value: Option<String>) -> PathBuf {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_DB_FILENAME))
}

/// Parse one configured fee, falling back to `default` when unset or blank.
///
/// # Errors
///
/// Returns [`PatientError::InvalidInput`] naming `field` if the value is set but is not a
/// non-negative decimal.
pub fn fee_from_env_value(
    field: &'static str,
    value: Option<String>,
    default: Decimal,
) -> PatientResult<Decimal> {
    let value = value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty());
    let parsed = value.map(|v| parse_amount(field, &v)).transpose()?;

    Ok(parsed.unwrap_or(default))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_db_path_defaults_when_unset_or_blank() {
        assert_eq!(db_path_from_env_value(None), PathBuf::from("hms.db"));
        assert_eq!(
            db_path_from_env_value(Some("   ".into())),
            PathBuf::from("hms.db")
        );
        assert_eq!(
            db_path_from_env_value(Some(" /var/lib/hms/ward.db ".into())),
            PathBuf::from("/var/lib/hms/ward.db")
        );
    }

    #[test]
    fn test_fee_from_env_value_falls_back_to_default() {
        let fee = fee_from_env_value("room rate", None, dec!(2500)).unwrap();
        assert_eq!(fee, dec!(2500));
        let fee = fee_from_env_value("room rate", Some(String::new()), dec!(2500)).unwrap();
        assert_eq!(fee, dec!(2500));
    }

    #[test]
    fn test_fee_from_env_value_parses_override() {
        let fee = fee_from_env_value("room rate", Some("3100.75".into()), dec!(2500)).unwrap();
        assert_eq!(fee, dec!(3100.75));
    }

    #[test]
    fn test_fee_from_env_value_rejects_garbage() {
        let err = fee_from_env_value("doctor fee", Some("lots".into()), dec!(2000))
            .expect_err("non-numeric fee should fail");
        assert!(err.to_string().contains("doctor fee"));
    }

    #[test]
    fn test_new_rejects_empty_path_and_negative_fees() {
        assert!(CoreConfig::new(PathBuf::new(), FeeSchedule::default()).is_err());

        let schedule = FeeSchedule {
            doctor_fee: dec!(-1),
            ..FeeSchedule::default()
        };
        assert!(CoreConfig::new(PathBuf::from("hms.db"), schedule).is_err());
    }

    #[test]
    fn test_default_billing_params_follow_schedule() {
        let schedule = FeeSchedule {
            room_rate_per_day: dec!(1800),
            ..FeeSchedule::default()
        };
        let cfg = CoreConfig::new(PathBuf::from("hms.db"), schedule).unwrap();
        let params = cfg.default_billing_params();
        assert_eq!(params.room_rate_per_day, dec!(1800));
        assert_eq!(params.doctor_fee, dec!(2000));
        assert_eq!(params.days_stayed, None);
    }
}
