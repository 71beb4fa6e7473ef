//! Discharge billing.
//!
//! An [`Invoice`] is derived from a stay length and a handful of fees at discharge time.
//! It is never stored: the registry computes it inside the discharge transaction and hands
//! it back to the caller for display.
//!
//! ## Line items
//!
//! Every invoice has exactly three lines, in this order:
//!
//! ```text
//! Room Charges (<days> days)   days × room rate
//! Doctor Fees                  doctor fee
//! Medical/Lab                  medicine and lab cost
//! ```
//!
//! Amounts are exact decimals. Rounding to two places happens only in [`format_amount`].

use crate::constants::{
    CURRENCY_SYMBOL, DEFAULT_DOCTOR_FEE, DEFAULT_MISC_COST, DEFAULT_ROOM_RATE_PER_DAY,
};
use crate::patient::PatientRecord;
use crate::validation::{ensure_days_stayed, ensure_non_negative, parse_amount, parse_days_stayed};
use crate::{PatientError, PatientResult};
use chrono::{DateTime, Utc};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::fmt::Write as _;

const RULE: &str = "------------------------------------------------";

/// Fees pre-filled into the discharge form before the operator adjusts them.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FeeSchedule {
    pub room_rate_per_day: Decimal,
    pub doctor_fee: Decimal,
    pub misc_cost: Decimal,
}

impl Default for FeeSchedule {
    fn default() -> Self {
        Self {
            room_rate_per_day: Decimal::from(DEFAULT_ROOM_RATE_PER_DAY),
            doctor_fee: Decimal::from(DEFAULT_DOCTOR_FEE),
            misc_cost: Decimal::from(DEFAULT_MISC_COST),
        }
    }
}

/// Operator-confirmed billing inputs for one discharge.
///
/// `days_stayed` of `None` means "use the elapsed stay", see
/// [`InvoiceCalculator::default_days_stayed`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BillingParams {
    pub days_stayed: Option<u32>,
    pub room_rate_per_day: Decimal,
    pub doctor_fee: Decimal,
    pub misc_cost: Decimal,
}

impl BillingParams {
    /// Parameters pre-filled from a fee schedule, with the stay length left to default.
    pub fn from_schedule(schedule: &FeeSchedule) -> Self {
        Self {
            days_stayed: None,
            room_rate_per_day: schedule.room_rate_per_day,
            doctor_fee: schedule.doctor_fee,
            misc_cost: schedule.misc_cost,
        }
    }

    /// Parses billing form text.
    ///
    /// # Errors
    ///
    /// Returns [`PatientError::InvalidInput`] if `days` is present but not a whole number of
    /// at least one, or any amount is not a non-negative decimal.
    pub fn parse(
        days: Option<&str>,
        room_rate_per_day: &str,
        doctor_fee: &str,
        misc_cost: &str,
    ) -> PatientResult<Self> {
        Ok(Self {
            days_stayed: days.map(parse_days_stayed).transpose()?,
            room_rate_per_day: parse_amount("room rate", room_rate_per_day)?,
            doctor_fee: parse_amount("doctor fee", doctor_fee)?,
            misc_cost: parse_amount("medical/lab cost", misc_cost)?,
        })
    }

    pub fn with_days_stayed(mut self, days: u32) -> Self {
        self.days_stayed = Some(days);
        self
    }

    fn validate(&self) -> PatientResult<()> {
        if let Some(days) = self.days_stayed {
            ensure_days_stayed(days)?;
        }
        ensure_non_negative("room rate", self.room_rate_per_day)?;
        ensure_non_negative("doctor fee", self.doctor_fee)?;
        ensure_non_negative("medical/lab cost", self.misc_cost)?;
        Ok(())
    }
}

/// One priced line of an invoice.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItem {
    pub description: String,
    pub amount: Decimal,
}

/// Itemised discharge bill.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Invoice {
    pub days_stayed: u32,
    pub line_items: Vec<LineItem>,
    pub grand_total: Decimal,
}

impl Invoice {
    /// Renders the invoice as plain text for the given patient.
    pub fn render(&self, patient: &PatientRecord) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "INVOICE");
        let _ = writeln!(out, "{RULE}");
        let _ = writeln!(out, "Patient: {} (ID: {})", patient.name, patient.id);
        let _ = writeln!(out);
        let _ = writeln!(
            out,
            "{:<30}{:>18}",
            "ITEM DESCRIPTION",
            format!("AMOUNT ({CURRENCY_SYMBOL})")
        );
        for item in &self.line_items {
            let _ = writeln!(
                out,
                "{:<30}{:>18}",
                item.description,
                format_amount(item.amount)
            );
        }
        let _ = writeln!(out, "{RULE}");
        let _ = writeln!(
            out,
            "{:<30}{:>18}",
            "TOTAL DUE:",
            format_amount(self.grand_total)
        );
        out
    }
}

/// Invoice computation.
///
/// Zero-sized namespace for the pure billing functions.
pub struct InvoiceCalculator;

impl InvoiceCalculator {
    /// Whole days between admission and `now`, never less than one.
    ///
    /// Partial days are dropped, so a stay of 2 days and 23 hours bills as 2 days. A
    /// same-day discharge, or an admission stamped in the future, bills as 1 day.
    pub fn default_days_stayed(admitted_at: DateTime<Utc>, now: DateTime<Utc>) -> u32 {
        let elapsed = now.signed_duration_since(admitted_at).num_days();
        u32::try_from(elapsed.max(1)).unwrap_or(u32::MAX)
    }

    /// Computes the invoice for a stay that started at `admitted_at`, as of now.
    pub fn compute(admitted_at: DateTime<Utc>, params: &BillingParams) -> PatientResult<Invoice> {
        Self::compute_at(admitted_at, params, Utc::now())
    }

    /// Computes the invoice as of `now`.
    ///
    /// # Errors
    ///
    /// Returns [`PatientError::InvalidInput`] if the parameters fail validation or the room
    /// charge overflows the decimal range.
    pub fn compute_at(
        admitted_at: DateTime<Utc>,
        params: &BillingParams,
        now: DateTime<Utc>,
    ) -> PatientResult<Invoice> {
        params.validate()?;

        let days_stayed = params
            .days_stayed
            .unwrap_or_else(|| Self::default_days_stayed(admitted_at, now));

        let room_charges = params
            .room_rate_per_day
            .checked_mul(Decimal::from(days_stayed))
            .ok_or_else(|| PatientError::InvalidInput("room charges are too large".into()))?;

        let line_items = vec![
            LineItem {
                description: format!("Room Charges ({days_stayed} days)"),
                amount: room_charges,
            },
            LineItem {
                description: "Doctor Fees".into(),
                amount: params.doctor_fee,
            },
            LineItem {
                description: "Medical/Lab".into(),
                amount: params.misc_cost,
            },
        ];

        let grand_total = line_items
            .iter()
            .try_fold(Decimal::ZERO, |acc, item| acc.checked_add(item.amount))
            .ok_or_else(|| PatientError::InvalidInput("invoice total is too large".into()))?;

        Ok(Invoice {
            days_stayed,
            line_items,
            grand_total,
        })
    }
}

/// Formats an amount for display, e.g. `₹ 10,000.00`.
///
/// Rounds half away from zero to two decimal places and groups thousands with commas.
pub fn format_amount(amount: Decimal) -> String {
    let mut rounded = amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    rounded.rescale(2);

    let text = rounded.abs().to_string();
    let (whole, fraction) = text.split_once('.').unwrap_or((text.as_str(), "00"));

    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (i, ch) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    let sign = if rounded.is_sign_negative() && !rounded.is_zero() {
        "-"
    } else {
        ""
    };
    format!("{CURRENCY_SYMBOL} {sign}{grouped}.{fraction}")
}
