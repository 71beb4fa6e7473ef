//! Constants used throughout the HMS core crate.

/// Database file used when no explicit path is configured.
pub const DEFAULT_DB_FILENAME: &str = "hms.db";

/// Default nightly room rate pre-filled at discharge.
pub const DEFAULT_ROOM_RATE_PER_DAY: u32 = 2500;

/// Default fixed doctor fee pre-filled at discharge.
pub const DEFAULT_DOCTOR_FEE: u32 = 2000;

/// Default medicine and lab cost pre-filled at discharge.
pub const DEFAULT_MISC_COST: u32 = 500;

/// Currency symbol printed in front of invoice amounts.
pub const CURRENCY_SYMBOL: &str = "₹";

/// Admission timestamps written by earlier releases (local time, no zone).
pub const LEGACY_TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Date-only admission values written by earlier releases.
pub const LEGACY_DATE_FORMAT: &str = "%Y-%m-%d";

pub(crate) const CREATE_PATIENTS_TABLE: &str = "
    CREATE TABLE IF NOT EXISTS patients (
        patient_id INTEGER PRIMARY KEY AUTOINCREMENT,
        name TEXT NOT NULL,
        age INTEGER NOT NULL,
        gender TEXT NOT NULL,
        condition TEXT NOT NULL,
        admission_date TEXT NOT NULL,
        status TEXT NOT NULL
    )";
