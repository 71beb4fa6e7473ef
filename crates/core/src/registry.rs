//! Patient admission registry.
//!
//! [`PatientRegistry`] owns the [`PatientStore`] and is the only way the front-end touches
//! patient records. It handles:
//!
//! - Admission of new patients with validated input
//! - Listing and searching records, newest first
//! - Status changes between the open states
//! - Discharge, which computes the invoice and closes the record in one transaction
//! - Permanent deletion
//!
//! ## Status lifecycle
//!
//! ```text
//! Admitted <-> Stable <-> Critical      (any open state to any other)
//!     \           |           /
//!      `--- discharge_with_invoice ---> Discharged (terminal)
//! ```
//!
//! [`PatientRegistry::update_status`] moves a record between open states only. Entry into
//! `Discharged` goes through [`PatientRegistry::discharge_with_invoice`], so a record can
//! never be closed without a successfully computed invoice.
//!
//! ## Pure Data Operations
//!
//! Confirmation prompts, invoice display and error dialogs belong to the caller.

use crate::billing::{BillingParams, Invoice, InvoiceCalculator};
use crate::config::CoreConfig;
use crate::error::{PatientError, PatientResult};
use crate::patient::{NewAdmission, PatientFilter, PatientId, PatientRecord};
use crate::store::{self, PatientStore};
use chrono::Utc;
use hms_types::PatientStatus;

/// Service for managing patient admission records.
#[derive(Debug)]
pub struct PatientRegistry {
    store: PatientStore,
}

impl PatientRegistry {
    /// Creates a registry over an already opened store.
    pub fn new(store: PatientStore) -> Self {
        Self { store }
    }

    /// Opens the store named by `cfg` and wraps it in a registry.
    ///
    /// # Errors
    ///
    /// Returns a storage-family [`PatientError`] if the database cannot be opened. Callers
    /// treat this as fatal at startup.
    pub fn open(cfg: &CoreConfig) -> PatientResult<Self> {
        PatientStore::open(cfg.db_path()).map(Self::new)
    }

    pub fn store(&self) -> &PatientStore {
        &self.store
    }

    /// Releases the store. Equivalent to dropping the registry, but reports close errors.
    pub fn close(self) -> PatientResult<()> {
        self.store.close()
    }

    // ========================================================================
    // ADMISSION
    // ========================================================================

    /// Admits a patient from raw form input.
    ///
    /// # Arguments
    ///
    /// * `name` - Patient name, must not be blank
    /// * `age` - Age in whole years, as typed by the operator
    /// * `gender` - `M`, `F` or `O`
    /// * `condition` - Presenting condition, must not be blank
    ///
    /// # Returns
    ///
    /// The stored record, with a fresh id, the current time as its admission timestamp and
    /// status `Admitted`.
    ///
    /// # Errors
    ///
    /// Returns a validation-family [`PatientError`] (and stores nothing) if any field is
    /// invalid, or [`PatientError::Insert`] if the write fails.
    pub fn admit(
        &mut self,
        name: &str,
        age: &str,
        gender: &str,
        condition: &str,
    ) -> PatientResult<PatientRecord> {
        let admission = NewAdmission::parse(name, age, gender, condition)?;
        self.admit_patient(&admission)
    }

    /// Admits a patient from already validated input.
    pub fn admit_patient(&mut self, admission: &NewAdmission) -> PatientResult<PatientRecord> {
        let record = store::insert_patient(self.store.conn(), admission, Utc::now())?;
        tracing::info!(
            patient_id = %record.id,
            "admitted patient with condition '{}'",
            record.condition
        );
        Ok(record)
    }

    // ========================================================================
    // QUERIES
    // ========================================================================

    /// Lists records, newest admission (highest id) first.
    ///
    /// With `filter` set, only records whose name contains the query (ignoring ASCII case)
    /// or whose id contains it as text are returned.
    pub fn list(&self, filter: Option<&PatientFilter>) -> PatientResult<Vec<PatientRecord>> {
        let records = store::list_patients(self.store.conn(), filter)?;
        tracing::debug!(
            count = records.len(),
            filter = filter.map(PatientFilter::as_str),
            "listed patients"
        );
        Ok(records)
    }

    /// Fetches one record.
    ///
    /// # Errors
    ///
    /// Returns [`PatientError::NotFound`] if no record has this id.
    pub fn get(&self, id: PatientId) -> PatientResult<PatientRecord> {
        store::find_patient(self.store.conn(), id)?.ok_or(PatientError::NotFound(id))
    }

    // ========================================================================
    // STATUS CHANGES
    // ========================================================================

    /// Moves a record to another open status.
    ///
    /// # Errors
    ///
    /// - [`PatientError::NotFound`] if no record has this id
    /// - [`PatientError::InvalidTransition`] if `status` is `Discharged` (use
    ///   [`discharge_with_invoice`](Self::discharge_with_invoice)) or the record is
    ///   already discharged
    ///
    /// The record is unchanged on error.
    pub fn update_status(
        &mut self,
        id: PatientId,
        status: PatientStatus,
    ) -> PatientResult<PatientRecord> {
        let tx = self.store.transaction()?;
        let mut record = store::find_patient(&tx, id)?.ok_or(PatientError::NotFound(id))?;

        if status.is_terminal() {
            tracing::warn!(patient_id = %id, "refused discharge without invoice");
            return Err(PatientError::InvalidTransition {
                from: record.status,
                to: status,
                reason: "discharge requires an invoice",
            });
        }
        ensure_open(&record, status)?;

        if record.status != status {
            store::write_status(&tx, id, status)?;
        }
        tx.commit().map_err(PatientError::Transaction)?;

        tracing::info!(patient_id = %id, from = %record.status, to = %status, "updated status");
        record.status = status;
        Ok(record)
    }

    /// Discharges a patient, computing the invoice first.
    ///
    /// Within one store transaction this loads the record, computes the invoice from its
    /// admission timestamp and `params`, and only then sets the status to `Discharged`.
    /// Nothing is written if any step fails.
    ///
    /// # Returns
    ///
    /// The discharged record together with its invoice.
    ///
    /// # Errors
    ///
    /// - [`PatientError::NotFound`] if no record has this id
    /// - [`PatientError::InvalidTransition`] if the record is already discharged
    /// - [`PatientError::InvalidInput`] if the billing parameters are invalid
    pub fn discharge_with_invoice(
        &mut self,
        id: PatientId,
        params: &BillingParams,
    ) -> PatientResult<(PatientRecord, Invoice)> {
        let tx = self.store.transaction()?;
        let mut record = store::find_patient(&tx, id)?.ok_or(PatientError::NotFound(id))?;
        ensure_open(&record, PatientStatus::Discharged)?;

        let invoice = InvoiceCalculator::compute(record.admitted_at, params)?;

        if !store::write_status(&tx, id, PatientStatus::Discharged)? {
            return Err(PatientError::NotFound(id));
        }
        tx.commit().map_err(PatientError::Transaction)?;

        tracing::info!(
            patient_id = %id,
            days_stayed = invoice.days_stayed,
            total = %invoice.grand_total,
            "discharged patient"
        );
        record.status = PatientStatus::Discharged;
        Ok((record, invoice))
    }

    // ========================================================================
    // DELETION
    // ========================================================================

    /// Permanently removes a record. The id is never reissued.
    ///
    /// # Errors
    ///
    /// Returns [`PatientError::NotFound`] if no record has this id.
    pub fn delete(&mut self, id: PatientId) -> PatientResult<()> {
        if !store::remove_patient(self.store.conn(), id)? {
            return Err(PatientError::NotFound(id));
        }
        tracing::info!(patient_id = %id, "deleted patient record");
        Ok(())
    }
}

fn ensure_open(record: &PatientRecord, to: PatientStatus) -> PatientResult<()> {
    if record.status.is_terminal() {
        tracing::warn!(patient_id = %record.id, to = %to, "refused change to discharged record");
        return Err(PatientError::InvalidTransition {
            from: record.status,
            to,
            reason: "record is discharged; admit the patient again instead",
        });
    }
    Ok(())
}
