//! # HMS Core
//!
//! Core business logic for the HMS admission registry.
//!
//! This crate contains the patient record store and the discharge billing rules:
//! - Admission, search, status changes and deletion of patient records ([`PatientRegistry`])
//! - A single-table SQLite store opened once per process ([`PatientStore`])
//! - Invoice computation at discharge ([`InvoiceCalculator`])
//!
//! **No presentation concerns**: prompts, confirmation dialogs and rendering choices belong
//! to the front-end that drives the registry.

pub mod billing;
pub mod config;
pub mod constants;
pub mod error;
pub mod patient;
pub mod registry;
pub mod store;
pub mod validation;

pub use billing::{format_amount, BillingParams, FeeSchedule, Invoice, InvoiceCalculator, LineItem};
pub use config::CoreConfig;
pub use error::{ErrorKind, PatientError, PatientResult};
pub use hms_types::{Gender, NonEmptyText, PatientStatus, TextError, UnknownVariant};
pub use patient::{NewAdmission, PatientFilter, PatientId, PatientRecord};
pub use registry::PatientRegistry;
pub use store::PatientStore;
