//! Clinical record module for clinia
//!
//! The structured SOAP note extracted from a consultation and its shape check.

mod lenient;
mod model;
mod validate;

pub use model::{
    Assessment, ClinicalRecord, Medication, Metadata, Objective, PatientInfo, Plan, Subjective,
    VitalSigns, EXTRACTION_FAILED,
};
pub use validate::{validate, SchemaViolation};
