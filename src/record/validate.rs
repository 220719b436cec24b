//! Minimal shape check applied before a record is trusted downstream
//!
//! Advisory only: the pipeline logs a violation and still returns the record,
//! so partial extractions stay available for review.

use thiserror::Error;

use crate::record::ClinicalRecord;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaViolation {
    #[error("Missing required field: informacion_paciente")]
    MissingPatientInfo,

    #[error("No meaningful medical data extracted")]
    NoClinicalContent,
}

/// Check that a record has patient info and at least one non-empty SOAP section.
pub fn validate(record: &ClinicalRecord) -> Result<(), SchemaViolation> {
    if record.patient_info.is_none() {
        return Err(SchemaViolation::MissingPatientInfo);
    }

    let has_content = record.subjective.as_ref().is_some_and(|s| !s.is_empty())
        || record.objective.as_ref().is_some_and(|o| !o.is_empty())
        || record.assessment.as_ref().is_some_and(|a| !a.is_empty())
        || record.plan.as_ref().is_some_and(|p| !p.is_empty());

    if !has_content {
        return Err(SchemaViolation::NoClinicalContent);
    }

    Ok(())
}
