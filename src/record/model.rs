//! Structured clinical record (SOAP note) produced by extraction
//!
//! Wire keys follow the Spanish schema the model is prompted with. A field that
//! is absent means "not mentioned"; blank values are never stored.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::record::lenient;

/// Marker stored in `error` when every extraction attempt produced unusable output
pub const EXTRACTION_FAILED: &str = "Failed to parse LLM response";

/// Full extraction result for one consultation
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClinicalRecord {
    #[serde(
        rename = "informacion_paciente",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub patient_info: Option<PatientInfo>,

    #[serde(rename = "subjetivo", default, skip_serializing_if = "Option::is_none")]
    pub subjective: Option<Subjective>,

    #[serde(rename = "objetivo", default, skip_serializing_if = "Option::is_none")]
    pub objective: Option<Objective>,

    #[serde(rename = "evaluacion", default, skip_serializing_if = "Option::is_none")]
    pub assessment: Option<Assessment>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub plan: Option<Plan>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Metadata>,

    /// Set only when extraction gave up
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    /// Last model response, kept verbatim when extraction gave up
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raw_response: Option<String>,

    /// Top-level keys outside the schema, preserved as returned
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PatientInfo {
    #[serde(
        rename = "nombre_del_paciente",
        default,
        deserialize_with = "lenient::opt_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub name: Option<String>,

    /// DD/MM/YYYY when the model follows the prompt
    #[serde(
        rename = "fecha_de_nacimiento",
        default,
        deserialize_with = "lenient::opt_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub birth_date: Option<String>,

    #[serde(
        rename = "edad",
        default,
        deserialize_with = "lenient::opt_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub age: Option<String>,

    #[serde(
        rename = "genero",
        default,
        deserialize_with = "lenient::opt_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub gender: Option<String>,

    #[serde(
        rename = "estado_civil",
        default,
        deserialize_with = "lenient::opt_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub marital_status: Option<String>,

    #[serde(
        rename = "domicilio",
        default,
        deserialize_with = "lenient::opt_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub address: Option<String>,

    #[serde(
        rename = "telefono",
        default,
        deserialize_with = "lenient::opt_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub phone: Option<String>,

    #[serde(
        rename = "celular",
        default,
        deserialize_with = "lenient::opt_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub mobile: Option<String>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Subjective {
    #[serde(
        rename = "motivo_de_consulta",
        default,
        deserialize_with = "lenient::opt_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub chief_complaint: Option<String>,

    #[serde(
        rename = "sintomas",
        default,
        deserialize_with = "lenient::text_list",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub symptoms: Vec<String>,

    #[serde(
        rename = "historia_de_enfermedad_actual",
        default,
        deserialize_with = "lenient::opt_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub present_illness: Option<String>,

    /// `duracion` is a deprecated alias
    #[serde(
        rename = "duracion_sintomas",
        alias = "duracion",
        default,
        deserialize_with = "lenient::opt_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub symptom_duration: Option<String>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Objective {
    #[serde(
        rename = "signos_vitales",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub vital_signs: Option<VitalSigns>,

    #[serde(
        rename = "examen_fisico",
        default,
        deserialize_with = "lenient::opt_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub physical_exam: Option<String>,

    #[serde(
        rename = "hallazgos",
        default,
        deserialize_with = "lenient::text_list",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub findings: Vec<String>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VitalSigns {
    #[serde(
        rename = "presion_arterial",
        default,
        deserialize_with = "lenient::opt_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub blood_pressure: Option<String>,

    #[serde(
        rename = "frecuencia_cardiaca",
        default,
        deserialize_with = "lenient::opt_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub heart_rate: Option<String>,

    #[serde(
        rename = "temperatura",
        default,
        deserialize_with = "lenient::opt_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub temperature: Option<String>,

    #[serde(
        rename = "frecuencia_respiratoria",
        default,
        deserialize_with = "lenient::opt_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub respiratory_rate: Option<String>,

    #[serde(
        rename = "saturacion_oxigeno",
        default,
        deserialize_with = "lenient::opt_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub oxygen_saturation: Option<String>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Assessment {
    /// `diagnostico_principal` is a deprecated alias
    #[serde(
        rename = "diagnostico",
        alias = "diagnostico_principal",
        default,
        deserialize_with = "lenient::opt_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub diagnosis: Option<String>,

    #[serde(
        rename = "diagnosticos_adicionales",
        default,
        deserialize_with = "lenient::text_list",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub additional_diagnoses: Vec<String>,

    #[serde(
        rename = "impresion_clinica",
        default,
        deserialize_with = "lenient::opt_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub clinical_impression: Option<String>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Plan {
    #[serde(
        rename = "tratamiento",
        default,
        deserialize_with = "lenient::opt_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub treatment: Option<String>,

    /// `medicamentos_prescritos` is a deprecated alias
    #[serde(
        rename = "medicamentos",
        alias = "medicamentos_prescritos",
        default,
        deserialize_with = "lenient::medications",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub medications: Vec<Medication>,

    #[serde(
        rename = "recomendaciones",
        default,
        deserialize_with = "lenient::text_list",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub recommendations: Vec<String>,

    #[serde(
        rename = "estudios_solicitados",
        default,
        deserialize_with = "lenient::text_list",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub ordered_studies: Vec<String>,

    #[serde(
        rename = "seguimiento",
        default,
        deserialize_with = "lenient::opt_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub follow_up: Option<String>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Medication {
    #[serde(
        rename = "nombre",
        default,
        deserialize_with = "lenient::opt_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub name: Option<String>,

    #[serde(
        rename = "dosis",
        default,
        deserialize_with = "lenient::opt_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub dose: Option<String>,

    #[serde(
        rename = "frecuencia",
        default,
        deserialize_with = "lenient::opt_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub frequency: Option<String>,

    #[serde(
        rename = "duracion",
        default,
        deserialize_with = "lenient::opt_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub duration: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Metadata {
    #[serde(
        rename = "fecha_consulta",
        default,
        deserialize_with = "lenient::opt_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub consultation_date: Option<String>,

    #[serde(
        rename = "medico",
        default,
        deserialize_with = "lenient::opt_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub physician: Option<String>,

    #[serde(
        rename = "duracion_consulta",
        default,
        deserialize_with = "lenient::opt_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub consultation_duration: Option<String>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ClinicalRecord {
    /// Build a record from parsed model output, absorbing shape drift first
    pub fn from_model_output(mut value: Value) -> serde_json::Result<Self> {
        lenient::normalize(&mut value);
        serde_json::from_value(value)
    }

    /// Record returned when no attempt yielded a usable structure
    pub fn extraction_failed(raw_response: String) -> Self {
        Self {
            patient_info: Some(PatientInfo::default()),
            error: Some(EXTRACTION_FAILED.to_string()),
            raw_response: Some(raw_response),
            ..Self::default()
        }
    }

    /// Whether extraction gave up on this record
    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }

    pub fn patient_name(&self) -> Option<&str> {
        self.patient_info.as_ref()?.name.as_deref()
    }

    pub fn consultation_date(&self) -> Option<&str> {
        self.metadata.as_ref()?.consultation_date.as_deref()
    }
}

impl PatientInfo {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.birth_date.is_none()
            && self.age.is_none()
            && self.gender.is_none()
            && self.marital_status.is_none()
            && self.address.is_none()
            && self.phone.is_none()
            && self.mobile.is_none()
            && self.extra.is_empty()
    }
}

impl Subjective {
    pub fn is_empty(&self) -> bool {
        self.chief_complaint.is_none()
            && self.symptoms.is_empty()
            && self.present_illness.is_none()
            && self.symptom_duration.is_none()
            && self.extra.is_empty()
    }
}

impl Objective {
    pub fn is_empty(&self) -> bool {
        self.vital_signs.as_ref().map_or(true, VitalSigns::is_empty)
            && self.physical_exam.is_none()
            && self.findings.is_empty()
            && self.extra.is_empty()
    }
}

impl VitalSigns {
    pub fn is_empty(&self) -> bool {
        self.entries().is_empty()
    }

    /// Recorded readings as `(schema key, value)` pairs, known keys first
    pub fn entries(&self) -> Vec<(String, String)> {
        let known = [
            ("presion_arterial", &self.blood_pressure),
            ("frecuencia_cardiaca", &self.heart_rate),
            ("temperatura", &self.temperature),
            ("frecuencia_respiratoria", &self.respiratory_rate),
            ("saturacion_oxigeno", &self.oxygen_saturation),
        ];

        let mut entries: Vec<(String, String)> = known
            .iter()
            .filter_map(|(key, value)| value.as_ref().map(|v| (key.to_string(), v.clone())))
            .collect();

        for (key, value) in &self.extra {
            let text = match value {
                Value::Null => continue,
                Value::String(s) if s.trim().is_empty() => continue,
                Value::String(s) => s.trim().to_string(),
                other => other.to_string(),
            };
            entries.push((key.clone(), text));
        }

        entries
    }
}

impl Assessment {
    pub fn is_empty(&self) -> bool {
        self.diagnosis.is_none()
            && self.additional_diagnoses.is_empty()
            && self.clinical_impression.is_none()
            && self.extra.is_empty()
    }
}

impl Plan {
    pub fn is_empty(&self) -> bool {
        self.treatment.is_none()
            && self.medications.is_empty()
            && self.recommendations.is_empty()
            && self.ordered_studies.is_empty()
            && self.follow_up.is_none()
            && self.extra.is_empty()
    }
}

impl Medication {
    pub fn named(name: String) -> Self {
        Self {
            name: Some(name),
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.dose.is_none()
            && self.frequency.is_none()
            && self.duration.is_none()
    }
}
