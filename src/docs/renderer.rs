//! Renders a clinical record into a copy of the note template

use std::sync::Arc;
use tracing::info;

use crate::config::Settings;
use crate::docs::builder::{DocumentBuilder, LineEnd, Weight};
use crate::docs::client::{DocumentInfo, DocumentProvider};
use crate::record::{
    Assessment, ClinicalRecord, Medication, Metadata, Objective, PatientInfo, Plan, Subjective,
    VitalSigns,
};
use crate::{CliniaError, Result};

const RULE_WIDTH: usize = 80;

pub struct DocumentRenderer {
    provider: Arc<dyn DocumentProvider>,
    template_id: String,
}

impl DocumentRenderer {
    pub fn new(provider: Arc<dyn DocumentProvider>, template_id: impl Into<String>) -> Self {
        Self {
            provider,
            template_id: template_id.into(),
        }
    }

    pub fn from_settings(provider: Arc<dyn DocumentProvider>, settings: &Settings) -> Self {
        Self::new(provider, settings.docs.template_id.clone())
    }

    /// Copy the template and write the note into it.
    ///
    /// Any provider failure is returned as `CliniaError::Document`; the
    /// pipeline turns that into an inline `DocumentInfo::Failed`.
    pub async fn render(
        &self,
        record: &ClinicalRecord,
        title: Option<&str>,
    ) -> Result<DocumentInfo> {
        let title = title
            .map(str::to_string)
            .unwrap_or_else(|| default_title(record));

        self.render_inner(record, &title)
            .await
            .map_err(|e| CliniaError::Document(format!("{:#}", e)))
    }

    async fn render_inner(
        &self,
        record: &ClinicalRecord,
        title: &str,
    ) -> anyhow::Result<DocumentInfo> {
        let document_id = self.provider.copy_template(&self.template_id, title).await?;
        let content = self.provider.get_document(&document_id).await?;

        let operations = build_note(record, content.insertion_index()).finish();
        if !operations.is_empty() {
            self.provider.batch_update(&document_id, &operations).await?;
        }

        let link = self.provider.document_link(&document_id);
        info!("Document created: {}", link);

        Ok(DocumentInfo::Created {
            document_id,
            link,
            title: title.to_string(),
        })
    }
}

/// Title used when the caller does not supply one
pub fn default_title(record: &ClinicalRecord) -> String {
    format!(
        "Nota Clínica - {} - {}",
        record.patient_name().unwrap_or("Paciente"),
        record.consultation_date().unwrap_or("Sin fecha")
    )
}

/// Lay out the full note starting at `start_index`.
pub fn build_note(record: &ClinicalRecord, start_index: u32) -> DocumentBuilder {
    let mut doc = DocumentBuilder::new(start_index);

    write_header(&mut doc, record);
    write_subjective(&mut doc, record);
    write_objective(&mut doc, record);
    write_assessment(&mut doc, record);
    write_plan(&mut doc, record);

    doc
}

fn write_header(doc: &mut DocumentBuilder, record: &ClinicalRecord) {
    let (no_info, no_meta) = (PatientInfo::default(), Metadata::default());
    let info = record.patient_info.as_ref().unwrap_or(&no_info);
    let meta = record.metadata.as_ref().unwrap_or(&no_meta);
    let or_blank = |value: &Option<String>, width: usize| {
        value.clone().unwrap_or_else(|| "_".repeat(width))
    };

    plain(doc, "\n");
    plain(
        doc,
        &format!(
            "FECHA: {}\t\tEDAD: {}",
            or_blank(&meta.consultation_date, 10),
            or_blank(&info.age, 4)
        ),
    );
    plain(
        doc,
        &format!(
            "NOMBRE: {}\t\tFECHA DE NACIMIENTO: {}",
            or_blank(&info.name, 20),
            or_blank(&info.birth_date, 10)
        ),
    );
    plain(
        doc,
        &format!(
            "ESTADO CIVIL: {}\t\tSEXO: {}",
            or_blank(&info.marital_status, 10),
            or_blank(&info.gender, 10)
        ),
    );
    plain(doc, &format!("DOMICILIO: {}", or_blank(&info.address, 40)));
    plain(
        doc,
        &format!(
            "TEL: {}\t\tCELULAR: {}",
            or_blank(&info.phone, 10),
            or_blank(&info.mobile, 10)
        ),
    );

    plain(doc, &"-".repeat(RULE_WIDTH));
    plain(doc, "RESUMEN DE CONSULTA (SOAP)");
    plain(doc, &format!("{}\n", "-".repeat(RULE_WIDTH)));
}

fn write_subjective(doc: &mut DocumentBuilder, record: &ClinicalRecord) {
    let empty = Subjective::default();
    let subj = record.subjective.as_ref().unwrap_or(&empty);

    heading(doc, "SUBJETIVO (S)");
    doc.append_labeled_field("Motivo de Consulta: ", subj.chief_complaint.as_deref());

    heading(doc, "Síntomas: ");
    bullets(doc, &subj.symptoms);

    heading(doc, "Historia de la Enfermedad: ");
    plain(doc, subj.present_illness.as_deref().unwrap_or_default());

    if let Some(duration) = &subj.symptom_duration {
        plain(doc, &format!("Duración: {}", duration));
    }

    plain(doc, "");
}

fn write_objective(doc: &mut DocumentBuilder, record: &ClinicalRecord) {
    let empty = Objective::default();
    let obj = record.objective.as_ref().unwrap_or(&empty);

    heading(doc, "OBJETIVO (O)");
    let vitals = obj
        .vital_signs
        .as_ref()
        .map(format_vital_signs)
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| "No registrados".to_string());
    doc.append_labeled_field("Signos Vitales: ", Some(&vitals));

    heading(doc, "Examen Físico: ");
    plain(doc, obj.physical_exam.as_deref().unwrap_or_default());

    heading(doc, "Hallazgos: ");
    bullets(doc, &obj.findings);

    plain(doc, "");
}

fn write_assessment(doc: &mut DocumentBuilder, record: &ClinicalRecord) {
    let empty = Assessment::default();
    let ev = record.assessment.as_ref().unwrap_or(&empty);

    heading(doc, "EVALUACIÓN (A)");
    doc.append_labeled_field("Diagnóstico: ", ev.diagnosis.as_deref());

    if !ev.additional_diagnoses.is_empty() {
        heading(doc, "Diagnósticos Adicionales:");
        bullets(doc, &ev.additional_diagnoses);
    }

    doc.append_labeled_field("Impresión Clínica: ", ev.clinical_impression.as_deref());

    plain(doc, "");
}

fn write_plan(doc: &mut DocumentBuilder, record: &ClinicalRecord) {
    let empty = Plan::default();
    let plan = record.plan.as_ref().unwrap_or(&empty);

    heading(doc, "PLAN (P)");

    if let Some(treatment) = plan.treatment.as_deref() {
        doc.append_labeled_field("Tratamiento: ", Some(treatment));
    }

    heading(doc, "Medicamentos Prescritos:");
    let medications: Vec<String> = plan.medications.iter().map(format_medication).collect();
    bullets(doc, &medications);

    heading(doc, "Recomendaciones:");
    bullets(doc, &plan.recommendations);

    heading(doc, "Estudios Solicitados:");
    bullets(doc, &plan.ordered_studies);

    heading(doc, "Seguimiento:");
    plain(doc, plan.follow_up.as_deref().unwrap_or_default());
}

fn heading(doc: &mut DocumentBuilder, text: &str) {
    doc.append_text(text, Weight::Bold, LineEnd::Newline);
}

fn plain(doc: &mut DocumentBuilder, text: &str) {
    doc.append_text(text, Weight::Normal, LineEnd::Newline);
}

fn bullets(doc: &mut DocumentBuilder, items: &[String]) {
    for item in items {
        plain(doc, &format!(" • {}", item));
    }
}

fn format_vital_signs(vitals: &VitalSigns) -> String {
    vitals
        .entries()
        .into_iter()
        .map(|(key, value)| format!("{}: {}", title_case(&key.replace('_', " ")), value))
        .collect::<Vec<_>>()
        .join(", ")
}

fn format_medication(medication: &Medication) -> String {
    let mut line = medication
        .name
        .clone()
        .unwrap_or_else(|| "Medicamento".to_string());

    if let Some(dose) = &medication.dose {
        line.push_str(" - ");
        line.push_str(dose);
    }

    let schedule: Vec<&str> = [&medication.frequency, &medication.duration]
        .into_iter()
        .filter_map(|v| v.as_deref())
        .collect();
    if !schedule.is_empty() {
        line.push_str(&format!(" ({})", schedule.join(", ")));
    }

    line
}

fn title_case(text: &str) -> String {
    text.split(' ')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first
                    .to_uppercase()
                    .chain(chars.flat_map(char::to_lowercase))
                    .collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}
