/// Appended to the base prompt on every retry after malformed output.
pub const CORRECTION_SUFFIX: &str = "\n\nNOTA: El JSON anterior no era válido. \
Asegúrate de generar JSON perfectamente válido esta vez.";

/// Build the SOAP extraction prompt for a consultation transcript.
pub fn build_extraction_prompt(transcript: &str) -> String {
    format!(
        "Eres un asistente médico especializado en crear notas clínicas siguiendo el formato SOAP \
(Subjetivo, Objetivo, Evaluación, Plan).\n\
\n\
Tu tarea es analizar la siguiente transcripción de una consulta médica en español y extraer toda \
la información relevante en un formato JSON estructurado.\n\
\n\
INSTRUCCIONES CRÍTICAS:\n\
1. Debes extraer ÚNICAMENTE información que esté explícitamente mencionada en la transcripción\n\
2. Si cierta información no está presente, omite ese campo (no inventes datos)\n\
3. Mantén los términos médicos exactamente como aparecen en la transcripción, asegurando la \
congruencia de género entre artículos y el sustantivo que les sigue\n\
4. Organiza la información según el formato SOAP\n\
5. Identifica y separa la información del paciente, síntomas, hallazgos, diagnóstico y plan de \
tratamiento\n\
\n\
TRANSCRIPCIÓN:\n\
{transcript}\n\
\n\
FORMATO DE SALIDA:\n\
Debes responder ÚNICAMENTE con un objeto JSON válido que siga este esquema:\n\
\n\
{SCHEMA}\n\
\n\
REGLAS IMPORTANTES:\n\
- Responde SOLO con el JSON, sin texto adicional antes o después\n\
- No incluyas ```json ni ningún otro formato de código\n\
- Si un campo no tiene información, omítelo del JSON\n\
- Asegúrate de que el JSON sea válido y pueda ser parseado\n\
- Usa comillas dobles para strings, no comillas simples\n\
- Mantén los acentos y caracteres especiales del español\n\
\n\
Ahora extrae la información de la transcripción y genera el JSON:"
    )
}

/// Build the prompt for a given attempt; retries append a single correction.
pub fn prompt_for_attempt(base: &str, attempt: u32) -> String {
    if attempt <= 1 {
        base.to_string()
    } else {
        format!("{base}{CORRECTION_SUFFIX}")
    }
}

const SCHEMA: &str = r#"{
  "informacion_paciente": {
    "nombre_del_paciente": "string (si se menciona)",
    "fecha_de_nacimiento": "string en formato DD/MM/YYYY (si se menciona)",
    "edad": "string (si se menciona)",
    "genero": "string (si se menciona)",
    "estado_civil": "string (si se menciona)",
    "domicilio": "string (si se menciona)",
    "telefono": "string (si se menciona)",
    "celular": "string (si se menciona)"
  },
  "subjetivo": {
    "motivo_de_consulta": "string - razón principal de la visita",
    "sintomas": ["lista de síntomas mencionados por el paciente"],
    "historia_de_enfermedad_actual": "string - descripción de cómo empezó y evolucionó",
    "duracion_sintomas": "string - hace cuánto empezaron los síntomas"
  },
  "objetivo": {
    "signos_vitales": {
      "presion_arterial": "string (si se menciona)",
      "frecuencia_cardiaca": "string (si se menciona)",
      "temperatura": "string (si se menciona)",
      "frecuencia_respiratoria": "string (si se menciona)",
      "saturacion_oxigeno": "string (si se menciona)"
    },
    "examen_fisico": "string - hallazgos del examen físico",
    "hallazgos": ["lista de hallazgos objetivos"]
  },
  "evaluacion": {
    "diagnostico": "string - diagnóstico principal",
    "diagnosticos_adicionales": ["otros diagnósticos o diagnósticos diferenciales"],
    "impresion_clinica": "string - impresión general del médico"
  },
  "plan": {
    "tratamiento": "string - plan de tratamiento general",
    "medicamentos": [
      {
        "nombre": "nombre del medicamento",
        "dosis": "dosis prescrita",
        "frecuencia": "con qué frecuencia tomar",
        "duracion": "por cuánto tiempo"
      }
    ],
    "recomendaciones": ["lista de recomendaciones e instrucciones"],
    "estudios_solicitados": ["laboratorios, imágenes u otros estudios solicitados"],
    "seguimiento": "string - instrucciones de seguimiento"
  },
  "metadata": {
    "fecha_consulta": "string (si se menciona)",
    "medico": "string (si se menciona)",
    "duracion_consulta": "string (si se puede determinar)"
  }
}"#;
