use async_trait::async_trait;
use serde::Serialize;

use crate::models::{
    DialogueState, ExtractedFields, Extraction, Field, Intent, ReservationData,
};
use crate::services::ai::{LlmProvider, Message};
use crate::services::{replies, validation};

const SYSTEM_PROMPT: &str = r#"Eres el asistente de reservas de canchas del Punto AS (Manta, Ecuador). Analiza el mensaje del usuario junto con el estado actual de la conversación y los datos ya recopilados.

Responde SOLO con JSON válido (sin markdown, sin explicación) con esta estructura exacta:
{
  "intent": "menu|info|help|reserve|confirm|cancel",
  "reply": "Tu respuesta breve y amable en español",
  "fields": {
    "nombre": "nombre completo o null",
    "cedula": "cédula, solo dígitos, o null",
    "telefono": "teléfono, solo dígitos, o null",
    "cancha": "A (Básquet 3x3) o B (Ecuavóley/Vóley sala), o null",
    "fecha": "fecha DD/MM/AAAA o null",
    "hora": "horario como 16h00-18h00 o null"
  },
  "ready_to_confirm": false
}

Reglas de intención:
- "reserve": el usuario quiere reservar o está dando datos de la reserva
- "confirm": el usuario acepta el resumen de la reserva
- "cancel": el usuario ya no quiere la reserva
- "info": pregunta por canchas, ubicación u horarios del lugar
- "help": pide ayuda sobre cómo usar el bot
- "menu": cualquier otra cosa

Incluye en "fields" solo los datos que el usuario dio en ESTE mensaje; usa null para el resto.
"ready_to_confirm" es true solo si, sumando current_data y los nuevos campos, los seis datos están completos.
En "reply" pide el siguiente dato que falte, uno a la vez. No inventes datos.
"#;

#[derive(Serialize)]
struct ExtractionRequest<'a> {
    user_message: &'a str,
    current_state: &'a str,
    current_data: &'a ReservationData,
}

/// Turns free-form user text into a partial reservation. Never fails: any
/// problem yields [`fallback`].
#[async_trait]
pub trait FieldExtractor: Send + Sync {
    async fn extract(
        &self,
        user_text: &str,
        state: DialogueState,
        data: &ReservationData,
    ) -> Extraction;
}

pub struct LlmExtractor {
    llm: Box<dyn LlmProvider>,
}

impl LlmExtractor {
    pub fn new(llm: Box<dyn LlmProvider>) -> Self {
        Self { llm }
    }
}

#[async_trait]
impl FieldExtractor for LlmExtractor {
    async fn extract(
        &self,
        user_text: &str,
        state: DialogueState,
        data: &ReservationData,
    ) -> Extraction {
        let request = ExtractionRequest {
            user_message: user_text,
            current_state: state.as_str(),
            current_data: data,
        };
        let payload = match serde_json::to_string(&request) {
            Ok(p) => p,
            Err(e) => {
                tracing::error!(error = %e, "failed to encode extraction request");
                return fallback();
            }
        };

        match self.llm.chat(SYSTEM_PROMPT, &[Message::user(payload)]).await {
            Ok(response) => parse_extraction(&response).unwrap_or_else(|| {
                tracing::warn!("failed to parse LLM response as extraction JSON, using fallback");
                fallback()
            }),
            Err(e) => {
                tracing::error!(error = %e, "extraction call failed, using fallback");
                fallback()
            }
        }
    }
}

pub fn fallback() -> Extraction {
    Extraction {
        intent: Intent::Menu,
        reply: replies::extraction_failed(),
        fields: ExtractedFields::default(),
        ready_to_confirm: false,
    }
}

pub fn parse_extraction(response: &str) -> Option<Extraction> {
    let trimmed = response.trim();
    if let Ok(extraction) = serde_json::from_str::<Extraction>(trimmed) {
        return Some(extraction);
    }

    let cleaned = trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
        .unwrap_or(trimmed);
    let cleaned = cleaned.strip_suffix("```").unwrap_or(cleaned).trim();

    if let Ok(extraction) = serde_json::from_str::<Extraction>(cleaned) {
        return Some(extraction);
    }

    let start = cleaned.find('{')?;
    let end = cleaned.rfind('}')?;
    if end <= start {
        return None;
    }
    serde_json::from_str::<Extraction>(&cleaned[start..=end]).ok()
}

/// Merges extracted values into `data`. Blank values and values that fail
/// their field validator are skipped; accepted values overwrite whatever was
/// there. Returns the fields whose stored value changed.
pub fn merge_fields(data: &mut ReservationData, fields: &ExtractedFields) -> Vec<Field> {
    let incoming = [
        (Field::Nombre, &fields.nombre),
        (Field::Cedula, &fields.cedula),
        (Field::Telefono, &fields.telefono),
        (Field::Cancha, &fields.cancha),
        (Field::Fecha, &fields.fecha),
        (Field::Hora, &fields.hora),
    ];

    let mut changed = vec![];
    for (field, value) in incoming {
        let Some(raw) = value.as_deref().filter(|v| !v.trim().is_empty()) else {
            continue;
        };
        let Some(normalized) = validation::validate(field, raw) else {
            tracing::debug!(field = field.as_str(), "discarding extracted value that failed validation");
            continue;
        };
        if data.get(field) != Some(normalized.as_str()) {
            data.set(field, normalized);
            changed.push(field);
        }
    }
    changed
}
