use serde::Deserialize;
use serde_json::{json, Value};

use crate::{config::AiConfig, error::AppError};

pub const MIN_TEXT_CHARS: usize = 20;
pub const MAX_SUGERENCIAS: usize = 5;

#[derive(Debug, Deserialize)]
struct SuggestionOutput {
    suggestions: Vec<String>,
}

pub fn build_prompt(title: &str, text: &str) -> String {
    format!(
        "Sos editor de un diario digital. A partir del título y el cuerpo de la \
         noticia, proponé exactamente {MAX_SUGERENCIAS} títulos alternativos, breves, \
         informativos y sin clickbait, en el mismo idioma del texto.\n\n\
         Título actual: {title}\n\nCuerpo:\n{text}"
    )
}

fn request_body(prompt: &str) -> Value {
    json!({
        "contents": [{ "role": "user", "parts": [{ "text": prompt }] }],
        "generationConfig": {
            "responseMimeType": "application/json",
            "responseSchema": {
                "type": "OBJECT",
                "properties": {
                    "suggestions": { "type": "ARRAY", "items": { "type": "STRING" } }
                },
                "required": ["suggestions"]
            }
        }
    })
}

/// Extrae las sugerencias de la respuesta; cualquier forma inesperada da lista vacía.
pub fn parse_suggestions(response: &Value) -> Vec<String> {
    let Some(text) = response["candidates"][0]["content"]["parts"][0]["text"].as_str() else {
        return Vec::new();
    };
    match serde_json::from_str::<SuggestionOutput>(text) {
        Ok(output) => output
            .suggestions
            .into_iter()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .take(MAX_SUGERENCIAS)
            .collect(),
        Err(e) => {
            tracing::warn!("Salida del modelo con formato inválido: {}", e);
            Vec::new()
        }
    }
}

pub fn check_input(title: &str, text: &str) -> Result<(), AppError> {
    if title.trim().is_empty() {
        return Err(AppError::Validation("El título no puede estar vacío".to_string()));
    }
    if text.trim().chars().count() < MIN_TEXT_CHARS {
        return Err(AppError::Validation(format!(
            "El texto debe tener al menos {MIN_TEXT_CHARS} caracteres para sugerir títulos"
        )));
    }
    Ok(())
}

pub async fn suggest_titles(
    http: &reqwest::Client,
    config: &AiConfig,
    title: &str,
    text: &str,
) -> Result<Vec<String>, AppError> {
    // Se valida antes de cualquier llamada de red
    check_input(title, text)?;
    let api_key = config
        .api_key
        .as_deref()
        .ok_or_else(|| AppError::Config("GEMINI_API_KEY no está configurado".to_string()))?;

    let url = reqwest::Url::parse_with_params(
        &format!(
            "{}/models/{}:generateContent",
            config.api_url.trim_end_matches('/'),
            config.model
        ),
        &[("key", api_key)],
    )
    .map_err(|e| AppError::Config(format!("GEMINI_API_URL inválida: {e}")))?;
    let response = http
        .post(url)
        .json(&request_body(&build_prompt(title.trim(), text.trim())))
        .send()
        .await
        .map_err(|e| AppError::Upstream(format!("generación de títulos: {e}")))?;

    let status = response.status();
    if !status.is_success() {
        return Err(AppError::Upstream(format!("generación de títulos respondió {status}")));
    }
    let payload: Value = response.json().await.unwrap_or(Value::Null);
    Ok(parse_suggestions(&payload))
}
