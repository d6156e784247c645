use reqwest::Url;

use crate::error::{AppError, AppResult};

/// Imagen recibida desde un formulario: URL ya publicada o data URI a subir.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageInput {
    Url(String),
    DataUri(String),
}

// Devuelve el texto recortado si su longitud (en caracteres) está dentro de [min, max]
pub fn text_len(field: &str, value: &str, min: usize, max: usize) -> AppResult<String> {
    let trimmed = value.trim();
    let len = trimmed.chars().count();
    if len < min {
        return Err(AppError::Validation(format!(
            "El campo '{field}' debe tener al menos {min} caracteres"
        )));
    }
    if len > max {
        return Err(AppError::Validation(format!(
            "El campo '{field}' no puede superar {max} caracteres"
        )));
    }
    Ok(trimmed.to_string())
}

pub fn optional_text(field: &str, value: Option<&str>, max: usize) -> AppResult<Option<String>> {
    match value.map(str::trim).filter(|v| !v.is_empty()) {
        Some(v) => text_len(field, v, 1, max).map(Some),
        None => Ok(None),
    }
}

// Solo http/https con host
pub fn http_url(field: &str, value: &str) -> AppResult<String> {
    let trimmed = value.trim();
    let parsed = Url::parse(trimmed)
        .map_err(|_| AppError::Validation(format!("El campo '{field}' debe ser una URL válida")))?;
    if !matches!(parsed.scheme(), "http" | "https") || parsed.host_str().is_none() {
        return Err(AppError::Validation(format!(
            "El campo '{field}' debe ser una URL http(s)"
        )));
    }
    Ok(trimmed.to_string())
}

pub fn image(field: &str, value: &str) -> AppResult<ImageInput> {
    let trimmed = value.trim();
    if trimmed.starts_with("data:") {
        if !trimmed.starts_with("data:image/") || !trimmed.contains(";base64,") {
            return Err(AppError::Validation(format!(
                "El campo '{field}' debe ser una imagen en base64 (data:image/...;base64,...)"
            )));
        }
        return Ok(ImageInput::DataUri(trimmed.to_string()));
    }
    http_url(field, trimmed).map(ImageInput::Url)
}

pub fn optional_image(field: &str, value: Option<&str>) -> AppResult<Option<ImageInput>> {
    match value.map(str::trim).filter(|v| !v.is_empty()) {
        Some(v) => image(field, v).map(Some),
        None => Ok(None),
    }
}
