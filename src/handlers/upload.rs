use axum::{
    extract::{Multipart, State},
    response::{IntoResponse, Json},
};
use mime::Mime;
use serde_json::json;

use crate::{
    error::{AppError, AppResult},
    state::AppState,
    storage::{check_image, BUCKETS, BUCKET_PUBLICIDAD, MAX_IMAGE_BYTES},
};

// POST /api/upload - multipart con el campo "image" y opcionalmente "bucket"
pub async fn upload_image_handler(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> AppResult<impl IntoResponse> {
    let mut bucket = BUCKET_PUBLICIDAD.to_string();
    let mut image = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("Formulario inválido: {e}")))?
    {
        match field.name().unwrap_or("") {
            "bucket" => {
                bucket = field
                    .text()
                    .await
                    .map_err(|_| AppError::Validation("Bucket ilegible".to_string()))?;
            }
            "image" => {
                let file_name = field.file_name().unwrap_or("imagen").to_string();
                let content_type: Mime = field
                    .content_type()
                    .and_then(|ct| ct.parse().ok())
                    .ok_or_else(|| {
                        AppError::Validation("El archivo no declara su tipo de imagen".to_string())
                    })?;
                let data = field
                    .bytes()
                    .await
                    .map_err(|_| AppError::Validation("Error al leer el archivo".to_string()))?;
                if data.len() > MAX_IMAGE_BYTES {
                    return Err(AppError::Validation(
                        "La imagen excede el tamaño máximo de 5MB".to_string(),
                    ));
                }
                image = Some((file_name, check_image(content_type, data.to_vec())?));
            }
            _ => {}
        }
    }

    if !BUCKETS.contains(&bucket.as_str()) {
        return Err(AppError::Validation(format!("Bucket desconocido: {bucket}")));
    }
    let (file_name, image) =
        image.ok_or_else(|| AppError::Validation("No se envió ningún campo 'image'".to_string()))?;

    let stored = state.storage.upload_image(&bucket, &image).await?;
    Ok(Json(json!({
        "url": stored.url,
        "bucket": bucket,
        "original_name": file_name,
    })))
}
