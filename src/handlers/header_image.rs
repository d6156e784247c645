use axum::{
    extract::{Json, Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};

use crate::{
    error::{AppError, AppResult},
    handlers::ListFilter,
    models::header_image::{CreateHeaderImageSchema, HeaderImage, UpdateHeaderImageSchema},
    state::AppState,
    storage::BUCKET_HEADER,
    utils::validation::{image, optional_image, text_len},
};

const TABLE: &str = "header_images";
const COLUMNS: &str = "id, nombre, image_url, is_active, created_at, updated_at";

fn not_found() -> AppError {
    AppError::NotFound("Imagen de cabecera no encontrada".to_string())
}

// GET /api/header-images
pub async fn list_header_images_handler(
    State(state): State<AppState>,
    Query(filter): Query<ListFilter>,
) -> AppResult<impl IntoResponse> {
    let imagenes = sqlx::query_as::<_, HeaderImage>(&format!(
        "SELECT {COLUMNS} FROM header_images
         WHERE ($1 = FALSE OR is_active = TRUE)
         ORDER BY created_at DESC"
    ))
    .bind(filter.only_active())
    .fetch_all(&state.pool)
    .await
    .map_err(|e| AppError::from_db(TABLE, e))?;

    Ok(Json(imagenes))
}

// POST /api/admin/header-images
pub async fn create_header_image_handler(
    State(state): State<AppState>,
    Json(body): Json<CreateHeaderImageSchema>,
) -> AppResult<impl IntoResponse> {
    let nombre = text_len("nombre", &body.nombre, 3, 100)?;
    let imagen = image("imagen", &body.imagen)?;
    let resolved = state.resolve_image(BUCKET_HEADER, imagen).await?;

    let inserted = sqlx::query_as::<_, HeaderImage>(&format!(
        "INSERT INTO header_images (nombre, image_url, is_active)
         VALUES ($1, $2, $3)
         RETURNING {COLUMNS}"
    ))
    .bind(&nombre)
    .bind(&resolved.url)
    .bind(body.is_active.unwrap_or(true))
    .fetch_one(&state.pool)
    .await
    .map_err(|e| AppError::from_db(TABLE, e));
    let imagen_cabecera = state.discard_on_error(Some(&resolved), inserted).await?;

    tracing::info!("Imagen de cabecera {} creada", imagen_cabecera.id);
    Ok((StatusCode::CREATED, Json(imagen_cabecera)))
}

// PUT /api/admin/header-images/:id
pub async fn update_header_image_handler(
    Path(id): Path<i64>,
    State(state): State<AppState>,
    Json(body): Json<UpdateHeaderImageSchema>,
) -> AppResult<impl IntoResponse> {
    let nombre = body.nombre.as_deref().map(|n| text_len("nombre", n, 3, 100)).transpose()?;
    let imagen = optional_image("imagen", body.imagen.as_deref())?;
    let resolved = state.resolve_optional_image(BUCKET_HEADER, imagen).await?;

    let updated = sqlx::query_as::<_, HeaderImage>(&format!(
        "UPDATE header_images SET
            nombre = COALESCE($1, nombre),
            image_url = COALESCE($2, image_url),
            is_active = COALESCE($3, is_active),
            updated_at = NOW()
         WHERE id = $4
         RETURNING {COLUMNS}"
    ))
    .bind(nombre)
    .bind(resolved.as_ref().map(|i| i.url.as_str()))
    .bind(body.is_active)
    .bind(id)
    .fetch_optional(&state.pool)
    .await
    .map_err(|e| AppError::from_db(TABLE, e))
    .and_then(|row| row.ok_or_else(not_found));
    let imagen_cabecera = state.discard_on_error(resolved.as_ref(), updated).await?;

    Ok(Json(imagen_cabecera))
}

// POST /api/admin/header-images/:id/toggle
pub async fn toggle_header_image_handler(
    Path(id): Path<i64>,
    State(state): State<AppState>,
) -> AppResult<impl IntoResponse> {
    let imagen_cabecera = sqlx::query_as::<_, HeaderImage>(&format!(
        "UPDATE header_images SET is_active = NOT is_active, updated_at = NOW()
         WHERE id = $1
         RETURNING {COLUMNS}"
    ))
    .bind(id)
    .fetch_optional(&state.pool)
    .await
    .map_err(|e| AppError::from_db(TABLE, e))?
    .ok_or_else(not_found)?;

    Ok(Json(imagen_cabecera))
}

// DELETE /api/admin/header-images/:id
pub async fn delete_header_image_handler(
    Path(id): Path<i64>,
    State(state): State<AppState>,
) -> AppResult<impl IntoResponse> {
    let result = sqlx::query("DELETE FROM header_images WHERE id = $1")
        .bind(id)
        .execute(&state.pool)
        .await
        .map_err(|e| AppError::from_db(TABLE, e))?;

    if result.rows_affected() == 0 {
        return Err(not_found());
    }
    Ok(StatusCode::NO_CONTENT)
}
