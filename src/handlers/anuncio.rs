use axum::{
    extract::{Json, Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use chrono::Utc;

use crate::{
    error::{AppError, AppResult},
    handlers::ListFilter,
    models::anuncio::{Anuncio, AnuncioView, CreateAnuncioSchema, UpdateAnuncioSchema},
    state::AppState,
    storage::BUCKET_ANUNCIOS,
    utils::validation::{image, optional_image, text_len},
};

const TABLE: &str = "anuncios";
const COLUMNS: &str = "id, name, image_url, is_active, created_at, updated_at";

fn not_found() -> AppError {
    AppError::NotFound("Anuncio no encontrado".to_string())
}

// GET /api/anuncios
pub async fn list_anuncios_handler(
    State(state): State<AppState>,
    Query(filter): Query<ListFilter>,
) -> AppResult<impl IntoResponse> {
    let anuncios = sqlx::query_as::<_, Anuncio>(&format!(
        "SELECT {COLUMNS} FROM anuncios
         WHERE ($1 = FALSE OR is_active = TRUE)
         ORDER BY created_at DESC"
    ))
    .bind(filter.only_active())
    .fetch_all(&state.pool)
    .await
    .map_err(|e| AppError::from_db(TABLE, e))?;

    let now = Utc::now();
    let views: Vec<AnuncioView> = anuncios.into_iter().map(|a| AnuncioView::at(a, now)).collect();
    Ok(Json(views))
}

// POST /api/admin/anuncios
pub async fn create_anuncio_handler(
    State(state): State<AppState>,
    Json(body): Json<CreateAnuncioSchema>,
) -> AppResult<impl IntoResponse> {
    let name = text_len("name", &body.name, 3, 100)?;
    let imagen = image("imagen", &body.imagen)?;
    let resolved = state.resolve_image(BUCKET_ANUNCIOS, imagen).await?;

    let inserted = sqlx::query_as::<_, Anuncio>(&format!(
        "INSERT INTO anuncios (name, image_url, is_active)
         VALUES ($1, $2, $3)
         RETURNING {COLUMNS}"
    ))
    .bind(&name)
    .bind(&resolved.url)
    .bind(body.is_active.unwrap_or(true))
    .fetch_one(&state.pool)
    .await
    .map_err(|e| AppError::from_db(TABLE, e));
    let anuncio = state.discard_on_error(Some(&resolved), inserted).await?;

    tracing::info!("Anuncio {} creado", anuncio.id);
    Ok((StatusCode::CREATED, Json(AnuncioView::at(anuncio, Utc::now()))))
}

// PUT /api/admin/anuncios/:id
pub async fn update_anuncio_handler(
    Path(id): Path<i64>,
    State(state): State<AppState>,
    Json(body): Json<UpdateAnuncioSchema>,
) -> AppResult<impl IntoResponse> {
    let name = body.name.as_deref().map(|n| text_len("name", n, 3, 100)).transpose()?;
    let imagen = optional_image("imagen", body.imagen.as_deref())?;
    let resolved = state.resolve_optional_image(BUCKET_ANUNCIOS, imagen).await?;

    let updated = sqlx::query_as::<_, Anuncio>(&format!(
        "UPDATE anuncios SET
            name = COALESCE($1, name),
            image_url = COALESCE($2, image_url),
            is_active = COALESCE($3, is_active),
            updated_at = NOW()
         WHERE id = $4
         RETURNING {COLUMNS}"
    ))
    .bind(name)
    .bind(resolved.as_ref().map(|i| i.url.as_str()))
    .bind(body.is_active)
    .bind(id)
    .fetch_optional(&state.pool)
    .await
    .map_err(|e| AppError::from_db(TABLE, e))
    .and_then(|row| row.ok_or_else(not_found));
    let anuncio = state.discard_on_error(resolved.as_ref(), updated).await?;

    Ok(Json(AnuncioView::at(anuncio, Utc::now())))
}

// POST /api/admin/anuncios/:id/toggle
pub async fn toggle_anuncio_handler(
    Path(id): Path<i64>,
    State(state): State<AppState>,
) -> AppResult<impl IntoResponse> {
    let anuncio = sqlx::query_as::<_, Anuncio>(&format!(
        "UPDATE anuncios SET is_active = NOT is_active, updated_at = NOW()
         WHERE id = $1
         RETURNING {COLUMNS}"
    ))
    .bind(id)
    .fetch_optional(&state.pool)
    .await
    .map_err(|e| AppError::from_db(TABLE, e))?
    .ok_or_else(not_found)?;

    tracing::info!("Anuncio {} activo={}", anuncio.id, anuncio.is_active);
    Ok(Json(AnuncioView::at(anuncio, Utc::now())))
}

// DELETE /api/admin/anuncios/:id
pub async fn delete_anuncio_handler(
    Path(id): Path<i64>,
    State(state): State<AppState>,
) -> AppResult<impl IntoResponse> {
    let result = sqlx::query("DELETE FROM anuncios WHERE id = $1")
        .bind(id)
        .execute(&state.pool)
        .await
        .map_err(|e| AppError::from_db(TABLE, e))?;

    if result.rows_affected() == 0 {
        return Err(not_found());
    }
    Ok(StatusCode::NO_CONTENT)
}
