use axum::{
    extract::{Json, Path, State},
    http::StatusCode,
    response::IntoResponse,
};

use crate::{
    error::{AppError, AppResult},
    models::hcd::{CreateHcdSchema, Hcd, UpdateHcdSchema},
    state::AppState,
    utils::validation::{http_url, text_len},
};

const TABLE: &str = "hcd";
const COLUMNS: &str = "id, nombre, url, created_at, updated_at";

fn not_found() -> AppError {
    AppError::NotFound("Video del HCD no encontrado".to_string())
}

// GET /api/hcd
pub async fn list_hcd_handler(State(state): State<AppState>) -> AppResult<impl IntoResponse> {
    let items = sqlx::query_as::<_, Hcd>(&format!(
        "SELECT {COLUMNS} FROM hcd ORDER BY created_at DESC"
    ))
    .fetch_all(&state.pool)
    .await
    .map_err(|e| AppError::from_db(TABLE, e))?;

    Ok(Json(items))
}

// POST /api/admin/hcd
pub async fn create_hcd_handler(
    State(state): State<AppState>,
    Json(body): Json<CreateHcdSchema>,
) -> AppResult<impl IntoResponse> {
    let nombre = text_len("nombre", &body.nombre, 3, 100)?;
    let url = http_url("url", &body.url)?;

    let item = sqlx::query_as::<_, Hcd>(&format!(
        "INSERT INTO hcd (nombre, url) VALUES ($1, $2) RETURNING {COLUMNS}"
    ))
    .bind(&nombre)
    .bind(&url)
    .fetch_one(&state.pool)
    .await
    .map_err(|e| AppError::from_db(TABLE, e))?;

    Ok((StatusCode::CREATED, Json(item)))
}

// PUT /api/admin/hcd/:id
pub async fn update_hcd_handler(
    Path(id): Path<i64>,
    State(state): State<AppState>,
    Json(body): Json<UpdateHcdSchema>,
) -> AppResult<impl IntoResponse> {
    let nombre = body.nombre.as_deref().map(|n| text_len("nombre", n, 3, 100)).transpose()?;
    let url = body.url.as_deref().map(|u| http_url("url", u)).transpose()?;

    let item = sqlx::query_as::<_, Hcd>(&format!(
        "UPDATE hcd SET
            nombre = COALESCE($1, nombre),
            url = COALESCE($2, url),
            updated_at = NOW()
         WHERE id = $3
         RETURNING {COLUMNS}"
    ))
    .bind(nombre)
    .bind(url)
    .bind(id)
    .fetch_optional(&state.pool)
    .await
    .map_err(|e| AppError::from_db(TABLE, e))?
    .ok_or_else(not_found)?;

    Ok(Json(item))
}

// DELETE /api/admin/hcd/:id
pub async fn delete_hcd_handler(
    Path(id): Path<i64>,
    State(state): State<AppState>,
) -> AppResult<impl IntoResponse> {
    let result = sqlx::query("DELETE FROM hcd WHERE id = $1")
        .bind(id)
        .execute(&state.pool)
        .await
        .map_err(|e| AppError::from_db(TABLE, e))?;

    if result.rows_affected() == 0 {
        return Err(not_found());
    }
    Ok(StatusCode::NO_CONTENT)
}
