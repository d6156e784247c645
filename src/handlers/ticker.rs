use axum::{
    extract::{Json, Path, State},
    http::StatusCode,
    response::IntoResponse,
};

use crate::{
    error::{AppError, AppResult},
    models::ticker::{CreateTextoTickerSchema, TextoTicker},
    state::AppState,
    utils::validation::text_len,
};

const TABLE: &str = "textos_ticker";

// GET /api/ticker
pub async fn list_textos_handler(State(state): State<AppState>) -> AppResult<impl IntoResponse> {
    let textos = sqlx::query_as::<_, TextoTicker>(
        "SELECT id, text, created_at FROM textos_ticker ORDER BY created_at DESC",
    )
    .fetch_all(&state.pool)
    .await
    .map_err(|e| AppError::from_db(TABLE, e))?;

    Ok(Json(textos))
}

// POST /api/admin/ticker
pub async fn create_texto_handler(
    State(state): State<AppState>,
    Json(body): Json<CreateTextoTickerSchema>,
) -> AppResult<impl IntoResponse> {
    let text = text_len("text", &body.text, 3, 200)?;

    let texto = sqlx::query_as::<_, TextoTicker>(
        "INSERT INTO textos_ticker (text) VALUES ($1) RETURNING id, text, created_at",
    )
    .bind(&text)
    .fetch_one(&state.pool)
    .await
    .map_err(|e| AppError::from_db(TABLE, e))?;

    Ok((StatusCode::CREATED, Json(texto)))
}

// DELETE /api/admin/ticker/:id
pub async fn delete_texto_handler(
    Path(id): Path<i64>,
    State(state): State<AppState>,
) -> AppResult<impl IntoResponse> {
    let result = sqlx::query("DELETE FROM textos_ticker WHERE id = $1")
        .bind(id)
        .execute(&state.pool)
        .await
        .map_err(|e| AppError::from_db(TABLE, e))?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("Texto no encontrado".to_string()));
    }
    Ok(StatusCode::NO_CONTENT)
}
