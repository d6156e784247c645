use axum::{
    extract::{Json, Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};

use crate::{
    db::DbPool,
    error::{AppError, AppResult},
    handlers::ListFilter,
    models::streaming::{
        ActiveStreamResponse, CreateStreamingSchema, StreamToggle, Streaming,
        UpdateStreamToggleSchema, UpdateStreamingSchema,
    },
    player::select_player,
    state::AppState,
    storage::BUCKET_VIDEOS,
    utils::validation::{http_url, optional_image, text_len},
};

const TABLE: &str = "streaming";
const TOGGLE_TABLE: &str = "stream-videos";
const COLUMNS: &str = "id, nombre, url, imagen, is_active, created_at, updated_at";

fn not_found() -> AppError {
    AppError::NotFound("Stream no encontrado".to_string())
}

pub async fn fetch_active(pool: &DbPool) -> AppResult<Option<Streaming>> {
    sqlx::query_as::<_, Streaming>(&format!(
        "SELECT {COLUMNS} FROM streaming
         WHERE is_active = TRUE
         ORDER BY updated_at DESC
         LIMIT 1"
    ))
    .fetch_optional(pool)
    .await
    .map_err(|e| AppError::from_db(TABLE, e))
}

pub async fn fetch_toggle(pool: &DbPool) -> AppResult<Option<StreamToggle>> {
    sqlx::query_as::<_, StreamToggle>(r#"SELECT is_auto, stream FROM "stream-videos" WHERE id = 1"#)
        .fetch_optional(pool)
        .await
        .map_err(|e| AppError::from_db(TOGGLE_TABLE, e))
}

// GET /api/streaming
pub async fn list_streaming_handler(
    State(state): State<AppState>,
    Query(filter): Query<ListFilter>,
) -> AppResult<impl IntoResponse> {
    let streams = sqlx::query_as::<_, Streaming>(&format!(
        "SELECT {COLUMNS} FROM streaming
         WHERE ($1 = FALSE OR is_active = TRUE)
         ORDER BY created_at DESC"
    ))
    .bind(filter.only_active())
    .fetch_all(&state.pool)
    .await
    .map_err(|e| AppError::from_db(TABLE, e))?;

    Ok(Json(streams))
}

// GET /api/streaming/activo - stream activo + reproductor a montar
pub async fn active_streaming_handler(State(state): State<AppState>) -> AppResult<impl IntoResponse> {
    let streaming = fetch_active(&state.pool)
        .await?
        .ok_or_else(|| AppError::NotFound("No hay ningún stream activo".to_string()))?;
    let toggle = fetch_toggle(&state.pool).await?;

    Ok(Json(ActiveStreamResponse {
        player: select_player(&streaming.url),
        streaming,
        toggle,
    }))
}

// POST /api/admin/streaming (se crea inactivo)
pub async fn create_streaming_handler(
    State(state): State<AppState>,
    Json(body): Json<CreateStreamingSchema>,
) -> AppResult<impl IntoResponse> {
    let nombre = text_len("nombre", &body.nombre, 3, 100)?;
    let url = http_url("url", &body.url)?;
    let imagen = optional_image("imagen", body.imagen.as_deref())?;
    let resolved = state.resolve_optional_image(BUCKET_VIDEOS, imagen).await?;

    let inserted = sqlx::query_as::<_, Streaming>(&format!(
        "INSERT INTO streaming (nombre, url, imagen, is_active)
         VALUES ($1, $2, $3, FALSE)
         RETURNING {COLUMNS}"
    ))
    .bind(&nombre)
    .bind(&url)
    .bind(resolved.as_ref().map(|i| i.url.as_str()))
    .fetch_one(&state.pool)
    .await
    .map_err(|e| AppError::from_db(TABLE, e));
    let streaming = state.discard_on_error(resolved.as_ref(), inserted).await?;

    Ok((StatusCode::CREATED, Json(streaming)))
}

// PUT /api/admin/streaming/:id
pub async fn update_streaming_handler(
    Path(id): Path<i64>,
    State(state): State<AppState>,
    Json(body): Json<UpdateStreamingSchema>,
) -> AppResult<impl IntoResponse> {
    let nombre = body.nombre.as_deref().map(|n| text_len("nombre", n, 3, 100)).transpose()?;
    let url = body.url.as_deref().map(|u| http_url("url", u)).transpose()?;
    let imagen = optional_image("imagen", body.imagen.as_deref())?;
    let resolved = state.resolve_optional_image(BUCKET_VIDEOS, imagen).await?;

    let updated = sqlx::query_as::<_, Streaming>(&format!(
        "UPDATE streaming SET
            nombre = COALESCE($1, nombre),
            url = COALESCE($2, url),
            imagen = COALESCE($3, imagen),
            updated_at = NOW()
         WHERE id = $4
         RETURNING {COLUMNS}"
    ))
    .bind(nombre)
    .bind(url)
    .bind(resolved.as_ref().map(|i| i.url.as_str()))
    .bind(id)
    .fetch_optional(&state.pool)
    .await
    .map_err(|e| AppError::from_db(TABLE, e))
    .and_then(|row| row.ok_or_else(not_found));
    let streaming = state.discard_on_error(resolved.as_ref(), updated).await?;

    Ok(Json(streaming))
}

fn activation_error(err: sqlx::Error) -> AppError {
    match AppError::from_db(TABLE, err) {
        AppError::Conflict(_) => AppError::Conflict(
            "Otro stream se activó al mismo tiempo; recargá la lista y volvé a intentar".to_string(),
        ),
        other => other,
    }
}

// POST /api/admin/streaming/:id/activar
//
// Desactivar el resto y activar el pedido en la misma transacción.
// Con dos activaciones concurrentes el índice único parcial devuelve 409.
pub async fn activate_streaming_handler(
    Path(id): Path<i64>,
    State(state): State<AppState>,
) -> AppResult<impl IntoResponse> {
    let mut tx = state.pool.begin().await.map_err(|e| AppError::from_db(TABLE, e))?;

    let locked: Option<i64> = sqlx::query_scalar("SELECT id FROM streaming WHERE id = $1 FOR UPDATE")
        .bind(id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e| AppError::from_db(TABLE, e))?;
    if locked.is_none() {
        // El drop de la transacción hace rollback
        return Err(not_found());
    }

    sqlx::query(
        "UPDATE streaming SET is_active = FALSE, updated_at = NOW()
         WHERE is_active = TRUE AND id <> $1",
    )
    .bind(id)
    .execute(&mut *tx)
    .await
    .map_err(activation_error)?;

    let streaming = sqlx::query_as::<_, Streaming>(&format!(
        "UPDATE streaming SET is_active = TRUE, updated_at = NOW()
         WHERE id = $1
         RETURNING {COLUMNS}"
    ))
    .bind(id)
    .fetch_one(&mut *tx)
    .await
    .map_err(activation_error)?;

    tx.commit().await.map_err(|e| AppError::from_db(TABLE, e))?;

    tracing::info!("Stream {} ({}) marcado como activo", streaming.id, streaming.nombre);
    Ok(Json(streaming))
}

// POST /api/admin/streaming/:id/desactivar
pub async fn deactivate_streaming_handler(
    Path(id): Path<i64>,
    State(state): State<AppState>,
) -> AppResult<impl IntoResponse> {
    let streaming = sqlx::query_as::<_, Streaming>(&format!(
        "UPDATE streaming SET is_active = FALSE, updated_at = NOW()
         WHERE id = $1
         RETURNING {COLUMNS}"
    ))
    .bind(id)
    .fetch_optional(&state.pool)
    .await
    .map_err(|e| AppError::from_db(TABLE, e))?
    .ok_or_else(not_found)?;

    Ok(Json(streaming))
}

// DELETE /api/admin/streaming/:id
pub async fn delete_streaming_handler(
    Path(id): Path<i64>,
    State(state): State<AppState>,
) -> AppResult<impl IntoResponse> {
    let result = sqlx::query("DELETE FROM streaming WHERE id = $1")
        .bind(id)
        .execute(&state.pool)
        .await
        .map_err(|e| AppError::from_db(TABLE, e))?;

    if result.rows_affected() == 0 {
        return Err(not_found());
    }
    Ok(StatusCode::NO_CONTENT)
}

// GET /api/stream-videos
pub async fn get_toggle_handler(State(state): State<AppState>) -> AppResult<impl IntoResponse> {
    let toggle = fetch_toggle(&state.pool).await?.unwrap_or(StreamToggle {
        is_auto: false,
        stream: false,
    });
    Ok(Json(toggle))
}

// PUT /api/admin/stream-videos
pub async fn update_toggle_handler(
    State(state): State<AppState>,
    Json(body): Json<UpdateStreamToggleSchema>,
) -> AppResult<impl IntoResponse> {
    let toggle = sqlx::query_as::<_, StreamToggle>(
        r#"
        INSERT INTO "stream-videos" (id, is_auto, stream)
        VALUES (1, COALESCE($1, FALSE), COALESCE($2, FALSE))
        ON CONFLICT (id) DO UPDATE SET
            is_auto = COALESCE($1, "stream-videos".is_auto),
            stream = COALESCE($2, "stream-videos".stream)
        RETURNING is_auto, stream
        "#,
    )
    .bind(body.is_auto)
    .bind(body.stream)
    .fetch_one(&state.pool)
    .await
    .map_err(|e| AppError::from_db(TOGGLE_TABLE, e))?;

    tracing::info!("stream-videos actualizado: auto={} stream={}", toggle.is_auto, toggle.stream);
    Ok(Json(toggle))
}
